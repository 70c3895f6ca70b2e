//! End-to-end request flows through a listening gateway.

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod common;

#[tokio::test]
async fn version_repeat_is_served_from_cache() {
    let backend = common::start_mock_backend(200, "unused").await;
    let config = common::gateway_config(&[backend.url()], &[backend.url()]);
    let gateway = common::start_gateway(config.clone(), common::memory_services(&config)).await;
    let client = common::client();

    let first = client.get(gateway.url("/version")).send().await.unwrap();
    assert_eq!(first.status(), 200);
    assert!(first.headers().get("x-cache").is_none());
    assert_eq!(first.text().await.unwrap(), "D&D Game Hosting Table v1");

    let second = client.get(gateway.url("/version")).send().await.unwrap();
    assert_eq!(second.status(), 200);
    assert_eq!(second.headers()["x-cache"], "HIT");
    assert_eq!(second.text().await.unwrap(), "D&D Game Hosting Table v1");

    assert_eq!(backend.hits(), 0);
    gateway.shutdown.trigger();
}

#[tokio::test]
async fn session_roll_is_forwarded_with_exact_length() {
    let session = common::start_programmable_backend(|_| (201, r#"{"roll":17}"#.to_string())).await;
    let user = common::start_mock_backend(200, "user").await;
    let config = common::gateway_config(&[session.url()], &[user.url()]);
    let gateway = common::start_gateway(config.clone(), common::memory_services(&config)).await;

    let response = common::client()
        .post(gateway.url("/session/roll"))
        .header("content-type", "application/json")
        .body(r#"{"die":20}"#)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 201);
    assert_eq!(response.text().await.unwrap(), r#"{"roll":17}"#);

    let captured = session.requests();
    assert_eq!(captured.len(), 1);
    let request = &captured[0];
    assert!(request.request_line().starts_with("POST /session/roll "));
    assert_eq!(request.body, br#"{"die":20}"#);
    assert_eq!(request.header("content-length"), Some("10"));
    assert_eq!(request.header("transfer-encoding"), None);
    assert_eq!(request.header("content-type"), Some("application/json"));
    assert!(request.header("x-request-id").is_some());
    assert_eq!(user.hits(), 0);

    gateway.shutdown.trigger();
}

#[tokio::test]
async fn query_string_reaches_backend_and_keys_the_cache() {
    let user = common::start_programmable_backend(|req| (200, req.request_line().to_string())).await;
    let config = common::gateway_config(&[user.url()], &[user.url()]);
    let gateway = common::start_gateway(config.clone(), common::memory_services(&config)).await;
    let client = common::client();

    let a = client.get(gateway.url("/user/list?page=1")).send().await.unwrap();
    assert_eq!(a.text().await.unwrap(), "GET /user/list?page=1 HTTP/1.1");
    let b = client.get(gateway.url("/user/list?page=2")).send().await.unwrap();
    assert!(b.headers().get("x-cache").is_none());
    let again = client.get(gateway.url("/user/list?page=1")).send().await.unwrap();
    assert_eq!(again.headers()["x-cache"], "HIT");

    assert_eq!(user.hits(), 2);
    gateway.shutdown.trigger();
}

#[tokio::test]
async fn non_success_responses_are_not_cached() {
    let user = common::start_mock_backend(503, "busy").await;
    let config = common::gateway_config(&[user.url()], &[user.url()]);
    let gateway = common::start_gateway(config.clone(), common::memory_services(&config)).await;
    let client = common::client();

    for _ in 0..2 {
        let response = client.get(gateway.url("/user/me")).send().await.unwrap();
        assert_eq!(response.status(), 503);
        assert_eq!(response.text().await.unwrap(), "busy");
    }
    assert_eq!(user.hits(), 2);
    gateway.shutdown.trigger();
}

#[tokio::test]
async fn invalid_token_is_rejected_before_backend() {
    let auth = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/validate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "Token is invalid." })))
        .expect(1)
        .mount(&auth)
        .await;

    let session = common::start_mock_backend(200, "rolled").await;
    let mut config = common::gateway_config(&[session.url()], &[session.url()]);
    config.auth.enabled = true;
    config.auth.validate_url = format!("{}/validate", auth.uri());
    let gateway = common::start_gateway(config.clone(), common::memory_services(&config)).await;

    let response = common::client()
        .post(gateway.url("/session/roll"))
        .header("authorization", "Bearer forged")
        .body("{}")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body, json!({ "error": "The provided token was invalid." }));
    assert_eq!(session.hits(), 0);
    gateway.shutdown.trigger();
}

#[tokio::test]
async fn exempt_and_valid_requests_pass() {
    let auth = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/validate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "Token is valid." })))
        // Only the /session/roll call consults the auth service.
        .expect(1)
        .mount(&auth)
        .await;

    let session = common::start_mock_backend(200, "ok").await;
    let mut config = common::gateway_config(&[session.url()], &[session.url()]);
    config.auth.enabled = true;
    config.auth.validate_url = format!("{}/validate", auth.uri());
    let gateway = common::start_gateway(config.clone(), common::memory_services(&config)).await;
    let client = common::client();

    let docs = client.get(gateway.url("/session/docs")).send().await.unwrap();
    assert_eq!(docs.status(), 200);

    let roll = client
        .post(gateway.url("/session/roll"))
        .header("authorization", "Bearer good")
        .body("{}")
        .send()
        .await
        .unwrap();
    assert_eq!(roll.status(), 200);

    assert_eq!(session.hits(), 2);
    gateway.shutdown.trigger();
}

#[tokio::test]
async fn cached_protected_response_still_requires_valid_token() {
    let auth = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/validate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "Token is valid." })))
        .up_to_n_times(1)
        .expect(1)
        .mount(&auth)
        .await;
    Mock::given(method("POST"))
        .and(path("/validate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "Token is invalid." })))
        .expect(1)
        .mount(&auth)
        .await;

    let session = common::start_mock_backend(200, "secret table").await;
    let mut config = common::gateway_config(&[session.url()], &[session.url()]);
    config.auth.enabled = true;
    config.auth.validate_url = format!("{}/validate", auth.uri());
    let gateway = common::start_gateway(config.clone(), common::memory_services(&config)).await;
    let client = common::client();

    let warm = client
        .get(gateway.url("/session/list"))
        .header("authorization", "Bearer good")
        .send()
        .await
        .unwrap();
    assert_eq!(warm.status(), 200);
    assert_eq!(warm.text().await.unwrap(), "secret table");
    assert_eq!(session.hits(), 1);

    // The body is cached now, but the token check runs before the cache lookup.
    let forged = client
        .get(gateway.url("/session/list"))
        .header("authorization", "Bearer forged")
        .send()
        .await
        .unwrap();
    assert_eq!(forged.status(), 400);
    assert!(forged.headers().get("x-cache").is_none());
    let body: serde_json::Value = forged.json().await.unwrap();
    assert_eq!(body, json!({ "error": "The provided token was invalid." }));
    assert_eq!(session.hits(), 1);

    gateway.shutdown.trigger();
}

#[tokio::test]
async fn shutdown_stops_the_server() {
    let backend = common::start_mock_backend(200, "ok").await;
    let config = common::gateway_config(&[backend.url()], &[backend.url()]);
    let gateway = common::start_gateway(config.clone(), common::memory_services(&config)).await;

    gateway.shutdown.trigger();
    let result = tokio::time::timeout(std::time::Duration::from_secs(5), gateway.task)
        .await
        .expect("server exits after shutdown")
        .unwrap();
    assert!(result.is_ok());
}
