//! Bearer token validation against the auth service.
//!
//! The auth service answers `POST <validate_url>` with `{"message": ...}`;
//! one specific message marks the token invalid, anything else is a pass.

use std::time::Duration;

use async_trait::async_trait;
use axum::http::{header, HeaderMap};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::AuthConfig;

#[derive(Debug, thiserror::Error)]
pub enum TokenValidatorError {
    #[error("invalid validate_url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("failed to build auth client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Decides whether the credentials on a request are acceptable.
#[async_trait]
pub trait TokenValidator: Send + Sync {
    async fn is_valid(&self, headers: &HeaderMap) -> bool;
}

/// Token carried in the `Authorization` header.
///
/// The second space-separated word of the header, so `Bearer abc` yields
/// `abc`. A missing or one-word header yields an empty token.
pub fn bearer_token(headers: &HeaderMap) -> &str {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(' ').nth(1))
        .unwrap_or("")
}

#[derive(Debug, Serialize)]
struct ValidateRequest<'a> {
    user_token: &'a str,
}

#[derive(Debug, Deserialize)]
struct ValidateResponse {
    #[serde(default)]
    message: String,
}

/// Validator that calls the remote auth service for every check.
#[derive(Debug, Clone)]
pub struct RemoteTokenValidator {
    client: reqwest::Client,
    validate_url: Url,
    invalid_message: String,
}

impl RemoteTokenValidator {
    pub fn new(
        validate_url: &str,
        invalid_message: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, TokenValidatorError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            validate_url: Url::parse(validate_url)?,
            invalid_message: invalid_message.into(),
        })
    }

    pub fn from_config(config: &AuthConfig) -> Result<Self, TokenValidatorError> {
        Self::new(
            &config.validate_url,
            config.invalid_message.clone(),
            config.timeout(),
        )
    }

    async fn validate(&self, token: &str) -> Result<ValidateResponse, reqwest::Error> {
        self.client
            .post(self.validate_url.clone())
            .json(&ValidateRequest { user_token: token })
            .send()
            .await?
            .json::<ValidateResponse>()
            .await
    }
}

#[async_trait]
impl TokenValidator for RemoteTokenValidator {
    async fn is_valid(&self, headers: &HeaderMap) -> bool {
        match self.validate(bearer_token(headers)).await {
            Ok(response) => !response.message.eq_ignore_ascii_case(&self.invalid_message),
            Err(e) => {
                tracing::warn!(url = %self.validate_url, error = %e, "Token validation call failed");
                false
            }
        }
    }
}
