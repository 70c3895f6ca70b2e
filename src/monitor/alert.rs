//! Overload alerts and the task that reports them.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::observability::metrics;

/// Raised when one sampling interval saw at least the critical load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadAlert {
    pub service: String,
    pub requests: u64,
    pub interval: Duration,
}

/// Drain alerts into the log until every sender is gone.
pub fn spawn_alert_logger(mut alerts: mpsc::Receiver<LoadAlert>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(alert) = alerts.recv().await {
            tracing::warn!(
                service = %alert.service,
                requests = alert.requests,
                interval_ms = alert.interval.as_millis() as u64,
                "ALERT: service is under critical load"
            );
            metrics::record_load_alert(&alert.service);
        }
    })
}
