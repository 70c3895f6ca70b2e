//! Process-wide request counter with periodic sampling.
//!
//! The monitor is idle until [`LoadMonitor::start`] is called once; from then
//! on it samples every interval for the rest of the process lifetime.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::config::MonitorConfig;
use crate::monitor::alert::LoadAlert;
use crate::observability::metrics;

#[derive(Debug)]
pub struct LoadMonitor {
    counter: AtomicU64,
    started: AtomicBool,
    service: String,
    threshold: u64,
    interval: Duration,
}

impl LoadMonitor {
    pub fn new(service: impl Into<String>, threshold: u64, interval: Duration) -> Self {
        Self {
            counter: AtomicU64::new(0),
            started: AtomicBool::new(false),
            service: service.into(),
            threshold,
            interval,
        }
    }

    pub fn from_config(config: &MonitorConfig) -> Self {
        Self::new(config.service_name.clone(), config.critical_load, config.interval())
    }

    /// Count one inbound request.
    pub fn record_request(&self) {
        self.counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Requests counted since the last sample.
    pub fn current(&self) -> u64 {
        self.counter.load(Ordering::Relaxed)
    }

    pub fn is_sampling(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }

    /// Read and reset the counter in one step.
    ///
    /// Returns an alert when the pre-reset count reached the threshold.
    pub fn sample(&self) -> Option<LoadAlert> {
        let requests = self.counter.swap(0, Ordering::AcqRel);
        metrics::record_load_sample(requests);

        (requests >= self.threshold).then(|| LoadAlert {
            service: self.service.clone(),
            requests,
            interval: self.interval,
        })
    }

    /// Start sampling on a background task.
    ///
    /// Only the first call spawns; later calls return `None`. There is no
    /// stop: the task runs until the runtime shuts down, and a closed alert
    /// channel does not end sampling.
    pub fn start(self: &Arc<Self>, alerts: mpsc::Sender<LoadAlert>) -> Option<JoinHandle<()>> {
        if self
            .started
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return None;
        }

        tracing::info!(
            service = %self.service,
            threshold = self.threshold,
            interval_ms = self.interval.as_millis() as u64,
            "Load monitor starting"
        );

        let monitor = Arc::clone(self);
        Some(tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + monitor.interval, monitor.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                let Some(alert) = monitor.sample() else {
                    continue;
                };
                match alerts.try_send(alert) {
                    Ok(()) => {}
                    Err(TrySendError::Full(alert)) => {
                        tracing::warn!(
                            service = %alert.service,
                            requests = alert.requests,
                            "Alert channel full, dropping load alert"
                        );
                    }
                    Err(TrySendError::Closed(_)) => {}
                }
            }
        }))
    }
}
