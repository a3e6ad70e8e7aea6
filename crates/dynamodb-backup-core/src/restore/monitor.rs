//! Import status polling.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{info, warn};

use crate::config::PollOptions;
use crate::dynamo::{ImportJob, TableService};
use crate::{Error, Result};

/// Polls an import job until it reaches a terminal status.
///
/// Polling stops early on timeout, after too many consecutive failed status
/// checks, or when shutdown is signalled. Stopping never cancels the import
/// itself.
///
/// Shutdown is a sticky flag: a signal sent before `watch` starts is seen by
/// its first check.
pub struct ImportMonitor {
    tables: Arc<dyn TableService>,
    options: PollOptions,
    shutdown_tx: watch::Sender<bool>,
}

impl ImportMonitor {
    pub fn new(tables: Arc<dyn TableService>, options: PollOptions) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            tables,
            options,
            shutdown_tx,
        }
    }

    /// Signal shutdown
    pub fn shutdown(&self) {
        self.shutdown_tx.send_replace(true);
    }

    /// Whether shutdown has been signalled
    pub fn is_shutdown(&self) -> bool {
        *self.shutdown_tx.borrow()
    }

    /// Get a clone of the shutdown sender for external signal handling
    pub fn shutdown_handle(&self) -> watch::Sender<bool> {
        self.shutdown_tx.clone()
    }

    /// Poll `import_arn` until COMPLETED, FAILED or CANCELLED.
    ///
    /// Returns the terminal job snapshot, or `Error::ImportMonitor` when
    /// polling gave up.
    pub async fn watch(&self, import_arn: &str) -> Result<ImportJob> {
        let interval = self.options.interval();
        let deadline = Instant::now() + self.options.timeout();
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        let mut consecutive_errors = 0u32;

        info!("Monitoring import {}", import_arn);

        loop {
            if *shutdown_rx.borrow_and_update() {
                info!("Shutdown signal received, stopping import monitoring");
                return Err(Error::Interrupted(format!(
                    "import {} continues in the background",
                    import_arn
                )));
            }

            let delay = match self.tables.describe_import(import_arn).await {
                Ok(job) if job.status.is_terminal() => {
                    info!("Import {} finished with status {}", import_arn, job.status);
                    return Ok(job);
                }
                Ok(job) => {
                    consecutive_errors = 0;
                    info!("Import in progress... status: {}", job.status);
                    interval
                }
                Err(e) => {
                    consecutive_errors += 1;
                    if consecutive_errors >= self.options.max_poll_errors {
                        return Err(Error::ImportMonitor(format!(
                            "{} consecutive status checks of {} failed, last error: {}",
                            consecutive_errors, import_arn, e
                        )));
                    }
                    let delay = backoff(interval, consecutive_errors, self.options.max_backoff());
                    warn!(
                        "Status check of {} failed ({}/{}): {}. Retrying in {:?}",
                        import_arn, consecutive_errors, self.options.max_poll_errors, e, delay
                    );
                    delay
                }
            };

            let wake = (Instant::now() + delay).min(deadline);
            tokio::select! {
                _ = tokio::time::sleep_until(wake) => {}
                _ = shutdown_rx.changed() => continue,
            }

            if Instant::now() >= deadline {
                return Err(Error::ImportMonitor(format!(
                    "timed out after {:?}; import {} continues in the background",
                    self.options.timeout(),
                    import_arn
                )));
            }
        }
    }
}

/// Delay after the `attempt`-th consecutive failure: the interval doubled per
/// failure beyond the first, capped at `max`.
fn backoff(interval: Duration, attempt: u32, max: Duration) -> Duration {
    let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
    interval.saturating_mul(factor).min(max)
}
