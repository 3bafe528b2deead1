//! Periodic due-deletion sweep.

use std::time::Duration;

use gatherly_core::DeletionService;
use tokio::time::interval;
use tracing::{error, info};

/// Spawn the background task that runs the due-deletion sweep.
///
/// The first tick fires immediately, so deletions that came due while the
/// server was down are executed at startup. A failing sweep is logged and
/// retried on the next tick.
pub fn spawn_sweep_task(
    deletion_service: DeletionService,
    sweep_interval: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(sweep_interval);
        info!(interval_secs = sweep_interval.as_secs(), "Deletion sweep scheduled");

        loop {
            ticker.tick().await;

            match deletion_service.run_due_sweep().await {
                Ok(deleted) if deleted > 0 => {
                    info!(deleted = deleted, "Deletion sweep removed due accounts");
                }
                Ok(_) => {}
                Err(e) => {
                    error!(error = %e, "Deletion sweep failed, retrying next tick");
                }
            }
        }
    })
}
