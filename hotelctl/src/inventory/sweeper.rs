//! Periodic stamping of expired reservation holds.

use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;

use super::InventoryService;

pub async fn run_hold_sweeper(inventory: InventoryService, interval: Duration, shutdown: CancellationToken) {
    tracing::info!(interval = ?interval, "Starting reservation hold sweeper");

    loop {
        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = shutdown.cancelled() => {
                tracing::info!("Reservation hold sweeper shutting down");
                return;
            }
        }

        if let Err(e) = inventory.sweep_expired(Utc::now()).await {
            tracing::warn!(error = %e, "Failed to sweep expired reservation holds");
        }
    }
}
