//! Periodic push of every active hotel's availability and pricing.

use chrono::{Days, Utc};
use tokio_util::sync::CancellationToken;

use super::SyncService;
use crate::config::SyncScheduleConfig;

pub async fn run_sync_scheduler(sync: SyncService, schedule: SyncScheduleConfig, shutdown: CancellationToken) {
    tracing::info!(interval = ?schedule.interval, window_days = schedule.window_days, "Starting sync scheduler");

    loop {
        tokio::select! {
            _ = tokio::time::sleep(schedule.interval) => {}
            _ = shutdown.cancelled() => {
                tracing::info!("Sync scheduler shutting down");
                return;
            }
        }

        let now = Utc::now();
        let start = now.date_naive();
        let Some(end) = start.checked_add_days(Days::new(schedule.window_days.max(0) as u64)) else {
            tracing::error!(window_days = schedule.window_days, "Sync window out of range, stopping scheduler");
            return;
        };

        let hotel_ids = match sync.active_hotel_ids().await {
            Ok(ids) => ids,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to list hotels for scheduled sync");
                continue;
            }
        };
        let items = sync.sync_multiple(None, &hotel_ids, start, end, now).await;
        let failed = items.iter().filter(|item| !item.success).count();
        if failed > 0 {
            tracing::warn!(hotels = items.len(), failed, "Scheduled sync finished with failures");
        } else {
            tracing::debug!(hotels = items.len(), "Scheduled sync finished");
        }
    }
}
