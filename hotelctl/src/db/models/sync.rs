//! Database models for outbound sync bookkeeping and inbound reconciliation.

use crate::types::HotelId;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "sync_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SyncKind {
    Availability,
    Pricing,
}

impl SyncKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SyncKind::Availability => "availability",
            SyncKind::Pricing => "pricing",
        }
    }
}

#[derive(Debug, Clone)]
pub struct SyncRecordUpsert {
    pub idempotency_key: String,
    pub hotel_id: HotelId,
    pub kind: SyncKind,
    pub range_start: NaiveDate,
    pub range_end: NaiveDate,
    pub snapshot_hash: String,
    pub records: i32,
}

#[derive(Debug, Clone, FromRow)]
pub struct SyncRecordDBResponse {
    pub idempotency_key: String,
    pub hotel_id: HotelId,
    pub kind: SyncKind,
    pub range_start: NaiveDate,
    pub range_end: NaiveDate,
    pub snapshot_hash: String,
    pub records: i32,
    pub push_count: i32,
    pub last_synced_at: DateTime<Utc>,
}

/// Result of applying one externally pushed update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    /// Local row is as new or newer than the update
    Stale,
    /// Row does not exist or belongs to a different hotel
    Unknown,
}
