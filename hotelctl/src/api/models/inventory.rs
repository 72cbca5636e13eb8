//! API request/response models for availability and reservation holds.

use crate::db::models::inventory::{HoldDBResponse, ReleaseReason};
use crate::types::{HoldId, RoomTypeId, UserId};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// A stay and party size
#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StayQuery {
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    #[serde(default = "default_guests")]
    #[param(default = 1, minimum = 1)]
    pub guests: i32,
}

fn default_guests() -> i32 {
    1
}

/// Inclusive date range
#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DateRangeQuery {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct HoldCreate {
    #[schema(value_type = String, format = "uuid")]
    pub room_type_id: RoomTypeId,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
    /// Hold lifetime in seconds; defaults to the configured TTL and is capped at the maximum
    pub ttl_seconds: Option<u64>,
}

fn default_quantity() -> i32 {
    1
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct HoldResponse {
    #[schema(value_type = String, format = "uuid")]
    pub hold_id: HoldId,
    #[schema(value_type = String, format = "uuid")]
    pub room_type_id: RoomTypeId,
    #[schema(value_type = String, format = "uuid")]
    pub user_id: UserId,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub quantity: i32,
    pub expires_at: DateTime<Utc>,
    pub released_at: Option<DateTime<Utc>>,
    pub release_reason: Option<ReleaseReason>,
    /// Whether the hold still claims inventory at response time
    pub active: bool,
}

impl HoldResponse {
    pub fn from_db(db: HoldDBResponse, now: DateTime<Utc>) -> Self {
        Self {
            active: db.is_active(now),
            hold_id: db.id,
            room_type_id: db.room_type_id,
            user_id: db.user_id,
            check_in: db.check_in,
            check_out: db.check_out,
            quantity: db.quantity,
            expires_at: db.expires_at,
            released_at: db.released_at,
            release_reason: db.release_reason,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListHoldsQuery {
    /// Only holds that still claim inventory
    #[serde(default)]
    pub active: bool,
}
