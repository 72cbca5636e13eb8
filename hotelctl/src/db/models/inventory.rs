//! Database models for reservation holds and per-night occupancy.

use crate::types::{HoldId, RoomTypeId, UserId};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Why a hold stopped claiming inventory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "hold_release_reason", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ReleaseReason {
    Released,
    Expired,
    Consumed,
}

#[derive(Debug, Clone)]
pub struct HoldCreateDBRequest {
    pub room_type_id: RoomTypeId,
    pub user_id: UserId,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub quantity: i32,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct HoldDBResponse {
    pub id: HoldId,
    pub room_type_id: RoomTypeId,
    pub user_id: UserId,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub quantity: i32,
    pub expires_at: DateTime<Utc>,
    pub released_at: Option<DateTime<Utc>>,
    pub release_reason: Option<ReleaseReason>,
    pub created_at: DateTime<Utc>,
}

impl HoldDBResponse {
    /// A hold claims inventory until it is released or its expiry passes, whichever is first.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.released_at.is_none() && self.expires_at > now
    }
}

/// Claimed inventory for one night of a room type
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct NightOccupancy {
    pub date: NaiveDate,
    /// Bookable rooms: active rooms of an available room type in an active hotel
    pub total_rooms: i64,
    /// Rooms claimed by active holds
    pub held: i64,
    /// Rooms claimed by pending, confirmed or checked-in bookings
    pub booked: i64,
}

impl NightOccupancy {
    pub fn available(&self) -> i64 {
        (self.total_rooms - self.held - self.booked).max(0)
    }
}

/// Rooms free over every night of a stay
pub fn available_over(nights: &[NightOccupancy]) -> i64 {
    nights.iter().map(NightOccupancy::available).min().unwrap_or(0)
}

/// Outcome of an atomic check-and-insert of a hold
#[derive(Debug, Clone)]
pub enum HoldOutcome {
    Granted(HoldDBResponse),
    Insufficient { available: i64 },
}
