//! Database models for bookings and their status history.

use crate::types::{BookingId, HoldId, HotelId, RoomTypeId, UserId};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "booking_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    CheckedIn,
    CheckedOut,
    Cancelled,
    /// Recognised when read back from storage; no transition produces it
    Completed,
}

impl BookingStatus {
    /// Statuses whose rooms count against inventory
    pub const CLAIMING: [BookingStatus; 3] = [BookingStatus::Pending, BookingStatus::Confirmed, BookingStatus::CheckedIn];

    pub fn claims_inventory(self) -> bool {
        Self::CLAIMING.contains(&self)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, BookingStatus::CheckedOut | BookingStatus::Cancelled | BookingStatus::Completed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::CheckedIn => "checked_in",
            BookingStatus::CheckedOut => "checked_out",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct BookingCreateDBRequest {
    pub user_id: UserId,
    pub hotel_id: HotelId,
    pub room_type_id: RoomTypeId,
    /// When set, the hold is consumed in the same transaction that inserts the booking
    pub hold_id: Option<HoldId>,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub guests: i32,
    pub rooms: i32,
    pub subtotal: i64,
    pub discount: i64,
    pub total_price: i64,
    pub promo_code: Option<String>,
    pub status: BookingStatus,
    pub special_requests: Option<String>,
}

#[derive(Debug, Clone, FromRow)]
pub struct BookingDBResponse {
    pub id: BookingId,
    pub user_id: UserId,
    pub hotel_id: HotelId,
    pub room_type_id: RoomTypeId,
    pub hold_id: Option<HoldId>,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub guests: i32,
    pub rooms: i32,
    pub subtotal: i64,
    pub discount: i64,
    pub total_price: i64,
    pub promo_code: Option<String>,
    pub status: BookingStatus,
    pub special_requests: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

/// New stay details for an existing booking, already priced
#[derive(Debug, Clone)]
pub struct BookingStayUpdate {
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub guests: i32,
    pub rooms: i32,
    pub subtotal: i64,
    pub discount: i64,
    pub total_price: i64,
}

#[derive(Debug, Clone, FromRow)]
pub struct BookingEventDBResponse {
    pub id: Uuid,
    pub booking_id: BookingId,
    pub from_status: Option<BookingStatus>,
    pub to_status: BookingStatus,
    pub actor_id: UserId,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct BookingFilter {
    pub user_id: Option<UserId>,
    /// Restrict to bookings of hotels owned by this user
    pub hotel_owner_id: Option<UserId>,
    pub hotel_id: Option<HotelId>,
    pub status: Option<BookingStatus>,
    pub check_in_from: Option<NaiveDate>,
    pub check_in_to: Option<NaiveDate>,
    pub skip: i64,
    pub limit: i64,
}

#[derive(Debug, Clone)]
pub enum CreateBookingOutcome {
    Created(BookingDBResponse),
    /// The referenced hold is unknown, released, expired, or belongs to someone else
    HoldUnavailable,
    Insufficient { available: i64 },
}

#[derive(Debug, Clone)]
pub enum UpdateStayOutcome {
    Updated(BookingDBResponse),
    /// The booking left the expected status before the update ran
    StatusChanged,
    Insufficient { available: i64 },
}
