//! API request/response models for bookings.

use super::pagination::Pagination;
use crate::db::models::bookings::{BookingDBResponse, BookingEventDBResponse, BookingStatus};
use crate::types::{BookingId, HoldId, HotelId, RoomTypeId, UserId};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct BookingCreate {
    #[schema(value_type = String, format = "uuid")]
    pub room_type_id: RoomTypeId,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub guests: i32,
    #[serde(default = "default_rooms")]
    pub rooms: i32,
    /// Consume this hold; it must cover the same room type, dates and room count
    #[schema(value_type = Option<String>, format = "uuid")]
    pub hold_id: Option<HoldId>,
    pub promo_code: Option<String>,
    pub special_requests: Option<String>,
}

fn default_rooms() -> i32 {
    1
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct BookingUpdate {
    pub check_in: Option<NaiveDate>,
    pub check_out: Option<NaiveDate>,
    pub guests: Option<i32>,
    pub rooms: Option<i32>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct BookingStatusUpdate {
    pub status: BookingStatus,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BookingResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: BookingId,
    #[schema(value_type = String, format = "uuid")]
    pub user_id: UserId,
    #[schema(value_type = String, format = "uuid")]
    pub hotel_id: HotelId,
    #[schema(value_type = String, format = "uuid")]
    pub room_type_id: RoomTypeId,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub hold_id: Option<HoldId>,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub nights: i64,
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

impl From<BookingDBResponse> for BookingResponse {
    fn from(db: BookingDBResponse) -> Self {
        Self {
            nights: (db.check_out - db.check_in).num_days(),
            id: db.id,
            user_id: db.user_id,
            hotel_id: db.hotel_id,
            room_type_id: db.room_type_id,
            hold_id: db.hold_id,
            check_in: db.check_in,
            check_out: db.check_out,
            guests: db.guests,
            rooms: db.rooms,
            subtotal: db.subtotal,
            discount: db.discount,
            total_price: db.total_price,
            promo_code: db.promo_code,
            status: db.status,
            special_requests: db.special_requests,
            created_at: db.created_at,
            updated_at: db.updated_at,
            cancelled_at: db.cancelled_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BookingEventResponse {
    pub from_status: Option<BookingStatus>,
    pub to_status: BookingStatus,
    #[schema(value_type = String, format = "uuid")]
    pub actor_id: UserId,
    pub created_at: DateTime<Utc>,
}

impl From<BookingEventDBResponse> for BookingEventResponse {
    fn from(db: BookingEventDBResponse) -> Self {
        Self {
            from_status: db.from_status,
            to_status: db.to_status,
            actor_id: db.actor_id,
            created_at: db.created_at,
        }
    }
}

/// Query parameters for listing bookings
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListBookingsQuery {
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,
    pub status: Option<BookingStatus>,
    #[param(value_type = Option<String>, format = "uuid")]
    pub hotel_id: Option<HotelId>,
    /// Earliest check-in date, inclusive
    pub check_in_from: Option<NaiveDate>,
    /// Latest check-in date, inclusive
    pub check_in_to: Option<NaiveDate>,
}
