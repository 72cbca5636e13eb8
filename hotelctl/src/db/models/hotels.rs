//! Database models for hotels, room types and rooms.

use crate::types::{DestinationId, HotelId, RoomId, RoomTypeId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use utoipa::ToSchema;

/// Listing state of a hotel. Only `active` hotels have bookable inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "hotel_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum HotelStatus {
    Active,
    Inactive,
    Pending,
}

impl fmt::Display for HotelStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HotelStatus::Active => write!(f, "active"),
            HotelStatus::Inactive => write!(f, "inactive"),
            HotelStatus::Pending => write!(f, "pending"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct HotelCreateDBRequest {
    pub owner_id: UserId,
    pub destination_id: Option<DestinationId>,
    pub name: String,
    pub address: String,
    pub city: String,
    pub description: Option<String>,
    pub star_rating: Option<i16>,
    pub status: HotelStatus,
}

#[derive(Debug, Clone, Default)]
pub struct HotelUpdateDBRequest {
    pub destination_id: Option<DestinationId>,
    pub name: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub description: Option<String>,
    pub star_rating: Option<i16>,
    pub status: Option<HotelStatus>,
}

#[derive(Debug, Clone, FromRow)]
pub struct HotelDBResponse {
    pub id: HotelId,
    pub owner_id: UserId,
    pub destination_id: Option<DestinationId>,
    pub name: String,
    pub address: String,
    pub city: String,
    pub description: Option<String>,
    pub star_rating: Option<i16>,
    pub status: HotelStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct HotelFilter {
    pub owner_id: Option<UserId>,
    pub destination_id: Option<DestinationId>,
    pub city: Option<String>,
    /// Case-insensitive substring match on the hotel name
    pub search: Option<String>,
    pub status: Option<HotelStatus>,
    pub skip: i64,
    pub limit: i64,
}

#[derive(Debug, Clone)]
pub struct RoomTypeCreateDBRequest {
    pub hotel_id: HotelId,
    pub name: String,
    pub description: Option<String>,
    pub base_price: i64,
    pub max_guests: i32,
}

#[derive(Debug, Clone, Default)]
pub struct RoomTypeUpdateDBRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub base_price: Option<i64>,
    pub max_guests: Option<i32>,
    pub is_available: Option<bool>,
}

#[derive(Debug, Clone, FromRow)]
pub struct RoomTypeDBResponse {
    pub id: RoomTypeId,
    pub hotel_id: HotelId,
    pub name: String,
    pub description: Option<String>,
    /// Nightly price in minor currency units
    pub base_price: i64,
    pub max_guests: i32,
    pub is_available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct RoomCreateDBRequest {
    pub room_type_id: RoomTypeId,
    pub room_number: String,
}

#[derive(Debug, Clone, Default)]
pub struct RoomUpdateDBRequest {
    pub room_number: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, FromRow)]
pub struct RoomDBResponse {
    pub id: RoomId,
    pub room_type_id: RoomTypeId,
    pub room_number: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
