//! API request/response models for hotels, room types and rooms.

use super::pagination::Pagination;
use crate::db::models::hotels::{HotelDBResponse, HotelStatus, RoomDBResponse, RoomTypeDBResponse};
use crate::types::{DestinationId, HotelId, RoomId, RoomTypeId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct HotelCreate {
    pub name: String,
    pub address: String,
    pub city: String,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub destination_id: Option<DestinationId>,
    pub description: Option<String>,
    /// 1 to 5
    pub star_rating: Option<i16>,
    /// Defaults to `active`
    pub status: Option<HotelStatus>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct HotelUpdate {
    pub name: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub destination_id: Option<DestinationId>,
    pub description: Option<String>,
    pub star_rating: Option<i16>,
    pub status: Option<HotelStatus>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct HotelResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: HotelId,
    #[schema(value_type = String, format = "uuid")]
    pub owner_id: UserId,
    #[schema(value_type = Option<String>, format = "uuid")]
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

impl From<HotelDBResponse> for HotelResponse {
    fn from(db: HotelDBResponse) -> Self {
        Self {
            id: db.id,
            owner_id: db.owner_id,
            destination_id: db.destination_id,
            name: db.name,
            address: db.address,
            city: db.city,
            description: db.description,
            star_rating: db.star_rating,
            status: db.status,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

/// Query parameters for listing hotels
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListHotelsQuery {
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,
    #[param(value_type = Option<String>, format = "uuid")]
    pub destination_id: Option<DestinationId>,
    pub city: Option<String>,
    /// Case-insensitive substring match on the hotel name
    pub search: Option<String>,
    /// Only honoured on the managed listing; the public listing shows active hotels
    pub status: Option<HotelStatus>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RoomTypeCreate {
    pub name: String,
    pub description: Option<String>,
    /// Nightly price in minor currency units
    pub base_price: i64,
    pub max_guests: i32,
    /// Room numbers to create along with the type
    #[serde(default)]
    pub rooms: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct RoomTypeUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub base_price: Option<i64>,
    pub max_guests: Option<i32>,
    pub is_available: Option<bool>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RoomTypeResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: RoomTypeId,
    #[schema(value_type = String, format = "uuid")]
    pub hotel_id: HotelId,
    pub name: String,
    pub description: Option<String>,
    pub base_price: i64,
    pub max_guests: i32,
    pub is_available: bool,
    /// Active rooms of this type, when loaded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_rooms: Option<usize>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<RoomTypeDBResponse> for RoomTypeResponse {
    fn from(db: RoomTypeDBResponse) -> Self {
        Self {
            id: db.id,
            hotel_id: db.hotel_id,
            name: db.name,
            description: db.description,
            base_price: db.base_price,
            max_guests: db.max_guests,
            is_available: db.is_available,
            active_rooms: None,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

impl RoomTypeResponse {
    pub fn with_active_rooms(mut self, active_rooms: usize) -> Self {
        self.active_rooms = Some(active_rooms);
        self
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RoomCreate {
    pub room_number: String,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct RoomUpdate {
    pub room_number: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RoomResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: RoomId,
    #[schema(value_type = String, format = "uuid")]
    pub room_type_id: RoomTypeId,
    pub room_number: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<RoomDBResponse> for RoomResponse {
    fn from(db: RoomDBResponse) -> Self {
        Self {
            id: db.id,
            room_type_id: db.room_type_id,
            room_number: db.room_number,
            is_active: db.is_active,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}
