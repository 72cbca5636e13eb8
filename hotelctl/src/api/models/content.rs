//! API request/response models for destinations and reviews.

use super::pagination::PaginatedResponse;
use crate::db::models::content::{DestinationDBResponse, ReviewDBResponse};
use crate::types::{DestinationId, HotelId, ReviewId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct DestinationCreate {
    pub name: String,
    pub country: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct DestinationUpdate {
    pub name: Option<String>,
    pub country: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DestinationResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: DestinationId,
    pub name: String,
    pub country: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<DestinationDBResponse> for DestinationResponse {
    fn from(db: DestinationDBResponse) -> Self {
        Self {
            id: db.id,
            name: db.name,
            country: db.country,
            description: db.description,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ReviewCreate {
    /// 1 to 5
    pub rating: i16,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ReviewResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: ReviewId,
    #[schema(value_type = String, format = "uuid")]
    pub hotel_id: HotelId,
    #[schema(value_type = String, format = "uuid")]
    pub user_id: UserId,
    pub rating: i16,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<ReviewDBResponse> for ReviewResponse {
    fn from(db: ReviewDBResponse) -> Self {
        Self {
            id: db.id,
            hotel_id: db.hotel_id,
            user_id: db.user_id,
            rating: db.rating,
            comment: db.comment,
            created_at: db.created_at,
        }
    }
}

/// A page of reviews plus the hotel-wide aggregate
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ReviewListResponse {
    pub reviews: PaginatedResponse<ReviewResponse>,
    pub review_count: i64,
    /// `None` until the first review
    pub average_rating: Option<f64>,
}
