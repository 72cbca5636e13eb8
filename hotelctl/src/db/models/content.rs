//! Database models for destinations and reviews.

use crate::types::{DestinationId, HotelId, ReviewId, UserId};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Clone)]
pub struct DestinationCreateDBRequest {
    pub name: String,
    pub country: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct DestinationUpdateDBRequest {
    pub name: Option<String>,
    pub country: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, FromRow)]
pub struct DestinationDBResponse {
    pub id: DestinationId,
    pub name: String,
    pub country: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ReviewCreateDBRequest {
    pub hotel_id: HotelId,
    pub user_id: UserId,
    pub rating: i16,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, FromRow)]
pub struct ReviewDBResponse {
    pub id: ReviewId,
    pub hotel_id: HotelId,
    pub user_id: UserId,
    pub rating: i16,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, FromRow)]
pub struct ReviewSummary {
    pub review_count: i64,
    pub average_rating: Option<f64>,
}
