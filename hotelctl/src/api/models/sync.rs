//! API request models for synchronization.

use crate::types::HotelId;
use chrono::NaiveDate;
use serde::Deserialize;
use utoipa::ToSchema;

/// Inclusive range of days to push
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SyncRangeRequest {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SyncMultipleRequest {
    #[schema(value_type = Vec<String>)]
    pub hotel_ids: Vec<HotelId>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}
