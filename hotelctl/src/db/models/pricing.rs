//! Database models for seasonal pricing rules and promo codes.

use crate::types::{HotelId, PricingRuleId, PromoCodeId, RoomTypeId};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// How a pricing rule changes the base nightly price
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "price_adjustment", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentKind {
    /// `value` is in basis points, e.g. 1500 = +15%, -1000 = -10%
    Percent,
    /// `value` is a signed amount in minor units added to the base price
    Amount,
    /// `value` replaces the base price
    Override,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "discount_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DiscountKind {
    /// `value` is a whole percentage (1..=100)
    Percent,
    /// `value` is an amount in minor units
    Fixed,
}

#[derive(Debug, Clone)]
pub struct PricingRuleCreateDBRequest {
    pub room_type_id: RoomTypeId,
    pub label: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub weekdays: Option<i16>,
    pub kind: AdjustmentKind,
    pub value: i64,
    pub priority: i32,
}

#[derive(Debug, Clone, FromRow)]
pub struct PricingRuleDBResponse {
    pub id: PricingRuleId,
    pub room_type_id: RoomTypeId,
    pub label: String,
    pub start_date: NaiveDate,
    /// Inclusive
    pub end_date: NaiveDate,
    /// Bit 0 = Monday .. bit 6 = Sunday; `None` matches every day
    pub weekdays: Option<i16>,
    pub kind: AdjustmentKind,
    pub value: i64,
    pub priority: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct PromoCodeCreateDBRequest {
    pub code: String,
    pub kind: DiscountKind,
    pub value: i64,
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_until: Option<DateTime<Utc>>,
    pub min_nights: Option<i32>,
    pub hotel_id: Option<HotelId>,
}

#[derive(Debug, Clone, Default)]
pub struct PromoCodeUpdateDBRequest {
    pub is_active: Option<bool>,
    pub value: Option<i64>,
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_until: Option<DateTime<Utc>>,
    pub min_nights: Option<i32>,
}

#[derive(Debug, Clone, FromRow)]
pub struct PromoCodeDBResponse {
    pub id: PromoCodeId,
    /// Stored upper-cased; lookups are case-insensitive
    pub code: String,
    pub kind: DiscountKind,
    pub value: i64,
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_until: Option<DateTime<Utc>>,
    pub min_nights: Option<i32>,
    pub hotel_id: Option<HotelId>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}
