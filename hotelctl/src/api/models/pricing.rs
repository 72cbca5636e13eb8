//! API request/response models for quotes, pricing rules and promo codes.

use crate::db::models::pricing::{AdjustmentKind, DiscountKind, PricingRuleDBResponse, PromoCodeDBResponse};
use crate::types::{HotelId, PricingRuleId, PromoCodeId, RoomTypeId};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct QuoteCreate {
    #[schema(value_type = String, format = "uuid")]
    pub room_type_id: RoomTypeId,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    #[serde(default = "one")]
    pub guests: i32,
    #[serde(default = "one")]
    pub rooms: i32,
    pub promo_code: Option<String>,
}

fn one() -> i32 {
    1
}

#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PriceDateQuery {
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct PricingRuleCreate {
    pub label: String,
    pub start_date: NaiveDate,
    /// Inclusive
    pub end_date: NaiveDate,
    /// Bit 0 = Monday .. bit 6 = Sunday; omit to match every day
    pub weekdays: Option<i16>,
    pub kind: AdjustmentKind,
    pub value: i64,
    #[serde(default)]
    pub priority: i32,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PricingRuleResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: PricingRuleId,
    #[schema(value_type = String, format = "uuid")]
    pub room_type_id: RoomTypeId,
    pub label: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub weekdays: Option<i16>,
    pub kind: AdjustmentKind,
    pub value: i64,
    pub priority: i32,
    pub created_at: DateTime<Utc>,
}

impl From<PricingRuleDBResponse> for PricingRuleResponse {
    fn from(db: PricingRuleDBResponse) -> Self {
        Self {
            id: db.id,
            room_type_id: db.room_type_id,
            label: db.label,
            start_date: db.start_date,
            end_date: db.end_date,
            weekdays: db.weekdays,
            kind: db.kind,
            value: db.value,
            priority: db.priority,
            created_at: db.created_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct PromoCodeCreate {
    pub code: String,
    pub kind: DiscountKind,
    pub value: i64,
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_until: Option<DateTime<Utc>>,
    pub min_nights: Option<i32>,
    /// Omit for a platform-wide code (admins only)
    #[schema(value_type = Option<String>, format = "uuid")]
    pub hotel_id: Option<HotelId>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct PromoCodeUpdate {
    pub is_active: Option<bool>,
    pub value: Option<i64>,
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_until: Option<DateTime<Utc>>,
    pub min_nights: Option<i32>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PromoCodeResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: PromoCodeId,
    pub code: String,
    pub kind: DiscountKind,
    pub value: i64,
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_until: Option<DateTime<Utc>>,
    pub min_nights: Option<i32>,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub hotel_id: Option<HotelId>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<PromoCodeDBResponse> for PromoCodeResponse {
    fn from(db: PromoCodeDBResponse) -> Self {
        Self {
            id: db.id,
            code: db.code,
            kind: db.kind,
            value: db.value,
            valid_from: db.valid_from,
            valid_until: db.valid_until,
            min_nights: db.min_nights,
            hotel_id: db.hotel_id,
            is_active: db.is_active,
            created_at: db.created_at,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListPromoCodesQuery {
    /// The hotel's codes plus platform-wide ones; required for managers
    #[param(value_type = Option<String>, format = "uuid")]
    pub hotel_id: Option<HotelId>,
}
