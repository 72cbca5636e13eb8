//! Pricing engine: quotes, nightly rate lookups and rule/promo management.
//!
//! All amounts are integer minor units of the configured currency. Rate resolution lives in
//! [`rules`]; this module loads what it needs from the store and assembles quotes.

pub mod rules;

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tracing::instrument;
use utoipa::ToSchema;

use crate::config::Config;
use crate::db::Store;
use crate::db::models::hotels::RoomTypeDBResponse;
use crate::db::models::pricing::{
    AdjustmentKind, DiscountKind, PricingRuleCreateDBRequest, PricingRuleDBResponse, PromoCodeCreateDBRequest, PromoCodeDBResponse,
    PromoCodeUpdateDBRequest,
};
use crate::errors::{Error, Result};
use crate::stay::{DateRange, Stay};
use crate::types::{HotelId, PricingRuleId, PromoCodeId, RoomTypeId, abbrev_uuid};

pub use rules::{NightlyPrice, PromoOutcome};

/// Inputs to a price calculation
#[derive(Debug, Clone)]
pub struct QuoteRequest {
    pub room_type_id: RoomTypeId,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub guests: i32,
    pub rooms: i32,
    pub promo_code: Option<String>,
}

/// A priced stay
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Quote {
    #[schema(value_type = String, format = "uuid")]
    pub room_type_id: RoomTypeId,
    #[schema(value_type = String, format = "uuid")]
    pub hotel_id: HotelId,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub nights: i64,
    pub guests: i32,
    pub rooms: i32,
    pub currency: String,
    /// Per-room price of each night
    pub nightly: Vec<NightlyPrice>,
    /// Sum of nightly prices times rooms
    pub subtotal: i64,
    pub discount: i64,
    pub total: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub promo: Option<PromoOutcome>,
}

impl Quote {
    /// Promo code to record on a booking: only codes that were actually applied
    pub fn applied_promo_code(&self) -> Option<String> {
        self.promo.as_ref().filter(|promo| promo.applied).map(|promo| promo.code.clone())
    }
}

/// Nightly prices over an inclusive date range
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PriceRange {
    #[schema(value_type = String, format = "uuid")]
    pub room_type_id: RoomTypeId,
    pub currency: String,
    pub nightly: Vec<NightlyPrice>,
    pub min: i64,
    pub max: i64,
    /// Mean nightly price, rounded half-up
    pub average: i64,
}

#[derive(Clone)]
pub struct PricingService {
    store: Arc<dyn Store>,
    currency: String,
    max_stay_nights: i64,
    max_rooms_per_request: i32,
}

impl PricingService {
    pub fn new(store: Arc<dyn Store>, config: &Config) -> Self {
        Self {
            store,
            currency: config.pricing.currency.clone(),
            max_stay_nights: config.inventory.max_stay_nights,
            max_rooms_per_request: config.inventory.max_rooms_per_request,
        }
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub(crate) async fn room_type(&self, id: RoomTypeId) -> Result<RoomTypeDBResponse> {
        self.store
            .get_room_type(id)
            .await?
            .ok_or_else(|| Error::not_found("Room type", id))
    }

    /// Price a stay. Invalid promo codes are reported on the quote, never as an error.
    #[instrument(skip(self, request), fields(room_type_id = %abbrev_uuid(&request.room_type_id)), err)]
    pub async fn quote(&self, request: &QuoteRequest, now: DateTime<Utc>) -> Result<Quote> {
        let room_type = self.room_type(request.room_type_id).await?;
        let stay = Stay::new(request.check_in, request.check_out, self.max_stay_nights)?;
        self.quote_for(&room_type, stay, request.guests, request.rooms, request.promo_code.as_deref(), now)
            .await
    }

    pub(crate) async fn quote_for(
        &self,
        room_type: &RoomTypeDBResponse,
        stay: Stay,
        guests: i32,
        rooms: i32,
        promo_code: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Quote> {
        self.validate_party(room_type, guests, rooms)?;

        let rules = self.store.list_pricing_rules(room_type.id).await?;
        let nightly: Vec<NightlyPrice> = stay
            .dates()
            .map(|date| rules::nightly_price(room_type.base_price, &rules, date))
            .collect();
        let per_room: i128 = nightly.iter().map(|night| i128::from(night.price)).sum();
        let subtotal = i64::try_from(per_room * i128::from(rooms))
            .map_err(|_| Error::validation("Stay total exceeds the largest supported price"))?;

        let promo = match promo_code.map(str::trim).filter(|code| !code.is_empty()) {
            Some(code) => {
                let stored = self.store.get_promo_code_by_code(code).await?;
                Some(rules::evaluate_promo(
                    code,
                    stored.as_ref(),
                    room_type.hotel_id,
                    stay.nights(),
                    subtotal,
                    now,
                ))
            }
            None => None,
        };
        let discount = promo.as_ref().map_or(0, |promo| promo.discount);

        Ok(Quote {
            room_type_id: room_type.id,
            hotel_id: room_type.hotel_id,
            check_in: stay.check_in,
            check_out: stay.check_out,
            nights: stay.nights(),
            guests,
            rooms,
            currency: self.currency.clone(),
            nightly,
            subtotal,
            discount,
            total: subtotal - discount,
            promo,
        })
    }

    fn validate_party(&self, room_type: &RoomTypeDBResponse, guests: i32, rooms: i32) -> Result<()> {
        if rooms < 1 || rooms > self.max_rooms_per_request {
            return Err(Error::invalid_field(
                "rooms",
                format!("must be between 1 and {}", self.max_rooms_per_request),
            ));
        }
        let capacity = room_type.max_guests.saturating_mul(rooms);
        if guests < 1 || guests > capacity {
            return Err(Error::invalid_field(
                "guests",
                format!("must be between 1 and {capacity} for {rooms} room(s) of this type"),
            ));
        }
        Ok(())
    }

    #[instrument(skip(self), fields(room_type_id = %abbrev_uuid(&room_type_id)), err)]
    pub async fn price_for_date(&self, room_type_id: RoomTypeId, date: NaiveDate) -> Result<NightlyPrice> {
        let room_type = self.room_type(room_type_id).await?;
        let rules = self.store.list_pricing_rules(room_type_id).await?;
        Ok(rules::nightly_price(room_type.base_price, &rules, date))
    }

    #[instrument(skip(self), fields(room_type_id = %abbrev_uuid(&room_type_id)), err)]
    pub async fn price_range(&self, room_type_id: RoomTypeId, start: NaiveDate, end: NaiveDate) -> Result<PriceRange> {
        let range = DateRange::new(start, end)?;
        let room_type = self.room_type(room_type_id).await?;
        let rules = self.store.list_pricing_rules(room_type_id).await?;
        Ok(self.price_range_for(&room_type, &rules, range))
    }

    pub(crate) fn price_range_for(&self, room_type: &RoomTypeDBResponse, rules: &[PricingRuleDBResponse], range: DateRange) -> PriceRange {
        let nightly: Vec<NightlyPrice> = range
            .dates()
            .map(|date| rules::nightly_price(room_type.base_price, rules, date))
            .collect();
        let min = nightly.iter().map(|night| night.price).min().unwrap_or(0);
        let max = nightly.iter().map(|night| night.price).max().unwrap_or(0);
        let sum: i128 = nightly.iter().map(|night| night.price as i128).sum();
        let average = if nightly.is_empty() {
            0
        } else {
            rules::round_half_up(sum, nightly.len() as i128)
        };
        PriceRange {
            room_type_id: room_type.id,
            currency: self.currency.clone(),
            nightly,
            min,
            max,
            average,
        }
    }

    #[instrument(skip(self, request), fields(room_type_id = %abbrev_uuid(&request.room_type_id)), err)]
    pub async fn create_rule(&self, request: &PricingRuleCreateDBRequest) -> Result<PricingRuleDBResponse> {
        if request.label.trim().is_empty() {
            return Err(Error::invalid_field("label", "must not be empty"));
        }
        if request.start_date > request.end_date {
            return Err(Error::invalid_field("end_date", "must not be before start_date"));
        }
        if let Some(mask) = request.weekdays
            && !(1..=0b111_1111).contains(&mask)
        {
            return Err(Error::invalid_field("weekdays", "must select at least one day (bits 0..6)"));
        }
        match request.kind {
            AdjustmentKind::Percent if !(-10_000..=rules::MAX_PERCENT_ADJUSTMENT).contains(&request.value) => {
                return Err(Error::invalid_field("value", "percent adjustments must be between -100% and +1000%"));
            }
            AdjustmentKind::Amount if request.value.abs() > rules::MAX_NIGHTLY_PRICE => {
                return Err(Error::invalid_field(
                    "value",
                    format!("amount adjustments must be within {}", rules::MAX_NIGHTLY_PRICE),
                ));
            }
            AdjustmentKind::Override if !(0..=rules::MAX_NIGHTLY_PRICE).contains(&request.value) => {
                return Err(Error::invalid_field(
                    "value",
                    format!("override price must be between 0 and {}", rules::MAX_NIGHTLY_PRICE),
                ));
            }
            _ => {}
        }
        self.room_type(request.room_type_id).await?;

        let rule = self.store.create_pricing_rule(request).await?;
        tracing::info!(rule_id = %abbrev_uuid(&rule.id), label = %rule.label, "Created pricing rule");
        Ok(rule)
    }

    pub async fn get_rule(&self, id: PricingRuleId) -> Result<PricingRuleDBResponse> {
        self.store
            .get_pricing_rule(id)
            .await?
            .ok_or_else(|| Error::not_found("Pricing rule", id))
    }

    pub async fn list_rules(&self, room_type_id: RoomTypeId) -> Result<Vec<PricingRuleDBResponse>> {
        self.room_type(room_type_id).await?;
        Ok(self.store.list_pricing_rules(room_type_id).await?)
    }

    #[instrument(skip(self), fields(rule_id = %abbrev_uuid(&id)), err)]
    pub async fn delete_rule(&self, id: PricingRuleId) -> Result<()> {
        if !self.store.delete_pricing_rule(id).await? {
            return Err(Error::not_found("Pricing rule", id));
        }
        Ok(())
    }

    #[instrument(skip(self, request), fields(code = %request.code), err)]
    pub async fn create_promo(&self, request: &PromoCodeCreateDBRequest) -> Result<PromoCodeDBResponse> {
        let code = request.code.trim();
        if code.len() < 3 || code.len() > 32 || !code.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
            return Err(Error::invalid_field(
                "code",
                "must be 3 to 32 letters, digits, '-' or '_'",
            ));
        }
        validate_discount(request.kind, request.value)?;
        validate_window(request.valid_from, request.valid_until, request.min_nights)?;

        let request = PromoCodeCreateDBRequest {
            code: code.to_uppercase(),
            ..request.clone()
        };
        Ok(self.store.create_promo_code(&request).await?)
    }

    pub async fn get_promo(&self, id: PromoCodeId) -> Result<PromoCodeDBResponse> {
        self.store
            .get_promo_code(id)
            .await?
            .ok_or_else(|| Error::not_found("Promo code", id))
    }

    pub async fn list_promos(&self, hotel_id: Option<HotelId>) -> Result<Vec<PromoCodeDBResponse>> {
        Ok(self.store.list_promo_codes(hotel_id).await?)
    }

    #[instrument(skip(self, request), fields(promo_id = %abbrev_uuid(&id)), err)]
    pub async fn update_promo(&self, id: PromoCodeId, request: &PromoCodeUpdateDBRequest) -> Result<PromoCodeDBResponse> {
        let current = self.get_promo(id).await?;
        if let Some(value) = request.value {
            validate_discount(current.kind, value)?;
        }
        validate_window(
            request.valid_from.or(current.valid_from),
            request.valid_until.or(current.valid_until),
            request.min_nights,
        )?;
        Ok(self.store.update_promo_code(id, request).await?)
    }
}

fn validate_discount(kind: DiscountKind, value: i64) -> Result<()> {
    match kind {
        DiscountKind::Percent if !(1..=100).contains(&value) => Err(Error::invalid_field("value", "percent discounts must be 1 to 100")),
        DiscountKind::Fixed if value <= 0 => Err(Error::invalid_field("value", "fixed discounts must be positive")),
        _ => Ok(()),
    }
}

fn validate_window(valid_from: Option<DateTime<Utc>>, valid_until: Option<DateTime<Utc>>, min_nights: Option<i32>) -> Result<()> {
    if let (Some(from), Some(until)) = (valid_from, valid_until)
        && from >= until
    {
        return Err(Error::invalid_field("valid_until", "must be after valid_from"));
    }
    if min_nights.is_some_and(|nights| nights < 1) {
        return Err(Error::invalid_field("min_nights", "must be at least 1"));
    }
    Ok(())
}
