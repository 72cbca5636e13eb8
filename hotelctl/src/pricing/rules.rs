//! Nightly rate resolution and promo evaluation.
//!
//! Pure functions over stored rules so quotes are deterministic: the same room type, rules, dates
//! and promo code always produce the same numbers.
//!
//! Precedence: among the rules covering a night, the one with the shortest date span wins. Ties go
//! to the higher `priority`, then the most recently created rule, then the smallest id. Exactly
//! one rule applies per night; rules never stack.

use std::cmp::Reverse;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::db::models::pricing::{AdjustmentKind, DiscountKind, PricingRuleDBResponse, PromoCodeDBResponse};
use crate::types::HotelId;

/// Largest nightly price accepted for a room type, an override or a synced update, in minor units
pub const MAX_NIGHTLY_PRICE: i64 = 1_000_000_000_000;

/// Largest percent adjustment in basis points (+1000%)
pub const MAX_PERCENT_ADJUSTMENT: i64 = 100_000;

/// Integer division of `numerator / denominator` rounding halves away from zero.
pub fn round_half_up(numerator: i128, denominator: i128) -> i64 {
    debug_assert!(denominator > 0);
    let half = denominator / 2;
    let rounded = if numerator >= 0 {
        (numerator + half) / denominator
    } else {
        -((-numerator + half) / denominator)
    };
    rounded.clamp(i64::MIN as i128, i64::MAX as i128) as i64
}

/// Whether `rule` covers `date`, including its weekday mask (bit 0 = Monday).
pub fn rule_matches(rule: &PricingRuleDBResponse, date: NaiveDate) -> bool {
    if date < rule.start_date || date > rule.end_date {
        return false;
    }
    match rule.weekdays {
        Some(mask) => mask & (1 << date.weekday().num_days_from_monday()) != 0,
        None => true,
    }
}

/// The single rule applying to `date`, if any.
pub fn select_rule(rules: &[PricingRuleDBResponse], date: NaiveDate) -> Option<&PricingRuleDBResponse> {
    rules
        .iter()
        .filter(|rule| rule_matches(rule, date))
        .min_by_key(|rule| {
            (
                (rule.end_date - rule.start_date).num_days(),
                Reverse(rule.priority),
                Reverse(rule.created_at),
                rule.id,
            )
        })
}

/// Applies one adjustment to a base price. Never goes below zero.
pub fn apply_adjustment(base_price: i64, kind: AdjustmentKind, value: i64) -> i64 {
    let adjusted = match kind {
        AdjustmentKind::Percent => base_price.saturating_add(round_half_up(base_price as i128 * value as i128, 10_000)),
        AdjustmentKind::Amount => base_price.saturating_add(value),
        AdjustmentKind::Override => value,
    };
    adjusted.max(0)
}

/// Price of one night of one room
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct NightlyPrice {
    pub date: NaiveDate,
    pub base_price: i64,
    /// Label of the rule that set this night's price
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule_label: Option<String>,
    pub price: i64,
}

pub fn nightly_price(base_price: i64, rules: &[PricingRuleDBResponse], date: NaiveDate) -> NightlyPrice {
    match select_rule(rules, date) {
        Some(rule) => NightlyPrice {
            date,
            base_price,
            rule_label: Some(rule.label.clone()),
            price: apply_adjustment(base_price, rule.kind, rule.value),
        },
        None => NightlyPrice {
            date,
            base_price,
            rule_label: None,
            price: base_price,
        },
    }
}

/// What happened to the promo code on a quote
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct PromoOutcome {
    pub code: String,
    pub applied: bool,
    pub discount: i64,
    /// Why the code was not applied
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl PromoOutcome {
    fn rejected(code: &str, reason: &str) -> Self {
        Self {
            code: code.to_string(),
            applied: false,
            discount: 0,
            reason: Some(reason.to_string()),
        }
    }
}

/// Evaluates `code` against a stay. A missing or ineligible code yields a zero discount with a
/// reason; it never fails the quote.
pub fn evaluate_promo(
    code: &str,
    promo: Option<&PromoCodeDBResponse>,
    hotel_id: HotelId,
    nights: i64,
    subtotal: i64,
    now: DateTime<Utc>,
) -> PromoOutcome {
    let Some(promo) = promo else {
        return PromoOutcome::rejected(code, "unknown promo code");
    };
    if !promo.is_active {
        return PromoOutcome::rejected(code, "promo code is inactive");
    }
    if promo.valid_from.is_some_and(|from| now < from) {
        return PromoOutcome::rejected(code, "promo code is not yet valid");
    }
    if promo.valid_until.is_some_and(|until| now > until) {
        return PromoOutcome::rejected(code, "promo code has expired");
    }
    if promo.hotel_id.is_some_and(|scope| scope != hotel_id) {
        return PromoOutcome::rejected(code, "promo code does not apply to this hotel");
    }
    if let Some(min_nights) = promo.min_nights
        && nights < i64::from(min_nights)
    {
        return PromoOutcome::rejected(code, &format!("promo code requires at least {min_nights} nights"));
    }

    let discount = match promo.kind {
        DiscountKind::Percent => round_half_up(subtotal as i128 * promo.value as i128, 100),
        DiscountKind::Fixed => promo.value.min(subtotal),
    };
    PromoOutcome {
        code: promo.code.clone(),
        applied: true,
        discount: discount.clamp(0, subtotal),
        reason: None,
    }
}
