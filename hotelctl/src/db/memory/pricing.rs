use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::InMemoryStore;
use crate::db::errors::{DbError, Result};
use crate::db::models::pricing::{
    PricingRuleCreateDBRequest, PricingRuleDBResponse, PromoCodeCreateDBRequest, PromoCodeDBResponse, PromoCodeUpdateDBRequest,
};
use crate::db::store::PricingStore;
use crate::types::{HotelId, PricingRuleId, PromoCodeId, RoomTypeId};

#[async_trait]
impl PricingStore for InMemoryStore {
    async fn create_pricing_rule(&self, request: &PricingRuleCreateDBRequest) -> Result<PricingRuleDBResponse> {
        let mut tables = self.tables.write();
        if !tables.room_types.contains_key(&request.room_type_id) {
            return Err(DbError::foreign_key("pricing_rules", "pricing_rules_room_type_id_fkey"));
        }

        let rule = PricingRuleDBResponse {
            id: Uuid::new_v4(),
            room_type_id: request.room_type_id,
            label: request.label.clone(),
            start_date: request.start_date,
            end_date: request.end_date,
            weekdays: request.weekdays,
            kind: request.kind,
            value: request.value,
            priority: request.priority,
            created_at: Utc::now(),
        };
        tables.pricing_rules.insert(rule.id, rule.clone());
        Ok(rule)
    }

    async fn get_pricing_rule(&self, id: PricingRuleId) -> Result<Option<PricingRuleDBResponse>> {
        Ok(self.tables.read().pricing_rules.get(&id).cloned())
    }

    async fn list_pricing_rules(&self, room_type_id: RoomTypeId) -> Result<Vec<PricingRuleDBResponse>> {
        let mut rules: Vec<_> = self
            .tables
            .read()
            .pricing_rules
            .values()
            .filter(|rule| rule.room_type_id == room_type_id)
            .cloned()
            .collect();
        rules.sort_by(|a, b| a.start_date.cmp(&b.start_date).then(a.created_at.cmp(&b.created_at)).then(a.id.cmp(&b.id)));
        Ok(rules)
    }

    async fn delete_pricing_rule(&self, id: PricingRuleId) -> Result<bool> {
        Ok(self.tables.write().pricing_rules.remove(&id).is_some())
    }

    async fn create_promo_code(&self, request: &PromoCodeCreateDBRequest) -> Result<PromoCodeDBResponse> {
        let mut tables = self.tables.write();
        let code = request.code.to_uppercase();
        if tables.promo_codes.values().any(|promo| promo.code == code) {
            return Err(DbError::unique("promo_codes", "promo_codes_code_key"));
        }
        if let Some(hotel_id) = request.hotel_id
            && !tables.hotels.contains_key(&hotel_id)
        {
            return Err(DbError::foreign_key("promo_codes", "promo_codes_hotel_id_fkey"));
        }

        let promo = PromoCodeDBResponse {
            id: Uuid::new_v4(),
            code,
            kind: request.kind,
            value: request.value,
            valid_from: request.valid_from,
            valid_until: request.valid_until,
            min_nights: request.min_nights,
            hotel_id: request.hotel_id,
            is_active: true,
            created_at: Utc::now(),
        };
        tables.promo_codes.insert(promo.id, promo.clone());
        Ok(promo)
    }

    async fn get_promo_code(&self, id: PromoCodeId) -> Result<Option<PromoCodeDBResponse>> {
        Ok(self.tables.read().promo_codes.get(&id).cloned())
    }

    async fn get_promo_code_by_code(&self, code: &str) -> Result<Option<PromoCodeDBResponse>> {
        let code = code.to_uppercase();
        Ok(self.tables.read().promo_codes.values().find(|promo| promo.code == code).cloned())
    }

    async fn list_promo_codes(&self, hotel_id: Option<HotelId>) -> Result<Vec<PromoCodeDBResponse>> {
        let mut promos: Vec<_> = self
            .tables
            .read()
            .promo_codes
            .values()
            .filter(|promo| hotel_id.is_none() || promo.hotel_id.is_none() || promo.hotel_id == hotel_id)
            .cloned()
            .collect();
        promos.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(promos)
    }

    async fn update_promo_code(&self, id: PromoCodeId, request: &PromoCodeUpdateDBRequest) -> Result<PromoCodeDBResponse> {
        let mut tables = self.tables.write();
        let promo = tables.promo_codes.get_mut(&id).ok_or(DbError::NotFound)?;
        if let Some(is_active) = request.is_active {
            promo.is_active = is_active;
        }
        if let Some(value) = request.value {
            promo.value = value;
        }
        if let Some(valid_from) = request.valid_from {
            promo.valid_from = Some(valid_from);
        }
        if let Some(valid_until) = request.valid_until {
            promo.valid_until = Some(valid_until);
        }
        if let Some(min_nights) = request.min_nights {
            promo.min_nights = Some(min_nights);
        }
        Ok(promo.clone())
    }
}
