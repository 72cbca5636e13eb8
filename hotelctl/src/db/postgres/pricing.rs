use async_trait::async_trait;
use tracing::instrument;
use uuid::Uuid;

use super::PostgresStore;
use crate::db::errors::{DbError, Result};
use crate::db::models::pricing::{
    PricingRuleCreateDBRequest, PricingRuleDBResponse, PromoCodeCreateDBRequest, PromoCodeDBResponse, PromoCodeUpdateDBRequest,
};
use crate::db::store::PricingStore;
use crate::types::{HotelId, PricingRuleId, PromoCodeId, RoomTypeId, abbrev_uuid};

#[async_trait]
impl PricingStore for PostgresStore {
    #[instrument(skip(self, request), fields(room_type_id = %abbrev_uuid(&request.room_type_id)), err)]
    async fn create_pricing_rule(&self, request: &PricingRuleCreateDBRequest) -> Result<PricingRuleDBResponse> {
        let rule = sqlx::query_as::<_, PricingRuleDBResponse>(
            r#"
            INSERT INTO pricing_rules (id, room_type_id, label, start_date, end_date, weekdays, kind, value, priority)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(request.room_type_id)
        .bind(&request.label)
        .bind(request.start_date)
        .bind(request.end_date)
        .bind(request.weekdays)
        .bind(request.kind)
        .bind(request.value)
        .bind(request.priority)
        .fetch_one(&self.pool)
        .await?;
        Ok(rule)
    }

    #[instrument(skip(self), fields(rule_id = %abbrev_uuid(&id)), err)]
    async fn get_pricing_rule(&self, id: PricingRuleId) -> Result<Option<PricingRuleDBResponse>> {
        let rule = sqlx::query_as::<_, PricingRuleDBResponse>("SELECT * FROM pricing_rules WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(rule)
    }

    #[instrument(skip(self), fields(room_type_id = %abbrev_uuid(&room_type_id)), err)]
    async fn list_pricing_rules(&self, room_type_id: RoomTypeId) -> Result<Vec<PricingRuleDBResponse>> {
        let rules = sqlx::query_as::<_, PricingRuleDBResponse>(
            "SELECT * FROM pricing_rules WHERE room_type_id = $1 ORDER BY start_date, created_at, id",
        )
        .bind(room_type_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rules)
    }

    #[instrument(skip(self), fields(rule_id = %abbrev_uuid(&id)), err)]
    async fn delete_pricing_rule(&self, id: PricingRuleId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM pricing_rules WHERE id = $1").bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), err)]
    async fn create_promo_code(&self, request: &PromoCodeCreateDBRequest) -> Result<PromoCodeDBResponse> {
        let promo = sqlx::query_as::<_, PromoCodeDBResponse>(
            r#"
            INSERT INTO promo_codes (id, code, kind, value, valid_from, valid_until, min_nights, hotel_id)
            VALUES ($1, upper($2), $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&request.code)
        .bind(request.kind)
        .bind(request.value)
        .bind(request.valid_from)
        .bind(request.valid_until)
        .bind(request.min_nights)
        .bind(request.hotel_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(promo)
    }

    #[instrument(skip(self), fields(promo_id = %abbrev_uuid(&id)), err)]
    async fn get_promo_code(&self, id: PromoCodeId) -> Result<Option<PromoCodeDBResponse>> {
        let promo = sqlx::query_as::<_, PromoCodeDBResponse>("SELECT * FROM promo_codes WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(promo)
    }

    #[instrument(skip(self), err)]
    async fn get_promo_code_by_code(&self, code: &str) -> Result<Option<PromoCodeDBResponse>> {
        let promo = sqlx::query_as::<_, PromoCodeDBResponse>("SELECT * FROM promo_codes WHERE code = upper($1)")
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;
        Ok(promo)
    }

    #[instrument(skip(self), err)]
    async fn list_promo_codes(&self, hotel_id: Option<HotelId>) -> Result<Vec<PromoCodeDBResponse>> {
        let promos = sqlx::query_as::<_, PromoCodeDBResponse>(
            "SELECT * FROM promo_codes WHERE $1::uuid IS NULL OR hotel_id IS NULL OR hotel_id = $1 ORDER BY code",
        )
        .bind(hotel_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(promos)
    }

    #[instrument(skip(self, request), fields(promo_id = %abbrev_uuid(&id)), err)]
    async fn update_promo_code(&self, id: PromoCodeId, request: &PromoCodeUpdateDBRequest) -> Result<PromoCodeDBResponse> {
        sqlx::query_as::<_, PromoCodeDBResponse>(
            r#"
            UPDATE promo_codes SET
                is_active = COALESCE($2, is_active),
                value = COALESCE($3, value),
                valid_from = COALESCE($4, valid_from),
                valid_until = COALESCE($5, valid_until),
                min_nights = COALESCE($6, min_nights)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(request.is_active)
        .bind(request.value)
        .bind(request.valid_from)
        .bind(request.valid_until)
        .bind(request.min_nights)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(DbError::NotFound)
    }
}
