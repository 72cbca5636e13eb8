use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use tracing::instrument;
use uuid::Uuid;

use super::{PostgresStore, lock_room_type, occupancy_on};
use crate::db::errors::Result;
use crate::db::models::inventory::{HoldCreateDBRequest, HoldDBResponse, HoldOutcome, NightOccupancy, available_over};
use crate::db::store::InventoryStore;
use crate::types::{BookingId, HoldId, RoomTypeId, UserId, abbrev_uuid};

#[async_trait]
impl InventoryStore for PostgresStore {
    #[instrument(skip(self), fields(room_type_id = %abbrev_uuid(&room_type_id)), err)]
    async fn occupancy(
        &self,
        room_type_id: RoomTypeId,
        start: NaiveDate,
        end: NaiveDate,
        now: DateTime<Utc>,
        exclude_booking: Option<BookingId>,
    ) -> Result<Vec<NightOccupancy>> {
        let mut conn = self.pool.acquire().await?;
        occupancy_on(&mut conn, room_type_id, start, end, now, exclude_booking).await
    }

    #[instrument(skip(self, request), fields(room_type_id = %abbrev_uuid(&request.room_type_id), quantity = request.quantity), err)]
    async fn create_hold(&self, request: &HoldCreateDBRequest, now: DateTime<Utc>) -> Result<HoldOutcome> {
        let mut tx = self.pool.begin().await?;
        lock_room_type(&mut tx, request.room_type_id, "reservation_holds").await?;

        let nights = occupancy_on(&mut tx, request.room_type_id, request.check_in, request.check_out, now, None).await?;
        let available = available_over(&nights);
        if available < i64::from(request.quantity) {
            tx.rollback().await?;
            return Ok(HoldOutcome::Insufficient { available });
        }

        let hold = sqlx::query_as::<_, HoldDBResponse>(
            r#"
            INSERT INTO reservation_holds (id, room_type_id, user_id, check_in, check_out, quantity, expires_at, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(request.room_type_id)
        .bind(request.user_id)
        .bind(request.check_in)
        .bind(request.check_out)
        .bind(request.quantity)
        .bind(request.expires_at)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(HoldOutcome::Granted(hold))
    }

    #[instrument(skip(self), fields(hold_id = %abbrev_uuid(&id)), err)]
    async fn get_hold(&self, id: HoldId) -> Result<Option<HoldDBResponse>> {
        let hold = sqlx::query_as::<_, HoldDBResponse>("SELECT * FROM reservation_holds WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(hold)
    }

    #[instrument(skip(self), fields(hold_id = %abbrev_uuid(&id)), err)]
    async fn release_hold(&self, id: HoldId, now: DateTime<Utc>) -> Result<Option<HoldDBResponse>> {
        let hold = sqlx::query_as::<_, HoldDBResponse>(
            r#"
            UPDATE reservation_holds SET released_at = $2, release_reason = 'released'
            WHERE id = $1 AND released_at IS NULL AND expires_at > $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;
        Ok(hold)
    }

    #[instrument(skip(self), err)]
    async fn expire_holds(&self, now: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE reservation_holds SET released_at = $1, release_reason = 'expired' WHERE released_at IS NULL AND expires_at <= $1",
        )
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id)), err)]
    async fn list_holds(&self, user_id: UserId, active_only: bool, now: DateTime<Utc>) -> Result<Vec<HoldDBResponse>> {
        let holds = sqlx::query_as::<_, HoldDBResponse>(
            r#"
            SELECT * FROM reservation_holds
            WHERE user_id = $1
              AND (NOT $2 OR (released_at IS NULL AND expires_at > $3))
            ORDER BY created_at DESC, id
            "#,
        )
        .bind(user_id)
        .bind(active_only)
        .bind(now)
        .fetch_all(&self.pool)
        .await?;
        Ok(holds)
    }
}
