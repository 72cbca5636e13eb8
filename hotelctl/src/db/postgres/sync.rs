use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::instrument;
use uuid::Uuid;

use super::PostgresStore;
use crate::db::errors::Result;
use crate::db::models::sync::{ApplyOutcome, SyncRecordDBResponse, SyncRecordUpsert};
use crate::db::store::SyncStore;
use crate::types::{HotelId, RoomId, RoomTypeId, abbrev_uuid};

impl PostgresStore {
    /// Maps an `UPDATE ... RETURNING id` result onto an outcome: no row back means either the
    /// row is missing or it was newer, which the existence check tells apart.
    async fn resolve_apply(&self, updated: Option<Uuid>, exists_sql: &str, id: Uuid, hotel_id: HotelId) -> Result<ApplyOutcome> {
        if updated.is_some() {
            return Ok(ApplyOutcome::Applied);
        }
        let exists = sqlx::query_scalar::<_, bool>(exists_sql)
            .bind(id)
            .bind(hotel_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(if exists { ApplyOutcome::Stale } else { ApplyOutcome::Unknown })
    }
}

#[async_trait]
impl SyncStore for PostgresStore {
    #[instrument(skip(self), err)]
    async fn get_sync_record(&self, idempotency_key: &str) -> Result<Option<SyncRecordDBResponse>> {
        let record = sqlx::query_as::<_, SyncRecordDBResponse>("SELECT * FROM sync_records WHERE idempotency_key = $1")
            .bind(idempotency_key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(record)
    }

    #[instrument(skip(self, record), fields(hotel_id = %abbrev_uuid(&record.hotel_id), kind = record.kind.as_str()), err)]
    async fn record_sync_push(&self, record: &SyncRecordUpsert, now: DateTime<Utc>) -> Result<SyncRecordDBResponse> {
        let stored = sqlx::query_as::<_, SyncRecordDBResponse>(
            r#"
            INSERT INTO sync_records (idempotency_key, hotel_id, kind, range_start, range_end, snapshot_hash, records, push_count, last_synced_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, 1, $8)
            ON CONFLICT (idempotency_key) DO UPDATE SET
                snapshot_hash = EXCLUDED.snapshot_hash,
                records = EXCLUDED.records,
                push_count = sync_records.push_count + 1,
                last_synced_at = EXCLUDED.last_synced_at
            RETURNING *
            "#,
        )
        .bind(&record.idempotency_key)
        .bind(record.hotel_id)
        .bind(record.kind)
        .bind(record.range_start)
        .bind(record.range_end)
        .bind(&record.snapshot_hash)
        .bind(record.records)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;
        Ok(stored)
    }

    #[instrument(skip(self), fields(hotel_id = %abbrev_uuid(&hotel_id)), err)]
    async fn list_sync_records(&self, hotel_id: HotelId) -> Result<Vec<SyncRecordDBResponse>> {
        let records = sqlx::query_as::<_, SyncRecordDBResponse>(
            "SELECT * FROM sync_records WHERE hotel_id = $1 ORDER BY last_synced_at DESC, idempotency_key",
        )
        .bind(hotel_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }

    #[instrument(skip(self), fields(room_type_id = %abbrev_uuid(&room_type_id)), err)]
    async fn apply_room_type_price(
        &self,
        hotel_id: HotelId,
        room_type_id: RoomTypeId,
        base_price: i64,
        updated_at: DateTime<Utc>,
    ) -> Result<ApplyOutcome> {
        let updated = sqlx::query_scalar::<_, Uuid>(
            r#"
            UPDATE room_types SET base_price = $3, updated_at = $4
            WHERE id = $1 AND hotel_id = $2 AND updated_at < $4
            RETURNING id
            "#,
        )
        .bind(room_type_id)
        .bind(hotel_id)
        .bind(base_price)
        .bind(updated_at)
        .fetch_optional(&self.pool)
        .await?;
        self.resolve_apply(
            updated,
            "SELECT EXISTS (SELECT 1 FROM room_types WHERE id = $1 AND hotel_id = $2)",
            room_type_id,
            hotel_id,
        )
        .await
    }

    #[instrument(skip(self), fields(room_id = %abbrev_uuid(&room_id)), err)]
    async fn apply_room_state(&self, hotel_id: HotelId, room_id: RoomId, is_active: bool, updated_at: DateTime<Utc>) -> Result<ApplyOutcome> {
        let updated = sqlx::query_scalar::<_, Uuid>(
            r#"
            UPDATE rooms r SET is_active = $3, updated_at = $4
            FROM room_types rt
            WHERE r.id = $1 AND rt.id = r.room_type_id AND rt.hotel_id = $2 AND r.updated_at < $4
            RETURNING r.id
            "#,
        )
        .bind(room_id)
        .bind(hotel_id)
        .bind(is_active)
        .bind(updated_at)
        .fetch_optional(&self.pool)
        .await?;
        self.resolve_apply(
            updated,
            "SELECT EXISTS (SELECT 1 FROM rooms r JOIN room_types rt ON rt.id = r.room_type_id WHERE r.id = $1 AND rt.hotel_id = $2)",
            room_id,
            hotel_id,
        )
        .await
    }
}
