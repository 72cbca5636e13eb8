use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::InMemoryStore;
use crate::db::errors::{DbError, Result};
use crate::db::models::sync::{ApplyOutcome, SyncRecordDBResponse, SyncRecordUpsert};
use crate::db::store::SyncStore;
use crate::types::{HotelId, RoomId, RoomTypeId};

#[async_trait]
impl SyncStore for InMemoryStore {
    async fn get_sync_record(&self, idempotency_key: &str) -> Result<Option<SyncRecordDBResponse>> {
        Ok(self.tables.read().sync_records.get(idempotency_key).cloned())
    }

    async fn record_sync_push(&self, record: &SyncRecordUpsert, now: DateTime<Utc>) -> Result<SyncRecordDBResponse> {
        let mut tables = self.tables.write();
        if !tables.hotels.contains_key(&record.hotel_id) {
            return Err(DbError::foreign_key("sync_records", "sync_records_hotel_id_fkey"));
        }

        let push_count = tables
            .sync_records
            .get(&record.idempotency_key)
            .map_or(1, |existing| existing.push_count + 1);
        let stored = SyncRecordDBResponse {
            idempotency_key: record.idempotency_key.clone(),
            hotel_id: record.hotel_id,
            kind: record.kind,
            range_start: record.range_start,
            range_end: record.range_end,
            snapshot_hash: record.snapshot_hash.clone(),
            records: record.records,
            push_count,
            last_synced_at: now,
        };
        tables.sync_records.insert(stored.idempotency_key.clone(), stored.clone());
        Ok(stored)
    }

    async fn list_sync_records(&self, hotel_id: HotelId) -> Result<Vec<SyncRecordDBResponse>> {
        let mut records: Vec<_> = self
            .tables
            .read()
            .sync_records
            .values()
            .filter(|record| record.hotel_id == hotel_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.last_synced_at.cmp(&a.last_synced_at).then(a.idempotency_key.cmp(&b.idempotency_key)));
        Ok(records)
    }

    async fn apply_room_type_price(
        &self,
        hotel_id: HotelId,
        room_type_id: RoomTypeId,
        base_price: i64,
        updated_at: DateTime<Utc>,
    ) -> Result<ApplyOutcome> {
        let mut tables = self.tables.write();
        match tables.room_types.get_mut(&room_type_id) {
            Some(room_type) if room_type.hotel_id == hotel_id => {
                if room_type.updated_at >= updated_at {
                    return Ok(ApplyOutcome::Stale);
                }
                room_type.base_price = base_price;
                room_type.updated_at = updated_at;
                Ok(ApplyOutcome::Applied)
            }
            _ => Ok(ApplyOutcome::Unknown),
        }
    }

    async fn apply_room_state(&self, hotel_id: HotelId, room_id: RoomId, is_active: bool, updated_at: DateTime<Utc>) -> Result<ApplyOutcome> {
        let mut tables = self.tables.write();
        let in_hotel = tables
            .rooms
            .get(&room_id)
            .and_then(|room| tables.room_types.get(&room.room_type_id))
            .is_some_and(|room_type| room_type.hotel_id == hotel_id);
        if !in_hotel {
            return Ok(ApplyOutcome::Unknown);
        }
        let room = tables.rooms.get_mut(&room_id).ok_or(DbError::NotFound)?;
        if room.updated_at >= updated_at {
            return Ok(ApplyOutcome::Stale);
        }
        room.is_active = is_active;
        room.updated_at = updated_at;
        Ok(ApplyOutcome::Applied)
    }
}
