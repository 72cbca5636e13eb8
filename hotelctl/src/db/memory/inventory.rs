use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use super::InMemoryStore;
use crate::db::errors::{DbError, Result};
use crate::db::models::inventory::{HoldCreateDBRequest, HoldDBResponse, HoldOutcome, NightOccupancy, ReleaseReason, available_over};
use crate::db::store::InventoryStore;
use crate::types::{BookingId, HoldId, RoomTypeId, UserId};

#[async_trait]
impl InventoryStore for InMemoryStore {
    async fn occupancy(
        &self,
        room_type_id: RoomTypeId,
        start: NaiveDate,
        end: NaiveDate,
        now: DateTime<Utc>,
        exclude_booking: Option<BookingId>,
    ) -> Result<Vec<NightOccupancy>> {
        Ok(self.tables.read().occupancy(room_type_id, start, end, now, exclude_booking))
    }

    async fn create_hold(&self, request: &HoldCreateDBRequest, now: DateTime<Utc>) -> Result<HoldOutcome> {
        // The write lock is held across check and insert
        let mut tables = self.tables.write();
        if !tables.room_types.contains_key(&request.room_type_id) {
            return Err(DbError::foreign_key("reservation_holds", "reservation_holds_room_type_id_fkey"));
        }
        if !tables.users.contains_key(&request.user_id) {
            return Err(DbError::foreign_key("reservation_holds", "reservation_holds_user_id_fkey"));
        }

        let nights = tables.occupancy(request.room_type_id, request.check_in, request.check_out, now, None);
        let available = available_over(&nights);
        if available < i64::from(request.quantity) {
            return Ok(HoldOutcome::Insufficient { available });
        }

        let hold = HoldDBResponse {
            id: Uuid::new_v4(),
            room_type_id: request.room_type_id,
            user_id: request.user_id,
            check_in: request.check_in,
            check_out: request.check_out,
            quantity: request.quantity,
            expires_at: request.expires_at,
            released_at: None,
            release_reason: None,
            created_at: now,
        };
        tables.holds.insert(hold.id, hold.clone());
        Ok(HoldOutcome::Granted(hold))
    }

    async fn get_hold(&self, id: HoldId) -> Result<Option<HoldDBResponse>> {
        Ok(self.tables.read().holds.get(&id).cloned())
    }

    async fn release_hold(&self, id: HoldId, now: DateTime<Utc>) -> Result<Option<HoldDBResponse>> {
        let mut tables = self.tables.write();
        match tables.holds.get_mut(&id) {
            Some(hold) if hold.is_active(now) => {
                hold.released_at = Some(now);
                hold.release_reason = Some(ReleaseReason::Released);
                Ok(Some(hold.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn expire_holds(&self, now: DateTime<Utc>) -> Result<u64> {
        let mut tables = self.tables.write();
        let mut swept = 0;
        for hold in tables.holds.values_mut() {
            if hold.released_at.is_none() && hold.expires_at <= now {
                hold.released_at = Some(now);
                hold.release_reason = Some(ReleaseReason::Expired);
                swept += 1;
            }
        }
        Ok(swept)
    }

    async fn list_holds(&self, user_id: UserId, active_only: bool, now: DateTime<Utc>) -> Result<Vec<HoldDBResponse>> {
        let mut holds: Vec<_> = self
            .tables
            .read()
            .holds
            .values()
            .filter(|hold| hold.user_id == user_id)
            .filter(|hold| !active_only || hold.is_active(now))
            .cloned()
            .collect();
        holds.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(holds)
    }
}
