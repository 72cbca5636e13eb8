//! Room inventory: availability, reservation holds and the per-day calendar.
//!
//! Availability is computed per night. A stay fits when every night has enough unclaimed rooms,
//! where claims are active holds plus pending, confirmed and checked-in bookings. Hold creation
//! is a single store call that serializes check-and-insert per room type, so concurrent requests
//! never over-commit rooms.
//!
//! Expired holds stop counting the moment `expires_at` passes; the [`sweeper`] only stamps them
//! so history shows why they ended.

pub mod sweeper;

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tracing::instrument;
use utoipa::ToSchema;

use crate::api::models::users::CurrentUser;
use crate::auth::permissions::{can_manage_hotel, forbidden};
use crate::config::Config;
use crate::db::Store;
use crate::db::models::hotels::RoomTypeDBResponse;
use crate::db::models::inventory::{HoldCreateDBRequest, HoldDBResponse, HoldOutcome, NightOccupancy, available_over};
use crate::errors::{Error, Result};
use crate::pricing::{PricingService, Quote};
use crate::stay::{DateRange, Stay};
use crate::types::{HoldId, HotelId, Operation, Resource, RoomTypeId, abbrev_uuid};

/// Rooms free over a whole stay
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Availability {
    #[schema(value_type = String, format = "uuid")]
    pub hotel_id: HotelId,
    #[schema(value_type = String, format = "uuid")]
    pub room_type_id: RoomTypeId,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub total_rooms: i64,
    /// Rooms free on every night of the stay
    pub available: i64,
    /// Rooms the party needs given the room type's guest limit
    pub rooms_needed: i64,
    pub can_accommodate: bool,
}

/// One day of the inventory calendar
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub total_rooms: i64,
    pub held: i64,
    pub booked: i64,
    pub available: i64,
}

impl From<NightOccupancy> for CalendarDay {
    fn from(night: NightOccupancy) -> Self {
        Self {
            available: night.available(),
            date: night.date,
            total_rooms: night.total_rooms,
            held: night.held,
            booked: night.booked,
        }
    }
}

/// A room type with free rooms over a stay, priced
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AvailableRoomType {
    #[schema(value_type = String, format = "uuid")]
    pub room_type_id: RoomTypeId,
    pub name: String,
    pub description: Option<String>,
    pub max_guests: i32,
    pub available: i64,
    pub quote: Quote,
}

#[derive(Debug, Clone)]
pub struct HoldRequest {
    pub room_type_id: RoomTypeId,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub quantity: i32,
    /// Defaults to the configured hold TTL; capped at the configured maximum
    pub ttl: Option<Duration>,
}

/// Result of a release request. Releasing is idempotent, so `released` is false when there was
/// nothing left to release.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ReleaseResult {
    #[schema(value_type = String, format = "uuid")]
    pub hold_id: HoldId,
    pub released: bool,
}

#[derive(Clone)]
pub struct InventoryService {
    store: Arc<dyn Store>,
    pricing: PricingService,
    default_hold_ttl: Duration,
    max_hold_ttl: Duration,
    max_stay_nights: i64,
    max_rooms_per_request: i32,
}

impl InventoryService {
    pub fn new(store: Arc<dyn Store>, pricing: PricingService, config: &Config) -> Self {
        Self {
            store,
            pricing,
            default_hold_ttl: config.inventory.default_hold_ttl,
            max_hold_ttl: config.inventory.max_hold_ttl,
            max_stay_nights: config.inventory.max_stay_nights,
            max_rooms_per_request: config.inventory.max_rooms_per_request,
        }
    }

    async fn room_type(&self, id: RoomTypeId) -> Result<RoomTypeDBResponse> {
        self.store
            .get_room_type(id)
            .await?
            .ok_or_else(|| Error::not_found("Room type", id))
    }

    fn stay(&self, check_in: NaiveDate, check_out: NaiveDate, now: DateTime<Utc>) -> Result<Stay> {
        Stay::new(check_in, check_out, self.max_stay_nights)?.ensure_not_past(now.date_naive())
    }

    /// Unclaimed rooms of a room type over a stay
    #[instrument(skip(self), fields(room_type_id = %abbrev_uuid(&room_type_id)), err)]
    pub async fn check_availability(
        &self,
        hotel_id: HotelId,
        room_type_id: RoomTypeId,
        check_in: NaiveDate,
        check_out: NaiveDate,
        guests: i32,
        now: DateTime<Utc>,
    ) -> Result<Availability> {
        let stay = self.stay(check_in, check_out, now)?;
        if guests < 1 {
            return Err(Error::invalid_field("guests", "must be at least 1"));
        }
        let room_type = self.room_type(room_type_id).await?;
        if room_type.hotel_id != hotel_id {
            return Err(Error::not_found("Room type", room_type_id));
        }

        let nights = self
            .store
            .occupancy(room_type_id, stay.check_in, stay.check_out, now, None)
            .await?;
        let total_rooms = nights.first().map_or(0, |night| night.total_rooms);
        let available = available_over(&nights);
        let max_guests = i64::from(room_type.max_guests.max(1));
        let rooms_needed = (i64::from(guests) + max_guests - 1) / max_guests;

        Ok(Availability {
            hotel_id,
            room_type_id,
            check_in: stay.check_in,
            check_out: stay.check_out,
            total_rooms,
            available,
            rooms_needed,
            can_accommodate: available >= rooms_needed,
        })
    }

    /// Claims `quantity` rooms for the stay until the hold expires, is released or is consumed
    /// by a booking.
    #[instrument(skip(self, user, request), fields(user_id = %abbrev_uuid(&user.id), room_type_id = %abbrev_uuid(&request.room_type_id)), err)]
    pub async fn create_hold(&self, user: &CurrentUser, request: &HoldRequest, now: DateTime<Utc>) -> Result<HoldDBResponse> {
        let stay = self.stay(request.check_in, request.check_out, now)?;
        if request.quantity < 1 || request.quantity > self.max_rooms_per_request {
            return Err(Error::invalid_field(
                "quantity",
                format!("must be between 1 and {}", self.max_rooms_per_request),
            ));
        }
        let ttl = match request.ttl {
            Some(ttl) if ttl.is_zero() => return Err(Error::invalid_field("ttl_seconds", "must be positive")),
            Some(ttl) => ttl.min(self.max_hold_ttl),
            None => self.default_hold_ttl,
        };
        let ttl = chrono::Duration::from_std(ttl).map_err(|e| Error::Internal {
            operation: format!("convert hold ttl: {e}"),
        })?;
        self.room_type(request.room_type_id).await?;

        let outcome = self
            .store
            .create_hold(
                &HoldCreateDBRequest {
                    room_type_id: request.room_type_id,
                    user_id: user.id,
                    check_in: stay.check_in,
                    check_out: stay.check_out,
                    quantity: request.quantity,
                    expires_at: now + ttl,
                },
                now,
            )
            .await?;

        match outcome {
            HoldOutcome::Granted(hold) => {
                metrics::counter!("hotelctl_holds_total", "outcome" => "granted").increment(1);
                tracing::info!(hold_id = %abbrev_uuid(&hold.id), quantity = hold.quantity, expires_at = %hold.expires_at, "Granted reservation hold");
                Ok(hold)
            }
            HoldOutcome::Insufficient { available } => {
                metrics::counter!("hotelctl_holds_total", "outcome" => "rejected").increment(1);
                Err(Error::InsufficientInventory {
                    requested: i64::from(request.quantity),
                    available,
                })
            }
        }
    }

    /// Visible to the hold owner, managers of the hotel and admins
    pub async fn get_hold(&self, user: &CurrentUser, id: HoldId) -> Result<HoldDBResponse> {
        let hold = self.store.get_hold(id).await?.ok_or_else(|| Error::not_found("Hold", id))?;
        if !self.may_manage_hold(user, &hold).await? {
            return Err(Error::not_found("Hold", id));
        }
        Ok(hold)
    }

    async fn may_manage_hold(&self, user: &CurrentUser, hold: &HoldDBResponse) -> Result<bool> {
        if hold.user_id == user.id || user.is_admin() {
            return Ok(true);
        }
        let Some(room_type) = self.store.get_room_type(hold.room_type_id).await? else {
            return Ok(false);
        };
        let hotel = self.store.get_hotel(room_type.hotel_id).await?;
        Ok(hotel.is_some_and(|hotel| can_manage_hotel(user, &hotel)))
    }

    /// Releases a hold. Unknown, expired, consumed and already released holds are a no-op.
    #[instrument(skip(self, user), fields(user_id = %abbrev_uuid(&user.id), hold_id = %abbrev_uuid(&id)), err)]
    pub async fn release_hold(&self, user: &CurrentUser, id: HoldId, now: DateTime<Utc>) -> Result<ReleaseResult> {
        let Some(hold) = self.store.get_hold(id).await? else {
            return Ok(ReleaseResult { hold_id: id, released: false });
        };
        if !self.may_manage_hold(user, &hold).await? {
            return Err(forbidden(Resource::Holds, Operation::DeleteOwn, "this reservation hold"));
        }
        let released = self.store.release_hold(id, now).await?.is_some();
        if released {
            tracing::info!("Released reservation hold");
        }
        Ok(ReleaseResult { hold_id: id, released })
    }

    pub async fn list_holds(&self, user: &CurrentUser, active_only: bool, now: DateTime<Utc>) -> Result<Vec<HoldDBResponse>> {
        Ok(self.store.list_holds(user.id, active_only, now).await?)
    }

    /// Per-day inventory for `start..=end`
    #[instrument(skip(self), fields(room_type_id = %abbrev_uuid(&room_type_id)), err)]
    pub async fn calendar(&self, room_type_id: RoomTypeId, start: NaiveDate, end: NaiveDate, now: DateTime<Utc>) -> Result<Vec<CalendarDay>> {
        let range = DateRange::new(start, end)?;
        self.room_type(room_type_id).await?;
        let nights = self
            .store
            .occupancy(room_type_id, range.start, range.end_exclusive(), now, None)
            .await?;
        Ok(nights.into_iter().map(CalendarDay::from).collect())
    }

    /// Room types of a hotel that can take the party for the whole stay, with a quote each
    #[instrument(skip(self), fields(hotel_id = %abbrev_uuid(&hotel_id)), err)]
    pub async fn available_rooms(
        &self,
        hotel_id: HotelId,
        check_in: NaiveDate,
        check_out: NaiveDate,
        guests: i32,
        now: DateTime<Utc>,
    ) -> Result<Vec<AvailableRoomType>> {
        let stay = self.stay(check_in, check_out, now)?;
        if guests < 1 {
            return Err(Error::invalid_field("guests", "must be at least 1"));
        }
        self.store
            .get_hotel(hotel_id)
            .await?
            .ok_or_else(|| Error::not_found("Hotel", hotel_id))?;

        let mut result = Vec::new();
        for room_type in self.store.list_room_types(hotel_id).await? {
            if !room_type.is_available || room_type.max_guests < guests {
                continue;
            }
            let nights = self
                .store
                .occupancy(room_type.id, stay.check_in, stay.check_out, now, None)
                .await?;
            let available = available_over(&nights);
            if available == 0 {
                continue;
            }
            let quote = self.pricing.quote_for(&room_type, stay, guests, 1, None, now).await?;
            result.push(AvailableRoomType {
                room_type_id: room_type.id,
                name: room_type.name,
                description: room_type.description,
                max_guests: room_type.max_guests,
                available,
                quote,
            });
        }
        Ok(result)
    }

    /// Stamps holds past their expiry. Reads never depend on this having run.
    pub async fn sweep_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let swept = self.store.expire_holds(now).await?;
        if swept > 0 {
            metrics::counter!("hotelctl_holds_expired_total").increment(swept);
            tracing::debug!(swept, "Marked expired reservation holds");
        }
        Ok(swept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::users::Role;
    use crate::db::models::inventory::ReleaseReason;
    use crate::test_utils::{create_test_config, create_test_room_type, create_test_store, create_test_user, current_user, days_from_today};

    struct Fixture {
        service: InventoryService,
        store: Arc<dyn Store>,
        manager: CurrentUser,
        hotel_id: HotelId,
        room_type: RoomTypeDBResponse,
    }

    async fn setup(rooms: usize) -> Fixture {
        let store = create_test_store();
        let config = create_test_config();
        let manager = create_test_user(store.as_ref(), Role::HotelManager).await;
        let (hotel, room_type) = create_test_room_type(store.as_ref(), &manager, rooms, 1_000_000).await;
        let pricing = PricingService::new(store.clone(), &config);
        Fixture {
            service: InventoryService::new(store.clone(), pricing, &config),
            store,
            manager: current_user(&manager),
            hotel_id: hotel.id,
            room_type,
        }
    }

    async fn customer(store: &Arc<dyn Store>) -> CurrentUser {
        current_user(&create_test_user(store.as_ref(), Role::Customer).await)
    }

    fn hold(room_type: &RoomTypeDBResponse, from: u64, to: u64, quantity: i32) -> HoldRequest {
        HoldRequest {
            room_type_id: room_type.id,
            check_in: days_from_today(from),
            check_out: days_from_today(to),
            quantity,
            ttl: None,
        }
    }

    #[tokio::test]
    #[test_log::test]
    async fn test_hold_release_then_succeed() {
        let f = setup(2).await;
        let alice = customer(&f.store).await;
        let bob = customer(&f.store).await;
        let now = Utc::now();

        let first = f.service.create_hold(&alice, &hold(&f.room_type, 10, 12, 2), now).await.unwrap();
        assert_eq!(first.quantity, 2);

        let err = f.service.create_hold(&bob, &hold(&f.room_type, 11, 13, 1), now).await.unwrap_err();
        assert!(matches!(err, Error::InsufficientInventory { requested: 1, available: 0 }));

        let released = f.service.release_hold(&alice, first.id, now).await.unwrap();
        assert!(released.released);

        f.service.create_hold(&bob, &hold(&f.room_type, 11, 13, 1), now).await.unwrap();
    }

    #[tokio::test]
    async fn test_release_is_idempotent() {
        let f = setup(1).await;
        let alice = customer(&f.store).await;
        let now = Utc::now();
        let granted = f.service.create_hold(&alice, &hold(&f.room_type, 5, 6, 1), now).await.unwrap();

        assert!(f.service.release_hold(&alice, granted.id, now).await.unwrap().released);
        assert!(!f.service.release_hold(&alice, granted.id, now).await.unwrap().released);
        assert!(!f.service.release_hold(&alice, uuid::Uuid::new_v4(), now).await.unwrap().released);
    }

    #[tokio::test]
    async fn test_expired_hold_is_inert() {
        let f = setup(1).await;
        let alice = customer(&f.store).await;
        let bob = customer(&f.store).await;
        let now = Utc::now();
        let mut request = hold(&f.room_type, 5, 6, 1);
        request.ttl = Some(Duration::from_secs(60));
        let granted = f.service.create_hold(&alice, &request, now).await.unwrap();

        let later = now + chrono::Duration::seconds(61);
        // Expired but not yet swept: inventory is free and releasing is a no-op
        f.service.create_hold(&bob, &hold(&f.room_type, 5, 6, 1), later).await.unwrap();
        assert!(!f.service.release_hold(&alice, granted.id, later).await.unwrap().released);

        assert_eq!(f.service.sweep_expired(later).await.unwrap(), 1);
        let swept = f.store.get_hold(granted.id).await.unwrap().unwrap();
        assert_eq!(swept.release_reason, Some(ReleaseReason::Expired));
    }

    #[tokio::test]
    async fn test_ttl_is_capped() {
        let f = setup(1).await;
        let alice = customer(&f.store).await;
        let now = Utc::now();
        let mut request = hold(&f.room_type, 5, 6, 1);
        request.ttl = Some(Duration::from_secs(24 * 3600));

        let granted = f.service.create_hold(&alice, &request, now).await.unwrap();
        assert_eq!(granted.expires_at, now + chrono::Duration::hours(1));
    }

    #[tokio::test]
    async fn test_hold_validation() {
        let f = setup(1).await;
        let alice = customer(&f.store).await;
        let now = Utc::now();

        let mut past = hold(&f.room_type, 5, 6, 1);
        past.check_in = days_from_today(0).pred_opt().unwrap();
        assert!(matches!(f.service.create_hold(&alice, &past, now).await, Err(Error::ValidationFailed { .. })));

        let too_many = hold(&f.room_type, 5, 6, 11);
        assert!(matches!(f.service.create_hold(&alice, &too_many, now).await, Err(Error::ValidationFailed { .. })));

        let mut unknown = hold(&f.room_type, 5, 6, 1);
        unknown.room_type_id = uuid::Uuid::new_v4();
        assert!(matches!(f.service.create_hold(&alice, &unknown, now).await, Err(Error::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_release_permissions() {
        let f = setup(1).await;
        let alice = customer(&f.store).await;
        let mallory = customer(&f.store).await;
        let now = Utc::now();
        let granted = f.service.create_hold(&alice, &hold(&f.room_type, 5, 6, 1), now).await.unwrap();

        let err = f.service.release_hold(&mallory, granted.id, now).await.unwrap_err();
        assert!(matches!(err, Error::InsufficientPermissions { .. }));

        // The hotel's manager may release guests' holds
        assert!(f.service.release_hold(&f.manager, granted.id, now).await.unwrap().released);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_holds_never_overbook() {
        let f = setup(3).await;
        let now = Utc::now();
        let mut handles = Vec::new();
        for _ in 0..12 {
            let service = f.service.clone();
            let user = customer(&f.store).await;
            let request = hold(&f.room_type, 20, 23, 1);
            handles.push(tokio::spawn(async move { service.create_hold(&user, &request, now).await }));
        }

        let mut granted = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => granted += 1,
                Err(Error::InsufficientInventory { .. }) => {}
                Err(other) => panic!("unexpected error: {other:?}"),
            }
        }
        assert_eq!(granted, 3);

        let calendar = f.service.calendar(f.room_type.id, days_from_today(20), days_from_today(22), now).await.unwrap();
        assert!(calendar.iter().all(|day| day.held == 3 && day.available == 0));
    }

    #[tokio::test]
    async fn test_check_availability_and_calendar() {
        let f = setup(3).await;
        let alice = customer(&f.store).await;
        let now = Utc::now();
        f.service.create_hold(&alice, &hold(&f.room_type, 10, 11, 2), now).await.unwrap();

        let availability = f
            .service
            .check_availability(f.hotel_id, f.room_type.id, days_from_today(9), days_from_today(12), 3, now)
            .await
            .unwrap();
        assert_eq!(availability.total_rooms, 3);
        assert_eq!(availability.available, 1);
        assert_eq!(availability.rooms_needed, 2);
        assert!(!availability.can_accommodate);

        let calendar = f.service.calendar(f.room_type.id, days_from_today(9), days_from_today(11), now).await.unwrap();
        let available: Vec<i64> = calendar.iter().map(|day| day.available).collect();
        assert_eq!(available, vec![3, 1, 3]);

        let wrong_hotel = f
            .service
            .check_availability(uuid::Uuid::new_v4(), f.room_type.id, days_from_today(9), days_from_today(12), 1, now)
            .await;
        assert!(matches!(wrong_hotel, Err(Error::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_available_rooms_lists_priced_room_types() {
        let f = setup(1).await;
        let alice = customer(&f.store).await;
        let now = Utc::now();

        let rooms = f
            .service
            .available_rooms(f.hotel_id, days_from_today(3), days_from_today(5), 2, now)
            .await
            .unwrap();
        assert_eq!(rooms.len(), 1);
        assert_eq!(rooms[0].available, 1);
        assert_eq!(rooms[0].quote.total, 2_000_000);

        f.service.create_hold(&alice, &hold(&f.room_type, 4, 5, 1), now).await.unwrap();
        let rooms = f
            .service
            .available_rooms(f.hotel_id, days_from_today(3), days_from_today(5), 2, now)
            .await
            .unwrap();
        assert!(rooms.is_empty());

        let too_big = f
            .service
            .available_rooms(f.hotel_id, days_from_today(6), days_from_today(7), 3, now)
            .await
            .unwrap();
        assert!(too_big.is_empty());
    }
}
