//! Storage traits.
//!
//! Each aggregate gets its own trait so services and tests can see exactly which operations they
//! depend on. [`Store`] is the union the application holds behind an `Arc<dyn Store>`; it is
//! implemented by [`InMemoryStore`](super::memory::InMemoryStore) and
//! [`PostgresStore`](super::postgres::PostgresStore).
//!
//! Operations that must be atomic with respect to inventory (hold creation, booking creation,
//! stay modification) are single trait methods so each backend can serialize them its own way.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::db::errors::Result;
use crate::db::models::{
    attendance::{AttendanceFilter, AttendanceLogCreateDBRequest, AttendanceLogDBResponse},
    bookings::{
        BookingCreateDBRequest, BookingDBResponse, BookingEventDBResponse, BookingFilter, BookingStatus, BookingStayUpdate,
        CreateBookingOutcome, UpdateStayOutcome,
    },
    content::{
        DestinationCreateDBRequest, DestinationDBResponse, DestinationUpdateDBRequest, ReviewCreateDBRequest, ReviewDBResponse,
        ReviewSummary,
    },
    hotels::{
        HotelCreateDBRequest, HotelDBResponse, HotelFilter, HotelUpdateDBRequest, RoomCreateDBRequest, RoomDBResponse,
        RoomTypeCreateDBRequest, RoomTypeDBResponse, RoomTypeUpdateDBRequest, RoomUpdateDBRequest,
    },
    inventory::{HoldCreateDBRequest, HoldDBResponse, HoldOutcome, NightOccupancy},
    pricing::{
        PricingRuleCreateDBRequest, PricingRuleDBResponse, PromoCodeCreateDBRequest, PromoCodeDBResponse, PromoCodeUpdateDBRequest,
    },
    sync::{ApplyOutcome, SyncRecordDBResponse, SyncRecordUpsert},
    users::{UserCreateDBRequest, UserDBResponse, UserFilter, UserUpdateDBRequest},
};
use crate::types::{
    BookingId, DestinationId, HoldId, HotelId, PricingRuleId, PromoCodeId, RoomId, RoomTypeId, UserId,
};

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create_user(&self, request: &UserCreateDBRequest) -> Result<UserDBResponse>;
    async fn get_user(&self, id: UserId) -> Result<Option<UserDBResponse>>;
    /// Emails are stored lower-cased; the lookup lower-cases its argument
    async fn get_user_by_email(&self, email: &str) -> Result<Option<UserDBResponse>>;
    /// Fails with `DbError::NotFound` for unknown ids
    async fn update_user(&self, id: UserId, request: &UserUpdateDBRequest) -> Result<UserDBResponse>;
    async fn list_users(&self, filter: &UserFilter) -> Result<(Vec<UserDBResponse>, i64)>;
}

#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn create_destination(&self, request: &DestinationCreateDBRequest) -> Result<DestinationDBResponse>;
    async fn get_destination(&self, id: DestinationId) -> Result<Option<DestinationDBResponse>>;
    async fn list_destinations(&self, skip: i64, limit: i64) -> Result<(Vec<DestinationDBResponse>, i64)>;
    async fn update_destination(&self, id: DestinationId, request: &DestinationUpdateDBRequest) -> Result<DestinationDBResponse>;
    async fn delete_destination(&self, id: DestinationId) -> Result<bool>;

    async fn create_review(&self, request: &ReviewCreateDBRequest) -> Result<ReviewDBResponse>;
    async fn list_reviews(&self, hotel_id: HotelId, skip: i64, limit: i64) -> Result<(Vec<ReviewDBResponse>, i64)>;
    async fn review_summary(&self, hotel_id: HotelId) -> Result<ReviewSummary>;
}

#[async_trait]
pub trait HotelStore: Send + Sync {
    async fn create_hotel(&self, request: &HotelCreateDBRequest) -> Result<HotelDBResponse>;
    async fn get_hotel(&self, id: HotelId) -> Result<Option<HotelDBResponse>>;
    async fn list_hotels(&self, filter: &HotelFilter) -> Result<(Vec<HotelDBResponse>, i64)>;
    async fn update_hotel(&self, id: HotelId, request: &HotelUpdateDBRequest) -> Result<HotelDBResponse>;
    /// Cascades to room types and rooms; fails with a foreign key violation while bookings exist
    async fn delete_hotel(&self, id: HotelId) -> Result<bool>;

    async fn create_room_type(&self, request: &RoomTypeCreateDBRequest) -> Result<RoomTypeDBResponse>;
    async fn get_room_type(&self, id: RoomTypeId) -> Result<Option<RoomTypeDBResponse>>;
    async fn list_room_types(&self, hotel_id: HotelId) -> Result<Vec<RoomTypeDBResponse>>;
    async fn update_room_type(&self, id: RoomTypeId, request: &RoomTypeUpdateDBRequest) -> Result<RoomTypeDBResponse>;
    async fn delete_room_type(&self, id: RoomTypeId) -> Result<bool>;

    async fn create_room(&self, request: &RoomCreateDBRequest) -> Result<RoomDBResponse>;
    async fn get_room(&self, id: RoomId) -> Result<Option<RoomDBResponse>>;
    async fn list_rooms(&self, room_type_id: RoomTypeId) -> Result<Vec<RoomDBResponse>>;
    async fn update_room(&self, id: RoomId, request: &RoomUpdateDBRequest) -> Result<RoomDBResponse>;
    async fn delete_room(&self, id: RoomId) -> Result<bool>;
}

#[async_trait]
pub trait InventoryStore: Send + Sync {
    /// Per-night claimed inventory for the nights in `[start, end)`.
    ///
    /// Holds count while active at `now`; bookings count while pending, confirmed or checked in.
    /// `exclude_booking` leaves one booking out, used when re-checking a booking's own new dates.
    async fn occupancy(
        &self,
        room_type_id: RoomTypeId,
        start: NaiveDate,
        end: NaiveDate,
        now: DateTime<Utc>,
        exclude_booking: Option<BookingId>,
    ) -> Result<Vec<NightOccupancy>>;

    /// Atomically checks availability and inserts the hold. Concurrent calls for the same room
    /// type are serialized, so granted holds never exceed physical rooms on any night.
    async fn create_hold(&self, request: &HoldCreateDBRequest, now: DateTime<Utc>) -> Result<HoldOutcome>;

    async fn get_hold(&self, id: HoldId) -> Result<Option<HoldDBResponse>>;

    /// Marks an active hold released. Returns `None` when the hold is unknown, already released
    /// or already expired.
    async fn release_hold(&self, id: HoldId, now: DateTime<Utc>) -> Result<Option<HoldDBResponse>>;

    /// Stamps every unreleased hold past its expiry as expired. Returns the number of holds swept.
    async fn expire_holds(&self, now: DateTime<Utc>) -> Result<u64>;

    async fn list_holds(&self, user_id: UserId, active_only: bool, now: DateTime<Utc>) -> Result<Vec<HoldDBResponse>>;
}

#[async_trait]
pub trait PricingStore: Send + Sync {
    async fn create_pricing_rule(&self, request: &PricingRuleCreateDBRequest) -> Result<PricingRuleDBResponse>;
    async fn get_pricing_rule(&self, id: PricingRuleId) -> Result<Option<PricingRuleDBResponse>>;
    async fn list_pricing_rules(&self, room_type_id: RoomTypeId) -> Result<Vec<PricingRuleDBResponse>>;
    async fn delete_pricing_rule(&self, id: PricingRuleId) -> Result<bool>;

    async fn create_promo_code(&self, request: &PromoCodeCreateDBRequest) -> Result<PromoCodeDBResponse>;
    async fn get_promo_code(&self, id: PromoCodeId) -> Result<Option<PromoCodeDBResponse>>;
    /// Case-insensitive lookup
    async fn get_promo_code_by_code(&self, code: &str) -> Result<Option<PromoCodeDBResponse>>;
    /// `Some(hotel)` lists the hotel's codes plus global ones
    async fn list_promo_codes(&self, hotel_id: Option<HotelId>) -> Result<Vec<PromoCodeDBResponse>>;
    async fn update_promo_code(&self, id: PromoCodeId, request: &PromoCodeUpdateDBRequest) -> Result<PromoCodeDBResponse>;
}

#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Inserts the booking and its first history event in one transaction.
    ///
    /// With `hold_id` the hold must be active and owned by `request.user_id`; it is marked
    /// consumed in the same transaction. Without a hold the availability check and the insert
    /// are serialized against other inventory claims on the room type.
    async fn create_booking(&self, request: &BookingCreateDBRequest, actor: UserId, now: DateTime<Utc>) -> Result<CreateBookingOutcome>;

    async fn get_booking(&self, id: BookingId) -> Result<Option<BookingDBResponse>>;
    async fn list_bookings(&self, filter: &BookingFilter) -> Result<(Vec<BookingDBResponse>, i64)>;

    /// Compare-and-set status change. Returns `None` when the booking is not currently in `from`.
    async fn transition_booking(
        &self,
        id: BookingId,
        from: BookingStatus,
        to: BookingStatus,
        actor: UserId,
        now: DateTime<Utc>,
    ) -> Result<Option<BookingDBResponse>>;

    /// Replaces the stay of a booking still in `expected`, re-checking availability without the
    /// booking's own claim.
    async fn update_booking_stay(
        &self,
        id: BookingId,
        expected: BookingStatus,
        update: &BookingStayUpdate,
        now: DateTime<Utc>,
    ) -> Result<UpdateStayOutcome>;

    async fn list_booking_events(&self, booking_id: BookingId) -> Result<Vec<BookingEventDBResponse>>;
}

#[async_trait]
pub trait AttendanceStore: Send + Sync {
    async fn create_attendance_log(&self, request: &AttendanceLogCreateDBRequest) -> Result<AttendanceLogDBResponse>;
    async fn list_attendance_logs(&self, filter: &AttendanceFilter) -> Result<(Vec<AttendanceLogDBResponse>, i64)>;
}

#[async_trait]
pub trait SyncStore: Send + Sync {
    async fn get_sync_record(&self, idempotency_key: &str) -> Result<Option<SyncRecordDBResponse>>;
    /// Upserts the record for its key and bumps the push count
    async fn record_sync_push(&self, record: &SyncRecordUpsert, now: DateTime<Utc>) -> Result<SyncRecordDBResponse>;
    async fn list_sync_records(&self, hotel_id: HotelId) -> Result<Vec<SyncRecordDBResponse>>;

    /// Newest-wins update of a room type's base price
    async fn apply_room_type_price(
        &self,
        hotel_id: HotelId,
        room_type_id: RoomTypeId,
        base_price: i64,
        updated_at: DateTime<Utc>,
    ) -> Result<ApplyOutcome>;

    /// Newest-wins update of a room's active flag
    async fn apply_room_state(&self, hotel_id: HotelId, room_id: RoomId, is_active: bool, updated_at: DateTime<Utc>) -> Result<ApplyOutcome>;
}

/// Everything the application needs from persistence
pub trait Store:
    UserStore + ContentStore + HotelStore + InventoryStore + PricingStore + BookingStore + AttendanceStore + SyncStore
{
}

impl<T> Store for T where
    T: UserStore + ContentStore + HotelStore + InventoryStore + PricingStore + BookingStore + AttendanceStore + SyncStore
{
}
