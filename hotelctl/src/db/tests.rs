//! Behavioural tests shared by every store backend.
//!
//! Each scenario is an `async fn run_test_*<S: Store>` run against [`InMemoryStore`] always and
//! against [`PostgresStore`] when the `pg-tests` feature is enabled.

use chrono::{Duration, NaiveDate, Utc};
use rstest::{fixture, rstest};

use crate::api::models::users::Role;
use crate::db::errors::DbError;
use crate::db::models::{
    bookings::{BookingCreateDBRequest, BookingFilter, BookingStatus, BookingStayUpdate, CreateBookingOutcome, UpdateStayOutcome},
    hotels::{HotelCreateDBRequest, HotelDBResponse, HotelStatus, RoomCreateDBRequest, RoomTypeCreateDBRequest, RoomTypeDBResponse, RoomTypeUpdateDBRequest},
    inventory::{HoldCreateDBRequest, HoldDBResponse, HoldOutcome, ReleaseReason, available_over},
    pricing::{DiscountKind, PromoCodeCreateDBRequest},
    sync::{ApplyOutcome, SyncKind, SyncRecordUpsert},
    users::{UserCreateDBRequest, UserDBResponse},
};
use crate::db::{InMemoryStore, Store};

#[cfg(feature = "pg-tests")]
use crate::db::PostgresStore;
#[cfg(feature = "pg-tests")]
use sqlx::PgPool;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

async fn seed_user<S: Store>(store: &S, email: &str, role: Role) -> UserDBResponse {
    store
        .create_user(&UserCreateDBRequest {
            name: "Test User".to_string(),
            email: email.to_string(),
            phone_number: None,
            gender: None,
            date_of_birth: None,
            role,
            password_hash: "hash".to_string(),
        })
        .await
        .unwrap()
}

/// Manager, active hotel and one room type with `rooms` active rooms
async fn seed_room_type<S: Store>(store: &S, rooms: usize) -> (UserDBResponse, HotelDBResponse, RoomTypeDBResponse) {
    let manager = seed_user(store, &format!("manager-{}@example.com", uuid::Uuid::new_v4()), Role::HotelManager).await;
    let hotel = store
        .create_hotel(&HotelCreateDBRequest {
            owner_id: manager.id,
            destination_id: None,
            name: format!("Hotel {}", uuid::Uuid::new_v4()),
            address: "1 Beach Road".to_string(),
            city: "Da Nang".to_string(),
            description: None,
            star_rating: Some(4),
            status: HotelStatus::Active,
        })
        .await
        .unwrap();
    let room_type = store
        .create_room_type(&RoomTypeCreateDBRequest {
            hotel_id: hotel.id,
            name: "Deluxe".to_string(),
            description: None,
            base_price: 1_000_000,
            max_guests: 2,
        })
        .await
        .unwrap();
    for number in 0..rooms {
        store
            .create_room(&RoomCreateDBRequest {
                room_type_id: room_type.id,
                room_number: format!("{}", 101 + number),
            })
            .await
            .unwrap();
    }
    (manager, hotel, room_type)
}

fn hold_request(room_type: &RoomTypeDBResponse, user: &UserDBResponse, quantity: i32, check_in: NaiveDate, check_out: NaiveDate) -> HoldCreateDBRequest {
    HoldCreateDBRequest {
        room_type_id: room_type.id,
        user_id: user.id,
        check_in,
        check_out,
        quantity,
        expires_at: Utc::now() + Duration::minutes(15),
    }
}

fn booking_request(hotel: &HotelDBResponse, room_type: &RoomTypeDBResponse, user: &UserDBResponse, rooms: i32) -> BookingCreateDBRequest {
    BookingCreateDBRequest {
        user_id: user.id,
        hotel_id: hotel.id,
        room_type_id: room_type.id,
        hold_id: None,
        check_in: date(2030, 6, 1),
        check_out: date(2030, 6, 3),
        guests: 2,
        rooms,
        subtotal: 2_000_000 * i64::from(rooms),
        discount: 0,
        total_price: 2_000_000 * i64::from(rooms),
        promo_code: None,
        status: BookingStatus::Pending,
        special_requests: None,
    }
}

fn granted(outcome: HoldOutcome) -> HoldDBResponse {
    match outcome {
        HoldOutcome::Granted(hold) => hold,
        HoldOutcome::Insufficient { available } => panic!("expected hold to be granted, {available} available"),
    }
}

#[fixture]
fn in_memory_store() -> InMemoryStore {
    InMemoryStore::new()
}

async fn run_test_duplicate_email_is_unique_violation<S: Store>(store: &S) {
    seed_user(store, "guest@example.com", Role::Customer).await;
    let result = store
        .create_user(&UserCreateDBRequest {
            name: "Other".to_string(),
            email: "GUEST@example.com".to_string(),
            phone_number: None,
            gender: None,
            date_of_birth: None,
            role: Role::Customer,
            password_hash: "hash".to_string(),
        })
        .await;

    match result {
        Err(DbError::UniqueViolation { constraint, .. }) => assert_eq!(constraint.as_deref(), Some("users_email_key")),
        other => panic!("expected unique violation, got {other:?}"),
    }

    let found = store.get_user_by_email("Guest@Example.com").await.unwrap();
    assert_eq!(found.unwrap().email, "guest@example.com");
}

#[rstest]
#[tokio::test]
async fn test_duplicate_email_is_unique_violation(in_memory_store: InMemoryStore) {
    run_test_duplicate_email_is_unique_violation(&in_memory_store).await;
}

#[cfg(feature = "pg-tests")]
#[sqlx::test]
async fn test_duplicate_email_is_unique_violation_postgres(pool: PgPool) {
    run_test_duplicate_email_is_unique_violation(&PostgresStore::new(pool)).await;
}

async fn run_test_holds_never_exceed_rooms<S: Store>(store: &S) {
    let (_, _, room_type) = seed_room_type(store, 2).await;
    let guest = seed_user(store, "guest@example.com", Role::Customer).await;
    let now = Utc::now();

    let first = granted(
        store
            .create_hold(&hold_request(&room_type, &guest, 2, date(2030, 6, 1), date(2030, 6, 3)), now)
            .await
            .unwrap(),
    );

    // Overlaps on the night of June 2nd only
    let overlapping = hold_request(&room_type, &guest, 1, date(2030, 6, 2), date(2030, 6, 5));
    match store.create_hold(&overlapping, now).await.unwrap() {
        HoldOutcome::Insufficient { available } => assert_eq!(available, 0),
        HoldOutcome::Granted(_) => panic!("hold should have been refused"),
    }

    // Adjacent stay starting on check-out day does not overlap
    let adjacent = granted(
        store
            .create_hold(&hold_request(&room_type, &guest, 2, date(2030, 6, 3), date(2030, 6, 4)), now)
            .await
            .unwrap(),
    );

    // June 2nd is free again, June 3rd is still fully held
    store.release_hold(first.id, now).await.unwrap().unwrap();
    match store.create_hold(&overlapping, now).await.unwrap() {
        HoldOutcome::Insufficient { available } => assert_eq!(available, 0),
        HoldOutcome::Granted(_) => panic!("the adjacent hold still claims June 3rd"),
    }
    granted(
        store
            .create_hold(&hold_request(&room_type, &guest, 1, date(2030, 6, 1), date(2030, 6, 3)), now)
            .await
            .unwrap(),
    );

    store.release_hold(adjacent.id, now).await.unwrap().unwrap();
    granted(store.create_hold(&overlapping, now).await.unwrap());
}

#[rstest]
#[tokio::test]
async fn test_holds_never_exceed_rooms(in_memory_store: InMemoryStore) {
    run_test_holds_never_exceed_rooms(&in_memory_store).await;
}

#[cfg(feature = "pg-tests")]
#[sqlx::test]
async fn test_holds_never_exceed_rooms_postgres(pool: PgPool) {
    run_test_holds_never_exceed_rooms(&PostgresStore::new(pool)).await;
}

async fn run_test_concurrent_holds_are_serialized<S: Store + Clone + 'static>(store: &S) {
    let (_, _, room_type) = seed_room_type(store, 3).await;
    let guest = seed_user(store, "guest@example.com", Role::Customer).await;

    let mut handles = Vec::new();
    for _ in 0..10 {
        let store = store.clone();
        let request = hold_request(&room_type, &guest, 1, date(2030, 6, 1), date(2030, 6, 4));
        handles.push(tokio::spawn(async move { store.create_hold(&request, Utc::now()).await.unwrap() }));
    }

    let mut granted_count = 0;
    for handle in handles {
        if matches!(handle.await.unwrap(), HoldOutcome::Granted(_)) {
            granted_count += 1;
        }
    }
    assert_eq!(granted_count, 3);

    let nights = store
        .occupancy(room_type.id, date(2030, 6, 1), date(2030, 6, 4), Utc::now(), None)
        .await
        .unwrap();
    assert!(nights.iter().all(|night| night.held == 3 && night.available() == 0));
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_holds_are_serialized(in_memory_store: InMemoryStore) {
    run_test_concurrent_holds_are_serialized(&in_memory_store).await;
}

#[cfg(feature = "pg-tests")]
#[sqlx::test]
async fn test_concurrent_holds_are_serialized_postgres(pool: PgPool) {
    run_test_concurrent_holds_are_serialized(&PostgresStore::new(pool)).await;
}

async fn run_test_release_and_expiry<S: Store>(store: &S) {
    let (_, _, room_type) = seed_room_type(store, 1).await;
    let guest = seed_user(store, "guest@example.com", Role::Customer).await;
    let now = Utc::now();

    let hold = granted(
        store
            .create_hold(&hold_request(&room_type, &guest, 1, date(2030, 6, 1), date(2030, 6, 2)), now)
            .await
            .unwrap(),
    );
    let released = store.release_hold(hold.id, now).await.unwrap().unwrap();
    assert_eq!(released.release_reason, Some(ReleaseReason::Released));
    // Second release is a no-op
    assert!(store.release_hold(hold.id, now).await.unwrap().is_none());
    assert!(store.release_hold(uuid::Uuid::new_v4(), now).await.unwrap().is_none());

    let expiring = granted(
        store
            .create_hold(&hold_request(&room_type, &guest, 1, date(2030, 6, 1), date(2030, 6, 2)), now)
            .await
            .unwrap(),
    );
    let later = expiring.expires_at + Duration::seconds(1);

    // Expired but unswept holds no longer count
    let nights = store
        .occupancy(room_type.id, date(2030, 6, 1), date(2030, 6, 2), later, None)
        .await
        .unwrap();
    assert_eq!(available_over(&nights), 1);
    assert!(store.release_hold(expiring.id, later).await.unwrap().is_none());

    assert_eq!(store.expire_holds(later).await.unwrap(), 1);
    assert_eq!(store.expire_holds(later).await.unwrap(), 0);
    let swept = store.get_hold(expiring.id).await.unwrap().unwrap();
    assert_eq!(swept.release_reason, Some(ReleaseReason::Expired));
}

#[rstest]
#[tokio::test]
async fn test_release_and_expiry(in_memory_store: InMemoryStore) {
    run_test_release_and_expiry(&in_memory_store).await;
}

#[cfg(feature = "pg-tests")]
#[sqlx::test]
async fn test_release_and_expiry_postgres(pool: PgPool) {
    run_test_release_and_expiry(&PostgresStore::new(pool)).await;
}

async fn run_test_unavailable_room_type_has_no_inventory<S: Store>(store: &S) {
    let (_, _, room_type) = seed_room_type(store, 2).await;
    store
        .update_room_type(
            room_type.id,
            &RoomTypeUpdateDBRequest {
                is_available: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let nights = store
        .occupancy(room_type.id, date(2030, 6, 1), date(2030, 6, 3), Utc::now(), None)
        .await
        .unwrap();
    assert_eq!(nights.len(), 2);
    assert!(nights.iter().all(|night| night.total_rooms == 0));
}

#[rstest]
#[tokio::test]
async fn test_unavailable_room_type_has_no_inventory(in_memory_store: InMemoryStore) {
    run_test_unavailable_room_type_has_no_inventory(&in_memory_store).await;
}

#[cfg(feature = "pg-tests")]
#[sqlx::test]
async fn test_unavailable_room_type_has_no_inventory_postgres(pool: PgPool) {
    run_test_unavailable_room_type_has_no_inventory(&PostgresStore::new(pool)).await;
}

async fn run_test_booking_consumes_hold<S: Store>(store: &S) {
    let (_, hotel, room_type) = seed_room_type(store, 1).await;
    let guest = seed_user(store, "guest@example.com", Role::Customer).await;
    let other = seed_user(store, "other@example.com", Role::Customer).await;
    let now = Utc::now();

    let hold = granted(
        store
            .create_hold(&hold_request(&room_type, &guest, 1, date(2030, 6, 1), date(2030, 6, 3)), now)
            .await
            .unwrap(),
    );

    // Someone else's hold cannot be used
    let mut stolen = booking_request(&hotel, &room_type, &other, 1);
    stolen.hold_id = Some(hold.id);
    assert!(matches!(
        store.create_booking(&stolen, other.id, now).await.unwrap(),
        CreateBookingOutcome::HoldUnavailable
    ));

    let mut request = booking_request(&hotel, &room_type, &guest, 1);
    request.hold_id = Some(hold.id);
    let booking = match store.create_booking(&request, guest.id, now).await.unwrap() {
        CreateBookingOutcome::Created(booking) => booking,
        other => panic!("expected booking, got {other:?}"),
    };
    assert_eq!(booking.status, BookingStatus::Pending);

    let consumed = store.get_hold(hold.id).await.unwrap().unwrap();
    assert_eq!(consumed.release_reason, Some(ReleaseReason::Consumed));

    // The booking now claims the room instead of the hold
    let nights = store
        .occupancy(room_type.id, date(2030, 6, 1), date(2030, 6, 3), now, None)
        .await
        .unwrap();
    assert!(nights.iter().all(|night| night.held == 0 && night.booked == 1));

    // The hold cannot be used twice
    assert!(matches!(
        store.create_booking(&request, guest.id, now).await.unwrap(),
        CreateBookingOutcome::HoldUnavailable
    ));

    let events = store.list_booking_events(booking.id).await.unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].from_status, None);
    assert_eq!(events[0].to_status, BookingStatus::Pending);
}

#[rstest]
#[tokio::test]
async fn test_booking_consumes_hold(in_memory_store: InMemoryStore) {
    run_test_booking_consumes_hold(&in_memory_store).await;
}

#[cfg(feature = "pg-tests")]
#[sqlx::test]
async fn test_booking_consumes_hold_postgres(pool: PgPool) {
    run_test_booking_consumes_hold(&PostgresStore::new(pool)).await;
}

async fn run_test_booking_without_hold_checks_inventory<S: Store>(store: &S) {
    let (_, hotel, room_type) = seed_room_type(store, 2).await;
    let guest = seed_user(store, "guest@example.com", Role::Customer).await;
    let now = Utc::now();

    let outcome = store
        .create_booking(&booking_request(&hotel, &room_type, &guest, 3), guest.id, now)
        .await
        .unwrap();
    assert!(matches!(outcome, CreateBookingOutcome::Insufficient { available: 2 }));

    let outcome = store
        .create_booking(&booking_request(&hotel, &room_type, &guest, 2), guest.id, now)
        .await
        .unwrap();
    assert!(matches!(outcome, CreateBookingOutcome::Created(_)));

    let outcome = store
        .create_booking(&booking_request(&hotel, &room_type, &guest, 1), guest.id, now)
        .await
        .unwrap();
    assert!(matches!(outcome, CreateBookingOutcome::Insufficient { available: 0 }));
}

#[rstest]
#[tokio::test]
async fn test_booking_without_hold_checks_inventory(in_memory_store: InMemoryStore) {
    run_test_booking_without_hold_checks_inventory(&in_memory_store).await;
}

#[cfg(feature = "pg-tests")]
#[sqlx::test]
async fn test_booking_without_hold_checks_inventory_postgres(pool: PgPool) {
    run_test_booking_without_hold_checks_inventory(&PostgresStore::new(pool)).await;
}

async fn run_test_transition_is_compare_and_set<S: Store>(store: &S) {
    let (manager, hotel, room_type) = seed_room_type(store, 1).await;
    let guest = seed_user(store, "guest@example.com", Role::Customer).await;
    let now = Utc::now();

    let CreateBookingOutcome::Created(booking) = store
        .create_booking(&booking_request(&hotel, &room_type, &guest, 1), guest.id, now)
        .await
        .unwrap()
    else {
        panic!("booking should be created");
    };

    let confirmed = store
        .transition_booking(booking.id, BookingStatus::Pending, BookingStatus::Confirmed, manager.id, now)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(confirmed.status, BookingStatus::Confirmed);

    // A racing writer that still believes the booking is pending loses
    let lost = store
        .transition_booking(booking.id, BookingStatus::Pending, BookingStatus::Cancelled, guest.id, now)
        .await
        .unwrap();
    assert!(lost.is_none());

    let cancelled = store
        .transition_booking(booking.id, BookingStatus::Confirmed, BookingStatus::Cancelled, guest.id, now)
        .await
        .unwrap()
        .unwrap();
    assert!(cancelled.cancelled_at.is_some());

    // Cancelled bookings release their rooms
    let nights = store
        .occupancy(room_type.id, date(2030, 6, 1), date(2030, 6, 3), now, None)
        .await
        .unwrap();
    assert_eq!(available_over(&nights), 1);

    let events = store.list_booking_events(booking.id).await.unwrap();
    let statuses: Vec<_> = events.iter().map(|event| event.to_status).collect();
    assert_eq!(statuses, vec![BookingStatus::Pending, BookingStatus::Confirmed, BookingStatus::Cancelled]);
    assert_eq!(events[1].actor_id, manager.id);
}

#[rstest]
#[tokio::test]
async fn test_transition_is_compare_and_set(in_memory_store: InMemoryStore) {
    run_test_transition_is_compare_and_set(&in_memory_store).await;
}

#[cfg(feature = "pg-tests")]
#[sqlx::test]
async fn test_transition_is_compare_and_set_postgres(pool: PgPool) {
    run_test_transition_is_compare_and_set(&PostgresStore::new(pool)).await;
}

async fn run_test_update_stay_excludes_own_claim<S: Store>(store: &S) {
    let (_, hotel, room_type) = seed_room_type(store, 1).await;
    let guest = seed_user(store, "guest@example.com", Role::Customer).await;
    let now = Utc::now();

    let CreateBookingOutcome::Created(booking) = store
        .create_booking(&booking_request(&hotel, &room_type, &guest, 1), guest.id, now)
        .await
        .unwrap()
    else {
        panic!("booking should be created");
    };

    // Extending by one night only needs the booking's own room on the shared nights
    let update = BookingStayUpdate {
        check_in: date(2030, 6, 2),
        check_out: date(2030, 6, 4),
        guests: 1,
        rooms: 1,
        subtotal: 2_000_000,
        discount: 0,
        total_price: 2_000_000,
    };
    let updated = match store.update_booking_stay(booking.id, BookingStatus::Pending, &update, now).await.unwrap() {
        UpdateStayOutcome::Updated(updated) => updated,
        other => panic!("expected update, got {other:?}"),
    };
    assert_eq!(updated.check_in, date(2030, 6, 2));
    assert_eq!(updated.guests, 1);

    let wider = BookingStayUpdate { rooms: 2, ..update.clone() };
    assert!(matches!(
        store.update_booking_stay(booking.id, BookingStatus::Pending, &wider, now).await.unwrap(),
        UpdateStayOutcome::Insufficient { available: 1 }
    ));

    assert!(matches!(
        store.update_booking_stay(booking.id, BookingStatus::Confirmed, &update, now).await.unwrap(),
        UpdateStayOutcome::StatusChanged
    ));
}

#[rstest]
#[tokio::test]
async fn test_update_stay_excludes_own_claim(in_memory_store: InMemoryStore) {
    run_test_update_stay_excludes_own_claim(&in_memory_store).await;
}

#[cfg(feature = "pg-tests")]
#[sqlx::test]
async fn test_update_stay_excludes_own_claim_postgres(pool: PgPool) {
    run_test_update_stay_excludes_own_claim(&PostgresStore::new(pool)).await;
}

async fn run_test_list_bookings_by_hotel_owner<S: Store>(store: &S) {
    let (manager, hotel, room_type) = seed_room_type(store, 2).await;
    let (_, other_hotel, other_room_type) = seed_room_type(store, 2).await;
    let guest = seed_user(store, "guest@example.com", Role::Customer).await;
    let now = Utc::now();

    store
        .create_booking(&booking_request(&hotel, &room_type, &guest, 1), guest.id, now)
        .await
        .unwrap();
    store
        .create_booking(&booking_request(&other_hotel, &other_room_type, &guest, 1), guest.id, now)
        .await
        .unwrap();

    let (mine, total) = store
        .list_bookings(&BookingFilter {
            hotel_owner_id: Some(manager.id),
            limit: 10,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(total, 1);
    assert_eq!(mine[0].hotel_id, hotel.id);

    let (all, total) = store
        .list_bookings(&BookingFilter {
            user_id: Some(guest.id),
            limit: 1,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(total, 2);
    assert_eq!(all.len(), 1);
}

#[rstest]
#[tokio::test]
async fn test_list_bookings_by_hotel_owner(in_memory_store: InMemoryStore) {
    run_test_list_bookings_by_hotel_owner(&in_memory_store).await;
}

#[cfg(feature = "pg-tests")]
#[sqlx::test]
async fn test_list_bookings_by_hotel_owner_postgres(pool: PgPool) {
    run_test_list_bookings_by_hotel_owner(&PostgresStore::new(pool)).await;
}

async fn run_test_hotel_with_bookings_cannot_be_deleted<S: Store>(store: &S) {
    let (_, hotel, room_type) = seed_room_type(store, 1).await;
    let guest = seed_user(store, "guest@example.com", Role::Customer).await;
    store
        .create_booking(&booking_request(&hotel, &room_type, &guest, 1), guest.id, Utc::now())
        .await
        .unwrap();

    let result = store.delete_hotel(hotel.id).await;
    assert!(matches!(result, Err(DbError::ForeignKeyViolation { .. })));

    let (_, empty_hotel, empty_room_type) = seed_room_type(store, 1).await;
    assert!(store.delete_hotel(empty_hotel.id).await.unwrap());
    assert!(store.get_room_type(empty_room_type.id).await.unwrap().is_none());
}

#[rstest]
#[tokio::test]
async fn test_hotel_with_bookings_cannot_be_deleted(in_memory_store: InMemoryStore) {
    run_test_hotel_with_bookings_cannot_be_deleted(&in_memory_store).await;
}

#[cfg(feature = "pg-tests")]
#[sqlx::test]
async fn test_hotel_with_bookings_cannot_be_deleted_postgres(pool: PgPool) {
    run_test_hotel_with_bookings_cannot_be_deleted(&PostgresStore::new(pool)).await;
}

async fn run_test_promo_codes_are_case_insensitive<S: Store>(store: &S) {
    let promo = store
        .create_promo_code(&PromoCodeCreateDBRequest {
            code: "summer10".to_string(),
            kind: DiscountKind::Percent,
            value: 10,
            valid_from: None,
            valid_until: None,
            min_nights: None,
            hotel_id: None,
        })
        .await
        .unwrap();
    assert_eq!(promo.code, "SUMMER10");

    let found = store.get_promo_code_by_code("Summer10").await.unwrap().unwrap();
    assert_eq!(found.id, promo.id);

    let duplicate = store
        .create_promo_code(&PromoCodeCreateDBRequest {
            code: "SUMMER10".to_string(),
            kind: DiscountKind::Fixed,
            value: 5,
            valid_from: None,
            valid_until: None,
            min_nights: None,
            hotel_id: None,
        })
        .await;
    assert!(matches!(duplicate, Err(DbError::UniqueViolation { .. })));
}

#[rstest]
#[tokio::test]
async fn test_promo_codes_are_case_insensitive(in_memory_store: InMemoryStore) {
    run_test_promo_codes_are_case_insensitive(&in_memory_store).await;
}

#[cfg(feature = "pg-tests")]
#[sqlx::test]
async fn test_promo_codes_are_case_insensitive_postgres(pool: PgPool) {
    run_test_promo_codes_are_case_insensitive(&PostgresStore::new(pool)).await;
}

async fn run_test_sync_records_and_newest_wins<S: Store>(store: &S) {
    let (_, hotel, room_type) = seed_room_type(store, 1).await;
    let (_, other_hotel, _) = seed_room_type(store, 1).await;
    let now = Utc::now();

    let upsert = SyncRecordUpsert {
        idempotency_key: "key-1".to_string(),
        hotel_id: hotel.id,
        kind: SyncKind::Availability,
        range_start: date(2030, 6, 1),
        range_end: date(2030, 6, 30),
        snapshot_hash: "abc".to_string(),
        records: 30,
    };
    assert_eq!(store.record_sync_push(&upsert, now).await.unwrap().push_count, 1);
    assert_eq!(store.record_sync_push(&upsert, now).await.unwrap().push_count, 2);
    assert_eq!(store.list_sync_records(hotel.id).await.unwrap().len(), 1);

    let newer = room_type.updated_at + Duration::minutes(5);
    assert_eq!(
        store.apply_room_type_price(hotel.id, room_type.id, 1_200_000, newer).await.unwrap(),
        ApplyOutcome::Applied
    );
    assert_eq!(
        store
            .apply_room_type_price(hotel.id, room_type.id, 900_000, room_type.updated_at)
            .await
            .unwrap(),
        ApplyOutcome::Stale
    );
    assert_eq!(
        store.apply_room_type_price(other_hotel.id, room_type.id, 900_000, newer).await.unwrap(),
        ApplyOutcome::Unknown
    );
    assert_eq!(store.get_room_type(room_type.id).await.unwrap().unwrap().base_price, 1_200_000);

    let room = store.list_rooms(room_type.id).await.unwrap().remove(0);
    assert_eq!(
        store
            .apply_room_state(hotel.id, room.id, false, room.updated_at + Duration::minutes(1))
            .await
            .unwrap(),
        ApplyOutcome::Applied
    );
    assert!(!store.get_room(room.id).await.unwrap().unwrap().is_active);
}

#[rstest]
#[tokio::test]
async fn test_sync_records_and_newest_wins(in_memory_store: InMemoryStore) {
    run_test_sync_records_and_newest_wins(&in_memory_store).await;
}

#[cfg(feature = "pg-tests")]
#[sqlx::test]
async fn test_sync_records_and_newest_wins_postgres(pool: PgPool) {
    run_test_sync_records_and_newest_wins(&PostgresStore::new(pool)).await;
}
