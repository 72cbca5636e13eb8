//! Test utilities shared by service and handler tests.

use std::sync::Arc;

use chrono::{Days, NaiveDate, Utc};
use uuid::Uuid;

use axum_test::TestServer;

use crate::AppState;
use crate::api::models::users::{CurrentUser, Role};
use crate::auth::{
    password::{self, Argon2Params},
    session,
};
use crate::config::{Config, DatabaseConfig};
use crate::db::models::{
    hotels::{HotelCreateDBRequest, HotelDBResponse, HotelStatus, RoomCreateDBRequest, RoomTypeCreateDBRequest, RoomTypeDBResponse},
    users::{UserCreateDBRequest, UserDBResponse},
};
use crate::db::{InMemoryStore, Store};
use crate::sync::target::LogSyncTarget;

/// Password of every user created by [`login_as`]
pub const TEST_PASSWORD: &str = "test-password";

/// Cheap hashing parameters, production defaults make handler tests slow
const TEST_ARGON2: Argon2Params = Argon2Params {
    memory_kib: 1024,
    iterations: 1,
    parallelism: 1,
};

pub fn create_test_config() -> Config {
    let mut config = Config {
        database: DatabaseConfig::Memory,
        host: "127.0.0.1".to_string(),
        port: 0,
        admin_email: "admin@test.com".to_string(),
        admin_password: Some("admin-password".to_string()),
        secret_key: Some("test-secret-key-for-testing-only".to_string()),
        ..Default::default()
    };
    config.auth.cookies.secure = false;
    config.sync.inbound_secret = Some("inbound-test-secret".to_string());
    config
}

pub fn create_test_store() -> Arc<dyn Store> {
    Arc::new(InMemoryStore::new())
}

/// State over a fresh in-memory store, with pushes recorded by a [`LogSyncTarget`]
pub fn create_test_state() -> AppState {
    AppState::with_sync_target(create_test_config(), create_test_store(), Arc::new(LogSyncTarget::default()))
        .expect("Failed to build test state")
}

pub async fn create_test_app() -> (TestServer, AppState) {
    let state = create_test_state();
    let router = crate::build_router(&state).expect("Failed to build router");
    let server = TestServer::new(router).expect("Failed to create test server");
    (server, state)
}

/// Creates an active user with [`TEST_PASSWORD`] and returns it with a valid access token
pub async fn login_as(state: &AppState, role: Role) -> (CurrentUser, String) {
    let password_hash = password::hash_string_with_params(TEST_PASSWORD, TEST_ARGON2).expect("Failed to hash test password");
    let user = state
        .store
        .create_user(&UserCreateDBRequest {
            name: format!("Test {role}"),
            email: format!("{}@example.com", Uuid::new_v4()),
            phone_number: None,
            gender: None,
            date_of_birth: None,
            role,
            password_hash,
        })
        .await
        .expect("Failed to create test user");
    let user = current_user(&user);
    let tokens = session::issue_tokens(&user, &state.config).expect("Failed to issue test tokens");
    (user, tokens.access_token)
}

/// `n` days after today (UTC)
pub fn days_from_today(n: u64) -> NaiveDate {
    Utc::now()
        .date_naive()
        .checked_add_days(Days::new(n))
        .expect("date in range")
}

pub async fn create_test_user(store: &dyn Store, role: Role) -> UserDBResponse {
    store
        .create_user(&UserCreateDBRequest {
            name: format!("Test {role}"),
            email: format!("{}@example.com", Uuid::new_v4()),
            phone_number: None,
            gender: None,
            date_of_birth: None,
            role,
            password_hash: "not-a-real-hash".to_string(),
        })
        .await
        .expect("Failed to create test user")
}

pub fn current_user(user: &UserDBResponse) -> CurrentUser {
    CurrentUser::from(user.clone())
}

/// Active hotel owned by `owner` with one room type holding `rooms` active rooms
pub async fn create_test_room_type(
    store: &dyn Store,
    owner: &UserDBResponse,
    rooms: usize,
    base_price: i64,
) -> (HotelDBResponse, RoomTypeDBResponse) {
    let hotel = store
        .create_hotel(&HotelCreateDBRequest {
            owner_id: owner.id,
            destination_id: None,
            name: format!("Hotel {}", Uuid::new_v4()),
            address: "1 Beach Road".to_string(),
            city: "Da Nang".to_string(),
            description: None,
            star_rating: Some(4),
            status: HotelStatus::Active,
        })
        .await
        .expect("Failed to create test hotel");
    let room_type = create_test_room_type_in(store, &hotel, "Deluxe", rooms, base_price).await;
    (hotel, room_type)
}

pub async fn create_test_room_type_in(
    store: &dyn Store,
    hotel: &HotelDBResponse,
    name: &str,
    rooms: usize,
    base_price: i64,
) -> RoomTypeDBResponse {
    let room_type = store
        .create_room_type(&RoomTypeCreateDBRequest {
            hotel_id: hotel.id,
            name: name.to_string(),
            description: None,
            base_price,
            max_guests: 2,
        })
        .await
        .expect("Failed to create test room type");
    for number in 0..rooms {
        store
            .create_room(&RoomCreateDBRequest {
                room_type_id: room_type.id,
                room_number: format!("{}", 101 + number),
            })
            .await
            .expect("Failed to create test room");
    }
    room_type
}

/// Installs the TLS crypto provider reqwest needs. Safe to call more than once.
pub fn install_crypto_provider() {
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();
}
