//! # hotelctl: hotel booking control plane
//!
//! `hotelctl` is the backend of a hotel booking platform. Customers browse destinations and
//! hotels, place short-lived reservation holds on room inventory, quote prices and turn holds into
//! bookings. Hotel managers maintain their hotels, room types, rooms, pricing rules and promo
//! codes, push availability and pricing to an external channel system, and log staff attendance.
//! Administrators can do everything.
//!
//! ## Architecture
//!
//! The HTTP layer is [Axum](https://github.com/tokio-rs/axum). Persistence sits behind the
//! [`db::Store`] trait with two backends: PostgreSQL through SQLx for production and a
//! lock-guarded in-memory store for development and tests.
//!
//! ### Request Flow
//!
//! Every route lives under `/api/v1`. A request is authenticated from a bearer token or the
//! access cookie by the [`CurrentUser`](api::models::users::CurrentUser) extractor, which reloads
//! the account so deactivation takes effect immediately. Role grants are checked by
//! [`RequiresPermission`](auth::permissions::RequiresPermission); ownership of the addressed hotel
//! or booking is checked in the handler. Handlers call the domain services held by [`AppState`].
//!
//! ### Core Components
//!
//! - [`inventory`]: availability over a stay and reservation holds. Holds and bookings are both
//!   claims on per-night inventory, and claim creation is serialized per room type so granted
//!   claims never exceed physical rooms on any night.
//! - [`pricing`]: nightly prices from base price plus date-ranged rules, promo codes and quotes.
//! - [`booking`]: the booking state machine with an append-only event history.
//! - [`sync`]: idempotent outbound pushes to the channel system and signed inbound updates.
//! - [`attendance`]: staff check-in and check-out logs with optional face recognition.
//!
//! **Background services** run next to the server: a sweeper that stamps expired holds and an
//! optional scheduler that pushes every active hotel on an interval.
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use hotelctl::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = hotelctl::config::Args::parse();
//!     let config = Config::load(&args)?;
//!     hotelctl::telemetry::init_telemetry(config.enable_otel_export)?;
//!
//!     let app = Application::new(config).await?;
//!     app.serve(async {
//!         let _ = tokio::signal::ctrl_c().await;
//!     })
//!     .await
//! }
//! ```
//!
//! ## Configuration
//!
//! See the [`config`] module for configuration options.
pub mod api;
pub mod attendance;
pub mod auth;
pub mod booking;
mod capability;
pub mod config;
pub mod db;
pub mod errors;
pub mod inventory;
mod openapi;
pub mod pricing;
pub mod stay;
pub mod sync;
pub mod telemetry;
pub mod types;

#[cfg(test)]
pub mod test_utils;

use crate::{
    api::{handlers, models::users::Role},
    attendance::AttendanceService,
    auth::password,
    booking::BookingService,
    config::{CorsOrigin, DatabaseConfig},
    db::{
        InMemoryStore, PostgresStore, Store,
        models::users::{UserCreateDBRequest, UserUpdateDBRequest},
    },
    inventory::InventoryService,
    openapi::ApiDoc,
    pricing::PricingService,
    sync::{SyncService, SyncTarget},
};
use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    http::{self, HeaderValue},
    routing::{get, post},
};
use bon::Builder;
pub use config::Config;
use sqlx::{PgPool, postgres::PgPoolOptions};
use std::{sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tokio_util::sync::{CancellationToken, DropGuard};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, debug, info, instrument};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

pub use types::UserId;

/// Room for the multipart framing around an attendance photo
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Application state shared across all request handlers.
///
/// The services share one store and one [`PricingService`], so a quote, a hold and a booking
/// for the same stay always see the same prices.
///
/// # Example
///
/// ```ignore
/// let state = AppState::new(config, Arc::new(InMemoryStore::new()))?;
/// let router = build_router(&state)?;
/// ```
#[derive(Clone, Builder)]
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn Store>,
    pub pricing: PricingService,
    pub inventory: InventoryService,
    pub bookings: BookingService,
    pub sync: SyncService,
    pub attendance: AttendanceService,
}

impl AppState {
    /// Build every service over `store`, with the sync target named by the configuration
    pub fn new(config: Config, store: Arc<dyn Store>) -> anyhow::Result<Self> {
        let target = sync::create_target(&config.sync.target)?;
        Self::with_sync_target(config, store, target)
    }

    pub fn with_sync_target(config: Config, store: Arc<dyn Store>, target: Arc<dyn SyncTarget>) -> anyhow::Result<Self> {
        let pricing = PricingService::new(store.clone(), &config);
        let inventory = InventoryService::new(store.clone(), pricing.clone(), &config);
        let bookings = BookingService::new(store.clone(), pricing.clone(), &config);
        let sync = SyncService::new(store.clone(), pricing.clone(), target, &config);
        let attendance = AttendanceService::new(store.clone(), &config)?;

        Ok(Self::builder()
            .config(config)
            .store(store)
            .pricing(pricing)
            .inventory(inventory)
            .bookings(bookings)
            .sync(sync)
            .attendance(attendance)
            .build())
    }
}

/// Get the hotelctl database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Create the initial admin user if it doesn't exist.
///
/// Idempotent: an existing account keeps its id and only has its password replaced when one is
/// given. Without a password no account can be created, so `None` is returned.
#[instrument(skip_all)]
pub async fn create_initial_admin_user(email: &str, password: Option<&str>, store: &dyn Store) -> anyhow::Result<Option<UserId>> {
    let password_hash = match password {
        Some(pwd) => Some(password::hash_password(pwd.to_string()).await?),
        None => None,
    };

    if let Some(existing) = store.get_user_by_email(email).await? {
        if let Some(password_hash) = password_hash {
            store
                .update_user(
                    existing.id,
                    &UserUpdateDBRequest {
                        password_hash: Some(password_hash),
                        ..Default::default()
                    },
                )
                .await?;
        }
        if existing.role != Role::Admin {
            tracing::warn!(email, role = %existing.role, "Initial admin email belongs to a non-admin account");
        }
        return Ok(Some(existing.id));
    }

    let Some(password_hash) = password_hash else {
        tracing::warn!(email, "No admin password configured, skipping initial admin creation");
        return Ok(None);
    };

    let created = store
        .create_user(&UserCreateDBRequest {
            name: "Administrator".to_string(),
            email: email.to_lowercase(),
            phone_number: None,
            gender: None,
            date_of_birth: None,
            role: Role::Admin,
            password_hash,
        })
        .await?;
    info!(user_id = %types::abbrev_uuid(&created.id), "Created initial admin user");
    Ok(Some(created.id))
}

/// Open the configured store. For PostgreSQL this connects and runs migrations; the pool is
/// returned so it can be closed on shutdown.
async fn setup_store(config: &Config) -> anyhow::Result<(Arc<dyn Store>, Option<PgPool>)> {
    match &config.database {
        DatabaseConfig::Memory => {
            info!("Starting with in-memory store: data will be lost on shutdown");
            Ok((Arc::new(InMemoryStore::new()), None))
        }
        DatabaseConfig::Postgres { url, pool: settings } => {
            let pool = PgPoolOptions::new()
                .max_connections(settings.max_connections)
                .min_connections(settings.min_connections)
                .acquire_timeout(Duration::from_secs(settings.acquire_timeout_secs))
                .idle_timeout(Duration::from_secs(settings.idle_timeout_secs))
                .max_lifetime(Duration::from_secs(settings.max_lifetime_secs))
                .connect(url)
                .await?;
            migrator().run(&pool).await?;
            debug!("Database migrations applied");
            Ok((Arc::new(PostgresStore::new(pool.clone())), Some(pool)))
        }
    }
}

/// Create CORS layer from configuration
fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let cors_config = &config.auth.cors;
    let wildcard = cors_config
        .allowed_origins
        .iter()
        .any(|origin| matches!(origin, CorsOrigin::Wildcard));

    let allow_origin = if wildcard {
        // tower-http panics when `*` is combined with credentials
        if cors_config.allow_credentials {
            anyhow::bail!("CORS wildcard origin cannot be combined with allow_credentials");
        }
        AllowOrigin::any()
    } else {
        let mut origins = Vec::new();
        for origin in &cors_config.allowed_origins {
            if let CorsOrigin::Url(url) = origin {
                origins.push(url.as_str().trim_end_matches('/').parse::<HeaderValue>()?);
            }
        }
        AllowOrigin::list(origins)
    };

    let mut cors = CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            http::Method::GET,
            http::Method::POST,
            http::Method::PATCH,
            http::Method::DELETE,
        ])
        .allow_headers([http::header::AUTHORIZATION, http::header::CONTENT_TYPE])
        .allow_credentials(cors_config.allow_credentials)
        .expose_headers(vec![http::header::LOCATION]);

    if let Some(max_age) = cors_config.max_age {
        cors = cors.max_age(Duration::from_secs(max_age));
    }

    Ok(cors)
}

fn api_routes(state: &AppState) -> Router<AppState> {
    use handlers::{attendance, auth, bookings, destinations, hotels, inventory, pricing, reviews, sync, users};

    let upload_limit = state.attendance.max_image_bytes() + MULTIPART_OVERHEAD_BYTES;

    Router::new()
        // Authentication
        .route(
            "/authentication/register",
            get(auth::get_registration_info).post(auth::register),
        )
        .route("/authentication/login", post(auth::login))
        .route("/authentication/refresh", post(auth::refresh))
        .route("/authentication/logout", post(auth::logout))
        .route("/authentication/password-change", post(auth::change_password))
        // Users
        .route("/users", get(users::list_users))
        .route("/users/me", get(users::get_me).patch(users::update_me))
        .route("/users/{id}", get(users::get_user))
        .route("/users/{id}/status", axum::routing::patch(users::update_user_status))
        // Destinations
        .route(
            "/destinations",
            get(destinations::list_destinations).post(destinations::create_destination),
        )
        .route(
            "/destinations/{id}",
            get(destinations::get_destination)
                .patch(destinations::update_destination)
                .delete(destinations::delete_destination),
        )
        // Hotels, room types and rooms
        .route("/hotels", get(hotels::list_hotels).post(hotels::create_hotel))
        .route("/hotels/managed", get(hotels::list_managed_hotels))
        .route(
            "/hotels/{id}",
            get(hotels::get_hotel).patch(hotels::update_hotel).delete(hotels::delete_hotel),
        )
        .route(
            "/hotels/{id}/room-types",
            get(hotels::list_room_types).post(hotels::create_room_type),
        )
        .route("/hotels/{id}/available-rooms", get(hotels::available_rooms))
        .route(
            "/hotels/{id}/reviews",
            get(reviews::list_reviews).post(reviews::create_review),
        )
        .route(
            "/room-types/{id}",
            get(hotels::get_room_type)
                .patch(hotels::update_room_type)
                .delete(hotels::delete_room_type),
        )
        .route(
            "/room-types/{id}/rooms",
            get(hotels::list_rooms).post(hotels::create_room),
        )
        .route(
            "/rooms/{id}",
            axum::routing::patch(hotels::update_room).delete(hotels::delete_room),
        )
        // Inventory and holds
        .route("/room-types/{id}/availability", get(inventory::check_availability))
        .route("/room-types/{id}/calendar", get(inventory::inventory_calendar))
        .route("/holds", get(inventory::list_holds).post(inventory::create_hold))
        .route(
            "/holds/{id}",
            get(inventory::get_hold).delete(inventory::release_hold),
        )
        // Pricing
        .route("/pricing/quote", post(pricing::quote))
        .route("/room-types/{id}/price", get(pricing::price_for_date))
        .route("/room-types/{id}/prices", get(pricing::price_range))
        .route(
            "/room-types/{id}/pricing-rules",
            get(pricing::list_pricing_rules).post(pricing::create_pricing_rule),
        )
        .route("/pricing-rules/{id}", axum::routing::delete(pricing::delete_pricing_rule))
        .route(
            "/promo-codes",
            get(pricing::list_promo_codes).post(pricing::create_promo_code),
        )
        .route("/promo-codes/{id}", axum::routing::patch(pricing::update_promo_code))
        // Bookings
        .route("/bookings", get(bookings::list_bookings).post(bookings::create_booking))
        .route("/bookings/mine", get(bookings::list_own_bookings))
        .route(
            "/bookings/{id}",
            get(bookings::get_booking).patch(bookings::update_booking),
        )
        .route("/bookings/{id}/status", axum::routing::patch(bookings::update_booking_status))
        .route("/bookings/{id}/cancel", post(bookings::cancel_booking))
        .route("/bookings/{id}/events", get(bookings::booking_events))
        // Synchronization
        .route(
            "/hotels/{id}/sync",
            get(sync::sync_status).post(sync::sync_hotel_data),
        )
        .route("/hotels/{id}/sync/availability", post(sync::sync_hotel_availability))
        .route("/hotels/{id}/sync/pricing", post(sync::sync_hotel_pricing))
        .route("/sync/batch", post(sync::sync_multiple_hotels))
        .route("/sync/incoming", post(sync::incoming_sync))
        // Attendance
        .route(
            "/attendance",
            post(attendance::record_attendance)
                .get(attendance::list_attendance)
                .layer(DefaultBodyLimit::max(upload_limit)),
        )
}

/// Build the main application router with all endpoints and middleware.
///
/// - Domain API under `/api/v1`
/// - OpenAPI document at `/api/openapi.json`, rendered by Scalar at `/api/docs`
/// - `/healthz` liveness check
/// - CORS and request tracing around everything
#[instrument(skip_all)]
pub fn build_router(state: &AppState) -> anyhow::Result<Router> {
    let cors = create_cors_layer(&state.config)?;

    let router = Router::new()
        .nest("/api/v1", api_routes(state))
        .route("/healthz", get(|| async { "OK" }))
        .route("/api/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .merge(Scalar::with_url("/api/docs", ApiDoc::openapi()))
        .with_state(state.clone())
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                        .on_request(DefaultOnRequest::new().level(Level::DEBUG))
                        .on_response(DefaultOnResponse::new().level(Level::INFO)),
                )
                .layer(cors),
        );

    Ok(router)
}

/// Container for background services and their lifecycle management.
///
/// - Reservation hold sweeper
/// - Periodic sync scheduler, when `sync.schedule` is configured
///
/// [`shutdown`](BackgroundServices::shutdown) cancels the shared token and waits for every task.
/// Dropping the struct cancels the token through `drop_guard`.
pub struct BackgroundServices {
    background_tasks: Vec<tokio::task::JoinHandle<()>>,
    shutdown_token: CancellationToken,
    // Pub so that we can disarm it if we want to
    pub drop_guard: Option<DropGuard>,
}

impl BackgroundServices {
    /// Gracefully shutdown all background tasks
    pub async fn shutdown(self) {
        self.shutdown_token.cancel();
        for handle in self.background_tasks {
            let _ = handle.await;
        }
    }
}

fn setup_background_services(state: &AppState, shutdown_token: CancellationToken) -> BackgroundServices {
    let drop_guard = shutdown_token.clone().drop_guard();
    let mut background_tasks = Vec::new();

    let sweeper = inventory::sweeper::run_hold_sweeper(
        state.inventory.clone(),
        state.config.inventory.sweep_interval,
        shutdown_token.clone(),
    );
    background_tasks.push(tokio::spawn(sweeper));

    match state.config.sync.schedule.clone() {
        Some(schedule) => {
            let scheduler = sync::scheduler::run_sync_scheduler(state.sync.clone(), schedule, shutdown_token.clone());
            background_tasks.push(tokio::spawn(scheduler));
        }
        None => info!("No sync schedule configured, hotels are only pushed on request"),
    }

    BackgroundServices {
        background_tasks,
        shutdown_token,
        drop_guard: Some(drop_guard),
    }
}

/// Main application struct that owns all resources and lifecycle.
///
/// 1. **Create**: [`Application::new`] opens the store, runs migrations, ensures the initial
///    admin exists and starts background services
/// 2. **Serve**: [`Application::serve`] binds to a TCP port and starts handling requests
/// 3. **Shutdown**: when the shutdown future resolves, background tasks are stopped, the pool is
///    closed and pending spans are flushed
pub struct Application {
    router: Router,
    config: Config,
    pool: Option<PgPool>,
    bg_services: BackgroundServices,
}

impl Application {
    /// Create a new application instance with all resources initialized
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        debug!("Starting hotelctl with configuration: {:#?}", config);

        let (store, pool) = setup_store(&config).await?;
        create_initial_admin_user(&config.admin_email, config.admin_password.as_deref(), store.as_ref()).await?;

        let app_state = AppState::new(config.clone(), store)?;
        let bg_services = setup_background_services(&app_state, CancellationToken::new());
        let router = build_router(&app_state)?;

        Ok(Self {
            router,
            config,
            pool,
            bg_services,
        })
    }

    /// Convert application into a test server (for tests)
    #[cfg(test)]
    pub fn into_test_server(self) -> (axum_test::TestServer, BackgroundServices) {
        let server = axum_test::TestServer::new(self.router).expect("Failed to create test server");
        (server, self.bg_services)
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "hotelctl listening on http://{}, API docs at http://localhost:{}/api/docs",
            bind_addr, self.config.port
        );

        axum::serve(listener, self.router).with_graceful_shutdown(shutdown).await?;

        self.bg_services.shutdown().await;

        if let Some(pool) = self.pool {
            info!("Closing database connections...");
            pool.close().await;
        }

        info!("Shutting down telemetry...");
        telemetry::shutdown_telemetry();

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_utils::{create_test_config, create_test_store};
    use axum::http::StatusCode;
    use serde_json::Value;

    #[tokio::test]
    #[test_log::test]
    async fn test_initial_admin_is_idempotent() {
        let store = create_test_store();

        let first = create_initial_admin_user("Admin@Test.com", Some("first-password"), store.as_ref())
            .await
            .unwrap()
            .unwrap();
        let second = create_initial_admin_user("admin@test.com", Some("second-password"), store.as_ref())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(first, second);

        let admin = store.get_user(first).await.unwrap().unwrap();
        assert_eq!(admin.role, Role::Admin);
        assert!(password::verify_string("second-password", &admin.password_hash).unwrap());
    }

    #[tokio::test]
    async fn test_no_admin_without_password() {
        let store = create_test_store();
        let created = create_initial_admin_user("admin@test.com", None, store.as_ref()).await.unwrap();
        assert!(created.is_none());
        assert!(store.get_user_by_email("admin@test.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_application_serves_health_docs_and_admin_login() {
        let app = Application::new(create_test_config()).await.unwrap();
        let (server, bg_services) = app.into_test_server();

        server.get("/healthz").await.assert_status_ok();

        let doc: Value = server.get("/api/openapi.json").await.json();
        assert_eq!(doc["servers"][0]["url"], "/api/v1");
        assert!(doc["paths"]["/bookings"].is_object());
        assert!(doc["components"]["securitySchemes"]["BearerAuth"].is_object());

        let response = server
            .post("/api/v1/authentication/login")
            .json(&serde_json::json!({ "email": "admin@test.com", "password": "admin-password", "role": "admin" }))
            .await;
        response.assert_status_ok();

        server.get("/api/v1/users").await.assert_status(StatusCode::UNAUTHORIZED);

        bg_services.shutdown().await;
    }

    #[test]
    fn test_cors_wildcard_requires_no_credentials() {
        let mut config = create_test_config();
        config.auth.cors.allowed_origins = vec![
            CorsOrigin::Url("https://app.example.com".parse().unwrap()),
            CorsOrigin::Wildcard,
        ];
        config.auth.cors.allow_credentials = true;
        assert!(create_cors_layer(&config).is_err());

        config.auth.cors.allow_credentials = false;
        assert!(create_cors_layer(&config).is_ok());
    }
}
