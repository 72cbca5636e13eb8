//! API layer for HTTP request handling and data models.
//!
//! - **[`handlers`]**: Axum route handlers for all API endpoints
//! - **[`models`]**: Request/response data structures for API communication
//!
//! # API Structure
//!
//! Everything is mounted under `/api/v1`:
//!
//! - **Authentication** (`/authentication/*`): registration, login, refresh, logout, password change
//! - **Users** (`/users/*`): own profile and admin user management
//! - **Catalogue** (`/destinations/*`, `/hotels/*`, `/room-types/*`, `/rooms/*`): public browsing
//!   and manager maintenance
//! - **Inventory** (`/room-types/{id}/availability`, `/holds/*`): availability and reservation holds
//! - **Pricing** (`/pricing/quote`, `/pricing-rules/*`, `/promo-codes/*`)
//! - **Bookings** (`/bookings/*`): booking lifecycle and history
//! - **Sync** (`/hotels/{id}/sync*`, `/sync/*`): channel system pushes and signed inbound updates
//! - **Attendance** (`/attendance`): staff check-in and check-out
//!
//! Successful responses use the [`ApiResponse`](models::response::ApiResponse) envelope, failures
//! the [`ErrorBody`](crate::errors::ErrorBody) envelope.
//!
//! # OpenAPI Documentation
//!
//! All endpoints are documented with `utoipa` annotations. The rendered reference is served at
//! `/api/docs` when the server is running.

pub mod handlers;
pub mod models;
