//! API request and response data models.
//!
//! API models are distinct from database models so the wire contract and the storage layout can
//! evolve independently. Every model derives `utoipa::ToSchema` for the OpenAPI document.
//!
//! - [`auth`]: registration, login and password change payloads
//! - [`users`]: profiles, roles and the authenticated [`users::CurrentUser`]
//! - [`content`]: destinations and reviews
//! - [`hotels`]: hotels, room types and rooms
//! - [`inventory`]: availability queries and reservation holds
//! - [`pricing`]: quotes, pricing rules and promo codes
//! - [`bookings`]: bookings and their status history
//! - [`sync`]: outbound sync requests
//! - [`attendance`]: staff attendance logs
//! - [`pagination`] and [`response`]: shared list parameters and the success envelope

pub mod attendance;
pub mod auth;
pub mod bookings;
pub mod content;
pub mod hotels;
pub mod inventory;
pub mod pagination;
pub mod pricing;
pub mod response;
pub mod sync;
pub mod users;
