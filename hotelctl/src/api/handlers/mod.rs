//! HTTP request handlers for all API endpoints.
//!
//! Each handler validates its input, checks the caller's role permission through
//! [`RequiresPermission`](crate::auth::permissions::RequiresPermission) or
//! [`CurrentUser`], checks ownership of the addressed entity, then calls a domain service or the
//! store. Errors convert to the JSON error envelope through [`crate::errors::Error`].
//!
//! - [`auth`]: registration, login, token refresh, logout and password change
//! - [`users`]: own profile and admin user management
//! - [`destinations`]: destination catalogue
//! - [`hotels`]: hotels, room types and rooms
//! - [`reviews`]: hotel reviews
//! - [`inventory`]: availability, calendar and reservation holds
//! - [`pricing`]: quotes, nightly prices, pricing rules and promo codes
//! - [`bookings`]: booking lifecycle
//! - [`sync`]: outbound pushes, status and signed inbound updates
//! - [`attendance`]: staff attendance logs

pub mod attendance;
pub mod auth;
pub mod bookings;
pub mod destinations;
pub mod hotels;
pub mod inventory;
pub mod pricing;
pub mod reviews;
pub mod sync;
pub mod users;

use crate::{
    AppState,
    api::models::users::CurrentUser,
    auth::permissions::{can_manage_hotel, forbidden},
    db::models::hotels::{HotelDBResponse, RoomTypeDBResponse},
    errors::{Error, Result},
    types::{HotelId, Operation, Resource, RoomTypeId},
};

/// Load a hotel the caller manages. Hotels are public, so a hotel owned by someone else is a
/// permission error rather than a not-found.
pub(crate) async fn managed_hotel(
    state: &AppState,
    user: &CurrentUser,
    hotel_id: HotelId,
    resource: Resource,
    operation: Operation,
) -> Result<HotelDBResponse> {
    let hotel = state
        .store
        .get_hotel(hotel_id)
        .await?
        .ok_or_else(|| Error::not_found("Hotel", hotel_id))?;
    if !can_manage_hotel(user, &hotel) {
        return Err(forbidden(resource, operation, format!("{resource} of hotel {hotel_id}")));
    }
    Ok(hotel)
}

/// Load a room type whose hotel the caller manages
pub(crate) async fn managed_room_type(
    state: &AppState,
    user: &CurrentUser,
    room_type_id: RoomTypeId,
    resource: Resource,
    operation: Operation,
) -> Result<(HotelDBResponse, RoomTypeDBResponse)> {
    let room_type = state
        .store
        .get_room_type(room_type_id)
        .await?
        .ok_or_else(|| Error::not_found("Room type", room_type_id))?;
    let hotel = managed_hotel(state, user, room_type.hotel_id, resource, operation).await?;
    Ok((hotel, room_type))
}

/// Trimmed, non-empty required text field
pub(crate) fn required_text(field: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::invalid_field(field, "must not be empty"));
    }
    Ok(trimmed.to_string())
}
