//! OpenAPI document for the `/api/v1` surface.
//!
//! Served as JSON at `/api/openapi.json` and rendered by Scalar at `/api/docs`. Schemas reachable
//! from the listed paths are collected automatically.

use utoipa::{
    Modify, OpenApi,
    openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme},
};

use crate::api::handlers;
use crate::errors::{ErrorBody, FieldError};

/// Bearer tokens for API clients, the access cookie for browsers.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.security_schemes.insert(
            "BearerAuth".to_string(),
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .description(Some(
                        "Access token from `/authentication/login`:\n\n\
                        ```\nAuthorization: Bearer ACCESS_TOKEN\n```",
                    ))
                    .build(),
            ),
        );
        components.security_schemes.insert(
            "CookieAuth".to_string(),
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "hotelctl_access",
                "HttpOnly access cookie set by login, registration and refresh",
            ))),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "hotelctl API",
        description = "Hotel booking platform: catalogue, inventory holds, pricing, bookings, channel sync and staff attendance."
    ),
    servers((url = "/api/v1")),
    modifiers(&SecurityAddon),
    paths(
        handlers::auth::get_registration_info,
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::refresh,
        handlers::auth::logout,
        handlers::auth::change_password,
        handlers::users::get_me,
        handlers::users::update_me,
        handlers::users::list_users,
        handlers::users::get_user,
        handlers::users::update_user_status,
        handlers::destinations::list_destinations,
        handlers::destinations::get_destination,
        handlers::destinations::create_destination,
        handlers::destinations::update_destination,
        handlers::destinations::delete_destination,
        handlers::hotels::list_hotels,
        handlers::hotels::list_managed_hotels,
        handlers::hotels::get_hotel,
        handlers::hotels::create_hotel,
        handlers::hotels::update_hotel,
        handlers::hotels::delete_hotel,
        handlers::hotels::list_room_types,
        handlers::hotels::create_room_type,
        handlers::hotels::get_room_type,
        handlers::hotels::update_room_type,
        handlers::hotels::delete_room_type,
        handlers::hotels::list_rooms,
        handlers::hotels::create_room,
        handlers::hotels::update_room,
        handlers::hotels::delete_room,
        handlers::hotels::available_rooms,
        handlers::reviews::list_reviews,
        handlers::reviews::create_review,
        handlers::inventory::check_availability,
        handlers::inventory::inventory_calendar,
        handlers::inventory::create_hold,
        handlers::inventory::list_holds,
        handlers::inventory::get_hold,
        handlers::inventory::release_hold,
        handlers::pricing::quote,
        handlers::pricing::price_for_date,
        handlers::pricing::price_range,
        handlers::pricing::list_pricing_rules,
        handlers::pricing::create_pricing_rule,
        handlers::pricing::delete_pricing_rule,
        handlers::pricing::list_promo_codes,
        handlers::pricing::create_promo_code,
        handlers::pricing::update_promo_code,
        handlers::bookings::create_booking,
        handlers::bookings::list_bookings,
        handlers::bookings::list_own_bookings,
        handlers::bookings::get_booking,
        handlers::bookings::update_booking,
        handlers::bookings::update_booking_status,
        handlers::bookings::cancel_booking,
        handlers::bookings::booking_events,
        handlers::sync::sync_hotel_data,
        handlers::sync::sync_hotel_availability,
        handlers::sync::sync_hotel_pricing,
        handlers::sync::sync_status,
        handlers::sync::sync_multiple_hotels,
        handlers::sync::incoming_sync,
        handlers::attendance::record_attendance,
        handlers::attendance::list_attendance,
    ),
    components(schemas(ErrorBody, FieldError)),
    tags(
        (name = "authentication", description = "Registration, login and session cookies"),
        (name = "users", description = "Own profile and user administration"),
        (name = "destinations", description = "Destination catalogue"),
        (name = "hotels", description = "Hotels and their public catalogue"),
        (name = "room-types", description = "Room types and rooms"),
        (name = "reviews", description = "Guest reviews"),
        (name = "inventory", description = "Availability and inventory calendars"),
        (name = "holds", description = "Reservation holds"),
        (name = "pricing", description = "Quotes, nightly prices, pricing rules and promo codes"),
        (name = "bookings", description = "Booking lifecycle"),
        (name = "sync", description = "Channel system synchronization"),
        (name = "attendance", description = "Staff attendance"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_route_group_is_documented() {
        let doc = ApiDoc::openapi();
        for path in ["/authentication/login", "/holds/{id}", "/bookings/{id}/status", "/sync/incoming", "/attendance"] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
        let schemes = &doc.components.as_ref().unwrap().security_schemes;
        assert!(schemes.contains_key("BearerAuth"));
        assert!(schemes.contains_key("CookieAuth"));
    }

    fn property_format(schema: utoipa::openapi::RefOr<utoipa::openapi::schema::Schema>, property: &str) -> serde_json::Value {
        let json = serde_json::to_value(schema).unwrap();
        json["properties"][property]["format"].clone()
    }

    #[test]
    fn test_service_ids_are_documented_as_uuids() {
        use utoipa::PartialSchema;

        assert_eq!(property_format(crate::pricing::Quote::schema(), "hotel_id"), "uuid");
        assert_eq!(property_format(crate::inventory::Availability::schema(), "room_type_id"), "uuid");
        assert_eq!(property_format(crate::inventory::ReleaseResult::schema(), "hold_id"), "uuid");
        assert_eq!(property_format(crate::sync::IncomingSync::schema(), "hotel_id"), "uuid");
        assert_eq!(property_format(crate::sync::AvailabilityUpdate::schema(), "room_id"), "uuid");
    }
}
