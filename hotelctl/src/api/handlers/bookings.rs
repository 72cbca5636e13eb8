use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::Utc;

use crate::{
    AppState,
    api::models::{
        bookings::{BookingCreate, BookingEventResponse, BookingResponse, BookingStatusUpdate, BookingUpdate, ListBookingsQuery},
        pagination::PaginatedResponse,
        response::ApiResponse,
    },
    auth::permissions::{RequiresPermission, operation, resource},
    booking::{BookingQuery, CreateBookingRequest, UpdateBookingRequest},
    db::models::bookings::BookingDBResponse,
    errors::Result,
    types::BookingId,
};

impl From<&ListBookingsQuery> for BookingQuery {
    fn from(query: &ListBookingsQuery) -> Self {
        let (skip, limit) = query.pagination.params();
        Self {
            status: query.status,
            hotel_id: query.hotel_id,
            check_in_from: query.check_in_from,
            check_in_to: query.check_in_to,
            skip,
            limit,
        }
    }
}

fn page(bookings: Vec<BookingDBResponse>, total_count: i64, query: &BookingQuery) -> PaginatedResponse<BookingResponse> {
    PaginatedResponse::new(
        bookings.into_iter().map(BookingResponse::from).collect(),
        total_count,
        query.skip,
        query.limit,
    )
}

/// Book a room type, optionally consuming a reservation hold
#[utoipa::path(
    post,
    path = "/bookings",
    request_body = BookingCreate,
    tag = "bookings",
    responses(
        (status = 201, description = "Booking created", body = ApiResponse<BookingResponse>),
        (status = 404, description = "Room type or hold not found"),
        (status = 409, description = "Not enough rooms available, or the hold is no longer active"),
        (status = 422, description = "Invalid stay or party"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_booking(
    State(state): State<AppState>,
    perm: RequiresPermission<resource::Bookings, operation::CreateOwn>,
    Json(create): Json<BookingCreate>,
) -> Result<ApiResponse<BookingResponse>> {
    let booking = state
        .bookings
        .create_booking(
            &perm.user,
            &CreateBookingRequest {
                room_type_id: create.room_type_id,
                check_in: create.check_in,
                check_out: create.check_out,
                guests: create.guests,
                rooms: create.rooms,
                hold_id: create.hold_id,
                promo_code: create.promo_code,
                special_requests: create.special_requests,
            },
            Utc::now(),
        )
        .await?;
    Ok(ApiResponse::created("Booking created", BookingResponse::from(booking)))
}

/// List bookings visible to the caller: customers their own, managers their hotels', admins all
#[utoipa::path(
    get,
    path = "/bookings",
    tag = "bookings",
    params(ListBookingsQuery),
    responses(
        (status = 200, description = "Page of bookings", body = ApiResponse<PaginatedResponse<BookingResponse>>),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_bookings(
    State(state): State<AppState>,
    Query(query): Query<ListBookingsQuery>,
    perm: RequiresPermission<resource::Bookings, operation::ReadOwn>,
) -> Result<ApiResponse<PaginatedResponse<BookingResponse>>> {
    let query = BookingQuery::from(&query);
    let (bookings, total_count) = state.bookings.list_bookings(&perm.user, &query).await?;
    Ok(ApiResponse::ok("Bookings retrieved", page(bookings, total_count, &query)))
}

/// Bookings the caller made as a guest
#[utoipa::path(
    get,
    path = "/bookings/mine",
    tag = "bookings",
    params(ListBookingsQuery),
    responses(
        (status = 200, description = "Page of own bookings", body = ApiResponse<PaginatedResponse<BookingResponse>>),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_own_bookings(
    State(state): State<AppState>,
    Query(query): Query<ListBookingsQuery>,
    perm: RequiresPermission<resource::Bookings, operation::ReadOwn>,
) -> Result<ApiResponse<PaginatedResponse<BookingResponse>>> {
    let query = BookingQuery::from(&query);
    let (bookings, total_count) = state.bookings.list_own_bookings(&perm.user, &query).await?;
    Ok(ApiResponse::ok("Bookings retrieved", page(bookings, total_count, &query)))
}

/// Get a booking
#[utoipa::path(
    get,
    path = "/bookings/{id}",
    tag = "bookings",
    params(("id" = uuid::Uuid, Path, description = "Booking ID")),
    responses(
        (status = 200, description = "Booking", body = ApiResponse<BookingResponse>),
        (status = 404, description = "Booking not found"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_booking(
    State(state): State<AppState>,
    Path(id): Path<BookingId>,
    perm: RequiresPermission<resource::Bookings, operation::ReadOwn>,
) -> Result<ApiResponse<BookingResponse>> {
    let booking = state.bookings.get_booking(&perm.user, id).await?;
    Ok(ApiResponse::ok("Booking retrieved", BookingResponse::from(booking)))
}

/// Change the dates or party of a pending or confirmed booking; the price is recalculated
#[utoipa::path(
    patch,
    path = "/bookings/{id}",
    request_body = BookingUpdate,
    tag = "bookings",
    params(("id" = uuid::Uuid, Path, description = "Booking ID")),
    responses(
        (status = 200, description = "Booking updated", body = ApiResponse<BookingResponse>),
        (status = 404, description = "Booking not found"),
        (status = 409, description = "Booking can no longer change, or not enough rooms"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_booking(
    State(state): State<AppState>,
    Path(id): Path<BookingId>,
    perm: RequiresPermission<resource::Bookings, operation::UpdateOwn>,
    Json(update): Json<BookingUpdate>,
) -> Result<ApiResponse<BookingResponse>> {
    let booking = state
        .bookings
        .update_booking(
            &perm.user,
            id,
            &UpdateBookingRequest {
                check_in: update.check_in,
                check_out: update.check_out,
                guests: update.guests,
                rooms: update.rooms,
            },
            Utc::now(),
        )
        .await?;
    Ok(ApiResponse::ok("Booking updated", BookingResponse::from(booking)))
}

/// Move a booking through its lifecycle
#[utoipa::path(
    patch,
    path = "/bookings/{id}/status",
    request_body = BookingStatusUpdate,
    tag = "bookings",
    params(("id" = uuid::Uuid, Path, description = "Booking ID")),
    responses(
        (status = 200, description = "Status changed", body = ApiResponse<BookingResponse>),
        (status = 403, description = "Caller may not make this transition"),
        (status = 404, description = "Booking not found"),
        (status = 409, description = "Transition not allowed from the current status"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_booking_status(
    State(state): State<AppState>,
    Path(id): Path<BookingId>,
    perm: RequiresPermission<resource::Bookings, operation::UpdateOwn>,
    Json(update): Json<BookingStatusUpdate>,
) -> Result<ApiResponse<BookingResponse>> {
    let booking = state.bookings.update_status(&perm.user, id, update.status, Utc::now()).await?;
    Ok(ApiResponse::ok("Booking status updated", BookingResponse::from(booking)))
}

/// Cancel a booking. Cancelling an already cancelled booking succeeds without change.
#[utoipa::path(
    post,
    path = "/bookings/{id}/cancel",
    tag = "bookings",
    params(("id" = uuid::Uuid, Path, description = "Booking ID")),
    responses(
        (status = 200, description = "Booking cancelled", body = ApiResponse<BookingResponse>),
        (status = 404, description = "Booking not found"),
        (status = 409, description = "Booking already checked in or out"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn cancel_booking(
    State(state): State<AppState>,
    Path(id): Path<BookingId>,
    perm: RequiresPermission<resource::Bookings, operation::UpdateOwn>,
) -> Result<ApiResponse<BookingResponse>> {
    let booking = state.bookings.cancel_booking(&perm.user, id, Utc::now()).await?;
    Ok(ApiResponse::ok("Booking cancelled", BookingResponse::from(booking)))
}

/// Status history of a booking, oldest first
#[utoipa::path(
    get,
    path = "/bookings/{id}/events",
    tag = "bookings",
    params(("id" = uuid::Uuid, Path, description = "Booking ID")),
    responses(
        (status = 200, description = "Booking events", body = ApiResponse<Vec<BookingEventResponse>>),
        (status = 404, description = "Booking not found"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn booking_events(
    State(state): State<AppState>,
    Path(id): Path<BookingId>,
    perm: RequiresPermission<resource::Bookings, operation::ReadOwn>,
) -> Result<ApiResponse<Vec<BookingEventResponse>>> {
    let events = state.bookings.booking_events(&perm.user, id).await?;
    Ok(ApiResponse::ok(
        "Booking events retrieved",
        events.into_iter().map(BookingEventResponse::from).collect(),
    ))
}

#[cfg(test)]
mod tests {
    use crate::api::models::users::Role;
    use crate::test_utils::{create_test_app, create_test_room_type, days_from_today, login_as};
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use serde_json::{Value, json};

    async fn book(server: &TestServer, token: &str, body: Value) -> Value {
        let response = server.post("/api/v1/bookings").authorization_bearer(token).json(&body).await;
        response.assert_status(StatusCode::CREATED);
        response.json::<Value>()["data"].clone()
    }

    #[tokio::test]
    async fn test_hold_then_book_then_lifecycle() {
        let (server, state) = create_test_app().await;
        let (manager, manager_token) = login_as(&state, Role::HotelManager).await;
        let owner = state.store.get_user(manager.id).await.unwrap().unwrap();
        let (_, room_type) = create_test_room_type(state.store.as_ref(), &owner, 1, 800_000).await;
        let (_, guest) = login_as(&state, Role::Customer).await;
        let (_, stranger) = login_as(&state, Role::Customer).await;
        let check_in = days_from_today(7);
        let check_out = days_from_today(9);

        let hold: Value = server
            .post("/api/v1/holds")
            .authorization_bearer(&guest)
            .json(&json!({ "room_type_id": room_type.id, "check_in": check_in, "check_out": check_out }))
            .await
            .json();
        let hold_id = hold["data"]["hold_id"].clone();

        let booking = book(
            &server,
            &guest,
            json!({ "room_type_id": room_type.id, "check_in": check_in, "check_out": check_out, "guests": 2, "hold_id": hold_id }),
        )
        .await;
        assert_eq!(booking["status"], "pending");
        assert_eq!(booking["nights"], 2);
        assert_eq!(booking["total_price"], 1_600_000);
        let id = booking["id"].as_str().unwrap().to_string();

        // The single room is taken by the booking now
        let response = server
            .post("/api/v1/bookings")
            .authorization_bearer(&stranger)
            .json(&json!({ "room_type_id": room_type.id, "check_in": check_in, "check_out": check_out, "guests": 1 }))
            .await;
        response.assert_status(StatusCode::CONFLICT);

        server
            .get(&format!("/api/v1/bookings/{id}"))
            .authorization_bearer(&stranger)
            .await
            .assert_status(StatusCode::NOT_FOUND);

        // Guests cannot confirm their own booking
        server
            .patch(&format!("/api/v1/bookings/{id}/status"))
            .authorization_bearer(&guest)
            .json(&json!({ "status": "confirmed" }))
            .await
            .assert_status(StatusCode::FORBIDDEN);

        for status in ["confirmed", "checked_in"] {
            server
                .patch(&format!("/api/v1/bookings/{id}/status"))
                .authorization_bearer(&manager_token)
                .json(&json!({ "status": status }))
                .await
                .assert_status_ok();
        }

        let response = server.post(&format!("/api/v1/bookings/{id}/cancel")).authorization_bearer(&guest).await;
        response.assert_status(StatusCode::CONFLICT);
        assert_eq!(response.json::<Value>()["code"], "invalid_transition");

        let json: Value = server
            .get(&format!("/api/v1/bookings/{id}/events"))
            .authorization_bearer(&guest)
            .await
            .json();
        let events = json["data"].as_array().unwrap();
        assert_eq!(events.len(), 3);
        assert_eq!(events[0]["to_status"], "pending");
        assert_eq!(events[2]["to_status"], "checked_in");

        let json: Value = server.get("/api/v1/bookings").authorization_bearer(&manager_token).await.json();
        assert_eq!(json["data"]["total_count"], 1);
    }

    #[tokio::test]
    async fn test_cancel_is_idempotent_and_frees_the_room() {
        let (server, state) = create_test_app().await;
        let (manager, _) = login_as(&state, Role::HotelManager).await;
        let owner = state.store.get_user(manager.id).await.unwrap().unwrap();
        let (_, room_type) = create_test_room_type(state.store.as_ref(), &owner, 1, 500_000).await;
        let (_, guest) = login_as(&state, Role::Customer).await;
        let stay = json!({ "room_type_id": room_type.id, "check_in": days_from_today(3), "check_out": days_from_today(4), "guests": 1 });

        let booking = book(&server, &guest, stay.clone()).await;
        let id = booking["id"].as_str().unwrap().to_string();

        for _ in 0..2 {
            let json: Value = server
                .post(&format!("/api/v1/bookings/{id}/cancel"))
                .authorization_bearer(&guest)
                .await
                .json();
            assert_eq!(json["data"]["status"], "cancelled");
        }

        book(&server, &guest, stay).await;
    }

    #[tokio::test]
    async fn test_update_booking_reprices_stay() {
        let (server, state) = create_test_app().await;
        let (manager, _) = login_as(&state, Role::HotelManager).await;
        let owner = state.store.get_user(manager.id).await.unwrap().unwrap();
        let (_, room_type) = create_test_room_type(state.store.as_ref(), &owner, 2, 500_000).await;
        let (_, guest) = login_as(&state, Role::Customer).await;

        let booking = book(
            &server,
            &guest,
            json!({ "room_type_id": room_type.id, "check_in": days_from_today(3), "check_out": days_from_today(4), "guests": 1 }),
        )
        .await;
        let id = booking["id"].as_str().unwrap().to_string();

        let json: Value = server
            .patch(&format!("/api/v1/bookings/{id}"))
            .authorization_bearer(&guest)
            .json(&json!({ "check_out": days_from_today(6), "rooms": 2 }))
            .await
            .json();
        assert_eq!(json["data"]["nights"], 3);
        assert_eq!(json["data"]["total_price"], 3_000_000);
    }
}
