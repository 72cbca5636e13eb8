use std::time::Duration;

use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::Utc;

use crate::{
    AppState,
    api::models::{
        inventory::{DateRangeQuery, HoldCreate, HoldResponse, ListHoldsQuery, StayQuery},
        response::ApiResponse,
    },
    auth::permissions::{RequiresPermission, operation, resource},
    errors::{Error, Result},
    inventory::{Availability, CalendarDay, HoldRequest, ReleaseResult},
    types::{HoldId, RoomTypeId},
};

/// Rooms of a room type free over a whole stay
#[utoipa::path(
    get,
    path = "/room-types/{id}/availability",
    tag = "inventory",
    params(("id" = uuid::Uuid, Path, description = "Room type ID"), StayQuery),
    responses(
        (status = 200, description = "Availability", body = ApiResponse<Availability>),
        (status = 404, description = "Room type not found"),
        (status = 422, description = "Invalid stay"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn check_availability(
    State(state): State<AppState>,
    Path(id): Path<RoomTypeId>,
    Query(query): Query<StayQuery>,
    _perm: RequiresPermission<resource::Inventory, operation::ReadAll>,
) -> Result<ApiResponse<Availability>> {
    let room_type = state
        .store
        .get_room_type(id)
        .await?
        .ok_or_else(|| Error::not_found("Room type", id))?;
    let availability = state
        .inventory
        .check_availability(room_type.hotel_id, id, query.check_in, query.check_out, query.guests, Utc::now())
        .await?;
    Ok(ApiResponse::ok("Availability retrieved", availability))
}

/// Per-day inventory for `start..=end`
#[utoipa::path(
    get,
    path = "/room-types/{id}/calendar",
    tag = "inventory",
    params(("id" = uuid::Uuid, Path, description = "Room type ID"), DateRangeQuery),
    responses(
        (status = 200, description = "Inventory calendar", body = ApiResponse<Vec<CalendarDay>>),
        (status = 404, description = "Room type not found"),
        (status = 422, description = "Invalid range"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn inventory_calendar(
    State(state): State<AppState>,
    Path(id): Path<RoomTypeId>,
    Query(query): Query<DateRangeQuery>,
    _perm: RequiresPermission<resource::Inventory, operation::ReadAll>,
) -> Result<ApiResponse<Vec<CalendarDay>>> {
    let days = state.inventory.calendar(id, query.start, query.end, Utc::now()).await?;
    Ok(ApiResponse::ok("Inventory calendar retrieved", days))
}

/// Place a reservation hold on rooms while the guest completes the booking
#[utoipa::path(
    post,
    path = "/holds",
    request_body = HoldCreate,
    tag = "holds",
    responses(
        (status = 201, description = "Hold granted", body = ApiResponse<HoldResponse>),
        (status = 404, description = "Room type not found"),
        (status = 409, description = "Not enough rooms available"),
        (status = 422, description = "Invalid stay or quantity"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_hold(
    State(state): State<AppState>,
    perm: RequiresPermission<resource::Holds, operation::CreateOwn>,
    Json(create): Json<HoldCreate>,
) -> Result<ApiResponse<HoldResponse>> {
    let now = Utc::now();
    let hold = state
        .inventory
        .create_hold(
            &perm.user,
            &HoldRequest {
                room_type_id: create.room_type_id,
                check_in: create.check_in,
                check_out: create.check_out,
                quantity: create.quantity,
                ttl: create.ttl_seconds.map(Duration::from_secs),
            },
            now,
        )
        .await?;
    Ok(ApiResponse::created("Reservation hold created", HoldResponse::from_db(hold, now)))
}

/// The caller's holds
#[utoipa::path(
    get,
    path = "/holds",
    tag = "holds",
    params(ListHoldsQuery),
    responses(
        (status = 200, description = "Holds", body = ApiResponse<Vec<HoldResponse>>),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_holds(
    State(state): State<AppState>,
    Query(query): Query<ListHoldsQuery>,
    perm: RequiresPermission<resource::Holds, operation::ReadOwn>,
) -> Result<ApiResponse<Vec<HoldResponse>>> {
    let now = Utc::now();
    let holds = state.inventory.list_holds(&perm.user, query.active, now).await?;
    Ok(ApiResponse::ok(
        "Reservation holds retrieved",
        holds.into_iter().map(|hold| HoldResponse::from_db(hold, now)).collect(),
    ))
}

/// Get a hold
#[utoipa::path(
    get,
    path = "/holds/{id}",
    tag = "holds",
    params(("id" = uuid::Uuid, Path, description = "Hold ID")),
    responses(
        (status = 200, description = "Hold", body = ApiResponse<HoldResponse>),
        (status = 404, description = "Hold not found"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_hold(
    State(state): State<AppState>,
    Path(id): Path<HoldId>,
    perm: RequiresPermission<resource::Holds, operation::ReadOwn>,
) -> Result<ApiResponse<HoldResponse>> {
    let hold = state.inventory.get_hold(&perm.user, id).await?;
    Ok(ApiResponse::ok("Reservation hold retrieved", HoldResponse::from_db(hold, Utc::now())))
}

/// Release a hold. Releasing an unknown, expired or already released hold is a no-op.
#[utoipa::path(
    delete,
    path = "/holds/{id}",
    tag = "holds",
    params(("id" = uuid::Uuid, Path, description = "Hold ID")),
    responses(
        (status = 200, description = "Hold released or nothing to release", body = ApiResponse<ReleaseResult>),
        (status = 403, description = "Hold belongs to someone else"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn release_hold(
    State(state): State<AppState>,
    Path(id): Path<HoldId>,
    perm: RequiresPermission<resource::Holds, operation::DeleteOwn>,
) -> Result<ApiResponse<ReleaseResult>> {
    let result = state.inventory.release_hold(&perm.user, id, Utc::now()).await?;
    let message = if result.released {
        "Reservation hold released"
    } else {
        "Nothing to release"
    };
    Ok(ApiResponse::ok(message, result))
}

#[cfg(test)]
mod tests {
    use crate::api::models::users::Role;
    use crate::test_utils::{create_test_app, create_test_room_type, create_test_user, days_from_today, login_as};
    use axum::http::StatusCode;
    use serde_json::{Value, json};

    #[tokio::test]
    async fn test_holds_claim_inventory_until_released() {
        let (server, state) = create_test_app().await;
        let owner = create_test_user(state.store.as_ref(), Role::HotelManager).await;
        let (_, room_type) = create_test_room_type(state.store.as_ref(), &owner, 2, 500_000).await;
        let (_, alice) = login_as(&state, Role::Customer).await;
        let (_, bob) = login_as(&state, Role::Customer).await;
        let stay = json!({
            "room_type_id": room_type.id,
            "check_in": days_from_today(10),
            "check_out": days_from_today(12),
            "quantity": 2,
        });

        let response = server.post("/api/v1/holds").authorization_bearer(&alice).json(&stay).await;
        response.assert_status(StatusCode::CREATED);
        let hold_id = response.json::<Value>()["data"]["hold_id"].as_str().unwrap().to_string();

        let response = server.post("/api/v1/holds").authorization_bearer(&bob).json(&stay).await;
        response.assert_status(StatusCode::CONFLICT);
        assert_eq!(response.json::<Value>()["code"], "insufficient_inventory");

        let json: Value = server
            .get(&format!("/api/v1/room-types/{}/availability", room_type.id))
            .add_query_param("check_in", days_from_today(10))
            .add_query_param("check_out", days_from_today(12))
            .authorization_bearer(&bob)
            .await
            .json();
        assert_eq!(json["data"]["available"], 0);

        // Bob cannot release Alice's hold
        server
            .delete(&format!("/api/v1/holds/{hold_id}"))
            .authorization_bearer(&bob)
            .await
            .assert_status(StatusCode::FORBIDDEN);

        let json: Value = server
            .delete(&format!("/api/v1/holds/{hold_id}"))
            .authorization_bearer(&alice)
            .await
            .json();
        assert_eq!(json["data"]["released"], true);

        // Second release is a no-op
        let json: Value = server
            .delete(&format!("/api/v1/holds/{hold_id}"))
            .authorization_bearer(&alice)
            .await
            .json();
        assert_eq!(json["data"]["released"], false);

        server
            .post("/api/v1/holds")
            .authorization_bearer(&bob)
            .json(&stay)
            .await
            .assert_status(StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_calendar_reports_held_rooms() {
        let (server, state) = create_test_app().await;
        let owner = create_test_user(state.store.as_ref(), Role::HotelManager).await;
        let (_, room_type) = create_test_room_type(state.store.as_ref(), &owner, 3, 500_000).await;
        let (_, guest) = login_as(&state, Role::Customer).await;

        server
            .post("/api/v1/holds")
            .authorization_bearer(&guest)
            .json(&json!({
                "room_type_id": room_type.id,
                "check_in": days_from_today(5),
                "check_out": days_from_today(6),
            }))
            .await
            .assert_status(StatusCode::CREATED);

        let json: Value = server
            .get(&format!("/api/v1/room-types/{}/calendar", room_type.id))
            .add_query_param("start", days_from_today(4))
            .add_query_param("end", days_from_today(6))
            .authorization_bearer(&guest)
            .await
            .json();
        let days = json["data"].as_array().unwrap();
        assert_eq!(days.len(), 3);
        assert_eq!(days[0]["available"], 3);
        assert_eq!(days[1]["held"], 1);
        assert_eq!(days[1]["available"], 2);
        assert_eq!(days[2]["available"], 3);

        let json: Value = server
            .get("/api/v1/holds")
            .add_query_param("active", true)
            .authorization_bearer(&guest)
            .await
            .json();
        assert_eq!(json["data"].as_array().unwrap().len(), 1);
    }
}
