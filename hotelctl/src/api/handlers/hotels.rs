use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::Utc;

use crate::{
    AppState,
    api::{
        handlers::{managed_hotel, managed_room_type, required_text},
        models::{
            hotels::{
                HotelCreate, HotelResponse, HotelUpdate, ListHotelsQuery, RoomCreate, RoomResponse, RoomTypeCreate, RoomTypeResponse,
                RoomTypeUpdate, RoomUpdate,
            },
            inventory::StayQuery,
            pagination::PaginatedResponse,
            response::ApiResponse,
            users::CurrentUser,
        },
    },
    auth::permissions::{RequiresPermission, operation, resource},
    db::models::hotels::{
        HotelCreateDBRequest, HotelDBResponse, HotelFilter, HotelStatus, HotelUpdateDBRequest, RoomCreateDBRequest, RoomTypeCreateDBRequest,
        RoomTypeUpdateDBRequest, RoomUpdateDBRequest,
    },
    errors::{Error, Result},
    inventory::AvailableRoomType,
    pricing::rules::MAX_NIGHTLY_PRICE,
    types::{HotelId, Operation, Resource, RoomId, RoomTypeId},
};

fn validate_star_rating(star_rating: Option<i16>) -> Result<()> {
    match star_rating {
        Some(rating) if !(1..=5).contains(&rating) => Err(Error::invalid_field("star_rating", "must be between 1 and 5")),
        _ => Ok(()),
    }
}

fn validate_room_type_numbers(base_price: Option<i64>, max_guests: Option<i32>) -> Result<()> {
    if base_price.is_some_and(|price| !(0..=MAX_NIGHTLY_PRICE).contains(&price)) {
        return Err(Error::invalid_field(
            "base_price",
            format!("must be between 0 and {MAX_NIGHTLY_PRICE}"),
        ));
    }
    if max_guests.is_some_and(|guests| guests < 1) {
        return Err(Error::invalid_field("max_guests", "must be at least 1"));
    }
    Ok(())
}

/// Public hotel lookup. Hotels that are not active are hidden.
async fn public_hotel(state: &AppState, id: HotelId) -> Result<HotelDBResponse> {
    match state.store.get_hotel(id).await? {
        Some(hotel) if hotel.status == HotelStatus::Active => Ok(hotel),
        _ => Err(Error::not_found("Hotel", id)),
    }
}

/// List active hotels
#[utoipa::path(
    get,
    path = "/hotels",
    tag = "hotels",
    params(ListHotelsQuery),
    responses(
        (status = 200, description = "Page of active hotels", body = ApiResponse<PaginatedResponse<HotelResponse>>),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_hotels(
    State(state): State<AppState>,
    Query(query): Query<ListHotelsQuery>,
) -> Result<ApiResponse<PaginatedResponse<HotelResponse>>> {
    let (skip, limit) = query.pagination.params();
    let (hotels, total_count) = state
        .store
        .list_hotels(&HotelFilter {
            owner_id: None,
            destination_id: query.destination_id,
            city: query.city,
            search: query.search,
            status: Some(HotelStatus::Active),
            skip,
            limit,
        })
        .await?;
    let hotels = hotels.into_iter().map(HotelResponse::from).collect();
    Ok(ApiResponse::ok("Hotels retrieved", PaginatedResponse::new(hotels, total_count, skip, limit)))
}

/// List hotels the caller manages, in any status. Admins see every hotel.
#[utoipa::path(
    get,
    path = "/hotels/managed",
    tag = "hotels",
    params(ListHotelsQuery),
    responses(
        (status = 200, description = "Page of managed hotels", body = ApiResponse<PaginatedResponse<HotelResponse>>),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_managed_hotels(
    State(state): State<AppState>,
    Query(query): Query<ListHotelsQuery>,
    perm: RequiresPermission<resource::Hotels, operation::UpdateOwn>,
) -> Result<ApiResponse<PaginatedResponse<HotelResponse>>> {
    let (skip, limit) = query.pagination.params();
    let owner_id = (!perm.user.is_admin()).then_some(perm.user.id);
    let (hotels, total_count) = state
        .store
        .list_hotels(&HotelFilter {
            owner_id,
            destination_id: query.destination_id,
            city: query.city,
            search: query.search,
            status: query.status,
            skip,
            limit,
        })
        .await?;
    let hotels = hotels.into_iter().map(HotelResponse::from).collect();
    Ok(ApiResponse::ok("Hotels retrieved", PaginatedResponse::new(hotels, total_count, skip, limit)))
}

/// Get an active hotel
#[utoipa::path(
    get,
    path = "/hotels/{id}",
    tag = "hotels",
    params(("id" = uuid::Uuid, Path, description = "Hotel ID")),
    responses(
        (status = 200, description = "Hotel", body = ApiResponse<HotelResponse>),
        (status = 404, description = "Hotel not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_hotel(State(state): State<AppState>, Path(id): Path<HotelId>) -> Result<ApiResponse<HotelResponse>> {
    let hotel = public_hotel(&state, id).await?;
    Ok(ApiResponse::ok("Hotel retrieved", HotelResponse::from(hotel)))
}

/// Create a hotel owned by the caller
#[utoipa::path(
    post,
    path = "/hotels",
    request_body = HotelCreate,
    tag = "hotels",
    responses(
        (status = 201, description = "Hotel created", body = ApiResponse<HotelResponse>),
        (status = 403, description = "Managers and admins only"),
        (status = 409, description = "Hotel with the same name and address exists"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_hotel(
    State(state): State<AppState>,
    perm: RequiresPermission<resource::Hotels, operation::CreateOwn>,
    Json(create): Json<HotelCreate>,
) -> Result<ApiResponse<HotelResponse>> {
    validate_star_rating(create.star_rating)?;
    let hotel = state
        .store
        .create_hotel(&HotelCreateDBRequest {
            owner_id: perm.user.id,
            destination_id: create.destination_id,
            name: required_text("name", &create.name)?,
            address: required_text("address", &create.address)?,
            city: required_text("city", &create.city)?,
            description: create.description,
            star_rating: create.star_rating,
            status: create.status.unwrap_or(HotelStatus::Active),
        })
        .await?;
    tracing::info!(hotel_id = %hotel.id, owner_id = %hotel.owner_id, "Created hotel");
    Ok(ApiResponse::created("Hotel created", HotelResponse::from(hotel)))
}

/// Update a hotel
#[utoipa::path(
    patch,
    path = "/hotels/{id}",
    request_body = HotelUpdate,
    tag = "hotels",
    params(("id" = uuid::Uuid, Path, description = "Hotel ID")),
    responses(
        (status = 200, description = "Hotel updated", body = ApiResponse<HotelResponse>),
        (status = 403, description = "Not the hotel's manager"),
        (status = 404, description = "Hotel not found"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_hotel(
    State(state): State<AppState>,
    Path(id): Path<HotelId>,
    perm: RequiresPermission<resource::Hotels, operation::UpdateOwn>,
    Json(update): Json<HotelUpdate>,
) -> Result<ApiResponse<HotelResponse>> {
    managed_hotel(&state, &perm.user, id, Resource::Hotels, Operation::UpdateOwn).await?;
    validate_star_rating(update.star_rating)?;
    let request = HotelUpdateDBRequest {
        destination_id: update.destination_id,
        name: update.name.as_deref().map(|v| required_text("name", v)).transpose()?,
        address: update.address.as_deref().map(|v| required_text("address", v)).transpose()?,
        city: update.city.as_deref().map(|v| required_text("city", v)).transpose()?,
        description: update.description,
        star_rating: update.star_rating,
        status: update.status,
    };
    let hotel = state.store.update_hotel(id, &request).await?;
    Ok(ApiResponse::ok("Hotel updated", HotelResponse::from(hotel)))
}

/// Delete a hotel with its room types and rooms. Hotels with bookings cannot be deleted.
#[utoipa::path(
    delete,
    path = "/hotels/{id}",
    tag = "hotels",
    params(("id" = uuid::Uuid, Path, description = "Hotel ID")),
    responses(
        (status = 200, description = "Hotel deleted"),
        (status = 404, description = "Hotel not found"),
        (status = 409, description = "Hotel has bookings"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_hotel(
    State(state): State<AppState>,
    Path(id): Path<HotelId>,
    perm: RequiresPermission<resource::Hotels, operation::DeleteOwn>,
) -> Result<ApiResponse<()>> {
    managed_hotel(&state, &perm.user, id, Resource::Hotels, Operation::DeleteOwn).await?;
    if !state.store.delete_hotel(id).await? {
        return Err(Error::not_found("Hotel", id));
    }
    tracing::info!(hotel_id = %id, "Deleted hotel");
    Ok(ApiResponse::ok("Hotel deleted", ()))
}

/// Room types of an active hotel with their active room counts
#[utoipa::path(
    get,
    path = "/hotels/{id}/room-types",
    tag = "room-types",
    params(("id" = uuid::Uuid, Path, description = "Hotel ID")),
    responses(
        (status = 200, description = "Room types", body = ApiResponse<Vec<RoomTypeResponse>>),
        (status = 404, description = "Hotel not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_room_types(State(state): State<AppState>, Path(id): Path<HotelId>) -> Result<ApiResponse<Vec<RoomTypeResponse>>> {
    public_hotel(&state, id).await?;
    let mut response = Vec::new();
    for room_type in state.store.list_room_types(id).await? {
        let active_rooms = state
            .store
            .list_rooms(room_type.id)
            .await?
            .iter()
            .filter(|room| room.is_active)
            .count();
        response.push(RoomTypeResponse::from(room_type).with_active_rooms(active_rooms));
    }
    Ok(ApiResponse::ok("Room types retrieved", response))
}

/// Create a room type, optionally with its rooms
#[utoipa::path(
    post,
    path = "/hotels/{id}/room-types",
    request_body = RoomTypeCreate,
    tag = "room-types",
    params(("id" = uuid::Uuid, Path, description = "Hotel ID")),
    responses(
        (status = 201, description = "Room type created", body = ApiResponse<RoomTypeResponse>),
        (status = 403, description = "Not the hotel's manager"),
        (status = 409, description = "Room type name taken"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_room_type(
    State(state): State<AppState>,
    Path(id): Path<HotelId>,
    perm: RequiresPermission<resource::RoomTypes, operation::CreateOwn>,
    Json(create): Json<RoomTypeCreate>,
) -> Result<ApiResponse<RoomTypeResponse>> {
    managed_hotel(&state, &perm.user, id, Resource::RoomTypes, Operation::CreateOwn).await?;
    validate_room_type_numbers(Some(create.base_price), Some(create.max_guests))?;
    let room_numbers = create
        .rooms
        .iter()
        .map(|number| required_text("rooms", number))
        .collect::<Result<Vec<_>>>()?;

    let room_type = state
        .store
        .create_room_type(&RoomTypeCreateDBRequest {
            hotel_id: id,
            name: required_text("name", &create.name)?,
            description: create.description,
            base_price: create.base_price,
            max_guests: create.max_guests,
        })
        .await?;
    for room_number in room_numbers {
        state
            .store
            .create_room(&RoomCreateDBRequest {
                room_type_id: room_type.id,
                room_number,
            })
            .await?;
    }
    let active_rooms = state.store.list_rooms(room_type.id).await?.len();
    Ok(ApiResponse::created(
        "Room type created",
        RoomTypeResponse::from(room_type).with_active_rooms(active_rooms),
    ))
}

/// Get a room type
#[utoipa::path(
    get,
    path = "/room-types/{id}",
    tag = "room-types",
    params(("id" = uuid::Uuid, Path, description = "Room type ID")),
    responses(
        (status = 200, description = "Room type", body = ApiResponse<RoomTypeResponse>),
        (status = 404, description = "Room type not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_room_type(State(state): State<AppState>, Path(id): Path<RoomTypeId>) -> Result<ApiResponse<RoomTypeResponse>> {
    let room_type = state
        .store
        .get_room_type(id)
        .await?
        .ok_or_else(|| Error::not_found("Room type", id))?;
    public_hotel(&state, room_type.hotel_id)
        .await
        .map_err(|_| Error::not_found("Room type", id))?;
    let active_rooms = state.store.list_rooms(id).await?.iter().filter(|room| room.is_active).count();
    Ok(ApiResponse::ok(
        "Room type retrieved",
        RoomTypeResponse::from(room_type).with_active_rooms(active_rooms),
    ))
}

/// Update a room type
#[utoipa::path(
    patch,
    path = "/room-types/{id}",
    request_body = RoomTypeUpdate,
    tag = "room-types",
    params(("id" = uuid::Uuid, Path, description = "Room type ID")),
    responses(
        (status = 200, description = "Room type updated", body = ApiResponse<RoomTypeResponse>),
        (status = 403, description = "Not the hotel's manager"),
        (status = 404, description = "Room type not found"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_room_type(
    State(state): State<AppState>,
    Path(id): Path<RoomTypeId>,
    perm: RequiresPermission<resource::RoomTypes, operation::UpdateOwn>,
    Json(update): Json<RoomTypeUpdate>,
) -> Result<ApiResponse<RoomTypeResponse>> {
    managed_room_type(&state, &perm.user, id, Resource::RoomTypes, Operation::UpdateOwn).await?;
    validate_room_type_numbers(update.base_price, update.max_guests)?;
    let request = RoomTypeUpdateDBRequest {
        name: update.name.as_deref().map(|v| required_text("name", v)).transpose()?,
        description: update.description,
        base_price: update.base_price,
        max_guests: update.max_guests,
        is_available: update.is_available,
    };
    let room_type = state.store.update_room_type(id, &request).await?;
    Ok(ApiResponse::ok("Room type updated", RoomTypeResponse::from(room_type)))
}

/// Delete a room type with its rooms and rules. Room types with bookings cannot be deleted.
#[utoipa::path(
    delete,
    path = "/room-types/{id}",
    tag = "room-types",
    params(("id" = uuid::Uuid, Path, description = "Room type ID")),
    responses(
        (status = 200, description = "Room type deleted"),
        (status = 404, description = "Room type not found"),
        (status = 409, description = "Room type has bookings"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_room_type(
    State(state): State<AppState>,
    Path(id): Path<RoomTypeId>,
    perm: RequiresPermission<resource::RoomTypes, operation::DeleteOwn>,
) -> Result<ApiResponse<()>> {
    managed_room_type(&state, &perm.user, id, Resource::RoomTypes, Operation::DeleteOwn).await?;
    if !state.store.delete_room_type(id).await? {
        return Err(Error::not_found("Room type", id));
    }
    Ok(ApiResponse::ok("Room type deleted", ()))
}

/// Rooms of a room type, including inactive ones
#[utoipa::path(
    get,
    path = "/room-types/{id}/rooms",
    tag = "room-types",
    params(("id" = uuid::Uuid, Path, description = "Room type ID")),
    responses(
        (status = 200, description = "Rooms", body = ApiResponse<Vec<RoomResponse>>),
        (status = 403, description = "Not the hotel's manager"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_rooms(
    State(state): State<AppState>,
    Path(id): Path<RoomTypeId>,
    perm: RequiresPermission<resource::RoomTypes, operation::UpdateOwn>,
) -> Result<ApiResponse<Vec<RoomResponse>>> {
    managed_room_type(&state, &perm.user, id, Resource::RoomTypes, Operation::UpdateOwn).await?;
    let rooms = state.store.list_rooms(id).await?;
    Ok(ApiResponse::ok("Rooms retrieved", rooms.into_iter().map(RoomResponse::from).collect()))
}

/// Add a room to a room type
#[utoipa::path(
    post,
    path = "/room-types/{id}/rooms",
    request_body = RoomCreate,
    tag = "room-types",
    params(("id" = uuid::Uuid, Path, description = "Room type ID")),
    responses(
        (status = 201, description = "Room created", body = ApiResponse<RoomResponse>),
        (status = 409, description = "Room number taken"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_room(
    State(state): State<AppState>,
    Path(id): Path<RoomTypeId>,
    perm: RequiresPermission<resource::RoomTypes, operation::UpdateOwn>,
    Json(create): Json<RoomCreate>,
) -> Result<ApiResponse<RoomResponse>> {
    managed_room_type(&state, &perm.user, id, Resource::RoomTypes, Operation::UpdateOwn).await?;
    let room = state
        .store
        .create_room(&RoomCreateDBRequest {
            room_type_id: id,
            room_number: required_text("room_number", &create.room_number)?,
        })
        .await?;
    Ok(ApiResponse::created("Room created", RoomResponse::from(room)))
}

async fn managed_room(state: &AppState, user: &CurrentUser, id: RoomId, operation: Operation) -> Result<()> {
    let room = state.store.get_room(id).await?.ok_or_else(|| Error::not_found("Room", id))?;
    managed_room_type(state, user, room.room_type_id, Resource::RoomTypes, operation).await?;
    Ok(())
}

/// Renumber a room or take it out of service. Inactive rooms stop counting as inventory.
#[utoipa::path(
    patch,
    path = "/rooms/{id}",
    request_body = RoomUpdate,
    tag = "room-types",
    params(("id" = uuid::Uuid, Path, description = "Room ID")),
    responses(
        (status = 200, description = "Room updated", body = ApiResponse<RoomResponse>),
        (status = 404, description = "Room not found"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_room(
    State(state): State<AppState>,
    Path(id): Path<RoomId>,
    perm: RequiresPermission<resource::RoomTypes, operation::UpdateOwn>,
    Json(update): Json<RoomUpdate>,
) -> Result<ApiResponse<RoomResponse>> {
    managed_room(&state, &perm.user, id, Operation::UpdateOwn).await?;
    let request = RoomUpdateDBRequest {
        room_number: update.room_number.as_deref().map(|v| required_text("room_number", v)).transpose()?,
        is_active: update.is_active,
    };
    let room = state.store.update_room(id, &request).await?;
    Ok(ApiResponse::ok("Room updated", RoomResponse::from(room)))
}

/// Delete a room
#[utoipa::path(
    delete,
    path = "/rooms/{id}",
    tag = "room-types",
    params(("id" = uuid::Uuid, Path, description = "Room ID")),
    responses(
        (status = 200, description = "Room deleted"),
        (status = 404, description = "Room not found"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_room(
    State(state): State<AppState>,
    Path(id): Path<RoomId>,
    perm: RequiresPermission<resource::RoomTypes, operation::DeleteOwn>,
) -> Result<ApiResponse<()>> {
    managed_room(&state, &perm.user, id, Operation::DeleteOwn).await?;
    state.store.delete_room(id).await?;
    Ok(ApiResponse::ok("Room deleted", ()))
}

/// Room types of a hotel that can take the party for the whole stay, each with a quote
#[utoipa::path(
    get,
    path = "/hotels/{id}/available-rooms",
    tag = "inventory",
    params(("id" = uuid::Uuid, Path, description = "Hotel ID"), StayQuery),
    responses(
        (status = 200, description = "Available room types", body = ApiResponse<Vec<AvailableRoomType>>),
        (status = 404, description = "Hotel not found"),
        (status = 422, description = "Invalid stay"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn available_rooms(
    State(state): State<AppState>,
    Path(id): Path<HotelId>,
    Query(query): Query<StayQuery>,
) -> Result<ApiResponse<Vec<AvailableRoomType>>> {
    public_hotel(&state, id).await?;
    let rooms = state
        .inventory
        .available_rooms(id, query.check_in, query.check_out, query.guests, Utc::now())
        .await?;
    Ok(ApiResponse::ok("Available rooms retrieved", rooms))
}

#[cfg(test)]
mod tests {
    use crate::api::models::users::Role;
    use crate::test_utils::{create_test_app, days_from_today, login_as};
    use axum::http::StatusCode;
    use serde_json::{Value, json};

    #[tokio::test]
    async fn test_manager_builds_hotel_inventory() {
        let (server, state) = create_test_app().await;
        let (_, manager) = login_as(&state, Role::HotelManager).await;

        let response = server
            .post("/api/v1/hotels")
            .authorization_bearer(&manager)
            .json(&json!({ "name": "Sea Breeze", "address": "12 Tran Phu", "city": "Nha Trang", "star_rating": 4 }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let hotel_id = response.json::<Value>()["data"]["id"].as_str().unwrap().to_string();

        let response = server
            .post(&format!("/api/v1/hotels/{hotel_id}/room-types"))
            .authorization_bearer(&manager)
            .json(&json!({ "name": "Deluxe", "base_price": 1_200_000, "max_guests": 2, "rooms": ["101", "102"] }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let json: Value = response.json();
        assert_eq!(json["data"]["active_rooms"], 2);

        server
            .post(&format!("/api/v1/hotels/{hotel_id}/room-types"))
            .authorization_bearer(&manager)
            .json(&json!({ "name": "Penthouse", "base_price": i64::MAX / 2, "max_guests": 2 }))
            .await
            .assert_status(StatusCode::UNPROCESSABLE_ENTITY);

        let json: Value = server.get(&format!("/api/v1/hotels/{hotel_id}/room-types")).await.json();
        assert_eq!(json["data"].as_array().unwrap().len(), 1);

        let json: Value = server
            .get(&format!("/api/v1/hotels/{hotel_id}/available-rooms"))
            .add_query_param("check_in", days_from_today(3))
            .add_query_param("check_out", days_from_today(5))
            .add_query_param("guests", 2)
            .await
            .json();
        let rooms = json["data"].as_array().unwrap();
        assert_eq!(rooms.len(), 1);
        assert_eq!(rooms[0]["available"], 2);
        assert_eq!(rooms[0]["quote"]["subtotal"], 2_400_000);
    }

    #[tokio::test]
    async fn test_other_managers_cannot_modify_hotel() {
        let (server, state) = create_test_app().await;
        let (_, owner) = login_as(&state, Role::HotelManager).await;
        let (_, rival) = login_as(&state, Role::HotelManager).await;
        let (_, customer) = login_as(&state, Role::Customer).await;

        let json: Value = server
            .post("/api/v1/hotels")
            .authorization_bearer(&owner)
            .json(&json!({ "name": "Lotus", "address": "1 Le Loi", "city": "Hue" }))
            .await
            .json();
        let hotel_id = json["data"]["id"].as_str().unwrap().to_string();

        server
            .patch(&format!("/api/v1/hotels/{hotel_id}"))
            .authorization_bearer(&rival)
            .json(&json!({ "name": "Stolen" }))
            .await
            .assert_status(StatusCode::FORBIDDEN);
        server
            .post("/api/v1/hotels")
            .authorization_bearer(&customer)
            .json(&json!({ "name": "Nope", "address": "x", "city": "y" }))
            .await
            .assert_status(StatusCode::FORBIDDEN);

        let json: Value = server.get("/api/v1/hotels/managed").authorization_bearer(&rival).await.json();
        assert_eq!(json["data"]["total_count"], 0);
    }

    #[tokio::test]
    async fn test_public_listing_hides_inactive_hotels() {
        let (server, state) = create_test_app().await;
        let (_, manager) = login_as(&state, Role::HotelManager).await;
        server
            .post("/api/v1/hotels")
            .authorization_bearer(&manager)
            .json(&json!({ "name": "Open", "address": "1", "city": "Hanoi" }))
            .await
            .assert_status(StatusCode::CREATED);
        let json: Value = server
            .post("/api/v1/hotels")
            .authorization_bearer(&manager)
            .json(&json!({ "name": "Soon", "address": "2", "city": "Hanoi", "status": "pending" }))
            .await
            .json();
        let pending_id = json["data"]["id"].as_str().unwrap().to_string();

        let json: Value = server.get("/api/v1/hotels").add_query_param("city", "hanoi").await.json();
        assert_eq!(json["data"]["total_count"], 1);
        server
            .get(&format!("/api/v1/hotels/{pending_id}"))
            .await
            .assert_status(StatusCode::NOT_FOUND);

        let json: Value = server.get("/api/v1/hotels/managed").authorization_bearer(&manager).await.json();
        assert_eq!(json["data"]["total_count"], 2);
    }
}
