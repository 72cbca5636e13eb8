use axum::{
    Json,
    extract::{Path, Query, State},
};

use crate::{
    AppState,
    api::{
        handlers::required_text,
        models::{
            content::{DestinationCreate, DestinationResponse, DestinationUpdate},
            pagination::{PaginatedResponse, Pagination},
            response::ApiResponse,
        },
    },
    auth::permissions::{RequiresPermission, operation, resource},
    db::{
        errors::DbError,
        models::content::{DestinationCreateDBRequest, DestinationUpdateDBRequest},
    },
    errors::{Error, Result},
    types::DestinationId,
};

/// List destinations
#[utoipa::path(
    get,
    path = "/destinations",
    tag = "destinations",
    params(Pagination),
    responses(
        (status = 200, description = "Page of destinations", body = ApiResponse<PaginatedResponse<DestinationResponse>>),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_destinations(
    State(state): State<AppState>,
    Query(pagination): Query<Pagination>,
) -> Result<ApiResponse<PaginatedResponse<DestinationResponse>>> {
    let (skip, limit) = pagination.params();
    let (destinations, total_count) = state.store.list_destinations(skip, limit).await?;
    let destinations = destinations.into_iter().map(DestinationResponse::from).collect();
    Ok(ApiResponse::ok(
        "Destinations retrieved",
        PaginatedResponse::new(destinations, total_count, skip, limit),
    ))
}

/// Get a destination
#[utoipa::path(
    get,
    path = "/destinations/{id}",
    tag = "destinations",
    params(("id" = uuid::Uuid, Path, description = "Destination ID")),
    responses(
        (status = 200, description = "Destination", body = ApiResponse<DestinationResponse>),
        (status = 404, description = "Destination not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_destination(State(state): State<AppState>, Path(id): Path<DestinationId>) -> Result<ApiResponse<DestinationResponse>> {
    let destination = state
        .store
        .get_destination(id)
        .await?
        .ok_or_else(|| Error::not_found("Destination", id))?;
    Ok(ApiResponse::ok("Destination retrieved", DestinationResponse::from(destination)))
}

/// Create a destination
#[utoipa::path(
    post,
    path = "/destinations",
    request_body = DestinationCreate,
    tag = "destinations",
    responses(
        (status = 201, description = "Destination created", body = ApiResponse<DestinationResponse>),
        (status = 403, description = "Admin only"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_destination(
    State(state): State<AppState>,
    _perm: RequiresPermission<resource::Destinations, operation::CreateAll>,
    Json(create): Json<DestinationCreate>,
) -> Result<ApiResponse<DestinationResponse>> {
    let destination = state
        .store
        .create_destination(&DestinationCreateDBRequest {
            name: required_text("name", &create.name)?,
            country: required_text("country", &create.country)?,
            description: create.description,
        })
        .await?;
    Ok(ApiResponse::created("Destination created", DestinationResponse::from(destination)))
}

/// Update a destination
#[utoipa::path(
    patch,
    path = "/destinations/{id}",
    request_body = DestinationUpdate,
    tag = "destinations",
    params(("id" = uuid::Uuid, Path, description = "Destination ID")),
    responses(
        (status = 200, description = "Destination updated", body = ApiResponse<DestinationResponse>),
        (status = 404, description = "Destination not found"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_destination(
    State(state): State<AppState>,
    Path(id): Path<DestinationId>,
    _perm: RequiresPermission<resource::Destinations, operation::UpdateAll>,
    Json(update): Json<DestinationUpdate>,
) -> Result<ApiResponse<DestinationResponse>> {
    let request = DestinationUpdateDBRequest {
        name: update.name.as_deref().map(|v| required_text("name", v)).transpose()?,
        country: update.country.as_deref().map(|v| required_text("country", v)).transpose()?,
        description: update.description,
    };
    let destination = state.store.update_destination(id, &request).await.map_err(|e| match e {
        DbError::NotFound => Error::not_found("Destination", id),
        other => other.into(),
    })?;
    Ok(ApiResponse::ok("Destination updated", DestinationResponse::from(destination)))
}

/// Delete a destination. Fails with a conflict while hotels still reference it.
#[utoipa::path(
    delete,
    path = "/destinations/{id}",
    tag = "destinations",
    params(("id" = uuid::Uuid, Path, description = "Destination ID")),
    responses(
        (status = 200, description = "Destination deleted"),
        (status = 404, description = "Destination not found"),
        (status = 409, description = "Destination still referenced by hotels"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_destination(
    State(state): State<AppState>,
    Path(id): Path<DestinationId>,
    _perm: RequiresPermission<resource::Destinations, operation::DeleteAll>,
) -> Result<ApiResponse<()>> {
    if !state.store.delete_destination(id).await? {
        return Err(Error::not_found("Destination", id));
    }
    Ok(ApiResponse::ok("Destination deleted", ()))
}
