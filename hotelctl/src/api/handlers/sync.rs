use axum::{
    Json,
    extract::{Path, State},
    http::HeaderMap,
};
use chrono::Utc;

use crate::{
    AppState,
    api::{
        handlers::managed_hotel,
        models::{
            response::ApiResponse,
            sync::{SyncMultipleRequest, SyncRangeRequest},
        },
    },
    auth::permissions::{RequiresPermission, operation, resource},
    errors::{Error, Result},
    sync::{BatchSyncItem, HotelSyncResult, IncomingSyncResult, SignedRequest, SyncOutcome, SyncStatus, signing},
    types::{HotelId, Operation, Resource},
};

/// Largest number of hotels one batch request may name
const MAX_BATCH_HOTELS: usize = 100;

/// Push availability and pricing of a hotel for `start_date..=end_date`
#[utoipa::path(
    post,
    path = "/hotels/{id}/sync",
    request_body = SyncRangeRequest,
    tag = "sync",
    params(("id" = uuid::Uuid, Path, description = "Hotel ID")),
    responses(
        (status = 200, description = "Sync finished", body = ApiResponse<HotelSyncResult>),
        (status = 403, description = "Not the hotel's manager"),
        (status = 502, description = "Sync target unavailable"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn sync_hotel_data(
    State(state): State<AppState>,
    Path(id): Path<HotelId>,
    perm: RequiresPermission<resource::Sync, operation::CreateOwn>,
    Json(range): Json<SyncRangeRequest>,
) -> Result<ApiResponse<HotelSyncResult>> {
    managed_hotel(&state, &perm.user, id, Resource::Sync, Operation::CreateOwn).await?;
    let result = state
        .sync
        .sync_hotel_data(id, range.start_date, range.end_date, Utc::now())
        .await?;
    Ok(ApiResponse::ok("Hotel data synchronized", result))
}

/// Push availability of a hotel
#[utoipa::path(
    post,
    path = "/hotels/{id}/sync/availability",
    request_body = SyncRangeRequest,
    tag = "sync",
    params(("id" = uuid::Uuid, Path, description = "Hotel ID")),
    responses(
        (status = 200, description = "Sync finished", body = ApiResponse<SyncOutcome>),
        (status = 502, description = "Sync target unavailable"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn sync_hotel_availability(
    State(state): State<AppState>,
    Path(id): Path<HotelId>,
    perm: RequiresPermission<resource::Sync, operation::CreateOwn>,
    Json(range): Json<SyncRangeRequest>,
) -> Result<ApiResponse<SyncOutcome>> {
    managed_hotel(&state, &perm.user, id, Resource::Sync, Operation::CreateOwn).await?;
    let outcome = state
        .sync
        .sync_hotel_availability(id, range.start_date, range.end_date, Utc::now())
        .await?;
    Ok(ApiResponse::ok("Availability synchronized", outcome))
}

/// Push pricing of a hotel
#[utoipa::path(
    post,
    path = "/hotels/{id}/sync/pricing",
    request_body = SyncRangeRequest,
    tag = "sync",
    params(("id" = uuid::Uuid, Path, description = "Hotel ID")),
    responses(
        (status = 200, description = "Sync finished", body = ApiResponse<SyncOutcome>),
        (status = 502, description = "Sync target unavailable"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn sync_hotel_pricing(
    State(state): State<AppState>,
    Path(id): Path<HotelId>,
    perm: RequiresPermission<resource::Sync, operation::CreateOwn>,
    Json(range): Json<SyncRangeRequest>,
) -> Result<ApiResponse<SyncOutcome>> {
    managed_hotel(&state, &perm.user, id, Resource::Sync, Operation::CreateOwn).await?;
    let outcome = state
        .sync
        .sync_hotel_pricing(id, range.start_date, range.end_date, Utc::now())
        .await?;
    Ok(ApiResponse::ok("Pricing synchronized", outcome))
}

/// Sync readiness and the last pushes of a hotel
#[utoipa::path(
    get,
    path = "/hotels/{id}/sync",
    tag = "sync",
    params(("id" = uuid::Uuid, Path, description = "Hotel ID")),
    responses(
        (status = 200, description = "Sync status", body = ApiResponse<SyncStatus>),
        (status = 403, description = "Not the hotel's manager"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn sync_status(
    State(state): State<AppState>,
    Path(id): Path<HotelId>,
    perm: RequiresPermission<resource::Sync, operation::ReadOwn>,
) -> Result<ApiResponse<SyncStatus>> {
    managed_hotel(&state, &perm.user, id, Resource::Sync, Operation::ReadOwn).await?;
    let status = state.sync.sync_status(id).await?;
    Ok(ApiResponse::ok("Sync status retrieved", status))
}

/// Sync several hotels. Each hotel succeeds or fails on its own; results keep request order.
#[utoipa::path(
    post,
    path = "/sync/batch",
    request_body = SyncMultipleRequest,
    tag = "sync",
    responses(
        (status = 200, description = "Per-hotel results", body = ApiResponse<Vec<BatchSyncItem>>),
        (status = 422, description = "Too many hotels"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn sync_multiple_hotels(
    State(state): State<AppState>,
    perm: RequiresPermission<resource::Sync, operation::CreateOwn>,
    Json(request): Json<SyncMultipleRequest>,
) -> Result<ApiResponse<Vec<BatchSyncItem>>> {
    if request.hotel_ids.is_empty() || request.hotel_ids.len() > MAX_BATCH_HOTELS {
        return Err(Error::invalid_field(
            "hotel_ids",
            format!("must name between 1 and {MAX_BATCH_HOTELS} hotels"),
        ));
    }
    let items = state
        .sync
        .sync_multiple(Some(&perm.user), &request.hotel_ids, request.start_date, request.end_date, Utc::now())
        .await;
    Ok(ApiResponse::ok("Batch sync finished", items))
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Result<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| Error::Unauthenticated {
            message: Some(format!("Missing {name} header")),
        })
}

/// Receive a signed push of base prices and room states from the external system
#[utoipa::path(
    post,
    path = "/sync/incoming",
    request_body = crate::sync::IncomingSync,
    tag = "sync",
    params(
        ("sync-id" = String, Header, description = "Unique id of the push"),
        ("sync-timestamp" = i64, Header, description = "Unix seconds the push was signed at"),
        ("sync-signature" = String, Header, description = "v1,base64(HMAC-SHA256(secret, id.timestamp.body))"),
    ),
    responses(
        (status = 200, description = "Updates reconciled", body = ApiResponse<IncomingSyncResult>),
        (status = 401, description = "Missing or invalid signature"),
        (status = 404, description = "Hotel not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn incoming_sync(State(state): State<AppState>, headers: HeaderMap, body: String) -> Result<ApiResponse<IncomingSyncResult>> {
    let sync_id = header(&headers, signing::ID_HEADER)?;
    let timestamp = header(&headers, signing::TIMESTAMP_HEADER)?
        .parse::<i64>()
        .map_err(|_| Error::Unauthenticated {
            message: Some("Invalid sync signature".to_string()),
        })?;
    let signature = header(&headers, signing::SIGNATURE_HEADER)?;

    let result = state
        .sync
        .handle_incoming(
            &SignedRequest {
                sync_id,
                timestamp,
                signature,
                body: &body,
            },
            Utc::now(),
        )
        .await?;
    Ok(ApiResponse::ok("Incoming sync processed", result))
}

#[cfg(test)]
mod tests {
    use crate::api::models::users::Role;
    use crate::sync::signing;
    use crate::test_utils::{create_test_app, create_test_room_type, create_test_user, days_from_today, login_as};
    use axum::http::StatusCode;
    use chrono::Utc;
    use serde_json::{Value, json};

    #[tokio::test]
    #[test_log::test]
    async fn test_sync_push_is_idempotent_over_http() {
        let (server, state) = create_test_app().await;
        let (manager, token) = login_as(&state, Role::HotelManager).await;
        let owner = state.store.get_user(manager.id).await.unwrap().unwrap();
        let (hotel, _) = create_test_room_type(state.store.as_ref(), &owner, 2, 600_000).await;
        let path = format!("/api/v1/hotels/{}/sync", hotel.id);
        let range = json!({ "start_date": days_from_today(0), "end_date": days_from_today(6) });

        let first: Value = server.post(&path).authorization_bearer(&token).json(&range).await.json();
        assert_eq!(first["data"]["availability"]["pushed"], true);
        let second: Value = server.post(&path).authorization_bearer(&token).json(&range).await.json();
        assert_eq!(second["data"]["availability"]["pushed"], false);
        assert_eq!(second["data"]["pricing"]["pushed"], false);
        assert_eq!(
            first["data"]["availability"]["idempotency_key"],
            second["data"]["availability"]["idempotency_key"]
        );

        let status: Value = server.get(&path).authorization_bearer(&token).await.json();
        assert_eq!(status["data"]["status"], "ready");
        assert_eq!(status["data"]["records"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_batch_sync_reports_each_hotel() {
        let (server, state) = create_test_app().await;
        let (manager, token) = login_as(&state, Role::HotelManager).await;
        let owner = state.store.get_user(manager.id).await.unwrap().unwrap();
        let (own, _) = create_test_room_type(state.store.as_ref(), &owner, 1, 600_000).await;
        let other_owner = create_test_user(state.store.as_ref(), Role::HotelManager).await;
        let (foreign, _) = create_test_room_type(state.store.as_ref(), &other_owner, 1, 600_000).await;

        let json: Value = server
            .post("/api/v1/sync/batch")
            .authorization_bearer(&token)
            .json(&json!({
                "hotel_ids": [foreign.id, own.id],
                "start_date": days_from_today(0),
                "end_date": days_from_today(2),
            }))
            .await
            .json();
        let items = json["data"].as_array().unwrap();
        assert_eq!(items[0]["success"], false);
        assert_eq!(items[1]["success"], true);
        assert_eq!(items[1]["hotel_id"], json!(own.id));
    }

    #[tokio::test]
    async fn test_incoming_sync_requires_valid_signature() {
        let (server, state) = create_test_app().await;
        let owner = create_test_user(state.store.as_ref(), Role::HotelManager).await;
        let (hotel, room_type) = create_test_room_type(state.store.as_ref(), &owner, 1, 600_000).await;
        let body = json!({
            "hotel_id": hotel.id,
            "pricing_updates": [
                { "room_type_id": room_type.id, "base_price": 650_000, "updated_at": Utc::now() + chrono::Duration::seconds(5) },
            ],
        })
        .to_string();
        let timestamp = Utc::now().timestamp();
        let secret = state.config.sync.inbound_secret.clone().unwrap();
        let signature = signing::sign_payload("push-1", timestamp, &body, &secret).unwrap();

        server
            .post("/api/v1/sync/incoming")
            .add_header("sync-id", "push-1")
            .add_header("sync-timestamp", timestamp.to_string())
            .add_header("sync-signature", "v1,AAAA")
            .text(body.clone())
            .await
            .assert_status(StatusCode::UNAUTHORIZED);

        let json: Value = server
            .post("/api/v1/sync/incoming")
            .add_header("sync-id", "push-1")
            .add_header("sync-timestamp", timestamp.to_string())
            .add_header("sync-signature", signature)
            .text(body)
            .await
            .json();
        assert_eq!(json["data"]["applied"], 1);
        let room_type = state.store.get_room_type(room_type.id).await.unwrap().unwrap();
        assert_eq!(room_type.base_price, 650_000);
    }
}
