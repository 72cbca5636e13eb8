use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::Utc;

use crate::{
    AppState,
    api::{
        handlers::{managed_hotel, managed_room_type},
        models::{
            inventory::DateRangeQuery,
            pricing::{
                ListPromoCodesQuery, PriceDateQuery, PricingRuleCreate, PricingRuleResponse, PromoCodeCreate, PromoCodeResponse,
                PromoCodeUpdate, QuoteCreate,
            },
            response::ApiResponse,
            users::CurrentUser,
        },
    },
    auth::permissions::{RequiresPermission, forbidden, has_permission, operation, resource},
    db::models::pricing::{PricingRuleCreateDBRequest, PromoCodeCreateDBRequest, PromoCodeUpdateDBRequest},
    errors::{Error, Result},
    pricing::{NightlyPrice, PriceRange, Quote, QuoteRequest},
    types::{HotelId, Operation, PricingRuleId, PromoCodeId, Resource, RoomTypeId},
};

/// Platform-wide promo codes need the unrestricted pricing grant; hotel codes need a hotel the
/// caller manages.
async fn check_promo_scope(state: &AppState, user: &CurrentUser, hotel_id: Option<HotelId>, operation: Operation) -> Result<()> {
    match hotel_id {
        Some(hotel_id) => managed_hotel(state, user, hotel_id, Resource::Pricing, operation).await.map(|_| ()),
        None if has_permission(user, Resource::Pricing, operation.all()) => Ok(()),
        None => Err(forbidden(Resource::Pricing, operation.all(), "platform-wide promo codes")),
    }
}

/// Price a stay, optionally with a promo code
#[utoipa::path(
    post,
    path = "/pricing/quote",
    request_body = QuoteCreate,
    tag = "pricing",
    responses(
        (status = 200, description = "Quote", body = ApiResponse<Quote>),
        (status = 404, description = "Room type not found"),
        (status = 422, description = "Invalid stay or party"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn quote(State(state): State<AppState>, Json(request): Json<QuoteCreate>) -> Result<ApiResponse<Quote>> {
    let quote = state
        .pricing
        .quote(
            &QuoteRequest {
                room_type_id: request.room_type_id,
                check_in: request.check_in,
                check_out: request.check_out,
                guests: request.guests,
                rooms: request.rooms,
                promo_code: request.promo_code,
            },
            Utc::now(),
        )
        .await?;
    Ok(ApiResponse::ok("Quote calculated", quote))
}

/// Nightly price of a room type on one date
#[utoipa::path(
    get,
    path = "/room-types/{id}/price",
    tag = "pricing",
    params(("id" = uuid::Uuid, Path, description = "Room type ID"), PriceDateQuery),
    responses(
        (status = 200, description = "Nightly price", body = ApiResponse<NightlyPrice>),
        (status = 404, description = "Room type not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn price_for_date(
    State(state): State<AppState>,
    Path(id): Path<RoomTypeId>,
    Query(query): Query<PriceDateQuery>,
) -> Result<ApiResponse<NightlyPrice>> {
    let price = state.pricing.price_for_date(id, query.date).await?;
    Ok(ApiResponse::ok("Price retrieved", price))
}

/// Nightly prices of a room type over `start..=end` with min, max and average
#[utoipa::path(
    get,
    path = "/room-types/{id}/prices",
    tag = "pricing",
    params(("id" = uuid::Uuid, Path, description = "Room type ID"), DateRangeQuery),
    responses(
        (status = 200, description = "Price range", body = ApiResponse<PriceRange>),
        (status = 404, description = "Room type not found"),
        (status = 422, description = "Invalid range"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn price_range(
    State(state): State<AppState>,
    Path(id): Path<RoomTypeId>,
    Query(query): Query<DateRangeQuery>,
) -> Result<ApiResponse<PriceRange>> {
    let range = state.pricing.price_range(id, query.start, query.end).await?;
    Ok(ApiResponse::ok("Prices retrieved", range))
}

/// Pricing rules of a room type
#[utoipa::path(
    get,
    path = "/room-types/{id}/pricing-rules",
    tag = "pricing",
    params(("id" = uuid::Uuid, Path, description = "Room type ID")),
    responses(
        (status = 200, description = "Pricing rules", body = ApiResponse<Vec<PricingRuleResponse>>),
        (status = 403, description = "Not the hotel's manager"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_pricing_rules(
    State(state): State<AppState>,
    Path(id): Path<RoomTypeId>,
    perm: RequiresPermission<resource::Pricing, operation::UpdateOwn>,
) -> Result<ApiResponse<Vec<PricingRuleResponse>>> {
    managed_room_type(&state, &perm.user, id, Resource::Pricing, Operation::UpdateOwn).await?;
    let rules = state.pricing.list_rules(id).await?;
    Ok(ApiResponse::ok(
        "Pricing rules retrieved",
        rules.into_iter().map(PricingRuleResponse::from).collect(),
    ))
}

/// Add a pricing rule to a room type
#[utoipa::path(
    post,
    path = "/room-types/{id}/pricing-rules",
    request_body = PricingRuleCreate,
    tag = "pricing",
    params(("id" = uuid::Uuid, Path, description = "Room type ID")),
    responses(
        (status = 201, description = "Pricing rule created", body = ApiResponse<PricingRuleResponse>),
        (status = 403, description = "Not the hotel's manager"),
        (status = 422, description = "Invalid rule"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_pricing_rule(
    State(state): State<AppState>,
    Path(id): Path<RoomTypeId>,
    perm: RequiresPermission<resource::Pricing, operation::CreateOwn>,
    Json(create): Json<PricingRuleCreate>,
) -> Result<ApiResponse<PricingRuleResponse>> {
    managed_room_type(&state, &perm.user, id, Resource::Pricing, Operation::CreateOwn).await?;
    let rule = state
        .pricing
        .create_rule(&PricingRuleCreateDBRequest {
            room_type_id: id,
            label: create.label.trim().to_string(),
            start_date: create.start_date,
            end_date: create.end_date,
            weekdays: create.weekdays,
            kind: create.kind,
            value: create.value,
            priority: create.priority,
        })
        .await?;
    Ok(ApiResponse::created("Pricing rule created", PricingRuleResponse::from(rule)))
}

/// Delete a pricing rule
#[utoipa::path(
    delete,
    path = "/pricing-rules/{id}",
    tag = "pricing",
    params(("id" = uuid::Uuid, Path, description = "Pricing rule ID")),
    responses(
        (status = 200, description = "Pricing rule deleted"),
        (status = 404, description = "Pricing rule not found"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_pricing_rule(
    State(state): State<AppState>,
    Path(id): Path<PricingRuleId>,
    perm: RequiresPermission<resource::Pricing, operation::DeleteOwn>,
) -> Result<ApiResponse<()>> {
    let rule = state.pricing.get_rule(id).await?;
    managed_room_type(&state, &perm.user, rule.room_type_id, Resource::Pricing, Operation::DeleteOwn).await?;
    state.pricing.delete_rule(id).await?;
    Ok(ApiResponse::ok("Pricing rule deleted", ()))
}

/// Promo codes of a hotel plus platform-wide codes. Managers must name a hotel they manage.
#[utoipa::path(
    get,
    path = "/promo-codes",
    tag = "pricing",
    params(ListPromoCodesQuery),
    responses(
        (status = 200, description = "Promo codes", body = ApiResponse<Vec<PromoCodeResponse>>),
        (status = 403, description = "Not the hotel's manager"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_promo_codes(
    State(state): State<AppState>,
    Query(query): Query<ListPromoCodesQuery>,
    perm: RequiresPermission<resource::Pricing, operation::UpdateOwn>,
) -> Result<ApiResponse<Vec<PromoCodeResponse>>> {
    check_promo_scope(&state, &perm.user, query.hotel_id, Operation::UpdateOwn).await?;
    let promos = state.pricing.list_promos(query.hotel_id).await?;
    Ok(ApiResponse::ok(
        "Promo codes retrieved",
        promos.into_iter().map(PromoCodeResponse::from).collect(),
    ))
}

/// Create a promo code
#[utoipa::path(
    post,
    path = "/promo-codes",
    request_body = PromoCodeCreate,
    tag = "pricing",
    responses(
        (status = 201, description = "Promo code created", body = ApiResponse<PromoCodeResponse>),
        (status = 403, description = "Platform-wide codes are admin only"),
        (status = 409, description = "Code already exists"),
        (status = 422, description = "Invalid code"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_promo_code(
    State(state): State<AppState>,
    perm: RequiresPermission<resource::Pricing, operation::CreateOwn>,
    Json(create): Json<PromoCodeCreate>,
) -> Result<ApiResponse<PromoCodeResponse>> {
    check_promo_scope(&state, &perm.user, create.hotel_id, Operation::CreateOwn).await?;
    let promo = state
        .pricing
        .create_promo(&PromoCodeCreateDBRequest {
            code: create.code,
            kind: create.kind,
            value: create.value,
            valid_from: create.valid_from,
            valid_until: create.valid_until,
            min_nights: create.min_nights,
            hotel_id: create.hotel_id,
        })
        .await?;
    Ok(ApiResponse::created("Promo code created", PromoCodeResponse::from(promo)))
}

/// Update or deactivate a promo code
#[utoipa::path(
    patch,
    path = "/promo-codes/{id}",
    request_body = PromoCodeUpdate,
    tag = "pricing",
    params(("id" = uuid::Uuid, Path, description = "Promo code ID")),
    responses(
        (status = 200, description = "Promo code updated", body = ApiResponse<PromoCodeResponse>),
        (status = 404, description = "Promo code not found"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_promo_code(
    State(state): State<AppState>,
    Path(id): Path<PromoCodeId>,
    perm: RequiresPermission<resource::Pricing, operation::UpdateOwn>,
    Json(update): Json<PromoCodeUpdate>,
) -> Result<ApiResponse<PromoCodeResponse>> {
    let current = state.pricing.get_promo(id).await?;
    check_promo_scope(&state, &perm.user, current.hotel_id, Operation::UpdateOwn)
        .await
        .map_err(|e| match e {
            // Managers do not learn about other hotels' codes
            Error::InsufficientPermissions { .. } if !perm.user.is_admin() => Error::not_found("Promo code", id),
            other => other,
        })?;
    let promo = state
        .pricing
        .update_promo(
            id,
            &PromoCodeUpdateDBRequest {
                is_active: update.is_active,
                value: update.value,
                valid_from: update.valid_from,
                valid_until: update.valid_until,
                min_nights: update.min_nights,
            },
        )
        .await?;
    Ok(ApiResponse::ok("Promo code updated", PromoCodeResponse::from(promo)))
}

#[cfg(test)]
mod tests {
    use crate::api::models::users::Role;
    use crate::test_utils::{create_test_app, create_test_room_type, days_from_today, login_as};
    use axum::http::StatusCode;
    use serde_json::{Value, json};

    #[tokio::test]
    async fn test_rule_and_promo_flow_through_quote() {
        let (server, state) = create_test_app().await;
        let (manager, token) = login_as(&state, Role::HotelManager).await;
        let owner = state.store.get_user(manager.id).await.unwrap().unwrap();
        let (hotel, room_type) = create_test_room_type(state.store.as_ref(), &owner, 2, 1_000_000).await;
        let check_in = days_from_today(20);
        let check_out = days_from_today(22);

        server
            .post(&format!("/api/v1/room-types/{}/pricing-rules", room_type.id))
            .authorization_bearer(&token)
            .json(&json!({
                "label": "Festival",
                "start_date": check_in,
                "end_date": check_in,
                "kind": "percent",
                "value": 5000,
            }))
            .await
            .assert_status(StatusCode::CREATED);

        server
            .post("/api/v1/promo-codes")
            .authorization_bearer(&token)
            .json(&json!({ "code": "summer10", "kind": "percent", "value": 10, "hotel_id": hotel.id }))
            .await
            .assert_status(StatusCode::CREATED);

        let json: Value = server
            .post("/api/v1/pricing/quote")
            .json(&json!({
                "room_type_id": room_type.id,
                "check_in": check_in,
                "check_out": check_out,
                "promo_code": "SUMMER10",
            }))
            .await
            .json();
        let quote = &json["data"];
        assert_eq!(quote["nightly"][0]["price"], 1_500_000);
        assert_eq!(quote["nightly"][0]["rule_label"], "Festival");
        assert_eq!(quote["nightly"][1]["price"], 1_000_000);
        assert_eq!(quote["subtotal"], 2_500_000);
        assert_eq!(quote["discount"], 250_000);
        assert_eq!(quote["total"], 2_250_000);
        assert_eq!(quote["promo"]["applied"], true);

        let json: Value = server
            .post("/api/v1/pricing/quote")
            .json(&json!({
                "room_type_id": room_type.id,
                "check_in": check_in,
                "check_out": check_out,
                "promo_code": "NOPE",
            }))
            .await
            .json();
        assert_eq!(json["data"]["discount"], 0);
        assert_eq!(json["data"]["promo"]["applied"], false);
    }

    #[tokio::test]
    async fn test_platform_promo_codes_are_admin_only() {
        let (server, state) = create_test_app().await;
        let (_, manager) = login_as(&state, Role::HotelManager).await;
        let (_, admin) = login_as(&state, Role::Admin).await;
        let promo = json!({ "code": "WELCOME", "kind": "fixed", "value": 100_000 });

        server
            .post("/api/v1/promo-codes")
            .authorization_bearer(&manager)
            .json(&promo)
            .await
            .assert_status(StatusCode::FORBIDDEN);
        server
            .post("/api/v1/promo-codes")
            .authorization_bearer(&admin)
            .json(&promo)
            .await
            .assert_status(StatusCode::CREATED);
        server
            .post("/api/v1/promo-codes")
            .authorization_bearer(&admin)
            .json(&promo)
            .await
            .assert_status(StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_price_range_is_public() {
        let (server, state) = create_test_app().await;
        let (manager, _) = login_as(&state, Role::HotelManager).await;
        let owner = state.store.get_user(manager.id).await.unwrap().unwrap();
        let (_, room_type) = create_test_room_type(state.store.as_ref(), &owner, 1, 700_000).await;

        let json: Value = server
            .get(&format!("/api/v1/room-types/{}/prices", room_type.id))
            .add_query_param("start", days_from_today(1))
            .add_query_param("end", days_from_today(3))
            .await
            .json();
        assert_eq!(json["data"]["nightly"].as_array().unwrap().len(), 3);
        assert_eq!(json["data"]["average"], 700_000);
    }
}
