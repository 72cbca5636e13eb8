use axum::{
    Json,
    extract::{Path, Query, State},
};

use crate::{
    AppState,
    api::models::{
        content::{ReviewCreate, ReviewListResponse, ReviewResponse},
        pagination::{PaginatedResponse, Pagination},
        response::ApiResponse,
    },
    auth::permissions::{RequiresPermission, operation, resource},
    db::models::{content::ReviewCreateDBRequest, hotels::HotelStatus},
    errors::{Error, Result},
    types::HotelId,
};

/// List a hotel's reviews with its average rating
#[utoipa::path(
    get,
    path = "/hotels/{id}/reviews",
    tag = "reviews",
    params(("id" = uuid::Uuid, Path, description = "Hotel ID"), Pagination),
    responses(
        (status = 200, description = "Reviews", body = ApiResponse<ReviewListResponse>),
        (status = 404, description = "Hotel not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_reviews(
    State(state): State<AppState>,
    Path(hotel_id): Path<HotelId>,
    Query(pagination): Query<Pagination>,
) -> Result<ApiResponse<ReviewListResponse>> {
    if state.store.get_hotel(hotel_id).await?.is_none() {
        return Err(Error::not_found("Hotel", hotel_id));
    }
    let (skip, limit) = pagination.params();
    let (reviews, total_count) = state.store.list_reviews(hotel_id, skip, limit).await?;
    let summary = state.store.review_summary(hotel_id).await?;

    Ok(ApiResponse::ok(
        "Reviews retrieved",
        ReviewListResponse {
            reviews: PaginatedResponse::new(reviews.into_iter().map(ReviewResponse::from).collect(), total_count, skip, limit),
            review_count: summary.review_count,
            average_rating: summary.average_rating,
        },
    ))
}

/// Review a hotel. One review per customer per hotel.
#[utoipa::path(
    post,
    path = "/hotels/{id}/reviews",
    request_body = ReviewCreate,
    tag = "reviews",
    params(("id" = uuid::Uuid, Path, description = "Hotel ID")),
    responses(
        (status = 201, description = "Review created", body = ApiResponse<ReviewResponse>),
        (status = 404, description = "Hotel not found"),
        (status = 409, description = "Hotel already reviewed"),
        (status = 422, description = "Rating out of range"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_review(
    State(state): State<AppState>,
    Path(hotel_id): Path<HotelId>,
    perm: RequiresPermission<resource::Reviews, operation::CreateOwn>,
    Json(create): Json<ReviewCreate>,
) -> Result<ApiResponse<ReviewResponse>> {
    if !(1..=5).contains(&create.rating) {
        return Err(Error::invalid_field("rating", "must be between 1 and 5"));
    }
    match state.store.get_hotel(hotel_id).await? {
        Some(hotel) if hotel.status == HotelStatus::Active => {}
        _ => return Err(Error::not_found("Hotel", hotel_id)),
    }

    let review = state
        .store
        .create_review(&ReviewCreateDBRequest {
            hotel_id,
            user_id: perm.user.id,
            rating: create.rating,
            comment: create.comment.map(|c| c.trim().to_string()).filter(|c| !c.is_empty()),
        })
        .await?;
    Ok(ApiResponse::created("Review created", ReviewResponse::from(review)))
}
