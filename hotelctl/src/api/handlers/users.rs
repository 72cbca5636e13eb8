use axum::{
    Json,
    extract::{Path, Query, State},
};

use crate::{
    AppState,
    api::{
        handlers::required_text,
        models::{
            pagination::PaginatedResponse,
            response::ApiResponse,
            users::{CurrentUser, ListUsersQuery, UserResponse, UserStatusUpdate, UserUpdate},
        },
    },
    auth::permissions::{RequiresPermission, operation, resource},
    db::models::users::{UserFilter, UserUpdateDBRequest},
    errors::{Error, Result},
    types::UserId,
};

/// Get the authenticated user's profile
#[utoipa::path(
    get,
    path = "/users/me",
    tag = "users",
    responses(
        (status = 200, description = "Own profile", body = ApiResponse<UserResponse>),
        (status = 401, description = "Unauthorized"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_me(
    State(state): State<AppState>,
    perm: RequiresPermission<resource::Users, operation::ReadOwn>,
) -> Result<ApiResponse<UserResponse>> {
    let user = state
        .store
        .get_user(perm.user.id)
        .await?
        .ok_or_else(|| Error::not_found("User", perm.user.id))?;
    Ok(ApiResponse::ok("Profile retrieved", UserResponse::from(user)))
}

/// Update the authenticated user's profile
#[utoipa::path(
    patch,
    path = "/users/me",
    request_body = UserUpdate,
    tag = "users",
    responses(
        (status = 200, description = "Profile updated", body = ApiResponse<UserResponse>),
        (status = 422, description = "Invalid input"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_me(
    State(state): State<AppState>,
    perm: RequiresPermission<resource::Users, operation::UpdateOwn>,
    Json(update): Json<UserUpdate>,
) -> Result<ApiResponse<UserResponse>> {
    let name = update.name.as_deref().map(|name| required_text("name", name)).transpose()?;
    let user = state
        .store
        .update_user(
            perm.user.id,
            &UserUpdateDBRequest {
                name,
                phone_number: update.phone_number,
                gender: update.gender,
                date_of_birth: update.date_of_birth,
                ..Default::default()
            },
        )
        .await?;
    Ok(ApiResponse::ok("Profile updated", UserResponse::from(user)))
}

/// List users
#[utoipa::path(
    get,
    path = "/users",
    tag = "users",
    params(ListUsersQuery),
    responses(
        (status = 200, description = "Page of users", body = ApiResponse<PaginatedResponse<UserResponse>>),
        (status = 403, description = "Admin only"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<ListUsersQuery>,
    _perm: RequiresPermission<resource::Users, operation::ReadAll>,
) -> Result<ApiResponse<PaginatedResponse<UserResponse>>> {
    let (skip, limit) = query.pagination.params();
    let (users, total_count) = state
        .store
        .list_users(&UserFilter {
            role: query.role,
            search: query.search,
            skip,
            limit,
        })
        .await?;
    let users = users.into_iter().map(UserResponse::from).collect();
    Ok(ApiResponse::ok("Users retrieved", PaginatedResponse::new(users, total_count, skip, limit)))
}

/// Get a user by ID
#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "users",
    params(("id" = uuid::Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "User", body = ApiResponse<UserResponse>),
        (status = 404, description = "User not found"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<UserId>,
    _perm: RequiresPermission<resource::Users, operation::ReadAll>,
) -> Result<ApiResponse<UserResponse>> {
    let user = state.store.get_user(id).await?.ok_or_else(|| Error::not_found("User", id))?;
    Ok(ApiResponse::ok("User retrieved", UserResponse::from(user)))
}

/// Activate or deactivate a user. Deactivated users lose access on their next request.
#[utoipa::path(
    patch,
    path = "/users/{id}/status",
    request_body = UserStatusUpdate,
    tag = "users",
    params(("id" = uuid::Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "Status updated", body = ApiResponse<UserResponse>),
        (status = 404, description = "User not found"),
        (status = 422, description = "Admins cannot deactivate themselves"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_user_status(
    State(state): State<AppState>,
    Path(id): Path<UserId>,
    perm: RequiresPermission<resource::Users, operation::UpdateAll>,
    Json(update): Json<UserStatusUpdate>,
) -> Result<ApiResponse<UserResponse>> {
    let admin: &CurrentUser = &perm.user;
    if admin.id == id && !update.is_active {
        return Err(Error::invalid_field("is_active", "you cannot deactivate your own account"));
    }
    if state.store.get_user(id).await?.is_none() {
        return Err(Error::not_found("User", id));
    }
    let user = state
        .store
        .update_user(
            id,
            &UserUpdateDBRequest {
                is_active: Some(update.is_active),
                ..Default::default()
            },
        )
        .await?;
    tracing::info!(user_id = %id, is_active = update.is_active, admin = %admin.id, "User status changed");
    Ok(ApiResponse::ok("User status updated", UserResponse::from(user)))
}

#[cfg(test)]
mod tests {
    use crate::api::models::users::Role;
    use crate::test_utils::{create_test_app, login_as};
    use axum::http::StatusCode;
    use serde_json::{Value, json};

    #[tokio::test]
    async fn test_profile_round_trip() {
        let (server, state) = create_test_app().await;
        let (_, token) = login_as(&state, Role::Customer).await;

        let response = server
            .patch("/api/v1/users/me")
            .authorization_bearer(&token)
            .json(&json!({ "name": "  Hoa  ", "phone_number": "+84 90 000 0000" }))
            .await;
        response.assert_status_ok();

        let json: Value = server.get("/api/v1/users/me").authorization_bearer(&token).await.json();
        assert_eq!(json["data"]["name"], "Hoa");
        assert_eq!(json["data"]["phone_number"], "+84 90 000 0000");
        assert!(json["data"].get("password_hash").is_none());
    }

    #[tokio::test]
    async fn test_user_admin_is_admin_only() {
        let (server, state) = create_test_app().await;
        let (customer, customer_token) = login_as(&state, Role::Customer).await;
        let (_, admin_token) = login_as(&state, Role::Admin).await;

        server
            .get("/api/v1/users")
            .authorization_bearer(&customer_token)
            .await
            .assert_status(StatusCode::FORBIDDEN);

        let json: Value = server
            .get("/api/v1/users")
            .add_query_param("role", "customer")
            .authorization_bearer(&admin_token)
            .await
            .json();
        assert_eq!(json["data"]["total_count"], 1);

        server
            .patch(&format!("/api/v1/users/{}/status", customer.id))
            .authorization_bearer(&admin_token)
            .json(&json!({ "is_active": false }))
            .await
            .assert_status_ok();

        // The deactivated customer's token stops working immediately
        server
            .get("/api/v1/users/me")
            .authorization_bearer(&customer_token)
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }
}
