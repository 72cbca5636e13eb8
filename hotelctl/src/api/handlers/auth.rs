use axum::{
    Json,
    extract::State,
    http::{HeaderMap, header::SET_COOKIE},
    response::{AppendHeaders, IntoResponse, Response},
};

use crate::{
    AppState,
    api::models::{
        auth::{AuthResponse, ChangePasswordRequest, LoginRequest, RegisterRequest, RegistrationInfo},
        response::ApiResponse,
        users::{CurrentUser, Role, UserResponse},
    },
    api::handlers::required_text,
    auth::{
        current_user::cookie_value,
        password,
        permissions::forbidden,
        session::{self, TokenKind, TokenPair},
    },
    config::Config,
    db::models::users::{UserCreateDBRequest, UserDBResponse, UserUpdateDBRequest},
    errors::{Error, Result},
    types::{Operation, Resource},
};

const LOGIN_FAILED: &str = "Email, password or role is incorrect";

fn login_failed() -> Error {
    Error::Unauthenticated {
        message: Some(LOGIN_FAILED.to_string()),
    }
}

fn same_site(config: &Config) -> &'static str {
    match config.auth.cookies.same_site.to_ascii_lowercase().as_str() {
        "strict" => "Strict",
        "none" => "None",
        _ => "Lax",
    }
}

/// Build a `Set-Cookie` value; `max_age` 0 clears the cookie
fn cookie(name: &str, value: &str, max_age: u64, config: &Config) -> String {
    let secure = if config.auth.cookies.secure { "; Secure" } else { "" };
    format!(
        "{name}={value}; Path=/; HttpOnly; SameSite={}; Max-Age={max_age}{secure}",
        same_site(config)
    )
}

fn session_cookies(tokens: &TokenPair, config: &Config) -> [(axum::http::HeaderName, String); 2] {
    let cookies = &config.auth.cookies;
    [
        (
            SET_COOKIE,
            cookie(
                &cookies.access_cookie_name,
                &tokens.access_token,
                config.auth.access_token_expiry.as_secs(),
                config,
            ),
        ),
        (
            SET_COOKIE,
            cookie(
                &cookies.refresh_cookie_name,
                &tokens.refresh_token,
                config.auth.refresh_token_expiry.as_secs(),
                config,
            ),
        ),
    ]
}

fn signed_in(user: UserDBResponse, config: &Config, message: &str, created: bool) -> Result<Response> {
    let tokens = session::issue_tokens(&CurrentUser::from(user.clone()), config)?;
    let body = AuthResponse {
        user: UserResponse::from(user),
        access_token: tokens.access_token.clone(),
        access_expires_at: tokens.access_expires_at,
    };
    let response = if created {
        ApiResponse::created(message, body)
    } else {
        ApiResponse::ok(message, body)
    };
    Ok((AppendHeaders(session_cookies(&tokens, config)), response).into_response())
}

/// Get registration information
#[utoipa::path(
    get,
    path = "/authentication/register",
    tag = "authentication",
    responses(
        (status = 200, description = "Registration info", body = ApiResponse<RegistrationInfo>),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_registration_info(State(state): State<AppState>) -> ApiResponse<RegistrationInfo> {
    let enabled = state.config.auth.allow_registration;
    ApiResponse::ok(
        "Registration info",
        RegistrationInfo {
            enabled,
            message: if enabled {
                "Registration is enabled".to_string()
            } else {
                "Registration is disabled".to_string()
            },
        },
    )
}

/// Register a new customer or hotel manager account
#[utoipa::path(
    post,
    path = "/authentication/register",
    request_body = RegisterRequest,
    tag = "authentication",
    responses(
        (status = 201, description = "User registered successfully", body = ApiResponse<AuthResponse>),
        (status = 403, description = "Registration disabled or role not allowed"),
        (status = 409, description = "Email already registered"),
        (status = 422, description = "Invalid input"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn register(State(state): State<AppState>, Json(request): Json<RegisterRequest>) -> Result<Response> {
    if !state.config.auth.allow_registration {
        return Err(forbidden(Resource::Users, Operation::CreateAll, "users while registration is disabled"));
    }
    if request.role == Role::Admin {
        return Err(Error::invalid_field("role", "must be customer or hotel_manager"));
    }

    let name = required_text("name", &request.name)?;
    let email = request.email.trim().to_lowercase();
    if !email.contains('@') || email.starts_with('@') || email.ends_with('@') {
        return Err(Error::invalid_field("email", "must be a valid email address"));
    }
    password::validate_password(&request.password, &state.config.auth.password)?;

    let password_hash = password::hash_password(request.password).await?;
    let user = state
        .store
        .create_user(&UserCreateDBRequest {
            name,
            email,
            phone_number: request.phone_number,
            gender: request.gender,
            date_of_birth: request.date_of_birth,
            role: request.role,
            password_hash,
        })
        .await?;
    tracing::info!(user_id = %user.id, role = %user.role, "Registered user");

    signed_in(user, &state.config, "Registration successful", true)
}

/// Login with email, password and role
#[utoipa::path(
    post,
    path = "/authentication/login",
    request_body = LoginRequest,
    tag = "authentication",
    responses(
        (status = 200, description = "Login successful", body = ApiResponse<AuthResponse>),
        (status = 401, description = "Email, password or role is incorrect"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn login(State(state): State<AppState>, Json(request): Json<LoginRequest>) -> Result<Response> {
    let Some(user) = state.store.get_user_by_email(request.email.trim()).await? else {
        // Unknown emails pay the same Argon2 cost as a wrong password
        password::verify_dummy_password(request.password).await?;
        return Err(login_failed());
    };

    let is_valid = password::verify_password(request.password, user.password_hash.clone()).await?;
    if !is_valid || user.role != request.role || !user.is_active {
        return Err(login_failed());
    }

    signed_in(user, &state.config, "Login successful", false)
}

/// Trade the refresh cookie for a new token pair
#[utoipa::path(
    post,
    path = "/authentication/refresh",
    tag = "authentication",
    responses(
        (status = 200, description = "Tokens refreshed", body = ApiResponse<AuthResponse>),
        (status = 401, description = "Missing, invalid or expired refresh token"),
    ),
    security(("RefreshCookie" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn refresh(State(state): State<AppState>, headers: HeaderMap) -> Result<Response> {
    let token = cookie_value(&headers, &state.config.auth.cookies.refresh_cookie_name).ok_or(Error::Unauthenticated { message: None })?;
    let claims = session::verify_token(token, TokenKind::Refresh, &state.config)?;
    let user = state
        .store
        .get_user(claims.sub)
        .await?
        .ok_or(Error::Unauthenticated { message: None })?;
    if !user.is_active {
        return Err(Error::Unauthenticated {
            message: Some("Account is deactivated".to_string()),
        });
    }

    signed_in(user, &state.config, "Tokens refreshed", false)
}

/// Logout (clear both cookies)
#[utoipa::path(
    post,
    path = "/authentication/logout",
    tag = "authentication",
    responses(
        (status = 200, description = "Logout successful"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    let cookies = &state.config.auth.cookies;
    (
        AppendHeaders([
            (SET_COOKIE, cookie(&cookies.access_cookie_name, "", 0, &state.config)),
            (SET_COOKIE, cookie(&cookies.refresh_cookie_name, "", 0, &state.config)),
        ]),
        ApiResponse::ok("Logout successful", ()),
    )
}

/// Change password for the authenticated user
#[utoipa::path(
    post,
    path = "/authentication/password-change",
    request_body = ChangePasswordRequest,
    tag = "authentication",
    responses(
        (status = 200, description = "Password changed successfully"),
        (status = 401, description = "Current password is incorrect"),
        (status = 422, description = "New password rejected"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn change_password(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<ApiResponse<()>> {
    if request.new_password != request.confirm_new_password {
        return Err(Error::invalid_field("confirm_new_password", "does not match the new password"));
    }
    password::validate_password(&request.new_password, &state.config.auth.password)?;

    let user = state
        .store
        .get_user(current_user.id)
        .await?
        .ok_or(Error::Unauthenticated { message: None })?;
    if !password::verify_password(request.current_password, user.password_hash).await? {
        return Err(Error::Unauthenticated {
            message: Some("Current password is incorrect".to_string()),
        });
    }

    let password_hash = password::hash_password(request.new_password).await?;
    state
        .store
        .update_user(
            current_user.id,
            &UserUpdateDBRequest {
                password_hash: Some(password_hash),
                ..Default::default()
            },
        )
        .await?;
    tracing::info!(user_id = %current_user.id, "Password changed");

    Ok(ApiResponse::ok("Password changed successfully", ()))
}

#[cfg(test)]
mod tests {
    use crate::api::models::users::Role;
    use crate::test_utils::{create_test_app, login_as};
    use axum::http::StatusCode;
    use serde_json::{Value, json};

    #[tokio::test]
    async fn test_register_sets_cookies_and_rejects_duplicates() {
        let (server, _state) = create_test_app().await;
        let body = json!({
            "name": "Lan Nguyen",
            "email": "Lan@Example.com",
            "password": "correct-horse",
            "role": "customer",
        });

        let response = server.post("/api/v1/authentication/register").json(&body).await;
        response.assert_status(StatusCode::CREATED);
        let cookies: Vec<_> = response
            .headers()
            .get_all("set-cookie")
            .iter()
            .map(|v| v.to_str().unwrap().to_string())
            .collect();
        assert_eq!(cookies.len(), 2);
        assert!(cookies.iter().all(|c| c.contains("HttpOnly")));
        let json: Value = response.json();
        assert_eq!(json["data"]["user"]["email"], "lan@example.com");

        let response = server.post("/api/v1/authentication/register").json(&body).await;
        response.assert_status(StatusCode::CONFLICT);
        let json: Value = response.json();
        assert_eq!(json["code"], "conflict");
    }

    #[tokio::test]
    async fn test_register_cannot_claim_admin() {
        let (server, _state) = create_test_app().await;
        let response = server
            .post("/api/v1/authentication/register")
            .json(&json!({ "name": "Mallory", "email": "m@example.com", "password": "long-enough", "role": "admin" }))
            .await;
        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_login_failures_share_one_message() {
        let (server, _state) = create_test_app().await;
        server
            .post("/api/v1/authentication/register")
            .json(&json!({ "name": "Minh", "email": "minh@example.com", "password": "correct-horse", "role": "hotel_manager" }))
            .await
            .assert_status(StatusCode::CREATED);

        let attempts = [
            json!({ "email": "nobody@example.com", "password": "correct-horse", "role": "hotel_manager" }),
            json!({ "email": "minh@example.com", "password": "wrong-horse", "role": "hotel_manager" }),
            json!({ "email": "minh@example.com", "password": "correct-horse", "role": "customer" }),
        ];
        for attempt in attempts {
            let response = server.post("/api/v1/authentication/login").json(&attempt).await;
            response.assert_status(StatusCode::UNAUTHORIZED);
            let json: Value = response.json();
            assert_eq!(json["message"], "Email, password or role is incorrect");
        }

        let response = server
            .post("/api/v1/authentication/login")
            .json(&json!({ "email": "minh@example.com", "password": "correct-horse", "role": "hotel_manager" }))
            .await;
        response.assert_status_ok();
    }

    #[tokio::test]
    async fn test_refresh_and_password_change() {
        let (server, state) = create_test_app().await;
        let (user, token) = login_as(&state, Role::Customer).await;
        let tokens = crate::auth::session::issue_tokens(&user, &state.config).unwrap();

        let response = server
            .post("/api/v1/authentication/refresh")
            .add_header(
                "cookie",
                format!("{}={}", state.config.auth.cookies.refresh_cookie_name, tokens.refresh_token),
            )
            .await;
        response.assert_status_ok();

        // Access tokens cannot be used to refresh
        server
            .post("/api/v1/authentication/refresh")
            .add_header("cookie", format!("{}={}", state.config.auth.cookies.refresh_cookie_name, token))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);

        server
            .post("/api/v1/authentication/password-change")
            .authorization_bearer(&token)
            .json(&json!({ "current_password": "test-password", "new_password": "new-password-1", "confirm_new_password": "different" }))
            .await
            .assert_status(StatusCode::UNPROCESSABLE_ENTITY);

        server
            .post("/api/v1/authentication/password-change")
            .authorization_bearer(&token)
            .json(&json!({ "current_password": "test-password", "new_password": "new-password-1", "confirm_new_password": "new-password-1" }))
            .await
            .assert_status_ok();
    }
}
