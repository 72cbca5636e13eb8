use crate::{
    AppState,
    api::models::users::CurrentUser,
    auth::session::{self, TokenKind},
    errors::{Error, Result},
};
use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, request::Parts},
};
use tracing::{debug, instrument, trace};

/// Find a named cookie in the request's `Cookie` headers
pub fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(axum::http::header::COOKIE)
        .iter()
        .filter_map(|header| header.to_str().ok())
        .flat_map(|header| header.split(';'))
        .filter_map(|cookie| cookie.trim().split_once('='))
        .find(|(cookie_name, _)| *cookie_name == name)
        .map(|(_, value)| value)
}

/// Access token from `Authorization: Bearer` or the access cookie.
/// Returns:
/// - None: no credentials present
/// - Some(token): a token to verify
fn access_token<'a>(parts: &'a Parts, state: &AppState) -> Option<&'a str> {
    let bearer = parts
        .headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "));
    bearer.or_else(|| cookie_value(&parts.headers, &state.config.auth.cookies.access_cookie_name))
}

/// Resolves a verified token subject to a live account. Deleted or deactivated accounts lose
/// access immediately, whatever their token says.
#[instrument(skip(state))]
pub async fn load_active_user(state: &AppState, user_id: crate::types::UserId) -> Result<CurrentUser> {
    match state.store.get_user(user_id).await? {
        Some(user) if user.is_active => Ok(CurrentUser::from(user)),
        Some(_) => {
            debug!("Token presented for deactivated user {}", user_id);
            Err(Error::Unauthenticated {
                message: Some("Account is deactivated".to_string()),
            })
        }
        None => Err(Error::Unauthenticated { message: None }),
    }
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Error;

    #[instrument(skip(parts, state))]
    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let Some(token) = access_token(parts, state) else {
            trace!("No authentication credentials found in request");
            return Err(Error::Unauthenticated { message: None });
        };

        let claims = session::verify_token(token, TokenKind::Access, &state.config)?;
        let user = load_active_user(state, claims.sub).await?;
        debug!("Authenticated user: {}", user.id);
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::users::Role;
    use crate::db::models::users::UserUpdateDBRequest;
    use crate::test_utils::{create_test_state, create_test_user, current_user};

    fn parts_with_header(name: &str, value: &str) -> Parts {
        let request = axum::http::Request::builder()
            .uri("http://localhost/test")
            .header(name, value)
            .body(())
            .unwrap();
        request.into_parts().0
    }

    #[tokio::test]
    async fn test_bearer_and_cookie_authentication() {
        let state = create_test_state();
        let user = create_test_user(state.store.as_ref(), Role::Customer).await;
        let tokens = session::issue_tokens(&current_user(&user), &state.config).unwrap();

        let mut parts = parts_with_header("authorization", &format!("Bearer {}", tokens.access_token));
        let extracted = CurrentUser::from_request_parts(&mut parts, &state).await.unwrap();
        assert_eq!(extracted.id, user.id);

        let cookie = format!("other=1; {}={}", state.config.auth.cookies.access_cookie_name, tokens.access_token);
        let mut parts = parts_with_header("cookie", &cookie);
        let extracted = CurrentUser::from_request_parts(&mut parts, &state).await.unwrap();
        assert_eq!(extracted.email, user.email);
    }

    #[tokio::test]
    async fn test_missing_or_refresh_token_is_unauthorized() {
        let state = create_test_state();
        let user = create_test_user(state.store.as_ref(), Role::Customer).await;

        let (mut parts, _) = axum::http::Request::builder().uri("/").body(()).unwrap().into_parts();
        let err = CurrentUser::from_request_parts(&mut parts, &state).await.unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::UNAUTHORIZED);

        let tokens = session::issue_tokens(&current_user(&user), &state.config).unwrap();
        let mut parts = parts_with_header("authorization", &format!("Bearer {}", tokens.refresh_token));
        assert!(CurrentUser::from_request_parts(&mut parts, &state).await.is_err());
    }

    #[tokio::test]
    async fn test_deactivated_user_rejected() {
        let state = create_test_state();
        let user = create_test_user(state.store.as_ref(), Role::HotelManager).await;
        let tokens = session::issue_tokens(&current_user(&user), &state.config).unwrap();
        state
            .store
            .update_user(
                user.id,
                &UserUpdateDBRequest {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let mut parts = parts_with_header("authorization", &format!("Bearer {}", tokens.access_token));
        let err = CurrentUser::from_request_parts(&mut parts, &state).await.unwrap_err();
        assert!(matches!(err, Error::Unauthenticated { .. }));
    }

    #[test]
    fn test_cookie_value_parsing() {
        let parts = parts_with_header("cookie", "a=1; hotelctl_access=tok; b=2");
        assert_eq!(cookie_value(&parts.headers, "hotelctl_access"), Some("tok"));
        assert_eq!(cookie_value(&parts.headers, "missing"), None);
    }
}
