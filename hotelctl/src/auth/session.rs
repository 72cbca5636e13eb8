//! JWT access and refresh tokens.

use chrono::{DateTime, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::{
    api::models::users::{CurrentUser, Role},
    config::Config,
    errors::Error,
    types::UserId,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// JWT session claims
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: UserId,     // Subject (user ID)
    pub role: Role,      // Role at issue time
    pub kind: TokenKind, // Access or refresh
    pub exp: i64,        // Expiration time
    pub iat: i64,        // Issued at
}

/// A freshly issued access/refresh pair
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub access_expires_at: DateTime<Utc>,
    pub refresh_token: String,
    pub refresh_expires_at: DateTime<Utc>,
}

fn secret(config: &Config) -> Result<&[u8], Error> {
    config
        .secret_key
        .as_deref()
        .map(str::as_bytes)
        .ok_or_else(|| Error::Internal {
            operation: "JWT sessions: secret_key is required".to_string(),
        })
}

fn create_token(user: &CurrentUser, kind: TokenKind, config: &Config, now: DateTime<Utc>) -> Result<(String, DateTime<Utc>), Error> {
    let lifetime = match kind {
        TokenKind::Access => config.auth.access_token_expiry,
        TokenKind::Refresh => config.auth.refresh_token_expiry,
    };
    let expires_at = now + lifetime;
    let claims = SessionClaims {
        sub: user.id,
        role: user.role,
        kind,
        exp: expires_at.timestamp(),
        iat: now.timestamp(),
    };

    let token = encode(&Header::default(), &claims, &EncodingKey::from_secret(secret(config)?)).map_err(|e| Error::Internal {
        operation: format!("create JWT: {e}"),
    })?;
    Ok((token, expires_at))
}

/// Issue a new access/refresh pair for a user
pub fn issue_tokens(user: &CurrentUser, config: &Config) -> Result<TokenPair, Error> {
    let now = Utc::now();
    let (access_token, access_expires_at) = create_token(user, TokenKind::Access, config, now)?;
    let (refresh_token, refresh_expires_at) = create_token(user, TokenKind::Refresh, config, now)?;
    Ok(TokenPair {
        access_token,
        access_expires_at,
        refresh_token,
        refresh_expires_at,
    })
}

/// Verify a token's signature, expiry and kind
pub fn verify_token(token: &str, expected: TokenKind, config: &Config) -> Result<SessionClaims, Error> {
    let key = DecodingKey::from_secret(secret(config)?);
    let validation = Validation::default();

    let token_data = decode::<SessionClaims>(token, &key, &validation).map_err(|e| match e.kind() {
        // Client errors (401) - malformed tokens, invalid claims, expired tokens
        jsonwebtoken::errors::ErrorKind::InvalidToken
        | jsonwebtoken::errors::ErrorKind::InvalidSignature
        | jsonwebtoken::errors::ErrorKind::ExpiredSignature
        | jsonwebtoken::errors::ErrorKind::MissingRequiredClaim(_)
        | jsonwebtoken::errors::ErrorKind::InvalidIssuer
        | jsonwebtoken::errors::ErrorKind::InvalidAudience
        | jsonwebtoken::errors::ErrorKind::InvalidSubject
        | jsonwebtoken::errors::ErrorKind::ImmatureSignature
        | jsonwebtoken::errors::ErrorKind::Base64(_)
        | jsonwebtoken::errors::ErrorKind::Json(_)
        | jsonwebtoken::errors::ErrorKind::Utf8(_)
        | jsonwebtoken::errors::ErrorKind::InvalidAlgorithm => Error::Unauthenticated { message: None },

        // Server errors (500) - key issues, internal failures
        _ => Error::Internal {
            operation: format!("JWT verification: {e}"),
        },
    })?;

    if token_data.claims.kind != expected {
        return Err(Error::Unauthenticated {
            message: Some("Wrong token type".to_string()),
        });
    }
    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::create_test_config;
    use uuid::Uuid;

    fn create_test_user() -> CurrentUser {
        CurrentUser {
            id: Uuid::new_v4(),
            name: "Test User".to_string(),
            email: "test@example.com".to_string(),
            role: Role::Customer,
        }
    }

    #[test]
    fn test_issue_and_verify_tokens() {
        let config = create_test_config();
        let user = create_test_user();

        let pair = issue_tokens(&user, &config).unwrap();
        assert!(pair.refresh_expires_at > pair.access_expires_at);

        let claims = verify_token(&pair.access_token, TokenKind::Access, &config).unwrap();
        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.role, Role::Customer);

        let claims = verify_token(&pair.refresh_token, TokenKind::Refresh, &config).unwrap();
        assert_eq!(claims.kind, TokenKind::Refresh);
    }

    #[test]
    fn test_token_kinds_are_not_interchangeable() {
        let config = create_test_config();
        let pair = issue_tokens(&create_test_user(), &config).unwrap();

        let err = verify_token(&pair.refresh_token, TokenKind::Access, &config).unwrap_err();
        assert!(matches!(err, Error::Unauthenticated { .. }));
        let err = verify_token(&pair.access_token, TokenKind::Refresh, &config).unwrap_err();
        assert!(matches!(err, Error::Unauthenticated { .. }));
    }

    #[test]
    fn test_verify_token_wrong_secret() {
        let mut config = create_test_config();
        let pair = issue_tokens(&create_test_user(), &config).unwrap();

        config.secret_key = Some("different-secret".to_string());
        let result = verify_token(&pair.access_token, TokenKind::Access, &config);
        // Should be Unauthenticated (InvalidSignature), not Internal error
        assert!(matches!(result.unwrap_err(), Error::Unauthenticated { .. }));
    }

    #[test]
    fn test_verify_expired_token() {
        let config = create_test_config();
        let user = create_test_user();

        let (token, _) = create_token(&user, TokenKind::Access, &config, Utc::now() - chrono::Duration::hours(3)).unwrap();
        let result = verify_token(&token, TokenKind::Access, &config);
        assert!(matches!(result.unwrap_err(), Error::Unauthenticated { .. }));
    }

    #[test]
    fn test_verify_malformed_token() {
        let config = create_test_config();

        for token in ["not.a.token", "invalid", "", "too.many.parts.in.this.token"] {
            let result = verify_token(token, TokenKind::Access, &config);
            assert!(
                matches!(result.unwrap_err(), Error::Unauthenticated { .. }),
                "Expected Unauthenticated error for token: {}",
                token
            );
        }
    }
}
