use crate::db::errors::DbError;
use crate::db::models::bookings::BookingStatus;
use crate::types::{Operation, Permission};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;
use utoipa::ToSchema;

#[derive(ThisError, Debug)]
pub enum Error {
    /// Authentication required but not provided
    #[error("Not authenticated")]
    Unauthenticated { message: Option<String> },

    /// User lacks required permissions for the operation
    #[error("Insufficient permissions to {action:?} {resource}")]
    InsufficientPermissions {
        required: Permission,
        action: Operation,
        resource: String,
    },

    /// Malformed or missing input, reported per field where possible
    #[error("{message}")]
    ValidationFailed { message: String, fields: Vec<FieldError> },

    /// Requested resource not found
    #[error("{resource} with ID {id} not found")]
    NotFound { resource: String, id: String },

    /// Hold or booking asks for more rooms than are free over the stay
    #[error("Requested {requested} room(s) but only {available} available")]
    InsufficientInventory { requested: i64, available: i64 },

    /// Illegal booking status change
    #[error("Cannot move booking from {from} to {to}")]
    InvalidTransition { from: BookingStatus, to: BookingStatus },

    /// Conflict error, e.g., for unique constraint violations
    #[error("Conflict: {message}")]
    Conflict { message: String },

    /// External collaborator (sync target, face recognition) unreachable or erroring
    #[error("{service} failed: {message}")]
    UpstreamFailure { service: String, message: String },

    /// Generic internal service error
    #[error("Failed to {operation}")]
    Internal { operation: String },

    /// Database operation error
    #[error(transparent)]
    Database(#[from] DbError),

    /// Unexpected error with full context chain
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// A single field-level validation message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Error envelope rendered for every failed request.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub success: bool,
    pub status: u16,
    /// Stable machine-readable category
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FieldError>,
}

impl Error {
    /// Validation failure without field detail
    pub fn validation(message: impl Into<String>) -> Self {
        Error::ValidationFailed {
            message: message.into(),
            fields: Vec::new(),
        }
    }

    /// Validation failure for a single field
    pub fn invalid_field(field: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        Error::ValidationFailed {
            message: format!("Invalid {field}: {message}"),
            fields: vec![FieldError {
                field: field.to_string(),
                message,
            }],
        }
    }

    pub fn not_found(resource: &str, id: impl ToString) -> Self {
        Error::NotFound {
            resource: resource.to_string(),
            id: id.to_string(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Unauthenticated { .. } => StatusCode::UNAUTHORIZED,
            Error::InsufficientPermissions { .. } => StatusCode::FORBIDDEN,
            Error::ValidationFailed { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::InsufficientInventory { .. } | Error::InvalidTransition { .. } | Error::Conflict { .. } => StatusCode::CONFLICT,
            Error::UpstreamFailure { .. } => StatusCode::BAD_GATEWAY,
            Error::Internal { .. } | Error::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Database(db_err) => match db_err {
                DbError::NotFound => StatusCode::NOT_FOUND,
                DbError::UniqueViolation { .. } | DbError::ForeignKeyViolation { .. } => StatusCode::CONFLICT,
                DbError::CheckViolation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                DbError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    /// Stable category string clients can match on
    pub fn code(&self) -> &'static str {
        match self {
            Error::Unauthenticated { .. } => "unauthorized",
            Error::InsufficientPermissions { .. } => "forbidden",
            Error::ValidationFailed { .. } => "validation_failed",
            Error::NotFound { .. } => "not_found",
            Error::InsufficientInventory { .. } => "insufficient_inventory",
            Error::InvalidTransition { .. } => "invalid_transition",
            Error::Conflict { .. } => "conflict",
            Error::UpstreamFailure { .. } => "upstream_failure",
            Error::Internal { .. } | Error::Other(_) => "internal_error",
            Error::Database(db_err) => match db_err {
                DbError::NotFound => "not_found",
                DbError::UniqueViolation { .. } | DbError::ForeignKeyViolation { .. } => "conflict",
                DbError::CheckViolation { .. } => "validation_failed",
                DbError::Other(_) => "internal_error",
            },
        }
    }

    /// Returns a user-safe error message, without leaking internal implementation details
    pub fn user_message(&self) -> String {
        match self {
            Error::Unauthenticated { message } => message.clone().unwrap_or_else(|| "Authentication required".to_string()),
            Error::InsufficientPermissions { action, resource, .. } => {
                format!("Insufficient permissions to {action} {resource}")
            }
            Error::ValidationFailed { message, .. } => message.clone(),
            Error::NotFound { resource, id } => format!("{resource} with ID {id} not found"),
            Error::InsufficientInventory { requested, available } => {
                format!("Not enough rooms available: requested {requested}, available {available}")
            }
            Error::InvalidTransition { from, to } => format!("Booking cannot move from {from} to {to}"),
            Error::Conflict { message } => message.clone(),
            Error::UpstreamFailure { service, .. } => format!("{service} is currently unavailable"),
            Error::Internal { .. } | Error::Other(_) => "Internal server error".to_string(),
            Error::Database(db_err) => match db_err {
                DbError::NotFound => "Resource not found".to_string(),
                DbError::UniqueViolation { constraint, table, .. } => match (table.as_deref(), constraint.as_deref()) {
                    (Some("users"), Some(c)) if c.contains("email") => "An account with this email address already exists".to_string(),
                    (Some("hotels"), _) => "A hotel with this name and address already exists".to_string(),
                    (Some("room_types"), _) => "A room type with this name already exists in the hotel".to_string(),
                    (Some("rooms"), _) => "A room with this number already exists for the room type".to_string(),
                    (Some("promo_codes"), _) => "This promo code already exists".to_string(),
                    (Some("reviews"), _) => "You have already reviewed this hotel".to_string(),
                    _ => "Resource already exists".to_string(),
                },
                DbError::ForeignKeyViolation { .. } => "Resource is still referenced by other records".to_string(),
                DbError::CheckViolation { .. } => "Invalid data provided".to_string(),
                DbError::Other(_) => "Database error occurred".to_string(),
            },
        }
    }

    fn field_errors(&self) -> Vec<FieldError> {
        match self {
            Error::ValidationFailed { fields, .. } => fields.clone(),
            _ => Vec::new(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        // Log full error details for debugging - different log levels based on severity
        match &self {
            Error::Database(DbError::Other(_)) | Error::Internal { .. } | Error::Other(_) => {
                tracing::error!("Internal service error: {:#}", self);
            }
            Error::Database(_) => {
                tracing::warn!("Database constraint error: {}", self);
            }
            Error::UpstreamFailure { .. } => {
                tracing::warn!("Upstream error: {}", self);
            }
            Error::Unauthenticated { .. } | Error::InsufficientPermissions { .. } => {
                tracing::info!("Authorization error: {}", self);
            }
            Error::ValidationFailed { .. } | Error::NotFound { .. } => {
                tracing::debug!("Client error: {}", self);
            }
            Error::Conflict { .. } | Error::InsufficientInventory { .. } | Error::InvalidTransition { .. } => {
                tracing::warn!("Conflict error: {}", self);
            }
        }

        let status = self.status_code();
        let body = ErrorBody {
            success: false,
            status: status.as_u16(),
            code: self.code().to_string(),
            message: self.user_message(),
            errors: self.field_errors(),
        };

        (status, Json(body)).into_response()
    }
}

/// Convert from String errors (e.g., from external functions)
impl From<String> for Error {
    fn from(msg: String) -> Self {
        Error::Internal { operation: msg }
    }
}

/// Type alias for service operation results
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_and_code_mapping() {
        let cases = vec![
            (Error::Unauthenticated { message: None }, StatusCode::UNAUTHORIZED, "unauthorized"),
            (Error::validation("bad"), StatusCode::UNPROCESSABLE_ENTITY, "validation_failed"),
            (Error::not_found("Booking", "abc"), StatusCode::NOT_FOUND, "not_found"),
            (
                Error::InsufficientInventory { requested: 2, available: 1 },
                StatusCode::CONFLICT,
                "insufficient_inventory",
            ),
            (
                Error::InvalidTransition {
                    from: BookingStatus::CheckedOut,
                    to: BookingStatus::Cancelled,
                },
                StatusCode::CONFLICT,
                "invalid_transition",
            ),
            (
                Error::UpstreamFailure {
                    service: "sync target".to_string(),
                    message: "timeout".to_string(),
                },
                StatusCode::BAD_GATEWAY,
                "upstream_failure",
            ),
            (
                Error::Internal {
                    operation: "do a thing".to_string(),
                },
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
            ),
        ];

        for (error, status, code) in cases {
            assert_eq!(error.status_code(), status, "status for {error:?}");
            assert_eq!(error.code(), code, "code for {error:?}");
        }
    }

    #[test]
    fn test_internal_details_not_leaked() {
        let error = Error::Internal {
            operation: "connect to db at postgres://secret".to_string(),
        };
        assert_eq!(error.user_message(), "Internal server error");
    }

    #[test]
    fn test_unique_violation_message() {
        let error = Error::Database(DbError::UniqueViolation {
            constraint: Some("users_email_key".to_string()),
            table: Some("users".to_string()),
            message: "duplicate key".to_string(),
        });
        assert_eq!(error.status_code(), StatusCode::CONFLICT);
        assert_eq!(error.user_message(), "An account with this email address already exists");
    }

    #[tokio::test]
    async fn test_error_envelope_shape() {
        let response = Error::invalid_field("email", "must not be empty").into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: ErrorBody = serde_json::from_slice(&bytes).unwrap();
        assert!(!body.success);
        assert_eq!(body.status, 422);
        assert_eq!(body.code, "validation_failed");
        assert_eq!(body.errors.len(), 1);
        assert_eq!(body.errors[0].field, "email");
    }
}
