//! # Error Handling
//!
//! This module provides unified error handling for the Waaed platform API,
//! implementing a consistent problem+json response format with trace ID
//! propagation.

use axum::{
    extract::rejection::JsonRejection,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::telemetry;

/// Unified API error response structure
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ApiError {
    /// HTTP status code for the response
    #[serde(skip_serializing, skip_deserializing)]
    pub status: StatusCode,
    /// Error code for programmatic handling
    pub code: Box<str>,
    /// Human-readable error message
    pub message: Box<str>,
    /// Additional error details (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Box<serde_json::Value>>,
    /// Correlation trace ID for debugging (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<Box<str>>,
}

impl ApiError {
    /// Create a new API error with the given status code and message
    pub fn new<S: Into<String>>(status: StatusCode, code: S, message: S) -> Self {
        Self {
            status,
            code: code.into().into_boxed_str(),
            message: message.into().into_boxed_str(),
            details: None,
            trace_id: Self::current_trace_id(),
        }
    }

    /// Add details to the error
    pub fn with_details<V: Into<serde_json::Value>>(mut self, details: V) -> Self {
        self.details = Some(Box::new(details.into()));
        self
    }

    /// Extract current trace ID from the active request context (falls back
    /// to a generated correlation ID)
    fn current_trace_id() -> Option<Box<str>> {
        telemetry::current_trace_id()
            .map(|trace_id| trace_id.into_boxed_str())
            .or_else(|| {
                Some(format!("corr-{}", &uuid::Uuid::new_v4().to_string()[..8]).into_boxed_str())
            })
    }
}

fn is_unique_violation(error: &sea_orm::DbErr) -> bool {
    use sea_orm::RuntimeErr;

    const PG_UNIQUE: &str = "23505";
    const SQLITE_DUPLICATE_CODES: &[&str] = &["1555", "2067"];

    let runtime_err = match error {
        sea_orm::DbErr::Query(RuntimeErr::SqlxError(sqlx_err))
        | sea_orm::DbErr::Exec(RuntimeErr::SqlxError(sqlx_err)) => sqlx_err,
        _ => return false,
    };

    let Some(db_error) = runtime_err.as_database_error() else {
        return false;
    };

    if db_error.is_unique_violation() {
        return true;
    }

    if let Some(code) = db_error.code() {
        let code_str = code.as_ref();
        if code_str == PG_UNIQUE || SQLITE_DUPLICATE_CODES.contains(&code_str) {
            return true;
        }
    }

    false
}

fn is_foreign_key_violation(error: &sea_orm::DbErr) -> bool {
    use sea_orm::RuntimeErr;

    let runtime_err = match error {
        sea_orm::DbErr::Query(RuntimeErr::SqlxError(sqlx_err))
        | sea_orm::DbErr::Exec(RuntimeErr::SqlxError(sqlx_err)) => sqlx_err,
        _ => return false,
    };

    runtime_err
        .as_database_error()
        .map(|db_error| db_error.is_foreign_key_violation())
        .unwrap_or(false)
}

/// Standard error types with predefined status codes
#[derive(Debug, Error)]
pub enum ErrorType {
    #[error("Bad Request")]
    BadRequest,
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Forbidden")]
    Forbidden,
    #[error("Not Found")]
    NotFound,
    #[error("Conflict")]
    Conflict,
    #[error("Internal Server Error")]
    InternalServerError,
    #[error("Service Unavailable")]
    ServiceUnavailable,
}

impl ErrorType {
    /// Get the appropriate HTTP status code for this error type
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorType::BadRequest => StatusCode::BAD_REQUEST,
            ErrorType::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorType::Forbidden => StatusCode::FORBIDDEN,
            ErrorType::NotFound => StatusCode::NOT_FOUND,
            ErrorType::Conflict => StatusCode::CONFLICT,
            ErrorType::InternalServerError => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorType::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Get the error code string for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            ErrorType::BadRequest => "VALIDATION_FAILED",
            ErrorType::Unauthorized => "UNAUTHORIZED",
            ErrorType::Forbidden => "FORBIDDEN",
            ErrorType::NotFound => "NOT_FOUND",
            ErrorType::Conflict => "CONFLICT",
            ErrorType::InternalServerError => "INTERNAL_SERVER_ERROR",
            ErrorType::ServiceUnavailable => "SERVICE_UNAVAILABLE",
        }
    }
}

/// Errors surfaced by the repository layer
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sea_orm::DbErr),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Wrap a SeaORM error as a repository database error
    pub fn database_error(error: sea_orm::DbErr) -> Self {
        RepositoryError::Database(error)
    }

    /// Create a validation error with the given message
    pub fn validation_error<S: Into<String>>(message: S) -> Self {
        RepositoryError::Validation(message.into())
    }

    /// Create a not-found error for a named entity
    pub fn not_found<S: Into<String>>(message: S) -> Self {
        RepositoryError::NotFound(message.into())
    }

    /// Create a conflict error with the given message
    pub fn conflict<S: Into<String>>(message: S) -> Self {
        RepositoryError::Conflict(message.into())
    }
}

impl From<RepositoryError> for ApiError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::NotFound(message) => {
                Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", &message)
            }
            RepositoryError::Validation(message) => {
                Self::new(StatusCode::BAD_REQUEST, "VALIDATION_FAILED", &message)
            }
            RepositoryError::Conflict(message) => {
                Self::new(StatusCode::CONFLICT, "CONFLICT", &message)
            }
            RepositoryError::Database(db_err) => db_err.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut headers = HeaderMap::new();
        headers.insert(
            "content-type",
            HeaderValue::from_static("application/problem+json"),
        );

        (self.status, headers, axum::Json(self)).into_response()
    }
}

// Error mappers for common sources

impl From<ErrorType> for ApiError {
    fn from(error_type: ErrorType) -> Self {
        Self::new(
            error_type.status_code(),
            error_type.error_code(),
            &error_type.to_string(),
        )
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(error: anyhow::Error) -> Self {
        tracing::error!("Internal error: {:?}", error);

        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL_SERVER_ERROR",
            "An internal error occurred",
        )
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        let message = match rejection {
            JsonRejection::JsonDataError(err) => format!("Invalid JSON: {}", err),
            JsonRejection::JsonSyntaxError(err) => format!("JSON syntax error: {}", err),
            JsonRejection::MissingJsonContentType(_) => {
                "Missing 'Content-Type: application/json' header".to_string()
            }
            _ => "Invalid request body".to_string(),
        };

        Self::new(StatusCode::BAD_REQUEST, "VALIDATION_FAILED", &message)
    }
}

impl From<sea_orm::DbErr> for ApiError {
    fn from(error: sea_orm::DbErr) -> Self {
        if is_unique_violation(&error) {
            tracing::debug!(?error, "Unique constraint violation detected");
            return Self::new(StatusCode::CONFLICT, "CONFLICT", "Resource already exists");
        }

        if is_foreign_key_violation(&error) {
            tracing::debug!(?error, "Foreign key violation detected");
            return Self::new(
                StatusCode::CONFLICT,
                "CONFLICT",
                "Resource is still referenced by other records",
            );
        }

        match error {
            sea_orm::DbErr::RecordNotFound(record) => Self::new(
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                &format!("Record not found: {}", record),
            ),
            sea_orm::DbErr::Conn(connection_err) => {
                tracing::error!("Database connection error: {:?}", connection_err);
                Self::new(
                    StatusCode::SERVICE_UNAVAILABLE,
                    "SERVICE_UNAVAILABLE",
                    "Database service unavailable",
                )
            }
            _ => {
                tracing::error!("Database error: {:?}", error);
                Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_SERVER_ERROR",
                    "Database error occurred",
                )
            }
        }
    }
}

/// Create an unauthorized error (401)
pub fn unauthorized(message: Option<&str>) -> ApiError {
    let msg = message.unwrap_or("Authentication required");
    ApiError::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg)
}

/// Create an unauthorized error (401) with explicit trace_id
pub fn unauthorized_with_trace_id(message: Option<&str>, trace_id: String) -> ApiError {
    let msg = message.unwrap_or("Authentication required");
    let mut error = ApiError::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg);
    error.trace_id = Some(trace_id.into_boxed_str());
    error
}

/// Create a forbidden error (403)
pub fn forbidden(message: Option<&str>) -> ApiError {
    let msg = message.unwrap_or("Insufficient permissions");
    ApiError::new(StatusCode::FORBIDDEN, "FORBIDDEN", msg)
}

/// Create a not-found error (404) for a named entity
pub fn not_found(entity: &str) -> ApiError {
    ApiError::new(
        StatusCode::NOT_FOUND,
        "NOT_FOUND",
        &format!("{} not found", entity),
    )
}

/// Create a conflict error (409)
pub fn conflict(message: &str) -> ApiError {
    ApiError::new(StatusCode::CONFLICT, "CONFLICT", message)
}

/// Create a validation error with field details
pub fn validation_error(message: &str, field_errors: serde_json::Value) -> ApiError {
    ApiError::new(StatusCode::BAD_REQUEST, "VALIDATION_FAILED", message).with_details(field_errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use serde_json::json;

    #[test]
    fn test_api_error_basic() {
        let error = ApiError::new(
            StatusCode::BAD_REQUEST,
            "VALIDATION_FAILED",
            "Test error message",
        );

        assert_eq!(error.code, Box::from("VALIDATION_FAILED"));
        assert_eq!(error.message, Box::from("Test error message"));
        assert_eq!(error.details, None);
    }

    #[test]
    fn test_api_error_with_details() {
        let error = ApiError::new(StatusCode::BAD_REQUEST, "BAD_REQUEST", "Test error message")
            .with_details(json!({"field": "value"}));

        assert_eq!(error.details, Some(Box::new(json!({"field": "value"}))));
    }

    #[test]
    fn test_error_type_mapping() {
        let not_found_error: ApiError = ErrorType::NotFound.into();
        assert_eq!(not_found_error.code, Box::from("NOT_FOUND"));
        assert_eq!(not_found_error.message, Box::from("Not Found"));
    }

    #[test]
    fn test_from_anyhow() {
        let anyhow_error = anyhow::anyhow!("Something went wrong");
        let api_error: ApiError = anyhow_error.into();

        assert_eq!(api_error.code, Box::from("INTERNAL_SERVER_ERROR"));
        assert_eq!(api_error.message, Box::from("An internal error occurred"));
    }

    #[test]
    fn test_repository_error_mapping() {
        let missing: ApiError = RepositoryError::not_found("User not found").into();
        assert_eq!(missing.status, StatusCode::NOT_FOUND);
        assert_eq!(missing.message, Box::from("User not found"));

        let validation: ApiError = RepositoryError::validation_error("Name cannot be empty").into();
        assert_eq!(validation.status, StatusCode::BAD_REQUEST);
        assert_eq!(validation.code, Box::from("VALIDATION_FAILED"));

        let conflict_err: ApiError = RepositoryError::conflict("Duplicate subdomain").into();
        assert_eq!(conflict_err.status, StatusCode::CONFLICT);
        assert_eq!(conflict_err.code, Box::from("CONFLICT"));
    }

    #[test]
    fn test_content_type_header() {
        let error = ApiError::new(StatusCode::BAD_REQUEST, "VALIDATION_FAILED", "Test error");

        let response = error.into_response();

        assert_eq!(
            response.headers().get("content-type").unwrap(),
            "application/problem+json"
        );
    }

    #[test]
    fn test_status_code_preservation() {
        let error = ApiError::new(StatusCode::CONFLICT, "CONFLICT", "Resource already exists");

        let response = error.into_response();

        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_trace_id_generation() {
        let error = ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL_SERVER_ERROR",
            "Test error",
        );

        assert!(error.trace_id.is_some());
        let trace_id = error.trace_id.unwrap();
        assert!(trace_id.starts_with("corr-"));
        assert_eq!(trace_id.len(), 13); // "corr-" + 8 chars
    }

    #[test]
    fn test_database_error_mapping() {
        let db_error = sea_orm::DbErr::RecordNotFound("leave_request".to_string());
        let api_error: ApiError = db_error.into();

        assert_eq!(api_error.status, StatusCode::NOT_FOUND);
        assert_eq!(api_error.code, Box::from("NOT_FOUND"));
        assert!(api_error.message.contains("leave_request"));
    }

    #[test]
    fn test_auth_error_helpers() {
        let auth_error = unauthorized(None);
        assert_eq!(auth_error.status, StatusCode::UNAUTHORIZED);
        assert_eq!(auth_error.code, Box::from("UNAUTHORIZED"));
        assert_eq!(auth_error.message, Box::from("Authentication required"));

        let custom_auth_error = unauthorized(Some("Invalid token"));
        assert_eq!(custom_auth_error.message, Box::from("Invalid token"));

        let forbidden_error = forbidden(None);
        assert_eq!(forbidden_error.status, StatusCode::FORBIDDEN);
        assert_eq!(forbidden_error.code, Box::from("FORBIDDEN"));
    }

    #[test]
    fn test_validation_error_with_details() {
        let field_errors = json!({
            "name": "Name is required",
            "email": "Invalid email format"
        });

        let validation_err = validation_error("Validation failed", field_errors.clone());

        assert_eq!(validation_err.status, StatusCode::BAD_REQUEST);
        assert_eq!(validation_err.code, Box::from("VALIDATION_FAILED"));
        assert_eq!(validation_err.details, Some(Box::new(field_errors)));
        assert!(validation_err.trace_id.is_some());
    }
}
