// Error handling types for the API

use axum::{
    http::{header::WWW_AUTHENTICATE, HeaderValue, StatusCode},
    response::IntoResponse,
    Json,
};
use serde_json::json;
use std::fmt;
use tracing::error;

use super::validation::ValidationResult;

/// API error types
///
/// Each variant maps to a status code and an error `type` string in the
/// response envelope. Infrastructure details (SQL errors, upstream bodies)
/// are logged but never serialized to the client.
#[derive(Debug)]
pub enum ApiError {
    NotFound {
        resource: &'static str,
        identifier: String,
    },
    AlreadyExists {
        resource: &'static str,
        field: &'static str,
        value: String,
    },
    Validation {
        message: String,
        details: serde_json::Value,
    },
    Authentication(String),
    Authorization(String),
    BadRequest(String),
    Conflict(String),
    BadGateway(String),
    DatabaseError(sqlx::Error),
    InternalServer(String),
}

impl ApiError {
    /// Validation error attributed to a single field.
    pub fn validation_field(field: &str, message: &str) -> Self {
        ApiError::Validation {
            message: message.to_string(),
            details: json!({ "field": field }),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::NotFound {
                resource,
                identifier,
            } => write!(f, "Not Found: {} (ID: {})", resource, identifier),
            ApiError::AlreadyExists {
                resource,
                field,
                value,
            } => write!(f, "Already Exists: {} {} '{}'", resource, field, value),
            ApiError::Validation { message, .. } => write!(f, "Validation Error: {}", message),
            ApiError::Authentication(msg) => write!(f, "Authentication Error: {}", msg),
            ApiError::Authorization(msg) => write!(f, "Authorization Error: {}", msg),
            ApiError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::BadGateway(msg) => write!(f, "Bad Gateway: {}", msg),
            ApiError::DatabaseError(e) => write!(f, "Database Error: {}", e),
            ApiError::InternalServer(msg) => write!(f, "Internal Server Error: {}", msg),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message, error_type, details) = match self {
            ApiError::NotFound {
                resource,
                identifier,
            } => (
                StatusCode::NOT_FOUND,
                format!("{} no encontrado (ID: {})", resource, identifier),
                "NotFoundError",
                json!({ "resource": resource, "identifier": identifier }),
            ),
            ApiError::AlreadyExists {
                resource,
                field,
                value,
            } => (
                StatusCode::BAD_REQUEST,
                format!("{} con {} '{}' ya existe", resource, field, value),
                "AlreadyExistsError",
                json!({ "resource": resource, "field": field, "value": value }),
            ),
            ApiError::Validation { message, details } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                message,
                "ValidationError",
                details,
            ),
            ApiError::Authentication(msg) => (
                StatusCode::UNAUTHORIZED,
                msg,
                "AuthenticationError",
                json!({}),
            ),
            ApiError::Authorization(msg) => {
                (StatusCode::FORBIDDEN, msg, "AuthorizationError", json!({}))
            }
            ApiError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, msg, "BadRequestError", json!({}))
            }
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg, "ConflictError", json!({})),
            ApiError::BadGateway(msg) => {
                (StatusCode::BAD_GATEWAY, msg, "BadGatewayError", json!({}))
            }
            ApiError::DatabaseError(e) => {
                error!(error = %e, "Database error occurred");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Error en la base de datos".to_string(),
                    "DatabaseError",
                    json!({}),
                )
            }
            ApiError::InternalServer(msg) => {
                error!(message = %msg, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Error interno del servidor".to_string(),
                    "InternalError",
                    json!({}),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "message": message,
                "type": error_type,
                "details": details,
            }
        }));

        let mut response = (status, body).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

/// Helper function to convert ValidationResult to ApiError
impl From<ValidationResult> for ApiError {
    fn from(result: ValidationResult) -> Self {
        if result.is_valid {
            return ApiError::InternalServer(
                "Validation result was valid but converted to error".to_string(),
            );
        }
        let message = result
            .errors
            .first()
            .map(|e| e.message.clone())
            .unwrap_or_else(|| "Error de validación en los datos enviados".to_string());
        let errors: Vec<serde_json::Value> = result
            .errors
            .iter()
            .map(|e| json!({ "field": e.field, "message": e.message }))
            .collect();
        let field = result.errors.first().map(|e| e.field.clone());
        ApiError::Validation {
            message,
            details: json!({ "field": field, "errors": errors }),
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        ApiError::DatabaseError(e)
    }
}
