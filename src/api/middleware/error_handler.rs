//! Turns [`AppError`] into JSON error responses.
//!
//! | variant            | status |
//! |--------------------|--------|
//! | `NotFound`         | 404    |
//! | `Duplicate`        | 400    |
//! | `Validation*`      | 400    |
//! | `BadRequest`       | 400    |
//! | `Unauthorized`     | 401    |
//! | `Forbidden`        | 403    |
//! | `ConnectionPool`   | 503    |
//! | everything else    | 500    |
//!
//! Server-side sources are logged here and never sent to the client.

use axum::{
    Json,
    body::{Body, to_bytes},
    extract::Request,
    http::{HeaderValue, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::{Map, Value};

use super::RequestId;
use crate::api::dto::ErrorResponse;
use crate::error::{AppError, ValidationFieldError};

/// Error bodies larger than this are replaced by a generic one.
const MAX_ERROR_BODY: usize = 64 * 1024;

pub fn error_to_status_code(error: &AppError) -> StatusCode {
    match error {
        AppError::NotFound { .. } => StatusCode::NOT_FOUND,
        AppError::Duplicate { .. }
        | AppError::Validation { .. }
        | AppError::ValidationErrors { .. }
        | AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
        AppError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
        AppError::Forbidden { .. } => StatusCode::FORBIDDEN,
        AppError::ConnectionPool { .. } => StatusCode::SERVICE_UNAVAILABLE,
        AppError::Database { .. } | AppError::Configuration { .. } | AppError::Internal { .. } => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = error_to_status_code(&self);
        let body = match &self {
            AppError::NotFound { entity, .. } => {
                ErrorResponse::new("NOT_FOUND", &format!("{} not found.", capitalize(entity)))
            }
            AppError::Duplicate { entity, field, value } => ErrorResponse::new(
                "DUPLICATE",
                &format!("{} with this {} already exists.", capitalize(entity), field),
            )
            .with_details(field_details(field, format!("'{value}' is already in use."))),
            AppError::Validation { field, reason } => {
                ErrorResponse::new("VALIDATION_ERROR", reason)
                    .with_details(field_details(field, reason.clone()))
            }
            AppError::ValidationErrors { errors } => {
                ErrorResponse::new("VALIDATION_ERROR", "Request validation failed.")
                    .with_details(group_by_field(errors))
            }
            AppError::BadRequest { message } => ErrorResponse::new("BAD_REQUEST", message),
            AppError::Unauthorized { message } => ErrorResponse::new("UNAUTHORIZED", message),
            AppError::Forbidden { message } => ErrorResponse::new("FORBIDDEN", message),
            AppError::ConnectionPool { source } => {
                tracing::error!(error = %format!("{source:#}"), "Connection pool unavailable");
                ErrorResponse::new("SERVICE_UNAVAILABLE", "Database connection unavailable.")
            }
            AppError::Database { operation, source } => {
                tracing::error!(operation = %operation, error = %format!("{source:#}"), "Database error");
                ErrorResponse::new("INTERNAL_ERROR", "An internal error occurred.")
            }
            AppError::Configuration { key, source } => {
                tracing::error!(key = %key, error = %format!("{source:#}"), "Configuration error");
                ErrorResponse::new("INTERNAL_ERROR", "An internal error occurred.")
            }
            AppError::Internal { source } => {
                tracing::error!(error = %format!("{source:#}"), "Internal error");
                ErrorResponse::new("INTERNAL_ERROR", "An internal error occurred.")
            }
        };

        (status, Json(body)).into_response()
    }
}

fn field_details(field: &str, message: String) -> Value {
    let mut fields = Map::new();
    fields.insert(field.to_string(), Value::Array(vec![Value::String(message)]));
    Value::Object(fields)
}

fn group_by_field(errors: &[ValidationFieldError]) -> Value {
    let mut fields = Map::new();
    for error in errors {
        let messages = fields
            .entry(error.field.clone())
            .or_insert_with(|| Value::Array(Vec::new()));
        if let Value::Array(list) = messages {
            list.push(Value::String(error.message.clone()));
        }
    }
    Value::Object(fields)
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Gives every 4xx/5xx response the [`ErrorResponse`] shape with the
/// request id filled in. Bodies that already are JSON objects get the id
/// added; plain-text bodies from axum rejections, the router fallback or the
/// timeout layer are wrapped. Extractor 422s are reported as 400.
pub async fn error_envelope_middleware(request: Request, next: Next) -> Response {
    let request_id = request.extensions().get::<RequestId>().map(|r| r.0.clone());
    let response = next.run(request).await;

    let status = response.status();
    if !(status.is_client_error() || status.is_server_error()) {
        return response;
    }

    let (mut parts, body) = response.into_parts();
    if parts.status == StatusCode::UNPROCESSABLE_ENTITY {
        parts.status = StatusCode::BAD_REQUEST;
    }
    let status = parts.status;
    let bytes = match to_bytes(body, MAX_ERROR_BODY).await {
        Ok(bytes) => bytes,
        Err(error) => {
            tracing::warn!(%error, "Could not buffer error body");
            return (status, Json(fallback_body(status, "", request_id.as_deref()))).into_response();
        }
    };

    let body = match serde_json::from_slice::<Value>(&bytes) {
        Ok(Value::Object(mut object)) => {
            if let Some(id) = &request_id {
                object.insert("request_id".to_string(), Value::String(id.clone()));
            }
            Value::Object(object)
        }
        _ => {
            let text = String::from_utf8_lossy(&bytes);
            let error = fallback_body(status, text.trim(), request_id.as_deref());
            serde_json::to_value(error).unwrap_or(Value::Null)
        }
    };

    let encoded = serde_json::to_vec(&body).unwrap_or_default();
    parts.headers.remove(header::CONTENT_LENGTH);
    parts.headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    Response::from_parts(parts, Body::from(encoded))
}

fn fallback_body(status: StatusCode, text: &str, request_id: Option<&str>) -> ErrorResponse {
    let (code, default_message) = match status {
        StatusCode::BAD_REQUEST => ("BAD_REQUEST", "Malformed request."),
        StatusCode::UNAUTHORIZED => ("UNAUTHORIZED", "Authentication required."),
        StatusCode::FORBIDDEN => ("FORBIDDEN", "Permission denied."),
        StatusCode::NOT_FOUND => ("NOT_FOUND", "Not found."),
        StatusCode::METHOD_NOT_ALLOWED => ("METHOD_NOT_ALLOWED", "Method not allowed."),
        StatusCode::REQUEST_TIMEOUT => ("REQUEST_TIMEOUT", "Request timed out."),
        StatusCode::PAYLOAD_TOO_LARGE => ("PAYLOAD_TOO_LARGE", "Request body too large."),
        StatusCode::UNSUPPORTED_MEDIA_TYPE => {
            ("UNSUPPORTED_MEDIA_TYPE", "Expected an application/json body.")
        }
        s if s.is_server_error() => ("INTERNAL_ERROR", "An internal error occurred."),
        _ => ("ERROR", "Request failed."),
    };
    let message = if text.is_empty() || status.is_server_error() {
        default_message
    } else {
        text
    };

    let body = ErrorResponse::new(code, message);
    match request_id {
        Some(id) => body.with_request_id(id),
        None => body,
    }
}
