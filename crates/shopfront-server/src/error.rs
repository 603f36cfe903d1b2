//! Translation of every failure into the JSON envelope.

use axum::Json;
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::rejection::{FormRejection, JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use shopfront_core::error::ShopError;
use tracing::{error, warn};
use validator::ValidationErrors;

use crate::response::Envelope;

/// An error ready to be sent to the client.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

fn status_of(err: &ShopError) -> StatusCode {
    match err {
        ShopError::Validation { .. }
        | ShopError::InsufficientStock { .. }
        | ShopError::InvalidTransition { .. }
        | ShopError::AlreadyExists { .. }
        | ShopError::Upload(_) => StatusCode::BAD_REQUEST,
        ShopError::AuthenticationFailed { .. } => StatusCode::UNAUTHORIZED,
        ShopError::AuthorizationDenied { .. } => StatusCode::FORBIDDEN,
        ShopError::NotFound { .. } => StatusCode::NOT_FOUND,
        ShopError::Conflict { .. } => StatusCode::CONFLICT,
        ShopError::PaymentGateway(_) => StatusCode::BAD_GATEWAY,
        ShopError::Database(_) | ShopError::Crypto(_) | ShopError::Internal(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl From<ShopError> for ApiError {
    fn from(err: ShopError) -> Self {
        let status = status_of(&err);
        let message = match &err {
            ShopError::NotFound { entity, .. } => format!("{entity} not found"),
            _ if status.is_server_error() && status != StatusCode::BAD_GATEWAY => {
                error!(error = %err, "Request failed");
                "Internal Server Error".to_string()
            }
            _ => err.to_string(),
        };
        if status == StatusCode::BAD_GATEWAY {
            warn!(error = %err, "Upstream gateway failure");
        }
        Self { status, message }
    }
}

/// Malformed bodies are plain 400s; only an oversized body keeps its 413.
fn body_status(status: StatusCode) -> StatusCode {
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        status
    } else {
        StatusCode::BAD_REQUEST
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(body_status(rejection.status()), rejection.body_text())
    }
}

impl From<FormRejection> for ApiError {
    fn from(rejection: FormRejection) -> Self {
        Self::new(body_status(rejection.status()), rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        Self::new(body_status(err.status()), err.body_text())
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
        fields.sort_by(|a, b| a.0.cmp(&b.0));
        let message = fields
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| match &e.message {
                    Some(msg) => msg.to_string(),
                    None => format!("Invalid {field}"),
                })
            })
            .next()
            .unwrap_or_else(|| "Invalid request".to_string());
        Self::bad_request(message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Envelope::<()> {
            status_code: self.status.as_u16(),
            data: None,
            message: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}
