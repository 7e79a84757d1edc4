use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use profil_core::error::{self, ApiError};

/// Internal error type that converts to structured API responses.
///
/// Collaborator failures are classified at the client boundary (see
/// `clients`); by the time an error reaches a handler it is already one
/// of these variants — no raw reqwest error crosses a route.
#[derive(Debug)]
pub enum AppError {
    /// Validation error (400)
    Validation {
        message: String,
        field: Option<String>,
        received: Option<serde_json::Value>,
        docs_hint: Option<String>,
    },
    /// Resource unknown or already gone (404)
    NotFound { resource: String },
    /// Collaborator unreachable: connection refused, DNS failure, timeout (503)
    UpstreamUnavailable { service: &'static str, detail: String },
    /// Collaborator answered non-2xx with a body (502, body passed through)
    UpstreamRejected {
        service: &'static str,
        status: u16,
        body: String,
    },
    /// Internal error (500)
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let request_id = uuid::Uuid::now_v7().to_string();

        let (status, api_error) = match self {
            AppError::Validation {
                message,
                field,
                received,
                docs_hint,
            } => (
                StatusCode::BAD_REQUEST,
                ApiError {
                    error: error::codes::VALIDATION_FAILED.to_string(),
                    message,
                    field,
                    received,
                    upstream: None,
                    request_id,
                    docs_hint,
                },
            ),
            AppError::NotFound { resource } => (
                StatusCode::NOT_FOUND,
                ApiError {
                    error: error::codes::NOT_FOUND.to_string(),
                    message: format!("'{resource}' not found"),
                    field: None,
                    received: None,
                    upstream: None,
                    request_id,
                    docs_hint: None,
                },
            ),
            AppError::UpstreamUnavailable { service, detail } => {
                tracing::warn!(service, %detail, "upstream unavailable");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    ApiError {
                        error: error::codes::UPSTREAM_UNAVAILABLE.to_string(),
                        // Short and non-technical: may be read aloud
                        message: "Сервис временно недоступен, попробуйте ещё раз".to_string(),
                        field: None,
                        received: None,
                        upstream: Some(detail),
                        request_id,
                        docs_hint: Some(format!("The {service} collaborator did not respond")),
                    },
                )
            }
            AppError::UpstreamRejected {
                service,
                status,
                body,
            } => {
                tracing::warn!(service, status, "upstream rejected request");
                (
                    StatusCode::BAD_GATEWAY,
                    ApiError {
                        error: error::codes::UPSTREAM_REJECTED.to_string(),
                        // Upstream's own message passes through so the UI
                        // can show something actionable
                        message: body.clone(),
                        field: None,
                        received: None,
                        upstream: Some(format!("{service} returned HTTP {status}")),
                        request_id,
                        docs_hint: None,
                    },
                )
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiError {
                        error: error::codes::INTERNAL_ERROR.to_string(),
                        message: "An internal error occurred".to_string(),
                        field: None,
                        received: None,
                        upstream: None,
                        request_id,
                        docs_hint: None,
                    },
                )
            }
        };

        (status, Json(api_error)).into_response()
    }
}
