use serde::Serialize;
use utoipa::ToSchema;

/// Structured error response — designed for agents, not humans.
/// Every error carries enough information for an agent (or a voice
/// front-end) to understand what went wrong and how to react.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiError {
    /// Machine-readable error code (e.g. "validation_failed", "upstream_unavailable")
    pub error: String,
    /// Short, non-technical description. In the voice-agent context this is
    /// the only text that may be read aloud to the user.
    pub message: String,
    /// Which field caused the error (if applicable)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// The value that was received (if applicable)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub received: Option<serde_json::Value>,
    /// Raw upstream error text, attached for diagnostics only — never the
    /// primary message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upstream: Option<String>,
    /// Request ID for tracing and debugging
    pub request_id: String,
    /// Hint about what the correct usage looks like
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docs_hint: Option<String>,
}

/// Error codes used across the API
pub mod codes {
    pub const VALIDATION_FAILED: &str = "validation_failed";
    pub const NOT_FOUND: &str = "not_found";
    pub const UPSTREAM_UNAVAILABLE: &str = "upstream_unavailable";
    pub const UPSTREAM_REJECTED: &str = "upstream_rejected";
    pub const INTERNAL_ERROR: &str = "internal_error";
}
