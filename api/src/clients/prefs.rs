//! Client for the preferences CRUD collaborator.
//!
//! The collaborator exposes a single tool-dispatch endpoint: every
//! operation is a POST with `{tool_name, parameters, user_id}` and the
//! answer is always the same `{success, message, data?, error?}`
//! envelope, which this service passes through unchanged.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use super::{classify_transport_error, reject_from_response};
use crate::error::AppError;

const SERVICE: &str = "preferences";

/// Tool names the collaborator dispatches on.
pub const PREFS_TOOLS: &[&str] = &[
    "get_user_preferences",
    "create_user_preferences",
    "update_user_preferences",
    "update_preference_field",
    "delete_user_preferences",
    "search_preferences",
    "list_all_preferences",
];

/// The collaborator's uniform response envelope.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PrefsEnvelope {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Clone)]
pub struct PrefsClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl PrefsClient {
    pub fn new(
        base_url: String,
        timeout: Duration,
        api_key: Option<String>,
    ) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url,
            api_key,
        })
    }

    /// Dispatch one tool call for a user.
    pub async fn call(
        &self,
        tool_name: &str,
        parameters: serde_json::Value,
        user_id: &str,
    ) -> Result<PrefsEnvelope, AppError> {
        let mut req = self.http.post(format!("{}/tool", self.base_url)).json(&json!({
            "tool_name": tool_name,
            "parameters": parameters,
            "user_id": user_id,
        }));
        if let Some(key) = &self.api_key {
            req = req.header("Authorization", format!("Bearer {key}"));
        }

        let resp = req
            .send()
            .await
            .map_err(|e| classify_transport_error(SERVICE, e))?;

        if !resp.status().is_success() {
            return Err(reject_from_response(SERVICE, resp).await);
        }

        resp.json::<PrefsEnvelope>()
            .await
            .map_err(|e| AppError::Internal(format!("preferences returned malformed JSON: {e}")))
    }

    /// Best-effort liveness probe, used by the health endpoint only.
    pub async fn is_reachable(&self) -> bool {
        self.http
            .get(format!("{}/health", self.base_url))
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }
}
