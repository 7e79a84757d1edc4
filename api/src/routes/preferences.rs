//! Preferences proxy and the natural-language update path.
//!
//! The CRUD side is a thin pass-through to the preferences collaborator's
//! tool-dispatch endpoint. The update-request side runs the keyword
//! detector first and only touches the collaborator when intent, category
//! and value were all recognized.

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use profil_core::nlu::{UpdateDetection, detect_update};

use crate::clients::prefs::{PREFS_TOOLS, PrefsEnvelope};
use crate::error::AppError;
use crate::extract::AppJson;
use crate::routes::interview::validate_user_id;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/preferences", post(call_preferences))
        .route("/v1/preferences/update-request", post(update_request))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PreferencesCallRequest {
    pub user_id: String,
    /// One of the collaborator's tool names, e.g. "get_user_preferences"
    pub tool_name: String,
    #[serde(default)]
    pub parameters: serde_json::Value,
}

/// Dispatch one preferences tool call
///
/// The collaborator's `{success, message, data?, error?}` envelope is
/// passed through unchanged; only transport-level failures become HTTP
/// errors here.
#[utoipa::path(
    post,
    path = "/v1/preferences",
    request_body = PreferencesCallRequest,
    responses(
        (status = 200, description = "Collaborator envelope", body = PrefsEnvelope),
        (status = 400, description = "Unknown tool name", body = profil_core::error::ApiError),
        (status = 502, description = "Collaborator rejected the call", body = profil_core::error::ApiError),
        (status = 503, description = "Collaborator unavailable", body = profil_core::error::ApiError)
    ),
    tag = "preferences"
)]
pub async fn call_preferences(
    State(state): State<AppState>,
    AppJson(req): AppJson<PreferencesCallRequest>,
) -> Result<Json<PrefsEnvelope>, AppError> {
    let user_id = validate_user_id(&req.user_id)?;

    if !PREFS_TOOLS.contains(&req.tool_name.as_str()) {
        return Err(AppError::Validation {
            message: format!("unknown tool '{}'", req.tool_name),
            field: Some("tool_name".to_string()),
            received: Some(serde_json::json!(req.tool_name)),
            docs_hint: Some(format!("Valid tools: {}", PREFS_TOOLS.join(", "))),
        });
    }

    let envelope = state
        .prefs
        .call(&req.tool_name, req.parameters, user_id)
        .await?;
    Ok(Json(envelope))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateRequestBody {
    pub user_id: String,
    /// The user's free-text utterance
    pub text: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UpdateRequestResponse {
    pub detection: UpdateDetection,
    /// The collaborator accepted the field update
    pub applied: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collaborator: Option<PrefsEnvelope>,
}

/// Detect and apply a spoken preference change
///
/// Detection is best-effort keyword matching: the extracted value is a
/// proposal, and the caller should read the result back to the user. No
/// collaborator call happens unless intent, category and value were all
/// recognized.
#[utoipa::path(
    post,
    path = "/v1/preferences/update-request",
    request_body = UpdateRequestBody,
    responses(
        (status = 200, description = "Detection (and update, when recognized) outcome", body = UpdateRequestResponse),
        (status = 400, description = "Validation error", body = profil_core::error::ApiError),
        (status = 503, description = "Collaborator unavailable", body = profil_core::error::ApiError)
    ),
    tag = "preferences"
)]
pub async fn update_request(
    State(state): State<AppState>,
    AppJson(req): AppJson<UpdateRequestBody>,
) -> Result<Json<UpdateRequestResponse>, AppError> {
    let user_id = validate_user_id(&req.user_id)?;
    let detection = detect_update(&req.text);

    if !detection.is_update_request {
        return Ok(Json(UpdateRequestResponse {
            detection,
            applied: false,
            message: Some("Запрос не похож на изменение предпочтений".to_string()),
            collaborator: None,
        }));
    }

    let Some(category_key) = detection.category_key.clone() else {
        return Ok(Json(UpdateRequestResponse {
            detection,
            applied: false,
            message: Some(
                "Не удалось определить, какое предпочтение изменить — уточните категорию"
                    .to_string(),
            ),
            collaborator: None,
        }));
    };

    let Some(new_value) = detection.new_value.clone().filter(|v| !v.is_empty()) else {
        return Ok(Json(UpdateRequestResponse {
            detection,
            applied: false,
            message: Some(
                "Не удалось извлечь новое значение — сформулируйте запрос иначе".to_string(),
            ),
            collaborator: None,
        }));
    };

    let envelope = state
        .prefs
        .call(
            "update_preference_field",
            serde_json::json!({ "field": category_key, "value": new_value }),
            user_id,
        )
        .await?;

    Ok(Json(UpdateRequestResponse {
        applied: envelope.success,
        message: Some(envelope.message.clone()),
        collaborator: Some(envelope),
        detection,
    }))
}
