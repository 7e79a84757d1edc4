//! Human-in-the-loop endpoints.
//!
//! `create` is the pipeline-facing call: it blocks (asynchronously) until
//! a human resolves the approval or the auto-reject timer fires, and
//! responds with the decision either way. `resolve` and `pending` are the
//! approval UI's side of the contract.

use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::approvals::{ApprovalKind, Decision, PendingApproval, Resolution};
use crate::error::AppError;
use crate::extract::AppJson;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/approvals", post(create_approval))
        .route("/v1/approvals/resolve", post(resolve_approval))
        .route("/v1/approvals/pending", get(list_pending))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateApprovalRequest {
    pub session_id: String,
    #[serde(rename = "type")]
    pub kind: ApprovalKind,
    pub question: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ApprovalOutcomeResponse {
    pub item_id: String,
    pub session_id: String,
    pub resolution: Resolution,
}

/// Create an approval and wait for its decision
///
/// Holds the request open until a human resolves the item or the
/// auto-reject timer fires. A timeout is not an error: the response then
/// carries `decision: "rejected"` with the timeout feedback string, and
/// the caller must handle it exactly like an explicit rejection.
#[utoipa::path(
    post,
    path = "/v1/approvals",
    request_body = CreateApprovalRequest,
    responses(
        (status = 200, description = "Decision received (human or timeout)", body = ApprovalOutcomeResponse),
        (status = 400, description = "Validation error", body = profil_core::error::ApiError)
    ),
    tag = "approvals"
)]
pub async fn create_approval(
    State(state): State<AppState>,
    AppJson(req): AppJson<CreateApprovalRequest>,
) -> Result<Json<ApprovalOutcomeResponse>, AppError> {
    let session_id = req.session_id.trim();
    if session_id.is_empty() {
        return Err(AppError::Validation {
            message: "session_id must not be empty".to_string(),
            field: Some("session_id".to_string()),
            received: None,
            docs_hint: None,
        });
    }

    let (record, rx) = state.approvals.create(
        session_id,
        req.kind,
        &req.question,
        req.content,
        req.metadata,
    );
    tracing::info!(item_id = %record.item_id, session_id, "approval created, awaiting decision");

    let resolution = rx
        .await
        .map_err(|_| AppError::Internal("approval channel closed before resolution".to_string()))?;

    Ok(Json(ApprovalOutcomeResponse {
        item_id: record.item_id,
        session_id: record.session_id,
        resolution,
    }))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ResolveApprovalRequest {
    pub session_id: String,
    pub item_id: String,
    pub decision: Decision,
    #[serde(default)]
    pub modified_content: Option<String>,
    #[serde(default)]
    pub feedback: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ResolveApprovalResponse {
    pub success: bool,
}

/// Resolve a pending approval
///
/// First resolution wins. A second call for the same item — or a call
/// racing the auto-reject timer — gets 404, never an exception.
#[utoipa::path(
    post,
    path = "/v1/approvals/resolve",
    request_body = ResolveApprovalRequest,
    responses(
        (status = 200, description = "Resolution recorded", body = ResolveApprovalResponse),
        (status = 404, description = "Unknown or already-resolved item", body = profil_core::error::ApiError)
    ),
    tag = "approvals"
)]
pub async fn resolve_approval(
    State(state): State<AppState>,
    AppJson(req): AppJson<ResolveApprovalRequest>,
) -> Result<Json<ResolveApprovalResponse>, AppError> {
    let resolved = state.approvals.resolve(
        &req.item_id,
        req.decision,
        req.modified_content,
        req.feedback,
    );

    if !resolved {
        return Err(AppError::NotFound {
            resource: format!("approval/{}", req.item_id),
        });
    }
    Ok(Json(ResolveApprovalResponse { success: true }))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PendingQuery {
    pub session_id: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PendingApprovalsResponse {
    pub items: Vec<PendingApproval>,
}

/// List unresolved approvals for a session
#[utoipa::path(
    get,
    path = "/v1/approvals/pending",
    params(("session_id" = String, Query, description = "Session to list approvals for")),
    responses(
        (status = 200, description = "Pending approvals, oldest first", body = PendingApprovalsResponse)
    ),
    tag = "approvals"
)]
pub async fn list_pending(
    State(state): State<AppState>,
    Query(query): Query<PendingQuery>,
) -> Json<PendingApprovalsResponse> {
    Json(PendingApprovalsResponse {
        items: state.approvals.pending_for(&query.session_id),
    })
}
