//! Profile completeness checks and the progressive insight flow.
//!
//! The full check runs one broad RAG query and the keyword/length
//! heuristic over its answer. The progressive check probes each tracked
//! category with its own query and tolerates partial failure: a probe
//! that errors out marks its category as missing instead of aborting the
//! whole assessment. Insights are append-only timestamped documents, one
//! per call — nothing is overwritten.

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use profil_core::catalog::{
    FIELDS, PROGRESSIVE_FIELD_KEYS, field_by_key, workspace_for,
};
use profil_core::completeness::{
    CompletenessAssessment, ProfileScan, assess_categories, assess_scan, scan_profile,
};

use crate::clients::rag::{DEFAULT_QUERY_MODE, DEFAULT_TOP_K};
use crate::error::AppError;
use crate::extract::AppJson;
use crate::routes::interview::{FULL_PROFILE_QUERY, validate_user_id};
use crate::state::AppState;

/// Mode and depth for the narrow per-category probes.
const PROBE_QUERY_MODE: &str = "local";
const PROBE_TOP_K: usize = 5;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/profile/completeness", post(check_completeness))
        .route(
            "/v1/profile/completeness/progressive",
            post(check_completeness_progressive),
        )
        .route("/v1/profile/insight", post(save_insight))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CompletenessRequest {
    pub user_id: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CompletenessResponse {
    pub user_id: String,
    pub is_complete: bool,
    /// False when the RAG collaborator could not be queried; the check
    /// then degrades to "not complete" rather than erroring
    pub rag_available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scan: Option<ProfileScan>,
    pub assessment: CompletenessAssessment,
}

/// Full-profile completeness check
///
/// Absence of information is a valid negative result, never an error: a
/// failed RAG call yields `is_complete: false` with `rag_available:
/// false`.
#[utoipa::path(
    post,
    path = "/v1/profile/completeness",
    request_body = CompletenessRequest,
    responses(
        (status = 200, description = "Assessment computed", body = CompletenessResponse),
        (status = 400, description = "Validation error", body = profil_core::error::ApiError)
    ),
    tag = "profile"
)]
pub async fn check_completeness(
    State(state): State<AppState>,
    AppJson(req): AppJson<CompletenessRequest>,
) -> Result<Json<CompletenessResponse>, AppError> {
    let user_id = validate_user_id(&req.user_id)?;
    let workspace = workspace_for(user_id);

    match state
        .rag
        .query(&workspace, FULL_PROFILE_QUERY, DEFAULT_QUERY_MODE, DEFAULT_TOP_K)
        .await
    {
        Ok(answer) => {
            let scan = scan_profile(&answer.response, &state.config.thresholds);
            let assessment = assess_scan(&scan);
            Ok(Json(CompletenessResponse {
                user_id: user_id.to_string(),
                is_complete: scan.is_complete,
                rag_available: true,
                scan: Some(scan),
                assessment,
            }))
        }
        Err(err) => {
            tracing::warn!(user_id, ?err, "completeness query failed");
            Ok(Json(CompletenessResponse {
                user_id: user_id.to_string(),
                is_complete: false,
                rag_available: false,
                scan: None,
                assessment: all_missing_assessment(),
            }))
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CategoryProbe {
    pub category: String,
    pub label: String,
    pub filled: bool,
    /// False when this probe's RAG call failed; the category then counts
    /// as missing
    pub probed: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProgressiveCompletenessResponse {
    pub user_id: String,
    pub assessment: CompletenessAssessment,
    pub probes: Vec<CategoryProbe>,
}

/// Progressive per-category completeness check
///
/// One RAG probe per tracked category, aggregated into the same
/// percentage/missing shape as the full check. Categories are reported
/// in fixed priority order; the first missing one is the suggested next
/// topic to explore.
#[utoipa::path(
    post,
    path = "/v1/profile/completeness/progressive",
    request_body = CompletenessRequest,
    responses(
        (status = 200, description = "Assessment computed", body = ProgressiveCompletenessResponse),
        (status = 400, description = "Validation error", body = profil_core::error::ApiError)
    ),
    tag = "profile"
)]
pub async fn check_completeness_progressive(
    State(state): State<AppState>,
    AppJson(req): AppJson<CompletenessRequest>,
) -> Result<Json<ProgressiveCompletenessResponse>, AppError> {
    let user_id = validate_user_id(&req.user_id)?;
    let workspace = workspace_for(user_id);

    let mut probes = Vec::with_capacity(PROGRESSIVE_FIELD_KEYS.len());
    let mut hits: Vec<(&str, bool)> = Vec::with_capacity(PROGRESSIVE_FIELD_KEYS.len());

    for key in PROGRESSIVE_FIELD_KEYS {
        let Some(field) = field_by_key(key) else { continue };
        let query = format!("Что известно о категории «{}» пользователя?", field.label);

        let (filled, probed) = match state
            .rag
            .query(&workspace, &query, PROBE_QUERY_MODE, PROBE_TOP_K)
            .await
        {
            Ok(answer) => (category_hit(&answer.response, field.keywords), true),
            Err(err) => {
                tracing::warn!(user_id, category = key, ?err, "category probe failed");
                (false, false)
            }
        };

        hits.push((key, filled));
        probes.push(CategoryProbe {
            category: key.to_string(),
            label: field.label.to_string(),
            filled,
            probed,
        });
    }

    Ok(Json(ProgressiveCompletenessResponse {
        user_id: user_id.to_string(),
        assessment: assess_categories(&hits),
        probes,
    }))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SaveInsightRequest {
    pub user_id: String,
    /// Catalog key of the category this insight belongs to
    pub category: String,
    pub insight: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SaveInsightResponse {
    pub success: bool,
    pub workspace: String,
    pub file_source: String,
}

/// Save one insight into a category
///
/// The progressive flow's write path: callable at any point in a
/// conversation, each call appends a timestamped document to the user's
/// workspace rather than overwriting a single record.
#[utoipa::path(
    post,
    path = "/v1/profile/insight",
    request_body = SaveInsightRequest,
    responses(
        (status = 200, description = "Insight stored", body = SaveInsightResponse),
        (status = 400, description = "Validation error", body = profil_core::error::ApiError),
        (status = 502, description = "RAG rejected the write", body = profil_core::error::ApiError),
        (status = 503, description = "RAG unavailable", body = profil_core::error::ApiError)
    ),
    tag = "profile"
)]
pub async fn save_insight(
    State(state): State<AppState>,
    AppJson(req): AppJson<SaveInsightRequest>,
) -> Result<Json<SaveInsightResponse>, AppError> {
    let user_id = validate_user_id(&req.user_id)?;

    let Some(field) = field_by_key(req.category.trim()) else {
        let valid: Vec<&str> = FIELDS.iter().map(|f| f.key).collect();
        return Err(AppError::Validation {
            message: format!("unknown category '{}'", req.category),
            field: Some("category".to_string()),
            received: Some(serde_json::json!(req.category)),
            docs_hint: Some(format!("Valid categories: {}", valid.join(", "))),
        });
    };

    let insight = req.insight.trim();
    if insight.is_empty() {
        return Err(AppError::Validation {
            message: "insight must not be empty".to_string(),
            field: Some("insight".to_string()),
            received: None,
            docs_hint: None,
        });
    }

    let workspace = workspace_for(user_id);
    let now = chrono::Utc::now();
    let text = format!("[{}] {}: {insight}", now.to_rfc3339(), field.label);
    let file_source = format!("insight-{}-{}.txt", field.key, now.timestamp_millis());

    state.rag.ensure_workspace(&workspace).await?;
    state
        .rag
        .insert_document(&workspace, &text, &file_source)
        .await?;

    Ok(Json(SaveInsightResponse {
        success: true,
        workspace,
        file_source,
    }))
}

/// A probe answer counts as a hit when it is substantive: no "no data"
/// sentinel and at least one of the category's keywords present.
fn category_hit(response: &str, keywords: &[&str]) -> bool {
    let lowered = response.to_lowercase();
    if profil_core::completeness::NO_DATA_SENTINELS
        .iter()
        .any(|s| lowered.contains(s))
    {
        return false;
    }
    keywords.iter().any(|kw| lowered.contains(kw))
}

/// Assessment shown when the RAG collaborator is unreachable: everything
/// missing, explore the first category.
fn all_missing_assessment() -> CompletenessAssessment {
    let misses: Vec<(&str, bool)> = FIELDS.iter().map(|f| (f.key, false)).collect();
    assess_categories(&misses)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::approvals::ApprovalStore;
    use crate::clients::prefs::PrefsClient;
    use crate::clients::rag::RagClient;
    use crate::config::Config;

    /// State whose collaborators point at port 9 (discard) — every RAG
    /// probe fails with a connection error.
    fn unreachable_state() -> AppState {
        let config = Arc::new(Config {
            rag_base_url: "http://127.0.0.1:9".to_string(),
            prefs_base_url: "http://127.0.0.1:9".to_string(),
            rag_timeout: Duration::from_millis(200),
            prefs_timeout: Duration::from_millis(200),
            thresholds: Default::default(),
            approval_timeout: Duration::from_secs(300),
            resolution_ttl: Duration::from_secs(1800),
            rag_api_key: None,
            prefs_api_key: None,
        });
        let rag = RagClient::new(config.rag_base_url.clone(), config.rag_timeout, None)
            .expect("client");
        let prefs = PrefsClient::new(config.prefs_base_url.clone(), config.prefs_timeout, None)
            .expect("client");
        AppState {
            config,
            rag,
            prefs,
            approvals: Arc::new(ApprovalStore::new(
                Duration::from_secs(300),
                Duration::from_secs(1800),
            )),
        }
    }

    #[tokio::test]
    async fn failed_probes_count_their_categories_as_missing() {
        let response = check_completeness_progressive(
            State(unreachable_state()),
            AppJson(CompletenessRequest {
                user_id: "u1".to_string(),
            }),
        )
        .await
        .expect("partial probe failure is a result, not an error");

        let body = response.0;
        assert_eq!(body.probes.len(), PROGRESSIVE_FIELD_KEYS.len());
        assert!(body.probes.iter().all(|p| !p.probed && !p.filled));
        assert_eq!(body.assessment.percent_complete, 0);
        assert_eq!(
            body.assessment.missing_categories.len(),
            PROGRESSIVE_FIELD_KEYS.len()
        );
        assert!(body.assessment.next_category.is_some());
    }

    #[test]
    fn category_hit_requires_a_keyword() {
        assert!(category_hit(
            "Пользователь предпочитает неформальный стиль общения",
            &["стиль общения", "общени"]
        ));
        assert!(!category_hit("Пользователь любит кофе", &["стиль общения"]));
    }

    #[test]
    fn category_hit_rejects_sentinels() {
        assert!(!category_hit(
            "No relevant context found: стиль общения",
            &["стиль общения"]
        ));
    }

    #[test]
    fn unavailable_rag_yields_zero_percent() {
        let assessment = all_missing_assessment();
        assert_eq!(assessment.percent_complete, 0);
        assert_eq!(assessment.missing_categories.len(), FIELDS.len());
        assert!(assessment.next_category.is_some());
    }
}
