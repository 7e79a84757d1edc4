//! The seven-question interview flow.
//!
//! State is caller-owned: `start` hands out an empty state, every
//! `answer` call receives the accumulated state and returns the updated
//! one. Two concurrent answers for the same user race last-write-wins;
//! there is no server-side session or version check.

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use profil_core::catalog::{InterviewState, workspace_for};
use profil_core::completeness::{CompletenessAssessment, assess_scan, scan_profile};
use profil_core::interview::{
    InterviewError, StepOutcome, advance, question_prompt,
};

use crate::clients::rag::{DEFAULT_QUERY_MODE, DEFAULT_TOP_K};
use crate::error::AppError;
use crate::extract::AppJson;
use crate::state::AppState;

/// Broad query used to pull the whole profile out of the workspace.
pub const FULL_PROFILE_QUERY: &str =
    "Расскажи всё, что известно о предпочтениях пользователя: компетенции, \
     стиль общения, предпочтения по встречам, сфокусированная работа, \
     стиль работы, карьерные цели, подход к решению проблем.";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/interview/start", post(start_interview))
        .route("/v1/interview/answer", post(answer_interview))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum InterviewStatus {
    AlreadyCompleted,
    InProgress,
    Completed,
    Error,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct InterviewStartRequest {
    pub user_id: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct InterviewStartResponse {
    pub status: InterviewStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question_number: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interview_state: Option<InterviewState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assessment: Option<CompletenessAssessment>,
}

/// Start (or skip) the interview for a user
///
/// Checks profile completeness first: an already-complete profile
/// short-circuits without asking anything. A RAG failure is treated as
/// "not complete" — re-asking a question is cheaper than silently
/// skipping one — so this endpoint fails open into the interview.
#[utoipa::path(
    post,
    path = "/v1/interview/start",
    request_body = InterviewStartRequest,
    responses(
        (status = 200, description = "Interview started or already complete", body = InterviewStartResponse),
        (status = 400, description = "Validation error", body = profil_core::error::ApiError)
    ),
    tag = "interview"
)]
pub async fn start_interview(
    State(state): State<AppState>,
    AppJson(req): AppJson<InterviewStartRequest>,
) -> Result<Json<InterviewStartResponse>, AppError> {
    let user_id = validate_user_id(&req.user_id)?;
    let workspace = workspace_for(user_id);

    let scan = match state
        .rag
        .query(&workspace, FULL_PROFILE_QUERY, DEFAULT_QUERY_MODE, DEFAULT_TOP_K)
        .await
    {
        Ok(answer) => Some(scan_profile(&answer.response, &state.config.thresholds)),
        Err(err) => {
            tracing::warn!(user_id, ?err, "completeness probe failed, starting interview");
            None
        }
    };

    if let Some(scan) = &scan {
        if scan.is_complete {
            return Ok(Json(InterviewStartResponse {
                status: InterviewStatus::AlreadyCompleted,
                question: None,
                question_number: None,
                interview_state: None,
                assessment: Some(assess_scan(scan)),
            }));
        }
    }

    Ok(Json(InterviewStartResponse {
        status: InterviewStatus::InProgress,
        question: question_prompt(1).map(str::to_string),
        question_number: Some(1),
        interview_state: Some(InterviewState::default()),
        assessment: scan.as_ref().map(assess_scan),
    }))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct InterviewAnswerRequest {
    pub user_id: String,
    /// 1-based index of the question being answered
    pub question_number: usize,
    pub answer: String,
    /// Full accumulated state from the previous turn
    #[serde(default)]
    pub interview_state: InterviewState,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct InterviewAnswerResponse {
    pub status: InterviewStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_question: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_question_number: Option<usize>,
    /// Always returned, even when persistence fails — the caller keeps
    /// the collected answers either way
    pub interview_state: InterviewState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Merge one answer and advance the interview
///
/// Steps 1–6 return the next question. Step 7 writes the formatted
/// profile document into the user's RAG workspace (creating the
/// workspace first if absent) and completes the interview; if the write
/// fails the answers are still returned with `status: "error"`.
#[utoipa::path(
    post,
    path = "/v1/interview/answer",
    request_body = InterviewAnswerRequest,
    responses(
        (status = 200, description = "Turn processed", body = InterviewAnswerResponse),
        (status = 400, description = "Validation error", body = profil_core::error::ApiError)
    ),
    tag = "interview"
)]
pub async fn answer_interview(
    State(state): State<AppState>,
    AppJson(req): AppJson<InterviewAnswerRequest>,
) -> Result<Json<InterviewAnswerResponse>, AppError> {
    let user_id = validate_user_id(&req.user_id)?;

    let mut interview_state = req.interview_state;
    let outcome = advance(
        req.question_number,
        &req.answer,
        &mut interview_state,
        chrono::Utc::now(),
    )
    .map_err(|err| match err {
        InterviewError::QuestionOutOfRange(n) => AppError::Validation {
            message: err.to_string(),
            field: Some("question_number".to_string()),
            received: Some(serde_json::json!(n)),
            docs_hint: Some("Question numbers run from 1 to 7.".to_string()),
        },
    })?;

    match outcome {
        StepOutcome::AskNext {
            next_question_number,
            prompt,
        } => Ok(Json(InterviewAnswerResponse {
            status: InterviewStatus::InProgress,
            next_question: Some(prompt.to_string()),
            current_question_number: Some(next_question_number),
            interview_state,
            message: None,
        })),
        StepOutcome::ReadyToPersist { document } => {
            let workspace = workspace_for(user_id);
            let file_source = format!(
                "profile-{user_id}-{}.txt",
                chrono::Utc::now().timestamp_millis()
            );

            let persisted = async {
                state.rag.ensure_workspace(&workspace).await?;
                state
                    .rag
                    .insert_document(&workspace, &document, &file_source)
                    .await
            }
            .await;

            match persisted {
                Ok(()) => Ok(Json(InterviewAnswerResponse {
                    status: InterviewStatus::Completed,
                    next_question: None,
                    current_question_number: None,
                    interview_state,
                    message: Some("Профиль сохранён".to_string()),
                })),
                Err(err) => {
                    tracing::warn!(user_id, ?err, "profile persistence failed");
                    Ok(Json(InterviewAnswerResponse {
                        status: InterviewStatus::Error,
                        next_question: None,
                        current_question_number: None,
                        interview_state,
                        message: Some(
                            "Не удалось сохранить профиль, попробуйте ещё раз".to_string(),
                        ),
                    }))
                }
            }
        }
    }
}

pub(crate) fn validate_user_id(user_id: &str) -> Result<&str, AppError> {
    let trimmed = user_id.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation {
            message: "user_id must not be empty".to_string(),
            field: Some("user_id".to_string()),
            received: None,
            docs_hint: None,
        });
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_user_id_is_rejected() {
        assert!(validate_user_id("  ").is_err());
        assert_eq!(validate_user_id(" u1 ").unwrap(), "u1");
    }

    #[test]
    fn status_serializes_snake_case() {
        assert_eq!(
            serde_json::to_value(InterviewStatus::AlreadyCompleted).unwrap(),
            serde_json::json!("already_completed")
        );
        assert_eq!(
            serde_json::to_value(InterviewStatus::InProgress).unwrap(),
            serde_json::json!("in_progress")
        );
    }
}
