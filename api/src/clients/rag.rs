//! Client for the RAG knowledge service.
//!
//! The collaborator indexes documents per workspace and answers free-text
//! queries scoped to one workspace. This client covers the four
//! operations the profile flows need: query, document ingestion,
//! workspace listing and creation. No retry, no backoff — a failed call
//! is classified and reported, the caller decides what "failed" means
//! (for completeness checks it means "not complete", never an error to
//! the end user).

use std::time::Duration;

use serde::Deserialize;
use serde_json::json;

use super::{classify_transport_error, reject_from_response};
use crate::error::AppError;

const SERVICE: &str = "rag";

/// Query mode understood by the RAG engine. "mix" blends vector and
/// graph retrieval and is the default for profile queries.
pub const DEFAULT_QUERY_MODE: &str = "mix";
pub const DEFAULT_TOP_K: usize = 10;

#[derive(Debug, Deserialize)]
pub struct RagQueryResponse {
    pub response: String,
}

#[derive(Clone)]
pub struct RagClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl RagClient {
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

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let mut req = self.http.request(method, format!("{}{path}", self.base_url));
        if let Some(key) = &self.api_key {
            req = req.header("Authorization", format!("Bearer {key}"));
        }
        req
    }

    /// Free-text query scoped to one workspace.
    pub async fn query(
        &self,
        workspace: &str,
        query: &str,
        mode: &str,
        top_k: usize,
    ) -> Result<RagQueryResponse, AppError> {
        let resp = self
            .request(reqwest::Method::POST, "/query")
            .json(&json!({
                "query": query,
                "mode": mode,
                "top_k": top_k,
                "workspace": workspace,
            }))
            .send()
            .await
            .map_err(|e| classify_transport_error(SERVICE, e))?;

        if !resp.status().is_success() {
            return Err(reject_from_response(SERVICE, resp).await);
        }

        resp.json::<RagQueryResponse>()
            .await
            .map_err(|e| AppError::Internal(format!("rag returned malformed JSON: {e}")))
    }

    /// Ingest one text document into a workspace.
    pub async fn insert_document(
        &self,
        workspace: &str,
        text: &str,
        file_source: &str,
    ) -> Result<(), AppError> {
        let resp = self
            .request(reqwest::Method::POST, "/documents/text")
            .json(&json!({
                "text": text,
                "file_source": file_source,
                "workspace": workspace,
            }))
            .send()
            .await
            .map_err(|e| classify_transport_error(SERVICE, e))?;

        if !resp.status().is_success() {
            return Err(reject_from_response(SERVICE, resp).await);
        }
        Ok(())
    }

    pub async fn list_workspaces(&self) -> Result<Vec<String>, AppError> {
        let resp = self
            .request(reqwest::Method::GET, "/workspaces")
            .send()
            .await
            .map_err(|e| classify_transport_error(SERVICE, e))?;

        if !resp.status().is_success() {
            return Err(reject_from_response(SERVICE, resp).await);
        }

        resp.json::<Vec<String>>()
            .await
            .map_err(|e| AppError::Internal(format!("rag returned malformed JSON: {e}")))
    }

    /// Create the workspace if it does not exist yet. Must run before the
    /// first write into a user's workspace.
    pub async fn ensure_workspace(&self, name: &str) -> Result<(), AppError> {
        let existing = self.list_workspaces().await?;
        if existing.iter().any(|w| w == name) {
            return Ok(());
        }

        let resp = self
            .request(reqwest::Method::POST, "/workspaces")
            .json(&json!({ "name": name }))
            .send()
            .await
            .map_err(|e| classify_transport_error(SERVICE, e))?;

        if !resp.status().is_success() {
            return Err(reject_from_response(SERVICE, resp).await);
        }
        Ok(())
    }

    /// Best-effort liveness probe, used by the health endpoint only.
    pub async fn is_reachable(&self) -> bool {
        self.request(reqwest::Method::GET, "/health")
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }
}
