//! Human-in-the-loop approval store.
//!
//! An execution pipeline that needs a human decision creates an approval
//! and awaits the paired receiver; a second, independent HTTP call (from
//! the approval UI) resolves it. The store is process-local and
//! in-memory: a restart loses pending approvals, which is accepted for a
//! single long-lived server process backing one front-end session.
//!
//! The store is an explicitly constructed service held in `AppState`,
//! never a module-level singleton, so tests can build their own with
//! short timers.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use utoipa::ToSchema;

/// Feedback string attached when the 5-minute timer fires before a human
/// answers. The waiting pipeline must treat this exactly like an explicit
/// rejection.
pub const TIMEOUT_FEEDBACK: &str =
    "Время ожидания решения истекло — запрос отклонён автоматически";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum ApprovalKind {
    PlanApproval,
    DecompositionDecision,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Approved,
    Rejected,
    Modified,
}

/// A recorded human (or timeout) decision.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Resolution {
    pub decision: Decision,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
    pub resolved_at: DateTime<Utc>,
}

/// One approval awaiting (or holding) a decision.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PendingApproval {
    pub item_id: String,
    pub session_id: String,
    #[serde(rename = "type")]
    pub kind: ApprovalKind,
    pub question: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<Resolution>,
}

#[derive(Default)]
struct Inner {
    items: HashMap<String, PendingApproval>,
    resolvers: HashMap<String, oneshot::Sender<Resolution>>,
}

pub struct ApprovalStore {
    inner: Arc<Mutex<Inner>>,
    approval_timeout: Duration,
    resolution_ttl: Duration,
}

impl ApprovalStore {
    pub fn new(approval_timeout: Duration, resolution_ttl: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner::default())),
            approval_timeout,
            resolution_ttl,
        }
    }

    /// Register a new approval. Returns the record and the receiver the
    /// pipeline awaits; the receiver resolves exactly once, either with a
    /// human decision or with the auto-reject after `approval_timeout`.
    pub fn create(
        &self,
        session_id: &str,
        kind: ApprovalKind,
        question: &str,
        content: Option<String>,
        metadata: Option<serde_json::Value>,
    ) -> (PendingApproval, oneshot::Receiver<Resolution>) {
        let (tx, rx) = oneshot::channel();
        let record = {
            let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());

            // Timestamp-based ids can collide within one millisecond;
            // bump until free.
            let mut millis = Utc::now().timestamp_millis();
            let mut item_id = format!("hitl-{session_id}-{millis}");
            while inner.items.contains_key(&item_id) {
                millis += 1;
                item_id = format!("hitl-{session_id}-{millis}");
            }

            let record = PendingApproval {
                item_id: item_id.clone(),
                session_id: session_id.to_string(),
                kind,
                question: question.to_string(),
                content,
                metadata,
                created_at: Utc::now(),
                resolution: None,
            };
            inner.items.insert(item_id.clone(), record.clone());
            inner.resolvers.insert(item_id, tx);
            record
        };

        // Auto-reject timer. It always fires; if a human answered first,
        // resolve_inner finds the item already resolved and does nothing.
        let inner = Arc::clone(&self.inner);
        let item_id = record.item_id.clone();
        let timeout = self.approval_timeout;
        let ttl = self.resolution_ttl;
        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            if resolve_inner(
                &inner,
                &item_id,
                Decision::Rejected,
                None,
                Some(TIMEOUT_FEEDBACK.into()),
                ttl,
            ) {
                tracing::info!(item_id = %item_id, "approval auto-rejected after timeout");
            }
        });

        (record, rx)
    }

    /// Record a decision. First resolution wins: returns false when the
    /// id is unknown, already resolved, or already purged — a resolution
    /// racing the timeout loses harmlessly.
    pub fn resolve(
        &self,
        item_id: &str,
        decision: Decision,
        modified_content: Option<String>,
        feedback: Option<String>,
    ) -> bool {
        resolve_inner(
            &self.inner,
            item_id,
            decision,
            modified_content,
            feedback,
            self.resolution_ttl,
        )
    }

    pub fn get(&self, item_id: &str) -> Option<PendingApproval> {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.items.get(item_id).cloned()
    }

    /// Unresolved approvals for one session, oldest first.
    pub fn pending_for(&self, session_id: &str) -> Vec<PendingApproval> {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let mut pending: Vec<PendingApproval> = inner
            .items
            .values()
            .filter(|item| item.session_id == session_id && item.resolution.is_none())
            .cloned()
            .collect();
        pending.sort_by_key(|item| item.created_at);
        pending
    }
}

/// Shared resolution path used by both the HTTP resolve call and the
/// auto-reject timer. On success, schedules purge of the record after
/// `ttl`.
fn resolve_inner(
    inner: &Arc<Mutex<Inner>>,
    item_id: &str,
    decision: Decision,
    modified_content: Option<String>,
    feedback: Option<String>,
    ttl: Duration,
) -> bool {
    {
        let mut guard = inner.lock().unwrap_or_else(|e| e.into_inner());
        let Some(item) = guard.items.get_mut(item_id) else {
            return false;
        };
        if item.resolution.is_some() {
            return false;
        }

        let resolution = Resolution {
            decision,
            modified_content,
            feedback,
            resolved_at: Utc::now(),
        };
        item.resolution = Some(resolution.clone());

        if let Some(tx) = guard.resolvers.remove(item_id) {
            // Receiver may have been dropped (pipeline gone) — fine.
            let _ = tx.send(resolution);
        }
    }

    // Keep the resolved record readable for a while, then purge.
    let inner = Arc::clone(inner);
    let item_id = item_id.to_string();
    tokio::spawn(async move {
        tokio::time::sleep(ttl).await;
        let mut guard = inner.lock().unwrap_or_else(|e| e.into_inner());
        guard.items.remove(&item_id);
    });
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(timeout_secs: u64, ttl_secs: u64) -> Arc<ApprovalStore> {
        Arc::new(ApprovalStore::new(
            Duration::from_secs(timeout_secs),
            Duration::from_secs(ttl_secs),
        ))
    }

    #[tokio::test]
    async fn resolution_fulfills_the_waiting_receiver() {
        let store = store(300, 1800);
        let (record, rx) = store.create(
            "s1",
            ApprovalKind::PlanApproval,
            "Одобрить план?",
            Some("план".into()),
            None,
        );

        assert!(store.resolve(&record.item_id, Decision::Approved, None, None));
        let resolution = rx.await.expect("sender kept");
        assert_eq!(resolution.decision, Decision::Approved);
    }

    #[tokio::test]
    async fn second_resolution_loses_and_does_not_alter_the_first() {
        let store = store(300, 1800);
        let (record, _rx) = store.create("s1", ApprovalKind::PlanApproval, "?", None, None);

        assert!(store.resolve(
            &record.item_id,
            Decision::Modified,
            Some("изменённый план".into()),
            None
        ));
        assert!(!store.resolve(&record.item_id, Decision::Rejected, None, None));

        let kept = store.get(&record.item_id).unwrap();
        let resolution = kept.resolution.unwrap();
        assert_eq!(resolution.decision, Decision::Modified);
        assert_eq!(resolution.modified_content.as_deref(), Some("изменённый план"));
    }

    #[tokio::test]
    async fn unknown_id_resolves_to_false() {
        let store = store(300, 1800);
        assert!(!store.resolve("hitl-none-0", Decision::Approved, None, None));
    }

    #[tokio::test(start_paused = true)]
    async fn unresolved_approval_auto_rejects_after_timeout() {
        let store = store(300, 1800);
        let (_, rx) = store.create("s1", ApprovalKind::DecompositionDecision, "?", None, None);

        tokio::time::advance(Duration::from_secs(301)).await;
        let resolution = rx.await.expect("timer resolved");
        assert_eq!(resolution.decision, Decision::Rejected);
        assert_eq!(resolution.feedback.as_deref(), Some(TIMEOUT_FEEDBACK));
    }

    #[tokio::test(start_paused = true)]
    async fn resolved_record_purges_after_ttl() {
        let store = store(300, 1800);
        let (record, _rx) = store.create("s1", ApprovalKind::PlanApproval, "?", None, None);
        store.resolve(&record.item_id, Decision::Approved, None, None);
        assert!(store.get(&record.item_id).is_some());

        tokio::time::advance(Duration::from_secs(1801)).await;
        // Let the purge task run
        tokio::task::yield_now().await;
        tokio::task::yield_now().await;
        assert!(store.get(&record.item_id).is_none());
    }

    #[tokio::test]
    async fn pending_lists_only_unresolved_for_the_session() {
        let store = store(300, 1800);
        let (a, _rx_a) = store.create("s1", ApprovalKind::PlanApproval, "a?", None, None);
        let (_b, _rx_b) = store.create("s1", ApprovalKind::PlanApproval, "b?", None, None);
        let (_c, _rx_c) = store.create("s2", ApprovalKind::PlanApproval, "c?", None, None);

        store.resolve(&a.item_id, Decision::Approved, None, None);
        let pending = store.pending_for("s1");
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].question, "b?");
    }

    #[tokio::test]
    async fn ids_are_unique_within_one_millisecond() {
        let store = store(300, 1800);
        let (a, _rx_a) = store.create("s1", ApprovalKind::PlanApproval, "?", None, None);
        let (b, _rx_b) = store.create("s1", ApprovalKind::PlanApproval, "?", None, None);
        assert_ne!(a.item_id, b.item_id);
    }
}
