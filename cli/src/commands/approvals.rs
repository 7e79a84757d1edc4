use clap::Subcommand;
use serde_json::json;

use crate::util::api_request;

#[derive(Subcommand)]
pub enum ApprovalCommands {
    /// Create an approval request and block until it is resolved
    Create {
        /// Session identifier
        #[arg(long)]
        session_id: String,
        /// Approval kind ("plan-approval" or "decomposition-decision")
        #[arg(long, default_value = "plan-approval")]
        kind: String,
        /// Question shown to the reviewer
        #[arg(long)]
        question: String,
        /// Content under review
        #[arg(long, default_value = "")]
        content: String,
    },
    /// Resolve a pending approval
    Resolve {
        /// Session identifier
        #[arg(long)]
        session_id: String,
        /// Approval item identifier
        #[arg(long)]
        item_id: String,
        /// Decision: "approved", "rejected" or "modified"
        #[arg(long)]
        decision: String,
        /// Replacement content (only for "modified")
        #[arg(long)]
        modified_content: Option<String>,
        /// Free-form reviewer feedback
        #[arg(long)]
        feedback: Option<String>,
    },
    /// List pending approvals for a session
    Pending {
        /// Session identifier
        #[arg(long)]
        session_id: String,
    },
}

pub async fn run(api_url: &str, command: ApprovalCommands) -> i32 {
    match command {
        ApprovalCommands::Create {
            session_id,
            kind,
            question,
            content,
        } => {
            let body = json!({
                "session_id": session_id,
                "type": kind,
                "question": question,
                "content": content
            });
            api_request(
                api_url,
                reqwest::Method::POST,
                "/v1/approvals",
                Some(body),
                &[],
            )
            .await
        }
        ApprovalCommands::Resolve {
            session_id,
            item_id,
            decision,
            modified_content,
            feedback,
        } => {
            let mut body = json!({
                "session_id": session_id,
                "item_id": item_id,
                "decision": decision
            });
            if let Some(mc) = modified_content {
                body["modified_content"] = json!(mc);
            }
            if let Some(fb) = feedback {
                body["feedback"] = json!(fb);
            }
            api_request(
                api_url,
                reqwest::Method::POST,
                "/v1/approvals/resolve",
                Some(body),
                &[],
            )
            .await
        }
        ApprovalCommands::Pending { session_id } => {
            api_request(
                api_url,
                reqwest::Method::GET,
                "/v1/approvals/pending",
                None,
                &[("session_id".to_string(), session_id)],
            )
            .await
        }
    }
}
