use clap::Subcommand;
use serde_json::json;

use crate::util::api_request;

#[derive(Subcommand)]
pub enum ProfileCommands {
    /// Check profile completeness against the knowledge base
    Completeness {
        /// User identifier
        #[arg(long, env = "PROFIL_USER_ID")]
        user_id: String,
        /// Probe each category with its own query instead of one broad query
        #[arg(long)]
        progressive: bool,
    },
    /// Save a single profile insight into the knowledge base
    Insight {
        /// User identifier
        #[arg(long, env = "PROFIL_USER_ID")]
        user_id: String,
        /// Category key (e.g. "competencies", "work_style")
        #[arg(long)]
        category: String,
        /// Insight text
        #[arg(long)]
        insight: String,
    },
}

pub async fn run(api_url: &str, command: ProfileCommands) -> i32 {
    match command {
        ProfileCommands::Completeness {
            user_id,
            progressive,
        } => {
            let path = if progressive {
                "/v1/profile/completeness/progressive"
            } else {
                "/v1/profile/completeness"
            };
            let body = json!({ "user_id": user_id });
            api_request(api_url, reqwest::Method::POST, path, Some(body), &[]).await
        }
        ProfileCommands::Insight {
            user_id,
            category,
            insight,
        } => {
            let body = json!({
                "user_id": user_id,
                "category": category,
                "insight": insight
            });
            api_request(
                api_url,
                reqwest::Method::POST,
                "/v1/profile/insight",
                Some(body),
                &[],
            )
            .await
        }
    }
}
