use clap::Subcommand;
use serde_json::json;

use crate::util::{api_request, parse_json_arg};

#[derive(Subcommand)]
pub enum PrefsCommands {
    /// Call a preference-service tool directly
    Call {
        /// User identifier
        #[arg(long, env = "PROFIL_USER_ID")]
        user_id: String,
        /// Tool name (e.g. "get_user_preferences", "update_preference_field")
        #[arg(long)]
        tool: String,
        /// Tool parameters as a JSON object
        #[arg(long, default_value = "{}")]
        params: String,
    },
    /// Detect and apply a natural-language preference update
    Update {
        /// User identifier
        #[arg(long, env = "PROFIL_USER_ID")]
        user_id: String,
        /// Free-form message, e.g. "Измени стиль общения на неформальный"
        #[arg(long)]
        message: String,
    },
}

pub async fn run(api_url: &str, command: PrefsCommands) -> i32 {
    match command {
        PrefsCommands::Call {
            user_id,
            tool,
            params,
        } => {
            let params_value = parse_json_arg("params", &params);
            let body = json!({
                "user_id": user_id,
                "tool_name": tool,
                "parameters": params_value
            });
            api_request(
                api_url,
                reqwest::Method::POST,
                "/v1/preferences",
                Some(body),
                &[],
            )
            .await
        }
        PrefsCommands::Update { user_id, message } => {
            let body = json!({
                "user_id": user_id,
                "text": message
            });
            api_request(
                api_url,
                reqwest::Method::POST,
                "/v1/preferences/update-request",
                Some(body),
                &[],
            )
            .await
        }
    }
}
