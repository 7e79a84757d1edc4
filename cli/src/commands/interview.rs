use clap::Subcommand;
use serde_json::json;

use crate::util::{api_request, parse_json_arg};

#[derive(Subcommand)]
pub enum InterviewCommands {
    /// Start (or resume) the profile interview
    Start {
        /// User identifier
        #[arg(long, env = "PROFIL_USER_ID")]
        user_id: String,
    },
    /// Submit an answer to an interview question
    Answer {
        /// User identifier
        #[arg(long, env = "PROFIL_USER_ID")]
        user_id: String,
        /// Question number (1-7)
        #[arg(long)]
        question_number: u8,
        /// The user's answer text
        #[arg(long)]
        answer: String,
        /// Accumulated interview state as a JSON object (from the previous
        /// response; defaults to an empty state)
        #[arg(long, default_value = "{}")]
        state: String,
    },
}

pub async fn run(api_url: &str, command: InterviewCommands) -> i32 {
    match command {
        InterviewCommands::Start { user_id } => {
            let body = json!({ "user_id": user_id });
            api_request(
                api_url,
                reqwest::Method::POST,
                "/v1/interview/start",
                Some(body),
                &[],
            )
            .await
        }
        InterviewCommands::Answer {
            user_id,
            question_number,
            answer,
            state,
        } => {
            let state_value = parse_json_arg("state", &state);
            let body = json!({
                "user_id": user_id,
                "question_number": question_number,
                "answer": answer,
                "interview_state": state_value
            });
            api_request(
                api_url,
                reqwest::Method::POST,
                "/v1/interview/answer",
                Some(body),
                &[],
            )
            .await
        }
    }
}
