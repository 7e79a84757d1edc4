//! MCP runtime for Profil.
//!
//! A stdio JSON-RPC server exposing the profile tools to a voice agent.
//! Every tool call forwards to the Profil API over HTTP; the runtime
//! itself holds no state. Transport failures become `isError` tool
//! results with a short non-technical message — in the voice context the
//! agent reads tool output aloud, so raw error text stays out of it.

use clap::Subcommand;
use reqwest::Method;
use serde_json::{Value, json};
use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader};

mod util;

use util::api_request;

const MCP_PROTOCOL_VERSION: &str = "2024-11-05";
const MCP_SERVER_NAME: &str = "profil-mcp";

/// Read-aloud-safe message for transport failures.
const UNAVAILABLE_MESSAGE: &str = "Сервис временно недоступен, попробуйте ещё раз";

#[derive(Subcommand)]
pub enum McpCommands {
    /// Serve MCP over stdio (the default integration mode)
    Serve,
    /// Print the tool list as JSON and exit
    Tools,
}

pub async fn run(api_url: &str, command: McpCommands) -> i32 {
    match command {
        McpCommands::Serve => serve_stdio(api_url).await,
        McpCommands::Tools => {
            println!(
                "{}",
                serde_json::to_string_pretty(&tool_definitions()).unwrap_or_default()
            );
            0
        }
    }
}

/// The tool surface, in the order a fresh session should consider them.
fn tool_definitions() -> Value {
    json!([
        {
            "name": "start_profile_interview",
            "description": "Начать интервью о предпочтениях пользователя. Если профиль уже заполнен, вернёт already_completed.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "user_id": { "type": "string" }
                },
                "required": ["user_id"]
            }
        },
        {
            "name": "continue_profile_interview",
            "description": "Передать ответ пользователя на текущий вопрос интервью и получить следующий. Состояние интервью возвращается с каждым ответом и должно передаваться обратно без изменений.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "user_id": { "type": "string" },
                    "question_number": { "type": "integer", "minimum": 1, "maximum": 7 },
                    "answer": { "type": "string" },
                    "interview_state": { "type": "object" }
                },
                "required": ["user_id", "question_number", "answer", "interview_state"]
            }
        },
        {
            "name": "check_profile_completeness",
            "description": "Проверить, насколько заполнен профиль пользователя. progressive=true проверяет каждую категорию отдельным запросом.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "user_id": { "type": "string" },
                    "progressive": { "type": "boolean", "default": false }
                },
                "required": ["user_id"]
            }
        },
        {
            "name": "save_profile_insight",
            "description": "Сохранить одно наблюдение о пользователе в указанную категорию профиля. Можно вызывать в любой момент разговора.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "user_id": { "type": "string" },
                    "category": { "type": "string" },
                    "insight": { "type": "string" }
                },
                "required": ["user_id", "category", "insight"]
            }
        },
        {
            "name": "update_user_preference",
            "description": "Распознать в реплике пользователя просьбу изменить предпочтение и применить её. Извлечённое значение — предложение: подтвердите его с пользователем.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "user_id": { "type": "string" },
                    "text": { "type": "string" }
                },
                "required": ["user_id", "text"]
            }
        },
        {
            "name": "get_user_preferences",
            "description": "Получить сохранённые предпочтения пользователя.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "user_id": { "type": "string" }
                },
                "required": ["user_id"]
            }
        }
    ])
}

/// Map one tool call onto an API request.
async fn dispatch_tool(api_url: &str, name: &str, args: &Value) -> Result<(u16, Value), String> {
    match name {
        "start_profile_interview" => {
            api_request(
                api_url,
                Method::POST,
                "/v1/interview/start",
                Some(json!({ "user_id": args["user_id"] })),
                &[],
            )
            .await
        }
        "continue_profile_interview" => {
            api_request(
                api_url,
                Method::POST,
                "/v1/interview/answer",
                Some(json!({
                    "user_id": args["user_id"],
                    "question_number": args["question_number"],
                    "answer": args["answer"],
                    "interview_state": args["interview_state"],
                })),
                &[],
            )
            .await
        }
        "check_profile_completeness" => {
            let path = if args["progressive"].as_bool().unwrap_or(false) {
                "/v1/profile/completeness/progressive"
            } else {
                "/v1/profile/completeness"
            };
            api_request(
                api_url,
                Method::POST,
                path,
                Some(json!({ "user_id": args["user_id"] })),
                &[],
            )
            .await
        }
        "save_profile_insight" => {
            api_request(
                api_url,
                Method::POST,
                "/v1/profile/insight",
                Some(json!({
                    "user_id": args["user_id"],
                    "category": args["category"],
                    "insight": args["insight"],
                })),
                &[],
            )
            .await
        }
        "update_user_preference" => {
            api_request(
                api_url,
                Method::POST,
                "/v1/preferences/update-request",
                Some(json!({ "user_id": args["user_id"], "text": args["text"] })),
                &[],
            )
            .await
        }
        "get_user_preferences" => {
            api_request(
                api_url,
                Method::POST,
                "/v1/preferences",
                Some(json!({
                    "user_id": args["user_id"],
                    "tool_name": "get_user_preferences",
                    "parameters": {},
                })),
                &[],
            )
            .await
        }
        other => Err(format!("unknown tool: {other}")),
    }
}

/// Wrap an API outcome in the MCP tool-result envelope.
fn tool_envelope(outcome: Result<(u16, Value), String>) -> Value {
    match outcome {
        Ok((status, body)) => {
            let is_error = status >= 400;
            json!({
                "content": [{
                    "type": "text",
                    "text": serde_json::to_string(&body).unwrap_or_default()
                }],
                "isError": is_error
            })
        }
        Err(detail) => {
            eprintln!("profil-mcp: transport error: {detail}");
            json!({
                "content": [{ "type": "text", "text": UNAVAILABLE_MESSAGE }],
                "isError": true
            })
        }
    }
}

fn jsonrpc_result(id: &Value, result: Value) -> Value {
    json!({ "jsonrpc": "2.0", "id": id, "result": result })
}

fn jsonrpc_error(id: &Value, code: i64, message: &str) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": { "code": code, "message": message }
    })
}

/// Handle one parsed JSON-RPC request. Returns None for notifications.
async fn handle_request(api_url: &str, request: &Value) -> Option<Value> {
    let method = request["method"].as_str().unwrap_or_default();
    let id = &request["id"];

    // Notifications carry no id and expect no answer
    if id.is_null() {
        return None;
    }

    let response = match method {
        "initialize" => jsonrpc_result(
            id,
            json!({
                "protocolVersion": MCP_PROTOCOL_VERSION,
                "capabilities": { "tools": {} },
                "serverInfo": {
                    "name": MCP_SERVER_NAME,
                    "version": env!("CARGO_PKG_VERSION")
                }
            }),
        ),
        "ping" => jsonrpc_result(id, json!({})),
        "tools/list" => jsonrpc_result(id, json!({ "tools": tool_definitions() })),
        "tools/call" => {
            let name = request["params"]["name"].as_str().unwrap_or_default();
            let args = &request["params"]["arguments"];
            match dispatch_tool(api_url, name, args).await {
                Err(detail) if detail.starts_with("unknown tool") => {
                    jsonrpc_error(id, -32602, &detail)
                }
                outcome => jsonrpc_result(id, tool_envelope(outcome)),
            }
        }
        _ => jsonrpc_error(id, -32601, &format!("method not found: {method}")),
    };

    Some(response)
}

/// Serve MCP over stdio until stdin closes.
pub async fn serve_stdio(api_url: &str) -> i32 {
    let stdin = BufReader::new(io::stdin());
    let mut stdout = io::stdout();
    let mut lines = stdin.lines();

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => return 0,
            Err(e) => {
                eprintln!("profil-mcp: stdin error: {e}");
                return 1;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let request: Value = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                let err = jsonrpc_error(&Value::Null, -32700, &format!("parse error: {e}"));
                if write_line(&mut stdout, &err).await.is_err() {
                    return 1;
                }
                continue;
            }
        };

        if let Some(response) = handle_request(api_url, &request).await {
            if write_line(&mut stdout, &response).await.is_err() {
                return 1;
            }
        }
    }
}

async fn write_line(stdout: &mut io::Stdout, value: &Value) -> io::Result<()> {
    let mut line = serde_json::to_string(value).unwrap_or_default();
    line.push('\n');
    stdout.write_all(line.as_bytes()).await?;
    stdout.flush().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_list_covers_the_profile_surface() {
        let tools = tool_definitions();
        let names: Vec<&str> = tools
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["name"].as_str().unwrap())
            .collect();
        assert!(names.contains(&"start_profile_interview"));
        assert!(names.contains(&"continue_profile_interview"));
        assert!(names.contains(&"check_profile_completeness"));
        assert!(names.contains(&"save_profile_insight"));
        assert!(names.contains(&"update_user_preference"));
        assert!(names.contains(&"get_user_preferences"));
    }

    #[test]
    fn every_tool_requires_user_id() {
        let tools = tool_definitions();
        for tool in tools.as_array().unwrap() {
            let required = tool["inputSchema"]["required"].as_array().unwrap();
            assert!(
                required.iter().any(|r| r == "user_id"),
                "tool {} missing user_id",
                tool["name"]
            );
        }
    }

    #[tokio::test]
    async fn notifications_get_no_response() {
        let request = json!({ "jsonrpc": "2.0", "method": "notifications/initialized" });
        assert!(handle_request("http://localhost:0", &request).await.is_none());
    }

    #[tokio::test]
    async fn initialize_reports_protocol_and_server() {
        let request = json!({ "jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {} });
        let response = handle_request("http://localhost:0", &request)
            .await
            .unwrap();
        assert_eq!(
            response["result"]["protocolVersion"],
            json!(MCP_PROTOCOL_VERSION)
        );
        assert_eq!(response["result"]["serverInfo"]["name"], json!(MCP_SERVER_NAME));
    }

    #[tokio::test]
    async fn unknown_method_is_a_jsonrpc_error() {
        let request = json!({ "jsonrpc": "2.0", "id": 2, "method": "bogus" });
        let response = handle_request("http://localhost:0", &request)
            .await
            .unwrap();
        assert_eq!(response["error"]["code"], json!(-32601));
    }

    #[tokio::test]
    async fn unknown_tool_is_an_invalid_params_error() {
        let request = json!({
            "jsonrpc": "2.0", "id": 3, "method": "tools/call",
            "params": { "name": "bogus_tool", "arguments": {} }
        });
        let response = handle_request("http://localhost:0", &request)
            .await
            .unwrap();
        assert_eq!(response["error"]["code"], json!(-32602));
    }

    #[tokio::test]
    async fn unreachable_api_becomes_an_is_error_tool_result() {
        // Port 9 (discard) is never serving HTTP
        let request = json!({
            "jsonrpc": "2.0", "id": 4, "method": "tools/call",
            "params": { "name": "get_user_preferences", "arguments": { "user_id": "u1" } }
        });
        let response = handle_request("http://127.0.0.1:9", &request).await.unwrap();
        assert_eq!(response["result"]["isError"], json!(true));
        assert_eq!(
            response["result"]["content"][0]["text"],
            json!(UNAVAILABLE_MESSAGE)
        );
    }
}
