use serde_json::{Value, json};

pub fn client() -> reqwest::Client {
    reqwest::Client::new()
}

/// Execute one API request and return `(status, body)`. Connection-level
/// failures come back as `Err` with a short message; the MCP layer turns
/// them into `isError` tool results rather than protocol errors.
pub async fn api_request(
    api_url: &str,
    method: reqwest::Method,
    path: &str,
    body: Option<Value>,
    query: &[(String, String)],
) -> Result<(u16, Value), String> {
    let url = reqwest::Url::parse_with_params(&format!("{api_url}{path}"), query)
        .map_err(|e| format!("Invalid URL: {api_url}{path}: {e}"))?;

    let mut req = client().request(method, url);
    if let Some(b) = body {
        req = req.json(&b);
    }

    let resp = req.send().await.map_err(|e| format!("{e}"))?;
    let status = resp.status().as_u16();
    let body: Value = resp
        .json()
        .await
        .unwrap_or_else(|_| json!({"error": "non-json response"}));

    Ok((status, body))
}
