pub mod prefs;
pub mod rag;

use crate::error::AppError;

/// Classify a reqwest error at the client boundary. Connection-level
/// failures (refused, DNS, timeout) become `UpstreamUnavailable`;
/// anything else is internal — a bug in how we built the request.
pub(crate) fn classify_transport_error(service: &'static str, err: reqwest::Error) -> AppError {
    if err.is_timeout() || err.is_connect() || err.is_request() {
        AppError::UpstreamUnavailable {
            service,
            detail: err.to_string(),
        }
    } else {
        AppError::Internal(format!("{service} client error: {err}"))
    }
}

/// Turn a non-2xx response into `UpstreamRejected`, passing the body
/// through so the caller/UI can show something actionable.
pub(crate) async fn reject_from_response(
    service: &'static str,
    resp: reqwest::Response,
) -> AppError {
    let status = resp.status().as_u16();
    let body = resp
        .text()
        .await
        .unwrap_or_else(|_| "<unreadable body>".to_string());
    AppError::UpstreamRejected {
        service,
        status,
        body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn connect_refused_classifies_as_upstream_unavailable() {
        // Port 9 (discard) is never serving HTTP
        let err = reqwest::Client::new()
            .get("http://127.0.0.1:9/health")
            .send()
            .await
            .expect_err("nothing listens on port 9");

        match classify_transport_error("rag", err) {
            AppError::UpstreamUnavailable { service, .. } => assert_eq!(service, "rag"),
            other => panic!("classified as {other:?}"),
        }
    }

    #[tokio::test]
    async fn non_2xx_response_classifies_as_rejected_with_body_passthrough() {
        let resp = reqwest::Response::from(
            axum::http::Response::builder()
                .status(502)
                .body("workspace quota exceeded")
                .unwrap(),
        );

        match reject_from_response("preferences", resp).await {
            AppError::UpstreamRejected {
                service,
                status,
                body,
            } => {
                assert_eq!(service, "preferences");
                assert_eq!(status, 502);
                assert_eq!(body, "workspace quota exceeded");
            }
            other => panic!("classified as {other:?}"),
        }
    }
}
