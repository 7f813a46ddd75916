//! Webhook client. Forwards scan requests to the external automation workflow.
//!
//! One attempt per request: no retry, and no timeout unless one is configured.
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::models::scan::{ScanRequest, ScanResult};

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("webhook failed with status: {0}")]
    Status(u16),

    #[error("unexpected result shape: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Successful upstream reply: its status and JSON body, untouched.
#[derive(Debug, Clone)]
pub struct UpstreamReply {
    pub status: u16,
    pub body: Value,
}

#[derive(Clone)]
pub struct WebhookClient {
    client: Client,
    url: String,
}

impl WebhookClient {
    pub fn new(url: impl Into<String>, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build().context("Failed to build HTTP client")?,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// POSTs `payload` as JSON and returns the upstream JSON body.
    /// A non-2xx status is an error; so is a body that is not JSON.
    pub async fn forward(&self, payload: &Value) -> Result<UpstreamReply, ScanError> {
        let response = self.client.post(&self.url).json(payload).send().await?;

        let status = response.status();
        if !status.is_success() {
            debug!("Scan webhook returned {status}");
            return Err(ScanError::Status(status.as_u16()));
        }

        let body: Value = response.json().await?;
        debug!("Scan webhook replied {status}");

        Ok(UpstreamReply {
            status: status.as_u16(),
            body,
        })
    }

    /// Typed variant used by the server-rendered form.
    pub async fn submit(&self, request: &ScanRequest) -> Result<ScanResult, ScanError> {
        let payload = serde_json::to_value(request)?;
        let reply = self.forward(&payload).await?;
        Ok(serde_json::from_value(reply.body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const HOOK_PATH: &str = "/webhook-test/my-resume-scanner";

    fn client_for(server: &MockServer) -> WebhookClient {
        WebhookClient::new(
            format!("{}{HOOK_PATH}", server.uri()),
            Some(Duration::from_secs(5)),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_forward_sends_payload_unmodified() {
        let server = MockServer::start().await;
        let payload = json!({
            "job_description": "Senior Rust Engineer",
            "folder_name": "resumes_batch_2025",
            "extra": {"kept": true}
        });
        Mock::given(method("POST"))
            .and(path(HOOK_PATH))
            .and(body_json(payload.clone()))
            .respond_with(ResponseTemplate::new(202).set_body_json(json!({"queued": 1})))
            .expect(1)
            .mount(&server)
            .await;

        let reply = client_for(&server).forward(&payload).await.unwrap();
        assert_eq!(reply.status, 202);
        assert_eq!(reply.body, json!({"queued": 1}));
    }

    #[tokio::test]
    async fn test_non_success_status_is_error_without_retry() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(HOOK_PATH))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        let err = client_for(&server).forward(&json!({})).await.unwrap_err();
        assert!(matches!(err, ScanError::Status(503)));
        assert_eq!(err.to_string(), "webhook failed with status: 503");
    }

    #[tokio::test]
    async fn test_non_json_body_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(HOOK_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_string("Workflow was started"))
            .mount(&server)
            .await;

        let err = client_for(&server).forward(&json!({})).await.unwrap_err();
        assert!(matches!(err, ScanError::Http(_)));
    }

    #[tokio::test]
    async fn test_unreachable_upstream_is_error() {
        let client = WebhookClient::new("http://127.0.0.1:9/hook", Some(Duration::from_secs(2))).unwrap();
        let err = client.forward(&json!({})).await.unwrap_err();
        assert!(matches!(err, ScanError::Http(_)));
    }

    #[tokio::test]
    async fn test_submit_decodes_result() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(HOOK_PATH))
            .and(body_json(json!({
                "job_description": "Data engineer",
                "folder_name": "batch_1"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "Sam",
                "contact": "sam@example.com",
                "status": "rejected",
                "score": 41,
                "reason": "No Spark experience"
            })))
            .mount(&server)
            .await;

        let result = client_for(&server)
            .submit(&ScanRequest {
                job_description: "Data engineer".to_string(),
                folder_name: "batch_1".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(result.name, "Sam");
        assert!(!result.is_shortlisted());
        assert_eq!(result.score_label(), "41%");
    }
}
