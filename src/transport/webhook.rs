//! HTTP(S) webhook transport
//!
//! Posts `multipart/form-data` with the message as a `payload_json` part
//! and each attachment as a `files[n]` part, the layout chat webhooks
//! expect for uploads.

use super::ReportTransport;
use crate::error::{AuditError, Result};
use crate::payload::{Attachment, AttachmentRef, WebhookMessage};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Url;
use serde::Serialize;
use std::time::Duration;

/// Webhook client for a single pre-shared endpoint URL
#[derive(Debug, Clone)]
pub struct HttpWebhookTransport {
    client: reqwest::Client,
    url: Url,
}

#[derive(Serialize)]
struct PayloadJson<'a> {
    #[serde(flatten)]
    message: &'a WebhookMessage,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    attachments: Vec<AttachmentRef>,
}

impl HttpWebhookTransport {
    /// Build a client for `url` with a per-request `timeout`
    pub fn new(url: &str, timeout: Duration) -> Result<Self> {
        let url = parse_webhook_url(url)?;
        let client = reqwest::Client::builder()
            .user_agent(concat!("session-audit/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| AuditError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, url })
    }

    /// Endpoint reduced to scheme, host and port
    ///
    /// The path carries the webhook secret and the userinfo may carry
    /// credentials; neither is ever logged.
    fn redacted_url(&self) -> String {
        let host = self.url.host_str().unwrap_or_default();
        match self.url.port() {
            Some(port) => format!("{}://{}:{}", self.url.scheme(), host, port),
            None => format!("{}://{}", self.url.scheme(), host),
        }
    }
}

/// Parse a webhook endpoint, accepting only http(s) URLs with a host
///
/// Error messages never echo the URL itself.
pub fn parse_webhook_url(url: &str) -> Result<Url> {
    let parsed = Url::parse(url)
        .map_err(|e| AuditError::Config(format!("Invalid webhookUrl: {}", e)))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(AuditError::Config(format!(
            "webhookUrl must be an http(s) URL, got scheme '{}'",
            parsed.scheme()
        )));
    }

    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(AuditError::Config("webhookUrl has no host".to_string()));
    }

    Ok(parsed)
}

/// Serialize the `payload_json` part
fn payload_json(message: &WebhookMessage, attachments: &[Attachment]) -> Result<String> {
    let refs = attachments
        .iter()
        .enumerate()
        .map(|(id, a)| AttachmentRef {
            id,
            filename: a.file_name.clone(),
        })
        .collect();

    Ok(serde_json::to_string(&PayloadJson {
        message,
        attachments: refs,
    })?)
}

#[async_trait]
impl ReportTransport for HttpWebhookTransport {
    async fn send(&self, message: &WebhookMessage, attachments: &[Attachment]) -> Result<()> {
        let mut form = Form::new().text("payload_json", payload_json(message, attachments)?);

        for (i, attachment) in attachments.iter().enumerate() {
            let bytes = tokio::fs::read(&attachment.path).await.map_err(|e| {
                AuditError::Artifact {
                    path: attachment.path.display().to_string(),
                    reason: e.to_string(),
                }
            })?;
            let part = Part::bytes(bytes).file_name(attachment.file_name.clone());
            form = form.part(format!("files[{}]", i), part);
        }

        let response = self
            .client
            .post(self.url.clone())
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                AuditError::Transport(format!("{}: {}", self.redacted_url(), e.without_url()))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuditError::Delivery {
                status: status.as_u16(),
                body,
            });
        }

        tracing::info!(
            endpoint = %self.redacted_url(),
            status = status.as_u16(),
            attachments = attachments.len(),
            "Report delivered"
        );
        Ok(())
    }

    fn name(&self) -> &str {
        "webhook"
    }
}
