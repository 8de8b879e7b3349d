//! In-process transport
//!
//! Records every message instead of sending it. Can be told to fail, which
//! is how tests observe the dispatcher's failure path.

use super::ReportTransport;
use crate::error::{AuditError, Result};
use crate::payload::{Attachment, WebhookMessage};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

/// A message captured by [`MemoryTransport`]
#[derive(Debug, Clone)]
pub struct SentMessage {
    pub message: WebhookMessage,
    pub attachments: Vec<Attachment>,
}

/// Transport that keeps messages in memory
#[derive(Debug, Default)]
pub struct MemoryTransport {
    sent: Mutex<Vec<SentMessage>>,
    attempts: AtomicUsize,
    failure: Option<String>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// A transport whose every send fails with `reason`
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            failure: Some(reason.into()),
            ..Self::default()
        }
    }

    /// Successfully delivered messages, oldest first
    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of `send` calls, failed ones included
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReportTransport for MemoryTransport {
    async fn send(&self, message: &WebhookMessage, attachments: &[Attachment]) -> Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);

        if let Some(reason) = &self.failure {
            return Err(AuditError::Transport(reason.clone()));
        }

        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(SentMessage {
                message: message.clone(),
                attachments: attachments.to_vec(),
            });
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message() -> WebhookMessage {
        WebhookMessage {
            username: "host".to_string(),
            embeds: vec![],
        }
    }

    #[tokio::test]
    async fn test_records_messages() {
        let transport = MemoryTransport::new();
        transport
            .send(&message(), &[Attachment::from_path("/tmp/a.zip")])
            .await
            .unwrap();

        let sent = transport.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].message.username, "host");
        assert_eq!(sent[0].attachments[0].file_name, "a.zip");
        assert_eq!(transport.attempts(), 1);
        assert_eq!(transport.name(), "memory");
    }

    #[tokio::test]
    async fn test_failing_transport() {
        let transport = MemoryTransport::failing("endpoint down");
        let err = transport.send(&message(), &[]).await.unwrap_err();

        assert!(matches!(err, AuditError::Transport(ref r) if r == "endpoint down"));
        assert!(transport.sent().is_empty());
        assert_eq!(transport.attempts(), 1);
    }
}
