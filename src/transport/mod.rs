//! Report transport trait — the seam for notification delivery
//!
//! The dispatcher hands a finished [`WebhookMessage`] and its file
//! attachments to a transport. `webhook` talks HTTP(S) to a real endpoint;
//! `memory` keeps messages in process for tests and dry runs.

use crate::error::Result;
use crate::payload::{Attachment, WebhookMessage};
use async_trait::async_trait;

pub mod memory;
pub mod webhook;

pub use memory::{MemoryTransport, SentMessage};
pub use webhook::HttpWebhookTransport;

/// Delivers report messages to an external endpoint
///
/// Any failure (connect error, timeout, unreadable attachment, non-success
/// response) must be returned as `Err`; reports are the whole point of
/// the feature and must not vanish silently.
#[async_trait]
pub trait ReportTransport: Send + Sync {
    /// Send `message` with `attachments` uploaded alongside it
    async fn send(&self, message: &WebhookMessage, attachments: &[Attachment]) -> Result<()>;

    /// Transport name (e.g., "webhook", "memory")
    fn name(&self) -> &str;
}
