//! # session-audit
//!
//! Rolling audit trail and evidence-attached incident reports for
//! multi-user session hosts.
//!
//! ## Overview
//!
//! `session-audit` keeps a time-bounded ledger of connects, disconnects and
//! chat, associates each client with its latest captured replay, and turns
//! a player report into a sanitized webhook message with the replay's clip
//! and metadata attached.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use session_audit::{AuditClient, AuditConfig, ReportingService, SessionHost};
//! use std::net::IpAddr;
//! use std::sync::Arc;
//!
//! struct Host;
//!
//! impl SessionHost for Host {
//!     fn connected_clients(&self) -> Vec<AuditClient> { Vec::new() }
//!     fn public_address(&self) -> Option<(IpAddr, u16)> { None }
//!     fn append_client_config(&self, _payload: &str) {}
//! }
//!
//! # async fn example() -> session_audit::Result<()> {
//! let config = AuditConfig {
//!     webhook_url: Some("https://hooks.example.com/api/webhooks/1/token".into()),
//!     ..Default::default()
//! };
//! let service = ReportingService::builder(config, Arc::new(Host)).build()?;
//!
//! let suspect = AuditClient::new("suspect", 76561198000000001);
//! service.on_client_active(&suspect);
//! service.on_chat_message(&suspect, "gg ez");
//!
//! let replay = service.register_replay(suspect.account_id, "clip-42".into());
//! service.submit_report(&suspect, &replay, "spinbot").outcome().await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - **EventLedger** — concurrent sliding window of `AuditEvent`s
//! - **ReplayTable** — latest `Replay` per `ClientId`
//! - **AuditLogAssembler** — roster + ledger snapshot as an `AuditLog`
//! - **ReportDispatcher** — sanitized report over a `ReportTransport`
//! - **ReportingService** — wires the above to a `SessionHost`

pub mod access;
pub mod artifact;
pub mod assembler;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod host;
pub mod ledger;
pub mod payload;
pub mod replay;
pub mod sanitize;
pub mod service;
pub mod transport;
pub mod types;

// Re-export core types
pub use artifact::ArtifactStore;
pub use assembler::AuditLogAssembler;
pub use config::AuditConfig;
pub use dispatcher::{ReportDispatcher, ReportHandle, ReportOutcome};
pub use error::{AuditError, Result};
pub use host::{HostEvent, SessionClient, SessionHost};
pub use ledger::EventLedger;
pub use payload::{Attachment, Embed, EmbedAuthor, EmbedFooter, WebhookMessage};
pub use replay::ReplayTable;
pub use sanitize::{escape_markup, normalize_display_name};
pub use service::{ReportingService, ReportingServiceBuilder};
pub use types::{AuditClient, AuditEvent, AuditEventKind, AuditLog, ClientId, Replay, ReplayId};

// Re-export transports for convenience
pub use transport::{HttpWebhookTransport, MemoryTransport, ReportTransport, SentMessage};
