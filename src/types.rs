//! Core audit types for the session-audit system
//!
//! All types use camelCase JSON serialization so an exported `AuditLog`
//! can be dropped next to a replay's metadata without translation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier of a session participant (unique account id)
///
/// Per-client state is keyed by this value rather than by a live session
/// object, so lookups stay well-defined after the client disconnects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(pub u64);

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ClientId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Snapshot of a participant's public identity
///
/// Captured when an event referencing the participant is created. It is a
/// plain value, not a handle into the session host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditClient {
    /// Display name at capture time
    pub name: String,

    /// Unique account identifier
    pub account_id: ClientId,
}

impl AuditClient {
    pub fn new(name: impl Into<String>, account_id: u64) -> Self {
        Self {
            name: name.into(),
            account_id: ClientId(account_id),
        }
    }

    pub fn id(&self) -> ClientId {
        self.account_id
    }
}

/// What happened, and to whom
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum AuditEventKind {
    /// Client sent its first data frame
    PlayerConnected { client: AuditClient },

    /// Client left the session
    PlayerDisconnected { client: AuditClient },

    /// Client sent a chat line
    ChatMessage { client: AuditClient, text: String },
}

/// A single immutable audit record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEvent {
    /// Unix timestamp in milliseconds, fixed at creation
    pub timestamp: u64,

    #[serde(flatten)]
    pub kind: AuditEventKind,
}

impl AuditEvent {
    /// Create an event stamped with the current wall clock
    pub fn new(kind: AuditEventKind) -> Self {
        Self::at(now_millis(), kind)
    }

    /// Create an event with an explicit timestamp
    pub fn at(timestamp: u64, kind: AuditEventKind) -> Self {
        Self { timestamp, kind }
    }

    pub fn connected(client: AuditClient) -> Self {
        Self::new(AuditEventKind::PlayerConnected { client })
    }

    pub fn disconnected(client: AuditClient) -> Self {
        Self::new(AuditEventKind::PlayerDisconnected { client })
    }

    pub fn chat(client: AuditClient, text: impl Into<String>) -> Self {
        Self::new(AuditEventKind::ChatMessage {
            client,
            text: text.into(),
        })
    }

    /// The participant this event refers to
    pub fn client(&self) -> &AuditClient {
        match &self.kind {
            AuditEventKind::PlayerConnected { client }
            | AuditEventKind::PlayerDisconnected { client }
            | AuditEventKind::ChatMessage { client, .. } => client,
        }
    }

    /// Milliseconds elapsed between creation and `now`
    ///
    /// Events stamped in the future (clock skew between producers) report
    /// an age of zero.
    pub fn age_millis(&self, now: u64) -> u64 {
        now.saturating_sub(self.timestamp)
    }
}

/// Exported, read-only view of recent activity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLog {
    /// Unix timestamp in milliseconds at which the log was assembled
    pub exported_at: u64,

    /// Roster at export time
    pub clients: Vec<AuditClient>,

    /// Retained events in insertion order
    pub events: Vec<AuditEvent>,
}

impl AuditLog {
    /// Whether the roster contains the given participant
    pub fn has_client(&self, id: ClientId) -> bool {
        self.clients.iter().any(|c| c.account_id == id)
    }

    /// Events that refer to the given participant
    pub fn events_for(&self, id: ClientId) -> impl Iterator<Item = &AuditEvent> {
        self.events.iter().filter(move |e| e.client().account_id == id)
    }
}

/// Identifier of a captured clip; also the artifact file stem
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReplayId(String);

impl ReplayId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Fresh random identifier
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ReplayId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ReplayId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for ReplayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Handle to a captured clip plus the audit log taken when it was registered
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Replay {
    pub id: ReplayId,
    pub audit_log: AuditLog,
}

impl Replay {
    pub fn new(id: ReplayId, audit_log: AuditLog) -> Self {
        Self { id, audit_log }
    }

    /// Moment the report was triggered
    pub fn triggered_at(&self) -> u64 {
        self.audit_log.exported_at
    }
}

/// Current time in Unix milliseconds
pub fn now_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
