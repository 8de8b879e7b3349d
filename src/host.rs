//! Session host seam
//!
//! The host owns the live sessions. This crate only needs a roster query,
//! the public address, a way to append text to the client options blob,
//! and a way to turn a live client into an [`AuditClient`] snapshot.

use crate::error::Result;
use crate::types::AuditClient;
use std::net::IpAddr;

/// Host-wide queries and mutations
pub trait SessionHost: Send + Sync {
    /// Everyone connected right now
    fn connected_clients(&self) -> Vec<AuditClient>;

    /// Public IP and port, when known
    fn public_address(&self) -> Option<(IpAddr, u16)>;

    /// Append free text to the options blob sent to every client
    fn append_client_config(&self, payload: &str);
}

/// A live client as seen from a lifecycle callback
pub trait SessionClient {
    /// Snapshot the client's public identity
    ///
    /// Fails with [`AuditError::ClientState`](crate::AuditError::ClientState)
    /// when the host has already torn the client down.
    fn audit_client(&self) -> Result<AuditClient>;
}

impl SessionClient for AuditClient {
    fn audit_client(&self) -> Result<AuditClient> {
        Ok(self.clone())
    }
}

/// Lifecycle notifications a host can push instead of calling the
/// service directly
#[derive(Debug, Clone)]
pub enum HostEvent {
    /// First data frame was sent to the client
    ClientActive(AuditClient),

    /// Client left
    ClientDisconnected(AuditClient),

    /// Client sent a chat line
    ChatMessage { client: AuditClient, text: String },
}
