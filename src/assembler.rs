//! Audit log export
//!
//! Combines the host roster with a ledger snapshot. The two captures are
//! not atomic with respect to each other: a client may connect or leave
//! between them, and consumers must accept that skew.

use crate::host::SessionHost;
use crate::ledger::EventLedger;
use crate::types::AuditLog;
use std::sync::Arc;

/// Builds [`AuditLog`]s from the ledger and the live roster
#[derive(Clone)]
pub struct AuditLogAssembler {
    ledger: Arc<EventLedger>,
    host: Arc<dyn SessionHost>,
}

impl AuditLogAssembler {
    pub fn new(ledger: Arc<EventLedger>, host: Arc<dyn SessionHost>) -> Self {
        Self { ledger, host }
    }

    /// Evict for `now`, then capture roster and events
    pub fn build_audit_log(&self, now: u64) -> AuditLog {
        self.ledger.evict(now);
        let clients = self.host.connected_clients();
        let events = self.ledger.snapshot_at(now);

        tracing::debug!(
            clients = clients.len(),
            events = events.len(),
            "Audit log assembled"
        );

        AuditLog {
            exported_at: now,
            clients,
            events,
        }
    }

    pub fn ledger(&self) -> &Arc<EventLedger> {
        &self.ledger
    }
}
