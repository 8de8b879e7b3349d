//! Time-windowed, concurrency-safe audit event ledger
//!
//! Producers append from any thread; eviction is lazy and happens on the
//! next write or read. Only the front of the queue is ever evicted, which
//! relies on producers stamping an event just before appending it. A late,
//! out-of-order append can hold stale entries behind it for a while but
//! can never cause a fresh entry to be removed.
//!
//! Events are stored behind `Arc`, so the critical section of a snapshot
//! only copies pointers; the deep copy handed to the caller is made after
//! the lock is released.

use crate::types::{now_millis, AuditEvent};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Insertion-ordered sliding window of audit events
#[derive(Debug)]
pub struct EventLedger {
    events: Mutex<VecDeque<Arc<AuditEvent>>>,
    retention: Duration,
}

impl EventLedger {
    /// Create an empty ledger keeping events for `retention`
    pub fn new(retention: Duration) -> Self {
        Self {
            events: Mutex::new(VecDeque::new()),
            retention,
        }
    }

    pub fn retention(&self) -> Duration {
        self.retention
    }

    /// Append an event, then evict anything older than the window
    pub fn record(&self, event: AuditEvent) {
        let event = Arc::new(event);
        let mut events = self.lock();
        events.push_back(event);
        evict_front(&mut events, now_millis(), self.retention);
    }

    /// Evict against the configured retention; returns how many were dropped
    pub fn evict(&self, now: u64) -> usize {
        self.evict_with(now, self.retention)
    }

    /// Pop from the front while the oldest entry is older than `retention`
    pub fn evict_with(&self, now: u64, retention: Duration) -> usize {
        let evicted = evict_front(&mut self.lock(), now, retention);
        if evicted > 0 {
            tracing::debug!(evicted, "Evicted expired audit events");
        }
        evicted
    }

    /// Retained events in insertion order, as of the current wall clock
    pub fn snapshot(&self) -> Vec<AuditEvent> {
        self.snapshot_at(now_millis())
    }

    /// Retained events in insertion order, after evicting for `now`
    pub fn snapshot_at(&self, now: u64) -> Vec<AuditEvent> {
        let shared: Vec<Arc<AuditEvent>> = {
            let mut events = self.lock();
            evict_front(&mut events, now, self.retention);
            events.iter().cloned().collect()
        };
        shared.iter().map(|event| AuditEvent::clone(event)).collect()
    }

    /// Number of events currently held, without an eviction pass
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // A panic while holding the lock cannot leave the queue half-mutated
    // (push/pop are atomic), so a poisoned guard is still usable.
    fn lock(&self) -> MutexGuard<'_, VecDeque<Arc<AuditEvent>>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn evict_front(events: &mut VecDeque<Arc<AuditEvent>>, now: u64, retention: Duration) -> usize {
    // Windows longer than u64 milliseconds never expire anything
    let max_age = u64::try_from(retention.as_millis()).unwrap_or(u64::MAX);
    let mut evicted = 0;
    while let Some(oldest) = events.front() {
        if oldest.age_millis(now) <= max_age {
            break;
        }
        events.pop_front();
        evicted += 1;
    }
    evicted
}
