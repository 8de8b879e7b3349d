//! Per-client latest-replay table
//!
//! Written once per report trigger and once per disconnect, so a plain
//! mutex around the map is enough.

use crate::types::{ClientId, Replay};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Maps a connected client to the replay most recently registered for it
#[derive(Debug, Default)]
pub struct ReplayTable {
    replays: Mutex<HashMap<ClientId, Arc<Replay>>>,
}

impl ReplayTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `replay` as the latest for `client`, replacing any previous one
    pub fn set_latest(&self, client: ClientId, replay: impl Into<Arc<Replay>>) {
        let replay = replay.into();
        let replay_id = replay.id.clone();
        let previous = self.lock().insert(client, replay);

        tracing::debug!(
            client = %client,
            replay = %replay_id,
            replaced = ?previous.map(|r| r.id.clone()),
            "Latest replay registered"
        );
    }

    /// Latest replay for `client`, if any
    pub fn get_latest(&self, client: ClientId) -> Option<Arc<Replay>> {
        self.lock().get(&client).cloned()
    }

    /// Forget `client`'s replay; returns whatever was removed
    pub fn remove(&self, client: ClientId) -> Option<Arc<Replay>> {
        let removed = self.lock().remove(&client);
        if let Some(replay) = &removed {
            tracing::debug!(client = %client, replay = %replay.id, "Replay association cleared");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ClientId, Arc<Replay>>> {
        self.replays.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
