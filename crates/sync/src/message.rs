//! The reconnect signal delivered by the background sync mechanism.
//!
//! The message is a trigger. Its payload mirrors the queue at send time but
//! the durable queue stays the source of truth for what gets replayed.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::queue::QueuedAction;

/// Message type that asks for a replay of queued actions.
pub const REPLAY_ACTIONS: &str = "REPLAY_ACTIONS";

/// A message from the background sync mechanism: `{type, payload}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncMessage {
    /// Message type.
    #[serde(rename = "type")]
    pub kind: String,
    /// Message payload.
    #[serde(default)]
    pub payload: Value,
}

impl SyncMessage {
    /// Builds a replay request carrying `actions` in order.
    ///
    /// # Errors
    ///
    /// Returns an error if an action cannot be serialized.
    pub fn replay(actions: &[QueuedAction]) -> Result<Self, serde_json::Error> {
        Ok(Self {
            kind: REPLAY_ACTIONS.to_string(),
            payload: serde_json::to_value(actions)?,
        })
    }

    /// True if this message asks for a replay.
    #[must_use]
    pub fn is_replay(&self) -> bool {
        self.kind == REPLAY_ACTIONS
    }

    /// Number of entries the payload carries, 0 when it is not a list.
    #[must_use]
    pub fn carried_len(&self) -> usize {
        self.payload.as_array().map_or(0, Vec::len)
    }
}
