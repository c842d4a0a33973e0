//! State-change notifications.
//!
//! [`EventBus`] wraps a `tokio::sync::broadcast` channel with a bounded
//! ring-buffer of recent changes so that late subscribers can catch up.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::project::{AgentLogEntry, ProjectState};
use crate::stage::Stage;

/// Maximum number of changes retained in the ring buffer.
const MAX_RECENT_CHANGES: usize = 100;

// ---------------------------------------------------------------------------
// ChangeKind
// ---------------------------------------------------------------------------

/// What a mutation did.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChangeKind {
    /// The whole state was swapped (new project, new script, new storyboard).
    Replaced,
    StageChanged {
        from: Stage,
        to: Stage,
    },
    LogAppended {
        entry: AgentLogEntry,
    },
    FrameUpdated {
        index: usize,
    },
    FrameSelected {
        index: usize,
    },
    /// Production picked up a frame: it is flagged as generating and selected.
    SceneStarted {
        index: usize,
    },
}

// ---------------------------------------------------------------------------
// StateChange
// ---------------------------------------------------------------------------

/// A published mutation together with the snapshot it produced.
#[derive(Debug, Clone)]
pub struct StateChange {
    /// Strictly increasing per store; equals publication order.
    pub version: u64,
    pub kind: ChangeKind,
    pub snapshot: Arc<ProjectState>,
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Broadcast channel with a bounded ring buffer of recent changes.
pub struct EventBus {
    tx: broadcast::Sender<StateChange>,
    recent: RwLock<VecDeque<StateChange>>,
}

impl EventBus {
    /// Create a new event bus.
    ///
    /// `capacity` controls the broadcast channel buffer size (not the ring
    /// buffer, which is always [`MAX_RECENT_CHANGES`]).
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self {
            tx,
            recent: RwLock::new(VecDeque::with_capacity(MAX_RECENT_CHANGES)),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StateChange> {
        self.tx.subscribe()
    }

    /// Publish a change to all current subscribers and remember it.
    pub fn publish(&self, change: StateChange) {
        {
            let mut recent = self.recent.write();
            if recent.len() >= MAX_RECENT_CHANGES {
                recent.pop_back();
            }
            recent.push_front(change.clone());
        }

        if self.tx.send(change).is_err() {
            tracing::trace!("No subscribers for state change");
        }
    }

    /// Return the `n` most recent changes (newest first).
    pub fn recent_changes(&self, n: usize) -> Vec<StateChange> {
        let recent = self.recent.read();
        recent.iter().take(n).cloned().collect()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
