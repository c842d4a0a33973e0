//! The project state store.
//!
//! Holds the single authoritative [`ProjectState`] as an immutable `Arc`
//! snapshot. Every mutation clones the snapshot, edits the clone, swaps it in
//! and publishes a [`StateChange`] while still holding the write lock, so
//! subscribers see changes in exactly the order they were applied.

use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::broadcast;

use studio_core::events::{ChangeKind, EventBus, StateChange};
use studio_core::{AgentLogEntry, AgentTag, Error, Frame, ProjectState, Result, Stage};

struct Inner {
    snapshot: Arc<ProjectState>,
    version: u64,
}

/// Single-writer store for one project.
pub struct ProjectStore {
    inner: RwLock<Inner>,
    bus: EventBus,
}

impl ProjectStore {
    /// Create an idle store. `capacity` sizes the broadcast channel.
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: RwLock::new(Inner {
                snapshot: Arc::new(ProjectState::default()),
                version: 0,
            }),
            bus: EventBus::new(capacity),
        }
    }

    /// The current snapshot.
    pub fn snapshot(&self) -> Arc<ProjectState> {
        self.inner.read().snapshot.clone()
    }

    /// Number of mutations applied so far.
    pub fn version(&self) -> u64 {
        self.inner.read().version
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StateChange> {
        self.bus.subscribe()
    }

    /// The `n` most recent changes, newest first.
    pub fn recent_changes(&self, n: usize) -> Vec<StateChange> {
        self.bus.recent_changes(n)
    }

    /// Replace the whole state.
    pub fn replace(&self, state: ProjectState) -> Result<Arc<ProjectState>> {
        if !state.frame_index_is_valid() {
            return Err(Error::FrameIndexOutOfRange {
                index: state.current_frame_index,
                len: state.frames.len(),
            });
        }
        self.mutate(|current| {
            *current = state;
            Ok(ChangeKind::Replaced)
        })
        .map(|change| change.snapshot)
    }

    /// Move to `to`, applying `edit` in the same atomic step.
    ///
    /// Rejects edges that are not part of the stage graph.
    pub fn advance(
        &self,
        to: Stage,
        edit: impl FnOnce(&mut ProjectState),
    ) -> Result<Arc<ProjectState>> {
        self.mutate(|state| {
            let from = state.status;
            if !from.can_transition_to(to) {
                return Err(Error::Internal(format!(
                    "illegal stage transition {from} -> {to}"
                )));
            }
            edit(state);
            state.status = to;
            if !state.frame_index_is_valid() {
                state.current_frame_index = 0;
            }
            Ok(ChangeKind::StageChanged { from, to })
        })
        .map(|change| {
            tracing::info!(stage = %to, "Project stage changed");
            change.snapshot
        })
    }

    /// Move to `to` without other edits.
    pub fn set_stage(&self, to: Stage) -> Result<Arc<ProjectState>> {
        self.advance(to, |_| {})
    }

    /// Append one entry to the activity log.
    pub fn append_log(&self, agent: AgentTag, message: impl Into<String>) -> AgentLogEntry {
        let entry = AgentLogEntry::new(agent, message);
        tracing::debug!(agent = %entry.agent, "{}", entry.message);

        let appended = entry.clone();
        // Appending cannot fail, so the result carries no information.
        let _ = self.mutate(move |state| {
            state.logs.push(appended.clone());
            Ok(ChangeKind::LogAppended { entry: appended })
        });
        entry
    }

    /// Edit the frame at `index`. All other frames keep their `Arc`.
    pub fn update_frame(
        &self,
        index: usize,
        edit: impl FnOnce(&mut Frame),
    ) -> Result<Arc<ProjectState>> {
        self.mutate(|state| {
            let len = state.frames.len();
            let frame = state
                .frames
                .get_mut(index)
                .ok_or(Error::FrameIndexOutOfRange { index, len })?;
            edit(Arc::make_mut(frame));
            Ok(ChangeKind::FrameUpdated { index })
        })
        .map(|change| change.snapshot)
    }

    /// Point `current_frame_index` at `index`.
    pub fn select_frame(&self, index: usize) -> Result<Arc<ProjectState>> {
        self.mutate(|state| {
            if index >= state.frames.len() {
                return Err(Error::FrameIndexOutOfRange {
                    index,
                    len: state.frames.len(),
                });
            }
            state.current_frame_index = index;
            Ok(ChangeKind::FrameSelected { index })
        })
        .map(|change| change.snapshot)
    }

    /// Flag frame `index` as generating and select it, in one change.
    pub fn begin_scene(&self, index: usize) -> Result<Arc<ProjectState>> {
        self.mutate(|state| {
            let len = state.frames.len();
            let frame = state
                .frames
                .get_mut(index)
                .ok_or(Error::FrameIndexOutOfRange { index, len })?;
            Arc::make_mut(frame).is_generating = true;
            state.current_frame_index = index;
            Ok(ChangeKind::SceneStarted { index })
        })
        .map(|change| change.snapshot)
    }

    /// Clone, edit, swap and publish. Nothing is applied if `edit` fails.
    fn mutate(
        &self,
        edit: impl FnOnce(&mut ProjectState) -> Result<ChangeKind>,
    ) -> Result<StateChange> {
        let mut inner = self.inner.write();

        let mut next = ProjectState::clone(&inner.snapshot);
        let kind = edit(&mut next)?;

        inner.version += 1;
        inner.snapshot = Arc::new(next);

        let change = StateChange {
            version: inner.version,
            kind,
            snapshot: inner.snapshot.clone(),
        };
        self.bus.publish(change.clone());
        Ok(change)
    }
}

impl Default for ProjectStore {
    fn default() -> Self {
        Self::new(256)
    }
}
