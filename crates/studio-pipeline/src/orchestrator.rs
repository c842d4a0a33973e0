//! The stage machine driving a project from idea to finished storyboard.

use std::sync::Arc;

use tokio::sync::{broadcast, Mutex, MutexGuard};
use tracing::{error, info};

use studio_agents::Agents;
use studio_core::events::StateChange;
use studio_core::{AgentTag, Error, FramePatch, ProjectState, Result, Stage};

use crate::production::{produce_all, ProductionReport};
use crate::store::ProjectStore;

/// Drives one project through the pipeline.
///
/// At most one stage operation runs at a time. A call that arrives while
/// another is in flight fails with [`Error::Busy`] instead of queueing.
pub struct Orchestrator {
    store: Arc<ProjectStore>,
    agents: Agents,
    flight: Mutex<()>,
}

impl Orchestrator {
    pub fn new(agents: Agents, store: Arc<ProjectStore>) -> Self {
        Self {
            store,
            agents,
            flight: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &Arc<ProjectStore> {
        &self.store
    }

    pub fn snapshot(&self) -> Arc<ProjectState> {
        self.store.snapshot()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StateChange> {
        self.store.subscribe()
    }

    /// Start a new project from `idea` and generate its script.
    ///
    /// Allowed from any stage that is not planning or producing. The previous
    /// project's script and frames are discarded; the activity log is kept.
    /// Ends in `REVIEW_SCRIPT`, or `ERROR` if the script agent fails.
    pub async fn start_project(&self, idea: &str) -> Result<()> {
        let idea = idea.trim();
        if idea.is_empty() {
            return Err(Error::Validation("idea must not be empty".into()));
        }

        let _flight = self.begin()?;
        let current = self.store.snapshot();
        if !current.status.accepts_new_idea() {
            return Err(Error::invalid_stage(
                "start a project",
                Stage::Idle,
                current.status,
            ));
        }

        let started = self
            .store
            .advance(Stage::PlanningScript, |s| *s = s.restart(idea))?;
        info!(project_id = %started.id, "Starting project");

        self.store
            .append_log(AgentTag::Orchestrator, format!("New project started: \"{idea}\""));
        self.store
            .append_log(AgentTag::Script, "Analyzing the idea and drafting the script...");

        match self.agents.script.write_script(idea).await {
            Ok(script) => {
                self.store.append_log(
                    AgentTag::Script,
                    format!("Script complete ({} lines). Awaiting review.", script.len()),
                );
                self.store
                    .advance(Stage::ReviewScript, move |s| s.script = script)?;
                Ok(())
            }
            Err(e) => self.fail("script generation", e),
        }
    }

    /// Approve the script and plan the storyboard.
    ///
    /// Ends in `REVIEW_STORYBOARD`, or `ERROR` if the storyboard agent fails
    /// or returns frames that do not cover the script exactly.
    pub async fn confirm_script(&self) -> Result<()> {
        let _flight = self.begin()?;
        self.require_stage("confirm the script", Stage::ReviewScript)?;

        let snapshot = self.store.set_stage(Stage::PlanningStoryboard)?;
        self.store
            .append_log(AgentTag::Orchestrator, "Script approved. Handing off to the visual agent.");
        self.store.append_log(
            AgentTag::Visual,
            "Visualizing the script and splitting it into frames...",
        );

        let planned = self
            .agents
            .storyboard
            .plan_storyboard(&snapshot.script)
            .await
            .and_then(|frames| {
                let candidate = ProjectState {
                    frames: frames.into_iter().map(Arc::new).collect(),
                    ..ProjectState::clone(&snapshot)
                };
                if candidate.frames_partition_script() {
                    Ok(candidate.frames)
                } else {
                    Err(Error::generation(
                        AgentTag::Visual,
                        "storyboard frames do not cover the script in order",
                    ))
                }
            });

        match planned {
            Ok(frames) => {
                self.store.append_log(
                    AgentTag::Visual,
                    format!("Storyboard complete ({} scenes). Awaiting review.", frames.len()),
                );
                self.store.advance(Stage::ReviewStoryboard, move |s| {
                    s.frames = frames;
                    s.current_frame_index = 0;
                })?;
                Ok(())
            }
            Err(e) => self.fail("storyboard generation", e),
        }
    }

    /// Approve the storyboard and produce every scene's assets.
    ///
    /// Per-scene failures do not fail the call; they are reported in the
    /// returned [`ProductionReport`]. Ends in `COMPLETED`.
    pub async fn confirm_storyboard(&self) -> Result<ProductionReport> {
        let _flight = self.begin()?;
        self.require_stage("confirm the storyboard", Stage::ReviewStoryboard)?;

        self.store.set_stage(Stage::Producing)?;
        self.store.append_log(
            AgentTag::Orchestrator,
            "Storyboard approved. Production pipeline started.",
        );

        let report = match produce_all(&self.store, &self.agents).await {
            Ok(report) => report,
            Err(e) => return self.fail("production", e),
        };

        self.store.append_log(
            AgentTag::Orchestrator,
            format!(
                "All scenes processed ({}/{} with assets). Ready for final review.",
                self.store.snapshot().produced_frames(),
                report.frames
            ),
        );
        self.store.set_stage(Stage::Completed)?;
        info!(
            frames = report.frames,
            images = report.images,
            speech = report.speech,
            failures = report.failures.len(),
            "Production finished"
        );
        Ok(report)
    }

    /// Edit frame `index`. Allowed at any stage once frames exist.
    ///
    /// Takes no single-flight guard. Only the patched fields change, so
    /// assets written by a running production are kept.
    pub fn update_frame(&self, index: usize, patch: FramePatch) -> Result<()> {
        patch.validate()?;

        let len = self.store.snapshot().frames.len();
        if index >= len {
            return Err(Error::FrameIndexOutOfRange { index, len });
        }
        if patch.is_empty() {
            return Ok(());
        }

        self.store.update_frame(index, |frame| patch.apply(frame))?;
        Ok(())
    }

    /// Point the viewer at frame `index`.
    pub fn select_frame(&self, index: usize) -> Result<()> {
        self.store.select_frame(index)?;
        Ok(())
    }

    fn begin(&self) -> Result<MutexGuard<'_, ()>> {
        self.flight.try_lock().map_err(|_| Error::Busy)
    }

    fn require_stage(&self, operation: &str, expected: Stage) -> Result<()> {
        let actual = self.store.snapshot().status;
        if actual == expected {
            Ok(())
        } else {
            Err(Error::invalid_stage(operation, expected, actual))
        }
    }

    /// Log a stage-fatal failure, move to `ERROR` and hand the error back.
    fn fail<T>(&self, what: &str, e: Error) -> Result<T> {
        error!("Stage failed during {what}: {e}");
        self.store
            .append_log(AgentTag::Orchestrator, format!("Error: {what} failed ({e})"));
        self.store.set_stage(Stage::Error)?;
        Err(e)
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("stage", &self.store.snapshot().status)
            .finish_non_exhaustive()
    }
}
