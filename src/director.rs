//! Unattended pipeline runs.
//!
//! The [`Director`] plays the part of the user: it submits the idea, approves
//! each review stage as soon as it is reached and echoes the agent activity
//! log while the orchestrator works.

use std::io::Write;
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::{broadcast, oneshot};

use studio_core::events::StateChange;
use studio_core::ProjectState;
use studio_pipeline::{Orchestrator, ProductionReport};

/// Review stage after which an unattended run stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum StopAfter {
    Script,
    Storyboard,
}

/// What a finished run leaves behind.
#[derive(Debug)]
pub struct RunOutcome {
    pub state: Arc<ProjectState>,
    /// Present only when production ran.
    pub report: Option<ProductionReport>,
    /// Activity log entries echoed during the run.
    pub echoed: usize,
}

/// Drives an [`Orchestrator`] from idea to the requested stage.
pub struct Director {
    orchestrator: Arc<Orchestrator>,
}

impl Director {
    pub fn new(orchestrator: Arc<Orchestrator>) -> Self {
        Self { orchestrator }
    }

    /// Run the pipeline for `idea`, writing each new log entry to `out`.
    ///
    /// Stage-fatal errors are returned after the log has been flushed, so
    /// the failure entry is always echoed before the error surfaces.
    pub async fn run<W: Write>(
        &self,
        idea: &str,
        stop_after: Option<StopAfter>,
        out: W,
    ) -> Result<RunOutcome> {
        let rx = self.orchestrator.subscribe();
        let baseline = self.orchestrator.snapshot().logs.len();
        let (done_tx, done_rx) = oneshot::channel();

        let drive = async {
            let result = self.drive(idea, stop_after).await;
            let _ = done_tx.send(self.orchestrator.snapshot());
            result
        };
        let (report, echoed) = tokio::join!(drive, echo_log(rx, done_rx, baseline, out));

        let report = report.inspect_err(|e| {
            if e.is_precondition() {
                tracing::warn!("Run rejected: {e}");
            } else {
                tracing::error!("Run stopped: {e}");
            }
        })?;

        Ok(RunOutcome {
            state: self.orchestrator.snapshot(),
            report,
            echoed: echoed?,
        })
    }

    async fn drive(
        &self,
        idea: &str,
        stop_after: Option<StopAfter>,
    ) -> studio_core::Result<Option<ProductionReport>> {
        self.orchestrator.start_project(idea).await?;
        if stop_after == Some(StopAfter::Script) {
            tracing::info!("Stopping after script review");
            return Ok(None);
        }

        self.orchestrator.confirm_script().await?;
        if stop_after == Some(StopAfter::Storyboard) {
            tracing::info!("Stopping after storyboard review");
            return Ok(None);
        }

        self.orchestrator.confirm_storyboard().await.map(Some)
    }
}

/// Write every log entry past `baseline` to `out` until `done` delivers
/// the final snapshot. Entries are read from the snapshots, so a lagging
/// receiver catches up on the next change it sees. Returns the number of
/// entries written.
async fn echo_log<W: Write>(
    mut rx: broadcast::Receiver<StateChange>,
    mut done: oneshot::Receiver<Arc<ProjectState>>,
    baseline: usize,
    mut out: W,
) -> std::io::Result<usize> {
    let mut written = baseline;

    loop {
        tokio::select! {
            biased;

            change = rx.recv() => match change {
                Ok(change) => written = echo_since(&change.snapshot, written, &mut out)?,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!("Log echo fell behind by {} changes, catching up", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            last = &mut done => {
                if let Ok(last) = last {
                    written = echo_since(&last, written, &mut out)?;
                }
                break;
            }
        }
    }

    out.flush()?;
    Ok(written.saturating_sub(baseline))
}

fn echo_since<W: Write>(
    state: &ProjectState,
    written: usize,
    out: &mut W,
) -> std::io::Result<usize> {
    for entry in state.logs.iter().skip(written) {
        writeln!(out, "{entry}")?;
    }
    Ok(written.max(state.logs.len()))
}
