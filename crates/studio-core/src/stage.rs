//! Pipeline stages and the edges allowed between them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A named phase of the pipeline.
///
/// The happy path is strictly linear:
///
/// ```text
/// Idle -> PlanningScript -> ReviewScript -> PlanningStoryboard
///      -> ReviewStoryboard -> Producing -> Completed
/// ```
///
/// `Error` is reachable from every planning stage and from `Producing`. It is
/// absorbing for the current project: the only way out is a new idea, which
/// starts over at `PlanningScript`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stage {
    #[default]
    Idle,
    PlanningScript,
    ReviewScript,
    PlanningStoryboard,
    ReviewStoryboard,
    Producing,
    Completed,
    Error,
}

impl Stage {
    /// Wire/display name, e.g. `PLANNING_SCRIPT`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Idle => "IDLE",
            Stage::PlanningScript => "PLANNING_SCRIPT",
            Stage::ReviewScript => "REVIEW_SCRIPT",
            Stage::PlanningStoryboard => "PLANNING_STORYBOARD",
            Stage::ReviewStoryboard => "REVIEW_STORYBOARD",
            Stage::Producing => "PRODUCING",
            Stage::Completed => "COMPLETED",
            Stage::Error => "ERROR",
        }
    }

    /// `true` while an adapter call is (or may be) in flight.
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            Stage::PlanningScript | Stage::PlanningStoryboard | Stage::Producing
        )
    }

    /// Whether a new idea may be submitted from this stage.
    pub fn accepts_new_idea(&self) -> bool {
        !self.is_busy()
    }

    /// Whether `self -> next` is an edge of the stage graph.
    ///
    /// Restarting with a new idea is modelled as an edge into
    /// `PlanningScript` from every idle-ish stage.
    pub fn can_transition_to(&self, next: Stage) -> bool {
        use Stage::*;

        if next == PlanningScript {
            return self.accepts_new_idea();
        }

        matches!(
            (self, next),
            (PlanningScript, ReviewScript)
                | (PlanningScript, Error)
                | (ReviewScript, PlanningStoryboard)
                | (PlanningStoryboard, ReviewStoryboard)
                | (PlanningStoryboard, Error)
                | (ReviewStoryboard, Producing)
                | (Producing, Completed)
                | (Producing, Error)
        )
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
