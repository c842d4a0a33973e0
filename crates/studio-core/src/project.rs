//! Project data model: script lines, storyboard frames, the agent activity
//! log and the [`ProjectState`] snapshot that ties them together.

use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::ids::{FrameId, LogEntryId, ProjectId, ScriptLineId};
use crate::stage::Stage;

/// Reference to a generated asset: an `http(s)` URL or a `data:` URI.
pub type AssetRef = String;

// ---------------------------------------------------------------------------
// Script
// ---------------------------------------------------------------------------

/// One line of dialogue. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptLine {
    pub id: ScriptLineId,
    pub character: String,
    pub dialogue: String,
    pub emotion: String,
}

impl ScriptLine {
    pub fn new(
        character: impl Into<String>,
        dialogue: impl Into<String>,
        emotion: impl Into<String>,
    ) -> Self {
        Self {
            id: ScriptLineId::new(),
            character: character.into(),
            dialogue: dialogue.into(),
            emotion: emotion.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Transitions
// ---------------------------------------------------------------------------

/// How a frame is entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransitionKind {
    #[default]
    Cut,
    FadeIn,
    FadeOut,
    CrossDissolve,
}

impl TransitionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransitionKind::Cut => "CUT",
            TransitionKind::FadeIn => "FADE_IN",
            TransitionKind::FadeOut => "FADE_OUT",
            TransitionKind::CrossDissolve => "CROSS_DISSOLVE",
        }
    }
}

impl fmt::Display for TransitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TransitionKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CUT" => Ok(TransitionKind::Cut),
            "FADE_IN" => Ok(TransitionKind::FadeIn),
            "FADE_OUT" => Ok(TransitionKind::FadeOut),
            "CROSS_DISSOLVE" => Ok(TransitionKind::CrossDissolve),
            other => Err(Error::Validation(format!(
                "unknown transition type '{other}'"
            ))),
        }
    }
}

/// Transition into a frame. Editable during storyboard review.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Transition {
    #[serde(rename = "type")]
    pub kind: TransitionKind,
    /// Seconds; never negative.
    pub duration: f64,
}

impl Transition {
    pub fn new(kind: TransitionKind, duration: f64) -> Self {
        Self { kind, duration }
    }

    pub fn validate(&self) -> Result<()> {
        check_seconds("transition duration", self.duration)
    }
}

fn check_seconds(what: &str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(Error::Validation(format!(
            "{what} must be a non-negative number of seconds, got {value}"
        )))
    }
}

// ---------------------------------------------------------------------------
// Frames
// ---------------------------------------------------------------------------

/// One scene of the storyboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub id: FrameId,
    /// Ordering key, 1-based, assigned when the storyboard is generated.
    pub scene_number: u32,
    /// Seconds on screen.
    pub duration: f64,
    /// Contiguous slice of the full script.
    pub script_lines: Vec<ScriptLine>,
    pub visual_description: String,
    pub image_prompt: String,
    pub audio_prompt: String,
    pub transition: Transition,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_image_url: Option<AssetRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_audio_url: Option<AssetRef>,
    #[serde(default)]
    pub is_generating: bool,
}

impl Frame {
    /// Dialogue of the first script line, which is the only one voiced.
    pub fn first_dialogue(&self) -> Option<&str> {
        self.script_lines.first().map(|line| line.dialogue.as_str())
    }

    pub fn has_assets(&self) -> bool {
        self.generated_image_url.is_some() || self.generated_audio_url.is_some()
    }
}

/// User edits to a frame. `None` leaves the field untouched.
///
/// Identity, scene number and the script slice are deliberately absent:
/// editing them would break the script partition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FramePatch {
    pub duration: Option<f64>,
    pub visual_description: Option<String>,
    pub image_prompt: Option<String>,
    pub audio_prompt: Option<String>,
    pub transition: Option<Transition>,
}

impl FramePatch {
    pub fn transition(transition: Transition) -> Self {
        Self {
            transition: Some(transition),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(duration) = self.duration {
            check_seconds("frame duration", duration)?;
        }
        if let Some(ref transition) = self.transition {
            transition.validate()?;
        }
        Ok(())
    }

    /// Merge the patch into `frame`.
    pub fn apply(&self, frame: &mut Frame) {
        if let Some(duration) = self.duration {
            frame.duration = duration;
        }
        if let Some(ref text) = self.visual_description {
            frame.visual_description = text.clone();
        }
        if let Some(ref text) = self.image_prompt {
            frame.image_prompt = text.clone();
        }
        if let Some(ref text) = self.audio_prompt {
            frame.audio_prompt = text.clone();
        }
        if let Some(transition) = self.transition {
            frame.transition = transition;
        }
    }
}

/// Split `script` into per-frame slices.
///
/// `ranges` are half-open and must cover `0..script.len()` in order with no
/// gap or overlap. Empty ranges are allowed (a silent frame).
pub fn partition_script(
    script: &[ScriptLine],
    ranges: &[Range<usize>],
) -> Result<Vec<Vec<ScriptLine>>> {
    let mut cursor = 0;
    let mut slices = Vec::with_capacity(ranges.len());

    for (i, range) in ranges.iter().enumerate() {
        if range.start != cursor {
            return Err(Error::Partition(format!(
                "frame {} starts at line {} but line {} is next",
                i + 1,
                range.start,
                cursor
            )));
        }
        if range.end < range.start || range.end > script.len() {
            return Err(Error::Partition(format!(
                "frame {} covers lines {}..{} of a {}-line script",
                i + 1,
                range.start,
                range.end,
                script.len()
            )));
        }
        slices.push(script[range.clone()].to_vec());
        cursor = range.end;
    }

    if cursor != script.len() {
        return Err(Error::Partition(format!(
            "storyboard covers {} of {} script lines",
            cursor,
            script.len()
        )));
    }

    Ok(slices)
}

// ---------------------------------------------------------------------------
// Agent log
// ---------------------------------------------------------------------------

/// Which agent wrote a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AgentTag {
    Orchestrator,
    Script,
    Visual,
    Audio,
}

impl AgentTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentTag::Orchestrator => "ORCHESTRATOR",
            AgentTag::Script => "SCRIPT",
            AgentTag::Visual => "VISUAL",
            AgentTag::Audio => "AUDIO",
        }
    }
}

impl fmt::Display for AgentTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A write-once activity log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentLogEntry {
    pub id: LogEntryId,
    pub agent: AgentTag,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl AgentLogEntry {
    pub fn new(agent: AgentTag, message: impl Into<String>) -> Self {
        Self {
            id: LogEntryId::new(),
            agent,
            message: message.into(),
            timestamp: Utc::now(),
        }
    }
}

impl fmt::Display for AgentLogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] {}",
            self.timestamp.format("%H:%M:%S"),
            self.agent,
            self.message
        )
    }
}

// ---------------------------------------------------------------------------
// ProjectState
// ---------------------------------------------------------------------------

/// The single authoritative project snapshot.
///
/// Snapshots are never mutated in place once published; the store clones,
/// edits and swaps. Frames sit behind `Arc` so that a one-frame update leaves
/// every other frame pointer-identical to the previous snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectState {
    pub id: ProjectId,
    pub status: Stage,
    pub user_idea: String,
    pub script: Vec<ScriptLine>,
    pub frames: Vec<Arc<Frame>>,
    pub logs: Vec<AgentLogEntry>,
    pub current_frame_index: usize,
}

impl ProjectState {
    /// A fresh project for `idea`, carrying over the activity log.
    pub fn restart(&self, idea: impl Into<String>) -> Self {
        Self {
            id: ProjectId::new(),
            status: self.status,
            user_idea: idea.into(),
            script: Vec::new(),
            frames: Vec::new(),
            logs: self.logs.clone(),
            current_frame_index: 0,
        }
    }

    pub fn current_frame(&self) -> Option<&Frame> {
        self.frames.get(self.current_frame_index).map(Arc::as_ref)
    }

    /// Sum of frame durations in seconds.
    pub fn total_duration(&self) -> f64 {
        self.frames.iter().map(|f| f.duration).sum()
    }

    /// Frames holding at least one generated asset.
    pub fn produced_frames(&self) -> usize {
        self.frames.iter().filter(|f| f.has_assets()).count()
    }

    /// Whether the frames' script slices concatenate back to `script`.
    pub fn frames_partition_script(&self) -> bool {
        let mut lines = self.frames.iter().flat_map(|f| f.script_lines.iter());
        let matches = self
            .script
            .iter()
            .all(|line| lines.next().is_some_and(|l| l.id == line.id));
        matches && lines.next().is_none()
    }

    /// Whether `current_frame_index` addresses a frame (or is 0 with none).
    pub fn frame_index_is_valid(&self) -> bool {
        if self.frames.is_empty() {
            self.current_frame_index == 0
        } else {
            self.current_frame_index < self.frames.len()
        }
    }
}
