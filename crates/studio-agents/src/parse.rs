//! Turning model JSON into script lines and frames.
//!
//! Kept free of HTTP so the shape rules can be tested directly.

use serde::Deserialize;
use tracing::{debug, warn};

use studio_core::{
    partition_script, AgentTag, Error, Frame, FrameId, Result, ScriptLine, Transition,
    TransitionKind,
};

#[derive(Debug, Deserialize)]
struct RawScriptLine {
    character: String,
    dialogue: String,
    #[serde(default)]
    emotion: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawFrame {
    #[serde(default)]
    scene_number: Option<i64>,
    duration: f64,
    visual_description: String,
    image_prompt: String,
    audio_prompt: String,
    #[serde(default)]
    transition: Option<RawTransition>,
    start_script_index: i64,
    end_script_index: i64,
}

#[derive(Debug, Deserialize)]
struct RawTransition {
    #[serde(rename = "type")]
    kind: String,
    duration: f64,
}

/// Strip markdown code fences models like to wrap JSON in.
pub(crate) fn clean_json(text: &str) -> String {
    text.replace("```json", "").replace("```", "").trim().to_string()
}

/// Parse a script response into lines with fresh ids.
pub(crate) fn parse_script(text: &str) -> Result<Vec<ScriptLine>> {
    let raw: Vec<RawScriptLine> = serde_json::from_str(&clean_json(text))
        .map_err(|e| Error::generation(AgentTag::Script, format!("malformed script JSON: {e}")))?;

    if raw.is_empty() {
        return Err(Error::generation(AgentTag::Script, "script has no lines"));
    }

    Ok(raw
        .into_iter()
        .map(|line| ScriptLine::new(line.character, line.dialogue, line.emotion))
        .collect())
}

/// Parse a storyboard response against the script it was planned from.
///
/// Indices in the response are inclusive; `end = start - 1` denotes a frame
/// without dialogue. Scene numbers are reassigned 1..N in response order.
pub(crate) fn parse_storyboard(text: &str, script: &[ScriptLine]) -> Result<Vec<Frame>> {
    let raw: Vec<RawFrame> = serde_json::from_str(&clean_json(text)).map_err(|e| {
        Error::generation(AgentTag::Visual, format!("malformed storyboard JSON: {e}"))
    })?;

    if raw.is_empty() {
        return Err(Error::generation(AgentTag::Visual, "storyboard has no frames"));
    }

    let mut ranges = Vec::with_capacity(raw.len());
    for (i, frame) in raw.iter().enumerate() {
        let invalid = || {
            Error::generation(
                AgentTag::Visual,
                format!(
                    "frame {} has invalid script range {}..={}",
                    i + 1,
                    frame.start_script_index,
                    frame.end_script_index
                ),
            )
        };
        let start = frame.start_script_index;
        let end = frame.end_script_index.checked_add(1).ok_or_else(invalid)?;
        if start < 0 || end < start {
            return Err(invalid());
        }
        let start = usize::try_from(start).map_err(|_| invalid())?;
        let end = usize::try_from(end).map_err(|_| invalid())?;
        ranges.push(start..end);
    }

    let slices = partition_script(script, &ranges)
        .map_err(|e| Error::generation(AgentTag::Visual, e.to_string()))?;

    raw.into_iter()
        .zip(slices)
        .enumerate()
        .map(|(i, (frame, script_lines))| {
            let scene_number = (i + 1) as u32;
            if frame.scene_number.is_some_and(|n| n != i64::from(scene_number)) {
                debug!(
                    returned = ?frame.scene_number,
                    assigned = scene_number,
                    "Renumbering storyboard scene"
                );
            }

            let transition = match frame.transition {
                Some(raw) => Transition::new(parse_transition_kind(&raw.kind), raw.duration),
                None => Transition::new(TransitionKind::Cut, 0.0),
            };

            let frame = Frame {
                id: FrameId::new(),
                scene_number,
                duration: frame.duration,
                script_lines,
                visual_description: frame.visual_description,
                image_prompt: frame.image_prompt,
                audio_prompt: frame.audio_prompt,
                transition,
                generated_image_url: None,
                generated_audio_url: None,
                is_generating: false,
            };

            if !(frame.duration.is_finite() && frame.duration >= 0.0) {
                return Err(Error::generation(
                    AgentTag::Visual,
                    format!("scene {scene_number} has invalid duration {}", frame.duration),
                ));
            }
            frame
                .transition
                .validate()
                .map_err(|e| Error::generation(AgentTag::Visual, e.to_string()))?;

            Ok(frame)
        })
        .collect()
}

fn parse_transition_kind(kind: &str) -> TransitionKind {
    kind.parse().unwrap_or_else(|_| {
        warn!(kind, "Unknown transition type from model, using CUT");
        TransitionKind::Cut
    })
}
