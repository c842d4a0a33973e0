//! Text timeline and JSON export of a project snapshot.

use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result};

use studio_core::{Frame, ProjectState};

/// Render one row per scene plus a totals line.
pub fn render_timeline(state: &ProjectState) -> String {
    let mut out = String::new();

    if state.frames.is_empty() {
        let _ = writeln!(out, "No storyboard yet ({} script lines).", state.script.len());
        return out;
    }

    let _ = writeln!(
        out,
        "{:>5}  {:>8}  {:<24}  {:<5}  {:<5}  {}",
        "Scene", "Duration", "Transition", "Image", "Audio", "Lines"
    );
    for frame in &state.frames {
        let _ = writeln!(out, "{}", timeline_row(frame));
    }
    let _ = writeln!(
        out,
        "Total: {:.1}s across {} scenes, {} with assets",
        state.total_duration(),
        state.frames.len(),
        state.produced_frames()
    );

    out
}

fn timeline_row(frame: &Frame) -> String {
    let transition = format!(
        "{} ({:.1}s)",
        frame.transition.kind, frame.transition.duration
    );
    format!(
        "{:>5}  {:>7.1}s  {:<24}  {:<5}  {:<5}  {}",
        frame.scene_number,
        frame.duration,
        transition,
        yes_no(frame.generated_image_url.is_some()),
        yes_no(frame.generated_audio_url.is_some()),
        frame.script_lines.len()
    )
}

fn yes_no(present: bool) -> &'static str {
    if present {
        "yes"
    } else {
        "-"
    }
}

/// Write `state` to `path` as pretty JSON. The file is never read back.
pub fn export_json(state: &ProjectState, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(state).context("Failed to serialize project")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write export file: {:?}", path))?;
    tracing::info!("Exported project to {:?}", path);
    Ok(())
}
