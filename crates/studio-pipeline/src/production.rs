//! Asset production: walks the storyboard one scene at a time and asks the
//! image and speech agents for each scene's assets.
//!
//! A failing scene never stops the run. Its failures are logged, recorded in
//! the [`ProductionReport`] and the loop moves on to the next scene.

use serde::Serialize;
use tracing::{debug, info, warn};

use studio_agents::Agents;
use studio_core::{AgentTag, AssetRef, Error, Result};

use crate::store::ProjectStore;

/// One asset request that failed during production.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneFailure {
    pub scene_number: u32,
    pub agent: AgentTag,
    pub message: String,
}

/// Outcome of a production run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProductionReport {
    /// Scenes visited.
    pub frames: usize,
    /// Images attached to frames.
    pub images: usize,
    /// Speech clips attached to frames.
    pub speech: usize,
    pub failures: Vec<SceneFailure>,
}

impl ProductionReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Produce assets for every frame, in scene order.
///
/// Only store errors abort the loop; agent errors are per-scene.
pub(crate) async fn produce_all(store: &ProjectStore, agents: &Agents) -> Result<ProductionReport> {
    let total = store.snapshot().frames.len();
    let mut report = ProductionReport::default();

    for index in 0..total {
        produce_scene(store, agents, index, &mut report).await?;
        report.frames += 1;

        info!(
            "[{}/{}] Scene processed ({} images, {} speech so far)",
            index + 1,
            total,
            report.images,
            report.speech
        );
    }

    Ok(report)
}

async fn produce_scene(
    store: &ProjectStore,
    agents: &Agents,
    index: usize,
    report: &mut ProductionReport,
) -> Result<()> {
    let snapshot = store.begin_scene(index)?;
    let frame = snapshot
        .frames
        .get(index)
        .cloned()
        .ok_or_else(|| Error::Internal(format!("frame {index} vanished during production")))?;
    let scene = frame.scene_number;

    store.append_log(AgentTag::Visual, format!("Scene {scene}: rendering image..."));
    let image = match agents.image.render_image(&frame.image_prompt).await {
        Ok(url) => {
            report.images += 1;
            Some(url)
        }
        Err(e) => {
            record_failure(store, report, scene, AgentTag::Visual, "image", &e);
            None
        }
    };

    let audio: Option<AssetRef> = match frame.first_dialogue() {
        Some(text) => {
            store.append_log(AgentTag::Audio, format!("Scene {scene}: synthesizing speech..."));
            match agents.speech.synthesize(text).await {
                Ok(Some(url)) => {
                    report.speech += 1;
                    Some(url)
                }
                Ok(None) => {
                    debug!(scene, "Speech agent returned no audio");
                    store.append_log(AgentTag::Audio, format!("Scene {scene}: no audio returned."));
                    None
                }
                Err(e) => {
                    record_failure(store, report, scene, AgentTag::Audio, "speech", &e);
                    None
                }
            }
        }
        None => {
            debug!(scene, "Scene has no dialogue, skipping speech");
            None
        }
    };

    let produced = image.is_some() || audio.is_some();
    store.update_frame(index, move |f| {
        if let Some(url) = image {
            f.generated_image_url = Some(url);
        }
        if let Some(url) = audio {
            f.generated_audio_url = Some(url);
        }
        f.is_generating = false;
    })?;

    if produced {
        store.append_log(AgentTag::Orchestrator, format!("Scene {scene}: assets ready."));
    }
    Ok(())
}

fn record_failure(
    store: &ProjectStore,
    report: &mut ProductionReport,
    scene: u32,
    agent: AgentTag,
    what: &str,
    error: &Error,
) {
    warn!(scene, agent = %agent, "Scene {what} generation failed: {error}");
    store.append_log(agent, format!("Scene {scene}: {what} generation failed ({error})"));
    report.failures.push(SceneFailure {
        scene_number: scene,
        agent,
        message: error.to_string(),
    });
}
