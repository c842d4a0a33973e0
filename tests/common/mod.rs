//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`], an [`Orchestrator`] wired to [`ScriptedStudio`],
//! a deterministic in-process stand-in for the generation services.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use studio_agents::{Agents, ImageRenderer, ScriptWriter, SpeechSynthesizer, StoryboardDirector};
use studio_core::{
    AgentTag, AssetRef, Error, Frame, FrameId, Result, ScriptLine, Transition, TransitionKind,
};
use studio_pipeline::{Orchestrator, ProjectStore};

/// Scene layout as `(first line, line count, transition)`.
const SCENES: [(usize, usize, TransitionKind); 5] = [
    (0, 2, TransitionKind::FadeIn),
    (2, 1, TransitionKind::Cut),
    (3, 1, TransitionKind::Cut),
    (4, 2, TransitionKind::CrossDissolve),
    (6, 0, TransitionKind::FadeOut),
];

const LINES: [(&str, &str, &str); 6] = [
    ("Narrator", "Neon rain hammers the skyline.", "ominous"),
    ("Kai", "It's right behind me!", "panicked"),
    ("Unit-7", "Target acquired.", "cold"),
    ("Kai", "Not today.", "defiant"),
    ("Unit-7", "Recalculating.", "flat"),
    ("Narrator", "The city swallows them both.", "wistful"),
];

/// Six lines and five scenes for any idea; the last scene is silent.
#[derive(Default)]
pub struct ScriptedStudio {
    pub fail_script: bool,
    pub failing_scenes: HashSet<u32>,
    pub image_calls: AtomicUsize,
    pub speech_calls: AtomicUsize,
}

impl ScriptedStudio {
    pub fn with_failing_image(scene: u32) -> Self {
        Self {
            failing_scenes: HashSet::from([scene]),
            ..Self::default()
        }
    }

    pub fn images(&self) -> usize {
        self.image_calls.load(Ordering::SeqCst)
    }

    pub fn speeches(&self) -> usize {
        self.speech_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ScriptWriter for ScriptedStudio {
    async fn write_script(&self, _idea: &str) -> Result<Vec<ScriptLine>> {
        if self.fail_script {
            return Err(Error::generation(AgentTag::Script, "model returned no text"));
        }
        Ok(LINES
            .iter()
            .map(|(character, dialogue, emotion)| ScriptLine::new(*character, *dialogue, *emotion))
            .collect())
    }
}

#[async_trait]
impl StoryboardDirector for ScriptedStudio {
    async fn plan_storyboard(&self, script: &[ScriptLine]) -> Result<Vec<Frame>> {
        Ok(SCENES
            .iter()
            .enumerate()
            .map(|(i, (start, count, kind))| Frame {
                id: FrameId::new(),
                scene_number: (i + 1) as u32,
                duration: 3.0,
                script_lines: script[*start..start + count].to_vec(),
                visual_description: format!("Wide shot {}", i + 1),
                image_prompt: format!("scene-{}", i + 1),
                audio_prompt: "synth drone".into(),
                transition: Transition::new(*kind, 0.5),
                generated_image_url: None,
                generated_audio_url: None,
                is_generating: false,
            })
            .collect())
    }
}

#[async_trait]
impl ImageRenderer for ScriptedStudio {
    async fn render_image(&self, prompt: &str) -> Result<AssetRef> {
        self.image_calls.fetch_add(1, Ordering::SeqCst);
        let scene: u32 = prompt.trim_start_matches("scene-").parse().unwrap_or(0);
        if self.failing_scenes.contains(&scene) {
            return Err(Error::provider("scripted", "HTTP 500"));
        }
        Ok(format!("https://img.test/{prompt}.jpg"))
    }
}

#[async_trait]
impl SpeechSynthesizer for ScriptedStudio {
    async fn synthesize(&self, text: &str) -> Result<Option<AssetRef>> {
        self.speech_calls.fetch_add(1, Ordering::SeqCst);
        Ok(Some(format!("data:audio/wav;base64,{}", text.len())))
    }
}

/// An orchestrator over a fresh store and a [`ScriptedStudio`].
pub struct TestHarness {
    pub orchestrator: Arc<Orchestrator>,
    pub studio: Arc<ScriptedStudio>,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_studio(ScriptedStudio::default())
    }

    pub fn with_studio(studio: ScriptedStudio) -> Self {
        Self::build(studio, ProjectStore::default())
    }

    /// A harness whose change channel holds only `capacity` changes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::build(ScriptedStudio::default(), ProjectStore::new(capacity))
    }

    fn build(studio: ScriptedStudio, store: ProjectStore) -> Self {
        let studio = Arc::new(studio);
        let orchestrator = Arc::new(Orchestrator::new(
            Agents::from_provider(studio.clone()),
            Arc::new(store),
        ));
        Self {
            orchestrator,
            studio,
        }
    }
}
