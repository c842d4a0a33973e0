//! In-process fake agents shared by the pipeline tests.

use std::collections::HashSet;
use std::ops::Range;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;

use studio_agents::{ImageRenderer, ScriptWriter, SpeechSynthesizer, StoryboardDirector};
use studio_core::{
    AgentTag, AssetRef, Error, Frame, FrameId, Result, ScriptLine, Transition, TransitionKind,
};

/// What `synthesize` hands back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SpeechMode {
    Clip,
    Silent,
    Fail,
}

/// Six lines, five frames, the last frame silent.
pub(crate) struct FakeStudio {
    ranges: Vec<Range<usize>>,
    transitions: Vec<TransitionKind>,
    fail_script: bool,
    fail_storyboard: bool,
    failing_images: HashSet<String>,
    fail_all_images: bool,
    speech: SpeechMode,
    gate: Option<Arc<Notify>>,
    pub script_calls: AtomicUsize,
    pub storyboard_calls: AtomicUsize,
    pub image_calls: AtomicUsize,
    pub speech_calls: AtomicUsize,
    pub spoken: Mutex<Vec<String>>,
}

impl FakeStudio {
    pub fn scenario() -> Self {
        Self {
            ranges: vec![0..2, 2..3, 3..4, 4..6, 6..6],
            transitions: vec![
                TransitionKind::FadeIn,
                TransitionKind::Cut,
                TransitionKind::Cut,
                TransitionKind::CrossDissolve,
                TransitionKind::FadeOut,
            ],
            fail_script: false,
            fail_storyboard: false,
            failing_images: HashSet::new(),
            fail_all_images: false,
            speech: SpeechMode::Clip,
            gate: None,
            script_calls: AtomicUsize::new(0),
            storyboard_calls: AtomicUsize::new(0),
            image_calls: AtomicUsize::new(0),
            speech_calls: AtomicUsize::new(0),
            spoken: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_script(mut self) -> Self {
        self.fail_script = true;
        self
    }

    pub fn failing_storyboard(mut self) -> Self {
        self.fail_storyboard = true;
        self
    }

    pub fn failing_image(mut self, prompt: &str) -> Self {
        self.failing_images.insert(prompt.to_string());
        self
    }

    pub fn failing_all_images(mut self) -> Self {
        self.fail_all_images = true;
        self
    }

    pub fn with_speech(mut self, speech: SpeechMode) -> Self {
        self.speech = speech;
        self
    }

    pub fn with_ranges(mut self, ranges: Vec<Range<usize>>) -> Self {
        self.ranges = ranges;
        self
    }

    /// Hold `write_script` until [`release`](Self::release) is called.
    pub fn gated(mut self) -> Self {
        self.gate = Some(Arc::new(Notify::new()));
        self
    }

    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.notify_one();
        }
    }
}

#[async_trait]
impl ScriptWriter for FakeStudio {
    async fn write_script(&self, _idea: &str) -> Result<Vec<ScriptLine>> {
        self.script_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if self.fail_script {
            return Err(Error::generation(AgentTag::Script, "no script in response"));
        }
        Ok((0..6)
            .map(|i| ScriptLine::new(format!("Character {}", i % 2), format!("line {i}"), "tense"))
            .collect())
    }
}

#[async_trait]
impl StoryboardDirector for FakeStudio {
    async fn plan_storyboard(&self, script: &[ScriptLine]) -> Result<Vec<Frame>> {
        self.storyboard_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_storyboard {
            return Err(Error::generation(AgentTag::Visual, "no storyboard in response"));
        }
        Ok(self
            .ranges
            .iter()
            .enumerate()
            .map(|(i, range)| Frame {
                id: FrameId::new(),
                scene_number: (i + 1) as u32,
                duration: 4.0,
                script_lines: script[range.clone()].to_vec(),
                visual_description: format!("visual {}", i + 1),
                image_prompt: format!("scene {}", i + 1),
                audio_prompt: String::new(),
                transition: Transition::new(
                    self.transitions.get(i).copied().unwrap_or_default(),
                    0.5,
                ),
                generated_image_url: None,
                generated_audio_url: None,
                is_generating: false,
            })
            .collect())
    }
}

#[async_trait]
impl ImageRenderer for FakeStudio {
    async fn render_image(&self, prompt: &str) -> Result<AssetRef> {
        self.image_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_all_images || self.failing_images.contains(prompt) {
            return Err(Error::provider("fake", format!("refused to draw {prompt}")));
        }
        Ok(format!("https://img.test/{}", prompt.replace(' ', "-")))
    }
}

#[async_trait]
impl SpeechSynthesizer for FakeStudio {
    async fn synthesize(&self, text: &str) -> Result<Option<AssetRef>> {
        self.speech_calls.fetch_add(1, Ordering::SeqCst);
        self.spoken.lock().push(text.to_string());
        match self.speech {
            SpeechMode::Clip => Ok(Some(format!("data:audio/wav;base64,{}", text.len()))),
            SpeechMode::Silent => Ok(None),
            SpeechMode::Fail => Err(Error::provider("fake", format!("no voice for {text:?}"))),
        }
    }
}
