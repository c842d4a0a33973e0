//! Trait definitions for the generation agents.
//!
//! Each agent is a request/response boundary to an external generative
//! service. The orchestrator only ever talks to these traits, so tests and
//! alternative providers can slot in without touching pipeline code.

use std::sync::Arc;

use async_trait::async_trait;
use studio_core::{AssetRef, Frame, Result, ScriptLine};

/// Turns a one-sentence idea into a dialogue script.
#[async_trait]
pub trait ScriptWriter: Send + Sync {
    /// Produce the ordered script for `idea`.
    ///
    /// Fails with [`Error::Generation`](studio_core::Error::Generation) when
    /// the provider response is missing or malformed.
    async fn write_script(&self, idea: &str) -> Result<Vec<ScriptLine>>;
}

/// Splits a script into storyboard frames.
#[async_trait]
pub trait StoryboardDirector: Send + Sync {
    /// Produce frames whose script slices partition `script` in order.
    async fn plan_storyboard(&self, script: &[ScriptLine]) -> Result<Vec<Frame>>;
}

/// Renders one still image per frame.
#[async_trait]
pub trait ImageRenderer: Send + Sync {
    /// Render `prompt`. Providers may hand back a placeholder instead of an
    /// error; the orchestrator cannot tell the difference.
    async fn render_image(&self, prompt: &str) -> Result<AssetRef>;
}

/// Voices a line of dialogue.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize `text`. `Ok(None)` means no audio was produced (empty
    /// text or a provider that swallows its own failures).
    async fn synthesize(&self, text: &str) -> Result<Option<AssetRef>>;
}

/// The four agents the orchestrator drives.
#[derive(Clone)]
pub struct Agents {
    pub script: Arc<dyn ScriptWriter>,
    pub storyboard: Arc<dyn StoryboardDirector>,
    pub image: Arc<dyn ImageRenderer>,
    pub speech: Arc<dyn SpeechSynthesizer>,
}

impl Agents {
    /// Use one provider for every agent.
    pub fn from_provider<P>(provider: Arc<P>) -> Self
    where
        P: ScriptWriter + StoryboardDirector + ImageRenderer + SpeechSynthesizer + 'static,
    {
        Self {
            script: provider.clone(),
            storyboard: provider.clone(),
            image: provider.clone(),
            speech: provider,
        }
    }
}

impl std::fmt::Debug for Agents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agents").finish_non_exhaustive()
    }
}
