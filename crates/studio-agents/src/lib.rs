//! # studio-agents
//!
//! Generation agents for the autostudio pipeline.
//!
//! This crate provides:
//!
//! - **Agent traits** ([`ScriptWriter`], [`StoryboardDirector`],
//!   [`ImageRenderer`], [`SpeechSynthesizer`]) -- the request/response
//!   boundaries the orchestrator drives.
//! - **[`Agents`]** -- the bundle of trait objects handed to the orchestrator.
//! - **[`providers::GeminiClient`]** -- a provider backing all four agents
//!   with the Gemini REST API.

pub mod agent;
mod parse;
pub mod placeholder;
pub mod providers;

pub use agent::{Agents, ImageRenderer, ScriptWriter, SpeechSynthesizer, StoryboardDirector};
