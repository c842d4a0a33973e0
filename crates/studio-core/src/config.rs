//! Application configuration types.
//!
//! The top-level [`Config`] struct is deserialized from TOML. Every section
//! defaults sensibly so a completely empty file is valid.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Environment variables consulted, in order, when no API key is configured.
pub const API_KEY_ENV_VARS: [&str; 2] = ["GEMINI_API_KEY", "API_KEY"];

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub gemini: GeminiConfig,
    pub production: ProductionConfig,
    pub events: EventsConfig,
}

impl Config {
    /// Deserialize a `Config` from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str).map_err(|e| Error::Config(format!("config parse error: {e}")))
    }

    /// Read and parse a TOML config file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Return a list of validation warnings (non-fatal issues).
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.gemini.resolve_api_key().is_none() {
            warnings.push(format!(
                "gemini.api_key is not set and none of {} are defined",
                API_KEY_ENV_VARS.join(", ")
            ));
        }

        if !self.gemini.base_url.starts_with("http://")
            && !self.gemini.base_url.starts_with("https://")
        {
            warnings.push(format!(
                "gemini.base_url '{}' is not an http(s) URL",
                self.gemini.base_url
            ));
        }

        if self.gemini.timeout_secs == 0 {
            warnings.push("gemini.timeout_secs is 0; requests will time out immediately".into());
        }

        if self.production.placeholder_images
            && (self.production.placeholder_width == 0 || self.production.placeholder_height == 0)
        {
            warnings.push("production placeholder size has a zero dimension".into());
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// Gemini provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub script_model: String,
    pub storyboard_model: String,
    pub image_model: String,
    pub speech_model: String,
    /// Prebuilt TTS voice.
    pub voice_name: String,
    /// Client-side rate limit shared by all four agents.
    pub requests_per_second: u32,
    pub timeout_secs: u64,
}

impl GeminiConfig {
    /// Configured key, else the first non-empty [`API_KEY_ENV_VARS`] entry.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| {
                API_KEY_ENV_VARS
                    .iter()
                    .filter_map(|var| std::env::var(var).ok())
                    .find(|k| !k.trim().is_empty())
            })
    }
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://generativelanguage.googleapis.com/v1beta".into(),
            script_model: "gemini-2.5-flash".into(),
            storyboard_model: "gemini-2.5-flash".into(),
            image_model: "imagen-3.0-generate-002".into(),
            speech_model: "gemini-2.5-flash-preview-tts".into(),
            voice_name: "Kore".into(),
            requests_per_second: 2,
            timeout_secs: 60,
        }
    }
}

/// Production-stage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductionConfig {
    /// Substitute a placeholder image URL when image generation fails.
    pub placeholder_images: bool,
    pub placeholder_width: u32,
    pub placeholder_height: u32,
}

impl Default for ProductionConfig {
    fn default() -> Self {
        Self {
            placeholder_images: true,
            placeholder_width: 576,
            placeholder_height: 1024,
        }
    }
}

/// State-change broadcast settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EventsConfig {
    pub capacity: usize,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self { capacity: 256 }
    }
}
