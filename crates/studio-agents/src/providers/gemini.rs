//! Gemini provider.
//!
//! Implements all four agent traits against the Gemini REST API
//! (`generateContent` for text and speech, Imagen `predict` for stills).
//!
//! Features:
//! - Token-bucket rate limiting shared across agents via [`governor`].
//! - Per-request timeout.
//! - Placeholder image fallback when Imagen is unavailable.
//!
//! No request is ever retried.

use std::num::NonZeroU32;
use std::time::Duration;

use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use studio_core::config::{GeminiConfig, ProductionConfig};
use studio_core::{AgentTag, AssetRef, Error, Frame, Result, ScriptLine};

use crate::agent::{ImageRenderer, ScriptWriter, SpeechSynthesizer, StoryboardDirector};
use crate::parse::{parse_script, parse_storyboard};
use crate::placeholder::Placeholder;

const PROVIDER: &str = "gemini";
const IMAGE_PROMPT_SUFFIX: &str =
    ", cinematic, 4k, highly detailed, photorealistic, 9:16 aspect ratio";

const SCRIPT_INSTRUCTION: &str = "You are ScriptAgent, a screenwriter for vertical short-form \
video. Write a punchy 30 to 50 second script for the user's idea. Respond with a JSON array of \
{character, dialogue, emotion} objects. Use 'Narrator' or a character name. Keep lines short and \
conversational.";

const STORYBOARD_INSTRUCTION: &str = "You are VisualAgent, a film director. Split the script \
into 4 to 8 key frames. Assign every script line to exactly one frame, in order, using \
startScriptIndex and endScriptIndex (inclusive). For each frame give a visualDescription, an \
English imagePrompt for an image model, an audioPrompt describing music and effects, a duration \
in seconds and the transition into the frame: FADE_IN for the first frame, CUT or \
CROSS_DISSOLVE in the middle, FADE_OUT near the end.";

// ---------------------------------------------------------------------------
// Gemini API response types (private)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    text: Option<String>,
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: Option<String>,
    data: String,
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    #[serde(default)]
    predictions: Vec<Prediction>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Prediction {
    bytes_base64_encoded: Option<String>,
    mime_type: Option<String>,
}

impl GenerateContentResponse {
    fn first_part(&self) -> Option<&Part> {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .and_then(|c| c.parts.first())
    }
}

// ---------------------------------------------------------------------------
// Request schemas
// ---------------------------------------------------------------------------

fn script_schema() -> Value {
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "character": { "type": "STRING" },
                "dialogue": { "type": "STRING" },
                "emotion": { "type": "STRING" }
            },
            "required": ["character", "dialogue", "emotion"]
        }
    })
}

fn storyboard_schema() -> Value {
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "sceneNumber": { "type": "INTEGER" },
                "duration": { "type": "NUMBER" },
                "visualDescription": { "type": "STRING" },
                "imagePrompt": { "type": "STRING" },
                "audioPrompt": { "type": "STRING" },
                "transition": {
                    "type": "OBJECT",
                    "properties": {
                        "type": {
                            "type": "STRING",
                            "enum": ["CUT", "FADE_IN", "FADE_OUT", "CROSS_DISSOLVE"]
                        },
                        "duration": { "type": "NUMBER" }
                    },
                    "required": ["type", "duration"]
                },
                "startScriptIndex": { "type": "INTEGER" },
                "endScriptIndex": { "type": "INTEGER" }
            },
            "required": [
                "sceneNumber", "duration", "visualDescription", "imagePrompt",
                "audioPrompt", "transition", "startScriptIndex", "endScriptIndex"
            ]
        }
    })
}

/// Render the script the way the storyboard prompt expects it.
fn script_as_text(script: &[ScriptLine]) -> String {
    script
        .iter()
        .map(|line| format!("{} ({}): {}", line.character, line.emotion, line.dialogue))
        .collect::<Vec<_>>()
        .join("\n")
}

// ---------------------------------------------------------------------------
// Provider implementation
// ---------------------------------------------------------------------------

/// Gemini-backed implementation of every agent.
///
/// # Examples
///
/// ```no_run
/// use studio_agents::providers::GeminiClient;
/// use studio_core::config::Config;
///
/// let config = Config::default();
/// let client = GeminiClient::new(&config.gemini, &config.production).unwrap();
/// ```
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    config: GeminiConfig,
    placeholder: Option<Placeholder>,
    rate_limiter: DefaultDirectRateLimiter,
}

impl GeminiClient {
    /// Build a client. Fails when no API key can be resolved or the rate
    /// limit is zero.
    pub fn new(config: &GeminiConfig, production: &ProductionConfig) -> Result<Self> {
        let api_key = config.resolve_api_key().ok_or_else(|| {
            Error::Config("no Gemini API key configured (set gemini.api_key or GEMINI_API_KEY)".into())
        })?;

        let rps = NonZeroU32::new(config.requests_per_second)
            .ok_or_else(|| Error::Config("gemini.requests_per_second must be at least 1".into()))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::provider(PROVIDER, format!("failed to build HTTP client: {e}")))?;

        let placeholder = production
            .placeholder_images
            .then(|| Placeholder::new(production.placeholder_width, production.placeholder_height));

        Ok(Self {
            client,
            api_key,
            config: config.clone(),
            placeholder,
            rate_limiter: RateLimiter::direct(Quota::per_second(rps)),
        })
    }

    fn url(&self, model: &str, method: &str) -> String {
        format!(
            "{}/models/{}:{}",
            self.config.base_url.trim_end_matches('/'),
            model,
            method
        )
    }

    /// POST `body` to `model:method` with rate limiting.
    async fn post<T: DeserializeOwned>(&self, model: &str, method: &str, body: &Value) -> Result<T> {
        self.rate_limiter.until_ready().await;

        let url = self.url(model, method);
        debug!(url = %url, "Gemini request");

        let resp = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| Error::provider(PROVIDER, format!("request to {model} failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let detail = resp.text().await.unwrap_or_default();
            return Err(Error::provider(
                PROVIDER,
                format!("{model} returned {status}: {}", detail.trim()),
            ));
        }

        resp.json()
            .await
            .map_err(|e| Error::provider(PROVIDER, format!("unreadable {model} response: {e}")))
    }

    /// Structured-JSON text generation; returns the raw text part.
    async fn generate_json(
        &self,
        agent: AgentTag,
        model: &str,
        instruction: &str,
        prompt: String,
        schema: Value,
    ) -> Result<String> {
        let body = json!({
            "systemInstruction": { "parts": [{ "text": instruction }] },
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": schema
            }
        });

        let resp: GenerateContentResponse = self.post(model, "generateContent", &body).await?;
        resp.first_part()
            .and_then(|p| p.text.clone())
            .ok_or_else(|| Error::generation(agent, "response contained no text"))
    }

    async fn request_image(&self, prompt: &str) -> Result<AssetRef> {
        let body = json!({
            "instances": [{ "prompt": format!("{prompt}{IMAGE_PROMPT_SUFFIX}") }],
            "parameters": {
                "sampleCount": 1,
                "aspectRatio": "9:16",
                "outputMimeType": "image/jpeg"
            }
        });

        let resp: PredictResponse = self.post(&self.config.image_model, "predict", &body).await?;
        let prediction = resp
            .predictions
            .into_iter()
            .next()
            .ok_or_else(|| Error::generation(AgentTag::Visual, "no image data returned"))?;
        let data = prediction
            .bytes_base64_encoded
            .ok_or_else(|| Error::generation(AgentTag::Visual, "no image data returned"))?;
        let mime = prediction.mime_type.unwrap_or_else(|| "image/jpeg".into());

        Ok(format!("data:{mime};base64,{data}"))
    }

    async fn request_speech(&self, text: &str) -> Result<Option<AssetRef>> {
        let body = json!({
            "contents": [{ "parts": [{ "text": text }] }],
            "generationConfig": {
                "responseModalities": ["AUDIO"],
                "speechConfig": {
                    "voiceConfig": {
                        "prebuiltVoiceConfig": { "voiceName": self.config.voice_name }
                    }
                }
            }
        });

        let resp: GenerateContentResponse = self
            .post(&self.config.speech_model, "generateContent", &body)
            .await?;

        Ok(resp
            .first_part()
            .and_then(|p| p.inline_data.as_ref())
            .map(|inline| {
                let mime = inline.mime_type.as_deref().unwrap_or("audio/mp3");
                format!("data:{mime};base64,{}", inline.data)
            }))
    }
}

#[async_trait]
impl ScriptWriter for GeminiClient {
    async fn write_script(&self, idea: &str) -> Result<Vec<ScriptLine>> {
        let text = self
            .generate_json(
                AgentTag::Script,
                &self.config.script_model,
                SCRIPT_INSTRUCTION,
                format!("Idea: {idea}\n\nWrite a short-form video script for this idea."),
                script_schema(),
            )
            .await?;
        parse_script(&text)
    }
}

#[async_trait]
impl StoryboardDirector for GeminiClient {
    async fn plan_storyboard(&self, script: &[ScriptLine]) -> Result<Vec<Frame>> {
        let text = self
            .generate_json(
                AgentTag::Visual,
                &self.config.storyboard_model,
                STORYBOARD_INSTRUCTION,
                format!(
                    "Script (line index = order, starting at 0):\n{}\n\nCreate the storyboard as JSON.",
                    script_as_text(script)
                ),
                storyboard_schema(),
            )
            .await?;
        parse_storyboard(&text, script)
    }
}

#[async_trait]
impl ImageRenderer for GeminiClient {
    async fn render_image(&self, prompt: &str) -> Result<AssetRef> {
        match self.request_image(prompt).await {
            Ok(asset) => Ok(asset),
            Err(e) => match self.placeholder {
                Some(ref placeholder) => {
                    warn!(error = %e, "Image generation failed, substituting placeholder");
                    Ok(placeholder.url())
                }
                None => Err(e),
            },
        }
    }
}

#[async_trait]
impl SpeechSynthesizer for GeminiClient {
    async fn synthesize(&self, text: &str) -> Result<Option<AssetRef>> {
        if text.trim().is_empty() {
            return Ok(None);
        }

        match self.request_speech(text).await {
            Ok(asset) => Ok(asset),
            Err(e) => {
                warn!(error = %e, "Speech generation failed");
                Ok(None)
            }
        }
    }
}
