//! Text generation through the Gemini `generateContent` API

use async_trait::async_trait;
use evalsenior_core::synthesis::{build_prompt, parse_draft};
use evalsenior_core::{Config, ReviewRecord, Secrets, SynthesisDraft, SynthesisGenerator};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use crate::{Error, Result};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

#[derive(Debug, Deserialize)]
struct GenerateResponse {
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
struct Part {
    text: Option<String>,
}

impl GenerateResponse {
    /// Concatenated text of the first candidate
    fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|c| {
                c.parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default()
    }
}

/// Gemini client drafting interview syntheses
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
}

impl GeminiClient {
    /// Create a client; without a key every generation reports a missing key
    pub fn new(api_key: Option<String>, model: impl Into<String>) -> Result<Self> {
        let mut builder = reqwest::Client::builder().user_agent("evalsenior");
        if cfg!(test) {
            builder = builder.no_proxy();
        }

        Ok(Self {
            client: builder.build()?,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            model: model.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Create a client from configuration and secrets
    pub fn from_config(config: &Config, secrets: &Secrets) -> Result<Self> {
        Self::new(secrets.gemini_api_key(), &config.synthesis.model)
    }

    /// Override the API root (used for testing)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Check if an API key is available
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    async fn request(&self, review: &ReviewRecord) -> Result<SynthesisDraft> {
        let api_key = self.api_key.as_deref().ok_or(Error::MissingApiKey)?;
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        );

        let body = json!({
            "contents": [{ "parts": [{ "text": build_prompt(review) }] }],
            "generationConfig": { "responseMimeType": "application/json" },
        });

        debug!(review_id = %review.id, model = %self.model, "Requesting synthesis");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Status {
                action: "generateContent",
                status,
            });
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| Error::Parse(format!("Failed to parse generation response: {}", e)))?;

        let draft = parse_draft(&parsed.text());
        info!(review_id = %review.id, "Synthesis drafted");
        Ok(draft)
    }
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("has_api_key", &self.api_key.is_some())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl SynthesisGenerator for GeminiClient {
    async fn generate(&self, review: &ReviewRecord) -> evalsenior_core::Result<SynthesisDraft> {
        Ok(self.request(review).await?)
    }
}
