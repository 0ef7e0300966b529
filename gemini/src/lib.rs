use tracing::instrument;

pub mod generate;

pub use generate::generate_content;

use serde::{Deserialize, Serialize};

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
}

impl GeminiConfig {
    /// Reads `GEMINI_API_KEY`, `GEMINI_MODEL` and `GEMINI_BASE_URL`.
    ///
    /// A missing key is not an error here. Every call made without one fails
    /// with [`GeminiError::MissingApiKey`] instead, so the rest of the app can
    /// still boot and degrade.
    #[instrument(name = "GeminiConfig::from_env")]
    pub fn from_env() -> Self {
        let api_key = std::env::var("GEMINI_API_KEY").ok();
        if api_key.is_none() {
            tracing::warn!("GEMINI_API_KEY is not set, generative calls will fail");
        }

        Self {
            api_key,
            model: std::env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            base_url: std::env::var("GEMINI_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
        }
    }

    fn generate_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GeminiError {
    #[error("GEMINI_API_KEY is not configured")]
    MissingApiKey,
    #[error("Request to Gemini failed")]
    Http(#[from] reqwest::Error),
    #[error("Gemini responded with {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Gemini returned no text candidates")]
    EmptyResponse,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}
