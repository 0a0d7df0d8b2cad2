//! Horoscope client
//!
//! Fetches short daily horoscope texts from Google's generative
//! language API. The two participants' signs are fetched concurrently
//! and jointly awaited; either one failing fails the pair, so the page
//! never shows a partial reading.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error};

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const GEMINI_MODEL: &str = "gemini-2.5-flash";
const USER_AGENT: &str = "Wavelength/0.1.0";

/// Horoscope client errors
#[derive(Debug, Error)]
pub enum HoroscopeError {
    /// No API key configured; checked before any network call
    #[error("Gemini API key is not configured. Set GEMINI_API_KEY to enable horoscopes.")]
    MissingKey,

    /// The configured API key was rejected upstream
    #[error("The provided API key is not valid. Please check GEMINI_API_KEY.")]
    InvalidKey,

    /// Upstream is overloaded or failing
    #[error("Horoscope service unavailable (HTTP {0})")]
    Unavailable(u16),

    /// Failed to construct the HTTP client
    #[error("HTTP client error: {0}")]
    Client(String),

    /// Any other failure, kept vague for display
    #[error("Could not fetch horoscope for {0}. The cosmos are mysterious today.")]
    Fetch(String),
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Part {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

fn prompt_for(sign: &str) -> String {
    format!(
        "Provide a brief horoscope for the zodiac sign {} for tomorrow.. Keep it under 100 words.",
        sign
    )
}

/// Map a non-success response onto a display-oriented error
///
/// A 400 carrying Google's "API key not valid" body text counts as a
/// credential problem, not a generic failure.
fn classify_failure(status: u16, body: &str, sign: &str) -> HoroscopeError {
    if status == 401 || status == 403 {
        return HoroscopeError::InvalidKey;
    }
    if body.contains("API key not valid") {
        return HoroscopeError::InvalidKey;
    }
    if status == 429 || (500..600).contains(&status) {
        return HoroscopeError::Unavailable(status);
    }
    HoroscopeError::Fetch(sign.to_string())
}

/// Concatenated text of the first candidate, if any
fn extract_text(response: GenerateContentResponse) -> Option<String> {
    let content = response.candidates?.into_iter().next()?.content?;
    let text: String = content.parts.into_iter().filter_map(|p| p.text).collect();
    let text = text.trim().to_string();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Gemini-backed horoscope client
pub struct HoroscopeClient {
    http_client: reqwest::Client,
    api_key: Option<String>,
}

impl HoroscopeClient {
    /// Create a new client; `api_key: None` disables fetching but
    /// still constructs, so the rest of the app runs without the
    /// feature
    pub fn new(api_key: Option<String>) -> Result<Self, HoroscopeError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| HoroscopeError::Client(e.to_string()))?;

        Ok(Self {
            http_client,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        })
    }

    /// Whether an API key is present
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Fetch one sign's horoscope text
    pub async fn fetch(&self, sign: &str) -> Result<String, HoroscopeError> {
        let api_key = self.api_key.as_deref().ok_or(HoroscopeError::MissingKey)?;
        self.generate(api_key, sign).await
    }

    /// Fetch both signs concurrently; either failure fails the pair
    pub async fn fetch_pair(
        &self,
        sign1: &str,
        sign2: &str,
    ) -> Result<(String, String), HoroscopeError> {
        tokio::try_join!(self.fetch(sign1), self.fetch(sign2))
    }

    async fn generate(&self, api_key: &str, sign: &str) -> Result<String, HoroscopeError> {
        let url = format!("{}/models/{}:generateContent", GEMINI_BASE_URL, GEMINI_MODEL);
        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: Some(prompt_for(sign)),
                }],
            }],
        };

        debug!(sign = %sign, "Requesting horoscope");

        let response = self
            .http_client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!("Horoscope request for {} failed: {}", sign, e);
                HoroscopeError::Fetch(sign.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Horoscope API error {} for {}: {}", status, sign, body);
            return Err(classify_failure(status.as_u16(), &body, sign));
        }

        let parsed: GenerateContentResponse = response.json().await.map_err(|e| {
            error!("Horoscope response parse failed for {}: {}", sign, e);
            HoroscopeError::Fetch(sign.to_string())
        })?;

        extract_text(parsed).ok_or_else(|| HoroscopeError::Fetch(sign.to_string()))
    }
}
