use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use game_core::{
    CommentaryError, CommentaryProvider, CommentaryRequest, EMPTY_COMMENTARY,
    FALLBACK_COMMENTARY,
};
use game_types::Verdict;

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Commentary backed by the Gemini `generateContent` endpoint.
///
/// Without an API key every request fails with `NotConfigured`, which callers
/// turn into the static fallback line.
#[derive(Debug, Clone)]
pub struct GeminiCommentary {
    client: reqwest::Client,
    api_key: Option<String>,
    model: String,
    language: String,
    base_url: String,
}

#[derive(Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Serialize, Deserialize, Default)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<Content>,
}

impl GeminiCommentary {
    pub fn new(
        api_key: Option<String>,
        model: impl Into<String>,
        language: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, CommentaryError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CommentaryError::Request(e.to_string()))?;

        Ok(Self {
            client,
            api_key,
            model: model.into(),
            language: language.into(),
            base_url: GEMINI_BASE_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn build_prompt(&self, request: &CommentaryRequest) -> String {
        let history = request
            .history
            .iter()
            .map(|value| value.to_string())
            .collect::<Vec<_>>()
            .join(", ");

        format!(
            "You are a witty game host for a number guessing game (1-100). \
             The player just guessed {} and the result was {}. \
             Previous guesses: {}. \
             Give a very short, one-sentence encouraging or witty reaction in {}. \
             Keep it under 20 characters.",
            request.guess,
            verdict_label(request.verdict),
            history,
            self.language
        )
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }
}

#[async_trait]
impl CommentaryProvider for GeminiCommentary {
    async fn comment(&self, request: &CommentaryRequest) -> Result<String, CommentaryError> {
        let api_key = self.api_key.as_ref().ok_or(CommentaryError::NotConfigured)?;

        let body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: Some(self.build_prompt(request)),
                }],
            }],
        };

        debug!("Requesting commentary for guess {}", request.guess);
        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    CommentaryError::Timeout
                } else {
                    CommentaryError::Request(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(CommentaryError::Request(format!(
                "Gemini API error {}: {}",
                status, text
            )));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| CommentaryError::Request(format!("Invalid Gemini response: {}", e)))?;

        let text = parsed
            .candidates
            .into_iter()
            .filter_map(|candidate| candidate.content)
            .flat_map(|content| content.parts)
            .filter_map(|part| part.text)
            .collect::<String>();
        let text = text.trim();

        if text.is_empty() {
            Ok(EMPTY_COMMENTARY.to_string())
        } else {
            Ok(text.to_string())
        }
    }
}

/// Verdict as the host sees it: a win is "정답", misses stay UP/DOWN.
fn verdict_label(verdict: Verdict) -> &'static str {
    match verdict {
        Verdict::Correct => "정답",
        Verdict::Up | Verdict::Down => verdict.as_str(),
    }
}

/// Ask `provider` once, falling back to the static line on error or timeout.
pub async fn comment_or_fallback(
    provider: &dyn CommentaryProvider,
    request: &CommentaryRequest,
    timeout: Duration,
) -> String {
    match tokio::time::timeout(timeout, provider.comment(request)).await {
        Ok(Ok(text)) => text,
        Ok(Err(CommentaryError::NotConfigured)) => FALLBACK_COMMENTARY.to_string(),
        Ok(Err(e)) => {
            warn!("Commentary failed for guess {}: {}", request.guess, e);
            FALLBACK_COMMENTARY.to_string()
        }
        Err(_) => {
            warn!("Commentary timed out for guess {}", request.guess);
            FALLBACK_COMMENTARY.to_string()
        }
    }
}
