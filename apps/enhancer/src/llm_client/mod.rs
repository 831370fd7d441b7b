/// LLM Client — the single point of entry for all hosted model calls.
///
/// ARCHITECTURAL RULE: No other module may call a model provider's HTTP API directly.
/// All LLM interactions MUST go through this module.
///
/// Two providers are wired in: Groq (OpenAI-compatible chat completions) scores
/// resumes, Gemini rewrites them and embeds documents for the collection store.
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response};
use serde::{de::DeserializeOwned, Deserialize};
use thiserror::Error;
use tracing::warn;

pub mod gemini;
pub mod groq;
pub mod prompts;

pub use gemini::GeminiClient;
pub use groq::GroqClient;

pub(crate) const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);
/// Total attempts per call, including the first.
const MAX_ATTEMPTS: u32 = 4;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// The model answered, but not with the JSON asked for. `raw` keeps the answer.
    #[error("JSON parse error: {source}")]
    Parse {
        #[source]
        source: serde_json::Error,
        raw: String,
    },

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("LLM returned empty content")]
    EmptyContent,
}

/// Output shape requested from a completion call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    Text,
    /// Provider-side JSON mode. The prompt must still describe the schema.
    Json,
}

/// A hosted text-generation model.
///
/// Carried in `AppState` as `Arc<dyn TextModel>` so handlers can be exercised
/// against a fake in tests.
#[async_trait]
pub trait TextModel: Send + Sync {
    /// Identifier of the remote model, for logs and responses.
    fn model_name(&self) -> &str;

    async fn complete(
        &self,
        system: &str,
        prompt: &str,
        format: ResponseFormat,
    ) -> Result<String, LlmError>;
}

/// Whether an embedding is computed for a stored document or for a search query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbedPurpose {
    Document,
    Query,
}

/// A hosted text-embedding model.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str, purpose: EmbedPurpose) -> Result<Vec<f32>, LlmError>;
}

#[derive(Debug, Deserialize)]
struct ProviderError {
    error: ProviderErrorBody,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    message: String,
}

/// Sends a request built by `make_request`, retrying on 429 (rate limit) and 5xx
/// errors with exponential backoff, and deserializes the JSON body.
///
/// `make_request` is called once per attempt because a `RequestBuilder` is consumed by `send`.
pub(crate) async fn send_with_retry<T, F>(provider: &str, make_request: F) -> Result<T, LlmError>
where
    T: DeserializeOwned,
    F: Fn() -> RequestBuilder,
{
    let mut last_error: Option<LlmError> = None;

    for attempt in 0..MAX_ATTEMPTS {
        if attempt > 0 {
            // Exponential backoff: 1s, 2s, 4s
            let delay = backoff_delay(attempt);
            warn!(
                "{provider} call attempt {} failed, retrying after {}ms...",
                attempt,
                delay.as_millis()
            );
            tokio::time::sleep(delay).await;
        }

        let response = match make_request().send().await {
            Ok(r) => r,
            Err(e) => {
                last_error = Some(LlmError::Http(e));
                continue;
            }
        };

        match classify(provider, response).await {
            Attempt::Done(response) => return Ok(response.json::<T>().await?),
            Attempt::Retry(e) => last_error = Some(e),
            Attempt::Fail(e) => return Err(e),
        }
    }

    Err(last_error.unwrap_or(LlmError::RateLimited {
        retries: MAX_ATTEMPTS - 1,
    }))
}

/// Delay before retry number `attempt` (1-based): 1s, 2s, 4s.
fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_millis(1000 * (1 << (attempt - 1)))
}

/// Asks `model` for JSON, strips markdown code fences and deserializes into `T`.
///
/// A non-JSON answer comes back as [`LlmError::Parse`] carrying the raw text,
/// so callers can fall back to reading it as prose.
pub async fn complete_json<T: DeserializeOwned>(
    model: &dyn TextModel,
    system: &str,
    prompt: &str,
) -> Result<T, LlmError> {
    let raw = model.complete(system, prompt, ResponseFormat::Json).await?;
    if raw.trim().is_empty() {
        return Err(LlmError::EmptyContent);
    }
    match serde_json::from_str(strip_code_fences(&raw)) {
        Ok(value) => Ok(value),
        Err(source) => Err(LlmError::Parse { source, raw }),
    }
}

enum Attempt {
    Done(Response),
    Retry(LlmError),
    Fail(LlmError),
}

async fn classify(provider: &str, response: Response) -> Attempt {
    let status = response.status();

    if status.as_u16() == 429 || status.is_server_error() {
        let body = response.text().await.unwrap_or_default();
        warn!("{provider} API returned {}: {}", status, body);
        return Attempt::Retry(LlmError::Api {
            status: status.as_u16(),
            message: body,
        });
    }

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Attempt::Fail(LlmError::Api {
            status: status.as_u16(),
            message: provider_error_message(body),
        });
    }

    Attempt::Done(response)
}

/// Pulls `error.message` out of a provider error body, falling back to the raw body.
/// Groq (OpenAI-compatible) and Gemini both use this envelope.
fn provider_error_message(body: String) -> String {
    serde_json::from_str::<ProviderError>(&body)
        .map(|e| e.error.message)
        .unwrap_or(body)
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
/// A language tag on the opening fence line is dropped along with the fence.
pub fn strip_code_fences(text: &str) -> &str {
    let text = text.trim();
    let Some(body) = text.strip_prefix("```") else {
        return text;
    };

    let body = match body.split_once('\n') {
        Some((tag, rest)) if is_fence_tag(tag) => rest,
        Some(_) => body,
        None => body.strip_prefix("json").unwrap_or(body),
    };

    let body = body.trim();
    body.strip_suffix("```").map(str::trim).unwrap_or(body)
}

fn is_fence_tag(tag: &str) -> bool {
    tag.trim()
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
