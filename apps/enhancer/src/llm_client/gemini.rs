//! Gemini client: `generateContent` for resume rewriting and `embedContent`
//! for collection documents and queries.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{
    send_with_retry, EmbedPurpose, Embedder, LlmError, ResponseFormat, TextModel, REQUEST_TIMEOUT,
};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-1.5-pro";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-004";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    system_instruction: Content<'a>,
    contents: [Content<'a>; 1],
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: [Part<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedRequest<'a> {
    model: String,
    content: Content<'a>,
    task_type: &'static str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
pub struct Candidate {
    pub content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
pub struct CandidatePart {
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    #[serde(default)]
    pub prompt_token_count: u32,
    #[serde(default)]
    pub candidates_token_count: u32,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embedding: EmbeddingValues,
}

#[derive(Debug, Deserialize)]
struct EmbeddingValues {
    values: Vec<f32>,
}

impl GenerateResponse {
    /// Concatenates the text parts of the first candidate.
    pub fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        (!text.trim().is_empty()).then_some(text)
    }
}

/// Client for Google's Gemini API.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    embedding_model: String,
}

impl GeminiClient {
    pub fn new(api_key: String) -> Result<Self, LlmError> {
        Ok(Self {
            client: Client::builder().timeout(REQUEST_TIMEOUT).build()?,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_embedding_model(mut self, model: impl Into<String>) -> Self {
        self.embedding_model = model.into();
        self
    }

    fn endpoint(&self, model: &str, method: &str) -> String {
        format!("{}/models/{model}:{method}", self.base_url)
    }
}

fn build_generate_request<'a>(
    system: &'a str,
    prompt: &'a str,
    format: ResponseFormat,
) -> GenerateRequest<'a> {
    GenerateRequest {
        system_instruction: Content {
            role: None,
            parts: [Part { text: system }],
        },
        contents: [Content {
            role: Some("user"),
            parts: [Part { text: prompt }],
        }],
        generation_config: match format {
            ResponseFormat::Json => Some(GenerationConfig {
                response_mime_type: "application/json",
            }),
            ResponseFormat::Text => None,
        },
    }
}

const fn task_type(purpose: EmbedPurpose) -> &'static str {
    match purpose {
        EmbedPurpose::Document => "RETRIEVAL_DOCUMENT",
        EmbedPurpose::Query => "RETRIEVAL_QUERY",
    }
}

#[async_trait]
impl TextModel for GeminiClient {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(
        &self,
        system: &str,
        prompt: &str,
        format: ResponseFormat,
    ) -> Result<String, LlmError> {
        let request_body = build_generate_request(system, prompt, format);
        let endpoint = self.endpoint(&self.model, "generateContent");

        let response: GenerateResponse = send_with_retry("Gemini", || {
            self.client
                .post(&endpoint)
                .header("x-goog-api-key", &self.api_key)
                .json(&request_body)
        })
        .await?;

        if let Some(usage) = &response.usage_metadata {
            debug!(
                "Gemini call succeeded: prompt_tokens={}, candidate_tokens={}",
                usage.prompt_token_count, usage.candidates_token_count
            );
        }

        response.text().ok_or(LlmError::EmptyContent)
    }
}

#[async_trait]
impl Embedder for GeminiClient {
    async fn embed(&self, text: &str, purpose: EmbedPurpose) -> Result<Vec<f32>, LlmError> {
        let request_body = EmbedRequest {
            model: format!("models/{}", self.embedding_model),
            content: Content {
                role: None,
                parts: [Part { text }],
            },
            task_type: task_type(purpose),
        };
        let endpoint = self.endpoint(&self.embedding_model, "embedContent");

        let response: EmbedResponse = send_with_retry("Gemini", || {
            self.client
                .post(&endpoint)
                .header("x-goog-api-key", &self.api_key)
                .json(&request_body)
        })
        .await?;

        if response.embedding.values.is_empty() {
            return Err(LlmError::EmptyContent);
        }
        Ok(response.embedding.values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_generate_request_uses_camel_case_fields() {
        let request = build_generate_request("sys", "prompt", ResponseFormat::Json);
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["systemInstruction"]["parts"][0]["text"], "sys");
        assert!(value["systemInstruction"].get("role").is_none());
        assert_eq!(value["contents"][0]["role"], "user");
        assert_eq!(
            value["generationConfig"],
            json!({"responseMimeType": "application/json"})
        );
    }

    #[test]
    fn test_text_generate_request_has_no_generation_config() {
        let request = build_generate_request("sys", "prompt", ResponseFormat::Text);
        let value = serde_json::to_value(&request).unwrap();
        assert!(value.get("generationConfig").is_none());
    }

    #[test]
    fn test_generate_response_joins_parts() {
        let body = r#"{
            "candidates": [{"content": {"role": "model", "parts": [{"text": "JANE DOE\n"}, {"text": "Engineer"}]}}],
            "usageMetadata": {"promptTokenCount": 12, "candidatesTokenCount": 4}
        }"#;
        let response: GenerateResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.text().as_deref(), Some("JANE DOE\nEngineer"));
    }

    #[test]
    fn test_generate_response_without_candidates_is_none() {
        let response: GenerateResponse = serde_json::from_str(r#"{"promptFeedback": {}}"#).unwrap();
        assert!(response.text().is_none());
    }

    #[test]
    fn test_endpoint_includes_model_and_method() {
        let client = GeminiClient::new("key".to_string())
            .unwrap()
            .with_embedding_model("text-embedding-004");
        assert_eq!(
            client.endpoint("text-embedding-004", "embedContent"),
            "https://generativelanguage.googleapis.com/v1beta/models/text-embedding-004:embedContent"
        );
    }

    #[test]
    fn test_task_type_matches_purpose() {
        assert_eq!(task_type(EmbedPurpose::Document), "RETRIEVAL_DOCUMENT");
        assert_eq!(task_type(EmbedPurpose::Query), "RETRIEVAL_QUERY");
    }
}
