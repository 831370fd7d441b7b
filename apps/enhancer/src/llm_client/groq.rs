//! Groq chat-completions client (OpenAI-compatible wire format).

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{send_with_retry, LlmError, ResponseFormat, TextModel, REQUEST_TIMEOUT};

pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_MODEL: &str = "llama3-70b-8192";
const TEMPERATURE: f32 = 0.3;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<JsonMode>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct JsonMode {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    pub choices: Vec<Choice>,
    pub usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
pub struct ChoiceMessage {
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl ChatResponse {
    /// Text of the first choice, if the model produced any.
    pub fn text(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .filter(|t| !t.trim().is_empty())
    }
}

/// Client for Groq's hosted chat models. Used for resume/JD compatibility analysis.
#[derive(Clone)]
pub struct GroqClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl GroqClient {
    pub fn new(api_key: String) -> Result<Self, LlmError> {
        Ok(Self {
            client: Client::builder().timeout(REQUEST_TIMEOUT).build()?,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
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

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

fn build_request<'a>(
    model: &'a str,
    system: &'a str,
    prompt: &'a str,
    format: ResponseFormat,
) -> ChatRequest<'a> {
    ChatRequest {
        model,
        messages: [
            ChatMessage {
                role: "system",
                content: system,
            },
            ChatMessage {
                role: "user",
                content: prompt,
            },
        ],
        temperature: TEMPERATURE,
        response_format: match format {
            ResponseFormat::Json => Some(JsonMode {
                kind: "json_object",
            }),
            ResponseFormat::Text => None,
        },
    }
}

#[async_trait]
impl TextModel for GroqClient {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(
        &self,
        system: &str,
        prompt: &str,
        format: ResponseFormat,
    ) -> Result<String, LlmError> {
        let request_body = build_request(&self.model, system, prompt, format);
        let endpoint = self.endpoint();

        let response: ChatResponse = send_with_retry("Groq", || {
            self.client
                .post(&endpoint)
                .bearer_auth(&self.api_key)
                .json(&request_body)
        })
        .await?;

        if let Some(usage) = &response.usage {
            debug!(
                "Groq call succeeded: prompt_tokens={}, completion_tokens={}",
                usage.prompt_tokens, usage.completion_tokens
            );
        }

        response
            .text()
            .map(str::to_string)
            .ok_or(LlmError::EmptyContent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_request_sets_response_format() {
        let request = build_request("llama3-70b-8192", "sys", "user", ResponseFormat::Json);
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["response_format"], json!({"type": "json_object"}));
        assert_eq!(value["messages"][0]["role"], "system");
        assert_eq!(value["messages"][1]["content"], "user");
    }

    #[test]
    fn test_text_request_omits_response_format() {
        let request = build_request("llama3-70b-8192", "sys", "user", ResponseFormat::Text);
        let value = serde_json::to_value(&request).unwrap();
        assert!(value.get("response_format").is_none());
        assert!((value["temperature"].as_f64().unwrap() - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_chat_response_text_takes_first_choice() {
        let body = r#"{
            "choices": [{"message": {"role": "assistant", "content": "Compatibility Score: 80"}}],
            "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
        }"#;
        let response: ChatResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.text(), Some("Compatibility Score: 80"));
    }

    #[test]
    fn test_chat_response_blank_content_is_none() {
        let body = r#"{"choices": [{"message": {"content": "   "}}]}"#;
        let response: ChatResponse = serde_json::from_str(body).unwrap();
        assert!(response.text().is_none());
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let client = GroqClient::new("key".to_string())
            .unwrap()
            .with_base_url("http://localhost:9999/v1/");
        assert_eq!(client.endpoint(), "http://localhost:9999/v1/chat/completions");
    }
}
