//! Text completion adapters.
//!
//! Mistral, Groq and OpenAI all speak the OpenAI-style `chat/completions`
//! wire format, so one adapter covers the three endpoints; each named
//! constructor pins the endpoint, default model and capability tier.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use forge_models::{Artifact, CapabilityTier, GenerationRequest, ProviderDescriptor};

use crate::adapter::{text_spec, ProviderAdapter};
use crate::error::{clip_detail, ProviderError, ProviderResult};

const MISTRAL_ENDPOINT: &str = "https://api.mistral.ai/v1/chat/completions";
const GROQ_ENDPOINT: &str = "https://api.groq.com/openai/v1/chat/completions";
const OPENAI_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";

/// Chat completions request.
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

/// Chat completions response.
#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: String,
}

/// Adapter for OpenAI-style chat completion endpoints.
pub struct ChatCompletionsAdapter {
    descriptor: ProviderDescriptor,
    endpoint: String,
    model: String,
    api_key: String,
    client: Client,
}

impl ChatCompletionsAdapter {
    /// Mistral's hosted completion API.
    pub fn mistral(api_key: impl Into<String>) -> Self {
        Self::custom(
            "mistral",
            CapabilityTier::Quality,
            MISTRAL_ENDPOINT,
            "mistral-small-latest",
            api_key,
        )
    }

    /// Groq's low-latency completion API.
    pub fn groq(api_key: impl Into<String>) -> Self {
        Self::custom(
            "groq",
            CapabilityTier::Fast,
            GROQ_ENDPOINT,
            "llama-3.3-70b-versatile",
            api_key,
        )
    }

    /// OpenAI's completion API.
    pub fn openai(api_key: impl Into<String>) -> Self {
        Self::custom(
            "openai",
            CapabilityTier::Quality,
            OPENAI_ENDPOINT,
            "gpt-4o-mini",
            api_key,
        )
    }

    /// Any endpoint speaking the same wire format.
    pub fn custom(
        name: impl Into<String>,
        tier: CapabilityTier,
        endpoint: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            descriptor: ProviderDescriptor::new(name, tier),
            endpoint: endpoint.into(),
            model: model.into(),
            api_key: api_key.into(),
            client: Client::new(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.descriptor = self.descriptor.with_timeout(timeout);
        self
    }

    pub fn with_min_interval(mut self, min_interval: Duration) -> Self {
        self.descriptor = self.descriptor.with_min_interval(min_interval);
        self
    }
}

#[async_trait]
impl ProviderAdapter for ChatCompletionsAdapter {
    fn descriptor(&self) -> &ProviderDescriptor {
        &self.descriptor
    }

    async fn invoke(&self, request: &GenerationRequest) -> ProviderResult<Artifact> {
        let spec = text_spec(request)?;

        let body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: &spec.prompt,
            }],
            max_tokens: spec.max_tokens,
            temperature: spec.temperature,
        };

        debug!(provider = %self.descriptor.name, model = %self.model, "Requesting completion");

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .timeout(self.descriptor.timeout)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(ProviderError::bad_response(
                Some(status.as_u16()),
                clip_detail(text),
            ));
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| {
            ProviderError::bad_response(None, format!("malformed completion body: {}", e))
        })?;

        let content = parsed
            .choices
            .first()
            .map(|c| c.message.content.as_str())
            .ok_or_else(|| ProviderError::bad_response(None, "no choices in completion"))?;

        let content = strip_code_fences(content);
        if content.is_empty() {
            return Err(ProviderError::validation("empty completion content"));
        }

        Ok(Artifact::text(content))
    }
}

/// Strip a markdown code fence some models wrap their output in.
fn strip_code_fences(text: &str) -> &str {
    let text = text.trim();
    let text = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"))
        .unwrap_or(text);
    let text = text.strip_suffix("```").unwrap_or(text);
    text.trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn completion_body(content: &str) -> serde_json::Value {
        json!({
            "choices": [
                { "message": { "role": "assistant", "content": content } }
            ]
        })
    }

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("plain text"), "plain text");
        assert_eq!(strip_code_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```\nhello\n```"), "hello");
    }

    #[tokio::test]
    async fn test_successful_completion() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("a caption")))
            .mount(&server)
            .await;

        let adapter = ChatCompletionsAdapter::groq("test-key")
            .with_endpoint(format!("{}/v1/chat/completions", server.uri()));

        let request = GenerationRequest::text("write a caption");
        let artifact = adapter.invoke(&request).await.unwrap();

        match artifact {
            Artifact::Text { content } => assert_eq!(content, "a caption"),
            other => panic!("expected text artifact, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_server_error_is_bad_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
            .mount(&server)
            .await;

        let adapter = ChatCompletionsAdapter::mistral("k").with_endpoint(server.uri());
        let err = adapter
            .invoke(&GenerationRequest::text("hi"))
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(500));
    }

    #[tokio::test]
    async fn test_empty_completion_is_validation_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("   ")))
            .mount(&server)
            .await;

        let adapter = ChatCompletionsAdapter::openai("k").with_endpoint(server.uri());
        let err = adapter
            .invoke(&GenerationRequest::text("hi"))
            .await
            .unwrap_err();

        assert!(matches!(err, ProviderError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_slow_server_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(completion_body("late"))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let adapter = ChatCompletionsAdapter::groq("k")
            .with_endpoint(server.uri())
            .with_timeout(Duration::from_millis(50));

        let err = adapter
            .invoke(&GenerationRequest::text("hi"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Timeout { .. }));
    }

    #[tokio::test]
    async fn test_wrong_payload_kind() {
        let adapter = ChatCompletionsAdapter::groq("k");
        let err = adapter
            .invoke(&GenerationRequest::image("sunset", 512, 512))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Validation { .. }));
    }
}
