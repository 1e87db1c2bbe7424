//! OpenAiCompatBackend -- [`GenerationBackend`] for any OpenAI-compatible
//! Chat Completions endpoint (Groq by default).
//!
//! One non-streaming `POST {base_url}/chat/completions` per turn. Transport
//! and payload failures are mapped onto [`GenerationError`] so the Turn
//! Orchestrator can pick a fallback line.
//!
//! The API key is wrapped in [`secrecy::SecretString`] and is never logged
//! or included in `Debug` output.

pub mod types;

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use tracing::{Instrument, debug, info_span};

use parley_core::generation::backend::GenerationBackend;
use parley_observe::genai_attrs;
use parley_types::config::GenerationConfig;
use parley_types::error::ConfigError;
use parley_types::generation::{GenerationError, GenerationRequest};

use types::{ChatCompletionRequest, ChatCompletionResponse, ChatMessage};

/// Extra seconds the HTTP client waits beyond the turn's generation timeout,
/// so the orchestrator's own deadline fires first.
const CLIENT_TIMEOUT_SLACK_SECS: u64 = 5;

/// OpenAI-compatible chat completion backend.
///
/// Does not derive Debug: it holds the API key.
pub struct OpenAiCompatBackend {
    client: reqwest::Client,
    api_key: SecretString,
    provider: String,
    base_url: String,
    model: String,
    max_tokens: u32,
    temperature: f64,
}

impl OpenAiCompatBackend {
    /// Build a backend from the `[generation]` config section.
    pub fn new(api_key: SecretString, config: &GenerationConfig) -> Result<Self, ConfigError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(
                config.timeout_secs + CLIENT_TIMEOUT_SLACK_SECS,
            ))
            .build()
            .map_err(|e| ConfigError::Invalid(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            provider: provider_name(&config.base_url),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        })
    }

    fn url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    /// System prompt, then history oldest first, then the new user message.
    fn to_wire_request(&self, request: &GenerationRequest) -> ChatCompletionRequest {
        let mut messages = Vec::with_capacity(request.history.len() + 2);
        messages.push(ChatMessage {
            role: "system".to_string(),
            content: request.system.clone(),
        });
        messages.extend(request.history.iter().map(|entry| ChatMessage {
            role: entry.role.to_string(),
            content: entry.content.clone(),
        }));
        messages.push(ChatMessage {
            role: "user".to_string(),
            content: request.new_message.clone(),
        });

        ChatCompletionRequest {
            model: self.model.clone(),
            messages,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            stream: false,
        }
    }
}

/// Short provider label derived from the endpoint host.
fn provider_name(base_url: &str) -> String {
    let host = base_url
        .split("://")
        .nth(1)
        .unwrap_or(base_url)
        .split(['/', ':'])
        .next()
        .unwrap_or_default();
    if host.contains("groq") {
        "groq".to_string()
    } else if host.contains("openai") {
        "openai".to_string()
    } else {
        "openai-compatible".to_string()
    }
}

/// Pull the reply text out of a completion payload.
pub(crate) fn extract_reply(response: ChatCompletionResponse) -> Result<String, GenerationError> {
    let content = response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message)
        .and_then(|message| message.content)
        .ok_or_else(|| GenerationError::Malformed("response has no choices[0].message.content".into()))?;

    if content.trim().is_empty() {
        return Err(GenerationError::Malformed("reply content is empty".into()));
    }
    Ok(content)
}

fn map_send_error(err: reqwest::Error) -> GenerationError {
    if err.is_timeout() {
        GenerationError::Timeout
    } else {
        GenerationError::Rejected {
            status: None,
            message: format!("HTTP request failed: {err}"),
        }
    }
}

impl GenerationBackend for OpenAiCompatBackend {
    fn name(&self) -> &str {
        &self.provider
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        let body = self.to_wire_request(request);
        let span = info_span!(
            "gen_ai.chat",
            "gen_ai.operation.name" = genai_attrs::OP_CHAT,
            "gen_ai.provider.name" = %self.provider,
            "gen_ai.request.model" = %self.model,
            "gen_ai.request.max_tokens" = self.max_tokens,
            "gen_ai.request.temperature" = self.temperature,
            "gen_ai.usage.input_tokens" = tracing::field::Empty,
            "gen_ai.usage.output_tokens" = tracing::field::Empty,
            "gen_ai.response.finish_reasons" = tracing::field::Empty,
        );

        async {
            let response = self
                .client
                .post(self.url())
                .bearer_auth(self.api_key.expose_secret())
                .json(&body)
                .send()
                .await
                .map_err(map_send_error)?;

            let status = response.status();
            if !status.is_success() {
                let error_body = response.text().await.unwrap_or_default();
                return Err(GenerationError::Rejected {
                    status: Some(status.as_u16()),
                    message: format!("HTTP {status}: {error_body}"),
                });
            }

            let payload: ChatCompletionResponse = response.json().await.map_err(|e| {
                if e.is_timeout() {
                    GenerationError::Timeout
                } else {
                    GenerationError::Malformed(format!("failed to parse response: {e}"))
                }
            })?;

            let current = tracing::Span::current();
            if let Some(usage) = &payload.usage {
                current.record(genai_attrs::GEN_AI_USAGE_INPUT_TOKENS, usage.prompt_tokens);
                current.record(genai_attrs::GEN_AI_USAGE_OUTPUT_TOKENS, usage.completion_tokens);
            }
            if let Some(reason) = payload.choices.first().and_then(|c| c.finish_reason.as_deref()) {
                current.record(genai_attrs::GEN_AI_RESPONSE_FINISH_REASONS, reason);
            }

            let reply = extract_reply(payload)?;
            debug!(reply_len = reply.len(), "generation succeeded");
            Ok(reply)
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_types::generation::{ContextEntry, FailureKind};

    fn config(base_url: &str) -> GenerationConfig {
        GenerationConfig {
            base_url: base_url.to_string(),
            ..GenerationConfig::default()
        }
    }

    fn backend(base_url: &str) -> OpenAiCompatBackend {
        OpenAiCompatBackend::new(SecretString::from("test-key"), &config(base_url)).unwrap()
    }

    fn parse(json: &str) -> ChatCompletionResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_name_and_model_from_config() {
        let backend = backend("https://api.groq.com/openai/v1");
        assert_eq!(backend.name(), "groq");
        assert_eq!(backend.model(), "llama3-8b-8192");
        assert_eq!(backend.url(), "https://api.groq.com/openai/v1/chat/completions");
    }

    #[test]
    fn test_provider_name_for_other_hosts() {
        assert_eq!(provider_name("https://api.openai.com/v1"), "openai");
        assert_eq!(provider_name("http://localhost:8080/v1"), "openai-compatible");
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let backend = backend("http://localhost:8080/v1/");
        assert_eq!(backend.url(), "http://localhost:8080/v1/chat/completions");
    }

    #[test]
    fn test_wire_request_orders_system_history_user() {
        let backend = backend("https://api.groq.com/openai/v1");
        let request = GenerationRequest {
            system: "You are Miku.".into(),
            history: vec![ContextEntry::user("hi"), ContextEntry::assistant("hello")],
            new_message: "how are you?".into(),
        };

        let wire = backend.to_wire_request(&request);
        let roles: Vec<&str> = wire.messages.iter().map(|m| m.role.as_str()).collect();
        assert_eq!(roles, vec!["system", "user", "assistant", "user"]);
        assert_eq!(wire.messages[0].content, "You are Miku.");
        assert_eq!(wire.messages[3].content, "how are you?");
        assert_eq!(wire.max_tokens, 500);
        assert!(!wire.stream);

        let json = serde_json::to_value(&wire).unwrap();
        assert_eq!(json["model"], "llama3-8b-8192");
        assert_eq!(json["temperature"], 0.8);
    }

    #[test]
    fn test_extract_reply_reads_first_choice() {
        let payload = parse(
            r#"{"choices":[{"message":{"role":"assistant","content":"Hi there!"},"finish_reason":"stop"}],
                "usage":{"prompt_tokens":12,"completion_tokens":3}}"#,
        );
        assert_eq!(extract_reply(payload).unwrap(), "Hi there!");
    }

    #[test]
    fn test_extract_reply_without_choices_is_malformed() {
        let err = extract_reply(parse(r#"{"choices":[]}"#)).unwrap_err();
        assert_eq!(err.kind(), FailureKind::Malformed);

        let err = extract_reply(parse(r#"{"id":"x"}"#)).unwrap_err();
        assert_eq!(err.kind(), FailureKind::Malformed);
    }

    #[test]
    fn test_extract_reply_blank_content_is_malformed() {
        let payload = parse(r#"{"choices":[{"message":{"content":"   "}}]}"#);
        assert!(matches!(
            extract_reply(payload),
            Err(GenerationError::Malformed(_))
        ));

        let payload = parse(r#"{"choices":[{"message":{"content":null}}]}"#);
        assert!(matches!(
            extract_reply(payload),
            Err(GenerationError::Malformed(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_unavailable() {
        // Bind then drop a listener so the port is known to be closed.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let backend = backend(&format!("http://127.0.0.1:{port}/v1"));
        let request = GenerationRequest {
            system: "sys".into(),
            history: vec![],
            new_message: "hello".into(),
        };

        let err = backend.generate(&request).await.unwrap_err();
        assert_eq!(err.kind(), FailureKind::Unavailable);
    }
}
