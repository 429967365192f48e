//! HTTP client for chat-completion providers.
//!
//! OpenAI, DeepSeek, Qwen and custom endpoints share the OpenAI chat wire:
//!
//! ```text
//! POST <endpoint>
//! Authorization: Bearer <key>
//! {"model": .., "messages": [..], "temperature": .., "max_tokens": ..}
//! -> {"choices": [{"message": {"content": ".."}}]}
//! ```
//!
//! Ollama takes the same messages at `/api/chat` with `"stream": false` and
//! answers with a single `{"message": {"content": ".."}}`.

use super::{DiagramGenerator, extract_diagram};
use crate::config::{AiProvider, ProviderWire, StudioConfig};
use crate::error::{Result, StudioError};
use crate::http;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use ureq::Agent;

const SYSTEM_PROMPT: &str = "You are an assistant that writes PlantUML diagrams. \
Answer with exactly one diagram that starts with @startuml and ends with @enduml. \
Pick the diagram type (sequence, class, activity, component, state) that best fits \
the request. Keep labels in the language of the request. Do not add explanations.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    fn new(role: &str, content: &str) -> Self {
        Self {
            role: role.to_string(),
            content: content.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Debug, Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatCompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: ChatMessage,
}

pub struct ProviderClient {
    agent: Agent,
    provider: AiProvider,
    endpoint: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl ProviderClient {
    pub fn from_config(config: &StudioConfig) -> Self {
        Self {
            agent: http::agent(config.timeout_secs),
            provider: config.provider,
            endpoint: config.effective_endpoint().to_string(),
            api_key: config.api_key.clone(),
            model: config.effective_model().to_string(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }

    pub fn provider(&self) -> AiProvider {
        self.provider
    }

    fn messages(description: &str) -> Vec<ChatMessage> {
        vec![
            ChatMessage::new("system", SYSTEM_PROMPT),
            ChatMessage::new("user", description),
        ]
    }

    /// JSON body for the provider's wire.
    pub fn request_body(&self, description: &str) -> Result<String> {
        let body = match self.provider.wire() {
            ProviderWire::ChatCompletions => serde_json::to_string(&ChatCompletionRequest {
                model: &self.model,
                messages: Self::messages(description),
                temperature: self.temperature,
                max_tokens: self.max_tokens,
            })?,
            ProviderWire::OllamaChat => serde_json::to_string(&OllamaChatRequest {
                model: &self.model,
                messages: Self::messages(description),
                stream: false,
                options: OllamaOptions {
                    temperature: self.temperature,
                    num_predict: self.max_tokens,
                },
            })?,
        };
        Ok(body)
    }

    fn check_ready(&self) -> Result<()> {
        if self.endpoint.trim().is_empty() {
            return Err(StudioError::Config(format!(
                "No API endpoint configured for provider '{}'",
                self.provider
            )));
        }
        if self.model.trim().is_empty() {
            return Err(StudioError::Config(format!(
                "No model configured for provider '{}'",
                self.provider
            )));
        }
        if self.provider.requires_api_key() && self.api_key.trim().is_empty() {
            return Err(StudioError::Config(format!(
                "Provider '{}' needs an API key (flowstudio config api-key <key>)",
                self.provider
            )));
        }
        Ok(())
    }

    fn post(&self, body: String) -> Result<String> {
        let mut request = self
            .agent
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .header("Accept", "application/json");
        if !self.api_key.trim().is_empty() {
            request = request.header("Authorization", format!("Bearer {}", self.api_key.trim()));
        }

        let response = request.send(body)?;
        http::read_body(response)
    }
}

/// Pull the assistant text out of a raw provider reply.
pub fn parse_reply(wire: ProviderWire, body: &str) -> Result<String> {
    let content = match wire {
        ProviderWire::ChatCompletions => {
            let response: ChatCompletionResponse = serde_json::from_str(body)?;
            response
                .choices
                .into_iter()
                .next()
                .map(|c| c.message.content)
                .ok_or_else(|| StudioError::Provider("Reply contained no choices".to_string()))?
        }
        ProviderWire::OllamaChat => {
            let response: OllamaChatResponse = serde_json::from_str(body)?;
            response.message.content
        }
    };
    Ok(content)
}

impl DiagramGenerator for ProviderClient {
    fn generate(&self, description: &str) -> Result<String> {
        self.check_ready()?;

        info!(provider = %self.provider, model = %self.model, "requesting diagram");
        let body = self.request_body(description)?;
        let raw = self.post(body)?;
        debug!(bytes = raw.len(), "provider replied");

        let content = parse_reply(self.provider.wire(), &raw)?;
        extract_diagram(&content).ok_or_else(|| {
            StudioError::Provider("Reply did not contain a @startuml .. @enduml block".to_string())
        })
    }
}
