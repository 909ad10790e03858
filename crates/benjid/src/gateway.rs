//! LLM gateway - the single seam to the hosted model.
//!
//! `LlmGateway` is the trait the orchestrator and generators talk to: an
//! ordered [system, user, ...] message list in, raw completion text out.
//! Production uses `GeminiClient` (reqwest, bounded timeout, bounded retry
//! for transport failures only). Tests use `FakeGateway` with queued
//! responses so orchestration flows run without any network.
//!
//! Gateway errors are the one failure class that propagates uncaught: the
//! HTTP layer maps them to 503, generators catch them at their own boundary
//! and degrade to their documented fallback shapes.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

/// Message role in a completion request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One message in the ordered completion request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }
}

/// Failures from the hosted model. Fatal to the request that triggered them;
/// never silently swallowed at this layer.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("LLM API key not set (expected in env var {0})")]
    MissingApiKey(String),
    #[error("LLM transport failure: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("LLM gateway returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("LLM gateway response contained no text")]
    EmptyCompletion,
    #[error("fake gateway: {0}")]
    Scripted(String),
}

/// Black-box text-completion function over the hosted model.
#[async_trait]
pub trait LlmGateway: Send + Sync {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, GatewayError>;
}

// ============================================================================
// Gemini client (production)
// ============================================================================

#[derive(Debug, Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    contents: Vec<GeminiContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponsePart {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct GeminiResponseContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiResponseContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

/// Client for the Gemini generateContent API.
pub struct GeminiClient {
    http_client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
    api_key_env: String,
    max_retries: u32,
}

impl GeminiClient {
    pub fn new(config: &crate::config::BenjiConfig) -> Self {
        Self {
            http_client: reqwest::Client::builder()
                .timeout(Duration::from_secs(config.llm.request_timeout_secs))
                .build()
                .unwrap_or_default(),
            base_url: config.llm.base_url.clone(),
            model: config.llm.model.clone(),
            api_key: config.api_key(),
            api_key_env: config.llm.api_key_env.clone(),
            max_retries: config.llm.max_retries,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Map the ordered message list onto the Gemini wire shape: system
    /// messages are concatenated into `systemInstruction`, assistant turns
    /// become role "model".
    fn build_request(&self, messages: &[ChatMessage]) -> GeminiRequest {
        let system_text: Vec<&str> = messages
            .iter()
            .filter(|m| m.role == Role::System)
            .map(|m| m.content.as_str())
            .collect();
        let system_instruction = if system_text.is_empty() {
            None
        } else {
            Some(GeminiContent {
                role: None,
                parts: vec![GeminiPart { text: system_text.join("\n\n") }],
            })
        };

        let contents = messages
            .iter()
            .filter(|m| m.role != Role::System)
            .map(|m| GeminiContent {
                role: Some(
                    match m.role {
                        Role::Assistant => "model",
                        _ => "user",
                    }
                    .to_string(),
                ),
                parts: vec![GeminiPart { text: m.content.clone() }],
            })
            .collect();

        GeminiRequest { system_instruction, contents }
    }

    async fn send_once(&self, request: &GeminiRequest, api_key: &str) -> Result<String, GatewayError> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, api_key
        );

        let response = self.http_client.post(&url).json(request).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Status { status, body });
        }

        let parsed: GeminiResponse = response.json().await?;
        let text = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| {
                c.parts
                    .into_iter()
                    .map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("\n")
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(GatewayError::EmptyCompletion);
        }
        Ok(text)
    }
}

#[async_trait]
impl LlmGateway for GeminiClient {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, GatewayError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| GatewayError::MissingApiKey(self.api_key_env.clone()))?;

        let request = self.build_request(messages);
        let total_chars: usize = messages.iter().map(|m| m.content.len()).sum();
        info!("[>] LLM call [{}] ({} chars across {} messages)", self.model, total_chars, messages.len());

        let mut attempt = 0;
        loop {
            match self.send_once(&request, api_key).await {
                Ok(text) => {
                    info!("[<] LLM response ({} chars)", text.len());
                    return Ok(text);
                }
                // Transient transport failures get a bounded retry with
                // linear backoff; HTTP error statuses do not.
                Err(GatewayError::Transport(e))
                    if attempt < self.max_retries && (e.is_timeout() || e.is_connect()) =>
                {
                    attempt += 1;
                    warn!("[~] LLM transport failure (attempt {}/{}): {}", attempt, self.max_retries, e);
                    tokio::time::sleep(Duration::from_millis(500 * attempt as u64)).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

// ============================================================================
// Fake gateway (testing)
// ============================================================================

/// Scripted gateway for deterministic tests. Responses are consumed in FIFO
/// order; once the queue is empty the default response is returned. Every
/// request's messages are recorded for assertions.
pub struct FakeGateway {
    responses: Mutex<VecDeque<Result<String, String>>>,
    requests: Mutex<Vec<Vec<ChatMessage>>>,
    default_response: String,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            default_response: "OK".to_string(),
        }
    }

    /// Single canned response used for every call.
    pub fn always(response: impl Into<String>) -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            default_response: response.into(),
        }
    }

    /// Queue one response to be consumed by the next call.
    pub fn push_response(&self, response: impl Into<String>) {
        self.responses.lock().unwrap().push_back(Ok(response.into()));
    }

    /// Queue one gateway failure.
    pub fn push_error(&self, message: impl Into<String>) {
        self.responses.lock().unwrap().push_back(Err(message.into()));
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Full user-role text of request `idx`, for prompt assertions.
    pub fn user_text(&self, idx: usize) -> Option<String> {
        self.requests.lock().unwrap().get(idx).map(|messages| {
            messages
                .iter()
                .filter(|m| m.role == Role::User)
                .map(|m| m.content.clone())
                .collect::<Vec<_>>()
                .join("\n")
        })
    }
}

impl Default for FakeGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LlmGateway for FakeGateway {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, GatewayError> {
        self.requests.lock().unwrap().push(messages.to_vec());
        match self.responses.lock().unwrap().pop_front() {
            Some(Ok(text)) => Ok(text),
            Some(Err(message)) => Err(GatewayError::Scripted(message)),
            None => Ok(self.default_response.clone()),
        }
    }
}
