//! Model backend: the single downstream interface of the flow layer.
//!
//! The wire protocol is an Ollama-style `/api/chat` exchange with
//! `format: "json"`, extended with the standard `tools` / `tool_calls`
//! fields for the one tool-using flow. Image inputs travel as data URIs
//! embedded by reference inside the rendered prompt, not as attachments.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info};

use crate::config::BackendConfig;
use crate::error::FlowError;

/// A single message in the chat exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    #[serde(default)]
    pub content: String,
    /// Tool invocations the model requested mid-reasoning, if any.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
            tool_calls: Vec::new(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
            tool_calls: Vec::new(),
        }
    }

    pub fn tool(content: impl Into<String>) -> Self {
        Self {
            role: "tool".to_string(),
            content: content.into(),
            tool_calls: Vec::new(),
        }
    }
}

/// A tool invocation issued by the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    pub function: ToolCallFunction,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallFunction {
    pub name: String,
    #[serde(default)]
    pub arguments: Value,
}

/// Declaration of a callable tool, sent with the request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    #[serde(rename = "type")]
    pub kind: String,
    pub function: ToolFunction,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolFunction {
    pub name: String,
    pub description: String,
    /// JSON-schema style description of the tool's parameters.
    pub parameters: Value,
}

/// Chat request sent to the model backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDefinition>,
}

/// Chat response from the model backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub model: String,
    pub message: ChatMessage,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub total_duration: Option<u64>,
}

/// The downstream seam every flow call passes through. Swappable so
/// tests and adapters can run without a live model.
#[async_trait]
pub trait ModelBackend: Send + Sync {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, FlowError>;

    /// Model name requests should carry.
    fn model(&self) -> &str;
}

/// HTTP client for an Ollama-compatible chat endpoint.
pub struct HttpModelClient {
    http_client: reqwest::Client,
    config: BackendConfig,
}

impl HttpModelClient {
    pub fn new(config: BackendConfig) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|e| {
                error!("[-]  http client builder failed, timeout not applied: {}", e);
                reqwest::Client::new()
            });
        Self {
            http_client,
            config,
        }
    }

    /// Check whether the backend answers at all.
    pub async fn is_available(&self) -> bool {
        let url = format!("{}/api/tags", self.config.base_url);
        self.http_client.get(&url).send().await.is_ok()
    }
}

#[async_trait]
impl ModelBackend for HttpModelClient {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, FlowError> {
        let url = format!("{}/api/chat", self.config.base_url);

        info!(
            "[>]  model call [{}] ({} messages, {} tools)",
            request.model,
            request.messages.len(),
            request.tools.len()
        );

        let mut builder = self.http_client.post(&url).json(&request);
        if let Some(key) = self.config.api_key() {
            builder = builder.bearer_auth(key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| FlowError::ModelUnavailable(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            error!("[-]  model backend error {}: {}", status, text);
            return Err(FlowError::ModelUnavailable(format!(
                "backend returned {}: {}",
                status, text
            )));
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| FlowError::ModelUnavailable(format!("undecodable response: {}", e)))?;

        info!(
            "[<]  model response ({} chars, {} tool calls)",
            chat_response.message.content.len(),
            chat_response.message.tool_calls.len()
        );

        Ok(chat_response)
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}

/// In-process backend that replays canned responses, for tests and for
/// running adapters without a live model. Counts calls so tests can
/// assert the model was (or was not) reached.
pub struct ScriptedBackend {
    responses: Mutex<VecDeque<ChatMessage>>,
    requests: Mutex<Vec<ChatRequest>>,
    calls: AtomicUsize,
}

impl ScriptedBackend {
    /// Backend that answers each call with the next JSON body.
    pub fn with_json_responses(bodies: &[&str]) -> Self {
        let responses = bodies
            .iter()
            .map(|body| ChatMessage {
                role: "assistant".to_string(),
                content: (*body).to_string(),
                tool_calls: Vec::new(),
            })
            .collect();
        Self {
            responses: Mutex::new(responses),
            requests: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Backend that replays full assistant messages (tool calls included).
    pub fn with_messages(messages: Vec<ChatMessage>) -> Self {
        Self {
            responses: Mutex::new(messages.into()),
            requests: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of chat calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Copy of every request received, in order.
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests
            .lock()
            .map(|reqs| reqs.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ModelBackend for ScriptedBackend {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, FlowError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut reqs) = self.requests.lock() {
            reqs.push(request.clone());
        }
        let message = self
            .responses
            .lock()
            .ok()
            .and_then(|mut queue| queue.pop_front())
            .ok_or_else(|| FlowError::ModelUnavailable("script exhausted".to_string()))?;
        Ok(ChatResponse {
            model: request.model,
            message,
            done: true,
            total_duration: None,
        })
    }

    fn model(&self) -> &str {
        "scripted"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_backend_replays_in_order() {
        let backend = ScriptedBackend::with_json_responses(&[r#"{"a":1}"#, r#"{"b":2}"#]);
        let request = ChatRequest {
            model: "scripted".to_string(),
            messages: vec![ChatMessage::user("hi")],
            stream: false,
            format: Some("json".to_string()),
            tools: Vec::new(),
        };

        let first = backend.chat(request.clone()).await.unwrap();
        assert_eq!(first.message.content, r#"{"a":1}"#);
        let second = backend.chat(request.clone()).await.unwrap();
        assert_eq!(second.message.content, r#"{"b":2}"#);
        assert_eq!(backend.calls(), 2);

        let exhausted = backend.chat(request).await;
        assert!(matches!(exhausted, Err(FlowError::ModelUnavailable(_))));
    }

    #[test]
    fn test_http_client_builds_with_configured_timeout() {
        let config = BackendConfig::local("http://127.0.0.1:11434", "qwen3:8b")
            .with_timeout_secs(5);
        let client = HttpModelClient::new(config);
        assert_eq!(client.model(), "qwen3:8b");
    }

    #[test]
    fn test_chat_request_omits_empty_optionals() {
        let request = ChatRequest {
            model: "m".to_string(),
            messages: vec![ChatMessage::user("q")],
            stream: false,
            format: None,
            tools: Vec::new(),
        };
        let wire = serde_json::to_string(&request).unwrap();
        assert!(!wire.contains("format"));
        assert!(!wire.contains("tools"));
    }

    #[test]
    fn test_chat_response_with_tool_calls_decodes() {
        let raw = r#"{
            "model": "m",
            "message": {
                "role": "assistant",
                "content": "",
                "tool_calls": [
                    {"function": {"name": "lookup_locality", "arguments": {"latitude": 18.58, "longitude": 73.8}}}
                ]
            },
            "done": true
        }"#;
        let response: ChatResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(response.message.tool_calls.len(), 1);
        assert_eq!(response.message.tool_calls[0].function.name, "lookup_locality");
    }
}
