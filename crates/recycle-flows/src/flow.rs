//! Flow invocation: the single choke point every flow call passes
//! through.
//!
//! Per call the pipeline is linear, with no retries by design:
//! validate input -> render prompt -> await model -> (bounded tool
//! rounds) -> extract/parse JSON -> validate output. Input failure never
//! reaches the model; output failure discards the raw response. One
//! invocation means exactly one outbound call, plus at most
//! `MAX_TOOL_ROUNDS` extra round-trips when the model uses the
//! registered tool.

use std::time::Instant;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::backend::{ChatMessage, ChatRequest, ModelBackend, ToolDefinition};
use crate::error::FlowError;
use crate::schema::{OutputShape, Schema};
use crate::template::PromptTemplate;
use crate::tool::ToolSpec;

/// A looping model is cut off after this many tool rounds.
const MAX_TOOL_ROUNDS: usize = 4;

/// One named, schema-typed request/response contract wrapping a single
/// generative-model call. Constructed once at startup inside the
/// registry; immutable thereafter.
pub struct FlowSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: Schema,
    pub output_shape: OutputShape,
    /// Fixed task framing: role, domain, acceptable JSON keys and enum
    /// values. This is what makes output validation likely to succeed.
    pub system_prompt: &'static str,
    pub template: PromptTemplate,
    /// Callback the model may invoke mid-reasoning (locality flow only).
    pub tool: Option<ToolSpec>,
}

impl FlowSpec {
    /// Run one invocation against `backend`.
    pub async fn invoke(
        &self,
        backend: &dyn ModelBackend,
        input: &Value,
    ) -> Result<Value, FlowError> {
        // Validating-Input: fail here and the model is never called.
        let narrowed = self.input_schema.validate(input).map_err(|v| {
            debug!(flow = self.name, %v, "input rejected");
            FlowError::InvalidInput {
                field: v.field,
                reason: v.reason,
            }
        })?;
        let fields = narrowed.as_object().cloned().unwrap_or_default();

        // Rendering-Prompt: pure and total for validated input.
        let prompt = self.template.render(&fields);
        debug!(flow = self.name, "rendered prompt ({} chars)", prompt.len());

        let mut messages = vec![
            ChatMessage::system(self.system_prompt),
            ChatMessage::user(prompt),
        ];
        let tools: Vec<_> = self.tool.iter().map(|t| t.definition()).collect();

        let start = Instant::now();

        // Awaiting-Model: a single round-trip, plus bounded tool rounds.
        let mut response = backend
            .chat(self.request(backend, messages.clone(), &tools))
            .await?;

        let mut rounds = 0;
        while !response.message.tool_calls.is_empty() {
            rounds += 1;
            if rounds > MAX_TOOL_ROUNDS {
                return Err(FlowError::MalformedOutput(format!(
                    "model exceeded {} tool rounds",
                    MAX_TOOL_ROUNDS
                )));
            }
            let Some(tool) = &self.tool else {
                return Err(FlowError::MalformedOutput(
                    "model requested a tool but none is registered".to_string(),
                ));
            };

            messages.push(response.message.clone());
            for call in &response.message.tool_calls {
                if call.function.name != tool.name {
                    return Err(FlowError::MalformedOutput(format!(
                        "model requested unknown tool '{}'",
                        call.function.name
                    )));
                }
                let result = tool.call(&call.function.arguments).map_err(|v| {
                    FlowError::MalformedOutput(format!("tool arguments rejected: {}", v))
                })?;
                debug!(flow = self.name, tool = tool.name, "tool round {}", rounds);
                messages.push(ChatMessage::tool(result.to_string()));
            }

            response = backend
                .chat(self.request(backend, messages.clone(), &tools))
                .await?;
        }

        info!(
            flow = self.name,
            "model answered in {:.2}s",
            start.elapsed().as_secs_f64()
        );

        // Validating-Output: the model is an untrusted input source.
        let raw = &response.message.content;
        let json_text = extract_json(raw);
        let value: Value = serde_json::from_str(&json_text).map_err(|e| {
            warn!(flow = self.name, "unparseable model output: {} - raw: {}", e, raw);
            FlowError::MalformedOutput(format!("response is not JSON: {}", e))
        })?;
        self.output_shape.validate(&value).map_err(|v| {
            warn!(flow = self.name, "model output failed validation: {}", v);
            FlowError::MalformedOutput(v.to_string())
        })
    }

    fn request(
        &self,
        backend: &dyn ModelBackend,
        messages: Vec<ChatMessage>,
        tools: &[ToolDefinition],
    ) -> ChatRequest {
        ChatRequest {
            model: backend.model().to_string(),
            messages,
            stream: false,
            format: Some("json".to_string()),
            tools: tools.to_vec(),
        }
    }
}

/// Serialize a typed input, invoke, and decode the typed output.
pub async fn invoke_typed<I, O>(
    spec: &FlowSpec,
    backend: &dyn ModelBackend,
    input: &I,
) -> Result<O, FlowError>
where
    I: Serialize,
    O: DeserializeOwned,
{
    let value = serde_json::to_value(input).map_err(|e| FlowError::InvalidInput {
        field: "$".to_string(),
        reason: e.to_string(),
    })?;
    let output = spec.invoke(backend, &value).await?;
    serde_json::from_value(output)
        .map_err(|e| FlowError::MalformedOutput(format!("undecodable validated output: {}", e)))
}

/// Extract the JSON body from a response that may wrap it in prose.
fn extract_json(text: &str) -> String {
    if let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) {
        if start < end {
            return text[start..=end].to_string();
        }
    }
    text.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{ScriptedBackend, ToolCall, ToolCallFunction};
    use crate::schema::{FieldKind, FieldSpec};
    use crate::tool::locality_tool;
    use serde_json::json;

    fn echo_flow() -> FlowSpec {
        FlowSpec {
            name: "echo",
            description: "test flow",
            input_schema: Schema::new(vec![FieldSpec::new("text", FieldKind::Text, "text")]),
            output_shape: OutputShape::Object(Schema::new(vec![FieldSpec::new(
                "reply",
                FieldKind::Text,
                "reply",
            )])),
            system_prompt: "You echo.",
            template: PromptTemplate::parse("Echo: {{text}}"),
            tool: None,
        }
    }

    #[tokio::test]
    async fn test_invalid_input_never_reaches_model() {
        let backend = ScriptedBackend::with_json_responses(&[r#"{"reply":"hi"}"#]);
        let result = echo_flow().invoke(&backend, &json!({ "text": 7 })).await;
        assert!(matches!(result, Err(FlowError::InvalidInput { .. })));
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn test_prose_wrapped_json_is_extracted() {
        let backend = ScriptedBackend::with_json_responses(&[
            "Sure! Here is the answer: {\"reply\": \"hello\"} Hope that helps.",
        ]);
        let result = echo_flow()
            .invoke(&backend, &json!({ "text": "hi" }))
            .await
            .unwrap();
        assert_eq!(result["reply"], "hello");
    }

    #[tokio::test]
    async fn test_non_json_output_is_malformed() {
        let backend = ScriptedBackend::with_json_responses(&["I cannot answer that."]);
        let result = echo_flow().invoke(&backend, &json!({ "text": "hi" })).await;
        assert!(matches!(result, Err(FlowError::MalformedOutput(_))));
    }

    #[tokio::test]
    async fn test_prompt_contains_interpolated_input() {
        let backend = ScriptedBackend::with_json_responses(&[r#"{"reply":"ok"}"#]);
        echo_flow()
            .invoke(&backend, &json!({ "text": "ThinkPad" }))
            .await
            .unwrap();
        let requests = backend.requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].messages[1].content.contains("ThinkPad"));
        assert_eq!(requests[0].format.as_deref(), Some("json"));
    }

    fn tool_flow() -> FlowSpec {
        FlowSpec {
            name: "locality_test",
            description: "test tool flow",
            input_schema: Schema::new(vec![
                FieldSpec::new("latitude", FieldKind::Number, "lat"),
                FieldSpec::new("longitude", FieldKind::Number, "lon"),
            ]),
            output_shape: OutputShape::Object(Schema::new(vec![FieldSpec::new(
                "locality",
                FieldKind::Text,
                "locality",
            )])),
            system_prompt: "Resolve localities.",
            template: PromptTemplate::parse("At {{latitude}}, {{longitude}}."),
            tool: Some(locality_tool()),
        }
    }

    fn tool_call_message(lat: f64, lon: f64) -> ChatMessage {
        ChatMessage {
            role: "assistant".to_string(),
            content: String::new(),
            tool_calls: vec![ToolCall {
                function: ToolCallFunction {
                    name: "lookup_locality".to_string(),
                    arguments: json!({ "latitude": lat, "longitude": lon }),
                },
            }],
        }
    }

    #[tokio::test]
    async fn test_tool_round_trip() {
        let backend = ScriptedBackend::with_messages(vec![
            tool_call_message(18.58, 73.80),
            ChatMessage {
                role: "assistant".to_string(),
                content: r#"{"locality": "Hinjawadi"}"#.to_string(),
                tool_calls: Vec::new(),
            },
        ]);

        let result = tool_flow()
            .invoke(&backend, &json!({ "latitude": 18.58, "longitude": 73.80 }))
            .await
            .unwrap();
        assert_eq!(result["locality"], "Hinjawadi");
        assert_eq!(backend.calls(), 2);

        // The second request must carry the tool result back to the model.
        let requests = backend.requests();
        let tool_message = requests[1]
            .messages
            .iter()
            .find(|m| m.role == "tool")
            .cloned();
        assert!(tool_message.is_some_and(|m| m.content.contains("Hinjawadi")));
    }

    #[tokio::test]
    async fn test_looping_model_is_cut_off() {
        let messages: Vec<_> = (0..6).map(|_| tool_call_message(18.58, 73.80)).collect();
        let backend = ScriptedBackend::with_messages(messages);
        let result = tool_flow()
            .invoke(&backend, &json!({ "latitude": 18.58, "longitude": 73.80 }))
            .await;
        assert!(matches!(result, Err(FlowError::MalformedOutput(_))));
        assert_eq!(backend.calls(), 1 + MAX_TOOL_ROUNDS);
    }

    #[tokio::test]
    async fn test_unknown_tool_name_is_malformed() {
        let backend = ScriptedBackend::with_messages(vec![ChatMessage {
            role: "assistant".to_string(),
            content: String::new(),
            tool_calls: vec![ToolCall {
                function: ToolCallFunction {
                    name: "delete_everything".to_string(),
                    arguments: json!({}),
                },
            }],
        }]);
        let result = tool_flow()
            .invoke(&backend, &json!({ "latitude": 18.58, "longitude": 73.80 }))
            .await;
        assert!(matches!(result, Err(FlowError::MalformedOutput(_))));
    }
}
