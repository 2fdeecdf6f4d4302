//! Device compatibility checking.
//!
//! One flow, two result shapes behind an explicit discriminant. The
//! caller states which shape it wants via `mode`; the model must echo
//! the matching `kind` or the call fails output validation. There is no
//! shape sniffing anywhere.

use serde::{Deserialize, Serialize};

use crate::backend::ModelBackend;
use crate::error::FlowError;
use crate::flow::{invoke_typed, FlowSpec};
use crate::registry;
use crate::schema::{FieldKind, FieldSpec, OutputShape, Schema};
use crate::template::PromptTemplate;

pub const NAME: &str = "check_compatibility";

pub const COMPATIBILITY_LEVELS: &[&str] = &["High", "Partial", "Incompatible"];

const SYSTEM_PROMPT: &str = "You are the compatibility assistant for ReCycleConnect, \
a marketplace for used electronics. Reply with JSON only. If the request mode is \
\"verdict\", reply exactly {\"kind\": \"verdict\", \"compatibility_level\": \"...\", \
\"explanation\": \"...\"} where compatibility_level is one of \"High\", \"Partial\", \
\"Incompatible\". If the request mode is \"device_list\", reply exactly \
{\"kind\": \"device_list\", \"compatible_devices\": [\"...\"], \"notes\": \"...\"}. \
Never mix the two shapes.";

const TEMPLATE: &str = "Request mode: {{mode}}\n\
Device: {{device}}\n\
{{#if accessory}}Accessory or second device: {{accessory}}\n{{/if}}\
Answer for the requested mode only.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompatibilityMode {
    /// Single verdict for a concrete device pair.
    Verdict,
    /// Broader list of devices compatible with the item.
    DeviceList,
}

impl CompatibilityMode {
    /// Discriminant value as it appears on the wire.
    pub fn wire_name(self) -> &'static str {
        match self {
            CompatibilityMode::Verdict => "verdict",
            CompatibilityMode::DeviceList => "device_list",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckCompatibilityInput {
    pub mode: CompatibilityMode,
    pub device: String,
    /// Required in practice for verdict mode; the prompt handles its
    /// absence in device-list mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accessory: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompatibilityLevel {
    High,
    Partial,
    Incompatible,
}

/// Tagged outcome; the discriminant is the `kind` field on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CompatibilityOutcome {
    Verdict {
        compatibility_level: CompatibilityLevel,
        explanation: String,
    },
    DeviceList {
        compatible_devices: Vec<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        notes: Option<String>,
    },
}

impl CompatibilityOutcome {
    fn kind(&self) -> &'static str {
        match self {
            CompatibilityOutcome::Verdict { .. } => "verdict",
            CompatibilityOutcome::DeviceList { .. } => "device_list",
        }
    }
}

pub(crate) fn spec() -> FlowSpec {
    FlowSpec {
        name: NAME,
        description: "Check device compatibility, as a verdict or a device list.",
        input_schema: Schema::new(vec![
            FieldSpec::new(
                "mode",
                FieldKind::Enum(&["verdict", "device_list"]),
                "which result shape the caller wants",
            ),
            FieldSpec::new("device", FieldKind::Text, "primary device"),
            FieldSpec::new(
                "accessory",
                FieldKind::Optional(Box::new(FieldKind::Text)),
                "accessory or second device to check against",
            ),
        ]),
        output_shape: OutputShape::Tagged {
            tag: "kind",
            variants: vec![
                (
                    "verdict",
                    Schema::new(vec![
                        FieldSpec::new(
                            "compatibility_level",
                            FieldKind::Enum(COMPATIBILITY_LEVELS),
                            "compatibility verdict",
                        ),
                        FieldSpec::new("explanation", FieldKind::Text, "short justification"),
                    ]),
                ),
                (
                    "device_list",
                    Schema::new(vec![
                        FieldSpec::new(
                            "compatible_devices",
                            FieldKind::Array(Box::new(FieldKind::Text)),
                            "devices compatible with the item",
                        ),
                        FieldSpec::new(
                            "notes",
                            FieldKind::Optional(Box::new(FieldKind::Text)),
                            "caveats worth mentioning",
                        ),
                    ]),
                ),
            ],
        },
        system_prompt: SYSTEM_PROMPT,
        template: PromptTemplate::parse(TEMPLATE),
        tool: None,
    }
}

pub async fn check_compatibility(
    backend: &dyn ModelBackend,
    input: &CheckCompatibilityInput,
) -> Result<CompatibilityOutcome, FlowError> {
    let outcome: CompatibilityOutcome =
        invoke_typed(&registry::registry().check_compatibility, backend, input).await?;
    // A well-formed answer in the shape the caller did not ask for is
    // still a contract violation.
    if outcome.kind() != input.mode.wire_name() {
        return Err(FlowError::MalformedOutput(format!(
            "model answered kind '{}' for mode '{}'",
            outcome.kind(),
            input.mode.wire_name()
        )));
    }
    Ok(outcome)
}
