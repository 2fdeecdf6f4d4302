//! Pickup locality suggestion.
//!
//! The one tool-using flow: the model may call `lookup_locality` with
//! coordinates before giving its final answer. Each callback round is
//! validated against the tool's own schemas in `flow::invoke`.

use serde::{Deserialize, Serialize};

use crate::backend::ModelBackend;
use crate::error::FlowError;
use crate::flow::{invoke_typed, FlowSpec};
use crate::registry;
use crate::schema::{FieldKind, FieldSpec, OutputShape, Schema};
use crate::template::PromptTemplate;
use crate::tool::locality_tool;

pub const NAME: &str = "suggest_locality";

pub const CONFIDENCE_LEVELS: &[&str] = &["high", "medium", "low"];

const SYSTEM_PROMPT: &str = "You are the pickup-location assistant for ReCycleConnect, \
a marketplace for used electronics. Resolve where the seller offers pickup. Use the \
lookup_locality tool with the given coordinates to ground your answer. Reply with \
JSON only, exactly {\"locality\": \"...\", \"city\": \"...\", \"confidence\": \"...\"} \
where confidence is one of \"high\", \"medium\", \"low\", and nothing else.";

const TEMPLATE: &str = "The seller wrote this pickup hint: {{hint}}\n\
Listing coordinates: latitude {{latitude}}, longitude {{longitude}}.\n\
Name the pickup locality and city.";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestLocalityInput {
    /// Free-text pickup hint from the listing form.
    pub hint: String,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestLocalityOutput {
    pub locality: String,
    pub city: String,
    pub confidence: Confidence,
}

pub(crate) fn spec() -> FlowSpec {
    FlowSpec {
        name: NAME,
        description: "Resolve a listing's pickup locality, tool-grounded.",
        input_schema: Schema::new(vec![
            FieldSpec::new("hint", FieldKind::Text, "seller's pickup hint"),
            FieldSpec::new("latitude", FieldKind::Number, "listing latitude"),
            FieldSpec::new("longitude", FieldKind::Number, "listing longitude"),
        ]),
        output_shape: OutputShape::Object(Schema::new(vec![
            FieldSpec::new("locality", FieldKind::Text, "resolved locality"),
            FieldSpec::new("city", FieldKind::Text, "resolved city"),
            FieldSpec::new(
                "confidence",
                FieldKind::Enum(CONFIDENCE_LEVELS),
                "how sure the resolution is",
            ),
        ])),
        system_prompt: SYSTEM_PROMPT,
        template: PromptTemplate::parse(TEMPLATE),
        tool: Some(locality_tool()),
    }
}

pub async fn suggest_locality(
    backend: &dyn ModelBackend,
    input: &SuggestLocalityInput,
) -> Result<SuggestLocalityOutput, FlowError> {
    invoke_typed(&registry::registry().suggest_locality, backend, input).await
}
