//! Listing description generation.

use serde::{Deserialize, Serialize};

use crate::backend::ModelBackend;
use crate::error::FlowError;
use crate::flow::{invoke_typed, FlowSpec};
use crate::registry;
use crate::schema::{FieldKind, FieldSpec, OutputShape, Schema};
use crate::template::PromptTemplate;

pub const NAME: &str = "generate_description";

const SYSTEM_PROMPT: &str = "You are the listing assistant for ReCycleConnect, a \
marketplace for used electronics. Write an honest, buyer-friendly description. \
Never invent specifications the seller did not state. Reply with JSON only, exactly \
{\"description\": \"...\", \"highlights\": [\"...\"]} and nothing else.";

const TEMPLATE: &str = "Write a listing description.\n\
Title: {{title}}\n\
Category: {{category}}\n\
Condition: {{condition}}\n\
{{#if defects}}Known defects to disclose: {{defects}}\n{{/if}}";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateDescriptionInput {
    pub title: String,
    pub category: String,
    pub condition: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defects: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateDescriptionOutput {
    pub description: String,
    pub highlights: Vec<String>,
}

pub(crate) fn spec() -> FlowSpec {
    FlowSpec {
        name: NAME,
        description: "Write an honest listing description with highlights.",
        input_schema: Schema::new(vec![
            FieldSpec::new("title", FieldKind::Text, "listing title"),
            FieldSpec::new("category", FieldKind::Text, "marketplace category"),
            FieldSpec::new("condition", FieldKind::Text, "seller-stated condition"),
            FieldSpec::new(
                "defects",
                FieldKind::Optional(Box::new(FieldKind::Text)),
                "known defects to disclose",
            ),
        ]),
        output_shape: OutputShape::Object(Schema::new(vec![
            FieldSpec::new("description", FieldKind::Text, "buyer-facing description"),
            FieldSpec::new(
                "highlights",
                FieldKind::Array(Box::new(FieldKind::Text)),
                "short selling points",
            ),
        ])),
        system_prompt: SYSTEM_PROMPT,
        template: PromptTemplate::parse(TEMPLATE),
        tool: None,
    }
}

pub async fn generate_description(
    backend: &dyn ModelBackend,
    input: &GenerateDescriptionInput,
) -> Result<GenerateDescriptionOutput, FlowError> {
    invoke_typed(&registry::registry().generate_description, backend, input).await
}
