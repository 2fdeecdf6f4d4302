//! Condition assessment from photos.
//!
//! The grade is a closed enum; any other wording from the model fails
//! output validation rather than leaking into listings.

use serde::{Deserialize, Serialize};

use crate::backend::ModelBackend;
use crate::error::FlowError;
use crate::flow::{invoke_typed, FlowSpec};
use crate::registry;
use crate::schema::{FieldKind, FieldSpec, OutputShape, Schema};
use crate::template::PromptTemplate;

pub const NAME: &str = "assess_condition";

pub const CONDITION_GRADES: &[&str] = &["Like New", "Good", "Fair", "For Parts"];

const SYSTEM_PROMPT: &str = "You are the condition inspector for ReCycleConnect, a \
marketplace for used electronics. Grade the item from its photos. The grade must \
be exactly one of: \"Like New\", \"Good\", \"Fair\", \"For Parts\". Reply with JSON \
only, exactly {\"condition_grade\": \"...\", \"observations\": [\"...\"]} and nothing else.";

const TEMPLATE: &str = "Grade the condition of this used item. Photos:\n\
{{#each photos}}Image {{@index}}: {{this}}\n{{/each}}\
{{#if claimed_condition}}The seller claims: {{claimed_condition}}\n{{/if}}";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessConditionInput {
    /// Item photos as `data:image/...` URIs.
    pub photos: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub claimed_condition: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConditionGrade {
    #[serde(rename = "Like New")]
    LikeNew,
    Good,
    Fair,
    #[serde(rename = "For Parts")]
    ForParts,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessConditionOutput {
    pub condition_grade: ConditionGrade,
    pub observations: Vec<String>,
}

pub(crate) fn spec() -> FlowSpec {
    FlowSpec {
        name: NAME,
        description: "Grade an item's condition from its photos.",
        input_schema: Schema::new(vec![
            FieldSpec::new(
                "photos",
                FieldKind::Array(Box::new(FieldKind::ImageDataUri)),
                "item photos as image data URIs",
            ),
            FieldSpec::new(
                "claimed_condition",
                FieldKind::Optional(Box::new(FieldKind::Text)),
                "condition the seller claims",
            ),
        ]),
        output_shape: OutputShape::Object(Schema::new(vec![
            FieldSpec::new(
                "condition_grade",
                FieldKind::Enum(CONDITION_GRADES),
                "assessed condition grade",
            ),
            FieldSpec::new(
                "observations",
                FieldKind::Array(Box::new(FieldKind::Text)),
                "visible wear or damage noted",
            ),
        ])),
        system_prompt: SYSTEM_PROMPT,
        template: PromptTemplate::parse(TEMPLATE),
        tool: None,
    }
}

pub async fn assess_condition(
    backend: &dyn ModelBackend,
    input: &AssessConditionInput,
) -> Result<AssessConditionOutput, FlowError> {
    invoke_typed(&registry::registry().assess_condition, backend, input).await
}
