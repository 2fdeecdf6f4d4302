//! Listing title suggestions.

use serde::{Deserialize, Serialize};

use crate::backend::ModelBackend;
use crate::error::FlowError;
use crate::flow::{invoke_typed, FlowSpec};
use crate::registry;
use crate::schema::{FieldKind, FieldSpec, OutputShape, Schema};
use crate::template::PromptTemplate;

pub const NAME: &str = "suggest_title";

const SYSTEM_PROMPT: &str = "You are the listing assistant for ReCycleConnect, a \
marketplace for used electronics. Suggest short, searchable listing titles. Reply \
with JSON only, exactly {\"titles\": [\"...\"]}, listing 3 candidates and nothing else.";

const TEMPLATE: &str = "Suggest listing titles for a used item.\n\
Category: {{category}}\n\
Brand: {{brand}}\n\
Model: {{model}}\n\
Condition: {{condition}}\n";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestTitleInput {
    pub category: String,
    pub brand: String,
    pub model: String,
    pub condition: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestTitleOutput {
    pub titles: Vec<String>,
}

pub(crate) fn spec() -> FlowSpec {
    FlowSpec {
        name: NAME,
        description: "Suggest searchable listing titles.",
        input_schema: Schema::new(vec![
            FieldSpec::new("category", FieldKind::Text, "marketplace category"),
            FieldSpec::new("brand", FieldKind::Text, "item brand"),
            FieldSpec::new("model", FieldKind::Text, "item model"),
            FieldSpec::new("condition", FieldKind::Text, "seller-stated condition"),
        ]),
        output_shape: OutputShape::Object(Schema::new(vec![FieldSpec::new(
            "titles",
            FieldKind::Array(Box::new(FieldKind::Text)),
            "candidate listing titles",
        )])),
        system_prompt: SYSTEM_PROMPT,
        template: PromptTemplate::parse(TEMPLATE),
        tool: None,
    }
}

pub async fn suggest_title(
    backend: &dyn ModelBackend,
    input: &SuggestTitleInput,
) -> Result<SuggestTitleOutput, FlowError> {
    invoke_typed(&registry::registry().suggest_title, backend, input).await
}
