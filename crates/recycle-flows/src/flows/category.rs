//! Category suggestion from listing photos.

use serde::{Deserialize, Serialize};

use crate::backend::ModelBackend;
use crate::error::FlowError;
use crate::flow::{invoke_typed, FlowSpec};
use crate::registry;
use crate::schema::{FieldKind, FieldSpec, OutputShape, Schema};
use crate::template::PromptTemplate;

pub const NAME: &str = "suggest_category";

const SYSTEM_PROMPT: &str = "You are the categorisation assistant for ReCycleConnect, \
a marketplace for used electronics. Look at the item photos and suggest fitting \
marketplace categories, from broad to specific. Reply with JSON only, exactly \
{\"categories\": [\"...\"]}, listing at least 3 category names and nothing else.";

const TEMPLATE: &str = "A seller is listing a used electronics item. Photos:\n\
{{#each photos}}Image {{@index}}: {{this}}\n{{/each}}\
{{#if notes}}Seller notes: {{notes}}\n{{/if}}\
Suggest the categories this item belongs in.";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestCategoryInput {
    /// Item photos as `data:image/...` URIs.
    pub photos: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestCategoryOutput {
    pub categories: Vec<String>,
}

pub(crate) fn spec() -> FlowSpec {
    FlowSpec {
        name: NAME,
        description: "Suggest marketplace categories for an item from its photos.",
        input_schema: Schema::new(vec![
            FieldSpec::new(
                "photos",
                FieldKind::Array(Box::new(FieldKind::ImageDataUri)),
                "item photos as image data URIs",
            ),
            FieldSpec::new(
                "notes",
                FieldKind::Optional(Box::new(FieldKind::Text)),
                "free-form seller notes",
            ),
        ]),
        output_shape: OutputShape::Object(Schema::new(vec![FieldSpec::new(
            "categories",
            FieldKind::Array(Box::new(FieldKind::Text)),
            "suggested category names, broad to specific",
        )])),
        system_prompt: SYSTEM_PROMPT,
        template: PromptTemplate::parse(TEMPLATE),
        tool: None,
    }
}

pub async fn suggest_category(
    backend: &dyn ModelBackend,
    input: &SuggestCategoryInput,
) -> Result<SuggestCategoryOutput, FlowError> {
    invoke_typed(&registry::registry().suggest_category, backend, input).await
}
