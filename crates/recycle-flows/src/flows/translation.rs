//! Listing text translation.

use serde::{Deserialize, Serialize};

use crate::backend::ModelBackend;
use crate::error::FlowError;
use crate::flow::{invoke_typed, FlowSpec};
use crate::registry;
use crate::schema::{FieldKind, FieldSpec, OutputShape, Schema};
use crate::template::PromptTemplate;

pub const NAME: &str = "translate_text";

const SYSTEM_PROMPT: &str = "You are the translation assistant for ReCycleConnect, a \
marketplace for used electronics. Translate marketplace text naturally, keeping \
brand and model names untouched. Reply with JSON only, exactly \
{\"translated_text\": \"...\"} and nothing else.";

const TEMPLATE: &str = "Translate into {{target_locale}}\
{{#if source_locale}} (source language: {{source_locale}}){{/if}}:\n{{text}}";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslateTextInput {
    pub text: String,
    /// BCP 47 tag of the target language, e.g. "de" or "hi-IN".
    pub target_locale: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_locale: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslateTextOutput {
    pub translated_text: String,
}

pub(crate) fn spec() -> FlowSpec {
    FlowSpec {
        name: NAME,
        description: "Translate marketplace text into a target locale.",
        input_schema: Schema::new(vec![
            FieldSpec::new("text", FieldKind::Text, "text to translate"),
            FieldSpec::new("target_locale", FieldKind::Text, "target language tag"),
            FieldSpec::new(
                "source_locale",
                FieldKind::Optional(Box::new(FieldKind::Text)),
                "source language tag, if known",
            ),
        ]),
        output_shape: OutputShape::Object(Schema::new(vec![FieldSpec::new(
            "translated_text",
            FieldKind::Text,
            "translation of the input text",
        )])),
        system_prompt: SYSTEM_PROMPT,
        template: PromptTemplate::parse(TEMPLATE),
        tool: None,
    }
}

pub async fn translate_text(
    backend: &dyn ModelBackend,
    input: &TranslateTextInput,
) -> Result<TranslateTextOutput, FlowError> {
    invoke_typed(&registry::registry().translate_text, backend, input).await
}
