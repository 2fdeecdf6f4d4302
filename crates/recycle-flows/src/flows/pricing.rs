//! Price valuation for a used item.

use serde::{Deserialize, Serialize};

use crate::backend::ModelBackend;
use crate::error::FlowError;
use crate::flow::{invoke_typed, FlowSpec};
use crate::registry;
use crate::schema::{FieldKind, FieldSpec, OutputShape, Schema};
use crate::template::PromptTemplate;

pub const NAME: &str = "estimate_price";

const SYSTEM_PROMPT: &str = "You are the pricing assistant for ReCycleConnect, a \
marketplace for used electronics. Estimate a fair second-hand price in EUR. Reply \
with JSON only, exactly {\"suggested_price\": number, \"price_floor\": number, \
\"price_ceiling\": number, \"reasoning\": \"...\"} and nothing else.";

const TEMPLATE: &str = "Estimate a fair price for this used item.\n\
Category: {{category}}\n\
Condition: {{condition}}\n\
Age in months: {{age_months}}\n\
{{#if original_price}}Original purchase price: {{original_price}} EUR\n{{/if}}";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstimatePriceInput {
    pub category: String,
    pub condition: String,
    pub age_months: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_price: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimatePriceOutput {
    pub suggested_price: f64,
    pub price_floor: f64,
    pub price_ceiling: f64,
    pub reasoning: String,
}

pub(crate) fn spec() -> FlowSpec {
    FlowSpec {
        name: NAME,
        description: "Estimate a fair second-hand price for an item.",
        input_schema: Schema::new(vec![
            FieldSpec::new("category", FieldKind::Text, "marketplace category"),
            FieldSpec::new("condition", FieldKind::Text, "seller-stated condition"),
            FieldSpec::new("age_months", FieldKind::Number, "item age in months"),
            FieldSpec::new(
                "original_price",
                FieldKind::Optional(Box::new(FieldKind::Number)),
                "original purchase price in EUR",
            ),
        ]),
        output_shape: OutputShape::Object(Schema::new(vec![
            FieldSpec::new("suggested_price", FieldKind::Number, "recommended asking price"),
            FieldSpec::new("price_floor", FieldKind::Number, "lowest reasonable price"),
            FieldSpec::new("price_ceiling", FieldKind::Number, "highest reasonable price"),
            FieldSpec::new("reasoning", FieldKind::Text, "short justification"),
        ])),
        system_prompt: SYSTEM_PROMPT,
        template: PromptTemplate::parse(TEMPLATE),
        tool: None,
    }
}

pub async fn estimate_price(
    backend: &dyn ModelBackend,
    input: &EstimatePriceInput,
) -> Result<EstimatePriceOutput, FlowError> {
    invoke_typed(&registry::registry().estimate_price, backend, input).await
}
