//! Reply drafting for the messaging workflow.

use serde::{Deserialize, Serialize};

use crate::backend::ModelBackend;
use crate::error::FlowError;
use crate::flow::{invoke_typed, FlowSpec};
use crate::registry;
use crate::schema::{FieldKind, FieldSpec, OutputShape, Schema};
use crate::template::PromptTemplate;

pub const NAME: &str = "draft_reply";

pub const REPLY_INTENTS: &[&str] = &["accept", "decline", "negotiate", "request_details"];

const SYSTEM_PROMPT: &str = "You are the messaging assistant for ReCycleConnect, a \
marketplace for used electronics. Draft a short, polite reply from the seller that \
matches the stated intent. Do not commit to anything beyond the intent. Reply with \
JSON only, exactly {\"reply\": \"...\"} and nothing else.";

const TEMPLATE: &str = "Listing: {{listing_title}}\n\
Buyer wrote: {{buyer_message}}\n\
The seller wants to: {{intent}}\n\
Draft the seller's reply.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyIntent {
    Accept,
    Decline,
    Negotiate,
    RequestDetails,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftReplyInput {
    pub listing_title: String,
    pub buyer_message: String,
    pub intent: ReplyIntent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftReplyOutput {
    pub reply: String,
}

pub(crate) fn spec() -> FlowSpec {
    FlowSpec {
        name: NAME,
        description: "Draft a seller reply for an exchange-request message.",
        input_schema: Schema::new(vec![
            FieldSpec::new("listing_title", FieldKind::Text, "listing the message is about"),
            FieldSpec::new("buyer_message", FieldKind::Text, "incoming buyer message"),
            FieldSpec::new(
                "intent",
                FieldKind::Enum(REPLY_INTENTS),
                "what the seller wants the reply to do",
            ),
        ]),
        output_shape: OutputShape::Object(Schema::new(vec![FieldSpec::new(
            "reply",
            FieldKind::Text,
            "drafted seller reply",
        )])),
        system_prompt: SYSTEM_PROMPT,
        template: PromptTemplate::parse(TEMPLATE),
        tool: None,
    }
}

pub async fn draft_reply(
    backend: &dyn ModelBackend,
    input: &DraftReplyInput,
) -> Result<DraftReplyOutput, FlowError> {
    invoke_typed(&registry::registry().draft_reply, backend, input).await
}
