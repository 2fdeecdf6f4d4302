//! ReCycleConnect structured AI flow contract layer.
//!
//! Every AI helper in the marketplace is one *flow*: a named,
//! schema-typed request/response contract wrapping a single
//! generative-model call. A flow declares its input schema, its output
//! shape, a fixed system prompt and a user prompt template; invocation
//! validates the input, renders the prompt, calls the model backend
//! once, and validates the model's JSON against the output shape -
//! failing closed on anything malformed. The model is treated as an
//! untrusted input source, symmetric to user input.
//!
//! Flows are stateless and call-local: the registry is immutable after
//! startup and concurrent invocations need no coordination.

pub mod backend;
pub mod config;
pub mod error;
pub mod flow;
pub mod flows;
pub mod registry;
pub mod schema;
pub mod template;
pub mod tool;

pub use backend::{HttpModelClient, ModelBackend, ScriptedBackend};
pub use config::BackendConfig;
pub use error::{FlowError, SchemaViolation};
pub use flow::FlowSpec;
pub use registry::registry;
