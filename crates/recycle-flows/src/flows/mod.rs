//! The flow definitions: one module per contract.
//!
//! Each module declares the serde-typed input/output structs, the fixed
//! system prompt and user template, and a typed async entry point that
//! goes through the registry's immutable `FlowSpec`.

pub mod category;
pub mod compatibility;
pub mod condition;
pub mod description;
pub mod locality;
pub mod pricing;
pub mod reply;
pub mod title;
pub mod translation;
