//! Caller-side adapters for the ReCycleConnect AI flows.
//!
//! This crate is the bridge between loosely-typed UI input (form
//! fields, uploads encoded as data URIs) and the typed flow contracts
//! in `recycle-flows`. Every action returns `ActionResponse` - data or
//! a displayable message - and never lets an error cross the boundary
//! raw.

pub mod actions;
pub mod image;
pub mod response;
pub mod translation_cache;

pub use actions::{
    assess_item_condition, check_device_compatibility, draft_message_reply,
    estimate_listing_price, generate_listing_description, suggest_listing_categories,
    suggest_listing_titles, suggest_pickup_locality, translate_ui_text,
};
pub use response::ActionResponse;
pub use translation_cache::TranslationCache;
