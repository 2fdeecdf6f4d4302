//! Server-side action functions.
//!
//! Each action accepts loosely-typed form/UI values, applies its
//! domain pre-rules, delegates to a flow, and maps the result into an
//! `ActionResponse`. Failures of every kind become one displayable
//! message; nothing panics or propagates across this boundary.

use recycle_flows::backend::ModelBackend;
use recycle_flows::error::FlowError;
use recycle_flows::flows::category::{suggest_category, SuggestCategoryInput};
use recycle_flows::flows::compatibility::{
    check_compatibility, CheckCompatibilityInput, CompatibilityMode, CompatibilityOutcome,
};
use recycle_flows::flows::condition::{assess_condition, AssessConditionInput, AssessConditionOutput};
use recycle_flows::flows::description::{
    generate_description, GenerateDescriptionInput, GenerateDescriptionOutput,
};
use recycle_flows::flows::locality::{suggest_locality, SuggestLocalityInput, SuggestLocalityOutput};
use recycle_flows::flows::pricing::{estimate_price, EstimatePriceInput, EstimatePriceOutput};
use recycle_flows::flows::reply::{draft_reply, DraftReplyInput, ReplyIntent};
use recycle_flows::flows::title::{suggest_title, SuggestTitleInput};
use recycle_flows::flows::translation::{translate_text, TranslateTextInput};
use tracing::warn;

use crate::image::{is_image_data_uri, INVALID_IMAGE_ERROR};
use crate::response::ActionResponse;
use crate::translation_cache::TranslationCache;

/// Inputs of at most this many words get the UI-label disambiguation.
const SHORT_TEXT_WORD_LIMIT: usize = 2;

fn flow_error<T>(action: &str, err: FlowError) -> ActionResponse<T> {
    warn!("[{}] flow failed: {}", action, err);
    ActionResponse::err(err.user_message())
}

fn validate_photos(photos: &[String]) -> Option<String> {
    if photos.is_empty() {
        return Some("Please add at least one photo.".to_string());
    }
    if photos.iter().any(|p| !is_image_data_uri(p)) {
        return Some(INVALID_IMAGE_ERROR.to_string());
    }
    None
}

/// Suggest categories for a new listing from its uploaded photos.
pub async fn suggest_listing_categories(
    backend: &dyn ModelBackend,
    photos: &[String],
    notes: Option<&str>,
) -> ActionResponse<Vec<String>> {
    if let Some(message) = validate_photos(photos) {
        return ActionResponse::err(message);
    }
    let input = SuggestCategoryInput {
        photos: photos.to_vec(),
        notes: notes.map(str::to_string),
    };
    match suggest_category(backend, &input).await {
        Ok(output) => ActionResponse::ok(output.categories),
        Err(err) => flow_error("suggest_listing_categories", err),
    }
}

/// Estimate a fair price from the listing form fields.
pub async fn estimate_listing_price(
    backend: &dyn ModelBackend,
    category: &str,
    condition: &str,
    age_months: &str,
    original_price: Option<&str>,
) -> ActionResponse<EstimatePriceOutput> {
    let Ok(age) = age_months.trim().parse::<f64>() else {
        return ActionResponse::err("Please enter the item's age in months as a number.");
    };
    let original = match original_price.map(|p| p.trim().parse::<f64>()) {
        None => None,
        Some(Ok(value)) => Some(value),
        Some(Err(_)) => {
            return ActionResponse::err("Please enter the original price as a number.");
        }
    };
    let input = EstimatePriceInput {
        category: category.to_string(),
        condition: condition.to_string(),
        age_months: age,
        original_price: original,
    };
    match estimate_price(backend, &input).await {
        Ok(output) => ActionResponse::ok(output),
        Err(err) => flow_error("estimate_listing_price", err),
    }
}

/// Generate a listing description from the form fields.
pub async fn generate_listing_description(
    backend: &dyn ModelBackend,
    title: &str,
    category: &str,
    condition: &str,
    defects: Option<&str>,
) -> ActionResponse<GenerateDescriptionOutput> {
    let input = GenerateDescriptionInput {
        title: title.to_string(),
        category: category.to_string(),
        condition: condition.to_string(),
        defects: defects.map(str::to_string),
    };
    match generate_description(backend, &input).await {
        Ok(output) => ActionResponse::ok(output),
        Err(err) => flow_error("generate_listing_description", err),
    }
}

/// Suggest listing titles.
pub async fn suggest_listing_titles(
    backend: &dyn ModelBackend,
    category: &str,
    brand: &str,
    model: &str,
    condition: &str,
) -> ActionResponse<Vec<String>> {
    let input = SuggestTitleInput {
        category: category.to_string(),
        brand: brand.to_string(),
        model: model.to_string(),
        condition: condition.to_string(),
    };
    match suggest_title(backend, &input).await {
        Ok(output) => ActionResponse::ok(output.titles),
        Err(err) => flow_error("suggest_listing_titles", err),
    }
}

/// Grade an item's condition from its uploaded photos.
pub async fn assess_item_condition(
    backend: &dyn ModelBackend,
    photos: &[String],
    claimed_condition: Option<&str>,
) -> ActionResponse<AssessConditionOutput> {
    if let Some(message) = validate_photos(photos) {
        return ActionResponse::err(message);
    }
    let input = AssessConditionInput {
        photos: photos.to_vec(),
        claimed_condition: claimed_condition.map(str::to_string),
    };
    match assess_condition(backend, &input).await {
        Ok(output) => ActionResponse::ok(output),
        Err(err) => flow_error("assess_item_condition", err),
    }
}

/// Rewrite very short inputs so the model translates them as interface
/// labels instead of guessing a literal sense for one or two words.
fn disambiguate_short_text(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.split_whitespace().count() <= SHORT_TEXT_WORD_LIMIT {
        format!(
            "Translate the UI label '{}' exactly as it would appear in an online marketplace interface.",
            trimmed
        )
    } else {
        trimmed.to_string()
    }
}

/// Translate a piece of UI or listing text, going through the explicit
/// (locale, text key) cache the caller owns.
pub async fn translate_ui_text(
    backend: &dyn ModelBackend,
    cache: &TranslationCache,
    target_locale: &str,
    text_key: &str,
    text: &str,
) -> ActionResponse<String> {
    if text.trim().is_empty() {
        return ActionResponse::err("Nothing to translate.");
    }
    if let Some(hit) = cache.get(target_locale, text_key) {
        return ActionResponse::ok(hit);
    }

    let input = TranslateTextInput {
        text: disambiguate_short_text(text),
        target_locale: target_locale.to_string(),
        source_locale: None,
    };
    match translate_text(backend, &input).await {
        Ok(output) => {
            cache.insert(target_locale, text_key, output.translated_text.clone());
            ActionResponse::ok(output.translated_text)
        }
        Err(err) => flow_error("translate_ui_text", err),
    }
}

/// Check compatibility between a device and an accessory, or list
/// compatible devices, depending on the requested mode.
pub async fn check_device_compatibility(
    backend: &dyn ModelBackend,
    mode: &str,
    device: &str,
    accessory: Option<&str>,
) -> ActionResponse<CompatibilityOutcome> {
    let mode = match mode {
        "verdict" => CompatibilityMode::Verdict,
        "device_list" => CompatibilityMode::DeviceList,
        _ => return ActionResponse::err("Unknown compatibility check mode."),
    };
    if matches!(mode, CompatibilityMode::Verdict) && accessory.is_none() {
        return ActionResponse::err("Please name the accessory or device to check against.");
    }
    let input = CheckCompatibilityInput {
        mode,
        device: device.to_string(),
        accessory: accessory.map(str::to_string),
    };
    match check_compatibility(backend, &input).await {
        Ok(outcome) => ActionResponse::ok(outcome),
        Err(err) => flow_error("check_device_compatibility", err),
    }
}

/// Resolve the pickup locality for a listing.
pub async fn suggest_pickup_locality(
    backend: &dyn ModelBackend,
    hint: &str,
    latitude: &str,
    longitude: &str,
) -> ActionResponse<SuggestLocalityOutput> {
    let (Ok(lat), Ok(lon)) = (
        latitude.trim().parse::<f64>(),
        longitude.trim().parse::<f64>(),
    ) else {
        return ActionResponse::err("Please provide valid coordinates.");
    };
    let input = SuggestLocalityInput {
        hint: hint.to_string(),
        latitude: lat,
        longitude: lon,
    };
    match suggest_locality(backend, &input).await {
        Ok(output) => ActionResponse::ok(output),
        Err(err) => flow_error("suggest_pickup_locality", err),
    }
}

/// Draft a seller reply for an incoming exchange-request message.
pub async fn draft_message_reply(
    backend: &dyn ModelBackend,
    listing_title: &str,
    buyer_message: &str,
    intent: &str,
) -> ActionResponse<String> {
    let intent = match intent {
        "accept" => ReplyIntent::Accept,
        "decline" => ReplyIntent::Decline,
        "negotiate" => ReplyIntent::Negotiate,
        "request_details" => ReplyIntent::RequestDetails,
        _ => return ActionResponse::err("Unknown reply intent."),
    };
    let input = DraftReplyInput {
        listing_title: listing_title.to_string(),
        buyer_message: buyer_message.to_string(),
        intent,
    };
    match draft_reply(backend, &input).await {
        Ok(output) => ActionResponse::ok(output.reply),
        Err(err) => flow_error("draft_message_reply", err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recycle_flows::backend::ScriptedBackend;

    const PNG_URI: &str = "data:image/png;base64,iVBORw0KGgo=";

    #[tokio::test]
    async fn test_malformed_image_fails_without_model_call() {
        let backend = ScriptedBackend::with_json_responses(&[r#"{"categories": ["a","b","c"]}"#]);
        let response =
            suggest_listing_categories(&backend, &["not-a-data-uri".to_string()], None).await;
        assert_eq!(response.error.as_deref(), Some("Invalid image data."));
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn test_valid_image_returns_categories() {
        let backend = ScriptedBackend::with_json_responses(&[
            r#"{"categories": ["Electronics", "Phones", "Smartphones"]}"#,
        ]);
        let response =
            suggest_listing_categories(&backend, &[PNG_URI.to_string()], Some("boxed")).await;
        let categories = response.data.expect("categories");
        assert!(categories.len() >= 3);
        assert_eq!(backend.calls(), 1);
    }

    #[tokio::test]
    async fn test_short_text_gets_ui_label_disambiguation() {
        let backend =
            ScriptedBackend::with_json_responses(&[r#"{"translated_text": "Verkauft"}"#]);
        let cache = TranslationCache::new();
        let response = translate_ui_text(&backend, &cache, "de", "listing.sold", "Sold").await;
        assert!(response.is_ok());

        let prompt = backend.requests()[0].messages[1].content.clone();
        assert!(prompt.contains("Translate the UI label 'Sold'"));
    }

    #[tokio::test]
    async fn test_two_word_text_is_still_disambiguated() {
        let backend =
            ScriptedBackend::with_json_responses(&[r#"{"translated_text": "Jetzt kaufen"}"#]);
        let cache = TranslationCache::new();
        translate_ui_text(&backend, &cache, "de", "cta.buy", "Buy now").await;
        let prompt = backend.requests()[0].messages[1].content.clone();
        assert!(prompt.contains("Translate the UI label 'Buy now'"));
    }

    #[tokio::test]
    async fn test_longer_text_is_not_rewritten() {
        let backend = ScriptedBackend::with_json_responses(&[
            r#"{"translated_text": "Gebraucht, guter Zustand"}"#,
        ]);
        let cache = TranslationCache::new();
        translate_ui_text(&backend, &cache, "de", "desc", "Used but in good condition").await;
        let prompt = backend.requests()[0].messages[1].content.clone();
        assert!(!prompt.contains("Translate the UI label"));
        assert!(prompt.contains("Used but in good condition"));
    }

    #[tokio::test]
    async fn test_cache_hit_skips_the_model() {
        let backend = ScriptedBackend::with_json_responses(&[]);
        let cache = TranslationCache::new();
        cache.insert("de", "listing.sold", "Verkauft".to_string());

        let response = translate_ui_text(&backend, &cache, "de", "listing.sold", "Sold").await;
        assert_eq!(response.data.as_deref(), Some("Verkauft"));
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn test_successful_translation_populates_cache() {
        let backend =
            ScriptedBackend::with_json_responses(&[r#"{"translated_text": "Verkauft"}"#]);
        let cache = TranslationCache::new();
        translate_ui_text(&backend, &cache, "de", "listing.sold", "Sold").await;
        assert_eq!(cache.get("de", "listing.sold").as_deref(), Some("Verkauft"));
    }

    #[tokio::test]
    async fn test_backend_failure_maps_to_user_message() {
        // Empty script: the first chat call fails as unavailable.
        let backend = ScriptedBackend::with_json_responses(&[]);
        let response =
            suggest_listing_titles(&backend, "Laptops", "Lenovo", "X230", "Good").await;
        let message = response.error.expect("error message");
        assert!(message.contains("unavailable"));
        assert!(!message.contains("script"));
    }

    #[tokio::test]
    async fn test_unparseable_age_is_rejected_locally() {
        let backend = ScriptedBackend::with_json_responses(&[]);
        let response =
            estimate_listing_price(&backend, "Laptops", "Good", "three years", None).await;
        assert!(response.error.is_some());
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn test_verdict_mode_requires_an_accessory() {
        let backend = ScriptedBackend::with_json_responses(&[]);
        let response = check_device_compatibility(&backend, "verdict", "ThinkPad X230", None).await;
        assert!(response.error.is_some());
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn test_unknown_intent_is_rejected_locally() {
        let backend = ScriptedBackend::with_json_responses(&[]);
        let response = draft_message_reply(&backend, "Pixel 6", "Still available?", "ghost").await;
        assert_eq!(response.error.as_deref(), Some("Unknown reply intent."));
        assert_eq!(backend.calls(), 0);
    }
}
