//! Image data-URI gating for form uploads.

use once_cell::sync::Lazy;
use regex::Regex;

/// Uploads arrive as `data:image/<subtype>;base64,<payload>`; anything
/// else is rejected before a flow is ever invoked.
static IMAGE_DATA_URI: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^data:image/[a-zA-Z0-9.+-]+;base64,[A-Za-z0-9+/=]+$").expect("static pattern")
});

/// User-facing message for a rejected upload.
pub const INVALID_IMAGE_ERROR: &str = "Invalid image data.";

pub fn is_image_data_uri(candidate: &str) -> bool {
    IMAGE_DATA_URI.is_match(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_well_formed_data_uris() {
        assert!(is_image_data_uri("data:image/png;base64,iVBORw0KGgo="));
        assert!(is_image_data_uri("data:image/jpeg;base64,/9j/4AAQSkZJRg=="));
        assert!(is_image_data_uri("data:image/svg+xml;base64,PHN2Zz4="));
    }

    #[test]
    fn test_rejects_everything_else() {
        assert!(!is_image_data_uri("https://example.com/photo.png"));
        assert!(!is_image_data_uri("data:text/plain;base64,aGVsbG8="));
        assert!(!is_image_data_uri("data:image/png,notbase64marker"));
        assert!(!is_image_data_uri(""));
    }
}
