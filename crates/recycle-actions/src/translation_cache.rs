//! Explicit translation cache.
//!
//! Keyed by (locale, text key), held by the caller and passed into the
//! translation action - never implicit module state. Process-lifetime,
//! eviction-free by design: the UI string set is small and fixed.

use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Debug, Default)]
pub struct TranslationCache {
    entries: Mutex<HashMap<(String, String), String>>,
}

impl TranslationCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, locale: &str, text_key: &str) -> Option<String> {
        self.entries
            .lock()
            .ok()
            .and_then(|map| map.get(&(locale.to_string(), text_key.to_string())).cloned())
    }

    pub fn insert(&self, locale: &str, text_key: &str, translation: String) {
        if let Ok(mut map) = self.entries.lock() {
            map.insert((locale.to_string(), text_key.to_string()), translation);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|map| map.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyed_by_locale_and_text_key() {
        let cache = TranslationCache::new();
        cache.insert("de", "listing.sold", "Verkauft".to_string());
        cache.insert("fr", "listing.sold", "Vendu".to_string());

        assert_eq!(cache.get("de", "listing.sold").as_deref(), Some("Verkauft"));
        assert_eq!(cache.get("fr", "listing.sold").as_deref(), Some("Vendu"));
        assert!(cache.get("de", "listing.available").is_none());
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_overwrite_keeps_latest() {
        let cache = TranslationCache::new();
        cache.insert("de", "k", "alt".to_string());
        cache.insert("de", "k", "neu".to_string());
        assert_eq!(cache.get("de", "k").as_deref(), Some("neu"));
        assert_eq!(cache.len(), 1);
    }
}
