//! Utility functions and helpers.

pub mod http;

use sha2::{Digest, Sha256};

use crate::models::{QuerySpec, RecordKind};

/// Stable cache key for one (spec, kind) pair.
///
/// Hex SHA-256 of the spec's canonical encoding, so the key survives
/// process restarts and is safe as a filename.
pub fn cache_key(spec: &QuerySpec, kind: RecordKind) -> String {
    let mut hasher = Sha256::new();
    hasher.update(kind.as_str().as_bytes());
    hasher.update(b"\n");
    hasher.update(spec.canonical().as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FilterValue;

    #[test]
    fn test_cache_key_is_deterministic() {
        let spec = QuerySpec::new("shoes", 3);
        assert_eq!(
            cache_key(&spec, RecordKind::Product),
            cache_key(&spec.clone(), RecordKind::Product)
        );
    }

    #[test]
    fn test_cache_key_varies_by_page_and_kind() {
        let spec = QuerySpec::new("shoes", 1);
        let next = spec.with_page(2);
        assert_ne!(
            cache_key(&spec, RecordKind::Product),
            cache_key(&next, RecordKind::Product)
        );
        assert_ne!(
            cache_key(&spec, RecordKind::Product),
            cache_key(&spec, RecordKind::Article)
        );
    }

    #[test]
    fn test_cache_key_sees_filters() {
        let spec = QuerySpec::new("shoes", 1);
        let mut filtered = spec.clone();
        filtered
            .filters
            .insert("brand".into(), FilterValue::Text("acme".into()));
        assert_ne!(
            cache_key(&spec, RecordKind::Product),
            cache_key(&filtered, RecordKind::Product)
        );
    }

    #[test]
    fn test_cache_key_is_hex_digest() {
        let key = cache_key(&QuerySpec::new("shoes", 1), RecordKind::Listing);
        assert_eq!(key.len(), 64);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
