//! Cache key derivation.
//!
//! A key is the lowercase hex SHA-256 digest of `entity_scope ":" normalized_request`.
//! Callers are responsible for producing the normalized request in canonical field
//! order; see `CatalogRequest::normalized`.

use std::fmt;

use sha2::{Digest, Sha256};

/// Fixed-length identifier of a cached payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Derive the cache key for a normalized request within an entity scope.
pub fn derive_key(entity_scope: &str, normalized_request: &str) -> CacheKey {
    let mut hasher = Sha256::new();
    hasher.update(entity_scope.as_bytes());
    hasher.update(b":");
    hasher.update(normalized_request.as_bytes());
    CacheKey(hex::encode(hasher.finalize().as_slice()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_input_produces_same_key() {
        let a = derive_key("film", "list|page[number]=1&page[size]=50");
        let b = derive_key("film", "list|page[number]=1&page[size]=50");
        assert_eq!(a, b);
    }

    #[test]
    fn key_is_fixed_length_hex() {
        let key = derive_key("genre", "detail|id=g1");
        assert_eq!(key.as_str().len(), 64);
        assert!(key.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn scope_separates_identical_requests() {
        let film = derive_key("film", "detail|id=1");
        let person = derive_key("person", "detail|id=1");
        assert_ne!(film, person);
    }

    #[test]
    fn different_requests_produce_different_keys() {
        assert_ne!(
            derive_key("film", "detail|id=1"),
            derive_key("film", "detail|id=2")
        );
        assert_ne!(
            derive_key("film", "list|page[number]=1"),
            derive_key("film", "list|page[number]=2")
        );
    }
}
