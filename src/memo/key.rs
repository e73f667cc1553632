//! Cache Key Module
//!
//! Derives stable, filesystem-safe identifiers from call arguments.

use std::path::{Path, PathBuf};

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::error::Result;

/// Number of digest bytes kept in a key (128 bits).
pub const KEY_BYTES: usize = 16;

/// Extension of every cache file.
pub const CACHE_FILE_EXTENSION: &str = "cache";

/// Hashes the JSON form of `args` into a lowercase hex key.
///
/// Tuples serialize as JSON arrays, so `("a", 1)` hashes the text `["a",1]`.
/// A bare value hashes as itself: `"a"` and the 1-tuple `("a",)` (text
/// `["a"]`) give different keys. Producers that must share entries with an
/// argument-list key should take a 1-tuple.
/// Object keys keep their insertion order: two maps that differ only in key
/// order produce different keys.
///
/// This is a namespacing aid, not a security boundary. Collisions are an
/// accepted risk at the scale of a local cache folder.
pub fn derive_key<A: Serialize + ?Sized>(args: &A) -> Result<String> {
    let serialized = serde_json::to_string(args)?;
    let digest = Sha256::digest(serialized.as_bytes());

    Ok(digest[..KEY_BYTES]
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect())
}

/// Builds `<folder>/<namespace>_<key>.cache`.
pub fn cache_path(folder: &Path, namespace: &str, key: &str) -> PathBuf {
    folder.join(format!("{namespace}_{key}.{CACHE_FILE_EXTENSION}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_known_digest() {
        let key = derive_key(&("https://example.com",)).unwrap();
        assert_eq!(key, "83ed2926ca5241d82092dbb968ebb941");
    }

    #[test]
    fn test_bare_value_differs_from_one_tuple() {
        let bare = derive_key(&"https://example.com").unwrap();
        let tuple = derive_key(&("https://example.com",)).unwrap();

        assert_eq!(bare, "5775c078c67ebad469f37e1d888f3084");
        assert_ne!(bare, tuple);
    }

    #[test]
    fn test_key_shape() {
        let key = derive_key(&("url", 3, true)).unwrap();
        assert_eq!(key.len(), KEY_BYTES * 2);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_different_arguments_different_keys() {
        let a = derive_key(&("https://example.com/a",)).unwrap();
        let b = derive_key(&("https://example.com/b",)).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_key_order_is_significant() {
        let first = derive_key(&("a", json!({"b": 1, "a": 2}))).unwrap();
        let second = derive_key(&("a", json!({"a": 2, "b": 1}))).unwrap();

        assert_eq!(first, "e55cf2c2cf82e496c03bb987b1e836eb");
        assert_ne!(first, second);
    }

    #[test]
    fn test_cache_path_layout() {
        let path = cache_path(Path::new("/var/cache/app"), "webpage", "abc123");
        assert_eq!(path, PathBuf::from("/var/cache/app/webpage_abc123.cache"));
    }
}
