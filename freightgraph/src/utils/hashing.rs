//! Content hashing for snapshot memoization.

use serde::Serialize;
use sha2::{Digest, Sha256};

/// Hashes the JSON serialization of a value.
///
/// Returns a truncated hex-encoded SHA-256 digest. Map-typed fields must be
/// ordered (e.g. `BTreeMap`) for equal values to hash equally.
///
/// # Errors
///
/// Returns an error if the value cannot be serialized.
pub fn content_hash<T: Serialize + ?Sized>(value: &T) -> Result<String, serde_json::Error> {
    let bytes = serde_json::to_vec(value)?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    let result = hasher.finalize();
    Ok(hex::encode(&result[..16]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_hash_stable() {
        let mut a = BTreeMap::new();
        a.insert("b", 2);
        a.insert("a", 1);
        let mut b = BTreeMap::new();
        b.insert("a", 1);
        b.insert("b", 2);

        assert_eq!(content_hash(&a).unwrap(), content_hash(&b).unwrap());
        assert_eq!(content_hash(&a).unwrap().len(), 32);
    }

    #[test]
    fn test_hash_differs() {
        assert_ne!(content_hash("one").unwrap(), content_hash("two").unwrap());
    }
}
