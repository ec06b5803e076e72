//! Request identity hashing for cache keys.

use sha2::{Digest, Sha256};

/// Compute the cache key for a request: SHA-256 over method and absolute URL.
///
/// Headers do not take part; two requests for the same URL share an entry.
pub fn compute_cache_key(method: &str, url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(method.to_ascii_uppercase().as_bytes());
    hasher.update(b" ");
    hasher.update(url.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_stability() {
        let a = compute_cache_key("GET", "https://moodify.example/index.html");
        let b = compute_cache_key("GET", "https://moodify.example/index.html");
        assert_eq!(a, b);
    }

    #[test]
    fn test_key_method_case_insensitive() {
        assert_eq!(compute_cache_key("get", "https://moodify.example/"), compute_cache_key("GET", "https://moodify.example/"));
    }

    #[test]
    fn test_key_differs_by_method_and_url() {
        let get = compute_cache_key("GET", "https://moodify.example/");
        assert_ne!(get, compute_cache_key("HEAD", "https://moodify.example/"));
        assert_ne!(get, compute_cache_key("GET", "https://moodify.example/index.html"));
    }

    #[test]
    fn test_key_format() {
        let key = compute_cache_key("GET", "https://moodify.example/");
        assert_eq!(key.len(), 64);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
