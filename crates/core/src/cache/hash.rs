//! Request-identity cache key generation.

use sha2::{Digest, Sha256};
use url::Url;

/// Compute the cache key for a request: method plus URL, fragment excluded.
pub fn compute_request_key(method: &str, url: &Url) -> String {
    let mut url = url.clone();
    url.set_fragment(None);

    let mut hasher = Sha256::new();
    hasher.update(method.to_ascii_uppercase().as_bytes());
    hasher.update(b"\n");
    hasher.update(url.as_str().as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_key_stability() {
        let key1 = compute_request_key("GET", &url("http://localhost:3000/widgets"));
        let key2 = compute_request_key("GET", &url("http://localhost:3000/widgets"));
        assert_eq!(key1, key2);
    }

    #[test]
    fn test_key_ignores_fragment() {
        let plain = compute_request_key("GET", &url("http://localhost:3000/widgets"));
        let anchored = compute_request_key("GET", &url("http://localhost:3000/widgets#top"));
        assert_eq!(plain, anchored);
    }

    #[test]
    fn test_key_method_case_insensitive() {
        let upper = compute_request_key("GET", &url("http://localhost:3000/"));
        let lower = compute_request_key("get", &url("http://localhost:3000/"));
        assert_eq!(upper, lower);
    }

    #[test]
    fn test_key_distinguishes_query() {
        let a = compute_request_key("GET", &url("http://localhost:3000/widgets?page=1"));
        let b = compute_request_key("GET", &url("http://localhost:3000/widgets?page=2"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_key_format() {
        let key = compute_request_key("GET", &url("http://localhost:3000/"));
        assert_eq!(key.len(), 64);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
