use sha2::{Digest, Sha256};

/// Deterministic 16-hex-char id from `|`-joined components.
pub fn stable_id(components: &[&str]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(components.join("|").as_bytes());
    let hex = format!("{:x}", hasher.finalize());
    hex[..16].to_string()
}

/// Full SHA-256 hex digest of a text body.
pub fn content_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stable_id_is_deterministic() {
        let a = stable_id(&["https://example.com", "doc"]);
        let b = stable_id(&["https://example.com", "doc"]);
        assert_eq!(a, b);
        assert_eq!(a.len(), 16);
    }

    #[test]
    fn stable_id_varies_with_components() {
        assert_ne!(
            stable_id(&["https://example.com", "doc"]),
            stable_id(&["https://example.com", "section"])
        );
    }

    #[test]
    fn content_hash_is_full_digest() {
        let h = content_hash("");
        assert_eq!(h.len(), 64);
        assert_eq!(h, content_hash(""));
    }
}
