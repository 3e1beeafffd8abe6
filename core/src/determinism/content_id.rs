use sha2::{Digest, Sha256};

// ASCII unit separator between key fields.
const FIELD_SEP: u8 = 0x1f;

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut h = Sha256::new();
    h.update(bytes);
    hex::encode(h.finalize())
}

/// Stable comment identifier from its natural key.
///
/// Row position never enters the digest, so reordering or filtering the
/// source dataset leaves every surviving comment's id unchanged.
pub fn comment_id_from_natural_key(
    video_id: Option<&str>,
    author: Option<&str>,
    published: Option<&str>,
    text: &str,
) -> String {
    let mut h = Sha256::new();
    for part in [video_id, author, published, Some(text)] {
        h.update(part.map(str::trim).unwrap_or("").as_bytes());
        h.update([FIELD_SEP]);
    }
    let digest = h.finalize();
    format!("c_{}", hex::encode(&digest[..16]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_is_deterministic_and_prefixed() {
        let a = comment_id_from_natural_key(Some("v1"), Some("bob"), Some("2024-01-01"), "hi");
        let b = comment_id_from_natural_key(Some("v1"), Some("bob"), Some("2024-01-01"), "hi");
        assert_eq!(a, b);
        assert!(a.starts_with("c_"));
        assert_eq!(a.len(), 2 + 32);
    }

    #[test]
    fn field_boundaries_are_significant() {
        let a = comment_id_from_natural_key(Some("ab"), Some("c"), None, "x");
        let b = comment_id_from_natural_key(Some("a"), Some("bc"), None, "x");
        assert_ne!(a, b);
    }

    #[test]
    fn surrounding_whitespace_does_not_change_id() {
        let a = comment_id_from_natural_key(None, None, None, "hello");
        let b = comment_id_from_natural_key(Some(""), None, Some("  "), "  hello\n");
        assert_eq!(a, b);
    }

    #[test]
    fn sha256_of_empty_input() {
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
