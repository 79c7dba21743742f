//! SHA-256 digests used to fingerprint generated content.

use sha2::{Digest, Sha256};

/// Checksum of `content` formatted as `sha256:<hex>`.
///
/// # Examples
///
/// ```rust
/// use awd_cli::utils::checksum::content_checksum;
///
/// let checksum = content_checksum("hello");
/// assert!(checksum.starts_with("sha256:"));
/// assert_eq!(checksum.len(), "sha256:".len() + 64);
/// ```
pub fn content_checksum(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("sha256:{}", hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_digest() {
        assert_eq!(
            content_checksum(""),
            "sha256:e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_different_content_differs() {
        assert_ne!(content_checksum("a"), content_checksum("b"));
    }
}
