use sha2::{Digest, Sha256};

/// SHA-256 content hash of uploaded audio bytes, as a lowercase hex digest.
///
/// This is the deduplication key: identical bytes always produce the same
/// digest regardless of filename or metadata. It is not used to verify the
/// integrity of stored copies.
pub fn fingerprint(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let hash = hasher.finalize();

    let mut out = String::with_capacity(hash.len() * 2);
    for byte in hash {
        use std::fmt::Write;
        let _ = write!(out, "{:02x}", byte);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_bytes_identical_digest() {
        let a = fingerprint(b"some audio content");
        let b = fingerprint(b"some audio content");
        assert_eq!(a, b);
    }

    #[test]
    fn test_single_bit_flip_changes_digest() {
        let mut data = vec![0u8; 1024];
        let original = fingerprint(&data);
        data[512] ^= 0x01;
        let flipped = fingerprint(&data);
        assert_ne!(original, flipped);
    }

    #[test]
    fn test_digest_is_hex_sha256() {
        let digest = fingerprint(b"");
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
        // SHA-256 of the empty string is a well-known constant.
        assert_eq!(
            digest,
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_filename_does_not_affect_digest() {
        // The digest is computed over content only; two "files" with the
        // same bytes fingerprint identically.
        let content = b"identical payload";
        assert_eq!(fingerprint(content), fingerprint(&content.to_vec()));
    }
}
