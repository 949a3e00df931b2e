//! Integrity tags: HMAC-SHA256 message authentication
//!
//! These prove that data was produced by a holder of the shared secret and has
//! not been altered. They are MACs, not digital signatures: anyone able to
//! verify a tag can also forge one, so there is no non-repudiation.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use rand::RngCore;
use secrecy::SecretString;
use sha2::Sha256;
use zeroize::Zeroize;

use crate::TAG_SIZE;

type HmacSha256 = Hmac<Sha256>;

/// A 256-bit HMAC-SHA256 tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntegrityTag([u8; TAG_SIZE]);

impl IntegrityTag {
    pub fn as_bytes(&self) -> &[u8; TAG_SIZE] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse a hex tag. Returns `None` for anything that is not 64 hex chars.
    pub fn from_hex(s: &str) -> Option<Self> {
        let bytes = hex::decode(s.trim()).ok()?;
        let arr: [u8; TAG_SIZE] = bytes.try_into().ok()?;
        Some(Self(arr))
    }
}

/// Compute the integrity tag of `data` under `secret`.
pub fn compute_integrity_tag(data: &[u8], secret: &[u8]) -> IntegrityTag {
    let mut mac = <HmacSha256 as Mac>::new_from_slice(secret).expect("HMAC can take key of any size");
    mac.update(data);
    IntegrityTag(mac.finalize().into_bytes().into())
}

/// Verify an integrity tag in constant time.
///
/// Fails closed: a wrong length, wrong secret, or altered data all yield
/// `false`. Never panics.
pub fn verify_integrity_tag(data: &[u8], tag: &[u8], secret: &[u8]) -> bool {
    let Ok(mut mac) = <HmacSha256 as Mac>::new_from_slice(secret) else {
        return false;
    };
    mac.update(data);
    mac.verify_slice(tag).is_ok()
}

/// Generate a fresh 256-bit secret, URL-safe base64 encoded.
pub fn generate_secret() -> SecretString {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    let encoded = URL_SAFE_NO_PAD.encode(bytes);
    bytes.zeroize();
    SecretString::from(encoded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_rfc4231_case_2() {
        let tag = compute_integrity_tag(b"what do ya want for nothing?", b"Jefe");
        assert_eq!(
            tag.to_hex(),
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn test_verify_accepts_valid_tag() {
        let tag = compute_integrity_tag(b"neural frame 17", b"shared-secret");
        assert!(verify_integrity_tag(b"neural frame 17", tag.as_bytes(), b"shared-secret"));
    }

    #[test]
    fn test_verify_fails_closed() {
        let tag = compute_integrity_tag(b"neural frame 17", b"shared-secret");

        assert!(!verify_integrity_tag(b"neural frame 18", tag.as_bytes(), b"shared-secret"));
        assert!(!verify_integrity_tag(b"neural frame 17", tag.as_bytes(), b"other-secret"));
        assert!(!verify_integrity_tag(b"neural frame 17", &tag.as_bytes()[..16], b"shared-secret"));
        assert!(!verify_integrity_tag(b"neural frame 17", b"", b"shared-secret"));

        let mut flipped = *tag.as_bytes();
        flipped[31] ^= 0x01;
        assert!(!verify_integrity_tag(b"neural frame 17", &flipped, b"shared-secret"));
    }

    #[test]
    fn test_hex_roundtrip_and_rejects() {
        let tag = compute_integrity_tag(b"data", b"key");
        assert_eq!(IntegrityTag::from_hex(&tag.to_hex()), Some(tag));
        assert_eq!(IntegrityTag::from_hex("abcd"), None);
        assert_eq!(IntegrityTag::from_hex(&"zz".repeat(32)), None);
    }

    #[test]
    fn test_generate_secret() {
        let s1 = generate_secret();
        let s2 = generate_secret();
        assert_eq!(s1.expose_secret().len(), 43);
        assert_ne!(s1.expose_secret(), s2.expose_secret());
    }
}
