//! Key hierarchy: derived key → purpose-bound subkeys, ephemeral key generation

use axon_core::{VaultError, VaultResult};
use hkdf::Hkdf;
use rand::RngCore;
use sha2::Sha256;

use crate::kdf::DerivedKey;
use crate::KEY_SIZE;

pub(crate) const ENVELOPE_ENC_DOMAIN: &[u8] = b"axon-envelope-enc";
pub(crate) const ENVELOPE_MAC_DOMAIN: &[u8] = b"axon-envelope-mac";
const INTEGRITY_DOMAIN: &[u8] = b"axon-integrity";
const TOKEN_DOMAIN: &[u8] = b"axon-token";

/// Generate a random 256-bit key for a vault that has no master secret.
///
/// Anything encrypted under it is unrecoverable once the process exits.
pub fn generate_ephemeral_key() -> DerivedKey {
    let mut bytes = [0u8; KEY_SIZE];
    rand::thread_rng().fill_bytes(&mut bytes);
    DerivedKey::from_bytes(bytes)
}

/// Derive the integrity-tag key from the derived key via HKDF-SHA256.
pub fn derive_integrity_key(key: &DerivedKey) -> VaultResult<DerivedKey> {
    hkdf_derive(key.as_bytes(), INTEGRITY_DOMAIN).map(DerivedKey::from_bytes)
}

/// Derive the token key from the derived key via HKDF-SHA256.
///
/// Tokens split their key into signing and encryption halves, so they get a
/// subkey of their own rather than sharing the block-cipher key.
pub fn derive_token_key(key: &DerivedKey) -> VaultResult<DerivedKey> {
    hkdf_derive(key.as_bytes(), TOKEN_DOMAIN).map(DerivedKey::from_bytes)
}

/// HKDF-SHA256 key derivation with a domain-specific info string.
pub(crate) fn hkdf_derive(ikm: &[u8; KEY_SIZE], info: &[u8]) -> VaultResult<[u8; KEY_SIZE]> {
    let hkdf = Hkdf::<Sha256>::new(None, ikm);
    let mut okm = [0u8; KEY_SIZE];
    hkdf.expand(info, &mut okm)
        .map_err(|e| VaultError::Other(anyhow::anyhow!("HKDF expand failed: {e}")))?;
    Ok(okm)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_key() -> DerivedKey {
        DerivedKey::from_bytes([42u8; KEY_SIZE])
    }

    #[test]
    fn test_ephemeral_keys_differ() {
        let k1 = generate_ephemeral_key();
        let k2 = generate_ephemeral_key();
        assert_ne!(k1.as_bytes(), k2.as_bytes(), "random keys must differ");
    }

    #[test]
    fn test_hkdf_derive_different_domains() {
        let key = test_key();
        let enc = hkdf_derive(key.as_bytes(), ENVELOPE_ENC_DOMAIN).unwrap();
        let mac = hkdf_derive(key.as_bytes(), ENVELOPE_MAC_DOMAIN).unwrap();
        let integrity = derive_integrity_key(&key).unwrap();
        let token = derive_token_key(&key).unwrap();

        assert_ne!(enc, mac, "different domains must produce different keys");
        assert_ne!(&enc, integrity.as_bytes());
        assert_ne!(key.as_bytes(), integrity.as_bytes());
        assert_ne!(key.as_bytes(), token.as_bytes());
        assert_ne!(integrity.as_bytes(), token.as_bytes());
        assert_ne!(&mac, token.as_bytes());
    }

    #[test]
    fn test_hkdf_derive_deterministic() {
        let a = derive_integrity_key(&test_key()).unwrap();
        let b = derive_integrity_key(&test_key()).unwrap();
        assert_eq!(a.as_bytes(), b.as_bytes());
    }
}
