//! Key derivation: PBKDF2-HMAC-SHA256 master secret → derived key

use axon_core::config::MIN_KDF_ITERATIONS;
use axon_core::{VaultError, VaultResult};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use zeroize::Zeroize;

use crate::KEY_SIZE;

/// A 256-bit key derived from the master secret.
///
/// Zeroized on drop to prevent secrets lingering in memory.
#[derive(Clone)]
pub struct DerivedKey {
    bytes: [u8; KEY_SIZE],
}

impl DerivedKey {
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

impl Drop for DerivedKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DerivedKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// PBKDF2 parameters.
///
/// The salt is fixed and application-wide. That is only acceptable because the
/// master secret is assumed to be high-entropy; the iteration count is what
/// slows down offline guessing if the secret is weak.
#[derive(Debug, Clone)]
pub struct KdfParams {
    pub salt: Vec<u8>,
    /// Iterations (default: 200000, minimum: 100000)
    pub iterations: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            salt: b"axonos_salt".to_vec(),
            iterations: 200_000,
        }
    }
}

/// Derive a 256-bit key from the master secret with PBKDF2-HMAC-SHA256.
///
/// Deterministic: the same secret, salt and iteration count always produce the
/// same key, which is what lets envelopes survive a process restart.
pub fn derive_key(secret: &SecretString, params: &KdfParams) -> VaultResult<DerivedKey> {
    let secret = secret.expose_secret();
    if secret.is_empty() {
        return Err(VaultError::Configuration("master secret is empty".into()));
    }
    if params.iterations < MIN_KDF_ITERATIONS {
        return Err(VaultError::Configuration(format!(
            "PBKDF2 iterations must be at least {MIN_KDF_ITERATIONS} (got {})",
            params.iterations
        )));
    }

    let mut key = [0u8; KEY_SIZE];
    pbkdf2::pbkdf2_hmac::<Sha256>(secret.as_bytes(), &params.salt, params.iterations, &mut key);

    Ok(DerivedKey::from_bytes(key))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_params() -> KdfParams {
        KdfParams {
            salt: b"axonos_salt".to_vec(),
            iterations: MIN_KDF_ITERATIONS,
        }
    }

    #[test]
    fn test_kdf_deterministic() {
        let secret = SecretString::from("correct-horse-battery-staple");

        let key1 = derive_key(&secret, &fast_params()).unwrap();
        let key2 = derive_key(&secret, &fast_params()).unwrap();

        assert_eq!(key1.as_bytes(), key2.as_bytes(), "KDF must be deterministic");
    }

    #[test]
    fn test_kdf_known_vector() {
        // RFC 7914 §11 PBKDF2-HMAC-SHA256 vector, c = 1, first 32 bytes of dkLen 64.
        // derive_key enforces the iteration floor, so go through pbkdf2 directly.
        let mut out = [0u8; KEY_SIZE];
        pbkdf2::pbkdf2_hmac::<Sha256>(b"passwd", b"salt", 1, &mut out);
        assert_eq!(
            hex::encode(out),
            "55ac046e56e3089fec1691c22544b605f94185216dde0465e68b9d57c20dacbc"
        );
    }

    #[test]
    fn test_kdf_different_secrets() {
        let key1 = derive_key(&SecretString::from("secret-a"), &fast_params()).unwrap();
        let key2 = derive_key(&SecretString::from("secret-b"), &fast_params()).unwrap();

        assert_ne!(
            key1.as_bytes(),
            key2.as_bytes(),
            "different secrets must produce different keys"
        );
    }

    #[test]
    fn test_kdf_different_salts() {
        let secret = SecretString::from("same-secret");
        let other = KdfParams {
            salt: b"axonos_base_salt".to_vec(),
            ..fast_params()
        };

        let key1 = derive_key(&secret, &fast_params()).unwrap();
        let key2 = derive_key(&secret, &other).unwrap();

        assert_ne!(key1.as_bytes(), key2.as_bytes(), "different salts must produce different keys");
    }

    #[test]
    fn test_kdf_rejects_empty_secret() {
        let err = derive_key(&SecretString::from(""), &fast_params()).unwrap_err();
        assert!(matches!(err, VaultError::Configuration(_)));
    }

    #[test]
    fn test_kdf_rejects_low_iterations() {
        let params = KdfParams {
            iterations: 10_000,
            ..fast_params()
        };
        let err = derive_key(&SecretString::from("secret"), &params).unwrap_err();
        assert!(matches!(err, VaultError::Configuration(_)));
    }

    #[test]
    fn test_debug_is_redacted() {
        let key = DerivedKey::from_bytes([0xAB; KEY_SIZE]);
        let debug = format!("{key:?}");
        assert!(debug.contains("REDACTED"));
        assert!(!debug.contains("171"));
    }
}
