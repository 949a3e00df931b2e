//! axon-crypto: symmetric cipher suite for the AxonVault
//!
//! Key hierarchy:
//! ```text
//! Master Secret (operator-held, never stored)
//!   └── Derived Key (256-bit, PBKDF2-HMAC-SHA256, fixed salt, ≥100k iterations)
//!         ├── Envelope Encryption Key (HKDF, domain="axon-envelope-enc") → AES-256-CBC
//!         ├── Envelope MAC Key        (HKDF, domain="axon-envelope-mac") → HMAC-SHA256
//!         ├── Integrity Key           (HKDF, domain="axon-integrity")    → HMAC-SHA256 tags
//!         └── Token Key               (HKDF, domain="axon-token")        → Fernet-layout tokens
//!               (signing = token_key[..16], encryption = token_key[16..])
//! ```
//!
//! Block-cipher mode (unauthenticated AES-256-CBC) keys directly off the
//! derived key. Every CBC encryption inside this crate draws a fresh IV.

pub mod cipher;
pub mod envelope;
pub mod integrity;
pub mod kdf;
pub mod keys;
pub mod session;
pub mod token;

pub use cipher::{decrypt_block_cipher, encrypt_block_cipher};
pub use envelope::{EncryptedEnvelope, EnvelopeKeys};
pub use integrity::{compute_integrity_tag, generate_secret, verify_integrity_tag, IntegrityTag};
pub use kdf::{derive_key, DerivedKey, KdfParams};
pub use keys::{derive_integrity_key, derive_token_key, generate_ephemeral_key};
pub use session::SessionParams;
pub use token::{decrypt_authenticated, encrypt_authenticated};

/// Size of a derived key in bytes (256-bit)
pub const KEY_SIZE: usize = 32;

/// AES block size; also the CBC IV size
pub const BLOCK_SIZE: usize = 16;

/// Size of a CBC initialization vector
pub const IV_SIZE: usize = 16;

/// Size of an HMAC-SHA256 tag
pub const TAG_SIZE: usize = 32;
