//! axon-vault: zero-knowledge neural data vault
//!
//! Composes key derivation, the authenticated envelope cipher, the privacy
//! engine and a redacting audit ledger behind one narrow API:
//!
//! ```text
//! encrypt(bytes, metadata) → (EncryptedEnvelope, DataId)   + audit ENCRYPT
//! decrypt(envelope, id)    → (bytes, DecryptMetadata)      + audit DECRYPT
//! audit_trail(limit)       → [AuditEvent]
//! anonymize(signal, ε)     → signal + Laplace noise
//! ```
//!
//! The vault performs no I/O. Persisting envelopes and audit events is the
//! caller's job.

pub mod audit;
pub mod id;
pub mod vault;

pub use audit::AuditLedger;
pub use id::DataId;
pub use vault::Vault;

pub use axon_core::{AuditAction, AuditEvent, CipherMode, DecryptMetadata, Metadata, SecurityConfig};
pub use axon_crypto::EncryptedEnvelope;
