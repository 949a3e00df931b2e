//! The vault orchestrator

use std::time::Duration;

use axon_core::config::{AuditSettings, SecuritySettings};
use axon_core::{
    AuditAction, AuditEvent, CipherMode, DecryptMetadata, Metadata, SecurityConfig, VaultError,
    VaultResult,
};
use axon_crypto::{
    compute_integrity_tag, decrypt_authenticated, derive_integrity_key, derive_key,
    derive_token_key, encrypt_authenticated, generate_ephemeral_key, verify_integrity_tag,
    DerivedKey, EncryptedEnvelope, EnvelopeKeys, IntegrityTag, KdfParams,
};
use axon_privacy::{add_noise, NoiseMechanism, Sensitivity};
use chrono::Utc;
use tracing::{debug, info, warn};

use crate::audit::AuditLedger;
use crate::id::DataId;

/// Operations `compute_encrypted` recognises but cannot run.
const KNOWN_ENCRYPTED_OPS: &[&str] = &["sum"];

/// Zero-knowledge data vault.
///
/// A `Vault` only exists once its key has been derived, so every instance is
/// ready for use. Keys are fixed for the lifetime of the instance and the
/// master secret itself is dropped after derivation.
///
/// All methods take `&self`; share across threads with `Arc<Vault>`.
pub struct Vault {
    token_key: DerivedKey,
    integrity_key: DerivedKey,
    envelope_keys: EnvelopeKeys,
    ledger: AuditLedger,
    token_ttl: Option<Duration>,
    zero_knowledge: bool,
}

impl Vault {
    /// Derive keys from `config` and open the vault.
    ///
    /// Fails with [`VaultError::Configuration`] when zero-knowledge mode is on
    /// and no master secret was supplied. Without zero-knowledge mode and
    /// without a secret, a random per-process key is used instead.
    pub fn new(config: SecurityConfig) -> VaultResult<Self> {
        let key = match config.master_secret() {
            Some(secret) => {
                let params = KdfParams {
                    salt: config.kdf_salt.clone(),
                    iterations: config.kdf_iterations,
                };
                derive_key(secret, &params)?
            }
            None if config.zero_knowledge_mode => {
                return Err(VaultError::Configuration(
                    "zero-knowledge mode requires a master secret".into(),
                ));
            }
            None => {
                warn!("no master secret configured: using an ephemeral key, data will not survive a restart");
                generate_ephemeral_key()
            }
        };

        let vault = Self {
            token_key: derive_token_key(&key)?,
            integrity_key: derive_integrity_key(&key)?,
            envelope_keys: EnvelopeKeys::derive(&key, config.cipher_mode)?,
            ledger: AuditLedger::new(config.audit_origin, config.redact_prefix_len),
            token_ttl: config.token_ttl_secs.map(Duration::from_secs),
            zero_knowledge: config.zero_knowledge_mode,
        };

        info!(
            zero_knowledge = vault.zero_knowledge,
            cipher_mode = ?vault.cipher_mode(),
            origin = vault.ledger.origin(),
            "vault ready"
        );
        Ok(vault)
    }

    /// Default settings, with the secret read from `AXONOS_MASTER_KEY`.
    pub fn from_env() -> VaultResult<Self> {
        Self::new(SecurityConfig::from_env(
            &SecuritySettings::default(),
            &AuditSettings::default(),
        )?)
    }

    /// Encrypt `data` under a fresh IV and a fresh [`DataId`].
    ///
    /// In authenticated mode the id is bound into the envelope tag, so the
    /// envelope only opens together with this id. `metadata` is kept in the
    /// audit trail in the clear; it is not part of the envelope.
    pub fn encrypt(&self, data: &[u8], metadata: Option<Metadata>) -> (EncryptedEnvelope, DataId) {
        let data_id = DataId::generate();
        let envelope = self.envelope_keys.seal(data, data_id.as_str().as_bytes());
        debug!(
            data_id = %data_id.redacted(self.redact_len()),
            len = data.len(),
            "encrypted record"
        );
        self.ledger.record(AuditAction::Encrypt, &data_id, metadata);
        (envelope, data_id)
    }

    /// Decrypt an envelope produced by [`Vault::encrypt`].
    ///
    /// Fails with [`VaultError::Decryption`] when `data_id` is not the id the
    /// envelope was sealed with (authenticated mode). Only successful decrypts
    /// are audited.
    pub fn decrypt(
        &self,
        envelope: &EncryptedEnvelope,
        data_id: &DataId,
    ) -> VaultResult<(Vec<u8>, DecryptMetadata)> {
        let plaintext = self
            .envelope_keys
            .open(envelope, data_id.as_str().as_bytes())
            .inspect_err(|e| {
                warn!(
                    data_id = %data_id.redacted(self.redact_len()),
                    integrity = e.is_integrity_failure(),
                    error = %e,
                    "decrypt failed"
                );
            })?;

        self.ledger.record(AuditAction::Decrypt, data_id, None);
        Ok((
            plaintext,
            DecryptMetadata {
                decrypted_at: Utc::now(),
            },
        ))
    }

    /// The most recent `limit` audit events, oldest first.
    pub fn audit_trail(&self, limit: usize) -> Vec<AuditEvent> {
        self.ledger.recent(limit)
    }

    pub fn ledger(&self) -> &AuditLedger {
        &self.ledger
    }

    /// Laplace noise calibrated to the signal's own standard deviation.
    ///
    /// A local-sensitivity heuristic: useful for masking, not a formal
    /// differential-privacy guarantee.
    pub fn anonymize(&self, signal: &[f64], epsilon: f64) -> VaultResult<Vec<f64>> {
        add_noise(signal, epsilon, NoiseMechanism::Laplace, Sensitivity::Empirical)
    }

    /// Placeholder for computation over ciphertext. No scheme is implemented,
    /// so this never succeeds.
    pub fn compute_encrypted(
        &self,
        _envelope: &EncryptedEnvelope,
        op: &str,
    ) -> VaultResult<EncryptedEnvelope> {
        if KNOWN_ENCRYPTED_OPS.contains(&op) {
            Err(VaultError::Unsupported(format!(
                "computation on encrypted data ({op})"
            )))
        } else {
            Err(VaultError::InvalidParameter(format!(
                "unknown encrypted operation: {op}"
            )))
        }
    }

    /// HMAC-SHA256 tag over `data`, keyed by a subkey of the vault key.
    pub fn integrity_tag(&self, data: &[u8]) -> IntegrityTag {
        compute_integrity_tag(data, self.integrity_key.as_bytes())
    }

    /// Constant-time check of a tag from [`Vault::integrity_tag`].
    pub fn verify_integrity(&self, data: &[u8], tag: &[u8]) -> bool {
        verify_integrity_tag(data, tag, self.integrity_key.as_bytes())
    }

    /// Self-contained timestamped token (Fernet layout).
    pub fn encrypt_token(&self, data: &[u8]) -> String {
        encrypt_authenticated(&self.token_key, data)
    }

    /// Open a token from [`Vault::encrypt_token`], enforcing the configured TTL.
    pub fn decrypt_token(&self, token: &str) -> VaultResult<Vec<u8>> {
        decrypt_authenticated(&self.token_key, token, self.token_ttl)
    }

    pub fn cipher_mode(&self) -> CipherMode {
        self.envelope_keys.mode()
    }

    pub fn is_zero_knowledge(&self) -> bool {
        self.zero_knowledge
    }

    fn redact_len(&self) -> usize {
        self.ledger.redact_prefix_len()
    }
}

impl std::fmt::Debug for Vault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vault")
            .field("cipher_mode", &self.cipher_mode())
            .field("zero_knowledge", &self.zero_knowledge)
            .field("audit_events", &self.ledger.len())
            .finish_non_exhaustive()
    }
}
