//! End-to-end vault behaviour through the public API.

use std::sync::Arc;

use axon_core::config::{AuditSettings, SecuritySettings};
use axon_core::{AuditAction, SecurityConfig, VaultError};
use axon_vault::{DataId, EncryptedEnvelope, Vault};
use proptest::prelude::*;
use secrecy::SecretString;

const SECRET: &str = "correct-horse-battery-staple";

fn settings() -> SecuritySettings {
    SecuritySettings {
        kdf_iterations: 100_000,
        ..SecuritySettings::default()
    }
}

fn vault_with(secret: &str, audit: AuditSettings) -> Vault {
    let config =
        SecurityConfig::new(&settings(), &audit, Some(SecretString::from(secret))).unwrap();
    Vault::new(config).unwrap()
}

fn vault() -> Vault {
    vault_with(SECRET, AuditSettings::default())
}

#[test]
fn spike_train_roundtrip() {
    let vault = vault();
    let (envelope, id) = vault.encrypt(b"spike-train-42", None);

    assert_eq!(envelope.iv.len(), 16);
    assert_ne!(envelope.ciphertext, b"spike-train-42");

    let (plaintext, meta) = vault.decrypt(&envelope, &id).unwrap();
    assert_eq!(plaintext, b"spike-train-42");
    assert!(meta.decrypted_at <= chrono::Utc::now());
}

#[test]
fn missing_secret_in_zero_knowledge_mode_is_fatal() {
    let err = SecurityConfig::new(&settings(), &AuditSettings::default(), None).unwrap_err();
    assert!(matches!(err, VaultError::Configuration(_)));
}

#[test]
fn envelopes_survive_restart() {
    let first = vault();
    let (envelope, id) = first.encrypt(b"recorded-yesterday", None);
    let wire = envelope.to_bytes();
    drop(first);

    let second = vault();
    let envelope = EncryptedEnvelope::from_bytes(&wire).unwrap();
    let (plaintext, _) = second.decrypt(&envelope, &id).unwrap();
    assert_eq!(plaintext, b"recorded-yesterday");
}

#[test]
fn wrong_secret_cannot_decrypt() {
    let (envelope, id) = vault().encrypt(b"private", None);
    let other = vault_with("a-different-secret", AuditSettings::default());

    let err = other.decrypt(&envelope, &id).unwrap_err();
    assert!(matches!(err, VaultError::Decryption(_)));
}

#[test]
fn tampered_envelope_is_rejected() {
    let vault = vault();
    let (envelope, id) = vault.encrypt(b"0123456789abcdef0123", None);
    let wire = envelope.to_bytes();

    // Skip the version and mode bytes: those fail parsing or the mode check.
    for byte in 2..wire.len() {
        let mut tampered = wire.clone();
        tampered[byte] ^= 0x80;
        let envelope = EncryptedEnvelope::from_bytes(&tampered).unwrap();
        let err = vault.decrypt(&envelope, &id).unwrap_err();
        assert!(matches!(err, VaultError::Decryption(_)), "byte {byte}");
    }
}

#[test]
fn envelope_presented_under_another_id_is_rejected() {
    let vault = vault();
    let (envelope_a, id_a) = vault.encrypt(b"record-A", None);
    let (envelope_b, id_b) = vault.encrypt(b"record-B", None);

    let err = vault.decrypt(&envelope_a, &id_b).unwrap_err();
    assert!(matches!(err, VaultError::Decryption(_)));
    let err = vault.decrypt(&envelope_b, &id_a).unwrap_err();
    assert!(matches!(err, VaultError::Decryption(_)));

    // Neither failed attempt reached the ledger.
    let trail = vault.audit_trail(usize::MAX);
    assert_eq!(trail.len(), 2);
    assert!(trail.iter().all(|e| e.action == AuditAction::Encrypt));

    // Binding survives the wire format and a restart.
    let restored = EncryptedEnvelope::from_bytes(&envelope_a.to_bytes()).unwrap();
    let second = vault_with(SECRET, AuditSettings::default());
    assert!(second.decrypt(&restored, &id_b).is_err());
    assert_eq!(second.decrypt(&restored, &id_a).unwrap().0, b"record-A");
}

#[test]
fn oversized_redaction_prefix_is_a_configuration_error() {
    let audit = AuditSettings {
        redact_prefix_len: 64,
        ..AuditSettings::default()
    };
    let err = SecurityConfig::new(&settings(), &audit, Some(SecretString::from(SECRET)))
        .unwrap_err();
    assert!(matches!(err, VaultError::Configuration(_)));
}

#[test]
fn audit_trail_is_complete_and_redacted() {
    let vault = vault();
    let mut expected = Vec::new();

    for i in 0..5u8 {
        let (envelope, id) = vault.encrypt(&[i; 40], Some(serde_json::json!({ "seq": i })));
        expected.push((AuditAction::Encrypt, id.clone()));
        vault.decrypt(&envelope, &id).unwrap();
        expected.push((AuditAction::Decrypt, id));
    }

    let trail = vault.audit_trail(expected.len());
    assert_eq!(trail.len(), expected.len());
    for (event, (action, id)) in trail.iter().zip(&expected) {
        assert_eq!(event.action, *action);
        let prefix = event.data_id.strip_suffix("...").unwrap();
        assert!(prefix.len() < id.as_str().len());
        assert!(id.as_str().starts_with(prefix));
        assert_eq!(event.origin, "localhost");
    }
    assert_eq!(trail[0].metadata, Some(serde_json::json!({ "seq": 0 })));
    assert_eq!(trail[1].metadata, None);
    assert!(trail.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
}

#[test]
fn audit_origin_and_prefix_are_configurable() {
    let vault = vault_with(
        SECRET,
        AuditSettings {
            origin: "rig-7".into(),
            redact_prefix_len: 4,
        },
    );
    let (_, id) = vault.encrypt(b"x", None);

    let event = &vault.audit_trail(1)[0];
    assert_eq!(event.origin, "rig-7");
    assert_eq!(event.data_id, format!("{}...", &id.as_str()[..4]));
}

#[test]
fn concurrent_callers_share_one_vault() {
    let vault = Arc::new(vault());
    let handles: Vec<_> = (0..4)
        .map(|t| {
            let vault = Arc::clone(&vault);
            std::thread::spawn(move || {
                for i in 0..25u8 {
                    let data = [t, i];
                    let (envelope, id) = vault.encrypt(&data, None);
                    assert_eq!(vault.decrypt(&envelope, &id).unwrap().0, data);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(vault.ledger().len(), 200);
}

#[test]
fn data_ids_round_trip_through_strings() {
    let vault = vault();
    let (envelope, id) = vault.encrypt(b"by-id", None);
    let parsed: DataId = id.to_string().parse().unwrap();
    assert_eq!(vault.decrypt(&envelope, &parsed).unwrap().0, b"by-id");
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn roundtrip_any_payload(data in proptest::collection::vec(any::<u8>(), 0..512)) {
        let vault = shared_vault();
        let (envelope, id) = vault.encrypt(&data, None);
        let (plaintext, _) = vault.decrypt(&envelope, &id).unwrap();
        prop_assert_eq!(plaintext, data);
    }
}

fn shared_vault() -> &'static Vault {
    static VAULT: std::sync::OnceLock<Vault> = std::sync::OnceLock::new();
    VAULT.get_or_init(vault)
}
