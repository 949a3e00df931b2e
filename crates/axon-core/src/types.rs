use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque caller-supplied metadata attached to an operation.
///
/// Carried in the audit trail only; never encrypted, never inspected.
pub type Metadata = serde_json::Value;

/// Marker appended to a truncated data id.
pub const REDACTION_MARKER: &str = "...";

/// Default number of data id characters kept visible in audit records.
pub const DEFAULT_REDACT_PREFIX_LEN: usize = 8;

/// Upper bound on visible data id characters; ids are 43 characters long.
pub const MAX_REDACT_PREFIX_LEN: usize = 16;

/// Vault operation recorded in the audit trail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    Encrypt,
    Decrypt,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Encrypt => "ENCRYPT",
            AuditAction::Decrypt => "DECRYPT",
        }
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One immutable audit record.
///
/// The serialized shape is stable: `timestamp` (RFC 3339), `action`,
/// `data_id` (redacted), `metadata`, `origin`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub timestamp: DateTime<Utc>,
    pub action: AuditAction,
    /// Truncated id, e.g. `"Zk3v9QaB..."`. Never the full id.
    pub data_id: String,
    pub metadata: Option<Metadata>,
    pub origin: String,
}

/// Returned alongside plaintext by a successful decrypt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecryptMetadata {
    pub decrypted_at: DateTime<Utc>,
}

/// Redact a data id down to its first `prefix_len` characters plus a marker.
///
/// Ids no longer than `prefix_len` are still cut short by one character so
/// that the redacted form is always a strict prefix of the original.
pub fn redact_id(id: &str, prefix_len: usize) -> String {
    let total = id.chars().count();
    let keep = if total > prefix_len {
        prefix_len
    } else {
        total.saturating_sub(1)
    };
    let mut redacted: String = id.chars().take(keep).collect();
    redacted.push_str(REDACTION_MARKER);
    redacted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact_keeps_prefix() {
        let id = "Zk3v9QaBcDeFgHiJkLmNoPqRsTuVwXyZ0123456789a";
        assert_eq!(redact_id(id, 8), "Zk3v9QaB...");
    }

    #[test]
    fn test_redact_short_id_never_reveals_whole_id() {
        assert_eq!(redact_id("abcd", 8), "abc...");
        assert_eq!(redact_id("", 8), "...");
    }

    #[test]
    fn test_action_serializes_uppercase() {
        let json = serde_json::to_string(&AuditAction::Encrypt).unwrap();
        assert_eq!(json, "\"ENCRYPT\"");
        let back: AuditAction = serde_json::from_str("\"DECRYPT\"").unwrap();
        assert_eq!(back, AuditAction::Decrypt);
    }

    #[test]
    fn test_event_shape() {
        let event = AuditEvent {
            timestamp: Utc::now(),
            action: AuditAction::Decrypt,
            data_id: "abcdefgh...".into(),
            metadata: None,
            origin: "localhost".into(),
        };
        let value = serde_json::to_value(&event).unwrap();
        let obj = value.as_object().unwrap();

        assert!(obj["timestamp"].is_string());
        assert_eq!(obj["action"], "DECRYPT");
        assert_eq!(obj["data_id"], "abcdefgh...");
        assert!(obj["metadata"].is_null());
        assert_eq!(obj["origin"], "localhost");
    }
}
