//! Opaque data identifiers

use axon_core::types::redact_id;
use axon_core::{VaultError, VaultResult};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Random bytes behind each id
pub const DATA_ID_BYTES: usize = 32;

/// Identifies one encrypted record: 256 random bits, URL-safe base64 (43 chars).
///
/// `Debug` prints the redacted form so ids do not leak into logs by accident;
/// `Display` prints the full id for handing back to the caller.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DataId(String);

impl DataId {
    pub fn generate() -> Self {
        let mut bytes = [0u8; DATA_ID_BYTES];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(URL_SAFE_NO_PAD.encode(bytes))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First `prefix_len` characters followed by `"..."`
    pub fn redacted(&self, prefix_len: usize) -> String {
        redact_id(&self.0, prefix_len)
    }
}

impl FromStr for DataId {
    type Err = VaultError;

    fn from_str(s: &str) -> VaultResult<Self> {
        let s = s.trim();
        match URL_SAFE_NO_PAD.decode(s) {
            Ok(bytes) if bytes.len() == DATA_ID_BYTES => Ok(Self(s.to_string())),
            _ => Err(VaultError::InvalidParameter(
                "data id must be 32 bytes of URL-safe base64".into(),
            )),
        }
    }
}

impl fmt::Display for DataId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for DataId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DataId")
            .field(&self.redacted(axon_core::types::DEFAULT_REDACT_PREFIX_LEN))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generate_shape() {
        let id = DataId::generate();
        assert_eq!(id.as_str().len(), 43);
        assert!(id
            .as_str()
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn test_ids_are_unique() {
        let ids: HashSet<_> = (0..1000).map(|_| DataId::generate()).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn test_parse_roundtrip() {
        let id = DataId::generate();
        let parsed: DataId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("".parse::<DataId>().is_err());
        assert!("short".parse::<DataId>().is_err());
        assert!("not/valid+base64==".parse::<DataId>().is_err());
    }

    #[test]
    fn test_redacted_and_debug() {
        let id = DataId::generate();
        let redacted = id.redacted(8);
        assert_eq!(redacted.len(), 11);
        assert!(id.as_str().starts_with(&redacted[..8]));

        let debug = format!("{id:?}");
        assert!(!debug.contains(id.as_str()));
        assert!(debug.contains(&redacted));
    }
}
