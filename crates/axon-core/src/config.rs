use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{VaultError, VaultResult};
use crate::types::{DEFAULT_REDACT_PREFIX_LEN, MAX_REDACT_PREFIX_LEN};

/// Environment variable that carries the master secret by default
pub const DEFAULT_MASTER_KEY_ENV: &str = "AXONOS_MASTER_KEY";

/// Lowest PBKDF2 iteration count the vault accepts
pub const MIN_KDF_ITERATIONS: u32 = 100_000;

/// Top-level configuration (loaded from axonvault.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AxonConfig {
    pub security: SecuritySettings,
    pub audit: AuditSettings,
    pub privacy: PrivacySettings,
    pub log: LogSettings,
}

impl AxonConfig {
    /// Load from a TOML file, falling back to defaults when the file is absent.
    pub fn load(path: &Path) -> VaultResult<Self> {
        if !path.exists() {
            tracing::warn!("config file not found: {}  (using defaults)", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
            .map_err(|e| VaultError::Configuration(format!("parsing {}: {e}", path.display())))
    }

    pub fn from_toml(content: &str) -> VaultResult<Self> {
        toml::from_str(content).map_err(|e| VaultError::Configuration(e.to_string()))
    }
}

/// Vault-level encryption mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CipherMode {
    /// AES-256-CBC + HMAC-SHA256 (encrypt-then-MAC)
    #[default]
    Authenticated,
    /// Plain AES-256-CBC with PKCS#7 padding; padding is the only integrity check
    BlockCipher,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecuritySettings {
    /// Require an operator-held master secret (default: true)
    pub zero_knowledge_mode: bool,
    /// Name of the environment variable holding the master secret
    pub master_key_env: String,
    /// PBKDF2 salt (fixed, application-wide)
    pub kdf_salt: String,
    /// PBKDF2-HMAC-SHA256 iteration count (default: 200000)
    pub kdf_iterations: u32,
    pub cipher_mode: CipherMode,
    /// Maximum age of authenticated tokens, in seconds (default: no limit)
    pub token_ttl_secs: Option<u64>,
}

impl Default for SecuritySettings {
    fn default() -> Self {
        Self {
            zero_knowledge_mode: true,
            master_key_env: DEFAULT_MASTER_KEY_ENV.into(),
            kdf_salt: "axonos_salt".into(),
            kdf_iterations: 200_000,
            cipher_mode: CipherMode::default(),
            token_ttl_secs: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditSettings {
    /// Origin label stamped on every audit event
    pub origin: String,
    /// Visible data id characters in audit records (at most 16)
    pub redact_prefix_len: usize,
}

impl Default for AuditSettings {
    fn default() -> Self {
        Self {
            origin: "localhost".into(),
            redact_prefix_len: DEFAULT_REDACT_PREFIX_LEN,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PrivacySettings {
    pub default_epsilon: f64,
    /// Used by the Gaussian mechanism only
    pub default_delta: f64,
}

impl Default for PrivacySettings {
    fn default() -> Self {
        Self {
            default_epsilon: 1.0,
            default_delta: 1e-5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// Log level (default: info)
    pub level: String,
    /// Log format: "json" or "text"
    pub format: String,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}

/// Resolved runtime security configuration for one vault instance.
///
/// Built once at startup; the master secret is never reloaded.
#[derive(Debug)]
pub struct SecurityConfig {
    pub zero_knowledge_mode: bool,
    master_secret: Option<SecretString>,
    pub kdf_salt: Vec<u8>,
    pub kdf_iterations: u32,
    pub cipher_mode: CipherMode,
    pub token_ttl_secs: Option<u64>,
    pub audit_origin: String,
    pub redact_prefix_len: usize,
}

impl SecurityConfig {
    /// Build from settings and an explicitly injected secret.
    ///
    /// An empty secret counts as absent. Zero-knowledge mode without a secret
    /// is a configuration error.
    pub fn new(
        security: &SecuritySettings,
        audit: &AuditSettings,
        master_secret: Option<SecretString>,
    ) -> VaultResult<Self> {
        let master_secret = master_secret.filter(|s| !s.expose_secret().is_empty());

        if security.zero_knowledge_mode && master_secret.is_none() {
            return Err(VaultError::Configuration(format!(
                "{} is required for zero-knowledge mode",
                security.master_key_env
            )));
        }
        if security.kdf_iterations < MIN_KDF_ITERATIONS {
            return Err(VaultError::Configuration(format!(
                "kdf_iterations must be at least {MIN_KDF_ITERATIONS} (got {})",
                security.kdf_iterations
            )));
        }
        if audit.redact_prefix_len > MAX_REDACT_PREFIX_LEN {
            return Err(VaultError::Configuration(format!(
                "redact_prefix_len must be at most {MAX_REDACT_PREFIX_LEN} (got {})",
                audit.redact_prefix_len
            )));
        }

        Ok(Self {
            zero_knowledge_mode: security.zero_knowledge_mode,
            master_secret,
            kdf_salt: security.kdf_salt.as_bytes().to_vec(),
            kdf_iterations: security.kdf_iterations,
            cipher_mode: security.cipher_mode,
            token_ttl_secs: security.token_ttl_secs,
            audit_origin: audit.origin.clone(),
            redact_prefix_len: audit.redact_prefix_len,
        })
    }

    /// Build from settings, reading the secret from `security.master_key_env`.
    pub fn from_env(security: &SecuritySettings, audit: &AuditSettings) -> VaultResult<Self> {
        let secret = std::env::var(&security.master_key_env)
            .ok()
            .map(SecretString::from);
        Self::new(security, audit, secret)
    }

    /// Zero-knowledge config with default settings and the given secret.
    pub fn with_secret(master_secret: SecretString) -> VaultResult<Self> {
        Self::new(
            &SecuritySettings::default(),
            &AuditSettings::default(),
            Some(master_secret),
        )
    }

    pub fn master_secret(&self) -> Option<&SecretString> {
        self.master_secret.as_ref()
    }
}
