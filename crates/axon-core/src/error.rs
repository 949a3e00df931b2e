use thiserror::Error;

pub type VaultResult<T> = Result<T, VaultError>;

#[derive(Debug, Error)]
pub enum VaultError {
    /// Missing or invalid secret/config at startup. Fatal, never retried.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Malformed ciphertext, bad padding, or a failed envelope tag.
    #[error("decryption error: {0}")]
    Decryption(String),

    /// Bad privacy-budget or operation parameters; fatal to that call only.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Token tag mismatch or expiry. Treated like a hard decryption failure.
    #[error("authentication error: {0}")]
    Authentication(String),

    #[error("unsupported operation: {0}")]
    Unsupported(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl VaultError {
    /// True for the error kinds that mean "this ciphertext must not be trusted".
    pub fn is_integrity_failure(&self) -> bool {
        matches!(self, VaultError::Decryption(_) | VaultError::Authentication(_))
    }
}
