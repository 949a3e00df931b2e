pub mod config;
pub mod error;
pub mod types;

pub use config::{AxonConfig, CipherMode, SecurityConfig};
pub use error::{VaultError, VaultResult};
pub use types::{AuditAction, AuditEvent, DecryptMetadata, Metadata};
