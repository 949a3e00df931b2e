//! Ephemeral session parameters for transport collaborators

use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine;
use chrono::{DateTime, Utc};
use rand::RngCore;
use serde::Serialize;
use zeroize::Zeroize;

use crate::{IV_SIZE, KEY_SIZE};

/// Fresh key material for one device/transport session.
///
/// The vault only mints these; framing and handshake belong to the transport.
#[derive(Clone, Serialize)]
pub struct SessionParams {
    /// 256-bit random key, URL-safe base64 (no padding)
    pub session_key: String,
    /// 128-bit random IV, standard base64
    pub session_iv: String,
    pub created_at: DateTime<Utc>,
}

impl SessionParams {
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let mut key = [0u8; KEY_SIZE];
        let mut iv = [0u8; IV_SIZE];
        rng.fill_bytes(&mut key);
        rng.fill_bytes(&mut iv);

        let session_key = URL_SAFE_NO_PAD.encode(key);
        key.zeroize();

        Self {
            session_key,
            session_iv: STANDARD.encode(iv),
            created_at: Utc::now(),
        }
    }
}

impl Drop for SessionParams {
    fn drop(&mut self) {
        self.session_key.zeroize();
    }
}

impl std::fmt::Debug for SessionParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionParams")
            .field("session_key", &"[REDACTED]")
            .field("session_iv", &self.session_iv)
            .field("created_at", &self.created_at)
            .finish()
    }
}
