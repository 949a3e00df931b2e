//! Authenticated tokens (Fernet-compatible)
//!
//! Token format (binary, then URL-safe base64 with padding):
//! ```text
//! [1 byte: version 0x80][8 bytes: timestamp, u64 BE][16 bytes: IV]
//! [N bytes: AES-128-CBC ciphertext, PKCS#7][32 bytes: HMAC-SHA256]
//! HMAC covers everything before it.
//! ```
//!
//! The 32-byte key is split the way Fernet splits its key: the first half
//! signs, the second half encrypts. A token produced here decrypts with any
//! Fernet implementation given `urlsafe_b64encode(key)`. The vault passes its
//! HKDF token subkey, never the raw derived key.

use axon_core::{VaultError, VaultResult};
use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::time::Duration;

use crate::cipher::{aes128_cbc_decrypt, aes128_cbc_encrypt, random_iv};
use crate::kdf::DerivedKey;
use crate::{BLOCK_SIZE, IV_SIZE, TAG_SIZE};

type HmacSha256 = Hmac<Sha256>;

const VERSION: u8 = 0x80;
const TIMESTAMP_SIZE: usize = 8;
const HEADER_SIZE: usize = 1 + TIMESTAMP_SIZE + IV_SIZE;

/// Tokens stamped further than this into the future are rejected.
pub const MAX_CLOCK_SKEW_SECS: u64 = 60;

/// Encrypt into a self-contained authenticated token.
pub fn encrypt_authenticated(key: &DerivedKey, plaintext: &[u8]) -> String {
    encrypt_at_time(key, plaintext, now_unix(), random_iv())
}

/// Decrypt a token, optionally rejecting tokens older than `ttl`.
///
/// Every failure (bad encoding, wrong version, tag mismatch, expiry) is an
/// [`VaultError::Authentication`]; no partial plaintext is ever returned.
pub fn decrypt_authenticated(
    key: &DerivedKey,
    token: &str,
    ttl: Option<Duration>,
) -> VaultResult<Vec<u8>> {
    decrypt_at_time(key, token, ttl, now_unix())
}

/// Encrypt with an explicit timestamp and IV. Callers outside this crate go
/// through [`encrypt_authenticated`], which always draws a fresh IV.
pub(crate) fn encrypt_at_time(
    key: &DerivedKey,
    plaintext: &[u8],
    timestamp: u64,
    iv: [u8; IV_SIZE],
) -> String {
    let (signing_key, encryption_key) = split_key(key);
    let ciphertext = aes128_cbc_encrypt(&encryption_key, &iv, plaintext);

    let mut token = Vec::with_capacity(HEADER_SIZE + ciphertext.len() + TAG_SIZE);
    token.push(VERSION);
    token.extend_from_slice(&timestamp.to_be_bytes());
    token.extend_from_slice(&iv);
    token.extend_from_slice(&ciphertext);

    let tag = hmac_tag(&signing_key, &token);
    token.extend_from_slice(&tag);

    URL_SAFE.encode(token)
}

pub(crate) fn decrypt_at_time(
    key: &DerivedKey,
    token: &str,
    ttl: Option<Duration>,
    current_time: u64,
) -> VaultResult<Vec<u8>> {
    decode_and_open(key, token, ttl, current_time).inspect_err(|e| {
        tracing::debug!(error = %e, "token rejected");
    })
}

fn decode_and_open(
    key: &DerivedKey,
    token: &str,
    ttl: Option<Duration>,
    current_time: u64,
) -> VaultResult<Vec<u8>> {
    let data = URL_SAFE
        .decode(token.trim())
        .map_err(|_| auth_error("token is not valid URL-safe base64"))?;

    if data.len() < HEADER_SIZE + BLOCK_SIZE + TAG_SIZE
        || (data.len() - HEADER_SIZE - TAG_SIZE) % BLOCK_SIZE != 0
    {
        return Err(auth_error("token has an invalid length"));
    }
    if data[0] != VERSION {
        return Err(auth_error("unknown token version"));
    }

    let (signing_key, encryption_key) = split_key(key);
    let (signed, tag) = data.split_at(data.len() - TAG_SIZE);

    let mut mac = <HmacSha256 as Mac>::new_from_slice(&signing_key)
        .expect("HMAC can take key of any size");
    mac.update(signed);
    mac.verify_slice(tag)
        .map_err(|_| auth_error("token signature mismatch"))?;

    let mut ts_bytes = [0u8; TIMESTAMP_SIZE];
    ts_bytes.copy_from_slice(&signed[1..1 + TIMESTAMP_SIZE]);
    let timestamp = u64::from_be_bytes(ts_bytes);

    if let Some(ttl) = ttl {
        if timestamp.saturating_add(ttl.as_secs()) < current_time {
            return Err(auth_error("token has expired"));
        }
    }
    if current_time.saturating_add(MAX_CLOCK_SKEW_SECS) < timestamp {
        return Err(auth_error("token timestamp is in the future"));
    }

    let mut iv = [0u8; IV_SIZE];
    iv.copy_from_slice(&signed[1 + TIMESTAMP_SIZE..HEADER_SIZE]);

    aes128_cbc_decrypt(&encryption_key, &iv, &signed[HEADER_SIZE..])
        .map_err(|_| auth_error("token payload failed to decrypt"))
}

/// Fernet key split: (signing key, encryption key)
fn split_key(key: &DerivedKey) -> ([u8; 16], [u8; 16]) {
    let bytes = key.as_bytes();
    let mut signing = [0u8; 16];
    let mut encryption = [0u8; 16];
    signing.copy_from_slice(&bytes[..16]);
    encryption.copy_from_slice(&bytes[16..]);
    (signing, encryption)
}

fn hmac_tag(key: &[u8], data: &[u8]) -> [u8; TAG_SIZE] {
    let mut mac = <HmacSha256 as Mac>::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(data);
    mac.finalize().into_bytes().into()
}

fn now_unix() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp()).unwrap_or(0)
}

fn auth_error(msg: &str) -> VaultError {
    VaultError::Authentication(msg.into())
}
