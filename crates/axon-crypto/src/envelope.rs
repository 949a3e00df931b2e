//! Vault envelope: versioned ciphertext + IV (+ tag)
//!
//! Wire format (binary):
//! ```text
//! [1 byte: version = 0x01][1 byte: mode][16 bytes: IV][N bytes: AES-256-CBC ciphertext]
//! [32 bytes: HMAC-SHA256 tag]   (authenticated mode only)
//! mode: 0x01 = authenticated, 0x02 = block cipher
//! tag = HMAC(mac_key, len(ad) as u64 BE || ad || version || mode || IV || ciphertext)
//! ```
//!
//! Authenticated envelopes encrypt under an HKDF encryption subkey and MAC
//! under a separate HKDF MAC subkey (encrypt-then-MAC). The associated data
//! `ad` (the vault passes the record's data id) is covered by the tag but never
//! written to the wire, so opening with different associated data fails.
//! Block-cipher envelopes use the derived key directly, carry no tag and
//! therefore bind nothing.

use axon_core::{CipherMode, VaultError, VaultResult};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use zeroize::Zeroize;

use crate::cipher::{aes256_cbc_decrypt, aes256_cbc_encrypt, random_iv};
use crate::kdf::DerivedKey;
use crate::keys::{hkdf_derive, ENVELOPE_ENC_DOMAIN, ENVELOPE_MAC_DOMAIN};
use crate::{IV_SIZE, KEY_SIZE, TAG_SIZE};

type HmacSha256 = Hmac<Sha256>;

/// Current envelope format version
pub const ENVELOPE_VERSION: u8 = 0x01;

const MODE_AUTHENTICATED: u8 = 0x01;
const MODE_BLOCK_CIPHER: u8 = 0x02;
const HEADER_SIZE: usize = 2 + IV_SIZE;

/// Encrypted data as handed back to callers and their storage layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedEnvelope {
    pub mode: CipherMode,
    pub iv: [u8; IV_SIZE],
    pub ciphertext: Vec<u8>,
    /// Present iff `mode` is [`CipherMode::Authenticated`]
    pub tag: Option<[u8; TAG_SIZE]>,
}

impl EncryptedEnvelope {
    /// Wrap a bare `(ciphertext, iv)` pair from block-cipher mode.
    pub fn from_parts(iv: [u8; IV_SIZE], ciphertext: Vec<u8>) -> Self {
        Self {
            mode: CipherMode::BlockCipher,
            iv,
            ciphertext,
            tag: None,
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_SIZE + self.ciphertext.len() + TAG_SIZE);
        out.push(ENVELOPE_VERSION);
        out.push(mode_byte(self.mode));
        out.extend_from_slice(&self.iv);
        out.extend_from_slice(&self.ciphertext);
        if let Some(tag) = &self.tag {
            out.extend_from_slice(tag);
        }
        out
    }

    pub fn from_bytes(data: &[u8]) -> VaultResult<Self> {
        if data.len() < HEADER_SIZE {
            return Err(VaultError::Decryption(format!(
                "envelope too short: {} bytes (minimum {HEADER_SIZE})",
                data.len()
            )));
        }
        if data[0] != ENVELOPE_VERSION {
            return Err(VaultError::Decryption(format!(
                "unsupported envelope version {:#04x}",
                data[0]
            )));
        }
        let mode = match data[1] {
            MODE_AUTHENTICATED => CipherMode::Authenticated,
            MODE_BLOCK_CIPHER => CipherMode::BlockCipher,
            other => {
                return Err(VaultError::Decryption(format!("unknown envelope mode {other:#04x}")))
            }
        };

        let mut iv = [0u8; IV_SIZE];
        iv.copy_from_slice(&data[2..HEADER_SIZE]);
        let body = &data[HEADER_SIZE..];

        let (ciphertext, tag) = match mode {
            CipherMode::Authenticated => {
                if body.len() < TAG_SIZE {
                    return Err(VaultError::Decryption("envelope is missing its tag".into()));
                }
                let (ciphertext, tag_bytes) = body.split_at(body.len() - TAG_SIZE);
                let mut tag = [0u8; TAG_SIZE];
                tag.copy_from_slice(tag_bytes);
                (ciphertext.to_vec(), Some(tag))
            }
            CipherMode::BlockCipher => (body.to_vec(), None),
        };

        Ok(Self {
            mode,
            iv,
            ciphertext,
            tag,
        })
    }

    /// Bytes covered by the authentication tag
    fn authenticated_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_SIZE + self.ciphertext.len());
        out.push(ENVELOPE_VERSION);
        out.push(mode_byte(self.mode));
        out.extend_from_slice(&self.iv);
        out.extend_from_slice(&self.ciphertext);
        out
    }
}

fn mode_byte(mode: CipherMode) -> u8 {
    match mode {
        CipherMode::Authenticated => MODE_AUTHENTICATED,
        CipherMode::BlockCipher => MODE_BLOCK_CIPHER,
    }
}

/// Keys for sealing and opening envelopes, derived once per vault.
pub struct EnvelopeKeys {
    mode: CipherMode,
    block_key: [u8; KEY_SIZE],
    enc_key: [u8; KEY_SIZE],
    mac_key: [u8; KEY_SIZE],
}

impl EnvelopeKeys {
    pub fn derive(key: &DerivedKey, mode: CipherMode) -> VaultResult<Self> {
        Ok(Self {
            mode,
            block_key: *key.as_bytes(),
            enc_key: hkdf_derive(key.as_bytes(), ENVELOPE_ENC_DOMAIN)?,
            mac_key: hkdf_derive(key.as_bytes(), ENVELOPE_MAC_DOMAIN)?,
        })
    }

    pub fn mode(&self) -> CipherMode {
        self.mode
    }

    /// Encrypt under a fresh random IV. There is no way to supply an IV here.
    ///
    /// In authenticated mode `associated_data` is bound into the tag; the same
    /// bytes must be passed to [`EnvelopeKeys::open`].
    pub fn seal(&self, plaintext: &[u8], associated_data: &[u8]) -> EncryptedEnvelope {
        let iv = random_iv();
        match self.mode {
            CipherMode::Authenticated => {
                let mut envelope = EncryptedEnvelope {
                    mode: CipherMode::Authenticated,
                    iv,
                    ciphertext: aes256_cbc_encrypt(&self.enc_key, &iv, plaintext),
                    tag: None,
                };
                envelope.tag = Some(
                    self.mac(&envelope, associated_data)
                        .finalize()
                        .into_bytes()
                        .into(),
                );
                envelope
            }
            CipherMode::BlockCipher => EncryptedEnvelope::from_parts(
                iv,
                aes256_cbc_encrypt(&self.block_key, &iv, plaintext),
            ),
        }
    }

    /// Decrypt an envelope sealed with these keys.
    ///
    /// Envelopes in a different mode than the one configured are rejected, so
    /// a stripped tag cannot downgrade an authenticated envelope. In
    /// authenticated mode a different `associated_data` than was sealed fails
    /// the tag check.
    pub fn open(&self, envelope: &EncryptedEnvelope, associated_data: &[u8]) -> VaultResult<Vec<u8>> {
        self.try_open(envelope, associated_data).inspect_err(|e| {
            tracing::debug!(mode = ?envelope.mode, error = %e, "envelope rejected");
        })
    }

    fn try_open(&self, envelope: &EncryptedEnvelope, associated_data: &[u8]) -> VaultResult<Vec<u8>> {
        if envelope.mode != self.mode {
            return Err(VaultError::Decryption(format!(
                "envelope mode {:?} does not match vault mode {:?}",
                envelope.mode, self.mode
            )));
        }

        match self.mode {
            CipherMode::Authenticated => {
                let tag = envelope
                    .tag
                    .as_ref()
                    .ok_or_else(|| VaultError::Decryption("envelope is missing its tag".into()))?;
                self.mac(envelope, associated_data)
                    .verify_slice(tag)
                    .map_err(|_| {
                        VaultError::Decryption(
                            "envelope tag mismatch: wrong key, wrong data id, or tampered data".into(),
                        )
                    })?;
                aes256_cbc_decrypt(&self.enc_key, &envelope.iv, &envelope.ciphertext)
            }
            CipherMode::BlockCipher => {
                aes256_cbc_decrypt(&self.block_key, &envelope.iv, &envelope.ciphertext)
            }
        }
    }

    /// MAC state over the associated data (length-prefixed) and the envelope.
    fn mac(&self, envelope: &EncryptedEnvelope, associated_data: &[u8]) -> HmacSha256 {
        let mut mac = <HmacSha256 as Mac>::new_from_slice(&self.mac_key)
            .expect("HMAC can take key of any size");
        mac.update(&(associated_data.len() as u64).to_be_bytes());
        mac.update(associated_data);
        mac.update(&envelope.authenticated_bytes());
        mac
    }
}

impl Drop for EnvelopeKeys {
    fn drop(&mut self) {
        self.block_key.zeroize();
        self.enc_key.zeroize();
        self.mac_key.zeroize();
    }
}

impl std::fmt::Debug for EnvelopeKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvelopeKeys")
            .field("mode", &self.mode)
            .field("keys", &"[REDACTED]")
            .finish()
    }
}
