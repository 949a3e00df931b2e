//! AES-CBC block-cipher mode with PKCS#7 padding
//!
//! Ciphertext format: raw CBC output, always a non-zero multiple of 16 bytes.
//! The IV travels separately; it is required for decryption but not secret.
//!
//! CBC carries no authentication. Padding validation is the only integrity
//! check here; use [`crate::envelope`] or [`crate::token`] when tampering must
//! be detected.

use aes::{Aes128, Aes256};
use axon_core::{VaultError, VaultResult};
use cbc::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand::RngCore;

use crate::kdf::DerivedKey;
use crate::{BLOCK_SIZE, IV_SIZE};

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;
type Aes128CbcEnc = cbc::Encryptor<Aes128>;
type Aes128CbcDec = cbc::Decryptor<Aes128>;

/// Draw a fresh random IV.
pub fn random_iv() -> [u8; IV_SIZE] {
    let mut iv = [0u8; IV_SIZE];
    rand::thread_rng().fill_bytes(&mut iv);
    iv
}

/// Encrypt with AES-256-CBC.
///
/// When `iv` is `None` a fresh random IV is generated. Returns
/// `(ciphertext, iv)`.
pub fn encrypt_block_cipher(
    key: &DerivedKey,
    plaintext: &[u8],
    iv: Option<[u8; IV_SIZE]>,
) -> (Vec<u8>, [u8; IV_SIZE]) {
    let iv = iv.unwrap_or_else(random_iv);
    (aes256_cbc_encrypt(key.as_bytes(), &iv, plaintext), iv)
}

/// Decrypt AES-256-CBC output produced by [`encrypt_block_cipher`].
pub fn decrypt_block_cipher(
    key: &DerivedKey,
    ciphertext: &[u8],
    iv: &[u8; IV_SIZE],
) -> VaultResult<Vec<u8>> {
    aes256_cbc_decrypt(key.as_bytes(), iv, ciphertext)
}

pub(crate) fn aes256_cbc_encrypt(key: &[u8; 32], iv: &[u8; IV_SIZE], plaintext: &[u8]) -> Vec<u8> {
    Aes256CbcEnc::new(key.into(), iv.into()).encrypt_padded_vec_mut::<Pkcs7>(plaintext)
}

pub(crate) fn aes256_cbc_decrypt(
    key: &[u8; 32],
    iv: &[u8; IV_SIZE],
    ciphertext: &[u8],
) -> VaultResult<Vec<u8>> {
    check_block_length(ciphertext)?;
    Aes256CbcDec::new(key.into(), iv.into())
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| VaultError::Decryption("invalid padding: wrong key, wrong IV, or corrupted data".into()))
}

pub(crate) fn aes128_cbc_encrypt(key: &[u8; 16], iv: &[u8; IV_SIZE], plaintext: &[u8]) -> Vec<u8> {
    Aes128CbcEnc::new(key.into(), iv.into()).encrypt_padded_vec_mut::<Pkcs7>(plaintext)
}

pub(crate) fn aes128_cbc_decrypt(
    key: &[u8; 16],
    iv: &[u8; IV_SIZE],
    ciphertext: &[u8],
) -> VaultResult<Vec<u8>> {
    check_block_length(ciphertext)?;
    Aes128CbcDec::new(key.into(), iv.into())
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| VaultError::Decryption("invalid padding".into()))
}

fn check_block_length(ciphertext: &[u8]) -> VaultResult<()> {
    if ciphertext.is_empty() || ciphertext.len() % BLOCK_SIZE != 0 {
        return Err(VaultError::Decryption(format!(
            "ciphertext length {} is not a non-zero multiple of the block size ({BLOCK_SIZE})",
            ciphertext.len()
        )));
    }
    Ok(())
}
