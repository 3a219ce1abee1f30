//! Credential field encryption.
//!
//! Secret columns hold ciphertext and legacy plaintext side by side in the
//! same column; there is no format marker. A value is treated as ciphertext
//! iff it is a hex string of at least [`MIN_CIPHERTEXT_LEN`] characters.
//! Known limitation: an operator-supplied plaintext secret that happens to
//! be 32+ hex characters is mis-classified as already encrypted and stored
//! verbatim.

use aes_gcm::{aead::Aead, Aes256Gcm, Key, KeyInit, Nonce};
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::error::{AppError, Result};

/// Minimum length of a stored value that can be classified as ciphertext
pub const MIN_CIPHERTEXT_LEN: usize = 32;

const NONCE_LEN: usize = 12;

/// Structural ciphertext check: non-empty, all hex, length >= 32.
pub fn is_ciphertext(value: &str) -> bool {
    value.len() >= MIN_CIPHERTEXT_LEN && value.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Encrypts and decrypts a named subset of string fields with AES-256-GCM.
/// Ciphertext layout: hex(nonce || ciphertext || tag).
#[derive(Clone)]
pub struct FieldCipher {
    cipher: Aes256Gcm,
}

impl FieldCipher {
    /// Derive the AES key from the configured secret.
    pub fn new(secret: &str) -> Self {
        let key = Sha256::digest(secret.as_bytes());
        Self {
            cipher: Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key)),
        }
    }

    /// Encrypt a single value. Empty and already-encrypted values are
    /// returned unchanged, so encrypting twice is a no-op.
    pub fn encrypt_value(&self, value: &str) -> Result<String> {
        if value.is_empty() || is_ciphertext(value) {
            return Ok(value.to_string());
        }

        let mut nonce_bytes = [0u8; NONCE_LEN];
        rand::rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(nonce, value.as_bytes())
            .map_err(|_| AppError::Internal("Field encryption failed".to_string()))?;

        let mut out = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        out.extend_from_slice(&nonce_bytes);
        out.extend_from_slice(&ciphertext);
        Ok(hex::encode(out))
    }

    /// Decrypt a single stored value. Values that do not look like
    /// ciphertext are legacy plaintext and pass through unchanged.
    pub fn decrypt_value(&self, stored: &str) -> Result<String> {
        if !is_ciphertext(stored) {
            return Ok(stored.to_string());
        }

        let bytes = hex::decode(stored)
            .map_err(|e| AppError::Decrypt(format!("invalid hex ciphertext: {}", e)))?;
        if bytes.len() <= NONCE_LEN {
            return Err(AppError::Decrypt("ciphertext too short".to_string()));
        }

        let (nonce_bytes, ciphertext) = bytes.split_at(NONCE_LEN);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|_| AppError::Decrypt("authentication failed".to_string()))?;

        String::from_utf8(plaintext)
            .map_err(|_| AppError::Decrypt("plaintext is not valid UTF-8".to_string()))
    }

    /// Encrypt every non-empty, not-yet-encrypted field in place.
    pub fn encrypt_fields<'a, I>(&self, fields: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a mut String>,
    {
        for field in fields {
            *field = self.encrypt_value(field)?;
        }
        Ok(())
    }

    /// Decrypt fields in place. A failure on one field logs a warning and
    /// leaves that field as stored; it never aborts the record. Secrets are
    /// not silently dropped, and a decrypt error never becomes a fatal read.
    pub fn decrypt_fields_lossy<'a, I>(&self, fields: I)
    where
        I: IntoIterator<Item = &'a mut String>,
    {
        for field in fields {
            match self.decrypt_value(field) {
                Ok(plaintext) => *field = plaintext,
                Err(e) => {
                    tracing::warn!("Returning stored value for undecryptable field: {}", e);
                }
            }
        }
    }
}
