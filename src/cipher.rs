//! Verify-then-decrypt for the legacy cookie envelope.
//!
//! The legacy encoder produces `E(iv || payload) || HMAC(E(iv || payload))`
//! where `E` is AES-CBC with PKCS#7 padding and `iv` is `iv_length` random
//! bytes. The MAC is checked before anything else touches the ciphertext.

use aes::cipher::block_padding::Pkcs7;
use aes::cipher::{BlockDecryptMut, KeyIvInit};
use hmac::{Hmac, Mac};
use sha1::Sha1;
use thiserror::Error;

use crate::keys::{DecryptionAlgorithm, KeyMaterial, ValidationAlgorithm};
use crate::util::constant_time_eq;

type HmacSha1 = Hmac<Sha1>;
type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;
type Aes192CbcDec = cbc::Decryptor<aes::Aes192>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

const AES_BLOCK_SIZE: usize = 16;

/// Why a buffer could not be opened. Collapsed to "no identity" by callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum OpenError {
    #[error("buffer too short to hold a digest")]
    TooShort,

    #[error("digest mismatch")]
    AuthenticationFailed,

    #[error("malformed ciphertext")]
    MalformedCiphertext,
}

/// Opens authenticated, encrypted buffers with a fixed set of keys.
///
/// Holds no mutable state. Every call builds its own MAC and cipher
/// instances, so one value can be shared across threads.
#[derive(Debug, Clone)]
pub struct AuthenticatedCipher {
    keys: KeyMaterial,
}

impl AuthenticatedCipher {
    pub fn new(keys: KeyMaterial) -> Self {
        AuthenticatedCipher { keys }
    }

    pub fn keys(&self) -> &KeyMaterial {
        &self.keys
    }

    /// Verifies the trailing digest, decrypts, and strips the random prefix.
    pub fn open(&self, buffer: &[u8]) -> Result<Vec<u8>, OpenError> {
        let ciphertext = self.strip_digest(buffer)?;
        let padded = self.decrypt(ciphertext)?;

        let iv_length = self.keys.iv_length();
        if padded.len() < iv_length {
            return Err(OpenError::MalformedCiphertext);
        }
        Ok(padded[iv_length..].to_vec())
    }

    /// Checks that `buffer` ends with the keyed hash of everything before it
    /// and returns that leading part.
    pub fn strip_digest<'a>(&self, buffer: &'a [u8]) -> Result<&'a [u8], OpenError> {
        let digest_size = self.keys.digest_size();
        if buffer.len() <= digest_size {
            return Err(OpenError::TooShort);
        }

        let (data, mac) = buffer.split_at(buffer.len() - digest_size);
        let computed = self.digest(data)?;
        if !constant_time_eq(&computed, mac) {
            return Err(OpenError::AuthenticationFailed);
        }
        Ok(data)
    }

    /// Keyed hash of `data` under the validation key.
    pub fn digest(&self, data: &[u8]) -> Result<Vec<u8>, OpenError> {
        match self.keys.validation_algorithm() {
            ValidationAlgorithm::HmacSha1 => {
                let mut mac = HmacSha1::new_from_slice(self.keys.validation_key())
                    .map_err(|_| OpenError::AuthenticationFailed)?;
                mac.update(data);
                Ok(mac.finalize().into_bytes().to_vec())
            }
        }
    }

    // The first plaintext block only depends on the chaining IV, and that
    // block is random filler stripped by `open`, so a zero IV is sufficient.
    fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>, OpenError> {
        if ciphertext.is_empty() || ciphertext.len() % AES_BLOCK_SIZE != 0 {
            return Err(OpenError::MalformedCiphertext);
        }

        let key = self.keys.decryption_key();
        let iv = [0u8; AES_BLOCK_SIZE];
        let result = match (self.keys.decryption_algorithm(), key.len()) {
            (DecryptionAlgorithm::Aes, 16) => Aes128CbcDec::new_from_slices(key, &iv)
                .map_err(|_| OpenError::MalformedCiphertext)?
                .decrypt_padded_vec_mut::<Pkcs7>(ciphertext),
            (DecryptionAlgorithm::Aes, 24) => Aes192CbcDec::new_from_slices(key, &iv)
                .map_err(|_| OpenError::MalformedCiphertext)?
                .decrypt_padded_vec_mut::<Pkcs7>(ciphertext),
            (DecryptionAlgorithm::Aes, 32) => Aes256CbcDec::new_from_slices(key, &iv)
                .map_err(|_| OpenError::MalformedCiphertext)?
                .decrypt_padded_vec_mut::<Pkcs7>(ciphertext),
            _ => return Err(OpenError::MalformedCiphertext),
        };
        result.map_err(|_| OpenError::MalformedCiphertext)
    }
}
