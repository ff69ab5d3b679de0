//! Shared secrets for the legacy cookie scheme.
//!
//! The legacy platform encrypts session tickets with AES in CBC mode and
//! signs the ciphertext with HMAC-SHA1. Both secrets are supplied once at
//! startup and never change afterwards.

use std::fmt;

use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::config::ConfigurationError;
use crate::util::hex_to_bytes;

/// Bytes produced by the supported keyed hash (HMAC-SHA1).
pub const SHA1_DIGEST_SIZE: usize = 20;

/// Block cipher used to encrypt the ticket payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecryptionAlgorithm {
    Aes,
}

impl DecryptionAlgorithm {
    /// Parses the configuration identifier. Only `AES` is recognised.
    pub fn from_id(id: &str) -> Result<Self, ConfigurationError> {
        match id {
            "AES" => Ok(DecryptionAlgorithm::Aes),
            other => Err(ConfigurationError::UnsupportedAlgorithm(other.to_string())),
        }
    }

    fn check_key_len(self, len: usize) -> Result<(), ConfigurationError> {
        match (self, len) {
            (DecryptionAlgorithm::Aes, 16) | (DecryptionAlgorithm::Aes, 24) | (DecryptionAlgorithm::Aes, 32) => Ok(()),
            (DecryptionAlgorithm::Aes, actual) => Err(ConfigurationError::InvalidKeyLength {
                expected: "16, 24 or 32",
                actual,
            }),
        }
    }
}

/// Keyed hash used to authenticate the ciphertext.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationAlgorithm {
    HmacSha1,
}

impl ValidationAlgorithm {
    /// Parses the configuration identifier. Only `SHA1` is recognised.
    pub fn from_id(id: &str) -> Result<Self, ConfigurationError> {
        match id {
            "SHA1" => Ok(ValidationAlgorithm::HmacSha1),
            other => Err(ConfigurationError::UnsupportedAlgorithm(other.to_string())),
        }
    }

    pub fn digest_size(self) -> usize {
        match self {
            ValidationAlgorithm::HmacSha1 => SHA1_DIGEST_SIZE,
        }
    }
}

/// The decryption and validation secrets plus the parameters derived from them.
///
/// `digest_size` and `iv_length` are computed at construction and cannot be
/// set independently. Both keys are wiped from memory on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct KeyMaterial {
    decryption_key: Vec<u8>,
    validation_key: Vec<u8>,
    #[zeroize(skip)]
    decryption: DecryptionAlgorithm,
    #[zeroize(skip)]
    validation: ValidationAlgorithm,
    #[zeroize(skip)]
    digest_size: usize,
    #[zeroize(skip)]
    iv_length: usize,
}

impl KeyMaterial {
    /// Builds key material from raw key bytes.
    pub fn new(
        decryption_alg: &str,
        decryption_key: &[u8],
        validation_alg: &str,
        validation_key: &[u8],
    ) -> Result<Self, ConfigurationError> {
        let validation = ValidationAlgorithm::from_id(validation_alg)?;
        let decryption = DecryptionAlgorithm::from_id(decryption_alg)?;
        decryption.check_key_len(decryption_key.len())?;

        let key_bits = decryption_key.len() * 8;
        Ok(KeyMaterial {
            decryption_key: decryption_key.to_vec(),
            validation_key: validation_key.to_vec(),
            decryption,
            validation,
            digest_size: validation.digest_size(),
            iv_length: roundup_bits_to_bytes(key_bits),
        })
    }

    /// Builds key material from hex key text, as found in configuration.
    pub fn from_hex(
        decryption_alg: &str,
        decryption_key: &str,
        validation_alg: &str,
        validation_key: &str,
    ) -> Result<Self, ConfigurationError> {
        let mut decryption_bytes = hex_to_bytes(decryption_key)?;
        let mut validation_bytes = hex_to_bytes(validation_key)?;
        let keys = Self::new(decryption_alg, &decryption_bytes, validation_alg, &validation_bytes);
        decryption_bytes.zeroize();
        validation_bytes.zeroize();
        keys
    }

    pub fn decryption_key(&self) -> &[u8] {
        &self.decryption_key
    }

    pub fn validation_key(&self) -> &[u8] {
        &self.validation_key
    }

    pub fn decryption_algorithm(&self) -> DecryptionAlgorithm {
        self.decryption
    }

    pub fn validation_algorithm(&self) -> ValidationAlgorithm {
        self.validation
    }

    /// Length of the trailing keyed-hash digest in bytes.
    pub fn digest_size(&self) -> usize {
        self.digest_size
    }

    /// Number of random leading plaintext bytes written by the legacy encoder.
    pub fn iv_length(&self) -> usize {
        self.iv_length
    }
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("decryption", &self.decryption)
            .field("decryption_key", &"<redacted>")
            .field("validation", &self.validation)
            .field("validation_key", &"<redacted>")
            .field("digest_size", &self.digest_size)
            .field("iv_length", &self.iv_length)
            .finish()
    }
}

fn roundup_bits_to_bytes(bits: usize) -> usize {
    bits / 8 + if bits % 8 != 0 { 1 } else { 0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DKEY: &str = "000102030405060708090a0b0c0d0e0f";
    const VKEY: &str = "a0a1a2a3a4a5a6a7a8a9aaabacadaeafb0b1b2b3b4b5b6b7b8b9babbbcbdbebf";

    #[test]
    fn derives_parameters_from_key_size() {
        let keys = KeyMaterial::from_hex("AES", DKEY, "SHA1", VKEY).unwrap();
        assert_eq!(keys.digest_size(), 20);
        assert_eq!(keys.iv_length(), 16);
        assert_eq!(keys.decryption_key().len(), 16);
        assert_eq!(keys.validation_key().len(), 32);

        let keys = KeyMaterial::new("AES", &[7u8; 32], "SHA1", b"k").unwrap();
        assert_eq!(keys.iv_length(), 32);

        let keys = KeyMaterial::new("AES", &[7u8; 24], "SHA1", b"k").unwrap();
        assert_eq!(keys.iv_length(), 24);
    }

    #[test]
    fn rounds_partial_bytes_up() {
        assert_eq!(roundup_bits_to_bytes(128), 16);
        assert_eq!(roundup_bits_to_bytes(129), 17);
        assert_eq!(roundup_bits_to_bytes(7), 1);
        assert_eq!(roundup_bits_to_bytes(0), 0);
    }

    #[test]
    fn unsupported_algorithms_are_rejected() {
        assert!(matches!(
            KeyMaterial::from_hex("3DES", DKEY, "SHA1", VKEY),
            Err(ConfigurationError::UnsupportedAlgorithm(ref id)) if id == "3DES"
        ));
        assert!(matches!(
            KeyMaterial::from_hex("AES", DKEY, "HMACSHA256", VKEY),
            Err(ConfigurationError::UnsupportedAlgorithm(_))
        ));
        // identifiers are matched exactly
        assert!(KeyMaterial::from_hex("aes", DKEY, "SHA1", VKEY).is_err());
    }

    #[test]
    fn malformed_hex_is_rejected() {
        assert!(matches!(
            KeyMaterial::from_hex("AES", "0011223", "SHA1", VKEY),
            Err(ConfigurationError::InvalidKeyEncoding)
        ));
        assert!(matches!(
            KeyMaterial::from_hex("AES", DKEY, "SHA1", "not-hex!"),
            Err(ConfigurationError::InvalidKeyEncoding)
        ));
    }

    #[test]
    fn wrong_cipher_key_length_is_rejected() {
        assert!(matches!(
            KeyMaterial::new("AES", &[0u8; 15], "SHA1", b"k"),
            Err(ConfigurationError::InvalidKeyLength { actual: 15, .. })
        ));
    }

    #[test]
    fn debug_output_hides_secrets() {
        let keys = KeyMaterial::from_hex("AES", DKEY, "SHA1", VKEY).unwrap();
        let text = format!("{:?}", keys);
        assert!(text.contains("<redacted>"));
        assert!(!text.contains("0a0b"));
        assert!(!text.contains("[0, 1, 2"));
    }
}
