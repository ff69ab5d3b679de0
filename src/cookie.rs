//! Turns a session cookie value into the user name it vouches for.

use crate::cipher::{AuthenticatedCipher, OpenError};
use crate::config::{ConfigurationError, Settings};
use crate::keys::KeyMaterial;
use crate::ticket::{self, Ticket};
use crate::util::constant_time_eq;

/// Resolves hex-encoded legacy session cookies.
///
/// Every failure, whether bad hex, a wrong key, tampering or a malformed
/// ticket, comes back as `None`. Callers cannot tell them apart.
#[derive(Debug, Clone)]
pub struct TicketResolver {
    cipher: AuthenticatedCipher,
    inner_digest: bool,
}

/// Internal reasons a cookie was rejected.
#[allow(dead_code)]
#[derive(Debug, PartialEq, Eq)]
enum Rejection {
    Empty,
    Encoding,
    Open(OpenError),
    InnerDigest,
    Decode(ticket::DecodeError),
}

impl TicketResolver {
    pub fn new(keys: KeyMaterial) -> Self {
        TicketResolver {
            cipher: AuthenticatedCipher::new(keys),
            inner_digest: false,
        }
    }

    /// Builds a resolver from startup settings.
    pub fn from_settings(settings: &Settings) -> Result<Self, ConfigurationError> {
        Ok(TicketResolver::new(settings.key_material()?).with_inner_digest(settings.inner_digest))
    }

    /// Expect a second keyed-hash digest at the end of the decrypted payload.
    pub fn with_inner_digest(mut self, enabled: bool) -> Self {
        self.inner_digest = enabled;
        self
    }

    pub fn resolve_user_name(&self, cookie_hex: &str) -> Option<String> {
        self.resolve_ticket(cookie_hex).map(|ticket| ticket.name)
    }

    /// Resolves the full ticket rather than only the name.
    pub fn resolve_ticket(&self, cookie_hex: &str) -> Option<Ticket> {
        match self.try_resolve(cookie_hex) {
            Ok(ticket) => Some(ticket),
            Err(Rejection::Empty) => None,
            Err(_) => {
                log::debug!("Rejected session cookie");
                None
            }
        }
    }

    fn try_resolve(&self, cookie_hex: &str) -> Result<Ticket, Rejection> {
        if cookie_hex.is_empty() {
            return Err(Rejection::Empty);
        }
        let buffer = hex::decode(cookie_hex).map_err(|_| Rejection::Encoding)?;
        let payload = self.cipher.open(&buffer).map_err(Rejection::Open)?;

        let expected_length = if self.inner_digest {
            self.check_inner_digest(&payload)?
        } else {
            payload.len()
        };
        ticket::try_decode(&payload, expected_length).map_err(Rejection::Decode)
    }

    fn check_inner_digest(&self, payload: &[u8]) -> Result<usize, Rejection> {
        let digest_size = self.cipher.keys().digest_size();
        if payload.len() <= digest_size {
            return Err(Rejection::InnerDigest);
        }
        let len = payload.len() - digest_size;
        let computed = self
            .cipher
            .digest(&payload[..len])
            .map_err(|_| Rejection::InnerDigest)?;
        if !constant_time_eq(&computed, &payload[len..]) {
            return Err(Rejection::InnerDigest);
        }
        Ok(len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> TicketResolver {
        TicketResolver::new(KeyMaterial::new("AES", &[1; 16], "SHA1", &[2; 20]).unwrap())
    }

    #[test]
    fn empty_cookie_is_rejected_before_decoding() {
        assert_eq!(resolver().try_resolve(""), Err(Rejection::Empty));
        assert_eq!(resolver().resolve_user_name(""), None);
    }

    #[test]
    fn invalid_hex_is_rejected() {
        assert_eq!(resolver().try_resolve("abc"), Err(Rejection::Encoding));
        assert_eq!(resolver().try_resolve("zz00"), Err(Rejection::Encoding));
        assert_eq!(resolver().resolve_user_name("not a cookie"), None);
    }

    #[test]
    fn short_and_unauthenticated_buffers_are_rejected() {
        assert_eq!(
            resolver().try_resolve(&"00".repeat(20)),
            Err(Rejection::Open(OpenError::TooShort))
        );
        assert_eq!(
            resolver().try_resolve(&"00".repeat(64)),
            Err(Rejection::Open(OpenError::AuthenticationFailed))
        );
    }

    #[test]
    fn inner_digest_must_cover_the_payload() {
        let resolver = resolver().with_inner_digest(true);
        assert_eq!(resolver.check_inner_digest(&[0u8; 20]), Err(Rejection::InnerDigest));
        assert_eq!(resolver.check_inner_digest(&[0u8; 40]), Err(Rejection::InnerDigest));

        let mut payload = b"ticket bytes".to_vec();
        let mac = resolver.cipher.digest(&payload).unwrap();
        payload.extend_from_slice(&mac);
        assert_eq!(resolver.check_inner_digest(&payload), Ok(12));
    }
}
