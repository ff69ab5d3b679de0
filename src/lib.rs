//! Recognises session cookies issued by the legacy web platform.
//!
//! A cookie is the hex encoding of `AES-CBC(random || ticket) || HMAC-SHA1`.
//! [`TicketResolver`] authenticates and decrypts it with the shared machine
//! keys and returns the user name carried by the ticket. Anything that does
//! not check out resolves to `None`.
//!
//! ```no_run
//! use legacy_ticket::{Settings, TicketResolver};
//!
//! # fn main() -> Result<(), legacy_ticket::ConfigurationError> {
//! let settings = Settings::load("ticket.toml")?;
//! let resolver = TicketResolver::from_settings(&settings)?;
//! let name = resolver.resolve_user_name("8A3F...");
//! # let _ = name;
//! # Ok(())
//! # }
//! ```

pub mod cipher;
pub mod config;
pub mod cookie;
pub mod identity;
pub mod keys;
pub mod ticket;
pub mod util;

pub use crate::cipher::{AuthenticatedCipher, OpenError};
pub use crate::config::{ConfigurationError, Settings};
pub use crate::cookie::TicketResolver;
pub use crate::identity::{DirectoryError, IdentityService, UserDirectory, UserProfile, UserRecord};
pub use crate::keys::{DecryptionAlgorithm, KeyMaterial, ValidationAlgorithm};
pub use crate::ticket::{DecodeError, Ticket};
