//! The serialized forms-authentication ticket.
//!
//! Layout, read strictly in order:
//!
//! ```text
//! 0x01 | version:u8 | issued:i64le | 0xFE | expires:i64le | persistent:u8
//!      | name:str | user_data:str | cookie_path:str | 0xFF
//! ```
//!
//! where `str` is a 7-bit encoded character count followed by UTF-16LE code
//! units. Any deviation means the payload is foreign or corrupt and the
//! decode yields nothing.

pub mod codec;
pub mod ticks;

use chrono::{DateTime, Utc};
use thiserror::Error;

use self::codec::{read_i64_le, read_length_prefixed_utf16, read_u8};
use self::ticks::ticks_to_utc;

pub const FORMAT_MARKER: u8 = 0x01;
pub const SEPARATOR: u8 = 0xFE;
pub const END_MARKER: u8 = 0xFF;

/// Why a payload did not parse. Only used internally and in tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("payload truncated")]
    Truncated,

    #[error("bad format marker {0:#04x}")]
    BadFormatMarker(u8),

    #[error("bad separator {0:#04x}")]
    BadSeparator(u8),

    #[error("bad persistence flag {0:#04x}")]
    BadPersistenceFlag(u8),

    #[error("bad end marker {0:#04x}")]
    BadEndMarker(u8),

    #[error("variable-length integer out of range")]
    VarLenOverflow,

    #[error("string is not valid UTF-16")]
    InvalidText,

    #[error("timestamp out of range")]
    TicksOutOfRange,

    #[error("expected {expected} bytes, consumed {consumed}")]
    LengthMismatch { expected: usize, consumed: usize },
}

/// A decoded session ticket. Only ever exists fully populated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    pub version: u8,
    pub name: String,
    pub issue_date_utc: DateTime<Utc>,
    pub expiration_utc: DateTime<Utc>,
    pub is_persistent: bool,
    pub user_data: String,
    pub cookie_path: String,
}

impl Ticket {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expiration_utc
    }
}

/// Decodes `payload`, requiring exactly `expected_length` bytes to be consumed.
pub fn decode(payload: &[u8], expected_length: usize) -> Option<Ticket> {
    try_decode(payload, expected_length).ok()
}

/// Like [`decode`], but reports which rule the payload broke.
pub fn try_decode(payload: &[u8], expected_length: usize) -> Result<Ticket, DecodeError> {
    let (marker, pos) = read_u8(payload, 0)?;
    if marker != FORMAT_MARKER {
        return Err(DecodeError::BadFormatMarker(marker));
    }

    let (version, pos) = read_u8(payload, pos)?;
    let (issued, pos) = read_i64_le(payload, pos)?;
    let issue_date_utc = ticks_to_utc(issued).ok_or(DecodeError::TicksOutOfRange)?;

    let (separator, pos) = read_u8(payload, pos)?;
    if separator != SEPARATOR {
        return Err(DecodeError::BadSeparator(separator));
    }

    let (expires, pos) = read_i64_le(payload, pos)?;
    let expiration_utc = ticks_to_utc(expires).ok_or(DecodeError::TicksOutOfRange)?;

    let (flag, pos) = read_u8(payload, pos)?;
    let is_persistent = match flag {
        0 => false,
        1 => true,
        other => return Err(DecodeError::BadPersistenceFlag(other)),
    };

    let (name, pos) = read_length_prefixed_utf16(payload, pos)?;
    let (user_data, pos) = read_length_prefixed_utf16(payload, pos)?;
    let (cookie_path, pos) = read_length_prefixed_utf16(payload, pos)?;

    let (end, pos) = read_u8(payload, pos)?;
    if end != END_MARKER {
        return Err(DecodeError::BadEndMarker(end));
    }

    if pos != expected_length {
        return Err(DecodeError::LengthMismatch {
            expected: expected_length,
            consumed: pos,
        });
    }

    Ok(Ticket {
        version,
        name,
        issue_date_utc,
        expiration_utc,
        is_persistent,
        user_data,
        cookie_path,
    })
}
