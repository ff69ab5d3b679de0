//! Primitive readers for the ticket grammar.
//!
//! Each reader takes the whole buffer and a start offset and returns the
//! value together with the offset just past it. Reading past the end of the
//! buffer is a `DecodeError::Truncated`, never a panic.

use super::DecodeError;

/// The most bytes a 32-bit 7-bit-encoded integer can occupy.
const MAX_VAR_LEN_BYTES: usize = 5;

pub fn read_u8(buf: &[u8], pos: usize) -> Result<(u8, usize), DecodeError> {
    let byte = *buf.get(pos).ok_or(DecodeError::Truncated)?;
    Ok((byte, pos + 1))
}

pub fn read_i64_le(buf: &[u8], pos: usize) -> Result<(i64, usize), DecodeError> {
    let end = pos.checked_add(8).ok_or(DecodeError::Truncated)?;
    let bytes = buf.get(pos..end).ok_or(DecodeError::Truncated)?;
    let mut raw = [0u8; 8];
    raw.copy_from_slice(bytes);
    Ok((i64::from_le_bytes(raw), end))
}

/// Reads a 7-bit variable-length integer: low groups first, high bit set on
/// every byte but the last.
///
/// The value must fit a non-negative 32-bit signed integer; a fifth byte
/// carrying more than the remaining bits, or a sixth byte, is rejected.
pub fn read_var_len(buf: &[u8], pos: usize) -> Result<(usize, usize), DecodeError> {
    let mut value: u32 = 0;
    let mut cursor = pos;
    for i in 0..MAX_VAR_LEN_BYTES {
        let (byte, next) = read_u8(buf, cursor)?;
        cursor = next;
        if i == MAX_VAR_LEN_BYTES - 1 {
            // Only four payload bits remain, and the sign bit must stay clear.
            if byte > 0x07 {
                return Err(DecodeError::VarLenOverflow);
            }
        }
        value |= u32::from(byte & 0x7f) << (7 * i);
        if byte & 0x80 == 0 {
            return Ok((value as usize, cursor));
        }
    }
    Err(DecodeError::VarLenOverflow)
}

/// Reads a character count followed by that many little-endian UTF-16 code
/// units. Unpaired surrogates are rejected rather than replaced.
pub fn read_length_prefixed_utf16(buf: &[u8], pos: usize) -> Result<(String, usize), DecodeError> {
    let (chars, start) = read_var_len(buf, pos)?;
    let byte_len = chars.checked_mul(2).ok_or(DecodeError::Truncated)?;
    let end = start.checked_add(byte_len).ok_or(DecodeError::Truncated)?;
    let bytes = buf.get(start..end).ok_or(DecodeError::Truncated)?;

    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    let text = String::from_utf16(&units).map_err(|_| DecodeError::InvalidText)?;
    Ok((text, end))
}
