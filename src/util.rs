use crate::config::ConfigurationError;

/// Compares two byte ranges without returning early on the first mismatch.
///
/// Every position up to the longer of the two lengths is folded into the
/// difference accumulator, so the work done depends only on the lengths and
/// never on where the ranges diverge.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    fold_difference(a, b, |_| {}) == 0
}

/// Accumulates the xor difference of `a` and `b`, calling `visit` once per
/// position. Positions past the end of the shorter range compare against zero
/// and a length mismatch always leaves the accumulator non-zero.
pub(crate) fn fold_difference(a: &[u8], b: &[u8], mut visit: impl FnMut(usize)) -> u32 {
    let len = a.len().max(b.len());
    let mut diff = u32::from(a.len() != b.len());
    for i in 0..len {
        visit(i);
        let x = a.get(i).copied().unwrap_or(0);
        let y = b.get(i).copied().unwrap_or(0);
        diff |= u32::from(x ^ y);
    }
    diff
}

/// Decodes hex key text, two characters per byte.
///
/// Leading and trailing whitespace is ignored; any other non-hex character,
/// including whitespace between digits, is an error.
pub fn hex_to_bytes(text: &str) -> Result<Vec<u8>, ConfigurationError> {
    hex::decode(text.trim()).map_err(|_| ConfigurationError::InvalidKeyEncoding)
}
