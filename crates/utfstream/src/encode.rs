//! Encoding a single Unicode scalar value as UTF-8.

use alloc::vec::Vec;

const CONT: u8 = 0x80;
const CONT_MASK: u32 = 0x3F;

/// Number of bytes [`encode_utf8_append`] writes for `codepoint`.
///
/// Values above U+10FFFF report 4, the width the encoder falls back to.
#[must_use]
pub const fn utf8_len(codepoint: u32) -> usize {
    match codepoint {
        0..=0x7F => 1,
        0x80..=0x7FF => 2,
        0x800..=0xFFFF => 3,
        _ => 4,
    }
}

/// Append the UTF-8 encoding of `codepoint` to `out`.
///
/// `codepoint` must be a Unicode scalar value: at most U+10FFFF and outside
/// the surrogate range. Other values produce unspecified bytes but never
/// panic; only bytes are appended, existing content is left as is.
///
/// ```rust
/// let mut out = b"x=".to_vec();
/// utfstream::encode_utf8_append(&mut out, 0x20AC);
/// assert_eq!(out, "x=€".as_bytes());
/// ```
#[allow(clippy::cast_possible_truncation)]
pub fn encode_utf8_append(out: &mut Vec<u8>, codepoint: u32) {
    let cont = |shift: u32| CONT | ((codepoint >> shift) & CONT_MASK) as u8;
    match utf8_len(codepoint) {
        1 => out.push(codepoint as u8),
        2 => out.extend_from_slice(&[0xC0 | (codepoint >> 6) as u8, cont(0)]),
        3 => out.extend_from_slice(&[0xE0 | (codepoint >> 12) as u8, cont(6), cont(0)]),
        _ => out.extend_from_slice(&[
            0xF0 | ((codepoint >> 18) & 0x07) as u8,
            cont(12),
            cont(6),
            cont(0),
        ]),
    }
}
