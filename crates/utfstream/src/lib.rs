//! Resumable UTF-8 validation and UTF-16 → UTF-8 conversion.
//!
//! Input may arrive in arbitrarily sized chunks whose boundaries fall in the
//! middle of a multi-byte UTF-8 sequence, a UTF-16 code unit, or a surrogate
//! pair. The partial sequence is carried between calls in a small `Copy`
//! state value that the caller owns and passes back with the next chunk; the
//! functions themselves hold no state and never look past the supplied slice.
//!
//! ```rust
//! use utfstream::{Utf8State, validate_utf8_chunk};
//!
//! let mut state = Utf8State::new();
//! // "€" is E2 82 AC; split it across two chunks.
//! validate_utf8_chunk(b"price: \xE2\x82", &mut state).unwrap();
//! assert!(!state.is_idle());
//! validate_utf8_chunk(b"\xAC", &mut state).unwrap();
//! state.finish().unwrap();
//! ```
//!
//! ```rust
//! use utfstream::{Utf16State, utf16be_to_utf8_append};
//!
//! let mut out = Vec::new();
//! let mut state = Utf16State::new();
//! utf16be_to_utf8_append(&mut out, &[0xD8, 0x3D, 0xDE], &mut state).unwrap();
//! utf16be_to_utf8_append(&mut out, &[0x00], &mut state).unwrap();
//! state.finish().unwrap();
//! assert_eq!(out, "😀".as_bytes());
//! ```

#![no_std]
extern crate alloc;

#[cfg(test)]
extern crate std;

#[macro_use]
mod macros;

mod encode;
mod error;
mod options;
mod utf16;
mod utf8;


pub use encode::{encode_utf8_append, utf8_len};
pub use error::EncodingError;
pub use options::{BomMode, ByteOrder, Utf16Options};
pub use utf8::{Utf8State, Utf8Validator, check_utf8, validate_utf8, validate_utf8_chunk};
pub use utf16::{
    Utf16Decoder, Utf16State, utf16_to_utf8, utf16_to_utf8_append, utf16be_to_utf8_append,
    utf16le_to_utf8_append,
};

/// Error returned when an integer does not describe a reachable stream
/// state. See [`Utf8State::from_bits`] and [`Utf16State::from_bits`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("{0:#010x} is not a valid stream state")]
pub struct InvalidStateBits(pub u32);
