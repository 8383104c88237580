//! Resumable UTF-16 → UTF-8 conversion.

use alloc::vec::Vec;

use bstr::BString;

use crate::{
    BomMode, ByteOrder, EncodingError, InvalidStateBits, Utf16Options, encode_utf8_append,
};

const HIGH_SURROGATES: core::ops::RangeInclusive<u16> = 0xD800..=0xDBFF;

fn combine_surrogates(high: u16, low: u16) -> u32 {
    0x1_0000 + ((u32::from(high) - 0xD800) << 10) + (u32::from(low) - 0xDC00)
}

/// Partial UTF-16 input carried from one chunk to the next: at most one
/// byte of an unfinished code unit and a high surrogate waiting for its low
/// half.
///
/// The state does not record the byte order; keep using the entry point the
/// stream started with.
///
/// With the `serde` feature the state serialises as its [bit
/// form](Utf16State::to_bits).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(into = "u32", try_from = "u32")
)]
pub struct Utf16State {
    pending_byte: Option<u8>,
    high_surrogate: Option<u16>,
}

impl Utf16State {
    /// The state at the start of a stream.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            pending_byte: None,
            high_surrogate: None,
        }
    }

    /// Whether nothing is pending. Only an idle state may end a stream.
    #[must_use]
    pub const fn is_idle(&self) -> bool {
        self.pending_byte.is_none() && self.high_surrogate.is_none()
    }

    /// The first byte of an unfinished code unit.
    #[must_use]
    pub const fn pending_byte(&self) -> Option<u8> {
        self.pending_byte
    }

    /// A high surrogate still waiting for its low surrogate.
    #[must_use]
    pub const fn pending_surrogate(&self) -> Option<u16> {
        self.high_surrogate
    }

    /// Declare the end of the stream.
    ///
    /// # Errors
    ///
    /// [`EncodingError::TruncatedUtf16`] if half a code unit or an unpaired
    /// high surrogate is pending.
    pub fn finish(self) -> Result<(), EncodingError> {
        if self.is_idle() {
            return Ok(());
        }
        let err = EncodingError::TruncatedUtf16 {
            pending_byte: self.pending_byte.is_some(),
            pending_surrogate: self.high_surrogate.is_some(),
        };
        debug_event!(error = %err, "UTF-16 stream truncated");
        Err(err)
    }

    /// Pack the state into an integer: the pending byte in bits 0..8, a
    /// pending-byte flag in bit 8 and the high surrogate in bits 16..32. The
    /// idle state is 0.
    #[must_use]
    pub fn to_bits(self) -> u32 {
        let byte = self
            .pending_byte
            .map_or(0, |byte| 0x100 | u32::from(byte));
        let high = u32::from(self.high_surrogate.unwrap_or(0));
        byte | (high << 16)
    }

    /// Unpack a state produced by [`to_bits`](Self::to_bits).
    ///
    /// Returns `None` for integers no sequence of chunks could have produced.
    #[must_use]
    pub fn from_bits(bits: u32) -> Option<Self> {
        let [byte, flags, high_lo, high_hi] = bits.to_le_bytes();
        let pending_byte = match flags {
            0 if byte == 0 => None,
            1 => Some(byte),
            _ => return None,
        };
        let high_surrogate = match u16::from_le_bytes([high_lo, high_hi]) {
            0 => None,
            high if HIGH_SURROGATES.contains(&high) => Some(high),
            _ => return None,
        };
        Some(Self {
            pending_byte,
            high_surrogate,
        })
    }

    fn push_unit(
        &mut self,
        out: &mut Vec<u8>,
        unit: u16,
        offset: usize,
    ) -> Result<(), EncodingError> {
        match (self.high_surrogate.take(), unit) {
            (None, 0xD800..=0xDBFF) => self.high_surrogate = Some(unit),
            (None, 0xDC00..=0xDFFF) => {
                return Err(EncodingError::UnpairedLowSurrogate { offset, unit });
            }
            (None, _) => encode_utf8_append(out, u32::from(unit)),
            (Some(high), 0xDC00..=0xDFFF) => encode_utf8_append(out, combine_surrogates(high, unit)),
            (Some(high), _) => {
                return Err(EncodingError::UnpairedHighSurrogate { offset, high, unit });
            }
        }
        Ok(())
    }
}

impl From<Utf16State> for u32 {
    fn from(state: Utf16State) -> Self {
        state.to_bits()
    }
}

impl TryFrom<u32> for Utf16State {
    type Error = InvalidStateBits;

    fn try_from(bits: u32) -> Result<Self, Self::Error> {
        Self::from_bits(bits).ok_or(InvalidStateBits(bits))
    }
}

fn convert(
    out: &mut Vec<u8>,
    bytes: &[u8],
    state: &mut Utf16State,
    order: ByteOrder,
) -> Result<(), EncodingError> {
    let mut rest = bytes;
    let mut base = 0;
    if let Some(first) = state.pending_byte {
        let Some((&second, tail)) = bytes.split_first() else {
            return Ok(());
        };
        state.pending_byte = None;
        state.push_unit(out, order.unit(first, second), 0)?;
        rest = tail;
        base = 1;
    }

    // Each unit grows into at most three bytes; pairs into four.
    out.reserve(rest.len() / 2 * 3);
    let mut units = rest.chunks_exact(2);
    for (n, pair) in units.by_ref().enumerate() {
        state.push_unit(out, order.unit(pair[0], pair[1]), base + 2 * n)?;
    }
    if let [last] = units.remainder() {
        state.pending_byte = Some(*last);
    }
    Ok(())
}

/// Convert one chunk of UTF-16 in byte order `order` to UTF-8, appending to
/// `out`.
///
/// A chunk may end after half a code unit or after a high surrogate; the
/// remainder is kept in `state` and the call succeeds. Check the state with
/// [`Utf16State::finish`] once the stream is over.
///
/// # Errors
///
/// [`EncodingError::UnpairedLowSurrogate`] or
/// [`EncodingError::UnpairedHighSurrogate`] with the offset, within `bytes`,
/// of the offending code unit (0 when it began in an earlier chunk). Units
/// before it have already been appended to `out`; `state` is reset to idle.
pub fn utf16_to_utf8_append(
    out: &mut Vec<u8>,
    bytes: &[u8],
    state: &mut Utf16State,
    order: ByteOrder,
) -> Result<(), EncodingError> {
    let result = convert(out, bytes, state, order);
    if let Err(_err) = &result {
        debug_event!(error = %_err, ?order, "rejected UTF-16 chunk");
        *state = Utf16State::new();
    }
    result
}

/// [`utf16_to_utf8_append`] for big-endian input.
///
/// # Errors
///
/// See [`utf16_to_utf8_append`].
pub fn utf16be_to_utf8_append(
    out: &mut Vec<u8>,
    bytes: &[u8],
    state: &mut Utf16State,
) -> Result<(), EncodingError> {
    utf16_to_utf8_append(out, bytes, state, ByteOrder::BigEndian)
}

/// [`utf16_to_utf8_append`] for little-endian input.
///
/// # Errors
///
/// See [`utf16_to_utf8_append`].
pub fn utf16le_to_utf8_append(
    out: &mut Vec<u8>,
    bytes: &[u8],
    state: &mut Utf16State,
) -> Result<(), EncodingError> {
    utf16_to_utf8_append(out, bytes, state, ByteOrder::LittleEndian)
}

/// Convert a complete UTF-16 buffer.
///
/// ```rust
/// use utfstream::{ByteOrder, utf16_to_utf8};
///
/// let text = utf16_to_utf8(b"h\0i\0", ByteOrder::LittleEndian).unwrap();
/// assert_eq!(text, "hi");
/// ```
///
/// # Errors
///
/// Unpaired surrogates as for [`utf16_to_utf8_append`];
/// [`EncodingError::TruncatedUtf16`] for an odd length or a trailing high
/// surrogate.
pub fn utf16_to_utf8(bytes: &[u8], order: ByteOrder) -> Result<BString, EncodingError> {
    let mut out = Vec::with_capacity(bytes.len());
    let mut state = Utf16State::new();
    utf16_to_utf8_append(&mut out, bytes, &mut state, order)?;
    state.finish()?;
    Ok(BString::from(out))
}

/// A UTF-16 stream being converted chunk by chunk.
///
/// Adds byte order mark handling (see [`BomMode`]) and a running position on
/// top of [`utf16_to_utf8_append`].
#[derive(Debug, Clone)]
pub struct Utf16Decoder {
    options: Utf16Options,
    order: ByteOrder,
    state: Utf16State,
    at_start: bool,
    position: usize,
}

impl Default for Utf16Decoder {
    fn default() -> Self {
        Self::new(Utf16Options::default())
    }
}

impl Utf16Decoder {
    /// A decoder at the start of a stream.
    #[must_use]
    pub fn new(options: Utf16Options) -> Self {
        Self {
            options,
            order: options.byte_order,
            state: Utf16State::new(),
            at_start: options.bom != BomMode::Keep,
            position: 0,
        }
    }

    /// Convert the next chunk, appending UTF-8 to `out`.
    ///
    /// # Errors
    ///
    /// As [`utf16_to_utf8_append`]; offsets refer to `chunk` as passed in,
    /// including any byte order mark. The failing chunk does not count
    /// towards [`position`](Self::position).
    pub fn feed(&mut self, out: &mut Vec<u8>, chunk: impl AsRef<[u8]>) -> Result<(), EncodingError> {
        let chunk = chunk.as_ref();
        let skip = if self.at_start {
            match self.skip_bom(chunk) {
                Some(skip) => skip,
                None => {
                    self.position += chunk.len();
                    return Ok(());
                }
            }
        } else {
            0
        };

        utf16_to_utf8_append(out, &chunk[skip..], &mut self.state, self.order)
            .map_err(|err| err.shifted(skip))?;
        self.position += chunk.len();
        Ok(())
    }

    /// Look at the first code unit of the stream. Returns how many bytes of
    /// `chunk` belong to a byte order mark that must be dropped, or `None`
    /// while fewer than two bytes have arrived.
    fn skip_bom(&mut self, chunk: &[u8]) -> Option<usize> {
        let (head, from_chunk) = match (self.state.pending_byte, chunk) {
            (Some(first), [second, ..]) => ([first, *second], 1),
            (None, [first, second, ..]) => ([*first, *second], 2),
            (None, [first]) => {
                self.state.pending_byte = Some(*first);
                return None;
            }
            _ => return None,
        };
        self.at_start = false;

        let strip = match (self.options.bom, ByteOrder::from_bom(&head)) {
            (BomMode::Detect, Some(order)) => {
                self.order = order;
                true
            }
            (BomMode::Strip, Some(order)) => order == self.order,
            _ => false,
        };
        if strip {
            self.state.pending_byte = None;
            Some(from_chunk)
        } else {
            Some(0)
        }
    }

    /// The byte order in use. With [`BomMode::Detect`] this changes once a
    /// byte order mark has been seen.
    #[must_use]
    pub fn byte_order(&self) -> ByteOrder {
        self.order
    }

    /// Total length of the chunks accepted so far.
    #[must_use]
    pub fn position(&self) -> usize {
        self.position
    }

    /// The state to carry into a later call.
    #[must_use]
    pub fn state(&self) -> Utf16State {
        self.state
    }

    /// End the stream.
    ///
    /// # Errors
    ///
    /// [`EncodingError::TruncatedUtf16`] if half a code unit or a high
    /// surrogate is pending.
    pub fn finish(self) -> Result<(), EncodingError> {
        self.state.finish()
    }
}
