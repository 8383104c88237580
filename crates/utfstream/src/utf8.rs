//! Resumable UTF-8 validation.
//!
//! Well-formedness follows table 3-7 of the Unicode standard: the range a
//! continuation byte must fall in depends on the lead byte, which rejects
//! overlong forms, encoded surrogates and values above U+10FFFF at the first
//! byte that makes the sequence impossible.

use core::ops::RangeInclusive;

use crate::{EncodingError, InvalidStateBits};

/// Length of the sequence introduced by `lead`, or 0 if `lead` cannot start
/// one (continuation bytes, `C0`, `C1`, `F5..=FF`).
const fn sequence_len(lead: u8) -> u8 {
    match lead {
        0x00..=0x7F => 1,
        0xC2..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF4 => 4,
        _ => 0,
    }
}

/// Accepted values for the byte at `position` (1-based past the lead) of a
/// sequence starting with `lead`.
const fn continuation_range(lead: u8, position: u8) -> RangeInclusive<u8> {
    if position > 1 {
        return 0x80..=0xBF;
    }
    match lead {
        0xE0 => 0xA0..=0xBF,
        0xED => 0x80..=0x9F,
        0xF0 => 0x90..=0xBF,
        0xF4 => 0x80..=0x8F,
        _ => 0x80..=0xBF,
    }
}

fn ascii_prefix_len(bytes: &[u8]) -> usize {
    bytes
        .iter()
        .position(|b| !b.is_ascii())
        .unwrap_or(bytes.len())
}

/// Partial UTF-8 sequence carried from one chunk to the next.
///
/// Start every stream with [`Utf8State::new`] (or `Default`) and pass the
/// same value to each [`validate_utf8_chunk`] call in order. A state belongs
/// to exactly one stream; feeding chunks out of order gives wrong answers.
///
/// With the `serde` feature the state serialises as its [bit
/// form](Utf8State::to_bits).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(into = "u32", try_from = "u32")
)]
pub struct Utf8State {
    partial: [u8; 3],
    consumed: u8,
    expected: u8,
}

impl Utf8State {
    /// The state at the start of a stream.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            partial: [0; 3],
            consumed: 0,
            expected: 0,
        }
    }

    /// Whether no sequence is in progress. Only an idle state may end a
    /// stream.
    #[must_use]
    pub const fn is_idle(&self) -> bool {
        self.expected == 0
    }

    /// Bytes of the sequence in progress seen so far.
    #[must_use]
    pub fn pending(&self) -> &[u8] {
        self.partial
            .get(..usize::from(self.consumed))
            .unwrap_or_default()
    }

    /// Declare the end of the stream.
    ///
    /// # Errors
    ///
    /// [`EncodingError::TruncatedUtf8`] if the stream stopped inside a
    /// sequence.
    pub fn finish(self) -> Result<(), EncodingError> {
        if self.is_idle() {
            return Ok(());
        }
        debug_event!(
            consumed = self.consumed,
            expected = self.expected,
            "UTF-8 stream truncated"
        );
        Err(EncodingError::TruncatedUtf8 {
            consumed: self.consumed,
            expected: self.expected,
        })
    }

    /// Pack the state into an integer: the pending bytes in bits 0..24, the
    /// consumed count in bits 24..28 and the sequence length in bits 28..32.
    /// The idle state is 0.
    #[must_use]
    pub const fn to_bits(self) -> u32 {
        let [b0, b1, b2] = self.partial;
        u32::from_le_bytes([b0, b1, b2, self.consumed | (self.expected << 4)])
    }

    /// Unpack a state produced by [`to_bits`](Self::to_bits).
    ///
    /// Returns `None` for integers no sequence of chunks could have produced.
    #[must_use]
    pub fn from_bits(bits: u32) -> Option<Self> {
        let [b0, b1, b2, meta] = bits.to_le_bytes();
        let candidate = Self {
            partial: [b0, b1, b2],
            consumed: meta & 0x0F,
            expected: meta >> 4,
        };
        if candidate.is_idle() {
            return (bits == 0).then_some(candidate);
        }
        let consumed = usize::from(candidate.consumed);
        if consumed == 0 || consumed > candidate.partial.len() {
            return None;
        }
        if candidate.partial[consumed..].iter().any(|&b| b != 0) {
            return None;
        }

        let mut replayed = Self::new();
        scan(&candidate.partial[..consumed], &mut replayed).ok()?;
        (replayed == candidate).then_some(candidate)
    }

    fn begin(&mut self, lead: u8, expected: u8) {
        *self = Self {
            partial: [lead, 0, 0],
            consumed: 1,
            expected,
        };
    }

    fn accepts(&self, byte: u8) -> bool {
        continuation_range(self.partial[0], self.consumed).contains(&byte)
    }

    fn advance(&mut self, byte: u8) {
        if self.consumed + 1 == self.expected {
            *self = Self::new();
        } else {
            self.partial[usize::from(self.consumed)] = byte;
            self.consumed += 1;
        }
    }
}

impl From<Utf8State> for u32 {
    fn from(state: Utf8State) -> Self {
        state.to_bits()
    }
}

impl TryFrom<u32> for Utf8State {
    type Error = InvalidStateBits;

    fn try_from(bits: u32) -> Result<Self, Self::Error> {
        Self::from_bits(bits).ok_or(InvalidStateBits(bits))
    }
}

fn scan(bytes: &[u8], state: &mut Utf8State) -> Result<(), EncodingError> {
    let mut i = 0;
    while i < bytes.len() {
        let byte = bytes[i];
        if state.is_idle() {
            if byte.is_ascii() {
                i += ascii_prefix_len(&bytes[i..]);
                continue;
            }
            match sequence_len(byte) {
                expected @ 2..=4 => state.begin(byte, expected),
                _ => return Err(EncodingError::InvalidUtf8 { offset: i, byte }),
            }
        } else if state.accepts(byte) {
            state.advance(byte);
        } else {
            return Err(EncodingError::InvalidUtf8 { offset: i, byte });
        }
        i += 1;
    }
    Ok(())
}

/// Validate one chunk of a UTF-8 stream.
///
/// A chunk may end partway through a sequence; the bytes seen so far are kept
/// in `state` and the call succeeds. Check the state with
/// [`Utf8State::finish`] once the stream is over.
///
/// # Errors
///
/// [`EncodingError::InvalidUtf8`] with the offset, within `bytes`, of the
/// first byte that cannot continue a well-formed stream. `state` is reset to
/// idle.
pub fn validate_utf8_chunk(bytes: &[u8], state: &mut Utf8State) -> Result<(), EncodingError> {
    let result = scan(bytes, state);
    if let Err(_err) = &result {
        debug_event!(error = %_err, "rejected UTF-8 chunk");
        *state = Utf8State::new();
    }
    result
}

/// Validate a complete buffer, locating the first bad byte.
///
/// # Errors
///
/// [`EncodingError::InvalidUtf8`] for a malformed byte,
/// [`EncodingError::TruncatedUtf8`] if `bytes` ends inside a sequence.
pub fn check_utf8(bytes: &[u8]) -> Result<(), EncodingError> {
    let mut state = Utf8State::new();
    validate_utf8_chunk(bytes, &mut state)?;
    state.finish()
}

/// Whether `bytes` is well-formed UTF-8 in its entirety.
#[must_use]
pub fn validate_utf8(bytes: &[u8]) -> bool {
    check_utf8(bytes).is_ok()
}

/// A UTF-8 stream being validated chunk by chunk.
///
/// Wraps a [`Utf8State`] and counts the bytes accepted so far, so a chunk
/// offset can be turned into a stream offset.
///
/// ```rust
/// use utfstream::{EncodingError, Utf8Validator};
///
/// let mut validator = Utf8Validator::new();
/// validator.feed("naïve ".as_bytes()).unwrap();
/// let err = validator.feed(b"caf\xC3(").unwrap_err();
/// assert_eq!(err, EncodingError::InvalidUtf8 { offset: 4, byte: b'(' });
/// assert_eq!(validator.position() + 4, 11);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Utf8Validator {
    state: Utf8State,
    position: usize,
}

impl Utf8Validator {
    /// A validator at the start of a stream.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resume a stream from a saved state. Positions restart from zero.
    #[must_use]
    pub fn with_state(state: Utf8State) -> Self {
        Self { state, position: 0 }
    }

    /// Validate the next chunk.
    ///
    /// # Errors
    ///
    /// As [`validate_utf8_chunk`]. The failing chunk does not count towards
    /// [`position`](Self::position).
    pub fn feed(&mut self, chunk: impl AsRef<[u8]>) -> Result<(), EncodingError> {
        let chunk = chunk.as_ref();
        validate_utf8_chunk(chunk, &mut self.state)?;
        self.position += chunk.len();
        Ok(())
    }

    /// Total length of the chunks accepted so far.
    #[must_use]
    pub fn position(&self) -> usize {
        self.position
    }

    /// The state to carry into a later call.
    #[must_use]
    pub fn state(&self) -> Utf8State {
        self.state
    }

    /// End the stream.
    ///
    /// # Errors
    ///
    /// [`EncodingError::TruncatedUtf8`] if the last chunk stopped inside a
    /// sequence.
    pub fn finish(self) -> Result<(), EncodingError> {
        self.state.finish()
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{Utf8State, check_utf8, validate_utf8, validate_utf8_chunk};
    use crate::EncodingError;

    fn invalid(offset: usize, byte: u8) -> EncodingError {
        EncodingError::InvalidUtf8 { offset, byte }
    }

    #[rstest]
    #[case::overlong_nul(b"\xC0\x80", invalid(0, 0xC0))]
    #[case::overlong_two_byte(b"\xC1\xBF", invalid(0, 0xC1))]
    #[case::overlong_three_byte(b"\xE0\x80\x80", invalid(1, 0x80))]
    #[case::overlong_four_byte(b"\xF0\x8F\xBF\xBF", invalid(1, 0x8F))]
    #[case::surrogate(b"\xED\xA0\x80", invalid(1, 0xA0))]
    #[case::above_max(b"\xF4\x90\x80\x80", invalid(1, 0x90))]
    #[case::lead_too_large(b"\xF5\x80\x80\x80", invalid(0, 0xF5))]
    #[case::five_byte_form(b"\xF8\x88\x80\x80\x80", invalid(0, 0xF8))]
    #[case::lone_continuation(b"ab\x80", invalid(2, 0x80))]
    #[case::interrupted(b"\xE2\x82A", invalid(2, b'A'))]
    #[case::new_lead_in_sequence(b"x\xE2\xE2\x82\xAC", invalid(2, 0xE2))]
    #[case::ff(b"\xFF", invalid(0, 0xFF))]
    fn rejects_malformed(#[case] input: &[u8], #[case] expected: EncodingError) {
        let mut state = Utf8State::new();
        assert_eq!(validate_utf8_chunk(input, &mut state), Err(expected));
        assert!(state.is_idle(), "state resets after an error");
        assert!(!validate_utf8(input));
    }

    #[rstest]
    #[case::empty(b"")]
    #[case::ascii(b"plain ascii\n")]
    #[case::two_byte(b"\xC2\x80\xDF\xBF")]
    #[case::three_byte(b"\xE0\xA0\x80\xED\x9F\xBF\xEE\x80\x80\xEF\xBF\xBF")]
    #[case::four_byte(b"\xF0\x90\x80\x80\xF4\x8F\xBF\xBF")]
    #[case::nul(b"\x00")]
    fn accepts_well_formed(#[case] input: &[u8]) {
        let mut state = Utf8State::new();
        assert_eq!(validate_utf8_chunk(input, &mut state), Ok(()));
        assert!(state.is_idle());
        assert!(validate_utf8(input));
    }

    #[test]
    fn empty_chunk_keeps_state() {
        let mut state = Utf8State::new();
        validate_utf8_chunk(b"", &mut state).unwrap();
        assert_eq!(state, Utf8State::new());
        assert_eq!(state.to_bits(), 0);

        validate_utf8_chunk(b"\xF0\x9F", &mut state).unwrap();
        let before = state;
        validate_utf8_chunk(b"", &mut state).unwrap();
        assert_eq!(state, before);
    }

    #[test]
    fn truncated_final_chunk_leaves_state_pending() {
        let mut state = Utf8State::new();
        assert_eq!(validate_utf8_chunk(b"\xE2\x82", &mut state), Ok(()));
        assert!(!state.is_idle());
        assert_eq!(state.pending(), b"\xE2\x82");
        assert_eq!(
            state.finish(),
            Err(EncodingError::TruncatedUtf8 {
                consumed: 2,
                expected: 3,
            })
        );
        assert_eq!(
            check_utf8(b"\xE2\x82"),
            Err(EncodingError::TruncatedUtf8 {
                consumed: 2,
                expected: 3,
            })
        );
    }

    #[test]
    fn resumes_one_byte_at_a_time() {
        let mut state = Utf8State::new();
        for &byte in "a€😀".as_bytes() {
            validate_utf8_chunk(&[byte], &mut state).unwrap();
        }
        assert!(state.finish().is_ok());
    }

    #[test]
    fn second_byte_rules_apply_across_chunks() {
        let mut state = Utf8State::new();
        validate_utf8_chunk(b"ok\xED", &mut state).unwrap();
        assert_eq!(
            validate_utf8_chunk(b"\xA0\x80", &mut state),
            Err(invalid(0, 0xA0))
        );

        let mut state = Utf8State::new();
        validate_utf8_chunk(b"\xF0\x9F", &mut state).unwrap();
        validate_utf8_chunk(b"\x98", &mut state).unwrap();
        assert_eq!(
            validate_utf8_chunk(b"\x80zz\xC0", &mut state),
            Err(invalid(3, 0xC0))
        );
    }

    #[test]
    fn bits_round_trip_for_every_reachable_prefix() {
        for text in ["é", "€", "😀", "\u{10FFFF}", "\u{800}"] {
            let bytes = text.as_bytes();
            for cut in 1..bytes.len() {
                let mut state = Utf8State::new();
                validate_utf8_chunk(&bytes[..cut], &mut state).unwrap();
                let bits = state.to_bits();
                assert_ne!(bits, 0);
                assert_eq!(Utf8State::from_bits(bits), Some(state));
                assert_eq!(Utf8State::try_from(bits), Ok(state));
            }
        }
        assert_eq!(Utf8State::from_bits(0), Some(Utf8State::new()));
    }

    #[rstest]
    #[case::stray_payload_when_idle(0x0000_0041)]
    #[case::unknown_length(0x5100_00C2)]
    #[case::consumed_everything(0x2200_80C2)]
    #[case::surrogate_prefix(0x3200_A0ED)]
    #[case::length_disagrees_with_lead(0x4100_00E2)]
    #[case::trailing_garbage(0x3100_FFE2)]
    fn unreachable_bits_are_rejected(#[case] bits: u32) {
        assert_eq!(Utf8State::from_bits(bits), None);
        assert!(Utf8State::try_from(bits).is_err());
    }
}
