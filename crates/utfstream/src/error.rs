use thiserror::Error;

/// A failure reported by the validator or the converter.
///
/// Offsets are byte indices into the chunk passed to the failing call, not
/// into the stream as a whole.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EncodingError {
    /// A byte that cannot appear at this position of a UTF-8 sequence.
    #[error("invalid UTF-8 byte {byte:#04x} at offset {offset}")]
    InvalidUtf8 {
        /// Index of the offending byte in the current chunk.
        offset: usize,
        /// The offending byte.
        byte: u8,
    },
    /// A low surrogate with no high surrogate before it.
    #[error("unpaired low surrogate {unit:#06x} at offset {offset}")]
    UnpairedLowSurrogate {
        /// Index of the first byte of the code unit in the current chunk, or
        /// 0 if the unit started in an earlier chunk.
        offset: usize,
        /// The offending code unit.
        unit: u16,
    },
    /// A high surrogate followed by something other than a low surrogate.
    #[error("high surrogate {high:#06x} followed by {unit:#06x} at offset {offset}")]
    UnpairedHighSurrogate {
        /// Index of the first byte of the unit following the high surrogate,
        /// or 0 if that unit started in an earlier chunk.
        offset: usize,
        /// The pending high surrogate.
        high: u16,
        /// The code unit that should have been a low surrogate.
        unit: u16,
    },
    /// The stream ended inside a multi-byte UTF-8 sequence.
    #[error("UTF-8 stream ended after {consumed} of {expected} bytes of a sequence")]
    TruncatedUtf8 {
        /// Bytes of the sequence seen before the end.
        consumed: u8,
        /// Length announced by the lead byte.
        expected: u8,
    },
    /// The stream ended inside a UTF-16 code unit or surrogate pair.
    #[error(
        "UTF-16 stream ended with {} pending",
        pending_utf16(.pending_byte, .pending_surrogate)
    )]
    TruncatedUtf16 {
        /// A lone byte of an incomplete code unit was pending.
        pending_byte: bool,
        /// A high surrogate was waiting for its low half.
        pending_surrogate: bool,
    },
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn pending_utf16(pending_byte: &bool, pending_surrogate: &bool) -> &'static str {
    match (*pending_byte, *pending_surrogate) {
        (true, true) => "a high surrogate and half a code unit",
        (true, false) => "half a code unit",
        _ => "a high surrogate",
    }
}

impl EncodingError {
    /// Byte offset of the failure in the current chunk, if the failure is
    /// located. Truncation errors have no offset.
    #[must_use]
    pub fn offset(&self) -> Option<usize> {
        match *self {
            Self::InvalidUtf8 { offset, .. }
            | Self::UnpairedLowSurrogate { offset, .. }
            | Self::UnpairedHighSurrogate { offset, .. } => Some(offset),
            Self::TruncatedUtf8 { .. } | Self::TruncatedUtf16 { .. } => None,
        }
    }

    /// Whether the error means the input stopped in the middle of a sequence,
    /// as opposed to containing a malformed one.
    #[must_use]
    pub fn is_truncation(&self) -> bool {
        matches!(self, Self::TruncatedUtf8 { .. } | Self::TruncatedUtf16 { .. })
    }

    /// Move a located error `by` bytes further into the chunk.
    pub(crate) fn shifted(self, by: usize) -> Self {
        match self {
            Self::InvalidUtf8 { offset, byte } => Self::InvalidUtf8 {
                offset: offset + by,
                byte,
            },
            Self::UnpairedLowSurrogate { offset, unit } => Self::UnpairedLowSurrogate {
                offset: offset + by,
                unit,
            },
            Self::UnpairedHighSurrogate { offset, high, unit } => Self::UnpairedHighSurrogate {
                offset: offset + by,
                high,
                unit,
            },
            other => other,
        }
    }
}
