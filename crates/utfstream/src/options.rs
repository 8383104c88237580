/// Order in which the two bytes of a UTF-16 code unit appear in the input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ByteOrder {
    /// Most significant byte first (UTF-16BE).
    #[default]
    BigEndian,
    /// Least significant byte first (UTF-16LE).
    LittleEndian,
}

impl ByteOrder {
    /// Combine two consecutive input bytes into a code unit.
    #[inline]
    #[must_use]
    pub const fn unit(self, first: u8, second: u8) -> u16 {
        match self {
            Self::BigEndian => u16::from_be_bytes([first, second]),
            Self::LittleEndian => u16::from_le_bytes([first, second]),
        }
    }

    /// The byte order announced by a byte order mark (U+FEFF) in the first
    /// two bytes of `head`, if there is one.
    ///
    /// ```rust
    /// use utfstream::ByteOrder;
    ///
    /// assert_eq!(ByteOrder::from_bom(b"\xFF\xFEa\0"), Some(ByteOrder::LittleEndian));
    /// assert_eq!(ByteOrder::from_bom(b"\0a"), None);
    /// ```
    #[must_use]
    pub fn from_bom(head: &[u8]) -> Option<Self> {
        match head {
            [0xFE, 0xFF, ..] => Some(Self::BigEndian),
            [0xFF, 0xFE, ..] => Some(Self::LittleEndian),
            _ => None,
        }
    }
}

/// What [`Utf16Decoder`](crate::Utf16Decoder) does with a byte order mark at
/// the start of the stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BomMode {
    /// Treat a leading U+FEFF like any other character and convert it.
    #[default]
    Keep,
    /// Drop a leading U+FEFF written in the configured byte order.
    Strip,
    /// Drop a leading byte order mark in either order and switch to the byte
    /// order it announces. Without a mark the configured order is used.
    Detect,
}

/// Configuration for a [`Utf16Decoder`](crate::Utf16Decoder).
///
/// # Examples
///
/// ```rust
/// use utfstream::{BomMode, ByteOrder, Utf16Decoder, Utf16Options};
///
/// let mut decoder = Utf16Decoder::new(Utf16Options {
///     byte_order: ByteOrder::LittleEndian,
///     bom: BomMode::Detect,
/// });
/// let mut out = Vec::new();
/// decoder.feed(&mut out, b"\xFE\xFF\x00h\x00i").unwrap();
/// assert_eq!(decoder.byte_order(), ByteOrder::BigEndian);
/// decoder.finish().unwrap();
/// assert_eq!(out, b"hi");
/// ```
///
/// # Default
///
/// Big-endian, byte order marks kept.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Utf16Options {
    /// Byte order of the input, or the fallback when detecting.
    pub byte_order: ByteOrder,

    /// Handling of a leading byte order mark.
    pub bom: BomMode,
}
