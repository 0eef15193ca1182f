//! Errors and warnings reported while decoding a document.

use thiserror::Error;

use super::{cursor::Truncated, header::HeaderError};

/// A condition encountered while decoding.
///
/// Fatal conditions end the stream after being reported once. The remaining
/// variants are warnings: they are reported alongside the records they concern
/// and decoding continues. See [`DecodeError::is_fatal`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[non_exhaustive]
pub enum DecodeError {
    /// Malformed or foreign document header.
    #[error("Invalid file header: {0}")]
    InvalidHeader(#[from] HeaderError),
    /// The input ended before a header, record or checksum was complete, or a
    /// record extends past the declared size of the record section.
    #[error("Input truncated at offset {offset} ({needed} more bytes needed).")]
    TruncatedInput { offset: usize, needed: usize },
    /// A data record refers to a local message type with no definition.
    #[error("Data record at offset {offset} uses undefined local message type {local}.")]
    UndefinedMessageType { local: u8, offset: usize },
    /// Calculated and found CRC values do not match.
    #[error("Calculated ({calculated:#06x}) and found ({found:#06x}) CRC values do not match.")]
    ChecksumMismatch { found: u16, calculated: u16 },
    /// A field declares a base type this decoder does not know.
    #[error("Field {field} of message {global} has unsupported base type {base_type:#04x}.")]
    UnsupportedBaseType { global: u16, field: u8, base_type: u8 },
    /// A field's size is not a whole number of base type elements.
    #[error("Field {field} of message {global} has size {size}, not a multiple of base type {base_type:#04x}.")]
    InvalidFieldSize {
        global: u16,
        field: u8,
        size: u8,
        base_type: u8,
    },
    /// A stream would have to buffer more bytes than it is allowed to.
    #[error("Buffered input exceeds the limit of {limit} bytes.")]
    BufferLimit { limit: usize },
}

impl DecodeError {
    /// Whether this condition ends the stream.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::InvalidHeader(_)
            | Self::TruncatedInput { .. }
            | Self::UndefinedMessageType { .. }
            | Self::BufferLimit { .. } => true,
            Self::ChecksumMismatch { .. }
            | Self::UnsupportedBaseType { .. }
            | Self::InvalidFieldSize { .. } => false,
        }
    }
}

impl From<Truncated> for DecodeError {
    fn from(Truncated { offset, needed }: Truncated) -> Self {
        Self::TruncatedInput { offset, needed }
    }
}
