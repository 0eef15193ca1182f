//! Document and record headers.

use tartan_bitfield::bitfield;
use thiserror::Error;
use zerocopy::FromBytes;

use super::check::compute_crc;

/// Length of a document header without its checksum.
pub const SHORT_HEADER_LEN: usize = 12;
/// Length of a document header carrying its own checksum.
pub const LONG_HEADER_LEN: usize = 14;

/// The data type marker every document header must carry.
pub const FIT_SIGNATURE: [u8; 4] = *b".FIT";

/// An error decoding a document header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum HeaderError {
    /// Incorrect filetype marker.
    #[error("Incorrect file type marker.")]
    NotFitData,
    /// Unknown header length.
    #[error("Unknown header length ({0}).")]
    UnknownHeaderLength(u8),
    /// The header's own checksum does not match its contents.
    #[error("Calculated ({calculated:#06x}) and found ({found:#06x}) header CRC values do not match.")]
    HeaderChecksum { found: u16, calculated: u16 },
}

/// A decoded document header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct FileHeader {
    pub header_size: u8,
    pub protocol_version: u8,
    pub profile_version: u16,
    /// Number of record bytes between the header and the trailing checksum.
    pub data_size: u32,
    pub data_type: [u8; 4],
    /// Checksum over the first twelve header bytes, for long headers.
    pub crc: Option<u16>,
}

#[repr(C, packed)]
#[derive(FromBytes)]
struct RawFileHeader {
    header_size: u8,
    protocol_version: u8,
    profile_version: [u8; 2],
    data_size: [u8; 4],
    data_type: [u8; 4],
}

impl FileHeader {
    /// Peek at the declared header length, which is the first byte.
    pub fn declared_len(first: u8) -> Result<usize, HeaderError> {
        match first as usize {
            SHORT_HEADER_LEN => Ok(SHORT_HEADER_LEN),
            LONG_HEADER_LEN => Ok(LONG_HEADER_LEN),
            _ => Err(HeaderError::UnknownHeaderLength(first)),
        }
    }

    /// Decode a complete header.
    ///
    /// `r` must hold exactly the number of bytes given by
    /// [`FileHeader::declared_len`]. With `verify_crc`, a non-zero header
    /// checksum must match the first twelve bytes.
    pub fn parse(r: &[u8], verify_crc: bool) -> Result<Self, HeaderError> {
        let first = r.first().copied().unwrap_or(0);
        if Self::declared_len(first)? != r.len() {
            Err(HeaderError::UnknownHeaderLength(first))?;
        }

        let mut short = [0; SHORT_HEADER_LEN];
        short.copy_from_slice(&r[..SHORT_HEADER_LEN]);

        let RawFileHeader {
            header_size,
            protocol_version,
            profile_version,
            data_size,
            data_type,
        } = zerocopy::transmute!(short);

        if data_type != FIT_SIGNATURE {
            Err(HeaderError::NotFitData)?;
        }

        let crc = match r[SHORT_HEADER_LEN..] {
            [a, b] => Some(u16::from_le_bytes([a, b])),
            _ => None,
        };

        if let Some(found) = crc.filter(|&found| verify_crc && found != 0) {
            let calculated = compute_crc(0, &short);
            if found != calculated {
                Err(HeaderError::HeaderChecksum { found, calculated })?;
            }
        }

        Ok(Self {
            header_size,
            protocol_version,
            profile_version: u16::from_le_bytes(profile_version),
            data_size: u32::from_le_bytes(data_size),
            data_type,
            crc,
        })
    }
}

/// The kind of record announced by a record header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    /// A definition record, possibly declaring developer fields.
    Definition { developer: bool },
    /// A data record with a normal header.
    Data,
    /// A data record whose header carries a five-bit time offset.
    CompressedTimestamp { time_offset: u8 },
}

/// A decoded record header byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    pub local: u8,
    pub kind: RecordKind,
}

impl RecordHeader {
    pub fn parse(r: u8) -> Self {
        bitfield! {
            struct Header(u8) {
                [7] is_compressed,
            }
        }

        if Header(r).is_compressed() {
            bitfield! {
                struct CompressedHeader(u8) {
                    [0..5] time_offset: u8,
                    [5..7] local_message: u8,
                }
            }

            let header = CompressedHeader(r);

            Self {
                local: header.local_message(),
                kind: RecordKind::CompressedTimestamp {
                    time_offset: header.time_offset(),
                },
            }
        } else {
            bitfield! {
                struct NormalHeader(u8) {
                    [0..4] local_message: u8,
                    [5] is_developer,
                    [6] is_definition,
                }
            }

            let header = NormalHeader(r);

            let kind = if header.is_definition() {
                RecordKind::Definition {
                    developer: header.is_developer(),
                }
            } else {
                RecordKind::Data
            };

            Self {
                local: header.local_message(),
                kind,
            }
        }
    }
}
