//! Base types, field values and decoded data records.

use alloc::{string::String, vec::Vec};

use super::cursor::{Cursor, Endian, Truncated};
use crate::profile::{Coordinates, message, record, semicircles_to_degrees};

/// The base type of a field, as declared in a definition record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseType {
    /// `enum`
    Enum,
    /// `sint8`
    SInt8,
    /// `uint8`
    UInt8,
    /// `sint16`
    SInt16,
    /// `uint16`
    UInt16,
    /// `sint32`
    SInt32,
    /// `uint32`
    UInt32,
    /// `string`
    String,
    /// `float32`
    Float32,
    /// `float64`
    Float64,
    /// `uint8z`
    UInt8z,
    /// `uint16z`
    UInt16z,
    /// `uint32z`
    UInt32z,
    /// `byte`
    Byte,
    /// `sint64`
    SInt64,
    /// `uint64`
    UInt64,
    /// `uint64z`
    UInt64z,
    /// A base type this decoder does not know, with its raw code.
    Unknown(u8),
}

impl BaseType {
    /// Map a base type code to a base type.
    ///
    /// Only the base type number (the low five bits) is considered, as some
    /// writers omit the endian-ability flag.
    pub fn from_code(code: u8) -> Self {
        match code & 0x1F {
            0x00 => Self::Enum,
            0x01 => Self::SInt8,
            0x02 => Self::UInt8,
            0x03 => Self::SInt16,
            0x04 => Self::UInt16,
            0x05 => Self::SInt32,
            0x06 => Self::UInt32,
            0x07 => Self::String,
            0x08 => Self::Float32,
            0x09 => Self::Float64,
            0x0A => Self::UInt8z,
            0x0B => Self::UInt16z,
            0x0C => Self::UInt32z,
            0x0D => Self::Byte,
            0x0E => Self::SInt64,
            0x0F => Self::UInt64,
            0x10 => Self::UInt64z,
            _ => Self::Unknown(code),
        }
    }

    /// The canonical base type code.
    pub fn code(self) -> u8 {
        match self {
            Self::Enum => 0x00,
            Self::SInt8 => 0x01,
            Self::UInt8 => 0x02,
            Self::SInt16 => 0x83,
            Self::UInt16 => 0x84,
            Self::SInt32 => 0x85,
            Self::UInt32 => 0x86,
            Self::String => 0x07,
            Self::Float32 => 0x88,
            Self::Float64 => 0x89,
            Self::UInt8z => 0x0A,
            Self::UInt16z => 0x8B,
            Self::UInt32z => 0x8C,
            Self::Byte => 0x0D,
            Self::SInt64 => 0x8E,
            Self::UInt64 => 0x8F,
            Self::UInt64z => 0x90,
            Self::Unknown(code) => code,
        }
    }

    /// Width in bytes of a single element, if the base type is known.
    pub fn width(self) -> Option<usize> {
        Some(match self {
            Self::Enum | Self::SInt8 | Self::UInt8 | Self::UInt8z => 1,
            Self::String | Self::Byte => 1,
            Self::SInt16 | Self::UInt16 | Self::UInt16z => 2,
            Self::SInt32 | Self::UInt32 | Self::UInt32z | Self::Float32 => 4,
            Self::SInt64 | Self::UInt64 | Self::UInt64z | Self::Float64 => 8,
            Self::Unknown(_) => return None,
        })
    }

    /// The raw bit pattern marking an element as invalid.
    fn invalid(self) -> u64 {
        match self {
            Self::Enum | Self::UInt8 | Self::Byte => 0xFF,
            Self::SInt8 => 0x7F,
            Self::SInt16 => 0x7FFF,
            Self::UInt16 => 0xFFFF,
            Self::SInt32 => 0x7FFF_FFFF,
            Self::UInt32 | Self::Float32 => 0xFFFF_FFFF,
            Self::SInt64 => 0x7FFF_FFFF_FFFF_FFFF,
            Self::UInt64 | Self::Float64 => u64::MAX,
            Self::String | Self::UInt8z | Self::UInt16z | Self::UInt32z | Self::UInt64z => 0,
            Self::Unknown(_) => 0,
        }
    }
}

/// A decoded field value.
///
/// Elements holding their base type's 'invalid' marker decode to
/// [`Value::Absent`] rather than to the marker's numeric value.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize), serde(untagged))]
pub enum Value {
    /// The field (or array element) holds no value.
    Absent,
    Enum(u8),
    SInt8(i8),
    UInt8(u8),
    SInt16(i16),
    UInt16(u16),
    SInt32(i32),
    UInt32(u32),
    /// Text up to the first NUL byte.
    String(String),
    Float32(f32),
    Float64(f64),
    UInt8z(u8),
    UInt16z(u16),
    UInt32z(u32),
    /// The bytes of a `byte` field.
    Bytes(Vec<u8>),
    SInt64(i64),
    UInt64(u64),
    UInt64z(u64),
    /// A field holding more than one element.
    Array(Vec<Value>),
}

impl Value {
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    /// Iterate the elements of an array, or a scalar as a single element.
    ///
    /// Absent values have no elements.
    pub fn elements(&self) -> impl Iterator<Item = &Value> {
        let slice = match self {
            Self::Absent => &[][..],
            Self::Array(items) => items.as_slice(),
            scalar => core::slice::from_ref(scalar),
        };
        slice.iter()
    }

    /// Decode a field of `size` bytes.
    ///
    /// Returns `None` if the base type is unknown or the size is not a
    /// multiple of its width; the bytes are consumed either way.
    pub fn decode(
        c: &mut Cursor<'_>,
        base_type: BaseType,
        size: u8,
        endian: Endian,
    ) -> Result<Option<Self>, Truncated> {
        let r = c.read_bytes(size as usize)?;

        let Some(width) = base_type.width() else {
            return Ok(None);
        };

        if size == 0 {
            return Ok(Some(Self::Absent));
        }

        if r.len() % width != 0 {
            return Ok(None);
        }

        let value = match base_type {
            BaseType::String => {
                let text = r.split(|&b| b == 0).next().unwrap_or_default();
                if text.is_empty() {
                    Self::Absent
                } else {
                    Self::String(String::from_utf8_lossy(text).into_owned())
                }
            }
            BaseType::Byte => {
                if r.iter().all(|&b| b == 0xFF) {
                    Self::Absent
                } else {
                    Self::Bytes(r.to_vec())
                }
            }
            _ if r.len() == width => element(&mut Cursor::new(r), base_type, width, endian),
            _ => {
                let mut elements = Cursor::new(r);
                Self::Array(
                    (0..r.len() / width)
                        .map(|_| element(&mut elements, base_type, width, endian))
                        .collect(),
                )
            }
        };

        Ok(Some(value))
    }
}

/// Decode a single numeric element. The cursor must hold at least `width`
/// bytes.
fn element(c: &mut Cursor<'_>, base_type: BaseType, width: usize, endian: Endian) -> Value {
    let raw = match width {
        1 => c.read_u8().map(u64::from),
        2 => c.read_u16(endian).map(u64::from),
        4 => c.read_u32(endian).map(u64::from),
        _ => c.read_u64(endian),
    };

    let Ok(raw) = raw else {
        return Value::Absent;
    };

    if raw == base_type.invalid() {
        return Value::Absent;
    }

    match base_type {
        BaseType::Enum => Value::Enum(raw as u8),
        BaseType::SInt8 => Value::SInt8(raw as u8 as i8),
        BaseType::UInt8 => Value::UInt8(raw as u8),
        BaseType::SInt16 => Value::SInt16(raw as u16 as i16),
        BaseType::UInt16 => Value::UInt16(raw as u16),
        BaseType::SInt32 => Value::SInt32(raw as u32 as i32),
        BaseType::UInt32 => Value::UInt32(raw as u32),
        BaseType::Float32 => Value::Float32(f32::from_bits(raw as u32)),
        BaseType::Float64 => Value::Float64(f64::from_bits(raw)),
        BaseType::UInt8z => Value::UInt8z(raw as u8),
        BaseType::UInt16z => Value::UInt16z(raw as u16),
        BaseType::UInt32z => Value::UInt32z(raw as u32),
        BaseType::SInt64 => Value::SInt64(raw as i64),
        BaseType::UInt64 => Value::UInt64(raw),
        BaseType::UInt64z => Value::UInt64z(raw),
        BaseType::String | BaseType::Byte | BaseType::Unknown(_) => Value::Absent,
    }
}

/// A field of a data record.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct DataField {
    pub number: u8,
    pub value: Value,
}

/// A developer field of a data record, left undecoded.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct DeveloperField {
    pub developer_index: u8,
    pub number: u8,
    pub bytes: Vec<u8>,
}

/// A decoded data record.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct DataRecord {
    /// Local message type the record was decoded with.
    pub local: u8,
    /// Global message number.
    pub global: u16,
    /// Time offset from a compressed timestamp header.
    pub time_offset: Option<u8>,
    /// Timestamp resolved from a compressed timestamp header, when an earlier
    /// record provided a full timestamp.
    pub timestamp: Option<u32>,
    /// Fields in declared order.
    pub fields: Vec<DataField>,
    pub developer_fields: Vec<DeveloperField>,
}

impl DataRecord {
    /// Look up a field's value by field number.
    pub fn field(&self, number: u8) -> Option<&Value> {
        self.fields
            .iter()
            .find(|f| f.number == number)
            .map(|f| &f.value)
    }

    /// Position of a `record` message, from its `position_lat` and
    /// `position_long` fields.
    ///
    /// Returns `None` for other messages, or when either field is absent.
    pub fn coordinates(&self) -> Option<Coordinates> {
        if self.global != message::RECORD {
            return None;
        }

        let degrees = |number| match self.field(number) {
            Some(Value::SInt32(semicircles)) => Some(semicircles_to_degrees(*semicircles)),
            _ => None,
        };

        Some(Coordinates {
            latitude: degrees(record::POSITION_LAT)?,
            longitude: degrees(record::POSITION_LONG)?,
        })
    }
}
