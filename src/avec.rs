//! Convenience interfaces for common decoding patterns.
//!
//! The functions in this module are suited to decoding records from files and
//! data slices, publishing to the [`FromRecords`] and [`FromRecord`] traits.
//!
//! In many cases (when records are of a known shape), these traits can be
//! derived. See the [`FromRecords`](macro@FromRecords) and
//! [`FromRecord`](macro@FromRecord) macros for details.

use alloc::{string::String, vec::Vec};

use crate::sans::{DataRecord, Value};

#[cfg(feature = "std")]
pub mod reader;
pub mod slice;

#[cfg(feature = "std")]
pub use reader::decode as decode_reader;
pub use slice::decode as decode_slice;

/// Derive [`FromRecords`] for a struct holding a collection of records.
///
/// _Requires Cargo feature `derive`._
///
/// # Example
///
/// To collect a single record, add the `record(N)` attribute to an `Option<T>`
/// struct field, where `N` is the global message number and `T` is a type
/// implementing [`FromRecord`] and [`Default`]. Additional records received
/// for the same message number will overwrite earlier ones. To collect
/// multiple occurrences of a record, apply the attribute to a `Vec<T>`
/// instead.
///
/// ```
/// #[derive(Debug, Default, FromRecords)]
/// struct ActivityRecordSet {
///     #[record(0)]
///     file_id: Option<FileId>,
///     #[record(20)]
///     records: Vec<Record>,
/// }
/// ```
#[cfg(feature = "derive")]
pub use freewheel_derive::FromRecords;

/// Produce record receivers for a document.
///
/// See the [`FromRecords`](macro@FromRecords) derive macro for an automatic
/// implementation of this trait.
pub trait FromRecords {
    /// Retrieve a receiver for a record, if one exists.
    fn add_record(&mut self, id: u16) -> Option<&mut dyn FromRecord>;
}

/// Derive [`FromRecord`] for a struct representing a single record.
///
/// _Requires Cargo feature `derive`._
///
/// # Examples
///
/// To receive a single value for a record field, add the `field(N)` attribute
/// to an `Option<T>` struct field, where `N` is the field number and `T`
/// implements [`FromValue`]. Additional values received for the same field
/// will replace earlier ones.
///
/// To receive the time offset stored in compressed timestamp headers, supply
/// `time` in place of a field number. To receive the record's timestamp,
/// whether stored in field 253 or resolved from a compressed header, supply
/// `timestamp`.
///
/// ```
/// #[derive(Debug, Default, FromRecord)]
/// struct Record {
///     #[field(timestamp)]
///     timestamp: Option<u32>,
///     #[field(0)]
///     position_lat: Option<i32>,
///     #[field(1)]
///     position_long: Option<i32>,
///     #[field(2)]
///     altitude: Option<u16>,
/// }
/// ```
///
/// To receive arrays element by element, or to convert values on arrival,
/// supply an accumulator closure. It is called once per present element.
/// Since the element type cannot be inferred, the second argument must be
/// typed.
///
/// ```
/// #[derive(Debug, Default, FromRecord)]
/// struct Hrv {
///     #[field(0, |v, t: u16| v.push(t))]
///     beat_intervals: Vec<u16>,
/// }
/// ```
#[cfg(feature = "derive")]
pub use freewheel_derive::FromRecord;

/// Receive field values for a record.
///
/// Fields holding the 'invalid' marker value are not published. Developer
/// fields are published as raw bytes.
///
/// The default implementation of each method ignores received values.
///
/// See the [`FromRecord`](macro@FromRecord) derive macro for an automatic
/// implementation of this trait.
#[allow(unused_variables)]
pub trait FromRecord {
    /// Add the compressed time offset to the record.
    fn add_time_offset(&mut self, offset: u8) {}
    /// Add the record's timestamp.
    fn add_timestamp(&mut self, timestamp: u32) {}
    /// Add a field value to the record.
    fn add_field(&mut self, field: u8, value: &Value) {}
    /// Add the bytes of a developer field to the record.
    fn add_developer_field(&mut self, developer_index: u8, field: u8, bytes: &[u8]) {}
}

/// Publish a decoded record to a receiver.
pub fn publish<O: FromRecords + ?Sized>(record: &DataRecord, o: &mut O) {
    let Some(o) = o.add_record(record.global) else {
        return;
    };

    if let Some(offset) = record.time_offset {
        o.add_time_offset(offset);
    }
    if let Some(timestamp) = record.timestamp {
        o.add_timestamp(timestamp);
    }

    for field in record.fields.iter().filter(|f| !f.value.is_absent()) {
        o.add_field(field.number, &field.value);
    }

    for field in &record.developer_fields {
        o.add_developer_field(field.developer_index, field.number, &field.bytes);
    }
}

/// Conversion from a decoded [`Value`].
///
/// Integer conversions accept the base types sharing the integer's width and
/// signedness (`u8` accepts `enum`, `uint8` and `uint8z`). No conversion
/// widens or narrows.
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> Option<Self>;
}

macro_rules! from_value {
    ($t:ty, $($variant:ident),+) => {
        impl FromValue for $t {
            fn from_value(value: &Value) -> Option<Self> {
                match value {
                    $(Value::$variant(x) => Some(*x),)+
                    _ => None,
                }
            }
        }
    };
}

from_value!(u8, Enum, UInt8, UInt8z);
from_value!(u16, UInt16, UInt16z);
from_value!(u32, UInt32, UInt32z);
from_value!(u64, UInt64, UInt64z);

from_value!(i8, SInt8);
from_value!(i16, SInt16);
from_value!(i32, SInt32);
from_value!(i64, SInt64);

from_value!(f32, Float32);
from_value!(f64, Float64);

impl FromValue for String {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(s.clone()),
            _ => None,
        }
    }
}

impl FromValue for Value {
    fn from_value(value: &Value) -> Option<Self> {
        Some(value.clone())
    }
}

/// Collects the present elements of an array, a scalar as a single element,
/// or the bytes of a `byte` field.
impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Bytes(bytes) => Some(
                bytes
                    .iter()
                    .filter_map(|b| T::from_value(&Value::UInt8(*b)))
                    .collect(),
            ),
            value => Some(value.elements().filter_map(T::from_value).collect()),
        }
    }
}
