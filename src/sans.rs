//! Sans-IO decoding core.
//!
//! This module holds the decoder proper. It performs no I/O: bytes are handed
//! in by the caller, and decoded items are handed back one at a time. See
//! [`crate::avec`] for implementations covering common decoding patterns.
//!
//! # Architecture
//!
//! - [`cursor`] reads fixed-width values from a byte slice, failing with a
//! [`cursor::Truncated`] error rather than reading past its end.
//!
//! - [`header`] decodes document headers and record header bytes.
//!
//! - [`definition`] decodes definition records and keeps the active
//! definition for each local message type in a fixed-size table.
//!
//! - [`data`] maps base types to [`data::Value`]s, including the 'invalid'
//! marker of each base type.
//!
//! - [`record`] decodes one record at a time against the active definitions.
//!
//! - [`stream`] drives the record decoder across a document: it checks the
//! header, stops at the declared end of the record section, and compares the
//! trailing [`check`]sum. It accepts input whole or in chunks.
//!
//! Most applications need only [`stream::decode`] for input held in memory,
//! or a [`stream::Stream`] for input arriving piecemeal.
//!
//! Every decoding session owns its state outright; independent sessions may
//! run side by side.

pub mod check;
pub mod cursor;
pub mod data;
pub mod definition;
pub mod error;
pub mod header;
pub mod record;
pub mod stream;

pub use data::{DataField, DataRecord, Value};
pub use error::DecodeError;
pub use stream::{Decoder, Item, Options, Stream, decode};
