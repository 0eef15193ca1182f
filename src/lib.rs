#![no_std]

//! A streaming decoder for Garmin's Flexible and Interoperable Data Transfer
//! protocol.
//!
//! Freewheel turns a FIT document, supplied whole or in chunks of any size,
//! into an ordered sequence of typed data records. Conditions the format
//! tolerates (such as a checksum mismatch) are reported as warnings between
//! records; structural corruption ends the sequence with a single fatal error.
//!
//! Most users should begin with the functions and derive macros in the [`avec`]
//! module, or with [`sans::decode`] and [`sans::Stream`] when working with raw
//! records. Applications embedding the decoder behind a message-passing
//! boundary (such as a web worker) can use the [`host`] module.
//!
//! ## Cargo Features
//!
//! The following crate feature flags are available:
//!
//! - `derive`: enable derive macros (default).
//! - `std`: enable reader-based decoding, gzip input and the [`host`] module
//!   (default).
//! - `serde`: serialize records, and emit JSON from [`host`] sessions.
//! - `cli`: build the `fit` and `fitdevices` command-line tools.

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

pub mod avec;
pub mod devices;
#[cfg(feature = "std")]
pub mod host;
pub mod profile;
pub mod sans;
