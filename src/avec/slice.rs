//! Slice-based decoder implementation.

use alloc::vec::Vec;

use crate::sans::{DecodeError, Options, stream};

use super::{FromRecords, publish};

/// Decode records from a slice of a document, publishing to a receiver.
///
/// Returns the warnings met along the way, in order, or the error that ended
/// decoding. Records decoded before a fatal error are still published.
///
/// This method is also re-exported as `freewheel::avec::decode_slice`.
pub fn decode(r: &[u8], o: &mut impl FromRecords) -> Result<Vec<DecodeError>, DecodeError> {
    decode_with(r, Options::default(), o)
}

/// [`decode`] with explicit options.
pub fn decode_with(
    r: &[u8],
    options: Options,
    o: &mut impl FromRecords,
) -> Result<Vec<DecodeError>, DecodeError> {
    let mut warnings = Vec::new();

    for item in stream::decode_with(r, options) {
        match item {
            Ok(record) => publish(&record, o),
            Err(err) if err.is_fatal() => return Err(err),
            Err(warning) => warnings.push(warning),
        }
    }

    Ok(warnings)
}
