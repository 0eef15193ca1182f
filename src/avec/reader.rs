//! Reader-based decoder implementation.
//!
//! _Requires Cargo feature `std`._

use std::{
    boxed::Box,
    io::{self, ErrorKind, Read, Seek, SeekFrom},
    vec::Vec,
};

use flate2::read::GzDecoder;
use thiserror::Error;
use tracing::trace;

use crate::sans::{DataRecord, DecodeError, Options, Stream, stream::Poll};

use super::{FromRecords, publish};

/// Bytes requested from the reader at a time.
pub const CHUNK_SIZE: usize = 512;

/// Errors occurring while decoding from a reader.
#[derive(Debug, Error)]
pub enum Error {
    /// An error from the supplied reader.
    #[error(transparent)]
    Io(#[from] io::Error),
    /// A decoding error or warning.
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// Decode records from a reader of a document, publishing to a receiver.
///
/// Returns the warnings met along the way, in order, or the error that ended
/// decoding.
///
/// This method is also re-exported as `freewheel::avec::decode_reader`.
///
/// _Requires Cargo feature `std`._
pub fn decode(r: &mut impl Read, o: &mut impl FromRecords) -> Result<Vec<DecodeError>, Error> {
    let mut warnings = Vec::new();

    for item in records(r) {
        match item {
            Ok(record) => publish(&record, o),
            Err(Error::Decode(warning)) if !warning.is_fatal() => warnings.push(warning),
            Err(err) => return Err(err),
        }
    }

    Ok(warnings)
}

/// Wrap a reader of a document that may be gzip-compressed (`.fit.gz`).
///
/// Gzip input is decompressed while reading. Any other input is read as is,
/// from the reader's position at the time of the call.
pub fn inflate<'a, R: Read + Seek + 'a>(mut reader: R) -> io::Result<Box<dyn Read + 'a>> {
    let start = reader.stream_position()?;

    let gz = GzDecoder::new(reader);
    if gz.header().is_some() {
        trace!("gzip input");
        return Ok(Box::new(gz));
    }

    let mut reader = gz.into_inner();
    reader.seek(SeekFrom::Start(start))?;
    Ok(Box::new(reader))
}

/// Iterate the records of a document read in chunks of [`CHUNK_SIZE`].
pub fn records<R: Read>(reader: R) -> ReaderRecords<R> {
    records_with(reader, Options::default())
}

/// [`records`] with explicit options.
pub fn records_with<R: Read>(reader: R, options: Options) -> ReaderRecords<R> {
    ReaderRecords {
        reader,
        stream: Stream::with_options(options),
        failed: false,
    }
}

/// Iterator over the items of a document read from a reader.
///
/// The iterator ends after the reader is exhausted, after a fatal decoding
/// error, or after an I/O error.
#[derive(Debug)]
pub struct ReaderRecords<R> {
    reader: R,
    stream: Stream,
    failed: bool,
}

impl<R> ReaderRecords<R> {
    pub fn stream(&self) -> &Stream {
        &self.stream
    }
}

impl<R: Read> Iterator for ReaderRecords<R> {
    type Item = Result<DataRecord, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut buf = [0; CHUNK_SIZE];

        while !self.failed {
            match self.stream.poll() {
                Poll::Ready(item) => return Some(item.map_err(Error::from)),
                Poll::Done => return None,
                Poll::Pending => {}
            }

            match self.reader.read(&mut buf) {
                Ok(0) => self.stream.close(),
                Ok(n) => {
                    trace!(bytes = n, "read chunk");
                    self.stream.feed(&buf[..n]);
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => {}
                Err(err) => {
                    self.failed = true;
                    return Some(Err(err.into()));
                }
            }
        }

        None
    }
}
