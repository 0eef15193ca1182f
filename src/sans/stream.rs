//! Document-level decoding over whole or incrementally supplied input.
//!
//! [`Decoder`] is the state machine: it is handed the unconsumed input on
//! every call, reports how many bytes it consumed, and never holds bytes of
//! its own. [`decode`] drives it over a complete slice as an iterator, and
//! [`Stream`] drives it over input arriving in chunks, buffering only the
//! unconsumed tail.

use alloc::{collections::VecDeque, vec::Vec};

use either::Either::{Left, Right};
use tracing::{debug, warn};

use super::{
    check::Crc,
    cursor::Cursor,
    data::DataRecord,
    error::DecodeError,
    header::FileHeader,
    record::RecordDecoder,
};

/// An item produced by decoding: a data record, or a condition that is either
/// a warning or fatal (see [`DecodeError::is_fatal`]).
pub type Item = Result<DataRecord, DecodeError>;

/// Decoding options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    /// Compare the trailing checksum of each document (default `true`).
    pub verify_checksum: bool,
    /// Compare the checksum of long document headers (default `true`).
    pub verify_header_checksum: bool,
    /// Accept further documents after the first one's checksum (default
    /// `true`).
    pub chained: bool,
    /// Upper bound on the bytes a [`Stream`] may hold at once.
    pub max_buffered: Option<usize>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            verify_checksum: true,
            verify_header_checksum: true,
            chained: true,
            max_buffered: None,
        }
    }
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_checksum_verification(mut self, enabled: bool) -> Self {
        self.verify_checksum = enabled;
        self
    }

    pub fn with_header_checksum_verification(mut self, enabled: bool) -> Self {
        self.verify_header_checksum = enabled;
        self
    }

    pub fn with_chained_documents(mut self, enabled: bool) -> Self {
        self.chained = enabled;
        self
    }

    pub fn with_max_buffered(mut self, limit: usize) -> Self {
        self.max_buffered = Some(limit);
        self
    }
}

/// The outcome of polling a [`Decoder`].
#[derive(Debug, Clone, PartialEq)]
pub enum Poll {
    /// The next item.
    Ready(Item),
    /// More input is needed to make progress.
    Pending,
    /// Decoding ended, either after a fatal item or at the end of input.
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Header,
    Records { end: usize },
    Checksum,
    Done,
}

/// Result of one step of the state machine.
enum Step {
    Advance(usize, Option<Item>),
    Pending,
    Done,
}

/// Incremental document decoder.
///
/// Each call to [`Decoder::poll`] receives the input not yet consumed by
/// earlier calls, starting exactly where the last consumed byte ended.
#[derive(Debug)]
pub struct Decoder {
    options: Options,
    state: State,
    /// Absolute offset of the next unconsumed byte.
    offset: usize,
    crc: Crc,
    records: RecordDecoder,
    header: Option<FileHeader>,
    documents: usize,
    queued: VecDeque<Item>,
    warnings: Vec<DecodeError>,
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new(Options::default())
    }
}

impl Decoder {
    pub fn new(options: Options) -> Self {
        Self {
            options,
            state: State::Header,
            offset: 0,
            crc: Crc::new(),
            records: RecordDecoder::new(),
            header: None,
            documents: 0,
            queued: VecDeque::new(),
            warnings: Vec::new(),
        }
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Header of the document being decoded, or of the last one decoded.
    pub fn header(&self) -> Option<&FileHeader> {
        self.header.as_ref()
    }

    /// Number of bytes consumed so far.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Number of documents decoded through their trailing checksum.
    pub fn documents(&self) -> usize {
        self.documents
    }

    /// Whether decoding has ended.
    pub fn is_done(&self) -> bool {
        self.state == State::Done && self.queued.is_empty()
    }

    /// Decode the next item from `input`.
    ///
    /// `input` must begin at the first byte not yet consumed. Returns the
    /// number of bytes consumed, which the caller must drop before the next
    /// call. With `at_end`, no further input will follow: running out of
    /// bytes is then reported as [`DecodeError::TruncatedInput`] instead of
    /// [`Poll::Pending`].
    pub fn poll(&mut self, input: &[u8], at_end: bool) -> (usize, Poll) {
        let mut used = 0;

        loop {
            if let Some(item) = self.queued.pop_front() {
                return (used, Poll::Ready(item));
            }

            match self.step(&input[used..], at_end) {
                Step::Advance(n, item) => {
                    used += n;
                    self.offset += n;
                    if let Some(item) = item {
                        return (used, Poll::Ready(item));
                    }
                }
                Step::Pending => return (used, Poll::Pending),
                Step::Done => return (used, Poll::Done),
            }
        }
    }

    /// End decoding with a fatal error.
    fn fail(&mut self, err: DecodeError) -> Step {
        warn!(%err, offset = self.offset, "decoding stopped");
        self.state = State::Done;
        Step::Advance(0, Some(Err(err)))
    }

    /// Report running out of input at the end of `input`.
    fn starved(&mut self, input: &[u8], needed: usize, at_end: bool) -> Step {
        if at_end {
            self.fail(DecodeError::TruncatedInput {
                offset: self.offset + input.len(),
                needed,
            })
        } else {
            Step::Pending
        }
    }

    fn step(&mut self, input: &[u8], at_end: bool) -> Step {
        match self.state {
            State::Header => self.step_header(input, at_end),
            State::Records { end } => self.step_record(input, at_end, end),
            State::Checksum => self.step_checksum(input, at_end),
            State::Done => Step::Done,
        }
    }

    fn step_header(&mut self, input: &[u8], at_end: bool) -> Step {
        let Some(&first) = input.first() else {
            if at_end && self.documents > 0 {
                self.state = State::Done;
                return Step::Done;
            }
            return self.starved(input, 1, at_end);
        };

        if self.documents > 0 && !self.options.chained {
            warn!(
                offset = self.offset,
                trailing = input.len(),
                "ignoring bytes after document"
            );
            self.state = State::Done;
            return Step::Done;
        }

        let len = match FileHeader::declared_len(first) {
            Ok(len) => len,
            Err(err) => return self.fail(err.into()),
        };

        let Some(r) = input.get(..len) else {
            return self.starved(input, len - input.len(), at_end);
        };

        let header = match FileHeader::parse(r, self.options.verify_header_checksum) {
            Ok(header) => header,
            Err(err) => return self.fail(err.into()),
        };

        debug!(
            offset = self.offset,
            protocol_version = header.protocol_version,
            profile_version = header.profile_version,
            data_size = header.data_size,
            "document header"
        );

        self.crc.reset();
        self.crc.update(r);
        self.records.reset();
        self.header = Some(header);
        self.state = State::Records {
            end: self.offset + len + header.data_size as usize,
        };

        Step::Advance(len, None)
    }

    fn step_record(&mut self, input: &[u8], at_end: bool, end: usize) -> Step {
        let region = end - self.offset;
        if region == 0 {
            self.state = State::Checksum;
            return Step::Advance(0, None);
        }

        let window = &input[..input.len().min(region)];
        let mut c = Cursor::with_offset(window, self.offset);

        match self.records.decode(&mut c, &mut self.warnings) {
            Ok(decoded) => {
                let n = c.position();
                self.crc.update(&window[..n]);

                match decoded {
                    Left(_) => Step::Advance(n, None),
                    Right(record) => {
                        self.queued.extend(self.warnings.drain(..).map(Err));
                        Step::Advance(n, Some(Ok(record)))
                    }
                }
            }
            Err(DecodeError::TruncatedInput { needed, .. }) if window.len() < region => {
                self.starved(input, needed, at_end)
            }
            Err(err) => self.fail(err),
        }
    }

    fn step_checksum(&mut self, input: &[u8], at_end: bool) -> Step {
        let Some(&[a, b]) = input.get(..2) else {
            return self.starved(input, 2 - input.len(), at_end);
        };

        let found = u16::from_le_bytes([a, b]);
        let verified = if self.options.verify_checksum {
            self.crc.verify(found)
        } else {
            Ok(())
        };

        self.documents += 1;
        self.state = State::Header;

        debug!(
            offset = self.offset,
            documents = self.documents,
            crc = found,
            "document complete"
        );

        match verified {
            Ok(()) => Step::Advance(2, None),
            Err(warning) => {
                warn!(%warning, "checksum");
                Step::Advance(2, Some(Err(warning)))
            }
        }
    }
}

/// Decode a complete document held in memory.
///
/// Records are decoded lazily, one per call to `next`. The iterator ends
/// after the input is exhausted or after a fatal item.
pub fn decode(input: &[u8]) -> Records<'_> {
    decode_with(input, Options::default())
}

/// [`decode`] with explicit options.
pub fn decode_with(input: &[u8], options: Options) -> Records<'_> {
    Records {
        decoder: Decoder::new(options),
        input,
    }
}

/// Iterator over the items of a document held in memory.
#[derive(Debug)]
pub struct Records<'a> {
    decoder: Decoder,
    input: &'a [u8],
}

impl Records<'_> {
    pub fn decoder(&self) -> &Decoder {
        &self.decoder
    }
}

impl Iterator for Records<'_> {
    type Item = Item;

    fn next(&mut self) -> Option<Item> {
        let (used, poll) = self.decoder.poll(self.input, true);
        self.input = &self.input[used..];

        match poll {
            Poll::Ready(item) => Some(item),
            Poll::Pending | Poll::Done => None,
        }
    }
}

/// A decoding session over input arriving in chunks.
///
/// Chunk boundaries may fall anywhere, including inside a header, record or
/// checksum; such records are held back until enough bytes arrive. Decoding
/// the same input in any chunking yields the same items.
#[derive(Debug, Default)]
pub struct Stream {
    decoder: Decoder,
    buffer: Vec<u8>,
    consumed: usize,
    closed: bool,
}

impl Stream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: Options) -> Self {
        Self {
            decoder: Decoder::new(options),
            ..Self::default()
        }
    }

    pub fn decoder(&self) -> &Decoder {
        &self.decoder
    }

    /// Bytes received but not yet consumed.
    pub fn buffered(&self) -> usize {
        self.buffer.len() - self.consumed
    }

    /// Append a chunk of input.
    ///
    /// Once decoding has ended, input is discarded.
    pub fn feed(&mut self, chunk: &[u8]) {
        if self.decoder.is_done() {
            self.discard();
            return;
        }

        self.buffer.drain(..self.consumed);
        self.consumed = 0;
        self.buffer.extend_from_slice(chunk);
    }

    /// Signal that no further input will arrive.
    pub fn close(&mut self) {
        self.closed = true;
    }

    /// Decode the next item from the buffered input.
    pub fn poll(&mut self) -> Poll {
        let (used, poll) = self
            .decoder
            .poll(&self.buffer[self.consumed..], self.closed);
        self.consumed += used;

        match (poll, self.decoder.options.max_buffered) {
            (Poll::Pending, Some(limit)) if self.buffered() > limit => {
                let err = DecodeError::BufferLimit { limit };
                self.decoder.fail(err.clone());
                self.discard();
                Poll::Ready(Err(err))
            }
            (Poll::Done, _) => {
                self.discard();
                Poll::Done
            }
            (poll, _) => poll,
        }
    }

    fn discard(&mut self) {
        self.buffer = Vec::new();
        self.consumed = 0;
    }

    /// Append a chunk and emit every item it completes, in order.
    pub fn process(&mut self, chunk: &[u8], mut emit: impl FnMut(Item)) {
        self.feed(chunk);
        while let Poll::Ready(item) = self.poll() {
            emit(item);
        }
    }

    /// Close the stream and emit the remaining items.
    ///
    /// Reports [`DecodeError::TruncatedInput`] if the input ended inside a
    /// document.
    pub fn finish(&mut self, mut emit: impl FnMut(Item)) {
        self.close();
        while let Poll::Ready(item) = self.poll() {
            emit(item);
        }
    }
}
