//! Decoding sessions for applications that receive input piecemeal from a host
//! environment, such as a web worker fed by a network download.
//!
//! The host calls [`init`] once, creates a [`Session`] per file, hands it each
//! chunk as it arrives, and finally calls [`Session::finish`].
//!
//! _Requires Cargo feature `std`._

use std::sync::Once;

#[cfg(feature = "serde")]
use std::string::{String, ToString};

use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::sans::{Item, Options, Stream};

/// Install a `tracing` subscriber writing to standard error.
///
/// The filter is read from `RUST_LOG`, defaulting to `info`. Calling this more
/// than once, or after another subscriber was installed, has no effect.
pub fn init() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        if tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init()
            .is_err()
        {
            debug!("subscriber already installed");
        }
    });
}

/// A decoding session for one file (or chain of files).
#[derive(Debug, Default)]
pub struct Session {
    stream: Stream,
    records: usize,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: Options) -> Self {
        Self {
            stream: Stream::with_options(options),
            records: 0,
        }
    }

    pub fn stream(&self) -> &Stream {
        &self.stream
    }

    /// Number of data records emitted so far.
    pub fn records(&self) -> usize {
        self.records
    }

    /// Append a chunk and emit every item it completes, in order.
    ///
    /// Returns the number of data records emitted.
    pub fn process(&mut self, chunk: &[u8], mut emit: impl FnMut(Item)) -> usize {
        let mut n = 0;
        self.stream.process(chunk, |item| {
            n += item.is_ok() as usize;
            emit(item);
        });
        self.records += n;

        info!(records = n, buffered = self.stream.buffered(), "processed chunk");
        n
    }

    /// Signal the end of input and emit the remaining items.
    ///
    /// Returns the number of data records emitted.
    pub fn finish(&mut self, mut emit: impl FnMut(Item)) -> usize {
        let mut n = 0;
        self.stream.finish(|item| {
            n += item.is_ok() as usize;
            emit(item);
        });
        self.records += n;

        info!(
            records = self.records,
            documents = self.stream.decoder().documents(),
            "finished"
        );
        n
    }

    /// [`Session::process`], emitting each item as a JSON document.
    ///
    /// _Requires Cargo feature `serde`._
    #[cfg(feature = "serde")]
    pub fn process_json(&mut self, chunk: &[u8], mut emit: impl FnMut(String)) -> usize {
        self.process(chunk, |item| emit_json(&item, &mut emit))
    }

    /// [`Session::finish`], emitting each item as a JSON document.
    ///
    /// _Requires Cargo feature `serde`._
    #[cfg(feature = "serde")]
    pub fn finish_json(&mut self, mut emit: impl FnMut(String)) -> usize {
        self.finish(|item| emit_json(&item, &mut emit))
    }
}

#[cfg(feature = "serde")]
#[derive(serde::Serialize)]
struct Condition<'a> {
    error: &'a crate::sans::DecodeError,
    message: String,
    fatal: bool,
}

/// Render an item as JSON: a record as itself, a warning or error as an
/// object with `error`, `message` and `fatal` members.
#[cfg(feature = "serde")]
pub fn to_json(item: &Item) -> Result<String, serde_json::Error> {
    match item {
        Ok(record) => serde_json::to_string(record),
        Err(err) => serde_json::to_string(&Condition {
            error: err,
            message: err.to_string(),
            fatal: err.is_fatal(),
        }),
    }
}

#[cfg(feature = "serde")]
fn emit_json(item: &Item, emit: &mut impl FnMut(String)) {
    match to_json(item) {
        Ok(json) => emit(json),
        Err(err) => tracing::warn!(%err, "item not serializable"),
    }
}
