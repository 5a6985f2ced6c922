//! `rangestream` presents a remote byte-addressable HTTP resource — one
//! that advertises `Accept-Ranges: bytes` — as a single lazily-fetched,
//! file-like object. Callers register the byte intervals they intend to
//! read with [`RangeStream::add`]; the crate issues the corresponding
//! `Range` GETs, keeps each response's body as an independently consumable
//! stream, and arbitrates overlaps so every byte position in the resource
//! is associated with at most one live response stream.
//!
//! Format-aware codecs (ZIP, `.conda`, PNG, TAR, …) build on top of this by
//! using end-relative ranges to walk container headers without downloading
//! payloads — construct a [`RangeStream`], read [`RangeStream::total_bytes`],
//! then `add`/`seek`/`read` backwards from the tail.
//!
//! ```no_run
//! use std::sync::Arc;
//! use rangestream::{Interval, PruningLevel, RangeSpec, RangeStream, UreqFetcher};
//!
//! # fn main() -> Result<(), rangestream::Error> {
//! let url = "https://example.com/archive.zip".parse().unwrap();
//! let fetcher = Arc::new(UreqFetcher::new());
//! let mut stream = RangeStream::new(url, fetcher, Interval::empty_at(0), PruningLevel::Replant)?;
//!
//! // Walk backward from the tail the way a ZIP reader locates its
//! // end-of-central-directory record.
//! stream.add(RangeSpec { start: -22, stop: None })?;
//! let eocd = stream.read(22)?;
//! # let _ = eocd;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

mod classify;
mod error;
mod fetcher;
mod interval;
mod prelude;
mod range_response;
mod resolver;
mod store;
mod stream;

pub use crate::error::Error;
pub use crate::fetcher::ureq_fetcher::{UreqFetcher, UreqFetcherConfig};
pub use crate::fetcher::{ContentRange, FetchedRange, Fetcher};
pub use crate::interval::{Interval, RangeSpec};
pub use crate::range_response::Whence;
pub use crate::resolver::PruningLevel;
pub use crate::stream::RangeStream;

/// The crate's `Result` alias, re-exported so downstream crates can name it
/// without reaching into `prelude`.
pub type Result<T> = std::result::Result<T, Error>;
