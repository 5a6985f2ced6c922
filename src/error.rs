use thiserror::Error;
use url::Url;

/// The crate's single error type. One variant per failure kind named in the
/// range-bookkeeping design: interval validation, overlap-policy violations,
/// RangeResponse cursor misuse, and the Fetcher-side HTTP failures the core
/// treats as fatal for a given `add()` call.
#[derive(Error, Debug)]
pub enum Error {
    #[error("end-relative range requested before total length is known")]
    LengthUnknown,

    #[error("invalid interval: start {start} > stop {stop}")]
    InvalidInterval { start: i64, stop: i64 },

    #[error("interval endpoint {endpoint} exceeds total length {total_length}")]
    OutOfRange { endpoint: u64, total_length: u64 },

    #[error("range overlaps an existing range under the strict pruning policy")]
    OverlapDisallowed,

    #[error("no active range; call add() before read/seek/tell")]
    NoActiveRange,

    #[error("seek to {target} is behind the already-consumed head at {head}")]
    SeekBehindConsumed { target: u64, head: u64 },

    #[error("tail mark of {requested} would cross the head offset at {head_offset}")]
    TailOverrun { requested: u64, head_offset: u64 },

    #[error("network error fetching {url}")]
    NetworkError {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("server returned a non-partial response for {url} (status {status})")]
    NonPartial { url: String, status: u16 },

    #[error("server at {url} does not advertise Accept-Ranges: bytes")]
    UnsupportedRanges { url: String },
}

impl Error {
    pub fn network(url: &Url, source: impl std::error::Error + Send + Sync + 'static) -> Error {
        Error::NetworkError {
            url: url.to_string(),
            source: Box::new(source),
        }
    }
}
