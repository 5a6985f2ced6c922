//! The `Fetcher` contract (`spec.md` §4.2 / §6): given a URL and a byte
//! [`Interval`], issue the `Range:` request and return the parsed
//! `Content-Range` plus a lazy byte source. The core calls this
//! synchronously from `add()` and treats it as the sole suspension point
//! there (`spec.md` §5).

pub mod ureq_fetcher;
pub mod user_agent;

use std::io::Read;

use crate::interval::Interval;
use crate::prelude::*;

/// The parsed `Content-Range: bytes first-last/total` header of a 206
/// response. `first`/`last` are the inclusive termini the server actually
/// sent, which may differ from what was requested only for pathological
/// servers; the core trusts `total` to set `total_length` and otherwise
/// relies on reading exactly `interval.length()` bytes from `body`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentRange {
    pub first: u64,
    pub last: u64,
    pub total: u64,
}

/// The result of one `Fetcher::fetch` call: the interval actually granted
/// (equal to the requested interval on success) plus a lazy body that
/// yields exactly that many bytes.
pub struct FetchedRange {
    pub content_range: Option<ContentRange>,
    pub body: Box<dyn Read + Send>,
}

/// A capability that, given a URL and an [`Interval`], performs the
/// corresponding `Range` GET. Implementors may be synchronous or
/// asynchronous internally; the trait itself is blocking from the core's
/// point of view (`spec.md` §4.2, §5).
///
/// Empty-interval probes (`spec.md` §3 "Lifecycle") request `Range:
/// bytes=0-0` and the single returned byte is discarded by the caller, not
/// the fetcher.
pub trait Fetcher: Send + Sync {
    fn fetch(&self, url: &Url, interval: Interval) -> Result<FetchedRange>;
}

static CONTENT_RANGE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^bytes ([0-9]+)-([0-9]+)/([0-9]+)$").unwrap());
static CONTENT_RANGE_LEN_ONLY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^bytes [^/]*/([0-9]+)$").unwrap());

/// Parse a `Content-Range` header value of the `bytes first-last/total`
/// form (206 responses) or the `bytes */total` form (416 responses).
/// Returns `None` for the 416 "length-only" form's first/last (callers that
/// need them should treat a 416 as fatal, per `spec.md` §4.2).
pub fn parse_content_range(value: &str) -> Option<ContentRange> {
    if let Some(captures) = CONTENT_RANGE_RE.captures(value) {
        let first: u64 = captures.get(1)?.as_str().parse().ok()?;
        let last: u64 = captures.get(2)?.as_str().parse().ok()?;
        let total: u64 = captures.get(3)?.as_str().parse().ok()?;
        return Some(ContentRange { first, last, total });
    }
    let captures = CONTENT_RANGE_LEN_ONLY_RE.captures(value)?;
    let total: u64 = captures.get(1)?.as_str().parse().ok()?;
    Some(ContentRange {
        first: 0,
        last: 0,
        total,
    })
}

/// Format an [`Interval`] as the value of a `Range` request header,
/// including the `bytes=` prefix (`spec.md` §4.2/§6).
pub fn range_header(interval: Interval) -> String {
    format!("bytes={}", interval.to_byte_range_spec())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_partial_content_range() {
        let cr = parse_content_range("bytes 78-99/100").unwrap();
        assert_eq!(cr, ContentRange { first: 78, last: 99, total: 100 });
    }

    #[test]
    fn test_parse_length_only_content_range() {
        let cr = parse_content_range("bytes */11").unwrap();
        assert_eq!(cr.total, 11);
    }

    #[test]
    fn test_parse_garbage_is_none() {
        assert!(parse_content_range("nonsense").is_none());
    }

    #[test]
    fn test_range_header_formatting() {
        let iv = Interval::new(5, 10).unwrap();
        assert_eq!(range_header(iv), "bytes=5-9");
        let empty = Interval::new(0, 0).unwrap();
        assert_eq!(range_header(empty), "bytes=0-0");
    }
}
