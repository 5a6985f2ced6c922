//! The default blocking [`Fetcher`]: a `ureq` agent configured and retried
//! the way the teacher's `package_db/http/ureq_glue.rs` /
//! `net/retry.rs` configure and retry theirs.

use std::time::Duration;

use ureq::{Agent, AgentBuilder};

use super::user_agent::user_agent;
use super::{parse_content_range, range_header, FetchedRange, Fetcher};
use crate::interval::Interval;
use crate::prelude::*;

const SLEEP_TIMES: &[u64] = &[250, 500, 1000, 2000, 4000]; // milliseconds
const RETRY_STATUS: &[u16] = &[500, 503, 520, 527];
const RETRY_ERRORKIND: &[ureq::ErrorKind] = &[
    ureq::ErrorKind::Dns,
    ureq::ErrorKind::ConnectionFailed,
    ureq::ErrorKind::TooManyRedirects,
    ureq::ErrorKind::Io,
    ureq::ErrorKind::ProxyConnect,
];

/// Tunables for [`UreqFetcher`]. `require_accept_ranges` governs whether a
/// missing `Accept-Ranges: bytes` header on the first response is treated
/// as `Error::UnsupportedRanges` (`spec.md` §4.2).
#[derive(Debug, Clone)]
pub struct UreqFetcherConfig {
    pub read_timeout: Duration,
    pub write_timeout: Duration,
    pub require_accept_ranges: bool,
}

impl Default for UreqFetcherConfig {
    fn default() -> Self {
        UreqFetcherConfig {
            read_timeout: Duration::from_secs(15),
            write_timeout: Duration::from_secs(15),
            require_accept_ranges: false,
        }
    }
}

/// The crate's default [`Fetcher`]: a single reused `ureq::Agent`, with
/// pip-style status/errorkind retries (`spec.md` §4.2's `NetworkError` is
/// only raised once retries are exhausted).
pub struct UreqFetcher {
    agent: Agent,
    config: UreqFetcherConfig,
}

impl UreqFetcher {
    pub fn new() -> UreqFetcher {
        UreqFetcher::with_config(UreqFetcherConfig::default())
    }

    pub fn with_config(config: UreqFetcherConfig) -> UreqFetcher {
        let agent = AgentBuilder::new()
            .user_agent(&user_agent())
            .redirects(5)
            .timeout_read(config.read_timeout)
            .timeout_write(config.write_timeout)
            .build();
        UreqFetcher { agent, config }
    }
}

impl Default for UreqFetcher {
    fn default() -> Self {
        UreqFetcher::new()
    }
}

fn call_with_retry(req: ureq::Request) -> std::result::Result<ureq::Response, ureq::Error> {
    let mut sleeps = SLEEP_TIMES.iter();
    loop {
        let result = req.clone().call();
        match &result {
            Ok(_) => return result,
            Err(ureq::Error::Status(status, _)) => {
                if !RETRY_STATUS.contains(status) {
                    return result;
                }
            }
            Err(err @ ureq::Error::Transport(_)) => {
                if !RETRY_ERRORKIND.contains(&err.kind()) {
                    return result;
                }
            }
        }
        match sleeps.next() {
            Some(ms) => std::thread::sleep(Duration::from_millis(*ms)),
            None => return result,
        }
    }
}

impl Fetcher for UreqFetcher {
    fn fetch(&self, url: &Url, interval: Interval) -> Result<FetchedRange> {
        trace!("GET {} Range: {}", url, range_header(interval));
        let req = self
            .agent
            .request_url("GET", url)
            .set("Range", &range_header(interval));
        let response = match call_with_retry(req) {
            Ok(response) => response,
            Err(ureq::Error::Status(status, _response)) => {
                return Err(Error::NonPartial {
                    url: url.to_string(),
                    status,
                });
            }
            Err(ureq::Error::Transport(transport)) => {
                return Err(Error::network(url, transport));
            }
        };

        match response.status() {
            206 => {
                let content_range = response
                    .header("Content-Range")
                    .and_then(parse_content_range)
                    .ok_or_else(|| Error::NonPartial {
                        url: url.to_string(),
                        status: 206,
                    })?;
                Ok(FetchedRange {
                    content_range: Some(content_range),
                    body: Box::new(response.into_reader()),
                })
            }
            200 => {
                if self.config.require_accept_ranges
                    && response.header("Accept-Ranges") != Some("bytes")
                {
                    return Err(Error::UnsupportedRanges {
                        url: url.to_string(),
                    });
                }
                warn!(
                    "{} ignored our Range request and sent a full 200 response",
                    url
                );
                Ok(FetchedRange {
                    content_range: None,
                    body: Box::new(response.into_reader()),
                })
            }
            status => Err(Error::NonPartial {
                url: url.to_string(),
                status,
            }),
        }
    }
}
