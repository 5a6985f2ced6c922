//! Half-open byte intervals, `[start, stop)`, and the end-relative
//! (negative-coordinate) request syntax codecs use to walk a resource
//! backwards from its tail.

use crate::prelude::*;

/// A half-open interval `[start, stop)` of byte positions. `start <= stop`
/// always holds for a constructed `Interval`; the empty interval `[n, n)` is
/// legal and denotes a zero-length probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Interval {
    pub start: u64,
    pub stop: u64,
}

impl Interval {
    pub fn new(start: u64, stop: u64) -> Result<Interval> {
        if start > stop {
            return Err(Error::InvalidInterval {
                start: start as i64,
                stop: stop as i64,
            });
        }
        Ok(Interval { start, stop })
    }

    /// An interval of length zero at `pos`, used for length-probe requests.
    pub fn empty_at(pos: u64) -> Interval {
        Interval {
            start: pos,
            stop: pos,
        }
    }

    pub fn length(&self) -> u64 {
        self.stop - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.stop
    }

    pub fn contains(&self, pos: u64) -> bool {
        self.start <= pos && pos < self.stop
    }

    pub fn intersects(&self, other: &Interval) -> bool {
        self.start < other.stop && other.start < self.stop
    }

    /// `(start, stop - 1)`, the inclusive HTTP-style termini. Fails on an
    /// empty interval, which has no well-defined last byte.
    pub fn termini(&self) -> Result<(u64, u64)> {
        if self.is_empty() {
            return Err(Error::InvalidInterval {
                start: self.start as i64,
                stop: self.stop as i64,
            });
        }
        Ok((self.start, self.stop - 1))
    }

    /// The smallest interval containing both `self` and `other`.
    pub fn span(&self, other: &Interval) -> Interval {
        Interval {
            start: self.start.min(other.start),
            stop: self.stop.max(other.stop),
        }
    }

    /// Validate that this interval's endpoints fit within a known total
    /// resource length.
    pub fn validate(&self, total_length: Option<u64>) -> Result<()> {
        if let Some(total_length) = total_length {
            if self.start > total_length || self.stop > total_length {
                let endpoint = self.stop.max(self.start);
                return Err(Error::OutOfRange {
                    endpoint,
                    total_length,
                });
            }
        }
        Ok(())
    }

    /// Format this interval as an HTTP `Range: bytes=a-b` value (the `bytes=`
    /// prefix is added by the caller). Empty intervals use `0-0` per
    /// `spec.md` §4.2's empty-interval-probe convention.
    pub fn to_byte_range_spec(&self) -> String {
        if self.is_empty() {
            "0-0".to_string()
        } else {
            let (first, last) = self.termini().expect("checked non-empty above");
            format!("{}-{}", first, last)
        }
    }
}

/// A caller-supplied interval, possibly using end-relative (negative)
/// coordinates the way `bytes=-22` or `bytes=78-` would on the wire. Resolved
/// to an absolute [`Interval`] once `total_length` is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeSpec {
    pub start: i64,
    pub stop: Option<i64>,
}

impl RangeSpec {
    pub fn absolute(start: u64, stop: u64) -> RangeSpec {
        RangeSpec {
            start: start as i64,
            stop: Some(stop as i64),
        }
    }

    /// Resolve negative endpoints relative to `total_length`: an endpoint `x
    /// < 0` becomes `total_length + x`. `stop: None` means "through the end
    /// of the resource". Fails with `Error::LengthUnknown` if either
    /// endpoint is negative (or `stop` is omitted) and `total_length` is not
    /// yet known.
    pub fn resolve(&self, total_length: Option<u64>) -> Result<Interval> {
        fn resolve_endpoint(x: i64, total_length: Option<u64>) -> Result<u64> {
            if x >= 0 {
                Ok(x as u64)
            } else {
                match total_length {
                    Some(total_length) => {
                        let resolved = total_length as i64 + x;
                        if resolved < 0 {
                            Err(Error::OutOfRange {
                                endpoint: 0,
                                total_length,
                            })
                        } else {
                            Ok(resolved as u64)
                        }
                    }
                    None => Err(Error::LengthUnknown),
                }
            }
        }

        let start = resolve_endpoint(self.start, total_length)?;
        let stop = match self.stop {
            Some(stop) => resolve_endpoint(stop, total_length)?,
            None => total_length.ok_or(Error::LengthUnknown)?,
        };
        let interval = Interval::new(start, stop)?;
        interval.validate(total_length)?;
        Ok(interval)
    }
}

impl From<Interval> for RangeSpec {
    fn from(interval: Interval) -> RangeSpec {
        RangeSpec::absolute(interval.start, interval.stop)
    }
}

/// Returns the interval among `candidates` with the highest `order` value
/// (i.e. the most recently inserted one), mirroring `spec.md` §4.7's
/// "most recent" tie-break for `active_key` tracking.
pub fn most_recent<'a, T>(candidates: impl IntoIterator<Item = (&'a T, u64)>) -> Option<&'a T>
where
    T: 'a,
{
    candidates
        .into_iter()
        .max_by_key(|(_, order)| *order)
        .map(|(item, _)| item)
}
