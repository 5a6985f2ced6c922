//! A single in-flight (or fully drained) `Range` response: the bytes of one
//! `request_interval`, lazily pulled off the wire into `buffered`, with a
//! `head_offset`/`tail_mark` pair marking the portion still externally
//! visible.
//!
//! The `Seek` arithmetic below is cribbed from `io::Cursor`, the same way
//! the teacher's `LazyRemoteFile` does it.

use crate::interval::Interval;
use crate::prelude::*;

use std::cmp;
use std::io::{self, Read};

/// Where a seek is measured from, mirroring `std::io::SeekFrom` without
/// requiring callers to depend on `std::io` themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Whence {
    Start,
    Current,
    End,
}

pub struct RangeResponse {
    request_interval: Interval,
    body: Box<dyn Read + Send>,
    buffered: Vec<u8>,
    head_offset: u64,
    tail_mark: u64,
    /// The resource URL this response was fetched from, used to tag any
    /// mid-stream I/O error on `body` with the real origin (`spec.md` §7's
    /// `NetworkError` carries the URL it failed against).
    url: Url,
}

impl RangeResponse {
    pub fn new(request_interval: Interval, body: Box<dyn Read + Send>, url: Url) -> RangeResponse {
        RangeResponse {
            request_interval,
            body,
            buffered: Vec::new(),
            head_offset: 0,
            tail_mark: 0,
            url,
        }
    }

    pub fn request_interval(&self) -> Interval {
        self.request_interval
    }

    pub fn head_offset(&self) -> u64 {
        self.head_offset
    }

    pub fn tail_mark(&self) -> u64 {
        self.tail_mark
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// `[request_interval.start + head_offset, request_interval.stop -
    /// tail_mark)` — the currently visible portion of this response.
    pub fn external_interval(&self) -> Interval {
        Interval {
            start: self.request_interval.start + self.head_offset,
            stop: self.request_interval.stop - self.tail_mark,
        }
    }

    pub fn is_consumed(&self) -> bool {
        self.head_offset + self.tail_mark == self.request_interval.length()
    }

    /// Increase `tail_mark` by `bytes`, virtually truncating the tail.
    /// Fails with `TailOverrun` if doing so would cross `head_offset`.
    pub fn mark_tail(&mut self, bytes: u64) -> Result<()> {
        let new_tail_mark = self.tail_mark + bytes;
        if self.head_offset + new_tail_mark > self.request_interval.length() {
            return Err(Error::TailOverrun {
                requested: new_tail_mark,
                head_offset: self.head_offset,
            });
        }
        self.tail_mark = new_tail_mark;
        Ok(())
    }

    /// Absolute position of the read cursor: `request_interval.start +
    /// head_offset`.
    pub fn tell(&self) -> u64 {
        self.request_interval.start + self.head_offset
    }

    /// Drain exactly `len` bytes (relative to `request_interval.start`) from
    /// `body` into `buffered`, if not already present.
    fn ensure_buffered(&mut self, len: u64) -> Result<()> {
        let want = usize::try_from(len).expect("interval length fits in usize");
        while self.buffered.len() < want {
            let mut chunk = [0u8; 8192];
            let to_read = cmp::min(chunk.len(), want - self.buffered.len());
            let n = self
                .body
                .read(&mut chunk[..to_read])
                .map_err(|e| Error::network(&self.url, e))?;
            if n == 0 {
                break; // underlying body ended early; caller sees a short read
            }
            self.buffered.extend_from_slice(&chunk[..n]);
        }
        Ok(())
    }

    /// Ensure `len` bytes starting at the current head are buffered and
    /// return a copy, *without* advancing `head_offset`. Used by the
    /// overlap resolver to pull the bytes a `Head`-case splice needs before
    /// committing to the new request's fetch — since this only grows
    /// `buffered` and never touches `head_offset`, it is safe to call even
    /// if the caller later abandons the operation.
    pub fn peek(&mut self, len: u64) -> Result<Vec<u8>> {
        let want = self.head_offset + len;
        self.ensure_buffered(want)?;
        let start = usize::try_from(self.head_offset).unwrap();
        let end = usize::try_from(cmp::min(want, self.buffered.len() as u64)).unwrap();
        Ok(self.buffered[start..end].to_vec())
    }

    /// Read at most `n` bytes from the external interval, advancing
    /// `head_offset`. Returns fewer than `n` bytes only at the external tail
    /// boundary (EOF); the underlying `body` is never drained past the
    /// tail-mark.
    pub fn read(&mut self, n: usize) -> Result<Vec<u8>> {
        let external = self.external_interval();
        let available = external.length();
        let want = cmp::min(n as u64, available);
        if want == 0 {
            return Ok(Vec::new());
        }
        let buffered_through = self.head_offset + want;
        self.ensure_buffered(buffered_through)?;
        let have = cmp::min(buffered_through, self.buffered.len() as u64);
        let start = usize::try_from(self.head_offset).unwrap();
        let end = usize::try_from(have).unwrap();
        let out = self.buffered[start..end].to_vec();
        self.head_offset += out.len() as u64;
        Ok(out)
    }

    /// Seek the read cursor within the external interval. `whence` behaves
    /// like `std::io::SeekFrom`: `Start` takes an absolute position,
    /// `Current`/`End` are relative to the read cursor / the external tail.
    /// Forward seeks that cross `head_offset` advance it by discarding
    /// bytes; backward seeks below `head_offset` fail with
    /// `SeekBehindConsumed`.
    pub fn seek(&mut self, offset: i64, whence: Whence) -> Result<u64> {
        let head = self.tell();
        let seek_err = || Error::SeekBehindConsumed {
            target: 0,
            head,
        };

        let target: u64 = match whence {
            Whence::Start => u64::try_from(offset).map_err(|_| seek_err())?,
            Whence::Current | Whence::End => {
                let base = match whence {
                    Whence::Current => head,
                    Whence::End => self.request_interval.stop - self.tail_mark,
                    Whence::Start => unreachable!(),
                };
                if offset >= 0 {
                    base.checked_add(offset as u64)
                } else {
                    base.checked_sub(offset.wrapping_neg() as u64)
                }
                .ok_or_else(seek_err)?
            }
        };

        let min_allowed = self.request_interval.start + self.head_offset;
        if target < min_allowed {
            return Err(Error::SeekBehindConsumed {
                target,
                head: min_allowed,
            });
        }
        let new_head_offset = target - self.request_interval.start;
        self.head_offset = new_head_offset.min(self.request_interval.length());
        Ok(self.tell())
    }
}

impl io::Read for RangeResponse {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let bytes = RangeResponse::read(self, buf.len())
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        buf[..bytes.len()].copy_from_slice(&bytes);
        Ok(bytes.len())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Cursor;

    fn response(data: &'static [u8], start: u64) -> RangeResponse {
        let interval = Interval::new(start, start + data.len() as u64).unwrap();
        let url = Url::parse("http://example.test/f").unwrap();
        RangeResponse::new(interval, Box::new(Cursor::new(data)), url)
    }

    #[test]
    fn test_read_advances_head_offset() {
        let mut r = response(b"hello world", 0);
        let out = r.read(5).unwrap();
        assert_eq!(out, b"hello");
        assert_eq!(r.tell(), 5);
        let out = r.read(100).unwrap();
        assert_eq!(out, b" world");
        assert_eq!(r.tell(), 11);
        assert!(r.is_consumed());
    }

    #[test]
    fn test_mark_tail_shrinks_external_and_overruns() {
        let mut r = response(b"hello world", 0);
        r.read(3).unwrap();
        r.mark_tail(3).unwrap();
        assert_eq!(r.external_interval(), Interval::new(3, 8).unwrap());
        // tail mark up to, but not past, head_offset is fine
        r.mark_tail(5).unwrap();
        assert_eq!(r.external_interval(), Interval::new(3, 3).unwrap());
        assert!(r.mark_tail(1).is_err());
    }

    #[test]
    fn test_seek_behind_consumed_fails() {
        let mut r = response(b"hello world", 100);
        r.read(5).unwrap();
        assert!(r.seek(-1, Whence::Current).is_err());
        assert!(r.seek(102, Whence::Start).is_err());
        assert!(r.seek(105, Whence::Start).is_ok());
    }

    #[test]
    fn test_seek_end_and_read_tail() {
        let mut r = response(b"hello world", 0);
        r.seek(-5, Whence::End).unwrap();
        let out = r.read(100).unwrap();
        assert_eq!(out, b"world");
    }
}
