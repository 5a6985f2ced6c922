//! The overlap resolver (`spec.md` §4.6): the central algorithm that keeps
//! `RangeStore` disjoint under arbitrary `add(range)` sequences, under one
//! of three pruning policies.
//!
//! Transactional ordering: every branch below performs its `Fetcher` call
//! — the sole suspension point and the only failure-prone step — before
//! mutating the store. The one exception is [`RangeResponse::peek`], used
//! to pull a `Head`-case splice ahead of time; `peek` only grows an
//! existing response's internal buffer and never advances `head_offset`,
//! so it is harmless to have run even if the subsequent fetch then fails.
//! If the fetch does fail, the store is exactly as it was before `add` was
//! called (`spec.md` §5, §7).

use std::io::{Cursor, Read};

use crate::classify::{classify, Overlap};
use crate::fetcher::{ContentRange, Fetcher};
use crate::interval::Interval;
use crate::prelude::*;
use crate::range_response::RangeResponse;
use crate::store::RangeStore;

/// The overlap-resolution policy a `RangeStream` is constructed with
/// (`spec.md` §4.6). Numeric values match the spec's own numbering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PruningLevel {
    Replant = 0,
    Burn = 1,
    Strict = 2,
}

/// The outcome of a successful `resolve` call: the key of the
/// newly-inserted entry (the facade's new `active_key`) and the
/// `Content-Range` the fetch reported, if any fetch actually happened (a
/// `Head` overlap fully satisfied by splicing issues no network request at
/// all).
pub struct Resolved {
    pub key: u64,
    pub content_range: Option<ContentRange>,
}

/// Resolve `new_interval` against whatever it intersects in `store`,
/// applying `policy`, fetching over `url` via `fetcher`, and inserting the
/// result. Returns the new entry's key.
pub fn resolve(
    store: &mut RangeStore,
    url: &Url,
    fetcher: &dyn Fetcher,
    new_interval: Interval,
    policy: PruningLevel,
) -> Result<Resolved> {
    let intersecting = store.intersecting(new_interval);
    trace!(
        "resolving add({:?}) under {:?}: {} intersecting entr{}",
        new_interval,
        policy,
        intersecting.len(),
        if intersecting.len() == 1 { "y" } else { "ies" }
    );

    match policy {
        PruningLevel::Strict => {
            if !intersecting.is_empty() {
                return Err(Error::OverlapDisallowed);
            }
            fetch_whole_and_insert(store, url, fetcher, new_interval)
        }
        PruningLevel::Burn => {
            let fetched = fetcher.fetch(url, new_interval)?;
            for key in intersecting {
                store.remove(key);
            }
            Ok(insert_body(
                store,
                url,
                new_interval,
                fetched.content_range,
                fetched.body,
            ))
        }
        PruningLevel::Replant => replant(store, url, fetcher, new_interval, &intersecting),
    }
}

fn fetch_whole_and_insert(
    store: &mut RangeStore,
    url: &Url,
    fetcher: &dyn Fetcher,
    new_interval: Interval,
) -> Result<Resolved> {
    let fetched = fetcher.fetch(url, new_interval)?;
    Ok(insert_body(
        store,
        url,
        new_interval,
        fetched.content_range,
        fetched.body,
    ))
}

fn insert_body(
    store: &mut RangeStore,
    url: &Url,
    new_interval: Interval,
    content_range: Option<ContentRange>,
    body: Box<dyn Read + Send>,
) -> Resolved {
    let response = RangeResponse::new(new_interval, body, url.clone());
    let key = store.insert(response);
    Resolved { key, content_range }
}

enum NonHeadAction {
    /// `N` covers `E`'s trailing bytes only: shrink `E`'s tail by this many
    /// bytes.
    Tail(u64),
    /// `N` fully contains `E`: burn it outright.
    HeadToTail,
    /// `E` fully contains `N`: truncate `E` to the pre-`N` segment by
    /// growing its tail mark by this many bytes.
    MutualSubsumption(u64),
}

fn replant(
    store: &mut RangeStore,
    url: &Url,
    fetcher: &dyn Fetcher,
    new_interval: Interval,
    intersecting: &[u64],
) -> Result<Resolved> {
    let mut non_head_actions: Vec<(u64, NonHeadAction)> = Vec::new();
    // At most one intersecting entry can classify as `Head` against `N`:
    // `Head` requires `E.start` to lie inside `N` and `E.stop` to lie past
    // `N.stop`, which only the rightmost intersecting entry can satisfy
    // once entries are disjoint and sorted.
    let mut head: Option<(u64, Interval, u64)> = None;

    for &key in intersecting {
        let entry = store
            .get(key)
            .expect("key came from RangeStore::intersecting on this same store");
        let external = entry.external_interval();
        match classify(new_interval, external) {
            Overlap::Tail => {
                let overlap = external.stop - new_interval.start;
                non_head_actions.push((key, NonHeadAction::Tail(overlap)));
            }
            Overlap::HeadToTail => {
                non_head_actions.push((key, NonHeadAction::HeadToTail));
            }
            Overlap::MutualSubsumption => {
                let tail_growth = external.stop - new_interval.start;
                non_head_actions.push((key, NonHeadAction::MutualSubsumption(tail_growth)));
            }
            Overlap::Head => {
                let overlap = new_interval.stop - external.start;
                head = Some((key, external, overlap));
            }
        }
    }

    // Splice ahead of the fetch: pull the overlapping bytes `N` would
    // otherwise have to re-download out of `E`'s own buffer. `peek` does
    // not advance `head_offset`, so nothing is committed yet.
    let spliced = match &head {
        Some((key, _, overlap)) => {
            trace!("splicing {} overlap bytes from entry {} instead of refetching", overlap, key);
            let entry = store
                .get_mut(*key)
                .expect("head key came from intersecting on this same store");
            Some(entry.response.peek(*overlap)?)
        }
        None => None,
    };

    let fetch_interval = match &head {
        Some((_, external, _)) => Interval::new(new_interval.start, external.start)
            .expect("N.start <= E.start holds for a Head overlap"),
        None => new_interval,
    };

    // `new_interval` is never empty here (the facade routes empty adds
    // through its own length-probe path, never through the resolver), so
    // an empty `fetch_interval` only arises when a `Head` splice already
    // supplies every byte `N` needs.
    let fetched = if fetch_interval.is_empty() {
        None
    } else {
        Some(fetcher.fetch(url, fetch_interval)?)
    };

    // Everything above this point is read-only or non-destructive
    // (`peek`). Only now, with the fetch (if any) having succeeded, do we
    // commit mutations to the store.
    for (key, action) in non_head_actions {
        match action {
            NonHeadAction::Tail(overlap) => {
                store.mutate_tail(key, |resp| resp.mark_tail(overlap))?;
            }
            NonHeadAction::HeadToTail => {
                store.remove(key);
            }
            NonHeadAction::MutualSubsumption(tail_growth) => {
                store.mutate_tail(key, |resp| resp.mark_tail(tail_growth))?;
            }
        }
    }

    let content_range = fetched.as_ref().and_then(|f| f.content_range);

    let body: Box<dyn Read + Send> = match (fetched, spliced) {
        (Some(fetched), Some(spliced)) => {
            let (key, _, overlap) = head.expect("spliced implies head was Some");
            store.mutate_head(key, |resp| resp.read(overlap).map(|_| ()))?;
            Box::new(fetched.body.chain(Cursor::new(spliced)))
        }
        (None, Some(spliced)) => {
            let (key, _, overlap) = head.expect("spliced implies head was Some");
            store.mutate_head(key, |resp| resp.read(overlap).map(|_| ()))?;
            Box::new(Cursor::new(spliced)) as Box<dyn Read + Send>
        }
        (Some(fetched), None) => fetched.body,
        (None, None) => Box::new(Cursor::new(Vec::new())),
    };

    Ok(insert_body(store, url, new_interval, content_range, body))
}
