//! The interval map: an ordered mapping from (disjoint, at rest) external
//! interval to [`RangeResponse`], keyed by the interval's start so lookups
//! and ascending iteration are both native `BTreeMap` operations.
//!
//! This generalizes the `loaded: BTreeMap<u64, Vec<u8>>` field the teacher's
//! `LazyRemoteFile` uses for its own single-response byte cache: the same
//! `range(..=pos).next_back()` / `range(pos + 1..).next()` idiom that file
//! uses to find the gap around a read position is what `find_containing`
//! and `intersecting` below are built from.

use std::collections::BTreeMap;

use crate::interval::Interval;
use crate::prelude::*;
use crate::range_response::RangeResponse;

pub struct StoredEntry {
    pub response: RangeResponse,
    pub order: u64,
}

impl StoredEntry {
    /// The entry's current external interval, read straight off the
    /// response rather than a cached copy — `mark_tail`/`read` change it
    /// underneath the store, and a stale cache here would silently violate
    /// the disjointness invariant.
    pub fn external_interval(&self) -> Interval {
        self.response.external_interval()
    }
}

#[derive(Default)]
pub struct RangeStore {
    entries: BTreeMap<u64, StoredEntry>,
    next_order: u64,
}

impl RangeStore {
    pub fn new() -> RangeStore {
        RangeStore {
            entries: BTreeMap::new(),
            next_order: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Insert `response`, keyed by its current external interval's start.
    /// Precondition (enforced by `resolver.rs`, not here): the interval
    /// must be disjoint from every other stored key.
    pub fn insert(&mut self, response: RangeResponse) -> u64 {
        let external = response.external_interval();
        let order = self.next_order;
        self.next_order += 1;
        self.entries
            .insert(external.start, StoredEntry { response, order });
        external.start
    }

    pub fn remove(&mut self, key: u64) -> Option<StoredEntry> {
        self.entries.remove(&key)
    }

    pub fn get(&self, key: u64) -> Option<&StoredEntry> {
        self.entries.get(&key)
    }

    pub fn get_mut(&mut self, key: u64) -> Option<&mut StoredEntry> {
        self.entries.get_mut(&key)
    }

    /// Apply `f` to the entry at `key`, then remove it if its external
    /// interval became empty. Safe for mutations that only move the
    /// interval's *stop* (`mark_tail`) — the `BTreeMap` key, the external
    /// start, is untouched.
    pub fn mutate_tail<T>(
        &mut self,
        key: u64,
        f: impl FnOnce(&mut RangeResponse) -> Result<T>,
    ) -> Result<Option<T>> {
        let entry = match self.entries.get_mut(&key) {
            Some(entry) => entry,
            None => return Ok(None),
        };
        let result = f(&mut entry.response)?;
        if entry.response.external_interval().is_empty() {
            self.entries.remove(&key);
        }
        Ok(Some(result))
    }

    /// Apply `f` to the entry at `key`, where `f` may advance the
    /// response's `head_offset` and thereby move the external interval's
    /// *start*. Re-keys the entry to its post-mutation start (preserving
    /// insertion `order`), or drops it entirely if the external interval
    /// became empty. The entry is reinserted (unless emptied) even if `f`
    /// errors, since `f` may have partially advanced `head_offset` before
    /// failing and a failed mutation must not also leak the entry out of
    /// the store.
    pub fn mutate_head<T>(
        &mut self,
        key: u64,
        f: impl FnOnce(&mut RangeResponse) -> Result<T>,
    ) -> Result<Option<T>> {
        let mut entry = match self.entries.remove(&key) {
            Some(entry) => entry,
            None => return Ok(None),
        };
        let result = f(&mut entry.response);
        let new_external = entry.response.external_interval();
        if !new_external.is_empty() {
            self.entries.insert(new_external.start, entry);
        }
        result.map(Some)
    }

    /// Like `mutate_head`, but never drops the entry even when its
    /// external interval becomes empty (a fully-drained *active* range
    /// must stay addressable so further `read`/`tell` calls observe EOF at
    /// a stable position rather than `NoActiveRange`). Used by
    /// `RangeStream::read`/`seek`, which mutate the active response's
    /// cursor directly rather than through the overlap resolver.
    pub fn reseat<T>(
        &mut self,
        key: u64,
        f: impl FnOnce(&mut RangeResponse) -> Result<T>,
    ) -> Result<Option<T>> {
        let mut entry = match self.entries.remove(&key) {
            Some(entry) => entry,
            None => return Ok(None),
        };
        let result = f(&mut entry.response);
        let new_start = entry.response.external_interval().start;
        self.entries.insert(new_start, entry);
        result.map(Some)
    }

    /// The entry whose external interval contains `pos`, if any.
    pub fn find_containing(&self, pos: u64) -> Option<u64> {
        self.entries
            .range(..=pos)
            .next_back()
            .filter(|(_, entry)| entry.external_interval().contains(pos))
            .map(|(&start, _)| start)
    }

    /// Keys of every entry whose external interval intersects `query`,
    /// ascending. An entry starting at or before `query` can still
    /// intersect it (its stop may reach into `query`), so we start the
    /// underlying range scan one entry before `query.start` the same way
    /// `find_containing` does, then walk forward while entries still
    /// overlap.
    pub fn intersecting(&self, query: Interval) -> Vec<u64> {
        let mut out = Vec::new();
        if let Some((&start, entry)) = self.entries.range(..=query.start).next_back() {
            if entry.external_interval().intersects(&query) {
                out.push(start);
            }
        }
        for (&start, entry) in self.entries.range(query.start.saturating_add(1)..) {
            if start >= query.stop {
                break;
            }
            if entry.external_interval().intersects(&query) {
                out.push(start);
            }
        }
        out
    }

    pub fn iter_ascending(&self) -> impl Iterator<Item = (u64, &StoredEntry)> {
        self.entries.iter().map(|(&start, entry)| (start, entry))
    }

    pub fn first_key(&self) -> Option<u64> {
        self.entries.keys().next().copied()
    }

    /// `[first_key.start, last_key.stop)`, the smallest interval containing
    /// every stored external interval.
    pub fn spanning_range(&self) -> Option<Interval> {
        if self.entries.is_empty() {
            return None;
        }
        let start = self.first_key()?;
        let stop = self
            .entries
            .values()
            .map(|e| e.external_interval().stop)
            .max()?;
        Some(Interval { start, stop })
    }

    /// The key of the most recently *inserted* entry — the facade's
    /// `active_key` (`spec.md` §4.7), tracked by insertion order rather
    /// than key order so a `Head`-case re-key (see `mutate_head`) never
    /// changes which entry counts as "active".
    pub fn most_recent_key(&self) -> Option<u64> {
        crate::interval::most_recent(self.entries.iter().map(|(start, entry)| (start, entry.order)))
            .copied()
    }
}
