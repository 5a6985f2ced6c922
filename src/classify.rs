//! The overlap classifier (`spec.md` §4.5): given a candidate interval `N`
//! and a stored interval `E` that it intersects, decide which of the four
//! shapes the overlap takes. The resolver (`resolver.rs`) dispatches on
//! this to decide how to keep the store disjoint.

use crate::interval::Interval;

/// How a new interval `N` overlaps an existing stored interval `E`, per
/// `spec.md` §4.5. Computed only for pairs that are known to intersect;
/// `classify` panics if called on a disjoint pair, since every caller
/// already filtered via `RangeStore::intersecting`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overlap {
    /// `N.start <= E.start < N.stop < E.stop` — `N` covers `E`'s leading
    /// bytes only.
    Head,
    /// `E.start < N.start < E.stop <= N.stop` — `N` covers `E`'s trailing
    /// bytes only.
    Tail,
    /// `N.start <= E.start && E.stop <= N.stop` — `N` fully contains `E`.
    HeadToTail,
    /// `E.start < N.start && N.stop < E.stop` — `N` lies strictly inside
    /// `E`.
    MutualSubsumption,
}

/// Classify `new`'s overlap with `existing`. Both inequalities are applied
/// exactly as written in `spec.md` §4.5, in order, so equal-endpoint ties
/// resolve the same way the spec's worked examples do (e.g. `N.stop ==
/// E.stop` falls into `HeadToTail`, not `Head`).
pub fn classify(new: Interval, existing: Interval) -> Overlap {
    debug_assert!(new.intersects(&existing), "classify requires an intersecting pair");

    if new.start <= existing.start && existing.stop <= new.stop {
        Overlap::HeadToTail
    } else if existing.start < new.start && new.stop < existing.stop {
        Overlap::MutualSubsumption
    } else if new.start <= existing.start && new.stop < existing.stop {
        Overlap::Head
    } else if existing.start < new.start && existing.stop <= new.stop {
        Overlap::Tail
    } else {
        unreachable!("classify: {:?} vs {:?} is neither contained, containing, nor head/tail overlapping", new, existing)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::interval::Interval;

    fn iv(start: u64, stop: u64) -> Interval {
        Interval::new(start, stop).unwrap()
    }

    #[test]
    fn test_head() {
        assert_eq!(classify(iv(0, 2), iv(0, 5)), Overlap::Head);
        assert_eq!(classify(iv(0, 3), iv(1, 5)), Overlap::Head);
    }

    #[test]
    fn test_tail() {
        assert_eq!(classify(iv(4, 8), iv(0, 5)), Overlap::Tail);
        assert_eq!(classify(iv(3, 8), iv(0, 5)), Overlap::Tail);
    }

    #[test]
    fn test_head_to_tail_subsumes() {
        assert_eq!(classify(iv(0, 10), iv(3, 6)), Overlap::HeadToTail);
        assert_eq!(classify(iv(3, 6), iv(3, 6)), Overlap::HeadToTail);
    }

    #[test]
    fn test_mutual_subsumption() {
        assert_eq!(classify(iv(3, 6), iv(0, 10)), Overlap::MutualSubsumption);
    }

    #[test]
    fn test_exact_tie_goes_head_to_tail_not_head_or_tail() {
        // N == E exactly: both "N.start <= E.start && E.stop <= N.stop" holds.
        assert_eq!(classify(iv(0, 5), iv(0, 5)), Overlap::HeadToTail);
    }
}
