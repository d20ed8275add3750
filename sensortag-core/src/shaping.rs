//! Stream-Shaping State
//!
//! ## Overview
//!
//! The output streams coalesce, deduplicate and combine readings. The timing
//! and locking of those operators belong to the runtime that drives them; the
//! state they keep between values does not. This module holds that state as
//! plain single-owner types so it can be tested without a clock and wrapped
//! in whatever lock the driver prefers.
//!
//! - [`SampleSlot`]: latest value since the last tick ("sample" operator)
//! - [`Distinct`]: last forwarded value ("distinct until changed")
//! - [`LatestPair`]: two-slot state for "combine latest"
//!
//! ## Equality
//!
//! Deduplication compares with [`SameValue`], which is bitwise for floats:
//! two NaNs with the same payload are the same value, `0.0` and `-0.0` are
//! not.

use crate::decode::Vector3;

/// Bitwise value identity used for change deduplication
pub trait SameValue {
    /// True if `self` and `other` are bit-for-bit the same reading.
    fn same_value(&self, other: &Self) -> bool;
}

impl SameValue for f64 {
    fn same_value(&self, other: &Self) -> bool {
        self.to_bits() == other.to_bits()
    }
}

impl SameValue for Vector3 {
    fn same_value(&self, other: &Self) -> bool {
        self.x.same_value(&other.x) && self.y.same_value(&other.y) && self.z.same_value(&other.z)
    }
}

impl<T: SameValue> SameValue for Option<T> {
    fn same_value(&self, other: &Self) -> bool {
        match (self, other) {
            (Some(a), Some(b)) => a.same_value(b),
            (None, None) => true,
            _ => false,
        }
    }
}

/// Holds the most recent value offered since the last [`take`](Self::take)
#[derive(Debug, Clone)]
pub struct SampleSlot<T> {
    latest: Option<T>,
}

impl<T> SampleSlot<T> {
    /// Empty slot.
    pub fn new() -> Self {
        Self { latest: None }
    }

    /// Stores `value`, replacing any value not yet taken.
    pub fn offer(&mut self, value: T) {
        self.latest = Some(value);
    }

    /// Removes the pending value at an interval boundary.
    pub fn take(&mut self) -> Option<T> {
        self.latest.take()
    }
}

impl<T> Default for SampleSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Suppresses a value equal to the previously admitted one
#[derive(Debug, Clone)]
pub struct Distinct<T> {
    last: Option<T>,
}

impl<T: SameValue + Clone> Distinct<T> {
    /// Admits the first value it sees.
    pub fn new() -> Self {
        Self { last: None }
    }

    /// Returns true if `value` differs from the last admitted value and
    /// records it.
    pub fn admit(&mut self, value: &T) -> bool {
        match &self.last {
            Some(last) if last.same_value(value) => false,
            _ => {
                self.last = Some(value.clone());
                true
            }
        }
    }
}

impl<T: SameValue + Clone> Default for Distinct<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Latest value from each of two sources
///
/// Yields a pair on every update once both sides have been seen.
#[derive(Debug, Clone)]
pub struct LatestPair<A, B> {
    left: Option<A>,
    right: Option<B>,
}

impl<A: Clone, B: Clone> LatestPair<A, B> {
    /// Empty on both sides.
    pub fn new() -> Self {
        Self {
            left: None,
            right: None,
        }
    }

    /// Records a left value; returns the pair once both sides are known.
    pub fn set_left(&mut self, value: A) -> Option<(A, B)> {
        self.left = Some(value);
        self.pair()
    }

    /// Records a right value; returns the pair once both sides are known.
    pub fn set_right(&mut self, value: B) -> Option<(A, B)> {
        self.right = Some(value);
        self.pair()
    }

    /// Both sides seen at least once.
    pub fn is_ready(&self) -> bool {
        self.left.is_some() && self.right.is_some()
    }

    fn pair(&self) -> Option<(A, B)> {
        match (&self.left, &self.right) {
            (Some(a), Some(b)) => Some((a.clone(), b.clone())),
            _ => None,
        }
    }
}

impl<A: Clone, B: Clone> Default for LatestPair<A, B> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_slot_keeps_latest() {
        let mut slot = SampleSlot::new();
        assert_eq!(slot.take(), None);

        slot.offer(1.0);
        slot.offer(2.0);
        assert_eq!(slot.take(), Some(2.0));
        assert_eq!(slot.take(), None);
    }

    #[test]
    fn distinct_is_bitwise() {
        let mut distinct = Distinct::new();
        assert!(distinct.admit(&1.5));
        assert!(!distinct.admit(&1.5));
        assert!(distinct.admit(&2.0));
        assert!(distinct.admit(&1.5));

        assert!(distinct.admit(&0.0));
        assert!(distinct.admit(&-0.0));

        assert!(distinct.admit(&f64::NAN));
        assert!(!distinct.admit(&f64::NAN));
    }

    #[test]
    fn distinct_vectors() {
        let mut distinct = Distinct::new();
        assert!(distinct.admit(&Vector3::new(1.0, 2.0, 3.0)));
        assert!(!distinct.admit(&Vector3::new(1.0, 2.0, 3.0)));
        assert!(distinct.admit(&Vector3::new(1.0, 2.0, 3.5)));
    }

    #[test]
    fn latest_pair_waits_for_both_sides() {
        let mut pair = LatestPair::new();
        assert_eq!(pair.set_left("a"), None);
        assert_eq!(pair.set_left("b"), None);
        assert!(!pair.is_ready());

        assert_eq!(pair.set_right(1), Some(("b", 1)));
        assert_eq!(pair.set_right(2), Some(("b", 2)));
        assert_eq!(pair.set_left("c"), Some(("c", 2)));
    }
}
