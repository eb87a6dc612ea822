use std::cmp::Ordering;

use super::{interval::Interval, numeric::Numeric, RangeError};

/// An ordered set of closed intervals over a numeric domain.
///
/// Members are sorted by `from`, never overlap and never touch: two members
/// are always separated by at least one value that is not in the set. Every
/// mutation restores this before returning.
///
/// The set does not know whether its members mean "free" or "occupied", the
/// owner decides. [`IntervalSet::full`] (also the default) covers the whole
/// domain, [`IntervalSet::empty`] covers nothing.
#[derive(Debug, Clone, PartialEq)]
pub struct IntervalSet<N> {
    intervals: Vec<Interval<N>>,
}

impl<N: Numeric> Default for IntervalSet<N> {
    fn default() -> Self {
        Self::full()
    }
}

impl<N: Numeric> IntervalSet<N> {
    pub fn full() -> Self {
        Self {
            intervals: vec![Interval::full()],
        }
    }

    pub fn empty() -> Self {
        Self {
            intervals: Vec::new(),
        }
    }

    /// Builds a set from arbitrary intervals, merging what overlaps or touches.
    /// Invalid intervals are skipped.
    pub fn from_intervals<I: IntoIterator<Item = Interval<N>>>(intervals: I) -> Self {
        Self::coalesce(intervals.into_iter().filter(|interval| !interval.is_invalid()).collect())
    }

    /// Resets the set to cover the whole domain.
    pub fn clear(&mut self) {
        self.intervals.clear();
        self.intervals.push(Interval::full());
    }

    pub fn intervals(&self) -> &[Interval<N>] {
        &self.intervals
    }

    /// Number of intervals, not number of values.
    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    pub fn is_full(&self) -> bool {
        matches!(self.intervals.as_slice(), [only] if *only == Interval::full())
    }

    /// Lowest value in the set.
    pub fn first(&self) -> Option<N> {
        self.intervals.first().map(|interval| interval.from)
    }

    /// Number of values in the set.
    pub fn size(&self) -> N::Size {
        self.intervals
            .iter()
            .fold(N::Size::default(), |total, interval| total + interval.size())
    }

    pub fn contains(&self, value: N) -> bool {
        self.locate(value).is_ok()
    }

    /// The member covering `value`, if any.
    pub fn find(&self, value: N) -> Option<Interval<N>> {
        self.locate(value).ok().map(|index| self.intervals[index])
    }

    // Ok(index) of the covering member, or Err(index) of the first member
    // starting above `value`.
    fn locate(&self, value: N) -> Result<usize, usize> {
        self.intervals.binary_search_by(|interval| {
            if interval.to < value {
                Ordering::Less
            } else if interval.from > value {
                Ordering::Greater
            } else {
                Ordering::Equal
            }
        })
    }

    /// Takes `value` out of the set.
    ///
    /// Shrinks, splits or drops the covering member. Returns `false` when
    /// `value` was not in the set, in which case nothing changes. For floats,
    /// members left shorter than one `STEP` beside `value` are dropped too.
    pub fn carve(&mut self, value: N) -> bool {
        let Ok(index) = self.locate(value) else {
            return false;
        };
        let covering = self.intervals[index];
        // from < value and value < to keep both steps inside the domain
        let below = (covering.from < value)
            .then(|| Interval::new(covering.from, value - N::STEP))
            .filter(|interval| !interval.is_invalid());
        let above = (value < covering.to)
            .then(|| Interval::new(value + N::STEP, covering.to))
            .filter(|interval| !interval.is_invalid());

        match (below, above) {
            (Some(below), Some(above)) => {
                self.intervals[index] = above;
                self.intervals.insert(index, below);
            }
            (Some(rest), None) | (None, Some(rest)) => self.intervals[index] = rest,
            (None, None) => {
                self.intervals.remove(index);
            }
        }
        true
    }

    /// Puts `value` back into the set.
    ///
    /// Joins the neighbouring members when `value` is adjacent to them, and
    /// closes a single value gap between two members into one. Returns `false`
    /// when `value` is already in the set.
    pub fn fill(&mut self, value: N) -> bool {
        let index = match self.locate(value) {
            Ok(_) => return false,
            Err(index) => index,
        };
        // same adjacency rule as Interval::touches, floats may sit closer than one STEP
        let joins_previous = index > 0
            && self.intervals[index - 1]
                .to
                .successor()
                .is_some_and(|next| next >= value);
        let joins_next = index < self.intervals.len()
            && value
                .successor()
                .is_some_and(|next| next >= self.intervals[index].from);

        match (joins_previous, joins_next) {
            (true, true) => {
                self.intervals[index - 1].to = self.intervals[index].to;
                self.intervals.remove(index);
            }
            (true, false) => self.intervals[index - 1].to = value,
            (false, true) => self.intervals[index].from = value,
            (false, false) => self.intervals.insert(index, Interval::point(value)),
        }
        true
    }

    /// Takes every value of `range` out of the set.
    pub fn carve_range(&mut self, range: Interval<N>) -> Result<(), RangeError<N>> {
        let range = range.validate()?;
        let mut result = Vec::with_capacity(self.intervals.len() + 1);
        for interval in self.intervals.drain(..) {
            if interval.to < range.from || interval.from > range.to {
                result.push(interval);
                continue;
            }
            if interval.from < range.from {
                result.push(Interval::new(interval.from, range.from - N::STEP));
            }
            if interval.to > range.to {
                result.push(Interval::new(range.to + N::STEP, interval.to));
            }
        }
        self.intervals = result;
        Ok(())
    }

    /// Adds every value of `range` to the set.
    pub fn fill_range(&mut self, range: Interval<N>) -> Result<(), RangeError<N>> {
        let range = range.validate()?;
        self.merge(&Self {
            intervals: vec![range],
        });
        Ok(())
    }

    /// Drops every value outside of `range`.
    pub fn restrict(&mut self, range: Interval<N>) -> Result<(), RangeError<N>> {
        let range = range.validate()?;
        self.intervals = self
            .intervals
            .iter()
            .map(|interval| interval.intersect(&range))
            .filter(|interval| !interval.is_invalid())
            .collect();
        Ok(())
    }

    /// The union of both sets.
    pub fn union(&self, other: &Self) -> Self {
        let mut result = self.clone();
        result.merge(other);
        result
    }

    /// Adds all members of `other` to this set.
    pub fn merge(&mut self, other: &Self) {
        if other.intervals.is_empty() {
            return;
        }
        let mut intervals = std::mem::take(&mut self.intervals);
        intervals.extend_from_slice(&other.intervals);
        *self = Self::coalesce(intervals);
    }

    fn coalesce(mut intervals: Vec<Interval<N>>) -> Self {
        intervals.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
        let mut merged: Vec<Interval<N>> = Vec::with_capacity(intervals.len());
        for interval in intervals {
            let joined = merged
                .last_mut()
                .is_some_and(|last| last.merge_into(&interval));
            if !joined {
                merged.push(interval);
            }
        }
        Self { intervals: merged }
    }

    /// The complement of this set within `[MIN, MAX]`.
    pub fn inverted(&self) -> Self {
        let mut intervals = Vec::with_capacity(self.intervals.len() + 1);
        let mut cursor = Some(N::MIN);
        for interval in &self.intervals {
            if let Some(start) = cursor {
                if interval.from > start {
                    intervals.push(Interval::new(start, interval.from - N::STEP));
                }
            }
            cursor = interval.to.successor();
        }
        if let Some(start) = cursor {
            intervals.push(Interval::new(start, N::MAX));
        }
        Self { intervals }
    }

    pub fn invert(&mut self) {
        *self = self.inverted();
    }
}

impl<N: Numeric> From<Interval<N>> for IntervalSet<N> {
    fn from(interval: Interval<N>) -> Self {
        Self::from_intervals([interval])
    }
}
