use std::{
    fmt::{self, Display, Formatter},
    str::FromStr,
};

use super::{interval::Interval, numeric::Numeric, set::IntervalSet, RangeError};

/// Tracks which numbers of a domain are occupied.
// Impl Note:
// `free` holds the numbers that can still be handed out.
// Occupy  - number is carved out of `free`
// Release - number is filled back into `free`
// The occupied view is always the complement of `free`.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeAllocator<N> {
    free: IntervalSet<N>,
}

impl<N: Numeric> RangeAllocator<N> {
    /// An allocator with nothing occupied.
    pub fn new() -> Self {
        Self {
            free: IntervalSet::full(),
        }
    }

    /// An allocator that can only hand out numbers inside `range`.
    pub fn within(range: Interval<N>) -> Result<Self, RangeError<N>> {
        let mut allocator = Self::new();
        allocator.exclude_outside(range)?;
        Ok(allocator)
    }

    /// True if no number is left to hand out.
    pub fn is_full(&self) -> bool {
        self.free.is_empty()
    }

    /// True if nothing is occupied.
    pub fn is_empty(&self) -> bool {
        self.free.is_full()
    }

    pub fn lowest_free(&self) -> Option<N> {
        self.free.first()
    }

    /// Occupies and returns the lowest free number.
    pub fn allocate_lowest(&mut self) -> Option<N> {
        let value = self.lowest_free()?;
        self.free.carve(value);
        Some(value)
    }

    /// Returns `false` if `value` was already occupied.
    pub fn occupy(&mut self, value: N) -> bool {
        self.free.carve(value)
    }

    /// Returns `false` if `value` was already free.
    pub fn release(&mut self, value: N) -> bool {
        self.free.fill(value)
    }

    pub fn is_occupied(&self, value: N) -> bool {
        !self.free.contains(value)
    }

    pub fn is_free(&self, value: N) -> bool {
        self.free.contains(value)
    }

    pub fn occupy_range(&mut self, range: Interval<N>) -> Result<(), RangeError<N>> {
        self.free.carve_range(range)
    }

    pub fn release_range(&mut self, range: Interval<N>) -> Result<(), RangeError<N>> {
        self.free.fill_range(range)
    }

    /// Occupies everything outside of `range`.
    pub fn exclude_outside(&mut self, range: Interval<N>) -> Result<(), RangeError<N>> {
        self.free.restrict(range)
    }

    /// Number of values that can still be handed out.
    pub fn free_capacity(&self) -> N::Size {
        self.free.size()
    }

    pub fn occupied_count(&self) -> N::Size {
        self.occupied().size()
    }

    pub fn free_ranges(&self) -> &IntervalSet<N> {
        &self.free
    }

    pub fn occupied(&self) -> IntervalSet<N> {
        self.free.inverted()
    }

    /// Occupies everything `other` occupies.
    pub fn merge_occupied(&mut self, other: &Self) {
        self.free = self.occupied().union(&other.occupied()).inverted();
    }

    /// Releases everything `other` occupies.
    pub fn release_occupied(&mut self, other: &Self) {
        self.free.merge(&other.occupied());
    }

    /// Keeps only the numbers occupied in both allocators occupied.
    ///
    /// This unions the free sets, so it can only ever widen what is free.
    pub fn intersect(&mut self, other: &Self) {
        self.free.merge(&other.free);
    }

    /// Releases everything.
    pub fn clear(&mut self) {
        self.free.clear();
    }
}

impl<N: Numeric> Default for RangeAllocator<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Renders the occupied view as `"{count} {from} {to};..."`.
impl<N: Numeric> Display for RangeAllocator<N> {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        let occupied = self.occupied();
        write!(formatter, "{} ", occupied.len())?;
        for interval in occupied.intervals() {
            write!(formatter, "{interval}")?;
        }
        Ok(())
    }
}

impl<N: Numeric> FromStr for RangeAllocator<N> {
    type Err = RangeError<N>;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim_start();
        let (count, rest) = value.split_once(char::is_whitespace).unwrap_or((value, ""));
        let count = count
            .parse::<usize>()
            .map_err(|_| RangeError::Malformed(format!("'{count}' is not a valid count")))?;

        let mut allocator = Self::new();
        let mut tokens = rest.split(';').filter(|token| !token.trim().is_empty());
        for read in 0..count {
            let token = tokens.next().ok_or_else(|| {
                RangeError::Malformed(format!("expected {count} intervals, found {read}"))
            })?;
            allocator.occupy_range(token.parse::<Interval<N>>()?)?;
        }
        Ok(allocator)
    }
}

#[cfg(test)]
mod tests {
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    use super::*;
    use crate::allocator::set::tests::check_set_invariants;

    #[test]
    fn test_allocate_lowest_until_full() {
        let mut allocator = RangeAllocator::within(Interval::new(1u32, 5)).unwrap();
        assert!(!allocator.is_empty());
        assert_eq!(allocator.free_capacity(), 5);

        let allocated: Vec<u32> = (0..5).filter_map(|_| allocator.allocate_lowest()).collect();
        assert_eq!(allocated, vec![1, 2, 3, 4, 5]);

        assert!(allocator.is_full());
        assert_eq!(allocator.lowest_free(), None);
        assert_eq!(allocator.allocate_lowest(), None);
        assert!(!allocator.occupy(3));
    }

    #[test]
    fn test_occupy_and_release() {
        let mut allocator = RangeAllocator::<u32>::new();
        assert!(allocator.is_empty());

        assert!(allocator.occupy(10));
        assert!(!allocator.occupy(10), "already occupied");
        assert!(allocator.is_occupied(10));
        assert!(!allocator.is_empty());

        assert!(allocator.release(10));
        assert!(!allocator.release(10), "already free");
        assert!(allocator.is_free(10));
        assert!(allocator.is_empty());
    }

    #[test]
    fn test_released_numbers_are_reused_first() {
        let mut allocator = RangeAllocator::within(Interval::new(100u32, 199)).unwrap();
        for _ in 0..10 {
            allocator.allocate_lowest();
        }
        assert!(allocator.release(103));
        assert!(allocator.release(101));
        assert_eq!(allocator.allocate_lowest(), Some(101));
        assert_eq!(allocator.allocate_lowest(), Some(103));
        assert_eq!(allocator.allocate_lowest(), Some(110));
    }

    #[test]
    fn test_within_excludes_outside() {
        let allocator = RangeAllocator::within(Interval::new(10u32, 20)).unwrap();
        assert!(allocator.is_occupied(9));
        assert!(allocator.is_occupied(21));
        assert!(allocator.is_free(10));
        assert!(allocator.is_free(20));
        assert_eq!(
            allocator.occupied().intervals(),
            &[Interval::new(0, 9), Interval::new(21, u32::MAX)]
        );
        assert!(RangeAllocator::within(Interval::new(20u32, 10)).is_err());
    }

    #[test]
    fn test_capacity_is_conserved() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut allocator = RangeAllocator::<u32>::new();
        let domain = 1u64 << 32;
        assert_eq!(allocator.free_capacity(), domain);

        for _ in 0..1000 {
            let value = rng.random_range(0..1000u32);
            if rng.random_bool(0.7) {
                allocator.occupy(value);
            } else {
                allocator.release(value);
            }
            check_set_invariants(allocator.free_ranges());
            assert_eq!(allocator.free_capacity() + allocator.occupied_count(), domain);
        }
    }

    #[test]
    fn test_merge_occupied_and_release_occupied() {
        let mut a = RangeAllocator::<u32>::new();
        let mut b = RangeAllocator::<u32>::new();
        a.occupy(1);
        a.occupy(2);
        b.occupy(2);
        b.occupy(7);

        let mut merged = a.clone();
        merged.merge_occupied(&b);
        assert_eq!(
            merged.occupied().intervals(),
            &[Interval::new(1, 2), Interval::point(7)]
        );

        merged.release_occupied(&a);
        assert_eq!(merged.occupied().intervals(), &[Interval::point(7)]);
    }

    #[test]
    fn test_intersect_keeps_common_occupied() {
        let mut a = RangeAllocator::<u32>::new();
        let mut b = RangeAllocator::<u32>::new();
        a.occupy_range(Interval::new(1, 10)).unwrap();
        b.occupy_range(Interval::new(5, 20)).unwrap();

        a.intersect(&b);
        assert_eq!(a.occupied().intervals(), &[Interval::new(5, 10)]);
    }

    #[test]
    fn test_range_operations() {
        let mut allocator = RangeAllocator::<u32>::new();
        allocator.occupy_range(Interval::new(10, 19)).unwrap();
        assert_eq!(allocator.occupied_count(), 10);
        allocator.release_range(Interval::new(12, 13)).unwrap();
        assert_eq!(
            allocator.occupied().intervals(),
            &[Interval::new(10, 11), Interval::new(14, 19)]
        );
        assert!(allocator.occupy_range(Interval::new(3, 2)).is_err());

        allocator.clear();
        assert!(allocator.is_empty());
    }

    #[test]
    fn test_text_form() {
        let mut allocator = RangeAllocator::<u32>::new();
        allocator.occupy_range(Interval::new(1, 3)).unwrap();
        allocator.occupy(7);
        assert_eq!(allocator.to_string(), "2 1 3;7 7;");

        let parsed: RangeAllocator<u32> = "2 1 3;7 7;".parse().unwrap();
        assert_eq!(parsed, allocator);

        // overlapping tokens are merged on the way in
        let parsed: RangeAllocator<u32> = "3 5 8; 6 10; 20 20;".parse().unwrap();
        assert_eq!(
            parsed.occupied().intervals(),
            &[Interval::new(5, 10), Interval::point(20)]
        );

        assert_eq!(RangeAllocator::<u32>::new().to_string(), "0 ");
        assert!("0".parse::<RangeAllocator<u32>>().unwrap().is_empty());
        assert!("2 1 3;".parse::<RangeAllocator<u32>>().is_err());
        assert!("x 1 3;".parse::<RangeAllocator<u32>>().is_err());
        assert!("1 4 2;".parse::<RangeAllocator<u32>>().is_err());
    }
}
