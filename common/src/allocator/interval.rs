use std::{
    fmt::{self, Display, Formatter},
    str::FromStr,
};

use super::{numeric::Numeric, RangeError};

/// A closed range `[from, to]` of a numeric domain.
///
/// An interval with `from > to` is invalid and stands for "nothing"; results
/// of [`Interval::intersect`] have to be checked with [`Interval::is_invalid`]
/// before they are used.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Interval<N> {
    pub from: N,
    pub to: N,
}

impl<N: Numeric> Interval<N> {
    pub fn new(from: N, to: N) -> Self {
        Self { from, to }
    }

    pub fn point(value: N) -> Self {
        Self::new(value, value)
    }

    /// The whole domain `[MIN, MAX]`.
    pub fn full() -> Self {
        Self::new(N::MIN, N::MAX)
    }

    /// An invalid interval that contains nothing.
    pub fn empty() -> Self {
        Self::new(N::MAX, N::MIN)
    }

    pub fn is_invalid(&self) -> bool {
        self.from > self.to
    }

    pub fn contains(&self, value: N) -> bool {
        self.from <= value && value <= self.to
    }

    /// Number of values covered by this interval.
    pub fn size(&self) -> N::Size {
        if self.is_invalid() {
            N::Size::default()
        } else {
            N::size(self.from, self.to)
        }
    }

    pub fn intersect(&self, other: &Self) -> Self {
        let mut result = *self;
        if other.from > result.from {
            result.from = other.from;
        }
        if other.to < result.to {
            result.to = other.to;
        }
        result
    }

    /// True if both intervals overlap or one starts right after the other ends.
    pub fn touches(&self, other: &Self) -> bool {
        let reach = |value: N| value.successor().unwrap_or(value);
        other.from <= reach(self.to) && self.from <= reach(other.to)
    }

    /// Extends this interval to also cover `other` when they touch.
    ///
    /// Returns `false` and leaves the interval untouched otherwise.
    pub fn merge_into(&mut self, other: &Self) -> bool {
        if self.is_invalid() || other.is_invalid() || !self.touches(other) {
            return false;
        }
        if other.from < self.from {
            self.from = other.from;
        }
        if other.to > self.to {
            self.to = other.to;
        }
        true
    }

    pub(crate) fn validate(self) -> Result<Self, RangeError<N>> {
        if self.is_invalid() {
            Err(RangeError::InvalidInterval {
                from: self.from,
                to: self.to,
            })
        } else {
            Ok(self)
        }
    }
}

impl<N: Numeric> Display for Interval<N> {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        write!(formatter, "{} {};", self.from, self.to)
    }
}

impl<N: Numeric> FromStr for Interval<N> {
    type Err = RangeError<N>;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        let value = value.strip_suffix(';').unwrap_or(value);
        let mut tokens = value.split_whitespace();
        let (Some(from), Some(to), None) = (tokens.next(), tokens.next(), tokens.next()) else {
            return Err(RangeError::Malformed(format!(
                "expected two bounds, got '{value}'"
            )));
        };
        let parse = |token: &str| {
            token
                .parse::<N>()
                .map_err(|_| RangeError::Malformed(format!("'{token}' is not a valid bound")))
        };
        Ok(Self::new(parse(from)?, parse(to)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intersect_clamps_inward() {
        let a = Interval::new(1u32, 10);
        let b = Interval::new(5u32, 20);
        assert_eq!(a.intersect(&b), Interval::new(5, 10));
        assert_eq!(b.intersect(&a), Interval::new(5, 10));

        let disjoint = Interval::new(1u32, 3).intersect(&Interval::new(7, 9));
        assert!(disjoint.is_invalid());
        assert_eq!(disjoint.size(), 0);
    }

    #[test]
    fn test_touching_intervals_merge() {
        let mut a = Interval::new(1u32, 3);
        assert!(a.merge_into(&Interval::new(4, 6)));
        assert_eq!(a, Interval::new(1, 6));

        assert!(a.merge_into(&Interval::new(0, 2)));
        assert_eq!(a, Interval::new(0, 6));

        assert!(!a.merge_into(&Interval::new(8, 9)));
        assert_eq!(a, Interval::new(0, 6));
    }

    #[test]
    fn test_touching_at_domain_bounds() {
        let top = Interval::new(250u8, u8::MAX);
        assert!(top.touches(&Interval::new(u8::MAX, u8::MAX)));
        assert!(!top.touches(&Interval::new(0, 248)));
        assert!(top.touches(&Interval::new(0, 249)));
    }

    #[test]
    fn test_ordering_is_lexicographic() {
        assert!(Interval::new(1u32, 5) < Interval::new(2, 3));
        assert!(Interval::new(1u32, 3) < Interval::new(1, 5));
        assert_eq!(Interval::new(4u32, 4), Interval::point(4));
    }

    #[test]
    fn test_text_form() {
        let interval = Interval::new(3u32, 17);
        assert_eq!(interval.to_string(), "3 17;");
        assert_eq!("3 17;".parse::<Interval<u32>>().unwrap(), interval);
        assert_eq!(" 3   17 ".parse::<Interval<u32>>().unwrap(), interval);
        assert!("3".parse::<Interval<u32>>().is_err());
        assert!("3 x;".parse::<Interval<u32>>().is_err());
        assert!("1 2 3;".parse::<Interval<u32>>().is_err());
    }

    #[test]
    fn test_validate_rejects_invalid() {
        assert!(Interval::new(1u32, 2).validate().is_ok());
        assert_eq!(
            Interval::new(5u32, 2).validate(),
            Err(RangeError::InvalidInterval { from: 5, to: 2 })
        );
        assert!(Interval::<u32>::empty().is_invalid());
    }
}
