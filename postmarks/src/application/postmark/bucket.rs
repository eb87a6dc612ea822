use common::allocator::{Interval, RangeAllocator, RangeError};
use regex::Regex;
use thiserror::Error;

use crate::config::RangeRule;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("Invalid range for pattern '{pattern}': {source}")]
    Range {
        pattern: String,
        #[source]
        source: RangeError<u32>,
    },
    #[error("Malformed configuration document: {0}")]
    Document(#[from] serde_json::Error),
}

/// One allocation pool, serving the devices whose id matches `pattern`.
pub struct Bucket {
    rule: RangeRule,
    pattern: Regex,
    range: Interval<u32>,
    allocator: RangeAllocator<u32>,
}

impl Bucket {
    pub fn new(rule: &RangeRule) -> Result<Self, ConfigError> {
        let pattern =
            Regex::new(&format!("^(?:{})$", rule.regex)).map_err(|source| ConfigError::Pattern {
                pattern: rule.regex.clone(),
                source,
            })?;
        let range = Interval::new(rule.from, rule.to);
        let allocator = RangeAllocator::within(range).map_err(|source| ConfigError::Range {
            pattern: rule.regex.clone(),
            source,
        })?;

        Ok(Self {
            rule: rule.clone(),
            pattern,
            range,
            allocator,
        })
    }

    pub(crate) fn rule(&self) -> &RangeRule {
        &self.rule
    }

    pub fn matches(&self, device: &str) -> bool {
        self.pattern.is_match(device)
    }

    pub fn allocator(&self) -> &RangeAllocator<u32> {
        &self.allocator
    }

    fn accepts(&self, device: &str) -> bool {
        !self.allocator.is_full() && self.matches(device)
    }
}

/// Ordered list of buckets sharing one postmark namespace.
///
/// A postmark handed out by one bucket is occupied in every other bucket as
/// well, so two devices can never end up with the same postmark even when
/// their buckets overlap.
#[derive(Default)]
pub struct Buckets {
    buckets: Vec<Bucket>,
}

impl Buckets {
    pub fn new(rules: &[RangeRule]) -> Result<Self, ConfigError> {
        let buckets = rules.iter().map(Bucket::new).collect::<Result<_, _>>()?;
        Ok(Self { buckets })
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Bucket> {
        self.buckets.iter()
    }

    /// Hands out a postmark from the first matching bucket that is not full.
    ///
    /// `requested` is honored if it is still free in that bucket, otherwise
    /// the lowest free postmark is used. Returns `None` if no bucket takes the
    /// device.
    pub fn assign(&mut self, device: &str, requested: Option<u32>) -> Option<u32> {
        let index = self.buckets.iter().position(|bucket| bucket.accepts(device))?;
        let allocator = &mut self.buckets[index].allocator;
        let postmark = match requested {
            Some(requested) if allocator.occupy(requested) => requested,
            _ => allocator.allocate_lowest()?,
        };
        self.propagate(index, postmark);
        Some(postmark)
    }

    /// Puts a persisted postmark back into the first matching bucket that can
    /// take exactly this value.
    pub fn restore(&mut self, device: &str, postmark: u32) -> bool {
        let Some(index) = self
            .buckets
            .iter_mut()
            .position(|bucket| bucket.accepts(device) && bucket.allocator.occupy(postmark))
        else {
            return false;
        };
        self.propagate(index, postmark);
        true
    }

    /// Frees `postmark` in every bucket it can legally live in.
    pub fn release(&mut self, postmark: u32) {
        for bucket in &mut self.buckets {
            if bucket.range.contains(postmark) {
                bucket.allocator.release(postmark);
            }
        }
    }

    fn propagate(&mut self, origin: usize, postmark: u32) {
        for (index, bucket) in self.buckets.iter_mut().enumerate() {
            if index != origin {
                bucket.allocator.occupy(postmark);
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn rule(regex: &str, from: u32, to: u32) -> RangeRule {
        RangeRule {
            regex: regex.to_string(),
            from,
            to,
        }
    }

    #[test]
    fn test_first_matching_bucket_wins() {
        let mut buckets =
            Buckets::new(&[rule("a.*", 1, 3), rule("b.*", 1, 3), rule(".*", 10, 20)]).unwrap();
        assert_eq!(buckets.assign("a1", None), Some(1));
        assert_eq!(buckets.assign("b1", Some(1)), Some(2));
        assert_eq!(buckets.assign("c1", None), Some(10));
    }

    #[test]
    fn test_requested_postmark_is_honored_when_free() {
        let mut buckets = Buckets::new(&[rule("dev-.*", 100, 199)]).unwrap();
        assert_eq!(buckets.assign("dev-1", Some(150)), Some(150));
        assert_eq!(buckets.assign("dev-2", Some(150)), Some(100));
        // outside of the bucket range
        assert_eq!(buckets.assign("dev-3", Some(5)), Some(101));
    }

    #[test]
    fn test_patterns_match_whole_device_id() {
        let mut buckets = Buckets::new(&[rule("a", 1, 3)]).unwrap();
        assert_eq!(buckets.assign("ab", None), None);
        assert_eq!(buckets.assign("ba", None), None);
        assert_eq!(buckets.assign("a", None), Some(1));
    }

    #[test]
    fn test_full_bucket_is_skipped() {
        let mut buckets = Buckets::new(&[rule("a.*", 1, 2), rule("a.*", 5, 5)]).unwrap();
        assert_eq!(buckets.assign("a1", None), Some(1));
        assert_eq!(buckets.assign("a2", None), Some(2));
        assert_eq!(buckets.assign("a3", None), Some(5));
        assert_eq!(buckets.assign("a4", None), None);
    }

    #[test]
    fn test_postmark_is_propagated_to_every_bucket() {
        let mut buckets = Buckets::new(&[rule("b.*", 1, 3), rule("a.*", 1, 3)]).unwrap();
        assert_eq!(buckets.assign("a1", None), Some(1));
        // the earlier bucket saw the postmark of the later one
        assert_eq!(buckets.assign("b1", None), Some(2));
    }

    #[test]
    fn test_release_only_touches_legal_ranges() {
        let mut buckets = Buckets::new(&[rule("a.*", 1, 3), rule("b.*", 10, 12)]).unwrap();
        assert_eq!(buckets.assign("a1", None), Some(1));
        buckets.release(1);

        let b = buckets.iter().nth(1).unwrap();
        assert!(b.allocator().is_occupied(1), "outside of range stays occupied");
        assert_eq!(b.allocator().free_capacity(), 3);
        assert_eq!(buckets.assign("a2", None), Some(1));
    }

    #[test]
    fn test_restore_requires_exact_postmark() {
        let mut buckets = Buckets::new(&[rule("a.*", 1, 3), rule("a.*", 4, 6)]).unwrap();
        assert!(buckets.restore("a1", 5));
        assert!(!buckets.restore("a2", 5), "already taken");
        assert!(!buckets.restore("a3", 9), "outside of every range");
        assert!(!buckets.restore("b1", 1), "no matching bucket");
        assert_eq!(buckets.assign("a4", Some(5)), Some(1));
    }

    #[test]
    fn test_invalid_rules_are_rejected() {
        assert!(matches!(
            Buckets::new(&[rule("(", 1, 3)]),
            Err(ConfigError::Pattern { .. })
        ));
        assert!(matches!(
            Buckets::new(&[rule("a", 5, 1)]),
            Err(ConfigError::Range { .. })
        ));
        assert!(Buckets::new(&[]).unwrap().is_empty());
    }
}
