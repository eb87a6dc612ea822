//! Numeric range allocation.
//!
//! An [`RangeAllocator`] hands out numbers of an ordered domain and takes them
//! back. Internally it keeps the *free* numbers as an [`IntervalSet`] of
//! disjoint closed [`Interval`]s, so a domain with billions of values costs
//! only as much memory as it has gaps.
//!
//! ```
//! use common::allocator::{Interval, RangeAllocator};
//!
//! let mut allocator = RangeAllocator::within(Interval::new(100u32, 199)).unwrap();
//! assert_eq!(allocator.allocate_lowest(), Some(100));
//! assert!(allocator.occupy(150));
//! assert!(allocator.release(100));
//! assert_eq!(allocator.lowest_free(), Some(100));
//! ```

use std::fmt::Debug;

use thiserror::Error;

pub use handler::RangeAllocator;
pub use interval::Interval;
pub use numeric::Numeric;
pub use set::IntervalSet;

mod handler;
mod interval;
mod numeric;
mod set;

#[derive(Debug, Error, PartialEq)]
pub enum RangeError<N: Debug> {
    #[error("Invalid interval [{from:?}, {to:?}]: the lower bound is greater than the upper bound")]
    InvalidInterval { from: N, to: N },
    #[error("Malformed range text: {0}")]
    Malformed(String),
}
