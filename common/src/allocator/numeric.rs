use std::{
    fmt::{Debug, Display},
    ops::{Add, Sub},
    str::FromStr,
};

/// An ordered numeric domain the allocator can work on.
///
/// `STEP` is the increment used for every interval boundary computation: `1`
/// for integers and the machine epsilon for floating-point types. Two
/// intervals are adjacent when one starts at most one `STEP` after the other
/// ends.
///
/// For floats the machine epsilon is only the spacing of values in `[1, 2)`.
/// Below `1.0` several values fit into one `STEP`, above `2.0` adding `STEP`
/// rounds back to the same value, so carving a single value of large
/// magnitude can leave it in the set.
///
/// `Size` is a type wide enough to hold the number of values in the whole
/// domain (`u32::MAX + 1` does not fit into `u32`).
pub trait Numeric:
    Copy
    + PartialOrd
    + Debug
    + Display
    + FromStr
    + Add<Output = Self>
    + Sub<Output = Self>
{
    const MIN: Self;
    const MAX: Self;
    const STEP: Self;

    type Size: Copy + PartialEq + PartialOrd + Debug + Display + Default + Add<Output = Self::Size>;

    /// Number of values covered by the closed range `[from, to]`.
    fn size(from: Self, to: Self) -> Self::Size;

    /// The next value of the domain, `None` at the upper end.
    fn successor(self) -> Option<Self> {
        if self >= Self::MAX {
            None
        } else {
            Some(self + Self::STEP)
        }
    }

    /// The previous value of the domain, `None` at the lower end.
    fn predecessor(self) -> Option<Self> {
        if self <= Self::MIN {
            None
        } else {
            Some(self - Self::STEP)
        }
    }
}

macro_rules! impl_integer {
    ($($ty:ty => $size:ty),* $(,)?) => {
        $(
            impl Numeric for $ty {
                const MIN: Self = <$ty>::MIN;
                const MAX: Self = <$ty>::MAX;
                const STEP: Self = 1;

                type Size = $size;

                // Signed values sign-extend into the wider type, the wrapping
                // difference is still the exact distance.
                fn size(from: Self, to: Self) -> $size {
                    (to as $size).wrapping_sub(from as $size) + 1
                }
            }
        )*
    };
}

macro_rules! impl_float {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Numeric for $ty {
                const MIN: Self = <$ty>::MIN;
                const MAX: Self = <$ty>::MAX;
                const STEP: Self = <$ty>::EPSILON;

                type Size = $ty;

                fn size(from: Self, to: Self) -> $ty {
                    (to - from) + Self::STEP
                }
            }
        )*
    };
}

impl_integer!(
    u8 => u32,
    u16 => u32,
    u32 => u64,
    u64 => u128,
    i32 => u64,
    i64 => u128,
);
impl_float!(f32, f64);
