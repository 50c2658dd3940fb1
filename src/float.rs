//! Scalar type used throughout the crate.

use core::cmp::Ordering;
use core::fmt::{Debug, Display};
use core::ops::{Add, Div, Mul, Neg, Sub};

/// Floating-point scalar the simulation is generic over.
///
/// Implemented for `f32` and `f64`. Square roots and trigonometry go through
/// `libm`, so a seeded run gives the same bits on every platform.
pub trait Float:
    Copy
    + PartialEq
    + PartialOrd
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Neg<Output = Self>
    + Default
    + Debug
    + Display
{
    /// Additive identity.
    fn zero() -> Self;
    /// Multiplicative identity.
    fn one() -> Self;
    /// 0.5, used for midpoints and half-steps.
    fn half() -> Self;
    /// 2.0.
    fn two() -> Self;
    /// The constant pi.
    fn pi() -> Self;
    /// Square root.
    fn sqrt(self) -> Self;
    /// Sine of an angle in radians.
    fn sin(self) -> Self;
    /// Cosine of an angle in radians.
    fn cos(self) -> Self;
    /// Absolute value.
    fn abs(self) -> Self;
    /// Smaller of two values; returns `self` when they compare equal.
    fn min(self, other: Self) -> Self;
    /// Larger of two values; returns `self` when they compare equal.
    fn max(self, other: Self) -> Self;
    /// Lossless for `f64`; used for literals and configuration constants.
    fn from_f32(v: f32) -> Self;
    /// False for NaN and the infinities.
    fn is_finite(self) -> bool;

    /// Counts and indices. Exact below 2^24.
    fn from_usize(n: usize) -> Self {
        Self::from_f32(n as f32)
    }

    /// Restrict to `[lo, hi]`. Expects `lo <= hi`.
    fn clamp(self, lo: Self, hi: Self) -> Self {
        self.max(lo).min(hi)
    }

    /// True when `|self| < epsilon`.
    fn is_near_zero(self, epsilon: Self) -> bool {
        self.abs() < epsilon
    }

    /// Total order for sorting; NaN compares equal to everything.
    fn order(self, other: Self) -> Ordering {
        self.partial_cmp(&other).unwrap_or(Ordering::Equal)
    }
}

macro_rules! impl_float {
    ($t:ident, $pi:expr, $sqrt:path, $sin:path, $cos:path, $abs:path) => {
        impl Float for $t {
            fn zero() -> Self { 0.0 }
            fn one() -> Self { 1.0 }
            fn half() -> Self { 0.5 }
            fn two() -> Self { 2.0 }
            fn pi() -> Self { $pi }
            fn sqrt(self) -> Self { $sqrt(self) }
            fn sin(self) -> Self { $sin(self) }
            fn cos(self) -> Self { $cos(self) }
            fn abs(self) -> Self { $abs(self) }
            fn min(self, other: Self) -> Self { if other < self { other } else { self } }
            fn max(self, other: Self) -> Self { if other > self { other } else { self } }
            fn from_f32(v: f32) -> Self { v as $t }
            fn is_finite(self) -> bool { $t::is_finite(self) }
        }
    };
}

impl_float!(f32, core::f32::consts::PI, libm::sqrtf, libm::sinf, libm::cosf, libm::fabsf);
impl_float!(f64, core::f64::consts::PI, libm::sqrt, libm::sin, libm::cos, libm::fabs);
