//! Vector types for the planar simulation and its render mesh.

use crate::float::Float;
use core::ops::{Add, AddAssign, Neg, Sub};
use serde::{Deserialize, Serialize};

/// Planar vector: body positions, velocities, impulses, targets.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2<F: Float> {
    pub x: F,
    pub y: F,
}

impl<F: Float> Vec2<F> {
    pub fn new(x: F, y: F) -> Self { Vec2 { x, y } }

    pub fn zero() -> Self { Vec2 { x: F::zero(), y: F::zero() } }

    pub fn splat(value: F) -> Self { Vec2 { x: value, y: value } }

    /// Unit vector at `angle` radians from the +X axis.
    pub fn from_angle(angle: F) -> Self { Vec2 { x: angle.cos(), y: angle.sin() } }

    pub fn dot(self, other: Self) -> F { self.x * other.x + self.y * other.y }

    /// Quarter turn counter-clockwise.
    pub fn perp(self) -> Self { Vec2 { x: -self.y, y: self.x } }

    pub fn scale(self, s: F) -> Self { Vec2 { x: self.x * s, y: self.y * s } }

    pub fn length_sq(self) -> F { self.dot(self) }

    pub fn length(self) -> F { self.length_sq().sqrt() }

    /// Unit vector in the same direction; zero stays zero.
    pub fn normalize(self) -> Self {
        match self.length() {
            len if len.is_near_zero(F::from_f32(1e-10)) => Vec2::zero(),
            len => self.scale(F::one() / len),
        }
    }

    /// Shorten to at most `max` length, keeping direction.
    pub fn clamp_length(self, max: F) -> Self {
        let len = self.length();
        if len > max && !len.is_near_zero(F::from_f32(1e-10)) {
            self.scale(max / len)
        } else {
            self
        }
    }

    pub fn distance(self, other: Self) -> F { (self - other).length() }

    pub fn distance_sq(self, other: Self) -> F { (self - other).length_sq() }

    /// `self` at `t = 0`, `other` at `t = 1`.
    pub fn lerp(self, other: Self, t: F) -> Self { self + (other - self).scale(t) }

    pub fn is_finite(self) -> bool { self.x.is_finite() && self.y.is_finite() }
}

impl<F: Float> Add for Vec2<F> {
    type Output = Self;
    fn add(self, rhs: Self) -> Self { Vec2 { x: self.x + rhs.x, y: self.y + rhs.y } }
}

impl<F: Float> AddAssign for Vec2<F> {
    fn add_assign(&mut self, rhs: Self) { *self = *self + rhs; }
}

impl<F: Float> Sub for Vec2<F> {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self { Vec2 { x: self.x - rhs.x, y: self.y - rhs.y } }
}

impl<F: Float> Neg for Vec2<F> {
    type Output = Self;
    fn neg(self) -> Self { Vec2 { x: -self.x, y: -self.y } }
}

/// 3D vertex as handed to the renderer. The simulation is planar: only `x`
/// and `y` are ever written back from physics, `z` is left as generated.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3<F: Float> {
    pub x: F,
    pub y: F,
    pub z: F,
}

impl<F: Float> Vec3<F> {
    pub fn new(x: F, y: F, z: F) -> Self { Vec3 { x, y, z } }

    /// Lift a planar point onto the z = 0 plane.
    pub fn from_xy(p: Vec2<F>) -> Self { Vec3 { x: p.x, y: p.y, z: F::zero() } }

    /// Planar projection.
    pub fn xy(self) -> Vec2<F> { Vec2 { x: self.x, y: self.y } }
}
