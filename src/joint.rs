//! Distance joints between two bodies: soft springs or rigid rods.

use crate::body::Body;
use crate::error::PhysicsError;
use crate::float::Float;
use crate::handle::BodyId;
use crate::vec::Vec2;
use slotmap::SlotMap;

/// Everything needed to create a joint.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct JointDef<F: Float> {
    pub a: BodyId,
    pub b: BodyId,
    /// Rest length. `None` uses the distance between the bodies at creation.
    pub length: Option<F>,
    /// Oscillation frequency in Hz. Zero makes the joint rigid.
    pub frequency: F,
    pub damping_ratio: F,
}

impl<F: Float> JointDef<F> {
    pub fn new(a: BodyId, b: BodyId, frequency: F, damping_ratio: F) -> Self {
        JointDef { a, b, length: None, frequency, damping_ratio }
    }

    pub fn with_length(mut self, length: F) -> Self {
        self.length = Some(length);
        self
    }

    pub(crate) fn validate(&self) -> Result<(), PhysicsError> {
        if self.a == self.b {
            return Err(PhysicsError::SelfJoint);
        }
        if !(self.frequency.is_finite() && self.frequency >= F::zero()) {
            return Err(PhysicsError::InvalidFrequency);
        }
        if !(self.damping_ratio.is_finite() && self.damping_ratio >= F::zero()) {
            return Err(PhysicsError::InvalidDampingRatio);
        }
        Ok(())
    }
}

/// A joint that keeps two bodies near a rest distance.
///
/// With a positive frequency the joint is a damped spring whose stiffness is
/// derived from the pair's effective mass, so the same frequency feels the
/// same on light and heavy bodies. With zero frequency it is solved as a
/// rigid position constraint.
#[derive(Clone, Debug)]
pub struct DistanceJoint<F: Float> {
    pub a: BodyId,
    pub b: BodyId,
    pub rest_length: F,
    pub frequency: F,
    pub damping_ratio: F,
}

impl<F: Float> DistanceJoint<F> {
    pub fn new(a: BodyId, b: BodyId, rest_length: F, frequency: F, damping_ratio: F) -> Self {
        DistanceJoint { a, b, rest_length, frequency, damping_ratio }
    }

    pub fn is_rigid(&self) -> bool {
        self.frequency.is_near_zero(F::from_f32(1e-6))
    }

    /// Current distance between the endpoints.
    pub fn length(&self, bodies: &SlotMap<BodyId, Body<F>>) -> Option<F> {
        let a = bodies.get(self.a)?;
        let b = bodies.get(self.b)?;
        Some(a.pos.distance(b.pos))
    }

    /// Accumulate spring and damper forces on both bodies.
    pub fn apply_spring(&self, bodies: &mut SlotMap<BodyId, Body<F>>, dt: F) {
        if self.is_rigid() {
            return;
        }
        let (a, b) = match (bodies.get(self.a), bodies.get(self.b)) {
            (Some(a), Some(b)) => (a, b),
            _ => return,
        };

        let w_total = a.inv_mass + b.inv_mass;
        if w_total.is_near_zero(F::from_f32(1e-10)) {
            return;
        }
        let delta = b.pos - a.pos;
        let dist = delta.length();
        if dist.is_near_zero(F::from_f32(1e-10)) {
            return; // degenerate
        }
        let normal = delta.scale(F::one() / dist);

        let effective_mass = F::one() / w_total;
        let omega = F::two() * F::pi() * self.frequency;
        let stiffness = effective_mass * omega * omega;
        let damping = F::two() * effective_mass * self.damping_ratio * omega;

        let relative_speed = (b.velocity(dt) - a.velocity(dt)).dot(normal);
        let magnitude = stiffness * (dist - self.rest_length) + damping * relative_speed;
        let force = normal.scale(magnitude);

        if let Some(a) = bodies.get_mut(self.a) {
            a.apply_force(force);
        }
        if let Some(b) = bodies.get_mut(self.b) {
            b.apply_force(-force);
        }
    }

    /// Project both bodies back to the rest distance (rigid joints only).
    pub fn solve(&self, bodies: &mut SlotMap<BodyId, Body<F>>) {
        if !self.is_rigid() {
            return;
        }
        let (a_pos, a_inv, b_pos, b_inv) = match (bodies.get(self.a), bodies.get(self.b)) {
            (Some(a), Some(b)) => (a.pos, a.inv_mass, b.pos, b.inv_mass),
            _ => return,
        };

        let w_total = a_inv + b_inv;
        if w_total.is_near_zero(F::from_f32(1e-10)) {
            return;
        }

        let delta = b_pos - a_pos;
        let dist = delta.length();
        if dist.is_near_zero(F::from_f32(1e-10)) {
            return; // degenerate
        }

        let error = dist - self.rest_length;
        let correction: Vec2<F> = delta.scale(error / dist);

        if let Some(a) = bodies.get_mut(self.a) {
            a.pos = a.pos + correction.scale(a_inv / w_total);
        }
        if let Some(b) = bodies.get_mut(self.b) {
            b.pos = b.pos - correction.scale(b_inv / w_total);
        }
    }
}
