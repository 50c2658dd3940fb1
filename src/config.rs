//! Configuration types for the physics world and the bonding subsystem.

use crate::error::PhysicsError;
use crate::float::Float;
use crate::vec::Vec2;
use serde::{Deserialize, Serialize};

/// Axis-aligned walls that keep bodies inside the installation area.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bounds<F: Float> {
    pub min: Vec2<F>,
    pub max: Vec2<F>,
    /// Fraction of normal velocity kept when bouncing off a wall.
    pub restitution: F,
}

impl<F: Float> Bounds<F> {
    pub fn new(min: Vec2<F>, max: Vec2<F>, restitution: F) -> Self {
        Bounds { min, max, restitution }
    }
}

/// Configuration for stepping a [`VerletWorld`](crate::world::VerletWorld).
///
/// # Builder Pattern
/// ```
/// use softkin::config::SolverConfig;
/// use softkin::vec::Vec2;
///
/// let config: SolverConfig<f32> = SolverConfig::new()
///     .with_iterations(8)
///     .with_gravity(Vec2::new(0.0, 9.81))
///     .with_damping(0.99)
///     .with_sub_steps(2);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SolverConfig<F: Float> {
    /// Number of constraint solver iterations per sub-step.
    /// More iterations = stiffer rigid joints and firmer contacts. Default: 4.
    pub iterations: usize,
    /// Gravity acceleration vector. Default: zero (the installation floor is a wall).
    pub gravity: Vec2<F>,
    /// Velocity damping factor [0, 1]. 1.0 = no damping. Default: 0.99.
    pub damping: F,
    /// Number of sub-steps per frame. Higher = more stable. Default: 1.
    pub sub_steps: usize,
    /// Extra distance at which two circles already count as touching. Default: 0.
    pub contact_slop: F,
    /// Optional walls. Default: none.
    pub bounds: Option<Bounds<F>>,
}

impl<F: Float> SolverConfig<F> {
    /// Create a new config with default values.
    pub fn new() -> Self {
        SolverConfig {
            iterations: 4,
            gravity: Vec2::zero(),
            damping: F::from_f32(0.99),
            sub_steps: 1,
            contact_slop: F::zero(),
            bounds: None,
        }
    }

    /// Set the number of constraint iterations.
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    /// Set the gravity vector.
    pub fn with_gravity(mut self, gravity: Vec2<F>) -> Self {
        self.gravity = gravity;
        self
    }

    /// Set the damping factor.
    pub fn with_damping(mut self, damping: F) -> Self {
        self.damping = damping;
        self
    }

    /// Set the number of sub-steps.
    pub fn with_sub_steps(mut self, sub_steps: usize) -> Self {
        self.sub_steps = sub_steps.max(1);
        self
    }

    pub fn with_contact_slop(mut self, slop: F) -> Self {
        self.contact_slop = slop.max(F::zero());
        self
    }

    pub fn with_bounds(mut self, bounds: Bounds<F>) -> Self {
        self.bounds = Some(bounds);
        self
    }
}

impl<F: Float> Default for SolverConfig<F> {
    fn default() -> Self {
        Self::new()
    }
}

/// Thresholds for creating and breaking inter-agent joints.
///
/// Lengths are in world units, durations in ticks.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BondingConfig<F: Float> {
    /// Master switch. When off, contacts never create bonds. Default: true.
    pub enabled: bool,
    /// Spring frequency of a bond joint in Hz. Default: 4.0.
    pub frequency: F,
    /// Damping ratio of a bond joint. Default: 0.5.
    pub damping_ratio: F,
    /// Shortest rest length a new bond may have. Default: 5.0.
    pub min_length: F,
    /// Longest rest length a new bond may have; a live bond stretched beyond
    /// this is broken by the overstretch guard. Default: 80.0.
    pub max_length: F,
    /// On contact end, a bond survives while its endpoints are at most this
    /// far apart. Default: 40.0.
    pub contact_envelope: F,
    /// Bonds a single vertex body may hold at once. Default: 1.
    pub max_bonds_per_body: usize,
    /// Bonds a single agent may hold at once. Default: 4.
    pub max_bonds_per_agent: usize,
    /// Ticks a body must wait after one of its bonds breaks. Default: 120.
    pub cooldown_ticks: u32,
    /// Ticks a break event stays in the roster's memory. Default: 60.
    pub memory_ticks: u32,
}

impl<F: Float> BondingConfig<F> {
    pub fn new() -> Self {
        BondingConfig {
            enabled: true,
            frequency: F::from_f32(4.0),
            damping_ratio: F::from_f32(0.5),
            min_length: F::from_f32(5.0),
            max_length: F::from_f32(80.0),
            contact_envelope: F::from_f32(40.0),
            max_bonds_per_body: 1,
            max_bonds_per_agent: 4,
            cooldown_ticks: 120,
            memory_ticks: 60,
        }
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_joint(mut self, frequency: F, damping_ratio: F) -> Self {
        self.frequency = frequency;
        self.damping_ratio = damping_ratio;
        self
    }

    /// Set the allowed rest-length range. `max` is also the overstretch limit.
    pub fn with_length_range(mut self, min: F, max: F) -> Self {
        self.min_length = min.min(max);
        self.max_length = max.max(min);
        self
    }

    pub fn with_contact_envelope(mut self, envelope: F) -> Self {
        self.contact_envelope = envelope;
        self
    }

    pub fn with_max_bonds(mut self, per_body: usize, per_agent: usize) -> Self {
        self.max_bonds_per_body = per_body;
        self.max_bonds_per_agent = per_agent;
        self
    }

    pub fn with_cooldown_ticks(mut self, ticks: u32) -> Self {
        self.cooldown_ticks = ticks;
        self
    }

    pub fn with_memory_ticks(mut self, ticks: u32) -> Self {
        self.memory_ticks = ticks;
        self
    }

    /// Reject values that would make every bond joint fail to build.
    pub fn validate(&self) -> Result<(), PhysicsError> {
        if !(self.frequency.is_finite() && self.frequency >= F::zero()) {
            return Err(PhysicsError::InvalidFrequency);
        }
        if !(self.damping_ratio.is_finite() && self.damping_ratio >= F::zero()) {
            return Err(PhysicsError::InvalidDampingRatio);
        }
        let lengths = [self.min_length, self.max_length, self.contact_envelope];
        if lengths.iter().any(|l| !l.is_finite())
            || self.min_length <= F::zero()
            || self.min_length > self.max_length
            || self.contact_envelope < F::zero()
        {
            return Err(PhysicsError::InvalidBondLength);
        }
        Ok(())
    }
}

impl<F: Float> Default for BondingConfig<F> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sub_steps_never_zero() {
        let config: SolverConfig<f32> = SolverConfig::new().with_sub_steps(0);
        assert_eq!(config.sub_steps, 1);
    }

    #[test]
    fn length_range_is_ordered() {
        let config: BondingConfig<f32> = BondingConfig::new().with_length_range(50.0, 10.0);
        assert_eq!(config.min_length, 10.0);
        assert_eq!(config.max_length, 50.0);
    }

    #[test]
    fn bonding_validate() {
        assert_eq!(BondingConfig::<f32>::default().validate(), Ok(()));
        let negative = BondingConfig::<f32>::default().with_joint(-1.0, 0.5);
        assert_eq!(negative.validate(), Err(PhysicsError::InvalidFrequency));
        let undamped = BondingConfig::<f32>::default().with_joint(4.0, f32::NAN);
        assert_eq!(undamped.validate(), Err(PhysicsError::InvalidDampingRatio));
        let zero = BondingConfig::<f32>::default().with_length_range(0.0, 10.0);
        assert_eq!(zero.validate(), Err(PhysicsError::InvalidBondLength));
    }
}
