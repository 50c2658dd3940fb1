//! Point-mass bodies integrated with position-based (Verlet) dynamics.

use crate::error::PhysicsError;
use crate::float::Float;
use crate::handle::AgentId;
use crate::properties::VertexPhysics;
use crate::vec::Vec2;

/// Everything needed to create a body.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BodyDef<F: Float> {
    pub position: Vec2<F>,
    pub physics: VertexPhysics<F>,
    /// Non-owning link back to the agent this body belongs to.
    pub owner: Option<AgentId>,
}

impl<F: Float> BodyDef<F> {
    pub fn new(position: Vec2<F>, physics: VertexPhysics<F>) -> Self {
        BodyDef { position, physics, owner: None }
    }

    pub fn with_owner(mut self, owner: AgentId) -> Self {
        self.owner = Some(owner);
        self
    }

    pub(crate) fn validate(&self) -> Result<(), PhysicsError> {
        let p = &self.physics;
        if !(p.radius.is_finite() && p.radius > F::zero()) {
            return Err(PhysicsError::InvalidRadius);
        }
        if !(p.density.is_finite() && p.density > F::zero()) {
            return Err(PhysicsError::InvalidDensity);
        }
        Ok(())
    }
}

/// A circular point mass. Rotation is never simulated: orientation carries no
/// meaning for a vertex of a soft mesh.
#[derive(Clone, Debug)]
pub struct Body<F: Float> {
    pub pos: Vec2<F>,
    pub prev_pos: Vec2<F>,
    pub acceleration: Vec2<F>,
    /// Velocity change queued by impulses, applied on the next integration.
    pub impulse_velocity: Vec2<F>,
    pub mass: F,
    pub inv_mass: F,
    pub radius: F,
    pub restitution: F,
    pub friction: F,
    pub owner: Option<AgentId>,
}

impl<F: Float> Body<F> {
    /// Build a body from a validated definition. Mass is `density * pi * r^2`.
    pub fn new(def: &BodyDef<F>) -> Self {
        let r = def.physics.radius;
        let mass = def.physics.density * F::pi() * r * r;
        let inv_mass = if mass.is_near_zero(F::from_f32(1e-10)) {
            F::zero()
        } else {
            F::one() / mass
        };
        Body {
            pos: def.position,
            prev_pos: def.position,
            acceleration: Vec2::zero(),
            impulse_velocity: Vec2::zero(),
            mass,
            inv_mass,
            radius: r,
            restitution: def.physics.restitution,
            friction: def.physics.friction,
            owner: def.owner,
        }
    }

    pub fn apply_force(&mut self, force: Vec2<F>) {
        self.acceleration += force.scale(self.inv_mass);
    }

    pub fn apply_acceleration(&mut self, accel: Vec2<F>) {
        self.acceleration += accel;
    }

    /// Instant velocity change of `impulse / mass`.
    pub fn apply_impulse(&mut self, impulse: Vec2<F>) {
        self.impulse_velocity += impulse.scale(self.inv_mass);
    }

    pub fn integrate(&mut self, dt: F, damping: F) {
        let velocity = (self.pos - self.prev_pos).scale(damping) + self.impulse_velocity.scale(dt);
        let new_pos = self.pos + velocity + self.acceleration.scale(dt * dt);
        self.prev_pos = self.pos;
        self.pos = new_pos;
        self.acceleration = Vec2::zero();
        self.impulse_velocity = Vec2::zero();
    }

    /// Velocity over the last step of length `dt`, including queued impulses.
    pub fn velocity(&self, dt: F) -> Vec2<F> {
        if dt.is_near_zero(F::from_f32(1e-30)) {
            return Vec2::zero();
        }
        (self.pos - self.prev_pos).scale(F::one() / dt) + self.impulse_velocity
    }

    /// Replace the velocity. Only the position history changes, so the body
    /// does not jump.
    pub fn set_velocity(&mut self, velocity: Vec2<F>, dt: F) {
        self.impulse_velocity = Vec2::zero();
        self.prev_pos = self.pos - velocity.scale(dt);
    }
}
