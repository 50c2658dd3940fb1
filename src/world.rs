//! The physics-world interface consumed by agents, and a Verlet implementation.

use crate::body::{Body, BodyDef};
use crate::config::SolverConfig;
use crate::error::PhysicsError;
use crate::float::Float;
use crate::handle::{AgentId, BodyId, JointId};
use crate::joint::{DistanceJoint, JointDef};
use crate::observer::StepObserver;
use crate::vec::Vec2;
use slotmap::{SecondaryMap, SlotMap};
use std::collections::{BTreeSet, HashMap};

/// Operations the soft-body core needs from a 2D physics engine.
///
/// Stepping is deliberately absent: the application owns the step and the
/// contact callbacks that come with it.
pub trait PhysicsWorld<F: Float> {
    fn create_body(&mut self, def: BodyDef<F>) -> Result<BodyId, PhysicsError>;

    /// Fails with [`PhysicsError::BodyHasJoints`] while a joint still uses the body.
    fn destroy_body(&mut self, id: BodyId) -> Result<(), PhysicsError>;

    fn create_joint(&mut self, def: JointDef<F>) -> Result<JointId, PhysicsError>;

    fn destroy_joint(&mut self, id: JointId) -> Result<(), PhysicsError>;

    fn body_position(&self, id: BodyId) -> Option<Vec2<F>>;

    fn body_owner(&self, id: BodyId) -> Option<AgentId>;

    fn linear_velocity(&self, id: BodyId) -> Option<Vec2<F>>;

    fn set_linear_velocity(&mut self, id: BodyId, velocity: Vec2<F>) -> Result<(), PhysicsError>;

    fn apply_force(&mut self, id: BodyId, force: Vec2<F>) -> Result<(), PhysicsError>;

    fn apply_impulse(&mut self, id: BodyId, impulse: Vec2<F>) -> Result<(), PhysicsError>;

    fn joint_bodies(&self, id: JointId) -> Option<(BodyId, BodyId)>;

    /// Current distance between a joint's endpoints.
    fn joint_length(&self, id: JointId) -> Option<F> {
        let (a, b) = self.joint_bodies(id)?;
        Some(self.body_position(a)?.distance(self.body_position(b)?))
    }

    fn body_count(&self) -> usize;

    fn joint_count(&self) -> usize;
}

fn ordered(a: BodyId, b: BodyId) -> (BodyId, BodyId) {
    if a <= b { (a, b) } else { (b, a) }
}

/// A small planar engine: circle bodies, distance joints, circle contacts.
///
/// Joined bodies never collide with each other. Contacts are reported to the
/// step observer once per step, after all sub-steps, sorted by body pair.
pub struct VerletWorld<F: Float> {
    bodies: SlotMap<BodyId, Body<F>>,
    joints: SlotMap<JointId, DistanceJoint<F>>,
    joint_refs: SecondaryMap<BodyId, usize>,
    joined_pairs: HashMap<(BodyId, BodyId), usize>,
    contacts: BTreeSet<(BodyId, BodyId)>,
    last_dt: F,
}

impl<F: Float> VerletWorld<F> {
    pub fn new() -> Self {
        VerletWorld {
            bodies: SlotMap::with_key(),
            joints: SlotMap::with_key(),
            joint_refs: SecondaryMap::new(),
            joined_pairs: HashMap::new(),
            contacts: BTreeSet::new(),
            last_dt: F::one() / F::from_f32(60.0),
        }
    }

    pub fn body(&self, id: BodyId) -> Option<&Body<F>> {
        self.bodies.get(id)
    }

    pub fn joint(&self, id: JointId) -> Option<&DistanceJoint<F>> {
        self.joints.get(id)
    }

    pub fn bodies(&self) -> impl Iterator<Item = (BodyId, &Body<F>)> {
        self.bodies.iter()
    }

    /// Bodies whose owner is `agent`.
    pub fn bodies_owned_by(&self, agent: AgentId) -> usize {
        self.bodies.values().filter(|b| b.owner == Some(agent)).count()
    }

    /// Bodies with no owner at all.
    pub fn unowned_bodies(&self) -> usize {
        self.bodies.values().filter(|b| b.owner.is_none()).count()
    }

    /// Joints that have at least one endpoint owned by `agent`.
    pub fn joints_touching(&self, agent: AgentId) -> usize {
        self.joints
            .values()
            .filter(|j| {
                self.body_owner(j.a) == Some(agent) || self.body_owner(j.b) == Some(agent)
            })
            .count()
    }

    /// Live contact pairs from the last step.
    pub fn contacts(&self) -> impl Iterator<Item = &(BodyId, BodyId)> {
        self.contacts.iter()
    }

    pub fn is_joined(&self, a: BodyId, b: BodyId) -> bool {
        self.joined_pairs.contains_key(&ordered(a, b))
    }

    /// Teleport a body, discarding its velocity. For setup and tests only;
    /// agents never write positions.
    pub fn place_body(&mut self, id: BodyId, position: Vec2<F>) -> Result<(), PhysicsError> {
        let body = self.bodies.get_mut(id).ok_or(PhysicsError::UnknownBody(id))?;
        body.pos = position;
        body.prev_pos = position;
        body.impulse_velocity = Vec2::zero();
        Ok(())
    }

    /// Advance the world by `dt`, reporting contact changes to `observer`.
    pub fn step<O: StepObserver>(&mut self, dt: F, config: &SolverConfig<F>, observer: &mut O) {
        let sub_steps = config.sub_steps.max(1);
        let sub_dt = dt / F::from_usize(sub_steps);

        for _sub in 0..sub_steps {
            for body in self.bodies.values_mut() {
                body.apply_acceleration(config.gravity);
            }
            for joint in self.joints.values() {
                joint.apply_spring(&mut self.bodies, sub_dt);
            }

            for body in self.bodies.values_mut() {
                body.integrate(sub_dt, config.damping);
            }
            observer.on_integrate();

            for i in 0..config.iterations {
                for joint in self.joints.values() {
                    joint.solve(&mut self.bodies);
                }
                self.resolve_collisions(i == 0);
                if let Some(bounds) = &config.bounds {
                    self.resolve_bounds(bounds.min, bounds.max);
                }
                observer.on_constraint_iteration(i);
            }

            if let Some(bounds) = &config.bounds {
                self.reflect_at_bounds(bounds.min, bounds.max, bounds.restitution);
            }
        }

        self.last_dt = sub_dt;
        self.report_contacts(config.contact_slop, observer);
        observer.on_step_complete();
    }

    /// Candidate pairs whose X extents overlap, sorted. Joined pairs excluded.
    fn broadphase(&self, slop: F) -> Vec<(BodyId, BodyId)> {
        struct Elem<F> {
            min: F,
            max: F,
            id: BodyId,
        }

        let mut elems: Vec<Elem<F>> = self
            .bodies
            .iter()
            .filter(|(_, b)| b.pos.is_finite())
            .map(|(id, b)| Elem { min: b.pos.x - b.radius - slop, max: b.pos.x + b.radius + slop, id })
            .collect();
        elems.sort_by(|a, b| a.min.order(b.min).then(a.id.cmp(&b.id)));

        let mut active: Vec<usize> = Vec::new();
        let mut out = Vec::new();
        for (i, e) in elems.iter().enumerate() {
            active.retain(|&j| elems[j].max >= e.min);
            for &j in &active {
                let pair = ordered(elems[j].id, e.id);
                if !self.joined_pairs.contains_key(&pair) {
                    out.push(pair);
                }
            }
            active.push(i);
        }
        out.sort_unstable();
        out
    }

    /// Push overlapping circles apart. Friction is applied on the first pass only.
    fn resolve_collisions(&mut self, apply_friction: bool) {
        for (ia, ib) in self.broadphase(F::zero()) {
            let (a, b) = (&self.bodies[ia], &self.bodies[ib]);
            let delta = b.pos - a.pos;
            let dist = delta.length();
            let reach = a.radius + b.radius;
            let w_total = a.inv_mass + b.inv_mass;
            if dist >= reach || w_total.is_near_zero(F::from_f32(1e-10)) {
                continue;
            }
            let normal = if dist.is_near_zero(F::from_f32(1e-10)) {
                Vec2::new(F::one(), F::zero())
            } else {
                delta.scale(F::one() / dist)
            };
            let (a_inv, b_inv) = (a.inv_mass, b.inv_mass);
            let friction = if apply_friction {
                (a.friction * b.friction).sqrt().clamp(F::zero(), F::one())
            } else {
                F::zero()
            };

            // Relative tangential motion this step, damped by friction.
            let tangent = normal.perp();
            let slide = ((b.pos - b.prev_pos) - (a.pos - a.prev_pos)).dot(tangent);
            let friction_shift = tangent.scale(slide * friction);

            let push = normal.scale(reach - dist);
            if let Some(a) = self.bodies.get_mut(ia) {
                a.pos = a.pos - push.scale(a_inv / w_total) + friction_shift.scale(a_inv / w_total);
            }
            if let Some(b) = self.bodies.get_mut(ib) {
                b.pos = b.pos + push.scale(b_inv / w_total) - friction_shift.scale(b_inv / w_total);
            }
        }
    }

    fn resolve_bounds(&mut self, min: Vec2<F>, max: Vec2<F>) {
        for body in self.bodies.values_mut() {
            let r = body.radius;
            body.pos.x = body.pos.x.clamp(min.x + r, max.x - r);
            body.pos.y = body.pos.y.clamp(min.y + r, max.y - r);
        }
    }

    /// Flip the velocity of bodies resting against a wall, scaled by restitution.
    fn reflect_at_bounds(&mut self, min: Vec2<F>, max: Vec2<F>, restitution: F) {
        let eps = F::from_f32(1e-4);
        for body in self.bodies.values_mut() {
            let r = body.radius;
            let bounce = restitution.max(body.restitution);
            let vel = body.pos - body.prev_pos;
            if (body.pos.x - (min.x + r) <= eps && vel.x < F::zero())
                || ((max.x - r) - body.pos.x <= eps && vel.x > F::zero())
            {
                body.prev_pos.x = body.pos.x + vel.x * bounce;
            }
            if (body.pos.y - (min.y + r) <= eps && vel.y < F::zero())
                || ((max.y - r) - body.pos.y <= eps && vel.y > F::zero())
            {
                body.prev_pos.y = body.pos.y + vel.y * bounce;
            }
        }
    }

    fn report_contacts<O: StepObserver>(&mut self, slop: F, observer: &mut O) {
        // Resting contacts sit exactly at `ra + rb`; keep them reported.
        let slop = slop + F::from_f32(1e-3);
        let mut touching = BTreeSet::new();
        for (ia, ib) in self.broadphase(slop) {
            let (a, b) = (&self.bodies[ia], &self.bodies[ib]);
            let reach = a.radius + b.radius + slop;
            if a.pos.distance_sq(b.pos) <= reach * reach {
                touching.insert((ia, ib));
            }
        }

        for &(a, b) in self.contacts.difference(&touching) {
            observer.on_contact_end(a, b);
        }
        for &(a, b) in touching.difference(&self.contacts) {
            observer.on_contact_start(a, b);
        }
        self.contacts = touching;
    }

    fn link(&mut self, a: BodyId, b: BodyId) {
        for id in [a, b] {
            if let Some(count) = self.joint_refs.get_mut(id) {
                *count += 1;
            } else {
                self.joint_refs.insert(id, 1);
            }
        }
        let pair = ordered(a, b);
        *self.joined_pairs.entry(pair).or_insert(0) += 1;
        // Joined bodies stop colliding; a live contact between them ends silently.
        self.contacts.remove(&pair);
    }

    fn unlink(&mut self, a: BodyId, b: BodyId) {
        for id in [a, b] {
            if let Some(count) = self.joint_refs.get_mut(id) {
                *count = count.saturating_sub(1);
            }
        }
        let pair = ordered(a, b);
        if let Some(count) = self.joined_pairs.get_mut(&pair) {
            *count -= 1;
            if *count == 0 {
                self.joined_pairs.remove(&pair);
            }
        }
    }
}

impl<F: Float> Default for VerletWorld<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: Float> PhysicsWorld<F> for VerletWorld<F> {
    fn create_body(&mut self, def: BodyDef<F>) -> Result<BodyId, PhysicsError> {
        def.validate()?;
        let id = self.bodies.insert(Body::new(&def));
        self.joint_refs.insert(id, 0);
        Ok(id)
    }

    fn destroy_body(&mut self, id: BodyId) -> Result<(), PhysicsError> {
        if !self.bodies.contains_key(id) {
            return Err(PhysicsError::UnknownBody(id));
        }
        let joints = self.joint_refs.get(id).copied().unwrap_or(0);
        if joints > 0 {
            return Err(PhysicsError::BodyHasJoints { body: id, joints });
        }
        self.bodies.remove(id);
        self.joint_refs.remove(id);
        self.contacts.retain(|&(a, b)| a != id && b != id);
        Ok(())
    }

    fn create_joint(&mut self, def: JointDef<F>) -> Result<JointId, PhysicsError> {
        def.validate()?;
        let a = self.bodies.get(def.a).ok_or(PhysicsError::UnknownBody(def.a))?;
        let b = self.bodies.get(def.b).ok_or(PhysicsError::UnknownBody(def.b))?;
        let rest_length = def.length.unwrap_or_else(|| a.pos.distance(b.pos));
        let id = self.joints.insert(DistanceJoint::new(
            def.a,
            def.b,
            rest_length,
            def.frequency,
            def.damping_ratio,
        ));
        self.link(def.a, def.b);
        Ok(id)
    }

    fn destroy_joint(&mut self, id: JointId) -> Result<(), PhysicsError> {
        let joint = self.joints.remove(id).ok_or(PhysicsError::UnknownJoint(id))?;
        self.unlink(joint.a, joint.b);
        Ok(())
    }

    fn body_position(&self, id: BodyId) -> Option<Vec2<F>> {
        self.bodies.get(id).map(|b| b.pos)
    }

    fn body_owner(&self, id: BodyId) -> Option<AgentId> {
        self.bodies.get(id).and_then(|b| b.owner)
    }

    fn linear_velocity(&self, id: BodyId) -> Option<Vec2<F>> {
        self.bodies.get(id).map(|b| b.velocity(self.last_dt))
    }

    fn set_linear_velocity(&mut self, id: BodyId, velocity: Vec2<F>) -> Result<(), PhysicsError> {
        let dt = self.last_dt;
        let body = self.bodies.get_mut(id).ok_or(PhysicsError::UnknownBody(id))?;
        body.set_velocity(velocity, dt);
        Ok(())
    }

    fn apply_force(&mut self, id: BodyId, force: Vec2<F>) -> Result<(), PhysicsError> {
        let body = self.bodies.get_mut(id).ok_or(PhysicsError::UnknownBody(id))?;
        body.apply_force(force);
        Ok(())
    }

    fn apply_impulse(&mut self, id: BodyId, impulse: Vec2<F>) -> Result<(), PhysicsError> {
        let body = self.bodies.get_mut(id).ok_or(PhysicsError::UnknownBody(id))?;
        body.apply_impulse(impulse);
        Ok(())
    }

    fn joint_bodies(&self, id: JointId) -> Option<(BodyId, BodyId)> {
        self.joints.get(id).map(|j| (j.a, j.b))
    }

    fn body_count(&self) -> usize {
        self.bodies.len()
    }

    fn joint_count(&self) -> usize {
        self.joints.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::{ContactLog, NoOpStepObserver};
    use crate::properties::VertexPhysics;

    fn physics(radius: f32) -> VertexPhysics<f32> {
        VertexPhysics { restitution: 0.0, density: 1.0, friction: 0.0, radius }
    }

    #[test]
    fn body_with_joint_cannot_be_destroyed() {
        let mut world: VerletWorld<f32> = VerletWorld::new();
        let a = world.create_body(BodyDef::new(Vec2::new(0.0, 0.0), physics(1.0))).unwrap();
        let b = world.create_body(BodyDef::new(Vec2::new(5.0, 0.0), physics(1.0))).unwrap();
        let j = world.create_joint(JointDef::new(a, b, 0.0, 0.0)).unwrap();

        assert_eq!(world.destroy_body(a), Err(PhysicsError::BodyHasJoints { body: a, joints: 1 }));
        world.destroy_joint(j).unwrap();
        world.destroy_body(a).unwrap();
        assert_eq!(world.body_count(), 1);
    }

    #[test]
    fn joint_rest_length_defaults_to_current_distance() {
        let mut world: VerletWorld<f32> = VerletWorld::new();
        let a = world.create_body(BodyDef::new(Vec2::new(0.0, 0.0), physics(1.0))).unwrap();
        let b = world.create_body(BodyDef::new(Vec2::new(3.0, 4.0), physics(1.0))).unwrap();
        let j = world.create_joint(JointDef::new(a, b, 2.0, 0.5)).unwrap();
        assert!((world.joint(j).unwrap().rest_length - 5.0).abs() < 1e-6);
    }

    #[test]
    fn overlapping_bodies_report_contact_then_separate() {
        let mut world: VerletWorld<f32> = VerletWorld::new();
        let a = world.create_body(BodyDef::new(Vec2::new(0.0, 0.0), physics(1.0))).unwrap();
        let b = world.create_body(BodyDef::new(Vec2::new(1.5, 0.0), physics(1.0))).unwrap();

        let mut log = ContactLog::new();
        let config = SolverConfig::new();
        world.step(1.0 / 60.0, &config, &mut log);
        assert_eq!(log.started, vec![ordered(a, b)]);
        assert!(world.body_position(a).unwrap().distance(world.body_position(b).unwrap()) >= 1.99);

        world.place_body(b, Vec2::new(50.0, 0.0)).unwrap();
        log.clear();
        world.step(1.0 / 60.0, &config, &mut log);
        assert_eq!(log.ended, vec![ordered(a, b)]);
    }

    #[test]
    fn joined_bodies_do_not_collide() {
        let mut world: VerletWorld<f32> = VerletWorld::new();
        let a = world.create_body(BodyDef::new(Vec2::new(0.0, 0.0), physics(2.0))).unwrap();
        let b = world.create_body(BodyDef::new(Vec2::new(1.0, 0.0), physics(2.0))).unwrap();
        world.create_joint(JointDef::new(a, b, 0.0, 0.0)).unwrap();

        let mut log = ContactLog::new();
        world.step(1.0 / 60.0, &SolverConfig::new(), &mut log);
        assert!(log.started.is_empty());
        assert!(world.is_joined(b, a));
    }

    #[test]
    fn bounds_keep_bodies_inside() {
        use crate::config::Bounds;
        let mut world: VerletWorld<f32> = VerletWorld::new();
        let a = world.create_body(BodyDef::new(Vec2::new(5.0, 5.0), physics(1.0))).unwrap();
        world.set_linear_velocity(a, Vec2::new(-600.0, 0.0)).unwrap();
        let config = SolverConfig::new()
            .with_bounds(Bounds::new(Vec2::new(0.0, 0.0), Vec2::new(10.0, 10.0), 0.5));
        for _ in 0..30 {
            world.step(1.0 / 60.0, &config, &mut NoOpStepObserver);
        }
        let p = world.body_position(a).unwrap();
        assert!(p.x >= 1.0 - 1e-4 && p.x <= 9.0 + 1e-4, "x = {}", p.x);
    }
}
