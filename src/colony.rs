//! The colony: every agent, the physics world they live in, and their bonds.
//!
//! One thread owns a colony and drives it one tick at a time. A tick runs:
//!
//! 1. the world step, with contact callbacks buffered in the bond roster;
//! 2. the bond flush, where joints are actually created or destroyed;
//! 3. the overstretch guard;
//! 4. every agent's update (mesh sync, then behavior impulses);
//! 5. timers and removals whose countdown ran out.

use crate::agent::{Agent, AgentKind};
use crate::behavior::Target;
use crate::bond::{BondRoster, CompoundGroup, FlushReport};
use crate::config::{BondingConfig, SolverConfig};
use crate::error::{AgentError, PhysicsError};
use crate::float::Float;
use crate::handle::{AgentId, BodyId};
use crate::mesh::MeshTopology;
use crate::properties::AgentProperties;
use crate::world::{PhysicsWorld, VerletWorld};
use slotmap::SlotMap;
use tracing::{debug, warn};

/// An agent waiting to be removed.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PendingRemoval {
    pub agent: AgentId,
    pub ticks_left: u32,
}

/// What happened during one [`Colony::tick`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    pub bonds: FlushReport,
    pub overstretched: usize,
    /// Agents removed because their countdown ran out.
    pub removed: Vec<AgentId>,
}

pub struct Colony<F: Float> {
    world: VerletWorld<F>,
    solver: SolverConfig<F>,
    agents: SlotMap<AgentId, Agent<F>>,
    roster: BondRoster<F>,
    removals: Vec<PendingRemoval>,
}

impl<F: Float> Colony<F> {
    /// Fails when `bonding` could never produce a valid bond joint.
    pub fn new(solver: SolverConfig<F>, bonding: BondingConfig<F>) -> Result<Self, PhysicsError> {
        bonding.validate()?;
        Ok(Colony {
            world: VerletWorld::new(),
            solver,
            agents: SlotMap::with_key(),
            roster: BondRoster::new(bonding),
            removals: Vec::new(),
        })
    }

    /// Build a new agent from `props`. On error nothing is left in the world.
    pub fn construct(&mut self, props: &AgentProperties<F>) -> Result<AgentId, AgentError> {
        let world = &mut self.world;
        self.agents.try_insert_with_key(|id| Agent::construct(world, id, props))
    }

    /// Remove an agent: its bonds first, then its structural joints, then its bodies.
    ///
    /// The agent stays registered until all of its bodies are gone, so a
    /// failed call leaves nothing unreachable in the world.
    pub fn destroy(&mut self, id: AgentId) -> Result<(), AgentError> {
        let agent = self.agents.get_mut(id).ok_or(AgentError::UnknownAgent(id))?;
        let broken = self.roster.break_agent(&mut self.world, id, agent.graph().bodies())?;
        agent.destroy(&mut self.world)?;
        self.agents.remove(id);
        self.removals.retain(|r| r.agent != id);
        debug!(agent = ?id, bonds_broken = broken, "agent removed");
        Ok(())
    }

    /// Remove `id` once `ttl_ticks` more ticks have run. Rescheduling replaces
    /// the previous countdown.
    pub fn schedule_removal(&mut self, id: AgentId, ttl_ticks: u32) -> Result<(), AgentError> {
        if !self.agents.contains_key(id) {
            return Err(AgentError::UnknownAgent(id));
        }
        self.removals.retain(|r| r.agent != id);
        self.removals.push(PendingRemoval { agent: id, ticks_left: ttl_ticks });
        debug!(agent = ?id, ttl_ticks, "removal scheduled");
        Ok(())
    }

    pub fn cancel_removal(&mut self, id: AgentId) -> bool {
        let before = self.removals.len();
        self.removals.retain(|r| r.agent != id);
        before != self.removals.len()
    }

    /// Queue a contact start reported from outside the world step.
    pub fn on_contact_start(&mut self, a: BodyId, b: BodyId) {
        self.roster.on_contact_start(a, b);
    }

    pub fn on_contact_end(&mut self, a: BodyId, b: BodyId) {
        self.roster.on_contact_end(a, b);
    }

    /// Apply queued contact events now instead of waiting for the next tick.
    pub fn flush_bonds(&mut self) -> FlushReport {
        let agents = &self.agents;
        self.roster.flush(&mut self.world, |id| agents.contains_key(id))
    }

    /// Break every bond in the colony.
    pub fn clear_bonds(&mut self) -> Result<usize, PhysicsError> {
        self.roster.clear(&mut self.world)
    }

    /// Advance the colony by `dt`.
    ///
    /// `mesh_props` tunes grid agents and `disc_props` tunes disc agents; each
    /// kind also sees the other's properties.
    pub fn tick(
        &mut self,
        dt: F,
        mesh_props: &AgentProperties<F>,
        disc_props: &AgentProperties<F>,
    ) -> Result<TickReport, AgentError> {
        self.world.step(dt, &self.solver, &mut self.roster);

        let bonds = self.flush_bonds();
        let overstretched = self.roster.enforce_overstretch(&mut self.world)?;
        self.update(mesh_props, disc_props)?;

        self.roster.tick_timers();
        let removed = self.run_removals();

        Ok(TickReport { bonds, overstretched, removed })
    }

    /// Sync and drive every agent without stepping the world.
    pub fn update(
        &mut self,
        mesh_props: &AgentProperties<F>,
        disc_props: &AgentProperties<F>,
    ) -> Result<(), AgentError> {
        for agent in self.agents.values_mut() {
            let (own, other) = match agent.kind() {
                AgentKind::Mesh => (mesh_props, disc_props),
                AgentKind::Disc => (disc_props, mesh_props),
            };
            agent.update(&mut self.world, own, other)?;
        }
        Ok(())
    }

    fn run_removals(&mut self) -> Vec<AgentId> {
        let mut due = Vec::new();
        self.removals.retain_mut(|r| {
            r.ticks_left = r.ticks_left.saturating_sub(1);
            if r.ticks_left == 0 {
                due.push(r.agent);
                false
            } else {
                true
            }
        });

        let mut removed = Vec::with_capacity(due.len());
        for id in due {
            // Destroyed directly in the meantime.
            if !self.agents.contains_key(id) {
                continue;
            }
            match self.destroy(id) {
                Ok(()) => removed.push(id),
                Err(err) => {
                    warn!(agent = ?id, %err, "removal failed; retrying next tick");
                    self.removals.push(PendingRemoval { agent: id, ticks_left: 1 });
                }
            }
        }
        removed
    }

    pub fn set_targets(&mut self, id: AgentId, targets: Vec<Target<F>>) -> Result<(), AgentError> {
        let agent = self.agents.get_mut(id).ok_or(AgentError::UnknownAgent(id))?;
        agent.set_targets(targets);
        Ok(())
    }

    /// Give every agent the same targets.
    pub fn set_targets_all(&mut self, targets: &[Target<F>]) {
        for agent in self.agents.values_mut() {
            agent.set_targets(targets.to_vec());
        }
    }

    pub fn agent(&self, id: AgentId) -> Option<&Agent<F>> {
        self.agents.get(id)
    }

    pub fn agents(&self) -> impl Iterator<Item = (AgentId, &Agent<F>)> {
        self.agents.iter()
    }

    pub fn agent_count(&self) -> usize {
        self.agents.len()
    }

    /// Render mesh of an agent.
    pub fn mesh(&self, id: AgentId) -> Option<&MeshTopology<F>> {
        self.agents.get(id).map(Agent::mesh)
    }

    /// Agent owning `body`, if both still exist.
    pub fn owner_of(&self, body: BodyId) -> Option<AgentId> {
        self.world.body_owner(body).filter(|id| self.agents.contains_key(*id))
    }

    pub fn roster(&self) -> &BondRoster<F> {
        &self.roster
    }

    pub fn compound_groups(&self) -> Vec<CompoundGroup> {
        self.roster.compound_groups()
    }

    pub fn pending_removals(&self) -> &[PendingRemoval] {
        &self.removals
    }

    pub fn world(&self) -> &VerletWorld<F> {
        &self.world
    }

    /// Direct world access for setup, such as placing bodies. Bodies and
    /// joints owned by agents must not be destroyed through it.
    pub fn world_mut(&mut self) -> &mut VerletWorld<F> {
        &mut self.world
    }

    pub fn solver(&self) -> &SolverConfig<F> {
        &self.solver
    }

    pub fn set_solver(&mut self, solver: SolverConfig<F>) {
        self.solver = solver;
    }

    /// Replace the bonding thresholds. An invalid config is rejected and the
    /// current one kept.
    pub fn set_bonding(&mut self, bonding: BondingConfig<F>) -> Result<(), PhysicsError> {
        self.roster.set_config(bonding)
    }
}

impl<F: Float> Default for Colony<F> {
    fn default() -> Self {
        Colony {
            world: VerletWorld::new(),
            solver: SolverConfig::default(),
            agents: SlotMap::with_key(),
            roster: BondRoster::new(BondingConfig::default()),
            removals: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vec::Vec2;

    #[test]
    fn construct_and_destroy_leave_world_empty() {
        let mut colony: Colony<f32> = Colony::default();
        let a = colony.construct(&AgentProperties::grid(Vec2::zero())).unwrap();
        let b = colony.construct(&AgentProperties::disc(Vec2::new(300.0, 0.0))).unwrap();
        assert_eq!(colony.world().body_count(), 16 + 13);

        colony.destroy(a).unwrap();
        colony.destroy(b).unwrap();
        assert_eq!(colony.world().body_count(), 0);
        assert_eq!(colony.world().joint_count(), 0);
        assert_eq!(colony.destroy(a), Err(AgentError::UnknownAgent(a)));
    }

    #[test]
    fn removal_waits_for_ttl() {
        let mut colony: Colony<f32> = Colony::default();
        let props = AgentProperties::grid(Vec2::zero());
        let disc = AgentProperties::disc(Vec2::zero());
        let a = colony.construct(&props).unwrap();
        colony.schedule_removal(a, 2).unwrap();

        let report = colony.tick(1.0 / 60.0, &props, &disc).unwrap();
        assert!(report.removed.is_empty());
        assert_eq!(colony.pending_removals()[0].ticks_left, 1);

        let report = colony.tick(1.0 / 60.0, &props, &disc).unwrap();
        assert_eq!(report.removed, vec![a]);
        assert!(colony.agent(a).is_none());
    }

    #[test]
    fn failed_construct_registers_nothing() {
        let mut colony: Colony<f32> = Colony::default();
        let props = AgentProperties::grid(Vec2::zero()).with_grid_dims(4, 1);
        assert!(colony.construct(&props).is_err());
        assert_eq!(colony.agent_count(), 0);
        assert_eq!(colony.world().body_count(), 0);
    }
}
