//! Inter-agent bonds and the compound groups they form.
//!
//! Contact events only queue work here. Joints are created or destroyed in
//! [`BondRoster::flush`], after the physics step has returned.

use crate::config::BondingConfig;
use crate::error::PhysicsError;
use crate::float::Float;
use crate::handle::{AgentId, BodyId, JointId};
use crate::joint::JointDef;
use crate::observer::StepObserver;
use crate::vec::Vec2;
use crate::world::PhysicsWorld;
use petgraph::graph::{Graph, NodeIndex};
use petgraph::visit::Dfs;
use petgraph::Undirected;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, trace, warn};

/// An unordered body pair; the smaller key always comes first.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyPair(BodyId, BodyId);

impl BodyPair {
    pub fn new(a: BodyId, b: BodyId) -> Self {
        if a <= b { BodyPair(a, b) } else { BodyPair(b, a) }
    }

    pub fn first(&self) -> BodyId {
        self.0
    }

    pub fn second(&self) -> BodyId {
        self.1
    }

    pub fn contains(&self, body: BodyId) -> bool {
        self.0 == body || self.1 == body
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BondState {
    Unbonded,
    /// A contact start is queued and has not been judged yet.
    ContactPending,
    Bonded,
}

/// A joint between bodies of two different agents. Owned by the roster.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct InterAgentJoint {
    pub joint: JointId,
    pub bodies: BodyPair,
    /// Owners of `bodies.first()` and `bodies.second()`, in that order.
    pub agents: (AgentId, AgentId),
    pub created_tick: u64,
}

impl InterAgentJoint {
    pub fn involves(&self, agent: AgentId) -> bool {
        self.agents.0 == agent || self.agents.1 == agent
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BreakReason {
    /// Contact ended and the bodies drifted past the envelope.
    ContactEnded,
    /// The joint grew past `max_length`.
    Overstretched,
    /// One of the agents was removed.
    AgentRemoved,
    Cleared,
}

/// A remembered break, for sound and visual cues.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BondBreak<F: Float> {
    pub bodies: BodyPair,
    pub agents: (AgentId, AgentId),
    /// Midpoint of the two bodies at the moment of the break.
    pub position: Vec2<F>,
    pub reason: BreakReason,
    pub tick: u64,
}

/// Agents joined directly or transitively by bonds, sorted by key.
pub type CompoundGroup = Vec<AgentId>;

/// What a flush did.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct FlushReport {
    pub created: usize,
    pub broken: usize,
    pub rejected: usize,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum ContactEvent {
    Start(BodyPair),
    End(BodyPair),
}

/// Why a contact did not become a bond. Logged only.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Ineligible {
    Disabled,
    DeadBody,
    Unowned,
    SameAgent,
    DeadAgent,
    BodyFull,
    AgentFull,
    CoolingDown,
}

/// World-level bonding roster.
#[derive(Debug, Clone)]
pub struct BondRoster<F: Float> {
    config: BondingConfig<F>,
    bonds: BTreeMap<BodyPair, InterAgentJoint>,
    pending: Vec<ContactEvent>,
    cooldowns: BTreeMap<BodyId, u32>,
    /// Recent breaks with the ticks they stay remembered.
    breaks: Vec<(BondBreak<F>, u32)>,
    tick: u64,
}

impl<F: Float> BondRoster<F> {
    pub fn new(config: BondingConfig<F>) -> Self {
        BondRoster {
            config,
            bonds: BTreeMap::new(),
            pending: Vec::new(),
            cooldowns: BTreeMap::new(),
            breaks: Vec::new(),
            tick: 0,
        }
    }

    pub fn config(&self) -> &BondingConfig<F> {
        &self.config
    }

    pub fn set_config(&mut self, config: BondingConfig<F>) -> Result<(), PhysicsError> {
        config.validate()?;
        self.config = config;
        Ok(())
    }

    pub fn on_contact_start(&mut self, a: BodyId, b: BodyId) {
        if a != b {
            self.pending.push(ContactEvent::Start(BodyPair::new(a, b)));
        }
    }

    pub fn on_contact_end(&mut self, a: BodyId, b: BodyId) {
        if a != b {
            self.pending.push(ContactEvent::End(BodyPair::new(a, b)));
        }
    }

    pub fn pending_events(&self) -> usize {
        self.pending.len()
    }

    pub fn bond_state(&self, a: BodyId, b: BodyId) -> BondState {
        let pair = BodyPair::new(a, b);
        if self.bonds.contains_key(&pair) {
            BondState::Bonded
        } else if self.pending.contains(&ContactEvent::Start(pair)) {
            BondState::ContactPending
        } else {
            BondState::Unbonded
        }
    }

    /// Apply every queued contact event in arrival order.
    ///
    /// `is_alive` tells whether an agent is still registered. A second start
    /// for an already bonded pair is ignored, and a joint the world refuses
    /// counts as a rejection. Nothing here fails: every queued event is
    /// consumed exactly once.
    pub fn flush<W, A>(&mut self, world: &mut W, is_alive: A) -> FlushReport
    where
        W: PhysicsWorld<F>,
        A: Fn(AgentId) -> bool,
    {
        let mut report = FlushReport::default();
        let events = std::mem::take(&mut self.pending);

        for event in events {
            match event {
                ContactEvent::Start(pair) => {
                    if self.bonds.contains_key(&pair) {
                        trace!(?pair, "duplicate bond ignored");
                        continue;
                    }
                    match self.eligible(world, pair, &is_alive) {
                        Ok(agents) => match self.create_bond(world, pair, agents) {
                            Ok(()) => report.created += 1,
                            Err(err) => {
                                warn!(?pair, %err, "bond joint rejected by the world");
                                report.rejected += 1;
                            }
                        },
                        Err(reason) => {
                            trace!(?pair, ?reason, "contact not bonded");
                            report.rejected += 1;
                        }
                    }
                }
                ContactEvent::End(pair) => {
                    let Some(bond) = self.bonds.get(&pair) else { continue };
                    match world.joint_length(bond.joint) {
                        Some(length) if length <= self.config.contact_envelope => {
                            trace!(?pair, "contact ended inside envelope; bond kept");
                        }
                        _ => match self.break_bond(world, pair, BreakReason::ContactEnded) {
                            Ok(()) => report.broken += 1,
                            Err(err) => warn!(?pair, %err, "bond joint could not be destroyed"),
                        },
                    }
                }
            }
        }
        report
    }

    fn eligible<W, A>(&self, world: &W, pair: BodyPair, is_alive: &A) -> Result<(AgentId, AgentId), Ineligible>
    where
        W: PhysicsWorld<F>,
        A: Fn(AgentId) -> bool,
    {
        if !self.config.enabled {
            return Err(Ineligible::Disabled);
        }
        let (a, b) = (pair.first(), pair.second());
        if world.body_position(a).is_none() || world.body_position(b).is_none() {
            return Err(Ineligible::DeadBody);
        }
        let (owner_a, owner_b) = match (world.body_owner(a), world.body_owner(b)) {
            (Some(oa), Some(ob)) => (oa, ob),
            _ => return Err(Ineligible::Unowned),
        };
        if owner_a == owner_b {
            return Err(Ineligible::SameAgent);
        }
        if !is_alive(owner_a) || !is_alive(owner_b) {
            return Err(Ineligible::DeadAgent);
        }
        if self.bond_count_for_body(a) >= self.config.max_bonds_per_body
            || self.bond_count_for_body(b) >= self.config.max_bonds_per_body
        {
            return Err(Ineligible::BodyFull);
        }
        if self.bond_count_for(owner_a) >= self.config.max_bonds_per_agent
            || self.bond_count_for(owner_b) >= self.config.max_bonds_per_agent
        {
            return Err(Ineligible::AgentFull);
        }
        if self.is_cooling_down(a) || self.is_cooling_down(b) {
            return Err(Ineligible::CoolingDown);
        }
        Ok((owner_a, owner_b))
    }

    fn create_bond<W: PhysicsWorld<F>>(
        &mut self,
        world: &mut W,
        pair: BodyPair,
        agents: (AgentId, AgentId),
    ) -> Result<(), PhysicsError> {
        let (a, b) = (pair.first(), pair.second());
        let pa = world.body_position(a).ok_or(PhysicsError::UnknownBody(a))?;
        let pb = world.body_position(b).ok_or(PhysicsError::UnknownBody(b))?;
        let length = pa.distance(pb).clamp(self.config.min_length, self.config.max_length);

        let def = JointDef::new(a, b, self.config.frequency, self.config.damping_ratio).with_length(length);
        let joint = world.create_joint(def)?;
        self.bonds.insert(pair, InterAgentJoint { joint, bodies: pair, agents, created_tick: self.tick });
        debug!(?pair, first = ?agents.0, second = ?agents.1, rest_length = %length, "bond created");
        Ok(())
    }

    fn break_bond<W: PhysicsWorld<F>>(
        &mut self,
        world: &mut W,
        pair: BodyPair,
        reason: BreakReason,
    ) -> Result<(), PhysicsError> {
        let Some(&bond) = self.bonds.get(&pair) else { return Ok(()) };
        let position = match (world.body_position(pair.first()), world.body_position(pair.second())) {
            (Some(pa), Some(pb)) => pa.lerp(pb, F::half()),
            (Some(p), None) | (None, Some(p)) => p,
            (None, None) => Vec2::zero(),
        };
        // The record goes only once the joint is gone, so a failure keeps it.
        match world.destroy_joint(bond.joint) {
            Ok(()) => {}
            Err(PhysicsError::UnknownJoint(joint)) => warn!(?joint, "bond joint already gone"),
            Err(err) => return Err(err),
        }
        self.bonds.remove(&pair);

        for body in [pair.first(), pair.second()] {
            if self.config.cooldown_ticks > 0 {
                self.cooldowns.insert(body, self.config.cooldown_ticks);
            }
        }
        if self.config.memory_ticks > 0 {
            let record = BondBreak { bodies: pair, agents: bond.agents, position, reason, tick: self.tick };
            self.breaks.push((record, self.config.memory_ticks));
        }
        debug!(?pair, ?reason, "bond broken");
        Ok(())
    }

    /// Break every bond stretched past `max_length`. Returns how many broke.
    pub fn enforce_overstretch<W: PhysicsWorld<F>>(&mut self, world: &mut W) -> Result<usize, PhysicsError> {
        let limit = self.config.max_length;
        let stretched: Vec<BodyPair> = self
            .bonds
            .values()
            .filter(|bond| match world.joint_length(bond.joint) {
                Some(length) => length > limit,
                None => true,
            })
            .map(|bond| bond.bodies)
            .collect();
        for &pair in &stretched {
            self.break_bond(world, pair, BreakReason::Overstretched)?;
        }
        Ok(stretched.len())
    }

    /// Break every bond touching `agent` and forget the cooldowns of `bodies`.
    pub fn break_agent<W: PhysicsWorld<F>>(
        &mut self,
        world: &mut W,
        agent: AgentId,
        bodies: &[BodyId],
    ) -> Result<usize, PhysicsError> {
        let touching: Vec<BodyPair> =
            self.bonds.values().filter(|bond| bond.involves(agent)).map(|bond| bond.bodies).collect();
        for &pair in &touching {
            self.break_bond(world, pair, BreakReason::AgentRemoved)?;
        }
        for body in bodies {
            self.cooldowns.remove(body);
        }
        self.pending.retain(|event| {
            let (ContactEvent::Start(pair) | ContactEvent::End(pair)) = event;
            !bodies.iter().any(|&body| pair.contains(body))
        });
        Ok(touching.len())
    }

    /// Break every bond.
    pub fn clear<W: PhysicsWorld<F>>(&mut self, world: &mut W) -> Result<usize, PhysicsError> {
        let all: Vec<BodyPair> = self.bonds.keys().copied().collect();
        for &pair in &all {
            self.break_bond(world, pair, BreakReason::Cleared)?;
        }
        Ok(all.len())
    }

    /// Advance cooldowns and break memory by one tick.
    pub fn tick_timers(&mut self) {
        self.tick += 1;
        self.cooldowns.retain(|_, left| {
            *left -= 1;
            *left > 0
        });
        self.breaks.retain_mut(|(_, left)| {
            *left -= 1;
            *left > 0
        });
    }

    /// Connected components of the agent graph with at least two agents.
    ///
    /// Recomputed from the live bonds on every call.
    pub fn compound_groups(&self) -> Vec<CompoundGroup> {
        let mut graph: Graph<AgentId, JointId, Undirected> = Graph::new_undirected();
        let mut nodes: BTreeMap<AgentId, NodeIndex> = BTreeMap::new();
        for bond in self.bonds.values() {
            let a = *nodes.entry(bond.agents.0).or_insert_with(|| graph.add_node(bond.agents.0));
            let b = *nodes.entry(bond.agents.1).or_insert_with(|| graph.add_node(bond.agents.1));
            graph.add_edge(a, b, bond.joint);
        }

        let mut seen = BTreeSet::new();
        let mut groups = Vec::new();
        for (&agent, &start) in &nodes {
            if seen.contains(&agent) {
                continue;
            }
            let mut group = Vec::new();
            let mut dfs = Dfs::new(&graph, start);
            while let Some(node) = dfs.next(&graph) {
                let member = graph[node];
                seen.insert(member);
                group.push(member);
            }
            if group.len() >= 2 {
                group.sort();
                groups.push(group);
            }
        }
        groups
    }

    pub fn group_of(&self, agent: AgentId) -> Option<CompoundGroup> {
        self.compound_groups().into_iter().find(|group| group.contains(&agent))
    }

    pub fn bonds(&self) -> impl Iterator<Item = &InterAgentJoint> {
        self.bonds.values()
    }

    pub fn bond(&self, a: BodyId, b: BodyId) -> Option<&InterAgentJoint> {
        self.bonds.get(&BodyPair::new(a, b))
    }

    pub fn bond_count(&self) -> usize {
        self.bonds.len()
    }

    pub fn bond_count_for(&self, agent: AgentId) -> usize {
        self.bonds.values().filter(|bond| bond.involves(agent)).count()
    }

    pub fn bond_count_for_body(&self, body: BodyId) -> usize {
        self.bonds.keys().filter(|pair| pair.contains(body)).count()
    }

    pub fn is_cooling_down(&self, body: BodyId) -> bool {
        self.cooldowns.contains_key(&body)
    }

    /// Breaks still remembered, oldest first.
    pub fn recent_breaks(&self) -> impl Iterator<Item = &BondBreak<F>> {
        self.breaks.iter().map(|(record, _)| record)
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }
}

impl<F: Float> StepObserver for BondRoster<F> {
    fn on_contact_start(&mut self, a: BodyId, b: BodyId) {
        BondRoster::on_contact_start(self, a, b);
    }

    fn on_contact_end(&mut self, a: BodyId, b: BodyId) {
        BondRoster::on_contact_end(self, a, b);
    }
}
