//! Agents: a render mesh driven by a soft body living in the physics world.

use crate::behavior::{Drive, Target};
use crate::error::{AgentError, PhysicsError, TopologyFault};
use crate::float::Float;
use crate::handle::{AgentId, BodyId};
use crate::mesh::MeshTopology;
use crate::properties::{AgentProperties, ShapeProperties, Weights};
use crate::softbody::PhysicsGraph;
use crate::vec::Vec2;
use crate::world::PhysicsWorld;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Installation palette; every agent wears one of these.
pub const PALETTE: [u32; 18] = [
    0xB141DA, 0x45E645, 0xFDE9AC, 0x3BCEAC, 0xFF8080, 0x934879, 0xE8F03A, 0xFE200A, 0x042B9D,
    0xA5B3E2, 0x00C4FF, 0x6DF927, 0xF7B635, 0xFF61D0, 0x588E8B, 0x90ECE7, 0xFCB475, 0xD375A8,
];

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AgentKind {
    /// Grid mesh.
    Mesh,
    /// Centre vertex plus rim.
    Disc,
}

impl AgentKind {
    pub fn of<F: Float>(shape: &ShapeProperties<F>) -> Self {
        match shape {
            ShapeProperties::Grid(_) => AgentKind::Mesh,
            ShapeProperties::Disc(_) => AgentKind::Disc,
        }
    }

    pub fn other(self) -> Self {
        match self {
            AgentKind::Mesh => AgentKind::Disc,
            AgentKind::Disc => AgentKind::Mesh,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn from_hex(hex: u32) -> Self {
        Color { r: (hex >> 16) as u8, g: (hex >> 8) as u8, b: hex as u8 }
    }

    pub const fn to_hex(self) -> u32 {
        ((self.r as u32) << 16) | ((self.g as u32) << 8) | self.b as u32
    }
}

/// One creature: mesh, physics graph, weights and current targets.
///
/// The mesh only ever follows the physics bodies. Behavior acts through
/// impulses and velocity caps handed to the world.
#[derive(Debug)]
pub struct Agent<F: Float> {
    id: AgentId,
    kind: AgentKind,
    mesh: MeshTopology<F>,
    graph: PhysicsGraph,
    /// Mesh vertices eligible for stretching.
    boundary: Vec<usize>,
    color: Color,
    visibility_radius: F,
    weights: Weights<F>,
    targets: Vec<Target<F>>,
    rng: SmallRng,
}

impl<F: Float> Agent<F> {
    /// Build the mesh, then the physics graph over it, with every body owned by `id`.
    pub fn construct<W: PhysicsWorld<F>>(
        world: &mut W,
        id: AgentId,
        props: &AgentProperties<F>,
    ) -> Result<Self, AgentError> {
        let kind = AgentKind::of(&props.shape);
        let mesh = Self::build_topology(props)?;
        mesh.validate()?;

        let mut graph = PhysicsGraph::new();
        match &props.shape {
            ShapeProperties::Grid(grid) => {
                graph.build_grid(world, &mesh, grid, &props.vertex, Some(id))?
            }
            ShapeProperties::Disc(disc) => {
                graph.build_disc(world, &mesh, disc, &props.vertex, Some(id))?
            }
        }
        if let Err(err) = graph.check_invariants(&mesh) {
            graph.release(world)?;
            return Err(err);
        }

        let mut rng = SmallRng::seed_from_u64(props.seed);
        let color = Color::from_hex(PALETTE[rng.gen_range(0..PALETTE.len())]);

        debug!(
            agent = ?id,
            ?kind,
            vertices = mesh.vertex_count(),
            joints = graph.joint_count(),
            "agent constructed"
        );

        Ok(Agent {
            id,
            kind,
            boundary: Self::boundary_of(&props.shape),
            mesh,
            graph,
            color,
            visibility_radius: props.visibility_radius(),
            weights: props.weights,
            targets: Vec::new(),
            rng,
        })
    }

    fn build_topology(props: &AgentProperties<F>) -> Result<MeshTopology<F>, TopologyFault> {
        match &props.shape {
            ShapeProperties::Grid(grid) => MeshTopology::grid(grid, props.texture_size),
            ShapeProperties::Disc(disc) => {
                MeshTopology::disc(disc.center, disc.radius, disc.segments, props.texture_size)
            }
        }
    }

    fn boundary_of(shape: &ShapeProperties<F>) -> Vec<usize> {
        match shape {
            ShapeProperties::Grid(grid) => {
                let (rows, cols) = (grid.rows, grid.cols);
                (0..rows * cols)
                    .filter(|i| {
                        let (y, x) = (i / cols, i % cols);
                        y == 0 || y + 1 == rows || x == 0 || x + 1 == cols
                    })
                    .collect()
            }
            ShapeProperties::Disc(disc) => (1..=disc.segments).collect(),
        }
    }

    /// Per-tick update: re-tune from `own`, follow the bodies, then push them.
    ///
    /// `other` carries the properties of the other agent kind, used when a
    /// target is an agent of that kind.
    pub fn update<W: PhysicsWorld<F>>(
        &mut self,
        world: &mut W,
        own: &AgentProperties<F>,
        other: &AgentProperties<F>,
    ) -> Result<(), AgentError> {
        self.visibility_radius = own.visibility_radius();
        self.weights = own.weights;
        self.sync(world);
        self.apply_behavior(world, &other.weights)
    }

    /// Copy body positions into the mesh.
    pub fn sync<W: PhysicsWorld<F>>(&mut self, world: &W) {
        self.graph.sync(world, &mut self.mesh);
    }

    fn apply_behavior<W: PhysicsWorld<F>>(
        &mut self,
        world: &mut W,
        other: &Weights<F>,
    ) -> Result<(), AgentError> {
        if !self.targets.is_empty() {
            let drive = Drive {
                kind: self.kind,
                visibility_radius: self.visibility_radius,
                own: &self.weights,
                other,
            };
            let plan = drive.plan(&self.mesh, &self.boundary, &self.targets, &mut self.rng);
            for (&body, impulse) in self.graph.bodies().iter().zip(plan) {
                if impulse != Vec2::zero() {
                    world.apply_impulse(body, impulse)?;
                }
            }
        }

        let cap = self.weights.max_velocity.max(F::zero());
        for &body in self.graph.bodies() {
            let velocity = world.linear_velocity(body).ok_or(PhysicsError::UnknownBody(body))?;
            if velocity.length_sq() > cap * cap {
                world.set_linear_velocity(body, velocity.clamp_length(cap))?;
            }
        }
        Ok(())
    }

    /// Release every structural joint, then every body.
    ///
    /// Joints to other agents must already be gone; the world refuses to
    /// destroy a body that is still joined. On error the agent keeps the
    /// handles it could not release and the call can be retried.
    pub fn destroy<W: PhysicsWorld<F>>(&mut self, world: &mut W) -> Result<(), PhysicsError> {
        self.graph.release(world)?;
        debug!(agent = ?self.id, "agent destroyed");
        Ok(())
    }

    pub fn set_targets(&mut self, targets: Vec<Target<F>>) {
        self.targets = targets;
    }

    pub fn clear_targets(&mut self) {
        self.targets.clear();
    }

    pub fn targets(&self) -> &[Target<F>] {
        &self.targets
    }

    pub fn centroid(&self) -> Vec2<F> {
        self.mesh.centroid()
    }

    pub fn id(&self) -> AgentId {
        self.id
    }

    pub fn kind(&self) -> AgentKind {
        self.kind
    }

    pub fn mesh(&self) -> &MeshTopology<F> {
        &self.mesh
    }

    pub fn graph(&self) -> &PhysicsGraph {
        &self.graph
    }

    pub fn owns(&self, body: BodyId) -> bool {
        self.graph.contains(body)
    }

    pub fn boundary(&self) -> &[usize] {
        &self.boundary
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn visibility_radius(&self) -> F {
        self.visibility_radius
    }

    pub fn weights(&self) -> &Weights<F> {
        &self.weights
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behavior::Stimulus;
    use crate::world::VerletWorld;
    use slotmap::SlotMap;

    fn agent_id() -> AgentId {
        let mut ids: SlotMap<AgentId, ()> = SlotMap::with_key();
        ids.insert(())
    }

    #[test]
    fn color_hex_round_trip() {
        let c = Color::from_hex(0xB141DA);
        assert_eq!((c.r, c.g, c.b), (0xB1, 0x41, 0xDA));
        assert_eq!(c.to_hex(), 0xB141DA);
    }

    #[test]
    fn grid_boundary_is_perimeter() {
        let props: AgentProperties<f32> = AgentProperties::grid(Vec2::zero()).with_grid_dims(3, 3);
        assert_eq!(Agent::<f32>::boundary_of(&props.shape), vec![0, 1, 2, 3, 5, 6, 7, 8]);
    }

    #[test]
    fn construct_owns_every_body() {
        let mut world: VerletWorld<f32> = VerletWorld::new();
        let id = agent_id();
        let agent = Agent::construct(&mut world, id, &AgentProperties::disc(Vec2::zero())).unwrap();
        assert_eq!(agent.kind(), AgentKind::Disc);
        assert_eq!(world.bodies_owned_by(id), 13);
        assert!(PALETTE.contains(&agent.color().to_hex()));
    }

    #[test]
    fn degenerate_grid_fails_without_leaking() {
        let mut world: VerletWorld<f32> = VerletWorld::new();
        let props = AgentProperties::grid(Vec2::zero()).with_grid_dims(1, 4);
        let err = Agent::construct(&mut world, agent_id(), &props).unwrap_err();
        assert_eq!(err, AgentError::InvalidTopology(TopologyFault::GridTooSmall { rows: 1, cols: 4 }));
        assert_eq!(world.body_count(), 0);
    }

    #[test]
    fn velocity_is_capped() {
        let mut world: VerletWorld<f32> = VerletWorld::new();
        let mut props = AgentProperties::grid(Vec2::zero());
        props.weights.max_velocity = 10.0;
        let mut agent = Agent::construct(&mut world, agent_id(), &props).unwrap();
        let body = agent.graph().bodies()[0];
        world.set_linear_velocity(body, Vec2::new(500.0, 0.0)).unwrap();

        agent.set_targets(vec![Target::person(Vec2::new(60.0, 50.0), Stimulus::Attract)]);
        agent.update(&mut world, &props, &props).unwrap();
        for &b in agent.graph().bodies() {
            assert!(world.linear_velocity(b).unwrap().length() <= 10.0 + 1e-3);
        }
    }
}
