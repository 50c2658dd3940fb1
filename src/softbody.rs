//! Soft bodies: one physics body per mesh vertex, springs along mesh edges.

use crate::body::BodyDef;
use crate::error::{AgentError, PhysicsError};
use crate::float::Float;
use crate::handle::{AgentId, BodyId, JointId};
use crate::joint::JointDef;
use crate::mesh::MeshTopology;
use crate::properties::{DiscShape, GridShape, JointPhysics, VertexPhysics};
use crate::world::PhysicsWorld;

/// Bodies and structural joints backing one mesh.
///
/// `bodies[i]` drives mesh vertex `i` for the lifetime of the graph.
#[derive(Debug, Default, Clone)]
pub struct PhysicsGraph {
    bodies: Vec<BodyId>,
    joints: Vec<JointId>,
}

impl PhysicsGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Structural joint count of a `rows` x `cols` grid.
    pub fn grid_joint_count(rows: usize, cols: usize) -> usize {
        rows.saturating_sub(1) * cols + rows * cols.saturating_sub(1)
    }

    /// Body pairs joined along the rim of a disc: rim `i` to rim `i + offset`.
    /// Unordered duplicates are dropped; returns rim indices (0-based).
    pub fn disc_side_pairs(segments: usize, offset: usize) -> Vec<(usize, usize)> {
        let offset = offset.max(1) % segments.max(1);
        if offset == 0 {
            return Vec::new();
        }
        let mut pairs: Vec<(usize, usize)> = Vec::with_capacity(segments);
        for i in 0..segments {
            let j = (i + offset) % segments;
            let pair = if i < j { (i, j) } else { (j, i) };
            if !pairs.contains(&pair) {
                pairs.push(pair);
            }
        }
        pairs
    }

    /// One body per mesh vertex, then right- and down-neighbour joints.
    ///
    /// Any bodies this graph already owns are released first. On failure the
    /// partially built graph is released too.
    pub fn build_grid<F: Float, W: PhysicsWorld<F>>(
        &mut self,
        world: &mut W,
        mesh: &MeshTopology<F>,
        shape: &GridShape<F>,
        vertex: &VertexPhysics<F>,
        owner: Option<AgentId>,
    ) -> Result<(), AgentError> {
        self.release(world)?;
        let result = self.try_build_grid(world, mesh, shape, vertex, owner);
        if result.is_err() {
            self.release(world)?;
        }
        result
    }

    fn try_build_grid<F: Float, W: PhysicsWorld<F>>(
        &mut self,
        world: &mut W,
        mesh: &MeshTopology<F>,
        shape: &GridShape<F>,
        vertex: &VertexPhysics<F>,
        owner: Option<AgentId>,
    ) -> Result<(), AgentError> {
        let (rows, cols) = (shape.rows, shape.cols);
        if mesh.vertex_count() != rows * cols {
            return Err(AgentError::PhysicsGraphMismatch {
                vertices: mesh.vertex_count(),
                bodies: rows * cols,
            });
        }
        self.create_bodies(world, mesh, vertex, owner)?;
        self.joints.reserve(Self::grid_joint_count(rows, cols));

        for y in 0..rows {
            for x in 0..cols {
                let idx = y * cols + x;
                // Right neighbour, except in the last column.
                if x != cols - 1 {
                    self.join(world, idx, idx + 1, &shape.joint)?;
                }
                // Down neighbour, except in the last row.
                if y != rows - 1 {
                    self.join(world, idx, idx + cols, &shape.joint)?;
                }
            }
        }
        Ok(())
    }

    /// One body per mesh vertex; the centre joined to every rim vertex, and
    /// rim vertices joined to each other at `side_joint_offset`.
    pub fn build_disc<F: Float, W: PhysicsWorld<F>>(
        &mut self,
        world: &mut W,
        mesh: &MeshTopology<F>,
        shape: &DiscShape<F>,
        vertex: &VertexPhysics<F>,
        owner: Option<AgentId>,
    ) -> Result<(), AgentError> {
        self.release(world)?;
        let result = self.try_build_disc(world, mesh, shape, vertex, owner);
        if result.is_err() {
            self.release(world)?;
        }
        result
    }

    fn try_build_disc<F: Float, W: PhysicsWorld<F>>(
        &mut self,
        world: &mut W,
        mesh: &MeshTopology<F>,
        shape: &DiscShape<F>,
        vertex: &VertexPhysics<F>,
        owner: Option<AgentId>,
    ) -> Result<(), AgentError> {
        if mesh.vertex_count() != shape.segments + 1 {
            return Err(AgentError::PhysicsGraphMismatch {
                vertices: mesh.vertex_count(),
                bodies: shape.segments + 1,
            });
        }
        self.create_bodies(world, mesh, vertex, owner)?;
        for rim in 1..=shape.segments {
            self.join(world, 0, rim, &shape.center_joint)?;
        }
        for (i, j) in Self::disc_side_pairs(shape.segments, shape.side_joint_offset) {
            self.join(world, 1 + i, 1 + j, &shape.side_joint)?;
        }
        Ok(())
    }

    fn create_bodies<F: Float, W: PhysicsWorld<F>>(
        &mut self,
        world: &mut W,
        mesh: &MeshTopology<F>,
        vertex: &VertexPhysics<F>,
        owner: Option<AgentId>,
    ) -> Result<(), PhysicsError> {
        self.bodies.reserve(mesh.vertex_count());
        for v in mesh.vertices() {
            let mut def = BodyDef::new(v.xy(), *vertex);
            def.owner = owner;
            let id = world.create_body(def)?;
            self.bodies.push(id);
        }
        Ok(())
    }

    fn join<F: Float, W: PhysicsWorld<F>>(
        &mut self,
        world: &mut W,
        a: usize,
        b: usize,
        joint: &JointPhysics<F>,
    ) -> Result<(), PhysicsError> {
        let def = JointDef::new(self.bodies[a], self.bodies[b], joint.frequency, joint.damping_ratio);
        let id = world.create_joint(def)?;
        self.joints.push(id);
        Ok(())
    }

    /// Destroy every joint, then every body. Safe to call on an empty graph.
    ///
    /// Handles the world no longer knows are dropped. On any other error the
    /// handles not yet destroyed stay in the graph, so a later call can finish.
    pub fn release<F: Float, W: PhysicsWorld<F>>(&mut self, world: &mut W) -> Result<(), PhysicsError> {
        while let Some(joint) = self.joints.pop() {
            match world.destroy_joint(joint) {
                Ok(()) | Err(PhysicsError::UnknownJoint(_)) => {}
                Err(err) => {
                    self.joints.push(joint);
                    return Err(err);
                }
            }
        }
        while let Some(body) = self.bodies.pop() {
            match world.destroy_body(body) {
                Ok(()) | Err(PhysicsError::UnknownBody(_)) => {}
                Err(err) => {
                    self.bodies.push(body);
                    return Err(err);
                }
            }
        }
        Ok(())
    }

    /// Copy body positions into mesh vertices (x and y only).
    ///
    /// Physics is the source of truth; nothing flows back the other way. A
    /// partly released graph still drives the leading vertices it holds.
    pub fn sync<F: Float, W: PhysicsWorld<F>>(&self, world: &W, mesh: &mut MeshTopology<F>) {
        for (i, &body) in self.bodies.iter().enumerate() {
            if let Some(pos) = world.body_position(body) {
                mesh.set_vertex_xy(i, pos);
            }
        }
    }

    pub fn check_invariants<F: Float>(&self, mesh: &MeshTopology<F>) -> Result<(), AgentError> {
        if self.bodies.len() != mesh.vertex_count() {
            return Err(AgentError::PhysicsGraphMismatch {
                vertices: mesh.vertex_count(),
                bodies: self.bodies.len(),
            });
        }
        Ok(())
    }

    pub fn bodies(&self) -> &[BodyId] {
        &self.bodies
    }

    pub fn joints(&self) -> &[JointId] {
        &self.joints
    }

    pub fn body(&self, vertex: usize) -> Option<BodyId> {
        self.bodies.get(vertex).copied()
    }

    /// Mesh vertex index driven by `body`.
    pub fn vertex_of(&self, body: BodyId) -> Option<usize> {
        self.bodies.iter().position(|&b| b == body)
    }

    pub fn contains(&self, body: BodyId) -> bool {
        self.bodies.contains(&body)
    }

    pub fn vertex_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn joint_count(&self) -> usize {
        self.joints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty() && self.joints.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vec::Vec2;
    use crate::world::VerletWorld;

    #[test]
    fn release_keeps_handles_it_could_not_destroy() {
        let shape = GridShape {
            rows: 2,
            cols: 2,
            size: Vec2::new(10.0, 10.0),
            origin: Vec2::zero(),
            joint: JointPhysics::default(),
        };
        let mesh = MeshTopology::grid(&shape, Vec2::new(1.0, 1.0)).unwrap();
        let mut world: VerletWorld<f32> = VerletWorld::new();
        let mut graph = PhysicsGraph::new();
        graph.build_grid(&mut world, &mesh, &shape, &VertexPhysics::default(), None).unwrap();

        // A joint the graph does not know about pins the last body.
        let stray = world.create_joint(JointDef::new(graph.bodies()[0], graph.bodies()[3], 0.0, 0.0)).unwrap();
        assert!(matches!(graph.release(&mut world), Err(PhysicsError::BodyHasJoints { .. })));
        assert_eq!(graph.vertex_count(), 4);
        assert_eq!(graph.joint_count(), 0);
        assert_eq!(world.body_count(), 4);

        world.destroy_joint(stray).unwrap();
        graph.release(&mut world).unwrap();
        assert_eq!(graph.vertex_count(), 0);
        assert_eq!(world.body_count(), 0);
        assert_eq!(world.joint_count(), 0);
    }

    #[test]
    fn grid_joint_formula() {
        assert_eq!(PhysicsGraph::grid_joint_count(4, 4), 24);
        assert_eq!(PhysicsGraph::grid_joint_count(3, 4), 17);
        assert_eq!(PhysicsGraph::grid_joint_count(2, 2), 4);
    }

    #[test]
    fn side_pairs_skip_duplicates_at_half_offset() {
        assert_eq!(PhysicsGraph::disc_side_pairs(6, 1).len(), 6);
        assert_eq!(PhysicsGraph::disc_side_pairs(6, 3), vec![(0, 3), (1, 4), (2, 5)]);
        assert!(PhysicsGraph::disc_side_pairs(6, 6).is_empty());
    }
}
