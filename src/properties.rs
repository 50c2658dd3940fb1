//! Construction and per-tick properties of agents.
//!
//! These are the named numeric knobs the surrounding application edits
//! (mesh rows/columns, sizes, vertex physics, joint spring, weights,
//! visibility factor). They derive serde so they can live in a TOML file.

use crate::float::Float;
use crate::vec::Vec2;
use serde::{Deserialize, Serialize};

/// Physical constants of every vertex body of an agent.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VertexPhysics<F: Float> {
    /// Bounce. Default: 0.3.
    pub restitution: F,
    /// Mass per unit area. Default: 1.0.
    pub density: F,
    /// Default: 0.5.
    pub friction: F,
    /// Collision radius. Default: 4.0.
    pub radius: F,
}

impl<F: Float> Default for VertexPhysics<F> {
    fn default() -> Self {
        VertexPhysics {
            restitution: F::from_f32(0.3),
            density: F::one(),
            friction: F::half(),
            radius: F::from_f32(4.0),
        }
    }
}

/// Spring parameters shared by a family of structural joints.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JointPhysics<F: Float> {
    /// Oscillation frequency in Hz. Zero makes the joint rigid.
    pub frequency: F,
    /// Damping ratio (1.0 = critical).
    pub damping_ratio: F,
}

impl<F: Float> JointPhysics<F> {
    pub fn new(frequency: F, damping_ratio: F) -> Self {
        JointPhysics { frequency, damping_ratio }
    }
}

impl<F: Float> Default for JointPhysics<F> {
    fn default() -> Self {
        JointPhysics { frequency: F::from_f32(4.0), damping_ratio: F::one() }
    }
}

/// Upper bounds on the per-frame behavior impulses.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Weights<F: Float> {
    pub stretch: F,
    pub repulsion: F,
    pub attraction: F,
    pub tickle: F,
    /// Speed cap applied to every vertex after behavior impulses.
    pub max_velocity: F,
}

impl<F: Float> Default for Weights<F> {
    fn default() -> Self {
        Weights {
            stretch: F::from_f32(20.0),
            repulsion: F::from_f32(10.0),
            attraction: F::from_f32(5.0),
            tickle: F::from_f32(2.0),
            max_velocity: F::from_f32(200.0),
        }
    }
}

/// Regular grid of vertices joined along rows and columns.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridShape<F: Float> {
    pub rows: usize,
    pub cols: usize,
    /// Width and height of the mesh.
    pub size: Vec2<F>,
    /// Top-left corner of the mesh.
    pub origin: Vec2<F>,
    pub joint: JointPhysics<F>,
}

/// A centre vertex ringed by rim vertices.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DiscShape<F: Float> {
    pub center: Vec2<F>,
    pub radius: F,
    /// Number of rim vertices.
    pub segments: usize,
    /// Spring joining each rim vertex to the centre.
    pub center_joint: JointPhysics<F>,
    /// Spring joining rim vertices to each other.
    pub side_joint: JointPhysics<F>,
    /// Rim vertex `i` is joined to rim vertex `i + side_joint_offset`.
    pub side_joint_offset: usize,
}

/// Topology selector; picks the agent variant at construction.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ShapeProperties<F: Float> {
    Grid(GridShape<F>),
    Disc(DiscShape<F>),
}

impl<F: Float> ShapeProperties<F> {
    /// Half of the mesh width; the base of the visibility radius.
    pub fn half_width(&self) -> F {
        match self {
            ShapeProperties::Grid(grid) => grid.size.x * F::half(),
            ShapeProperties::Disc(disc) => disc.radius,
        }
    }
}

/// Everything needed to construct an agent, and to re-tune it every tick.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AgentProperties<F: Float> {
    pub shape: ShapeProperties<F>,
    pub vertex: VertexPhysics<F>,
    pub weights: Weights<F>,
    pub visibility_radius_factor: F,
    /// Width and height of the texture mapped onto the mesh.
    pub texture_size: Vec2<F>,
    /// Seeds the agent's colour pick and tickle noise.
    #[serde(default)]
    pub seed: u64,
}

impl<F: Float> AgentProperties<F> {
    /// A 4x4 grid agent, 100x100 in size, at `origin`.
    pub fn grid(origin: Vec2<F>) -> Self {
        AgentProperties {
            shape: ShapeProperties::Grid(GridShape {
                rows: 4,
                cols: 4,
                size: Vec2::splat(F::from_f32(100.0)),
                origin,
                joint: JointPhysics::default(),
            }),
            vertex: VertexPhysics::default(),
            weights: Weights::default(),
            visibility_radius_factor: F::from_f32(1.5),
            texture_size: Vec2::splat(F::from_f32(100.0)),
            seed: 0,
        }
    }

    /// A 12-segment disc agent of radius 40 centred on `center`.
    pub fn disc(center: Vec2<F>) -> Self {
        AgentProperties {
            shape: ShapeProperties::Disc(DiscShape {
                center,
                radius: F::from_f32(40.0),
                segments: 12,
                center_joint: JointPhysics::new(F::from_f32(3.0), F::one()),
                side_joint: JointPhysics::new(F::from_f32(5.0), F::one()),
                side_joint_offset: 1,
            }),
            vertex: VertexPhysics::default(),
            weights: Weights::default(),
            visibility_radius_factor: F::from_f32(1.5),
            texture_size: Vec2::splat(F::from_f32(80.0)),
            seed: 0,
        }
    }

    /// Resize a grid shape to `rows` x `cols`. No effect on discs.
    pub fn with_grid_dims(mut self, rows: usize, cols: usize) -> Self {
        if let ShapeProperties::Grid(grid) = &mut self.shape {
            grid.rows = rows;
            grid.cols = cols;
        }
        self
    }

    /// Set the mesh size of a grid, or the diameter of a disc.
    pub fn with_size(mut self, size: Vec2<F>) -> Self {
        match &mut self.shape {
            ShapeProperties::Grid(grid) => grid.size = size,
            ShapeProperties::Disc(disc) => disc.radius = size.x * F::half(),
        }
        self
    }

    pub fn with_vertex(mut self, vertex: VertexPhysics<F>) -> Self {
        self.vertex = vertex;
        self
    }

    pub fn with_weights(mut self, weights: Weights<F>) -> Self {
        self.weights = weights;
        self
    }

    pub fn with_visibility_radius_factor(mut self, factor: F) -> Self {
        self.visibility_radius_factor = factor;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Half mesh width times the visibility factor.
    pub fn visibility_radius(&self) -> F {
        self.shape.half_width() * self.visibility_radius_factor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disc_visibility_uses_radius() {
        let props: AgentProperties<f32> =
            AgentProperties::disc(Vec2::zero()).with_visibility_radius_factor(2.0);
        assert_eq!(props.visibility_radius(), 80.0);
    }

    #[test]
    fn grid_dims_ignored_for_disc() {
        let props: AgentProperties<f32> = AgentProperties::disc(Vec2::zero()).with_grid_dims(9, 9);
        assert!(matches!(props.shape, ShapeProperties::Disc(_)));
    }
}
