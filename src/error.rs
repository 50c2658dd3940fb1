//! Error types for physics-world and agent operations.

use crate::handle::{AgentId, BodyId, JointId};
use thiserror::Error;

/// Errors raised by a physics world.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PhysicsError {
    #[error("body {0:?} does not exist")]
    UnknownBody(BodyId),
    #[error("joint {0:?} does not exist")]
    UnknownJoint(JointId),
    /// Bodies cannot be destroyed out from under live joints.
    #[error("body {body:?} is still referenced by {joints} joint(s)")]
    BodyHasJoints { body: BodyId, joints: usize },
    #[error("joint endpoints must be two distinct bodies")]
    SelfJoint,
    #[error("body radius must be positive and finite")]
    InvalidRadius,
    #[error("body density must be positive and finite")]
    InvalidDensity,
    #[error("joint frequency must be non-negative and finite")]
    InvalidFrequency,
    #[error("joint damping ratio must be non-negative and finite")]
    InvalidDampingRatio,
    #[error("bond lengths must be finite with 0 < min_length <= max_length and a non-negative envelope")]
    InvalidBondLength,
}

/// Why a mesh topology was rejected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TopologyFault {
    #[error("grid must be at least 2x2 (got {rows}x{cols})")]
    GridTooSmall { rows: usize, cols: usize },
    #[error("disc needs at least 3 rim segments (got {segments})")]
    TooFewSegments { segments: usize },
    #[error("{vertices} vertices but {tex_coords} texture coordinates")]
    TexCoordMismatch { vertices: usize, tex_coords: usize },
    #[error("{vertices} vertices cannot be addressed by 32-bit indices")]
    TooManyVertices { vertices: usize },
    #[error("index {index} out of range for {vertices} vertices")]
    IndexOutOfRange { index: u32, vertices: usize },
}

/// Errors raised while constructing, updating or destroying agents.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AgentError {
    #[error("invalid mesh topology: {0}")]
    InvalidTopology(#[from] TopologyFault),
    /// Invariant violation: mesh vertices and physics bodies are no longer 1:1.
    #[error("physics graph holds {bodies} bodies for {vertices} mesh vertices")]
    PhysicsGraphMismatch { vertices: usize, bodies: usize },
    #[error("agent {0:?} does not exist")]
    UnknownAgent(AgentId),
    #[error(transparent)]
    Physics(#[from] PhysicsError),
}
