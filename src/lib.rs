//! Soft-body agents on a 2D point-mass and spring world, with dynamic bonding.
//!
//! `softkin` maps a render mesh onto a network of point masses and distance
//! joints, keeps the mesh following the simulation, and lets independent
//! agents bond into compound structures when their vertices touch.
//!
//! # Features
//!
//! - **Mesh topology**: Row-major grids and centre-plus-rim discs with texture coordinates
//! - **Physics graphs**: One body per vertex, one spring per grid edge or disc spoke
//! - **One-way sync**: Physics drives the mesh, never the reverse
//! - **Behavior**: Attract, repel, stretch and tickle impulses bounded by per-agent weights
//! - **Bonding**: Deferred joint creation from contact events, cooldowns, overstretch guard
//! - **Compound groups**: Recomputed on demand as connected components of the bond graph
//! - **Pluggable world**: Agents talk to physics through the `PhysicsWorld` trait;
//!   `VerletWorld` is the built-in implementation
//!
//! # Example
//!
//! ```
//! use softkin::{AgentProperties, Colony, Vec2};
//!
//! let mut colony: Colony<f32> = Colony::default();
//! let grid = AgentProperties::grid(Vec2::new(0.0, 0.0));
//! let disc = AgentProperties::disc(Vec2::new(300.0, 50.0));
//! let id = colony.construct(&grid).unwrap();
//! colony.construct(&disc).unwrap();
//!
//! colony.tick(1.0 / 60.0, &grid, &disc).unwrap();
//! assert_eq!(colony.mesh(id).unwrap().vertex_count(), 16);
//! ```

pub mod float;
pub mod vec;
pub mod handle;
pub mod error;
pub mod config;
pub mod properties;
pub mod observer;
pub mod body;
pub mod joint;
pub mod world;
pub mod mesh;
pub mod softbody;
pub mod behavior;
pub mod agent;
pub mod bond;
pub mod colony;

// Re-export primary API
pub use float::Float;
pub use vec::{Vec2, Vec3};
pub use handle::{AgentId, BodyId, JointId};
pub use error::{AgentError, PhysicsError, TopologyFault};
pub use config::{BondingConfig, Bounds, SolverConfig};
pub use properties::{AgentProperties, DiscShape, GridShape, JointPhysics, ShapeProperties, VertexPhysics, Weights};
pub use observer::{ContactLog, NoOpStepObserver, StepObserver};
pub use body::{Body, BodyDef};
pub use joint::{DistanceJoint, JointDef};
pub use world::{PhysicsWorld, VerletWorld};
pub use mesh::MeshTopology;
pub use softbody::PhysicsGraph;
pub use behavior::{Stimulus, Target, TargetOrigin};
pub use agent::{Agent, AgentKind, Color, PALETTE};
pub use bond::{BodyPair, BondBreak, BondRoster, BondState, BreakReason, CompoundGroup, FlushReport, InterAgentJoint};
pub use colony::{Colony, PendingRemoval, TickReport};
