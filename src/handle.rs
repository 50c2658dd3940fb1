//! Generational handles for bodies, joints and agents.
//!
//! Handles are slot-map keys: a handle to a destroyed object never resolves to
//! a newer object that reused its slot. Physics bodies store their owner as an
//! [`AgentId`], which is how contact callbacks find the agent without holding
//! a reference to it.

use slotmap::new_key_type;

new_key_type! {
    /// Point-mass body inside a physics world.
    pub struct BodyId;
    /// Distance joint inside a physics world.
    pub struct JointId;
    /// Agent inside a colony.
    pub struct AgentId;
}
