//! Step observer trait for monitoring a physics step and receiving contacts.

use crate::handle::BodyId;

/// Trait for observing physics simulation steps.
///
/// Contact callbacks fire from inside [`VerletWorld::step`](crate::world::VerletWorld::step)
/// while the world is mutably borrowed, so an observer can only record what
/// happened. Joint creation or removal in response to a contact has to wait
/// until the step returns. All methods have default no-op implementations.
pub trait StepObserver {
    /// Called after all bodies have been integrated (Verlet step).
    fn on_integrate(&mut self) {}

    /// Called after each constraint iteration.
    fn on_constraint_iteration(&mut self, _iteration: usize) {}

    /// Two bodies started touching. `a < b`.
    fn on_contact_start(&mut self, _a: BodyId, _b: BodyId) {}

    /// Two bodies stopped touching. `a < b`.
    fn on_contact_end(&mut self, _a: BodyId, _b: BodyId) {}

    /// Called when a simulation step is fully complete.
    fn on_step_complete(&mut self) {}
}

/// A no-op observer that does nothing. Use as default when no observation needed.
pub struct NoOpStepObserver;

impl StepObserver for NoOpStepObserver {}

/// Records contact events in arrival order.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ContactLog {
    pub started: Vec<(BodyId, BodyId)>,
    pub ended: Vec<(BodyId, BodyId)>,
}

impl ContactLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.started.clear();
        self.ended.clear();
    }
}

impl StepObserver for ContactLog {
    fn on_contact_start(&mut self, a: BodyId, b: BodyId) {
        self.started.push((a, b));
    }

    fn on_contact_end(&mut self, a: BodyId, b: BodyId) {
        self.ended.push((a, b));
    }
}
