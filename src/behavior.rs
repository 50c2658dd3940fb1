//! Behavior impulses: how an agent reacts to the targets it can see.
//!
//! Planning is pure. [`Drive::plan`] turns targets into one impulse per mesh
//! vertex, and the agent hands those to the physics world. Positions are
//! never written directly.

use crate::agent::AgentKind;
use crate::float::Float;
use crate::mesh::MeshTopology;
use crate::properties::Weights;
use crate::vec::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// What a target asks of the agent.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stimulus {
    /// Whole body drifts toward the target.
    Attract,
    /// Whole body drifts away from the target.
    Repel,
    /// Boundary vertices facing the target reach for it.
    Stretch,
    /// Every vertex jitters in a random direction.
    Tickle,
}

impl Stimulus {
    const COUNT: usize = 4;
    /// Accumulator for repulsion from the other agent kind, capped separately.
    const FOREIGN_REPEL: usize = Stimulus::COUNT;

    fn slot(self) -> usize {
        match self {
            Stimulus::Attract => 0,
            Stimulus::Repel => 1,
            Stimulus::Stretch => 2,
            Stimulus::Tickle => 3,
        }
    }
}

/// Where a target comes from.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetOrigin {
    /// A tracked person in front of the installation.
    Person,
    /// Another agent of the given kind.
    Agent(AgentKind),
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Target<F: Float> {
    pub position: Vec2<F>,
    pub stimulus: Stimulus,
    pub origin: TargetOrigin,
}

impl<F: Float> Target<F> {
    pub fn person(position: Vec2<F>, stimulus: Stimulus) -> Self {
        Target { position, stimulus, origin: TargetOrigin::Person }
    }

    pub fn agent(position: Vec2<F>, stimulus: Stimulus, kind: AgentKind) -> Self {
        Target { position, stimulus, origin: TargetOrigin::Agent(kind) }
    }
}

/// `1 - distance / radius`, clamped to [0, 1]. Zero radius sees nothing.
pub fn falloff<F: Float>(distance: F, radius: F) -> F {
    if radius <= F::zero() {
        return F::zero();
    }
    (F::one() - distance / radius).clamp(F::zero(), F::one())
}

/// Uniformly distributed unit vector.
pub fn random_direction<F: Float, R: Rng + ?Sized>(rng: &mut R) -> Vec2<F> {
    let turn: f32 = rng.gen();
    Vec2::from_angle(F::two() * F::pi() * F::from_f32(turn))
}

/// The parameters one agent drives its vertices with this tick.
pub struct Drive<'a, F: Float> {
    pub kind: AgentKind,
    pub visibility_radius: F,
    pub own: &'a Weights<F>,
    /// Weights of the other agent kind.
    pub other: &'a Weights<F>,
}

impl<'a, F: Float> Drive<'a, F> {
    /// Weight bounding the impulse for `stimulus` from a target of `origin`.
    ///
    /// Repulsion from an agent of the other kind is that kind's to give, so it
    /// uses the other kind's weight. Everything else uses this agent's weights.
    pub fn weight(&self, stimulus: Stimulus, origin: TargetOrigin) -> F {
        match stimulus {
            Stimulus::Attract => self.own.attraction,
            Stimulus::Repel if self.is_foreign(origin) => self.other.repulsion,
            Stimulus::Repel => self.own.repulsion,
            Stimulus::Stretch => self.own.stretch,
            Stimulus::Tickle => self.own.tickle,
        }
    }

    fn is_foreign(&self, origin: TargetOrigin) -> bool {
        matches!(origin, TargetOrigin::Agent(kind) if kind != self.kind)
    }

    fn slot(&self, stimulus: Stimulus, origin: TargetOrigin) -> usize {
        if stimulus == Stimulus::Repel && self.is_foreign(origin) {
            Stimulus::FOREIGN_REPEL
        } else {
            stimulus.slot()
        }
    }

    /// One impulse per mesh vertex.
    ///
    /// Targets farther than the visibility radius from the mesh centroid are
    /// ignored. For each vertex, the impulses of one stimulus are summed and
    /// then capped at that stimulus' weight. Repulsion from the other kind is
    /// summed apart from all other repulsion and capped at the other kind's
    /// weight.
    pub fn plan<R: Rng + ?Sized>(
        &self,
        mesh: &MeshTopology<F>,
        boundary: &[usize],
        targets: &[Target<F>],
        rng: &mut R,
    ) -> Vec<Vec2<F>> {
        let n = mesh.vertex_count();
        let mut per_stimulus = vec![[Vec2::zero(); Stimulus::COUNT + 1]; n];
        let centroid = mesh.centroid();

        for target in targets {
            let gap = centroid.distance(target.position);
            if gap > self.visibility_radius {
                continue;
            }
            let weight = self.weight(target.stimulus, target.origin);
            if weight <= F::zero() {
                continue;
            }
            let slot = self.slot(target.stimulus, target.origin);

            match target.stimulus {
                Stimulus::Attract | Stimulus::Repel => {
                    let sign = if target.stimulus == Stimulus::Attract { F::one() } else { -F::one() };
                    for (i, acc) in per_stimulus.iter_mut().enumerate() {
                        let p = mesh.vertex_xy(i);
                        let strength = weight * falloff(p.distance(target.position), self.visibility_radius);
                        acc[slot] += (target.position - p).normalize().scale(sign * strength);
                    }
                }
                Stimulus::Stretch => {
                    for &i in boundary.iter().filter(|&&i| i < n) {
                        let p = mesh.vertex_xy(i);
                        let toward = (target.position - p).normalize();
                        let outward = (p - centroid).normalize();
                        if outward.dot(toward) <= F::zero() {
                            continue;
                        }
                        let strength = weight * falloff(p.distance(target.position), self.visibility_radius);
                        per_stimulus[i][slot] += toward.scale(strength);
                    }
                }
                Stimulus::Tickle => {
                    let strength = weight * falloff(gap, self.visibility_radius);
                    for acc in per_stimulus.iter_mut() {
                        acc[slot] += random_direction::<F, R>(rng).scale(strength);
                    }
                }
            }
        }

        let caps = [
            self.own.attraction,
            self.own.repulsion,
            self.own.stretch,
            self.own.tickle,
            self.other.repulsion,
        ];
        per_stimulus
            .into_iter()
            .map(|acc| {
                let mut total = Vec2::zero();
                for (impulse, cap) in acc.iter().zip(caps.iter()) {
                    total += impulse.clamp_length(cap.max(F::zero()));
                }
                total
            })
            .collect()
    }
}
