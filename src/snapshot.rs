// snapshot.rs
// Serializable per-frame read model handed to renderers

use serde::Serialize;
use ultraviolet::DVec2;

use crate::particle::{Particle, TrailSample};
use crate::simulation::validation::{TheorySample, ValidationOutcome};
use crate::simulation::{Diagnostics, Energies, RunState, Simulation};

#[derive(Clone, Debug, Serialize)]
pub struct ParticleSnapshot {
    pub id: usize,
    pub pos: DVec2,
    pub vel: DVec2,
    pub mass: f64,
    pub charge: f64,
    pub radius: f64,
    pub fixed: bool,
    pub color: (u8, u8, u8),
    pub trail: Vec<TrailSample>,
}

impl From<&Particle> for ParticleSnapshot {
    fn from(p: &Particle) -> Self {
        Self {
            id: p.id,
            pos: p.pos,
            vel: p.vel,
            mass: p.mass,
            charge: p.charge,
            radius: p.radius,
            fixed: p.fixed,
            color: p.color().into_components(),
            trail: p.trail.iter().copied().collect(),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct ValidationTelemetry {
    pub active: bool,
    pub finished: bool,
    pub field: DVec2,
    pub acceleration: DVec2,
    pub elapsed: f64,
    pub pos_error: f64,
    pub vel_error: f64,
    pub outcome: Option<ValidationOutcome>,
    /// Closed-form path for drawing alongside the live trail.
    pub theory: Vec<TheorySample>,
}

#[derive(Clone, Debug, Serialize)]
pub struct FrameSnapshot {
    pub time: f64,
    pub state: RunState,
    pub speed_multiplier: f64,
    pub selected: Option<usize>,
    pub energies: Energies,
    pub particles: Vec<ParticleSnapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forces: Option<Vec<DVec2>>,
    pub validation: ValidationTelemetry,
    pub diagnostics: Diagnostics,
}

impl Simulation {
    pub fn snapshot(&self) -> FrameSnapshot {
        let validation = self.validation();
        let (pos_error, vel_error) = validation.errors();
        FrameSnapshot {
            time: self.clock(),
            state: self.run_state(),
            speed_multiplier: self.speed_multiplier(),
            selected: self.selected(),
            energies: self.energies(),
            particles: self.particles.iter().map(ParticleSnapshot::from).collect(),
            forces: self.last_forces().map(<[DVec2]>::to_vec),
            validation: ValidationTelemetry {
                active: validation.is_active(),
                finished: validation.outcome().is_some(),
                field: validation.field(),
                acceleration: validation.acceleration(),
                elapsed: validation.elapsed(),
                pos_error,
                vel_error,
                outcome: validation.outcome().copied(),
                theory: validation.theory().to_vec(),
            },
            diagnostics: self.diagnostics(),
        }
    }
}
