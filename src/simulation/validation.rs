// simulation/validation.rs
// Uniform-field validation: closed-form trajectory vs. the integrated particle

use serde::Serialize;
use ultraviolet::DVec2;

use super::World;
use crate::error::ValidationError;
use crate::particle::Particle;

/// Slack on the terminal time check so `n·dt` landing a hair below the
/// duration does not cost an extra frame.
const TIME_EPS: f64 = 1e-9;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub enum ValidationPhase {
    #[default]
    Idle,
    Running,
    Finished,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct TheorySample {
    pub time: f64,
    pub pos: DVec2,
}

/// Terminal comparison, captured exactly once per run.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ValidationOutcome {
    pub time: f64,
    pub theory_pos: DVec2,
    pub theory_vel: DVec2,
    pub sim_pos: DVec2,
    pub sim_vel: DVec2,
    pub pos_error: f64,
    pub vel_error: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct InitialState {
    pos: DVec2,
    vel: DVec2,
}

#[derive(Clone, Debug, Default)]
pub struct Validation {
    phase: ValidationPhase,
    field: DVec2,
    acceleration: DVec2,
    duration: f64,
    initial: Option<InitialState>,
    theory: Vec<TheorySample>,
    elapsed: f64,
    pos_error: f64,
    vel_error: f64,
    outcome: Option<ValidationOutcome>,
}

impl Validation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm the scenario for `particle` under the uniform `field`.
    ///
    /// The theory table holds one wrapped position per `sample_interval` from 0
    /// through `duration`.
    pub fn start(&mut self, particle: &Particle, field: DVec2, duration: f64, sample_interval: f64, world: &World) {
        let acceleration = if particle.mass > 0.0 {
            field * (particle.charge / particle.mass)
        } else {
            DVec2::zero()
        };
        let initial = InitialState {
            pos: particle.pos,
            vel: particle.vel,
        };

        let mut theory = Vec::new();
        let interval = sample_interval.max(f64::MIN_POSITIVE);
        let mut k = 0u64;
        loop {
            let time = k as f64 * interval;
            if time >= duration + TIME_EPS {
                break;
            }
            let (pos, _) = closed_form(&initial, acceleration, time);
            theory.push(TheorySample {
                time,
                pos: world.wrap(pos),
            });
            k += 1;
        }

        *self = Self {
            phase: ValidationPhase::Running,
            field,
            acceleration,
            duration,
            initial: Some(initial),
            theory,
            elapsed: 0.0,
            pos_error: 0.0,
            vel_error: 0.0,
            outcome: None,
        };
    }

    pub fn stop(&mut self) {
        *self = Self::default();
    }

    pub fn phase(&self) -> ValidationPhase {
        self.phase
    }

    pub fn is_active(&self) -> bool {
        self.phase != ValidationPhase::Idle
    }

    pub fn field(&self) -> DVec2 {
        self.field
    }

    pub fn acceleration(&self) -> DVec2 {
        self.acceleration
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn errors(&self) -> (f64, f64) {
        (self.pos_error, self.vel_error)
    }

    pub fn theory(&self) -> &[TheorySample] {
        &self.theory
    }

    pub fn outcome(&self) -> Option<&ValidationOutcome> {
        self.outcome.as_ref()
    }

    /// Closed-form position (wrapped) and velocity at `t`, clamped to the duration.
    pub fn theory_state(&self, t: f64, world: &World) -> Result<(DVec2, DVec2), ValidationError> {
        let initial = self.initial.as_ref().ok_or(ValidationError::MissingInitialState)?;
        let (pos, vel) = closed_form(initial, self.acceleration, t.min(self.duration));
        Ok((world.wrap(pos), vel))
    }

    /// Refresh running errors against the live particle at simulated time `clock`.
    ///
    /// Returns `true` on the frame that captures the terminal outcome. A
    /// finished run is left untouched.
    pub fn update(&mut self, clock: f64, particle: Option<&Particle>, world: &World) -> Result<bool, ValidationError> {
        if self.phase != ValidationPhase::Running {
            return Ok(false);
        }
        let particle = particle.ok_or(ValidationError::NoParticle)?;
        let t = clock.min(self.duration);
        let (theory_pos, theory_vel) = self.theory_state(t, world)?;

        self.elapsed = t;
        self.pos_error = world.distance(theory_pos, particle.pos);
        self.vel_error = (particle.vel - theory_vel).mag();

        if clock + TIME_EPS < self.duration || self.outcome.is_some() {
            return Ok(false);
        }
        self.outcome = Some(ValidationOutcome {
            time: t,
            theory_pos,
            theory_vel,
            sim_pos: particle.pos,
            sim_vel: particle.vel,
            pos_error: self.pos_error,
            vel_error: self.vel_error,
        });
        self.phase = ValidationPhase::Finished;
        Ok(true)
    }
}

fn closed_form(initial: &InitialState, acceleration: DVec2, t: f64) -> (DVec2, DVec2) {
    let pos = initial.pos + initial.vel * t + acceleration * (0.5 * t * t);
    let vel = initial.vel + acceleration * t;
    (pos, vel)
}
