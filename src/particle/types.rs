// particle/types.rs
// Particle struct and per-particle helpers

use palette::Srgb;
use serde::{Deserialize, Serialize};
use ultraviolet::DVec2;

use super::Trajectory;
use crate::config::{self, PropertyBounds};

pub const COLOR_POSITIVE: (u8, u8, u8) = (255, 85, 85);
pub const COLOR_NEGATIVE: (u8, u8, u8) = (75, 139, 255);
pub const COLOR_NEUTRAL: (u8, u8, u8) = (255, 255, 255);

/// A charged disc in the periodic domain.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    /// Dense index, reassigned to 0..N-1 after any removal or merge.
    pub id: usize,
    pub pos: DVec2,
    pub vel: DVec2,
    pub mass: f64,
    pub charge: f64,
    /// Contact radius (m)
    pub radius: f64,
    pub fixed: bool,
    pub trail: Trajectory,
}

impl Particle {
    /// Build a particle with charge, mass and radius clamped into `bounds`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: usize,
        pos: DVec2,
        vel: DVec2,
        charge: f64,
        mass: f64,
        radius: f64,
        fixed: bool,
        bounds: &PropertyBounds,
    ) -> Self {
        let mut particle = Self {
            id,
            pos,
            vel,
            mass,
            charge,
            radius,
            fixed,
            trail: Trajectory::new(),
        };
        particle.clamp_properties(bounds);
        particle
    }

    pub fn clamp_properties(&mut self, bounds: &PropertyBounds) {
        self.charge = bounds.charge.clamp(self.charge);
        self.mass = bounds.mass.clamp(self.mass);
        self.radius = bounds.radius.clamp(self.radius);
    }

    pub fn momentum(&self) -> DVec2 {
        self.vel * self.mass
    }

    /// Kinetic energy; fixed particles carry none.
    pub fn kinetic_energy(&self) -> f64 {
        if self.fixed {
            0.0
        } else {
            0.5 * self.mass * self.vel.mag_sq()
        }
    }

    /// Whether this particle receives acceleration from the force model.
    pub fn is_mobile_target(&self) -> bool {
        !self.fixed && self.mass > 0.0 && self.charge != 0.0
    }

    /// Display colour keyed on charge sign.
    pub fn color(&self) -> Srgb<u8> {
        let (r, g, b) = if self.charge.abs() <= config::NEUTRAL_CHARGE_EPS {
            COLOR_NEUTRAL
        } else if self.charge > 0.0 {
            COLOR_POSITIVE
        } else {
            COLOR_NEGATIVE
        };
        Srgb::new(r, g, b)
    }
}
