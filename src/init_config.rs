// init_config.rs
// Loads a startup scene (settings plus initial particles) from a TOML file

use std::fs;
use std::path::Path;

use log::warn;
use serde::{Deserialize, Serialize};
use ultraviolet::DVec2;

use crate::config::{self, SimConfig};
use crate::error::ConfigError;
use crate::simulation::Simulation;

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct InitConfig {
    #[serde(default)]
    pub simulation: SimConfig,
    /// Replaces the default scene when non-empty.
    #[serde(default)]
    pub particles: Vec<ParticleConfig>,
    /// Start the uniform-field validation run instead of the particle scene.
    #[serde(default)]
    pub validation: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ParticleConfig {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub vx: f64,
    #[serde(default)]
    pub vy: f64,
    #[serde(default = "default_charge")]
    pub charge: f64,
    #[serde(default = "default_mass")]
    pub mass: f64,
    #[serde(default = "default_radius")]
    pub radius: f64,
    #[serde(default)]
    pub fixed: bool,
}

fn default_charge() -> f64 {
    config::DEFAULT_CHARGE_C
}

fn default_mass() -> f64 {
    config::DEFAULT_MASS_KG
}

fn default_radius() -> f64 {
    config::DEFAULT_RADIUS_M
}

impl InitConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let init: InitConfig = toml::from_str(content)?;
        init.simulation.validate()?;
        Ok(init)
    }

    /// Build a simulation from these settings and populate its scene.
    pub fn build(&self) -> Simulation {
        let mut sim = Simulation::new(self.simulation.clone());
        if self.validation {
            sim.start_validation();
            return sim;
        }
        if self.particles.is_empty() {
            return sim;
        }
        sim.clear();
        for (i, p) in self.particles.iter().enumerate() {
            let added = sim.add_particle(
                DVec2::new(p.x, p.y),
                DVec2::new(p.vx, p.vy),
                p.charge,
                p.mass,
                p.radius,
                p.fixed,
            );
            if let Err(err) = added {
                warn!("particle {} of the init file was skipped: {}", i, err);
                break;
            }
        }
        sim.recompute_energies();
        sim
    }
}
