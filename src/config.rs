// Centralized configuration for simulation parameters

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use ultraviolet::DVec2;

use crate::error::ConfigError;

// ====================
// Display / World
// ====================
pub const WINDOW_WIDTH_PX: u32 = 1280;
pub const WINDOW_HEIGHT_PX: u32 = 800;
pub const FPS_TARGET: u32 = 60;
/// Upper bound on `display_fps`; the validation theory table holds one sample per frame.
pub const MAX_DISPLAY_FPS: u32 = 1000;
/// 1 m = 80 px
pub const PIXELS_PER_METER: f64 = 80.0;
pub const WORLD_WIDTH_M: f64 = WINDOW_WIDTH_PX as f64 / PIXELS_PER_METER; // 16.0 m
pub const WORLD_HEIGHT_M: f64 = WINDOW_HEIGHT_PX as f64 / PIXELS_PER_METER; // 10.0 m

// ====================
// Physics
// ====================
/// Coulomb constant in N·m²/C².
pub const K_COULOMB: f64 = 8.9875517873681764e9;
/// Fixed integrator substep in seconds.
pub const DT_S: f64 = 0.001;
pub const SUBSTEPS_BASE_PER_FRAME: u32 = 8;
pub const SPEED_MULTIPLIERS: [f64; 4] = [0.5, 1.0, 2.0, 4.0];
pub const DEFAULT_SPEED_INDEX: usize = 1;
/// Softening as a fraction of contact radius.
pub const SOFTENING_FRACTION: f64 = 0.1;

// ====================
// Particles
// ====================
pub const MAX_PARTICLES: usize = 100;
pub const DEFAULT_CHARGE_C: f64 = 5e-6;
pub const DEFAULT_MASS_KG: f64 = 0.02;
pub const DEFAULT_RADIUS_M: f64 = 0.1;
pub const MIN_CHARGE_C: f64 = -100e-6;
pub const MAX_CHARGE_C: f64 = 100e-6;
pub const MIN_MASS_KG: f64 = 0.005;
pub const MAX_MASS_KG: f64 = 0.2;
pub const MIN_RADIUS_M: f64 = 0.02;
pub const MAX_RADIUS_M: f64 = 0.15;
pub const CHARGE_STEP_C: f64 = 1e-6;
pub const MASS_STEP_KG: f64 = 0.005;
pub const RADIUS_STEP_M: f64 = 0.005;
/// Charges at or below this magnitude are drawn as neutral.
pub const NEUTRAL_CHARGE_EPS: f64 = 1e-12;

// ====================
// Trails
// ====================
pub const TRAJECTORY_HISTORY_SECONDS: f64 = 3.0;

// ====================
// Field visualization
// ====================
pub const FIELD_GRID_STEP_PX: u32 = 30;
pub const SAMPLER_CACHE_CAPACITY: usize = 8;
/// Pick radius margin around a particle, in pixels.
pub const SELECTION_MARGIN_PX: f64 = 6.0;

// ====================
// Uniform field validation
// ====================
pub const UNIFORM_FIELD_VECTOR_NC: [f64; 2] = [500.0, 0.0];
pub const VALIDATION_DURATION_S: f64 = 10.0;

/// Which force kernel backs the simulation. Chosen once at construction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForceKernel {
    /// rayon-parallel outer loop over targets
    #[default]
    Parallel,
    /// single-threaded reference kernel
    Scalar,
}

/// Closed interval plus edit step and default for one particle property.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PropertyRange {
    pub min: f64,
    pub max: f64,
    pub step: f64,
    pub default: f64,
}

impl PropertyRange {
    pub const fn new(min: f64, max: f64, step: f64, default: f64) -> Self {
        Self { min, max, step, default }
    }

    /// Clamp `value` into `[min, max]`. NaN collapses to `default`.
    pub fn clamp(&self, value: f64) -> f64 {
        if value.is_nan() {
            return self.default.clamp(self.min, self.max);
        }
        value.clamp(self.min, self.max)
    }
}

/// Bounds applied at every particle mutation site.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PropertyBounds {
    pub charge: PropertyRange,
    pub mass: PropertyRange,
    pub radius: PropertyRange,
}

impl Default for PropertyBounds {
    fn default() -> Self {
        Self {
            charge: PropertyRange::new(MIN_CHARGE_C, MAX_CHARGE_C, CHARGE_STEP_C, DEFAULT_CHARGE_C),
            mass: PropertyRange::new(MIN_MASS_KG, MAX_MASS_KG, MASS_STEP_KG, DEFAULT_MASS_KG),
            radius: PropertyRange::new(MIN_RADIUS_M, MAX_RADIUS_M, RADIUS_STEP_M, DEFAULT_RADIUS_M),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub world_width: f64,
    pub world_height: f64,
    pub pixels_per_meter: f64,
    pub coulomb_constant: f64,
    /// Fixed substep duration (s)
    pub dt: f64,
    pub substeps_base: u32,
    pub speed_multipliers: Vec<f64>,
    pub softening_fraction: f64,
    pub max_particles: usize,
    pub bounds: PropertyBounds,
    /// Trajectory retention window (s)
    pub trail_retention: f64,
    pub display_fps: u32,
    /// Uniform field (N/C) used by the validation scenario
    pub uniform_field: [f64; 2],
    pub validation_duration: f64,
    pub field_grid_step_px: u32,
    pub selection_margin_px: f64,
    pub sampler_cache_capacity: usize,
    pub force_kernel: ForceKernel,
    pub show_forces: bool,
    pub show_trails: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            world_width: WORLD_WIDTH_M,
            world_height: WORLD_HEIGHT_M,
            pixels_per_meter: PIXELS_PER_METER,
            coulomb_constant: K_COULOMB,
            dt: DT_S,
            substeps_base: SUBSTEPS_BASE_PER_FRAME,
            speed_multipliers: SPEED_MULTIPLIERS.to_vec(),
            softening_fraction: SOFTENING_FRACTION,
            max_particles: MAX_PARTICLES,
            bounds: PropertyBounds::default(),
            trail_retention: TRAJECTORY_HISTORY_SECONDS,
            display_fps: FPS_TARGET,
            uniform_field: UNIFORM_FIELD_VECTOR_NC,
            validation_duration: VALIDATION_DURATION_S,
            field_grid_step_px: FIELD_GRID_STEP_PX,
            selection_margin_px: SELECTION_MARGIN_PX,
            sampler_cache_capacity: SAMPLER_CACHE_CAPACITY,
            force_kernel: ForceKernel::default(),
            show_forces: false,
            show_trails: true,
        }
    }
}

impl SimConfig {
    /// Parse a TOML file; missing keys keep their defaults.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let config: SimConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn uniform_field_vector(&self) -> DVec2 {
        DVec2::new(self.uniform_field[0], self.uniform_field[1])
    }

    /// Interval between trail samples (one display frame).
    pub fn frame_interval(&self) -> f64 {
        1.0 / self.display_fps.max(1) as f64
    }

    pub fn selection_margin_m(&self) -> f64 {
        self.selection_margin_px / self.pixels_per_meter
    }

    /// Reject configurations the simulation cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("world_width", self.world_width),
            ("world_height", self.world_height),
            ("pixels_per_meter", self.pixels_per_meter),
            ("dt", self.dt),
            ("validation_duration", self.validation_duration),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::Invalid(format!("{name} must be positive, got {value}")));
            }
        }
        if self.softening_fraction < 0.0 || !self.softening_fraction.is_finite() {
            return Err(ConfigError::Invalid(format!(
                "softening_fraction must be non-negative, got {}",
                self.softening_fraction
            )));
        }
        if self.speed_multipliers.is_empty() {
            return Err(ConfigError::Invalid("speed_multipliers is empty".into()));
        }
        if !(1..=MAX_DISPLAY_FPS).contains(&self.display_fps) {
            return Err(ConfigError::Invalid(format!(
                "display_fps must be in 1..={MAX_DISPLAY_FPS}, got {}",
                self.display_fps
            )));
        }
        if self.field_grid_step_px == 0 {
            return Err(ConfigError::Invalid("field_grid_step_px must be at least 1".into()));
        }
        let ranges = [
            ("charge", self.bounds.charge),
            ("mass", self.bounds.mass),
            ("radius", self.bounds.radius),
        ];
        for (name, range) in ranges {
            if range.min > range.max {
                return Err(ConfigError::Invalid(format!(
                    "{name} range has min {} > max {}",
                    range.min, range.max
                )));
            }
        }
        if self.bounds.mass.min <= 0.0 {
            return Err(ConfigError::Invalid("mass lower bound must be positive".into()));
        }
        Ok(())
    }
}
