// simulation/simulation.rs
// Contains the Simulation struct: scene ownership, frame/substep stepping, selection and validation

use log::{debug, info, warn};
use serde::Serialize;
use ultraviolet::DVec2;

use super::collision;
use super::forces::{self, ForceModel};
use super::integrator;
use super::validation::{Validation, ValidationPhase};
use super::World;
use crate::config::SimConfig;
use crate::error::{Result, SimError};
use crate::field::{FieldSampler, SamplerCache};
use crate::particle::Particle;
use crate::profile_scope;

/// Coarse state seen by the UI.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum RunState {
    Running,
    Paused,
    ValidationRunning,
    ValidationFinished,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct Energies {
    pub kinetic: f64,
    pub potential: f64,
    pub total: f64,
}

/// Counters for conditions that are handled in place rather than raised.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Diagnostics {
    /// RK4 results discarded because they were not finite.
    pub non_finite_rejections: u64,
    pub merges: u64,
}

/// The main simulation state and logic for the particle system.
pub struct Simulation {
    pub config: SimConfig,
    pub world: World,
    pub particles: Vec<Particle>,
    forces: ForceModel,
    substeps_elapsed: u64,
    paused: bool,
    speed_index: usize,
    selected: Option<usize>,
    energies: Energies,
    last_forces: Option<Vec<DVec2>>,
    pub show_forces: bool,
    pub show_trails: bool,
    validation: Validation,
    /// Pause flag to restore when validation stops.
    paused_before_validation: bool,
    diagnostics: Diagnostics,
}

impl Default for Simulation {
    fn default() -> Self {
        Self::new(SimConfig::default())
    }
}

impl Simulation {
    /// Build a simulation in the default scene. The force kernel is fixed here.
    pub fn new(config: SimConfig) -> Self {
        let world = World::new(config.world_width, config.world_height);
        let forces = ForceModel::from_config(&config);
        let speed_index = crate::config::DEFAULT_SPEED_INDEX.min(config.speed_multipliers.len().saturating_sub(1));
        let mut sim = Self {
            show_forces: config.show_forces,
            show_trails: config.show_trails,
            config,
            world,
            particles: Vec::new(),
            forces,
            substeps_elapsed: 0,
            paused: false,
            speed_index,
            selected: None,
            energies: Energies::default(),
            last_forces: None,
            validation: Validation::new(),
            paused_before_validation: false,
            diagnostics: Diagnostics::default(),
        };
        debug!("force kernel: {}", sim.forces.kernel_name());
        sim.reset_to_default_scene();
        sim
    }

    // ---- read accessors -------------------------------------------------

    /// Simulated time, `substeps · dt`.
    pub fn clock(&self) -> f64 {
        self.substeps_elapsed as f64 * self.config.dt
    }

    pub fn substeps_elapsed(&self) -> u64 {
        self.substeps_elapsed
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn run_state(&self) -> RunState {
        match self.validation.phase() {
            ValidationPhase::Finished => RunState::ValidationFinished,
            ValidationPhase::Running if !self.paused => RunState::ValidationRunning,
            _ if self.paused => RunState::Paused,
            _ => RunState::Running,
        }
    }

    pub fn speed_index(&self) -> usize {
        self.speed_index
    }

    pub fn speed_multiplier(&self) -> f64 {
        self.config.speed_multipliers.get(self.speed_index).copied().unwrap_or(1.0)
    }

    pub fn substeps_per_frame(&self) -> u32 {
        let n = (self.config.substeps_base as f64 * self.speed_multiplier()).round();
        (n as u32).max(1)
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn selected_particle(&self) -> Option<&Particle> {
        self.selected.and_then(|i| self.particles.get(i))
    }

    pub fn energies(&self) -> Energies {
        self.energies
    }

    pub fn last_forces(&self) -> Option<&[DVec2]> {
        self.last_forces.as_deref()
    }

    pub fn validation(&self) -> &Validation {
        &self.validation
    }

    pub fn diagnostics(&self) -> Diagnostics {
        self.diagnostics
    }

    pub fn force_model(&self) -> &ForceModel {
        &self.forces
    }

    /// Uniform field to show in place of the particle field, if any.
    pub fn uniform_field_override(&self) -> Option<DVec2> {
        self.forces.params.uniform_field
    }

    /// Refresh the cached sampler for the current geometry and return it.
    pub fn sample_field<'c>(&self, cache: &'c mut SamplerCache) -> &'c FieldSampler {
        let sampler = cache.get_or_create(
            &self.world,
            self.config.pixels_per_meter,
            self.config.field_grid_step_px,
            self.config.softening_fraction,
        );
        sampler.recompute(&self.particles, self.config.coulomb_constant, self.uniform_field_override());
        sampler
    }

    // ---- stepping -------------------------------------------------------

    /// Advance one display frame. Does nothing while paused.
    pub fn step_frame(&mut self) {
        if self.paused {
            return;
        }
        self.advance_frame();
    }

    /// Advance exactly one frame regardless of the pause flag.
    pub fn step_once(&mut self) {
        self.advance_frame();
    }

    fn advance_frame(&mut self) {
        profile_scope!("simulation_frame");
        for _ in 0..self.substeps_per_frame() {
            self.substep();
        }
        self.end_of_frame();
    }

    fn substep(&mut self) {
        let report = integrator::rk4_step(&mut self.particles, &self.world, self.config.dt, &self.forces);
        if report.non_finite > 0 {
            self.diagnostics.non_finite_rejections += report.non_finite as u64;
            warn!(
                "discarded {} non-finite RK4 result(s) at t = {:.4} s",
                report.non_finite,
                self.clock()
            );
        }
        self.wrap_positions();

        let collisions = collision::resolve_collisions(&mut self.particles, &self.world);
        self.diagnostics.merges += collisions.merges as u64;
        self.wrap_positions();

        self.ensure_selection_valid();
        self.substeps_elapsed += 1;
    }

    fn end_of_frame(&mut self) {
        profile_scope!("frame_bookkeeping");
        let now = self.clock();
        if self.show_trails {
            let interval = self.config.frame_interval();
            let window = self.config.trail_retention;
            for p in &mut self.particles {
                p.trail.sample(now, p.pos, interval, window);
            }
        }
        self.recompute_energies();
        self.last_forces = if self.show_forces {
            Some(self.compute_forces())
        } else {
            None
        };
        self.update_validation();
    }

    fn wrap_positions(&mut self) {
        let world = self.world;
        for p in &mut self.particles {
            p.pos = world.wrap(p.pos);
        }
    }

    fn ensure_selection_valid(&mut self) {
        if matches!(self.selected, Some(i) if i >= self.particles.len()) {
            self.selected = None;
        }
    }

    pub fn recompute_energies(&mut self) {
        let kinetic = forces::kinetic_energy(&self.particles);
        let potential = forces::potential_energy(&self.particles, &self.world, self.config.coulomb_constant);
        self.energies = Energies {
            kinetic,
            potential,
            total: kinetic + potential,
        };
    }

    /// Net force per particle (`m·a`), zero for fixed particles.
    fn compute_forces(&self) -> Vec<DVec2> {
        let acc = self.forces.accelerations(&self.particles, &self.world);
        self.particles
            .iter()
            .zip(acc)
            .map(|(p, a)| if p.fixed { DVec2::zero() } else { a * p.mass })
            .collect()
    }

    // ---- scene edits ----------------------------------------------------

    /// Append a particle with clamped properties and return its id.
    pub fn add_particle(
        &mut self,
        pos: DVec2,
        vel: DVec2,
        charge: f64,
        mass: f64,
        radius: f64,
        fixed: bool,
    ) -> Result<usize> {
        let max = self.config.max_particles;
        if self.particles.len() >= max {
            debug!("add_particle rejected: scene holds {max} particles");
            return Err(SimError::CapacityExceeded { max });
        }
        let id = self.particles.len();
        self.particles
            .push(Particle::new(id, pos, vel, charge, mass, radius, fixed, &self.config.bounds));
        Ok(id)
    }

    /// Remove all particles and reset clock, energies, selection and forces.
    pub fn clear(&mut self) {
        self.particles.clear();
        self.selected = None;
        self.substeps_elapsed = 0;
        self.energies = Energies::default();
        self.last_forces = None;
    }

    /// One mobile particle at the centre with negative default charge.
    pub fn reset_to_default_scene(&mut self) {
        self.clear();
        let bounds = self.config.bounds;
        let center = self.world.center();
        // An empty scene always has room unless the cap is zero
        if self
            .add_particle(
                center,
                DVec2::zero(),
                -bounds.charge.default,
                bounds.mass.default,
                bounds.radius.default,
                false,
            )
            .is_err()
        {
            warn!("default scene left empty: max_particles is 0");
        }
        self.recompute_energies();
        info!("scene reset to default ({} particle)", self.particles.len());
    }

    /// Select the nearest particle within the pick margin of `point`, or clear
    /// the selection when none qualifies.
    pub fn select_near(&mut self, point: DVec2) -> Option<usize> {
        let margin = self.config.selection_margin_m();
        let mut best: Option<(usize, f64)> = None;
        for (i, p) in self.particles.iter().enumerate() {
            let dist = self.world.distance(point, p.pos);
            let reach = margin.max(p.radius + margin);
            if dist <= reach && best.map_or(true, |(_, d)| dist < d) {
                best = Some((i, dist));
            }
        }
        self.selected = best.map(|(i, _)| i);
        self.selected
    }

    fn selected_mut(&mut self) -> Result<&mut Particle> {
        let index = self.selected.ok_or(SimError::NoSelection)?;
        self.particles.get_mut(index).ok_or(SimError::NoSelection)
    }

    pub fn adjust_selected_charge(&mut self, delta: f64) -> Result<()> {
        let range = self.config.bounds.charge;
        let p = self.selected_mut()?;
        p.charge = range.clamp(p.charge + delta);
        Ok(())
    }

    pub fn adjust_selected_mass(&mut self, delta: f64) -> Result<()> {
        let range = self.config.bounds.mass;
        let p = self.selected_mut()?;
        p.mass = range.clamp(p.mass + delta);
        Ok(())
    }

    pub fn adjust_selected_radius(&mut self, delta: f64) -> Result<()> {
        let range = self.config.bounds.radius;
        let p = self.selected_mut()?;
        p.radius = range.clamp(p.radius + delta);
        Ok(())
    }

    pub fn toggle_selected_fixed(&mut self) -> Result<()> {
        let p = self.selected_mut()?;
        p.fixed = !p.fixed;
        Ok(())
    }

    /// Delete the selected particle; remaining ids are reassigned in order.
    pub fn remove_selected(&mut self) -> Result<()> {
        let index = self.selected.ok_or(SimError::NoSelection)?;
        if index >= self.particles.len() {
            self.selected = None;
            return Err(SimError::NoSelection);
        }
        self.particles.remove(index);
        self.selected = None;
        for (id, p) in self.particles.iter_mut().enumerate() {
            p.id = id;
        }
        Ok(())
    }

    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub fn set_speed_index(&mut self, index: usize) -> Result<()> {
        if index >= self.config.speed_multipliers.len() {
            return Err(SimError::InvalidSpeedIndex(index));
        }
        self.speed_index = index;
        Ok(())
    }

    // ---- validation scenario -------------------------------------------

    /// Reset to a single probe particle under the configured uniform field and
    /// start comparing it against the closed-form trajectory.
    pub fn start_validation(&mut self) {
        let was_active = self.validation.is_active();
        self.clear();
        let bounds = self.config.bounds;
        let center = self.world.center();
        let added = self.add_particle(
            center,
            DVec2::zero(),
            bounds.charge.default,
            bounds.mass.default,
            bounds.radius.default,
            false,
        );
        if let Err(err) = added {
            warn!("validation not started: {err}");
            self.stop_validation();
            return;
        }
        if !was_active {
            self.paused_before_validation = self.paused;
        }
        self.selected = Some(0);

        let field = self.config.uniform_field_vector();
        self.forces.set_uniform_field(Some(field));
        self.validation.start(
            &self.particles[0],
            field,
            self.config.validation_duration,
            self.config.frame_interval(),
            &self.world,
        );
        self.recompute_energies();
        self.paused = false;
        info!(
            "validation started: E = ({:.1}, {:.1}) N/C, a = ({:.4}, {:.4}) m/s², duration {:.1} s",
            field.x,
            field.y,
            self.validation.acceleration().x,
            self.validation.acceleration().y,
            self.validation.duration()
        );
    }

    /// Drop validation state and the uniform field; restore the earlier pause flag.
    pub fn stop_validation(&mut self) {
        if !self.validation.is_active() {
            return;
        }
        self.validation.stop();
        self.forces.set_uniform_field(None);
        self.paused = self.paused_before_validation;
        info!("validation stopped");
    }

    fn update_validation(&mut self) {
        if self.validation.phase() != ValidationPhase::Running {
            return;
        }
        let clock = self.clock();
        match self.validation.update(clock, self.particles.first(), &self.world) {
            Ok(true) => {
                self.paused = true;
                if let Some(outcome) = self.validation.outcome() {
                    info!(
                        "validation finished at t = {:.3} s: theory pos ({:.6}, {:.6}) vel ({:.6}, {:.6}); \
                         sim pos ({:.6}, {:.6}) vel ({:.6}, {:.6}); |dx| = {:.3e} m, |dv| = {:.3e} m/s",
                        outcome.time,
                        outcome.theory_pos.x,
                        outcome.theory_pos.y,
                        outcome.theory_vel.x,
                        outcome.theory_vel.y,
                        outcome.sim_pos.x,
                        outcome.sim_pos.y,
                        outcome.sim_vel.x,
                        outcome.sim_vel.y,
                        outcome.pos_error,
                        outcome.vel_error
                    );
                }
            }
            Ok(false) => {}
            Err(err) => warn!("validation update skipped: {err}"),
        }
    }
}
