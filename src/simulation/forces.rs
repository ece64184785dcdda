//! Force calculation functions for the particle simulation.
//!
//! Provides the softened Coulomb acceleration pass on the periodic domain, the
//! energy sums used for per-frame bookkeeping, and field evaluation at an
//! arbitrary point (used by the field sampler).
//!
//! Two softening conventions coexist:
//! - particle-particle softening uses the combined contact radius, `ε = f·(rᵢ + rⱼ)`;
//! - point-field softening uses the source radius only, `ε = f·r_src`.
//!
//! Potential energy does not soften at all; it floors the separation at `1e-6` m.

use rayon::prelude::*;
use ultraviolet::DVec2;

use super::World;
use crate::config::{ForceKernel, SimConfig};
use crate::particle::Particle;
use crate::profile_scope;

/// Separation floor used by the potential energy sum.
pub const POTENTIAL_MIN_SEPARATION: f64 = 1e-6;

/// Parameters read by every force pass. Owned by the caller, never global.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ForceParams {
    pub coulomb_constant: f64,
    pub softening_fraction: f64,
    /// Optional uniform external field (N/C) added as `qE/m`.
    pub uniform_field: Option<DVec2>,
}

impl ForceParams {
    pub fn from_config(config: &SimConfig) -> Self {
        Self {
            coulomb_constant: config.coulomb_constant,
            softening_fraction: config.softening_fraction,
            uniform_field: None,
        }
    }
}

/// Evaluates accelerations for every particle. Implementations must agree up
/// to floating-point summation order.
pub trait ForceEvaluator: Send + Sync {
    fn name(&self) -> &'static str;

    /// Fill `out` with one acceleration (m/s²) per particle, in particle order.
    fn accelerations_into(
        &self,
        particles: &[Particle],
        world: &World,
        params: &ForceParams,
        out: &mut Vec<DVec2>,
    );

    fn accelerations(&self, particles: &[Particle], world: &World, params: &ForceParams) -> Vec<DVec2> {
        let mut out = Vec::with_capacity(particles.len());
        self.accelerations_into(particles, world, params, &mut out);
        out
    }
}

/// Single-threaded reference kernel.
#[derive(Clone, Copy, Debug, Default)]
pub struct ScalarEvaluator;

impl ForceEvaluator for ScalarEvaluator {
    fn name(&self) -> &'static str {
        "scalar"
    }

    fn accelerations_into(
        &self,
        particles: &[Particle],
        world: &World,
        params: &ForceParams,
        out: &mut Vec<DVec2>,
    ) {
        out.clear();
        out.extend((0..particles.len()).map(|i| acceleration_on(i, particles, world, params)));
    }
}

/// rayon kernel: each target writes only its own slot.
#[derive(Clone, Copy, Debug, Default)]
pub struct ParallelEvaluator;

impl ForceEvaluator for ParallelEvaluator {
    fn name(&self) -> &'static str {
        "parallel"
    }

    fn accelerations_into(
        &self,
        particles: &[Particle],
        world: &World,
        params: &ForceParams,
        out: &mut Vec<DVec2>,
    ) {
        (0..particles.len())
            .into_par_iter()
            .map(|i| acceleration_on(i, particles, world, params))
            .collect_into_vec(out);
    }
}

pub fn evaluator_for(kernel: ForceKernel) -> Box<dyn ForceEvaluator> {
    match kernel {
        ForceKernel::Parallel => Box::new(ParallelEvaluator),
        ForceKernel::Scalar => Box::new(ScalarEvaluator),
    }
}

/// Force parameters bound to the kernel picked at startup.
pub struct ForceModel {
    pub params: ForceParams,
    evaluator: Box<dyn ForceEvaluator>,
}

impl ForceModel {
    pub fn new(params: ForceParams, kernel: ForceKernel) -> Self {
        Self {
            params,
            evaluator: evaluator_for(kernel),
        }
    }

    pub fn from_config(config: &SimConfig) -> Self {
        Self::new(ForceParams::from_config(config), config.force_kernel)
    }

    pub fn kernel_name(&self) -> &'static str {
        self.evaluator.name()
    }

    pub fn set_uniform_field(&mut self, field: Option<DVec2>) {
        self.params.uniform_field = field;
    }

    pub fn accelerations(&self, particles: &[Particle], world: &World) -> Vec<DVec2> {
        profile_scope!("forces_accelerations");
        self.evaluator.accelerations(particles, world, &self.params)
    }

    pub fn accelerations_into(&self, particles: &[Particle], world: &World, out: &mut Vec<DVec2>) {
        profile_scope!("forces_accelerations");
        self.evaluator.accelerations_into(particles, world, &self.params, out);
    }
}

/// Softened Coulomb force (N) on `target` due to `source`.
///
/// A zero denominator (coincident centres with zero softening) contributes nothing.
#[inline]
pub fn pair_force(target: &Particle, source: &Particle, world: &World, params: &ForceParams) -> DVec2 {
    // Displacement from source to target
    let r_vec = world.min_image(source.pos, target.pos);
    let eps = params.softening_fraction * (target.radius + source.radius);
    let s = r_vec.mag_sq() + eps * eps;
    let den = s * s.sqrt();
    if den == 0.0 {
        return DVec2::zero();
    }
    r_vec * (params.coulomb_constant * target.charge * source.charge / den)
}

/// Acceleration of particle `i`. Fixed, massless and neutral particles get zero.
#[inline]
fn acceleration_on(i: usize, particles: &[Particle], world: &World, params: &ForceParams) -> DVec2 {
    let target = &particles[i];
    if !target.is_mobile_target() {
        return DVec2::zero();
    }
    let mut force = DVec2::zero();
    for (j, source) in particles.iter().enumerate() {
        if i == j || source.charge == 0.0 {
            continue;
        }
        force += pair_force(target, source, world, params);
    }
    if let Some(field) = params.uniform_field {
        force += field * target.charge;
    }
    force / target.mass
}

/// Sum of `½mv²` over non-fixed particles.
pub fn kinetic_energy(particles: &[Particle]) -> f64 {
    particles.iter().map(Particle::kinetic_energy).sum()
}

/// Pairwise Coulomb potential with a hard separation floor (no softening).
pub fn potential_energy(particles: &[Particle], world: &World, coulomb_constant: f64) -> f64 {
    let mut energy = 0.0;
    for (i, pi) in particles.iter().enumerate() {
        for pj in &particles[i + 1..] {
            let r = world.distance(pi.pos, pj.pos).max(POTENTIAL_MIN_SEPARATION);
            energy += coulomb_constant * pi.charge * pj.charge / r;
        }
    }
    energy
}

/// Electric field (N/C) at `point`, softened per source radius.
pub fn field_at(
    point: DVec2,
    particles: &[Particle],
    world: &World,
    coulomb_constant: f64,
    softening_fraction: f64,
) -> DVec2 {
    let mut field = DVec2::zero();
    for source in particles {
        if source.charge == 0.0 {
            continue;
        }
        let r_vec = world.min_image(source.pos, point);
        let eps = softening_fraction * source.radius;
        let s = r_vec.mag_sq() + eps * eps;
        let den = s * s.sqrt();
        if den == 0.0 {
            continue;
        }
        field += r_vec * (coulomb_constant * source.charge / den);
    }
    field
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PropertyBounds, K_COULOMB};
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn world() -> World {
        World::new(16.0, 10.0)
    }

    fn params() -> ForceParams {
        ForceParams {
            coulomb_constant: K_COULOMB,
            softening_fraction: 0.1,
            uniform_field: None,
        }
    }

    fn particle(pos: DVec2, charge: f64) -> Particle {
        Particle::new(0, pos, DVec2::zero(), charge, 0.02, 0.1, false, &PropertyBounds::default())
    }

    #[test]
    fn like_charges_repel() {
        let ps = vec![particle(DVec2::new(7.0, 5.0), 5e-6), particle(DVec2::new(9.0, 5.0), 5e-6)];
        let acc = ScalarEvaluator.accelerations(&ps, &world(), &params());
        assert!(acc[0].x < 0.0);
        assert!(acc[1].x > 0.0);
        assert_relative_eq!(acc[0].x, -acc[1].x, max_relative = 1e-12);
        assert_eq!(acc[0].y, 0.0);
    }

    #[test]
    fn pair_force_matches_softened_coulomb() {
        let a = particle(DVec2::new(7.0, 5.0), 5e-6);
        let b = particle(DVec2::new(8.0, 5.0), -3e-6);
        let f = pair_force(&a, &b, &world(), &params());
        let eps: f64 = 0.1 * 0.2;
        let expected = K_COULOMB * 5e-6 * -3e-6 * -1.0 / (1.0 + eps * eps).powf(1.5);
        assert_relative_eq!(f.x, expected, max_relative = 1e-12);
    }

    #[test]
    fn force_uses_minimum_image_across_seam() {
        let ps = vec![particle(DVec2::new(0.5, 5.0), 5e-6), particle(DVec2::new(15.5, 5.0), 5e-6)];
        let acc = ScalarEvaluator.accelerations(&ps, &world(), &params());
        // Neighbour sits 1 m to the left through the wrap, so 0 is pushed right
        assert!(acc[0].x > 0.0);
        assert!(acc[1].x < 0.0);
    }

    #[test]
    fn fixed_and_neutral_targets_get_zero_but_still_act() {
        let mut fixed = particle(DVec2::new(7.0, 5.0), 5e-6);
        fixed.fixed = true;
        let neutral = particle(DVec2::new(7.0, 6.0), 0.0);
        let mobile = particle(DVec2::new(8.0, 5.0), 5e-6);
        let ps = vec![fixed, neutral, mobile];
        let acc = ScalarEvaluator.accelerations(&ps, &world(), &params());
        assert_eq!(acc[0], DVec2::zero());
        assert_eq!(acc[1], DVec2::zero());
        assert!(acc[2].x > 0.0);
        assert_eq!(acc[2].y, 0.0);
    }

    #[test]
    fn coincident_particles_without_softening_stay_finite() {
        let ps = vec![particle(DVec2::new(7.0, 5.0), 5e-6), particle(DVec2::new(7.0, 5.0), -5e-6)];
        let p = ForceParams { softening_fraction: 0.0, ..params() };
        let acc = ScalarEvaluator.accelerations(&ps, &world(), &p);
        assert_eq!(acc, vec![DVec2::zero(), DVec2::zero()]);
        let e = field_at(DVec2::new(7.0, 5.0), &ps, &world(), K_COULOMB, 0.0);
        assert_eq!(e, DVec2::zero());
    }

    #[test]
    fn uniform_field_adds_q_e_over_m() {
        let ps = vec![particle(DVec2::new(8.0, 5.0), 5e-6)];
        let p = ForceParams {
            uniform_field: Some(DVec2::new(500.0, 0.0)),
            ..params()
        };
        let acc = ScalarEvaluator.accelerations(&ps, &world(), &p);
        assert_relative_eq!(acc[0].x, 0.125, max_relative = 1e-12);
        assert_eq!(acc[0].y, 0.0);
    }

    #[test]
    fn parallel_kernel_agrees_with_scalar() {
        let mut rng = StdRng::seed_from_u64(42);
        let ps: Vec<Particle> = (0..60)
            .map(|_| {
                let pos = DVec2::new(rng.random_range(0.0..16.0), rng.random_range(0.0..10.0));
                let q = rng.random_range(-20e-6..20e-6);
                particle(pos, q)
            })
            .collect();
        let a = ScalarEvaluator.accelerations(&ps, &world(), &params());
        let b = ParallelEvaluator.accelerations(&ps, &world(), &params());
        for (x, y) in a.iter().zip(&b) {
            assert_relative_eq!(x.x, y.x, max_relative = 1e-9, epsilon = 1e-9);
            assert_relative_eq!(x.y, y.y, max_relative = 1e-9, epsilon = 1e-9);
        }
    }

    #[test]
    fn potential_floors_separation_without_softening() {
        let ps = vec![particle(DVec2::new(7.0, 5.0), 5e-6), particle(DVec2::new(9.0, 5.0), 5e-6)];
        let u = potential_energy(&ps, &world(), K_COULOMB);
        assert_relative_eq!(u, K_COULOMB * 25e-12 / 2.0, max_relative = 1e-12);

        let coincident = vec![particle(DVec2::new(7.0, 5.0), 5e-6), particle(DVec2::new(7.0, 5.0), 5e-6)];
        let u = potential_energy(&coincident, &world(), K_COULOMB);
        assert_relative_eq!(u, K_COULOMB * 25e-12 / POTENTIAL_MIN_SEPARATION, max_relative = 1e-12);
    }

    #[test]
    fn field_softening_uses_source_radius_only() {
        let ps = vec![particle(DVec2::new(8.0, 5.0), 5e-6)];
        let e = field_at(DVec2::new(9.0, 5.0), &ps, &world(), K_COULOMB, 0.1);
        let eps: f64 = 0.1 * 0.1;
        let expected = K_COULOMB * 5e-6 / (1.0 + eps * eps).powf(1.5);
        assert_relative_eq!(e.x, expected, max_relative = 1e-12);
        assert_eq!(e.y, 0.0);
    }

    #[test]
    fn kinetic_energy_skips_fixed() {
        let mut a = particle(DVec2::new(1.0, 1.0), 1e-6);
        a.vel = DVec2::new(1.0, 0.0);
        let mut b = a.clone();
        b.fixed = true;
        assert_relative_eq!(kinetic_energy(&[a, b]), 0.01, max_relative = 1e-12);
    }
}
