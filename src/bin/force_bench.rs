/// Times the scalar and parallel force kernels on a random scene
use std::env;
use std::time::Instant;

use electrosim::config::{PropertyBounds, SimConfig};
use electrosim::particle::Particle;
use electrosim::simulation::forces::{ForceEvaluator, ForceParams, ParallelEvaluator, ScalarEvaluator};
use electrosim::simulation::World;
use log::info;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use ultraviolet::DVec2;

const DEFAULT_COUNT: usize = 100;
const PASSES: usize = 200;
const SEED: u64 = 0xE1EC;

fn scatter(count: usize, world: &World, bounds: &PropertyBounds) -> Vec<Particle> {
    let mut rng = StdRng::seed_from_u64(SEED);
    (0..count)
        .map(|id| {
            let pos = DVec2::new(
                rng.random_range(0.0..world.size.x),
                rng.random_range(0.0..world.size.y),
            );
            let vel = DVec2::new(rng.random_range(-1.0..1.0), rng.random_range(-1.0..1.0));
            let charge = rng.random_range(bounds.charge.min..=bounds.charge.max) * 0.2;
            let mass = rng.random_range(bounds.mass.min..=bounds.mass.max);
            let radius = rng.random_range(bounds.radius.min..=bounds.radius.max);
            Particle::new(id, pos, vel, charge, mass, radius, false, bounds)
        })
        .collect()
}

fn time_kernel(kernel: &dyn ForceEvaluator, particles: &[Particle], world: &World, params: &ForceParams) -> Vec<DVec2> {
    let mut out = Vec::with_capacity(particles.len());
    let start = Instant::now();
    for _ in 0..PASSES {
        kernel.accelerations_into(particles, world, params, &mut out);
    }
    let elapsed = start.elapsed();
    info!(
        "{:<8} {} passes in {:?} ({:?}/pass)",
        kernel.name(),
        PASSES,
        elapsed,
        elapsed / PASSES as u32
    );
    out
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let count = env::args()
        .nth(1)
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(DEFAULT_COUNT);
    let config = SimConfig::default();
    let world = World::new(config.world_width, config.world_height);
    let params = ForceParams::from_config(&config);
    let particles = scatter(count, &world, &config.bounds);
    info!("{count} particles, {} rayon thread(s)", rayon::current_num_threads());

    let scalar = time_kernel(&ScalarEvaluator, &particles, &world, &params);
    let parallel = time_kernel(&ParallelEvaluator, &particles, &world, &params);

    let max_diff = scalar
        .iter()
        .zip(&parallel)
        .map(|(a, b)| (*a - *b).mag())
        .fold(0.0, f64::max);
    info!("max |a_scalar - a_parallel| = {max_diff:.3e} m/s²");
}
