//! Headless electrostatics runner.
//!
//! Loads `electrosim.toml` (or the path given as the first argument), steps the
//! scene and logs energies. `--validate` runs the uniform-field check until it
//! finishes; `--json` prints the final frame snapshot to stdout.

use std::env;
use std::path::Path;

use electrosim::field::SamplerCache;
use electrosim::init_config::InitConfig;
use electrosim::simulation::RunState;
use log::{error, info, warn};

const DEFAULT_CONFIG_PATH: &str = "electrosim.toml";
const DEFAULT_FRAMES: usize = 600;
/// Upper bound on frames for a validation run.
const VALIDATION_FRAME_LIMIT: usize = 100_000;

struct Options {
    config_path: Option<String>,
    frames: usize,
    validate: bool,
    json: bool,
}

fn parse_args() -> Options {
    let mut opts = Options {
        config_path: None,
        frames: DEFAULT_FRAMES,
        validate: false,
        json: false,
    };
    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--json" => opts.json = true,
            "--validate" => opts.validate = true,
            "--frames" => match args.next().map(|v| v.parse::<usize>()) {
                Some(Ok(n)) => opts.frames = n,
                _ => warn!("--frames expects a count; keeping {}", opts.frames),
            },
            other if other.starts_with("--") => warn!("ignoring unknown option {other}"),
            path => opts.config_path = Some(path.to_string()),
        }
    }
    opts
}

fn load_init(path: Option<&str>) -> InitConfig {
    let path = path.unwrap_or(DEFAULT_CONFIG_PATH);
    if !Path::new(path).exists() {
        warn!("{path} not found, using built-in defaults");
        return InitConfig::default();
    }
    match InitConfig::load_from_file(path) {
        Ok(init) => {
            info!("loaded {path}");
            init
        }
        Err(err) => {
            error!("failed to load {path}: {err}; using built-in defaults");
            InitConfig::default()
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let opts = parse_args();
    let mut init = load_init(opts.config_path.as_deref());
    init.validation |= opts.validate;
    let mut sim = init.build();
    info!(
        "{} particle(s), dt = {} s, {} substeps/frame",
        sim.particles.len(),
        sim.config.dt,
        sim.substeps_per_frame()
    );

    let frame_limit = if init.validation { VALIDATION_FRAME_LIMIT } else { opts.frames };
    let report_every = sim.config.display_fps.max(1) as usize;
    let mut frames = 0;
    while frames < frame_limit {
        sim.step_frame();
        frames += 1;
        if sim.run_state() == RunState::ValidationFinished {
            break;
        }
        if frames % report_every == 0 {
            let e = sim.energies();
            info!(
                "t = {:>7.3} s  N = {:>3}  KE = {:.6e} J  PE = {:.6e} J  E = {:.6e} J",
                sim.clock(),
                sim.particles.len(),
                e.kinetic,
                e.potential,
                e.total
            );
        }
    }

    let mut cache = SamplerCache::new(sim.config.sampler_cache_capacity);
    let sampler = sim.sample_field(&mut cache);
    let peak = sampler.iter().map(|p| p.field.mag()).fold(0.0, f64::max);
    info!(
        "field grid {}x{}, peak |E| = {:.3e} N/C",
        sampler.cols(),
        sampler.rows(),
        peak
    );

    let diagnostics = sim.diagnostics();
    info!(
        "finished after {} frame(s): {} merge(s), {} non-finite rejection(s)",
        frames, diagnostics.merges, diagnostics.non_finite_rejections
    );

    #[cfg(feature = "profiling")]
    electrosim::PROFILER.lock().print_and_clear();

    if opts.json {
        match serde_json::to_string_pretty(&sim.snapshot()) {
            Ok(json) => println!("{json}"),
            Err(err) => error!("failed to serialize snapshot: {err}"),
        }
    }
}
