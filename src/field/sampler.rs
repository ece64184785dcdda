// field/sampler.rs
// Field vectors on a pixel grid, refreshed once per frame

use rayon::prelude::*;
use ultraviolet::DVec2;

use crate::particle::Particle;
use crate::profile_scope;
use crate::simulation::forces;
use crate::simulation::World;

/// One grid sample: pixel centre, the same point in meters, and E (N/C).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FieldPoint {
    pub center_px: (u32, u32),
    pub center_m: DVec2,
    pub field: DVec2,
}

/// Grid of sample points for one (world, scale, pitch, softening) combination.
#[derive(Clone, Debug)]
pub struct FieldSampler {
    world: World,
    pixels_per_meter: f64,
    grid_step_px: u32,
    softening_fraction: f64,
    rows: usize,
    cols: usize,
    centers_m: Vec<DVec2>,
    vectors: Vec<DVec2>,
}

impl FieldSampler {
    pub fn new(world: World, pixels_per_meter: f64, grid_step_px: u32, softening_fraction: f64) -> Self {
        let (rows, cols) = grid_dims(&world, pixels_per_meter, grid_step_px);
        let step = grid_step_px.max(1);
        let mut centers_m = Vec::with_capacity(rows * cols);
        for r in 0..rows {
            for c in 0..cols {
                let (x, y) = cell_center_px(step, r, c);
                centers_m.push(DVec2::new(x as f64, y as f64) / pixels_per_meter);
            }
        }
        Self {
            world,
            pixels_per_meter,
            grid_step_px: step,
            softening_fraction,
            rows,
            cols,
            centers_m,
            vectors: Vec::new(),
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn len(&self) -> usize {
        self.centers_m.len()
    }

    pub fn is_empty(&self) -> bool {
        self.centers_m.is_empty()
    }

    pub fn softening_fraction(&self) -> f64 {
        self.softening_fraction
    }

    pub fn pixels_per_meter(&self) -> f64 {
        self.pixels_per_meter
    }

    /// Refresh every sample. With `uniform_override` set, every sample reports
    /// that field instead of the particle field.
    pub fn recompute(&mut self, particles: &[Particle], coulomb_constant: f64, uniform_override: Option<DVec2>) {
        profile_scope!("field_sampler");
        if let Some(field) = uniform_override {
            self.vectors.clear();
            self.vectors.resize(self.centers_m.len(), field);
            return;
        }
        let world = self.world;
        let softening = self.softening_fraction;
        self.centers_m
            .par_iter()
            .map(|&point| forces::field_at(point, particles, &world, coulomb_constant, softening))
            .collect_into_vec(&mut self.vectors);
    }

    /// Samples from the last `recompute`, row-major. Empty before the first one.
    pub fn iter(&self) -> impl Iterator<Item = FieldPoint> + '_ {
        let step = self.grid_step_px;
        let cols = self.cols.max(1);
        self.centers_m
            .iter()
            .zip(&self.vectors)
            .enumerate()
            .map(move |(k, (&center_m, &field))| FieldPoint {
                center_px: cell_center_px(step, k / cols, k % cols),
                center_m,
                field,
            })
    }
}

/// `(rows, cols)` of cells whose centres fit inside the world in pixels.
fn grid_dims(world: &World, pixels_per_meter: f64, grid_step_px: u32) -> (usize, usize) {
    let step = grid_step_px.max(1) as i64;
    let width_px = (world.size.x * pixels_per_meter).round() as i64;
    let height_px = (world.size.y * pixels_per_meter).round() as i64;
    let count = |extent: i64| {
        let span = extent - step / 2;
        if span < 0 {
            0
        } else {
            (span / step + 1) as usize
        }
    };
    (count(height_px), count(width_px))
}

#[inline]
fn cell_center_px(step: u32, row: usize, col: usize) -> (u32, u32) {
    let half = step / 2;
    (half + col as u32 * step, half + row as u32 * step)
}
