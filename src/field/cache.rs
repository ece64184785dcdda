// field/cache.rs
// Fixed-capacity LRU of field samplers keyed by rounded geometry

use std::collections::VecDeque;

use super::FieldSampler;
use crate::simulation::World;

/// Rounded parameters identifying one sampler grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SamplerKey {
    world_um: (i64, i64),
    pixels_per_km: i64,
    grid_step_px: u32,
    softening_micro: i64,
}

impl SamplerKey {
    pub fn new(world: &World, pixels_per_meter: f64, grid_step_px: u32, softening_fraction: f64) -> Self {
        Self {
            world_um: (
                (world.size.x * 1e6).round() as i64,
                (world.size.y * 1e6).round() as i64,
            ),
            pixels_per_km: (pixels_per_meter * 1000.0).round() as i64,
            grid_step_px,
            softening_micro: (softening_fraction * 1e6).round() as i64,
        }
    }
}

/// Least recently used entry sits at the front.
#[derive(Debug)]
pub struct SamplerCache {
    capacity: usize,
    entries: VecDeque<(SamplerKey, FieldSampler)>,
}

impl SamplerCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: VecDeque::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, key: &SamplerKey) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Sampler for these parameters, built on a miss. A hit becomes most
    /// recent; a miss at capacity evicts the least recent entry.
    pub fn get_or_create(
        &mut self,
        world: &World,
        pixels_per_meter: f64,
        grid_step_px: u32,
        softening_fraction: f64,
    ) -> &mut FieldSampler {
        let key = SamplerKey::new(world, pixels_per_meter, grid_step_px, softening_fraction);
        let entry = match self.entries.iter().position(|(k, _)| *k == key) {
            Some(index) => self.entries.remove(index),
            None => None,
        };
        let entry = match entry {
            Some(entry) => entry,
            None => {
                if self.entries.len() >= self.capacity {
                    if let Some((evicted, _)) = self.entries.pop_front() {
                        log::debug!("field sampler cache evicted {:?}", evicted);
                    }
                }
                (
                    key,
                    FieldSampler::new(*world, pixels_per_meter, grid_step_px, softening_fraction),
                )
            }
        };
        self.entries.push_back(entry);
        let last = self.entries.len() - 1;
        &mut self.entries[last].1
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
