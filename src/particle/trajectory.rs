// particle/trajectory.rs
// Bounded, time-ordered position history used for trail rendering

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use ultraviolet::DVec2;

/// Hard cap on stored samples regardless of the retention window.
pub const TRAIL_MAX_SAMPLES: usize = 50_000;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrailSample {
    pub time: f64,
    pub pos: DVec2,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    samples: VecDeque<TrailSample>,
}

impl Trajectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn last_time(&self) -> Option<f64> {
        self.samples.back().map(|s| s.time)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrailSample> + '_ {
        self.samples.iter()
    }

    pub fn push(&mut self, time: f64, pos: DVec2) {
        if self.samples.len() == TRAIL_MAX_SAMPLES {
            self.samples.pop_front();
        }
        self.samples.push_back(TrailSample { time, pos });
    }

    /// Drop samples older than `window` seconds relative to `now`.
    pub fn prune(&mut self, now: f64, window: f64) {
        while let Some(front) = self.samples.front() {
            if now - front.time > window {
                self.samples.pop_front();
            } else {
                break;
            }
        }
    }

    /// Append `pos` if the newest sample is at least `interval` old (or there
    /// is none), then prune to the retention window.
    pub fn sample(&mut self, now: f64, pos: DVec2, interval: f64, window: f64) {
        match self.last_time() {
            None => {
                self.push(now, pos);
                return;
            }
            Some(last) if now - last >= interval => self.push(now, pos),
            Some(_) => {}
        }
        self.prune(now, window);
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}
