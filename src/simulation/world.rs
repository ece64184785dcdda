// simulation/world.rs
// Periodic 2D domain: wrap-around and minimum-image displacement

use serde::{Deserialize, Serialize};
use ultraviolet::DVec2;

/// A torus of size `(Lx, Ly)` in meters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct World {
    pub size: DVec2,
}

impl World {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            size: DVec2::new(width, height),
        }
    }

    pub fn center(&self) -> DVec2 {
        self.size * 0.5
    }

    /// Shortest displacement from `from` to `to` across the wrap.
    ///
    /// Each component lies in `[-L/2, L/2]` and `min_image(a, b) == -min_image(b, a)`.
    #[inline]
    pub fn min_image(&self, from: DVec2, to: DVec2) -> DVec2 {
        DVec2::new(
            min_image_axis(to.x - from.x, self.size.x),
            min_image_axis(to.y - from.y, self.size.y),
        )
    }

    pub fn distance(&self, a: DVec2, b: DVec2) -> f64 {
        self.min_image(a, b).mag()
    }

    /// Map a position into `[0, Lx) × [0, Ly)`.
    #[inline]
    pub fn wrap(&self, pos: DVec2) -> DVec2 {
        DVec2::new(wrap_axis(pos.x, self.size.x), wrap_axis(pos.y, self.size.y))
    }
}

#[inline]
fn min_image_axis(delta: f64, length: f64) -> f64 {
    // `round` is half-away-from-zero, so the result stays antisymmetric
    delta - length * (delta / length).round()
}

#[inline]
fn wrap_axis(value: f64, length: f64) -> f64 {
    let wrapped = value.rem_euclid(length);
    // rem_euclid of a tiny negative value can round up to `length`
    if wrapped >= length {
        0.0
    } else {
        wrapped
    }
}
