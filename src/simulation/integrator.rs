// simulation/integrator.rs
// Classical fixed-step RK4 for mobile particles

use ultraviolet::DVec2;

use super::forces::ForceModel;
use super::World;
use crate::particle::Particle;
use crate::profile_scope;

/// Outcome of one integration substep.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StepReport {
    /// Mobile particles whose RK4 result was non-finite and was discarded.
    pub non_finite: usize,
}

/// Advance every non-fixed particle by `dt` with classical RK4.
///
/// Stage accelerations are evaluated with the whole set moved to the stage's
/// trial state; fixed particles keep their original position and velocity at
/// every stage. Only non-fixed particles receive the combined result, and a
/// non-finite result leaves that particle at its previous state.
pub fn rk4_step(particles: &mut [Particle], world: &World, dt: f64, forces: &ForceModel) -> StepReport {
    profile_scope!("integrator_rk4");
    let n = particles.len();
    if n == 0 {
        return StepReport::default();
    }

    let pos0: Vec<DVec2> = particles.iter().map(|p| p.pos).collect();
    let vel0: Vec<DVec2> = particles.iter().map(|p| p.vel).collect();

    let mut acc = Vec::with_capacity(n);
    let mut eval = |particles: &mut [Particle], pos: &[DVec2], vel: &[DVec2]| -> Vec<DVec2> {
        set_trial_state(particles, pos, vel, &pos0, &vel0);
        forces.accelerations_into(particles, world, &mut acc);
        acc.clone()
    };

    // k1
    let k1_x = vel0.clone();
    let k1_v = eval(particles, &pos0, &vel0);

    // k2
    let (pos2, vel2) = offset(&pos0, &vel0, &k1_x, &k1_v, 0.5 * dt);
    let k2_v = eval(particles, &pos2, &vel2);
    let k2_x = vel2;

    // k3
    let (pos3, vel3) = offset(&pos0, &vel0, &k2_x, &k2_v, 0.5 * dt);
    let k3_v = eval(particles, &pos3, &vel3);
    let k3_x = vel3;

    // k4
    let (pos4, vel4) = offset(&pos0, &vel0, &k3_x, &k3_v, dt);
    let k4_v = eval(particles, &pos4, &vel4);
    let k4_x = vel4;

    let mut report = StepReport::default();
    let w = dt / 6.0;
    for (i, p) in particles.iter_mut().enumerate() {
        p.pos = pos0[i];
        p.vel = vel0[i];
        if p.fixed {
            continue;
        }
        let pos = pos0[i] + (k1_x[i] + 2.0 * k2_x[i] + 2.0 * k3_x[i] + k4_x[i]) * w;
        let vel = vel0[i] + (k1_v[i] + 2.0 * k2_v[i] + 2.0 * k3_v[i] + k4_v[i]) * w;
        if is_finite(pos) && is_finite(vel) {
            p.pos = pos;
            p.vel = vel;
        } else {
            report.non_finite += 1;
        }
    }
    report
}

/// Trial state for `base + slope_x·h`, `base_v + slope_v·h`.
fn offset(
    pos0: &[DVec2],
    vel0: &[DVec2],
    slope_x: &[DVec2],
    slope_v: &[DVec2],
    h: f64,
) -> (Vec<DVec2>, Vec<DVec2>) {
    let pos = pos0.iter().zip(slope_x).map(|(p, k)| *p + *k * h).collect();
    let vel = vel0.iter().zip(slope_v).map(|(v, k)| *v + *k * h).collect();
    (pos, vel)
}

fn set_trial_state(particles: &mut [Particle], pos: &[DVec2], vel: &[DVec2], pos0: &[DVec2], vel0: &[DVec2]) {
    for (i, p) in particles.iter_mut().enumerate() {
        if p.fixed {
            p.pos = pos0[i];
            p.vel = vel0[i];
        } else {
            p.pos = pos[i];
            p.vel = vel[i];
        }
    }
}

#[inline]
fn is_finite(v: DVec2) -> bool {
    v.x.is_finite() && v.y.is_finite()
}
