// simulation/collision.rs
// Contact handling: opposite-charge merges, then elastic separation

use ultraviolet::DVec2;

use super::World;
use crate::particle::Particle;
use crate::profile_scope;

/// Coefficient of restitution for the elastic phase.
pub const RESTITUTION: f64 = 1.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CollisionReport {
    pub merges: usize,
    /// Overlapping pairs seen by the elastic phase.
    pub contacts: usize,
    /// Contacts that received a normal impulse.
    pub impulses: usize,
}

/// Run the merge phase then the elastic phase on the current particle order.
pub fn resolve_collisions(particles: &mut Vec<Particle>, world: &World) -> CollisionReport {
    profile_scope!("collision");
    if particles.len() <= 1 {
        return CollisionReport::default();
    }
    let merges = merge_phase(particles, world);
    let (contacts, impulses) = elastic_phase(particles, world);
    CollisionReport {
        merges,
        contacts,
        impulses,
    }
}

/// Minimum-image displacement `i -> j` when the pair overlaps.
#[inline]
fn overlap(a: &Particle, b: &Particle, world: &World) -> Option<(DVec2, f64)> {
    let r_vec = world.min_image(a.pos, b.pos);
    let dist = r_vec.mag();
    if dist >= a.radius + b.radius || dist == 0.0 {
        return None;
    }
    Some((r_vec, dist))
}

/// Single forward pass over `i < j`. A merged-away particle is never revisited;
/// the survivor keeps slot `i` and may absorb further partners later in the scan.
fn merge_phase(particles: &mut Vec<Particle>, world: &World) -> usize {
    let n = particles.len();
    let mut removed = vec![false; n];
    let mut merges = 0;

    for i in 0..n {
        if removed[i] {
            continue;
        }
        for j in (i + 1)..n {
            if removed[j] {
                continue;
            }
            let (head, tail) = particles.split_at_mut(j);
            let pi = &mut head[i];
            let pj = &mut tail[0];
            let Some((r_vec, _)) = overlap(pi, pj, world) else {
                continue;
            };
            if pi.charge * pj.charge >= 0.0 {
                continue;
            }
            merge_into(pi, pj, r_vec, world);
            removed[j] = true;
            merges += 1;
        }
    }

    if merges > 0 {
        let mut index = 0;
        particles.retain(|_| {
            let keep = !removed[index];
            index += 1;
            keep
        });
        for (id, p) in particles.iter_mut().enumerate() {
            p.id = id;
        }
        log::debug!("merged {} pair(s), {} particles remain", merges, particles.len());
    }
    merges
}

/// Fold `source` into `target`. `r_vec` is the minimum-image displacement from
/// target to source. Mass, charge and radius are summed without clamping so
/// the merge conserves mass, charge and momentum exactly.
pub fn merge_into(target: &mut Particle, source: &mut Particle, r_vec: DVec2, world: &World) {
    let m1 = target.mass;
    let m2 = source.mass;
    let total_mass = m1 + m2;
    let fixed = target.fixed || source.fixed;

    let (pos, vel) = if fixed {
        let anchor = if source.fixed { source.pos } else { target.pos };
        (anchor, DVec2::zero())
    } else {
        (
            target.pos + r_vec * (m2 / total_mass),
            (target.vel * m1 + source.vel * m2) / total_mass,
        )
    };

    // Larger body's trail survives; ties go to the longer history
    if m2 > m1 || (m2 == m1 && source.trail.len() > target.trail.len()) {
        std::mem::swap(&mut target.trail, &mut source.trail);
    }

    target.mass = total_mass;
    target.charge += source.charge;
    target.radius = (target.radius * target.radius + source.radius * source.radius).sqrt();
    target.fixed = fixed;
    target.pos = pos;
    target.vel = vel;

    let last_t = target.trail.last_time().unwrap_or(0.0);
    target.trail.push(last_t, target.pos);
    target.pos = world.wrap(target.pos);
}

/// Positional correction plus a restitution-1 normal impulse for each
/// overlapping pair. Fixed particles act as infinite mass.
fn elastic_phase(particles: &mut [Particle], world: &World) -> (usize, usize) {
    let n = particles.len();
    let mut contacts = 0;
    let mut impulses = 0;

    for i in 0..n {
        for j in (i + 1)..n {
            let (head, tail) = particles.split_at_mut(j);
            let pi = &mut head[i];
            let pj = &mut tail[0];
            let Some((r_vec, dist)) = overlap(pi, pj, world) else {
                continue;
            };
            contacts += 1;
            if pi.fixed && pj.fixed {
                continue;
            }

            // Normal from i to j
            let normal = r_vec / dist;
            let penetration = pi.radius + pj.radius - dist;
            if pi.fixed {
                pj.pos += normal * penetration;
            } else if pj.fixed {
                pi.pos -= normal * penetration;
            } else {
                let total = pi.mass + pj.mass;
                if total > 0.0 {
                    pi.pos -= normal * (penetration * pj.mass / total);
                    pj.pos += normal * (penetration * pi.mass / total);
                }
            }

            let v_rel_n = (pj.vel - pi.vel).dot(normal);
            if v_rel_n >= 0.0 {
                continue;
            }

            let inv_m1 = inverse_mass(pi);
            let inv_m2 = inverse_mass(pj);
            let inv_sum = inv_m1 + inv_m2;
            if inv_sum <= 0.0 || !inv_sum.is_finite() {
                continue;
            }
            let j_impulse = -(1.0 + RESTITUTION) * v_rel_n / inv_sum;
            let impulse = normal * j_impulse;
            pi.vel -= impulse * inv_m1;
            pj.vel += impulse * inv_m2;
            impulses += 1;
        }
    }
    (contacts, impulses)
}

#[inline]
fn inverse_mass(p: &Particle) -> f64 {
    if p.fixed || p.mass <= 0.0 {
        0.0
    } else {
        1.0 / p.mass
    }
}
