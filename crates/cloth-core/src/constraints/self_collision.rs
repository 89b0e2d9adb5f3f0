use glam::Vec3;

use crate::grid::AdjacencyList;
use crate::particle::ParticleSet;

/// Weight of the velocity-averaging step applied after each contact push.
///
/// Zero disables it: the averaged velocity is still computed, but its
/// correction is scaled away.
pub const SELF_COLLISION_FRICTION: f32 = 0.0;

/// Push apart free particle pairs closer than `thickness`.
///
/// Candidates come from the adjacency list built at the start of the frame.
/// A pair is left alone when it is coincident, out of contact, or already
/// farther apart than in the rest pose. The target separation is
/// `thickness`, or the rest distance when the pair started closer than that.
///
/// The push is split evenly between both particles, regardless of their
/// inverse masses.
pub fn solve_self_collisions(
    particles: &mut ParticleSet,
    adjacency: &AdjacencyList,
    thickness: f32,
    friction: f32,
) {
    let thickness2 = thickness * thickness;

    for id0 in 0..particles.count {
        if !particles.is_free(id0) {
            continue;
        }

        for &id1 in adjacency.neighbors(id0) {
            let id1 = id1 as usize;
            if !particles.is_free(id1) {
                continue;
            }

            let d = particles.position[id1] - particles.position[id0];
            let dist2 = d.length_squared();
            if dist2 > thickness2 || dist2 == 0.0 {
                continue;
            }

            let rest_dist2 = particles.rest_position[id0].distance_squared(particles.rest_position[id1]);
            if dist2 > rest_dist2 {
                continue;
            }
            let min_dist = if rest_dist2 < thickness2 {
                rest_dist2.sqrt()
            } else {
                thickness
            };

            // Position correction
            let dist = dist2.sqrt();
            let push = d * ((min_dist - dist) / dist);
            particles.position[id0] -= push * 0.5;
            particles.position[id1] += push * 0.5;

            // Blend implied velocities toward the pair average
            let v0 = particles.position[id0] - particles.prev_position[id0];
            let v1 = particles.position[id1] - particles.prev_position[id1];
            let avg: Vec3 = (v0 + v1) * 0.5;
            particles.position[id0] += (avg - v0) * friction;
            particles.position[id1] += (avg - v1) * friction;
        }
    }
}
