use crate::particle::ParticleSet;

/// Keep free particles above the ground plane `y = 0.5 * thickness`.
///
/// A particle that dips below is moved back by its whole substep
/// displacement and then clamped to the plane, which discards all of its
/// motion for this substep (tangential included).
pub fn solve_ground_collisions(particles: &mut ParticleSet, thickness: f32) {
    let floor = 0.5 * thickness;
    for i in 0..particles.count {
        if !particles.is_free(i) {
            continue;
        }
        if particles.position[i].y < floor {
            let displacement = particles.position[i] - particles.prev_position[i];
            particles.position[i] -= displacement;
            particles.position[i].y = floor;
        }
    }
}
