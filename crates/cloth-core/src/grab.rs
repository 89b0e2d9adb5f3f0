use glam::Vec3;
use tracing::debug;

use crate::particle::ParticleSet;

/// A particle held by the pointer, pinned until released.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Grab {
    pub particle: usize,
    /// Inverse mass to restore on release.
    pub saved_inv_mass: f32,
}

/// Grab interaction state for one cloth.
///
/// At most one particle is held at a time. Moving or releasing without an
/// active grab does nothing.
#[derive(Default, Debug)]
pub struct Grabber {
    active: Option<Grab>,
}

impl Grabber {
    pub fn active(&self) -> Option<Grab> {
        self.active
    }

    /// Pin the particle nearest to `point` and snap it there.
    ///
    /// A grab already in progress is released first, keeping its velocity.
    pub fn start(&mut self, particles: &mut ParticleSet, point: Vec3) -> Option<usize> {
        if let Some(prev) = self.active.take() {
            particles.inv_mass[prev.particle] = prev.saved_inv_mass;
        }

        let id = particles.closest_to(point)?;
        self.active = Some(Grab {
            particle: id,
            saved_inv_mass: particles.inv_mass[id],
        });
        particles.inv_mass[id] = 0.0;
        particles.position[id] = point;
        debug!(particle = id, "grab started");
        Some(id)
    }

    /// Teleport the held particle to `point`.
    pub fn move_to(&mut self, particles: &mut ParticleSet, point: Vec3) {
        if let Some(grab) = self.active {
            particles.position[grab.particle] = point;
        }
    }

    /// Release the held particle at `point`, restoring its mass and giving
    /// it `velocity`.
    pub fn end(&mut self, particles: &mut ParticleSet, point: Vec3, velocity: Vec3) {
        if let Some(grab) = self.active.take() {
            particles.inv_mass[grab.particle] = grab.saved_inv_mass;
            particles.position[grab.particle] = point;
            particles.velocity[grab.particle] = velocity;
            debug!(particle = grab.particle, "grab ended");
        }
    }
}
