use std::ops::Range;

use glam::Vec3;
use rand::Rng;
use tracing::{info, trace};

use crate::config::{validate_compliance, ClothConfig};
use crate::constraints::distance::{set_compliance, solve_distance_constraints, DistanceConstraint};
use crate::constraints::ground::solve_ground_collisions;
use crate::constraints::self_collision::{solve_self_collisions, SELF_COLLISION_FRICTION};
use crate::error::{ClothError, ClothResult};
use crate::grab::{Grab, Grabber};
use crate::grid::SpatialHashGrid;
use crate::mesh::{generate_constraints, layout_particles, ClothMesh};
use crate::particle::ParticleSet;

/// Fraction of the collision thickness a particle may travel per substep.
const MAX_TRAVEL_PER_SUBSTEP: f32 = 0.2;

/// XPBD cloth solver with self-collision.
///
/// Owns the particle buffers, the flat distance-constraint list, and the
/// spatial hash used for self-collision candidates. All buffers are sized
/// once at construction and updated in place by [`ClothSolver::step`].
pub struct ClothSolver {
    pub particles: ParticleSet,
    constraints: Vec<DistanceConstraint>,
    /// Indices of the bending constraints inside `constraints`.
    bending: Range<usize>,
    grid: SpatialHashGrid,
    mesh: ClothMesh,
    grabber: Grabber,
    thickness: f32,
    self_collision: bool,
}

impl ClothSolver {
    /// Build a cloth sheet with unseeded jitter.
    pub fn new(config: &ClothConfig) -> ClothResult<Self> {
        Self::with_rng(config, &mut rand::thread_rng())
    }

    /// Build a cloth sheet drawing its construction jitter from `rng`.
    pub fn with_rng<R: Rng + ?Sized>(config: &ClothConfig, rng: &mut R) -> ClothResult<Self> {
        config.validate()?;

        let particles = layout_particles(config, rng);
        let (constraints, bending) = generate_constraints(config, &particles.rest_position);
        let grid = SpatialHashGrid::new(config.spacing, particles.count)?;
        let mesh = ClothMesh::new(config.num_x, config.num_y);

        info!(
            particles = particles.count,
            constraints = constraints.len(),
            triangles = mesh.triangle_count(),
            "cloth solver created"
        );

        Ok(Self {
            particles,
            constraints,
            bending,
            grid,
            mesh,
            grabber: Grabber::default(),
            thickness: config.thickness,
            self_collision: config.self_collision,
        })
    }

    /// Build a solver over an arbitrary particle set and constraint list.
    ///
    /// Rest positions are taken from `particles.rest_position`. The mesh
    /// index lists are empty and no constraint is treated as bending.
    /// Buffers shorter or longer than `particles.count` and constraints with
    /// an endpoint outside the set are rejected.
    pub fn from_parts(
        mut particles: ParticleSet,
        constraints: Vec<DistanceConstraint>,
        spacing: f32,
        thickness: f32,
    ) -> ClothResult<Self> {
        if particles.count == 0 {
            return Err(ClothError::InvalidDimensions { num_x: 0, num_y: 0 });
        }
        if !(thickness.is_finite() && thickness > 0.0) {
            return Err(ClothError::InvalidThickness(thickness));
        }
        let count = particles.count;
        for (field, len) in [
            ("position", particles.position.len()),
            ("prev_position", particles.prev_position.len()),
            ("rest_position", particles.rest_position.len()),
            ("velocity", particles.velocity.len()),
            ("inv_mass", particles.inv_mass.len()),
        ] {
            if len != count {
                return Err(ClothError::InvalidParticleBuffer { field, len, count });
            }
        }
        for (index, c) in constraints.iter().enumerate() {
            if c.i as usize >= count || c.j as usize >= count {
                return Err(ClothError::InvalidConstraint {
                    index,
                    particle_count: count,
                });
            }
            validate_compliance("distance", c.compliance)?;
        }
        for w in particles.inv_mass.iter_mut() {
            *w = w.max(0.0);
        }
        let grid = SpatialHashGrid::new(spacing, particles.count)?;

        Ok(Self {
            particles,
            constraints,
            bending: 0..0,
            grid,
            mesh: ClothMesh::new(0, 0),
            grabber: Grabber::default(),
            thickness,
            self_collision: true,
        })
    }

    /// Advance the cloth by one frame of `frame_dt` seconds split into
    /// `num_substeps` substeps.
    pub fn step(&mut self, frame_dt: f32, num_substeps: u32, gravity: Vec3) {
        let num_substeps = num_substeps.max(1);
        if !(frame_dt > 1.0e-9) {
            return;
        }
        let dt = frame_dt / num_substeps as f32;
        let max_velocity = MAX_TRAVEL_PER_SUBSTEP * self.thickness / dt;

        // Collision topology is fixed for the whole frame
        if self.self_collision {
            self.grid.build(&self.particles.position);
            let max_travel_dist = max_velocity * frame_dt;
            self.grid.build_adjacency(&self.particles.position, max_travel_dist);
            trace!(pairs = self.grid.adjacency().len(), "self-collision candidates");
        }

        for _substep in 0..num_substeps {
            self.integrate(dt, gravity, max_velocity);

            solve_ground_collisions(&mut self.particles, self.thickness);
            solve_distance_constraints(&self.constraints, &mut self.particles, dt);
            if self.self_collision {
                solve_self_collisions(
                    &mut self.particles,
                    self.grid.adjacency(),
                    self.thickness,
                    SELF_COLLISION_FRICTION,
                );
            }

            self.update_velocities(dt);
        }
    }

    /// Apply gravity, cap speed, and predict positions for free particles.
    fn integrate(&mut self, dt: f32, gravity: Vec3, max_velocity: f32) {
        let ParticleSet {
            position,
            prev_position,
            velocity,
            inv_mass,
            ..
        } = &mut self.particles;

        let integrate_one = |((v, p), prev): ((&mut Vec3, &mut Vec3), &mut Vec3), w: f32| {
            if w <= 0.0 {
                return;
            }
            *v += gravity * dt;
            let speed = v.length();
            if speed > max_velocity {
                *v *= max_velocity / speed;
            }
            *prev = *p;
            *p += *v * dt;
        };

        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;
            velocity
                .par_iter_mut()
                .zip(position.par_iter_mut())
                .zip(prev_position.par_iter_mut())
                .zip(inv_mass.par_iter())
                .for_each(|(item, &w)| integrate_one(item, w));
        }

        #[cfg(not(feature = "parallel"))]
        {
            velocity
                .iter_mut()
                .zip(position.iter_mut())
                .zip(prev_position.iter_mut())
                .zip(inv_mass.iter())
                .for_each(|(item, &w)| integrate_one(item, w));
        }
    }

    /// Reconstruct velocities of free particles from their substep displacement.
    fn update_velocities(&mut self, dt: f32) {
        let ParticleSet {
            position,
            prev_position,
            velocity,
            inv_mass,
            ..
        } = &mut self.particles;
        let inv_dt = 1.0 / dt;

        let update_one = |((v, p), prev): ((&mut Vec3, &Vec3), &Vec3), w: f32| {
            if w > 0.0 {
                *v = (*p - *prev) * inv_dt;
            }
        };

        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;
            velocity
                .par_iter_mut()
                .zip(position.par_iter())
                .zip(prev_position.par_iter())
                .zip(inv_mass.par_iter())
                .for_each(|(item, &w)| update_one(item, w));
        }

        #[cfg(not(feature = "parallel"))]
        {
            velocity
                .iter_mut()
                .zip(position.iter())
                .zip(prev_position.iter())
                .zip(inv_mass.iter())
                .for_each(|(item, &w)| update_one(item, w));
        }
    }

    pub fn set_self_collision(&mut self, enabled: bool) {
        self.self_collision = enabled;
    }

    pub fn self_collision_enabled(&self) -> bool {
        self.self_collision
    }

    /// Change the compliance of every bending constraint. Takes effect on the
    /// next `step`.
    pub fn set_bending_compliance(&mut self, compliance: f32) -> ClothResult<()> {
        validate_compliance("bending", compliance)?;
        set_compliance(&mut self.constraints[self.bending.clone()], compliance);
        Ok(())
    }

    /// Pin the particle nearest to `point` and snap it there.
    pub fn start_grab(&mut self, point: Vec3) -> Option<usize> {
        self.grabber.start(&mut self.particles, point)
    }

    pub fn move_grabbed(&mut self, point: Vec3) {
        self.grabber.move_to(&mut self.particles, point);
    }

    pub fn end_grab(&mut self, point: Vec3, velocity: Vec3) {
        self.grabber.end(&mut self.particles, point, velocity);
    }

    pub fn grabbed(&self) -> Option<Grab> {
        self.grabber.active()
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.particles.position
    }

    /// Positions as a flat `x, y, z` scalar buffer for vertex upload.
    pub fn positions_flat(&self) -> &[f32] {
        bytemuck::cast_slice(&self.particles.position)
    }

    pub fn velocities(&self) -> &[Vec3] {
        &self.particles.velocity
    }

    pub fn rest_positions(&self) -> &[Vec3] {
        &self.particles.rest_position
    }

    pub fn inv_masses(&self) -> &[f32] {
        &self.particles.inv_mass
    }

    pub fn constraints(&self) -> &[DistanceConstraint] {
        &self.constraints
    }

    pub fn bending_constraints(&self) -> &[DistanceConstraint] {
        &self.constraints[self.bending.clone()]
    }

    pub fn mesh(&self) -> &ClothMesh {
        &self.mesh
    }

    pub fn grid(&self) -> &SpatialHashGrid {
        &self.grid
    }

    pub fn thickness(&self) -> f32 {
        self.thickness
    }

    pub fn particle_count(&self) -> usize {
        self.particles.count
    }
}
