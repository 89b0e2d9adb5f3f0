//! Regular grid topology of a cloth sheet.
//!
//! Particle `(i, j)` with `i` in `0..num_x` and `j` in `0..num_y` has id
//! `i * num_y + j`. The sheet hangs in the `z = 0` plane with rows stacked
//! upward along `y`:
//!
//! ```text
//!   j
//!   ^  (0,2)--(1,2)--(2,2)     top row, corners pinned
//!   |    |  \ /  |  \ /  |
//!   |  (0,1)--(1,1)--(2,1)
//!   |    |  / \  |  / \  |
//!   |  (0,0)--(1,0)--(2,0)
//!   +----------------------> i
//! ```

use std::ops::Range;

use glam::Vec3;
use rand::Rng;

use crate::config::ClothConfig;
use crate::constraints::distance::DistanceConstraint;
use crate::particle::ParticleSet;

/// Height of the bottom row above the ground plane.
const BOTTOM_ROW_HEIGHT: f32 = 0.2;
/// Jitter amplitude relative to grid spacing.
const JITTER_FACTOR: f32 = 0.001;

/// Family a generated distance constraint belongs to.
///
/// Only used while generating; the solver sees rest length and compliance.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ConstraintKind {
    Stretch,
    Shear,
    Bending,
}

impl ConstraintKind {
    pub const ALL: [ConstraintKind; 3] = [Self::Stretch, Self::Shear, Self::Bending];

    /// Grid offsets `((i0, j0), (i1, j1))` of the endpoint pairs of this kind.
    pub fn offsets(self) -> &'static [((usize, usize), (usize, usize))] {
        match self {
            Self::Stretch => &[((0, 0), (0, 1)), ((0, 0), (1, 0))],
            Self::Shear => &[((0, 0), (1, 1)), ((0, 1), (1, 0))],
            Self::Bending => &[((0, 0), (0, 2)), ((0, 0), (2, 0))],
        }
    }

    pub fn compliance(self, config: &ClothConfig) -> f32 {
        match self {
            Self::Stretch => config.stretch_compliance,
            Self::Shear => config.shear_compliance,
            Self::Bending => config.bending_compliance,
        }
    }
}

/// Render-facing index lists, fixed at construction.
pub struct ClothMesh {
    pub num_x: usize,
    pub num_y: usize,
    /// Two triangles per grid quad, flat triples.
    pub triangle_ids: Vec<u32>,
    /// Stretch edges, flat pairs.
    pub edge_ids: Vec<u32>,
}

impl ClothMesh {
    pub fn new(num_x: usize, num_y: usize) -> Self {
        let mut triangle_ids = Vec::with_capacity(6 * num_x.saturating_sub(1) * num_y.saturating_sub(1));
        let mut edge_ids = Vec::new();

        for i in 0..num_x {
            for j in 0..num_y {
                let id = (i * num_y + j) as u32;
                let ny = num_y as u32;
                if i + 1 < num_x && j + 1 < num_y {
                    triangle_ids.extend_from_slice(&[id + 1, id, id + 1 + ny]);
                    triangle_ids.extend_from_slice(&[id + 1 + ny, id, id + ny]);
                }
                if i + 1 < num_x {
                    edge_ids.extend_from_slice(&[id, id + ny]);
                }
                if j + 1 < num_y {
                    edge_ids.extend_from_slice(&[id, id + 1]);
                }
            }
        }

        Self {
            num_x,
            num_y,
            triangle_ids,
            edge_ids,
        }
    }

    pub fn triangle_count(&self) -> usize {
        self.triangle_ids.len() / 3
    }

    #[inline]
    pub fn particle_id(&self, i: usize, j: usize) -> usize {
        i * self.num_y + j
    }
}

/// Lay out the particle grid, pin the top corners if requested, and jitter
/// every coordinate by up to `0.001 * spacing`.
///
/// Rest positions are snapshotted after jitter so perfectly coplanar
/// configurations never reach the solver.
pub fn layout_particles<R: Rng + ?Sized>(config: &ClothConfig, rng: &mut R) -> ParticleSet {
    let (num_x, num_y, spacing) = (config.num_x, config.num_y, config.spacing);
    let mut particles = ParticleSet::new(num_x * num_y);
    let jitter = JITTER_FACTOR * spacing;

    for i in 0..num_x {
        for j in 0..num_y {
            let id = i * num_y + j;
            particles.position[id] = Vec3::new(
                -(num_x as f32) * spacing * 0.5 + i as f32 * spacing,
                BOTTOM_ROW_HEIGHT + j as f32 * spacing,
                0.0,
            );
            let top_corner = j == num_y - 1 && (i == 0 || i == num_x - 1);
            if config.pin_top_corners && top_corner {
                particles.inv_mass[id] = 0.0;
            }
        }
    }

    for p in particles.position.iter_mut() {
        *p += Vec3::new(
            rng.gen_range(-jitter..=jitter),
            rng.gen_range(-jitter..=jitter),
            rng.gen_range(-jitter..=jitter),
        );
    }

    particles.rest_position.copy_from_slice(&particles.position);
    particles.prev_position.copy_from_slice(&particles.position);
    particles
}

/// Generate stretch, shear, and bending constraints in that order.
///
/// Rest lengths are measured on `positions`. Returns the constraint list and
/// the index range occupied by bending constraints.
pub fn generate_constraints(
    config: &ClothConfig,
    positions: &[Vec3],
) -> (Vec<DistanceConstraint>, Range<usize>) {
    let (num_x, num_y) = (config.num_x, config.num_y);
    let mut constraints = Vec::with_capacity(6 * num_x * num_y);
    let mut bending = 0..0;

    for kind in ConstraintKind::ALL {
        let first = constraints.len();
        let compliance = kind.compliance(config);
        for &((di0, dj0), (di1, dj1)) in kind.offsets() {
            for i in 0..num_x {
                for j in 0..num_y {
                    let (i0, j0, i1, j1) = (i + di0, j + dj0, i + di1, j + dj1);
                    if i0 < num_x && j0 < num_y && i1 < num_x && j1 < num_y {
                        let id0 = i0 * num_y + j0;
                        let id1 = i1 * num_y + j1;
                        let rest_length = positions[id0].distance(positions[id1]);
                        constraints.push(DistanceConstraint::new(
                            id0 as u32,
                            id1 as u32,
                            rest_length,
                            compliance,
                        ));
                    }
                }
            }
        }
        if kind == ConstraintKind::Bending {
            bending = first..constraints.len();
        }
    }

    (constraints, bending)
}
