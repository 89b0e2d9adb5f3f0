use crate::particle::ParticleSet;

/// XPBD distance constraint for cloth edges.
///
/// Maintains a rest length between two particles using XPBD
/// (Extended Position-Based Dynamics) with compliance.
///
/// Reference: "XPBD: Position-Based Simulation of Compliant Constrained Dynamics",
/// Macklin et al., 2016
#[derive(Clone, Debug, PartialEq)]
pub struct DistanceConstraint {
    /// Particle index A.
    pub i: u32,
    /// Particle index B.
    pub j: u32,
    /// Rest length (initial distance between the two particles).
    pub rest_length: f32,
    /// Compliance (inverse stiffness). Higher values produce softer constraints.
    pub compliance: f32,
}

impl DistanceConstraint {
    /// Create a new distance constraint between particles `i` and `j`.
    pub fn new(i: u32, j: u32, rest_length: f32, compliance: f32) -> Self {
        Self {
            i,
            j,
            rest_length,
            compliance,
        }
    }
}

/// Solve all distance constraints with one Gauss-Seidel sweep.
///
/// For each constraint, in list order:
/// 1. Compute constraint value C = |p_i - p_j| - rest_length
/// 2. Compute XPBD stiffness term: alpha = compliance / dt^2
/// 3. Compute step s = -C / (w_i + w_j + alpha)
/// 4. Move p_i by n * s * w_i and p_j by -n * s * w_j
///
/// Pairs of pinned particles and zero-length pairs are skipped.
pub fn solve_distance_constraints(
    constraints: &[DistanceConstraint],
    particles: &mut ParticleSet,
    dt: f32,
) {
    let dt_sq = dt * dt;

    for c in constraints {
        let i = c.i as usize;
        let j = c.j as usize;

        let w_i = particles.inv_mass[i];
        let w_j = particles.inv_mass[j];
        let w_sum = w_i + w_j;
        if w_sum == 0.0 {
            continue;
        }

        let diff = particles.position[i] - particles.position[j];
        let len = diff.length();
        if len == 0.0 {
            continue;
        }

        // Unit vector from j to i
        let n = diff / len;
        let c_val = len - c.rest_length;
        let alpha = c.compliance / dt_sq;
        let s = -c_val / (w_sum + alpha);

        particles.position[i] += n * (s * w_i);
        particles.position[j] -= n * (s * w_j);
    }
}

/// Overwrite the compliance of every constraint in `constraints`.
pub fn set_compliance(constraints: &mut [DistanceConstraint], compliance: f32) {
    for c in constraints.iter_mut() {
        c.compliance = compliance;
    }
}
