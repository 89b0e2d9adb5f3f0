/// Position-level constraint projections run once per substep.
///
/// Each solver works in place on the particle set; corrections are applied
/// immediately (Gauss-Seidel), so later projections see earlier results.
pub mod distance;
pub mod ground;
pub mod self_collision;
