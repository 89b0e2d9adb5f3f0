use cloth_core::constraints::distance::DistanceConstraint;
use cloth_core::particle::ParticleSet;
use cloth_core::{ClothConfig, ClothError, ClothSolver};
use glam::Vec3;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

const FRAME_DT: f32 = 1.0 / 60.0;
const SUBSTEPS: u32 = 10;
const GRAVITY: Vec3 = Vec3::new(0.0, -10.0, 0.0);

fn seeded_cloth(config: &ClothConfig, seed: u64) -> ClothSolver {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    ClothSolver::with_rng(config, &mut rng).expect("valid cloth config")
}

fn small_config(num_x: usize, num_y: usize) -> ClothConfig {
    ClothConfig {
        num_x,
        num_y,
        spacing: 0.1,
        thickness: 0.01,
        ..ClothConfig::default()
    }
}

#[test]
fn test_create_cloth_generates_constraints() {
    let cloth = seeded_cloth(&small_config(5, 5), 1);

    // Stretch: 5 * 4 + 4 * 5 = 40
    // Shear: 4 * 4 * 2 = 32
    // Bending: 5 * 3 * 2 = 30
    assert_eq!(cloth.constraints().len(), 102);
    assert_eq!(cloth.bending_constraints().len(), 30);
    assert_eq!(cloth.particle_count(), 25);
    assert_eq!(cloth.mesh().triangle_count(), 32);

    // Only the top corners are pinned
    let pinned: Vec<usize> = (0..25).filter(|&i| cloth.inv_masses()[i] == 0.0).collect();
    assert_eq!(pinned, vec![4, 24]);

    for c in cloth.constraints() {
        let rest = cloth.rest_positions()[c.i as usize].distance(cloth.rest_positions()[c.j as usize]);
        assert!((c.rest_length - rest).abs() < 1e-6);
    }
}

#[test]
fn test_rejects_invalid_config() {
    let mut rng = ChaCha8Rng::seed_from_u64(0);
    for config in [
        ClothConfig { num_x: 0, ..small_config(1, 1) },
        ClothConfig { spacing: 0.0, ..small_config(2, 2) },
        ClothConfig { thickness: -0.01, ..small_config(2, 2) },
        ClothConfig { bending_compliance: -1.0, ..small_config(2, 2) },
    ] {
        assert!(ClothSolver::with_rng(&config, &mut rng).is_err(), "{config:?} should be rejected");
    }
}

#[test]
fn test_construction_is_reproducible_with_seed() {
    let config = small_config(6, 6);
    let a = seeded_cloth(&config, 42);
    let b = seeded_cloth(&config, 42);
    let c = seeded_cloth(&config, 43);

    assert_eq!(a.positions(), b.positions());
    assert_ne!(a.positions(), c.positions());
}

#[test]
fn test_two_by_two_scenario() {
    let config = small_config(2, 2);
    let mut cloth = seeded_cloth(&config, 7);
    let initial = cloth.positions().to_vec();

    // Top corners (j = 1) are pinned; bottom particles 0 and 2 hang free
    assert_eq!(cloth.inv_masses(), &[1.0, 0.0, 1.0, 0.0]);

    for _ in 0..60 {
        cloth.step(FRAME_DT, SUBSTEPS, GRAVITY);
    }

    for &id in &[0usize, 2] {
        let drop = initial[id].y - cloth.positions()[id].y;
        assert!(drop > -1e-5, "particle {id} rose by {}", -drop);
        assert!(drop < 1e-3, "particle {id} sagged by {drop}");
    }
    for c in cloth.constraints() {
        let len = cloth.positions()[c.i as usize].distance(cloth.positions()[c.j as usize]);
        let tolerance = if c.compliance == 0.0 { 1e-3 } else { 1e-2 };
        assert!(
            (len - c.rest_length).abs() < tolerance,
            "constraint {}-{} length {len} vs rest {}",
            c.i,
            c.j,
            c.rest_length
        );
    }

    // Same seed, same trajectory
    let mut replay = seeded_cloth(&config, 7);
    for _ in 0..60 {
        replay.step(FRAME_DT, SUBSTEPS, GRAVITY);
    }
    assert_eq!(replay.positions(), cloth.positions());
}

#[test]
fn test_constraint_convergence_with_pinned_anchor() {
    // One column of two particles: the top one is pinned
    let config = ClothConfig {
        self_collision: false,
        ..small_config(1, 2)
    };
    let mut cloth = seeded_cloth(&config, 3);
    assert_eq!(cloth.constraints().len(), 1);
    let rest_length = cloth.constraints()[0].rest_length;

    let anchor = cloth.positions()[1];
    cloth.particles.position[0] = anchor - Vec3::new(0.0, 0.15, 0.0);

    for _ in 0..30 {
        cloth.step(FRAME_DT, SUBSTEPS, Vec3::ZERO);
    }

    let dist = cloth.positions()[0].distance(cloth.positions()[1]);
    assert!((dist - rest_length).abs() < 1e-4, "distance {dist} vs rest {rest_length}");
    assert_eq!(cloth.positions()[1], anchor);
}

#[test]
fn test_pinned_particles_never_move() {
    let mut cloth = seeded_cloth(&small_config(6, 6), 11);
    let pinned: Vec<(usize, Vec3)> = (0..cloth.particle_count())
        .filter(|&i| cloth.inv_masses()[i] == 0.0)
        .map(|i| (i, cloth.positions()[i]))
        .collect();
    assert_eq!(pinned.len(), 2);

    for _ in 0..90 {
        cloth.step(FRAME_DT, SUBSTEPS, GRAVITY);
    }

    for (i, p) in pinned {
        assert_eq!(cloth.positions()[i], p, "pinned particle {i} moved");
    }
}

#[test]
fn test_ground_non_penetration() {
    let config = ClothConfig {
        pin_top_corners: false,
        ..small_config(5, 5)
    };
    let mut cloth = seeded_cloth(&config, 5);
    let floor = 0.5 * config.thickness;

    for frame in 0..120 {
        cloth.step(FRAME_DT, SUBSTEPS, GRAVITY);
        for (i, p) in cloth.positions().iter().enumerate() {
            assert!(
                p.y >= floor - 0.25 * config.thickness,
                "frame {frame}: particle {i} below ground at y = {}",
                p.y
            );
        }
    }

    // The bottom row has landed by now
    for i in 0..config.num_x {
        let y = cloth.positions()[i * config.num_y].y;
        assert!(y < 0.05, "bottom row particle {i} still airborne at y = {y}");
    }
}

#[test]
fn test_speed_capped_per_substep() {
    let config = ClothConfig {
        self_collision: false,
        pin_top_corners: false,
        ..small_config(1, 1)
    };
    let mut cloth = seeded_cloth(&config, 9);
    cloth.particles.velocity[0] = Vec3::new(100.0, 0.0, 0.0);

    cloth.step(FRAME_DT, SUBSTEPS, Vec3::ZERO);

    let max_velocity = 0.2 * config.thickness / (FRAME_DT / SUBSTEPS as f32);
    let speed = cloth.velocities()[0].length();
    assert!(speed <= max_velocity * 1.0001, "speed {speed} exceeds cap {max_velocity}");
}

fn approaching_pair(speed: f32) -> ClothSolver {
    let mut particles = ParticleSet::new(2);
    particles.position[0] = Vec3::new(0.0, 1.0, 0.0);
    particles.position[1] = Vec3::new(0.015, 1.0, 0.0);
    // Far apart at rest, so contact is enforced at full thickness
    particles.rest_position[0] = Vec3::new(0.0, 1.0, 0.0);
    particles.rest_position[1] = Vec3::new(0.1, 1.0, 0.0);
    particles.prev_position.copy_from_slice(&particles.position);
    particles.velocity[0] = Vec3::new(speed, 0.0, 0.0);
    particles.velocity[1] = Vec3::new(-speed, 0.0, 0.0);

    ClothSolver::from_parts(particles, Vec::new(), 0.01, 0.01).unwrap()
}

#[test]
fn test_self_collision_keeps_separation() {
    let mut cloth = approaching_pair(0.5);
    let thickness = cloth.thickness();

    for frame in 0..30 {
        cloth.step(FRAME_DT, SUBSTEPS, Vec3::ZERO);
        let dist = cloth.positions()[0].distance(cloth.positions()[1]);
        assert!(dist >= thickness - 1e-5, "frame {frame}: pair interpenetrated, dist {dist}");
    }
}

#[test]
fn test_disabling_self_collision_lets_particles_pass() {
    let mut cloth = approaching_pair(0.5);
    cloth.set_self_collision(false);
    assert!(!cloth.self_collision_enabled());

    for _ in 0..30 {
        cloth.step(FRAME_DT, SUBSTEPS, Vec3::ZERO);
    }

    assert!(
        cloth.positions()[0].x > cloth.positions()[1].x,
        "particles should have passed through each other"
    );
}

#[test]
fn test_bending_compliance_live_update() {
    let mut cloth = seeded_cloth(&small_config(4, 4), 2);

    cloth.set_bending_compliance(0.25).unwrap();
    assert!(cloth.bending_constraints().iter().all(|c| c.compliance == 0.25));
    // Stretch and shear keep their compliance
    let others = cloth.constraints().len() - cloth.bending_constraints().len();
    assert!(cloth.constraints()[..others].iter().all(|c| c.compliance != 0.25));

    assert!(cloth.set_bending_compliance(-1.0).is_err());
    assert!(cloth.set_bending_compliance(f32::NAN).is_err());
    assert!(cloth.bending_constraints().iter().all(|c| c.compliance == 0.25));
}

#[test]
fn test_from_parts_validates() {
    assert!(ClothSolver::from_parts(ParticleSet::new(0), Vec::new(), 0.01, 0.01).is_err());
    assert!(ClothSolver::from_parts(ParticleSet::new(2), Vec::new(), 0.01, 0.0).is_err());
    assert!(ClothSolver::from_parts(ParticleSet::new(2), Vec::new(), -1.0, 0.01).is_err());
    assert!(ClothSolver::from_parts(
        ParticleSet::new(2),
        vec![DistanceConstraint::new(0, 1, 1.0, -0.5)],
        0.01,
        0.01
    )
    .is_err());
}

#[test]
fn test_from_parts_rejects_out_of_range_endpoints() {
    let result = ClothSolver::from_parts(
        ParticleSet::new(2),
        vec![
            DistanceConstraint::new(0, 1, 1.0, 0.0),
            DistanceConstraint::new(0, 9, 1.0, 0.0),
        ],
        0.01,
        0.01,
    );
    assert_eq!(
        result.err(),
        Some(ClothError::InvalidConstraint {
            index: 1,
            particle_count: 2
        })
    );
}

#[test]
fn test_from_parts_rejects_short_buffers() {
    let mut particles = ParticleSet::new(3);
    particles.inv_mass.pop();

    let result = ClothSolver::from_parts(particles, Vec::new(), 0.01, 0.01);
    assert_eq!(
        result.err(),
        Some(ClothError::InvalidParticleBuffer {
            field: "inv_mass",
            len: 2,
            count: 3
        })
    );
}

#[test]
fn test_zero_dt_is_noop() {
    let mut cloth = seeded_cloth(&small_config(3, 3), 4);
    let before = cloth.positions().to_vec();
    cloth.step(0.0, SUBSTEPS, GRAVITY);
    assert_eq!(cloth.positions(), before.as_slice());
}

#[test]
fn test_no_nan_after_stepping() {
    let mut cloth = seeded_cloth(&small_config(8, 8), 8);
    cloth.particles.position[10] += Vec3::new(0.0, 0.0, 0.3);

    for _ in 0..200 {
        cloth.step(FRAME_DT, SUBSTEPS, GRAVITY);
    }

    for i in 0..cloth.particle_count() {
        assert!(cloth.positions()[i].is_finite(), "NaN position at particle {i}");
        assert!(cloth.velocities()[i].is_finite(), "NaN velocity at particle {i}");
    }
}

#[test]
fn test_positions_flat_matches_positions() {
    let cloth = seeded_cloth(&small_config(3, 2), 6);
    let flat = cloth.positions_flat();
    assert_eq!(flat.len(), 3 * cloth.particle_count());
    for (i, p) in cloth.positions().iter().enumerate() {
        assert_eq!(&flat[3 * i..3 * i + 3], &p.to_array());
    }
}
