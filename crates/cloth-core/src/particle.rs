use glam::Vec3;

/// SoA particle storage
pub struct ParticleSet {
    pub count: usize,
    pub position: Vec<Vec3>,
    /// Position at the start of the current substep
    pub prev_position: Vec<Vec3>,
    /// Initial (jittered) layout, used to tell apart naturally close pairs
    pub rest_position: Vec<Vec3>,
    pub velocity: Vec<Vec3>,
    /// 0.0 pins the particle in place
    pub inv_mass: Vec<f32>,
}

impl ParticleSet {
    pub fn new(count: usize) -> Self {
        Self {
            count,
            position: vec![Vec3::ZERO; count],
            prev_position: vec![Vec3::ZERO; count],
            rest_position: vec![Vec3::ZERO; count],
            velocity: vec![Vec3::ZERO; count],
            inv_mass: vec![1.0; count],
        }
    }

    #[inline]
    pub fn is_free(&self, i: usize) -> bool {
        self.inv_mass[i] > 0.0
    }

    /// Index of the particle closest to `point`, by squared distance.
    pub fn closest_to(&self, point: Vec3) -> Option<usize> {
        let mut best = None;
        let mut min_d2 = f32::MAX;
        for (i, p) in self.position.iter().enumerate() {
            let d2 = p.distance_squared(point);
            if d2 < min_d2 {
                min_d2 = d2;
                best = Some(i);
            }
        }
        best
    }
}
