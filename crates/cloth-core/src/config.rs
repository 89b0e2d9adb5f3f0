use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::{ClothError, ClothResult};

/// Shape and material of a single cloth sheet.
///
/// Immutable after the solver is built, except `bending_compliance` and
/// `self_collision`, which the solver exposes setters for.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClothConfig {
    /// Particle columns.
    pub num_x: usize,
    /// Particle rows.
    pub num_y: usize,
    /// Rest distance between grid neighbours, also the hash cell size.
    pub spacing: f32,
    /// Collision thickness used for ground and self contacts.
    pub thickness: f32,
    pub stretch_compliance: f32,
    pub shear_compliance: f32,
    pub bending_compliance: f32,
    /// Pin the two corners of the top row.
    pub pin_top_corners: bool,
    /// Resolve particle/particle self contacts.
    pub self_collision: bool,
}

impl Default for ClothConfig {
    fn default() -> Self {
        Self {
            num_x: 30,
            num_y: 200,
            spacing: 0.01,
            thickness: 0.01,
            stretch_compliance: 0.0,
            shear_compliance: 0.0001,
            bending_compliance: 1.0,
            pin_top_corners: true,
            self_collision: true,
        }
    }
}

impl ClothConfig {
    pub fn particle_count(&self) -> usize {
        self.num_x * self.num_y
    }

    /// Reject configurations no solver can be built from.
    pub fn validate(&self) -> ClothResult<()> {
        if self.num_x == 0 || self.num_y == 0 {
            return Err(ClothError::InvalidDimensions {
                num_x: self.num_x,
                num_y: self.num_y,
            });
        }
        if !(self.spacing.is_finite() && self.spacing > 0.0) {
            return Err(ClothError::InvalidSpacing(self.spacing));
        }
        if !(self.thickness.is_finite() && self.thickness > 0.0) {
            return Err(ClothError::InvalidThickness(self.thickness));
        }
        validate_compliance("stretch", self.stretch_compliance)?;
        validate_compliance("shear", self.shear_compliance)?;
        validate_compliance("bending", self.bending_compliance)?;
        Ok(())
    }
}

/// Per-scene stepping parameters shared by every registered cloth.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub gravity: Vec3,
    /// Wall time simulated by one `update`.
    pub frame_dt: f32,
    pub num_substeps: u32,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            gravity: Vec3::new(0.0, -10.0, 0.0),
            frame_dt: 1.0 / 60.0,
            num_substeps: 10,
        }
    }
}

impl SceneConfig {
    pub fn validate(&self) -> ClothResult<()> {
        if !(self.frame_dt.is_finite() && self.frame_dt > 0.0) {
            return Err(ClothError::InvalidTimestep(self.frame_dt));
        }
        if self.num_substeps == 0 {
            return Err(ClothError::InvalidSubsteps(self.num_substeps));
        }
        Ok(())
    }
}

pub(crate) fn validate_compliance(kind: &'static str, value: f32) -> ClothResult<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ClothError::InvalidCompliance { kind, value })
    }
}
