//! Simulation session: the owned scene state a host drives once per frame.
//!
//! A host renderer tags each drawable with an [`EntityId`]; picking resolves
//! that id through the session's [`ClothRegistry`] instead of carrying a
//! back-reference from the drawable to its physics object.

use std::collections::BTreeMap;
use std::fmt;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::{validate_compliance, SceneConfig};
use crate::error::{ClothError, ClothResult};
use crate::solver::ClothSolver;

/// Identifier the host assigns to a renderable cloth.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u32);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Maps renderable entities to the cloth solvers that own their geometry.
#[derive(Default)]
pub struct ClothRegistry {
    cloths: BTreeMap<EntityId, ClothSolver>,
}

impl ClothRegistry {
    pub fn insert(&mut self, entity: EntityId, cloth: ClothSolver) -> ClothResult<()> {
        if self.cloths.contains_key(&entity) {
            return Err(ClothError::DuplicateEntity(entity));
        }
        self.cloths.insert(entity, cloth);
        Ok(())
    }

    pub fn remove(&mut self, entity: EntityId) -> ClothResult<ClothSolver> {
        self.cloths
            .remove(&entity)
            .ok_or(ClothError::UnknownEntity(entity))
    }

    pub fn get(&self, entity: EntityId) -> Option<&ClothSolver> {
        self.cloths.get(&entity)
    }

    pub fn get_mut(&mut self, entity: EntityId) -> Option<&mut ClothSolver> {
        self.cloths.get_mut(&entity)
    }

    pub fn entities(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.cloths.keys().copied()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (EntityId, &mut ClothSolver)> {
        self.cloths.iter_mut().map(|(id, cloth)| (*id, cloth))
    }

    pub fn len(&self) -> usize {
        self.cloths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cloths.is_empty()
    }
}

/// One simulation session: scene parameters, run state, and the cloths it
/// steps.
///
/// Sessions start paused. Only [`Simulation::update`] advances time, and it
/// does nothing while paused.
pub struct Simulation {
    config: SceneConfig,
    paused: bool,
    registry: ClothRegistry,
    /// Entity holding the active grab, if any.
    grabbed: Option<EntityId>,
}

impl Simulation {
    pub fn new(config: SceneConfig) -> ClothResult<Self> {
        config.validate()?;
        info!(
            frame_dt = config.frame_dt,
            substeps = config.num_substeps,
            "simulation session created"
        );
        Ok(Self {
            config,
            paused: true,
            registry: ClothRegistry::default(),
            grabbed: None,
        })
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn run(&mut self) {
        if self.paused {
            debug!("simulation running");
        }
        self.paused = false;
    }

    pub fn pause(&mut self) {
        if !self.paused {
            debug!("simulation paused");
        }
        self.paused = true;
    }

    pub fn toggle_running(&mut self) {
        if self.paused {
            self.run();
        } else {
            self.pause();
        }
    }

    pub fn add_cloth(&mut self, entity: EntityId, cloth: ClothSolver) -> ClothResult<()> {
        self.registry.insert(entity, cloth)
    }

    pub fn remove_cloth(&mut self, entity: EntityId) -> ClothResult<ClothSolver> {
        if self.grabbed == Some(entity) {
            self.release_grab();
        }
        self.registry.remove(entity)
    }

    pub fn cloth(&self, entity: EntityId) -> Option<&ClothSolver> {
        self.registry.get(entity)
    }

    pub fn cloth_mut(&mut self, entity: EntityId) -> Option<&mut ClothSolver> {
        self.registry.get_mut(entity)
    }

    pub fn registry(&self) -> &ClothRegistry {
        &self.registry
    }

    /// Step every registered cloth by one frame. Returns `false` when paused.
    pub fn update(&mut self) -> bool {
        if self.paused {
            return false;
        }
        let SceneConfig {
            gravity,
            frame_dt,
            num_substeps,
        } = self.config;
        for (_, cloth) in self.registry.iter_mut() {
            cloth.step(frame_dt, num_substeps, gravity);
        }
        true
    }

    /// Grab the particle of `entity` nearest to `point`.
    ///
    /// A paused session starts running so the grabbed cloth responds.
    pub fn start_grab(&mut self, entity: EntityId, point: Vec3) -> ClothResult<Option<usize>> {
        if self.registry.get(entity).is_none() {
            return Err(ClothError::UnknownEntity(entity));
        }
        self.release_grab();
        let cloth = self
            .registry
            .get_mut(entity)
            .ok_or(ClothError::UnknownEntity(entity))?;
        let particle = cloth.start_grab(point);
        if particle.is_some() {
            self.grabbed = Some(entity);
            self.run();
        }
        Ok(particle)
    }

    pub fn move_grab(&mut self, point: Vec3) {
        if let Some(cloth) = self.grabbed.and_then(|e| self.registry.get_mut(e)) {
            cloth.move_grabbed(point);
        }
    }

    pub fn end_grab(&mut self, point: Vec3, velocity: Vec3) {
        if let Some(cloth) = self.grabbed.take().and_then(|e| self.registry.get_mut(e)) {
            cloth.end_grab(point, velocity);
        }
    }

    pub fn grabbed_entity(&self) -> Option<EntityId> {
        self.grabbed
    }

    pub fn set_self_collision(&mut self, enabled: bool) {
        for (_, cloth) in self.registry.iter_mut() {
            cloth.set_self_collision(enabled);
        }
    }

    /// Flip self-collision on every cloth, each relative to its own setting.
    pub fn toggle_self_collision(&mut self) {
        for (_, cloth) in self.registry.iter_mut() {
            let enabled = cloth.self_collision_enabled();
            cloth.set_self_collision(!enabled);
        }
    }

    pub fn set_bending_compliance(&mut self, compliance: f32) -> ClothResult<()> {
        validate_compliance("bending", compliance)?;
        for (_, cloth) in self.registry.iter_mut() {
            cloth.set_bending_compliance(compliance)?;
        }
        Ok(())
    }

    /// Release the active grab, keeping the particle where it is.
    fn release_grab(&mut self) {
        if let Some(cloth) = self.grabbed.take().and_then(|e| self.registry.get_mut(e)) {
            if let Some(grab) = cloth.grabbed() {
                let point = cloth.particles.position[grab.particle];
                let velocity = cloth.particles.velocity[grab.particle];
                cloth.end_grab(point, velocity);
            }
        }
    }
}
