//! XPBD cloth simulation with spatial-hash self-collision.
//!
//! [`solver::ClothSolver`] owns one cloth sheet and advances it frame by
//! frame; [`session::Simulation`] holds the scene parameters and run state a
//! host drives, plus the registry used to route pointer grabs.

pub mod config;
pub mod constraints;
pub mod error;
pub mod grab;
pub mod grid;
pub mod mesh;
pub mod particle;
pub mod session;
pub mod solver;
pub mod stats;

pub use config::{ClothConfig, SceneConfig};
pub use error::{ClothError, ClothResult};
pub use session::{EntityId, Simulation};
pub use solver::ClothSolver;
