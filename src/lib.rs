//! # embersim
//!
//! A dual-backend particle physics engine for real-time visual effects:
//! sparks, trails, smoke, debris.
//!
//! Particles are advanced each frame under ordered force fields, shaped over
//! their lifetime by keyframe curves, optionally collided against a
//! primitive, and optionally captured on death to drive sub-emission. The
//! physics runs on one of two interchangeable backends:
//!
//! - **Parallel** — a wgpu compute kernel generated from the configuration,
//!   one lane per particle slot. Full feature set.
//! - **Sequential** — a deterministic single-threaded CPU loop. No GPU
//!   required; no collision, no dead-particle capture.
//!
//! A [`PhysicsDriver`] owns one particle system, picks a backend on the
//! first unpaused update (falling back to sequential when no usable GPU
//! exists), and mirrors results into a [`RuntimeState`] every frame.
//!
//! ## Quick Start
//!
//! ```ignore
//! use embersim::prelude::*;
//!
//! let config = SystemConfig::new()
//!     .with_force(ForceField::Gravity { acceleration: Vec3::new(0.0, -9.8, 0.0) })
//!     .with_force(ForceField::Drag { coefficient: 0.3 })
//!     .with_collision(CollisionConfig::plane(Vec3::ZERO, Vec3::Y).bounciness(0.5));
//!
//! let mut driver = PhysicsDriver::new(config, 10_000);
//! driver.upload_one(0, ParticleRecord::spawn(Vec3::ZERO, Vec3::Y * 5.0, 1.5));
//!
//! let mut state = RuntimeState::new();
//! loop {
//!     state.delta_time = 1.0 / 60.0;
//!     driver.update(&mut state);
//!     // render driver.particle_buffer() / driver.records(), emit into free
//!     // slots, consume state.dead_particles...
//! }
//! ```
//!
//! ## What stays outside
//!
//! Emission shapes and rates, rendering, and entity scheduling are the
//! caller's job. They talk to this crate through plain data: uploads into
//! store slots, the record layout, and the counters in [`RuntimeState`].

pub mod backend;
pub mod collision;
pub mod config;
pub mod curve;
pub mod driver;
pub mod error;
pub mod forces;
pub mod gpu;
pub mod particle;
pub mod sequential;
pub mod shader_utils;
pub mod store;

pub use backend::{PhysicsBackend, StepOutput};
pub use collision::{CollisionConfig, CollisionResponse, CollisionShape};
pub use config::{RuntimeState, SystemConfig};
pub use curve::{Curve, VelocityCurve};
pub use driver::{DriverPhase, PhysicsDriver};
pub use error::GpuError;
pub use forces::ForceField;
pub use particle::{DeadParticle, ParticleRecord};
pub use sequential::SequentialBackend;
pub use store::{CaptureBuffer, ParticleStore};

/// Common imports for typical usage.
pub mod prelude {
    pub use crate::collision::{CollisionConfig, CollisionResponse, CollisionShape};
    pub use crate::config::{RuntimeState, SystemConfig};
    pub use crate::curve::{Curve, VelocityCurve};
    pub use crate::driver::{DriverPhase, PhysicsDriver};
    pub use crate::forces::ForceField;
    pub use crate::particle::{DeadParticle, ParticleRecord};
    pub use glam::{Vec3, Vec4};
}
