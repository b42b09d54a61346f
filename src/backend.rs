//! The shared physics backend interface.
//!
//! Both backends advance the whole store by one step and report the same
//! [`StepOutput`]. They differ in guarantees, not in interface: the
//! capability queries let the driver (and tests) assert exactly what holds
//! per backend instead of assuming uniform behavior.

use crate::config::SystemConfig;
use crate::error::GpuError;
use crate::particle::DeadParticle;

/// Result of one physics pass over a particle store.
#[derive(Clone, Debug, Default)]
pub struct StepOutput {
    /// Particles with `remaining_life > 0` after the step, in
    /// `[0, max_particles]`.
    pub alive_count: u32,
    /// Dead-particle events captured during the step. Always empty on
    /// backends without sub-emission support.
    pub dead_particles: Vec<DeadParticle>,
}

/// One frame-advancing physics backend bound to its own particle store.
pub trait PhysicsBackend {
    /// Advance every particle slot by `dt` seconds and report the result.
    ///
    /// The parallel backend bakes `config` into its kernel at creation and
    /// only consults the per-frame scalars here; the sequential backend
    /// interprets it live.
    fn advance(&mut self, config: &SystemConfig, dt: f32) -> Result<StepOutput, GpuError>;

    /// Whether this backend resolves collisions (step 8).
    fn supports_collision(&self) -> bool;

    /// Whether this backend captures dead particles for sub-emission.
    fn supports_sub_emission(&self) -> bool;
}
