//! Per-instance configuration and runtime state.
//!
//! Both records are plain data owned by the external component layer. The
//! physics driver reads [`SystemConfig`] once at backend initialization
//! (the parallel kernel bakes it in) and exchanges [`RuntimeState`] every
//! frame.

use crate::collision::CollisionConfig;
use crate::curve::{Curve, VelocityCurve};
use crate::forces::ForceField;
use crate::particle::DeadParticle;

/// Simulation configuration for one particle system instance.
///
/// # Example
///
/// ```ignore
/// let config = SystemConfig::new()
///     .with_force(ForceField::Gravity { acceleration: Vec3::new(0.0, -9.8, 0.0) })
///     .with_force(ForceField::Drag { coefficient: 0.3 })
///     .with_collision(CollisionConfig::plane(Vec3::ZERO, Vec3::Y).bounciness(0.4))
///     .with_velocity_over_lifetime(VelocityCurve::Uniform(
///         Curve::new(vec![(0.0, 1.0), (1.0, 0.2)]),
///     ))
///     .with_max_dead_particles(256);
/// ```
#[derive(Clone, Debug, Default)]
pub struct SystemConfig {
    /// Ordered force list, applied cumulatively per particle per step.
    pub forces: Vec<ForceField>,
    /// Collision primitive and response (parallel backend only).
    pub collision: CollisionConfig,
    /// Velocity modulation over normalized lifetime; `None` disables it.
    pub velocity_over_lifetime: Option<VelocityCurve>,
    /// Angular rate over normalized lifetime; `None` disables it.
    pub rotation_over_lifetime: Option<Curve>,
    /// Capacity of the dead-particle capture buffer; 0 disables
    /// sub-emission capture.
    pub max_dead_particles: u32,
    /// Skip the parallel backend even when it is available.
    pub prefer_sequential: bool,
}

impl SystemConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a force to the ordered list.
    pub fn with_force(mut self, force: ForceField) -> Self {
        self.forces.push(force);
        self
    }

    /// Set the collision configuration.
    pub fn with_collision(mut self, collision: CollisionConfig) -> Self {
        self.collision = collision;
        self
    }

    /// Set the velocity-over-lifetime curve.
    pub fn with_velocity_over_lifetime(mut self, curve: VelocityCurve) -> Self {
        self.velocity_over_lifetime = Some(curve);
        self
    }

    /// Set the rotation-over-lifetime curve.
    pub fn with_rotation_over_lifetime(mut self, curve: Curve) -> Self {
        self.rotation_over_lifetime = Some(curve);
        self
    }

    /// Enable dead-particle capture with the given buffer capacity.
    pub fn with_max_dead_particles(mut self, max: u32) -> Self {
        self.max_dead_particles = max;
        self
    }

    /// Force the sequential backend regardless of GPU availability.
    pub fn with_sequential_backend(mut self) -> Self {
        self.prefer_sequential = true;
        self
    }

    /// Whether dead-particle capture is requested.
    pub fn capture_enabled(&self) -> bool {
        self.max_dead_particles > 0
    }
}

/// Runtime state exchanged with the external component layer each frame.
///
/// `paused` and `delta_time` are inputs; `alive_count`, `dead_particles`
/// and `dead_particle_count` are written back by the driver after each
/// physics pass.
#[derive(Clone, Debug, Default)]
pub struct RuntimeState {
    /// When true the driver does nothing this frame.
    pub paused: bool,
    /// Frame delta time in seconds. Deliberately not clamped: an abnormally
    /// large value can step particles past thin collision geometry, which
    /// is a known limitation of the integration scheme.
    pub delta_time: f32,
    /// Particles still alive after the last physics pass.
    pub alive_count: u32,
    /// Captured dead-particle events from the last pass (parallel backend
    /// with capture enabled only).
    pub dead_particles: Vec<DeadParticle>,
    /// `dead_particles.len()`, mirrored as a plain counter for collaborators
    /// that only want the number.
    pub dead_particle_count: u32,
}

impl RuntimeState {
    pub fn new() -> Self {
        Self::default()
    }
}
