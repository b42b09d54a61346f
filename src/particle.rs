//! The fixed binary layout of one simulated particle.
//!
//! A particle record is exactly 64 bytes (16 x 4-byte fields) and has the
//! same layout on the CPU and in WGSL storage buffers, so the whole store
//! can be uploaded or read back with a single `bytemuck` cast.
//!
//! A slot with `remaining_life <= 0` is dead: it is skipped by both physics
//! backends, not drawn by the renderer, and free for the emission system to
//! reuse.

use bytemuck::{Pod, Zeroable};
use glam::{Vec3, Vec4};

/// One simulated particle's complete physical/visual state.
///
/// # Example
///
/// ```ignore
/// let spark = ParticleRecord::spawn(Vec3::ZERO, Vec3::new(0.0, 5.0, 0.0), 1.0);
/// driver.upload_one(12, spark);
/// ```
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct ParticleRecord {
    /// World-space position.
    pub position: [f32; 3],
    /// Seconds of life left. `<= 0` means the slot is dead/free.
    pub remaining_life: f32,
    /// Current velocity, units per second.
    pub velocity: [f32; 3],
    /// The life this particle was born with, used to normalize curve
    /// lookups as `age = 1 - remaining_life / max_life`.
    pub max_life: f32,
    /// RGBA color. Owned by the color-over-lifetime collaborator; the
    /// physics step treats it as an opaque per-particle field.
    pub color: [f32; 4],
    /// Visual size multiplier.
    pub size: f32,
    /// Accumulated rotation in radians.
    pub rotation: f32,
    /// Type tag for typed emission/rendering.
    pub particle_type: u32,
    /// Free slot for collaborator-defined data.
    pub custom: f32,
}

impl ParticleRecord {
    /// Create a live record with the given kinematic state.
    ///
    /// `max_life` is set to `life`, color to opaque white, size to 1.
    pub fn spawn(position: Vec3, velocity: Vec3, life: f32) -> Self {
        Self {
            position: position.to_array(),
            remaining_life: life,
            velocity: velocity.to_array(),
            max_life: life,
            color: [1.0, 1.0, 1.0, 1.0],
            size: 1.0,
            rotation: 0.0,
            particle_type: 0,
            custom: 0.0,
        }
    }

    /// Whether this slot holds a live particle.
    #[inline]
    pub fn is_alive(&self) -> bool {
        self.remaining_life > 0.0
    }

    /// Normalized lifetime progress in `[0, 1]`, 0 at birth and 1 at death.
    #[inline]
    pub fn age(&self) -> f32 {
        if self.max_life <= 0.0 {
            return 1.0;
        }
        (1.0 - self.remaining_life / self.max_life).clamp(0.0, 1.0)
    }

    #[inline]
    pub fn position(&self) -> Vec3 {
        Vec3::from_array(self.position)
    }

    #[inline]
    pub fn velocity(&self) -> Vec3 {
        Vec3::from_array(self.velocity)
    }

    #[inline]
    pub fn color(&self) -> Vec4 {
        Vec4::from_array(self.color)
    }
}

/// One captured dead-particle event: where a particle expired and how fast
/// it was moving. Consumed by the external emission system to place
/// sub-emitted particles.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct DeadParticle {
    /// World-space position at expiry.
    pub position: [f32; 3],
    /// Velocity magnitude at expiry.
    pub speed: f32,
}

impl DeadParticle {
    #[inline]
    pub fn position(&self) -> Vec3 {
        Vec3::from_array(self.position)
    }
}

/// WGSL definition matching [`ParticleRecord`] field for field.
///
/// The vec3 fields are 16-byte aligned in WGSL; the trailing scalar of each
/// row fills the pad, so host and shader offsets agree exactly.
pub const PARTICLE_WGSL: &str = r#"struct Particle {
    position: vec3<f32>,
    remaining_life: f32,
    velocity: vec3<f32>,
    max_life: f32,
    color: vec4<f32>,
    size: f32,
    rotation: f32,
    particle_type: u32,
    custom: f32,
}
"#;

/// WGSL definition matching [`DeadParticle`].
pub const DEAD_PARTICLE_WGSL: &str = r#"struct DeadParticle {
    position: vec3<f32>,
    speed: f32,
}
"#;
