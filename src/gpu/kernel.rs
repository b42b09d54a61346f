//! Compute kernel generation for the parallel backend.
//!
//! The whole per-particle step is baked into one WGSL compute shader from
//! the [`SystemConfig`] at backend initialization: forces, lifetime curves
//! and collision become straight-line code instead of data the kernel has
//! to branch on. Changing the config means regenerating the kernel.

use crate::config::SystemConfig;
use crate::curve::VelocityCurve;
use crate::particle::{DEAD_PARTICLE_WGSL, PARTICLE_WGSL};
use crate::shader_utils::RANDOM_WGSL;

/// Workgroup size of the step kernel. Dispatches round up to cover every
/// particle slot.
pub const WORKGROUP_SIZE: u32 = 256;

/// Per-frame scalar inputs to the step kernel.
///
/// Layout must match the `SimUniforms` WGSL struct in the generated kernel.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SimUniforms {
    /// Frame delta time in seconds.
    pub delta_time: f32,
    /// Frame-scoped turbulence/bounce seed, incremented once per dispatch.
    pub frame_seed: u32,
    /// Capacity of the dead-particle capture buffer.
    pub max_dead: u32,
    pub _pad: u32,
}

const SIM_UNIFORMS_WGSL: &str = r#"struct SimUniforms {
    delta_time: f32,
    frame_seed: u32,
    max_dead: u32,
    _pad: u32,
}
"#;

/// Generate the complete step kernel for `config`.
///
/// Entry point is `main`. Bindings (all in group 0): particle storage at 0,
/// uniforms at 1, the atomic alive counter at 2, and — only when capture is
/// enabled — the dead-particle buffer at 3 and its atomic counter at 4.
pub fn generate_step_kernel(config: &SystemConfig) -> String {
    let capture = config.capture_enabled();

    let mut shader = String::new();
    shader.push_str(PARTICLE_WGSL);
    shader.push('\n');
    if capture {
        shader.push_str(DEAD_PARTICLE_WGSL);
        shader.push('\n');
    }
    shader.push_str(SIM_UNIFORMS_WGSL);
    shader.push_str(RANDOM_WGSL);
    shader.push('\n');
    shader.push_str(&curve_functions(config));

    shader.push_str(
        r#"
@group(0) @binding(0) var<storage, read_write> particles: array<Particle>;
@group(0) @binding(1) var<uniform> sim: SimUniforms;
@group(0) @binding(2) var<storage, read_write> alive_count: atomic<u32>;
"#,
    );
    if capture {
        shader.push_str(
            r#"@group(0) @binding(3) var<storage, read_write> dead_particles: array<DeadParticle>;
@group(0) @binding(4) var<storage, read_write> dead_count: atomic<u32>;
"#,
        );
    }

    shader.push_str(&format!(
        r#"
@compute @workgroup_size({WORKGROUP_SIZE})
fn main(@builtin(global_invocation_id) gid: vec3<u32>) {{
    let index = gid.x;
    if index >= arrayLength(&particles) {{
        return;
    }}

    var p = particles[index];
    if p.remaining_life <= 0.0 {{
        return;
    }}

    p.remaining_life -= sim.delta_time;
    if p.remaining_life <= 0.0 {{
        p.remaining_life = 0.0;
{expiry}        particles[index] = p;
        return;
    }}

    let age = clamp(1.0 - p.remaining_life / max(p.max_life, 0.0001), 0.0, 1.0);

{forces}
{velocity_curve}
    p.position += integration_velocity * sim.delta_time;
{rotation}{collision}
    particles[index] = p;
    if p.remaining_life > 0.0 {{
        atomicAdd(&alive_count, 1u);
    }}
}}
"#,
        expiry = expiry_block(capture),
        forces = force_block(config),
        velocity_curve = velocity_block(config),
        rotation = rotation_block(config),
        collision = collision_block(config),
    ));

    shader
}

/// Capture-on-expiry. The slot is claimed with `atomicAdd` and given back
/// with `atomicSub` when it lands past capacity, so the counter read back on
/// the CPU stays at most `max_dead`.
fn expiry_block(capture: bool) -> String {
    if !capture {
        return String::new();
    }
    r#"        let dead_slot = atomicAdd(&dead_count, 1u);
        if dead_slot < sim.max_dead {
            dead_particles[dead_slot] = DeadParticle(p.position, length(p.velocity));
        } else {
            atomicSub(&dead_count, 1u);
        }
"#
    .to_string()
}

fn force_block(config: &SystemConfig) -> String {
    config
        .forces
        .iter()
        .enumerate()
        .map(|(slot, force)| force.to_wgsl(slot))
        .collect::<Vec<_>>()
        .join("\n")
}

/// The velocity curve shapes only this step's translation. The stored
/// `p.velocity` is never scaled.
fn velocity_block(config: &SystemConfig) -> String {
    match &config.velocity_over_lifetime {
        None => "    let integration_velocity = p.velocity;".to_string(),
        Some(VelocityCurve::Uniform(_)) => {
            "    let integration_velocity = p.velocity * eval_velocity(age);".to_string()
        }
        Some(VelocityCurve::PerAxis { .. }) => {
            "    let integration_velocity = p.velocity\n        * vec3<f32>(eval_velocity_x(age), eval_velocity_y(age), eval_velocity_z(age));"
                .to_string()
        }
    }
}

fn rotation_block(config: &SystemConfig) -> String {
    match &config.rotation_over_lifetime {
        Some(curve) if !curve.is_empty() => {
            "    p.rotation += eval_rotation(age) * sim.delta_time;\n".to_string()
        }
        _ => String::new(),
    }
}

fn collision_block(config: &SystemConfig) -> String {
    let wgsl = config.collision.to_wgsl();
    if wgsl.is_empty() {
        return String::new();
    }
    format!("\n{wgsl}\n")
}

/// Bake the configured curves into WGSL evaluation functions.
fn curve_functions(config: &SystemConfig) -> String {
    let mut out = String::new();
    match &config.velocity_over_lifetime {
        Some(VelocityCurve::Uniform(c)) => {
            out.push_str(&c.to_wgsl_fn("eval_velocity", 1.0));
            out.push('\n');
        }
        Some(VelocityCurve::PerAxis { x, y, z }) => {
            out.push_str(&x.to_wgsl_fn("eval_velocity_x", 1.0));
            out.push('\n');
            out.push_str(&y.to_wgsl_fn("eval_velocity_y", 1.0));
            out.push('\n');
            out.push_str(&z.to_wgsl_fn("eval_velocity_z", 1.0));
            out.push('\n');
        }
        None => {}
    }
    if let Some(curve) = &config.rotation_over_lifetime {
        if !curve.is_empty() {
            out.push_str(&curve.to_wgsl_fn("eval_rotation", 0.0));
            out.push('\n');
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::{CollisionConfig, CollisionResponse};
    use crate::curve::Curve;
    use crate::forces::ForceField;
    use glam::Vec3;

    fn validate(shader: &str) {
        let module = naga::front::wgsl::parse_str(shader)
            .unwrap_or_else(|e| panic!("parse error: {e}\n---\n{shader}"));
        naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::all(),
        )
        .validate(&module)
        .unwrap_or_else(|e| panic!("validation error: {e:?}\n---\n{shader}"));
    }

    #[test]
    fn test_minimal_kernel_validates() {
        validate(&generate_step_kernel(&SystemConfig::new()));
    }

    #[test]
    fn test_all_forces_kernel_validates() {
        let config = SystemConfig::new()
            .with_force(ForceField::Gravity {
                acceleration: Vec3::new(0.0, -9.8, 0.0),
            })
            .with_force(ForceField::Wind {
                velocity: Vec3::new(1.0, 0.0, 0.5),
            })
            .with_force(ForceField::Drag { coefficient: 0.3 })
            .with_force(ForceField::Point {
                center: Vec3::new(0.0, 2.0, 0.0),
                strength: -4.0,
            })
            .with_force(ForceField::Turbulence { strength: 1.5 });
        validate(&generate_step_kernel(&config));
    }

    #[test]
    fn test_curves_kernel_validates() {
        let uniform = SystemConfig::new()
            .with_velocity_over_lifetime(VelocityCurve::Uniform(Curve::new(vec![
                (0.0, 1.0),
                (0.5, 0.4),
                (1.0, 0.0),
            ])))
            .with_rotation_over_lifetime(Curve::constant(2.0));
        validate(&generate_step_kernel(&uniform));

        let per_axis = SystemConfig::new().with_velocity_over_lifetime(VelocityCurve::PerAxis {
            x: Curve::constant(0.5),
            y: Curve::new(vec![(0.0, 1.0), (1.0, 0.0)]),
            z: Curve::default(),
        });
        validate(&generate_step_kernel(&per_axis));
    }

    #[test]
    fn test_collision_kernels_validate() {
        let shapes = [
            CollisionConfig::plane(Vec3::ZERO, Vec3::Y)
                .bounciness(0.5)
                .friction(0.1)
                .bounce_chance(0.8)
                .bounce_spread(0.2),
            CollisionConfig::sphere(Vec3::ZERO, 3.0).response(CollisionResponse::Kill),
            CollisionConfig::aabb(Vec3::splat(-1.0), Vec3::splat(1.0)),
        ];
        for collision in shapes {
            let config = SystemConfig::new()
                .with_force(ForceField::Gravity {
                    acceleration: Vec3::new(0.0, -9.8, 0.0),
                })
                .with_collision(collision);
            validate(&generate_step_kernel(&config));
        }
    }

    #[test]
    fn test_capture_kernel_validates() {
        let config = SystemConfig::new()
            .with_force(ForceField::Turbulence { strength: 2.0 })
            .with_max_dead_particles(128);
        let shader = generate_step_kernel(&config);
        assert!(shader.contains("dead_count"));
        assert!(shader.contains("atomicSub"));
        validate(&shader);
    }

    #[test]
    fn test_capture_bindings_absent_when_disabled() {
        let shader = generate_step_kernel(&SystemConfig::new());
        assert!(!shader.contains("dead_particles"));
        assert!(!shader.contains("@binding(3)"));
    }

    #[test]
    fn test_everything_at_once_validates() {
        let config = SystemConfig::new()
            .with_force(ForceField::Gravity {
                acceleration: Vec3::new(0.0, -9.8, 0.0),
            })
            .with_force(ForceField::Turbulence { strength: 0.5 })
            .with_force(ForceField::Drag { coefficient: 0.2 })
            .with_collision(
                CollisionConfig::plane(Vec3::ZERO, Vec3::Y)
                    .bounciness(0.6)
                    .bounce_chance(0.9)
                    .bounce_spread(0.1),
            )
            .with_velocity_over_lifetime(VelocityCurve::Uniform(Curve::new(vec![
                (0.0, 1.0),
                (1.0, 0.2),
            ])))
            .with_rotation_over_lifetime(Curve::new(vec![(0.0, 0.0), (1.0, 6.28)]))
            .with_max_dead_particles(64);
        validate(&generate_step_kernel(&config));
    }

    #[test]
    fn test_uniforms_layout() {
        assert_eq!(std::mem::size_of::<SimUniforms>(), 16);
    }
}
