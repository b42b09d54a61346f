//! Validates generated step kernels with naga across randomized
//! configurations, catching codegen that only breaks for particular
//! parameter values (negative zero, tiny spans, many keyframes).

use embersim::gpu::generate_step_kernel;
use embersim::prelude::*;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

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

fn random_vec3(rng: &mut StdRng) -> Vec3 {
    Vec3::new(
        rng.gen_range(-100.0..100.0),
        rng.gen_range(-100.0..100.0),
        rng.gen_range(-100.0..100.0),
    )
}

fn random_curve(rng: &mut StdRng) -> Curve {
    let n = rng.gen_range(0..6);
    Curve::new(
        (0..n)
            .map(|_| (rng.gen_range(0.0..1.0), rng.gen_range(-10.0..10.0)))
            .collect(),
    )
}

fn random_force(rng: &mut StdRng) -> ForceField {
    match rng.gen_range(0..5) {
        0 => ForceField::Gravity {
            acceleration: random_vec3(rng),
        },
        1 => ForceField::Wind {
            velocity: random_vec3(rng),
        },
        2 => ForceField::Drag {
            coefficient: rng.gen_range(0.0..10.0),
        },
        3 => ForceField::Point {
            center: random_vec3(rng),
            strength: rng.gen_range(-50.0..50.0),
        },
        _ => ForceField::Turbulence {
            strength: rng.gen_range(0.0..20.0),
        },
    }
}

fn random_collision(rng: &mut StdRng) -> CollisionConfig {
    let base = match rng.gen_range(0..4) {
        0 => return CollisionConfig::none(),
        1 => CollisionConfig::plane(random_vec3(rng), random_vec3(rng)),
        2 => CollisionConfig::sphere(random_vec3(rng), rng.gen_range(0.01..50.0)),
        _ => {
            let min = random_vec3(rng);
            CollisionConfig::aabb(min, min + Vec3::splat(rng.gen_range(0.01..20.0)))
        }
    };
    let response = if rng.gen_bool(0.5) {
        CollisionResponse::Kill
    } else {
        CollisionResponse::Bounce
    };
    base.response(response)
        .bounciness(rng.gen_range(0.0..2.0))
        .friction(rng.gen_range(0.0..1.0))
        .bounce_chance(rng.gen_range(0.0..1.0))
        .bounce_spread(rng.gen_range(0.0..1.0))
}

fn random_config(rng: &mut StdRng) -> SystemConfig {
    let mut config = SystemConfig::new().with_collision(random_collision(rng));
    for _ in 0..rng.gen_range(0..5) {
        config = config.with_force(random_force(rng));
    }
    if rng.gen_bool(0.5) {
        let curve = if rng.gen_bool(0.5) {
            VelocityCurve::Uniform(random_curve(rng))
        } else {
            VelocityCurve::PerAxis {
                x: random_curve(rng),
                y: random_curve(rng),
                z: random_curve(rng),
            }
        };
        config = config.with_velocity_over_lifetime(curve);
    }
    if rng.gen_bool(0.5) {
        config = config.with_rotation_over_lifetime(random_curve(rng));
    }
    if rng.gen_bool(0.3) {
        config = config.with_max_dead_particles(rng.gen_range(1..1024));
    }
    config
}

#[test]
fn randomized_configs_produce_valid_kernels() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    for _ in 0..200 {
        let config = random_config(&mut rng);
        validate(&generate_step_kernel(&config));
    }
}

#[test]
fn extreme_parameter_values_still_validate() {
    let config = SystemConfig::new()
        .with_force(ForceField::Gravity {
            acceleration: Vec3::new(-0.0, f32::MIN_POSITIVE, 1e30),
        })
        .with_force(ForceField::Drag { coefficient: 1e-20 })
        .with_collision(
            CollisionConfig::plane(Vec3::splat(1e10), Vec3::new(0.0, 1e-8, 0.0))
                .bounciness(1e6)
                .bounce_spread(1e-12),
        )
        .with_velocity_over_lifetime(VelocityCurve::Uniform(Curve::new(vec![
            (0.0, -0.0),
            (1e-7, 1e20),
            (1.0, -1e-20),
        ])))
        .with_max_dead_particles(u32::MAX / 16);
    validate(&generate_step_kernel(&config));
}

#[test]
fn duplicate_curve_keys_still_validate() {
    let config = SystemConfig::new().with_rotation_over_lifetime(Curve::new(vec![
        (0.5, 1.0),
        (0.5, 2.0),
        (0.5, 3.0),
    ]));
    validate(&generate_step_kernel(&config));
}
