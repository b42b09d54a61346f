//! End-to-end scenarios on the sequential backend, run through the driver.

use embersim::prelude::*;

fn spark(velocity: Vec3, life: f32) -> ParticleRecord {
    ParticleRecord::spawn(Vec3::ZERO, velocity, life)
}

#[test]
fn gravity_projectile_first_step() {
    let config = SystemConfig::new()
        .with_force(ForceField::Gravity {
            acceleration: Vec3::new(0.0, -9.8, 0.0),
        })
        .with_sequential_backend();

    let mut driver = PhysicsDriver::new(config, 16);
    driver.upload_one(0, spark(Vec3::new(0.0, 5.0, 0.0), 1.0));

    let mut state = RuntimeState::new();
    state.delta_time = 0.1;
    driver.update(&mut state);

    assert_eq!(driver.phase(), DriverPhase::SequentialActive);
    assert_eq!(state.alive_count, 1);

    let p = driver.records().unwrap()[0];
    assert!((p.velocity[1] - 4.02).abs() < 1e-4);
    assert!((p.position[1] - 0.402).abs() < 1e-4);
    assert!((p.remaining_life - 0.9).abs() < 1e-6);
}

#[test]
fn life_is_only_drained_by_time() {
    // No collision configured: after n steps of dt, every particle's life
    // has dropped by exactly n * dt and nothing else touched it.
    let config = SystemConfig::new()
        .with_force(ForceField::Gravity {
            acceleration: Vec3::new(0.0, -30.0, 0.0),
        })
        .with_force(ForceField::Turbulence { strength: 5.0 })
        .with_sequential_backend();

    let mut driver = PhysicsDriver::new(config, 8);
    driver.upload_bulk(&vec![spark(Vec3::new(3.0, 1.0, -2.0), 2.0); 8]);

    let mut state = RuntimeState::new();
    state.delta_time = 0.05;
    for _ in 0..10 {
        driver.update(&mut state);
    }

    for p in driver.records().unwrap() {
        assert!((p.remaining_life - 1.5).abs() < 1e-5);
    }
    assert_eq!(state.alive_count, 8);
}

#[test]
fn identical_drivers_stay_bit_identical() {
    let config = || {
        SystemConfig::new()
            .with_force(ForceField::Gravity {
                acceleration: Vec3::new(0.0, -9.8, 0.0),
            })
            .with_force(ForceField::Turbulence { strength: 2.0 })
            .with_force(ForceField::Drag { coefficient: 0.4 })
            .with_velocity_over_lifetime(VelocityCurve::Uniform(Curve::new(vec![
                (0.0, 1.0),
                (1.0, 0.1),
            ])))
            .with_sequential_backend()
    };

    let run = || {
        let mut driver = PhysicsDriver::new(config(), 64);
        for i in 0..64 {
            driver.upload_one(i, spark(Vec3::new(i as f32 * 0.1, 4.0, 0.0), 3.0));
        }
        let mut state = RuntimeState::new();
        state.delta_time = 1.0 / 60.0;
        for _ in 0..120 {
            driver.update(&mut state);
        }
        driver.read_back_particles().unwrap()
    };

    assert_eq!(run(), run());
}

#[test]
fn expired_particles_free_their_slots() {
    let config = SystemConfig::new().with_sequential_backend();
    let mut driver = PhysicsDriver::new(config, 4);
    driver.upload_bulk(&[
        spark(Vec3::ZERO, 0.1),
        spark(Vec3::ZERO, 0.5),
        spark(Vec3::ZERO, 1.0),
        spark(Vec3::ZERO, 2.0),
    ]);

    let mut state = RuntimeState::new();
    state.delta_time = 0.3;
    driver.update(&mut state);
    assert_eq!(state.alive_count, 3);

    // A freed slot can be reused by a new upload.
    let records = driver.records().unwrap();
    assert!(!records[0].is_alive());
    driver.upload_one(0, spark(Vec3::ZERO, 5.0));
    driver.update(&mut state);
    assert_eq!(state.alive_count, 4);
}

#[test]
fn pause_freezes_the_system() {
    let config = SystemConfig::new()
        .with_force(ForceField::Gravity {
            acceleration: Vec3::new(0.0, -9.8, 0.0),
        })
        .with_sequential_backend();
    let mut driver = PhysicsDriver::new(config, 1);
    driver.upload_one(0, spark(Vec3::ZERO, 1.0));

    let mut state = RuntimeState::new();
    state.delta_time = 0.1;
    driver.update(&mut state);
    let frozen = driver.read_back_particles().unwrap();

    state.paused = true;
    for _ in 0..10 {
        driver.update(&mut state);
    }
    assert_eq!(driver.read_back_particles().unwrap(), frozen);

    state.paused = false;
    driver.update(&mut state);
    assert_ne!(driver.read_back_particles().unwrap(), frozen);
}
