//! Sequential CPU physics backend.
//!
//! The fallback path for environments without a usable GPU. Runs the same
//! life decrement, force application, curve modulation and integration as
//! the parallel kernel, but as a single-threaded loop over the CPU-resident
//! store. Fully deterministic given identical inputs.
//!
//! Reduced feature set by design: no collision response and no
//! dead-particle capture. Constrained environments get reduced fidelity,
//! not errors.

use glam::Vec3;

use crate::backend::{PhysicsBackend, StepOutput};
use crate::config::SystemConfig;
use crate::error::GpuError;
use crate::particle::ParticleRecord;
use crate::store::ParticleStore;

pub struct SequentialBackend {
    store: ParticleStore,
    frame_seed: u32,
}

impl SequentialBackend {
    /// Take ownership of the store and simulate it in place.
    pub fn new(store: ParticleStore) -> Self {
        Self {
            store,
            frame_seed: 0,
        }
    }

    pub fn store(&self) -> &ParticleStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut ParticleStore {
        &mut self.store
    }

    /// Advance one particle by `dt`. Returns whether it is still alive.
    ///
    /// Stage order is contractual: life decrement, age, forces in list
    /// order, velocity-curve modulation (an override of this step's
    /// translation only), integration, rotation curve.
    fn step_particle(
        p: &mut ParticleRecord,
        index: u32,
        frame_seed: u32,
        config: &SystemConfig,
        dt: f32,
    ) -> bool {
        if p.remaining_life <= 0.0 {
            return false;
        }

        p.remaining_life -= dt;
        if p.remaining_life <= 0.0 {
            p.remaining_life = 0.0;
            return false;
        }

        let age = p.age();

        let position = p.position();
        let mut velocity = p.velocity();
        for (slot, force) in config.forces.iter().enumerate() {
            force.apply(index, slot as u32, frame_seed, position, &mut velocity, dt);
        }
        p.velocity = velocity.to_array();

        // The stored velocity stays unscaled; the curve shapes only this
        // step's translation.
        let integration_velocity = match &config.velocity_over_lifetime {
            Some(curve) => velocity * Vec3::from_array(curve.evaluate(age)),
            None => velocity,
        };
        p.position = (position + integration_velocity * dt).to_array();

        if let Some(curve) = &config.rotation_over_lifetime {
            if !curve.is_empty() {
                p.rotation += curve.evaluate(age, 0.0) * dt;
            }
        }

        true
    }
}

impl PhysicsBackend for SequentialBackend {
    fn advance(&mut self, config: &SystemConfig, dt: f32) -> Result<StepOutput, GpuError> {
        let frame_seed = self.frame_seed;
        self.frame_seed = self.frame_seed.wrapping_add(1);

        let mut alive = 0u32;
        for (index, p) in self.store.records_mut().iter_mut().enumerate() {
            if Self::step_particle(p, index as u32, frame_seed, config, dt) {
                alive += 1;
            }
        }
        self.store.set_alive_counter(alive);

        Ok(StepOutput {
            alive_count: alive,
            dead_particles: Vec::new(),
        })
    }

    fn supports_collision(&self) -> bool {
        false
    }

    fn supports_sub_emission(&self) -> bool {
        false
    }
}
