//! The per-instance physics driver.
//!
//! A driver owns exactly one particle system: its configuration, its store
//! and its physics backend. The backend is chosen once, on the first
//! unpaused update, and stays active until [`PhysicsDriver::destroy`]. The
//! parallel backend is tried first unless the configuration opts out; any
//! initialization failure logs a warning and falls back to the sequential
//! backend permanently. There is no per-frame retry.
//!
//! # Example
//!
//! ```ignore
//! let mut driver = PhysicsDriver::new(config, 10_000);
//! driver.upload_one(0, ParticleRecord::spawn(Vec3::ZERO, Vec3::Y * 5.0, 1.0));
//!
//! let mut state = RuntimeState::new();
//! state.delta_time = 1.0 / 60.0;
//! driver.update(&mut state);
//! println!("{} alive", state.alive_count);
//! ```

use crate::backend::PhysicsBackend;
use crate::config::{RuntimeState, SystemConfig};
use crate::error::GpuError;
use crate::gpu::{GpuContext, ParallelBackend};
use crate::particle::ParticleRecord;
use crate::sequential::SequentialBackend;
use crate::store::ParticleStore;

/// Which stage of its lifecycle a driver is in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DriverPhase {
    /// No backend yet; uploads land in the seed store.
    Uninitialized,
    /// The GPU compute backend is active.
    ParallelActive,
    /// The CPU fallback backend is active.
    SequentialActive,
    /// Destroyed; every operation is a no-op.
    Destroyed,
}

enum BackendSlot {
    /// Holds the CPU store so particles uploaded before the first update
    /// are carried into whichever backend initialization picks.
    Pending(ParticleStore),
    Parallel(ParallelBackend),
    Sequential(SequentialBackend),
    Destroyed,
}

/// Drives one particle system instance through its lifecycle.
pub struct PhysicsDriver {
    config: SystemConfig,
    slot: BackendSlot,
}

impl PhysicsDriver {
    /// A driver for a system of `max_particles` slots. No GPU work happens
    /// here; backend initialization is deferred to the first unpaused
    /// [`update`](Self::update).
    pub fn new(config: SystemConfig, max_particles: u32) -> Self {
        let store = ParticleStore::new(max_particles, config.max_dead_particles);
        Self {
            config,
            slot: BackendSlot::Pending(store),
        }
    }

    pub fn phase(&self) -> DriverPhase {
        match &self.slot {
            BackendSlot::Pending(_) => DriverPhase::Uninitialized,
            BackendSlot::Parallel(_) => DriverPhase::ParallelActive,
            BackendSlot::Sequential(_) => DriverPhase::SequentialActive,
            BackendSlot::Destroyed => DriverPhase::Destroyed,
        }
    }

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    /// Advance the system by `state.delta_time` and write the results back
    /// into `state`. A no-op while paused or after destruction.
    ///
    /// `delta_time` is passed through unclamped; an abnormally large value
    /// can step particles past thin collision geometry, which is a known
    /// limitation of the integration scheme.
    pub fn update(&mut self, state: &mut RuntimeState) {
        if state.paused {
            return;
        }
        if matches!(self.slot, BackendSlot::Destroyed) {
            return;
        }
        if matches!(self.slot, BackendSlot::Pending(_)) {
            self.initialize();
        }

        let result = match &mut self.slot {
            BackendSlot::Parallel(backend) => backend.advance(&self.config, state.delta_time),
            BackendSlot::Sequential(backend) => backend.advance(&self.config, state.delta_time),
            _ => return,
        };

        match result {
            Ok(out) => {
                state.alive_count = out.alive_count;
                state.dead_particle_count = out.dead_particles.len() as u32;
                state.dead_particles = out.dead_particles;
            }
            Err(e) => {
                // Leave the previous frame's state in place; the next frame
                // may succeed.
                log::error!("physics step failed: {e}");
            }
        }
    }

    /// Pick and build the backend. The choice is permanent.
    fn initialize(&mut self) {
        let slot = std::mem::replace(&mut self.slot, BackendSlot::Destroyed);
        let BackendSlot::Pending(store) = slot else {
            self.slot = slot;
            return;
        };

        if self.config.prefer_sequential {
            log::debug!("sequential backend requested by configuration");
        } else {
            match GpuContext::new()
                .and_then(|context| ParallelBackend::new(context, &self.config, &store))
            {
                Ok(backend) => {
                    self.slot = BackendSlot::Parallel(backend);
                    return;
                }
                Err(e) => {
                    log::warn!("parallel backend unavailable, falling back to sequential: {e}");
                }
            }
        }
        self.slot = BackendSlot::Sequential(SequentialBackend::new(store));
    }

    /// Overwrite one particle slot. A no-op past capacity or after
    /// destruction.
    pub fn upload_one(&mut self, index: u32, record: ParticleRecord) {
        match &mut self.slot {
            BackendSlot::Pending(store) => store.upload_one(index, record),
            BackendSlot::Parallel(backend) => backend.upload_one(index, record),
            BackendSlot::Sequential(backend) => backend.store_mut().upload_one(index, record),
            BackendSlot::Destroyed => {}
        }
    }

    /// Overwrite slots starting at 0; records beyond capacity are dropped.
    pub fn upload_bulk(&mut self, records: &[ParticleRecord]) {
        match &mut self.slot {
            BackendSlot::Pending(store) => store.upload_bulk(records),
            BackendSlot::Parallel(backend) => backend.upload_bulk(records),
            BackendSlot::Sequential(backend) => backend.store_mut().upload_bulk(records),
            BackendSlot::Destroyed => {}
        }
    }

    /// Zero every slot and counter.
    pub fn clear(&mut self) {
        match &mut self.slot {
            BackendSlot::Pending(store) => store.clear(),
            BackendSlot::Parallel(backend) => backend.clear(),
            BackendSlot::Sequential(backend) => backend.store_mut().clear(),
            BackendSlot::Destroyed => {}
        }
    }

    /// Direct slice access to the records when they live on the CPU.
    /// `None` on the parallel path (use [`Self::read_back_particles`] or
    /// bind [`Self::particle_buffer`] instead) and after destruction.
    pub fn records(&self) -> Option<&[ParticleRecord]> {
        match &self.slot {
            BackendSlot::Pending(store) => Some(store.records()),
            BackendSlot::Sequential(backend) => Some(backend.store().records()),
            _ => None,
        }
    }

    /// Copy every record to the CPU regardless of backend. On the parallel
    /// path this is a full buffer readback; keep it out of the frame loop.
    pub fn read_back_particles(&self) -> Result<Vec<ParticleRecord>, GpuError> {
        match &self.slot {
            BackendSlot::Pending(store) => Ok(store.records().to_vec()),
            BackendSlot::Parallel(backend) => backend.read_particles(),
            BackendSlot::Sequential(backend) => Ok(backend.store().records().to_vec()),
            BackendSlot::Destroyed => Ok(Vec::new()),
        }
    }

    /// The device-resident particle buffer, when the parallel backend is
    /// active. An external renderer can bind it directly.
    pub fn particle_buffer(&self) -> Option<&wgpu::Buffer> {
        match &self.slot {
            BackendSlot::Parallel(backend) => Some(backend.particle_buffer()),
            _ => None,
        }
    }

    /// Whether the active backend resolves collisions.
    pub fn supports_collision(&self) -> bool {
        match &self.slot {
            BackendSlot::Parallel(backend) => backend.supports_collision(),
            BackendSlot::Sequential(backend) => backend.supports_collision(),
            _ => false,
        }
    }

    /// Whether the active backend captures dead particles.
    pub fn supports_sub_emission(&self) -> bool {
        match &self.slot {
            BackendSlot::Parallel(backend) => backend.supports_sub_emission(),
            BackendSlot::Sequential(backend) => backend.supports_sub_emission(),
            _ => false,
        }
    }

    /// Release the backend and store. Terminal; the driver stays destroyed.
    pub fn destroy(&mut self) {
        self.slot = BackendSlot::Destroyed;
    }
}
