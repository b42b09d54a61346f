//! The fixed-capacity particle store.
//!
//! A store owns `max_particles` contiguous [`ParticleRecord`] slots, an
//! alive counter, and (when sub-emission capture is enabled) a saturating
//! capture buffer of dead-particle events. Capacity is fixed at creation;
//! there is no resize. One store is exclusively owned by one particle
//! system instance.
//!
//! Every mutating operation here degrades softly: uploads past the last
//! slot are no-ops and captures past the buffer's capacity are dropped at
//! write time. Particle systems must never crash a real-time frame.

use crate::particle::{DeadParticle, ParticleRecord};

/// Append-only accumulator of dead-particle events with saturating
/// capacity.
///
/// This is the only cross-lane communication the parallel backend performs
/// besides the alive counter, so the invariant (never negative, never past
/// capacity) is enforced by the type rather than by call-site discipline.
#[derive(Clone, Debug, Default)]
pub struct CaptureBuffer {
    entries: Vec<DeadParticle>,
    capacity: u32,
}

impl CaptureBuffer {
    /// A capture buffer holding at most `capacity` events.
    pub fn new(capacity: u32) -> Self {
        Self {
            entries: Vec::with_capacity(capacity as usize),
            capacity,
        }
    }

    /// Append an event. Returns `false` (and drops the event) when the
    /// buffer is full.
    pub fn push(&mut self, event: DeadParticle) -> bool {
        if self.entries.len() as u32 >= self.capacity {
            return false;
        }
        self.entries.push(event);
        true
    }

    /// Number of captured events, always `<= capacity`.
    pub fn len(&self) -> u32 {
        self.entries.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// The captured events.
    pub fn entries(&self) -> &[DeadParticle] {
        &self.entries
    }

    /// Discard all captured events. Call before a new physics pass.
    pub fn reset(&mut self) {
        self.entries.clear();
    }
}

/// CPU-resident particle store.
///
/// The sequential backend simulates directly on this; the parallel backend
/// mirrors it into device buffers at initialization (see
/// [`crate::gpu::GpuStore`]) and owns the authoritative copy from then on.
#[derive(Clone, Debug)]
pub struct ParticleStore {
    records: Vec<ParticleRecord>,
    alive_count: u32,
    capture: CaptureBuffer,
}

impl ParticleStore {
    /// Allocate a zero-filled store. Every slot starts dead.
    ///
    /// `max_dead_particles == 0` disables dead-particle capture.
    pub fn new(max_particles: u32, max_dead_particles: u32) -> Self {
        Self {
            records: vec![ParticleRecord::default(); max_particles as usize],
            alive_count: 0,
            capture: CaptureBuffer::new(max_dead_particles),
        }
    }

    pub fn max_particles(&self) -> u32 {
        self.records.len() as u32
    }

    pub fn max_dead_particles(&self) -> u32 {
        self.capture.capacity()
    }

    /// Read-only view of all record slots (for the renderer).
    pub fn records(&self) -> &[ParticleRecord] {
        &self.records
    }

    /// Mutable view of all record slots (for the sequential backend).
    pub(crate) fn records_mut(&mut self) -> &mut [ParticleRecord] {
        &mut self.records
    }

    /// Overwrite one slot. A no-op when `index >= max_particles`.
    pub fn upload_one(&mut self, index: u32, record: ParticleRecord) {
        if let Some(slot) = self.records.get_mut(index as usize) {
            *slot = record;
        }
    }

    /// Overwrite slots starting at 0. Records beyond capacity are dropped.
    pub fn upload_bulk(&mut self, records: &[ParticleRecord]) {
        let n = records.len().min(self.records.len());
        self.records[..n].copy_from_slice(&records[..n]);
    }

    /// Set the alive counter, clamped to `[0, max_particles]`.
    pub fn reset_alive_counter(&mut self, value: u32) {
        self.alive_count = value.min(self.max_particles());
    }

    /// Current alive count, in `[0, max_particles]`.
    pub fn read_alive_counter(&self) -> u32 {
        self.alive_count
    }

    pub(crate) fn set_alive_counter(&mut self, value: u32) {
        self.alive_count = value.min(self.max_particles());
    }

    /// Discard captured dead events.
    pub fn reset_dead_counter(&mut self) {
        self.capture.reset();
    }

    /// Number of captured dead events, clamped to `max_dead_particles`.
    pub fn read_dead_counter(&self) -> u32 {
        self.capture.len().min(self.capture.capacity())
    }

    /// The first `count` captured events (clamped to what is available).
    pub fn read_dead_particles(&self, count: u32) -> &[DeadParticle] {
        let n = count.min(self.capture.len()) as usize;
        &self.capture.entries()[..n]
    }

    /// Capture one dead event; saturates at `max_dead_particles`.
    pub fn capture_dead(&mut self, event: DeadParticle) -> bool {
        self.capture.push(event)
    }

    /// Zero all slots and both counters. Used on system reset.
    pub fn clear(&mut self) {
        self.records.fill(ParticleRecord::default());
        self.alive_count = 0;
        self.capture.reset();
    }
}
