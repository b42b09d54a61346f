//! Device-resident mirror of the particle store.
//!
//! The parallel backend owns the authoritative particle data in a storage
//! buffer from initialization onward. Counters live in their own small
//! storage buffers so they can be zeroed with a 4-byte write and copied to
//! mappable staging buffers in the same submission as the dispatch, which
//! is the read-after-write barrier.

use std::sync::mpsc;

use crate::error::GpuError;
use crate::particle::{DeadParticle, ParticleRecord};

const COUNTER_SIZE: u64 = std::mem::size_of::<u32>() as u64;

/// GPU buffers backing one particle system.
pub struct GpuStore {
    max_particles: u32,
    max_dead_particles: u32,
    /// All particle records. Also usable as a vertex buffer by an external
    /// renderer.
    particle_buffer: wgpu::Buffer,
    alive_count_buffer: wgpu::Buffer,
    alive_staging: wgpu::Buffer,
    /// Present only when capture is enabled.
    dead_buffers: Option<DeadBuffers>,
}

struct DeadBuffers {
    dead_buffer: wgpu::Buffer,
    dead_count_buffer: wgpu::Buffer,
    dead_count_staging: wgpu::Buffer,
    dead_staging: wgpu::Buffer,
}

impl GpuStore {
    /// Allocate zero-filled buffers for `max_particles` slots.
    ///
    /// `max_dead_particles == 0` skips the capture buffers entirely; the
    /// generated kernel then has no bindings for them either.
    pub fn new(device: &wgpu::Device, max_particles: u32, max_dead_particles: u32) -> Self {
        let particle_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Particle Buffer"),
            size: max_particles as u64 * std::mem::size_of::<ParticleRecord>() as u64,
            usage: wgpu::BufferUsages::STORAGE
                | wgpu::BufferUsages::VERTEX
                | wgpu::BufferUsages::COPY_DST
                | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });

        let alive_count_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Alive Count Buffer"),
            size: COUNTER_SIZE,
            usage: wgpu::BufferUsages::STORAGE
                | wgpu::BufferUsages::COPY_DST
                | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });
        let alive_staging = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Alive Count Staging"),
            size: COUNTER_SIZE,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let dead_buffers = (max_dead_particles > 0).then(|| {
            let dead_size =
                max_dead_particles as u64 * std::mem::size_of::<DeadParticle>() as u64;
            DeadBuffers {
                dead_buffer: device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some("Dead Particle Buffer"),
                    size: dead_size,
                    usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
                    mapped_at_creation: false,
                }),
                dead_count_buffer: device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some("Dead Count Buffer"),
                    size: COUNTER_SIZE,
                    usage: wgpu::BufferUsages::STORAGE
                        | wgpu::BufferUsages::COPY_DST
                        | wgpu::BufferUsages::COPY_SRC,
                    mapped_at_creation: false,
                }),
                dead_count_staging: device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some("Dead Count Staging"),
                    size: COUNTER_SIZE,
                    usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                }),
                dead_staging: device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some("Dead Particle Staging"),
                    size: dead_size,
                    usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                }),
            }
        });

        Self {
            max_particles,
            max_dead_particles,
            particle_buffer,
            alive_count_buffer,
            alive_staging,
            dead_buffers,
        }
    }

    pub fn max_particles(&self) -> u32 {
        self.max_particles
    }

    pub fn max_dead_particles(&self) -> u32 {
        self.max_dead_particles
    }

    /// Handle to the particle buffer, for bind groups and for an external
    /// renderer to source vertices from.
    pub fn particle_buffer(&self) -> &wgpu::Buffer {
        &self.particle_buffer
    }

    pub fn alive_count_buffer(&self) -> &wgpu::Buffer {
        &self.alive_count_buffer
    }

    pub fn dead_buffer(&self) -> Option<&wgpu::Buffer> {
        self.dead_buffers.as_ref().map(|d| &d.dead_buffer)
    }

    pub fn dead_count_buffer(&self) -> Option<&wgpu::Buffer> {
        self.dead_buffers.as_ref().map(|d| &d.dead_count_buffer)
    }

    /// Overwrite one slot. A no-op when `index >= max_particles`.
    pub fn upload_one(&self, queue: &wgpu::Queue, index: u32, record: ParticleRecord) {
        if index >= self.max_particles {
            return;
        }
        let offset = index as u64 * std::mem::size_of::<ParticleRecord>() as u64;
        queue.write_buffer(&self.particle_buffer, offset, bytemuck::bytes_of(&record));
    }

    /// Overwrite slots starting at 0. Records beyond capacity are dropped.
    pub fn upload_bulk(&self, queue: &wgpu::Queue, records: &[ParticleRecord]) {
        let n = records.len().min(self.max_particles as usize);
        if n == 0 {
            return;
        }
        queue.write_buffer(
            &self.particle_buffer,
            0,
            bytemuck::cast_slice(&records[..n]),
        );
    }

    /// Zero every slot and both counters.
    pub fn clear(&self, queue: &wgpu::Queue) {
        let zeroes =
            vec![ParticleRecord::default(); self.max_particles as usize];
        queue.write_buffer(&self.particle_buffer, 0, bytemuck::cast_slice(&zeroes));
        self.reset_counters(queue);
    }

    /// Zero the atomic counters. Called before every dispatch.
    pub fn reset_counters(&self, queue: &wgpu::Queue) {
        queue.write_buffer(&self.alive_count_buffer, 0, &[0u8; 4]);
        if let Some(dead) = &self.dead_buffers {
            queue.write_buffer(&dead.dead_count_buffer, 0, &[0u8; 4]);
        }
    }

    /// Record counter (and capture data) copies into `encoder`. Must be in
    /// the same submission as the dispatch that wrote them.
    pub fn copy_counters_to_staging(&self, encoder: &mut wgpu::CommandEncoder) {
        encoder.copy_buffer_to_buffer(
            &self.alive_count_buffer,
            0,
            &self.alive_staging,
            0,
            COUNTER_SIZE,
        );
        if let Some(dead) = &self.dead_buffers {
            encoder.copy_buffer_to_buffer(
                &dead.dead_count_buffer,
                0,
                &dead.dead_count_staging,
                0,
                COUNTER_SIZE,
            );
            encoder.copy_buffer_to_buffer(
                &dead.dead_buffer,
                0,
                &dead.dead_staging,
                0,
                dead.dead_staging.size(),
            );
        }
    }

    /// Read the alive counter from staging, clamped to `[0, max_particles]`.
    pub fn read_alive_counter(&self, device: &wgpu::Device) -> Result<u32, GpuError> {
        let bytes = read_staging(device, &self.alive_staging, COUNTER_SIZE)?;
        let raw = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        Ok(raw.min(self.max_particles))
    }

    /// Read the captured dead particles from staging. Empty when capture is
    /// disabled. The count is clamped to `max_dead_particles` regardless of
    /// what the atomic counter transiently reached.
    pub fn read_dead_particles(
        &self,
        device: &wgpu::Device,
    ) -> Result<Vec<DeadParticle>, GpuError> {
        let Some(dead) = &self.dead_buffers else {
            return Ok(Vec::new());
        };

        let bytes = read_staging(device, &dead.dead_count_staging, COUNTER_SIZE)?;
        let count = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
            .min(self.max_dead_particles);
        if count == 0 {
            return Ok(Vec::new());
        }

        let byte_len = count as u64 * std::mem::size_of::<DeadParticle>() as u64;
        let bytes = read_staging(device, &dead.dead_staging, byte_len)?;
        Ok(bytemuck::cast_slice(&bytes).to_vec())
    }

    /// Read every particle record back to the CPU. Slow path, meant for
    /// inspection and tests rather than the frame loop.
    pub fn read_particles(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
    ) -> Result<Vec<ParticleRecord>, GpuError> {
        let size = self.particle_buffer.size();
        let staging = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Particle Readback Staging"),
            size,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Particle Readback Encoder"),
        });
        encoder.copy_buffer_to_buffer(&self.particle_buffer, 0, &staging, 0, size);
        queue.submit(Some(encoder.finish()));

        let bytes = read_staging(device, &staging, size)?;
        Ok(bytemuck::cast_slice(&bytes).to_vec())
    }
}

/// Map the first `len` bytes of a staging buffer and copy them out.
fn read_staging(
    device: &wgpu::Device,
    staging: &wgpu::Buffer,
    len: u64,
) -> Result<Vec<u8>, GpuError> {
    let slice = staging.slice(..len);
    let (tx, rx) = mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = tx.send(result);
    });
    device.poll(wgpu::Maintain::Wait);

    match rx.recv() {
        Ok(Ok(())) => {}
        Ok(Err(e)) => return Err(GpuError::BufferMapping(e.to_string())),
        Err(_) => {
            return Err(GpuError::BufferMapping(
                "map callback never resolved".to_string(),
            ))
        }
    }

    let data = slice.get_mapped_range().to_vec();
    staging.unmap();
    Ok(data)
}
