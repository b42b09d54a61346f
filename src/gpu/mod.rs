//! The parallel (GPU compute) physics backend.
//!
//! One compute dispatch advances every particle slot per frame, one lane per
//! slot. The step kernel is generated from the [`SystemConfig`] once at
//! initialization; per-frame variation travels through a small uniform
//! buffer. Counters are read back synchronously through staging buffers, so
//! `advance` returns the post-step alive count the same frame.
//!
//! Everything here runs headless: no surface, no swapchain, just a device
//! and a queue.

pub mod kernel;
pub mod store;

pub use kernel::{generate_step_kernel, SimUniforms, WORKGROUP_SIZE};
pub use store::GpuStore;

use crate::backend::{PhysicsBackend, StepOutput};
use crate::config::SystemConfig;
use crate::error::GpuError;
use crate::particle::ParticleRecord;
use crate::store::ParticleStore;

/// A headless wgpu device and queue.
pub struct GpuContext {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
}

impl GpuContext {
    /// Acquire an adapter and device, blocking on the async wgpu calls.
    pub fn new() -> Result<Self, GpuError> {
        pollster::block_on(Self::new_async())
    }

    async fn new_async() -> Result<Self, GpuError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or(GpuError::NoAdapter)?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Particle Physics Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: wgpu::MemoryHints::default(),
                },
                None,
            )
            .await?;

        Ok(Self { device, queue })
    }
}

/// The GPU compute backend. Owns the device, the generated pipeline and the
/// device-resident particle store.
pub struct ParallelBackend {
    context: GpuContext,
    store: GpuStore,
    pipeline: wgpu::ComputePipeline,
    bind_group: wgpu::BindGroup,
    uniform_buffer: wgpu::Buffer,
    frame_seed: u32,
}

impl ParallelBackend {
    /// Build the pipeline for `config` and mirror `initial` into device
    /// buffers.
    ///
    /// Kernel validation failures are caught through an error scope and
    /// surfaced as [`GpuError::KernelCompilation`] instead of panicking in
    /// wgpu's uncaptured-error handler.
    pub fn new(
        context: GpuContext,
        config: &SystemConfig,
        initial: &ParticleStore,
    ) -> Result<Self, GpuError> {
        let device = &context.device;
        let capture = config.capture_enabled();

        let store = GpuStore::new(
            device,
            initial.max_particles(),
            if capture { config.max_dead_particles } else { 0 },
        );
        store.upload_bulk(&context.queue, initial.records());

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Sim Uniform Buffer"),
            size: std::mem::size_of::<SimUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group_layout = create_bind_group_layout(device, capture);
        let bind_group = create_bind_group(device, &bind_group_layout, &store, &uniform_buffer);

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Step Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let shader_source = generate_step_kernel(config);

        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Step Kernel"),
            source: wgpu::ShaderSource::Wgsl(shader_source.into()),
        });
        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("Step Pipeline"),
            layout: Some(&pipeline_layout),
            module: &module,
            entry_point: Some("main"),
            compilation_options: Default::default(),
            cache: None,
        });
        if let Some(error) = pollster::block_on(device.pop_error_scope()) {
            return Err(GpuError::KernelCompilation(error.to_string()));
        }

        Ok(Self {
            context,
            store,
            pipeline,
            bind_group,
            uniform_buffer,
            frame_seed: 0,
        })
    }

    pub fn store(&self) -> &GpuStore {
        &self.store
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.context.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.context.queue
    }

    /// The particle buffer, for an external renderer to bind.
    pub fn particle_buffer(&self) -> &wgpu::Buffer {
        self.store.particle_buffer()
    }

    pub fn upload_one(&self, index: u32, record: ParticleRecord) {
        self.store.upload_one(&self.context.queue, index, record);
    }

    pub fn upload_bulk(&self, records: &[ParticleRecord]) {
        self.store.upload_bulk(&self.context.queue, records);
    }

    pub fn clear(&self) {
        self.store.clear(&self.context.queue);
    }

    /// Read every record back to the CPU. Meant for inspection, not the
    /// frame loop.
    pub fn read_particles(&self) -> Result<Vec<ParticleRecord>, GpuError> {
        self.store
            .read_particles(&self.context.device, &self.context.queue)
    }
}

impl PhysicsBackend for ParallelBackend {
    fn advance(&mut self, _config: &SystemConfig, dt: f32) -> Result<StepOutput, GpuError> {
        let uniforms = SimUniforms {
            delta_time: dt,
            frame_seed: self.frame_seed,
            max_dead: self.store.max_dead_particles(),
            _pad: 0,
        };
        self.frame_seed = self.frame_seed.wrapping_add(1);

        self.context
            .queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));
        self.store.reset_counters(&self.context.queue);

        let mut encoder =
            self.context
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("Step Encoder"),
                });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Step Pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &self.bind_group, &[]);
            pass.dispatch_workgroups(self.store.max_particles().div_ceil(WORKGROUP_SIZE), 1, 1);
        }
        // Counter copies ride the same submission as the dispatch; the
        // copies act as the read-after-write barrier.
        self.store.copy_counters_to_staging(&mut encoder);
        self.context.queue.submit(Some(encoder.finish()));

        let alive_count = self.store.read_alive_counter(&self.context.device)?;
        let dead_particles = self.store.read_dead_particles(&self.context.device)?;

        Ok(StepOutput {
            alive_count,
            dead_particles,
        })
    }

    fn supports_collision(&self) -> bool {
        true
    }

    fn supports_sub_emission(&self) -> bool {
        self.store.max_dead_particles() > 0
    }
}

fn storage_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only: false },
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn create_bind_group_layout(device: &wgpu::Device, capture: bool) -> wgpu::BindGroupLayout {
    let mut entries = vec![
        storage_entry(0),
        wgpu::BindGroupLayoutEntry {
            binding: 1,
            visibility: wgpu::ShaderStages::COMPUTE,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        },
        storage_entry(2),
    ];
    if capture {
        entries.push(storage_entry(3));
        entries.push(storage_entry(4));
    }

    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("Step Bind Group Layout"),
        entries: &entries,
    })
}

fn create_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    store: &GpuStore,
    uniform_buffer: &wgpu::Buffer,
) -> wgpu::BindGroup {
    let mut entries = vec![
        wgpu::BindGroupEntry {
            binding: 0,
            resource: store.particle_buffer().as_entire_binding(),
        },
        wgpu::BindGroupEntry {
            binding: 1,
            resource: uniform_buffer.as_entire_binding(),
        },
        wgpu::BindGroupEntry {
            binding: 2,
            resource: store.alive_count_buffer().as_entire_binding(),
        },
    ];
    if let (Some(dead), Some(dead_count)) = (store.dead_buffer(), store.dead_count_buffer()) {
        entries.push(wgpu::BindGroupEntry {
            binding: 3,
            resource: dead.as_entire_binding(),
        });
        entries.push(wgpu::BindGroupEntry {
            binding: 4,
            resource: dead_count.as_entire_binding(),
        });
    }

    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Step Bind Group"),
        layout,
        entries: &entries,
    })
}
