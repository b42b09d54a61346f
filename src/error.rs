//! Error types for embersim.
//!
//! The only operations that can fail are GPU-related: acquiring a device,
//! compiling the step kernel, and mapping staging buffers for counter
//! readback. Everything else in the simulation step degrades softly by
//! design (saturating counters, no-op uploads past capacity, empty curves
//! evaluating to a default) so a real-time frame is never interrupted.

use std::fmt;

/// Errors that can occur while setting up or driving the parallel backend.
///
/// Any of these raised during initialization makes the physics driver fall
/// back to the sequential backend permanently for that particle system.
#[derive(Debug)]
pub enum GpuError {
    /// No compatible GPU adapter found.
    NoAdapter,
    /// Failed to create GPU device.
    DeviceCreation(wgpu::RequestDeviceError),
    /// The generated step kernel failed validation.
    KernelCompilation(String),
    /// Failed to map a staging buffer for counter readback.
    BufferMapping(String),
}

impl fmt::Display for GpuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GpuError::NoAdapter => write!(f, "No compatible GPU adapter found. Ensure your system has a GPU with Vulkan/Metal/DX12 support."),
            GpuError::DeviceCreation(e) => write!(f, "Failed to create GPU device: {}", e),
            GpuError::KernelCompilation(msg) => write!(f, "Failed to compile step kernel: {}", msg),
            GpuError::BufferMapping(msg) => write!(f, "Failed to map GPU buffer: {}", msg),
        }
    }
}

impl std::error::Error for GpuError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GpuError::DeviceCreation(e) => Some(e),
            _ => None,
        }
    }
}

impl From<wgpu::RequestDeviceError> for GpuError {
    fn from(e: wgpu::RequestDeviceError) -> Self {
        GpuError::DeviceCreation(e)
    }
}
