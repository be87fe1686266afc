//! NVML abstraction layer
//!
//! Traits for the device-query adapter plus the real nvml-wrapper backed
//! implementation.

pub mod device;
pub mod session;
pub mod traits;

pub use device::NvmlDevice;
pub use session::{NvmlBackend, NvmlSession};
pub use traits::{DeviceTelemetry, GpuBackend, TelemetrySession};
