//! NVML session implementation
//!
//! Provides the real backend: one NVML initialization per poll, released
//! again when the session drops.

use crate::error::NvmlError;
use crate::nvml::device::NvmlDevice;
use crate::nvml::traits::{GpuBackend, TelemetrySession};

use nvml_wrapper::Nvml;

/// Buffer size passed to the process-name lookup
const PROCESS_NAME_LENGTH: usize = 64;

/// Backend that opens a real NVML session for every poll
#[derive(Debug, Default)]
pub struct NvmlBackend;

impl NvmlBackend {
    /// Create a new NVML backend
    pub fn new() -> Self {
        Self
    }
}

impl GpuBackend for NvmlBackend {
    type Session = NvmlSession;

    fn open(&self) -> Result<NvmlSession, NvmlError> {
        let nvml = Nvml::init().map_err(|e| match e {
            nvml_wrapper::error::NvmlError::LibloadingError(_) => NvmlError::LibraryNotFound,
            nvml_wrapper::error::NvmlError::DriverNotLoaded => {
                NvmlError::InitializationFailed("NVIDIA driver not loaded".to_string())
            }
            other => NvmlError::InitializationFailed(other.to_string()),
        })?;

        Ok(NvmlSession { nvml })
    }
}

/// One initialized NVML session
///
/// nvml-wrapper calls nvmlShutdown when the inner handle drops, so the
/// library is released on every poll exit path, including early returns.
pub struct NvmlSession {
    nvml: Nvml,
}

impl TelemetrySession for NvmlSession {
    type Device = NvmlDevice<'static>;

    fn driver_version(&self) -> Result<String, NvmlError> {
        self.nvml
            .sys_driver_version()
            .map_err(|e| NvmlError::Unknown(e.to_string()))
    }

    fn device_count(&self) -> Result<u32, NvmlError> {
        self.nvml
            .device_count()
            .map_err(|e| NvmlError::Unknown(e.to_string()))
    }

    fn device_by_index(&self, index: u32) -> Result<Self::Device, NvmlError> {
        // SAFETY: We're extending the lifetime here which is safe because
        // the NvmlDevice only lives as long as the NvmlSession.
        // This is a limitation of the nvml-wrapper API design.
        let nvml: &'static Nvml = unsafe { std::mem::transmute(&self.nvml) };

        let device = nvml.device_by_index(index).map_err(|e| match e {
            nvml_wrapper::error::NvmlError::NotFound => NvmlError::DeviceNotFound(index),
            other => NvmlError::Unknown(other.to_string()),
        })?;

        Ok(NvmlDevice::new(device, index))
    }

    fn process_name(&self, pid: u32) -> Result<String, NvmlError> {
        self.nvml
            .sys_process_name(pid, PROCESS_NAME_LENGTH)
            .map_err(|e| match e {
                nvml_wrapper::error::NvmlError::NotFound => {
                    NvmlError::NotSupported(format!("No process with PID {}", pid))
                }
                other => NvmlError::Unknown(other.to_string()),
            })
    }
}
