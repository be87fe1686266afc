//! Trait definitions for GPU telemetry queries
//!
//! These traits abstract over NVML to enable testing with mocks.

use std::time::Duration;

use crate::domain::{MemoryInfo, ProcessSample, Utilization};
use crate::error::NvmlError;

/// Opens one NVML session per poll
///
/// Each scrape acquires a fresh session and releases it when the session is
/// dropped, whatever path the poll took.
pub trait GpuBackend: Send + Sync {
    /// The session type produced by this backend
    type Session: TelemetrySession;

    /// Initialize the library and open a session
    fn open(&self) -> Result<Self::Session, NvmlError>;
}

/// One initialized NVML session
pub trait TelemetrySession {
    /// The device type handed out by this session
    type Device: DeviceTelemetry;

    /// Get the driver version
    fn driver_version(&self) -> Result<String, NvmlError>;

    /// Get the number of GPU devices
    fn device_count(&self) -> Result<u32, NvmlError>;

    /// Get a device by index
    fn device_by_index(&self, index: u32) -> Result<Self::Device, NvmlError>;

    /// Resolve a process name by PID
    fn process_name(&self, pid: u32) -> Result<String, NvmlError>;
}

/// Per-device telemetry accessors
///
/// Every accessor fails independently; a GPU that cannot serve one query can
/// still serve the others.
pub trait DeviceTelemetry {
    /// Get the device index
    fn index(&self) -> u32;

    /// Get the device UUID
    fn uuid(&self) -> Result<String, NvmlError>;

    /// Get the product name
    fn name(&self) -> Result<String, NvmlError>;

    /// Get the minor number
    fn minor_number(&self) -> Result<u32, NvmlError>;

    /// Get current GPU temperature in degrees Celsius
    fn temperature(&self) -> Result<f64, NvmlError>;

    /// Get instantaneous power draw in milliwatts
    fn power_usage(&self) -> Result<f64, NvmlError>;

    /// Get power draw in milliwatts, averaged over `window` from the
    /// driver's sample buffer
    fn power_usage_average(&self, window: Duration) -> Result<f64, NvmlError>;

    /// Get fan speed as a percentage
    fn fan_speed(&self) -> Result<f64, NvmlError>;

    /// Get memory (VRAM) counters
    fn memory_info(&self) -> Result<MemoryInfo, NvmlError>;

    /// Get GPU and memory utilization rates
    fn utilization_rates(&self) -> Result<Utilization, NvmlError>;

    /// Get GPU utilization averaged over `window` from the driver's sample
    /// buffer
    fn utilization_gpu_average(&self, window: Duration) -> Result<f64, NvmlError>;

    /// Get the current graphics clock in MHz
    fn clock_current_graphics(&self) -> Result<f64, NvmlError>;

    /// Get the default application graphics clock in MHz
    fn clock_app_default_graphics(&self) -> Result<f64, NvmlError>;

    /// Get PCIe transmit throughput in bytes per second
    fn pcie_tx_bytes(&self) -> Result<f64, NvmlError>;

    /// Get PCIe receive throughput in bytes per second
    fn pcie_rx_bytes(&self) -> Result<f64, NvmlError>;

    /// Get utilization samples for processes seen within `window`, at most
    /// `max_samples` of them
    fn process_utilization(
        &self,
        max_samples: usize,
        window: Duration,
    ) -> Result<Vec<ProcessSample>, NvmlError>;
}
