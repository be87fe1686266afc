//! Snapshot of one poll cycle

use crate::domain::process::ProcessReading;

/// Memory counters reported together by one device query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryInfo {
    /// Total memory in bytes
    pub total: u64,
    /// Used memory in bytes
    pub used: u64,
}

impl MemoryInfo {
    /// Create a new memory info
    pub fn new(total: u64, used: u64) -> Self {
        Self { total, used }
    }
}

/// GPU and memory utilization reported together by one device query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Utilization {
    /// GPU utilization percentage
    pub gpu: u32,
    /// Memory utilization percentage
    pub memory: u32,
}

impl Utilization {
    /// Create a new utilization pair
    pub fn new(gpu: u32, memory: u32) -> Self {
        Self { gpu, memory }
    }
}

/// Best-effort reading of one device
///
/// Identity fields are always present; a device whose identity cannot be
/// resolved is skipped by the collector and never becomes a reading. Every
/// telemetry field is independently optional: `None` means the query failed
/// for this poll, and the corresponding series is omitted from output rather
/// than published with an error value.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceReading {
    /// Device index within this snapshot's enumeration
    pub index: u32,
    /// Minor number, stable key for all per-device series
    pub minor_number: u32,
    /// Product name
    pub name: String,
    /// Globally stable device UUID
    pub uuid: String,
    /// Temperature in degrees Celsius
    pub temperature: Option<f64>,
    /// Instantaneous power draw in milliwatts
    pub power_usage: Option<f64>,
    /// Power draw in milliwatts averaged by the driver's sample buffer
    pub power_usage_average: Option<f64>,
    /// Fan speed percentage
    pub fan_speed: Option<f64>,
    /// Total memory in bytes
    pub memory_total: Option<f64>,
    /// Used memory in bytes
    pub memory_used: Option<f64>,
    /// GPU utilization percentage
    pub utilization_gpu: Option<f64>,
    /// Memory utilization percentage
    pub utilization_memory: Option<f64>,
    /// GPU utilization percentage averaged by the driver's sample buffer
    pub utilization_gpu_average: Option<f64>,
    /// Current graphics clock in MHz
    pub clock_current_graphics: Option<f64>,
    /// Default application graphics clock in MHz
    pub clock_app_default_graphics: Option<f64>,
    /// PCIe transmit throughput in bytes per second
    pub pcie_tx_bytes: Option<f64>,
    /// PCIe receive throughput in bytes per second
    pub pcie_rx_bytes: Option<f64>,
    /// Processes sampled on this device; empty when per-process collection
    /// is disabled or the query failed
    pub processes: Vec<ProcessReading>,
}

impl DeviceReading {
    /// Create a reading with resolved identity and no telemetry
    pub fn new(
        index: u32,
        minor_number: u32,
        name: impl Into<String>,
        uuid: impl Into<String>,
    ) -> Self {
        Self {
            index,
            minor_number,
            name: name.into(),
            uuid: uuid.into(),
            temperature: None,
            power_usage: None,
            power_usage_average: None,
            fan_speed: None,
            memory_total: None,
            memory_used: None,
            utilization_gpu: None,
            utilization_memory: None,
            utilization_gpu_average: None,
            clock_current_graphics: None,
            clock_app_default_graphics: None,
            pcie_tx_bytes: None,
            pcie_rx_bytes: None,
            processes: Vec::new(),
        }
    }
}

/// One full poll result
///
/// Created fresh per poll, projected once, then discarded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    /// Driver version string; empty when the lookup failed
    pub driver_version: String,
    /// Devices in enumeration order
    pub devices: Vec<DeviceReading>,
}

impl Snapshot {
    /// Number of devices in this snapshot
    pub fn device_count(&self) -> usize {
        self.devices.len()
    }
}
