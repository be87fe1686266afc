//! Mock implementations for testing
//!
//! Provides a mock backend, session, and device for unit testing without
//! real hardware. `None`-valued fields report `NvmlError::NotSupported`,
//! mimicking a GPU that cannot serve that query.

use std::collections::HashMap;
use std::time::Duration;

use crate::domain::{MemoryInfo, ProcessSample, Utilization};
use crate::error::NvmlError;
use crate::nvml::{DeviceTelemetry, GpuBackend, TelemetrySession};

/// Mock GPU device with per-field failure injection
#[derive(Debug, Clone)]
pub struct MockDevice {
    index: u32,
    uuid: Option<String>,
    name: Option<String>,
    minor_number: Option<u32>,
    temperature: Option<f64>,
    power_usage: Option<f64>,
    power_usage_average: Option<f64>,
    fan_speed: Option<f64>,
    memory: Option<MemoryInfo>,
    utilization: Option<Utilization>,
    utilization_gpu_average: Option<f64>,
    clock_current_graphics: Option<f64>,
    clock_app_default_graphics: Option<f64>,
    pcie_tx_bytes: Option<f64>,
    pcie_rx_bytes: Option<f64>,
    process_samples: Option<Vec<ProcessSample>>,
}

impl MockDevice {
    /// Create a new mock device with default values
    pub fn new(index: u32) -> Self {
        Self {
            index,
            uuid: Some(format!("GPU-MOCK-{:04}", index)),
            name: Some(format!("Mock GPU {}", index)),
            minor_number: Some(index),
            temperature: Some(45.0),
            power_usage: Some(150_000.0),
            power_usage_average: Some(140_000.0),
            fan_speed: Some(50.0),
            memory: Some(MemoryInfo::new(8_589_934_592, 2_147_483_648)),
            utilization: Some(Utilization::new(30, 20)),
            utilization_gpu_average: Some(25.0),
            clock_current_graphics: Some(1800.0),
            clock_app_default_graphics: Some(1500.0),
            pcie_tx_bytes: Some(1_048_576.0),
            pcie_rx_bytes: Some(2_097_152.0),
            process_samples: Some(Vec::new()),
        }
    }

    /// Builder: set or fail the UUID lookup
    pub fn with_uuid(mut self, uuid: Option<String>) -> Self {
        self.uuid = uuid;
        self
    }

    /// Builder: set or fail the name lookup
    pub fn with_name(mut self, name: Option<String>) -> Self {
        self.name = name;
        self
    }

    /// Builder: set or fail the minor-number lookup
    pub fn with_minor_number(mut self, minor_number: Option<u32>) -> Self {
        self.minor_number = minor_number;
        self
    }

    /// Builder: set or fail the temperature query
    pub fn with_temperature(mut self, temperature: Option<f64>) -> Self {
        self.temperature = temperature;
        self
    }

    /// Builder: set or fail the power usage query
    pub fn with_power_usage(mut self, power_usage: Option<f64>) -> Self {
        self.power_usage = power_usage;
        self
    }

    /// Builder: set or fail the fan speed query
    pub fn with_fan_speed(mut self, fan_speed: Option<f64>) -> Self {
        self.fan_speed = fan_speed;
        self
    }

    /// Builder: set or fail the memory query
    pub fn with_memory(mut self, memory: Option<MemoryInfo>) -> Self {
        self.memory = memory;
        self
    }

    /// Builder: set or fail the utilization query
    pub fn with_utilization(mut self, utilization: Option<Utilization>) -> Self {
        self.utilization = utilization;
        self
    }

    /// Builder: set the process utilization samples
    pub fn with_process_samples(mut self, samples: Vec<ProcessSample>) -> Self {
        self.process_samples = Some(samples);
        self
    }

    /// Builder: make the process utilization query fail
    pub fn with_process_failure(mut self) -> Self {
        self.process_samples = None;
        self
    }
}

/// `None`-valued mock fields report NotSupported
fn unavailable<T: Clone>(value: &Option<T>, what: &str) -> Result<T, NvmlError> {
    value
        .clone()
        .ok_or_else(|| NvmlError::NotSupported(format!("{} not supported on this GPU", what)))
}

impl DeviceTelemetry for MockDevice {
    fn index(&self) -> u32 {
        self.index
    }

    fn uuid(&self) -> Result<String, NvmlError> {
        unavailable(&self.uuid, "UUID")
    }

    fn name(&self) -> Result<String, NvmlError> {
        unavailable(&self.name, "name")
    }

    fn minor_number(&self) -> Result<u32, NvmlError> {
        unavailable(&self.minor_number, "minor number")
    }

    fn temperature(&self) -> Result<f64, NvmlError> {
        unavailable(&self.temperature, "temperature")
    }

    fn power_usage(&self) -> Result<f64, NvmlError> {
        unavailable(&self.power_usage, "power usage")
    }

    fn power_usage_average(&self, _window: Duration) -> Result<f64, NvmlError> {
        unavailable(&self.power_usage_average, "average power usage")
    }

    fn fan_speed(&self) -> Result<f64, NvmlError> {
        unavailable(&self.fan_speed, "fan speed")
    }

    fn memory_info(&self) -> Result<MemoryInfo, NvmlError> {
        unavailable(&self.memory, "memory info")
    }

    fn utilization_rates(&self) -> Result<Utilization, NvmlError> {
        unavailable(&self.utilization, "utilization rates")
    }

    fn utilization_gpu_average(&self, _window: Duration) -> Result<f64, NvmlError> {
        unavailable(&self.utilization_gpu_average, "average GPU utilization")
    }

    fn clock_current_graphics(&self) -> Result<f64, NvmlError> {
        unavailable(&self.clock_current_graphics, "graphics clock")
    }

    fn clock_app_default_graphics(&self) -> Result<f64, NvmlError> {
        unavailable(
            &self.clock_app_default_graphics,
            "application default graphics clock",
        )
    }

    fn pcie_tx_bytes(&self) -> Result<f64, NvmlError> {
        unavailable(&self.pcie_tx_bytes, "PCIe TX throughput")
    }

    fn pcie_rx_bytes(&self) -> Result<f64, NvmlError> {
        unavailable(&self.pcie_rx_bytes, "PCIe RX throughput")
    }

    fn process_utilization(
        &self,
        max_samples: usize,
        _window: Duration,
    ) -> Result<Vec<ProcessSample>, NvmlError> {
        let samples = unavailable(&self.process_samples, "process utilization")?;
        Ok(samples.into_iter().take(max_samples).collect())
    }
}

/// Mock NVML session over a fixed device list
#[derive(Debug, Clone)]
pub struct MockSession {
    devices: Vec<MockDevice>,
    driver_version: Option<String>,
    fail_device_count: bool,
    process_names: HashMap<u32, String>,
}

impl MockSession {
    /// Create a session over the given devices
    pub fn new(devices: Vec<MockDevice>) -> Self {
        Self {
            devices,
            driver_version: Some("550.54.14".to_string()),
            fail_device_count: false,
            process_names: HashMap::new(),
        }
    }

    /// Builder: set or fail the driver version lookup
    pub fn with_driver_version(mut self, version: Option<String>) -> Self {
        self.driver_version = version;
        self
    }

    /// Builder: make device enumeration fail
    pub fn with_device_count_failure(mut self) -> Self {
        self.fail_device_count = true;
        self
    }

    /// Builder: register a resolvable process name
    pub fn with_process_name(mut self, pid: u32, name: impl Into<String>) -> Self {
        self.process_names.insert(pid, name.into());
        self
    }
}

impl TelemetrySession for MockSession {
    type Device = MockDevice;

    fn driver_version(&self) -> Result<String, NvmlError> {
        unavailable(&self.driver_version, "driver version")
    }

    fn device_count(&self) -> Result<u32, NvmlError> {
        if self.fail_device_count {
            return Err(NvmlError::Unknown("mock enumeration failure".to_string()));
        }
        Ok(self.devices.len() as u32)
    }

    fn device_by_index(&self, index: u32) -> Result<MockDevice, NvmlError> {
        self.devices
            .get(index as usize)
            .cloned()
            .ok_or(NvmlError::DeviceNotFound(index))
    }

    fn process_name(&self, pid: u32) -> Result<String, NvmlError> {
        self.process_names
            .get(&pid)
            .cloned()
            .ok_or_else(|| NvmlError::NotSupported(format!("No process with PID {}", pid)))
    }
}

/// Mock backend handing out clones of a prepared session
#[derive(Debug, Clone)]
pub struct MockBackend {
    session: MockSession,
    fail_init: bool,
}

impl MockBackend {
    /// Create a backend that opens the given session
    pub fn new(session: MockSession) -> Self {
        Self {
            session,
            fail_init: false,
        }
    }

    /// Create a backend whose initialization always fails
    pub fn failing_init() -> Self {
        Self {
            session: MockSession::new(Vec::new()),
            fail_init: true,
        }
    }
}

impl GpuBackend for MockBackend {
    type Session = MockSession;

    fn open(&self) -> Result<MockSession, NvmlError> {
        if self.fail_init {
            return Err(NvmlError::InitializationFailed(
                "mock initialization failure".to_string(),
            ));
        }
        Ok(self.session.clone())
    }
}
