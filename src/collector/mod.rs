//! Poll-cycle orchestration
//!
//! One scrape triggers one full NVML cycle: session open, driver version,
//! device enumeration, per-device field queries, optional per-process
//! sampling, session release.

use std::time::Duration;

use crate::domain::{DeviceReading, ProcessReading, Snapshot};
use crate::error::{NvmlError, PollError};
use crate::nvml::{DeviceTelemetry, GpuBackend, TelemetrySession};

/// Configuration for the collector
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// Collect per-process utilization samples
    pub per_process: bool,
    /// Averaging window handed to the NVML sample queries
    pub average_window: Duration,
    /// Upper bound on process samples per device
    pub max_process_samples: usize,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            per_process: false,
            average_window: Duration::from_secs(10),
            max_process_samples: 10,
        }
    }
}

/// Collects one best-effort snapshot per scrape
pub struct Collector<B> {
    backend: B,
    config: CollectorConfig,
}

impl<B: GpuBackend> Collector<B> {
    /// Create a new collector over the given backend
    pub fn new(backend: B, config: CollectorConfig) -> Self {
        Self { backend, config }
    }

    /// Run one full poll cycle
    ///
    /// Session init and device enumeration failures are fatal for the poll;
    /// everything below them degrades per device or per field. The session
    /// is released when it goes out of scope, on every path.
    pub fn poll(&self) -> Result<Snapshot, PollError> {
        let session = self.backend.open().map_err(PollError::InitFailed)?;

        let driver_version = match session.driver_version() {
            Ok(version) => version,
            Err(e) => {
                log::warn!("Failed to get driver version: {}", e);
                String::new()
            }
        };

        let count = session
            .device_count()
            .map_err(PollError::EnumerationFailed)?;

        let mut devices = Vec::with_capacity(count as usize);
        for index in 0..count {
            if let Some(reading) = self.collect_device(&session, index) {
                devices.push(reading);
            }
        }

        Ok(Snapshot {
            driver_version,
            devices,
        })
    }

    /// Query one device
    ///
    /// Identity failures skip the device so one broken GPU cannot blank out
    /// the rest; telemetry failures suppress only the affected field.
    fn collect_device(&self, session: &B::Session, index: u32) -> Option<DeviceReading> {
        let device = match session.device_by_index(index) {
            Ok(device) => device,
            Err(e) => {
                log::warn!("Failed to get handle for device {}: {}; skipping", index, e);
                return None;
            }
        };

        let uuid = identity(device.uuid(), index, "UUID")?;
        let name = identity(device.name(), index, "name")?;
        let minor_number = identity(device.minor_number(), index, "minor number")?;

        let memory = field(device.memory_info(), index, "memory info");
        let utilization = field(device.utilization_rates(), index, "utilization rates");
        let window = self.config.average_window;

        let mut reading = DeviceReading {
            index,
            minor_number,
            name,
            uuid,
            temperature: field(device.temperature(), index, "temperature"),
            power_usage: field(device.power_usage(), index, "power usage"),
            power_usage_average: field(
                device.power_usage_average(window),
                index,
                "average power usage",
            ),
            fan_speed: field(device.fan_speed(), index, "fan speed"),
            memory_total: memory.map(|m| m.total as f64),
            memory_used: memory.map(|m| m.used as f64),
            utilization_gpu: utilization.map(|u| f64::from(u.gpu)),
            utilization_memory: utilization.map(|u| f64::from(u.memory)),
            utilization_gpu_average: field(
                device.utilization_gpu_average(window),
                index,
                "average GPU utilization",
            ),
            clock_current_graphics: field(
                device.clock_current_graphics(),
                index,
                "graphics clock",
            ),
            clock_app_default_graphics: field(
                device.clock_app_default_graphics(),
                index,
                "application default graphics clock",
            ),
            pcie_tx_bytes: field(device.pcie_tx_bytes(), index, "PCIe TX throughput"),
            pcie_rx_bytes: field(device.pcie_rx_bytes(), index, "PCIe RX throughput"),
            processes: Vec::new(),
        };

        if self.config.per_process {
            reading.processes = self.collect_processes(session, &device, index);
        }

        Some(reading)
    }

    /// Sample process utilization on one device
    ///
    /// A failed query leaves the process list empty without touching the
    /// device's other fields; a failed name lookup leaves that one process
    /// unnamed.
    fn collect_processes(
        &self,
        session: &B::Session,
        device: &<B::Session as TelemetrySession>::Device,
        index: u32,
    ) -> Vec<ProcessReading> {
        let samples = match device
            .process_utilization(self.config.max_process_samples, self.config.average_window)
        {
            Ok(samples) => samples,
            Err(e) => {
                log::warn!(
                    "Failed to get process utilization for device {}: {}",
                    index,
                    e
                );
                return Vec::new();
            }
        };
        log::debug!("Device {}: {} process samples", index, samples.len());

        samples
            .into_iter()
            .map(|sample| {
                let name = match session.process_name(sample.pid) {
                    Ok(name) => Some(name),
                    Err(e) => {
                        log::warn!("Failed to resolve name for PID {}: {}", sample.pid, e);
                        None
                    }
                };
                ProcessReading::from_sample(sample, name)
            })
            .collect()
    }
}

/// Identity lookups are mandatory for a device; a failure skips it
fn identity<T>(result: Result<T, NvmlError>, index: u32, what: &str) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            log::warn!(
                "Failed to get {} for device {}: {}; skipping device",
                what,
                index,
                e
            );
            None
        }
    }
}

/// Telemetry fields degrade independently; a failure suppresses only the
/// affected series for this poll
fn field<T>(result: Result<T, NvmlError>, index: u32, what: &str) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            log::debug!("Unable to collect {} for device {}: {}", what, index, e);
            None
        }
    }
}
