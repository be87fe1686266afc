//! Metric projection
//!
//! Maps one poll outcome onto the gauge registry, applying the
//! degraded-field policy (unavailable fields become absent series, never
//! error values) and the stale-process retraction policy.

pub mod metrics;

pub use metrics::{MetricSet, NAMESPACE};

use std::collections::HashMap;

use prometheus::GaugeVec;

use crate::domain::{DeviceReading, Snapshot};
use crate::error::PollError;

/// Label combination published for one process in a previous poll
///
/// Remembered so the exact series can be retracted on the next poll; the
/// name label cannot be reconstructed from a later snapshot once the process
/// is gone.
#[derive(Debug, Clone, PartialEq, Eq)]
struct PublishedProcess {
    pid: String,
    name: String,
}

/// Projects poll outcomes onto the gauge set
///
/// Holds the only state that survives across polls: the per-device table of
/// process label sets published last time. Projection and polling are
/// serialized by the scrape loop, so no internal locking is needed.
pub struct Projector {
    metrics: MetricSet,
    healthy: bool,
    /// Process label sets published in the previous poll, keyed by minor number
    published_processes: HashMap<String, Vec<PublishedProcess>>,
}

impl Projector {
    /// Create a projector with a freshly registered gauge set
    pub fn new() -> Result<Self, prometheus::Error> {
        Ok(Self {
            metrics: MetricSet::new()?,
            healthy: false,
            published_processes: HashMap::new(),
        })
    }

    /// Apply one poll outcome to the gauge state
    pub fn project(&mut self, poll: &Result<Snapshot, PollError>) {
        match poll {
            Ok(snapshot) => {
                self.metrics.up.set(1);
                self.healthy = true;
                self.project_snapshot(snapshot);
            }
            Err(e) => {
                log::error!("Poll failed: {}", e);
                self.metrics.up.set(0);
                self.healthy = false;
            }
        }
    }

    /// Encode the current gauge state in text exposition format
    pub fn render(&self) -> Result<String, prometheus::Error> {
        self.metrics.render(self.healthy)
    }

    fn project_snapshot(&mut self, snapshot: &Snapshot) {
        self.metrics.driver_info.reset();
        self.metrics
            .driver_info
            .with_label_values(&[&snapshot.driver_version])
            .set(1);

        self.metrics.device_count.set(snapshot.device_count() as i64);

        self.metrics.info.reset();
        for device in &snapshot.devices {
            self.project_device(device);
        }
    }

    fn project_device(&mut self, device: &DeviceReading) {
        let index = device.index.to_string();
        let minor = device.minor_number.to_string();

        self.metrics
            .info
            .with_label_values(&[&index, &minor, &device.uuid, &device.name])
            .set(1);

        set_or_remove(&self.metrics.temperatures, &minor, device.temperature);
        set_or_remove(&self.metrics.power_usage, &minor, device.power_usage);
        set_or_remove(
            &self.metrics.power_usage_average,
            &minor,
            device.power_usage_average,
        );
        set_or_remove(&self.metrics.fan_speed, &minor, device.fan_speed);
        set_or_remove(&self.metrics.memory_total, &minor, device.memory_total);
        set_or_remove(&self.metrics.memory_used, &minor, device.memory_used);
        set_or_remove(
            &self.metrics.utilization_memory,
            &minor,
            device.utilization_memory,
        );
        set_or_remove(&self.metrics.utilization_gpu, &minor, device.utilization_gpu);
        set_or_remove(
            &self.metrics.utilization_gpu_average,
            &minor,
            device.utilization_gpu_average,
        );
        set_or_remove(
            &self.metrics.clock_current_graphics,
            &minor,
            device.clock_current_graphics,
        );
        set_or_remove(
            &self.metrics.clock_app_default_graphics,
            &minor,
            device.clock_app_default_graphics,
        );
        set_or_remove(&self.metrics.pcie_tx_bytes, &minor, device.pcie_tx_bytes);
        set_or_remove(&self.metrics.pcie_rx_bytes, &minor, device.pcie_rx_bytes);

        self.project_processes(&minor, device);
    }

    /// Retract the previous poll's process series, set the current ones,
    /// then remember them for the next poll
    fn project_processes(&mut self, minor: &str, device: &DeviceReading) {
        if let Some(previous) = self.published_processes.remove(minor) {
            for process in &previous {
                let _ = self
                    .metrics
                    .process_name
                    .remove_label_values(&[minor, &process.pid, &process.name]);
                let _ = self
                    .metrics
                    .process_sm_util
                    .remove_label_values(&[minor, &process.pid]);
                let _ = self
                    .metrics
                    .process_mem_util
                    .remove_label_values(&[minor, &process.pid]);
                let _ = self
                    .metrics
                    .process_enc_util
                    .remove_label_values(&[minor, &process.pid]);
                let _ = self
                    .metrics
                    .process_dec_util
                    .remove_label_values(&[minor, &process.pid]);
            }
        }

        if device.processes.is_empty() {
            return;
        }

        let mut published = Vec::with_capacity(device.processes.len());
        for process in &device.processes {
            let pid = process.pid.to_string();
            let name = process.label_name();

            self.metrics
                .process_name
                .with_label_values(&[minor, &pid, name])
                .set(i64::from(process.resolved()));
            self.metrics
                .process_sm_util
                .with_label_values(&[minor, &pid])
                .set(f64::from(process.sm_util));
            self.metrics
                .process_mem_util
                .with_label_values(&[minor, &pid])
                .set(f64::from(process.mem_util));
            self.metrics
                .process_enc_util
                .with_label_values(&[minor, &pid])
                .set(f64::from(process.enc_util));
            self.metrics
                .process_dec_util
                .with_label_values(&[minor, &pid])
                .set(f64::from(process.dec_util));

            published.push(PublishedProcess {
                pid,
                name: name.to_string(),
            });
        }
        self.published_processes.insert(minor.to_string(), published);
    }
}

/// Set a per-device series, or remove it when the field is unavailable
fn set_or_remove(gauge: &GaugeVec, minor: &str, value: Option<f64>) {
    match value {
        Some(v) => gauge.with_label_values(&[minor]).set(v),
        None => {
            let _ = gauge.remove_label_values(&[minor]);
        }
    }
}
