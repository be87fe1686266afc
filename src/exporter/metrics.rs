//! Gauge registry for the exporter
//!
//! The fixed metric surface, namespaced `nvidia`. The health indicator gets
//! its own registry so a failed poll can be rendered as exactly one metric.

use prometheus::{GaugeVec, IntGauge, IntGaugeVec, Opts, Registry, TextEncoder};

/// Namespace prefix for every exported metric
pub const NAMESPACE: &str = "nvidia";

/// All gauges published by the exporter
pub struct MetricSet {
    health_registry: Registry,
    telemetry_registry: Registry,

    pub up: IntGauge,
    pub driver_info: IntGaugeVec,
    pub device_count: IntGauge,
    pub info: IntGaugeVec,
    pub temperatures: GaugeVec,
    pub power_usage: GaugeVec,
    pub power_usage_average: GaugeVec,
    pub fan_speed: GaugeVec,
    pub memory_total: GaugeVec,
    pub memory_used: GaugeVec,
    pub utilization_memory: GaugeVec,
    pub utilization_gpu: GaugeVec,
    pub utilization_gpu_average: GaugeVec,
    pub clock_current_graphics: GaugeVec,
    pub clock_app_default_graphics: GaugeVec,
    pub pcie_tx_bytes: GaugeVec,
    pub pcie_rx_bytes: GaugeVec,
    pub process_name: IntGaugeVec,
    pub process_sm_util: GaugeVec,
    pub process_mem_util: GaugeVec,
    pub process_enc_util: GaugeVec,
    pub process_dec_util: GaugeVec,
}

impl MetricSet {
    /// Build and register the full gauge set
    pub fn new() -> Result<Self, prometheus::Error> {
        let health_registry = Registry::new();
        let telemetry_registry = Registry::new();

        let up = IntGauge::with_opts(
            Opts::new("up", "NVML metric collection operational").namespace(NAMESPACE),
        )?;
        health_registry.register(Box::new(up.clone()))?;

        let device_count = IntGauge::with_opts(
            Opts::new("device_count", "Count of found NVIDIA devices").namespace(NAMESPACE),
        )?;
        telemetry_registry.register(Box::new(device_count.clone()))?;

        macro_rules! gauge_vec {
            ($name:literal, $help:literal, $labels:expr) => {{
                let vec = GaugeVec::new(Opts::new($name, $help).namespace(NAMESPACE), $labels)?;
                telemetry_registry.register(Box::new(vec.clone()))?;
                vec
            }};
        }

        macro_rules! int_gauge_vec {
            ($name:literal, $help:literal, $labels:expr) => {{
                let vec = IntGaugeVec::new(Opts::new($name, $help).namespace(NAMESPACE), $labels)?;
                telemetry_registry.register(Box::new(vec.clone()))?;
                vec
            }};
        }

        Ok(Self {
            up,
            device_count,
            driver_info: int_gauge_vec!("driver_info", "NVML driver information", &["version"]),
            info: int_gauge_vec!(
                "info",
                "Information about the GPU device",
                &["index", "minor", "uuid", "name"]
            ),
            temperatures: gauge_vec!(
                "temperatures",
                "Temperature of the GPU device in degrees C",
                &["minor"]
            ),
            power_usage: gauge_vec!(
                "power_usage",
                "Power usage of the GPU device in milliwatts",
                &["minor"]
            ),
            power_usage_average: gauge_vec!(
                "power_usage_average",
                "Power usage of the GPU device in milliwatts, averaged over 10 seconds",
                &["minor"]
            ),
            fan_speed: gauge_vec!(
                "fanspeed",
                "Fan speed of the GPU device as a percentage",
                &["minor"]
            ),
            memory_total: gauge_vec!(
                "memory_total",
                "Total memory of the GPU device in bytes",
                &["minor"]
            ),
            memory_used: gauge_vec!(
                "memory_used",
                "Used memory of the GPU device in bytes",
                &["minor"]
            ),
            utilization_memory: gauge_vec!(
                "utilization_memory",
                "Memory utilization of the GPU device as a percentage",
                &["minor"]
            ),
            utilization_gpu: gauge_vec!(
                "utilization_gpu",
                "GPU utilization of the GPU device as a percentage",
                &["minor"]
            ),
            utilization_gpu_average: gauge_vec!(
                "utilization_gpu_average",
                "GPU utilization of the GPU device as a percentage, averaged over 10 seconds",
                &["minor"]
            ),
            clock_current_graphics: gauge_vec!(
                "clock_current_graphics",
                "Current graphics clock of the GPU device in MHz",
                &["minor"]
            ),
            clock_app_default_graphics: gauge_vec!(
                "clock_appdefault_graphics",
                "Application default graphics clock of the GPU device in MHz",
                &["minor"]
            ),
            pcie_tx_bytes: gauge_vec!(
                "pcie_tx_bytes",
                "PCIe TX throughput of the GPU device in bytes per second",
                &["minor"]
            ),
            pcie_rx_bytes: gauge_vec!(
                "pcie_rx_bytes",
                "PCIe RX throughput of the GPU device in bytes per second",
                &["minor"]
            ),
            process_name: int_gauge_vec!(
                "utilization_process_name",
                "Name of the process on the GPU device",
                &["minor", "pid", "name"]
            ),
            process_sm_util: gauge_vec!(
                "utilization_process_smutil",
                "SM utilization of the process as a percentage",
                &["minor", "pid"]
            ),
            process_mem_util: gauge_vec!(
                "utilization_process_memutil",
                "Memory utilization of the process as a percentage",
                &["minor", "pid"]
            ),
            process_enc_util: gauge_vec!(
                "utilization_process_encutil",
                "Encoder utilization of the process as a percentage",
                &["minor", "pid"]
            ),
            process_dec_util: gauge_vec!(
                "utilization_process_decutil",
                "Decoder utilization of the process as a percentage",
                &["minor", "pid"]
            ),
            health_registry,
            telemetry_registry,
        })
    }

    /// Encode the gathered gauges in text exposition format
    ///
    /// The telemetry registry is included only when the last poll succeeded,
    /// so a failed poll yields the health indicator alone.
    pub fn render(&self, healthy: bool) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buffer = String::new();

        encoder.encode_utf8(&self.health_registry.gather(), &mut buffer)?;
        if healthy {
            encoder.encode_utf8(&self.telemetry_registry.gather(), &mut buffer)?;
        }

        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gauge_set_registers() {
        let metrics = MetricSet::new().unwrap();
        metrics.up.set(1);
        let output = metrics.render(true).unwrap();
        assert!(output.contains("nvidia_up 1"));
    }

    #[test]
    fn test_unhealthy_render_omits_telemetry_registry() {
        let metrics = MetricSet::new().unwrap();
        metrics.up.set(0);
        metrics.device_count.set(2);
        let output = metrics.render(false).unwrap();
        assert!(output.contains("nvidia_up 0"));
        assert!(!output.contains("nvidia_device_count"));
    }
}
