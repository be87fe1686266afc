//! NVML device implementation
//!
//! Real implementation of the DeviceTelemetry trait using nvml-wrapper.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::domain::{MemoryInfo, ProcessSample, Utilization};
use crate::error::NvmlError;
use crate::nvml::traits::DeviceTelemetry;

use nvml_wrapper::enum_wrappers::device::{
    Clock, ClockId, PcieUtilCounter, Sampling, TemperatureSensor,
};
use nvml_wrapper::enums::device::SampleValue;
use nvml_wrapper::struct_wrappers::device::Sample;
use nvml_wrapper::Device;

/// NVML device wrapper implementing the DeviceTelemetry trait
pub struct NvmlDevice<'a> {
    device: Device<'a>,
    index: u32,
}

impl<'a> NvmlDevice<'a> {
    /// Create a new NVML device wrapper
    pub fn new(device: Device<'a>, index: u32) -> Self {
        Self { device, index }
    }

    /// Convert NVML error to our error type
    fn convert_error(err: nvml_wrapper::error::NvmlError) -> NvmlError {
        use nvml_wrapper::error::NvmlError as NE;
        match err {
            NE::NotSupported => {
                NvmlError::NotSupported("Operation not supported by this GPU".to_string())
            }
            NE::NoPermission => {
                NvmlError::InsufficientPermissions("Insufficient permissions".to_string())
            }
            NE::GpuLost => NvmlError::GpuLost,
            _ => NvmlError::Unknown(err.to_string()),
        }
    }
}

impl DeviceTelemetry for NvmlDevice<'_> {
    fn index(&self) -> u32 {
        self.index
    }

    fn uuid(&self) -> Result<String, NvmlError> {
        self.device.uuid().map_err(Self::convert_error)
    }

    fn name(&self) -> Result<String, NvmlError> {
        self.device.name().map_err(Self::convert_error)
    }

    fn minor_number(&self) -> Result<u32, NvmlError> {
        self.device.minor_number().map_err(Self::convert_error)
    }

    fn temperature(&self) -> Result<f64, NvmlError> {
        let temp = self
            .device
            .temperature(TemperatureSensor::Gpu)
            .map_err(Self::convert_error)?;
        Ok(f64::from(temp))
    }

    fn power_usage(&self) -> Result<f64, NvmlError> {
        let usage_mw = self.device.power_usage().map_err(Self::convert_error)?;
        Ok(f64::from(usage_mw))
    }

    fn power_usage_average(&self, window: Duration) -> Result<f64, NvmlError> {
        let samples = self
            .device
            .samples(Sampling::Power, last_seen_timestamp(window))
            .map_err(Self::convert_error)?;

        mean_sample_value(&samples)
            .ok_or_else(|| NvmlError::NotSupported("No power samples available".to_string()))
    }

    fn fan_speed(&self) -> Result<f64, NvmlError> {
        let speed = self.device.fan_speed(0).map_err(Self::convert_error)?;
        Ok(f64::from(speed))
    }

    fn memory_info(&self) -> Result<MemoryInfo, NvmlError> {
        let mem = self.device.memory_info().map_err(Self::convert_error)?;
        Ok(MemoryInfo::new(mem.total, mem.used))
    }

    fn utilization_rates(&self) -> Result<Utilization, NvmlError> {
        let util = self
            .device
            .utilization_rates()
            .map_err(Self::convert_error)?;
        Ok(Utilization::new(util.gpu, util.memory))
    }

    fn utilization_gpu_average(&self, window: Duration) -> Result<f64, NvmlError> {
        let samples = self
            .device
            .samples(Sampling::GpuUtilization, last_seen_timestamp(window))
            .map_err(Self::convert_error)?;

        mean_sample_value(&samples)
            .ok_or_else(|| NvmlError::NotSupported("No utilization samples available".to_string()))
    }

    fn clock_current_graphics(&self) -> Result<f64, NvmlError> {
        let clock = self
            .device
            .clock(Clock::Graphics, ClockId::Current)
            .map_err(Self::convert_error)?;
        Ok(f64::from(clock))
    }

    fn clock_app_default_graphics(&self) -> Result<f64, NvmlError> {
        let clock = self
            .device
            .clock(Clock::Graphics, ClockId::AppClockDefault)
            .map_err(Self::convert_error)?;
        Ok(f64::from(clock))
    }

    fn pcie_tx_bytes(&self) -> Result<f64, NvmlError> {
        let tx_kb = self
            .device
            .pcie_throughput(PcieUtilCounter::Send)
            .map_err(Self::convert_error)?;
        // KB/s to bytes/s
        Ok(f64::from(tx_kb) * 1024.0)
    }

    fn pcie_rx_bytes(&self) -> Result<f64, NvmlError> {
        let rx_kb = self
            .device
            .pcie_throughput(PcieUtilCounter::Receive)
            .map_err(Self::convert_error)?;
        // KB/s to bytes/s
        Ok(f64::from(rx_kb) * 1024.0)
    }

    fn process_utilization(
        &self,
        max_samples: usize,
        window: Duration,
    ) -> Result<Vec<ProcessSample>, NvmlError> {
        let mut samples = self
            .device
            .process_utilization_stats(last_seen_timestamp(window))
            .map_err(Self::convert_error)?;
        samples.truncate(max_samples);

        Ok(samples
            .into_iter()
            .map(|s| ProcessSample {
                pid: s.pid,
                sm_util: s.sm_util,
                mem_util: s.mem_util,
                enc_util: s.enc_util,
                dec_util: s.dec_util,
            })
            .collect())
    }
}

/// Microsecond timestamp marking the start of the sampling window
fn last_seen_timestamp(window: Duration) -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .ok()
        .and_then(|now| now.checked_sub(window))
        .map(|start| start.as_micros() as u64)
        .unwrap_or(0)
}

/// Mean of a driver sample buffer, `None` when it is empty
fn mean_sample_value(samples: &[Sample]) -> Option<f64> {
    if samples.is_empty() {
        return None;
    }

    let sum: f64 = samples
        .iter()
        .map(|sample| match &sample.value {
            SampleValue::F64(v) => *v,
            SampleValue::U32(v) => f64::from(*v),
            SampleValue::U64(v) => *v as f64,
            SampleValue::I64(v) => *v as f64,
        })
        .sum();

    Some(sum / samples.len() as f64)
}
