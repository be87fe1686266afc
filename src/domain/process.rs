//! Per-process utilization readings

/// Label value published when a process name cannot be resolved
pub const UNRESOLVED_PROCESS_NAME: &str = "N/A";

/// Raw utilization sample for one process, as reported by the adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessSample {
    /// Process ID
    pub pid: u32,
    /// Streaming-multiprocessor utilization percentage
    pub sm_util: u32,
    /// Memory utilization percentage
    pub mem_util: u32,
    /// Encoder utilization percentage
    pub enc_util: u32,
    /// Decoder utilization percentage
    pub dec_util: u32,
}

/// Utilization of one process on one device
///
/// Lives only within one snapshot; the projector diffs it against the
/// previous snapshot's process set to retract stale series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessReading {
    /// Process ID
    pub pid: u32,
    /// Process name; `None` if resolution failed
    pub name: Option<String>,
    /// Streaming-multiprocessor utilization percentage
    pub sm_util: u32,
    /// Memory utilization percentage
    pub mem_util: u32,
    /// Encoder utilization percentage
    pub enc_util: u32,
    /// Decoder utilization percentage
    pub dec_util: u32,
}

impl ProcessReading {
    /// Build a reading from an adapter sample and an optional resolved name
    pub fn from_sample(sample: ProcessSample, name: Option<String>) -> Self {
        Self {
            pid: sample.pid,
            name,
            sm_util: sample.sm_util,
            mem_util: sample.mem_util,
            enc_util: sample.enc_util,
            dec_util: sample.dec_util,
        }
    }

    /// Whether the process name was resolved
    pub fn resolved(&self) -> bool {
        self.name.is_some()
    }

    /// Name as published on the `name` label
    pub fn label_name(&self) -> &str {
        self.name.as_deref().unwrap_or(UNRESOLVED_PROCESS_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(pid: u32) -> ProcessSample {
        ProcessSample {
            pid,
            sm_util: 40,
            mem_util: 10,
            enc_util: 0,
            dec_util: 0,
        }
    }

    #[test]
    fn test_from_sample_with_name() {
        let reading = ProcessReading::from_sample(sample(1234), Some("python".to_string()));
        assert_eq!(reading.pid, 1234);
        assert_eq!(reading.sm_util, 40);
        assert!(reading.resolved());
        assert_eq!(reading.label_name(), "python");
    }

    #[test]
    fn test_unresolved_name_falls_back_to_placeholder() {
        let reading = ProcessReading::from_sample(sample(1234), None);
        assert!(!reading.resolved());
        assert_eq!(reading.label_name(), UNRESOLVED_PROCESS_NAME);
    }
}
