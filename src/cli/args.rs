//! CLI argument definitions using clap derive
//!
//! Flags left unset fall back to the config file, which falls back to the
//! built-in defaults.

use clap::Parser;

use crate::config::LogLevel;

/// NVML-based Prometheus exporter for NVIDIA GPUs
///
/// Exposes GPU temperature, power, memory, utilization, clock, PCIe, and
/// per-process telemetry on a pull-based metrics endpoint. Every scrape runs
/// one fresh NVML poll cycle.
#[derive(Parser, Debug)]
#[command(name = "nvexporter")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Address to listen on for the web interface and telemetry
    #[arg(long, env = "NVEXPORTER_LISTEN_ADDRESS")]
    pub listen_address: Option<String>,

    /// Path under which to expose metrics
    #[arg(long, env = "NVEXPORTER_TELEMETRY_PATH")]
    pub telemetry_path: Option<String>,

    /// Minimum log level
    #[arg(long, env = "NVEXPORTER_LOG_LEVEL", value_enum)]
    pub log_level: Option<LogLevel>,

    /// Export per-process utilization
    #[arg(long)]
    pub per_process: bool,

    /// Path to configuration file
    #[arg(short, long, env = "NVEXPORTER_CONFIG")]
    pub config: Option<String>,
}
