//! nvexporter - NVML-based Prometheus exporter library
//!
//! This library provides the core functionality for exposing NVIDIA GPU
//! telemetry as a pull-based metrics endpoint. Every scrape runs one fresh
//! NVML poll cycle and projects the result onto a fixed gauge set.
//!
//! # Modules
//!
//! - [`cli`]: Command-line interface definitions
//! - [`collector`]: Poll-cycle orchestration
//! - [`config`]: Configuration system
//! - [`domain`]: Snapshot and process reading models
//! - [`error`]: Error types
//! - [`exporter`]: Metric projection onto the gauge registry
//! - [`nvml`]: NVML abstraction layer
//! - [`server`]: HTTP scrape endpoint

pub mod cli;
pub mod collector;
pub mod config;
pub mod domain;
pub mod error;
pub mod exporter;
pub mod nvml;
pub mod server;

#[cfg(test)]
pub mod mock;

pub use error::{AppError, Result};
