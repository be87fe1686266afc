//! Unified error types for nvexporter
//!
//! This module defines all error types used throughout the application.
//! Uses thiserror for ergonomic error definitions.

use thiserror::Error;

/// Top-level application error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from configuration parsing/validation
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Error from the metrics registry
    #[error("Metrics registry error: {0}")]
    Metrics(#[from] prometheus::Error),

    /// The HTTP listener could not bind its address
    #[error("Failed to bind {addr}: {reason}")]
    Bind { addr: String, reason: String },
}

/// Errors from NVML adapter operations
#[derive(Error, Debug)]
pub enum NvmlError {
    /// Failed to initialize NVML library
    #[error("Failed to initialize NVML: {0}")]
    InitializationFailed(String),

    /// NVML library not found
    #[error("NVML library not found. Is the NVIDIA driver installed?")]
    LibraryNotFound,

    /// Device not found at index
    #[error("GPU device not found at index {0}")]
    DeviceNotFound(u32),

    /// Operation not supported by this GPU
    #[error("Operation not supported: {0}")]
    NotSupported(String),

    /// Insufficient permissions
    #[error("Insufficient permissions: {0}")]
    InsufficientPermissions(String),

    /// GPU is lost (fallen off bus, etc.)
    #[error("GPU is lost or has become inaccessible")]
    GpuLost,

    /// Unknown NVML error
    #[error("NVML error: {0}")]
    Unknown(String),
}

/// Fatal poll-stage errors
///
/// Only the two stages that make the rest of a poll meaningless are fatal;
/// everything below them degrades per device or per field instead.
#[derive(Error, Debug)]
pub enum PollError {
    /// NVML session could not be opened
    #[error("NVML initialization failed: {0}")]
    InitFailed(#[source] NvmlError),

    /// Device count could not be queried
    #[error("GPU enumeration failed: {0}")]
    EnumerationFailed(#[source] NvmlError),
}

/// Errors from configuration parsing and validation
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file not found
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// IO error reading the config file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
