//! Domain models for collected telemetry
//!
//! Snapshots are created fresh per poll, projected, and discarded; nothing
//! in this module persists across scrapes.

pub mod process;
pub mod snapshot;

pub use process::{ProcessReading, ProcessSample, UNRESOLVED_PROCESS_NAME};
pub use snapshot::{DeviceReading, MemoryInfo, Snapshot, Utilization};
