//! Eyebreak Library
//!
//! This library provides the core functionality for the Eyebreak break reminder.
//! It includes:
//! - Break scheduler state machine (work countdown, warning, break, pause)
//! - Serialized runtime that drives the scheduler from a 1 Hz clock
//! - System sleep detection
//! - IPC server/client for daemon-CLI communication
//! - Configuration loading with built-in fallback values
//! - CLI command parsing and display utilities

pub mod cli;
pub mod config;
pub mod daemon;
pub mod types;

// Re-export commonly used types for convenience
pub use config::{AppConfig, ConfigError};
pub use daemon::{
    BreakScheduler, ClockState, RuntimeError, SchedulerEvent, SchedulerHandle, SchedulerRuntime,
};
pub use types::{
    IpcRequest, IpcResponse, Phase, PhaseKind, ResponseData, SchedulerConfig, SchedulerSnapshot,
};
