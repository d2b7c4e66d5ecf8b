//! Daemon module for the break reminder.
//!
//! This module contains the core daemon functionality:
//! - `scheduler`: Break scheduler state machine
//! - `runtime`: Task that serializes ticks and control requests
//! - `power`: System suspend detection
//! - `ipc`: Unix socket server
//! - `service`: Daemon wiring

pub mod ipc;
pub mod power;
pub mod runtime;
pub mod scheduler;
pub mod service;

pub use runtime::{RuntimeError, SchedulerHandle, SchedulerRuntime};
pub use scheduler::{BreakScheduler, ClockState, SchedulerEvent};
