//! Core data types for the break reminder.
//!
//! This module defines the data structures used for:
//! - Scheduler configuration with validation
//! - The work/break phase model
//! - Read-only scheduler snapshots and their display formatting
//! - IPC request/response serialization

use serde::{Deserialize, Serialize};

// ============================================================================
// SchedulerConfig
// ============================================================================

/// Durations driving the break scheduler, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Focused work time between two breaks
    pub work_seconds: u32,
    /// Length of a break
    pub break_seconds: u32,
    /// How long before the break the warning fires
    pub warning_seconds: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            work_seconds: 20 * 60,
            break_seconds: 20,
            warning_seconds: 30,
        }
    }
}

impl SchedulerConfig {
    /// Creates a new configuration from the three durations.
    pub fn new(work_seconds: u32, break_seconds: u32, warning_seconds: u32) -> Self {
        Self {
            work_seconds,
            break_seconds,
            warning_seconds,
        }
    }

    /// Creates a new configuration with the specified work duration.
    pub fn with_work_seconds(mut self, seconds: u32) -> Self {
        self.work_seconds = seconds;
        self
    }

    /// Creates a new configuration with the specified break duration.
    pub fn with_break_seconds(mut self, seconds: u32) -> Self {
        self.break_seconds = seconds;
        self
    }

    /// Creates a new configuration with the specified warning lead time.
    pub fn with_warning_seconds(mut self, seconds: u32) -> Self {
        self.warning_seconds = seconds;
        self
    }

    /// Validates the configuration.
    ///
    /// A warning lead time at or above the work duration is accepted: the
    /// warning then fires on the first tick of every work period.
    pub fn validate(&self) -> Result<(), String> {
        if self.work_seconds == 0 {
            return Err("作業時間は1秒以上で指定してください".to_string());
        }
        if self.break_seconds == 0 {
            return Err("休憩時間は1秒以上で指定してください".to_string());
        }
        if self.warning_seconds == 0 {
            return Err("予告時間は1秒以上で指定してください".to_string());
        }
        Ok(())
    }
}

// ============================================================================
// Phase
// ============================================================================

/// Where the scheduler is in the work/break cycle.
///
/// `Paused` wraps the phase that was interrupted and is never nested. A paused
/// work countdown is frozen. A paused break keeps counting down, and when it
/// finishes the scheduler lands in a paused, full work countdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    /// Counting down focused work time
    Working {
        /// Seconds left until the break
        remaining: u32,
        /// Whether the warning already fired in this work cycle
        warned: bool,
    },
    /// Counting down a break
    OnBreak {
        /// Seconds left in the break
        remaining: u32,
    },
    /// Paused on top of another phase
    Paused(Box<Phase>),
}

impl Phase {
    /// Returns a fresh work countdown with the warning latch cleared.
    pub fn working(seconds: u32) -> Self {
        Phase::Working {
            remaining: seconds,
            warned: false,
        }
    }

    /// Returns the phase underneath a pause, or `self` when not paused.
    pub fn active(&self) -> &Phase {
        match self {
            Phase::Paused(inner) => inner.active(),
            other => other,
        }
    }

    /// Returns true if the phase is paused.
    pub fn is_paused(&self) -> bool {
        matches!(self, Phase::Paused(_))
    }

    /// Returns true if a break is in progress, paused or not.
    pub fn is_on_break(&self) -> bool {
        matches!(self.active(), Phase::OnBreak { .. })
    }

    /// Returns true if the warning fired and the break has not started yet.
    pub fn is_in_warning_period(&self) -> bool {
        matches!(self.active(), Phase::Working { warned: true, .. })
    }

    /// Returns the observable kind of this phase.
    ///
    /// A pause during a break does not stop the break, so it reports `OnBreak`.
    pub fn kind(&self) -> PhaseKind {
        match self.active() {
            Phase::OnBreak { .. } => PhaseKind::OnBreak,
            _ if self.is_paused() => PhaseKind::Paused,
            Phase::Working { warned: true, .. } => PhaseKind::Warning,
            _ => PhaseKind::Working,
        }
    }
}

// ============================================================================
// PhaseKind
// ============================================================================

/// Flattened phase name for display and IPC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseKind {
    /// Counting down work time
    Working,
    /// Counting down work time, warning already shown
    Warning,
    /// Taking a break
    OnBreak,
    /// Work countdown is paused
    Paused,
}

impl PhaseKind {
    /// Returns the string representation of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            PhaseKind::Working => "working",
            PhaseKind::Warning => "warning",
            PhaseKind::OnBreak => "on_break",
            PhaseKind::Paused => "paused",
        }
    }
}

// ============================================================================
// SchedulerSnapshot
// ============================================================================

/// Point-in-time view of the scheduler state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerSnapshot {
    /// Observable phase
    pub phase: PhaseKind,
    /// Seconds of work left before the next break
    pub work_remaining_seconds: u32,
    /// Seconds left in the current (or next) break
    pub break_remaining_seconds: u32,
    /// Whether the work countdown is paused
    pub is_paused: bool,
    /// Whether a break is in progress
    pub is_on_break: bool,
    /// Whether the pre-break warning is showing
    pub is_in_warning_period: bool,
    /// Whether the 1 Hz clock is currently armed
    pub is_running: bool,
}

impl SchedulerSnapshot {
    /// Formats remaining work time as "MM:SS".
    pub fn formatted_time_remaining(&self) -> String {
        format_clock(self.work_remaining_seconds)
    }

    /// Formats remaining break time as whole seconds.
    pub fn formatted_break_time_remaining(&self) -> String {
        self.break_remaining_seconds.to_string()
    }
}

/// Formats a second count as zero-padded "MM:SS".
pub fn format_clock(total_seconds: u32) -> String {
    format!("{:02}:{:02}", total_seconds / 60, total_seconds % 60)
}

// ============================================================================
// IPC Types
// ============================================================================

/// IPC request from client to daemon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "lowercase")]
pub enum IpcRequest {
    /// Restart the work countdown from a full work period
    Start,
    /// Pause the work countdown
    Pause,
    /// Resume the work countdown
    Resume,
    /// Flip between paused and running
    Toggle,
    /// End the current break, or cancel the upcoming one
    Skip,
    /// The machine is about to sleep
    Sleep,
    /// The machine woke up
    Wake,
    /// Query the current status
    Status,
}

/// Response data for IPC responses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseData {
    /// Current phase
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    /// Remaining work seconds
    #[serde(rename = "remainingSeconds", skip_serializing_if = "Option::is_none")]
    pub remaining_seconds: Option<u32>,
    /// Remaining break seconds
    #[serde(
        rename = "breakRemainingSeconds",
        skip_serializing_if = "Option::is_none"
    )]
    pub break_remaining_seconds: Option<u32>,
    /// Paused flag
    #[serde(rename = "isPaused", skip_serializing_if = "Option::is_none")]
    pub is_paused: Option<bool>,
    /// On-break flag
    #[serde(rename = "isOnBreak", skip_serializing_if = "Option::is_none")]
    pub is_on_break: Option<bool>,
    /// Warning-period flag
    #[serde(rename = "isInWarningPeriod", skip_serializing_if = "Option::is_none")]
    pub is_in_warning_period: Option<bool>,
}

impl ResponseData {
    /// Creates response data from a scheduler snapshot.
    pub fn from_snapshot(snapshot: &SchedulerSnapshot) -> Self {
        Self {
            state: Some(snapshot.phase.as_str().to_string()),
            remaining_seconds: Some(snapshot.work_remaining_seconds),
            break_remaining_seconds: Some(snapshot.break_remaining_seconds),
            is_paused: Some(snapshot.is_paused),
            is_on_break: Some(snapshot.is_on_break),
            is_in_warning_period: Some(snapshot.is_in_warning_period),
        }
    }
}

/// IPC response from daemon to client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpcResponse {
    /// Response status ("success" or "error")
    pub status: String,
    /// Human-readable message
    pub message: String,
    /// Optional response data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ResponseData>,
}

impl IpcResponse {
    /// Creates a success response.
    pub fn success(message: impl Into<String>, data: Option<ResponseData>) -> Self {
        Self {
            status: "success".to_string(),
            message: message.into(),
            data,
        }
    }

    /// Creates an error response.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
            data: None,
        }
    }

    /// Returns true if this is an error response.
    pub fn is_error(&self) -> bool {
        self.status == "error"
    }
}

// ============================================================================
// Tests
// ============================================================================
