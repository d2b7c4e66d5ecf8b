//! Display utilities for the eyebreak CLI.
//!
//! This module provides formatted output for:
//! - Control command results
//! - Error messages
//! - Status display

use crate::types::{format_clock, IpcResponse, ResponseData};

// ============================================================================
// Display
// ============================================================================

/// Display utilities for CLI output.
pub struct Display;

impl Display {
    /// Shows the daemon's message followed by the remaining time.
    pub fn show_result(response: &IpcResponse) {
        for line in Self::result_lines(response) {
            println!("{}", line);
        }
    }

    /// Shows the current status.
    pub fn show_status(response: &IpcResponse) {
        for line in Self::status_lines(response) {
            println!("{}", line);
        }
    }

    /// Shows an error message.
    pub fn show_error(message: &str) {
        eprintln!("エラー: {}", message);
    }

    fn result_lines(response: &IpcResponse) -> Vec<String> {
        let mut lines = vec![format!("* {}", response.message)];
        if let Some(data) = &response.data {
            lines.push(format!("  {}", Self::remaining_line(data)));
        }
        lines
    }

    fn status_lines(response: &IpcResponse) -> Vec<String> {
        let mut lines = vec![
            "Eyebreak ステータス".to_string(),
            "─────────────────────────────".to_string(),
        ];

        let Some(data) = &response.data else {
            lines.push("スケジューラは起動していません".to_string());
            return lines;
        };

        let state = data.state.as_deref().unwrap_or("unknown");
        lines.push(format!("状態: {}", Self::state_label(state)));
        lines.push(Self::remaining_line(data));
        if data.is_on_break == Some(true) && data.is_paused == Some(true) {
            lines.push("休憩後は一時停止します".to_string());
        }
        lines
    }

    /// Work time as "MM:SS" outside a break, break time in seconds during one.
    fn remaining_line(data: &ResponseData) -> String {
        if data.is_on_break == Some(true) {
            let seconds = data.break_remaining_seconds.unwrap_or(0);
            format!("休憩残り: {}秒", seconds)
        } else {
            let seconds = data.remaining_seconds.unwrap_or(0);
            format!("次の休憩まで: {}", format_clock(seconds))
        }
    }

    fn state_label(state: &str) -> &str {
        match state {
            "working" => "作業中",
            "warning" => "まもなく休憩",
            "on_break" => "休憩中",
            "paused" => "一時停止中",
            other => other,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
