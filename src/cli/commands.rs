//! Command definitions for the eyebreak CLI.
//!
//! Uses clap derive macro for argument parsing.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

// ============================================================================
// CLI Structure
// ============================================================================

/// Eyebreak - periodic break reminder
#[derive(Parser, Debug)]
#[command(
    name = "eyebreak",
    version,
    about = "定期的に休憩を促すリマインダー",
    long_about = "一定時間ごとに画面から目を離す休憩を促します。\n\
                  休憩の少し前に予告し、休憩が終わると自動的に作業へ戻ります。",
    propagate_version = true
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to the daemon socket
    #[arg(long, global = true, value_name = "PATH")]
    pub socket: Option<PathBuf>,
}

// ============================================================================
// Subcommands
// ============================================================================

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Restart the work countdown from a full work period
    Start,

    /// Pause the work countdown
    Pause,

    /// Resume the work countdown
    Resume,

    /// Pause if running, resume if paused
    Toggle,

    /// End the current break, or skip the upcoming one
    Skip,

    /// Tell the daemon the machine is going to sleep
    Sleep,

    /// Tell the daemon the machine woke up
    Wake,

    /// Show current status
    Status,

    /// Run the scheduler daemon in the foreground
    Daemon(DaemonArgs),

    /// Generate shell completion scripts
    Completions {
        /// Shell type for completion script
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

// ============================================================================
// Daemon Command Arguments
// ============================================================================

/// Arguments for the daemon command
#[derive(Args, Debug, Clone, Default)]
pub struct DaemonArgs {
    /// Config file (defaults to <config dir>/eyebreak/config.json)
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Do not watch for system sleep
    #[arg(long)]
    pub no_suspend_detection: bool,
}

// ============================================================================
// Tests
// ============================================================================
