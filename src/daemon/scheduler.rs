//! Break scheduler state machine.
//!
//! This module provides the core break reminder logic:
//! - Work countdown with a one-shot warning before each break
//! - Break countdown that returns to work when it runs out
//! - Pause/resume of the work countdown (breaks are never paused)
//! - Skip handling that either ends a break or cancels the upcoming one
//! - Sleep/wake recovery that restarts a full work period
//!
//! The scheduler never owns a timer itself. It tracks whether its 1 Hz clock
//! should be running through [`ClockState`], and every (re)start of a
//! countdown hands out a new clock generation so the driver can drop the old
//! ticker before arming a new one.

use tokio::sync::mpsc;

use crate::types::{Phase, SchedulerConfig, SchedulerSnapshot};

// ============================================================================
// SchedulerEvent
// ============================================================================

/// Notifications emitted on phase transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedulerEvent {
    /// The break is coming up soon
    Warning {
        /// Seconds of work left when the warning fired
        remaining_seconds: u32,
    },
    /// A break started
    BreakStarted {
        /// Length of the break
        break_seconds: u32,
    },
    /// The break ended (ran out, skipped, or interrupted by sleep)
    BreakEnded,
    /// The pause flag changed
    PauseChanged {
        /// New pause state
        paused: bool,
    },
}

// ============================================================================
// ClockState
// ============================================================================

/// Whether the scheduler wants its 1 Hz clock running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockState {
    /// No countdown is advancing
    Stopped,
    /// A countdown is advancing; a new generation means a freshly armed clock
    Running {
        /// Monotonic counter, bumped every time a countdown (re)starts
        generation: u64,
    },
}

impl ClockState {
    /// Returns true if the clock is running.
    pub fn is_running(&self) -> bool {
        matches!(self, ClockState::Running { .. })
    }
}

// ============================================================================
// BreakScheduler
// ============================================================================

/// Clock-driven state machine deciding when to warn, break and resume work.
///
/// All methods are total. Calls that do not apply to the current phase are
/// no-ops, and nothing happens at all once the scheduler is closed.
pub struct BreakScheduler {
    config: SchedulerConfig,
    phase: Phase,
    clock: ClockState,
    generation: u64,
    closed: bool,
    event_tx: mpsc::UnboundedSender<SchedulerEvent>,
}

impl BreakScheduler {
    /// Creates a scheduler with a full, not yet running work countdown.
    pub fn new(config: SchedulerConfig, event_tx: mpsc::UnboundedSender<SchedulerEvent>) -> Self {
        Self {
            config,
            phase: Phase::working(config.work_seconds),
            clock: ClockState::Stopped,
            generation: 0,
            closed: false,
            event_tx,
        }
    }

    /// Starts the work countdown from a full work period.
    ///
    /// Does nothing while paused or on a break.
    pub fn start(&mut self) {
        if self.closed || self.phase.is_paused() || self.phase.is_on_break() {
            return;
        }

        self.phase = Phase::working(self.config.work_seconds);
        self.arm_clock();
        tracing::debug!(work_seconds = self.config.work_seconds, "work countdown started");
    }

    /// Pauses the work countdown.
    ///
    /// During a break the pause is recorded but the break keeps running.
    pub fn pause(&mut self) {
        if self.closed || self.phase.is_paused() {
            return;
        }

        let prior = std::mem::replace(&mut self.phase, Phase::working(0));
        if matches!(prior, Phase::Working { .. }) {
            self.stop_clock();
        }
        self.phase = Phase::Paused(Box::new(prior));

        tracing::debug!("paused");
        self.emit(SchedulerEvent::PauseChanged { paused: true });
    }

    /// Resumes the work countdown from where it was paused.
    pub fn resume(&mut self) {
        if self.closed {
            return;
        }

        let prior = match std::mem::replace(&mut self.phase, Phase::working(0)) {
            Phase::Paused(prior) => *prior,
            other => {
                self.phase = other;
                return;
            }
        };

        let resumes_work = matches!(prior, Phase::Working { .. });
        self.phase = prior;
        // A running break keeps its clock.
        if resumes_work {
            self.arm_clock();
        }

        tracing::debug!("resumed");
        self.emit(SchedulerEvent::PauseChanged { paused: false });
    }

    /// Pauses when running, resumes when paused.
    pub fn toggle_pause(&mut self) {
        if self.phase.is_paused() {
            self.resume();
        } else {
            self.pause();
        }
    }

    /// Ends the current break, or cancels the upcoming one.
    ///
    /// Outside a break the work countdown restarts from a full work period
    /// with the warning latch cleared. It only starts ticking if not paused.
    pub fn skip_break(&mut self) {
        if self.closed {
            return;
        }

        if self.phase.is_on_break() {
            tracing::info!("break skipped");
            self.end_break();
        } else {
            tracing::info!("upcoming break skipped");
            self.restart_work();
        }
    }

    /// Advances whichever countdown is active by one second.
    ///
    /// This is the only place automatic phase transitions happen. Ticks that
    /// arrive while the clock is stopped are ignored.
    pub fn tick(&mut self) {
        if self.closed || !self.clock.is_running() {
            return;
        }

        let warning_seconds = self.config.warning_seconds;
        match &mut self.phase {
            Phase::Working { remaining, warned } => {
                *remaining = remaining.saturating_sub(1);
                let left = *remaining;

                if left <= warning_seconds && !*warned {
                    *warned = true;
                    tracing::info!(remaining_seconds = left, "break warning");
                    self.emit(SchedulerEvent::Warning {
                        remaining_seconds: left,
                    });
                }
                if left == 0 {
                    self.start_break();
                }
            }
            Phase::OnBreak { remaining } => {
                *remaining = remaining.saturating_sub(1);
                if *remaining == 0 {
                    self.end_break();
                }
            }
            Phase::Paused(prior) => match prior.as_mut() {
                Phase::OnBreak { remaining } => {
                    *remaining = remaining.saturating_sub(1);
                    if *remaining == 0 {
                        self.end_break();
                    }
                }
                // Frozen.
                _ => {}
            },
        }
    }

    /// Halts every countdown without touching the remaining times.
    pub fn on_system_sleep(&mut self) {
        if self.closed {
            return;
        }

        tracing::info!("system sleep, clock halted");
        self.stop_clock();
    }

    /// Recovers from sleep by ending any break and restarting a full work period.
    ///
    /// Time spent asleep is not accounted for.
    pub fn on_system_wake(&mut self) {
        if self.closed {
            return;
        }

        tracing::info!("system wake, restarting work period");
        if self.phase.is_on_break() {
            self.end_break();
        } else {
            self.restart_work();
        }
    }

    /// Stops the clock for good. Every later call is a no-op.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }

        self.stop_clock();
        self.closed = true;
        tracing::debug!("scheduler closed");
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    /// Returns the configuration.
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Returns the current phase.
    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    /// Returns the desired clock state.
    pub fn clock(&self) -> ClockState {
        self.clock
    }

    /// Returns true once [`close`](Self::close) was called.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Seconds of work left; zero during a break.
    pub fn work_time_remaining(&self) -> u32 {
        match self.phase.active() {
            Phase::Working { remaining, .. } => *remaining,
            _ => 0,
        }
    }

    /// Seconds left in the break; the full break length when not on a break.
    pub fn break_time_remaining(&self) -> u32 {
        match self.phase.active() {
            Phase::OnBreak { remaining } => *remaining,
            _ => self.config.break_seconds,
        }
    }

    /// Returns true if paused.
    pub fn is_paused(&self) -> bool {
        self.phase.is_paused()
    }

    /// Returns true if a break is in progress.
    pub fn is_on_break(&self) -> bool {
        self.phase.is_on_break()
    }

    /// Returns true between the warning and the start of the break.
    pub fn is_in_warning_period(&self) -> bool {
        self.phase.is_in_warning_period()
    }

    /// Remaining work time as "MM:SS".
    pub fn formatted_time_remaining(&self) -> String {
        self.snapshot().formatted_time_remaining()
    }

    /// Remaining break time as whole seconds.
    pub fn formatted_break_time_remaining(&self) -> String {
        self.snapshot().formatted_break_time_remaining()
    }

    /// Returns a copy of the observable state.
    pub fn snapshot(&self) -> SchedulerSnapshot {
        SchedulerSnapshot {
            phase: self.phase.kind(),
            work_remaining_seconds: self.work_time_remaining(),
            break_remaining_seconds: self.break_time_remaining(),
            is_paused: self.is_paused(),
            is_on_break: self.is_on_break(),
            is_in_warning_period: self.is_in_warning_period(),
            is_running: self.clock.is_running(),
        }
    }

    // ------------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------------

    fn start_break(&mut self) {
        let break_seconds = self.config.break_seconds;
        self.phase = Phase::OnBreak {
            remaining: break_seconds,
        };
        self.arm_clock();

        tracing::info!(break_seconds, "break started");
        self.emit(SchedulerEvent::BreakStarted { break_seconds });
    }

    fn end_break(&mut self) {
        let paused = self.phase.is_paused();
        self.set_full_work(paused);
        if paused {
            self.stop_clock();
        } else {
            self.arm_clock();
        }

        tracing::info!("break ended");
        self.emit(SchedulerEvent::BreakEnded);
    }

    /// Resets the work countdown and restarts its clock unless paused.
    fn restart_work(&mut self) {
        let paused = self.phase.is_paused();
        self.set_full_work(paused);
        if !paused {
            self.arm_clock();
        }
    }

    fn set_full_work(&mut self, paused: bool) {
        let work = Phase::working(self.config.work_seconds);
        self.phase = if paused {
            Phase::Paused(Box::new(work))
        } else {
            work
        };
    }

    fn arm_clock(&mut self) {
        self.generation += 1;
        self.clock = ClockState::Running {
            generation: self.generation,
        };
    }

    fn stop_clock(&mut self) {
        self.clock = ClockState::Stopped;
    }

    fn emit(&self, event: SchedulerEvent) {
        if let Err(e) = self.event_tx.send(event) {
            tracing::debug!("event dropped, no subscriber: {:?}", e.0);
        }
    }
}

impl Drop for BreakScheduler {
    fn drop(&mut self) {
        self.close();
    }
}

// ============================================================================
// Tests
// ============================================================================
