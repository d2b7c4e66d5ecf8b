//! Serialized driver for the break scheduler.
//!
//! One tokio task owns the [`BreakScheduler`] and its 1 Hz ticker. Control
//! requests reach it as messages, so ticks and requests are applied strictly
//! one after another and the scheduler state is never shared.

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Duration, Instant, Interval, MissedTickBehavior};

use crate::types::SchedulerSnapshot;

use super::scheduler::{BreakScheduler, ClockState};

// ============================================================================
// Constants
// ============================================================================

/// Period of the countdown clock
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

// ============================================================================
// RuntimeError
// ============================================================================

/// Errors returned by [`SchedulerHandle`].
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// The runtime task is gone
    #[error("スケジューラは停止しています")]
    Closed,
}

// ============================================================================
// Control
// ============================================================================

/// Operations a collaborator can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    /// Restart the work countdown
    Start,
    /// Pause the work countdown
    Pause,
    /// Resume the work countdown
    Resume,
    /// Flip the pause state
    TogglePause,
    /// End or cancel a break
    SkipBreak,
    /// The machine is going to sleep
    SystemSleep,
    /// The machine woke up
    SystemWake,
    /// Read the state without changing it
    Status,
}

enum Command {
    Control {
        control: Control,
        reply: oneshot::Sender<SchedulerSnapshot>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

// ============================================================================
// SchedulerHandle
// ============================================================================

/// Cloneable handle for talking to a running scheduler.
///
/// Every request resolves to the snapshot taken right after it was applied.
#[derive(Debug, Clone)]
pub struct SchedulerHandle {
    tx: mpsc::UnboundedSender<Command>,
}

impl SchedulerHandle {
    /// Requests [`BreakScheduler::start`].
    pub async fn start(&self) -> Result<SchedulerSnapshot, RuntimeError> {
        self.send(Control::Start).await
    }

    /// Requests [`BreakScheduler::pause`].
    pub async fn pause(&self) -> Result<SchedulerSnapshot, RuntimeError> {
        self.send(Control::Pause).await
    }

    /// Requests [`BreakScheduler::resume`].
    pub async fn resume(&self) -> Result<SchedulerSnapshot, RuntimeError> {
        self.send(Control::Resume).await
    }

    /// Requests [`BreakScheduler::toggle_pause`].
    pub async fn toggle_pause(&self) -> Result<SchedulerSnapshot, RuntimeError> {
        self.send(Control::TogglePause).await
    }

    /// Requests [`BreakScheduler::skip_break`].
    pub async fn skip_break(&self) -> Result<SchedulerSnapshot, RuntimeError> {
        self.send(Control::SkipBreak).await
    }

    /// Delivers a system sleep notification.
    pub async fn system_sleep(&self) -> Result<SchedulerSnapshot, RuntimeError> {
        self.send(Control::SystemSleep).await
    }

    /// Delivers a system wake notification.
    pub async fn system_wake(&self) -> Result<SchedulerSnapshot, RuntimeError> {
        self.send(Control::SystemWake).await
    }

    /// Returns the current state.
    pub async fn snapshot(&self) -> Result<SchedulerSnapshot, RuntimeError> {
        self.send(Control::Status).await
    }

    /// Closes the scheduler and waits until its clock is released.
    pub async fn shutdown(&self) -> Result<(), RuntimeError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::Shutdown { reply })
            .map_err(|_| RuntimeError::Closed)?;
        rx.await.map_err(|_| RuntimeError::Closed)
    }

    /// Sends a control request and waits for the resulting snapshot.
    pub async fn send(&self, control: Control) -> Result<SchedulerSnapshot, RuntimeError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::Control { control, reply })
            .map_err(|_| RuntimeError::Closed)?;
        rx.await.map_err(|_| RuntimeError::Closed)
    }
}

// ============================================================================
// SchedulerRuntime
// ============================================================================

enum Step {
    Command(Option<Command>),
    Tick,
}

/// Task body that owns the scheduler and its ticker.
pub struct SchedulerRuntime {
    scheduler: BreakScheduler,
    commands: mpsc::UnboundedReceiver<Command>,
    /// Armed ticker, tagged with the clock generation it was built for
    ticker: Option<(u64, Interval)>,
}

impl SchedulerRuntime {
    /// Creates a runtime and the handle used to drive it.
    pub fn new(scheduler: BreakScheduler) -> (Self, SchedulerHandle) {
        let (tx, commands) = mpsc::unbounded_channel();
        let runtime = Self {
            scheduler,
            commands,
            ticker: None,
        };
        (runtime, SchedulerHandle { tx })
    }

    /// Runs until shut down or until every handle is dropped.
    ///
    /// The scheduler is closed and the ticker dropped before this returns.
    pub async fn run(mut self) {
        loop {
            self.sync_ticker();

            let step = tokio::select! {
                biased;
                command = self.commands.recv() => Step::Command(command),
                _ = next_tick(&mut self.ticker) => Step::Tick,
            };

            match step {
                Step::Tick => self.scheduler.tick(),
                Step::Command(Some(Command::Control { control, reply })) => {
                    self.apply(control);
                    let _ = reply.send(self.scheduler.snapshot());
                }
                Step::Command(Some(Command::Shutdown { reply })) => {
                    self.close();
                    let _ = reply.send(());
                    break;
                }
                Step::Command(None) => {
                    tracing::debug!("all scheduler handles dropped");
                    self.close();
                    break;
                }
            }
        }
    }

    fn apply(&mut self, control: Control) {
        tracing::debug!(?control, "applying control request");
        match control {
            Control::Start => self.scheduler.start(),
            Control::Pause => self.scheduler.pause(),
            Control::Resume => self.scheduler.resume(),
            Control::TogglePause => self.scheduler.toggle_pause(),
            Control::SkipBreak => self.scheduler.skip_break(),
            Control::SystemSleep => self.scheduler.on_system_sleep(),
            Control::SystemWake => self.scheduler.on_system_wake(),
            Control::Status => {}
        }
    }

    /// Replaces or drops the ticker to match the scheduler's clock state.
    fn sync_ticker(&mut self) {
        match self.scheduler.clock() {
            ClockState::Stopped => {
                if self.ticker.take().is_some() {
                    tracing::trace!("ticker stopped");
                }
            }
            ClockState::Running { generation } => {
                let current = self.ticker.as_ref().map(|(g, _)| *g);
                if current != Some(generation) {
                    let mut ticker = interval_at(Instant::now() + TICK_PERIOD, TICK_PERIOD);
                    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
                    self.ticker = Some((generation, ticker));
                    tracing::trace!(generation, "ticker armed");
                }
            }
        }
    }

    fn close(&mut self) {
        self.scheduler.close();
        self.ticker = None;
    }
}

async fn next_tick(ticker: &mut Option<(u64, Interval)>) {
    match ticker {
        Some((_, interval)) => {
            interval.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

/// Spawns a runtime task for `scheduler` on the current tokio runtime.
pub fn spawn(scheduler: BreakScheduler) -> (SchedulerHandle, JoinHandle<()>) {
    let (runtime, handle) = SchedulerRuntime::new(scheduler);
    let task = tokio::spawn(runtime.run());
    (handle, task)
}

// ============================================================================
// Tests
// ============================================================================
