//! Daemon wiring.
//!
//! Loads the configuration, starts the scheduler runtime, and serves IPC
//! requests until Ctrl-C. Scheduler notifications are logged here; a UI
//! would subscribe to the same event stream.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tokio::sync::mpsc;

use crate::config;

use super::ipc::{IpcServer, RequestHandler};
use super::power::SuspendDetector;
use super::runtime;
use super::scheduler::{BreakScheduler, SchedulerEvent};

/// Options for [`run`].
#[derive(Debug, Clone)]
pub struct DaemonOptions {
    /// Socket to listen on
    pub socket_path: PathBuf,
    /// Explicit config file; the default location is used when `None`
    pub config_path: Option<PathBuf>,
    /// Whether to watch for system suspend
    pub detect_suspend: bool,
}

/// Runs the daemon until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the socket cannot be bound or the runtime fails to
/// shut down cleanly.
pub async fn run(options: DaemonOptions) -> Result<()> {
    let app_config = config::load_config(options.config_path.as_deref());
    let scheduler_config = app_config.scheduler_config();
    tracing::info!(
        work_seconds = scheduler_config.work_seconds,
        break_seconds = scheduler_config.break_seconds,
        warning_seconds = scheduler_config.warning_seconds,
        "starting break scheduler"
    );

    let server = IpcServer::new(&options.socket_path)?;

    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let (handle, runtime_task) = runtime::spawn(BreakScheduler::new(scheduler_config, event_tx));
    let notifier = tokio::spawn(log_events(event_rx));

    handle.start().await.context("スケジューラの開始に失敗しました")?;

    let detector = options.detect_suspend.then(|| {
        let handle = handle.clone();
        tokio::spawn(async move {
            if let Err(e) = SuspendDetector::default().run(handle).await {
                tracing::debug!("suspend detector stopped: {}", e);
            }
        })
    });

    let handler = RequestHandler::new(handle.clone());
    tokio::select! {
        result = serve(&server, &handler) => result?,
        result = tokio::signal::ctrl_c() => {
            result.context("シグナルの待機に失敗しました")?;
            tracing::info!("shutting down");
        }
    }

    if let Some(detector) = detector {
        detector.abort();
    }
    handle
        .shutdown()
        .await
        .context("スケジューラの停止に失敗しました")?;
    runtime_task.await.context("スケジューラタスクが異常終了しました")?;
    notifier.await.context("通知タスクが異常終了しました")?;

    Ok(())
}

/// Accepts connections forever, one request per connection.
///
/// # Errors
///
/// Returns an error if accepting a connection fails.
pub async fn serve(server: &IpcServer, handler: &RequestHandler) -> Result<()> {
    loop {
        let stream = server.accept().await?;
        IpcServer::serve_connection(stream, handler).await;
    }
}

/// Logs scheduler notifications until the scheduler goes away.
pub async fn log_events(mut events: mpsc::UnboundedReceiver<SchedulerEvent>) {
    while let Some(event) = events.recv().await {
        match event {
            SchedulerEvent::Warning { remaining_seconds } => {
                tracing::warn!("あと{}秒で休憩です", remaining_seconds);
            }
            SchedulerEvent::BreakStarted { break_seconds } => {
                tracing::warn!("休憩の時間です。{}秒間画面から目を離しましょう", break_seconds);
            }
            SchedulerEvent::BreakEnded => {
                tracing::info!("休憩が終わりました");
            }
            SchedulerEvent::PauseChanged { paused: true } => {
                tracing::info!("一時停止しました");
            }
            SchedulerEvent::PauseChanged { paused: false } => {
                tracing::info!("再開しました");
            }
        }
    }
    tracing::debug!("event stream closed");
}
