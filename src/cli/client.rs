//! IPC Client for communicating with the eyebreak daemon.
//!
//! This module provides:
//! - Unix Domain Socket client
//! - Request/response handling
//! - Connection retry logic (connect only; a sent request is never resent)
//! - Timeout handling

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;
use tokio::time::timeout;

use crate::types::{IpcRequest, IpcResponse};

// ============================================================================
// Constants
// ============================================================================

/// Connection timeout in seconds
const CONNECTION_TIMEOUT_SECS: u64 = 5;

/// Read/write timeout in seconds
const IO_TIMEOUT_SECS: u64 = 5;

/// Maximum response size in bytes (64KB)
const MAX_RESPONSE_SIZE: usize = 65536;

/// Maximum connection attempts
const MAX_RETRIES: u32 = 3;

/// Retry delay in milliseconds (base delay, multiplied by attempt number)
const RETRY_DELAY_MS: u64 = 500;

// ============================================================================
// IpcClient
// ============================================================================

/// IPC client for daemon communication.
pub struct IpcClient {
    /// Socket path
    socket_path: PathBuf,
    /// Connection timeout
    timeout: Duration,
    /// Read/write timeout once connected
    io_timeout: Duration,
    /// Connection attempts per request
    max_retries: u32,
}

impl IpcClient {
    /// Creates a new IPC client with a custom socket path.
    pub fn with_socket_path(socket_path: PathBuf) -> Self {
        Self {
            socket_path,
            timeout: Duration::from_secs(CONNECTION_TIMEOUT_SECS),
            io_timeout: Duration::from_secs(IO_TIMEOUT_SECS),
            max_retries: MAX_RETRIES,
        }
    }

    /// Sets the number of connection attempts per request (at least one).
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries.max(1);
        self
    }

    /// Sets the read/write timeout used after connecting.
    pub fn with_io_timeout(mut self, io_timeout: Duration) -> Self {
        self.io_timeout = io_timeout;
        self
    }

    /// Returns the socket path.
    pub fn socket_path(&self) -> &PathBuf {
        &self.socket_path
    }

    /// Sends a start command to the daemon.
    pub async fn start(&self) -> Result<IpcResponse> {
        self.send_request(&IpcRequest::Start).await
    }

    /// Sends a pause command to the daemon.
    pub async fn pause(&self) -> Result<IpcResponse> {
        self.send_request(&IpcRequest::Pause).await
    }

    /// Sends a resume command to the daemon.
    pub async fn resume(&self) -> Result<IpcResponse> {
        self.send_request(&IpcRequest::Resume).await
    }

    /// Sends a toggle command to the daemon.
    pub async fn toggle(&self) -> Result<IpcResponse> {
        self.send_request(&IpcRequest::Toggle).await
    }

    /// Sends a skip command to the daemon.
    pub async fn skip(&self) -> Result<IpcResponse> {
        self.send_request(&IpcRequest::Skip).await
    }

    /// Reports an upcoming system sleep to the daemon.
    pub async fn sleep(&self) -> Result<IpcResponse> {
        self.send_request(&IpcRequest::Sleep).await
    }

    /// Reports a system wake to the daemon.
    pub async fn wake(&self) -> Result<IpcResponse> {
        self.send_request(&IpcRequest::Wake).await
    }

    /// Sends a status query to the daemon.
    pub async fn status(&self) -> Result<IpcResponse> {
        self.send_request(&IpcRequest::Status).await
    }

    /// Sends a single request to the daemon.
    ///
    /// Only connecting is retried. Once the request is on the wire the
    /// daemon will run it, so any later failure is returned as is.
    async fn send_request(&self, request: &IpcRequest) -> Result<IpcResponse> {
        let mut stream = self.connect_with_retry().await?;
        self.exchange(&mut stream, request).await
    }

    /// Connects to the daemon, retrying with a growing delay.
    async fn connect_with_retry(&self) -> Result<UnixStream> {
        let mut attempt = 1;
        loop {
            match self.connect().await {
                Ok(stream) => return Ok(stream),
                Err(e) if attempt >= self.max_retries => return Err(e),
                Err(e) => {
                    tracing::warn!(
                        "接続失敗 (試行 {}/{}): {}",
                        attempt,
                        self.max_retries,
                        e
                    );
                    let delay = Duration::from_millis(RETRY_DELAY_MS * u64::from(attempt));
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    async fn connect(&self) -> Result<UnixStream> {
        timeout(self.timeout, UnixStream::connect(&self.socket_path))
            .await
            .context("接続がタイムアウトしました")?
            .context("Daemonに接続できません。'eyebreak daemon' を起動してください")
    }

    /// Writes the request and reads the daemon's response.
    async fn exchange(&self, stream: &mut UnixStream, request: &IpcRequest) -> Result<IpcResponse> {
        let request_json =
            serde_json::to_string(request).context("リクエストのシリアライズに失敗しました")?;

        timeout(self.io_timeout, stream.write_all(request_json.as_bytes()))
            .await
            .context("書き込みがタイムアウトしました")?
            .context("リクエストの送信に失敗しました")?;

        timeout(self.io_timeout, stream.flush())
            .await
            .context("フラッシュがタイムアウトしました")?
            .context("フラッシュに失敗しました")?;

        // Shutdown write side to signal end of request
        stream
            .shutdown()
            .await
            .context("シャットダウンに失敗しました")?;

        let mut buffer = vec![0u8; MAX_RESPONSE_SIZE];
        let n = timeout(self.io_timeout, stream.read(&mut buffer))
            .await
            .context("読み込みがタイムアウトしました")?
            .context("レスポンスの受信に失敗しました")?;

        if n == 0 {
            anyhow::bail!("Daemonからの応答がありませんでした");
        }

        let response: IpcResponse =
            serde_json::from_slice(&buffer[..n]).context("レスポンスのパースに失敗しました")?;

        if response.is_error() {
            anyhow::bail!("{}", response.message);
        }

        Ok(response)
    }
}

// ============================================================================
// Tests
// ============================================================================
