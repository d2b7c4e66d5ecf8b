//! IPC Server for the break reminder daemon.
//!
//! This module provides Unix Domain Socket IPC functionality:
//! - Server that listens on a Unix socket
//! - Request/response handling for scheduler commands
//! - Dispatch onto the scheduler runtime through [`SchedulerHandle`]

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{UnixListener, UnixStream};
use tokio::time::{timeout, Duration};

use crate::types::{IpcRequest, IpcResponse, ResponseData, SchedulerSnapshot};

use super::runtime::{RuntimeError, SchedulerHandle};

// ============================================================================
// Constants
// ============================================================================

/// Socket location relative to the home directory
pub const DEFAULT_SOCKET_PATH: &str = ".eyebreak/eyebreak.sock";

/// Maximum request size in bytes (4KB)
const MAX_REQUEST_SIZE: usize = 4096;

/// Read timeout in seconds
const READ_TIMEOUT_SECS: u64 = 5;

/// Returns the default socket path under the home directory.
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined.
pub fn default_socket_path() -> Result<PathBuf> {
    let home = dirs::home_dir().context("ホームディレクトリが見つかりません")?;
    Ok(home.join(DEFAULT_SOCKET_PATH))
}

// ============================================================================
// IpcError
// ============================================================================

/// IPC-specific error types.
#[derive(Debug, thiserror::Error)]
pub enum IpcError {
    /// Read error
    #[error("Failed to read request: {0}")]
    ReadError(String),

    /// The client hung up before sending anything
    #[error("Connection closed by client")]
    ConnectionClosed,

    /// Timeout error
    #[error("Operation timed out")]
    Timeout,

    /// Request too large
    #[error("Request too large (max {MAX_REQUEST_SIZE} bytes)")]
    RequestTooLarge,
}

// ============================================================================
// IpcServer
// ============================================================================

/// Unix Domain Socket IPC server.
pub struct IpcServer {
    /// Unix socket listener
    listener: UnixListener,
    /// Socket path (for cleanup)
    socket_path: PathBuf,
}

impl IpcServer {
    /// Creates a new IPC server bound to the specified socket path.
    ///
    /// If the socket file already exists, it will be removed before binding.
    ///
    /// # Errors
    ///
    /// Returns an error if the socket cannot be bound.
    pub fn new(socket_path: &Path) -> Result<Self> {
        if socket_path.exists() {
            std::fs::remove_file(socket_path)
                .with_context(|| format!("Failed to remove existing socket: {:?}", socket_path))?;
        }

        if let Some(parent) = socket_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create socket directory: {:?}", parent))?;
        }

        let listener = UnixListener::bind(socket_path)
            .with_context(|| format!("Failed to bind Unix socket: {:?}", socket_path))?;

        tracing::info!("listening on {:?}", socket_path);

        Ok(Self {
            listener,
            socket_path: socket_path.to_path_buf(),
        })
    }

    /// Accepts an incoming client connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be accepted.
    pub async fn accept(&self) -> Result<UnixStream> {
        let (stream, _addr) = self
            .listener
            .accept()
            .await
            .context("Failed to accept connection")?;
        Ok(stream)
    }

    /// Receives and deserializes an IPC request from the stream.
    ///
    /// Applies a read timeout to prevent blocking indefinitely.
    ///
    /// # Errors
    ///
    /// Returns an error if reading or deserialization fails.
    pub async fn receive_request(stream: &mut UnixStream) -> Result<IpcRequest> {
        let mut buffer = vec![0u8; MAX_REQUEST_SIZE];

        let read_result = timeout(
            Duration::from_secs(READ_TIMEOUT_SECS),
            stream.read(&mut buffer),
        )
        .await;

        let n = match read_result {
            Ok(Ok(n)) => n,
            Ok(Err(e)) => return Err(IpcError::ReadError(e.to_string()).into()),
            Err(_) => return Err(IpcError::Timeout.into()),
        };

        if n == 0 {
            return Err(IpcError::ConnectionClosed.into());
        }
        if n == MAX_REQUEST_SIZE {
            return Err(IpcError::RequestTooLarge.into());
        }

        let request: IpcRequest = serde_json::from_slice(&buffer[..n])
            .with_context(|| "Failed to deserialize IPC request")?;

        Ok(request)
    }

    /// Serializes and sends an IPC response to the stream.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub async fn send_response(stream: &mut UnixStream, response: &IpcResponse) -> Result<()> {
        let json = serde_json::to_vec(response).context("Failed to serialize IPC response")?;

        stream
            .write_all(&json)
            .await
            .context("Failed to write response")?;
        stream.flush().await.context("Failed to flush response")?;

        Ok(())
    }

    /// Serves one connection: reads a request, dispatches it, writes the response.
    ///
    /// Malformed requests get an error response instead of failing the server.
    pub async fn serve_connection(mut stream: UnixStream, handler: &RequestHandler) {
        let response = match Self::receive_request(&mut stream).await {
            Ok(request) => handler.handle(request).await,
            Err(e) => {
                tracing::warn!("invalid request: {:#}", e);
                IpcResponse::error(format!("不正なリクエストです: {}", e))
            }
        };

        if let Err(e) = Self::send_response(&mut stream, &response).await {
            tracing::warn!("failed to send response: {:#}", e);
        }
    }

    /// Returns the socket path.
    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }
}

impl Drop for IpcServer {
    fn drop(&mut self) {
        // Clean up socket file on drop
        let _ = std::fs::remove_file(&self.socket_path);
    }
}

// ============================================================================
// RequestHandler
// ============================================================================

/// Handles IPC requests by dispatching to the scheduler runtime.
#[derive(Debug, Clone)]
pub struct RequestHandler {
    handle: SchedulerHandle,
}

impl RequestHandler {
    /// Creates a new request handler for the given scheduler.
    pub fn new(handle: SchedulerHandle) -> Self {
        Self { handle }
    }

    /// Handles an IPC request and returns the appropriate response.
    pub async fn handle(&self, request: IpcRequest) -> IpcResponse {
        tracing::debug!(?request, "handling request");

        let result = match request {
            IpcRequest::Start => self.handle.start().await,
            IpcRequest::Pause => self.handle.pause().await,
            IpcRequest::Resume => self.handle.resume().await,
            IpcRequest::Toggle => self.handle.toggle_pause().await,
            IpcRequest::Skip => self.handle.skip_break().await,
            IpcRequest::Sleep => self.handle.system_sleep().await,
            IpcRequest::Wake => self.handle.system_wake().await,
            IpcRequest::Status => self.handle.snapshot().await,
        };

        match result {
            Ok(snapshot) => IpcResponse::success(
                Self::message_for(request, &snapshot),
                Some(ResponseData::from_snapshot(&snapshot)),
            ),
            Err(e @ RuntimeError::Closed) => IpcResponse::error(e.to_string()),
        }
    }

    fn message_for(request: IpcRequest, snapshot: &SchedulerSnapshot) -> &'static str {
        match request {
            IpcRequest::Start if snapshot.is_paused => "一時停止中のため開始できません",
            IpcRequest::Start if snapshot.is_on_break => "休憩中のため開始できません",
            IpcRequest::Start => "作業タイマーを開始しました",
            IpcRequest::Pause => "タイマーを一時停止しました",
            IpcRequest::Resume => "タイマーを再開しました",
            IpcRequest::Toggle if snapshot.is_paused => "タイマーを一時停止しました",
            IpcRequest::Toggle => "タイマーを再開しました",
            IpcRequest::Skip => "休憩をスキップしました",
            IpcRequest::Sleep => "スリープを受け付けました",
            IpcRequest::Wake => "スリープから復帰しました",
            IpcRequest::Status => "",
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    use crate::daemon::runtime;
    use crate::daemon::scheduler::{BreakScheduler, SchedulerEvent};
    use crate::types::SchedulerConfig;

    // ------------------------------------------------------------------------
    // Helper functions
    // ------------------------------------------------------------------------

    fn create_temp_socket_path() -> PathBuf {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.sock");
        // Keep the directory so it's not deleted
        std::mem::forget(dir);
        path
    }

    fn create_handler() -> (RequestHandler, mpsc::UnboundedReceiver<SchedulerEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let scheduler = BreakScheduler::new(SchedulerConfig::default(), tx);
        let (handle, _task) = runtime::spawn(scheduler);
        (RequestHandler::new(handle), rx)
    }

    async fn exchange(socket_path: PathBuf, request: &'static str) -> IpcResponse {
        tokio::time::sleep(Duration::from_millis(50)).await;
        let mut stream = UnixStream::connect(&socket_path).await.unwrap();
        stream.write_all(request.as_bytes()).await.unwrap();
        stream.flush().await.unwrap();

        let mut buffer = vec![0u8; 4096];
        let n = stream.read(&mut buffer).await.unwrap();
        serde_json::from_slice(&buffer[..n]).unwrap()
    }

    // ------------------------------------------------------------------------
    // IpcServer Tests
    // ------------------------------------------------------------------------

    mod ipc_server_tests {
        use super::*;

        #[tokio::test]
        async fn test_server_creation() {
            let socket_path = create_temp_socket_path();
            let server = IpcServer::new(&socket_path);

            assert!(server.is_ok());
            assert!(socket_path.exists());
        }

        #[tokio::test]
        async fn test_server_removes_existing_socket() {
            let socket_path = create_temp_socket_path();
            std::fs::write(&socket_path, "dummy").unwrap();

            let server = IpcServer::new(&socket_path);
            assert!(server.is_ok());
        }

        #[tokio::test]
        async fn test_server_creates_parent_directory() {
            let dir = tempfile::tempdir().unwrap();
            let socket_path = dir.path().join("subdir").join("test.sock");

            let server = IpcServer::new(&socket_path);
            assert!(server.is_ok());
            assert!(socket_path.parent().unwrap().exists());
        }

        #[tokio::test]
        async fn test_receive_request_skip() {
            let socket_path = create_temp_socket_path();
            let server = IpcServer::new(&socket_path).unwrap();

            let client_path = socket_path.clone();
            let client_handle = tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                let mut stream = UnixStream::connect(&client_path).await.unwrap();
                stream.write_all(br#"{"command":"skip"}"#).await.unwrap();
                stream.flush().await.unwrap();
            });

            let mut stream = server.accept().await.unwrap();
            let request = IpcServer::receive_request(&mut stream).await.unwrap();

            assert_eq!(request, IpcRequest::Skip);
            client_handle.await.unwrap();
        }

        #[tokio::test]
        async fn test_receive_request_invalid_json() {
            let socket_path = create_temp_socket_path();
            let server = IpcServer::new(&socket_path).unwrap();

            let client_path = socket_path.clone();
            let _client_handle = tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                let mut stream = UnixStream::connect(&client_path).await.unwrap();
                stream.write_all(b"not valid json").await.unwrap();
                stream.flush().await.unwrap();
            });

            let mut stream = server.accept().await.unwrap();
            let request = IpcServer::receive_request(&mut stream).await;

            assert!(request.is_err());
        }

        #[tokio::test]
        async fn test_connection_closed() {
            let socket_path = create_temp_socket_path();
            let server = IpcServer::new(&socket_path).unwrap();

            let client_path = socket_path.clone();
            let _client = tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                let stream = UnixStream::connect(&client_path).await.unwrap();
                drop(stream);
            });

            let mut stream = server.accept().await.unwrap();
            let result = IpcServer::receive_request(&mut stream).await;

            let err = result.unwrap_err();
            assert!(matches!(
                err.downcast_ref::<IpcError>(),
                Some(IpcError::ConnectionClosed)
            ));
        }

        #[tokio::test]
        async fn test_server_drop_cleanup() {
            let socket_path = create_temp_socket_path();

            {
                let _server = IpcServer::new(&socket_path).unwrap();
                assert!(socket_path.exists());
            }

            assert!(!socket_path.exists());
        }

        #[test]
        fn test_ipc_error_display() {
            assert_eq!(IpcError::Timeout.to_string(), "Operation timed out");
            assert!(IpcError::RequestTooLarge.to_string().contains("4096"));
            assert!(IpcError::ReadError("boom".into()).to_string().contains("boom"));
        }
    }

    // ------------------------------------------------------------------------
    // RequestHandler Tests
    // ------------------------------------------------------------------------

    mod request_handler_tests {
        use super::*;

        #[tokio::test]
        async fn test_handle_status_before_start() {
            let (handler, _rx) = create_handler();

            let response = handler.handle(IpcRequest::Status).await;

            assert_eq!(response.status, "success");
            let data = response.data.unwrap();
            assert_eq!(data.state, Some("working".to_string()));
            assert_eq!(data.remaining_seconds, Some(1200));
            assert_eq!(data.break_remaining_seconds, Some(20));
            assert_eq!(data.is_paused, Some(false));
        }

        #[tokio::test]
        async fn test_handle_start() {
            let (handler, _rx) = create_handler();

            let response = handler.handle(IpcRequest::Start).await;

            assert_eq!(response.status, "success");
            assert_eq!(response.message, "作業タイマーを開始しました");
        }

        #[tokio::test]
        async fn test_handle_start_while_paused() {
            let (handler, _rx) = create_handler();
            handler.handle(IpcRequest::Start).await;
            handler.handle(IpcRequest::Pause).await;

            let response = handler.handle(IpcRequest::Start).await;

            assert_eq!(response.status, "success");
            assert!(response.message.contains("一時停止中"));
            assert_eq!(response.data.unwrap().state, Some("paused".to_string()));
        }

        #[tokio::test]
        async fn test_handle_pause_and_resume() {
            let (handler, mut rx) = create_handler();
            handler.handle(IpcRequest::Start).await;

            let paused = handler.handle(IpcRequest::Pause).await;
            assert_eq!(paused.message, "タイマーを一時停止しました");
            assert_eq!(paused.data.unwrap().state, Some("paused".to_string()));

            let resumed = handler.handle(IpcRequest::Resume).await;
            assert_eq!(resumed.message, "タイマーを再開しました");
            assert_eq!(resumed.data.unwrap().state, Some("working".to_string()));

            assert_eq!(
                rx.recv().await,
                Some(SchedulerEvent::PauseChanged { paused: true })
            );
            assert_eq!(
                rx.recv().await,
                Some(SchedulerEvent::PauseChanged { paused: false })
            );
        }

        #[tokio::test]
        async fn test_handle_toggle_message_follows_state() {
            let (handler, _rx) = create_handler();
            handler.handle(IpcRequest::Start).await;

            let first = handler.handle(IpcRequest::Toggle).await;
            let second = handler.handle(IpcRequest::Toggle).await;

            assert_eq!(first.message, "タイマーを一時停止しました");
            assert_eq!(second.message, "タイマーを再開しました");
        }

        #[tokio::test]
        async fn test_handle_skip_resets_work() {
            let (handler, _rx) = create_handler();
            handler.handle(IpcRequest::Start).await;

            let response = handler.handle(IpcRequest::Skip).await;

            assert_eq!(response.message, "休憩をスキップしました");
            assert_eq!(response.data.unwrap().remaining_seconds, Some(1200));
        }

        #[tokio::test]
        async fn test_handle_sleep_stops_clock() {
            let (handler, _rx) = create_handler();
            handler.handle(IpcRequest::Start).await;

            let response = handler.handle(IpcRequest::Sleep).await;
            assert_eq!(response.status, "success");

            let response = handler.handle(IpcRequest::Wake).await;
            assert_eq!(response.message, "スリープから復帰しました");
            assert_eq!(response.data.unwrap().remaining_seconds, Some(1200));
        }

        #[tokio::test]
        async fn test_handle_after_shutdown() {
            let (tx, _rx) = mpsc::unbounded_channel();
            let scheduler = BreakScheduler::new(SchedulerConfig::default(), tx);
            let (handle, task) = runtime::spawn(scheduler);
            let handler = RequestHandler::new(handle.clone());
            handle.shutdown().await.unwrap();
            task.await.unwrap();

            let response = handler.handle(IpcRequest::Status).await;

            assert!(response.is_error());
            assert!(response.message.contains("停止"));
        }
    }

    // ------------------------------------------------------------------------
    // Integration Tests
    // ------------------------------------------------------------------------

    mod integration_tests {
        use super::*;

        #[tokio::test]
        async fn test_full_ipc_flow() {
            let socket_path = create_temp_socket_path();
            let server = IpcServer::new(&socket_path).unwrap();
            let (handler, _rx) = create_handler();

            let client = tokio::spawn(exchange(socket_path.clone(), r#"{"command":"start"}"#));

            let stream = server.accept().await.unwrap();
            IpcServer::serve_connection(stream, &handler).await;

            let response = client.await.unwrap();
            assert_eq!(response.status, "success");
            assert_eq!(response.message, "作業タイマーを開始しました");
            assert_eq!(response.data.unwrap().state, Some("working".to_string()));
        }

        #[tokio::test]
        async fn test_malformed_request_gets_error_response() {
            let socket_path = create_temp_socket_path();
            let server = IpcServer::new(&socket_path).unwrap();
            let (handler, _rx) = create_handler();

            let client = tokio::spawn(exchange(socket_path.clone(), r#"{"command":"explode"}"#));

            let stream = server.accept().await.unwrap();
            IpcServer::serve_connection(stream, &handler).await;

            let response = client.await.unwrap();
            assert!(response.is_error());
            assert!(response.message.contains("不正なリクエスト"));
        }

        #[tokio::test]
        async fn test_all_commands_flow() {
            let (handler, _rx) = create_handler();

            let commands = vec![
                (r#"{"command":"start"}"#, "working"),
                (r#"{"command":"pause"}"#, "paused"),
                (r#"{"command":"skip"}"#, "paused"),
                (r#"{"command":"resume"}"#, "working"),
                (r#"{"command":"toggle"}"#, "paused"),
                (r#"{"command":"toggle"}"#, "working"),
                (r#"{"command":"sleep"}"#, "working"),
                (r#"{"command":"wake"}"#, "working"),
                (r#"{"command":"status"}"#, "working"),
            ];

            for (cmd_json, expected_state) in commands {
                let request: IpcRequest = serde_json::from_str(cmd_json).unwrap();
                let response = handler.handle(request).await;

                assert_eq!(response.status, "success", "Command: {}", cmd_json);
                assert_eq!(
                    response.data.unwrap().state,
                    Some(expected_state.to_string()),
                    "Command: {}",
                    cmd_json
                );
            }
        }
    }
}
