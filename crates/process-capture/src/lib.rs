//! Spawn external commands and stream their output into caller-owned sinks.
//!
//! The caller decides where stdout and stderr go by supplying [`OutputSink`]
//! implementations; the child is killed when the supplied cancellation token
//! fires. Exit status interpretation is left to the caller.

use std::process::{ExitStatus, Stdio};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

const READ_BUF_SIZE: usize = 4096;

/// Errors from spawning or waiting on an external command.
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("failed to spawn command: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("failed to wait for command: {0}")]
    Wait(#[source] std::io::Error),
}

/// Destination for a child process output stream.
///
/// Sinks own their failure handling; a sink that cannot accept a chunk is
/// expected to log and drop it rather than stall the reader.
#[async_trait]
pub trait OutputSink: Send + Sync {
    async fn write_chunk(&self, chunk: &[u8]);
}

/// Sink that accumulates output in memory as lossy UTF-8.
#[derive(Clone, Default)]
pub struct MemorySink {
    buf: Arc<Mutex<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything written so far.
    pub fn contents(&self) -> String {
        self.buf.lock().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.lock().is_empty()
    }
}

#[async_trait]
impl OutputSink for MemorySink {
    async fn write_chunk(&self, chunk: &[u8]) {
        self.buf.lock().push_str(&String::from_utf8_lossy(chunk));
    }
}

/// Run a command to completion, forwarding stdout/stderr chunks to the sinks.
///
/// When `token` fires before the child exits, the child is killed and its
/// final (failed) exit status is returned. Reader tasks are always joined so
/// the sinks have received every chunk by the time this returns.
pub async fn run_captured(
    mut command: Command,
    stdout: Arc<dyn OutputSink>,
    stderr: Arc<dyn OutputSink>,
    token: CancellationToken,
) -> Result<ExitStatus, CaptureError> {
    command.stdout(Stdio::piped());
    command.stderr(Stdio::piped());
    command.kill_on_drop(true);

    let mut child = command.spawn().map_err(CaptureError::Spawn)?;

    let stdout_handle = child
        .stdout
        .take()
        .map(|stream| tokio::spawn(forward_stream(stream, stdout.clone())));
    let stderr_handle = child
        .stderr
        .take()
        .map(|stream| tokio::spawn(forward_stream(stream, stderr.clone())));

    let status = tokio::select! {
        result = child.wait() => result.map_err(CaptureError::Wait)?,
        _ = token.cancelled() => {
            debug!("cancellation requested, killing child process");
            if let Err(error) = child.start_kill() {
                warn!(%error, "failed to kill child process");
            }
            child.wait().await.map_err(CaptureError::Wait)?
        }
    };

    // Join the readers so trailing output lands in the sinks.
    if let Some(handle) = stdout_handle {
        let _ = handle.await;
    }
    if let Some(handle) = stderr_handle {
        let _ = handle.await;
    }

    Ok(status)
}

async fn forward_stream<R>(mut reader: R, sink: Arc<dyn OutputSink>)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let mut buf = [0u8; READ_BUF_SIZE];
    loop {
        match reader.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => sink.write_chunk(&buf[..n]).await,
            Err(error) => {
                debug!(%error, "output stream read ended with error");
                break;
            }
        }
    }
}
