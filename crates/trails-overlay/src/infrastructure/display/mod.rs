//! Display surfaces: where composed frames go.
//!
//! The render loop hands every frame to a [`FrameSink`].  The core does not
//! care whether that is a window, a texture or a capture source; this crate
//! ships two headless surfaces:
//!
//! - [`JsonLinesSurface`] writes one JSON object per frame (a file or stdout),
//!   which is what `--frames-out` uses and what external renderers consume.
//! - [`NullSurface`] only counts frames.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;
use trails_core::Frame;

/// Error type for display surfaces.
#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("failed to write frame: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode frame: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Receives one composed frame per render tick.
#[async_trait]
pub trait FrameSink: Send + Sync {
    async fn present(&self, frame: &Frame) -> Result<(), SurfaceError>;
}

type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Writes each frame as one line of JSON.
pub struct JsonLinesSurface {
    writer: Mutex<BoxedWriter>,
}

impl JsonLinesSurface {
    pub fn new(writer: impl AsyncWrite + Send + Unpin + 'static) -> Self {
        Self {
            writer: Mutex::new(Box::new(writer)),
        }
    }

    /// Creates (or truncates) `path` and writes frames to it.
    ///
    /// # Errors
    ///
    /// Returns [`SurfaceError::Io`] if the file cannot be created.
    pub async fn create(path: &Path) -> Result<Self, SurfaceError> {
        let file = tokio::fs::File::create(path).await?;
        Ok(Self::new(file))
    }

    pub fn stdout() -> Self {
        Self::new(tokio::io::stdout())
    }
}

#[async_trait]
impl FrameSink for JsonLinesSurface {
    async fn present(&self, frame: &Frame) -> Result<(), SurfaceError> {
        let mut line = serde_json::to_vec(frame)?;
        line.push(b'\n');
        let mut writer = self.writer.lock().await;
        writer.write_all(&line).await?;
        writer.flush().await?;
        Ok(())
    }
}

/// Discards frames, counting them.
#[derive(Debug, Default)]
pub struct NullSurface {
    presented: AtomicU64,
}

impl NullSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn presented(&self) -> u64 {
        self.presented.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl FrameSink for NullSurface {
    async fn present(&self, _frame: &Frame) -> Result<(), SurfaceError> {
        self.presented.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}
