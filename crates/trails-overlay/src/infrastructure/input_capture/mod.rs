//! Input capture infrastructure for the overlay.
//!
//! An input source delivers raw pointer events from wherever they originate
//! (an OS hook thread, a recorded script, a test) into an unbounded tokio
//! channel.  Sending on an unbounded channel never blocks, so a slow render
//! tick can never back-pressure the input side, and the sender may be used
//! from any thread.
//!
//! # Subscription lifetime
//!
//! [`InputSubscription`] wraps a started source and calls
//! [`InputSource::stop`] when dropped, so the capture is released on every
//! exit path of the render loop.
//!
//! # Testability
//!
//! The [`InputSource`] trait lets tests inject synthetic events through
//! [`mock::MockInputSource`] without any OS hooks.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::UnboundedReceiver;
use tracing::debug;
use trails_core::{Point, PointerButton};

pub mod idle;
pub mod mock;
pub mod replay;

/// One pointer motion sample as reported by the source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MotionSample {
    /// Raw device delta.
    Relative { dx: f64, dy: f64 },
    /// Absolute OS cursor position.
    Absolute { x: f64, y: f64 },
}

impl MotionSample {
    pub fn relative(dx: f64, dy: f64) -> Self {
        MotionSample::Relative { dx, dy }
    }

    pub fn absolute(p: Point) -> Self {
        MotionSample::Absolute { x: p.x, y: p.y }
    }
}

/// A raw input event produced by an input source.
///
/// `timestamp` is measured from the session epoch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawInputEvent {
    Motion {
        motion: MotionSample,
        timestamp: Duration,
    },
    Button {
        button: PointerButton,
        pressed: bool,
        timestamp: Duration,
    },
}

impl RawInputEvent {
    pub fn timestamp(&self) -> Duration {
        match self {
            RawInputEvent::Motion { timestamp, .. } | RawInputEvent::Button { timestamp, .. } => {
                *timestamp
            }
        }
    }
}

/// Error type for input capture operations.
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("failed to read input script {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to start input thread: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("input source has not been started")]
    NotStarted,
    #[error("input source is already running")]
    AlreadyRunning,
}

/// Trait abstracting input event production.
pub trait InputSource: Send + Sync {
    /// Starts the source and returns the receiving end of its event channel.
    fn start(&self) -> Result<UnboundedReceiver<RawInputEvent>, CaptureError>;
    /// Stops the source and releases everything it acquired.  Idempotent.
    fn stop(&self);
}

/// A started input source; stops it on drop.
pub struct InputSubscription {
    source: Arc<dyn InputSource>,
}

impl InputSubscription {
    /// Starts `source` and returns the guard together with its event stream.
    ///
    /// # Errors
    ///
    /// Propagates the source's [`CaptureError`].
    pub fn start(
        source: Arc<dyn InputSource>,
    ) -> Result<(Self, UnboundedReceiver<RawInputEvent>), CaptureError> {
        let rx = source.start()?;
        debug!("input subscription started");
        Ok((Self { source }, rx))
    }
}

impl Drop for InputSubscription {
    fn drop(&mut self) {
        self.source.stop();
        debug!("input subscription released");
    }
}
