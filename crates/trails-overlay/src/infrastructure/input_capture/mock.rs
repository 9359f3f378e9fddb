//! Mock input source for testing.
//!
//! Allows tests to inject synthetic [`RawInputEvent`]s without a hook thread.

use std::sync::{Mutex, PoisonError};

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use super::{CaptureError, InputSource, RawInputEvent};

/// A mock implementation of [`InputSource`] that allows tests to inject events.
#[derive(Default)]
pub struct MockInputSource {
    sender: Mutex<Option<UnboundedSender<RawInputEvent>>>,
    start_count: Mutex<u32>,
}

impl MockInputSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Injects a synthetic event, as if captured from hardware.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::NotStarted`] before `start()`, after `stop()`,
    /// or once the receiver has been dropped.
    pub fn inject_event(&self, event: RawInputEvent) -> Result<(), CaptureError> {
        let guard = self.sender.lock().unwrap_or_else(PoisonError::into_inner);
        match guard.as_ref() {
            Some(sender) => sender.send(event).map_err(|_| CaptureError::NotStarted),
            None => Err(CaptureError::NotStarted),
        }
    }

    pub fn is_running(&self) -> bool {
        self.sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Number of successful `start()` calls.
    pub fn start_count(&self) -> u32 {
        *self.start_count.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl InputSource for MockInputSource {
    fn start(&self) -> Result<UnboundedReceiver<RawInputEvent>, CaptureError> {
        let mut sender = self.sender.lock().unwrap_or_else(PoisonError::into_inner);
        if sender.is_some() {
            return Err(CaptureError::AlreadyRunning);
        }
        let (tx, rx) = mpsc::unbounded_channel();
        *sender = Some(tx);
        *self.start_count.lock().unwrap_or_else(PoisonError::into_inner) += 1;
        Ok(rx)
    }

    fn stop(&self) {
        // Dropping the sender closes the channel.
        *self.sender.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}
