//! Input source that never produces events.
//!
//! Used by the binary when no replay script is given: the channel stays open
//! until `stop()`, so the render loop keeps drawing (idle) frames.

use std::sync::{Mutex, PoisonError};

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::debug;

use super::{CaptureError, InputSource, RawInputEvent};

#[derive(Default)]
pub struct IdleInputSource {
    sender: Mutex<Option<UnboundedSender<RawInputEvent>>>,
}

impl IdleInputSource {
    pub fn new() -> Self {
        Self::default()
    }
}

impl InputSource for IdleInputSource {
    fn start(&self) -> Result<UnboundedReceiver<RawInputEvent>, CaptureError> {
        let mut sender = self.sender.lock().unwrap_or_else(PoisonError::into_inner);
        if sender.is_some() {
            return Err(CaptureError::AlreadyRunning);
        }
        let (tx, rx) = mpsc::unbounded_channel();
        *sender = Some(tx);
        debug!("idle input source started");
        Ok(rx)
    }

    fn stop(&self) {
        self.sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }
}
