//! Scripted input source that replays a recorded JSON-lines file.
//!
//! Each non-empty line is one event:
//!
//! ```text
//! {"type":"move","t_ms":0,"dx":4.0,"dy":0.0}
//! {"type":"move_to","t_ms":16,"x":960.0,"y":540.0}
//! {"type":"button","t_ms":20,"button":"left","pressed":true}
//! ```
//!
//! `t_ms` is measured from the session epoch.  Lines starting with `#` are
//! comments.  A malformed line is logged and skipped; it never aborts the
//! replay.
//!
//! Events are delivered from a dedicated thread.  In paced mode the thread
//! sleeps until each event's timestamp, so the render loop sees the same
//! timing the recording had; unpaced mode delivers everything at once.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use serde::Deserialize;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tracing::{debug, warn};
use trails_core::PointerButton;

use super::{CaptureError, InputSource, MotionSample, RawInputEvent};
use crate::infrastructure::cursor::SimulatedCursor;

/// Longest single sleep of the pacing thread, so `stop()` is noticed quickly.
const STOP_POLL: Duration = Duration::from_millis(10);

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ScriptLine {
    Move { t_ms: u64, dx: f64, dy: f64 },
    MoveTo { t_ms: u64, x: f64, y: f64 },
    Button { t_ms: u64, button: PointerButton, pressed: bool },
}

impl From<ScriptLine> for RawInputEvent {
    fn from(line: ScriptLine) -> Self {
        match line {
            ScriptLine::Move { t_ms, dx, dy } => RawInputEvent::Motion {
                motion: MotionSample::Relative { dx, dy },
                timestamp: Duration::from_millis(t_ms),
            },
            ScriptLine::MoveTo { t_ms, x, y } => RawInputEvent::Motion {
                motion: MotionSample::Absolute { x, y },
                timestamp: Duration::from_millis(t_ms),
            },
            ScriptLine::Button { t_ms, button, pressed } => RawInputEvent::Button {
                button,
                pressed,
                timestamp: Duration::from_millis(t_ms),
            },
        }
    }
}

/// Parses a replay script, skipping comments, blank and malformed lines.
pub fn parse_script(text: &str) -> Vec<RawInputEvent> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| {
            let line = line.trim();
            !line.is_empty() && !line.starts_with('#')
        })
        .filter_map(|(idx, line)| match serde_json::from_str::<ScriptLine>(line) {
            Ok(parsed) => Some(parsed.into()),
            Err(e) => {
                warn!(line = idx + 1, "skipping malformed replay line: {e}");
                None
            }
        })
        .collect()
}

/// An [`InputSource`] that replays a fixed list of events.
pub struct ReplayInputSource {
    events: Arc<Vec<RawInputEvent>>,
    epoch: Instant,
    paced: bool,
    running: Arc<AtomicBool>,
    os_cursor: Option<Arc<SimulatedCursor>>,
}

impl ReplayInputSource {
    /// Creates a source replaying `events` relative to `epoch`.
    pub fn new(events: Vec<RawInputEvent>, epoch: Instant) -> Self {
        Self {
            events: Arc::new(events),
            epoch,
            paced: true,
            running: Arc::new(AtomicBool::new(false)),
            os_cursor: None,
        }
    }

    /// Reads and parses a script file.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::Io`] if the file cannot be read.
    pub fn from_path(path: &Path, epoch: Instant) -> Result<Self, CaptureError> {
        let text = std::fs::read_to_string(path).map_err(|source| CaptureError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let events = parse_script(&text);
        debug!(path = %path.display(), events = events.len(), "replay script loaded");
        Ok(Self::new(events, epoch))
    }

    /// Enables or disables real-time pacing.
    pub fn paced(mut self, paced: bool) -> Self {
        self.paced = paced;
        self
    }

    /// Moves `cursor` with every replayed motion before the event is sent,
    /// as the OS moves its pointer ahead of the hook seeing the event.
    pub fn driving(mut self, cursor: Arc<SimulatedCursor>) -> Self {
        self.os_cursor = Some(cursor);
        self
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl InputSource for ReplayInputSource {
    fn start(&self) -> Result<UnboundedReceiver<RawInputEvent>, CaptureError> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(CaptureError::AlreadyRunning);
        }
        let (tx, rx) = mpsc::unbounded_channel();
        let events = Arc::clone(&self.events);
        let running = Arc::clone(&self.running);
        let epoch = self.epoch;
        let paced = self.paced;
        let os_cursor = self.os_cursor.clone();

        let spawned = thread::Builder::new()
            .name("replay-input".into())
            .spawn(move || {
                for event in events.iter() {
                    if paced && !sleep_until(epoch + event.timestamp(), &running) {
                        break;
                    }
                    if !running.load(Ordering::SeqCst) {
                        break;
                    }
                    if let (Some(cursor), RawInputEvent::Motion { motion, .. }) =
                        (&os_cursor, event)
                    {
                        cursor.follow(*motion);
                    }
                    if tx.send(*event).is_err() {
                        break;
                    }
                }
                debug!("replay finished");
                // `tx` drops here, closing the channel.
            });
        if let Err(e) = spawned {
            self.running.store(false, Ordering::SeqCst);
            return Err(CaptureError::Spawn(e));
        }
        Ok(rx)
    }

    fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

/// Sleeps until `deadline`; returns `false` if `running` was cleared first.
fn sleep_until(deadline: Instant, running: &AtomicBool) -> bool {
    loop {
        if !running.load(Ordering::SeqCst) {
            return false;
        }
        let now = Instant::now();
        if now >= deadline {
            return true;
        }
        thread::sleep((deadline - now).min(STOP_POLL));
    }
}
