//! The render loop: the one task that owns an [`OverlaySession`].
//!
//! It `select!`s over four things:
//!
//! - the fixed-rate render tick (`frame_interval`);
//! - raw input events from the input source's unbounded channel;
//! - configuration updates from a `watch` channel (hot reload);
//! - the shutdown signal.
//!
//! Input is drained with `try_recv` right before each frame is composed, so a
//! burst of input between ticks lands in the next frame without ever
//! delaying it.  Frames are produced on every tick whether or not input
//! arrived, which is what lets segments keep decaying while the mouse is
//! still.
//!
//! # Cancellation
//!
//! On shutdown (or, in drain mode, once input has ended and nothing is left
//! on screen) the loop stops ticking, releases the cursor controller and
//! returns.  The input subscription guard lives with the caller and stops the
//! source when it is dropped.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc::UnboundedReceiver, watch};
use tokio::time::{self, Instant, Interval, MissedTickBehavior};
use tracing::{debug, info, warn};
use trails_core::OverlayConfig;

use super::session::OverlaySession;
use crate::infrastructure::display::FrameSink;
use crate::infrastructure::input_capture::RawInputEvent;

/// Monotonic clock anchored at session start.
#[derive(Debug, Clone, Copy)]
pub struct SessionClock {
    epoch: Instant,
}

impl SessionClock {
    pub fn start() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }

    pub fn epoch(&self) -> Instant {
        self.epoch
    }

    /// Time elapsed since the session epoch.
    pub fn now(&self) -> Duration {
        self.epoch.elapsed()
    }
}

/// Counters reported when the loop exits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub frames: u64,
    pub events: u64,
    pub config_reloads: u64,
    pub sink_failures: u64,
}

pub struct RenderLoop {
    session: OverlaySession,
    sink: Arc<dyn FrameSink>,
    clock: SessionClock,
    stop_when_drained: bool,
}

impl RenderLoop {
    pub fn new(session: OverlaySession, sink: Arc<dyn FrameSink>, clock: SessionClock) -> Self {
        Self {
            session,
            sink,
            clock,
            stop_when_drained: false,
        }
    }

    /// Exit once the input channel has closed and the session has settled.
    pub fn stop_when_drained(mut self, stop: bool) -> Self {
        self.stop_when_drained = stop;
        self
    }

    /// Runs until shutdown.  Returns the loop's counters.
    pub async fn run(
        mut self,
        mut input: UnboundedReceiver<RawInputEvent>,
        mut config_updates: watch::Receiver<Arc<OverlayConfig>>,
        mut shutdown: watch::Receiver<bool>,
    ) -> RenderStats {
        let mut stats = RenderStats::default();
        let mut ticker = ticker(self.session.config().frame_interval);
        let mut input_open = true;
        let mut config_open = true;

        info!(
            interval_ms = self.session.config().frame_interval.as_millis() as u64,
            style = %self.session.config().trail.style,
            "render loop started"
        );

        loop {
            tokio::select! {
                biased;

                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        debug!("shutdown requested");
                        break;
                    }
                }

                _ = ticker.tick() => {
                    if input_open {
                        input_open = self.drain_pending(&mut input, &mut stats);
                    }
                    let frame = self.session.tick(self.clock.now());
                    stats.frames += 1;
                    if let Err(e) = self.sink.present(&frame).await {
                        stats.sink_failures += 1;
                        warn!("display surface rejected frame: {e}");
                    }
                    if !input_open && self.stop_when_drained && self.session.is_settled() {
                        debug!("input ended and trail settled");
                        break;
                    }
                }

                changed = config_updates.changed(), if config_open => {
                    match changed {
                        Ok(()) => {
                            let next = Arc::clone(&config_updates.borrow_and_update());
                            let interval_changed =
                                next.frame_interval != self.session.config().frame_interval;
                            self.session.apply_config(next);
                            if interval_changed {
                                ticker = ticker_after(self.session.config().frame_interval);
                            }
                            stats.config_reloads += 1;
                        }
                        Err(_) => config_open = false,
                    }
                }

                event = input.recv(), if input_open => {
                    match event {
                        Some(event) => {
                            self.session.handle_event(event);
                            stats.events += 1;
                        }
                        None => {
                            debug!("input source closed");
                            input_open = false;
                        }
                    }
                }
            }
        }

        self.session.shutdown();
        info!(
            frames = stats.frames,
            events = stats.events,
            reloads = stats.config_reloads,
            "render loop stopped"
        );
        stats
    }

    /// Handles every event already queued.  Returns `false` once the channel
    /// has closed.
    fn drain_pending(
        &mut self,
        input: &mut UnboundedReceiver<RawInputEvent>,
        stats: &mut RenderStats,
    ) -> bool {
        use tokio::sync::mpsc::error::TryRecvError;
        loop {
            match input.try_recv() {
                Ok(event) => {
                    self.session.handle_event(event);
                    stats.events += 1;
                }
                Err(TryRecvError::Empty) => return true,
                Err(TryRecvError::Disconnected) => return false,
            }
        }
    }
}

fn ticker(period: Duration) -> Interval {
    let mut interval = time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    interval
}

fn ticker_after(period: Duration) -> Interval {
    let mut interval = time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    interval
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::recenter::MockCursorController;
    use crate::infrastructure::display::{NullSurface, SurfaceError};
    use crate::infrastructure::input_capture::MotionSample;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tokio::sync::mpsc;
    use trails_core::{Frame, Point, TrailStyle};

    // ── Test doubles ──────────────────────────────────────────────────────────

    #[derive(Default)]
    struct RecordingSink {
        frames: Mutex<Vec<Frame>>,
        fail: bool,
    }

    #[async_trait]
    impl FrameSink for RecordingSink {
        async fn present(&self, frame: &Frame) -> Result<(), SurfaceError> {
            if self.fail {
                return Err(SurfaceError::Io(std::io::Error::other("injected failure")));
            }
            self.frames.lock().unwrap().push(frame.clone());
            Ok(())
        }
    }

    fn session(edit: impl FnOnce(&mut OverlayConfig)) -> (OverlaySession, Arc<OverlayConfig>) {
        let mut cfg = OverlayConfig::default();
        cfg.frame_interval = Duration::from_millis(50);
        cfg.trail.ttl = Duration::from_millis(1000);
        edit(&mut cfg);
        let cfg = Arc::new(cfg);
        let mut mock = MockCursorController::new();
        mock.expect_cursor_position().return_const(Point::ORIGIN);
        mock.expect_warp_cursor().returning(|_| Ok(()));
        mock.expect_release().times(1).return_const(());
        (OverlaySession::new(Arc::clone(&cfg), Arc::new(mock)), cfg)
    }

    fn motion(dx: f64, at: Duration) -> RawInputEvent {
        RawInputEvent::Motion {
            motion: MotionSample::relative(dx, 0.0),
            timestamp: at,
        }
    }

    // ── Tests ─────────────────────────────────────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn test_frames_keep_coming_without_input() {
        // Arrange
        let (session, cfg) = session(|_| {});
        let sink = Arc::new(RecordingSink::default());
        let (_input_tx, input_rx) = mpsc::unbounded_channel();
        let (_cfg_tx, cfg_rx) = watch::channel(cfg);
        let (stop_tx, stop_rx) = watch::channel(false);
        let clock = SessionClock::start();
        let render = RenderLoop::new(session, Arc::clone(&sink) as Arc<dyn FrameSink>, clock);
        let task = tokio::spawn(render.run(input_rx, cfg_rx, stop_rx));

        // Act – ten intervals of silence
        time::sleep(Duration::from_millis(475)).await;
        stop_tx.send(true).expect("loop alive");
        let stats = task.await.expect("loop task");

        // Assert – ticks at 0, 50, …, 450
        assert_eq!(stats.frames, 10);
        assert_eq!(stats.events, 0);
        assert_eq!(sink.frames.lock().unwrap().len(), 10);
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_between_ticks_lands_in_next_frame() {
        // Arrange
        let (session, cfg) = session(|_| {});
        let sink = Arc::new(RecordingSink::default());
        let (input_tx, input_rx) = mpsc::unbounded_channel();
        let (_cfg_tx, cfg_rx) = watch::channel(cfg);
        let (stop_tx, stop_rx) = watch::channel(false);
        let clock = SessionClock::start();
        let render = RenderLoop::new(session, Arc::clone(&sink) as Arc<dyn FrameSink>, clock);

        for _ in 0..200 {
            input_tx.send(motion(2.0, Duration::ZERO)).expect("send");
        }
        let task = tokio::spawn(render.run(input_rx, cfg_rx, stop_rx));

        // Act
        time::sleep(Duration::from_millis(75)).await;
        stop_tx.send(true).expect("loop alive");
        let stats = task.await.expect("loop task");

        // Assert – two frames, the very first already shows the whole burst
        assert_eq!(stats.frames, 2);
        assert_eq!(stats.events, 200);
        let frames = sink.frames.lock().unwrap();
        assert_eq!(frames[0].stroke_count(), 200);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hot_reload_applies_between_ticks() {
        // Arrange
        let (session, cfg) = session(|c| c.trail.style = TrailStyle::SmoothFade);
        let sink = Arc::new(RecordingSink::default());
        let (input_tx, input_rx) = mpsc::unbounded_channel();
        let (cfg_tx, cfg_rx) = watch::channel(Arc::clone(&cfg));
        let (stop_tx, stop_rx) = watch::channel(false);
        let render = RenderLoop::new(
            session,
            Arc::clone(&sink) as Arc<dyn FrameSink>,
            SessionClock::start(),
        );
        input_tx.send(motion(10.0, Duration::ZERO)).expect("send");
        let task = tokio::spawn(render.run(input_rx, cfg_rx, stop_rx));

        // Act
        time::sleep(Duration::from_millis(10)).await;
        let mut next = (*cfg).clone();
        next.trail.style = TrailStyle::VanillaVanish;
        next.trail.width = 9.0;
        cfg_tx.send(Arc::new(next)).expect("loop alive");
        time::sleep(Duration::from_millis(500)).await;
        stop_tx.send(true).expect("loop alive");
        let stats = task.await.expect("loop task");

        // Assert
        assert_eq!(stats.config_reloads, 1);
        let frames = sink.frames.lock().unwrap();
        let last = frames.last().expect("frames");
        match &last.commands[0] {
            trails_core::DrawCommand::Stroke { width, .. } => assert_eq!(*width, 9.0),
            other => panic!("expected stroke, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_drain_mode_exits_after_input_ends_and_trail_expires() {
        // Arrange
        let (session, cfg) = session(|_| {});
        let sink = Arc::new(NullSurface::new());
        let (input_tx, input_rx) = mpsc::unbounded_channel();
        let (_cfg_tx, cfg_rx) = watch::channel(cfg);
        let (_stop_tx, stop_rx) = watch::channel(false);
        let render = RenderLoop::new(
            session,
            Arc::clone(&sink) as Arc<dyn FrameSink>,
            SessionClock::start(),
        )
        .stop_when_drained(true);

        // Act
        input_tx.send(motion(10.0, Duration::ZERO)).expect("send");
        drop(input_tx);
        let stats = time::timeout(
            Duration::from_secs(5),
            render.run(input_rx, cfg_rx, stop_rx),
        )
        .await
        .expect("loop should exit by itself");

        // Assert – the 1000 ms trail needs ticks up to t=1000
        assert_eq!(stats.events, 1);
        assert!(stats.frames >= 21);
        assert_eq!(sink.presented(), stats.frames);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sink_failures_are_counted_not_fatal() {
        let (session, cfg) = session(|_| {});
        let sink = Arc::new(RecordingSink {
            fail: true,
            ..Default::default()
        });
        let (_input_tx, input_rx) = mpsc::unbounded_channel();
        let (_cfg_tx, cfg_rx) = watch::channel(cfg);
        let (stop_tx, stop_rx) = watch::channel(false);
        let render = RenderLoop::new(session, sink as Arc<dyn FrameSink>, SessionClock::start());
        let task = tokio::spawn(render.run(input_rx, cfg_rx, stop_rx));

        time::sleep(Duration::from_millis(120)).await;
        stop_tx.send(true).expect("loop alive");
        let stats = task.await.expect("loop task");

        assert_eq!(stats.frames, 3);
        assert_eq!(stats.sink_failures, 3);
    }
}
