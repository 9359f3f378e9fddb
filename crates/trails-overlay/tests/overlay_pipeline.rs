//! Integration tests for the overlay pipeline.
//!
//! These exercise the application layer of trails-overlay end-to-end:
//! input source → `OverlaySession` → `RenderLoop` → display surface, with
//! the simulated cursor standing in for the OS.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::watch;
use trails_core::{DrawCommand, Frame, OverlayConfig, Point, PointerButton, RecenterTrigger};
use trails_overlay::application::recenter::CursorController;
use trails_overlay::application::render_loop::{RenderLoop, SessionClock};
use trails_overlay::application::session::OverlaySession;
use trails_overlay::infrastructure::cursor::SimulatedCursor;
use trails_overlay::infrastructure::display::{FrameSink, SurfaceError};
use trails_overlay::infrastructure::input_capture::mock::MockInputSource;
use trails_overlay::infrastructure::input_capture::replay::{parse_script, ReplayInputSource};
use trails_overlay::infrastructure::input_capture::{
    InputSource, InputSubscription, MotionSample, RawInputEvent,
};

// ── Helpers ───────────────────────────────────────────────────────────────────

#[derive(Default)]
struct RecordingSink {
    frames: Mutex<Vec<Frame>>,
}

#[async_trait]
impl FrameSink for RecordingSink {
    async fn present(&self, frame: &Frame) -> Result<(), SurfaceError> {
        self.frames.lock().unwrap().push(frame.clone());
        Ok(())
    }
}

fn motion(dx: f64, dy: f64, at_ms: u64) -> RawInputEvent {
    RawInputEvent::Motion {
        motion: MotionSample::relative(dx, dy),
        timestamp: Duration::from_millis(at_ms),
    }
}

fn session_with(
    cfg: OverlayConfig,
    cursor: Arc<SimulatedCursor>,
) -> (OverlaySession, Arc<OverlayConfig>) {
    cfg.validate().expect("test config must validate");
    let cfg = Arc::new(cfg);
    let controller: Arc<dyn CursorController> = cursor;
    (OverlaySession::new(Arc::clone(&cfg), controller), cfg)
}

// ── Render loop ───────────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_injected_drag_is_drawn_then_fades_out_and_loop_exits() {
    // Arrange
    let cursor = Arc::new(SimulatedCursor::new(trails_core::Rect::sized(1920.0, 1080.0)));
    let (session, cfg) = session_with(OverlayConfig::default(), Arc::clone(&cursor));
    let source = Arc::new(MockInputSource::new());
    let (subscription, input) =
        InputSubscription::start(Arc::clone(&source) as Arc<dyn InputSource>)
            .expect("start should succeed");
    source
        .inject_event(RawInputEvent::Button {
            button: PointerButton::Left,
            pressed: true,
            timestamp: Duration::ZERO,
        })
        .expect("inject");
    for _ in 0..3 {
        source.inject_event(motion(10.0, 0.0, 0)).expect("inject");
    }
    drop(subscription);
    assert!(!source.is_running());

    let sink = Arc::new(RecordingSink::default());
    let (_cfg_tx, cfg_rx) = watch::channel(cfg);
    let (_stop_tx, stop_rx) = watch::channel(false);
    let render = RenderLoop::new(
        session,
        Arc::clone(&sink) as Arc<dyn FrameSink>,
        SessionClock::start(),
    )
    .stop_when_drained(true);

    // Act
    let stats = tokio::time::timeout(Duration::from_secs(10), render.run(input, cfg_rx, stop_rx))
        .await
        .expect("loop should exit once everything faded");

    // Assert
    assert_eq!(stats.events, 4);
    let frames = sink.frames.lock().unwrap();
    assert_eq!(frames[0].stroke_count(), 3);
    assert_eq!(frames[0].marker_count(), 1);
    assert!(frames.last().expect("frames").commands.is_empty());
    assert!(cursor.is_released(), "shutdown must release the cursor");
}

#[tokio::test]
async fn test_unpaced_replay_script_is_played_to_the_end() {
    // Arrange
    let script = r#"
{"type":"move","t_ms":0,"dx":5.0,"dy":0.0}
{"type":"move","t_ms":1,"dx":5.0,"dy":5.0}
{"type":"button","t_ms":2,"button":"right","pressed":true}
{"type":"button","t_ms":3,"button":"right","pressed":false}
{"type":"move_to","t_ms":4,"x":100.0,"y":100.0}
"#;
    let events = parse_script(script);
    assert_eq!(events.len(), 5);

    let mut cfg = OverlayConfig::default();
    cfg.frame_interval = Duration::from_millis(10);
    cfg.trail.ttl = Duration::from_millis(50);
    cfg.markers.ttl = Duration::from_millis(50);
    let cursor = Arc::new(SimulatedCursor::new(cfg.recentering.screen));
    let (session, cfg) = session_with(cfg, cursor);

    let clock = SessionClock::start();
    let source = Arc::new(ReplayInputSource::new(events, clock.epoch().into_std()).paced(false));
    let (_subscription, input) =
        InputSubscription::start(source as Arc<dyn InputSource>).expect("start");
    let (_cfg_tx, cfg_rx) = watch::channel(cfg);
    let (_stop_tx, stop_rx) = watch::channel(false);
    let sink = Arc::new(RecordingSink::default());

    // Act
    let stats = tokio::time::timeout(
        Duration::from_secs(10),
        RenderLoop::new(session, Arc::clone(&sink) as Arc<dyn FrameSink>, clock)
            .stop_when_drained(true)
            .run(input, cfg_rx, stop_rx),
    )
    .await
    .expect("replay should end and settle");

    // Assert
    assert_eq!(stats.events, 5);
    let frames = sink.frames.lock().unwrap();
    let most_markers = frames.iter().map(Frame::marker_count).max().unwrap_or(0);
    assert_eq!(most_markers, 2);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_signal_stops_idle_overlay() {
    // Arrange – idle source never closes
    let cursor = Arc::new(SimulatedCursor::new(trails_core::Rect::sized(1920.0, 1080.0)));
    let (session, cfg) = session_with(OverlayConfig::default(), Arc::clone(&cursor));
    let source = Arc::new(MockInputSource::new());
    let (_subscription, input) =
        InputSubscription::start(Arc::clone(&source) as Arc<dyn InputSource>).expect("start");
    let (_cfg_tx, cfg_rx) = watch::channel(cfg);
    let (stop_tx, stop_rx) = watch::channel(false);
    let sink = Arc::new(RecordingSink::default());
    let task = tokio::spawn(
        RenderLoop::new(session, Arc::clone(&sink) as Arc<dyn FrameSink>, SessionClock::start())
            .stop_when_drained(true)
            .run(input, cfg_rx, stop_rx),
    );

    // Act
    tokio::time::sleep(Duration::from_millis(100)).await;
    stop_tx.send(true).expect("loop alive");
    let stats = task.await.expect("loop task");

    // Assert – 30 ms interval: ticks at 0, 30, 60, 90
    assert_eq!(stats.frames, 4);
    assert!(cursor.is_released());
}

// ── Recentering ───────────────────────────────────────────────────────────────

fn recentering_config() -> OverlayConfig {
    let mut cfg = OverlayConfig::default();
    cfg.recentering.enabled = true;
    cfg.recentering.trigger = RecenterTrigger::NearEdge;
    cfg.recentering.margin = 50.0;
    cfg
}

/// Moves the simulated OS cursor by the raw sample, then hands the event to
/// the session, the order a real hook observes.
fn drive(session: &mut OverlaySession, os: &SimulatedCursor, dx: f64, at_ms: u64) {
    os.follow(MotionSample::relative(dx, 0.0));
    session.handle_event(motion(dx, 0.0, at_ms));
}

#[test]
fn test_recentering_warps_os_cursor_without_breaking_the_trail() {
    // Arrange – cursor starts at (960, 540); the edge zone begins at x = 1870
    let cursor = Arc::new(SimulatedCursor::new(trails_core::Rect::sized(1920.0, 1080.0)));
    let (mut session, _) = session_with(recentering_config(), Arc::clone(&cursor));

    // Act – 2000 px to the right, far more than the screen allows
    for i in 0..20u64 {
        drive(&mut session, &cursor, 100.0, i);
    }
    let frame = session.tick(Duration::from_millis(25));

    // Assert – warped when the clamped OS cursor reached x = 1920, twice
    assert_eq!(cursor.warp_count(), 2);
    assert_eq!(session.cursor().position(), Point::new(2000.0, 0.0));
    assert_eq!(session.cursor().correction(), Point::new(1920.0, 0.0));
    assert_eq!(cursor.cursor_position(), Point::new(960.0, 540.0));
    assert_eq!(frame.stroke_count(), 20);
    let segments: Vec<_> = session.trail().segments().collect();
    for pair in segments.windows(2) {
        assert_eq!(pair[0].end(), pair[1].start(), "trail must stay continuous");
    }
}

#[test]
fn test_refused_warps_leave_virtual_position_intact() {
    // Arrange
    let cursor = Arc::new(SimulatedCursor::new(trails_core::Rect::sized(1920.0, 1080.0)));
    cursor.refuse_warps(true);
    let (mut session, _) = session_with(recentering_config(), Arc::clone(&cursor));

    // Act
    for i in 0..20u64 {
        drive(&mut session, &cursor, 100.0, i);
    }

    // Assert
    assert_eq!(cursor.warp_count(), 0);
    assert_eq!(cursor.cursor_position(), Point::new(1920.0, 540.0));
    assert_eq!(session.cursor().position(), Point::new(2000.0, 0.0));
    assert_eq!(session.cursor().correction(), Point::ORIGIN);
    assert_eq!(session.trail().len(), 20);
}

#[test]
fn test_warps_follow_os_cursor_when_multiplier_scales_virtual_motion() {
    // Arrange – virtual motion is three times the OS motion
    let cursor = Arc::new(SimulatedCursor::new(trails_core::Rect::sized(1920.0, 1080.0)));
    let mut cfg = recentering_config();
    cfg.trail.multiplier = 3.0;
    let (mut session, _) = session_with(cfg, Arc::clone(&cursor));

    // Act – OS cursor at x = 1280, virtual cursor already 960 px away
    for i in 0..4u64 {
        drive(&mut session, &cursor, 80.0, i);
    }
    let warps_mid_screen = cursor.warp_count();
    for i in 4..12u64 {
        drive(&mut session, &cursor, 80.0, i);
    }

    // Assert – one warp, when the OS cursor reached the right edge
    assert_eq!(warps_mid_screen, 0);
    assert_eq!(cursor.warp_count(), 1);
    assert_eq!(session.cursor().position(), Point::new(2880.0, 0.0));
    assert_eq!(session.cursor().correction(), Point::new(960.0, 0.0));
    assert_eq!(cursor.cursor_position(), Point::new(960.0, 540.0));
}

#[test]
fn test_disabled_recentering_never_warps() {
    let cursor = Arc::new(SimulatedCursor::new(trails_core::Rect::sized(1920.0, 1080.0)));
    let (mut session, _) = session_with(OverlayConfig::default(), Arc::clone(&cursor));

    for i in 0..20u64 {
        drive(&mut session, &cursor, 100.0, i);
    }

    assert_eq!(cursor.warp_count(), 0);
    assert!(!session.recentering().is_enabled());
}

#[test]
fn test_marker_lands_on_virtual_position_after_warps() {
    // Arrange
    let cursor = Arc::new(SimulatedCursor::new(trails_core::Rect::sized(1920.0, 1080.0)));
    let (mut session, _) = session_with(recentering_config(), Arc::clone(&cursor));
    for i in 0..15u64 {
        drive(&mut session, &cursor, 100.0, i);
    }

    // Act
    session.handle_event(RawInputEvent::Button {
        button: PointerButton::Left,
        pressed: true,
        timestamp: Duration::from_millis(20),
    });
    let frame = session.tick(Duration::from_millis(25));

    // Assert – the dot sits at the head of the last stroke
    let head = match frame.commands.iter().rev().find(|c| matches!(c, DrawCommand::Stroke { .. })) {
        Some(DrawCommand::Stroke { points, .. }) => *points.last().expect("points"),
        _ => panic!("expected a stroke"),
    };
    match frame.commands.last() {
        Some(DrawCommand::Dot { center, .. }) => assert_eq!(*center, head),
        other => panic!("expected marker dot last, got {other:?}"),
    }
    assert_eq!(cursor.warp_count(), 1);
}

#[test]
fn test_replay_source_reports_script_length() {
    let events = vec![motion(1.0, 0.0, 0), motion(1.0, 0.0, 5)];
    let source = ReplayInputSource::new(events, Instant::now());
    assert_eq!(source.len(), 2);
    assert!(!source.is_empty());
}
