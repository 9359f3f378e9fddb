//! The trail engine: live segment arena, sensitivity accumulator and decay.
//!
//! # Segment creation
//!
//! Every motion event hands the engine the virtual cursor's previous and new
//! positions.  The engine adds the travelled distance to a running total;
//! once the total strictly exceeds the configured sensitivity it appends the
//! new position as a trail point, creates one [`TrailSegment`] from the
//! previous point, and carries the remainder (`total mod sensitivity`)
//! forward.  Sub-threshold jitter therefore never produces a segment, and two
//! 4 px moves with a 5 px threshold produce exactly one.
//!
//! # Decay and eviction
//!
//! [`TrailEngine::advance`] is called once per frame.  Each segment's look is
//! recomputed from its own `created_at` / `ttl` (both fixed at creation) and
//! the current style; a segment whose age has reached its ttl is removed on
//! that same tick and never reaches the compositor.
//!
//! Segments live in a `VecDeque` in creation order.  Because the ttl is fixed
//! per segment, expiry is normally a prefix trim from the front.  Only after a
//! hot reload changed the ttl while segments were live can an expired segment
//! sit behind a live one; the engine then falls back to a full `retain` until
//! the arena has drained.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use tracing::trace;

use super::style::{jag_offset, SegmentLook};
use super::Timestamp;
use crate::config::OverlayConfig;
use crate::geometry::Point;

/// Rendered geometry of one segment on one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SegmentPath {
    Straight([Point; 2]),
    /// Start, laterally displaced midpoint, end.
    Jagged([Point; 3]),
}

impl SegmentPath {
    pub fn points(&self) -> &[Point] {
        match self {
            SegmentPath::Straight(p) => p,
            SegmentPath::Jagged(p) => p,
        }
    }
}

/// One straight piece of the trail between two consecutive trail points.
#[derive(Debug, Clone, PartialEq)]
pub struct TrailSegment {
    id: u64,
    start: Point,
    end: Point,
    created_at: Timestamp,
    ttl: Duration,
    look: SegmentLook,
    jag: f64,
    /// Tick the current `jag` was drawn for.
    jag_tick: Option<u64>,
}

impl TrailSegment {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn start(&self) -> Point {
        self.start
    }

    pub fn end(&self) -> Point {
        self.end
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Look computed by the most recent [`TrailEngine::advance`].
    pub fn look(&self) -> SegmentLook {
        self.look
    }

    /// Lateral jag offset computed by the most recent advance (0 for smooth styles).
    pub fn jag(&self) -> f64 {
        self.jag
    }

    pub fn age(&self, now: Timestamp) -> Duration {
        now.saturating_sub(self.created_at)
    }

    pub fn life_fraction(&self, now: Timestamp) -> f64 {
        self.age(now).as_secs_f64() / self.ttl.as_secs_f64()
    }

    pub fn is_expired(&self, now: Timestamp) -> bool {
        self.age(now) >= self.ttl
    }

    /// Geometry to draw, including the current jag offset.
    pub fn path(&self) -> SegmentPath {
        if self.jag == 0.0 {
            return SegmentPath::Straight([self.start, self.end]);
        }
        match self.start.unit_normal_to(self.end) {
            Some(normal) => SegmentPath::Jagged([
                self.start,
                self.start.midpoint(self.end) + normal * self.jag,
                self.end,
            ]),
            None => SegmentPath::Straight([self.start, self.end]),
        }
    }
}

/// Maintains the live set of trail segments.
pub struct TrailEngine {
    config: Arc<OverlayConfig>,
    segments: VecDeque<TrailSegment>,
    /// Last appended trail point; `None` until the first motion.
    last_point: Option<Point>,
    /// Distance travelled since `last_point`, modulo the sensitivity.
    travelled: f64,
    next_id: u64,
    /// Set when live segments carry different ttls (after a hot reload).
    mixed_ttls: bool,
}

impl TrailEngine {
    pub fn new(config: Arc<OverlayConfig>) -> Self {
        Self {
            config,
            segments: VecDeque::new(),
            last_point: None,
            travelled: 0.0,
            next_id: 0,
            mixed_ttls: false,
        }
    }

    /// Swaps in a new configuration.
    ///
    /// Live segments keep the ttl they were created with; the new style, jag
    /// settings and retention limit apply from the next
    /// [`advance`](Self::advance).
    pub fn set_config(&mut self, config: Arc<OverlayConfig>) {
        if config.trail.ttl != self.config.trail.ttl && !self.segments.is_empty() {
            self.mixed_ttls = true;
        }
        if config.trail.jag != self.config.trail.jag {
            for segment in self.segments.iter_mut() {
                segment.jag_tick = None;
            }
        }
        self.config = config;
        self.enforce_retention_limit();
    }

    /// Feeds one motion of the virtual cursor from `from` to `to`.
    ///
    /// Returns the id of the segment created, if the sensitivity threshold was
    /// crossed.
    pub fn record_motion(&mut self, from: Point, to: Point, at: Timestamp) -> Option<u64> {
        let anchor = *self.last_point.get_or_insert(from);
        let step = from.distance_to(to);
        if step == 0.0 {
            return None;
        }

        self.travelled += step;
        let sensitivity = self.config.trail.sensitivity;
        if self.travelled <= sensitivity {
            return None;
        }
        self.travelled %= sensitivity;

        let id = self.next_id;
        self.next_id += 1;
        self.segments.push_back(TrailSegment {
            id,
            start: anchor,
            end: to,
            created_at: at,
            ttl: self.config.trail.ttl,
            look: self.config.trail.style.look_at(self.config.trail.width, 0.0),
            jag: 0.0,
            jag_tick: None,
        });
        self.last_point = Some(to);
        self.enforce_retention_limit();
        Some(id)
    }

    /// Decays every live segment to `now` and evicts the expired ones.
    ///
    /// Returns the live segments in creation order (oldest first).
    pub fn advance(&mut self, now: Timestamp) -> impl Iterator<Item = &TrailSegment> {
        self.evict_expired(now);

        let trail = &self.config.trail;
        let tick = tick_index(now, self.config.frame_interval);
        for segment in self.segments.iter_mut() {
            segment.look = trail.style.look_at(trail.width, segment.life_fraction(now));
            if !trail.style.is_jaggy() {
                segment.jag = 0.0;
                segment.jag_tick = None;
            } else if segment.jag_tick != Some(tick) {
                segment.jag = jag_offset(trail.jag.mode, trail.jag.amplitude, segment.id, tick);
                segment.jag_tick = Some(tick);
            }
        }
        trace!(live = self.segments.len(), tick, "trail advanced");
        self.segments.iter()
    }

    /// Live segments as of the last [`advance`](Self::advance), oldest first.
    pub fn segments(&self) -> impl Iterator<Item = &TrailSegment> {
        self.segments.iter()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// The most recently appended trail point.
    pub fn head(&self) -> Option<Point> {
        self.last_point
    }

    fn evict_expired(&mut self, now: Timestamp) {
        while self.segments.front().is_some_and(|s| s.is_expired(now)) {
            self.segments.pop_front();
        }
        if self.mixed_ttls {
            self.segments.retain(|s| !s.is_expired(now));
            if self.segments.is_empty() {
                self.mixed_ttls = false;
            }
        }
    }

    fn enforce_retention_limit(&mut self) {
        let limit = self.config.retention_limit();
        while self.segments.len() > limit {
            self.segments.pop_front();
        }
    }
}

/// Frame-interval tick index for `now`; identical timestamps share a tick.
fn tick_index(now: Timestamp, frame_interval: Duration) -> u64 {
    let interval = frame_interval.as_nanos().max(1);
    (now.as_nanos() / interval) as u64
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{JagMode, TrailStyle};

    fn ms(v: u64) -> Timestamp {
        Duration::from_millis(v)
    }

    fn config_with(style: TrailStyle, ttl_ms: u64, frame_ms: u64, sensitivity: f64) -> Arc<OverlayConfig> {
        let mut cfg = OverlayConfig::default();
        cfg.trail.style = style;
        cfg.trail.ttl = ms(ttl_ms);
        cfg.frame_interval = ms(frame_ms);
        cfg.trail.sensitivity = sensitivity;
        cfg.trail.width = 10.0;
        Arc::new(cfg)
    }

    /// Creates one segment at `at` by moving 10 px right from `x`.
    fn push_segment(engine: &mut TrailEngine, x: f64, at: Timestamp) -> u64 {
        engine
            .record_motion(Point::new(x, 0.0), Point::new(x + 10.0, 0.0), at)
            .expect("10 px move must cross a 1 px threshold")
    }

    // ── Sensitivity ───────────────────────────────────────────────────────────

    #[test]
    fn test_two_sub_threshold_moves_create_exactly_one_segment() {
        // Arrange – sensitivity 5 px
        let mut engine = TrailEngine::new(config_with(TrailStyle::SmoothFade, 1000, 50, 5.0));

        // Act – 4 px, then 4 px
        let first = engine.record_motion(Point::new(0.0, 0.0), Point::new(4.0, 0.0), ms(0));
        let second = engine.record_motion(Point::new(4.0, 0.0), Point::new(8.0, 0.0), ms(1));

        // Assert
        assert!(first.is_none());
        assert!(second.is_some());
        assert_eq!(engine.len(), 1);
        let seg = engine.segments().next().unwrap();
        assert_eq!(seg.start(), Point::new(0.0, 0.0));
        assert_eq!(seg.end(), Point::new(8.0, 0.0));
        assert!((engine.travelled - 3.0).abs() < 1e-12, "3 px remainder carried forward");
    }

    #[test]
    fn test_remainder_counts_toward_the_next_segment() {
        let mut engine = TrailEngine::new(config_with(TrailStyle::SmoothFade, 1000, 50, 5.0));
        engine.record_motion(Point::new(0.0, 0.0), Point::new(8.0, 0.0), ms(0)); // remainder 3
        // 2.5 px more brings the total to 5.5 > 5
        let next = engine.record_motion(Point::new(8.0, 0.0), Point::new(10.5, 0.0), ms(1));
        assert!(next.is_some());
        assert_eq!(engine.len(), 2);
    }

    #[test]
    fn test_zero_length_motion_is_a_no_op() {
        let mut engine = TrailEngine::new(config_with(TrailStyle::SmoothFade, 1000, 50, 1.0));
        let p = Point::new(3.0, 3.0);
        assert!(engine.record_motion(p, p, ms(0)).is_none());
        assert!(engine.is_empty());
    }

    #[test]
    fn test_consecutive_segments_share_endpoints() {
        let mut engine = TrailEngine::new(config_with(TrailStyle::SmoothFade, 1000, 50, 1.0));
        push_segment(&mut engine, 0.0, ms(0));
        push_segment(&mut engine, 10.0, ms(1));
        let segs: Vec<_> = engine.segments().collect();
        assert_eq!(segs[0].end(), segs[1].start());
    }

    // ── Decay scenario ────────────────────────────────────────────────────────

    #[test]
    fn test_smooth_fade_is_half_way_at_half_ttl_and_gone_at_ttl() {
        // Arrange – ttl 1000 ms, frame interval 50 ms, segment created at t=0
        let mut engine = TrailEngine::new(config_with(TrailStyle::SmoothFade, 1000, 50, 1.0));
        push_segment(&mut engine, 0.0, ms(0));

        // Act / Assert at t = 500 ms
        let look = engine.advance(ms(500)).next().expect("live at 500 ms").look();
        assert!((look.width - 5.0).abs() < 1e-9);
        assert!((look.opacity - 0.5).abs() < 1e-9);

        // Act / Assert at t = 1000 ms
        assert_eq!(engine.advance(ms(1000)).count(), 0);
    }

    #[test]
    fn test_no_expired_segment_is_ever_returned() {
        for style in TrailStyle::ALL {
            // Arrange – segments created every 20 ms for 400 ms
            let mut engine = TrailEngine::new(config_with(style, 100, 10, 1.0));
            for i in 0..20u64 {
                push_segment(&mut engine, i as f64 * 10.0, ms(i * 20));
            }

            // Act / Assert on every frame
            for now in (0..=500).step_by(10).map(ms) {
                for seg in engine.advance(now) {
                    assert!(seg.age(now) < seg.ttl(), "{style}: expired segment rendered");
                }
            }
        }
    }

    #[test]
    fn test_vanilla_vanish_is_constant_until_ttl() {
        let mut engine = TrailEngine::new(config_with(TrailStyle::VanillaVanish, 1000, 50, 1.0));
        push_segment(&mut engine, 0.0, ms(0));

        let look = engine.advance(ms(999)).next().unwrap().look();
        assert_eq!(look.width, 10.0);
        assert_eq!(look.opacity, 1.0);
        assert!(engine.advance(ms(1000)).next().is_none());
    }

    #[test]
    fn test_decay_continues_without_new_input() {
        let mut engine = TrailEngine::new(config_with(TrailStyle::SmoothFade, 200, 20, 1.0));
        push_segment(&mut engine, 0.0, ms(0));
        let mut ticks = 0;
        while engine.advance(ms(ticks * 20)).count() > 0 {
            ticks += 1;
        }
        assert_eq!(ticks, 10);
    }

    // ── Jag ───────────────────────────────────────────────────────────────────

    #[test]
    fn test_jaggy_segment_renders_three_points_off_the_line() {
        // Arrange
        let mut engine = TrailEngine::new(config_with(TrailStyle::JaggyFade, 1000, 50, 1.0));
        push_segment(&mut engine, 0.0, ms(0));

        // Act – find a tick whose seeded offset is non-zero
        let path = (0..20)
            .map(|t| engine.advance(ms(t * 50)).next().unwrap().path())
            .find(|p| matches!(p, SegmentPath::Jagged(_)))
            .expect("at least one tick must produce a jag");

        // Assert – midpoint displaced vertically from the horizontal segment
        let pts = path.points();
        assert_eq!(pts.len(), 3);
        assert_eq!(pts[1].x, 5.0);
        assert!(pts[1].y.abs() <= 3.0);
    }

    #[test]
    fn test_smooth_segments_are_never_jagged() {
        let mut engine = TrailEngine::new(config_with(TrailStyle::SmoothFade, 1000, 50, 1.0));
        push_segment(&mut engine, 0.0, ms(0));
        for t in 0..10 {
            let seg = engine.advance(ms(t * 50)).next().unwrap();
            assert!(matches!(seg.path(), SegmentPath::Straight(_)));
        }
    }

    #[test]
    fn test_same_timestamp_gives_same_jag() {
        let mut engine = TrailEngine::new(config_with(TrailStyle::JaggyNonFade, 1000, 50, 1.0));
        push_segment(&mut engine, 0.0, ms(0));
        let a = engine.advance(ms(120)).next().unwrap().path();
        let b = engine.advance(ms(120)).next().unwrap().path();
        assert_eq!(a, b);
    }

    #[test]
    fn test_entropy_jag_is_drawn_once_per_tick() {
        // Arrange
        let mut cfg = (*config_with(TrailStyle::JaggyFade, 1000, 50, 1.0)).clone();
        cfg.trail.jag.mode = JagMode::Entropy;
        let mut engine = TrailEngine::new(Arc::new(cfg));
        push_segment(&mut engine, 0.0, ms(0));

        // Act – 120 ms and 149 ms fall in the same 50 ms tick
        let a = engine.advance(ms(120)).next().unwrap().jag();
        let b = engine.advance(ms(120)).next().unwrap().jag();
        let c = engine.advance(ms(149)).next().unwrap().jag();

        // Assert
        assert_eq!(a, b);
        assert_eq!(a, c);
    }

    #[test]
    fn test_switching_to_smooth_style_straightens_jagged_segments() {
        let mut engine = TrailEngine::new(config_with(TrailStyle::JaggyNonFade, 1000, 50, 1.0));
        push_segment(&mut engine, 0.0, ms(0));
        engine.advance(ms(50));
        engine.set_config(config_with(TrailStyle::SmoothFade, 1000, 50, 1.0));
        let seg = engine.advance(ms(50)).next().unwrap();
        assert_eq!(seg.jag(), 0.0);
        assert!(matches!(seg.path(), SegmentPath::Straight(_)));
    }

    // ── Retention & hot reload ────────────────────────────────────────────────

    #[test]
    fn test_retention_limit_drops_oldest_segments() {
        // Arrange – ttl == frame interval gives a limit of MAX_SEGMENTS_PER_FRAME
        let cfg = config_with(TrailStyle::SmoothFade, 10, 10, 1.0);
        let limit = cfg.retention_limit();
        let mut engine = TrailEngine::new(cfg);

        // Act
        for i in 0..(limit + 5) {
            push_segment(&mut engine, i as f64 * 10.0, ms(0));
        }

        // Assert
        assert_eq!(engine.len(), limit);
        assert_eq!(engine.segments().next().unwrap().id(), 5);
    }

    #[test]
    fn test_ttl_reload_keeps_creation_ttl_and_evicts_out_of_order() {
        // Arrange – old segment with a long ttl, new segment with a short ttl
        let mut engine = TrailEngine::new(config_with(TrailStyle::SmoothFade, 1000, 50, 1.0));
        push_segment(&mut engine, 0.0, ms(0));
        engine.set_config(config_with(TrailStyle::SmoothFade, 100, 50, 1.0));
        push_segment(&mut engine, 10.0, ms(10));

        // Act – at 200 ms the newer segment has expired, the older has not
        let live: Vec<u64> = engine.advance(ms(200)).map(|s| s.id()).collect();

        // Assert
        assert_eq!(live, vec![0]);
    }

    #[test]
    fn test_style_reload_applies_on_next_advance() {
        let mut engine = TrailEngine::new(config_with(TrailStyle::SmoothFade, 1000, 50, 1.0));
        push_segment(&mut engine, 0.0, ms(0));
        engine.set_config(config_with(TrailStyle::VanillaVanish, 1000, 50, 1.0));
        let look = engine.advance(ms(500)).next().unwrap().look();
        assert_eq!(look.opacity, 1.0);
    }
}
