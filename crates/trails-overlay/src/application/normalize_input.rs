//! EventNormalizer: turns raw input events into uniform virtual-cursor events.
//!
//! Raw motion arrives either as device deltas or as absolute OS cursor
//! positions.  Both become a displacement, scaled by the configured pointer
//! multiplier, that is added to the [`VirtualCursor`].  Absolute samples are
//! differenced against the previous sample; the very first one only sets the
//! reference point.
//!
//! After the recentering controller warps the OS cursor, the next absolute
//! sample will report the warp target.  [`EventNormalizer::notify_warp`]
//! moves the reference there so the warp itself never shows up as motion.

use std::time::Duration;

use trails_core::{Point, PointerButton, VirtualCursor};

use crate::infrastructure::input_capture::{MotionSample, RawInputEvent};

/// A normalized event in virtual-cursor space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NormalizedEvent {
    Motion {
        /// Scaled displacement applied to the virtual cursor.
        delta: Point,
        /// Virtual position before the motion.
        from: Point,
        /// Virtual position after the motion.
        to: Point,
        at: Duration,
    },
    Button {
        button: PointerButton,
        pressed: bool,
        /// Virtual position at the time of the edge.
        position: Point,
        at: Duration,
    },
}

#[derive(Debug, Clone)]
pub struct EventNormalizer {
    multiplier: f64,
    last_absolute: Option<Point>,
}

impl EventNormalizer {
    pub fn new(multiplier: f64) -> Self {
        Self {
            multiplier,
            last_absolute: None,
        }
    }

    pub fn set_multiplier(&mut self, multiplier: f64) {
        self.multiplier = multiplier;
    }

    /// Normalizes one raw event and applies its displacement to `cursor`.
    ///
    /// Returns `None` for motion that moves nothing (zero deltas, the first
    /// absolute sample, a repeated absolute position).
    pub fn normalize(
        &mut self,
        event: RawInputEvent,
        cursor: &mut VirtualCursor,
    ) -> Option<NormalizedEvent> {
        match event {
            RawInputEvent::Motion { motion, timestamp } => {
                let raw = self.raw_delta(motion)?;
                let delta = raw * self.multiplier;
                if delta.is_zero() || !delta.x.is_finite() || !delta.y.is_finite() {
                    return None;
                }
                let from = cursor.position();
                let to = cursor.apply_delta(delta);
                Some(NormalizedEvent::Motion {
                    delta,
                    from,
                    to,
                    at: timestamp,
                })
            }
            RawInputEvent::Button {
                button,
                pressed,
                timestamp,
            } => Some(NormalizedEvent::Button {
                button,
                pressed,
                position: cursor.position(),
                at: timestamp,
            }),
        }
    }

    /// Re-anchors absolute motion after the OS cursor was warped to `target`.
    pub fn notify_warp(&mut self, target: Point) {
        if self.last_absolute.is_some() {
            self.last_absolute = Some(target);
        }
    }

    fn raw_delta(&mut self, motion: MotionSample) -> Option<Point> {
        match motion {
            MotionSample::Relative { dx, dy } => Some(Point::new(dx, dy)),
            MotionSample::Absolute { x, y } => {
                let p = Point::new(x, y);
                self.last_absolute.replace(p).map(|prev| p - prev)
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
