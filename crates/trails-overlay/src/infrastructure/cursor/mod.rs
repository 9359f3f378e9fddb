//! Cursor controller implementations.
//!
//! [`SimulatedCursor`] models an OS cursor confined to one screen.  It is
//! what the headless binary uses (replayed input has no real cursor to warp)
//! and what integration tests use to observe warps.  Whoever plays the OS
//! (the replay thread, a test) moves it with [`SimulatedCursor::follow`].

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use tracing::debug;
use trails_core::{Point, Rect};

use crate::application::recenter::{CursorController, CursorError};
use crate::infrastructure::input_capture::MotionSample;

pub struct SimulatedCursor {
    screen: Rect,
    position: Mutex<Point>,
    warps: AtomicU64,
    refuse_warps: AtomicBool,
    released: AtomicBool,
}

impl SimulatedCursor {
    /// Creates a cursor resting at the centre of `screen`.
    pub fn new(screen: Rect) -> Self {
        Self {
            screen,
            position: Mutex::new(screen.center()),
            warps: AtomicU64::new(0),
            refuse_warps: AtomicBool::new(false),
            released: AtomicBool::new(false),
        }
    }

    /// Moves the cursor as the OS would for a device delta, clamped to the screen.
    pub fn move_by(&self, delta: Point) {
        let mut pos = self.position.lock().unwrap_or_else(PoisonError::into_inner);
        *pos = self.screen.clamp(*pos + delta);
    }

    /// Places the cursor at `p`, clamped to the screen.
    pub fn move_to(&self, p: Point) {
        *self.position.lock().unwrap_or_else(PoisonError::into_inner) = self.screen.clamp(p);
    }

    /// Applies one device sample as the OS would: relative samples move the
    /// cursor, absolute ones place it.
    pub fn follow(&self, motion: MotionSample) {
        match motion {
            MotionSample::Relative { dx, dy } => self.move_by(Point::new(dx, dy)),
            MotionSample::Absolute { x, y } => self.move_to(Point::new(x, y)),
        }
    }

    /// Makes subsequent warps fail, as an OS denying `SetCursorPos` would.
    pub fn refuse_warps(&self, refuse: bool) {
        self.refuse_warps.store(refuse, Ordering::Relaxed);
    }

    pub fn warp_count(&self) -> u64 {
        self.warps.load(Ordering::Relaxed)
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::Relaxed)
    }
}

impl CursorController for SimulatedCursor {
    fn cursor_position(&self) -> Point {
        *self.position.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn warp_cursor(&self, target: Point) -> Result<(), CursorError> {
        if self.released.load(Ordering::Relaxed) {
            return Err(CursorError::Released);
        }
        if self.refuse_warps.load(Ordering::Relaxed) {
            return Err(CursorError::WarpRefused {
                x: target.x,
                y: target.y,
                reason: "warps disabled".into(),
            });
        }
        *self.position.lock().unwrap_or_else(PoisonError::into_inner) = self.screen.clamp(target);
        self.warps.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn release(&self) {
        if !self.released.swap(true, Ordering::Relaxed) {
            debug!(warps = self.warp_count(), "simulated cursor released");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_at_screen_centre() {
        let c = SimulatedCursor::new(Rect::sized(1920.0, 1080.0));
        assert_eq!(c.cursor_position(), Point::new(960.0, 540.0));
    }

    #[test]
    fn test_motion_is_clamped_to_screen() {
        let c = SimulatedCursor::new(Rect::sized(100.0, 100.0));
        c.move_by(Point::new(500.0, -500.0));
        assert_eq!(c.cursor_position(), Point::new(100.0, 0.0));
    }

    #[test]
    fn test_follow_applies_relative_and_absolute_samples() {
        // Arrange
        let c = SimulatedCursor::new(Rect::sized(1920.0, 1080.0));

        // Act / Assert
        c.follow(MotionSample::relative(40.0, -40.0));
        assert_eq!(c.cursor_position(), Point::new(1000.0, 500.0));
        c.follow(MotionSample::absolute(Point::new(5000.0, 10.0)));
        assert_eq!(c.cursor_position(), Point::new(1920.0, 10.0));
        assert_eq!(c.warp_count(), 0);
    }

    #[test]
    fn test_warp_moves_cursor_and_counts() {
        // Arrange
        let c = SimulatedCursor::new(Rect::sized(100.0, 100.0));

        // Act
        c.warp_cursor(Point::new(10.0, 20.0)).expect("warp");

        // Assert
        assert_eq!(c.cursor_position(), Point::new(10.0, 20.0));
        assert_eq!(c.warp_count(), 1);
    }

    #[test]
    fn test_refused_and_released_warps_fail() {
        let c = SimulatedCursor::new(Rect::sized(100.0, 100.0));
        c.refuse_warps(true);
        assert!(matches!(c.warp_cursor(Point::ORIGIN), Err(CursorError::WarpRefused { .. })));

        c.refuse_warps(false);
        c.release();
        assert!(c.is_released());
        assert_eq!(c.warp_cursor(Point::ORIGIN), Err(CursorError::Released));
        assert_eq!(c.warp_count(), 0);
    }
}
