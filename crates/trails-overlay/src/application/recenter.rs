//! RecenteringController: keeps the real cursor away from the screen edges.
//!
//! The OS clamps its cursor to the screen, so a trail drawn from OS
//! positions would stop dead at the edge.  When recentering is enabled the
//! controller reads the OS-reported cursor position after every motion and
//! warps the cursor back to the screen centre whenever it gets close to an
//! edge (or after every motion, depending on the trigger).  The warp is
//! booked into the [`VirtualCursor`]'s correction ledger, so the virtual
//! position, and with it the trail, never sees the jump.
//!
//! The warp decision always uses what the OS reports, never an estimate:
//! pointer acceleration, the overlay's own multiplier and OS clamping all
//! make the virtual path diverge from the real one.
//!
//! A refused warp is logged and ignored; the next motion simply tries again.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};
use trails_core::{Point, RecenterTrigger, RecenteringConfig, VirtualCursor};

/// Error type for cursor controller operations.
#[derive(Debug, Error, PartialEq)]
pub enum CursorError {
    #[error("cursor warp to ({x}, {y}) refused: {reason}")]
    WarpRefused { x: f64, y: f64, reason: String },
    #[error("cursor controller has been released")]
    Released,
}

/// Trait for controlling the physical cursor position.
///
/// Infrastructure implementations talk to the OS (or simulate it); tests use
/// the generated `MockCursorController`.
#[cfg_attr(test, mockall::automock)]
pub trait CursorController: Send + Sync {
    /// Returns the current OS cursor position in screen coordinates.
    fn cursor_position(&self) -> Point;

    /// Moves the OS cursor to `target`.
    fn warp_cursor(&self, target: Point) -> Result<(), CursorError>;

    /// Releases any OS-level state acquired for warping.
    fn release(&self);
}

pub struct RecenteringController {
    config: RecenteringConfig,
    controller: Arc<dyn CursorController>,
    warps: u64,
}

impl RecenteringController {
    pub fn new(config: RecenteringConfig, controller: Arc<dyn CursorController>) -> Self {
        Self {
            config,
            controller,
            warps: 0,
        }
    }

    pub fn set_config(&mut self, config: RecenteringConfig) {
        if config.enabled != self.config.enabled {
            debug!(enabled = config.enabled, "recentering toggled");
        }
        self.config = config;
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Number of successful warps so far.
    pub fn warp_count(&self) -> u64 {
        self.warps
    }

    /// Runs after each motion.  Returns the warp target if a warp happened.
    pub fn after_motion(&mut self, cursor: &mut VirtualCursor) -> Option<Point> {
        if !self.config.enabled {
            return None;
        }

        let os = self.controller.cursor_position();
        let screen = self.config.screen;
        let target = screen.center();
        let due = match self.config.trigger {
            RecenterTrigger::NearEdge => screen.is_near_edge(os, self.config.margin),
            RecenterTrigger::EveryEvent => os != target,
        };
        if !due {
            return None;
        }

        match self.controller.warp_cursor(target) {
            Ok(()) => {
                let warp = target - os;
                cursor.record_warp(warp);
                self.warps += 1;
                debug!(
                    from_x = os.x,
                    from_y = os.y,
                    dx = warp.x,
                    dy = warp.y,
                    "cursor recentred"
                );
                Some(target)
            }
            Err(e) => {
                warn!("cursor warp failed, continuing without correction: {e}");
                None
            }
        }
    }

    /// Releases the underlying cursor controller.
    pub fn release(&self) {
        self.controller.release();
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
