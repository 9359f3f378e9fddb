//! The virtual cursor.
//!
//! The real OS cursor stops at the screen edge and may be warped back to the
//! centre by the recentering controller.  The virtual cursor does neither: it
//! is the running sum of every (scaled) motion delta since the session
//! started, which is what lets a trail keep flowing past the edge of the
//! screen.
//!
//! The `correction` ledger records the total offset introduced by warps, each
//! measured from the position the OS reported just before the warp.

use crate::geometry::Point;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VirtualCursor {
    position: Point,
    correction: Point,
}

impl VirtualCursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual position.
    pub fn position(&self) -> Point {
        self.position
    }

    /// Sum of all recentering corrections applied so far.
    pub fn correction(&self) -> Point {
        self.correction
    }

    /// Moves the virtual cursor by `delta` and returns the new position.
    pub fn apply_delta(&mut self, delta: Point) -> Point {
        self.position += delta;
        self.position
    }

    /// Records that the OS cursor was warped by `warp` (target − origin).
    ///
    /// The virtual position is untouched; the equal-and-opposite offset goes
    /// into the correction ledger.
    pub fn record_warp(&mut self, warp: Point) {
        self.correction -= warp;
    }
}
