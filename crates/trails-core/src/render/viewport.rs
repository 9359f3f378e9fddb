//! Mapping from virtual cursor space to canvas pixels.
//!
//! The viewport pins one virtual point (`origin`) to the centre of the
//! canvas.  At session start the origin is the virtual origin, so the trail
//! starts in the middle of the canvas.  With view-follow enabled the
//! compositor re-centres the viewport on the cursor when the trail head
//! leaves the canvas.

use crate::geometry::{Point, Rect};

#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    origin: Point,
    canvas: Rect,
}

impl Viewport {
    pub fn new(canvas: Rect) -> Self {
        Self {
            origin: Point::ORIGIN,
            canvas,
        }
    }

    pub fn origin(&self) -> Point {
        self.origin
    }

    pub fn canvas(&self) -> Rect {
        self.canvas
    }

    /// Resizes the canvas, keeping the same virtual origin at its centre.
    pub fn resize(&mut self, canvas: Rect) {
        self.canvas = canvas;
    }

    /// Converts a virtual point into canvas coordinates.
    pub fn to_canvas(&self, p: Point) -> Point {
        p - self.origin + self.canvas.center()
    }

    /// Returns `true` if the virtual point lands on the canvas.
    pub fn shows(&self, p: Point) -> bool {
        self.canvas.contains(self.to_canvas(p))
    }

    /// Pins `p` to the canvas centre.
    pub fn recenter_on(&mut self, p: Point) {
        self.origin = p;
    }
}
