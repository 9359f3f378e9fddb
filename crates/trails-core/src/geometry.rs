//! 2-D points in virtual cursor space.
//!
//! Virtual cursor space is unbounded: the origin is the cursor position at
//! session start and coordinates grow without limit as the pointer travels,
//! independently of where the real OS cursor is clamped or warped to.
//! Coordinates are `f64` because pointer multipliers and jag offsets produce
//! fractional positions.

use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

use serde::{Deserialize, Serialize};

/// A point (or displacement vector) in virtual cursor space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    /// The origin `(0, 0)`.
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean length of this point interpreted as a vector.
    pub fn length(self) -> f64 {
        self.x.hypot(self.y)
    }

    /// Distance between `self` and `other`.
    pub fn distance_to(self, other: Point) -> f64 {
        (other - self).length()
    }

    /// Midpoint of the segment `self → other`.
    pub fn midpoint(self, other: Point) -> Point {
        Point::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }

    /// Unit vector perpendicular to `self → other` (rotated +90°).
    ///
    /// Returns `None` for a degenerate (zero-length) segment.
    pub fn unit_normal_to(self, other: Point) -> Option<Point> {
        let d = other - self;
        let len = d.length();
        if len <= f64::EPSILON {
            return None;
        }
        Some(Point::new(-d.y / len, d.x / len))
    }

    /// Returns `true` when both coordinates are exactly zero.
    pub fn is_zero(self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }
}

impl Add for Point {
    type Output = Point;
    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Point {
    fn add_assign(&mut self, rhs: Point) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Point {
    type Output = Point;
    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl SubAssign for Point {
    fn sub_assign(&mut self, rhs: Point) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

impl Neg for Point {
    type Output = Point;
    fn neg(self) -> Point {
        Point::new(-self.x, -self.y)
    }
}

impl Mul<f64> for Point {
    type Output = Point;
    fn mul(self, rhs: f64) -> Point {
        Point::new(self.x * rhs, self.y * rhs)
    }
}

/// An axis-aligned rectangle, used for screen bounds and the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// X coordinate of the top-left corner.
    pub x: f64,
    /// Y coordinate of the top-left corner.
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// A rectangle anchored at the origin.
    pub const fn sized(width: f64, height: f64) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Returns `true` if `p` lies inside the rectangle (edges inclusive).
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.right() && p.y >= self.y && p.y <= self.bottom()
    }

    /// Returns `true` if `p` lies within `margin` pixels of any edge, or outside.
    pub fn is_near_edge(&self, p: Point, margin: f64) -> bool {
        p.x <= self.x + margin
            || p.x >= self.right() - margin
            || p.y <= self.y + margin
            || p.y >= self.bottom() - margin
    }

    /// Clamps `p` into the rectangle.
    pub fn clamp(&self, p: Point) -> Point {
        Point::new(p.x.clamp(self.x, self.right()), p.y.clamp(self.y, self.bottom()))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
