//! Backend-agnostic frame description.
//!
//! A [`Frame`] is a display list: a background colour plus draw commands in
//! painter's order.  Display surfaces (a window, a texture, a capture source,
//! a JSON dump) turn it into pixels however they like.

use serde::{Serialize, Serializer};

use crate::asset::AssetHandle;
use crate::color::Color;
use crate::domain::Timestamp;
use crate::geometry::Point;

/// One drawing operation, in canvas coordinates.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawCommand {
    /// A polyline stroked with a uniform width.
    Stroke { points: Vec<Point>, width: f64, color: Color },
    /// A filled circle.
    Dot { center: Point, radius: f64, color: Color },
    /// An asset drawn centred at `center`, scaled to `size` pixels.
    Image { handle: AssetHandle, center: Point, size: f64, opacity: f64 },
}

/// A complete composed frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Frame {
    /// Session time the frame was composed for.
    #[serde(rename = "at_ms", serialize_with = "serialize_millis")]
    pub at: Timestamp,
    pub width: f64,
    pub height: f64,
    pub background: Color,
    pub commands: Vec<DrawCommand>,
}

impl Frame {
    /// Number of trail strokes in the frame.
    pub fn stroke_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Stroke { .. }))
            .count()
    }

    /// Number of marker commands (dots and images) in the frame.
    pub fn marker_count(&self) -> usize {
        self.commands.len() - self.stroke_count()
    }
}

fn serialize_millis<S: Serializer>(at: &Timestamp, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(at.as_micros() as f64 / 1000.0)
}
