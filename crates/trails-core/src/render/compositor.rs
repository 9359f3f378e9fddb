//! FrameCompositor: turns the trail and marker state into one [`Frame`].
//!
//! Composition order on every tick:
//!
//! 1. clear to the background colour;
//! 2. advance the trail engine (decay + eviction) and draw every live segment
//!    oldest first, so newer segments overlay older ones;
//! 3. advance the marker manager and draw the live markers on top.
//!
//! The compositor never looks at input events.  How many frames get produced
//! depends only on how often the render clock calls [`FrameCompositor::compose`].

use std::sync::Arc;

use tracing::debug;

use super::frame::{DrawCommand, Frame};
use super::viewport::Viewport;
use crate::config::{MarkerVisual, OverlayConfig};
use crate::domain::marker::MarkerManager;
use crate::domain::trail::TrailEngine;
use crate::domain::Timestamp;

pub struct FrameCompositor {
    config: Arc<OverlayConfig>,
    viewport: Viewport,
}

impl FrameCompositor {
    pub fn new(config: Arc<OverlayConfig>) -> Self {
        let viewport = Viewport::new(config.canvas.bounds());
        Self { config, viewport }
    }

    pub fn set_config(&mut self, config: Arc<OverlayConfig>) {
        self.viewport.resize(config.canvas.bounds());
        self.config = config;
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Composes the frame for `now`.
    pub fn compose(
        &mut self,
        now: Timestamp,
        trail: &mut TrailEngine,
        markers: &mut MarkerManager,
    ) -> Frame {
        if self.config.canvas.view_follow {
            if let Some(head) = trail.head() {
                if !self.viewport.shows(head) {
                    debug!(x = head.x, y = head.y, "trail left the canvas, re-centring view");
                    self.viewport.recenter_on(head);
                }
            }
        }

        let mut commands = Vec::with_capacity(trail.len() + markers.len());

        let color = self.config.trail.color;
        for segment in trail.advance(now) {
            let look = segment.look();
            if !look.visible {
                continue;
            }
            commands.push(DrawCommand::Stroke {
                points: segment
                    .path()
                    .points()
                    .iter()
                    .map(|p| self.viewport.to_canvas(*p))
                    .collect(),
                width: look.width,
                color: color.with_opacity(look.opacity),
            });
        }

        for marker in markers.advance(now) {
            let center = self.viewport.to_canvas(marker.position());
            commands.push(match marker.visual() {
                MarkerVisual::Dot { color, radius } => DrawCommand::Dot {
                    center,
                    radius: *radius,
                    color: color.with_opacity(marker.opacity()),
                },
                MarkerVisual::Image { handle, size } => DrawCommand::Image {
                    handle: *handle,
                    center,
                    size: *size,
                    opacity: marker.opacity(),
                },
            });
        }

        Frame {
            at: now,
            width: self.config.canvas.width,
            height: self.config.canvas.height,
            background: self.config.canvas.background,
            commands,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
