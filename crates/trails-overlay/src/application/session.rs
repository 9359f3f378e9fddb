//! OverlaySession: one running overlay, input in, frames out.
//!
//! The session owns every piece of mutable state (virtual cursor, trail,
//! markers, viewport) and is driven from a single task, so appending a
//! point and decaying segments can never interleave.
//!
//! Per event:
//!
//! ```text
//! RawInputEvent ─▶ EventNormalizer ─▶ VirtualCursor
//!                        │
//!          motion ───────┼──▶ TrailEngine::record_motion
//!                        │    RecenteringController::after_motion ─▶ notify_warp
//!          button ───────┴──▶ MarkerManager::on_button
//! ```
//!
//! Per tick: [`FrameCompositor::compose`].

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, trace};
use trails_core::{
    Frame, FrameCompositor, MarkerManager, OverlayConfig, TrailEngine,
    VirtualCursor,
};

use super::normalize_input::{EventNormalizer, NormalizedEvent};
use super::recenter::{CursorController, RecenteringController};
use crate::infrastructure::input_capture::RawInputEvent;

pub struct OverlaySession {
    config: Arc<OverlayConfig>,
    cursor: VirtualCursor,
    normalizer: EventNormalizer,
    recenter: RecenteringController,
    trail: TrailEngine,
    markers: MarkerManager,
    compositor: FrameCompositor,
    events: u64,
}

impl OverlaySession {
    /// Creates a session from an already validated configuration.
    pub fn new(config: Arc<OverlayConfig>, cursor_controller: Arc<dyn CursorController>) -> Self {
        Self {
            cursor: VirtualCursor::new(),
            normalizer: EventNormalizer::new(config.trail.multiplier),
            recenter: RecenteringController::new(config.recentering.clone(), cursor_controller),
            trail: TrailEngine::new(Arc::clone(&config)),
            markers: MarkerManager::new(Arc::clone(&config)),
            compositor: FrameCompositor::new(Arc::clone(&config)),
            config,
            events: 0,
        }
    }

    /// Processes one raw input event.
    pub fn handle_event(&mut self, event: RawInputEvent) {
        self.events += 1;
        let Some(normalized) = self.normalizer.normalize(event, &mut self.cursor) else {
            return;
        };
        match normalized {
            NormalizedEvent::Motion { from, to, at, .. } => {
                self.trail.record_motion(from, to, at);
                if let Some(target) = self.recenter.after_motion(&mut self.cursor) {
                    self.normalizer.notify_warp(target);
                }
            }
            NormalizedEvent::Button {
                button,
                pressed,
                position,
                at,
            } => {
                let id = self.markers.on_button(button, pressed, position, at);
                trace!(id, ?button, pressed, "marker created");
            }
        }
    }

    /// Composes the frame for `now`.
    pub fn tick(&mut self, now: Duration) -> Frame {
        self.compositor
            .compose(now, &mut self.trail, &mut self.markers)
    }

    /// Swaps in a new configuration between ticks.
    pub fn apply_config(&mut self, config: Arc<OverlayConfig>) {
        info!(
            style = %config.trail.style,
            ttl_ms = config.trail.ttl.as_millis() as u64,
            recentering = config.recentering.enabled,
            "overlay configuration reloaded"
        );
        self.normalizer.set_multiplier(config.trail.multiplier);
        self.recenter.set_config(config.recentering.clone());
        self.trail.set_config(Arc::clone(&config));
        self.markers.set_config(Arc::clone(&config));
        self.compositor.set_config(Arc::clone(&config));
        self.config = config;
    }

    /// `true` when nothing on screen will change without new input.
    pub fn is_settled(&self) -> bool {
        self.trail.is_empty() && self.markers.all_sticky()
    }

    /// Releases the cursor controller.  Call once, on shutdown.
    pub fn shutdown(&self) {
        self.recenter.release();
    }

    pub fn config(&self) -> &Arc<OverlayConfig> {
        &self.config
    }

    pub fn cursor(&self) -> &VirtualCursor {
        &self.cursor
    }

    pub fn trail(&self) -> &TrailEngine {
        &self.trail
    }

    pub fn markers(&self) -> &MarkerManager {
        &self.markers
    }

    pub fn recentering(&self) -> &RecenteringController {
        &self.recenter
    }

    /// Raw events handled so far.
    pub fn event_count(&self) -> u64 {
        self.events
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
