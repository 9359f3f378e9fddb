//! Press/release markers.
//!
//! Every button edge drops a marker at the virtual cursor position.  Markers
//! have their own timer, independent of the trail ttl, and one of three
//! lifetime policies (see [`MarkerPolicy`]):
//!
//! - `fade`   – opacity falls linearly to zero over the marker ttl;
//! - `vanish` – full opacity until the ttl, then gone;
//! - `sticky` – never expires, but a new marker of the same button and kind
//!   replaces the previous one.
//!
//! The marker's visual, policy and ttl are copied from the configuration when
//! the marker is created, so a hot reload changes new markers only.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::Timestamp;
use crate::config::{MarkerPolicy, MarkerVisual, OverlayConfig};
use crate::geometry::Point;

/// Mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerButton {
    Left,
    Right,
    Middle,
    /// Any extra button (X1, X2, …).
    Other,
}

/// Which edge of a button transition a marker records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerKind {
    Press,
    Release,
}

impl MarkerKind {
    pub fn from_pressed(pressed: bool) -> Self {
        if pressed {
            MarkerKind::Press
        } else {
            MarkerKind::Release
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    id: u64,
    button: PointerButton,
    kind: MarkerKind,
    position: Point,
    created_at: Timestamp,
    policy: MarkerPolicy,
    ttl: Duration,
    visual: MarkerVisual,
    opacity: f64,
}

impl Marker {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn button(&self) -> PointerButton {
        self.button
    }

    pub fn kind(&self) -> MarkerKind {
        self.kind
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn policy(&self) -> MarkerPolicy {
        self.policy
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn visual(&self) -> &MarkerVisual {
        &self.visual
    }

    fn is_expired(&self, now: Timestamp) -> bool {
        self.policy != MarkerPolicy::Sticky && now.saturating_sub(self.created_at) >= self.ttl
    }

    fn opacity_at(&self, now: Timestamp) -> f64 {
        match self.policy {
            MarkerPolicy::Sticky | MarkerPolicy::Vanish => 1.0,
            MarkerPolicy::Fade => {
                let f = now.saturating_sub(self.created_at).as_secs_f64() / self.ttl.as_secs_f64();
                (1.0 - f).clamp(0.0, 1.0)
            }
        }
    }

    /// Opacity computed by the most recent [`MarkerManager::advance`].
    pub fn opacity(&self) -> f64 {
        self.opacity
    }
}

/// Owns the live markers, in creation order.
pub struct MarkerManager {
    config: Arc<OverlayConfig>,
    markers: Vec<Marker>,
    next_id: u64,
}

impl MarkerManager {
    pub fn new(config: Arc<OverlayConfig>) -> Self {
        Self {
            config,
            markers: Vec::new(),
            next_id: 0,
        }
    }

    /// Swaps in a new configuration. Live markers keep their policy and ttl.
    pub fn set_config(&mut self, config: Arc<OverlayConfig>) {
        self.config = config;
    }

    /// Records a button edge at `position`. Returns the new marker's id.
    pub fn on_button(
        &mut self,
        button: PointerButton,
        pressed: bool,
        position: Point,
        at: Timestamp,
    ) -> u64 {
        let kind = MarkerKind::from_pressed(pressed);
        self.markers.retain(|m| {
            !(m.policy == MarkerPolicy::Sticky && m.button == button && m.kind == kind)
        });

        let id = self.next_id;
        self.next_id += 1;
        self.markers.push(Marker {
            id,
            button,
            kind,
            position,
            created_at: at,
            policy: self.config.markers.policy,
            ttl: self.config.markers.ttl,
            visual: self.config.markers.visual(button, kind).clone(),
            opacity: 1.0,
        });
        id
    }

    /// Updates marker opacities to `now` and removes expired markers.
    ///
    /// Returns the live markers in creation order.
    pub fn advance(&mut self, now: Timestamp) -> impl Iterator<Item = &Marker> {
        self.markers.retain(|m| !m.is_expired(now));
        for m in self.markers.iter_mut() {
            m.opacity = m.opacity_at(now);
        }
        self.markers.iter()
    }

    /// Live markers as of the last advance.
    pub fn markers(&self) -> impl Iterator<Item = &Marker> {
        self.markers.iter()
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    /// `true` when no live marker will ever expire on its own.
    pub fn all_sticky(&self) -> bool {
        self.markers.iter().all(|m| m.policy == MarkerPolicy::Sticky)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
