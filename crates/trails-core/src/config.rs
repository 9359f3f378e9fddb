//! Validated runtime configuration for an overlay session.
//!
//! [`OverlayConfig`] is the single source of truth for every timing and style
//! parameter the engine reads.  It is built once (from a settings file, CLI
//! flags or test code), validated with [`OverlayConfig::validate`], wrapped in
//! an `Arc` and handed to each component at construction.  Hot reload swaps
//! the whole `Arc` between ticks; no component ever reads ambient globals.
//!
//! # Last-known-good fallback
//!
//! [`ConfigManager`] keeps the most recent configuration that passed
//! validation.  A rejected candidate leaves the current configuration in
//! place; if nothing valid has ever been applied the caller must refuse to
//! start the render loop.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::asset::AssetHandle;
use crate::color::{Color, ColorParseError};
use crate::domain::marker::{MarkerKind, PointerButton};
use crate::geometry::Rect;

/// Upper bound on segments created per frame interval, used to derive the
/// trail retention limit from `ttl / frame_interval`.
pub const MAX_SEGMENTS_PER_FRAME: usize = 64;

/// Errors raised when a configuration is rejected.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    #[error("trail ttl must be positive")]
    NonPositiveTtl,

    #[error("frame interval must be positive")]
    NonPositiveFrameInterval,

    #[error("sensitivity must be positive, got {0}")]
    NonPositiveSensitivity(f64),

    #[error("line width must be positive, got {0}")]
    NonPositiveLineWidth(f64),

    #[error("pointer multiplier must be positive, got {0}")]
    NonPositiveMultiplier(f64),

    #[error("jag amplitude must not be negative, got {0}")]
    NegativeJagAmplitude(f64),

    #[error("marker ttl must be positive unless markers are sticky")]
    NonPositiveMarkerTtl,

    #[error("marker size for {button:?} {kind:?} must be positive, got {size}")]
    NonPositiveMarkerSize {
        button: PointerButton,
        kind: MarkerKind,
        size: f64,
    },

    #[error("canvas dimensions must be positive, got {width}x{height}")]
    InvalidCanvas { width: f64, height: f64 },

    #[error("recentering screen bounds must be positive and larger than twice the margin")]
    InvalidScreenBounds,

    #[error("unresolved marker asset reference {0:?}")]
    UnresolvedAsset(String),

    #[error(transparent)]
    InvalidColor(#[from] ColorParseError),

    #[error("unknown trail style {0:?}: expected smooth_fade, vanilla_vanish, jaggy_fade or jaggy_non_fade")]
    UnknownStyle(String),
}

// ── Trail ─────────────────────────────────────────────────────────────────────

/// The four interchangeable trail rendering styles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrailStyle {
    /// Width and opacity shrink linearly to zero over the ttl.
    SmoothFade,
    /// Constant look, then disappears at the ttl.
    VanillaVanish,
    /// Constant width, fading opacity, jittered geometry.
    JaggyFade,
    /// Constant look, jittered geometry, disappears at the ttl.
    JaggyNonFade,
}

impl TrailStyle {
    pub const ALL: [TrailStyle; 4] = [
        TrailStyle::SmoothFade,
        TrailStyle::VanillaVanish,
        TrailStyle::JaggyFade,
        TrailStyle::JaggyNonFade,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TrailStyle::SmoothFade => "smooth_fade",
            TrailStyle::VanillaVanish => "vanilla_vanish",
            TrailStyle::JaggyFade => "jaggy_fade",
            TrailStyle::JaggyNonFade => "jaggy_non_fade",
        }
    }
}

impl fmt::Display for TrailStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TrailStyle {
    type Err = ConfigError;

    /// Accepts the canonical snake_case names plus the legacy names
    /// `original` (vanilla vanish) and `jagged_fade`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "smooth_fade" => Ok(TrailStyle::SmoothFade),
            "vanilla_vanish" | "original" => Ok(TrailStyle::VanillaVanish),
            "jaggy_fade" | "jagged_fade" => Ok(TrailStyle::JaggyFade),
            "jaggy_non_fade" | "jagged_non_fade" => Ok(TrailStyle::JaggyNonFade),
            _ => Err(ConfigError::UnknownStyle(s.to_string())),
        }
    }
}

/// How jag offsets are generated for the two jaggy styles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JagMode {
    /// Seeded from (segment id, tick index): identical timestamps render
    /// identical frames.
    #[default]
    Seeded,
    /// Fresh thread-local randomness every tick.
    Entropy,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JagConfig {
    /// Maximum lateral offset in pixels.
    pub amplitude: f64,
    pub mode: JagMode,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrailConfig {
    pub color: Color,
    /// Stroke width in pixels at creation.
    pub width: f64,
    pub style: TrailStyle,
    /// Lifetime of each segment, fixed at creation.
    pub ttl: Duration,
    /// Minimum travelled distance (pixels) before a new point is appended.
    pub sensitivity: f64,
    /// Scale factor applied to every raw motion delta.
    pub multiplier: f64,
    pub jag: JagConfig,
}

// ── Canvas ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct CanvasConfig {
    pub background: Color,
    pub width: f64,
    pub height: f64,
    /// Re-centre the view when the trail head leaves the canvas.
    pub view_follow: bool,
}

impl CanvasConfig {
    pub fn bounds(&self) -> Rect {
        Rect::sized(self.width, self.height)
    }
}

// ── Markers ───────────────────────────────────────────────────────────────────

/// Lifetime policy for press/release markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerPolicy {
    /// Opacity fades linearly to zero over the marker ttl.
    Fade,
    /// Full opacity until the marker ttl, then removed.
    #[default]
    Vanish,
    /// Never expires; replaced by the next marker of the same button and kind.
    Sticky,
}

/// How a marker is drawn.
#[derive(Debug, Clone, PartialEq)]
pub enum MarkerVisual {
    Dot { color: Color, radius: f64 },
    Image { handle: AssetHandle, size: f64 },
}

impl MarkerVisual {
    fn size(&self) -> f64 {
        match self {
            MarkerVisual::Dot { radius, .. } => *radius,
            MarkerVisual::Image { size, .. } => *size,
        }
    }
}

/// Press and release visuals for one button.
#[derive(Debug, Clone, PartialEq)]
pub struct ButtonVisuals {
    pub press: MarkerVisual,
    pub release: MarkerVisual,
}

impl ButtonVisuals {
    pub fn dots(press: Color, press_radius: f64, release: Color, release_radius: f64) -> Self {
        Self {
            press: MarkerVisual::Dot { color: press, radius: press_radius },
            release: MarkerVisual::Dot { color: release, radius: release_radius },
        }
    }

    fn get(&self, kind: MarkerKind) -> &MarkerVisual {
        match kind {
            MarkerKind::Press => &self.press,
            MarkerKind::Release => &self.release,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarkerConfig {
    pub policy: MarkerPolicy,
    /// Ignored when `policy` is [`MarkerPolicy::Sticky`].
    pub ttl: Duration,
    pub left: ButtonVisuals,
    pub right: ButtonVisuals,
    /// Used for the middle button and any other extra buttons.
    pub other: ButtonVisuals,
}

impl MarkerConfig {
    /// Returns the visual configured for `button` / `kind`.
    pub fn visual(&self, button: PointerButton, kind: MarkerKind) -> &MarkerVisual {
        let visuals = match button {
            PointerButton::Left => &self.left,
            PointerButton::Right => &self.right,
            PointerButton::Middle | PointerButton::Other => &self.other,
        };
        visuals.get(kind)
    }
}

// ── Recentering ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecenterTrigger {
    /// Warp only when the OS cursor is within the margin of the screen edge.
    #[default]
    NearEdge,
    /// Warp after every motion event that moved the cursor off centre.
    EveryEvent,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecenteringConfig {
    pub enabled: bool,
    pub trigger: RecenterTrigger,
    /// Distance from the screen edge (pixels) that triggers a warp.
    pub margin: f64,
    /// OS screen bounds the real cursor is confined to.
    pub screen: Rect,
}

// ── Top level ─────────────────────────────────────────────────────────────────

/// Complete, validated configuration of an overlay session.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayConfig {
    pub trail: TrailConfig,
    pub canvas: CanvasConfig,
    pub markers: MarkerConfig,
    pub recentering: RecenteringConfig,
    /// Interval of the render clock.
    pub frame_interval: Duration,
}

impl Default for OverlayConfig {
    /// Defaults match the classic overlay look: a 4 px white smooth-fading
    /// line on black that lives 660 ms, rendered every 30 ms.
    fn default() -> Self {
        Self {
            trail: TrailConfig {
                color: Color::WHITE,
                width: 4.0,
                style: TrailStyle::SmoothFade,
                ttl: Duration::from_millis(660),
                sensitivity: 1.0,
                multiplier: 1.0,
                jag: JagConfig { amplitude: 3.0, mode: JagMode::Seeded },
            },
            canvas: CanvasConfig {
                background: Color::BLACK,
                width: 800.0,
                height: 600.0,
                view_follow: true,
            },
            markers: MarkerConfig {
                policy: MarkerPolicy::default(),
                ttl: Duration::from_millis(660),
                left: ButtonVisuals::dots(Color::rgb(0xFF, 0, 0), 5.0, Color::rgb(0, 0xFF, 0), 3.0),
                right: ButtonVisuals::dots(
                    Color::rgb(0, 0, 0xFF),
                    5.0,
                    Color::rgb(0x32, 0xCD, 0x32),
                    3.0,
                ),
                other: ButtonVisuals::dots(
                    Color::rgb(0xFF, 0xFF, 0),
                    5.0,
                    Color::rgb(0xFF, 0xA5, 0),
                    3.0,
                ),
            },
            recentering: RecenteringConfig {
                enabled: false,
                trigger: RecenterTrigger::NearEdge,
                margin: 50.0,
                screen: Rect::sized(1920.0, 1080.0),
            },
            frame_interval: Duration::from_millis(30),
        }
    }
}

impl OverlayConfig {
    /// Checks every invariant the engine relies on.
    ///
    /// # Errors
    ///
    /// Returns the first violated rule as a [`ConfigError`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.trail.ttl.is_zero() {
            return Err(ConfigError::NonPositiveTtl);
        }
        if self.frame_interval.is_zero() {
            return Err(ConfigError::NonPositiveFrameInterval);
        }
        if !(self.trail.sensitivity > 0.0) {
            return Err(ConfigError::NonPositiveSensitivity(self.trail.sensitivity));
        }
        if !(self.trail.width > 0.0) {
            return Err(ConfigError::NonPositiveLineWidth(self.trail.width));
        }
        if !(self.trail.multiplier > 0.0) {
            return Err(ConfigError::NonPositiveMultiplier(self.trail.multiplier));
        }
        if !(self.trail.jag.amplitude >= 0.0) {
            return Err(ConfigError::NegativeJagAmplitude(self.trail.jag.amplitude));
        }
        if !(self.canvas.width > 0.0 && self.canvas.height > 0.0) {
            return Err(ConfigError::InvalidCanvas {
                width: self.canvas.width,
                height: self.canvas.height,
            });
        }
        if self.markers.policy != MarkerPolicy::Sticky && self.markers.ttl.is_zero() {
            return Err(ConfigError::NonPositiveMarkerTtl);
        }
        for button in [PointerButton::Left, PointerButton::Right, PointerButton::Middle] {
            for kind in [MarkerKind::Press, MarkerKind::Release] {
                let size = self.markers.visual(button, kind).size();
                if !(size > 0.0) {
                    return Err(ConfigError::NonPositiveMarkerSize { button, kind, size });
                }
            }
        }
        if self.recentering.enabled {
            let screen = &self.recentering.screen;
            let margin = self.recentering.margin.max(0.0);
            if !(screen.width > 2.0 * margin && screen.height > 2.0 * margin) {
                return Err(ConfigError::InvalidScreenBounds);
            }
        }
        Ok(())
    }

    /// Maximum number of live segments the trail keeps.
    ///
    /// Derived from how many frame intervals fit in the ttl, so the live set
    /// stays bounded no matter how fast input arrives.
    pub fn retention_limit(&self) -> usize {
        let frames = self.trail.ttl.as_secs_f64() / self.frame_interval.as_secs_f64();
        let frames = if frames.is_finite() { frames.ceil().max(1.0) as usize } else { 1 };
        frames.saturating_mul(MAX_SEGMENTS_PER_FRAME)
    }
}

// ── Last-known-good manager ───────────────────────────────────────────────────

/// Holds the active configuration and rejects invalid replacements.
#[derive(Debug, Default)]
pub struct ConfigManager {
    current: Option<Arc<OverlayConfig>>,
}

impl ConfigManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates `candidate` and, if it passes, makes it the current config.
    ///
    /// # Errors
    ///
    /// Returns the validation error; the previous configuration (if any)
    /// stays active.
    pub fn apply(&mut self, candidate: OverlayConfig) -> Result<Arc<OverlayConfig>, ConfigError> {
        match candidate.validate() {
            Ok(()) => {
                let cfg = Arc::new(candidate);
                debug!(style = %cfg.trail.style, ttl_ms = cfg.trail.ttl.as_millis() as u64, "configuration applied");
                self.current = Some(Arc::clone(&cfg));
                Ok(cfg)
            }
            Err(e) => {
                if self.current.is_some() {
                    warn!("configuration rejected, keeping last known good: {e}");
                }
                Err(e)
            }
        }
    }

    /// The last configuration that passed validation, if any.
    pub fn current(&self) -> Option<Arc<OverlayConfig>> {
        self.current.clone()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
