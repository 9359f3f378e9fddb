//! TOML-based settings persistence for the overlay.
//!
//! Reads and writes [`Settings`] to the platform-appropriate file:
//! - Windows:  `%APPDATA%\CursorTrails\settings.toml`
//! - Linux:    `~/.config/cursortrails/settings.toml`
//! - macOS:    `~/Library/Application Support/CursorTrails/settings.toml`
//!
//! Example:
//!
//! ```toml
//! [trail]
//! color = "white"
//! width = 4.0
//! style = "smooth_fade"
//! ttl_ms = 660
//!
//! [canvas]
//! background = "black"
//! frame_interval_ms = 30
//!
//! [markers]
//! policy = "vanish"
//!
//! [markers.right]
//! press_image = "markers/right-press.png"
//! press_size = 24.0
//! ```
//!
//! Every field has a `#[serde(default = "...")]`, so a missing file, a
//! missing section or a missing key all fall back to the classic look.
//!
//! [`Settings`] is only the on-disk shape.  [`Settings::to_overlay_config`]
//! parses colours and style names, resolves marker images through an
//! [`AssetProvider`] and validates the result into an [`OverlayConfig`].
//!
//! # Hot reload
//!
//! [`SettingsWatcher`] polls the file's modification time.  A changed file is
//! re-read, converted and offered to a [`ConfigManager`]; accepted configs are
//! published on a `watch` channel, rejected ones are logged and the last
//! known good configuration stays active.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use trails_core::config::{ButtonVisuals, JagConfig};
use trails_core::{
    AssetProvider, CanvasConfig, Color, ConfigError, ConfigManager, JagMode, MarkerConfig,
    MarkerPolicy, MarkerVisual, OverlayConfig, Rect, RecenterTrigger, RecenteringConfig,
    TrailConfig, TrailStyle,
};

/// Error type for settings file operations.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing settings at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse settings TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The settings could not be serialized to TOML.
    #[error("failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// The settings parsed but describe an invalid configuration.
    #[error("invalid settings: {0}")]
    Invalid(#[from] ConfigError),
}

// ── Settings schema types ─────────────────────────────────────────────────────

/// Top-level settings stored on disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    #[serde(default)]
    pub trail: TrailSettings,
    #[serde(default)]
    pub canvas: CanvasSettings,
    #[serde(default)]
    pub markers: MarkerSettings,
    #[serde(default)]
    pub recentering: RecenteringSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrailSettings {
    /// Hex (`#rrggbb`, `#rrggbbaa`) or an X11 colour name.
    #[serde(default = "default_line_color")]
    pub color: String,
    #[serde(default = "default_line_width")]
    pub width: f64,
    /// `smooth_fade`, `vanilla_vanish`, `jaggy_fade` or `jaggy_non_fade`.
    #[serde(default = "default_style")]
    pub style: String,
    #[serde(default = "default_ttl_ms")]
    pub ttl_ms: u64,
    #[serde(default = "default_sensitivity")]
    pub sensitivity: f64,
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
    #[serde(default = "default_jag_amplitude")]
    pub jag_amplitude: f64,
    #[serde(default)]
    pub jag_mode: JagMode,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CanvasSettings {
    #[serde(default = "default_background")]
    pub background: String,
    #[serde(default = "default_canvas_width")]
    pub width: f64,
    #[serde(default = "default_canvas_height")]
    pub height: f64,
    #[serde(default = "default_frame_interval_ms")]
    pub frame_interval_ms: u64,
    #[serde(default = "default_true")]
    pub view_follow: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MarkerSettings {
    #[serde(default = "default_marker_policy")]
    pub policy: MarkerPolicy,
    #[serde(default = "default_ttl_ms")]
    pub ttl_ms: u64,
    #[serde(default = "default_left_markers")]
    pub left: ButtonMarkerSettings,
    #[serde(default = "default_right_markers")]
    pub right: ButtonMarkerSettings,
    /// Middle and extra buttons.
    #[serde(default = "default_other_markers")]
    pub other: ButtonMarkerSettings,
}

/// Marker look for one button.  Unset keys fall back to that button's
/// default; an image, when set, takes precedence over the dot colour.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ButtonMarkerSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub press_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub press_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub press_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_image: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecenteringSettings {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub trigger: RecenterTrigger,
    #[serde(default = "default_margin")]
    pub margin: f64,
    #[serde(default = "default_screen_width")]
    pub screen_width: f64,
    #[serde(default = "default_screen_height")]
    pub screen_height: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingSettings {
    /// `tracing` level used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_line_color() -> String {
    "white".to_string()
}
fn default_line_width() -> f64 {
    4.0
}
fn default_style() -> String {
    TrailStyle::SmoothFade.as_str().to_string()
}
fn default_ttl_ms() -> u64 {
    660
}
fn default_sensitivity() -> f64 {
    1.0
}
fn default_multiplier() -> f64 {
    1.0
}
fn default_jag_amplitude() -> f64 {
    3.0
}
fn default_background() -> String {
    "black".to_string()
}
fn default_canvas_width() -> f64 {
    800.0
}
fn default_canvas_height() -> f64 {
    600.0
}
fn default_frame_interval_ms() -> u64 {
    30
}
fn default_true() -> bool {
    true
}
fn default_marker_policy() -> MarkerPolicy {
    MarkerPolicy::default()
}
fn default_margin() -> f64 {
    50.0
}
fn default_screen_width() -> f64 {
    1920.0
}
fn default_screen_height() -> f64 {
    1080.0
}
fn default_log_level() -> String {
    "info".to_string()
}

fn button_markers(press: &str, release: &str) -> ButtonMarkerSettings {
    ButtonMarkerSettings {
        press_color: Some(press.to_string()),
        press_size: Some(5.0),
        press_image: None,
        release_color: Some(release.to_string()),
        release_size: Some(3.0),
        release_image: None,
    }
}
fn default_left_markers() -> ButtonMarkerSettings {
    button_markers("red", "green")
}
fn default_right_markers() -> ButtonMarkerSettings {
    button_markers("blue", "lime green")
}
fn default_other_markers() -> ButtonMarkerSettings {
    button_markers("yellow", "orange")
}

impl Default for TrailSettings {
    fn default() -> Self {
        Self {
            color: default_line_color(),
            width: default_line_width(),
            style: default_style(),
            ttl_ms: default_ttl_ms(),
            sensitivity: default_sensitivity(),
            multiplier: default_multiplier(),
            jag_amplitude: default_jag_amplitude(),
            jag_mode: JagMode::default(),
        }
    }
}

impl Default for CanvasSettings {
    fn default() -> Self {
        Self {
            background: default_background(),
            width: default_canvas_width(),
            height: default_canvas_height(),
            frame_interval_ms: default_frame_interval_ms(),
            view_follow: default_true(),
        }
    }
}

impl Default for MarkerSettings {
    fn default() -> Self {
        Self {
            policy: default_marker_policy(),
            ttl_ms: default_ttl_ms(),
            left: default_left_markers(),
            right: default_right_markers(),
            other: default_other_markers(),
        }
    }
}

impl Default for RecenteringSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            trigger: RecenterTrigger::default(),
            margin: default_margin(),
            screen_width: default_screen_width(),
            screen_height: default_screen_height(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ── Conversion into the runtime config ────────────────────────────────────────

impl Settings {
    /// Builds and validates the runtime configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Invalid`] for unknown colours or styles,
    /// unresolved marker images and every rule [`OverlayConfig::validate`]
    /// enforces.
    pub fn to_overlay_config(
        &self,
        assets: &dyn AssetProvider,
    ) -> Result<OverlayConfig, SettingsError> {
        let t = &self.trail;
        let c = &self.canvas;
        let m = &self.markers;
        let r = &self.recentering;

        let config = OverlayConfig {
            trail: TrailConfig {
                color: Color::from_str(&t.color).map_err(ConfigError::from)?,
                width: t.width,
                style: TrailStyle::from_str(&t.style)?,
                ttl: Duration::from_millis(t.ttl_ms),
                sensitivity: t.sensitivity,
                multiplier: t.multiplier,
                jag: JagConfig {
                    amplitude: t.jag_amplitude,
                    mode: t.jag_mode,
                },
            },
            canvas: CanvasConfig {
                background: Color::from_str(&c.background).map_err(ConfigError::from)?,
                width: c.width,
                height: c.height,
                view_follow: c.view_follow,
            },
            markers: MarkerConfig {
                policy: m.policy,
                ttl: Duration::from_millis(m.ttl_ms),
                left: m.left.to_visuals(&default_left_markers(), assets)?,
                right: m.right.to_visuals(&default_right_markers(), assets)?,
                other: m.other.to_visuals(&default_other_markers(), assets)?,
            },
            recentering: RecenteringConfig {
                enabled: r.enabled,
                trigger: r.trigger,
                margin: r.margin,
                screen: Rect::sized(r.screen_width, r.screen_height),
            },
            frame_interval: Duration::from_millis(c.frame_interval_ms),
        };
        config.validate()?;
        Ok(config)
    }
}

impl ButtonMarkerSettings {
    fn to_visuals(
        &self,
        fallback: &ButtonMarkerSettings,
        assets: &dyn AssetProvider,
    ) -> Result<ButtonVisuals, ConfigError> {
        let press = visual(
            self.press_image.as_deref(),
            self.press_color.as_deref().or(fallback.press_color.as_deref()),
            self.press_size.or(fallback.press_size),
            assets,
        )?;
        let release = visual(
            self.release_image.as_deref(),
            self.release_color.as_deref().or(fallback.release_color.as_deref()),
            self.release_size.or(fallback.release_size),
            assets,
        )?;
        Ok(ButtonVisuals { press, release })
    }
}

fn visual(
    image: Option<&str>,
    color: Option<&str>,
    size: Option<f64>,
    assets: &dyn AssetProvider,
) -> Result<MarkerVisual, ConfigError> {
    let size = size.unwrap_or(5.0);
    if let Some(reference) = image {
        let handle = assets
            .resolve(reference)
            .ok_or_else(|| ConfigError::UnresolvedAsset(reference.to_string()))?;
        return Ok(MarkerVisual::Image { handle, size });
    }
    let color = match color {
        Some(name) => Color::from_str(name)?,
        None => Color::WHITE,
    };
    Ok(MarkerVisual::Dot { color, radius: size })
}

// ── Command-line overrides ────────────────────────────────────────────────────

/// Values from the command line that win over the settings file, re-applied
/// after every reload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettingsOverrides {
    pub style: Option<String>,
    pub disable_recentering: bool,
}

impl SettingsOverrides {
    pub fn apply(&self, settings: &mut Settings) {
        if let Some(style) = &self.style {
            settings.trail.style = style.clone();
        }
        if self.disable_recentering {
            settings.recentering.enabled = false;
        }
    }
}

// ── Settings repository ───────────────────────────────────────────────────────

/// Resolves the full path to the default settings file.
///
/// # Errors
///
/// Returns [`SettingsError::NoPlatformConfigDir`] if the base directory cannot
/// be determined.
pub fn settings_file_path() -> Result<PathBuf, SettingsError> {
    platform_config_dir()
        .map(|dir| dir.join("settings.toml"))
        .ok_or(SettingsError::NoPlatformConfigDir)
}

/// Loads settings from `path`, returning `Settings::default()` if the file
/// does not exist yet.
///
/// # Errors
///
/// Returns [`SettingsError::Io`] for file-system errors other than "not found",
/// and [`SettingsError::Parse`] if the TOML is malformed.
pub fn load_settings_from(path: &Path) -> Result<Settings, SettingsError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no settings file, using defaults");
            Ok(Settings::default())
        }
        Err(e) => Err(SettingsError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Persists `settings` to `path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns [`SettingsError::Io`] for file-system failures or
/// [`SettingsError::Serialize`] if serialization fails.
pub fn save_settings_to(path: &Path, settings: &Settings) -> Result<(), SettingsError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|source| SettingsError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }
    let content = toml::to_string_pretty(settings)?;
    std::fs::write(path, content).map_err(|source| SettingsError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Resolves the platform config directory for this application.
fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("CursorTrails"))
    }

    #[cfg(target_os = "linux")]
    {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("cursortrails"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("CursorTrails")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Hot reload ────────────────────────────────────────────────────────────────

pub struct SettingsWatcher {
    path: PathBuf,
    assets: Arc<dyn AssetProvider>,
    manager: ConfigManager,
    overrides: SettingsOverrides,
    last_modified: Option<SystemTime>,
}

impl SettingsWatcher {
    /// Watches `path`.  The file's current state counts as already applied.
    pub fn new(
        path: impl Into<PathBuf>,
        assets: Arc<dyn AssetProvider>,
        manager: ConfigManager,
        overrides: SettingsOverrides,
    ) -> Self {
        let path = path.into();
        let last_modified = modified(&path);
        Self {
            path,
            assets,
            manager,
            overrides,
            last_modified,
        }
    }

    /// Checks the file once.  Returns the new configuration if the file
    /// changed and the result was accepted.
    pub fn poll(&mut self) -> Option<Arc<OverlayConfig>> {
        let stamp = modified(&self.path);
        if stamp == self.last_modified {
            return None;
        }
        self.last_modified = stamp;
        debug!(path = %self.path.display(), "settings file changed");

        let candidate = load_settings_from(&self.path).and_then(|mut settings| {
            self.overrides.apply(&mut settings);
            settings.to_overlay_config(self.assets.as_ref())
        });
        match candidate {
            Ok(config) => self.manager.apply(config).ok(),
            Err(e) => {
                warn!("settings reload rejected, keeping last known good: {e}");
                None
            }
        }
    }

    /// Polls every `period` and publishes accepted configs until shutdown.
    pub async fn run(
        mut self,
        updates: watch::Sender<Arc<OverlayConfig>>,
        period: Duration,
        mut shutdown: watch::Receiver<bool>,
    ) {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        info!(path = %self.path.display(), "watching settings for changes");
        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    if let Some(config) = self.poll() {
                        if updates.send(config).is_err() {
                            break;
                        }
                    }
                }
            }
        }
    }
}

fn modified(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
