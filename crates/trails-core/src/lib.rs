//! # trails-core
//!
//! Pure engine for the cursor trail overlay: the virtual cursor, the trail
//! segment arena with its four decay styles, press/release markers, and the
//! compositor that turns all of that into a backend-agnostic [`Frame`].
//!
//! It has zero dependencies on OS APIs, windowing toolkits, or clocks.
//! Callers pass time in explicitly, which keeps every rule deterministic.
//!
//! # Architecture overview (for beginners)
//!
//! The overlay draws where the mouse has been.  Mouse motion arrives as a
//! stream of events; each event that moves the *virtual* cursor far enough
//! becomes a straight segment.  Segments live for a fixed time-to-live and
//! change their look as they age, according to the chosen [`TrailStyle`]:
//!
//! - `smooth_fade`    – thinner and more transparent with age;
//! - `vanilla_vanish` – unchanged until it expires, then gone;
//! - `jaggy_fade`     – fades, and its midpoint wobbles perpendicular to the
//!   stroke;
//! - `jaggy_non_fade` – wobbles but keeps full opacity.
//!
//! Button presses and releases drop markers, which have their own timer.
//!
//! Modules:
//!
//! - **`geometry`** – `Point` and `Rect` in virtual (unbounded) space.
//! - **`color`**    – RGBA colours, parsed from hex or X11 names.
//! - **`asset`**    – opaque handles for marker images.
//! - **`config`**   – the validated runtime configuration and its manager.
//! - **`domain`**   – cursor, trail and marker state machines.
//! - **`render`**   – viewport mapping and per-tick composition.

pub mod asset;
pub mod color;
pub mod config;
pub mod domain;
pub mod geometry;
pub mod render;

pub use asset::{AssetHandle, AssetProvider};
pub use color::{Color, ColorParseError};
pub use config::{
    CanvasConfig, ConfigError, ConfigManager, JagMode, MarkerConfig, MarkerPolicy, MarkerVisual,
    OverlayConfig, RecenterTrigger, RecenteringConfig, TrailConfig, TrailStyle,
};
pub use domain::cursor::VirtualCursor;
pub use domain::marker::{Marker, MarkerKind, MarkerManager, PointerButton};
pub use domain::trail::{TrailEngine, TrailSegment};
pub use domain::Timestamp;
pub use geometry::{Point, Rect};
pub use render::compositor::FrameCompositor;
pub use render::frame::{DrawCommand, Frame};
