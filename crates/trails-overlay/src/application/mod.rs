//! Application layer use cases for the overlay.
//!
//! # What is the "application" layer? (for beginners)
//!
//! In Clean Architecture the *application* layer sits between the domain
//! (`trails_core`: trail, markers, styles, compositor) and the infrastructure
//! (input sources, cursor control, display surfaces, settings files).
//!
//! Use cases in this layer orchestrate domain objects and depend on traits
//! such as [`recenter::CursorController`] and
//! [`crate::infrastructure::display::FrameSink`] rather than on concrete
//! adapters, so tests can drive them with mocks and a paused clock.
//!
//! # Sub-modules
//!
//! - **`normalize_input`** – Turns raw relative or absolute motion into
//!   virtual-cursor updates and stamps button events with the position.
//!
//! - **`recenter`** – Keeps the real pointer away from the screen edges
//!   without disturbing the virtual trail.
//!
//! - **`session`** – Owns all mutable overlay state and applies events,
//!   ticks and configuration swaps to it.
//!
//! - **`render_loop`** – The fixed-interval clock that drains input, composes
//!   a frame and presents it, until shutdown.

pub mod normalize_input;
pub mod recenter;
pub mod render_loop;
pub mod session;
