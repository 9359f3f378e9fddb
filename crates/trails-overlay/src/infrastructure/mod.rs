//! Infrastructure layer for the overlay.
//!
//! Contains the adapters around the engine: input sources, the cursor
//! controller, marker asset lookup, display surfaces and settings storage.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `trails_core`, but MUST NOT be imported by the domain layer.

pub mod assets;
pub mod cursor;
pub mod display;
pub mod input_capture;
pub mod storage;
