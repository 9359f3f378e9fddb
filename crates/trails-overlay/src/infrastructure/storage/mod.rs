//! Storage infrastructure: settings file persistence.
//!
//! The `settings` sub-module handles:
//!
//! - Reading the TOML settings file from the platform-appropriate directory.
//! - Writing settings back to disk.
//! - Providing defaults when the file does not exist yet (first run).
//! - Watching the file and publishing validated changes (hot reload).

pub mod settings;
