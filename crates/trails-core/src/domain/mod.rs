//! Domain entities for the trail overlay.
//!
//! Everything in here is pure: no OS APIs, no clocks, no I/O.  Time is passed
//! in explicitly as a [`Timestamp`] (elapsed time since the session epoch), so
//! every decay and eviction rule can be tested by stepping a number instead of
//! sleeping.
//!
//! - **`cursor`** – the unbounded virtual cursor and its recentering ledger.
//! - **`style`**  – per-style width/opacity curves and the jag function.
//! - **`trail`**  – the live segment arena and the sensitivity accumulator.
//! - **`marker`** – press/release markers and their lifetime policies.

pub mod cursor;
pub mod marker;
pub mod style;
pub mod trail;

/// Monotonic time elapsed since the session epoch.
pub type Timestamp = std::time::Duration;
