//! Frame composition.
//!
//! - **`frame`**      – the display-list types handed to display surfaces.
//! - **`viewport`**   – virtual-space → canvas-space mapping.
//! - **`compositor`** – the per-tick composition pass.

pub mod compositor;
pub mod frame;
pub mod viewport;
