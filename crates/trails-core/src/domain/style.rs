//! Per-style decay curves and the jag function.
//!
//! Each [`TrailStyle`] is a pure function of a segment's life fraction
//! (`age / ttl`): it yields the width and opacity the segment should be drawn
//! with on this tick.  Dispatch is a `match` on the enum inside the per-tick
//! loop, so there is no dynamic dispatch per segment.
//!
//! | Style          | Width        | Opacity   | Geometry |
//! |----------------|--------------|-----------|----------|
//! | SmoothFade     | `w · (1−f)`  | `1 − f`   | straight |
//! | VanillaVanish  | `w`          | `1`       | straight |
//! | JaggyFade      | `w`          | `1 − f`   | jagged   |
//! | JaggyNonFade   | `w`          | `1`       | jagged   |
//!
//! At `f >= 1` every style yields an invisible look; the trail engine evicts
//! such segments before they are ever handed to the compositor.
//!
//! # Jag reproducibility
//!
//! In [`JagMode::Seeded`] the lateral offset is drawn from a `StdRng` seeded
//! with the segment id and the tick index (`now / frame_interval`), so two
//! renders at the same timestamp are identical and a replayed session looks
//! the same every time.  [`JagMode::Entropy`] uses the thread-local RNG
//! instead; the trail engine draws it once per segment per tick and keeps
//! the result, so it too is stable within a tick.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::{JagMode, TrailStyle};

/// How a segment looks on one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentLook {
    pub width: f64,
    pub opacity: f64,
    pub visible: bool,
}

impl SegmentLook {
    pub const HIDDEN: SegmentLook = SegmentLook { width: 0.0, opacity: 0.0, visible: false };
}

impl TrailStyle {
    /// `true` for the two styles whose opacity decays with age.
    pub fn fades(self) -> bool {
        matches!(self, TrailStyle::SmoothFade | TrailStyle::JaggyFade)
    }

    /// `true` for the two styles whose geometry is perturbed every tick.
    pub fn is_jaggy(self) -> bool {
        matches!(self, TrailStyle::JaggyFade | TrailStyle::JaggyNonFade)
    }

    /// Width and opacity of a segment at `life_fraction` (`age / ttl`).
    pub fn look_at(self, base_width: f64, life_fraction: f64) -> SegmentLook {
        if !(life_fraction < 1.0) {
            return SegmentLook::HIDDEN;
        }
        let remaining = 1.0 - life_fraction.max(0.0);
        let width = match self {
            TrailStyle::SmoothFade => base_width * remaining,
            _ => base_width,
        };
        SegmentLook {
            width,
            opacity: if self.fades() { remaining } else { 1.0 },
            visible: true,
        }
    }
}

/// Lateral offset in `[-amplitude, amplitude]` for one segment on one tick.
pub fn jag_offset(mode: JagMode, amplitude: f64, segment_id: u64, tick: u64) -> f64 {
    if amplitude <= 0.0 {
        return 0.0;
    }
    let unit: f64 = match mode {
        JagMode::Seeded => StdRng::seed_from_u64(jag_seed(segment_id, tick)).gen_range(-1.0..=1.0),
        JagMode::Entropy => rand::thread_rng().gen_range(-1.0..=1.0),
    };
    unit * amplitude
}

/// Mixes a segment id and tick index into one RNG seed.
fn jag_seed(segment_id: u64, tick: u64) -> u64 {
    segment_id
        .wrapping_mul(0x9E37_79B9_7F4A_7C15)
        .rotate_left(31)
        ^ tick.wrapping_mul(0xBF58_476D_1CE4_E5B9)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
