//! Easing laws mapping a cycle phase to a normalized position.
//!
//! A full back-and-forth cycle spans a phase of 2. Every law rises from 0 at
//! phase 0 to 1 at phase 1 and mirrors back, so `ease(p) == ease(2 - p)`.

use crate::types::MotionLaw;
use std::f64::consts::PI;

/// Length of one full motion cycle in phase units.
pub const CYCLE: f64 = 2.0;

/// Reduce any phase into `[0, 2)`.
///
/// Negative phases wrap forward, so a window sampled before the session
/// started still lands on the curve.
pub fn wrap_phase(phase: f64) -> f64 {
    let wrapped = phase.rem_euclid(CYCLE);
    // rem_euclid can round tiny negatives up to exactly CYCLE.
    if wrapped >= CYCLE {
        0.0
    } else {
        wrapped
    }
}

/// Fold a phase onto the rising half-cycle `u` in `[0, 1]`.
pub fn fold_phase(phase: f64) -> f64 {
    let p = wrap_phase(phase);
    if p <= 1.0 {
        p
    } else {
        CYCLE - p
    }
}

/// Normalized position in `[0, 1]` for `phase` under `law`.
pub fn ease(law: MotionLaw, phase: f64) -> f64 {
    let u = fold_phase(phase);
    let y = match law {
        MotionLaw::Linear => u,
        MotionLaw::Cosine => (1.0 - (PI * u).cos()) / 2.0,
        MotionLaw::ArcCosine => (1.0 - 2.0 * u).clamp(-1.0, 1.0).acos() / PI,
    };
    y.clamp(0.0, 1.0)
}
