//! Amplitude smoothing and the raw-sample slot shared with the acquisition thread.

use crate::protocol::{self, DEFAULT_AMPLITUDE, SNAP_EPSILON};
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

const NO_SAMPLE: i64 = i64::MIN;

/// Single-slot, last-write-wins cell holding the latest raw reading.
///
/// One writer (the acquisition thread) and one reader (the controller tick).
/// Older samples are simply overwritten.
pub struct RawCell {
    value: AtomicI64,
    samples: AtomicU64,
}

impl RawCell {
    pub const fn new() -> Self {
        Self {
            value: AtomicI64::new(NO_SAMPLE),
            samples: AtomicU64::new(0),
        }
    }

    pub fn store(&self, raw: i64) {
        self.value.store(raw.max(NO_SAMPLE + 1), Ordering::Release);
        self.samples.fetch_add(1, Ordering::Relaxed);
    }

    /// Latest reading, or `None` if nothing has arrived yet.
    pub fn load(&self) -> Option<i64> {
        match self.value.load(Ordering::Acquire) {
            NO_SAMPLE => None,
            v => Some(v),
        }
    }

    /// Number of records stored since the cell was created.
    pub fn sample_count(&self) -> u64 {
        self.samples.load(Ordering::Relaxed)
    }
}

impl Default for RawCell {
    fn default() -> Self {
        Self::new()
    }
}

/// Exponential smoothing filter with snap-to-rail.
#[derive(Debug, Clone)]
pub struct AmplitudeFilter {
    smoothed: f64,
    alpha: f64,
}

impl AmplitudeFilter {
    /// Filter starting at the neutral amplitude.
    pub fn new(alpha: f64) -> Self {
        Self::with_initial(alpha, DEFAULT_AMPLITUDE)
    }

    pub fn with_initial(alpha: f64, initial: f64) -> Self {
        Self {
            smoothed: initial.clamp(0.0, 1.0),
            alpha: alpha.clamp(f64::MIN_POSITIVE, 1.0),
        }
    }

    /// Step the filter one tick toward `target` and return the published value.
    pub fn update(&mut self, target: f64) -> f64 {
        let target = target.clamp(0.0, 1.0);
        self.smoothed += self.alpha * (target - self.smoothed);

        let on_rail = target == 0.0 || target == 1.0;
        if on_rail && (self.smoothed - target).abs() < SNAP_EPSILON {
            self.smoothed = target;
        }
        self.smoothed = self.smoothed.clamp(0.0, 1.0);
        self.value()
    }

    /// Published (rounded) amplitude.
    pub fn value(&self) -> f64 {
        protocol::round_published(self.smoothed)
    }

    /// Unrounded filter state.
    pub fn raw_state(&self) -> f64 {
        self.smoothed
    }
}
