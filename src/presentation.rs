use crate::geometry::{Geometry, Vec3};
use crate::types::{ActiveLayers, Opacities, PresentationMode};

/// Mix used when the sensor is silent.
pub const NEUTRAL_RATIO: f64 = 0.5;
/// Ratio bounds for `Stillness`, so neither layer fully disappears.
pub const STILLNESS_MIN_RATIO: f64 = 0.05;
pub const STILLNESS_MAX_RATIO: f64 = 0.95;

impl ActiveLayers {
    /// Views and layers a presentation mode renders.
    pub fn for_mode(mode: PresentationMode) -> ActiveLayers {
        match mode {
            PresentationMode::Continuity => ActiveLayers::MOVING,
            PresentationMode::LuminanceMixing => ActiveLayers::LEFT | ActiveLayers::RIGHT,
            PresentationMode::Stillness => ActiveLayers::all(),
        }
    }
}

/// Result of the per-tick mix policy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mix {
    pub ratio: Option<f64>,
    pub opacities: Option<Opacities>,
}

impl Mix {
    const NONE: Mix = Mix {
        ratio: None,
        opacities: None,
    };
}

/// Right-layer share for `mode`, or `None` when the mode does not blend.
///
/// Amplitude interpolates between the neutral 50/50 mix (silent sensor) and
/// the full position-driven mix (sensor at maximum).
pub fn mix_ratio(mode: PresentationMode, base_ratio: f64, amplitude: f64) -> Option<f64> {
    let amplitude = amplitude.clamp(0.0, 1.0);
    let ratio = NEUTRAL_RATIO + (base_ratio - NEUTRAL_RATIO) * amplitude;
    match mode {
        PresentationMode::Continuity => None,
        PresentationMode::LuminanceMixing => Some(ratio.clamp(0.0, 1.0)),
        PresentationMode::Stillness => Some(ratio.clamp(STILLNESS_MIN_RATIO, STILLNESS_MAX_RATIO)),
    }
}

pub fn opacities(ratio: f64) -> Opacities {
    Opacities {
        left: (1.0 - ratio).clamp(0.0, 1.0),
        right: ratio.clamp(0.0, 1.0),
    }
}

/// Evaluate the mix policy for the viewpoint at `position`.
pub fn mix(mode: PresentationMode, geometry: &Geometry, position: Vec3, amplitude: f64) -> Mix {
    if mode == PresentationMode::Continuity {
        return Mix::NONE;
    }
    let base_ratio = geometry.progress(position);
    let ratio = mix_ratio(mode, base_ratio, amplitude);
    Mix {
        ratio,
        opacities: ratio.map(opacities),
    }
}
