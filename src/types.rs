use crate::geometry::Vec3;
use crate::ParallaxError;
use std::fmt;
use std::str::FromStr;

/// Periodic motion law applied along the baseline.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MotionLaw {
    /// Triangular wave, constant speed.
    Linear = 0,
    /// Ease-in-out, `(1 - cos(pi*u)) / 2`.
    Cosine = 1,
    /// Ease-out-in, `acos(1 - 2u) / pi`.
    ArcCosine = 2,
}

impl MotionLaw {
    pub const ALL: [MotionLaw; 3] = [MotionLaw::Linear, MotionLaw::Cosine, MotionLaw::ArcCosine];

    pub fn name(self) -> &'static str {
        match self {
            MotionLaw::Linear => "Linear",
            MotionLaw::Cosine => "Cosine",
            MotionLaw::ArcCosine => "ArcCosine",
        }
    }

    pub fn from_raw(raw: i32) -> Option<MotionLaw> {
        match raw {
            0 => Some(MotionLaw::Linear),
            1 => Some(MotionLaw::Cosine),
            2 => Some(MotionLaw::ArcCosine),
            _ => None,
        }
    }
}

impl fmt::Display for MotionLaw {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MotionLaw {
    type Err = ParallaxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "linear" => Ok(MotionLaw::Linear),
            "cosine" | "cos" | "easeinout" => Ok(MotionLaw::Cosine),
            "arccosine" | "arccos" | "easeoutin" => Ok(MotionLaw::ArcCosine),
            _ => Err(ParallaxError::UnknownMotionLaw(s.to_string())),
        }
    }
}

/// How the stimulus is presented to the observer.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PresentationMode {
    /// A single moving viewpoint, no blending.
    Continuity = 0,
    /// Two fixed views cross-faded by position and amplitude.
    LuminanceMixing = 1,
    /// Like `LuminanceMixing`, but neither layer ever fully disappears.
    Stillness = 2,
}

impl PresentationMode {
    pub const ALL: [PresentationMode; 3] = [
        PresentationMode::Continuity,
        PresentationMode::LuminanceMixing,
        PresentationMode::Stillness,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PresentationMode::Continuity => "Continuity",
            PresentationMode::LuminanceMixing => "LuminanceMixing",
            PresentationMode::Stillness => "Stillness",
        }
    }

    pub fn from_raw(raw: i32) -> Option<PresentationMode> {
        match raw {
            0 => Some(PresentationMode::Continuity),
            1 => Some(PresentationMode::LuminanceMixing),
            2 => Some(PresentationMode::Stillness),
            _ => None,
        }
    }
}

impl fmt::Display for PresentationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PresentationMode {
    type Err = ParallaxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .collect::<String>()
            .to_ascii_lowercase();
        match key.as_str() {
            "continuity" => Ok(PresentationMode::Continuity),
            "luminancemixing" | "mixing" => Ok(PresentationMode::LuminanceMixing),
            "stillness" => Ok(PresentationMode::Stillness),
            _ => Err(ParallaxError::UnknownPresentationMode(s.to_string())),
        }
    }
}

bitflags::bitflags! {
    /// Views and image layers the render sink should enable for a session.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    #[repr(C)]
    pub struct ActiveLayers: u32 {
        /// The moving viewpoint and its centre image.
        const MOVING = 1 << 0;
        /// The reference view fixed at the left limit and its image.
        const LEFT   = 1 << 1;
        /// The reference view fixed at the right limit and its image.
        const RIGHT  = 1 << 2;
    }
}

/// Opacity pair for the left and right image layers, each in [0, 1].
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Opacities {
    pub left: f64,
    pub right: f64,
}

/// Why a session ended on its own or was stopped.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Capture mode reached `end_frame_index`.
    CaptureComplete = 0,
    /// Live mode reached the configured loop limit.
    LoopLimit = 1,
    /// The host asked the session to stop.
    Stopped = 2,
}

/// Everything the controller published for one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameOutput {
    /// Tick counter, starting at 1 for the first published frame.
    pub frame: u64,
    pub elapsed_time: f64,
    pub loop_count: u64,
    pub phase: f64,
    pub ease: f64,
    pub position: Vec3,
    pub amplitude: f64,
    /// Right-layer share of the mix. `None` in `Continuity`.
    pub ratio: Option<f64>,
    pub opacities: Option<Opacities>,
    /// 1-based frame number to persist, set only in capture mode.
    pub capture_frame: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn motion_law_parses_aliases() {
        assert_eq!("linear".parse::<MotionLaw>().unwrap(), MotionLaw::Linear);
        assert_eq!("Cos".parse::<MotionLaw>().unwrap(), MotionLaw::Cosine);
        assert_eq!(" ArcCosine ".parse::<MotionLaw>().unwrap(), MotionLaw::ArcCosine);
        assert!("sine".parse::<MotionLaw>().is_err());
    }

    #[test]
    fn presentation_mode_ignores_separators() {
        assert_eq!(
            "luminance_mixing".parse::<PresentationMode>().unwrap(),
            PresentationMode::LuminanceMixing
        );
        assert_eq!(
            "Stillness".parse::<PresentationMode>().unwrap(),
            PresentationMode::Stillness
        );
        assert!(matches!(
            "blend".parse::<PresentationMode>(),
            Err(ParallaxError::UnknownPresentationMode(_))
        ));
    }

    #[test]
    fn display_round_trips_through_from_str() {
        for law in MotionLaw::ALL {
            assert_eq!(law.to_string().parse::<MotionLaw>().unwrap(), law);
        }
        for mode in PresentationMode::ALL {
            assert_eq!(mode.to_string().parse::<PresentationMode>().unwrap(), mode);
        }
    }

    #[test]
    fn raw_discriminants_match() {
        assert_eq!(MotionLaw::from_raw(2), Some(MotionLaw::ArcCosine));
        assert_eq!(MotionLaw::from_raw(3), None);
        assert_eq!(
            PresentationMode::from_raw(1),
            Some(PresentationMode::LuminanceMixing)
        );
    }
}
