//! Session and sensor configuration.
//!
//! Both structs validate once at session start. `from_env()` reads
//! `PARALLAX_*` variables so the rig can be retuned without a rebuild.

use crate::protocol::{
    DEFAULT_BAUD_RATE, DEFAULT_MAX_VALUE, DEFAULT_THRESHOLD, READ_TIMEOUT, SMOOTHING_ALPHA,
};
use crate::types::{MotionLaw, PresentationMode};
use crate::{ParallaxError, Result};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Inputs fixed for the lifetime of one session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub motion_law: MotionLaw,
    pub presentation_mode: PresentationMode,
    /// Baseline length in scene units.
    pub distance: f64,
    /// Time-scale multiplier for live mode.
    pub speed: f64,
    /// Frames per motion cycle in capture mode.
    pub cycle_frame_count: u32,
    /// Total frames written before capture mode terminates.
    pub end_frame_index: u32,
    pub capture_mode: bool,
    /// Stop live mode after this many completed cycles.
    pub max_loops: Option<u64>,
    /// Root folder for captured frames.
    pub capture_root: PathBuf,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            motion_law: MotionLaw::Linear,
            presentation_mode: PresentationMode::Continuity,
            distance: 0.01,
            speed: 1.0,
            cycle_frame_count: 120,
            end_frame_index: 240,
            capture_mode: false,
            max_loops: None,
            capture_root: PathBuf::from("Screenshots"),
        }
    }
}

impl SessionConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.distance > 0.0 && self.distance.is_finite()) {
            return Err(ParallaxError::invalid(
                "distance",
                format!("must be a finite value > 0, got {}", self.distance),
            ));
        }
        if !(self.speed > 0.0 && self.speed.is_finite()) {
            return Err(ParallaxError::invalid(
                "speed",
                format!("must be a finite value > 0, got {}", self.speed),
            ));
        }
        if self.cycle_frame_count == 0 {
            return Err(ParallaxError::invalid("cycle_frame_count", "must be > 0"));
        }
        if self.end_frame_index == 0 {
            return Err(ParallaxError::invalid("end_frame_index", "must be > 0"));
        }
        if self.max_loops == Some(0) {
            return Err(ParallaxError::invalid("max_loops", "must be > 0 when set"));
        }
        Ok(())
    }

    /// Defaults overridden by `PARALLAX_*` environment variables.
    ///
    /// Unparseable values are logged and ignored. Unknown enum names are
    /// errors, since silently running the wrong condition would spoil a trial.
    pub fn from_env() -> Result<Self> {
        let d = SessionConfig::default();
        let motion_law = match env_string("PARALLAX_MOTION_LAW") {
            Some(v) => v.parse()?,
            None => d.motion_law,
        };
        let presentation_mode = match env_string("PARALLAX_PRESENTATION") {
            Some(v) => v.parse()?,
            None => d.presentation_mode,
        };

        let config = SessionConfig {
            motion_law,
            presentation_mode,
            distance: read_env("PARALLAX_DISTANCE", d.distance),
            speed: read_env("PARALLAX_SPEED", d.speed),
            cycle_frame_count: read_env("PARALLAX_CYCLE_FRAMES", d.cycle_frame_count),
            end_frame_index: read_env("PARALLAX_END_FRAME", d.end_frame_index),
            capture_mode: read_env_bool("PARALLAX_CAPTURE", d.capture_mode),
            max_loops: env_string("PARALLAX_MAX_LOOPS")
                .and_then(|v| parse_or_warn("PARALLAX_MAX_LOOPS", &v)),
            capture_root: env_string("PARALLAX_CAPTURE_ROOT")
                .map(PathBuf::from)
                .unwrap_or(d.capture_root),
        };
        config.validate()?;
        Ok(config)
    }
}

/// Serial sensor settings.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorConfig {
    /// Port identifier, e.g. `/dev/ttyUSB0` or `COM3`.
    pub port: String,
    pub baud_rate: u32,
    pub threshold: i64,
    pub max_value: i64,
    pub read_timeout: Duration,
    /// Smoothing factor in (0, 1].
    pub smoothing: f64,
}

impl SensorConfig {
    pub fn new(port: impl Into<String>) -> Self {
        Self {
            port: port.into(),
            baud_rate: DEFAULT_BAUD_RATE,
            threshold: DEFAULT_THRESHOLD,
            max_value: DEFAULT_MAX_VALUE,
            read_timeout: READ_TIMEOUT,
            smoothing: SMOOTHING_ALPHA,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_value <= self.threshold {
            return Err(ParallaxError::invalid(
                "max_value",
                format!(
                    "must exceed threshold ({} <= {})",
                    self.max_value, self.threshold
                ),
            ));
        }
        if !(self.smoothing > 0.0 && self.smoothing <= 1.0) {
            return Err(ParallaxError::invalid(
                "smoothing",
                format!("must be in (0, 1], got {}", self.smoothing),
            ));
        }
        if self.read_timeout.is_zero() {
            return Err(ParallaxError::invalid("read_timeout", "must be > 0"));
        }
        Ok(())
    }

    /// Sensor settings from `PARALLAX_SERIAL_*`, or `None` when no port is set.
    pub fn from_env() -> Option<Self> {
        let port = env_string("PARALLAX_SERIAL_PORT")?;
        let d = SensorConfig::new(port);
        Some(SensorConfig {
            baud_rate: read_env("PARALLAX_SERIAL_BAUD", d.baud_rate),
            threshold: read_env("PARALLAX_SERIAL_THRESHOLD", d.threshold),
            max_value: read_env("PARALLAX_SERIAL_MAX", d.max_value),
            read_timeout: Duration::from_millis(read_env(
                "PARALLAX_SERIAL_TIMEOUT_MS",
                d.read_timeout.as_millis() as u64,
            )),
            smoothing: read_env("PARALLAX_SMOOTHING", d.smoothing),
            ..d
        })
    }
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_or_warn<T: FromStr>(name: &str, value: &str) -> Option<T> {
    match value.parse::<T>() {
        Ok(v) => Some(v),
        Err(_) => {
            log::warn!("Ignoring {}='{}': not a valid value", name, value);
            None
        }
    }
}

fn read_env<T: FromStr>(name: &str, default: T) -> T {
    env_string(name)
        .and_then(|v| parse_or_warn(name, &v))
        .unwrap_or(default)
}

fn read_env_bool(name: &str, default: bool) -> bool {
    env_string(name)
        .and_then(|v| match v.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Some(true),
            "0" | "false" | "no" | "off" => Some(false),
            other => {
                log::warn!("Ignoring {}='{}': expected a boolean", name, other);
                None
            }
        })
        .unwrap_or(default)
}
