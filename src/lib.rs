//! # parallax - motion controller for a binocular motion-parallax rig
//!
//! Moves a viewpoint (or cross-fades a pair of image layers) along a short
//! baseline under a periodic motion law. Provides:
//! - Three easing laws and three presentation modes
//! - Live (wall-clock) and capture (frame-clocked, reproducible) execution
//! - Serial analog-sensor amplitude with background acquisition and smoothing
//! - C FFI for hosting the controller inside a game engine
//!
//! ## Quick Start
//! ```no_run
//! use parallax::{Session, SessionConfig, SensorConfig, Step, Vec3};
//! # struct Scene;
//! # impl parallax::RenderSink for Scene {
//! #     fn set_active_layers(&mut self, _: parallax::ActiveLayers) {}
//! #     fn place_reference_views(&mut self, _: Vec3, _: Vec3) {}
//! #     fn set_viewpoint(&mut self, _: Vec3) {}
//! #     fn set_left_opacity(&mut self, _: f64) {}
//! #     fn set_right_opacity(&mut self, _: f64) {}
//! # }
//!
//! let mut session = Session::builder(SessionConfig::default())
//!     .viewpoint(Vec3::new(0.0, 1.6, 0.0), Vec3::X)
//!     .render_sink(Scene)
//!     .sensor(SensorConfig::new("/dev/ttyUSB0"))
//!     .build()
//!     .unwrap();
//!
//! while let Step::Frame { output, .. } = session.step(1.0 / 60.0) {
//!     println!("pos: {:?} ratio: {:?}", output.position, output.ratio);
//! #   break;
//! }
//! ```

pub mod error;
pub mod types;
pub mod geometry;
pub mod easing;
pub mod protocol;
pub mod config;
pub mod amplitude;
pub mod sensor;
pub mod presentation;
pub mod motion;
pub mod capture;
pub mod controller;
pub mod sink;
pub mod session;
pub mod ffi;

pub use error::ParallaxError;
pub use types::*;
pub use geometry::{Geometry, Vec3};
pub use config::{SensorConfig, SessionConfig};
pub use controller::{Controller, TickOutcome};
pub use sensor::AmplitudeChannel;
pub use sink::{RenderSink, ScreenshotSink};
pub use session::{Session, Step};

/// Result type alias for parallax operations.
pub type Result<T> = std::result::Result<T, ParallaxError>;
