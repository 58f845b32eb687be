//! Dry-run a capture session: writes one placeholder file per frame so the
//! naming and termination can be checked without a renderer.
//!
//! Usage: PARALLAX_MOTION_LAW=arccos PARALLAX_END_FRAME=240 cargo run --example capture

use parallax::{ActiveLayers, Completion, RenderSink, ScreenshotSink, Session, SessionConfig, Vec3};
use std::io::Write;
use std::path::Path;

struct NullScene;

impl RenderSink for NullScene {
    fn set_active_layers(&mut self, _layers: ActiveLayers) {}
    fn place_reference_views(&mut self, _left: Vec3, _right: Vec3) {}
    fn set_viewpoint(&mut self, _position: Vec3) {}
    fn set_left_opacity(&mut self, _alpha: f64) {}
    fn set_right_opacity(&mut self, _alpha: f64) {}
}

/// Writes the frame's pose as text where the image would go.
struct PlaceholderWriter;

impl ScreenshotSink for PlaceholderWriter {
    fn capture(&mut self, path: &Path) -> std::io::Result<()> {
        let mut file = std::fs::File::create(path)?;
        writeln!(file, "placeholder for {}", path.display())
    }
}

fn main() {
    env_logger::init();

    let mut config = match SessionConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Bad configuration: {}", e);
            std::process::exit(1);
        }
    };
    config.capture_mode = true;

    let mut session = match Session::builder(config)
        .viewpoint(Vec3::ZERO, Vec3::X)
        .render_sink(NullScene)
        .screenshot_sink(PlaceholderWriter)
        .build()
    {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to start capture: {}", e);
            std::process::exit(1);
        }
    };

    if let Some(paths) = session.capture_paths() {
        println!("Writing frames to {}", paths.folder().display());
    }

    let mut written: u32 = 0;
    let mut failed: u32 = 0;
    let done = session.run(0.0, |output, warning| {
        match warning {
            Some(e) => {
                eprintln!("Frame {:?}: {}", output.capture_frame, e);
                failed += 1;
            }
            None => written += 1,
        }
        true
    });

    assert_eq!(done, Completion::CaptureComplete);
    println!("Capture complete: {} written, {} failed", written, failed);
}
