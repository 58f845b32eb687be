//! Run a live session against a console "scene" at 60 Hz.
//!
//! Configure with PARALLAX_* variables, e.g.
//!   PARALLAX_MOTION_LAW=cosine PARALLAX_PRESENTATION=stillness \
//!   PARALLAX_SERIAL_PORT=/dev/ttyUSB0 cargo run --example live
//! Stops after PARALLAX_MAX_LOOPS cycles (default 10 here) or Ctrl+C.

use parallax::{ActiveLayers, RenderSink, Session, SessionConfig, SensorConfig, Vec3};
use std::time::{Duration, Instant};

#[derive(Default)]
struct ConsoleScene {
    viewpoint: Vec3,
    left: f64,
    right: f64,
}

impl RenderSink for ConsoleScene {
    fn set_active_layers(&mut self, layers: ActiveLayers) {
        println!("Active layers: {:?}", layers);
    }

    fn place_reference_views(&mut self, left: Vec3, right: Vec3) {
        println!("Reference views: left={:?} right={:?}", left, right);
    }

    fn set_viewpoint(&mut self, position: Vec3) {
        self.viewpoint = position;
    }

    fn set_left_opacity(&mut self, alpha: f64) {
        self.left = alpha;
    }

    fn set_right_opacity(&mut self, alpha: f64) {
        self.right = alpha;
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
    config.capture_mode = false;
    if config.max_loops.is_none() {
        config.max_loops = Some(10);
    }

    let mut builder = Session::builder(config)
        .viewpoint(Vec3::new(0.0, 1.6, 0.0), Vec3::X)
        .render_sink(ConsoleScene::default());
    if let Some(sensor) = SensorConfig::from_env() {
        builder = builder.sensor(sensor);
    }

    let mut session = match builder.build() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to start session: {}", e);
            std::process::exit(1);
        }
    };

    let frame = Duration::from_secs_f64(1.0 / 60.0);
    let mut last = Instant::now();

    loop {
        std::thread::sleep(frame);
        let now = Instant::now();
        let dt = now.duration_since(last).as_secs_f64();
        last = now;

        match session.step(dt) {
            parallax::Step::Frame { output, .. } => {
                // Print every ~15th frame
                if output.frame % 15 == 1 {
                    println!(
                        "t={:>6.2}  loop={}  phase={:.3}  x={:+.5}  amp={:.3}  ratio={}",
                        output.elapsed_time,
                        output.loop_count,
                        output.phase,
                        output.position.x,
                        output.amplitude,
                        output
                            .ratio
                            .map_or_else(|| "-".to_string(), |r| format!("{:.3}", r)),
                    );
                }
            }
            parallax::Step::Finished(done) => {
                println!("Session finished: {:?}", done);
                break;
            }
        }
    }
}
