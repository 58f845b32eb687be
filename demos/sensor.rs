//! Print the smoothed sensor amplitude at ~60 Hz.
//!
//! Usage: PARALLAX_SERIAL_PORT=/dev/ttyUSB0 cargo run --example sensor
//! Press Ctrl+C to stop.

use parallax::{AmplitudeChannel, SensorConfig};
use std::time::{Duration, Instant};

fn main() {
    env_logger::init();

    let Some(config) = SensorConfig::from_env() else {
        eprintln!("Set PARALLAX_SERIAL_PORT to the sensor's port");
        std::process::exit(1);
    };

    let mut channel = match AmplitudeChannel::open(&config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to open {}: {}", config.port, e);
            std::process::exit(1);
        }
    };

    println!(
        "Reading {} @ {} baud (threshold={} max={})",
        config.port, config.baud_rate, config.threshold, config.max_value
    );

    let frame = Duration::from_secs_f64(1.0 / 60.0);
    let start = Instant::now();
    let mut ticks: u64 = 0;

    while channel.is_connected() {
        let amplitude = channel.amplitude();
        ticks += 1;

        // Print every ~10th tick to keep the terminal readable
        if ticks % 10 == 1 {
            println!(
                "t={:>7.2}s  raw={:>5}  amplitude={:.3}  samples={}",
                start.elapsed().as_secs_f64(),
                channel
                    .raw_value()
                    .map_or_else(|| "-".to_string(), |v| v.to_string()),
                amplitude,
                channel.sample_count()
            );
        }
        std::thread::sleep(frame);
    }

    eprintln!("Sensor disconnected after {} samples", channel.sample_count());
}
