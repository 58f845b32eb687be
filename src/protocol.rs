use std::time::Duration;

// -- Serial link defaults --
pub const DEFAULT_BAUD_RATE: u32 = 9600;
pub const READ_TIMEOUT: Duration = Duration::from_millis(100);

// -- ADC range --
/// Readings below this are treated as silence.
pub const DEFAULT_THRESHOLD: i64 = 1200;
/// Full-scale reading of the 12-bit ADC.
pub const DEFAULT_MAX_VALUE: i64 = 4095;

// -- Amplitude filter --
pub const DEFAULT_AMPLITUDE: f64 = 1.0;
pub const SMOOTHING_ALPHA: f64 = 0.15;
/// Distance from a rail at which the filter snaps onto it.
pub const SNAP_EPSILON: f64 = 1e-3;
/// Decimal places kept in the published amplitude.
pub const PUBLISH_DECIMALS: i32 = 3;

/// Consecutive hard read errors before the device is considered lost.
pub const MAX_CONSECUTIVE_ERRORS: u32 = 20;
/// Longest record kept while waiting for its newline.
pub const MAX_RECORD_LEN: usize = 32;

/// Parse one device record (a decimal integer, surrounding whitespace allowed).
pub fn parse_record(line: &[u8]) -> Option<i64> {
    let text = std::str::from_utf8(line).ok()?;
    text.trim().parse::<i64>().ok()
}

/// Map a raw reading onto [0, 1] with a deadband below `threshold`.
///
/// `max_value` must be greater than `threshold`.
pub fn rescale(raw: i64, threshold: i64, max_value: i64) -> f64 {
    if raw < threshold {
        return 0.0;
    }
    if raw >= max_value {
        return 1.0;
    }
    ((raw - threshold) as f64 / (max_value - threshold) as f64).clamp(0.0, 1.0)
}

/// Round a filter output to the published precision.
pub fn round_published(value: f64) -> f64 {
    let scale = 10f64.powi(PUBLISH_DECIMALS);
    (value * scale).round() / scale
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_record() {
        assert_eq!(parse_record(b"2048\r\n"), Some(2048));
        assert_eq!(parse_record(b"  17 "), Some(17));
        assert_eq!(parse_record(b"20x8\n"), None);
        assert_eq!(parse_record(b"\n"), None);
        assert_eq!(parse_record(&[0xff, 0xfe, b'\n']), None);
    }

    #[test]
    fn test_rescale_deadband() {
        assert_eq!(rescale(0, 1200, 4095), 0.0);
        assert_eq!(rescale(1199, 1200, 4095), 0.0);
        assert_eq!(rescale(1200, 1200, 4095), 0.0);
        assert_eq!(rescale(4095, 1200, 4095), 1.0);
        assert_eq!(rescale(9000, 1200, 4095), 1.0);
        let mid = rescale(1200 + (4095 - 1200) / 2, 1200, 4095);
        assert!((mid - 0.5).abs() < 1e-3);
    }

    #[test]
    fn test_round_published() {
        assert_eq!(round_published(0.123456), 0.123);
        assert_eq!(round_published(0.9996), 1.0);
        assert_eq!(round_published(0.0004), 0.0);
    }
}
