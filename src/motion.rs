use crate::easing::{self, CYCLE};

/// Wall-clock motion state for live mode.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MotionState {
    elapsed_time: f64,
    loop_phase: u64,
    loop_count: u64,
}

impl MotionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn elapsed_time(&self) -> f64 {
        self.elapsed_time
    }

    pub fn loop_count(&self) -> u64 {
        self.loop_count
    }

    /// Position inside the current cycle, in `[0, 2)`.
    pub fn phase(&self) -> f64 {
        easing::wrap_phase(self.elapsed_time)
    }

    /// State after one tick of `dt` seconds at `speed`.
    ///
    /// Every cycle boundary crossed is counted, including several in one
    /// long tick. Negative or non-finite `dt` leaves time unchanged.
    #[must_use]
    pub fn step(self, dt: f64, speed: f64) -> MotionState {
        let advance = dt * speed;
        if !(advance.is_finite() && advance > 0.0) {
            if !advance.is_finite() || advance < 0.0 {
                log::debug!("Ignoring tick advance {} (dt={}, speed={})", advance, dt, speed);
            }
            return self;
        }

        let elapsed_time = self.elapsed_time + advance;
        let bucket = (elapsed_time / CYCLE).floor() as u64;
        let (loop_phase, loop_count) = if bucket > self.loop_phase {
            (bucket, self.loop_count + (bucket - self.loop_phase))
        } else {
            (self.loop_phase, self.loop_count)
        };

        MotionState {
            elapsed_time,
            loop_phase,
            loop_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_second_tick_reaches_half_cycle() {
        let s = MotionState::new().step(1.0, 1.0);
        assert_eq!(s.elapsed_time(), 1.0);
        assert_eq!(s.phase(), 1.0);
        assert_eq!(s.loop_count(), 0);
    }

    #[test]
    fn counts_each_boundary_once() {
        let mut s = MotionState::new();
        for _ in 0..8 {
            s = s.step(0.5, 1.0);
        }
        assert_eq!(s.elapsed_time(), 4.0);
        assert_eq!(s.loop_count(), 2);
        assert_eq!(s.phase(), 0.0);
    }

    #[test]
    fn long_tick_counts_skipped_cycles() {
        let s = MotionState::new().step(0.25, 1.0);
        let s = s.step(4.0, 1.0);
        assert_eq!(s.loop_count(), 2);
        assert!((s.phase() - 0.25).abs() < 1e-12);
    }

    #[test]
    fn speed_scales_time() {
        let s = MotionState::new().step(0.5, 4.0);
        assert_eq!(s.elapsed_time(), 2.0);
        assert_eq!(s.loop_count(), 1);
    }

    #[test]
    fn bad_advance_is_ignored() {
        let s = MotionState::new().step(1.0, 1.0);
        assert_eq!(s.step(-1.0, 1.0), s);
        assert_eq!(s.step(f64::NAN, 1.0), s);
        assert_eq!(s.step(0.0, 1.0), s);
    }
}
