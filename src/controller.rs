use crate::capture::CaptureState;
use crate::config::SessionConfig;
use crate::easing;
use crate::geometry::{Geometry, Vec3};
use crate::motion::MotionState;
use crate::presentation;
use crate::protocol::DEFAULT_AMPLITUDE;
use crate::types::{ActiveLayers, Completion, FrameOutput};
use crate::Result;

/// Execution mode and its clock, chosen once per session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ModeState {
    /// Wall-clock driven.
    Live(MotionState),
    /// Frame-clocked.
    Capture(CaptureState),
}

#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    Frame(FrameOutput),
    Finished(Completion),
}

/// Per-frame motion and presentation state machine.
///
/// Holds no I/O. Each [`tick`](Controller::tick) turns the elapsed time and
/// the current amplitude into a [`FrameOutput`] for the host to apply.
#[derive(Debug, Clone)]
pub struct Controller {
    config: SessionConfig,
    geometry: Geometry,
    state: ModeState,
    frames: u64,
    completion: Option<Completion>,
}

impl Controller {
    /// Build a controller whose baseline is centred on `center` along `move_dir`.
    pub fn new(config: SessionConfig, center: Vec3, move_dir: Vec3) -> Result<Controller> {
        config.validate()?;
        let geometry = Geometry::new(center, move_dir, config.distance)?;
        let state = if config.capture_mode {
            ModeState::Capture(CaptureState::new(
                config.cycle_frame_count,
                config.end_frame_index,
            ))
        } else {
            ModeState::Live(MotionState::new())
        };

        Ok(Controller {
            config,
            geometry,
            state,
            frames: 0,
            completion: None,
        })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn state(&self) -> &ModeState {
        &self.state
    }

    pub fn active_layers(&self) -> ActiveLayers {
        ActiveLayers::for_mode(self.config.presentation_mode)
    }

    pub fn completion(&self) -> Option<Completion> {
        self.completion
    }

    pub fn is_finished(&self) -> bool {
        self.completion.is_some()
    }

    /// End the session at the next tick boundary.
    pub fn stop(&mut self) {
        if self.completion.is_none() {
            self.completion = Some(Completion::Stopped);
        }
    }

    /// Advance one frame.
    ///
    /// `dt` is ignored in capture mode. `amplitude` is clamped to [0, 1];
    /// a non-finite value falls back to the neutral default.
    pub fn tick(&mut self, dt: f64, amplitude: f64) -> TickOutcome {
        if let Some(done) = self.completion {
            return TickOutcome::Finished(done);
        }
        let amplitude = if amplitude.is_finite() {
            amplitude.clamp(0.0, 1.0)
        } else {
            DEFAULT_AMPLITUDE
        };

        match self.state {
            ModeState::Live(motion) => {
                let motion = motion.step(dt, self.config.speed);
                self.state = ModeState::Live(motion);

                let output = self.publish(
                    motion.elapsed_time(),
                    motion.loop_count(),
                    motion.phase(),
                    amplitude,
                    None,
                );
                if let Some(max) = self.config.max_loops {
                    if motion.loop_count() >= max {
                        log::info!("Loop limit reached after {} loops", motion.loop_count());
                        self.completion = Some(Completion::LoopLimit);
                    }
                }
                TickOutcome::Frame(output)
            }
            ModeState::Capture(capture) => {
                let Some((frame, next)) = capture.step() else {
                    log::info!("Capture complete: {} frames", capture.frame_index());
                    self.completion = Some(Completion::CaptureComplete);
                    return TickOutcome::Finished(Completion::CaptureComplete);
                };
                self.state = ModeState::Capture(next);

                let elapsed_time = frame.frame_index as f64 * easing::CYCLE
                    / capture.cycle_frame_count() as f64;
                TickOutcome::Frame(self.publish(
                    elapsed_time,
                    capture.loop_count(),
                    frame.phase,
                    amplitude,
                    Some(frame.number()),
                ))
            }
        }
    }

    fn publish(
        &mut self,
        elapsed_time: f64,
        loop_count: u64,
        phase: f64,
        amplitude: f64,
        capture_frame: Option<u32>,
    ) -> FrameOutput {
        let ease = easing::ease(self.config.motion_law, phase);
        let position = self.geometry.position(ease);
        let mix = presentation::mix(
            self.config.presentation_mode,
            &self.geometry,
            position,
            amplitude,
        );
        self.frames += 1;

        log::trace!(
            "frame {} phase={:.4} ease={:.4} amp={:.3} ratio={:?}",
            self.frames,
            phase,
            ease,
            amplitude,
            mix.ratio
        );

        FrameOutput {
            frame: self.frames,
            elapsed_time,
            loop_count,
            phase,
            ease,
            position,
            amplitude,
            ratio: mix.ratio,
            opacities: mix.opacities,
            capture_frame,
        }
    }
}
