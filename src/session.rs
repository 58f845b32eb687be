use crate::capture::CapturePaths;
use crate::config::{SensorConfig, SessionConfig};
use crate::controller::{Controller, TickOutcome};
use crate::geometry::Vec3;
use crate::protocol::DEFAULT_AMPLITUDE;
use crate::sensor::AmplitudeChannel;
use crate::sink::{RenderSink, ScreenshotSink};
use crate::types::{Completion, FrameOutput};
use crate::{ParallaxError, Result};

/// Result of one [`Session::step`].
#[derive(Debug)]
pub enum Step {
    /// A frame was published. `warning` carries a non-fatal sink failure;
    /// the session state advanced regardless.
    Frame {
        output: FrameOutput,
        warning: Option<ParallaxError>,
    },
    Finished(Completion),
}

/// Collects everything a session needs and checks it before the first tick.
pub struct SessionBuilder {
    config: SessionConfig,
    viewpoint: Option<(Vec3, Vec3)>,
    render: Option<Box<dyn RenderSink>>,
    screenshots: Option<Box<dyn ScreenshotSink>>,
    sensor: Option<SensorConfig>,
    channel: Option<AmplitudeChannel>,
}

impl SessionBuilder {
    /// Initial viewpoint position and its rightward axis.
    pub fn viewpoint(mut self, center: Vec3, move_dir: Vec3) -> Self {
        self.viewpoint = Some((center, move_dir));
        self
    }

    pub fn render_sink(mut self, sink: impl RenderSink + 'static) -> Self {
        self.render = Some(Box::new(sink));
        self
    }

    pub fn screenshot_sink(mut self, sink: impl ScreenshotSink + 'static) -> Self {
        self.screenshots = Some(Box::new(sink));
        self
    }

    /// Open a serial sensor at build time. If it cannot be opened the
    /// session runs with the neutral amplitude.
    pub fn sensor(mut self, config: SensorConfig) -> Self {
        self.sensor = Some(config);
        self
    }

    /// Use an already running amplitude channel.
    pub fn amplitude_channel(mut self, channel: AmplitudeChannel) -> Self {
        self.channel = Some(channel);
        self
    }

    pub fn build(self) -> Result<Session> {
        self.config.validate()?;
        if let Some(sensor) = &self.sensor {
            sensor.validate()?;
        }
        let (center, move_dir) = self
            .viewpoint
            .ok_or(ParallaxError::MissingCollaborator("viewpoint"))?;
        let mut render = self
            .render
            .ok_or(ParallaxError::MissingCollaborator("render sink"))?;

        let capture = if self.config.capture_mode {
            let screenshots = self
                .screenshots
                .ok_or(ParallaxError::MissingCollaborator("screenshot sink"))?;
            let paths = CapturePaths::new(
                &self.config.capture_root,
                self.config.motion_law,
                self.config.presentation_mode,
            );
            Some((paths, screenshots))
        } else {
            None
        };

        let controller = Controller::new(self.config, center, move_dir)?;
        if let Some((paths, _)) = &capture {
            paths.create_folder()?;
        }

        let channel = match (self.channel, self.sensor) {
            (Some(channel), _) => Some(channel),
            (None, Some(sensor)) => match AmplitudeChannel::open(&sensor) {
                Ok(channel) => Some(channel),
                Err(e) => {
                    log::warn!(
                        "Sensor on '{}' unavailable ({}), amplitude fixed at {}",
                        sensor.port,
                        e,
                        DEFAULT_AMPLITUDE
                    );
                    None
                }
            },
            (None, None) => None,
        };

        let geometry = *controller.geometry();
        render.set_active_layers(controller.active_layers());
        render.place_reference_views(geometry.left_limit(), geometry.right_limit());
        render.set_viewpoint(geometry.left_limit());

        let config = controller.config();
        log::info!(
            "Session started: law={} mode={} distance={} speed={} capture={} sensor={}",
            config.motion_law,
            config.presentation_mode,
            config.distance,
            config.speed,
            config.capture_mode,
            channel.is_some()
        );

        Ok(Session {
            controller,
            render,
            capture,
            channel,
        })
    }
}

/// A running stimulus session.
///
/// Owns the controller, the host sinks and the optional sensor channel. The
/// host calls [`step`](Session::step) once per rendered frame.
pub struct Session {
    controller: Controller,
    render: Box<dyn RenderSink>,
    capture: Option<(CapturePaths, Box<dyn ScreenshotSink>)>,
    channel: Option<AmplitudeChannel>,
}

impl Session {
    pub fn builder(config: SessionConfig) -> SessionBuilder {
        SessionBuilder {
            config,
            viewpoint: None,
            render: None,
            screenshots: None,
            sensor: None,
            channel: None,
        }
    }

    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    pub fn has_sensor(&self) -> bool {
        self.channel.is_some()
    }

    pub fn capture_paths(&self) -> Option<&CapturePaths> {
        self.capture.as_ref().map(|(paths, _)| paths)
    }

    /// Run one tick: read the amplitude, advance the controller, and push the
    /// result to the sinks.
    pub fn step(&mut self, dt: f64) -> Step {
        let amplitude = match self.channel.as_mut() {
            Some(channel) => channel.amplitude(),
            None => DEFAULT_AMPLITUDE,
        };

        let output = match self.controller.tick(dt, amplitude) {
            TickOutcome::Frame(output) => output,
            TickOutcome::Finished(done) => {
                self.release_sensor();
                return Step::Finished(done);
            }
        };

        self.render.set_viewpoint(output.position);
        if let Some(o) = output.opacities {
            self.render.set_left_opacity(o.left);
            self.render.set_right_opacity(o.right);
        }

        let mut warning = None;
        if let (Some(number), Some((paths, screenshots))) =
            (output.capture_frame, self.capture.as_mut())
        {
            let path = paths.path_for(number);
            if let Err(source) = screenshots.capture(&path) {
                log::warn!("Screenshot {} failed: {}", path.display(), source);
                warning = Some(ParallaxError::Screenshot { path, source });
            }
        }

        Step::Frame { output, warning }
    }

    /// Step with a fixed `dt` until the session finishes.
    ///
    /// A live session without a loop limit only finishes through
    /// [`stop`](Session::stop), so the callback returns `false` to stop.
    pub fn run(
        &mut self,
        dt: f64,
        mut on_frame: impl FnMut(&FrameOutput, Option<&ParallaxError>) -> bool,
    ) -> Completion {
        loop {
            match self.step(dt) {
                Step::Frame { output, warning } => {
                    if !on_frame(&output, warning.as_ref()) {
                        self.stop();
                    }
                }
                Step::Finished(done) => return done,
            }
        }
    }

    /// Request an external stop. The next step reports `Completion::Stopped`.
    pub fn stop(&mut self) {
        self.controller.stop();
        self.release_sensor();
    }

    fn release_sensor(&mut self) {
        if let Some(channel) = self.channel.take() {
            channel.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ActiveLayers, MotionLaw, PresentationMode};
    use std::io;
    use std::path::{Path, PathBuf};
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Layers(ActiveLayers),
        References(Vec3, Vec3),
        Viewpoint(Vec3),
        Left(f64),
        Right(f64),
    }

    #[derive(Clone, Default)]
    struct Recorder(Arc<Mutex<Vec<Call>>>);

    impl Recorder {
        fn calls(&self) -> Vec<Call> {
            self.0.lock().unwrap().clone()
        }
    }

    impl RenderSink for Recorder {
        fn set_active_layers(&mut self, layers: ActiveLayers) {
            self.0.lock().unwrap().push(Call::Layers(layers));
        }
        fn place_reference_views(&mut self, left: Vec3, right: Vec3) {
            self.0.lock().unwrap().push(Call::References(left, right));
        }
        fn set_viewpoint(&mut self, position: Vec3) {
            self.0.lock().unwrap().push(Call::Viewpoint(position));
        }
        fn set_left_opacity(&mut self, alpha: f64) {
            self.0.lock().unwrap().push(Call::Left(alpha));
        }
        fn set_right_opacity(&mut self, alpha: f64) {
            self.0.lock().unwrap().push(Call::Right(alpha));
        }
    }

    #[derive(Clone, Default)]
    struct Shots {
        paths: Arc<Mutex<Vec<PathBuf>>>,
        fail_on: Option<u32>,
    }

    impl ScreenshotSink for Shots {
        fn capture(&mut self, path: &Path) -> io::Result<()> {
            let mut paths = self.paths.lock().unwrap();
            paths.push(path.to_path_buf());
            if Some(paths.len() as u32) == self.fail_on {
                return Err(io::Error::new(io::ErrorKind::Other, "disk full"));
            }
            Ok(())
        }
    }

    fn capture_config(dir: &str) -> SessionConfig {
        SessionConfig {
            capture_mode: true,
            cycle_frame_count: 120,
            end_frame_index: 240,
            distance: 0.02,
            capture_root: std::env::temp_dir().join(format!(
                "parallax-{}-{}",
                dir,
                std::process::id()
            )),
            ..Default::default()
        }
    }

    #[test]
    fn missing_collaborators_are_fatal() {
        let err = Session::builder(SessionConfig::default())
            .render_sink(Recorder::default())
            .build()
            .err()
            .unwrap();
        assert!(matches!(err, ParallaxError::MissingCollaborator("viewpoint")));

        let err = Session::builder(SessionConfig::default())
            .viewpoint(Vec3::ZERO, Vec3::X)
            .build()
            .err()
            .unwrap();
        assert!(matches!(err, ParallaxError::MissingCollaborator("render sink")));

        let err = Session::builder(capture_config("missing"))
            .viewpoint(Vec3::ZERO, Vec3::X)
            .render_sink(Recorder::default())
            .build()
            .err()
            .unwrap();
        assert!(matches!(err, ParallaxError::MissingCollaborator("screenshot sink")));
    }

    #[test]
    fn start_configures_render_host() {
        let render = Recorder::default();
        let config = SessionConfig {
            presentation_mode: PresentationMode::Stillness,
            ..Default::default()
        };
        let session = Session::builder(config)
            .viewpoint(Vec3::new(0.0, 1.0, 0.0), Vec3::X)
            .render_sink(render.clone())
            .build()
            .unwrap();

        let g = *session.controller().geometry();
        assert_eq!(
            render.calls(),
            vec![
                Call::Layers(ActiveLayers::all()),
                Call::References(g.left_limit(), g.right_limit()),
                Call::Viewpoint(g.left_limit()),
            ]
        );
        assert!(!session.has_sensor());
    }

    #[test]
    fn live_tick_reaches_right_limit() {
        let render = Recorder::default();
        let config = SessionConfig {
            distance: 0.02,
            speed: 1.0,
            motion_law: MotionLaw::Linear,
            presentation_mode: PresentationMode::LuminanceMixing,
            ..Default::default()
        };
        let mut session = Session::builder(config)
            .viewpoint(Vec3::ZERO, Vec3::X)
            .render_sink(render.clone())
            .build()
            .unwrap();

        let Step::Frame { output, warning } = session.step(1.0) else {
            panic!("expected a frame");
        };
        assert!(warning.is_none());
        let right = session.controller().geometry().right_limit();
        assert_eq!(output.position, right);
        assert_eq!(
            render.calls()[3..].to_vec(),
            vec![Call::Viewpoint(right), Call::Left(0.0), Call::Right(1.0)]
        );
    }

    #[test]
    fn capture_writes_exactly_end_frame_files() {
        let shots = Shots::default();
        let mut session = Session::builder(capture_config("full"))
            .viewpoint(Vec3::ZERO, Vec3::X)
            .render_sink(Recorder::default())
            .screenshot_sink(shots.clone())
            .build()
            .unwrap();
        let folder = session.capture_paths().unwrap().folder().to_path_buf();
        assert!(folder.ends_with("Linear/Continuity"));
        assert!(folder.is_dir());

        let done = session.run(1.0 / 60.0, |_, warning| {
            assert!(warning.is_none());
            true
        });
        assert_eq!(done, Completion::CaptureComplete);
        assert!(matches!(
            session.step(1.0 / 60.0),
            Step::Finished(Completion::CaptureComplete)
        ));

        let paths = shots.paths.lock().unwrap();
        assert_eq!(paths.len(), 240);
        assert_eq!(paths[0], folder.join("Linear_Continuity_001.png"));
        assert_eq!(paths[239], folder.join("Linear_Continuity_240.png"));
        drop(paths);
        let _ = std::fs::remove_dir_all(folder.parent().unwrap().parent().unwrap());
    }

    #[test]
    fn screenshot_failure_is_a_warning() {
        let shots = Shots {
            fail_on: Some(2),
            ..Default::default()
        };
        let config = SessionConfig {
            end_frame_index: 3,
            ..capture_config("warn")
        };
        let mut session = Session::builder(config)
            .viewpoint(Vec3::ZERO, Vec3::X)
            .render_sink(Recorder::default())
            .screenshot_sink(shots.clone())
            .build()
            .unwrap();

        let mut warnings = 0;
        let mut numbers = Vec::new();
        let done = session.run(0.0, |output, warning| {
            numbers.push(output.capture_frame.unwrap());
            if let Some(ParallaxError::Screenshot { path, .. }) = warning {
                assert!(path.ends_with("Linear_Continuity_002.png"));
                warnings += 1;
            }
            true
        });
        assert_eq!(done, Completion::CaptureComplete);
        assert_eq!(warnings, 1);
        assert_eq!(numbers, vec![1, 2, 3]);
        let root = session.controller().config().capture_root.clone();
        let _ = std::fs::remove_dir_all(root);
    }

    #[test]
    fn unreachable_sensor_degrades_to_default() {
        let mut session = Session::builder(SessionConfig {
            presentation_mode: PresentationMode::LuminanceMixing,
            ..Default::default()
        })
        .viewpoint(Vec3::ZERO, Vec3::X)
        .render_sink(Recorder::default())
        .sensor(SensorConfig::new("/dev/parallax-no-such-port"))
        .build()
        .unwrap();

        assert!(!session.has_sensor());
        let Step::Frame { output, .. } = session.step(0.5) else {
            panic!("expected a frame");
        };
        assert_eq!(output.amplitude, DEFAULT_AMPLITUDE);
    }

    #[test]
    fn external_stop_ends_live_run() {
        let mut session = Session::builder(SessionConfig::default())
            .viewpoint(Vec3::ZERO, Vec3::X)
            .render_sink(Recorder::default())
            .build()
            .unwrap();

        let mut frames = 0;
        let done = session.run(1.0 / 60.0, |_, _| {
            frames += 1;
            frames < 10
        });
        assert_eq!(done, Completion::Stopped);
        assert_eq!(frames, 10);
    }

    #[test]
    fn invalid_sensor_config_is_fatal() {
        let mut sensor = SensorConfig::new("/dev/parallax-no-such-port");
        sensor.max_value = 100;
        let err = Session::builder(SessionConfig::default())
            .viewpoint(Vec3::ZERO, Vec3::X)
            .render_sink(Recorder::default())
            .sensor(sensor)
            .build()
            .err()
            .unwrap();
        assert!(matches!(
            err,
            ParallaxError::InvalidConfig { field: "max_value", .. }
        ));
    }

    #[test]
    fn degenerate_geometry_leaves_no_capture_folder() {
        let config = capture_config("degenerate");
        let root = config.capture_root.clone();
        let err = Session::builder(config)
            .viewpoint(Vec3::ZERO, Vec3::ZERO)
            .render_sink(Recorder::default())
            .screenshot_sink(Shots::default())
            .build()
            .err()
            .unwrap();
        assert!(matches!(err, ParallaxError::DegenerateGeometry));
        assert!(!root.exists());
    }
}
