//! C FFI layer for parallax.
//!
//! Lets a game-engine host drive the controller from its own frame loop and
//! apply the returned pose and opacities to its scene. In capture mode the
//! host prepares the output folder with `px_capture_folder` and names each
//! frame with `px_capture_file_name`. Handles are opaque;
//! the generated C header is written to `include/parallax.h` by cbindgen.

use crate::capture::{self, CapturePaths};
use crate::config::{SensorConfig, SessionConfig};
use crate::controller::{Controller, TickOutcome};
use crate::easing;
use crate::error::LastError;
use crate::geometry::Vec3;
use crate::protocol::DEFAULT_AMPLITUDE;
use crate::sensor::AmplitudeChannel;
use crate::types::{MotionLaw, PresentationMode};
use crate::ParallaxError;
use std::ffi::{c_char, c_int, CStr};

static LAST_ERROR: LastError = LastError::new();

/// Opaque controller handle for C consumers.
pub struct PxController(Controller);

/// Opaque amplitude channel handle for C consumers.
pub struct PxAmplitude(AmplitudeChannel);

/// Session configuration in C-compatible layout.
#[repr(C)]
pub struct PxSessionConfig {
    /// 0 = Linear, 1 = Cosine, 2 = ArcCosine.
    pub motion_law: c_int,
    /// 0 = Continuity, 1 = LuminanceMixing, 2 = Stillness.
    pub presentation_mode: c_int,
    pub distance: f64,
    pub speed: f64,
    pub cycle_frame_count: u32,
    pub end_frame_index: u32,
    pub capture_mode: bool,
    /// 0 = no loop limit.
    pub max_loops: u64,
    /// Initial viewpoint position.
    pub center: [f64; 3],
    /// Rightward axis of the viewpoint; normalized internally.
    pub move_dir: [f64; 3],
}

/// One published frame in C-compatible layout.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct PxFrame {
    pub frame: u64,
    pub elapsed_time: f64,
    pub loop_count: u64,
    pub phase: f64,
    pub ease: f64,
    pub position: [f64; 3],
    pub amplitude: f64,
    /// False in Continuity; ratio and opacities are then zero.
    pub has_mix: bool,
    pub ratio: f64,
    pub left_opacity: f64,
    pub right_opacity: f64,
    /// 1-based frame number to capture, 0 in live mode.
    pub capture_frame: u32,
}

fn session_config(raw: &PxSessionConfig) -> Result<SessionConfig, ParallaxError> {
    let motion_law = MotionLaw::from_raw(raw.motion_law)
        .ok_or_else(|| ParallaxError::UnknownMotionLaw(raw.motion_law.to_string()))?;
    let presentation_mode = PresentationMode::from_raw(raw.presentation_mode).ok_or_else(|| {
        ParallaxError::UnknownPresentationMode(raw.presentation_mode.to_string())
    })?;
    Ok(SessionConfig {
        motion_law,
        presentation_mode,
        distance: raw.distance,
        speed: raw.speed,
        cycle_frame_count: raw.cycle_frame_count,
        end_frame_index: raw.end_frame_index,
        capture_mode: raw.capture_mode,
        max_loops: (raw.max_loops > 0).then_some(raw.max_loops),
        ..SessionConfig::default()
    })
}

/// Normalized position for `phase` under `motion_law`.
/// Returns NaN for an unknown law.
#[no_mangle]
pub extern "C" fn px_ease(motion_law: c_int, phase: f64) -> f64 {
    match MotionLaw::from_raw(motion_law) {
        Some(law) => easing::ease(law, phase),
        None => f64::NAN,
    }
}

/// Create a controller. Returns NULL on error (check px_last_error()).
///
/// # Safety
/// `config` must point to a valid `PxSessionConfig`, or be null.
#[no_mangle]
pub unsafe extern "C" fn px_controller_new(config: *const PxSessionConfig) -> *mut PxController {
    if config.is_null() {
        LAST_ERROR.set(&ParallaxError::MissingCollaborator("config"));
        return std::ptr::null_mut();
    }
    let raw = &*config;

    let result = session_config(raw)
        .and_then(|c| Controller::new(c, Vec3::from(raw.center), Vec3::from(raw.move_dir)));
    match result {
        Ok(controller) => {
            LAST_ERROR.clear();
            Box::into_raw(Box::new(PxController(controller)))
        }
        Err(e) => {
            LAST_ERROR.set(&e);
            std::ptr::null_mut()
        }
    }
}

/// Free a controller.
///
/// # Safety
/// `ctrl` must be a pointer returned by `px_controller_new`, or null.
#[no_mangle]
pub unsafe extern "C" fn px_controller_free(ctrl: *mut PxController) {
    if !ctrl.is_null() {
        drop(Box::from_raw(ctrl));
    }
}

/// Views and layers to enable (bit 0 moving, bit 1 left, bit 2 right).
///
/// # Safety
/// `ctrl` must be a valid controller pointer, or null.
#[no_mangle]
pub unsafe extern "C" fn px_controller_active_layers(ctrl: *const PxController) -> u32 {
    if ctrl.is_null() {
        return 0;
    }
    (*ctrl).0.active_layers().bits()
}

/// Left and right limits of the baseline, written as six doubles.
///
/// # Safety
/// `ctrl` must be a valid controller pointer and `out` must point to at
/// least six doubles, or either may be null.
#[no_mangle]
pub unsafe extern "C" fn px_controller_limits(ctrl: *const PxController, out: *mut f64) -> c_int {
    if ctrl.is_null() || out.is_null() {
        return -1;
    }
    let g = (*ctrl).0.geometry();
    let (l, r) = (g.left_limit(), g.right_limit());
    for (i, v) in [l.x, l.y, l.z, r.x, r.y, r.z].into_iter().enumerate() {
        out.add(i).write(v);
    }
    0
}

/// Advance one frame.
///
/// Returns 0 when a frame was written to `out`, 1 when capture completed,
/// 2 when the loop limit was reached, 3 after px_controller_stop, and -1 on
/// a null argument.
///
/// # Safety
/// `ctrl` and `out` must be valid pointers, or null.
#[no_mangle]
pub unsafe extern "C" fn px_controller_tick(
    ctrl: *mut PxController,
    dt: f64,
    amplitude: f64,
    out: *mut PxFrame,
) -> c_int {
    if ctrl.is_null() || out.is_null() {
        return -1;
    }
    let ctrl = &mut *ctrl;

    match ctrl.0.tick(dt, amplitude) {
        TickOutcome::Frame(f) => {
            let opacities = f.opacities.unwrap_or(crate::types::Opacities {
                left: 0.0,
                right: 0.0,
            });
            out.write(PxFrame {
                frame: f.frame,
                elapsed_time: f.elapsed_time,
                loop_count: f.loop_count,
                phase: f.phase,
                ease: f.ease,
                position: [f.position.x, f.position.y, f.position.z],
                amplitude: f.amplitude,
                has_mix: f.ratio.is_some(),
                ratio: f.ratio.unwrap_or(0.0),
                left_opacity: opacities.left,
                right_opacity: opacities.right,
                capture_frame: f.capture_frame.unwrap_or(0),
            });
            0
        }
        TickOutcome::Finished(done) => done as c_int + 1,
    }
}

/// Stop the controller at the next tick.
///
/// # Safety
/// `ctrl` must be a valid controller pointer, or null.
#[no_mangle]
pub unsafe extern "C" fn px_controller_stop(ctrl: *mut PxController) {
    if !ctrl.is_null() {
        (*ctrl).0.stop();
    }
}

/// Write the capture file name for `frame_number` into `buf` (NUL-terminated).
/// Returns the name length, or -1 if the arguments are invalid or `buf` is too small.
///
/// # Safety
/// `buf` must point to at least `len` writable bytes, or be null.
#[no_mangle]
pub unsafe extern "C" fn px_capture_file_name(
    motion_law: c_int,
    presentation_mode: c_int,
    frame_number: u32,
    buf: *mut c_char,
    len: usize,
) -> c_int {
    let (Some(law), Some(mode)) = (
        MotionLaw::from_raw(motion_law),
        PresentationMode::from_raw(presentation_mode),
    ) else {
        return -1;
    };
    if buf.is_null() {
        return -1;
    }
    write_c_string(&capture::file_name(law, mode, frame_number), buf, len)
}

/// Create the capture folder `{root}/{law}/{mode}` and write its path into
/// `buf` (NUL-terminated). Returns the path length, or -1 on error (check
/// px_last_error()).
///
/// # Safety
/// `root` must be a valid NUL-terminated string and `buf` must point to at
/// least `len` writable bytes, or either may be null.
#[no_mangle]
pub unsafe extern "C" fn px_capture_folder(
    root: *const c_char,
    motion_law: c_int,
    presentation_mode: c_int,
    buf: *mut c_char,
    len: usize,
) -> c_int {
    if root.is_null() || buf.is_null() {
        LAST_ERROR.set(&ParallaxError::MissingCollaborator("capture root"));
        return -1;
    }
    let law = match MotionLaw::from_raw(motion_law) {
        Some(law) => law,
        None => {
            LAST_ERROR.set(&ParallaxError::UnknownMotionLaw(motion_law.to_string()));
            return -1;
        }
    };
    let mode = match PresentationMode::from_raw(presentation_mode) {
        Some(mode) => mode,
        None => {
            LAST_ERROR.set(&ParallaxError::UnknownPresentationMode(
                presentation_mode.to_string(),
            ));
            return -1;
        }
    };

    let root = CStr::from_ptr(root).to_string_lossy().into_owned();
    let paths = CapturePaths::new(root, law, mode);
    if let Err(e) = paths.create_folder() {
        LAST_ERROR.set(&e);
        return -1;
    }
    LAST_ERROR.clear();
    write_c_string(&paths.folder().to_string_lossy(), buf, len)
}

unsafe fn write_c_string(text: &str, buf: *mut c_char, len: usize) -> c_int {
    let bytes = text.as_bytes();
    if bytes.len() + 1 > len {
        return -1;
    }
    for (i, &b) in bytes.iter().enumerate() {
        buf.add(i).write(b as c_char);
    }
    buf.add(bytes.len()).write(0);
    bytes.len() as c_int
}

/// Open a serial sensor. Returns NULL on error (check px_last_error()).
///
/// # Safety
/// `port` must be a valid NUL-terminated string, or null.
#[no_mangle]
pub unsafe extern "C" fn px_amplitude_open(
    port: *const c_char,
    baud_rate: u32,
    threshold: i64,
    max_value: i64,
) -> *mut PxAmplitude {
    if port.is_null() {
        LAST_ERROR.set(&ParallaxError::MissingCollaborator("port"));
        return std::ptr::null_mut();
    }
    let port = CStr::from_ptr(port).to_string_lossy().into_owned();
    let config = SensorConfig {
        baud_rate,
        threshold,
        max_value,
        ..SensorConfig::new(port)
    };

    match AmplitudeChannel::open(&config) {
        Ok(channel) => Box::into_raw(Box::new(PxAmplitude(channel))),
        Err(e) => {
            LAST_ERROR.set(&e);
            std::ptr::null_mut()
        }
    }
}

/// Advance the smoothing filter one tick and return the amplitude.
/// Returns the neutral default (1.0) for a null handle.
///
/// # Safety
/// `amp` must be a valid amplitude pointer, or null.
#[no_mangle]
pub unsafe extern "C" fn px_amplitude_read(amp: *mut PxAmplitude) -> f64 {
    if amp.is_null() {
        return DEFAULT_AMPLITUDE;
    }
    (*amp).0.amplitude()
}

/// Check whether the sensor device is still open.
///
/// # Safety
/// `amp` must be a valid amplitude pointer, or null.
#[no_mangle]
pub unsafe extern "C" fn px_amplitude_is_connected(amp: *const PxAmplitude) -> bool {
    if amp.is_null() {
        return false;
    }
    (*amp).0.is_connected()
}

/// Stop acquisition, release the device and free the handle.
///
/// # Safety
/// `amp` must be a pointer returned by `px_amplitude_open`, or null.
#[no_mangle]
pub unsafe extern "C" fn px_amplitude_close(amp: *mut PxAmplitude) {
    if !amp.is_null() {
        Box::from_raw(amp).0.stop();
    }
}

/// Get the last error message. Returns NULL if no error.
/// The returned pointer is valid until the next parallax API call.
#[no_mangle]
pub extern "C" fn px_last_error() -> *const c_char {
    LAST_ERROR.as_ptr()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> PxSessionConfig {
        PxSessionConfig {
            motion_law: 0,
            presentation_mode: 1,
            distance: 0.02,
            speed: 1.0,
            cycle_frame_count: 120,
            end_frame_index: 2,
            capture_mode: true,
            max_loops: 0,
            center: [0.0, 1.5, 0.0],
            move_dir: [1.0, 0.0, 0.0],
        }
    }

    #[test]
    fn test_ease_rejects_unknown_law() {
        assert_eq!(px_ease(1, 1.0), 1.0);
        assert!(px_ease(9, 1.0).is_nan());
    }

    #[test]
    fn test_controller_round_trip() {
        unsafe {
            let ctrl = px_controller_new(&config());
            assert!(!ctrl.is_null());
            assert_eq!(px_controller_active_layers(ctrl), 0b110);

            let mut limits = [0.0; 6];
            assert_eq!(px_controller_limits(ctrl, limits.as_mut_ptr()), 0);
            assert_eq!(limits, [-0.01, 1.5, 0.0, 0.01, 1.5, 0.0]);

            let mut frame = PxFrame::default();
            assert_eq!(px_controller_tick(ctrl, 0.016, 1.0, &mut frame), 0);
            assert_eq!(frame.capture_frame, 1);
            assert!(frame.has_mix);
            assert_eq!(frame.left_opacity, 1.0);
            assert_eq!(px_controller_tick(ctrl, 0.016, 1.0, &mut frame), 0);
            assert_eq!(frame.capture_frame, 2);
            assert_eq!(px_controller_tick(ctrl, 0.016, 1.0, &mut frame), 1);

            px_controller_free(ctrl);
        }
    }

    #[test]
    fn test_controller_new_reports_error() {
        let mut bad = config();
        bad.motion_law = 7;
        unsafe {
            assert!(px_controller_new(&bad).is_null());
            assert!(px_controller_new(std::ptr::null()).is_null());
        }
    }

    #[test]
    fn test_capture_file_name() {
        let mut buf = [0 as c_char; 64];
        let n = unsafe { px_capture_file_name(2, 2, 12, buf.as_mut_ptr(), buf.len()) };
        assert_eq!(n, "ArcCosine_Stillness_012.png".len() as c_int);
        let name = unsafe { CStr::from_ptr(buf.as_ptr()) };
        assert_eq!(name.to_str().unwrap(), "ArcCosine_Stillness_012.png");

        let mut small = [0 as c_char; 8];
        assert_eq!(
            unsafe { px_capture_file_name(0, 0, 1, small.as_mut_ptr(), small.len()) },
            -1
        );
    }

    #[test]
    fn test_null_amplitude_is_neutral() {
        unsafe {
            assert_eq!(px_amplitude_read(std::ptr::null_mut()), DEFAULT_AMPLITUDE);
            assert!(!px_amplitude_is_connected(std::ptr::null()));
            px_amplitude_close(std::ptr::null_mut());
        }
    }

    #[test]
    fn test_capture_folder_is_created() {
        let root = std::env::temp_dir().join(format!("parallax-ffi-{}", std::process::id()));
        let root_c = std::ffi::CString::new(root.to_string_lossy().into_owned()).unwrap();
        let mut buf = [0 as c_char; 512];

        let n = unsafe { px_capture_folder(root_c.as_ptr(), 1, 1, buf.as_mut_ptr(), buf.len()) };
        assert!(n > 0);
        let folder = unsafe { CStr::from_ptr(buf.as_ptr()) }.to_str().unwrap().to_string();
        assert!(folder.ends_with("LuminanceMixing"));
        assert!(std::path::Path::new(&folder).is_dir());
        assert_eq!(folder, root.join("Cosine").join("LuminanceMixing").to_string_lossy());

        assert_eq!(
            unsafe { px_capture_folder(root_c.as_ptr(), 5, 1, buf.as_mut_ptr(), buf.len()) },
            -1
        );
        let _ = std::fs::remove_dir_all(root);
    }
}
