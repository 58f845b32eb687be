use std::fmt;
use std::path::PathBuf;

/// Errors that can occur while configuring or running a stimulus session.
#[derive(Debug, thiserror::Error)]
pub enum ParallaxError {
    #[error("Serial error: {0}")]
    Serial(#[from] serialport::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration for `{field}`: {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    #[error("Missing required collaborator: {0}")]
    MissingCollaborator(&'static str),

    #[error("Unknown motion law '{0}' (expected linear|cosine|arccosine)")]
    UnknownMotionLaw(String),

    #[error("Unknown presentation mode '{0}' (expected continuity|luminancemixing|stillness)")]
    UnknownPresentationMode(String),

    #[error("Movement direction has zero length")]
    DegenerateGeometry,

    #[error("Screenshot '{}' failed: {source}", .path.display())]
    Screenshot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Sensor device closed")]
    DeviceClosed,

    #[error("Failed to spawn acquisition thread: {0}")]
    ThreadSpawn(String),

    #[error("Channel disconnected")]
    ChannelDisconnected,
}

impl ParallaxError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ParallaxError::InvalidConfig {
            field,
            reason: reason.into(),
        }
    }
}

/// Thread-safe last-error storage for the C FFI layer.
pub(crate) struct LastError {
    message: std::sync::Mutex<String>,
}

impl LastError {
    pub const fn new() -> Self {
        Self {
            message: std::sync::Mutex::new(String::new()),
        }
    }

    pub fn set(&self, err: &ParallaxError) {
        if let Ok(mut msg) = self.message.lock() {
            *msg = fmt::format(format_args!("{}\0", err));
        }
    }

    pub fn clear(&self) {
        if let Ok(mut msg) = self.message.lock() {
            msg.clear();
        }
    }

    pub fn as_ptr(&self) -> *const std::ffi::c_char {
        match self.message.lock() {
            Ok(msg) if !msg.is_empty() => msg.as_ptr() as *const std::ffi::c_char,
            _ => std::ptr::null(),
        }
    }
}
