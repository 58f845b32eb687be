//! Frame-clocked capture sequencing.
//!
//! Phase is derived from the frame index alone, so a capture run produces the
//! same image sequence on any machine regardless of how long a frame takes.

use crate::easing::CYCLE;
use crate::types::{MotionLaw, PresentationMode};
use crate::Result;
use std::path::{Path, PathBuf};

/// Sequencer output for one frame index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaptureStep {
    pub phase: f64,
    pub is_terminal: bool,
}

/// Map a frame index to its phase and decide whether the run is over.
pub fn sequence(frame_index: u32, cycle_frame_count: u32, end_frame_index: u32) -> CaptureStep {
    let cycle = cycle_frame_count.max(1);
    CaptureStep {
        phase: (frame_index % cycle) as f64 / cycle as f64 * CYCLE,
        is_terminal: frame_index >= end_frame_index,
    }
}

/// One frame the capture run should render and persist.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaptureFrame {
    pub frame_index: u32,
    pub phase: f64,
}

impl CaptureFrame {
    /// 1-based number used in the file name.
    pub fn number(&self) -> u32 {
        self.frame_index + 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureState {
    frame_index: u32,
    cycle_frame_count: u32,
    end_frame_index: u32,
}

impl CaptureState {
    pub fn new(cycle_frame_count: u32, end_frame_index: u32) -> Self {
        Self {
            frame_index: 0,
            cycle_frame_count: cycle_frame_count.max(1),
            end_frame_index,
        }
    }

    pub fn frame_index(&self) -> u32 {
        self.frame_index
    }

    pub fn cycle_frame_count(&self) -> u32 {
        self.cycle_frame_count
    }

    pub fn end_frame_index(&self) -> u32 {
        self.end_frame_index
    }

    pub fn is_finished(&self) -> bool {
        self.frame_index >= self.end_frame_index
    }

    /// Completed motion cycles so far.
    pub fn loop_count(&self) -> u64 {
        (self.frame_index / self.cycle_frame_count) as u64
    }

    /// The frame at the current index and the state that follows it, or
    /// `None` once the run is over.
    #[must_use]
    pub fn step(self) -> Option<(CaptureFrame, CaptureState)> {
        let step = sequence(self.frame_index, self.cycle_frame_count, self.end_frame_index);
        if step.is_terminal {
            return None;
        }
        let frame = CaptureFrame {
            frame_index: self.frame_index,
            phase: step.phase,
        };
        let next = CaptureState {
            frame_index: self.frame_index + 1,
            ..self
        };
        Some((frame, next))
    }
}

/// Output file name for a captured frame, e.g. `Linear_Stillness_007.png`.
pub fn file_name(law: MotionLaw, mode: PresentationMode, frame_number: u32) -> String {
    format!("{}_{}_{:03}.png", law, mode, frame_number)
}

/// Where the frames of one capture run are written.
#[derive(Debug, Clone, PartialEq)]
pub struct CapturePaths {
    folder: PathBuf,
    law: MotionLaw,
    mode: PresentationMode,
}

impl CapturePaths {
    /// Frames go under `{root}/{law}/{mode}`.
    pub fn new(root: impl AsRef<Path>, law: MotionLaw, mode: PresentationMode) -> Self {
        Self {
            folder: root.as_ref().join(law.name()).join(mode.name()),
            law,
            mode,
        }
    }

    pub fn folder(&self) -> &Path {
        &self.folder
    }

    pub fn create_folder(&self) -> Result<()> {
        std::fs::create_dir_all(&self.folder)?;
        Ok(())
    }

    pub fn path_for(&self, frame_number: u32) -> PathBuf {
        self.folder.join(file_name(self.law, self.mode, frame_number))
    }
}
