//! Calibration progress reported by the server

use serde::{Deserialize, Serialize};
use std::fmt;

/// One calibration poll answer
///
/// Transient: produced once per poll and never retained by the controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CalibrationStatus {
    /// Server is still collecting calibration frames from the clients
    AcquiringFrames {
        /// Frames needed in total
        required: u32,
        /// Frames still missing
        remaining: u32,
        /// Client-side acquisition problem, if the server reported one
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    /// All frames acquired; server is solving the camera alignment
    ResolvingFrames,
    /// Calibration done, tracking may start
    Finished,
}

impl CalibrationStatus {
    pub fn is_finished(&self) -> bool {
        matches!(self, CalibrationStatus::Finished)
    }
}

impl fmt::Display for CalibrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CalibrationStatus::AcquiringFrames {
                required,
                remaining,
                error: None,
            } => write!(
                f,
                "Acquiring calibration frames: {} of {} remaining",
                remaining, required
            ),
            CalibrationStatus::AcquiringFrames {
                required,
                remaining,
                error: Some(err),
            } => write!(
                f,
                "Acquiring calibration frames: {} of {} remaining (error: {})",
                remaining, required, err
            ),
            CalibrationStatus::ResolvingFrames => write!(f, "Resolving calibration frames"),
            CalibrationStatus::Finished => write!(f, "Calibration finished"),
        }
    }
}
