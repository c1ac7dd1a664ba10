//! Session lifecycle type definitions

use serde::{Deserialize, Serialize};
use std::fmt;

/// Externally visible phase of the tracking session
///
/// `Starting` and `Stopping` are request-in-flight phases; the others are
/// loop phases. `Paused` overlays `Calibrating` or `Tracking`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    #[default]
    Idle,
    Starting,
    Calibrating,
    Tracking,
    Paused,
    Stopping,
}

impl SessionPhase {
    /// True while a polling loop is running (paused or not)
    pub fn is_polling(&self) -> bool {
        matches!(
            self,
            SessionPhase::Calibrating | SessionPhase::Tracking | SessionPhase::Paused
        )
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionPhase::Idle => write!(f, "Idle"),
            SessionPhase::Starting => write!(f, "Starting"),
            SessionPhase::Calibrating => write!(f, "Calibrating"),
            SessionPhase::Tracking => write!(f, "Tracking"),
            SessionPhase::Paused => write!(f, "Paused"),
            SessionPhase::Stopping => write!(f, "Stopping"),
        }
    }
}
