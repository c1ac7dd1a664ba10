//! Event types for the K2K event channel
//!
//! The session controller is the only producer; the host shell is the only
//! consumer. A single `mpsc` channel keeps notifications in poll order.

// Sub-modules (supporting types)
mod render_types;
mod session_types;

pub use render_types::{
    Brush, Color, ConfidencePolicy, DisplaySpace, DrawPrimitive, Pen, PersonPrimitives, Point2,
    RenderFrame, RenderOptions, ViewMode,
};
pub use session_types::SessionPhase;

use crate::model::CalibrationStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Notifications from the core to the host shell
///
/// Events are serializable so a host can forward them over any transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TrackerEvent {
    /// Session phase changed
    ///
    /// Triggers:
    /// - Host: enable/disable start, pause, resume and stop controls
    PhaseChanged {
        /// Phase before change
        old_phase: SessionPhase,
        /// Phase after change
        new_phase: SessionPhase,
        /// When phase changed
        timestamp: DateTime<Utc>,
    },

    /// Human-readable progress or error line
    ///
    /// Triggers:
    /// - Host: status bar text
    Status {
        /// Text to show
        message: String,
        /// When the status was produced
        timestamp: DateTime<Utc>,
    },

    /// Calibration poll answer
    ///
    /// Always followed by a `Status` carrying the same information as text.
    CalibrationProgress {
        /// Status returned by the server
        status: CalibrationStatus,
        /// When the poll completed
        timestamp: DateTime<Utc>,
    },

    /// A tracking result rendered for the selected perspective
    ///
    /// Triggers:
    /// - Host: replace the drawing surface contents
    FrameReady {
        /// Primitives to draw
        frame: RenderFrame,
        /// When the frame was produced
        timestamp: DateTime<Utc>,
    },
}

impl TrackerEvent {
    pub fn status(message: impl Into<String>) -> Self {
        TrackerEvent::Status {
            message: message.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn phase_changed(old_phase: SessionPhase, new_phase: SessionPhase) -> Self {
        TrackerEvent::PhaseChanged {
            old_phase,
            new_phase,
            timestamp: Utc::now(),
        }
    }

    pub fn calibration(status: CalibrationStatus) -> Self {
        TrackerEvent::CalibrationProgress {
            status,
            timestamp: Utc::now(),
        }
    }

    pub fn frame(frame: RenderFrame) -> Self {
        TrackerEvent::FrameReady {
            frame,
            timestamp: Utc::now(),
        }
    }

    /// Status text, if this is a status event
    pub fn status_message(&self) -> Option<&str> {
        match self {
            TrackerEvent::Status { message, .. } => Some(message),
            _ => None,
        }
    }
}

/// Receiving half handed to the host shell
pub type EventReceiver = mpsc::Receiver<TrackerEvent>;

/// Producing half owned by the session controller
///
/// Bounded: a slow host applies backpressure to the polling loop instead of
/// growing an unbounded queue. Order is preserved.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: mpsc::Sender<TrackerEvent>,
}

impl EventSink {
    /// Creates a sink/receiver pair
    ///
    /// # Arguments
    ///
    /// * `capacity` - Number of events buffered before `emit` waits
    ///
    /// # Examples
    ///
    /// ```
    /// use k2k_common::events::EventSink;
    ///
    /// let (sink, mut rx) = EventSink::channel(64);
    /// ```
    pub fn channel(capacity: usize) -> (Self, EventReceiver) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }

    /// Deliver an event, waiting for buffer space
    ///
    /// Returns `false` if the host has dropped its receiver. That is not an
    /// error for the core: the session keeps running headless.
    pub async fn emit(&self, event: TrackerEvent) -> bool {
        match self.tx.send(event).await {
            Ok(()) => true,
            Err(_) => {
                tracing::debug!("Event receiver dropped, event discarded");
                false
            }
        }
    }

    /// Deliver an event without waiting; dropped if the buffer is full
    pub fn emit_lossy(&self, event: TrackerEvent) {
        let _ = self.tx.try_send(event);
    }

    /// True once the host has dropped its receiver
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
