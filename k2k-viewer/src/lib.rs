//! k2k-viewer library interface
//!
//! Viewer core for a multi-camera skeletal tracking rig: talks to the
//! tracking server, drives the session state machine and turns fused
//! skeletons into draw primitives for the host shell.

pub mod console;
pub mod protocol;
pub mod render;
pub mod session;
pub mod view;

pub use protocol::{Endpoint, HttpTrackerClient, SimpleResponse, TrackerClient, TrackingPoll};
pub use session::{SessionConfig, TrackingSession};
