//! Tracking data model
//!
//! In-memory representation of what the tracking server returns: calibration
//! progress, and per-perspective people with per-camera and fused skeletons.

mod calibration;
mod setup;
mod skeleton;
mod tracking;

pub use calibration::CalibrationStatus;
pub use setup::{ClientDescriptor, ClientList};
pub use skeleton::{Bone, CameraSpacePoint, Joint, JointType, Skeleton, TrackingState, BONES};
pub use tracking::{Perspective, Person, TrackingResult};
