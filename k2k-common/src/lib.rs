//! # K2K Common Library
//!
//! Shared code for the K2K viewer crates including:
//! - Tracking data model (joints, skeletons, perspectives, calibration status)
//! - Event types (TrackerEvent enum) and the ordered event sink
//! - Error taxonomy
//! - Configuration loading

pub mod config;
pub mod error;
pub mod events;
pub mod model;

pub use error::{Error, Result};
