//! Render projector
//!
//! Turns the people of one perspective into abstract draw primitives for the
//! host: project joints into depth or color pixels, filter by tracking
//! confidence, color by person.

pub mod mapper;
pub mod palette;
mod projector;

pub use mapper::{CoordinateMapper, PinholeMapper};
pub use projector::{Projector, NEGATIVE_DEPTH_CLAMP};

pub use k2k_common::events::{
    ConfidencePolicy, DisplaySpace, DrawPrimitive, PersonPrimitives, RenderFrame, RenderOptions,
    ViewMode,
};
