//! Perspective selection
//!
//! Picks the perspective the user is looking at out of a tracking result
//! and hands it to the projector. Results are never mutated.

use crate::render::{CoordinateMapper, Projector, RenderFrame, RenderOptions};
use k2k_common::model::{Perspective, TrackingResult};

/// Look up a perspective by name
pub fn select_perspective<'r>(result: &'r TrackingResult, name: &str) -> Option<&'r Perspective> {
    result.perspective(name)
}

/// Render the selected perspective of a result
///
/// With no view selected the alphabetically first perspective is shown.
/// Returns `None` when the named perspective is absent from the result.
pub fn render_selected(
    result: &TrackingResult,
    view: Option<&str>,
    options: RenderOptions,
    mapper: &dyn CoordinateMapper,
) -> Option<RenderFrame> {
    let name = match view {
        Some(name) => name,
        None => result.perspective_names().into_iter().next()?,
    };
    let perspective = select_perspective(result, name)?;

    Some(Projector::new(mapper, options).render(name, result.timestamp, perspective))
}
