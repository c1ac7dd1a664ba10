//! Pens, brushes and the per-person palette

use k2k_common::events::{Brush, Color, Pen};

/// Per-person colors, assigned by position in the perspective
pub const BODY_COLORS: [Color; 6] = [
    Color::rgb(255, 0, 0),     // red
    Color::rgb(255, 165, 0),   // orange
    Color::rgb(0, 128, 0),     // green
    Color::rgb(0, 0, 255),     // blue
    Color::rgb(75, 0, 130),    // indigo
    Color::rgb(238, 130, 238), // violet
];

/// Stroke width for tracked bones
pub const BONE_THICKNESS: f32 = 6.0;

/// Bones with an inferred endpoint (lenient mode only)
pub const INFERRED_BONE_PEN: Pen = Pen {
    color: Color::rgb(128, 128, 128),
    thickness: 1.0,
};

/// Average skeleton when per-camera skeletons are shown too
pub const AVERAGE_BONE_PEN: Pen = Pen {
    color: Color::rgb(255, 255, 255),
    thickness: 10.0,
};

pub const JOINT_RADIUS: f32 = 3.0;

pub const TRACKED_JOINT_BRUSH: Brush = Brush {
    color: Color::rgb(68, 192, 68),
};

pub const INFERRED_JOINT_BRUSH: Brush = Brush {
    color: Color::rgb(255, 255, 0),
};

/// Palette slot for the person at `index`
///
/// Wraps around when a perspective holds more people than colors.
pub fn color_slot(index: usize) -> usize {
    index % BODY_COLORS.len()
}

/// Bone pen for the person at `index`
pub fn body_pen(index: usize) -> Pen {
    Pen {
        color: BODY_COLORS[color_slot(index)],
        thickness: BONE_THICKNESS,
    }
}
