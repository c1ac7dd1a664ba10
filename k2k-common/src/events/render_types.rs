//! Drawing primitives handed to the host shell
//!
//! The host decides how to realize them (retained canvas nodes or immediate
//! painting); the core only says what to draw and where.

use serde::{Deserialize, Serialize};

/// RGBA color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }
}

/// 2-D point in the chosen display space (pixels)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2 {
    pub x: f32,
    pub y: f32,
}

impl Point2 {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Stroke used for bones
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pen {
    pub color: Color,
    pub thickness: f32,
}

/// Fill used for joints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Brush {
    pub color: Color,
}

/// One thing to draw
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DrawPrimitive {
    /// A bone
    Line { from: Point2, to: Point2, pen: Pen },
    /// A joint
    Circle {
        center: Point2,
        radius: f32,
        brush: Brush,
    },
}

/// Primitives for one person, in draw order (bones before joints)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonPrimitives {
    /// Palette slot assigned to this person for the current poll
    pub color_index: usize,
    pub primitives: Vec<DrawPrimitive>,
}

/// Everything to draw for one tracking result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderFrame {
    /// Server timestamp of the source result
    pub timestamp: u64,
    /// Perspective the frame was rendered from
    pub perspective: String,
    /// One entry per person, in perspective order
    pub people: Vec<PersonPrimitives>,
}

impl RenderFrame {
    /// All primitives, person by person
    pub fn primitives(&self) -> impl Iterator<Item = &DrawPrimitive> {
        self.people.iter().flat_map(|p| p.primitives.iter())
    }

    pub fn line_count(&self) -> usize {
        self.primitives()
            .filter(|p| matches!(p, DrawPrimitive::Line { .. }))
            .count()
    }

    pub fn circle_count(&self) -> usize {
        self.primitives()
            .filter(|p| matches!(p, DrawPrimitive::Circle { .. }))
            .count()
    }
}

/// 2-D space joints are projected into
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplaySpace {
    /// Depth image pixels
    #[default]
    Depth,
    /// Color image pixels
    Color,
}

/// Which tracking states are drawable
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidencePolicy {
    /// Draw Inferred and Tracked; Inferred gets its own pen/brush
    #[default]
    Lenient,
    /// Draw Tracked only
    Strict,
}

/// Which skeletons of a person are drawn
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    /// Every per-camera skeleton plus the average skeleton
    #[default]
    All,
    /// Only the average skeleton, in the person's color
    AverageOnly,
}

/// Render settings selected by the host
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderOptions {
    #[serde(default)]
    pub display_space: DisplaySpace,
    #[serde(default)]
    pub confidence: ConfidencePolicy,
    #[serde(default)]
    pub view_mode: ViewMode,
}
