use super::mapper::CoordinateMapper;
use super::palette::{
    body_pen, color_slot, AVERAGE_BONE_PEN, INFERRED_BONE_PEN, INFERRED_JOINT_BRUSH,
    JOINT_RADIUS, TRACKED_JOINT_BRUSH,
};
use k2k_common::events::{
    Brush, ConfidencePolicy, DisplaySpace, DrawPrimitive, Pen, PersonPrimitives, Point2,
    RenderFrame, RenderOptions, ViewMode,
};
use k2k_common::model::{CameraSpacePoint, Joint, Person, Perspective, Skeleton, TrackingState, BONES};

/// Depth used in place of a negative Z before depth-space mapping
pub const NEGATIVE_DEPTH_CLAMP: f32 = 0.1;

/// Projects skeletons into draw primitives for one set of render options
pub struct Projector<'a> {
    mapper: &'a dyn CoordinateMapper,
    options: RenderOptions,
}

impl<'a> Projector<'a> {
    pub fn new(mapper: &'a dyn CoordinateMapper, options: RenderOptions) -> Self {
        Self { mapper, options }
    }

    /// Map a camera-space position into the display space
    ///
    /// Returns `None` when the color mapping has no projection for the point.
    pub fn project(&self, position: CameraSpacePoint) -> Option<Point2> {
        match self.options.display_space {
            DisplaySpace::Depth => {
                let mut position = position;
                if position.z < 0.0 {
                    position.z = NEGATIVE_DEPTH_CLAMP;
                }
                Some(self.mapper.camera_to_depth_space(position))
            }
            DisplaySpace::Color => {
                let mut point = self.mapper.camera_to_color_space(position);
                if point.x.is_infinite() {
                    point.x = 0.0;
                }
                if point.y.is_infinite() {
                    point.y = 0.0;
                }
                if point.x == 0.0 && point.y == 0.0 {
                    None
                } else {
                    Some(point)
                }
            }
        }
    }

    /// Render every person of a perspective
    pub fn render(&self, perspective_name: &str, timestamp: u64, perspective: &Perspective) -> RenderFrame {
        let people = perspective
            .people
            .iter()
            .enumerate()
            .map(|(index, person)| self.draw_person(index, person))
            .collect();

        RenderFrame {
            timestamp,
            perspective: perspective_name.to_string(),
            people,
        }
    }

    /// Render one person: per-camera skeletons (unless average-only), then the average
    pub fn draw_person(&self, index: usize, person: &Person) -> PersonPrimitives {
        let mut primitives = Vec::new();
        let person_pen = body_pen(index);

        match self.options.view_mode {
            ViewMode::All => {
                for skeleton in person.skeletons.values() {
                    self.draw_skeleton(skeleton, person_pen, &mut primitives);
                }
                self.draw_skeleton(&person.average_skeleton, AVERAGE_BONE_PEN, &mut primitives);
            }
            ViewMode::AverageOnly => {
                self.draw_skeleton(&person.average_skeleton, person_pen, &mut primitives);
            }
        }

        PersonPrimitives {
            color_index: color_slot(index),
            primitives,
        }
    }

    /// Bones first, then joints
    pub fn draw_skeleton(&self, skeleton: &Skeleton, bone_pen: Pen, out: &mut Vec<DrawPrimitive>) {
        for (start, end) in BONES.iter() {
            let (Some(a), Some(b)) = (skeleton.get(*start), skeleton.get(*end)) else {
                continue;
            };
            let Some(pen) = self.bone_pen(a, b, bone_pen) else {
                continue;
            };
            let (Some(from), Some(to)) = (self.project(a.position), self.project(b.position)) else {
                continue;
            };
            out.push(DrawPrimitive::Line { from, to, pen });
        }

        for (_, joint) in skeleton.joints() {
            let Some(brush) = self.joint_brush(joint) else {
                continue;
            };
            if let Some(center) = self.project(joint.position) {
                out.push(DrawPrimitive::Circle {
                    center,
                    radius: JOINT_RADIUS,
                    brush,
                });
            }
        }
    }

    /// Pen for a bone, or `None` if the active policy rejects it
    fn bone_pen(&self, a: &Joint, b: &Joint, tracked_pen: Pen) -> Option<Pen> {
        let both_tracked =
            a.tracking_state == TrackingState::Tracked && b.tracking_state == TrackingState::Tracked;

        match self.options.confidence {
            ConfidencePolicy::Lenient => {
                if a.tracking_state == TrackingState::NotTracked
                    || b.tracking_state == TrackingState::NotTracked
                {
                    None
                } else if both_tracked {
                    Some(tracked_pen)
                } else {
                    Some(INFERRED_BONE_PEN)
                }
            }
            ConfidencePolicy::Strict => both_tracked.then_some(tracked_pen),
        }
    }

    fn joint_brush(&self, joint: &Joint) -> Option<Brush> {
        match (self.options.confidence, joint.tracking_state) {
            (_, TrackingState::Tracked) => Some(TRACKED_JOINT_BRUSH),
            (ConfidencePolicy::Lenient, TrackingState::Inferred) => Some(INFERRED_JOINT_BRUSH),
            _ => None,
        }
    }
}
