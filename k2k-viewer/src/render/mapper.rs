//! Camera-space to image-space coordinate mapping
//!
//! The sensor SDK normally provides this. `PinholeMapper` is a stand-in with
//! the sensor's nominal intrinsics for running without the SDK.

use k2k_common::events::Point2;
use k2k_common::model::CameraSpacePoint;

/// Maps camera-space positions to pixel coordinates
///
/// Implementations may return infinite coordinates when a point cannot be
/// mapped; the projector decides what to do with them.
pub trait CoordinateMapper: Send + Sync {
    fn camera_to_depth_space(&self, point: CameraSpacePoint) -> Point2;
    fn camera_to_color_space(&self, point: CameraSpacePoint) -> Point2;
}

/// Pinhole camera intrinsics
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intrinsics {
    pub fx: f32,
    pub fy: f32,
    pub cx: f32,
    pub cy: f32,
}

impl Intrinsics {
    fn project(&self, point: CameraSpacePoint) -> Point2 {
        if point.z == 0.0 {
            return Point2::new(f32::INFINITY, f32::INFINITY);
        }
        // Camera Y points up, image Y points down
        Point2::new(
            self.cx + self.fx * point.x / point.z,
            self.cy - self.fy * point.y / point.z,
        )
    }
}

/// Nominal depth camera (512x424)
pub const DEPTH_INTRINSICS: Intrinsics = Intrinsics {
    fx: 365.456,
    fy: 365.456,
    cx: 254.878,
    cy: 205.395,
};

/// Nominal color camera (1920x1080); the depth-to-color baseline is ignored
pub const COLOR_INTRINSICS: Intrinsics = Intrinsics {
    fx: 1081.372,
    fy: 1081.372,
    cx: 959.5,
    cy: 539.5,
};

/// SDK-free mapper using fixed intrinsics
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PinholeMapper {
    pub depth: Intrinsics,
    pub color: Intrinsics,
}

impl Default for PinholeMapper {
    fn default() -> Self {
        Self {
            depth: DEPTH_INTRINSICS,
            color: COLOR_INTRINSICS,
        }
    }
}

impl CoordinateMapper for PinholeMapper {
    fn camera_to_depth_space(&self, point: CameraSpacePoint) -> Point2 {
        self.depth.project(point)
    }

    fn camera_to_color_space(&self, point: CameraSpacePoint) -> Point2 {
        self.color.project(point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optical_axis_hits_principal_point() {
        let mapper = PinholeMapper::default();
        let p = mapper.camera_to_depth_space(CameraSpacePoint::new(0.0, 0.0, 2.0));
        assert_eq!(p, Point2::new(DEPTH_INTRINSICS.cx, DEPTH_INTRINSICS.cy));
    }

    #[test]
    fn test_up_is_smaller_image_y() {
        let mapper = PinholeMapper::default();
        let p = mapper.camera_to_color_space(CameraSpacePoint::new(0.5, 0.5, 2.0));
        assert!(p.x > COLOR_INTRINSICS.cx);
        assert!(p.y < COLOR_INTRINSICS.cy);
    }

    #[test]
    fn test_zero_depth_maps_to_infinity() {
        let mapper = PinholeMapper::default();
        let p = mapper.camera_to_color_space(CameraSpacePoint::new(0.1, 0.1, 0.0));
        assert!(p.x.is_infinite() && p.y.is_infinite());
    }
}
