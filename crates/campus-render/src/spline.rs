//! Closed Catmull-Rom camera path.

use crate::geometry::Vec3;

/// A looped uniform Catmull-Rom spline through a list of control points.
///
/// `point_at(0.0)` is the first control point and the path returns to it at
/// `t = 1.0`.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraPath {
    points: Vec<Vec3>,
}

impl CameraPath {
    /// Returns `None` for an empty point list.
    pub fn new(points: Vec<Vec3>) -> Option<Self> {
        if points.is_empty() {
            None
        } else {
            Some(Self { points })
        }
    }

    /// Build a path that starts at control point `start`.
    pub fn rotated(mut points: Vec<Vec3>, start: usize) -> Option<Self> {
        if points.is_empty() {
            return None;
        }
        let len = points.len();
        points.rotate_left(start % len);
        Self::new(points)
    }

    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    /// Sample the path at `t`, wrapped into `[0, 1)`.
    pub fn point_at(&self, t: f64) -> Vec3 {
        let n = self.points.len();
        if n == 1 {
            return self.points[0];
        }

        let t = t.rem_euclid(1.0);
        let scaled = t * n as f64;
        let segment = (scaled.floor() as usize).min(n - 1);
        let u = scaled - segment as f64;

        let p0 = self.points[(segment + n - 1) % n];
        let p1 = self.points[segment];
        let p2 = self.points[(segment + 1) % n];
        let p3 = self.points[(segment + 2) % n];

        let u2 = u * u;
        let u3 = u2 * u;
        (p1 * 2.0
            + (p2 - p0) * u
            + (p0 * 2.0 - p1 * 5.0 + p2 * 4.0 - p3) * u2
            + (p1 * 3.0 - p0 - p2 * 3.0 + p3) * u3)
            * 0.5
    }
}
