// Transform utilities for Mat4
//
// Extends glam::Mat4 with the pieces an object-to-world transform needs:
// box transformation, the normal matrix, and an invertibility check.

use crate::Aabb;
use glam::{Mat3, Mat4};

/// Determinants below this are treated as singular.
const SINGULAR_EPSILON: f32 = 1.0e-12;

/// Extension trait for Mat4 to provide additional transform utilities
pub trait Mat4Ext {
    /// Transform an axis-aligned bounding box.
    /// Computes the bounding box of all 8 transformed corners.
    fn transform_aabb(&self, aabb: &Aabb) -> Aabb;

    /// Inverse-transpose of the upper 3x3 block, used to carry surface
    /// normals through non-uniform scales.
    fn normal_matrix(&self) -> Mat3;

    /// Whether the matrix can be inverted without blowing up.
    fn is_invertible(&self) -> bool;
}

impl Mat4Ext for Mat4 {
    fn transform_aabb(&self, aabb: &Aabb) -> Aabb {
        if aabb.is_empty() {
            return Aabb::EMPTY;
        }

        let corners = aabb.corners();
        let first = self.transform_point3(corners[0]);
        let (min, max) = corners[1..]
            .iter()
            .map(|&corner| self.transform_point3(corner))
            .fold((first, first), |(lo, hi), p| (lo.min(p), hi.max(p)));

        Aabb::from_points(min, max)
    }

    fn normal_matrix(&self) -> Mat3 {
        Mat3::from_mat4(*self).inverse().transpose()
    }

    fn is_invertible(&self) -> bool {
        let det = self.determinant();
        det.is_finite() && det.abs() > SINGULAR_EPSILON
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn test_transform_aabb_identity() {
        let aabb = Aabb::from_points(Vec3::ZERO, Vec3::ONE);
        let transformed = Mat4::IDENTITY.transform_aabb(&aabb);

        assert!((transformed.min() - aabb.min()).length() < 0.001);
        assert!((transformed.max() - aabb.max()).length() < 0.001);
    }

    #[test]
    fn test_transform_aabb_translation() {
        let mat = Mat4::from_translation(Vec3::new(5.0, 5.0, 5.0));
        let aabb = Aabb::from_points(Vec3::ZERO, Vec3::ONE);
        let transformed = mat.transform_aabb(&aabb);

        assert!((transformed.min() - Vec3::splat(5.0)).length() < 0.001);
        assert!((transformed.max() - Vec3::splat(6.0)).length() < 0.001);
    }

    #[test]
    fn test_transform_aabb_rotation_grows_box() {
        let mat = Mat4::from_rotation_z(std::f32::consts::FRAC_PI_4);
        let aabb = Aabb::from_points(Vec3::splat(-1.0), Vec3::splat(1.0));
        let transformed = mat.transform_aabb(&aabb);

        let expected = 2.0_f32.sqrt();
        assert!((transformed.x.max - expected).abs() < 0.001);
        assert!((transformed.z.max - 1.0).abs() < 0.001);
    }

    #[test]
    fn test_normal_matrix_non_uniform_scale() {
        // Squash a unit sphere along y: the normal at (1, 1, 0)/sqrt2 on the
        // sphere must tilt toward y after the transform.
        let mat = Mat4::from_scale(Vec3::new(1.0, 0.5, 1.0));
        let n = (mat.normal_matrix() * Vec3::new(1.0, 1.0, 0.0)).normalize();

        assert!(n.y > n.x);
    }

    #[test]
    fn test_is_invertible() {
        assert!(Mat4::IDENTITY.is_invertible());
        assert!(Mat4::from_rotation_y(1.0).is_invertible());
        assert!(!Mat4::from_scale(Vec3::new(1.0, 0.0, 1.0)).is_invertible());
    }
}
