//! Unit square primitive.

use prism_core::Bitmap;
use prism_math::{Aabb, Ray, Vec3};

use crate::shape::{sobel_bump, LocalHit, Shape};

/// Square in the local z = 0 plane spanning [-0.5, 0.5] in x and y.
#[derive(Debug, Clone, Copy, Default)]
pub struct Square;

impl Shape for Square {
    fn intersect_local(&self, ray: &Ray, t_min: f32) -> Option<LocalHit> {
        let p = ray.origin;
        let d = ray.direction;

        if d.z == 0.0 {
            return None;
        }

        let t = -p.z / d.z;
        if t <= t_min {
            return None;
        }

        let hit = ray.at(t);
        if hit.x < -0.5 || hit.x > 0.5 || hit.y < -0.5 || hit.y > 0.5 {
            return None;
        }

        Some(LocalHit { t, normal: Vec3::Z })
    }

    fn local_bounding_box(&self) -> Option<Aabb> {
        Some(Aabb::from_points(
            Vec3::new(-0.5, -0.5, 0.0),
            Vec3::new(0.5, 0.5, 0.0),
        ))
    }

    fn local_uv(&self, point: Vec3, _normal: Vec3) -> Option<(f32, f32)> {
        Some((point.x + 0.5, point.y + 0.5))
    }

    fn perturb_normal(&self, normal: Vec3, uv: (f32, f32), bump: &Bitmap) -> Option<Vec3> {
        Some(sobel_bump(bump, uv, normal, Vec3::X, Vec3::Y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prism_math::RAY_EPSILON;

    #[test]
    fn test_square_hit_and_uv() {
        let ray = Ray::new(Vec3::new(0.25, -0.25, 2.0), Vec3::new(0.0, 0.0, -1.0));
        let hit = Square.intersect_local(&ray, RAY_EPSILON).expect("should hit");

        assert!((hit.t - 2.0).abs() < 1e-5);
        let (u, v) = Square.local_uv(ray.at(hit.t), hit.normal).expect("has uv");
        assert!((u - 0.75).abs() < 1e-5);
        assert!((v - 0.25).abs() < 1e-5);
    }

    #[test]
    fn test_square_miss() {
        let outside = Ray::new(Vec3::new(0.75, 0.0, 2.0), Vec3::new(0.0, 0.0, -1.0));
        assert!(Square.intersect_local(&outside, RAY_EPSILON).is_none());

        let parallel = Ray::new(Vec3::new(0.0, 0.0, 1.0), Vec3::X);
        assert!(Square.intersect_local(&parallel, RAY_EPSILON).is_none());
    }
}
