//! Unit sphere primitive.

use std::f32::consts::PI;

use prism_core::Bitmap;
use prism_math::{Aabb, Ray, Vec3};

use crate::shape::{sobel_bump, LocalHit, Shape};

/// Sphere of radius 1 centered at the local origin.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sphere;

impl Sphere {
    /// Get the UV coordinates for a point on the unit sphere.
    fn sphere_uv(p: Vec3) -> (f32, f32) {
        // theta: angle down from +Y
        // phi: angle around Y axis from +X
        let theta = (-p.y).clamp(-1.0, 1.0).acos();
        let phi = (-p.z).atan2(p.x) + PI;

        (phi / (2.0 * PI), theta / PI)
    }
}

impl Shape for Sphere {
    fn intersect_local(&self, ray: &Ray, t_min: f32) -> Option<LocalHit> {
        let h = ray.direction.dot(ray.origin);
        let c = ray.origin.length_squared() - 1.0;

        let discriminant = h * h - c;
        if discriminant < 0.0 {
            return None;
        }
        let sqrtd = discriminant.sqrt();

        // Find the nearest root in the acceptable range
        let mut t = -h - sqrtd;
        if t <= t_min {
            t = -h + sqrtd;
            if t <= t_min {
                return None;
            }
        }

        Some(LocalHit {
            t,
            normal: ray.at(t).normalize(),
        })
    }

    fn local_bounding_box(&self) -> Option<Aabb> {
        Some(Aabb::from_points(Vec3::splat(-1.0), Vec3::splat(1.0)))
    }

    fn local_uv(&self, point: Vec3, _normal: Vec3) -> Option<(f32, f32)> {
        Some(Self::sphere_uv(point.normalize_or_zero()))
    }

    fn perturb_normal(&self, normal: Vec3, uv: (f32, f32), bump: &Bitmap) -> Option<Vec3> {
        let tangent_u = Vec3::Y.cross(normal).try_normalize().unwrap_or(Vec3::X);
        let tangent_v = normal.cross(tangent_u);
        Some(sobel_bump(bump, uv, normal, tangent_u, tangent_v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prism_math::RAY_EPSILON;

    #[test]
    fn test_sphere_hit_from_outside() {
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::new(0.0, 0.0, -1.0));
        let hit = Sphere.intersect_local(&ray, RAY_EPSILON).expect("should hit");

        assert!((hit.t - 4.0).abs() < 1e-5);
        assert!((hit.normal - Vec3::Z).length() < 1e-5);
    }

    #[test]
    fn test_sphere_hit_from_inside() {
        let ray = Ray::new(Vec3::ZERO, Vec3::X);
        let hit = Sphere.intersect_local(&ray, RAY_EPSILON).expect("should hit the far wall");

        assert!((hit.t - 1.0).abs() < 1e-5);
        assert!((hit.normal - Vec3::X).length() < 1e-5);
    }

    #[test]
    fn test_sphere_miss() {
        let ray = Ray::new(Vec3::new(0.0, 2.0, 5.0), Vec3::new(0.0, 0.0, -1.0));
        assert!(Sphere.intersect_local(&ray, RAY_EPSILON).is_none());

        let behind = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::Z);
        assert!(Sphere.intersect_local(&behind, RAY_EPSILON).is_none());
    }

    #[test]
    fn test_sphere_uv() {
        let (u, v) = Sphere::sphere_uv(Vec3::Y);
        assert!((v - 1.0).abs() < 1e-5);
        assert!((0.0..=1.0).contains(&u));

        let (u, v) = Sphere::sphere_uv(Vec3::X);
        assert!((u - 0.5).abs() < 1e-5);
        assert!((v - 0.5).abs() < 1e-5);
    }
}
