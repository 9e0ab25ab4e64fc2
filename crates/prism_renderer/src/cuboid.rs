//! Unit box primitive.

use prism_math::{Aabb, Ray, Vec3};

use crate::shape::{LocalHit, Shape};

/// Axis-aligned box spanning [-0.5, 0.5] on every local axis.
#[derive(Debug, Clone, Copy, Default)]
pub struct Cuboid;

impl Shape for Cuboid {
    fn intersect_local(&self, ray: &Ray, t_min: f32) -> Option<LocalHit> {
        let p = ray.origin;
        let d = ray.direction;

        let mut t_near = f32::NEG_INFINITY;
        let mut t_far = f32::INFINITY;
        let mut near_axis = 0;
        let mut far_axis = 0;

        for axis in 0..3 {
            if d[axis] == 0.0 {
                if p[axis] < -0.5 || p[axis] > 0.5 {
                    return None;
                }
                continue;
            }
            let t0 = (-0.5 - p[axis]) / d[axis];
            let t1 = (0.5 - p[axis]) / d[axis];
            let (lo, hi) = (t0.min(t1), t0.max(t1));
            if lo > t_near {
                t_near = lo;
                near_axis = axis;
            }
            if hi < t_far {
                t_far = hi;
                far_axis = axis;
            }
        }

        if t_far < t_near {
            return None;
        }

        // Entering face first; a ray starting inside exits through the far one.
        let (t, axis) = if t_near > t_min {
            (t_near, near_axis)
        } else if t_far > t_min {
            (t_far, far_axis)
        } else {
            return None;
        };

        let mut normal = Vec3::ZERO;
        normal[axis] = ray.at(t)[axis].signum();

        Some(LocalHit { t, normal })
    }

    fn local_bounding_box(&self) -> Option<Aabb> {
        Some(Aabb::from_points(Vec3::splat(-0.5), Vec3::splat(0.5)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prism_math::RAY_EPSILON;

    #[test]
    fn test_box_hit_face() {
        let ray = Ray::new(Vec3::new(0.1, 0.2, 3.0), Vec3::new(0.0, 0.0, -1.0));
        let hit = Cuboid.intersect_local(&ray, RAY_EPSILON).expect("should hit +z face");

        assert!((hit.t - 2.5).abs() < 1e-5);
        assert_eq!(hit.normal, Vec3::Z);
    }

    #[test]
    fn test_box_hit_from_inside() {
        let ray = Ray::new(Vec3::ZERO, Vec3::new(-1.0, 0.0, 0.0));
        let hit = Cuboid.intersect_local(&ray, RAY_EPSILON).expect("should exit through -x");

        assert!((hit.t - 0.5).abs() < 1e-5);
        assert_eq!(hit.normal, -Vec3::X);
    }

    #[test]
    fn test_box_miss() {
        let ray = Ray::new(Vec3::new(2.0, 0.0, 3.0), Vec3::new(0.0, 0.0, -1.0));
        assert!(Cuboid.intersect_local(&ray, RAY_EPSILON).is_none());

        let diagonal_miss = Ray::new(Vec3::new(-2.0, 0.0, 0.0), Vec3::new(1.0, 3.0, 0.0));
        assert!(Cuboid.intersect_local(&diagonal_miss, RAY_EPSILON).is_none());
    }
}
