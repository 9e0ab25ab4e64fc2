//! Quadric surfaces clipped to the [-1, 1]³ local cube.
//!
//! None of these carry a surface parameterization, so they never receive
//! texture or bump mapping.

use prism_math::{Aabb, Ray, Vec3};

use crate::shape::{solve_quadratic, LocalHit, Shape};

/// Slack when testing whether a root lies inside the clip cube.
const CLIP_EPSILON: f32 = 1.0e-4;

/// Implicit quadric `f(p) = 0` restricted to the local clip cube.
trait Quadric {
    /// Coefficients of `f(o + t·d)` as a polynomial in `t`.
    fn coefficients(&self, o: Vec3, d: Vec3) -> (f32, f32, f32);

    /// Gradient of `f`, normal to the surface.
    fn gradient(&self, p: Vec3) -> Vec3;
}

fn inside_clip_cube(p: Vec3) -> bool {
    p.abs().max_element() <= 1.0 + CLIP_EPSILON
}

fn intersect_quadric<Q: Quadric>(quadric: &Q, ray: &Ray, t_min: f32) -> Option<LocalHit> {
    let (a, b, c) = quadric.coefficients(ray.origin, ray.direction);
    let (t0, t1) = solve_quadratic(a, b, c)?;

    [t0, t1]
        .into_iter()
        .filter(|&t| t > t_min)
        .find(|&t| inside_clip_cube(ray.at(t)))
        .and_then(|t| {
            let normal = quadric.gradient(ray.at(t)).try_normalize()?;
            Some(LocalHit { t, normal })
        })
}

fn clip_cube() -> Aabb {
    Aabb::from_points(Vec3::splat(-1.0), Vec3::splat(1.0))
}

/// Paraboloid of revolution `x² + y² = z`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Paraboloid;

impl Quadric for Paraboloid {
    fn coefficients(&self, o: Vec3, d: Vec3) -> (f32, f32, f32) {
        (
            d.x * d.x + d.y * d.y,
            2.0 * (d.x * o.x + d.y * o.y) - d.z,
            o.x * o.x + o.y * o.y - o.z,
        )
    }

    fn gradient(&self, p: Vec3) -> Vec3 {
        Vec3::new(2.0 * p.x, 2.0 * p.y, -1.0)
    }
}

/// Hyperboloid of one sheet `x² + y² − z² = 1`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Hyperboloid;

impl Quadric for Hyperboloid {
    fn coefficients(&self, o: Vec3, d: Vec3) -> (f32, f32, f32) {
        (
            d.x * d.x + d.y * d.y - d.z * d.z,
            2.0 * (d.x * o.x + d.y * o.y - d.z * o.z),
            o.x * o.x + o.y * o.y - o.z * o.z - 1.0,
        )
    }

    fn gradient(&self, p: Vec3) -> Vec3 {
        Vec3::new(2.0 * p.x, 2.0 * p.y, -2.0 * p.z)
    }
}

/// Saddle `x² − y² = z`.
#[derive(Debug, Clone, Copy, Default)]
pub struct HyperbolicParaboloid;

impl Quadric for HyperbolicParaboloid {
    fn coefficients(&self, o: Vec3, d: Vec3) -> (f32, f32, f32) {
        (
            d.x * d.x - d.y * d.y,
            2.0 * (d.x * o.x - d.y * o.y) - d.z,
            o.x * o.x - o.y * o.y - o.z,
        )
    }

    fn gradient(&self, p: Vec3) -> Vec3 {
        Vec3::new(2.0 * p.x, -2.0 * p.y, -1.0)
    }
}

macro_rules! impl_shape_for_quadric {
    ($($ty:ty),*) => {
        $(
            impl Shape for $ty {
                fn intersect_local(&self, ray: &Ray, t_min: f32) -> Option<LocalHit> {
                    intersect_quadric(self, ray, t_min)
                }

                fn local_bounding_box(&self) -> Option<Aabb> {
                    Some(clip_cube())
                }
            }
        )*
    };
}

impl_shape_for_quadric!(Paraboloid, Hyperboloid, HyperbolicParaboloid);
