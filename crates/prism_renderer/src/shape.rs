//! The local-space primitive interface.
//!
//! Every primitive lives in a canonical frame (unit sphere at the origin,
//! unit box, ...) and only ever sees rays already transformed into that
//! frame. Capabilities a primitive lacks are reported as `None` and the
//! caller falls back: no bounding box means the object is tested against
//! every ray, no UV means untextured diffuse, no perturbation means the
//! geometric normal is used.

use std::fmt;
use std::sync::Arc;

use prism_core::{Bitmap, ShapeKind};
use prism_math::{Aabb, Ray, Vec3};

use crate::cuboid::Cuboid;
use crate::quadric::{HyperbolicParaboloid, Hyperboloid, Paraboloid};
use crate::sphere::Sphere;
use crate::square::Square;

/// Strength applied to bump-map gradients.
const BUMP_SCALE: f32 = 32.0;

/// Gradients weaker than this leave the normal untouched.
const BUMP_THRESHOLD: f32 = 0.9;

/// A hit in the primitive's local frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalHit {
    /// Distance along the (unit) local ray
    pub t: f32,
    /// Unit surface normal, either orientation
    pub normal: Vec3,
}

/// A primitive that can be intersected in its own coordinate frame.
pub trait Shape: Send + Sync + fmt::Debug {
    /// Nearest hit with `t > t_min` along a unit-direction local ray.
    ///
    /// `t_min` is the self-hit cutoff already converted to local distance.
    fn intersect_local(&self, ray: &Ray, t_min: f32) -> Option<LocalHit>;

    /// Finite local extent, if the primitive has one.
    fn local_bounding_box(&self) -> Option<Aabb> {
        None
    }

    /// Surface parameterization of a local hit point.
    fn local_uv(&self, _point: Vec3, _normal: Vec3) -> Option<(f32, f32)> {
        None
    }

    /// Normal bent by the luminance gradient of `bump` around `uv`.
    fn perturb_normal(&self, _normal: Vec3, _uv: (f32, f32), _bump: &Bitmap) -> Option<Vec3> {
        None
    }
}

/// Instantiate the primitive for a scene-file shape name.
pub fn shape_for(kind: ShapeKind) -> Arc<dyn Shape> {
    match kind {
        ShapeKind::Sphere => Arc::new(Sphere),
        ShapeKind::Box => Arc::new(Cuboid),
        ShapeKind::Square => Arc::new(Square),
        ShapeKind::Paraboloid => Arc::new(Paraboloid),
        ShapeKind::Hyperboloid => Arc::new(Hyperboloid),
        ShapeKind::HyperbolicParaboloid => Arc::new(HyperbolicParaboloid),
    }
}

/// Bend `normal` by the Sobel gradient of the bitmap's luminance at `uv`.
///
/// `tangent_u` and `tangent_v` are the surface directions in which u and v
/// grow. Neighbor lookups clamp to the image edge.
pub(crate) fn sobel_bump(
    bump: &Bitmap,
    uv: (f32, f32),
    normal: Vec3,
    tangent_u: Vec3,
    tangent_v: Vec3,
) -> Vec3 {
    let w = bump.width() as i64;
    let h = bump.height() as i64;
    let px = ((uv.0 * w as f32) as i64).clamp(0, w - 1);
    let py = ((uv.1 * h as f32) as i64).clamp(0, h - 1);

    let at = |dx: i64, dy: i64| bump.intensity((px + dx).clamp(0, w - 1), (py + dy).clamp(0, h - 1));

    let gx = (at(1, -1) + 2.0 * at(1, 0) + at(1, 1)) - (at(-1, -1) + 2.0 * at(-1, 0) + at(-1, 1));
    let gy = (at(-1, 1) + 2.0 * at(0, 1) + at(1, 1)) - (at(-1, -1) + 2.0 * at(0, -1) + at(1, -1));

    let (gx, gy) = (gx * BUMP_SCALE, gy * BUMP_SCALE);
    if (gx * gx + gy * gy).sqrt() <= BUMP_THRESHOLD {
        return normal;
    }
    (normal - gx * tangent_u - gy * tangent_v).normalize_or_zero()
}

/// Solve `a·t² + b·t + c = 0` and return the roots in ascending order.
///
/// Degenerates to the linear root when `a` vanishes.
pub(crate) fn solve_quadratic(a: f32, b: f32, c: f32) -> Option<(f32, f32)> {
    if a.abs() < 1.0e-8 {
        if b.abs() < 1.0e-8 {
            return None;
        }
        let t = -c / b;
        return Some((t, t));
    }
    let discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 {
        return None;
    }
    let sqrt_d = discriminant.sqrt();
    let t0 = (-b - sqrt_d) / (2.0 * a);
    let t1 = (-b + sqrt_d) / (2.0 * a);
    Some((t0.min(t1), t0.max(t1)))
}
