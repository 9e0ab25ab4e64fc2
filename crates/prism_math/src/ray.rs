use crate::Vec3;

/// Minimum hit distance accepted along a ray.
///
/// Secondary rays start exactly on a surface, so anything closer than this is
/// treated as the surface the ray is leaving.
pub const RAY_EPSILON: f32 = 1.0e-3;

/// A ray in 3D space with an origin and a unit direction.
///
/// Rays are immutable once built: every reflection, refraction or shadow
/// query constructs a new one.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    /// Create a new ray. The direction is normalized.
    ///
    /// A zero-length direction stays zero rather than becoming NaN; such a
    /// ray never hits anything.
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    /// Get the point along the ray at parameter t.
    ///
    /// Returns: origin + t * direction
    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}
