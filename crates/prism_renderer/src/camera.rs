//! Pinhole camera for primary-ray generation.

use prism_core::CameraDesc;
use prism_math::{Ray, Vec3};

/// A pinhole camera looking down `look` with an image plane spanned by `u`
/// and `v`.
///
/// `u` and `v` are not unit vectors: their lengths are the full width and
/// height of the image plane at distance 1 from the eye, so
/// `look + (x - 0.5)·u + (y - 0.5)·v` sweeps the whole frame as the
/// normalized screen coordinates go from 0 to 1.
#[derive(Clone, Debug)]
pub struct Camera {
    eye: Vec3,
    look: Vec3,
    u: Vec3,
    v: Vec3,
    aspect_ratio: f32,
}

impl Camera {
    /// Create a camera.
    ///
    /// `fov` is the vertical field of view in degrees. The caller is
    /// expected to have rejected degenerate inputs (coincident eye and target,
    /// parallel up vector, non-positive aspect).
    pub fn new(eye: Vec3, look_at: Vec3, up: Vec3, fov: f32, aspect_ratio: f32) -> Self {
        let look = (look_at - eye).normalize();
        let right = look.cross(up).normalize();
        let true_up = right.cross(look);

        let normalized_height = 2.0 * (fov.to_radians() / 2.0).tan();

        Self {
            eye,
            look,
            u: right * normalized_height * aspect_ratio,
            v: true_up * normalized_height,
            aspect_ratio,
        }
    }

    /// Build a camera from a validated scene description.
    pub fn from_desc(desc: &CameraDesc) -> Self {
        Self::new(
            Vec3::from(desc.position),
            Vec3::from(desc.look_at),
            Vec3::from(desc.up),
            desc.fov,
            desc.aspect_ratio,
        )
    }

    /// Primary ray through normalized screen coordinates.
    ///
    /// (0, 0) is the bottom-left corner of the frame and (1, 1) the top-right.
    pub fn ray_through(&self, x: f32, y: f32) -> Ray {
        let dir = self.look + (x - 0.5) * self.u + (y - 0.5) * self.v;
        Ray::new(self.eye, dir)
    }

    /// Inverse of [`Camera::ray_through`]: where a direction pierces the
    /// image plane, in normalized screen coordinates.
    ///
    /// Returns `None` for directions pointing away from the image plane.
    /// The result is not clamped, so it can fall outside [0, 1]².
    pub fn project(&self, direction: Vec3) -> Option<(f32, f32)> {
        let forward = direction.dot(self.look);
        if forward <= 0.0 {
            return None;
        }
        let on_plane = direction / forward;
        let x = on_plane.dot(self.u) / self.u.length_squared() + 0.5;
        let y = on_plane.dot(self.v) / self.v.length_squared() + 0.5;
        Some((x, y))
    }

    pub fn eye(&self) -> Vec3 {
        self.eye
    }

    /// Unit view direction.
    pub fn look(&self) -> Vec3 {
        self.look
    }

    /// Horizontal image-plane basis (full frame width).
    pub fn u(&self) -> Vec3 {
        self.u
    }

    /// Vertical image-plane basis (full frame height).
    pub fn v(&self) -> Vec3 {
        self.v
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.aspect_ratio
    }
}
