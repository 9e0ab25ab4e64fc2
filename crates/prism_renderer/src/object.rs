//! Placed primitives and the intersection record.

use std::sync::Arc;

use prism_core::{Bitmap, Material};
use prism_math::{Aabb, Mat3, Mat4, Mat4Ext, Ray, Vec3, RAY_EPSILON};

use crate::scene::Pose;
use crate::shape::Shape;

/// A primitive placed in the world with its material.
///
/// The object-to-world matrix is cached together with its inverse and the
/// normal matrix so intersection never inverts anything.
#[derive(Debug, Clone)]
pub struct SceneObject {
    id: usize,
    shape: Arc<dyn Shape>,
    transform: Mat4,
    inverse: Mat4,
    normal_matrix: Mat3,
    material: Arc<Material>,
    world_bounds: Option<Aabb>,
}

impl SceneObject {
    /// Place a shape. `transform` must be invertible.
    pub fn new(id: usize, shape: Arc<dyn Shape>, transform: Mat4, material: Arc<Material>) -> Self {
        let world_bounds = shape
            .local_bounding_box()
            .map(|local| transform.transform_aabb(&local));

        Self {
            id,
            shape,
            transform,
            inverse: transform.inverse(),
            normal_matrix: transform.normal_matrix(),
            material,
            world_bounds,
        }
    }

    /// Identity used by the medium stack.
    pub fn id(&self) -> usize {
        self.id
    }

    pub fn material(&self) -> &Material {
        &self.material
    }

    pub fn shape(&self) -> &dyn Shape {
        self.shape.as_ref()
    }

    /// Object-to-world matrix at rest.
    pub fn transform(&self) -> Mat4 {
        self.transform
    }

    /// World-space box at rest, if the shape has a finite extent.
    pub fn world_bounds(&self) -> Option<Aabb> {
        self.world_bounds
    }

    /// Nearest hit of a world-space ray, optionally with the whole object
    /// displaced by `pose` (applied after the object's own transform).
    pub fn intersect(&self, ray: &Ray, pose: Option<&Pose>) -> Option<Intersection<'_>> {
        let (inverse, normal_matrix) = match pose {
            Some(pose) => (
                self.inverse * pose.inverse(),
                pose.normal_matrix() * self.normal_matrix,
            ),
            None => (self.inverse, self.normal_matrix),
        };

        // Transform the ray into the object's local coordinate space
        let origin = inverse.transform_point3(ray.origin);
        let direction = inverse.transform_vector3(ray.direction);
        let length = direction.length();
        if length == 0.0 || !length.is_finite() {
            return None;
        }
        let local_ray = Ray {
            origin,
            direction: direction / length,
        };

        // Local distances are world distances times `length`
        let hit = self.shape.intersect_local(&local_ray, RAY_EPSILON * length)?;
        let normal = (normal_matrix * hit.normal).try_normalize()?;

        Some(Intersection {
            t: hit.t / length,
            normal,
            object: self,
            local_point: local_ray.at(hit.t),
            local_normal: hit.normal,
            normal_matrix,
        })
    }
}

/// Where a ray met an object.
#[derive(Debug, Clone, Copy)]
pub struct Intersection<'a> {
    /// World-space distance along the ray
    pub t: f32,
    /// Unit world-space normal
    pub normal: Vec3,
    /// The object that was hit
    pub object: &'a SceneObject,
    /// Hit point in the object's local frame
    pub local_point: Vec3,
    /// Normal in the object's local frame, kept in step with `normal`
    pub local_normal: Vec3,
    normal_matrix: Mat3,
}

impl<'a> Intersection<'a> {
    pub fn material(&self) -> &'a Material {
        self.object.material()
    }

    /// Flip the normal, if needed, so it faces against `direction`.
    pub fn facing(mut self, direction: Vec3) -> Self {
        if self.normal.dot(direction) > 0.0 {
            self.normal = -self.normal;
            self.local_normal = -self.local_normal;
        }
        self
    }

    /// Surface parameterization at the hit, if the shape has one.
    pub fn uv(&self) -> Option<(f32, f32)> {
        self.object
            .shape()
            .local_uv(self.local_point, self.local_normal)
    }

    /// World-space normal bent by a bump map, if the shape supports it.
    pub fn perturbed_normal(&self, uv: (f32, f32), bump: &Bitmap) -> Option<Vec3> {
        let local = self
            .object
            .shape()
            .perturb_normal(self.local_normal, uv, bump)?;
        (self.normal_matrix * local).try_normalize()
    }
}
