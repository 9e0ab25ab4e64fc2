//! Render-ready scene and the intersection dispatcher.

use std::sync::Arc;

use prism_core::scene_file::AttenuationFactors;
use prism_core::{Bitmap, Color, LoadedScene, Material, SceneDescription, SceneResult};
use prism_math::{Aabb, Interval, Mat3, Mat4, Mat4Ext, Ray, Vec3, RAY_EPSILON};

use crate::camera::Camera;
use crate::light::{light_from_desc, Light};
use crate::object::{Intersection, SceneObject};
use crate::shape::{shape_for, Shape};

/// A rigid displacement applied to every object for one motion-blur sample.
#[derive(Debug, Clone, Copy)]
pub struct Pose {
    matrix: Mat4,
    inverse: Mat4,
    normal_matrix: Mat3,
}

impl Pose {
    /// Returns `None` for a singular matrix.
    pub fn new(matrix: Mat4) -> Option<Self> {
        if !matrix.is_invertible() {
            return None;
        }
        Some(Self {
            matrix,
            inverse: matrix.inverse(),
            normal_matrix: matrix.normal_matrix(),
        })
    }

    /// `step` applied `k` times.
    pub fn repeated(step: Mat4, k: u32) -> Option<Self> {
        let matrix = (0..k).fold(Mat4::IDENTITY, |acc, _| step * acc);
        Self::new(matrix)
    }

    pub fn matrix(&self) -> Mat4 {
        self.matrix
    }

    pub fn inverse(&self) -> Mat4 {
        self.inverse
    }

    pub fn normal_matrix(&self) -> Mat3 {
        self.normal_matrix
    }
}

/// Everything the tracer reads during a render.
///
/// Objects are split once into those with a world bounding box and those
/// without; a scene is never mutated while rendering.
#[derive(Debug)]
pub struct Scene {
    camera: Camera,
    lights: Vec<Box<dyn Light>>,
    bounded: Vec<SceneObject>,
    unbounded: Vec<SceneObject>,
    bounds: Aabb,
    ambient_light: Color,
    attenuation: AttenuationFactors,
    termination_threshold: Color,
    background: Option<Bitmap>,
    texture: Option<Bitmap>,
    next_id: usize,
}

impl Scene {
    /// An empty scene with white ambient light and default thresholds.
    pub fn new(camera: Camera) -> Self {
        Self {
            camera,
            lights: Vec::new(),
            bounded: Vec::new(),
            unbounded: Vec::new(),
            bounds: Aabb::EMPTY,
            ambient_light: Color::ONE,
            attenuation: AttenuationFactors::default(),
            termination_threshold: Color::splat(0.001),
            background: None,
            texture: None,
            next_id: 0,
        }
    }

    /// Build from a parsed scene file and its decoded images.
    pub fn from_description(
        desc: &SceneDescription,
        background: Option<Bitmap>,
        texture: Option<Bitmap>,
    ) -> SceneResult<Self> {
        let mut scene = Scene::new(Camera::from_desc(&desc.camera))
            .with_ambient_light(Color::from(desc.ambient_light))
            .with_attenuation(desc.attenuation)
            .with_termination_threshold(Color::from(desc.termination_threshold));
        scene.background = background;
        scene.texture = texture;

        for light in &desc.lights {
            scene.add_light(light_from_desc(light));
        }

        for flat in desc.flatten_objects()? {
            scene.add_object(
                shape_for(flat.shape),
                flat.transform,
                Arc::new(flat.material),
            );
        }

        log::info!(
            "Scene built: {} bounded objects, {} unbounded objects, {} lights",
            scene.bounded.len(),
            scene.unbounded.len(),
            scene.lights.len()
        );
        if !scene.bounded.is_empty() {
            log::debug!(
                "Scene bounds: {:?} .. {:?}",
                scene.bounds.min(),
                scene.bounds.max()
            );
        }

        Ok(scene)
    }

    /// Build from the output of `prism_core::load_scene`.
    pub fn from_loaded(loaded: LoadedScene) -> SceneResult<Self> {
        Self::from_description(&loaded.description, loaded.background, loaded.texture)
    }

    /// Builder: set the ambient light color.
    pub fn with_ambient_light(mut self, ambient: Color) -> Self {
        self.ambient_light = ambient;
        self
    }

    /// Builder: set the global distance-attenuation factors.
    pub fn with_attenuation(mut self, attenuation: AttenuationFactors) -> Self {
        self.attenuation = attenuation;
        self
    }

    /// Builder: set the per-channel weight below which child rays are dropped.
    pub fn with_termination_threshold(mut self, threshold: Color) -> Self {
        self.termination_threshold = threshold;
        self
    }

    /// Builder: set the background image.
    pub fn with_background(mut self, background: Bitmap) -> Self {
        self.background = Some(background);
        self
    }

    /// Builder: set the texture and bump image.
    pub fn with_texture(mut self, texture: Bitmap) -> Self {
        self.texture = Some(texture);
        self
    }

    /// Place a shape and return its object id.
    pub fn add_object(&mut self, shape: Arc<dyn Shape>, transform: Mat4, material: Arc<Material>) -> usize {
        let id = self.next_id;
        self.next_id += 1;

        let object = SceneObject::new(id, shape, transform, material);
        match object.world_bounds() {
            Some(bounds) => {
                self.bounds = Aabb::surrounding(&self.bounds, &bounds);
                self.bounded.push(object);
            }
            None => self.unbounded.push(object),
        }
        id
    }

    pub fn add_light(&mut self, light: Box<dyn Light>) {
        self.lights.push(light);
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn lights(&self) -> &[Box<dyn Light>] {
        &self.lights
    }

    /// All objects, unbounded first.
    pub fn objects(&self) -> impl Iterator<Item = &SceneObject> {
        self.unbounded.iter().chain(self.bounded.iter())
    }

    /// Union of the bounded objects' world boxes.
    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    pub fn ambient_light(&self) -> Color {
        self.ambient_light
    }

    pub fn attenuation(&self) -> &AttenuationFactors {
        &self.attenuation
    }

    pub fn termination_threshold(&self) -> Color {
        self.termination_threshold
    }

    pub fn texture(&self) -> Option<&Bitmap> {
        self.texture.as_ref()
    }

    /// Background seen along a world direction.
    ///
    /// The direction is projected onto the camera's image plane; anything
    /// off-frame, behind the camera, or without a background image is black.
    pub fn background_color(&self, direction: Vec3) -> Color {
        let Some(background) = &self.background else {
            return Color::ZERO;
        };
        match self.camera.project(direction) {
            Some((x, y)) => background.sample(x, y),
            None => Color::ZERO,
        }
    }

    /// View of the scene at rest.
    pub fn view(&self) -> SceneView<'_> {
        SceneView {
            scene: self,
            pose: None,
        }
    }

    /// View of the scene with every object displaced by `pose`.
    pub fn posed<'a>(&'a self, pose: &'a Pose) -> SceneView<'a> {
        SceneView {
            scene: self,
            pose: Some(pose),
        }
    }
}

/// A read-only snapshot of the scene, possibly displaced for motion blur.
#[derive(Debug, Clone, Copy)]
pub struct SceneView<'a> {
    scene: &'a Scene,
    pose: Option<&'a Pose>,
}

impl<'a> SceneView<'a> {
    pub fn scene(&self) -> &'a Scene {
        self.scene
    }

    /// Nearest hit with `t > RAY_EPSILON`, or `None` on a miss.
    ///
    /// Unbounded objects are always tested; bounded objects are skipped when
    /// the ray misses their world box or the box starts beyond the current
    /// nearest hit.
    pub fn intersect(&self, ray: &Ray) -> Option<Intersection<'a>> {
        let mut nearest: Option<Intersection<'a>> = None;

        for object in &self.scene.unbounded {
            if let Some(hit) = object.intersect(ray, self.pose) {
                if hit.t > RAY_EPSILON && nearest.map_or(true, |n| hit.t < n.t) {
                    nearest = Some(hit);
                }
            }
        }

        for object in &self.scene.bounded {
            if let Some(bounds) = object.world_bounds() {
                let bounds = match self.pose {
                    Some(pose) => pose.matrix().transform_aabb(&bounds),
                    None => bounds,
                };
                let limit = nearest.map_or(f32::INFINITY, |n| n.t);
                if bounds.hit(ray, Interval::new(0.0, limit)).is_none() {
                    continue;
                }
            }
            if let Some(hit) = object.intersect(ray, self.pose) {
                if hit.t > RAY_EPSILON && nearest.map_or(true, |n| hit.t < n.t) {
                    nearest = Some(hit);
                }
            }
        }

        nearest
    }
}
