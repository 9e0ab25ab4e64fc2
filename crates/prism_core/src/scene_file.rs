//! JSON scene files.
//!
//! A scene file holds the camera, global lighting knobs, the light list, and
//! a tree of objects and groups. Everything but `camera` has a default.
//!
//! ```json
//! {
//!   "camera": { "position": [0, 0, 5], "look_at": [0, 0, 0], "fov": 45 },
//!   "lights": [ { "type": "directional", "direction": [0, 0, -1], "color": [1, 1, 1] } ],
//!   "objects": [
//!     { "shape": "sphere", "material": { "diffuse": [0.8, 0.2, 0.2] } }
//!   ]
//! }
//! ```

use std::path::{Path, PathBuf};

use prism_math::{Mat4, Mat4Ext, Quat, Vec3};
use serde::Deserialize;
use thiserror::Error;

use crate::material::{Color, Material};
use crate::texture::{Bitmap, TextureError};

/// Errors that can occur while loading a scene file.
#[derive(Error, Debug)]
pub enum SceneError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Scene parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid scene: {0}")]
    Invalid(String),

    #[error("Texture error: {0}")]
    Texture(#[from] TextureError),
}

pub type SceneResult<T> = Result<T, SceneError>;

fn one() -> f32 {
    1.0
}

fn unit_vec3() -> [f32; 3] {
    [1.0, 1.0, 1.0]
}

fn up_vec3() -> [f32; 3] {
    [0.0, 1.0, 0.0]
}

fn default_fov() -> f32 {
    45.0
}

fn default_threshold() -> [f32; 3] {
    [0.001, 0.001, 0.001]
}

fn unbounded_flap() -> [f32; 2] {
    [f32::MIN, f32::MAX]
}

/// Camera placement.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct CameraDesc {
    pub position: [f32; 3],
    pub look_at: [f32; 3],
    #[serde(default = "up_vec3")]
    pub up: [f32; 3],
    /// Vertical field of view in degrees
    #[serde(default = "default_fov")]
    pub fov: f32,
    #[serde(default = "one")]
    pub aspect_ratio: f32,
}

/// Global multipliers applied to every point light's attenuation coefficients.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
pub struct AttenuationFactors {
    #[serde(default = "one")]
    pub constant: f32,
    #[serde(default = "one")]
    pub linear: f32,
    #[serde(default = "one")]
    pub quadratic: f32,
}

impl Default for AttenuationFactors {
    fn default() -> Self {
        Self {
            constant: 1.0,
            linear: 1.0,
            quadratic: 1.0,
        }
    }
}

/// Per-light distance attenuation coefficients. All zero disables falloff.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PointFalloff {
    pub constant: f32,
    pub linear: f32,
    pub quadratic: f32,
}

/// World-space slabs outside which a Warn light contributes nothing.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
pub struct Flaps {
    #[serde(default = "unbounded_flap")]
    pub x: [f32; 2],
    #[serde(default = "unbounded_flap")]
    pub y: [f32; 2],
    #[serde(default = "unbounded_flap")]
    pub z: [f32; 2],
}

impl Default for Flaps {
    fn default() -> Self {
        Self {
            x: unbounded_flap(),
            y: unbounded_flap(),
            z: unbounded_flap(),
        }
    }
}

/// A light source, tagged by `"type"`.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LightDesc {
    Directional {
        direction: [f32; 3],
        #[serde(default = "unit_vec3")]
        color: [f32; 3],
    },
    Point {
        position: [f32; 3],
        #[serde(default = "unit_vec3")]
        color: [f32; 3],
        #[serde(default)]
        constant_attenuation: f32,
        #[serde(default)]
        linear_attenuation: f32,
        #[serde(default)]
        quadratic_attenuation: f32,
    },
    Spot {
        position: [f32; 3],
        #[serde(default = "unit_vec3")]
        color: [f32; 3],
        direction: [f32; 3],
        /// Cone half-angle in degrees
        angle: f32,
        #[serde(default)]
        constant_attenuation: f32,
        #[serde(default)]
        linear_attenuation: f32,
        #[serde(default)]
        quadratic_attenuation: f32,
    },
    Warn {
        position: [f32; 3],
        #[serde(default = "unit_vec3")]
        color: [f32; 3],
        direction: [f32; 3],
        #[serde(default = "one")]
        exponent: f32,
        #[serde(default)]
        flaps: Flaps,
        #[serde(default)]
        constant_attenuation: f32,
        #[serde(default)]
        linear_attenuation: f32,
        #[serde(default)]
        quadratic_attenuation: f32,
    },
}

impl LightDesc {
    /// Distance attenuation coefficients; directional lights have none.
    pub fn falloff(&self) -> PointFalloff {
        match *self {
            LightDesc::Directional { .. } => PointFalloff::default(),
            LightDesc::Point {
                constant_attenuation,
                linear_attenuation,
                quadratic_attenuation,
                ..
            }
            | LightDesc::Spot {
                constant_attenuation,
                linear_attenuation,
                quadratic_attenuation,
                ..
            }
            | LightDesc::Warn {
                constant_attenuation,
                linear_attenuation,
                quadratic_attenuation,
                ..
            } => PointFalloff {
                constant: constant_attenuation,
                linear: linear_attenuation,
                quadratic: quadratic_attenuation,
            },
        }
    }
}

/// Primitive shape in its canonical local frame.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ShapeKind {
    Sphere,
    Box,
    Square,
    Paraboloid,
    Hyperboloid,
    HyperbolicParaboloid,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct RotateDesc {
    pub axis: [f32; 3],
    /// Degrees
    pub angle: f32,
}

/// Local transform, composed as translate · rotate · scale.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct TransformDesc {
    #[serde(default)]
    pub translate: Option<[f32; 3]>,
    #[serde(default)]
    pub rotate: Option<RotateDesc>,
    #[serde(default)]
    pub scale: Option<[f32; 3]>,
}

impl TransformDesc {
    /// Convert to a 4x4 transformation matrix.
    pub fn to_matrix(&self) -> SceneResult<Mat4> {
        let translation = self.translate.map(Vec3::from).unwrap_or(Vec3::ZERO);
        let scale = self.scale.map(Vec3::from).unwrap_or(Vec3::ONE);
        let rotation = match &self.rotate {
            Some(rot) => {
                let axis = Vec3::from(rot.axis);
                if axis.length_squared() == 0.0 {
                    return Err(SceneError::Invalid(
                        "rotation axis must be non-zero".to_string(),
                    ));
                }
                Quat::from_axis_angle(axis.normalize(), rot.angle.to_radians())
            }
            None => Quat::IDENTITY,
        };
        Ok(Mat4::from_scale_rotation_translation(scale, rotation, translation))
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct MaterialDesc {
    #[serde(default)]
    pub emissive: [f32; 3],
    #[serde(default)]
    pub ambient: [f32; 3],
    #[serde(default)]
    pub diffuse: [f32; 3],
    #[serde(default)]
    pub specular: [f32; 3],
    #[serde(default)]
    pub reflective: [f32; 3],
    #[serde(default)]
    pub transmissive: [f32; 3],
    #[serde(default)]
    pub shininess: f32,
    #[serde(default = "one")]
    pub index: f32,
}

impl Default for MaterialDesc {
    fn default() -> Self {
        Self {
            emissive: [0.0; 3],
            ambient: [0.0; 3],
            diffuse: [0.0; 3],
            specular: [0.0; 3],
            reflective: [0.0; 3],
            transmissive: [0.0; 3],
            shininess: 0.0,
            index: 1.0,
        }
    }
}

impl From<&MaterialDesc> for Material {
    fn from(desc: &MaterialDesc) -> Self {
        Material {
            emissive: Color::from(desc.emissive),
            ambient: Color::from(desc.ambient),
            diffuse: Color::from(desc.diffuse),
            specular: Color::from(desc.specular),
            reflective: Color::from(desc.reflective),
            transmissive: Color::from(desc.transmissive),
            shininess: desc.shininess,
            index: desc.index,
        }
    }
}

/// A node of the object tree: either a primitive or a transformed group.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ObjectNode {
    Object {
        shape: ShapeKind,
        #[serde(default)]
        material: MaterialDesc,
        #[serde(default)]
        transform: TransformDesc,
    },
    Group {
        #[serde(default)]
        transform: TransformDesc,
        children: Vec<ObjectNode>,
    },
}

/// A primitive with its transform hierarchy collapsed into one matrix.
#[derive(Clone, Debug, PartialEq)]
pub struct FlatObject {
    pub shape: ShapeKind,
    pub material: Material,
    /// Object-to-world
    pub transform: Mat4,
}

/// Parsed contents of a scene file.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct SceneDescription {
    pub camera: CameraDesc,
    #[serde(default = "unit_vec3")]
    pub ambient_light: [f32; 3],
    #[serde(default)]
    pub attenuation: AttenuationFactors,
    #[serde(default = "default_threshold")]
    pub termination_threshold: [f32; 3],
    #[serde(default)]
    pub background: Option<PathBuf>,
    #[serde(default)]
    pub texture: Option<PathBuf>,
    #[serde(default)]
    pub lights: Vec<LightDesc>,
    #[serde(default)]
    pub objects: Vec<ObjectNode>,
}

impl SceneDescription {
    /// Check camera sanity. Object transforms are checked by `flatten_objects`.
    pub fn validate(&self) -> SceneResult<()> {
        let cam = &self.camera;
        if !(cam.fov > 0.0 && cam.fov < 180.0) {
            return Err(SceneError::Invalid(format!(
                "camera fov must be in (0, 180) degrees, got {}",
                cam.fov
            )));
        }
        if !(cam.aspect_ratio > 0.0) {
            return Err(SceneError::Invalid(format!(
                "camera aspect_ratio must be positive, got {}",
                cam.aspect_ratio
            )));
        }
        let forward = Vec3::from(cam.look_at) - Vec3::from(cam.position);
        if forward.length_squared() == 0.0 {
            return Err(SceneError::Invalid(
                "camera position and look_at coincide".to_string(),
            ));
        }
        if forward.cross(Vec3::from(cam.up)).length_squared() == 0.0 {
            return Err(SceneError::Invalid(
                "camera up vector is zero or parallel to the view direction".to_string(),
            ));
        }
        Ok(())
    }

    /// Walk the object tree and collapse group transforms into each primitive.
    pub fn flatten_objects(&self) -> SceneResult<Vec<FlatObject>> {
        let mut out = Vec::new();
        for node in &self.objects {
            flatten_node(node, Mat4::IDENTITY, &mut out)?;
        }
        Ok(out)
    }
}

fn flatten_node(node: &ObjectNode, parent: Mat4, out: &mut Vec<FlatObject>) -> SceneResult<()> {
    match node {
        ObjectNode::Object {
            shape,
            material,
            transform,
        } => {
            let world = parent * transform.to_matrix()?;
            if !world.is_invertible() {
                return Err(SceneError::Invalid(format!(
                    "{:?} has a singular transform",
                    shape
                )));
            }
            out.push(FlatObject {
                shape: *shape,
                material: Material::from(material),
                transform: world,
            });
        }
        ObjectNode::Group {
            transform,
            children,
        } => {
            let world = parent * transform.to_matrix()?;
            for child in children {
                flatten_node(child, world, out)?;
            }
        }
    }
    Ok(())
}

/// A scene description together with the bitmaps it references.
#[derive(Clone, Debug)]
pub struct LoadedScene {
    pub description: SceneDescription,
    pub background: Option<Bitmap>,
    pub texture: Option<Bitmap>,
}

/// Parse and validate a scene from a JSON string.
pub fn parse_scene(json: &str) -> SceneResult<SceneDescription> {
    let description: SceneDescription = serde_json::from_str(json)?;
    description.validate()?;
    Ok(description)
}

/// Load a scene file and the images it references.
///
/// Image paths are resolved relative to the scene file's directory.
pub fn load_scene(path: impl AsRef<Path>) -> SceneResult<LoadedScene> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path).map_err(|source| SceneError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let description = parse_scene(&json)?;

    let base = path.parent().unwrap_or_else(|| Path::new("."));
    let background = description
        .background
        .as_ref()
        .map(|p| Bitmap::open(base.join(p)))
        .transpose()?;
    let texture = description
        .texture
        .as_ref()
        .map(|p| Bitmap::open(base.join(p)))
        .transpose()?;

    log::info!(
        "Loaded scene {}: {} lights, {} top-level nodes",
        path.display(),
        description.lights.len(),
        description.objects.len()
    );

    Ok(LoadedScene {
        description,
        background,
        texture,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"{
        "camera": { "position": [0, 0, 5], "look_at": [0, 0, 0] }
    }"#;

    #[test]
    fn test_defaults() {
        let desc = parse_scene(MINIMAL).expect("minimal scene parses");

        assert_eq!(desc.camera.up, [0.0, 1.0, 0.0]);
        assert_eq!(desc.camera.fov, 45.0);
        assert_eq!(desc.camera.aspect_ratio, 1.0);
        assert_eq!(desc.ambient_light, [1.0, 1.0, 1.0]);
        assert_eq!(desc.attenuation, AttenuationFactors::default());
        assert_eq!(desc.termination_threshold, [0.001; 3]);
        assert!(desc.lights.is_empty());
        assert!(desc.flatten_objects().expect("no objects").is_empty());
    }

    #[test]
    fn test_lights_parse() {
        let json = r#"{
            "camera": { "position": [0, 0, 5], "look_at": [0, 0, 0] },
            "lights": [
                { "type": "directional", "direction": [0, -1, 0] },
                { "type": "point", "position": [1, 2, 3], "color": [1, 0, 0],
                  "quadratic_attenuation": 0.5 },
                { "type": "spot", "position": [0, 5, 0], "direction": [0, -1, 0], "angle": 30 },
                { "type": "warn", "position": [0, 5, 0], "direction": [0, -1, 0],
                  "exponent": 4, "flaps": { "x": [-1, 1] } }
            ]
        }"#;
        let desc = parse_scene(json).expect("lights parse");
        assert_eq!(desc.lights.len(), 4);

        match &desc.lights[1] {
            LightDesc::Point { color, .. } => assert_eq!(*color, [1.0, 0.0, 0.0]),
            other => panic!("expected point light, got {:?}", other),
        }
        let falloff = desc.lights[1].falloff();
        assert_eq!(falloff.quadratic, 0.5);
        assert_eq!(falloff.constant, 0.0);
        assert_eq!(desc.lights[0].falloff(), PointFalloff::default());
        match &desc.lights[3] {
            LightDesc::Warn { flaps, exponent, .. } => {
                assert_eq!(*exponent, 4.0);
                assert_eq!(flaps.x, [-1.0, 1.0]);
                assert_eq!(flaps.y, [f32::MIN, f32::MAX]);
            }
            other => panic!("expected warn light, got {:?}", other),
        }
    }

    #[test]
    fn test_group_transforms_compose() {
        let json = r#"{
            "camera": { "position": [0, 0, 5], "look_at": [0, 0, 0] },
            "objects": [
                { "transform": { "translate": [10, 0, 0] },
                  "children": [
                    { "shape": "sphere",
                      "transform": { "translate": [0, 2, 0], "scale": [2, 2, 2] },
                      "material": { "diffuse": [1, 0, 0], "index": 1.5 } }
                  ] }
            ]
        }"#;
        let desc = parse_scene(json).expect("group scene parses");
        let objects = desc.flatten_objects().expect("valid transforms");

        assert_eq!(objects.len(), 1);
        assert_eq!(objects[0].shape, ShapeKind::Sphere);
        assert_eq!(objects[0].material.diffuse, Color::new(1.0, 0.0, 0.0));
        assert_eq!(objects[0].material.index, 1.5);

        let p = objects[0].transform.transform_point3(Vec3::new(1.0, 0.0, 0.0));
        assert!((p - Vec3::new(12.0, 2.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_rotation_in_degrees() {
        let t = TransformDesc {
            rotate: Some(RotateDesc {
                axis: [0.0, 0.0, 1.0],
                angle: 90.0,
            }),
            ..Default::default()
        };
        let m = t.to_matrix().expect("valid rotation");
        let p = m.transform_point3(Vec3::X);
        assert!((p - Vec3::Y).length() < 1e-5);
    }

    #[test]
    fn test_invalid_camera_rejected() {
        let bad_fov = r#"{ "camera": { "position": [0, 0, 5], "look_at": [0, 0, 0], "fov": 0 } }"#;
        assert!(matches!(parse_scene(bad_fov), Err(SceneError::Invalid(_))));

        let same_point = r#"{ "camera": { "position": [1, 1, 1], "look_at": [1, 1, 1] } }"#;
        assert!(matches!(parse_scene(same_point), Err(SceneError::Invalid(_))));

        let parallel_up =
            r#"{ "camera": { "position": [0, 5, 0], "look_at": [0, 0, 0], "up": [0, 1, 0] } }"#;
        assert!(matches!(parse_scene(parallel_up), Err(SceneError::Invalid(_))));

        assert!(matches!(parse_scene("{"), Err(SceneError::Parse(_))));
    }

    #[test]
    fn test_singular_transform_rejected() {
        let json = r#"{
            "camera": { "position": [0, 0, 5], "look_at": [0, 0, 0] },
            "objects": [ { "shape": "box", "transform": { "scale": [1, 0, 1] } } ]
        }"#;
        let desc = parse_scene(json).expect("parses");
        assert!(matches!(desc.flatten_objects(), Err(SceneError::Invalid(_))));
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_scene("/nonexistent/prism/scene.json").unwrap_err();
        assert!(matches!(err, SceneError::Io { .. }));
    }
}
