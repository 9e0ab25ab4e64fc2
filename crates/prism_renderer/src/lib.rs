//! Prism renderer: a recursive Whitted-style ray tracer.
//!
//! Scenes are built from unit primitives placed by affine transforms, lit
//! by Phong lights, and traced with reflection, refraction through nested
//! media and optional stochastic effects (antialiasing, depth of field,
//! motion blur, soft shadows, glossy reflection). Rows of the output image
//! are rendered in parallel.

mod camera;
mod config;
mod cuboid;
mod light;
mod medium;
mod object;
mod quadric;
mod render;
mod sampling;
mod scene;
mod shading;
mod shape;
mod sphere;
mod square;
mod tracer;

pub use camera::Camera;
pub use config::{Antialias, Glossy, LensMode, RenderConfig, SoftShadows};
pub use cuboid::Cuboid;
pub use light::{light_from_desc, DirectionalLight, Light, PointLight, SpotLight, WarnLight};
pub use medium::{Crossing, MediumStack, VACUUM_INDEX};
pub use object::{Intersection, SceneObject};
pub use quadric::{HyperbolicParaboloid, Hyperboloid, Paraboloid};
pub use render::{quantize, render, CancelToken, RenderReport, RenderStatus, RenderTarget};
pub use sampling::{pixel_seed, render_pixel};
pub use scene::{Pose, Scene, SceneView};
pub use shading::shade;
pub use shape::{shape_for, LocalHit, Shape};
pub use sphere::Sphere;
pub use square::Square;
pub use tracer::{reflect, refract, trace, trace_ray, RayState, TraceStats};

/// Re-export the math and scene-data types the public API is written in
pub use prism_core::{Color, Material};
pub use prism_math::{Aabb, Interval, Ray, Vec3};

use rand::{Rng, RngCore};

/// Uniform sample in [0, 1).
pub(crate) fn gen_f32(rng: &mut dyn RngCore) -> f32 {
    rng.gen()
}
