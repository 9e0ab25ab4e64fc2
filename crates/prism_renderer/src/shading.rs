//! Phong local illumination.

use prism_core::Color;
use prism_math::{Ray, Vec3};
use rand::RngCore;

use crate::config::RenderConfig;
use crate::object::Intersection;
use crate::scene::SceneView;

/// Shininess in [0, 1] is scaled by this to get the Phong exponent.
const SHININESS_SCALE: f32 = 128.0;

/// Direct illumination at a hit.
///
/// `hit.normal` must already face against `ray.direction`. Emissive and
/// ambient terms are added once; each light adds attenuated diffuse and
/// specular terms. Diffuse and ambient responses are scaled by the
/// material's opacity.
pub fn shade(
    view: &SceneView,
    ray: &Ray,
    hit: &Intersection,
    config: &RenderConfig,
    rng: &mut dyn RngCore,
) -> Color {
    let scene = view.scene();
    let material = hit.material();
    let opacity = material.opacity();
    let point = ray.at(hit.t);

    let mut total = material.emissive + material.ambient * scene.ambient_light() * opacity;

    let (diffuse_color, diffuse_normal) = surface_response(hit, config, scene.texture());
    let exponent = material.shininess * SHININESS_SCALE;

    for light in scene.lights() {
        let light_color = light.color(point);
        if light_color == Color::ZERO {
            continue;
        }

        let l = light.direction(point);
        let n = hit.normal;
        let r = 2.0 * (-l.dot(n)) * n + l;

        let diffuse = diffuse_color * l.dot(diffuse_normal).max(0.0) * opacity;
        let specular = material.specular * ray.direction.dot(r).max(0.0).powf(exponent);

        let shadow = match config.soft_shadows {
            Some(soft) => {
                light.shadow_attenuation_soft(point, soft.radius, soft.samples, view, rng)
            }
            None => light.shadow_attenuation(point, view),
        };
        let attenuation =
            light.distance_attenuation(point, scene.attenuation()) * shadow * light_color;

        total += attenuation * (diffuse + specular);
    }

    total
}

/// Diffuse reflectance and the normal used for the diffuse dot product.
fn surface_response(
    hit: &Intersection,
    config: &RenderConfig,
    texture: Option<&prism_core::Bitmap>,
) -> (Color, Vec3) {
    let material = hit.material();
    let fallback = (material.diffuse, hit.normal);

    let Some(texture) = texture.filter(|_| config.texture_mapping) else {
        return fallback;
    };
    let Some(uv) = hit.uv() else {
        return fallback;
    };

    let normal = if config.bump_mapping {
        hit.perturbed_normal(uv, texture).unwrap_or(hit.normal)
    } else {
        hit.normal
    };

    (texture.sample(uv.0, uv.1), normal)
}
