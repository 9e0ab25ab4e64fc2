//! Light sources.
//!
//! Lights answer five questions about a surface point: which way the light
//! is, what color arrives, how much falls off with distance, and how much is
//! blocked (hard or soft).

use std::fmt;

use prism_core::scene_file::{AttenuationFactors, Flaps, PointFalloff};
use prism_core::{Color, LightDesc};
use prism_math::{Ray, Vec3};
use rand::RngCore;

use crate::gen_f32;
use crate::scene::SceneView;

/// A light source owned by the scene for the whole render.
pub trait Light: Send + Sync + fmt::Debug {
    /// Unit direction from `p` toward the light.
    fn direction(&self, p: Vec3) -> Vec3;

    /// Light color arriving at `p`, before attenuation.
    fn color(&self, p: Vec3) -> Color;

    /// Distance falloff in [0, 1].
    fn distance_attenuation(&self, p: Vec3, factors: &AttenuationFactors) -> f32;

    /// Fraction of light reaching `p`: the first occluder's `kt`, or one.
    fn shadow_attenuation(&self, p: Vec3, view: &SceneView) -> Color;

    /// Area-light approximation of [`Light::shadow_attenuation`].
    ///
    /// The default is the hard shadow, for lights with no position to jitter.
    fn shadow_attenuation_soft(
        &self,
        p: Vec3,
        _radius: f32,
        _samples: u32,
        view: &SceneView,
        _rng: &mut dyn RngCore,
    ) -> Color {
        self.shadow_attenuation(p, view)
    }
}

/// Build a light from its scene-file description.
pub fn light_from_desc(desc: &LightDesc) -> Box<dyn Light> {
    let falloff = desc.falloff();
    match *desc {
        LightDesc::Directional { direction, color } => {
            Box::new(DirectionalLight::new(Vec3::from(direction), Color::from(color)))
        }
        LightDesc::Point {
            position, color, ..
        } => Box::new(PointLight::new(Vec3::from(position), Color::from(color)).with_falloff(falloff)),
        LightDesc::Spot {
            position,
            color,
            direction,
            angle,
            ..
        } => Box::new(SpotLight::new(
            PointLight::new(Vec3::from(position), Color::from(color)).with_falloff(falloff),
            Vec3::from(direction),
            angle.to_radians(),
        )),
        LightDesc::Warn {
            position,
            color,
            direction,
            exponent,
            flaps,
            ..
        } => Box::new(WarnLight::new(
            PointLight::new(Vec3::from(position), Color::from(color)).with_falloff(falloff),
            Vec3::from(direction),
            exponent,
            flaps,
        )),
    }
}

/// Light arriving from a single direction at infinity.
#[derive(Debug, Clone)]
pub struct DirectionalLight {
    /// Direction the light travels
    orientation: Vec3,
    color: Color,
}

impl DirectionalLight {
    pub fn new(orientation: Vec3, color: Color) -> Self {
        if orientation.length_squared() == 0.0 {
            log::warn!("Directional light with zero direction contributes nothing");
        }
        Self {
            orientation: orientation.normalize_or_zero(),
            color,
        }
    }
}

impl Light for DirectionalLight {
    fn direction(&self, _p: Vec3) -> Vec3 {
        -self.orientation
    }

    fn color(&self, _p: Vec3) -> Color {
        self.color
    }

    fn distance_attenuation(&self, _p: Vec3, _factors: &AttenuationFactors) -> f32 {
        1.0
    }

    fn shadow_attenuation(&self, p: Vec3, view: &SceneView) -> Color {
        let ray = Ray::new(p, -self.orientation);
        match view.intersect(&ray) {
            Some(hit) => hit.material().transmissive,
            None => Color::ONE,
        }
    }
}

/// Omnidirectional light at a point.
#[derive(Debug, Clone)]
pub struct PointLight {
    position: Vec3,
    color: Color,
    falloff: PointFalloff,
}

impl PointLight {
    pub fn new(position: Vec3, color: Color) -> Self {
        Self {
            position,
            color,
            falloff: PointFalloff::default(),
        }
    }

    /// Builder: set the constant/linear/quadratic distance coefficients.
    pub fn with_falloff(mut self, falloff: PointFalloff) -> Self {
        self.falloff = falloff;
        self
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Unit vector from the light toward `p`.
    fn link(&self, p: Vec3) -> Vec3 {
        (p - self.position).normalize_or_zero()
    }
}

/// Transmission of the first thing between `p` and a light at `position`.
fn occlusion_toward(position: Vec3, p: Vec3, view: &SceneView) -> Color {
    let to_light = position - p;
    let distance = to_light.length();
    let ray = Ray::new(p, to_light);
    match view.intersect(&ray) {
        Some(hit) if hit.t <= distance => hit.material().transmissive,
        _ => Color::ONE,
    }
}

/// Average hard shadow over light positions jittered in a cube of half-width `radius`.
fn soft_occlusion(
    position: Vec3,
    p: Vec3,
    radius: f32,
    samples: u32,
    view: &SceneView,
    rng: &mut dyn RngCore,
) -> Color {
    let samples = samples.max(1);
    let mut total = Color::ZERO;
    for _ in 0..samples {
        let jitter = Vec3::new(
            gen_f32(rng) * 2.0 - 1.0,
            gen_f32(rng) * 2.0 - 1.0,
            gen_f32(rng) * 2.0 - 1.0,
        );
        total += occlusion_toward(position + radius * jitter, p, view);
    }
    total / samples as f32
}

impl Light for PointLight {
    fn direction(&self, p: Vec3) -> Vec3 {
        (self.position - p).normalize_or_zero()
    }

    fn color(&self, _p: Vec3) -> Color {
        self.color
    }

    fn distance_attenuation(&self, p: Vec3, factors: &AttenuationFactors) -> f32 {
        let PointFalloff {
            constant,
            linear,
            quadratic,
        } = self.falloff;
        if constant <= 0.0 && linear <= 0.0 && quadratic <= 0.0 {
            return 1.0;
        }
        let d = (self.position - p).length();
        let denominator = constant * factors.constant
            + linear * d * factors.linear
            + quadratic * d * d * factors.quadratic;
        if denominator <= 0.0 {
            return 1.0;
        }
        (1.0 / denominator).min(1.0)
    }

    fn shadow_attenuation(&self, p: Vec3, view: &SceneView) -> Color {
        occlusion_toward(self.position, p, view)
    }

    fn shadow_attenuation_soft(
        &self,
        p: Vec3,
        radius: f32,
        samples: u32,
        view: &SceneView,
        rng: &mut dyn RngCore,
    ) -> Color {
        soft_occlusion(self.position, p, radius, samples, view, rng)
    }
}

/// Point light restricted to a cone.
#[derive(Debug, Clone)]
pub struct SpotLight {
    point: PointLight,
    central_direction: Vec3,
    /// Half-angle in radians
    angle: f32,
}

impl SpotLight {
    pub fn new(point: PointLight, central_direction: Vec3, angle: f32) -> Self {
        Self {
            point,
            central_direction: central_direction.normalize_or_zero(),
            angle,
        }
    }
}

impl Light for SpotLight {
    fn direction(&self, p: Vec3) -> Vec3 {
        self.point.direction(p)
    }

    fn color(&self, p: Vec3) -> Color {
        let cos = self.central_direction.dot(self.point.link(p)).clamp(-1.0, 1.0);
        if cos.acos() < self.angle {
            self.point.color
        } else {
            Color::ZERO
        }
    }

    fn distance_attenuation(&self, p: Vec3, factors: &AttenuationFactors) -> f32 {
        self.point.distance_attenuation(p, factors)
    }

    fn shadow_attenuation(&self, p: Vec3, view: &SceneView) -> Color {
        self.point.shadow_attenuation(p, view)
    }

    fn shadow_attenuation_soft(
        &self,
        p: Vec3,
        radius: f32,
        samples: u32,
        view: &SceneView,
        rng: &mut dyn RngCore,
    ) -> Color {
        self.point
            .shadow_attenuation_soft(p, radius, samples, view, rng)
    }
}

/// Warn light: a point light whose intensity falls off as `cos^exponent`
/// away from its central direction, cut off outside axis-aligned flaps.
#[derive(Debug, Clone)]
pub struct WarnLight {
    point: PointLight,
    central_direction: Vec3,
    exponent: f32,
    flaps: Flaps,
}

impl WarnLight {
    pub fn new(point: PointLight, central_direction: Vec3, exponent: f32, flaps: Flaps) -> Self {
        Self {
            point,
            central_direction: central_direction.normalize_or_zero(),
            exponent,
            flaps,
        }
    }

    fn inside_flaps(&self, p: Vec3) -> bool {
        let within = |range: [f32; 2], v: f32| v >= range[0] && v <= range[1];
        within(self.flaps.x, p.x) && within(self.flaps.y, p.y) && within(self.flaps.z, p.z)
    }
}

impl Light for WarnLight {
    fn direction(&self, p: Vec3) -> Vec3 {
        self.point.direction(p)
    }

    fn color(&self, p: Vec3) -> Color {
        if !self.inside_flaps(p) {
            return Color::ZERO;
        }
        let cos = self.central_direction.dot(self.point.link(p));
        if cos <= 0.0 {
            return Color::ZERO;
        }
        self.point.color * cos.powf(self.exponent)
    }

    fn distance_attenuation(&self, p: Vec3, factors: &AttenuationFactors) -> f32 {
        self.point.distance_attenuation(p, factors)
    }

    fn shadow_attenuation(&self, p: Vec3, view: &SceneView) -> Color {
        self.point.shadow_attenuation(p, view)
    }

    fn shadow_attenuation_soft(
        &self,
        p: Vec3,
        radius: f32,
        samples: u32,
        view: &SceneView,
        rng: &mut dyn RngCore,
    ) -> Color {
        self.point
            .shadow_attenuation_soft(p, radius, samples, view, rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::Camera;
    use crate::scene::Scene;
    use crate::shape::shape_for;
    use prism_core::{Material, ShapeKind};
    use prism_math::Mat4;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::Arc;

    fn empty_scene() -> Scene {
        Scene::new(Camera::new(
            Vec3::new(0.0, 0.0, 10.0),
            Vec3::ZERO,
            Vec3::Y,
            45.0,
            1.0,
        ))
    }

    /// A glass-ish unit sphere sitting between the origin and a light above.
    fn occluded_scene(kt: Color) -> Scene {
        let mut scene = empty_scene();
        scene.add_object(
            shape_for(ShapeKind::Sphere),
            Mat4::from_translation(Vec3::new(0.0, 3.0, 0.0)),
            Arc::new(Material::default().with_transmissive(kt, 1.0)),
        );
        scene
    }

    #[test]
    fn test_directional_light() {
        let light = DirectionalLight::new(Vec3::new(0.0, -2.0, 0.0), Color::ONE);
        let scene = empty_scene();

        assert_eq!(light.direction(Vec3::ZERO), Vec3::Y);
        assert_eq!(light.distance_attenuation(Vec3::ZERO, scene.attenuation()), 1.0);
        assert_eq!(light.shadow_attenuation(Vec3::ZERO, &scene.view()), Color::ONE);
    }

    #[test]
    fn test_transparent_occluder_attenuates() {
        let kt = Color::new(0.5, 0.25, 0.0);
        let scene = occluded_scene(kt);

        let directional = DirectionalLight::new(Vec3::new(0.0, -1.0, 0.0), Color::ONE);
        assert_eq!(directional.shadow_attenuation(Vec3::ZERO, &scene.view()), kt);

        let above = PointLight::new(Vec3::new(0.0, 10.0, 0.0), Color::ONE);
        assert_eq!(above.shadow_attenuation(Vec3::ZERO, &scene.view()), kt);

        // Light sits between the point and the occluder
        let below = PointLight::new(Vec3::new(0.0, 1.0, 0.0), Color::ONE);
        assert_eq!(below.shadow_attenuation(Vec3::ZERO, &scene.view()), Color::ONE);
    }

    #[test]
    fn test_point_distance_attenuation() {
        let factors = AttenuationFactors::default();
        let p = Vec3::ZERO;

        let none = PointLight::new(Vec3::new(0.0, 4.0, 0.0), Color::ONE);
        assert_eq!(none.distance_attenuation(p, &factors), 1.0);

        let quadratic = none.clone().with_falloff(PointFalloff {
            constant: 0.0,
            linear: 0.0,
            quadratic: 0.5,
        });
        // 1 / (0.5 * 16)
        assert!((quadratic.distance_attenuation(p, &factors) - 0.125).abs() < 1e-6);

        let close = PointLight::new(Vec3::new(0.0, 0.1, 0.0), Color::ONE).with_falloff(PointFalloff {
            constant: 0.1,
            linear: 0.0,
            quadratic: 0.0,
        });
        assert_eq!(close.distance_attenuation(p, &factors), 1.0);

        let halved = AttenuationFactors {
            constant: 1.0,
            linear: 1.0,
            quadratic: 0.5,
        };
        assert!((quadratic.distance_attenuation(p, &halved) - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_soft_shadow_zero_radius_matches_hard() {
        let kt = Color::new(0.3, 0.6, 0.9);
        let scene = occluded_scene(kt);
        let light = PointLight::new(Vec3::new(0.0, 10.0, 0.0), Color::ONE);
        let mut rng = StdRng::seed_from_u64(3);

        let hard = light.shadow_attenuation(Vec3::ZERO, &scene.view());
        let soft = light.shadow_attenuation_soft(Vec3::ZERO, 0.0, 150, &scene.view(), &mut rng);
        assert!((hard - soft).abs().max_element() < 1e-4);
    }

    #[test]
    fn test_soft_shadow_penumbra_is_partial() {
        // Point at the edge of the occluder's shadow: a wide light is partly visible
        let scene = occluded_scene(Color::ZERO);
        let light = PointLight::new(Vec3::new(0.0, 10.0, 0.0), Color::ONE);
        let p = Vec3::new(1.2, 0.0, 0.0);
        let mut rng = StdRng::seed_from_u64(11);

        let soft = light.shadow_attenuation_soft(p, 3.0, 400, &scene.view(), &mut rng);
        assert!(soft.x > 0.0 && soft.x < 1.0, "penumbra value {}", soft.x);
    }

    #[test]
    fn test_spot_cone() {
        let spot = SpotLight::new(
            PointLight::new(Vec3::new(0.0, 5.0, 0.0), Color::ONE),
            Vec3::new(0.0, -1.0, 0.0),
            30f32.to_radians(),
        );

        assert_eq!(spot.color(Vec3::ZERO), Color::ONE);
        assert_eq!(spot.color(Vec3::new(10.0, 0.0, 0.0)), Color::ZERO);
        // Exactly along the axis must not produce NaN from acos
        assert_eq!(spot.color(Vec3::new(0.0, -100.0, 0.0)), Color::ONE);
    }

    #[test]
    fn test_warn_falloff_and_flaps() {
        let warn = WarnLight::new(
            PointLight::new(Vec3::new(0.0, 5.0, 0.0), Color::ONE),
            Vec3::new(0.0, -1.0, 0.0),
            2.0,
            Flaps {
                x: [-3.0, 3.0],
                ..Flaps::default()
            },
        );

        assert!((warn.color(Vec3::ZERO) - Color::ONE).abs().max_element() < 1e-6);

        // 45 degrees off-axis: cos^2 = 0.5
        let off_axis = warn.color(Vec3::new(2.0, 3.0, 0.0));
        assert!((off_axis.x - 0.5).abs() < 1e-5);

        assert_eq!(warn.color(Vec3::new(4.0, 0.0, 0.0)), Color::ZERO);
        assert_eq!(warn.color(Vec3::new(0.0, 10.0, 0.0)), Color::ZERO);
    }

    #[test]
    fn test_light_from_desc() {
        let desc = LightDesc::Spot {
            position: [0.0, 5.0, 0.0],
            color: [1.0, 1.0, 1.0],
            direction: [0.0, -1.0, 0.0],
            angle: 10.0,
            constant_attenuation: 0.0,
            linear_attenuation: 0.0,
            quadratic_attenuation: 0.0,
        };
        let light = light_from_desc(&desc);

        assert_eq!(light.color(Vec3::ZERO), Color::ONE);
        assert_eq!(light.color(Vec3::new(5.0, 0.0, 0.0)), Color::ZERO);
        assert!((light.direction(Vec3::ZERO) - Vec3::Y).length() < 1e-6);
    }
}
