//! Recursive Whitted-style ray tracing.
//!
//! Each hit adds its direct Phong illumination and may spawn one reflected
//! and one refracted child. A child is only traced while the recursion depth
//! is under the configured limit and its weight (the product of every `kr` /
//! `kt` along the path) still exceeds the scene's termination threshold in
//! some channel.

use prism_core::Color;
use prism_math::{Ray, Vec3};
use rand::RngCore;

use crate::config::RenderConfig;
use crate::gen_f32;
use crate::medium::MediumStack;
use crate::scene::SceneView;
use crate::shading::shade;

/// Counters gathered while tracing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TraceStats {
    /// Every call into the recursive tracer
    pub rays_cast: u64,
    /// Top-level samples fired by the sampling layer
    pub primary_samples: u64,
    /// Deepest recursion level reached (0 = primary ray only)
    pub max_depth_reached: u32,
    /// `(from, to)` index pairs of every refraction, when enabled
    pub index_log: Option<Vec<(f32, f32)>>,
}

impl TraceStats {
    /// Stats that also record refractive-index transitions.
    pub fn with_index_log() -> Self {
        Self {
            index_log: Some(Vec::new()),
            ..Default::default()
        }
    }

    /// Fold another set of counters into this one.
    pub fn merge(&mut self, other: TraceStats) {
        self.rays_cast += other.rays_cast;
        self.primary_samples += other.primary_samples;
        self.max_depth_reached = self.max_depth_reached.max(other.max_depth_reached);
        if let (Some(log), Some(other_log)) = (&mut self.index_log, other.index_log) {
            log.extend(other_log);
        }
    }
}

/// Mirror `d` about `n`: `2·(n·−d)·n + d`.
pub fn reflect(d: Vec3, n: Vec3) -> Vec3 {
    (2.0 * n.dot(-d) * n + d).normalize_or_zero()
}

/// Refract unit direction `d` through a surface with unit normal `n`
/// facing against `d`, where `mu` is `from_index / to_index`.
///
/// Returns `None` under total internal reflection, i.e. once
/// `sin θi ≥ 1 / mu`.
pub fn refract(d: Vec3, n: Vec3, mu: f32) -> Option<Vec3> {
    let cos_i = (-d).dot(n).clamp(-1.0, 1.0);
    let sin_i = d.cross(n).length().min(1.0);

    let sin_t = mu * sin_i;
    if sin_t >= 1.0 {
        return None;
    }
    let cos_t = (1.0 - sin_t * sin_t).max(0.0).sqrt();

    Some((mu * d - (cos_t - mu * cos_i) * n).normalize_or_zero())
}

/// Per-sample switches that change as the recursion unfolds.
#[derive(Debug, Clone, Copy)]
pub struct RayState {
    /// Product of reflection/transmission coefficients so far
    pub weight: Color,
    pub depth: u32,
    /// Glossy cones are only cast from rays that are not themselves glossy
    pub glossy: bool,
}

impl RayState {
    pub fn primary() -> Self {
        Self {
            weight: Color::ONE,
            depth: 0,
            glossy: true,
        }
    }

    fn child(&self, coefficient: Color, glossy: bool) -> Self {
        Self {
            weight: self.weight * coefficient,
            depth: self.depth + 1,
            glossy,
        }
    }
}

/// Trace one primary ray and clamp the result to the displayable range.
pub fn trace(
    view: &SceneView,
    ray: &Ray,
    config: &RenderConfig,
    rng: &mut dyn RngCore,
    stats: &mut TraceStats,
) -> Color {
    stats.primary_samples += 1;
    let medium = MediumStack::new();
    trace_ray(view, ray, RayState::primary(), &medium, config, rng, stats)
        .clamp(Color::ZERO, Color::ONE)
}

/// Color carried back along `ray`. Unclamped.
pub fn trace_ray(
    view: &SceneView,
    ray: &Ray,
    state: RayState,
    medium: &MediumStack,
    config: &RenderConfig,
    rng: &mut dyn RngCore,
    stats: &mut TraceStats,
) -> Color {
    stats.rays_cast += 1;
    stats.max_depth_reached = stats.max_depth_reached.max(state.depth);

    let scene = view.scene();
    let Some(hit) = view.intersect(ray) else {
        return if config.background {
            scene.background_color(ray.direction)
        } else {
            Color::ZERO
        };
    };
    let hit = hit.facing(ray.direction);
    let material = hit.material();
    let point = ray.at(hit.t);

    let direct = shade(view, ray, &hit, config, rng);
    if state.depth >= config.depth_limit || direct.max_element() < config.early_out {
        return direct;
    }

    let threshold = scene.termination_threshold();
    let worth_tracing = |weight: Color| (weight - threshold).max_element() > 0.0;

    let mut total = direct;

    // Reflection
    let reflected = state.child(material.reflective, false);
    if worth_tracing(reflected.weight) {
        let mirror = reflect(ray.direction, hit.normal);
        let color = match config.glossy.filter(|_| state.glossy) {
            Some(glossy) => {
                let samples = glossy.samples.max(1);
                let (a, b) = mirror.any_orthonormal_pair();
                let mut sum = Color::ZERO;
                for _ in 0..samples {
                    let da = (gen_f32(rng) - 0.5) * glossy.spread;
                    let db = (gen_f32(rng) - 0.5) * glossy.spread;
                    let child = Ray::new(point, mirror + da * a + db * b);
                    sum += trace_ray(view, &child, reflected, medium, config, rng, stats);
                }
                sum / samples as f32
            }
            None => {
                let child = Ray::new(point, mirror);
                let reflected = RayState {
                    glossy: state.glossy,
                    ..reflected
                };
                trace_ray(view, &child, reflected, medium, config, rng, stats)
            }
        };
        total += material.reflective * color;
    }

    // Refraction
    let refracted = state.child(material.transmissive, state.glossy);
    if worth_tracing(refracted.weight) {
        let crossing = medium.cross(hit.object.id(), material.index);
        if let Some(direction) = refract(ray.direction, hit.normal, crossing.mu()) {
            if let Some(log) = stats.index_log.as_mut() {
                log.push((crossing.from_index, crossing.to_index));
            }
            let child = Ray::new(point, direction);
            let color = trace_ray(
                view,
                &child,
                refracted,
                &crossing.stack,
                config,
                rng,
                stats,
            );
            total += material.transmissive * color;
        }
    }

    total
}
