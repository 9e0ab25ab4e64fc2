//! Per-pixel integration on top of single-ray tracing.
//!
//! A pixel is resolved in two layers. The outer layer picks the scene
//! variants to average: a single pinhole view, a set of lens positions for
//! depth of field, or a set of object poses for motion blur. The inner
//! layer applies the antialiasing strategy to each variant, turning
//! sub-pixel positions into traced rays.

use prism_core::Color;
use prism_math::Ray;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

use crate::config::{Antialias, LensMode, RenderConfig};
use crate::gen_f32;
use crate::scene::{Pose, Scene};
use crate::tracer::{trace, TraceStats};

/// Largest per-channel difference still treated as the same color.
const ADAPTIVE_TOLERANCE: f32 = 0.01;

/// Seed for the random stream of one pixel.
pub fn pixel_seed(seed: u64, x: u32, y: u32) -> u64 {
    let mut h = seed ^ 0x9E37_79B9_7F4A_7C15;
    h ^= (x as u64).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    h = h.rotate_left(31);
    h ^= (y as u64).wrapping_mul(0x94D0_49BB_1331_11EB);
    h ^ (h >> 29)
}

/// Color of pixel (x, y) of a `width × height` image. Row 0 is the bottom.
pub fn render_pixel(
    scene: &Scene,
    config: &RenderConfig,
    x: u32,
    y: u32,
    width: u32,
    height: u32,
    stats: &mut TraceStats,
) -> Color {
    let mut rng = StdRng::seed_from_u64(pixel_seed(config.seed, x, y));
    let pixel = PixelFrame {
        x: x as f32,
        y: y as f32,
        width: width.max(1) as f32,
        height: height.max(1) as f32,
    };
    let camera = scene.camera();

    match config.lens {
        LensMode::Pinhole => {
            let view = scene.view();
            antialias(config.antialias, &pixel, &mut rng, &mut |nx, ny, rng| {
                trace(&view, &camera.ray_through(nx, ny), config, rng, stats)
            })
        }
        LensMode::DepthOfField {
            focal_distance,
            aperture,
            samples,
        } => {
            let view = scene.view();
            let offsets = lens_offsets(samples.max(1), aperture, &mut rng);
            let right = camera.u().normalize_or_zero();
            let up = camera.v().normalize_or_zero();

            let mut total = Color::ZERO;
            for &(ox, oy) in &offsets {
                let origin = camera.eye() + ox * right + oy * up;
                total += antialias(config.antialias, &pixel, &mut rng, &mut |nx, ny, rng| {
                    let focus = camera.ray_through(nx, ny).at(focal_distance);
                    let ray = Ray::new(origin, focus - origin);
                    trace(&view, &ray, config, rng, stats)
                });
            }
            total / offsets.len() as f32
        }
        LensMode::MotionBlur { step, samples } => {
            let samples = samples.max(1);
            let mut total = Color::ZERO;
            let mut poses_used = 0u32;
            for k in 0..samples {
                let Some(pose) = Pose::repeated(step, k) else {
                    continue;
                };
                let view = scene.posed(&pose);
                total += antialias(config.antialias, &pixel, &mut rng, &mut |nx, ny, rng| {
                    trace(&view, &camera.ray_through(nx, ny), config, rng, stats)
                });
                poses_used += 1;
            }
            if poses_used == 0 {
                return Color::ZERO;
            }
            total / poses_used as f32
        }
    }
}

/// Pixel position and image size, in pixels.
struct PixelFrame {
    x: f32,
    y: f32,
    width: f32,
    height: f32,
}

impl PixelFrame {
    /// Normalized screen coordinates of a point given in pixel-local [0, 1]².
    fn normalized(&self, sx: f32, sy: f32) -> (f32, f32) {
        ((self.x + sx) / self.width, (self.y + sy) / self.height)
    }
}

/// Sample callback: normalized screen coordinates in, traced color out.
type SampleFn<'a> = dyn FnMut(f32, f32, &mut dyn RngCore) -> Color + 'a;

fn antialias(
    strategy: Antialias,
    pixel: &PixelFrame,
    rng: &mut dyn RngCore,
    sample: &mut SampleFn<'_>,
) -> Color {
    match strategy {
        Antialias::None => {
            let (nx, ny) = pixel.normalized(0.5, 0.5);
            sample(nx, ny, rng)
        }
        Antialias::Jitter => {
            let (sx, sy) = (gen_f32(rng), gen_f32(rng));
            let (nx, ny) = pixel.normalized(sx, sy);
            sample(nx, ny, rng)
        }
        Antialias::Supersample { grid, jitter } => {
            let n = grid.max(2);
            let cell = 1.0 / n as f32;
            let mut total = Color::ZERO;
            for i in 0..n {
                for j in 0..n {
                    let (ox, oy) = if jitter {
                        (gen_f32(rng), gen_f32(rng))
                    } else {
                        (0.5, 0.5)
                    };
                    let (nx, ny) =
                        pixel.normalized((i as f32 + ox) * cell, (j as f32 + oy) * cell);
                    total += sample(nx, ny, rng);
                }
            }
            total / (n * n) as f32
        }
        Antialias::Adaptive { max_depth } => {
            let max_depth = max_depth.max(1);
            let mut total = Color::ZERO;
            for (qx, qy) in [(0.0, 0.0), (0.5, 0.0), (0.0, 0.5), (0.5, 0.5)] {
                total += adaptive_quadrant(pixel, qx, qy, 0.5, 1, max_depth, rng, sample);
            }
            total / 4.0
        }
    }
}

/// Average color of the square `[x0, x0+size] × [y0, y0+size]` (pixel-local).
///
/// The center and four corners are sampled; if any corner differs from the
/// center by more than the tolerance and depth allows, the square is split
/// into four and each quarter resolved on its own.
#[allow(clippy::too_many_arguments)]
fn adaptive_quadrant(
    pixel: &PixelFrame,
    x0: f32,
    y0: f32,
    size: f32,
    depth: u32,
    max_depth: u32,
    rng: &mut dyn RngCore,
    sample: &mut SampleFn<'_>,
) -> Color {
    let mut at = |sx: f32, sy: f32, rng: &mut dyn RngCore| {
        let (nx, ny) = pixel.normalized(sx, sy);
        sample(nx, ny, &mut *rng)
    };

    let half = size / 2.0;
    let center = at(x0 + half, y0 + half, rng);
    let corners = [
        at(x0, y0, rng),
        at(x0 + size, y0, rng),
        at(x0, y0 + size, rng),
        at(x0 + size, y0 + size, rng),
    ];

    let converged = corners
        .iter()
        .all(|c| (*c - center).abs().max_element() <= ADAPTIVE_TOLERANCE);

    if converged || depth >= max_depth {
        return (center + corners.iter().copied().sum::<Color>()) / 5.0;
    }

    let mut total = Color::ZERO;
    for (qx, qy) in [(0.0, 0.0), (half, 0.0), (0.0, half), (half, half)] {
        total += adaptive_quadrant(
            pixel,
            x0 + qx,
            y0 + qy,
            half,
            depth + 1,
            max_depth,
            rng,
            sample,
        );
    }
    total / 4.0
}

/// Points on a square aperture of half-width `aperture`.
fn lens_offsets(samples: u32, aperture: f32, rng: &mut dyn RngCore) -> Vec<(f32, f32)> {
    (0..samples)
        .map(|_| {
            (
                (gen_f32(rng) * 2.0 - 1.0) * aperture,
                (gen_f32(rng) * 2.0 - 1.0) * aperture,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::Camera;
    use crate::shape::shape_for;
    use prism_core::{Material, ShapeKind};
    use prism_math::{Mat4, Vec3};
    use std::sync::Arc;

    fn camera() -> Camera {
        Camera::new(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO, Vec3::Y, 45.0, 1.0)
    }

    /// An emissive white sphere that covers the frame center.
    fn glowing_sphere_scene() -> Scene {
        let mut scene = Scene::new(camera()).with_ambient_light(Color::ZERO);
        scene.add_object(
            shape_for(ShapeKind::Sphere),
            Mat4::IDENTITY,
            Arc::new(Material::default().with_emissive(Color::ONE)),
        );
        scene
    }

    fn lens_origin(scene: &Scene, offset: (f32, f32)) -> Vec3 {
        let camera = scene.camera();
        camera.eye()
            + offset.0 * camera.u().normalize_or_zero()
            + offset.1 * camera.v().normalize_or_zero()
    }

    fn pixel_with_stats(scene: &Scene, config: &RenderConfig, x: u32, y: u32, size: u32) -> (Color, TraceStats) {
        let mut stats = TraceStats::default();
        let color = render_pixel(scene, config, x, y, size, size, &mut stats);
        (color, stats)
    }

    #[test]
    fn test_plain_sample_hits_center() {
        let scene = glowing_sphere_scene();
        let (color, stats) = pixel_with_stats(&scene, &RenderConfig::default(), 5, 5, 11);

        assert_eq!(color, Color::ONE);
        assert_eq!(stats.primary_samples, 1);
    }

    #[test]
    fn test_supersample_counts() {
        let scene = glowing_sphere_scene();
        let config = RenderConfig {
            antialias: Antialias::Supersample {
                grid: 3,
                jitter: true,
            },
            ..Default::default()
        };
        let (color, stats) = pixel_with_stats(&scene, &config, 5, 5, 11);

        assert_eq!(stats.primary_samples, 9);
        assert!((color - Color::ONE).abs().max_element() < 1e-6);

        let tiny_grid = RenderConfig {
            antialias: Antialias::Supersample {
                grid: 1,
                jitter: false,
            },
            ..Default::default()
        };
        let (_, stats) = pixel_with_stats(&scene, &tiny_grid, 5, 5, 11);
        assert_eq!(stats.primary_samples, 4);
    }

    #[test]
    fn test_adaptive_uniform_region_stops_at_depth_one() {
        let scene = glowing_sphere_scene();
        let config = RenderConfig {
            antialias: Antialias::Adaptive { max_depth: 4 },
            ..Default::default()
        };
        let (color, stats) = pixel_with_stats(&scene, &config, 5, 5, 11);

        // 4 quadrants, center + 4 corners each
        assert_eq!(stats.primary_samples, 20);
        assert!((color - Color::ONE).abs().max_element() < 1e-6);

        let grid = RenderConfig {
            antialias: Antialias::Supersample {
                grid: 2,
                jitter: false,
            },
            ..Default::default()
        };
        let (grid_color, grid_stats) = pixel_with_stats(&scene, &grid, 5, 5, 11);
        assert_eq!(grid_stats.primary_samples, 4);
        assert!(stats.primary_samples >= grid_stats.primary_samples);
        assert!((grid_color - color).abs().max_element() < 1e-6);
    }

    #[test]
    fn test_adaptive_refines_at_edges() {
        // Tiny image: the sphere's silhouette crosses pixel (0, 0)
        let mut scene = Scene::new(camera()).with_ambient_light(Color::ZERO);
        scene.add_object(
            shape_for(ShapeKind::Sphere),
            Mat4::from_translation(Vec3::new(-4.14, -4.14, 0.0)) * Mat4::from_scale(Vec3::splat(0.3)),
            Arc::new(Material::default().with_emissive(Color::ONE)),
        );
        let config = RenderConfig {
            antialias: Antialias::Adaptive { max_depth: 3 },
            ..Default::default()
        };

        let edge_samples = (0..4)
            .flat_map(|x| (0..4).map(move |y| (x, y)))
            .map(|(x, y)| pixel_with_stats(&scene, &config, x, y, 4).1.primary_samples)
            .max()
            .unwrap_or(0);

        assert!(edge_samples > 20, "expected refinement, got {}", edge_samples);
    }

    #[test]
    fn test_pixel_is_reproducible_with_jitter() {
        let scene = glowing_sphere_scene();
        let config = RenderConfig {
            antialias: Antialias::Jitter,
            seed: 99,
            ..Default::default()
        };

        let (a, _) = pixel_with_stats(&scene, &config, 3, 4, 11);
        let (b, _) = pixel_with_stats(&scene, &config, 3, 4, 11);
        assert_eq!(a, b);
        assert_ne!(pixel_seed(99, 3, 4), pixel_seed(99, 4, 3));
    }

    #[test]
    fn test_depth_of_field_in_focus_point() {
        let scene = glowing_sphere_scene();
        let config = RenderConfig {
            lens: LensMode::DepthOfField {
                focal_distance: 9.0,
                aperture: 0.2,
                samples: 8,
            },
            ..Default::default()
        };
        let (color, stats) = pixel_with_stats(&scene, &config, 5, 5, 11);

        assert_eq!(stats.primary_samples, 8);
        assert!((color - Color::ONE).abs().max_element() < 1e-6);

        let origin = lens_origin(&scene, (0.2, 0.0));
        assert!((origin - Vec3::new(0.2, 0.0, 10.0)).length() < 1e-5);
    }

    #[test]
    fn test_motion_blur_smears_edge() {
        let scene = glowing_sphere_scene();
        let config = RenderConfig {
            lens: LensMode::MotionBlur {
                step: Mat4::from_translation(Vec3::new(0.5, 0.0, 0.0)),
                samples: 10,
            },
            ..Default::default()
        };
        let (color, stats) = pixel_with_stats(&scene, &config, 5, 5, 11);
        assert_eq!(stats.primary_samples, 10);
        // The sphere slides out of the center pixel after a few poses
        assert!(color.x > 0.0 && color.x < 1.0, "blurred value {}", color.x);

        // The scene itself is untouched
        let (still, _) = pixel_with_stats(&scene, &RenderConfig::default(), 5, 5, 11);
        assert_eq!(still, Color::ONE);
    }
}
