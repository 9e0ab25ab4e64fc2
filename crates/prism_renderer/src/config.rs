//! Render configuration.

use prism_math::{Mat4, Vec3};

/// Per-pixel antialiasing strategy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Antialias {
    /// One ray through the pixel center.
    None,
    /// One ray at a random point inside the pixel.
    Jitter,
    /// An N×N grid of sub-pixel samples, optionally jittered within each cell.
    Supersample { grid: u32, jitter: bool },
    /// Recursive quadrant subdivision where the color varies.
    Adaptive { max_depth: u32 },
}

/// What happens between the image plane and the scene.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LensMode {
    /// Ideal pinhole: everything in focus, nothing moves.
    Pinhole,
    /// Finite aperture focused at `focal_distance` along each primary ray.
    DepthOfField {
        focal_distance: f32,
        aperture: f32,
        samples: u32,
    },
    /// Average over `samples` poses, pose k displacing every object by `step`ᵏ.
    MotionBlur { step: Mat4, samples: u32 },
}

impl LensMode {
    /// Motion blur with the default step: a small slide along +x.
    pub fn motion_blur() -> Self {
        LensMode::MotionBlur {
            step: Mat4::from_translation(Vec3::new(0.002, 0.0, 0.0)),
            samples: 100,
        }
    }
}

/// Area-light shadow settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SoftShadows {
    /// Half-width of the cube light positions are jittered in
    pub radius: f32,
    pub samples: u32,
}

impl SoftShadows {
    pub fn new(radius: f32) -> Self {
        Self {
            radius,
            samples: 150,
        }
    }
}

/// Glossy reflection settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Glossy {
    pub samples: u32,
    /// Maximum offset of a perturbed ray along each orthogonal axis
    pub spread: f32,
}

impl Default for Glossy {
    fn default() -> Self {
        Self {
            samples: 100,
            spread: 0.1,
        }
    }
}

/// Render configuration.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Maximum recursion depth for reflection and refraction
    pub depth_limit: u32,
    /// Skip child rays when the direct contribution's largest channel is
    /// below this; zero disables the shortcut
    pub early_out: f32,
    pub antialias: Antialias,
    pub lens: LensMode,
    pub soft_shadows: Option<SoftShadows>,
    pub glossy: Option<Glossy>,
    /// Replace diffuse color with the scene texture where shapes have UVs
    pub texture_mapping: bool,
    /// Bend normals by the scene texture's luminance where supported
    pub bump_mapping: bool,
    /// Look up the background image on a miss instead of returning black
    pub background: bool,
    /// Base seed for every stochastic feature
    pub seed: u64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            depth_limit: 3,
            early_out: 0.0,
            antialias: Antialias::None,
            lens: LensMode::Pinhole,
            soft_shadows: None,
            glossy: None,
            texture_mapping: false,
            bump_mapping: false,
            background: true,
            seed: 0,
        }
    }
}
