//! Command-line parser.

use std::path::PathBuf;

use prism_renderer::{Antialias, Glossy, LensMode, RenderConfig, SoftShadows};

#[derive(Debug, clap::Parser)]
#[command(name = "prism", version, about = "Render a JSON scene to a PNG")]
pub(crate) struct Args {
    /// Scene description (JSON)
    pub scene: PathBuf,

    /// Output image path
    #[arg(short, long, default_value = "out.png")]
    pub output: PathBuf,

    /// Image width in pixels; the height follows the camera's aspect ratio
    #[arg(long, default_value_t = 512)]
    pub width: u32,

    /// Maximum reflection/refraction recursion depth
    #[arg(long, default_value_t = 3)]
    pub depth: u32,

    /// Skip reflection and refraction at hits whose direct light is dimmer than this
    #[arg(long, default_value_t = 0.0)]
    pub early_out: f32,

    #[arg(long, value_enum, default_value_t = AntialiasArg::None)]
    pub antialias: AntialiasArg,

    /// Grid size for `--antialias supersample`
    #[arg(long, default_value_t = 3)]
    pub grid: u32,

    /// Jitter supersample positions within their grid cells
    #[arg(long)]
    pub jitter: bool,

    /// Maximum subdivision depth for `--antialias adaptive`
    #[arg(long, default_value_t = 3)]
    pub adaptive_depth: u32,

    /// Jitter lights within a cube of this half-width to soften shadows
    #[arg(long, value_name = "RADIUS")]
    pub soft_shadows: Option<f32>,

    /// Blur mirror reflections
    #[arg(long)]
    pub glossy: bool,

    /// Depth of field: focal distance and aperture half-width
    #[arg(long, num_args = 2, value_names = ["FOCAL", "APERTURE"], conflicts_with = "motion_blur")]
    pub dof: Option<Vec<f32>>,

    /// Average poses of every object sliding along +x
    #[arg(long)]
    pub motion_blur: bool,

    /// Use the scene texture as diffuse color
    #[arg(long)]
    pub texture_mapping: bool,

    /// Bump surfaces by the scene texture's luminance
    #[arg(long)]
    pub bump_mapping: bool,

    /// Render black where rays miss instead of the background image
    #[arg(long)]
    pub no_background: bool,

    /// Seed for every stochastic effect
    #[arg(long, default_value_t = 0)]
    pub seed: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub(crate) enum AntialiasArg {
    None,
    Jitter,
    Supersample,
    Adaptive,
}

impl Args {
    pub fn render_config(&self) -> RenderConfig {
        let antialias = match self.antialias {
            AntialiasArg::None => Antialias::None,
            AntialiasArg::Jitter => Antialias::Jitter,
            AntialiasArg::Supersample => Antialias::Supersample {
                grid: self.grid,
                jitter: self.jitter,
            },
            AntialiasArg::Adaptive => Antialias::Adaptive {
                max_depth: self.adaptive_depth,
            },
        };

        let lens = match (&self.dof, self.motion_blur) {
            (Some(dof), _) if dof.len() == 2 => LensMode::DepthOfField {
                focal_distance: dof[0],
                aperture: dof[1],
                samples: 16,
            },
            (_, true) => LensMode::motion_blur(),
            _ => LensMode::Pinhole,
        };

        RenderConfig {
            depth_limit: self.depth,
            early_out: self.early_out,
            antialias,
            lens,
            soft_shadows: self.soft_shadows.map(SoftShadows::new),
            glossy: self.glossy.then(Glossy::default),
            texture_mapping: self.texture_mapping,
            bump_mapping: self.bump_mapping,
            background: !self.no_background,
            seed: self.seed,
        }
    }
}
