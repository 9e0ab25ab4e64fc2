use anyhow::{Context, Result};
use clap::Parser;
use prism_renderer::{render, CancelToken, RenderStatus, RenderTarget, Scene};

mod args;

use args::Args;

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args = Args::parse();
    let config = args.render_config();

    let loaded = prism_core::load_scene(&args.scene)
        .with_context(|| format!("Failed to load scene {}", args.scene.display()))?;
    let scene = Scene::from_loaded(loaded).context("Failed to build scene")?;

    let mut target = RenderTarget::for_camera(args.width, scene.camera());
    let report = render(&scene, &config, &mut target, &CancelToken::new());
    if let RenderStatus::Cancelled { rows_done } = report.status {
        log::warn!("Render stopped early after {} rows", rows_done);
    }
    log::info!(
        "{} rays cast, deepest recursion {}",
        report.stats.rays_cast,
        report.stats.max_depth_reached
    );

    let image = image::RgbImage::from_raw(target.width(), target.height(), target.to_top_down())
        .context("Render buffer does not match the image size")?;
    image
        .save(&args.output)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;
    log::info!("Wrote {}", args.output.display());

    Ok(())
}
