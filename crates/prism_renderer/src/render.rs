//! Whole-image rendering: the pixel buffer, parallel row loop and cancellation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use prism_core::Color;
use rayon::prelude::*;

use crate::camera::Camera;
use crate::config::RenderConfig;
use crate::sampling::render_pixel;
use crate::scene::Scene;
use crate::tracer::TraceStats;

/// RGB byte buffer, row-major, row 0 at the bottom of the image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderTarget {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl RenderTarget {
    /// Black buffer of `width × height` pixels.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; byte_len(width, height)],
        }
    }

    /// Height that keeps `aspect_ratio` (width / height) for a given width.
    pub fn height_for_width(width: u32, aspect_ratio: f32) -> u32 {
        if aspect_ratio <= 0.0 {
            return width;
        }
        (width as f32 / aspect_ratio + 0.5).floor() as u32
    }

    /// Buffer `width` pixels wide, shaped like the camera's image plane.
    pub fn for_camera(width: u32, camera: &Camera) -> Self {
        Self::new(width, Self::height_for_width(width, camera.aspect_ratio()))
    }

    /// Reallocate for a new size. Old pixels are discarded.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.data = vec![0; byte_len(width, height)];
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// RGB at pixel (x, y), y counted from the bottom.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 3;
        Some([self.data[i], self.data[i + 1], self.data[i + 2]])
    }

    /// Bytes reordered so the first row is the top of the image.
    pub fn to_top_down(&self) -> Vec<u8> {
        let row_len = self.width as usize * 3;
        if row_len == 0 {
            return Vec::new();
        }
        self.data
            .chunks(row_len)
            .rev()
            .flatten()
            .copied()
            .collect()
    }
}

fn byte_len(width: u32, height: u32) -> usize {
    width as usize * height as usize * 3
}

/// Quantize a color: clamp to [0, 1], then ⌊255·c⌋ per channel.
pub fn quantize(color: Color) -> [u8; 3] {
    let c = color.clamp(Color::ZERO, Color::ONE) * 255.0;
    [c.x as u8, c.y as u8, c.z as u8]
}

/// Shared flag for stopping an in-flight render.
///
/// Clones observe the same flag; the render loop checks it before each row.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    /// Clear the flag so the token can be reused for the next render.
    pub fn reset(&self) {
        self.0.store(false, Ordering::Relaxed);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderStatus {
    Completed,
    /// Stopped early; rows that never started are left black.
    Cancelled { rows_done: u32 },
}

#[derive(Debug, Clone)]
pub struct RenderReport {
    pub status: RenderStatus,
    pub stats: TraceStats,
    pub elapsed: Duration,
}

/// Render `scene` into `target`, overwriting every byte.
///
/// Rows are traced in parallel; each row writes only its own slice of the
/// buffer.
pub fn render(
    scene: &Scene,
    config: &RenderConfig,
    target: &mut RenderTarget,
    cancel: &CancelToken,
) -> RenderReport {
    let start = Instant::now();
    let (width, height) = (target.width, target.height);
    log::info!(
        "Rendering {}x{} (depth limit {}, {:?}, {:?})",
        width,
        height,
        config.depth_limit,
        config.antialias,
        config.lens
    );

    let row_len = (width as usize * 3).max(1);
    let (rows_done, stats) = target
        .data
        .par_chunks_mut(row_len)
        .enumerate()
        .map(|(j, row)| {
            if cancel.is_cancelled() {
                row.fill(0);
                return (0u32, TraceStats::default());
            }
            let mut stats = TraceStats::default();
            for (x, pixel) in row.chunks_exact_mut(3).enumerate() {
                let color = render_pixel(scene, config, x as u32, j as u32, width, height, &mut stats);
                pixel.copy_from_slice(&quantize(color));
            }
            (1u32, stats)
        })
        .reduce(
            || (0, TraceStats::default()),
            |(rows_a, mut stats_a), (rows_b, stats_b)| {
                stats_a.merge(stats_b);
                (rows_a + rows_b, stats_a)
            },
        );

    let elapsed = start.elapsed();
    let status = if rows_done < height {
        log::info!("Render cancelled after {}/{} rows", rows_done, height);
        RenderStatus::Cancelled { rows_done }
    } else {
        log::info!(
            "Render finished in {:.2?} ({} rays, {} primary samples)",
            elapsed,
            stats.rays_cast,
            stats.primary_samples
        );
        RenderStatus::Completed
    };

    RenderReport {
        status,
        stats,
        elapsed,
    }
}
