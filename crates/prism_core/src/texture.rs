//! Bitmap images for texture mapping, bump mapping and backgrounds.
//!
//! Pixels are kept as raw 8-bit RGB triples with the bottom row first, which
//! matches normalized screen coordinates where y grows upward.

use std::path::Path;

use prism_math::Vec3;
use thiserror::Error;

/// Errors that can occur during bitmap loading.
#[derive(Error, Debug)]
pub enum TextureError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image decoding error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("Bitmap {path} has no pixels")]
    Empty { path: String },

    #[error("Bitmap {path} expected {expected} pixels, got {actual}")]
    SizeMismatch {
        path: String,
        expected: usize,
        actual: usize,
    },
}

pub type TextureResult<T> = Result<T, TextureError>;

/// A loaded RGB image.
#[derive(Clone, Debug)]
pub struct Bitmap {
    width: u32,
    height: u32,
    /// Row-major, bottom row first
    pixels: Vec<[u8; 3]>,
    /// Source file path (for debugging)
    path: String,
}

impl Bitmap {
    /// Create a bitmap from bottom-up, row-major pixel data.
    pub fn new(
        width: u32,
        height: u32,
        pixels: Vec<[u8; 3]>,
        path: impl Into<String>,
    ) -> TextureResult<Self> {
        let path = path.into();
        let expected = width as usize * height as usize;
        if expected == 0 {
            return Err(TextureError::Empty { path });
        }
        if pixels.len() != expected {
            return Err(TextureError::SizeMismatch {
                path,
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
            path,
        })
    }

    /// Create a 1x1 bitmap of a single color.
    pub fn solid_color(color: [u8; 3]) -> Self {
        Self {
            width: 1,
            height: 1,
            pixels: vec![color],
            path: "<solid>".to_string(),
        }
    }

    /// Convert a decoded image (top row first) into a bitmap.
    pub fn from_rgb_image(img: &image::RgbImage, path: impl Into<String>) -> TextureResult<Self> {
        let (width, height) = img.dimensions();
        let mut pixels = Vec::with_capacity(width as usize * height as usize);
        for y in (0..height).rev() {
            for x in 0..width {
                pixels.push(img.get_pixel(x, y).0);
            }
        }
        Self::new(width, height, pixels, path)
    }

    /// Load a bitmap from an image file.
    pub fn open(path: impl AsRef<Path>) -> TextureResult<Self> {
        let path = path.as_ref();
        let img = image::open(path)?.to_rgb8();
        let bitmap = Self::from_rgb_image(&img, path.to_string_lossy())?;

        log::debug!(
            "Loaded bitmap: {} ({}x{})",
            bitmap.path,
            bitmap.width,
            bitmap.height
        );

        Ok(bitmap)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Sample the bitmap at normalized coordinates (nearest pixel).
    ///
    /// (0, 0) is the bottom-left corner. Coordinates outside [0, 1]² return
    /// black instead of wrapping.
    pub fn sample(&self, x: f32, y: f32) -> Vec3 {
        if !(0.0..=1.0).contains(&x) || !(0.0..=1.0).contains(&y) {
            return Vec3::ZERO;
        }
        let px = ((x * self.width as f32) as u32).min(self.width - 1);
        let py = ((y * self.height as f32) as u32).min(self.height - 1);
        self.pixel(px as i64, py as i64)
    }

    /// Color of an integer pixel, black outside the image.
    pub fn pixel(&self, x: i64, y: i64) -> Vec3 {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return Vec3::ZERO;
        }
        let [r, g, b] = self.pixels[(y as usize) * self.width as usize + x as usize];
        Vec3::new(r as f32, g as f32, b as f32) / 255.0
    }

    /// Luminance of an integer pixel.
    pub fn intensity(&self, x: i64, y: i64) -> f32 {
        let c = self.pixel(x, y);
        0.299 * c.x + 0.587 * c.y + 0.114 * c.z
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker_2x2() -> Bitmap {
        // Bottom row: black, white. Top row: red, blue.
        Bitmap::new(
            2,
            2,
            vec![[0, 0, 0], [255, 255, 255], [255, 0, 0], [0, 0, 255]],
            "<checker>",
        )
        .expect("valid bitmap")
    }

    #[test]
    fn test_solid_color_bitmap() {
        let bmp = Bitmap::solid_color([255, 128, 0]);
        let sample = bmp.sample(0.5, 0.5);

        assert!((sample.x - 1.0).abs() < 0.001);
        assert!((sample.y - 128.0 / 255.0).abs() < 0.001);
        assert_eq!(sample.z, 0.0);
    }

    #[test]
    fn test_sample_nearest_and_edges() {
        let bmp = checker_2x2();

        assert_eq!(bmp.sample(0.25, 0.25), Vec3::ZERO);
        assert_eq!(bmp.sample(0.75, 0.25), Vec3::ONE);
        assert_eq!(bmp.sample(0.25, 0.75), Vec3::new(1.0, 0.0, 0.0));
        // x = 1.0 is clamped onto the last column instead of overflowing
        assert_eq!(bmp.sample(1.0, 1.0), Vec3::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn test_sample_outside_range_is_black() {
        let bmp = Bitmap::solid_color([255, 255, 255]);

        assert_eq!(bmp.sample(-0.01, 0.5), Vec3::ZERO);
        assert_eq!(bmp.sample(0.5, 1.01), Vec3::ZERO);
        assert_eq!(bmp.pixel(3, 0), Vec3::ZERO);
    }

    #[test]
    fn test_intensity_weights() {
        let bmp = checker_2x2();
        assert!((bmp.intensity(1, 0) - 1.0).abs() < 1e-5);
        assert!((bmp.intensity(0, 1) - 0.299).abs() < 1e-5);
    }

    #[test]
    fn test_from_rgb_image_flips_rows() {
        let mut img = image::RgbImage::new(1, 2);
        img.put_pixel(0, 0, image::Rgb([255, 0, 0])); // top
        img.put_pixel(0, 1, image::Rgb([0, 255, 0])); // bottom

        let bmp = Bitmap::from_rgb_image(&img, "<mem>").expect("valid image");
        assert_eq!(bmp.pixel(0, 0), Vec3::new(0.0, 1.0, 0.0));
        assert_eq!(bmp.pixel(0, 1), Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_size_mismatch_is_rejected() {
        let err = Bitmap::new(2, 2, vec![[0, 0, 0]], "<bad>").unwrap_err();
        assert!(matches!(err, TextureError::SizeMismatch { expected: 4, .. }));
        assert!(matches!(
            Bitmap::new(0, 3, vec![], "<empty>"),
            Err(TextureError::Empty { .. })
        ));
    }
}
