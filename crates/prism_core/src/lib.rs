//! Prism Core - renderer-agnostic scene description for the Prism ray tracer.
//!
//! This crate provides:
//!
//! - **Materials**: Phong surface coefficients shared by every point of an object
//! - **Bitmaps**: in-memory RGB images for textures, bump maps and backgrounds
//! - **Scene files**: the JSON scene schema, its loader and validation
//!
//! # Example
//!
//! ```ignore
//! use prism_core::scene_file::load_scene;
//!
//! let loaded = load_scene("scenes/glass.json")?;
//! println!("Loaded {} lights, {} objects",
//!     loaded.description.lights.len(),
//!     loaded.description.flatten_objects()?.len());
//! ```

pub mod material;
pub mod scene_file;
pub mod texture;

// Re-export commonly used types
pub use material::{Color, Material};
pub use scene_file::{
    load_scene, parse_scene, CameraDesc, FlatObject, LightDesc, LoadedScene, SceneDescription,
    SceneError, SceneResult, ShapeKind,
};
pub use texture::{Bitmap, TextureError, TextureResult};
