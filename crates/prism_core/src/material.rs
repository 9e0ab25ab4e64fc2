//! Phong surface materials.

use prism_math::Vec3;

/// Color type alias (linear RGB, typically 0-1 per channel)
pub type Color = Vec3;

/// Surface description used by the Phong shader and the recursive tracer.
///
/// All coefficients are per-channel colors so tinted glass and colored
/// mirrors fall out naturally. A material is immutable for the duration of a
/// render and shared by every surface point of the objects that use it.
#[derive(Clone, Debug, PartialEq)]
pub struct Material {
    /// Emitted light, added once regardless of lights (ke)
    pub emissive: Color,

    /// Response to the scene ambient light (ka)
    pub ambient: Color,

    /// Lambertian reflectance (kd)
    pub diffuse: Color,

    /// Phong highlight reflectance (ks)
    pub specular: Color,

    /// Mirror reflection weight (kr)
    pub reflective: Color,

    /// Transmission weight (kt); also how much light an occluder lets through
    pub transmissive: Color,

    /// Phong exponent in [0, 1], scaled by 128 when shading
    pub shininess: f32,

    /// Refractive index of the volume this surface bounds
    pub index: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            emissive: Color::ZERO,
            ambient: Color::ZERO,
            diffuse: Color::ZERO,
            specular: Color::ZERO,
            reflective: Color::ZERO,
            transmissive: Color::ZERO,
            shininess: 0.0,
            index: 1.0,
        }
    }
}

impl Material {
    /// A matte material with the given diffuse color and no other terms.
    pub fn diffuse(color: Color) -> Self {
        Self {
            diffuse: color,
            ..Default::default()
        }
    }

    /// Builder: set the ambient reflectance.
    pub fn with_ambient(mut self, ambient: Color) -> Self {
        self.ambient = ambient;
        self
    }

    /// Builder: set specular reflectance and shininess.
    pub fn with_specular(mut self, specular: Color, shininess: f32) -> Self {
        self.specular = specular;
        self.shininess = shininess;
        self
    }

    /// Builder: set the mirror reflection weight.
    pub fn with_reflective(mut self, reflective: Color) -> Self {
        self.reflective = reflective;
        self
    }

    /// Builder: set transmission weight and refractive index.
    pub fn with_transmissive(mut self, transmissive: Color, index: f32) -> Self {
        self.transmissive = transmissive;
        self.index = index;
        self
    }

    /// Builder: set the emitted color.
    pub fn with_emissive(mut self, emissive: Color) -> Self {
        self.emissive = emissive;
        self
    }

    /// `1 - kt` per channel: how much of the surface is not see-through.
    pub fn opacity(&self) -> Color {
        Color::ONE - self.transmissive
    }

    /// True if the material spawns reflection rays at all.
    pub fn is_reflective(&self) -> bool {
        self.reflective.max_element() > 0.0
    }

    /// True if the material spawns refraction rays at all.
    pub fn is_transmissive(&self) -> bool {
        self.transmissive.max_element() > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_material_is_black_vacuum() {
        let m = Material::default();
        assert_eq!(m.diffuse, Color::ZERO);
        assert_eq!(m.index, 1.0);
        assert!(!m.is_reflective());
        assert!(!m.is_transmissive());
    }

    #[test]
    fn test_opacity() {
        let glass = Material::default().with_transmissive(Color::new(0.9, 0.5, 0.0), 1.5);
        let opacity = glass.opacity();

        assert!((opacity.x - 0.1).abs() < 1e-6);
        assert!((opacity.y - 0.5).abs() < 1e-6);
        assert_eq!(opacity.z, 1.0);
        assert!(glass.is_transmissive());
    }
}
