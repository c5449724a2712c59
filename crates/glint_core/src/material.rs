//! Surface materials for the sphere tracer.
//!
//! A single parameterized material covers every surface the kernel shades:
//! diffuse, glossy and mirror surfaces blend by `specular`, dielectrics are
//! selected by a non-zero index of refraction, and lights carry `emissive`.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::scene::SceneError;

/// Color type alias (RGB values typically 0-1)
pub type Color = Vec3;

/// Material parameters sampled by the shading kernel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Material {
    /// Reflectance multiplied into the path throughput at each hit
    pub diffuse: Color,

    /// Radiance added when the surface is hit
    pub emissive: Color,

    /// 0 = diffuse, 1 = perfect mirror
    pub specular: f32,

    /// Index of refraction (0 = opaque, > 0 = dielectric)
    pub ior: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            diffuse: Color::splat(0.5), // Grey default
            emissive: Color::ZERO,
            specular: 0.0,
            ior: 0.0,
        }
    }
}

impl Material {
    /// Lambertian surface with the given albedo.
    pub fn diffuse(albedo: Color) -> Self {
        Self {
            diffuse: albedo,
            ..Default::default()
        }
    }

    /// Perfect mirror tinted by `albedo`.
    pub fn mirror(albedo: Color) -> Self {
        Self::glossy(albedo, 1.0)
    }

    /// Blend between diffuse and mirror reflection.
    pub fn glossy(albedo: Color, specular: f32) -> Self {
        Self {
            diffuse: albedo,
            specular,
            ..Default::default()
        }
    }

    /// Clear dielectric with the given index of refraction.
    pub fn glass(ior: f32) -> Self {
        Self {
            diffuse: Color::ONE,
            ior,
            ..Default::default()
        }
    }

    /// Emitter. The diffuse color still tints any light bounced off it.
    pub fn light(albedo: Color, emissive: Color) -> Self {
        Self {
            diffuse: albedo,
            emissive,
            ..Default::default()
        }
    }

    /// The material returned for rays that escape the scene.
    pub fn background(color: Color) -> Self {
        Self {
            diffuse: Color::ZERO,
            emissive: color,
            specular: 0.0,
            ior: 0.0,
        }
    }

    #[inline]
    pub fn is_dielectric(&self) -> bool {
        self.ior > 0.0
    }

    #[inline]
    pub fn is_emissive(&self) -> bool {
        self.emissive.length_squared() > 0.0
    }

    /// Check parameter ranges. `index` is only used in the error.
    pub fn validate(&self, index: usize) -> Result<(), SceneError> {
        if !(0.0..=1.0).contains(&self.specular) {
            return Err(SceneError::InvalidSpecular {
                material: index,
                value: self.specular,
            });
        }
        if !self.ior.is_finite() || self.ior < 0.0 {
            return Err(SceneError::InvalidIor {
                material: index,
                value: self.ior,
            });
        }
        Ok(())
    }
}
