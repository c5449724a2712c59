//! Scene store: scalar spheres plus the material table they index.
//!
//! Scenes are built in code (see [`crate::presets`]) or loaded from JSON.
//! A scene is immutable once handed to the renderer; the renderer packs it
//! into lane groups with [`crate::PackedScene`].

use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::material::{Color, Material};
use crate::sphere::{MaterialId, Sphere};

/// Errors that can occur while building or loading a scene.
#[derive(Error, Debug)]
pub enum SceneError {
    #[error("Sphere {sphere} has invalid radius {radius}")]
    InvalidRadius { sphere: usize, radius: f32 },

    #[error("Sphere {sphere} references unknown material {material} ({count} materials)")]
    UnknownMaterial {
        sphere: usize,
        material: usize,
        count: usize,
    },

    #[error("Material {material} has specular {value} outside [0, 1]")]
    InvalidSpecular { material: usize, value: f32 },

    #[error("Material {material} has invalid index of refraction {value}")]
    InvalidIor { material: usize, value: f32 },

    #[error("Scene contains no spheres")]
    Empty,

    #[error("Unknown scene preset: {0}")]
    UnknownPreset(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Scene JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type SceneResult<T> = Result<T, SceneError>;

/// A sphere scene ready to be rendered.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Scene {
    /// Scene name, used in logs
    pub name: String,

    pub spheres: Vec<Sphere>,

    pub materials: Vec<Material>,

    /// Radiance returned by rays that escape the scene
    pub background: Color,

    /// Replace the flat background with a white-to-blue sky gradient
    pub use_sky_gradient: bool,

    /// Point the orbit camera circles around
    pub look_at: Vec3,
}

impl Default for Scene {
    fn default() -> Self {
        Self {
            name: String::new(),
            spheres: Vec::new(),
            materials: Vec::new(),
            background: Color::ZERO,
            use_sky_gradient: false,
            look_at: Vec3::NEG_Z,
        }
    }
}

impl Scene {
    /// Create an empty scene.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_background(mut self, background: Color) -> Self {
        self.background = background;
        self
    }

    pub fn with_sky_gradient(mut self, enabled: bool) -> Self {
        self.use_sky_gradient = enabled;
        self
    }

    pub fn with_look_at(mut self, look_at: Vec3) -> Self {
        self.look_at = look_at;
        self
    }

    /// Add a material and return its id.
    pub fn add_material(&mut self, material: Material) -> MaterialId {
        self.materials.push(material);
        MaterialId(self.materials.len() - 1)
    }

    /// Add a sphere with its own new material.
    pub fn add_sphere(&mut self, center: Vec3, radius: f32, material: Material) -> MaterialId {
        let id = self.add_material(material);
        self.spheres.push(Sphere::new(center, radius, id));
        id
    }

    /// Add a sphere sharing an existing material.
    pub fn add_sphere_with(&mut self, center: Vec3, radius: f32, material: MaterialId) {
        self.spheres.push(Sphere::new(center, radius, material));
    }

    #[inline]
    pub fn sphere_count(&self) -> usize {
        self.spheres.len()
    }

    #[inline]
    pub fn material_count(&self) -> usize {
        self.materials.len()
    }

    /// Material of a sphere. Only valid on a validated scene.
    #[inline]
    pub fn material_of(&self, sphere: &Sphere) -> &Material {
        &self.materials[sphere.material.index()]
    }

    /// Check every sphere and material.
    pub fn validate(&self) -> SceneResult<()> {
        if self.spheres.is_empty() {
            return Err(SceneError::Empty);
        }
        for (index, material) in self.materials.iter().enumerate() {
            material.validate(index)?;
        }
        for (index, sphere) in self.spheres.iter().enumerate() {
            if !sphere.has_valid_radius() {
                return Err(SceneError::InvalidRadius {
                    sphere: index,
                    radius: sphere.radius,
                });
            }
            if sphere.material.index() >= self.materials.len() {
                return Err(SceneError::UnknownMaterial {
                    sphere: index,
                    material: sphere.material.index(),
                    count: self.materials.len(),
                });
            }
        }
        Ok(())
    }

    /// Parse and validate a scene from a JSON string.
    pub fn from_json_str(json: &str) -> SceneResult<Self> {
        let scene: Scene = serde_json::from_str(json)?;
        scene.validate()?;
        Ok(scene)
    }

    /// Load and validate a scene from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> SceneResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let mut scene = Self::from_json_str(&json)?;
        if scene.name.is_empty() {
            scene.name = path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_default();
        }
        log::info!(
            "Loaded scene '{}' from {}: {} spheres, {} materials",
            scene.name,
            path.display(),
            scene.sphere_count(),
            scene.material_count()
        );
        Ok(scene)
    }

    /// Serialize to pretty JSON.
    pub fn to_json_string(&self) -> SceneResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
