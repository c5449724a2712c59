//! Glint Core - Scene store for the progressive sphere path tracer.
//!
//! This crate provides:
//!
//! - **Scene types**: `Scene`, `Sphere`, `Material`
//! - **Lane packing**: `PackedScene` / `SphereGroup`, the structure-of-arrays
//!   form the SIMD kernel scans
//! - **Presets**: the built-in random, showcase and lights scenes
//!
//! # Example
//!
//! ```ignore
//! use glint_core::{PackedScene, ScenePreset};
//! use glint_math::f32x8;
//!
//! let scene = ScenePreset::Random.build();
//! let packed = PackedScene::<f32x8>::from_scene(&scene)?;
//! println!("{} spheres in {} groups", packed.sphere_count(), packed.group_count());
//! ```

pub mod material;
pub mod packed;
pub mod presets;
pub mod scene;
pub mod sphere;

// Re-export commonly used types
pub use material::{Color, Material};
pub use packed::{PackedScene, SphereGroup};
pub use presets::{ScenePreset, RANDOM_SCENE_SEED, WORLD_SCALE};
pub use scene::{Scene, SceneError, SceneResult};
pub use sphere::{MaterialId, Sphere};
