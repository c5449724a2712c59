//! Built-in scenes.
//!
//! Coordinates and radii are authored in "world units" and scaled by
//! [`WORLD_SCALE`] so every preset fits comfortably around a camera orbiting
//! at distance 2.

use std::fmt;
use std::str::FromStr;

use glam::Vec3;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::material::{Color, Material};
use crate::scene::{Scene, SceneError};

/// Scale applied to every preset coordinate and radius.
pub const WORLD_SCALE: f32 = 1.0 / 16.0;

/// Seed of the random preset. Fixed so the scene is identical between runs.
pub const RANDOM_SCENE_SEED: u64 = 0xCD46_749A_57AC_B371;

/// Number of spheres in the random preset.
pub const RANDOM_SPHERE_COUNT: usize = 128;

/// The scenes shipped with the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScenePreset {
    /// 128 random emitters, glass balls, mirrors and diffuse spheres
    #[default]
    Random,
    /// Hand-placed glass, metal and diffuse spheres over a ground sphere
    Showcase,
    /// Ground, a glass ball and three colored lights
    Lights,
}

impl ScenePreset {
    pub const ALL: [ScenePreset; 3] = [Self::Random, Self::Showcase, Self::Lights];

    pub fn name(self) -> &'static str {
        match self {
            Self::Random => "random",
            Self::Showcase => "showcase",
            Self::Lights => "lights",
        }
    }

    /// Build the scene.
    pub fn build(self) -> Scene {
        match self {
            Self::Random => random_scene(),
            Self::Showcase => showcase_scene(),
            Self::Lights => lights_scene(),
        }
    }
}

impl fmt::Display for ScenePreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ScenePreset {
    type Err = SceneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|preset| preset.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| SceneError::UnknownPreset(s.to_string()))
    }
}

/// Add a sphere given in unscaled world units.
fn add_scaled(scene: &mut Scene, center: Vec3, radius: f32, material: Material) {
    scene.add_sphere(center * WORLD_SCALE, radius * WORLD_SCALE, material);
}

fn random_scene() -> Scene {
    let mut rng = SmallRng::seed_from_u64(RANDOM_SCENE_SEED);
    let mut scene = Scene::new("random");

    for _ in 0..RANDOM_SPHERE_COUNT {
        let center = Vec3::new(
            rng.gen_range(-36.0..36.0),
            rng.gen_range(-36.0..36.0),
            rng.gen_range(-36.0..36.0),
        );
        let radius = rng.gen_range(0.25..5.0);
        let color = Color::new(
            rng.gen_range(0.1..1.0),
            rng.gen_range(0.1..1.0),
            rng.gen_range(0.1..1.0),
        );

        let material = if rng.gen::<f32>() < 0.25 {
            let strength: f32 = rng.gen_range(1.0..5.0);
            Material::light(color, color * strength)
        } else {
            let choice: f32 = rng.gen();
            if choice < 0.25 {
                Material::glass(1.5)
            } else {
                let specular = if choice > 0.375 { 1.0 } else { 0.0 };
                Material::glossy(color, specular)
            }
        };

        add_scaled(&mut scene, center, radius, material);
    }

    // Orbit a sphere near the middle of the list
    let look_at = scene.spheres[25].center;
    scene.with_look_at(look_at)
}

fn showcase_scene() -> Scene {
    let mut scene = Scene::new("showcase").with_sky_gradient(true);

    add_scaled(&mut scene, Vec3::new(0.0, 0.0, -15.0), 2.0, Material {
        specular: 1.0,
        ..Material::glass(1.5)
    });
    add_scaled(
        &mut scene,
        Vec3::new(0.0, -130.0, -15.0),
        128.0,
        Material::diffuse(Color::splat(0.2)),
    );
    add_scaled(
        &mut scene,
        Vec3::new(5.0, 2.0, -25.0),
        2.0,
        Material::mirror(Color::new(0.0, 0.0, 1.0)),
    );
    add_scaled(
        &mut scene,
        Vec3::new(6.0, 6.0, -18.0),
        2.0,
        Material::mirror(Color::new(0.75, 0.85, 0.125)),
    );
    add_scaled(
        &mut scene,
        Vec3::new(-7.0, -0.5, -25.0),
        1.25,
        Material::glossy(Color::new(1.0, 0.5, 0.0), 0.95),
    );
    add_scaled(
        &mut scene,
        Vec3::new(7.0, 6.0, -30.0),
        3.0,
        Material::mirror(Color::new(0.125, 0.5, 0.2)),
    );
    add_scaled(
        &mut scene,
        Vec3::new(-3.0, 3.0, -30.0),
        2.5,
        Material::mirror(Color::new(0.25, 0.15, 0.12)),
    );
    add_scaled(
        &mut scene,
        Vec3::new(-12.0, 3.0, -45.0),
        1.0,
        Material::diffuse(Color::new(0.65, 0.25, 0.42)),
    );

    let look_at = scene.spheres[0].center;
    scene.with_look_at(look_at)
}

fn lights_scene() -> Scene {
    let mut scene = Scene::new("lights");

    add_scaled(
        &mut scene,
        Vec3::new(0.0, -258.0, -15.0),
        256.0,
        Material::diffuse(Color::splat(0.2)),
    );
    add_scaled(&mut scene, Vec3::new(0.0, 0.0, -10.0), 2.0, Material::glass(1.5));

    let emitters = [
        (-4.0, Color::new(8.0, 0.0, 0.0)),
        (0.0, Color::new(0.0, 8.0, 0.0)),
        (4.0, Color::new(0.0, 0.0, 8.0)),
    ];
    for (x, emissive) in emitters {
        add_scaled(
            &mut scene,
            Vec3::new(x, 1.0, -15.0),
            1.5,
            Material::light(Color::X, emissive),
        );
    }

    let look_at = scene.spheres[1].center;
    scene.with_look_at(look_at)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_validate() {
        for preset in ScenePreset::ALL {
            let scene = preset.build();
            assert!(scene.validate().is_ok(), "{preset} failed validation");
            assert_eq!(scene.name, preset.name());
        }
    }

    #[test]
    fn test_random_scene_is_deterministic() {
        let a = ScenePreset::Random.build();
        let b = ScenePreset::Random.build();
        assert_eq!(a.sphere_count(), RANDOM_SPHERE_COUNT);
        assert_eq!(a.spheres, b.spheres);
        assert_eq!(a.materials, b.materials);
    }

    #[test]
    fn test_random_scene_ranges() {
        let scene = ScenePreset::Random.build();
        for sphere in &scene.spheres {
            assert!(sphere.center.abs().max_element() <= 36.0 * WORLD_SCALE);
            assert!(sphere.radius >= 0.25 * WORLD_SCALE && sphere.radius <= 5.0 * WORLD_SCALE);

            let material = scene.material_of(sphere);
            if material.is_dielectric() {
                assert_eq!(material.ior, 1.5);
                assert_eq!(material.diffuse, Color::ONE);
            } else if !material.is_emissive() {
                assert!(material.specular == 0.0 || material.specular == 1.0);
            }
        }
    }

    #[test]
    fn test_lights_scene_layout() {
        let scene = ScenePreset::Lights.build();
        assert_eq!(scene.sphere_count(), 5);
        let emitters = scene
            .spheres
            .iter()
            .filter(|sphere| scene.material_of(sphere).is_emissive())
            .count();
        assert_eq!(emitters, 3);
        assert_eq!(scene.look_at, Vec3::new(0.0, 0.0, -10.0) * WORLD_SCALE);
    }

    #[test]
    fn test_preset_from_str() {
        assert_eq!("random".parse::<ScenePreset>().unwrap(), ScenePreset::Random);
        assert_eq!("Lights".parse::<ScenePreset>().unwrap(), ScenePreset::Lights);
        assert!(matches!(
            "cornell".parse::<ScenePreset>(),
            Err(SceneError::UnknownPreset(name)) if name == "cornell"
        ));
    }
}
