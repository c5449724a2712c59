//! Lane-group packing of a scene.
//!
//! The kernel never touches [`Scene`] directly. Spheres are regrouped `W` at a
//! time into structure-of-arrays [`SphereGroup`]s, and their materials are
//! flattened into a table addressed by `group * W + lane + 1`. Entry 0 of the
//! table is the background material.
//!
//! The last group is padded with zero-radius spheres at the origin. Padding
//! lanes are cleared in the group's active mask so they can never produce a
//! hit.

use glint_math::{Lanes, Vec3Lanes, MAX_LANES};

use crate::material::{Color, Material};
use crate::scene::{Scene, SceneResult};

/// `W` spheres in structure-of-arrays layout.
#[derive(Debug, Clone, Copy)]
pub struct SphereGroup<L> {
    pub centers: Vec3Lanes<L>,
    pub radii: L,
    pub radii_squared: L,
    /// Number of real (non-padding) lanes
    pub active: usize,
    /// Lane mask with the first `active` lanes set
    pub active_mask: L,
}

impl<L: Lanes> SphereGroup<L> {
    fn from_chunk(chunk: &[glint_math::Vec3], radii: &[f32]) -> Self {
        let mut xs = [0.0f32; MAX_LANES];
        let mut ys = [0.0f32; MAX_LANES];
        let mut zs = [0.0f32; MAX_LANES];
        let mut rs = [0.0f32; MAX_LANES];
        for (lane, (center, &radius)) in chunk.iter().zip(radii).enumerate() {
            xs[lane] = center.x;
            ys[lane] = center.y;
            zs[lane] = center.z;
            rs[lane] = radius;
        }

        let width = L::WIDTH;
        let radii = L::from_slice(&rs[..width]);
        Self {
            centers: Vec3Lanes::new(
                L::from_slice(&xs[..width]),
                L::from_slice(&ys[..width]),
                L::from_slice(&zs[..width]),
            ),
            radii,
            radii_squared: radii * radii,
            active: chunk.len(),
            active_mask: L::mask_from_count(chunk.len()),
        }
    }
}

/// A validated scene packed for a `W`-lane kernel.
#[derive(Debug, Clone)]
pub struct PackedScene<L> {
    groups: Vec<SphereGroup<L>>,
    materials: Vec<Material>,
    sphere_count: usize,
    use_sky_gradient: bool,
}

impl<L: Lanes> PackedScene<L> {
    /// Validate `scene` and pack it into lane groups.
    pub fn from_scene(scene: &Scene) -> SceneResult<Self> {
        scene.validate()?;

        let width = L::WIDTH;
        let group_count = scene.sphere_count().div_ceil(width);
        let background = Material::background(scene.background);

        let mut groups = Vec::with_capacity(group_count);
        let mut materials = vec![background; group_count * width + 1];

        for (group_index, chunk) in scene.spheres.chunks(width).enumerate() {
            let centers: Vec<_> = chunk.iter().map(|sphere| sphere.center).collect();
            let radii: Vec<_> = chunk.iter().map(|sphere| sphere.radius).collect();
            groups.push(SphereGroup::from_chunk(&centers, &radii));

            for (lane, sphere) in chunk.iter().enumerate() {
                materials[group_index * width + lane + 1] = *scene.material_of(sphere);
            }
        }

        log::debug!(
            "Packed scene '{}': {} spheres into {} groups of {} lanes",
            scene.name,
            scene.sphere_count(),
            groups.len(),
            width
        );

        Ok(Self {
            groups,
            materials,
            sphere_count: scene.sphere_count(),
            use_sky_gradient: scene.use_sky_gradient,
        })
    }

    #[inline]
    pub fn groups(&self) -> &[SphereGroup<L>] {
        &self.groups
    }

    #[inline]
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    #[inline]
    pub fn sphere_count(&self) -> usize {
        self.sphere_count
    }

    /// Table index of the material for `lane` of `group`.
    #[inline]
    pub fn material_index(group: usize, lane: usize) -> usize {
        group * L::WIDTH + lane + 1
    }

    /// Material at a table index. Index 0 is the background.
    #[inline]
    pub fn material(&self, index: usize) -> &Material {
        &self.materials[index]
    }

    #[inline]
    pub fn background(&self) -> &Material {
        &self.materials[0]
    }

    #[inline]
    pub fn background_color(&self) -> Color {
        self.materials[0].emissive
    }

    #[inline]
    pub fn use_sky_gradient(&self) -> bool {
        self.use_sky_gradient
    }
}
