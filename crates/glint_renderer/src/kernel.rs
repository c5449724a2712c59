//! Lane-parallel intersection and shading kernel.
//!
//! Each bounce scans every sphere group with `W`-wide lane math, keeping the
//! closest valid hit per lane with masked selects. A horizontal minimum then
//! picks the winning lane, and shading continues in scalar code.
//!
//! The kernel is generic over [`Lanes`], so the same code runs at one, four
//! or eight lanes.

use std::sync::Arc;

use glint_core::{Color, PackedScene};
use glint_math::{Lanes, Ray, Vec2, Vec3, Vec3Lanes};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::accumulation::AccumulationBuffer;
use crate::camera::CameraBasis;
use crate::material::scatter;

/// Hits closer than this are rejected, so a bounce never re-hits its origin.
pub const HIT_EPSILON: f32 = 1e-4;

/// Running minimum before any hit is recorded.
pub const NO_HIT: f32 = f32::MAX;

/// Closest intersection along a ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub t: f32,
    pub point: Vec3,
    /// Outward unit normal
    pub normal: Vec3,
    /// The ray started inside the sphere and hit its far side
    pub inside: bool,
    /// Index into the packed material table
    pub material_index: usize,
}

/// Find the closest sphere hit with `t > HIT_EPSILON`.
///
/// Among equal distances the lowest lane wins.
pub fn nearest_hit<L: Lanes>(scene: &PackedScene<L>, ray: &Ray) -> Option<Hit> {
    let origin = Vec3Lanes::<L>::splat(ray.origin);
    let direction = Vec3Lanes::<L>::splat(ray.direction);
    let epsilon = L::splat(HIT_EPSILON);

    let mut min_t = L::splat(NO_HIT);
    let mut hit_normal = Vec3Lanes::<L>::splat(Vec3::ZERO);
    let mut hit_point = Vec3Lanes::<L>::splat(Vec3::ZERO);
    let mut inside = L::splat(0.0);
    let mut hit_group = L::splat(0.0);

    for (index, group) in scene.groups().iter().enumerate() {
        let to_center = group.centers - origin;
        let t = to_center.dot(direction);
        let distance_squared = (to_center - direction * t).length_squared();

        let hit_mask = distance_squared
            .cmp_lt(group.radii_squared)
            .and(group.active_mask);
        if !hit_mask.any() {
            continue;
        }

        let half_chord = (group.radii_squared - distance_squared).sqrt();
        let near = t - half_chord;
        let origin_inside = near.cmp_lt(epsilon);
        let candidate = L::select(origin_inside, t + half_chord, near);

        let move_mask = candidate
            .cmp_lt(min_t)
            .and(candidate.cmp_gt(epsilon))
            .and(hit_mask);
        if !move_mask.any() {
            continue;
        }

        let offset = direction * candidate;
        min_t = L::select(move_mask, candidate, min_t);
        hit_normal = Vec3Lanes::select(move_mask, offset - to_center, hit_normal);
        hit_point = Vec3Lanes::select(move_mask, origin + offset, hit_point);
        inside = L::select(move_mask, origin_inside, inside);
        hit_group = L::select(move_mask, L::splat(index as f32), hit_group);
    }

    let (t, lane) = min_t.horizontal_min_index();
    if t >= NO_HIT {
        return None;
    }

    let group = hit_group.lane(lane) as usize;
    Some(Hit {
        t,
        point: hit_point.lane(lane),
        normal: hit_normal.lane(lane).normalize_or_zero(),
        inside: inside.lane_set(lane),
        material_index: PackedScene::<L>::material_index(group, lane),
    })
}

/// Compute sky gradient background.
#[inline]
pub fn sky_gradient(direction: Vec3) -> Color {
    let a = 0.5 * (direction.y + 1.0);
    let white = Color::new(1.0, 1.0, 1.0);
    let blue = Color::new(0.5, 0.7, 1.0);
    white * (1.0 - a) + blue * a
}

/// Radiance of a ray that left the scene.
#[inline]
pub fn miss_radiance<L: Lanes>(scene: &PackedScene<L>, direction: Vec3) -> Color {
    if scene.use_sky_gradient() {
        sky_gradient(direction)
    } else {
        scene.background_color()
    }
}

/// Trace one path of up to `max_bounces` segments and return its radiance.
pub fn trace_path<L: Lanes, R: Rng + ?Sized>(
    scene: &PackedScene<L>,
    mut ray: Ray,
    max_bounces: u32,
    rng: &mut R,
) -> Color {
    let mut attenuation = Color::ONE;
    let mut output = Color::ZERO;

    for _ in 0..max_bounces {
        let Some(hit) = nearest_hit(scene, &ray) else {
            output += miss_radiance(scene, ray.direction) * attenuation;
            break;
        };

        let material = scene.material(hit.material_index);
        output += material.emissive * attenuation;
        attenuation *= material.diffuse;

        let direction = scatter(material, ray.direction, hit.normal, hit.inside, rng);
        ray = Ray::new(hit.point, direction);
    }

    output
}

/// Per-worker mutable state.
#[derive(Debug, Clone)]
pub struct WorkerContext {
    pub rng: SmallRng,
}

impl WorkerContext {
    /// Deterministic context for `worker_index` derived from a base seed.
    pub fn seeded(seed: u64, worker_index: usize) -> Self {
        let mixed = seed ^ (worker_index as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15);
        Self {
            rng: SmallRng::seed_from_u64(mixed),
        }
    }
}

/// Everything a worker needs to render one frame's tiles.
#[derive(Debug, Clone)]
pub struct FrameJob<L> {
    pub scene: Arc<PackedScene<L>>,
    pub basis: CameraBasis,
    pub buffer: Arc<AccumulationBuffer>,
    /// Samples already averaged into `buffer`
    pub previous_samples: u32,
    pub max_bounces: u32,
}

impl<L: Lanes> FrameJob<L> {
    /// Add one jittered sample to every pixel of a tile.
    pub fn render_tile(&self, tile_index: usize, context: &mut WorkerContext) {
        let scene: &PackedScene<L> = &self.scene;
        let mut samples = self.buffer.lock_tile(tile_index);
        let tile = samples.tile;

        for (x, y) in tile.pixels() {
            let jitter = Vec2::new(
                context.rng.gen_range(-0.5..=0.5),
                context.rng.gen_range(-0.5..=0.5),
            );
            let ray = self.basis.primary_ray(x, y, jitter);
            let color = trace_path(scene, ray, self.max_bounces, &mut context.rng);
            samples.commit(x, y, color, self.previous_samples);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::FrameArena;
    use crate::camera::OrbitCamera;
    use crate::material::random_unit_vector;
    use crate::tile::TileGrid;
    use glint_core::{Material, Scene, ScenePreset};
    use glint_math::{f32x4, f32x8};
    use rand::rngs::StdRng;

    /// Brute-force scalar reference.
    fn reference_hit(scene: &Scene, ray: &Ray) -> Option<(f32, usize)> {
        let mut best: Option<(f32, usize)> = None;
        for (index, sphere) in scene.spheres.iter().enumerate() {
            let to_center = sphere.center - ray.origin;
            let t = to_center.dot(ray.direction);
            let distance_squared = (to_center - ray.direction * t).length_squared();
            let radius_squared = sphere.radius * sphere.radius;
            if distance_squared >= radius_squared {
                continue;
            }
            let half_chord = (radius_squared - distance_squared).sqrt();
            let mut candidate = t - half_chord;
            if candidate < HIT_EPSILON {
                candidate = t + half_chord;
            }
            if candidate > HIT_EPSILON && best.map_or(true, |(best_t, _)| candidate < best_t) {
                best = Some((candidate, index));
            }
        }
        best
    }

    /// A row of spheres along -Z with the nearest one placed at `near_index`.
    fn row_scene(count: usize, near_index: usize) -> Scene {
        let mut scene = Scene::new("row");
        for i in 0..count {
            let z = if i == near_index { -2.0 } else { -5.0 - i as f32 };
            scene.add_sphere(Vec3::new(0.0, 0.0, z), 0.5, Material::diffuse(Color::splat(0.5)));
        }
        scene
    }

    fn check_nearest<L: Lanes>() {
        for count in [2, 5, 9, 20] {
            for near_index in [0, count / 2, count - 1] {
                let scene = row_scene(count, near_index);
                let packed = PackedScene::<L>::from_scene(&scene).unwrap();
                let ray = Ray::new(Vec3::ZERO, Vec3::NEG_Z);

                let hit = nearest_hit(&packed, &ray).expect("row is in front of the ray");
                assert!((hit.t - 1.5).abs() < 1e-5, "width {} count {count}", L::WIDTH);
                // Spheres are packed in order, so table index = sphere index + 1
                assert_eq!(hit.material_index, near_index + 1);
                assert!(!hit.inside);
                assert!((hit.normal - Vec3::Z).length() < 1e-5);
                assert!((hit.point - Vec3::new(0.0, 0.0, -1.5)).length() < 1e-5);
            }
        }
    }

    #[test]
    fn test_nearest_hit_all_widths() {
        check_nearest::<f32>();
        check_nearest::<f32x4>();
        check_nearest::<f32x8>();
    }

    fn check_padding<L: Lanes>() {
        // One real sphere leaves padding lanes at the origin with radius 0
        let mut scene = Scene::new("single");
        scene.add_sphere(Vec3::new(0.0, 0.0, 5.0), 1.0, Material::diffuse(Color::ONE));
        let packed = PackedScene::<L>::from_scene(&scene).unwrap();

        for origin in [Vec3::ZERO, Vec3::new(0.0, 0.0, -3.0)] {
            let through_origin = Ray::new(origin, Vec3::Z);
            let hit = nearest_hit(&packed, &through_origin).unwrap();
            assert_eq!(hit.material_index, 1);
            assert!((hit.point.z - 4.0).abs() < 1e-4);

            let away = Ray::new(origin, Vec3::NEG_Z);
            assert!(nearest_hit(&packed, &away).is_none());
        }
    }

    #[test]
    fn test_padding_lanes_never_hit() {
        check_padding::<f32>();
        check_padding::<f32x4>();
        check_padding::<f32x8>();
    }

    fn check_against_reference<L: Lanes>(scene: &Scene) {
        let packed = PackedScene::<L>::from_scene(scene).unwrap();
        let mut rng = StdRng::seed_from_u64(42);
        let mut hits = 0;

        for _ in 0..500 {
            let origin = Vec3::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0));
            let ray = Ray::new(origin, random_unit_vector(&mut rng));

            let expected = reference_hit(scene, &ray);
            let actual = nearest_hit(&packed, &ray);
            match (expected, actual) {
                (None, None) => {}
                (Some((t, index)), Some(hit)) => {
                    hits += 1;
                    assert!((hit.t - t).abs() < 1e-4);
                    if hit.material_index != index + 1 {
                        // Two spheres at the same distance; either is acceptable
                        let other = &scene.spheres[hit.material_index - 1];
                        assert!(((other.center - hit.point).length() - other.radius).abs() < 1e-3);
                    }
                }
                (expected, actual) => panic!("width {}: expected {expected:?}, got {actual:?}", L::WIDTH),
            }
        }
        assert!(hits > 25, "only {hits} rays hit anything");
    }

    #[test]
    fn test_random_scene_matches_scalar_reference() {
        let scene = ScenePreset::Random.build();
        check_against_reference::<f32>(&scene);
        check_against_reference::<f32x4>(&scene);
        check_against_reference::<f32x8>(&scene);
    }

    #[test]
    fn test_origin_inside_sphere() {
        let mut scene = Scene::new("inside");
        scene.add_sphere(Vec3::ZERO, 2.0, Material::glass(1.5));
        let packed = PackedScene::<f32x8>::from_scene(&scene).unwrap();

        let hit = nearest_hit(&packed, &Ray::new(Vec3::ZERO, Vec3::X)).unwrap();
        assert!(hit.inside);
        assert!((hit.t - 2.0).abs() < 1e-5);
        assert!((hit.normal - Vec3::X).length() < 1e-5);
    }

    #[test]
    fn test_miss_returns_background() {
        let mut scene = Scene::new("miss").with_background(Color::new(0.1, 0.2, 0.3));
        scene.add_sphere(Vec3::new(0.0, 0.0, -5.0), 1.0, Material::diffuse(Color::ONE));
        let packed = PackedScene::<f32x4>::from_scene(&scene).unwrap();
        let mut rng = StdRng::seed_from_u64(42);

        let ray = Ray::new(Vec3::ZERO, Vec3::Y);
        assert!(nearest_hit(&packed, &ray).is_none());
        assert_eq!(trace_path(&packed, ray, 5, &mut rng), Color::new(0.1, 0.2, 0.3));

        let sky = PackedScene::<f32x4>::from_scene(&scene.clone().with_sky_gradient(true)).unwrap();
        assert_eq!(trace_path(&sky, ray, 5, &mut rng), Color::new(0.5, 0.7, 1.0));
        let down = Ray::new(Vec3::ZERO, Vec3::NEG_Y);
        assert_eq!(trace_path(&sky, down, 5, &mut rng), Color::ONE);
    }

    #[test]
    fn test_emitter_radiance() {
        let mut scene = Scene::new("light");
        scene.add_sphere(
            Vec3::new(0.0, 0.0, -3.0),
            1.0,
            Material::light(Color::ZERO, Color::new(2.0, 3.0, 4.0)),
        );
        let packed = PackedScene::<f32x8>::from_scene(&scene).unwrap();
        let mut rng = StdRng::seed_from_u64(42);

        let color = trace_path(&packed, Ray::new(Vec3::ZERO, Vec3::NEG_Z), 5, &mut rng);
        assert_eq!(color, Color::new(2.0, 3.0, 4.0));
        assert_eq!(trace_path(&packed, Ray::new(Vec3::ZERO, Vec3::NEG_Z), 0, &mut rng), Color::ZERO);
    }

    #[test]
    fn test_mirror_sees_background_tinted() {
        let mut scene = Scene::new("mirror").with_background(Color::ONE);
        scene.add_sphere(Vec3::new(0.0, 0.0, -3.0), 1.0, Material::mirror(Color::new(0.5, 0.25, 1.0)));
        let packed = PackedScene::<f32>::from_scene(&scene).unwrap();
        let mut rng = StdRng::seed_from_u64(42);

        let color = trace_path(&packed, Ray::new(Vec3::ZERO, Vec3::NEG_Z), 5, &mut rng);
        assert!((color - Color::new(0.5, 0.25, 1.0)).length() < 1e-5);
    }

    #[test]
    fn test_worker_contexts_differ() {
        let mut a = WorkerContext::seeded(7, 0);
        let mut b = WorkerContext::seeded(7, 1);
        let mut again = WorkerContext::seeded(7, 0);
        let first: u64 = a.rng.gen();
        assert_ne!(first, b.rng.gen::<u64>());
        assert_eq!(first, again.rng.gen::<u64>());
    }

    #[test]
    fn test_render_tile_fills_only_its_pixels() {
        let scene = ScenePreset::Lights.build();
        let packed = Arc::new(PackedScene::<f32x8>::from_scene(&scene).unwrap());
        let mut arena = FrameArena::default();
        let grid = TileGrid::new(40, 24, 16);
        let buffer = Arc::new(AccumulationBuffer::new(grid, &mut arena).unwrap());

        let job = FrameJob {
            scene: packed,
            basis: OrbitCamera::new(scene.look_at).basis(40, 24),
            buffer: Arc::clone(&buffer),
            previous_samples: 0,
            max_bounces: 5,
        };
        let mut context = WorkerContext::seeded(1, 0);
        job.render_tile(1, &mut context);

        let opaque = |pixel: u32| pixel >> 24 == 255;
        let tile = grid.tile(1);
        for y in 0..grid.height {
            for x in 0..grid.width {
                let inside = x >= tile.x && x < tile.x + tile.width && y >= tile.y && y < tile.y + tile.height;
                assert_eq!(opaque(buffer.display_pixel(x, y)), inside, "pixel ({x}, {y})");
            }
        }
    }
}
