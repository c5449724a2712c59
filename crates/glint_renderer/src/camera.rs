//! Orbit camera for interactive progressive rendering.
//!
//! The camera circles a fixed look-at point. Its state is three orbit
//! parameters (distance, yaw, height) driven by held keys; the ray basis is
//! rebuilt from them every frame.

use std::f32::consts::{FRAC_PI_3, TAU};

use glint_core::WORLD_SCALE;
use glint_math::{Ray, Vec2, Vec3};

use crate::input::{InputState, Key};

/// Closest the camera may dolly in.
pub const MIN_DISTANCE: f32 = 0.5;

/// Per-frame movement step.
pub const MOVEMENT_SPEED: f32 = 0.125 * WORLD_SCALE;

/// Camera orbiting a look-at point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitCamera {
    look_at: Vec3,
    distance: f32,
    yaw: f32,
    height: f32,
    speed: f32,
}

impl OrbitCamera {
    /// Create a camera at the default orbit around `look_at`.
    pub fn new(look_at: Vec3) -> Self {
        Self {
            look_at,
            distance: 2.0,
            yaw: FRAC_PI_3,
            height: 0.0,
            speed: MOVEMENT_SPEED,
        }
    }

    /// Set the orbit parameters. Clamps are applied.
    pub fn with_orbit(mut self, distance: f32, yaw: f32, height: f32) -> Self {
        self.distance = distance;
        self.yaw = yaw;
        self.height = height;
        self.clamp();
        self
    }

    /// Set the per-frame movement step.
    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }

    /// Apply one frame of held keys. Returns true if the camera moved.
    ///
    /// The reset key is not movement; callers check it separately.
    pub fn update(&mut self, input: &dyn InputState) -> bool {
        let down = |a: Key, b: Key| input.is_key_down(a) || input.is_key_down(b);
        let mut moved = false;

        if down(Key::W, Key::ArrowUp) {
            self.distance -= self.speed;
            moved = true;
        }
        if down(Key::S, Key::ArrowDown) {
            self.distance += self.speed;
            moved = true;
        }
        if down(Key::D, Key::ArrowRight) {
            self.yaw -= self.speed;
            moved = true;
        }
        if down(Key::A, Key::ArrowLeft) {
            self.yaw += self.speed;
            moved = true;
        }
        if input.is_key_down(Key::Space) {
            self.height += self.speed;
            moved = true;
        }
        if down(Key::C, Key::LeftControl) {
            self.height -= self.speed;
            moved = true;
        }

        self.clamp();
        moved
    }

    fn clamp(&mut self) {
        self.yaw = self.yaw.rem_euclid(TAU);
        self.distance = self.distance.max(MIN_DISTANCE);
        self.height = self.height.min(self.distance);
    }

    #[inline]
    pub fn look_at(&self) -> Vec3 {
        self.look_at
    }

    #[inline]
    pub fn distance(&self) -> f32 {
        self.distance
    }

    #[inline]
    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.height
    }

    /// World-space camera position.
    pub fn position(&self) -> Vec3 {
        let (sin, cos) = self.yaw.sin_cos();
        self.look_at + Vec3::new(cos * self.distance, self.height, sin * self.distance)
    }

    /// Build the ray-generation basis for an image of `width` x `height`.
    pub fn basis(&self, width: u32, height: u32) -> CameraBasis {
        let position = self.position();
        let z = (position - self.look_at).normalize_or_zero();
        let x = Vec3::Y.cross(z).normalize_or_zero();
        let y = z.cross(x);

        // The narrower image axis spans [-1, 1]
        let (width_f, height_f) = (width.max(1) as f32, height.max(1) as f32);
        let (half_width, half_height) = if width_f > height_f {
            (width_f / height_f, 1.0)
        } else {
            (1.0, height_f / width_f)
        };

        CameraBasis {
            position,
            x,
            y,
            z,
            film_center: position - z,
            half_width,
            half_height,
            width: width_f,
            height: height_f,
        }
    }
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self::new(Vec3::NEG_Z)
    }
}

/// Per-frame camera snapshot used to generate primary rays.
///
/// `z` points from the look-at point back to the camera; the film plane sits
/// one unit in front of the camera along `-z`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraBasis {
    pub position: Vec3,
    pub x: Vec3,
    pub y: Vec3,
    pub z: Vec3,
    pub film_center: Vec3,
    pub half_width: f32,
    pub half_height: f32,
    width: f32,
    height: f32,
}

impl CameraBasis {
    /// Primary ray through pixel (px, py), offset by `jitter` in [-0.5, 0.5].
    ///
    /// Row 0 is the top of the image.
    #[inline]
    pub fn primary_ray(&self, px: u32, py: u32, jitter: Vec2) -> Ray {
        let film_x = -1.0 + 2.0 * (px as f32 + 0.5 + jitter.x) / self.width;
        let film_y = 1.0 - 2.0 * (py as f32 + 0.5 + jitter.y) / self.height;
        let film_point = self.film_center
            + film_x * self.half_width * self.x
            + film_y * self.half_height * self.y;
        Ray::towards(self.position, film_point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::KeyboardState;

    fn assert_close(a: Vec3, b: Vec3) {
        assert!((a - b).length() < 1e-5, "{a:?} != {b:?}");
    }

    #[test]
    fn test_default_orbit() {
        let camera = OrbitCamera::new(Vec3::ZERO);
        let position = camera.position();
        assert!((position.length() - 2.0).abs() < 1e-5);
        assert_close(position, Vec3::new(FRAC_PI_3.cos() * 2.0, 0.0, FRAC_PI_3.sin() * 2.0));
    }

    #[test]
    fn test_basis_is_orthonormal() {
        let camera = OrbitCamera::new(Vec3::new(1.0, 2.0, 3.0)).with_orbit(3.0, 1.1, 0.7);
        let basis = camera.basis(640, 480);

        for axis in [basis.x, basis.y, basis.z] {
            assert!((axis.length() - 1.0).abs() < 1e-5);
        }
        assert!(basis.x.dot(basis.y).abs() < 1e-5);
        assert!(basis.y.dot(basis.z).abs() < 1e-5);
        assert!(basis.z.dot(basis.x).abs() < 1e-5);
        // Right-handed
        assert_close(basis.x.cross(basis.y), basis.z);
        assert_close(basis.film_center, basis.position - basis.z);
    }

    #[test]
    fn test_aspect_correction() {
        let camera = OrbitCamera::default();
        let wide = camera.basis(800, 400);
        assert_eq!((wide.half_width, wide.half_height), (2.0, 1.0));

        let tall = camera.basis(300, 600);
        assert_eq!((tall.half_width, tall.half_height), (1.0, 2.0));

        let square = camera.basis(256, 256);
        assert_eq!((square.half_width, square.half_height), (1.0, 1.0));
    }

    #[test]
    fn test_center_ray_hits_look_at() {
        let look_at = Vec3::new(0.5, -0.25, -3.0);
        let camera = OrbitCamera::new(look_at).with_orbit(2.5, 0.3, 0.4);
        // Even sizes put the film center on a pixel corner
        let basis = camera.basis(100, 100);
        let ray = basis.primary_ray(49, 49, Vec2::splat(0.5));

        let to_target = (look_at - basis.position).normalize();
        assert_close(ray.direction(), to_target);
        assert_eq!(ray.origin(), basis.position);
    }

    #[test]
    fn test_top_row_points_up() {
        let basis = OrbitCamera::default().basis(64, 64);
        let top = basis.primary_ray(32, 0, Vec2::ZERO);
        let bottom = basis.primary_ray(32, 63, Vec2::ZERO);
        assert!(top.direction().dot(basis.y) > 0.0);
        assert!(bottom.direction().dot(basis.y) < 0.0);
    }

    #[test]
    fn test_update_moves_and_clamps() {
        let mut camera = OrbitCamera::new(Vec3::ZERO);
        assert!(!camera.update(&KeyboardState::new()));
        assert!(!camera.update(&KeyboardState::new().with(Key::R)));

        let start = camera.distance();
        assert!(camera.update(&KeyboardState::new().with(Key::ArrowUp)));
        assert!((camera.distance() - (start - MOVEMENT_SPEED)).abs() < 1e-6);

        let dolly_in = KeyboardState::new().with(Key::W);
        for _ in 0..1000 {
            camera.update(&dolly_in);
        }
        assert_eq!(camera.distance(), MIN_DISTANCE);

        let rise = KeyboardState::new().with(Key::Space);
        for _ in 0..1000 {
            camera.update(&rise);
        }
        assert_eq!(camera.height(), camera.distance());

        assert!(camera.update(&KeyboardState::new().with(Key::LeftControl)));
        assert!(camera.height() < camera.distance());
    }

    #[test]
    fn test_yaw_wraps() {
        let mut camera = OrbitCamera::new(Vec3::ZERO).with_orbit(2.0, 0.01, 0.0).with_speed(0.1);
        camera.update(&KeyboardState::new().with(Key::D));
        assert!(camera.yaw() >= 0.0 && camera.yaw() < TAU);
        assert!((camera.yaw() - (TAU - 0.09)).abs() < 1e-4);

        let mut camera = OrbitCamera::new(Vec3::ZERO).with_orbit(2.0, TAU - 0.05, 0.0).with_speed(0.1);
        camera.update(&KeyboardState::new().with(Key::A));
        assert!((camera.yaw() - 0.05).abs() < 1e-4);
    }
}
