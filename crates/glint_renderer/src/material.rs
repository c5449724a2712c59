//! Scattering for the single parameterized material.
//!
//! Opaque surfaces blend a cosine-weighted diffuse bounce with the mirror
//! direction by their specular weight. Dielectrics choose between reflection
//! and refraction with Schlick's approximation.

use glint_core::Material;
use glint_math::Vec3;
use rand::Rng;

/// Bounce directions shorter than this fall back to the surface normal.
const DEGENERATE_LENGTH_SQUARED: f32 = 1e-8;

/// Reflect a vector about a normal.
#[inline]
pub fn reflect(v: Vec3, n: Vec3) -> Vec3 {
    v - 2.0 * v.dot(n) * n
}

/// Refract a unit vector through a surface with relative index `eta`.
///
/// `n` must face against `uv`. Only meaningful when [`total_internal_reflection`]
/// is false.
#[inline]
pub fn refract(uv: Vec3, n: Vec3, eta: f32) -> Vec3 {
    let cos_theta = (-uv).dot(n).min(1.0);
    let r_out_perp = eta * (uv + cos_theta * n);
    let r_out_parallel = -(1.0 - r_out_perp.length_squared()).abs().sqrt() * n;
    r_out_perp + r_out_parallel
}

/// True when Snell's law has no solution.
#[inline]
pub fn total_internal_reflection(cos_theta: f32, eta: f32) -> bool {
    let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();
    eta * sin_theta > 1.0
}

/// Schlick's approximation for reflectance
#[inline]
pub fn reflectance(cosine: f32, eta: f32) -> f32 {
    let r0 = ((1.0 - eta) / (1.0 + eta)).powi(2);
    r0 + (1.0 - r0) * (1.0 - cosine).powi(5)
}

/// Generate a random unit vector on the unit sphere.
pub fn random_unit_vector<R: Rng + ?Sized>(rng: &mut R) -> Vec3 {
    // Use rejection sampling for uniform distribution on sphere
    loop {
        let v = Vec3::new(
            rng.gen::<f32>() * 2.0 - 1.0,
            rng.gen::<f32>() * 2.0 - 1.0,
            rng.gen::<f32>() * 2.0 - 1.0,
        );
        let len_sq = v.length_squared();
        if len_sq > 1e-6 && len_sq <= 1.0 {
            return v / len_sq.sqrt();
        }
    }
}

/// Opaque bounce: diffuse lobe blended with the mirror direction.
///
/// `normal` faces the incoming ray. The result is normalized.
pub fn scatter_opaque<R: Rng + ?Sized>(
    direction: Vec3,
    normal: Vec3,
    specular: f32,
    rng: &mut R,
) -> Vec3 {
    let mut diffuse = normal + random_unit_vector(rng);
    if diffuse.length_squared() < DEGENERATE_LENGTH_SQUARED {
        diffuse = normal;
    }
    let mirror = reflect(direction, normal);
    let bounce = (1.0 - specular) * diffuse.normalize() + specular * mirror;
    let bounce = bounce.normalize_or_zero();
    if bounce == Vec3::ZERO {
        normal
    } else {
        bounce
    }
}

/// Dielectric bounce.
///
/// `normal` is the outward surface normal; it is flipped when the ray is
/// `inside` the sphere. `draw` is a uniform number in [0, 1) compared against
/// the Schlick reflectance.
pub fn scatter_dielectric(direction: Vec3, normal: Vec3, ior: f32, inside: bool, draw: f32) -> Vec3 {
    let (normal, eta) = if inside { (-normal, ior) } else { (normal, 1.0 / ior) };
    let cos_theta = (-direction).dot(normal).min(1.0);

    if total_internal_reflection(cos_theta, eta) || reflectance(cos_theta, eta) > draw {
        reflect(direction, normal)
    } else {
        refract(direction, normal, eta).normalize_or_zero()
    }
}

/// Next ray direction after hitting `material`.
///
/// `normal` is the outward unit normal at the hit point.
pub fn scatter<R: Rng + ?Sized>(
    material: &Material,
    direction: Vec3,
    normal: Vec3,
    inside: bool,
    rng: &mut R,
) -> Vec3 {
    if material.is_dielectric() {
        scatter_dielectric(direction, normal, material.ior, inside, rng.gen())
    } else {
        let facing = if inside { -normal } else { normal };
        scatter_opaque(direction, facing, material.specular, rng)
    }
}
