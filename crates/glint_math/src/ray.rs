use crate::Vec3;

/// A ray in 3D space with origin and direction.
///
/// The kernel keeps directions normalized; the type itself does not enforce it.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    /// Create a new ray.
    #[inline]
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self { origin, direction }
    }

    /// Create a ray towards `target`, with a normalized direction.
    ///
    /// A zero-length direction (target == origin) yields `Vec3::ZERO`.
    #[inline]
    pub fn towards(origin: Vec3, target: Vec3) -> Self {
        Self::new(origin, (target - origin).normalize_or_zero())
    }

    #[inline]
    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    #[inline]
    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    /// Compute a point along the ray at parameter t.
    /// P(t) = origin + t * direction
    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + t * self.direction
    }
}

impl Default for Ray {
    fn default() -> Self {
        Self {
            origin: Vec3::ZERO,
            direction: Vec3::NEG_Z,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ray_at() {
        let ray = Ray::new(Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 0.0, -1.0));

        assert_eq!(ray.at(0.0), Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(ray.at(2.5), Vec3::new(1.0, 0.0, -2.5));
    }

    #[test]
    fn test_ray_towards_normalizes() {
        let ray = Ray::towards(Vec3::ZERO, Vec3::new(0.0, 3.0, 4.0));
        assert!((ray.direction().length() - 1.0).abs() < 1e-6);

        let degenerate = Ray::towards(Vec3::ONE, Vec3::ONE);
        assert_eq!(degenerate.direction(), Vec3::ZERO);
    }
}
