use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Index into a scene's material list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MaterialId(pub usize);

impl MaterialId {
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

/// A sphere defined by center, radius and material.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sphere {
    pub center: Vec3,
    pub radius: f32,
    pub material: MaterialId,
}

impl Sphere {
    /// Create a new sphere.
    pub fn new(center: Vec3, radius: f32, material: MaterialId) -> Self {
        Self {
            center,
            radius,
            material,
        }
    }

    /// True if the radius is finite and non-negative.
    #[inline]
    pub fn has_valid_radius(&self) -> bool {
        self.radius.is_finite() && self.radius >= 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_radius_validity() {
        assert!(Sphere::new(Vec3::ZERO, 1.0, MaterialId(0)).has_valid_radius());
        assert!(Sphere::new(Vec3::ZERO, 0.0, MaterialId(0)).has_valid_radius());
        assert!(!Sphere::new(Vec3::ZERO, -0.5, MaterialId(0)).has_valid_radius());
        assert!(!Sphere::new(Vec3::ZERO, f32::INFINITY, MaterialId(0)).has_valid_radius());
    }

    #[test]
    fn test_material_id_is_transparent_in_json() {
        let sphere = Sphere::new(Vec3::new(1.0, 2.0, 3.0), 0.5, MaterialId(4));
        let json = serde_json::to_string(&sphere).unwrap();
        assert!(json.contains("\"material\":4"));
    }
}
