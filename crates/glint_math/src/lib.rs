// Re-export glam for convenience
pub use glam::*;

// SIMD lane types
pub use wide::{f32x4, f32x8};

// Glint math types
mod lanes;
mod ray;
pub use lanes::{Lanes, Vec3Lanes, MAX_LANES};
pub use ray::Ray;
