//! Fixed-width float lanes for structure-of-arrays kernels.
//!
//! [`Lanes`] abstracts over `f32` (one lane), `wide::f32x4` and `wide::f32x8`
//! so a kernel is written once and monomorphized per width. Comparisons
//! return masks of the same type: all bits set in a true lane, all bits
//! clear in a false lane.

use std::fmt::Debug;
use std::ops::{Add, Div, Mul, Sub};

use glam::Vec3;
use wide::{f32x4, f32x8};

/// Widest lane count any [`Lanes`] implementation uses.
pub const MAX_LANES: usize = 8;

/// A vector of `WIDTH` f32 lanes.
pub trait Lanes:
    Copy
    + Debug
    + Send
    + Sync
    + 'static
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
{
    /// Number of lanes.
    const WIDTH: usize;

    /// Broadcast one value to every lane.
    fn splat(value: f32) -> Self;

    /// Load exactly `WIDTH` values.
    fn from_slice(values: &[f32]) -> Self;

    /// Read a single lane.
    fn lane(self, index: usize) -> f32;

    fn sqrt(self) -> Self;

    /// Lane mask of `self < rhs`.
    fn cmp_lt(self, rhs: Self) -> Self;

    /// Lane mask of `self > rhs`.
    fn cmp_gt(self, rhs: Self) -> Self;

    fn and(self, rhs: Self) -> Self;

    fn or(self, rhs: Self) -> Self;

    /// Per lane: `if_true` where `mask` is set, `if_false` elsewhere.
    fn select(mask: Self, if_true: Self, if_false: Self) -> Self;

    /// True if any lane of the mask is set.
    fn any(self) -> bool;

    /// Smallest lane value and its lane index. The lowest index wins ties.
    fn horizontal_min_index(self) -> (f32, usize);

    /// Mask with the first `active` lanes set.
    fn mask_from_count(active: usize) -> Self {
        let mut values = [0.0f32; MAX_LANES];
        for value in values.iter_mut().take(active.min(Self::WIDTH)) {
            *value = mask_true();
        }
        Self::from_slice(&values[..Self::WIDTH])
    }

    /// True if lane `index` of the mask is set.
    #[inline]
    fn lane_set(self, index: usize) -> bool {
        self.lane(index).to_bits() != 0
    }
}

/// All bits set; the "true" value of a mask lane.
#[inline]
fn mask_true() -> f32 {
    f32::from_bits(u32::MAX)
}

#[inline]
fn min_index(values: &[f32]) -> (f32, usize) {
    let mut best = (values[0], 0);
    for (index, &value) in values.iter().enumerate().skip(1) {
        if value < best.0 {
            best = (value, index);
        }
    }
    best
}

impl Lanes for f32 {
    const WIDTH: usize = 1;

    #[inline]
    fn splat(value: f32) -> Self {
        value
    }

    #[inline]
    fn from_slice(values: &[f32]) -> Self {
        values[0]
    }

    #[inline]
    fn lane(self, index: usize) -> f32 {
        debug_assert_eq!(index, 0);
        self
    }

    #[inline]
    fn sqrt(self) -> Self {
        f32::sqrt(self)
    }

    #[inline]
    fn cmp_lt(self, rhs: Self) -> Self {
        if self < rhs {
            mask_true()
        } else {
            0.0
        }
    }

    #[inline]
    fn cmp_gt(self, rhs: Self) -> Self {
        if self > rhs {
            mask_true()
        } else {
            0.0
        }
    }

    #[inline]
    fn and(self, rhs: Self) -> Self {
        f32::from_bits(self.to_bits() & rhs.to_bits())
    }

    #[inline]
    fn or(self, rhs: Self) -> Self {
        f32::from_bits(self.to_bits() | rhs.to_bits())
    }

    #[inline]
    fn select(mask: Self, if_true: Self, if_false: Self) -> Self {
        if mask.to_bits() != 0 {
            if_true
        } else {
            if_false
        }
    }

    #[inline]
    fn any(self) -> bool {
        self.to_bits() != 0
    }

    #[inline]
    fn horizontal_min_index(self) -> (f32, usize) {
        (self, 0)
    }
}

macro_rules! impl_wide_lanes {
    ($ty:ident, $width:literal) => {
        impl Lanes for $ty {
            const WIDTH: usize = $width;

            #[inline]
            fn splat(value: f32) -> Self {
                $ty::splat(value)
            }

            #[inline]
            fn from_slice(values: &[f32]) -> Self {
                let mut array = [0.0f32; $width];
                array.copy_from_slice(values);
                $ty::new(array)
            }

            #[inline]
            fn lane(self, index: usize) -> f32 {
                self.to_array()[index]
            }

            #[inline]
            fn sqrt(self) -> Self {
                $ty::sqrt(self)
            }

            #[inline]
            fn cmp_lt(self, rhs: Self) -> Self {
                wide::CmpLt::cmp_lt(self, rhs)
            }

            #[inline]
            fn cmp_gt(self, rhs: Self) -> Self {
                wide::CmpGt::cmp_gt(self, rhs)
            }

            #[inline]
            fn and(self, rhs: Self) -> Self {
                self & rhs
            }

            #[inline]
            fn or(self, rhs: Self) -> Self {
                self | rhs
            }

            #[inline]
            fn select(mask: Self, if_true: Self, if_false: Self) -> Self {
                mask.blend(if_true, if_false)
            }

            #[inline]
            fn any(self) -> bool {
                $ty::any(self)
            }

            #[inline]
            fn horizontal_min_index(self) -> (f32, usize) {
                min_index(&self.to_array())
            }
        }
    };
}

impl_wide_lanes!(f32x4, 4);
impl_wide_lanes!(f32x8, 8);

/// `WIDTH` 3D vectors in structure-of-arrays layout:
/// - x: [x0, x1, ..]
/// - y: [y0, y1, ..]
/// - z: [z0, z1, ..]
#[derive(Clone, Copy, Debug)]
pub struct Vec3Lanes<L> {
    pub x: L,
    pub y: L,
    pub z: L,
}

impl<L: Lanes> Vec3Lanes<L> {
    #[inline]
    pub fn new(x: L, y: L, z: L) -> Self {
        Self { x, y, z }
    }

    /// Create with all lanes set to the same vector
    #[inline]
    pub fn splat(v: Vec3) -> Self {
        Self {
            x: L::splat(v.x),
            y: L::splat(v.y),
            z: L::splat(v.z),
        }
    }

    #[inline]
    pub fn dot(self, other: Self) -> L {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    #[inline]
    pub fn length_squared(self) -> L {
        self.dot(self)
    }

    /// Per lane: `if_true` where `mask` is set, `if_false` elsewhere.
    #[inline]
    pub fn select(mask: L, if_true: Self, if_false: Self) -> Self {
        Self {
            x: L::select(mask, if_true.x, if_false.x),
            y: L::select(mask, if_true.y, if_false.y),
            z: L::select(mask, if_true.z, if_false.z),
        }
    }

    /// Extract one lane as a scalar vector.
    #[inline]
    pub fn lane(self, index: usize) -> Vec3 {
        Vec3::new(self.x.lane(index), self.y.lane(index), self.z.lane(index))
    }
}

impl<L: Lanes> Add for Vec3Lanes<L> {
    type Output = Self;
    #[inline]
    fn add(self, other: Self) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
            z: self.z + other.z,
        }
    }
}

impl<L: Lanes> Sub for Vec3Lanes<L> {
    type Output = Self;
    #[inline]
    fn sub(self, other: Self) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
            z: self.z - other.z,
        }
    }
}

impl<L: Lanes> Mul<L> for Vec3Lanes<L> {
    type Output = Self;
    #[inline]
    fn mul(self, scalar: L) -> Self {
        Self {
            x: self.x * scalar,
            y: self.y * scalar,
            z: self.z * scalar,
        }
    }
}
