//! Frame arena: a bump-pointer byte budget for per-resolution buffers.
//!
//! The accumulation and display buffers are charged against the arena each
//! time they are reallocated. The arena only tracks offsets; the buffers own
//! their storage. Running out of budget is reported at reset time, never in
//! the middle of a frame.

use thiserror::Error;

/// Default arena budget: 512 MiB.
pub const DEFAULT_ARENA_BYTES: usize = 512 * 1024 * 1024;

/// Errors reported by [`FrameArena::push`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArenaError {
    #[error("Frame arena exhausted: requested {requested} bytes, {available} of {capacity} available")]
    OutOfMemory {
        requested: usize,
        available: usize,
        capacity: usize,
    },

    #[error("Alignment {0} is not a power of two")]
    BadAlignment(usize),
}

/// Bump allocator over a fixed byte budget.
#[derive(Debug, Clone)]
pub struct FrameArena {
    capacity: usize,
    used: usize,
}

impl Default for FrameArena {
    fn default() -> Self {
        Self::new(DEFAULT_ARENA_BYTES)
    }
}

impl FrameArena {
    pub fn new(capacity: usize) -> Self {
        Self { capacity, used: 0 }
    }

    /// Reserve `size` bytes aligned to `align`. Returns the offset.
    pub fn push(&mut self, size: usize, align: usize) -> Result<usize, ArenaError> {
        if !align.is_power_of_two() {
            return Err(ArenaError::BadAlignment(align));
        }
        let offset = self
            .used
            .checked_add(align - 1)
            .map(|end| end & !(align - 1))
            .ok_or(ArenaError::OutOfMemory {
                requested: size,
                available: self.available(),
                capacity: self.capacity,
            })?;
        let end = offset
            .checked_add(size)
            .filter(|&end| end <= self.capacity)
            .ok_or(ArenaError::OutOfMemory {
                requested: size,
                available: self.available(),
                capacity: self.capacity,
            })?;
        self.used = end;
        Ok(offset)
    }

    /// Reserve room for `count` values of `T`.
    pub fn push_slice<T>(&mut self, count: usize) -> Result<usize, ArenaError> {
        let size = std::mem::size_of::<T>()
            .checked_mul(count)
            .ok_or(ArenaError::OutOfMemory {
                requested: usize::MAX,
                available: self.available(),
                capacity: self.capacity,
            })?;
        self.push(size, std::mem::align_of::<T>())
    }

    /// Release every reservation.
    #[inline]
    pub fn reset(&mut self) {
        self.used = 0;
    }

    #[inline]
    pub fn used(&self) -> usize {
        self.used
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn available(&self) -> usize {
        self.capacity - self.used
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_aligns_offsets() {
        let mut arena = FrameArena::new(1024);
        assert_eq!(arena.push(3, 1).unwrap(), 0);
        assert_eq!(arena.push(8, 16).unwrap(), 16);
        assert_eq!(arena.used(), 24);
        assert_eq!(arena.push_slice::<u32>(2).unwrap(), 24);
        assert_eq!(arena.used(), 32);
    }

    #[test]
    fn test_budget_is_enforced() {
        let mut arena = FrameArena::new(64);
        arena.push(60, 4).unwrap();
        let err = arena.push(8, 4).unwrap_err();
        assert_eq!(
            err,
            ArenaError::OutOfMemory { requested: 8, available: 4, capacity: 64 }
        );
        // A failed push leaves the arena untouched
        assert_eq!(arena.used(), 60);

        arena.reset();
        assert_eq!(arena.available(), 64);
        assert_eq!(arena.push(64, 8).unwrap(), 0);
    }

    #[test]
    fn test_bad_alignment() {
        let mut arena = FrameArena::default();
        assert_eq!(arena.push(4, 3), Err(ArenaError::BadAlignment(3)));
        assert_eq!(arena.push(4, 0), Err(ArenaError::BadAlignment(0)));
        assert_eq!(arena.capacity(), DEFAULT_ARENA_BYTES);
    }

    #[test]
    fn test_push_slice_overflow() {
        let mut arena = FrameArena::new(128);
        assert!(arena.push_slice::<[f32; 4]>(usize::MAX / 2).is_err());
    }
}
