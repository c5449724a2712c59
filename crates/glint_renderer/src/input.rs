//! Keyboard state sampled once per frame.
//!
//! The platform layer owns key events; the renderer only asks whether a key
//! is currently held.

/// Keys the orbit camera reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Key {
    W,
    A,
    S,
    D,
    C,
    R,
    Space,
    LeftControl,
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
}

impl Key {
    pub const ALL: [Key; 12] = [
        Key::W,
        Key::A,
        Key::S,
        Key::D,
        Key::C,
        Key::R,
        Key::Space,
        Key::LeftControl,
        Key::ArrowUp,
        Key::ArrowDown,
        Key::ArrowLeft,
        Key::ArrowRight,
    ];

    #[inline]
    fn bit(self) -> u16 {
        1 << self as u8
    }
}

/// Read-only view of the keyboard for one frame.
pub trait InputState {
    fn is_key_down(&self, key: Key) -> bool;
}

/// Key state stored as a bitmask.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyboardState {
    down: u16,
}

impl KeyboardState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style press.
    pub fn with(mut self, key: Key) -> Self {
        self.press(key);
        self
    }

    pub fn press(&mut self, key: Key) {
        self.down |= key.bit();
    }

    pub fn release(&mut self, key: Key) {
        self.down &= !key.bit();
    }

    pub fn release_all(&mut self) {
        self.down = 0;
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.down == 0
    }
}

impl InputState for KeyboardState {
    #[inline]
    fn is_key_down(&self, key: Key) -> bool {
        self.down & key.bit() != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_press_and_release() {
        let mut keys = KeyboardState::new().with(Key::W).with(Key::Space);
        assert!(keys.is_key_down(Key::W));
        assert!(keys.is_key_down(Key::Space));
        assert!(!keys.is_key_down(Key::S));

        keys.release(Key::W);
        assert!(!keys.is_key_down(Key::W));
        assert!(keys.is_key_down(Key::Space));

        keys.release_all();
        assert!(keys.is_empty());
    }

    #[test]
    fn test_keys_have_distinct_bits() {
        let mut all = KeyboardState::new();
        for key in Key::ALL {
            all.press(key);
        }
        for key in Key::ALL {
            let mut single = KeyboardState::new();
            single.press(key);
            for other in Key::ALL {
                assert_eq!(single.is_key_down(other), key == other);
            }
            assert!(all.is_key_down(key));
        }
    }
}
