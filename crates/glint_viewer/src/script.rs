//! Scripted key input for headless runs.
//!
//! A script is a comma-separated list of `keys:frames` segments, played in
//! order from the first frame. Keys within a segment are joined with `+`:
//!
//! ```text
//! a:16,w+space:8,r:1
//! ```
//!
//! holds A for 16 frames, then W and Space for 8, then R for one frame.
//! Frames after the last segment have no keys held.

use std::str::FromStr;

use anyhow::{anyhow, bail, Context, Result};
use glint_renderer::{Key, KeyboardState};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputScript {
    segments: Vec<(KeyboardState, u32)>,
}

impl InputScript {
    /// Keys held during `frame`.
    pub fn keys_for(&self, frame: u32) -> KeyboardState {
        let mut start = 0u32;
        for (keys, length) in &self.segments {
            if frame < start.saturating_add(*length) {
                return *keys;
            }
            start = start.saturating_add(*length);
        }
        KeyboardState::new()
    }

    /// Total frames covered by the script.
    pub fn len(&self) -> u32 {
        self.segments.iter().map(|(_, length)| *length).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn parse_key(name: &str) -> Result<Key> {
    let key = match name.trim().to_ascii_lowercase().as_str() {
        "w" => Key::W,
        "a" => Key::A,
        "s" => Key::S,
        "d" => Key::D,
        "c" => Key::C,
        "r" => Key::R,
        "space" => Key::Space,
        "ctrl" | "lctrl" => Key::LeftControl,
        "up" => Key::ArrowUp,
        "down" => Key::ArrowDown,
        "left" => Key::ArrowLeft,
        "right" => Key::ArrowRight,
        other => bail!("unknown key '{}'", other),
    };
    Ok(key)
}

impl FromStr for InputScript {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut segments = Vec::new();
        for segment in s.split(',').map(str::trim).filter(|segment| !segment.is_empty()) {
            let (keys, frames) = segment
                .split_once(':')
                .ok_or_else(|| anyhow!("segment '{}' is missing ':frames'", segment))?;
            let frames: u32 = frames
                .trim()
                .parse()
                .with_context(|| format!("bad frame count in '{}'", segment))?;

            let mut state = KeyboardState::new();
            for name in keys.split('+') {
                state.press(parse_key(name)?);
            }
            segments.push((state, frames));
        }
        Ok(Self { segments })
    }
}
