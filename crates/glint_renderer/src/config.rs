//! Render configuration.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use glint_core::{Color, Scene};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::arena::DEFAULT_ARENA_BYTES;
use crate::tile::DEFAULT_TILE_SIZE;

/// Errors that can occur while loading a configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unknown lane width '{0}' (expected scalar, x4 or x8)")]
    UnknownLaneWidth(String),
}

/// Number of SIMD lanes the kernel runs with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LaneWidth {
    /// One lane, plain `f32`
    Scalar,
    /// Four lanes, `f32x4`
    X4,
    /// Eight lanes, `f32x8`
    #[default]
    X8,
}

impl LaneWidth {
    #[inline]
    pub fn lanes(self) -> usize {
        match self {
            LaneWidth::Scalar => 1,
            LaneWidth::X4 => 4,
            LaneWidth::X8 => 8,
        }
    }
}

impl fmt::Display for LaneWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LaneWidth::Scalar => "scalar",
            LaneWidth::X4 => "x4",
            LaneWidth::X8 => "x8",
        })
    }
}

impl FromStr for LaneWidth {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "scalar" | "1" => Ok(LaneWidth::Scalar),
            "x4" | "4" => Ok(LaneWidth::X4),
            "x8" | "8" => Ok(LaneWidth::X8),
            _ => Err(ConfigError::UnknownLaneWidth(s.to_string())),
        }
    }
}

/// Render configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Maximum path segments per sample
    pub max_bounces: u32,
    /// Tile edge length in pixels
    pub tile_size: u32,
    pub lane_width: LaneWidth,
    /// Worker threads in the pool (0 = available parallelism)
    pub worker_count: usize,
    /// Base seed for the per-worker random streams
    pub seed: u64,
    /// Byte budget for the per-resolution buffers
    pub arena_bytes: usize,
    /// Override the scene's background color
    pub background: Option<Color>,
    /// Override the scene's sky-gradient flag
    pub use_sky_gradient: Option<bool>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            max_bounces: 5,
            tile_size: DEFAULT_TILE_SIZE,
            lane_width: LaneWidth::default(),
            worker_count: 0,
            seed: 0x2545_F491_4F6C_DD1D,
            arena_bytes: DEFAULT_ARENA_BYTES,
            background: None,
            use_sky_gradient: None,
        }
    }
}

impl RenderConfig {
    /// Load a configuration from a JSON file. Missing fields keep defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    pub fn with_lane_width(mut self, lane_width: LaneWidth) -> Self {
        self.lane_width = lane_width;
        self
    }

    pub fn with_worker_count(mut self, worker_count: usize) -> Self {
        self.worker_count = worker_count;
        self
    }

    pub fn with_tile_size(mut self, tile_size: u32) -> Self {
        self.tile_size = tile_size;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Apply the background overrides to a scene.
    pub fn apply_to_scene(&self, scene: &mut Scene) {
        if let Some(background) = self.background {
            scene.background = background;
        }
        if let Some(enabled) = self.use_sky_gradient {
            scene.use_sky_gradient = enabled;
        }
    }

    /// Pool size after resolving 0 to the machine's parallelism.
    pub fn resolved_worker_count(&self) -> usize {
        if self.worker_count > 0 {
            self.worker_count
        } else {
            std::thread::available_parallelism().map_or(1, |n| n.get())
        }
    }
}

/// Per-frame parameters from the platform layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderParams {
    /// Workers released for the next frame
    pub thread_count: usize,
}

impl RenderParams {
    pub fn new(thread_count: usize) -> Self {
        Self { thread_count }
    }
}
