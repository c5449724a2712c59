//! Glint Renderer - Progressive SIMD sphere path tracing
//!
//! An interactive Monte Carlo path tracer: every displayed frame adds one
//! jittered sample per pixel to a running average, rendered tile by tile on
//! a fixed worker pool. The intersection kernel tests `W` spheres at once
//! using `wide` lanes.
//!
//! # Example
//!
//! ```ignore
//! use glint_core::ScenePreset;
//! use glint_renderer::{Image, KeyboardState, RenderConfig, RenderParams, RenderSession};
//!
//! let mut session = RenderSession::new(&ScenePreset::Lights.build(), RenderConfig::default())?;
//! let mut image = Image::new(640, 360);
//! for _ in 0..16 {
//!     session.wait();
//!     session.render(&mut image, &KeyboardState::new(), RenderParams::new(8))?;
//! }
//! session.finish(&mut image);
//! image.save_png("lights.png")?;
//! ```

mod accumulation;
mod arena;
mod camera;
mod config;
mod framebuffer;
mod input;
mod kernel;
mod material;
mod scheduler;
mod session;
mod tile;

pub use accumulation::{
    blend_sample, color_to_rgba, linear_to_srgb, pack_rgba, AccumulationBuffer, Accumulator,
    TileSamples,
};
pub use arena::{ArenaError, FrameArena, DEFAULT_ARENA_BYTES};
pub use camera::{CameraBasis, OrbitCamera, MIN_DISTANCE, MOVEMENT_SPEED};
pub use config::{ConfigError, LaneWidth, RenderConfig, RenderParams};
pub use framebuffer::{Image, PixelFormat};
pub use input::{InputState, Key, KeyboardState};
pub use kernel::{
    miss_radiance, nearest_hit, sky_gradient, trace_path, FrameJob, Hit, WorkerContext,
    HIT_EPSILON, NO_HIT,
};
pub use material::{
    random_unit_vector, reflect, reflectance, refract, scatter, scatter_dielectric,
    scatter_opaque, total_internal_reflection,
};
pub use scheduler::{SchedulerError, WorkCallback, WorkQueue};
pub use session::{RenderError, RenderResult, RenderSession};
pub use tile::{Tile, TileGrid, DEFAULT_TILE_SIZE};

/// Re-export common types from glint_core and glint_math
pub use glint_core::{Color, Material, PackedScene, Scene, ScenePreset};
pub use glint_math::{Ray, Vec3};
