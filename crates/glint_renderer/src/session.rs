//! Render session: one progressive render of one scene.
//!
//! The session owns the worker pool, the per-worker random streams, the
//! packed scene, the orbit camera and the accumulation buffers. The platform
//! layer calls [`RenderSession::render`] once per displayed frame; each call
//! dispatches at most one new frame of tile work and copies the previous
//! finished frame into the caller's image.

use std::sync::Arc;

use glint_core::{PackedScene, Scene, SceneError};
use glint_math::{f32x4, f32x8, Lanes};
use parking_lot::Mutex;
use thiserror::Error;

use crate::accumulation::Accumulator;
use crate::arena::{ArenaError, FrameArena};
use crate::camera::OrbitCamera;
use crate::config::{LaneWidth, RenderConfig, RenderParams};
use crate::framebuffer::Image;
use crate::input::{InputState, Key};
use crate::kernel::{FrameJob, WorkerContext};
use crate::scheduler::{SchedulerError, WorkCallback, WorkQueue};

/// Errors returned by the render session.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Scene error: {0}")]
    Scene(#[from] SceneError),

    #[error("Scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),

    #[error("Buffer allocation failed: {0}")]
    Arena(#[from] ArenaError),

    #[error("Cannot render into an empty {width}x{height} image")]
    EmptyImage { width: u32, height: u32 },
}

pub type RenderResult<T> = Result<T, RenderError>;

/// The scene packed at the configured lane width.
enum PackedLanes {
    Scalar(Arc<PackedScene<f32>>),
    X4(Arc<PackedScene<f32x4>>),
    X8(Arc<PackedScene<f32x8>>),
}

impl PackedLanes {
    fn pack(scene: &Scene, lane_width: LaneWidth) -> Result<Self, SceneError> {
        Ok(match lane_width {
            LaneWidth::Scalar => PackedLanes::Scalar(Arc::new(PackedScene::from_scene(scene)?)),
            LaneWidth::X4 => PackedLanes::X4(Arc::new(PackedScene::from_scene(scene)?)),
            LaneWidth::X8 => PackedLanes::X8(Arc::new(PackedScene::from_scene(scene)?)),
        })
    }
}

/// Why the accumulation buffers were thrown away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ResetReason {
    Resize,
    CameraMoved,
    Forced,
}

/// Progressive renderer driving a worker pool.
pub struct RenderSession {
    config: RenderConfig,
    scene: PackedLanes,
    camera: OrbitCamera,
    accumulator: Accumulator,
    arena: FrameArena,
    contexts: Arc<[Mutex<WorkerContext>]>,
    /// A dispatched frame has not been counted yet
    frame_pending: bool,
    queue: WorkQueue,
}

impl RenderSession {
    /// Pack `scene` and start the worker pool.
    pub fn new(scene: &Scene, config: RenderConfig) -> RenderResult<Self> {
        let mut scene = scene.clone();
        config.apply_to_scene(&mut scene);
        let packed = PackedLanes::pack(&scene, config.lane_width)?;

        let worker_count = config.resolved_worker_count();
        let queue = WorkQueue::new(worker_count)?;
        let contexts: Arc<[Mutex<WorkerContext>]> = (0..worker_count)
            .map(|index| Mutex::new(WorkerContext::seeded(config.seed, index)))
            .collect();

        log::info!(
            "Render session for '{}': {} spheres, {} lanes, {} workers, {} bounces",
            scene.name,
            scene.sphere_count(),
            config.lane_width.lanes(),
            worker_count,
            config.max_bounces
        );

        Ok(Self {
            camera: OrbitCamera::new(scene.look_at),
            arena: FrameArena::new(config.arena_bytes),
            accumulator: Accumulator::empty(),
            scene: packed,
            contexts,
            frame_pending: false,
            queue,
            config,
        })
    }

    /// Replace the camera. The next frame resets accumulation.
    pub fn with_camera(mut self, camera: OrbitCamera) -> Self {
        self.camera = camera;
        self.accumulator = Accumulator::empty();
        self
    }

    #[inline]
    pub fn camera(&self) -> &OrbitCamera {
        &self.camera
    }

    #[inline]
    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Samples per pixel accumulated since the last reset.
    #[inline]
    pub fn sample_count(&self) -> u32 {
        self.accumulator.sample_count()
    }

    #[inline]
    pub fn worker_count(&self) -> usize {
        self.queue.worker_count()
    }

    /// True when no dispatched frame is still being rendered.
    #[inline]
    pub fn is_idle(&self) -> bool {
        self.queue.has_completed()
    }

    /// Block until the in-flight frame (if any) has been rendered.
    pub fn wait(&self) {
        self.queue.wait_until_completion();
    }

    /// Advance the progressive render by one displayed frame.
    ///
    /// Applies camera input, copies the last finished frame into `image`,
    /// resets accumulation on movement, resize or the reset key, and
    /// dispatches the next frame. Returns whether `image` received a new
    /// frame. Returns `Ok(false)` without dispatching while the previous
    /// frame is still being rendered.
    pub fn render(
        &mut self,
        image: &mut Image,
        input: &dyn InputState,
        params: RenderParams,
    ) -> RenderResult<bool> {
        if image.is_empty() {
            return Err(RenderError::EmptyImage {
                width: image.width,
                height: image.height,
            });
        }

        let moved = self.camera.update(input);
        let complete = self.queue.has_completed();
        let resized = self.accumulator.dimensions() != (image.width, image.height);

        let mut copied = false;
        if complete && !resized {
            self.accumulator.buffer().copy_display_to(image);
            copied = true;
        }

        let reset = if resized {
            Some(ResetReason::Resize)
        } else if moved {
            Some(ResetReason::CameraMoved)
        } else if input.is_key_down(Key::R) {
            Some(ResetReason::Forced)
        } else {
            None
        };

        if let Some(reason) = reset {
            self.queue.wait_until_completion();
            if !resized && !copied {
                self.accumulator.buffer().copy_display_to(image);
                copied = true;
            }
            self.reset(image.width, image.height, reason)?;
        } else if complete {
            self.count_pending_frame();
        } else {
            return Ok(false);
        }

        self.dispatch(params);
        Ok(copied)
    }

    /// Wait for the in-flight frame, count it and copy it into `image`.
    ///
    /// Returns whether `image` was written; it is not when its size differs
    /// from the accumulation buffers.
    pub fn finish(&mut self, image: &mut Image) -> bool {
        self.queue.wait_until_completion();
        self.count_pending_frame();
        if self.accumulator.dimensions() == (image.width, image.height) && !image.is_empty() {
            self.accumulator.buffer().copy_display_to(image);
            true
        } else {
            false
        }
    }

    fn count_pending_frame(&mut self) {
        if self.frame_pending {
            self.accumulator.finish_frame();
            self.frame_pending = false;
        }
    }

    fn reset(&mut self, width: u32, height: u32, reason: ResetReason) -> RenderResult<()> {
        match reason {
            ResetReason::Resize => log::info!("Accumulation reset: resized to {}x{}", width, height),
            _ => log::debug!(
                "Accumulation reset ({:?}) at {}x{} after {} samples",
                reason,
                width,
                height,
                self.accumulator.sample_count()
            ),
        }
        self.accumulator
            .reset(width, height, self.config.tile_size, &mut self.arena)?;
        self.frame_pending = false;
        Ok(())
    }

    fn dispatch(&mut self, params: RenderParams) {
        let buffer = Arc::clone(self.accumulator.buffer());
        let grid = *buffer.grid();
        let basis = self.camera.basis(grid.width, grid.height);
        let previous_samples = self.accumulator.sample_count();
        let max_bounces = self.config.max_bounces;
        let contexts = Arc::clone(&self.contexts);

        let callback = match &self.scene {
            PackedLanes::Scalar(scene) => tile_callback(
                FrameJob { scene: Arc::clone(scene), basis, buffer, previous_samples, max_bounces },
                contexts,
            ),
            PackedLanes::X4(scene) => tile_callback(
                FrameJob { scene: Arc::clone(scene), basis, buffer, previous_samples, max_bounces },
                contexts,
            ),
            PackedLanes::X8(scene) => tile_callback(
                FrameJob { scene: Arc::clone(scene), basis, buffer, previous_samples, max_bounces },
                contexts,
            ),
        };

        log::trace!(
            "Dispatching sample {} over {} tiles",
            previous_samples + 1,
            grid.tile_count()
        );
        self.queue.start(callback, grid.tile_count(), params.thread_count);
        self.frame_pending = true;
    }
}

fn tile_callback<L: Lanes>(job: FrameJob<L>, contexts: Arc<[Mutex<WorkerContext>]>) -> WorkCallback {
    Arc::new(move |tile_index, worker_index| {
        let mut context = contexts[worker_index].lock();
        job.render_tile(tile_index, &mut context);
    })
}
