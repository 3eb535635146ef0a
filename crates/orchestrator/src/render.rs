//! Renderer capability
//!
//! The harness hands the state to a renderer after every measured step. The
//! renderer only ever sees a read-only [`ParticleView`]; drawing to a window is
//! left to implementations outside this crate.

use kernel::ParticleView;
use serde::{Deserialize, Serialize};

/// Something that consumes one frame of particle state.
pub trait Renderer {
    /// Called before the state of a frame is handed over.
    fn begin_frame(&mut self);

    /// Receive the current state.
    fn draw_state(&mut self, view: &ParticleView<'_>);

    /// Called once the frame is complete.
    fn end_frame(&mut self);
}

/// Renderer that discards every frame.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn begin_frame(&mut self) {}

    fn draw_state(&mut self, _view: &ParticleView<'_>) {}

    fn end_frame(&mut self) {}
}

/// Summary of one frame, as computed by [`LogRenderer`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameSummary {
    /// Mean particle speed.
    pub mean_speed: f32,
    /// Particles lying exactly on a wall.
    pub on_wall: usize,
}

impl FrameSummary {
    /// Summarize a view.
    pub fn of(view: &ParticleView<'_>) -> Self {
        let (w, h) = (view.width as f32, view.height as f32);
        let mut speed_sum = 0.0f64;
        let mut on_wall = 0;
        for i in 0..view.len() {
            speed_sum += (view.vx[i] as f64).hypot(view.vy[i] as f64);
            let (x, y) = (view.x[i], view.y[i]);
            if x == 0.0 || x == w || y == 0.0 || y == h {
                on_wall += 1;
            }
        }
        let mean_speed = if view.is_empty() {
            0.0
        } else {
            (speed_sum / view.len() as f64) as f32
        };
        Self { mean_speed, on_wall }
    }
}

/// Renderer that logs a frame summary every `every` frames.
#[derive(Debug)]
pub struct LogRenderer {
    every: u64,
    frame: u64,
    last: Option<FrameSummary>,
}

impl LogRenderer {
    /// Default logging interval in frames.
    pub const DEFAULT_EVERY: u64 = 100;

    /// Log every `every` frames (0 is treated as 1).
    pub fn new(every: u64) -> Self {
        Self {
            every: every.max(1),
            frame: 0,
            last: None,
        }
    }

    /// Frames completed so far.
    pub fn frames(&self) -> u64 {
        self.frame
    }

    /// The most recent logged summary.
    pub fn last_summary(&self) -> Option<FrameSummary> {
        self.last
    }
}

impl Default for LogRenderer {
    fn default() -> Self {
        Self::new(Self::DEFAULT_EVERY)
    }
}

impl Renderer for LogRenderer {
    fn begin_frame(&mut self) {}

    fn draw_state(&mut self, view: &ParticleView<'_>) {
        if self.frame % self.every != 0 {
            return;
        }
        let summary = FrameSummary::of(view);
        tracing::debug!(
            "Frame {}: {} particles, mean speed {:.2}, {} on a wall",
            self.frame,
            view.len(),
            summary.mean_speed,
            summary.on_wall
        );
        self.last = Some(summary);
    }

    fn end_frame(&mut self) {
        self.frame += 1;
    }
}

/// Which renderer a run uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RendererKind {
    /// [`NullRenderer`]
    #[default]
    None,
    /// [`LogRenderer`]
    Log,
}

impl std::str::FromStr for RendererKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "null" => Ok(RendererKind::None),
            "log" => Ok(RendererKind::Log),
            other => Err(format!("unknown renderer '{}' (expected none or log)", other)),
        }
    }
}

/// Build the renderer for `kind`.
pub fn create_renderer(kind: RendererKind) -> Box<dyn Renderer> {
    match kind {
        RendererKind::None => Box::new(NullRenderer),
        RendererKind::Log => Box::new(LogRenderer::default()),
    }
}
