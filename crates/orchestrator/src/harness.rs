//! Benchmark harness
//!
//! Runs a step kernel for a warm-up period and then for the measured steps,
//! timing only the step call itself. The renderer sees the state after every
//! measured step, outside the timed interval.

use kernel::{ParticleState, SpatialGrid, StepKernel};
use std::time::Instant;

use crate::render::Renderer;
use crate::report::BenchmarkReport;

/// Steps run before measurement starts
pub const WARMUP_STEPS: usize = 50;

/// Times a step kernel over a fixed number of steps
#[derive(Debug, Clone, Copy)]
pub struct BenchmarkHarness {
    warmup_steps: usize,
}

impl Default for BenchmarkHarness {
    fn default() -> Self {
        Self::new(WARMUP_STEPS)
    }
}

impl BenchmarkHarness {
    /// Create a harness with the given warm-up length
    pub fn new(warmup_steps: usize) -> Self {
        Self { warmup_steps }
    }

    /// Warm-up length in steps
    pub fn warmup_steps(&self) -> usize {
        self.warmup_steps
    }

    /// Run `steps` measured steps and collect one sample per step.
    ///
    /// Warm-up steps are neither timed nor rendered.
    pub fn run(
        &self,
        kernel: &mut dyn StepKernel,
        state: &mut ParticleState,
        grid: &mut SpatialGrid,
        renderer: &mut dyn Renderer,
        steps: usize,
    ) -> BenchmarkReport {
        let strategy = kernel.strategy();
        tracing::info!(
            "Benchmarking {} with {} particles on {} threads ({} warm-up, {} measured steps)",
            strategy,
            state.len(),
            kernel.threads(),
            self.warmup_steps,
            steps
        );

        for _ in 0..self.warmup_steps {
            kernel.step(state, grid);
        }

        let progress_every = (steps / 10).max(1);
        let mut samples_ms = Vec::with_capacity(steps);
        let start_wall_time = Instant::now();

        for step in 0..steps {
            let start = Instant::now();
            kernel.step(state, grid);
            samples_ms.push(start.elapsed().as_secs_f64() * 1000.0);

            renderer.begin_frame();
            renderer.draw_state(&state.view());
            renderer.end_frame();

            if (step + 1) % progress_every == 0 {
                tracing::info!(
                    "Step {}/{} ({}%), wall_time={:.2}s",
                    step + 1,
                    steps,
                    (step + 1) * 100 / steps,
                    start_wall_time.elapsed().as_secs_f64()
                );
            }
        }

        let report = BenchmarkReport::new(strategy.to_string(), kernel.threads(), state.len(), samples_ms);
        tracing::info!(
            "{}: mean {:.4} ms/step over {} steps",
            report.strategy,
            report.mean_ms(),
            report.len()
        );
        report
    }
}
