//! Orchestration Layer
//!
//! This crate drives the step kernels as a benchmark, including:
//! - JSON configuration and thread-count resolution
//! - The renderer capability handed the state after each step
//! - The timing harness and its per-step report
//! - CSV export of frame timings and sweep summaries
//! - Thread/schedule sweeps against a sequential baseline

#![warn(missing_docs)]

pub mod config;
pub mod export;
pub mod harness;
pub mod render;
pub mod report;
pub mod sweep;

pub use config::BenchConfig;
pub use export::ExportError;
pub use harness::{BenchmarkHarness, WARMUP_STEPS};
pub use render::{create_renderer, LogRenderer, NullRenderer, Renderer, RendererKind};
pub use report::{BenchmarkReport, Comparison};
pub use sweep::{SweepPlan, SweepRow};

use kernel::{create_kernel, ParticleState, SpatialGrid};

/// Run a complete benchmark from a validated configuration
///
/// This performs the full pipeline:
/// 1. Resolve the strategy and the worker count
/// 2. Seed the particle state and size the grid over it
/// 3. Create the step kernel and the renderer
/// 4. Warm up, then time the measured steps
/// 5. Write the frame CSV if `record` is set
///
/// A failed export is logged and the report is still returned.
///
/// # Example
/// ```no_run
/// use orchestrator::{run_benchmark, BenchConfig};
///
/// let config = BenchConfig::load("bench.json")?;
/// let report = run_benchmark(&config)?;
/// println!("{:.3} ms/step", report.mean_ms());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn run_benchmark(config: &BenchConfig) -> Result<BenchmarkReport, Box<dyn std::error::Error>> {
    config.validate()?;
    let strategy = config.update_strategy()?;
    let threads = config.resolve_threads();

    tracing::info!(
        "Seeding {} particles in {}x{} (seed {})",
        config.particles,
        config.width,
        config.height,
        config.seed
    );
    let mut state = ParticleState::new(config.particles, config.width, config.height, config.seed);
    let mut grid = SpatialGrid::for_state(&state);
    let mut kernel = create_kernel(strategy, threads)?;
    let mut renderer = create_renderer(config.renderer);

    let harness = BenchmarkHarness::new(config.warmup_steps);
    let report = harness.run(kernel.as_mut(), &mut state, &mut grid, renderer.as_mut(), config.steps);

    if let Some(path) = &config.record {
        if let Err(e) = export::write_frames_csv(path, &report.samples_ms) {
            tracing::error!("Failed to write {}: {}", path.display(), e);
        }
    }

    Ok(report)
}
