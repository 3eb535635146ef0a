//! The four step strategies and runtime selection between them.
//!
//! Each strategy advances a [`ParticleState`] by one [`DT`](crate::physics::DT)
//! step (integrate, bounce, grid rebuild) and differs only in how the
//! per-particle loops are partitioned across threads.

mod parallel_for;
mod parallel_simd;
mod parallel_tasks;
mod sequential;

use std::fmt;
use std::str::FromStr;

use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::schedule::Schedule;
use crate::{KernelError, StepKernel};

pub use parallel_for::ParallelForKernel;
pub use parallel_simd::ParallelSimdKernel;
pub use parallel_tasks::ParallelTasksKernel;
pub use sequential::SequentialKernel;

/// Particle count above which [`ParallelForKernel`] fans out to the pool.
pub const PARALLEL_THRESHOLD: usize = 256;

/// Strategy name without its parameters, as written in configs and on the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Single-threaded ordered passes.
    #[default]
    Sequential,
    /// Data-parallel loops with a runtime schedule.
    ParallelFor,
    /// Statically partitioned loops with vectorizable inner arithmetic.
    ParallelSimd,
    /// Guided loops plus one task per grid cell.
    ParallelTasks,
}

impl StrategyKind {
    /// All kinds, in declaration order.
    pub const ALL: [StrategyKind; 4] = [
        StrategyKind::Sequential,
        StrategyKind::ParallelFor,
        StrategyKind::ParallelSimd,
        StrategyKind::ParallelTasks,
    ];

    /// Canonical snake_case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::Sequential => "sequential",
            StrategyKind::ParallelFor => "parallel_for",
            StrategyKind::ParallelSimd => "parallel_simd",
            StrategyKind::ParallelTasks => "parallel_tasks",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "seq" | "sequential" => Ok(StrategyKind::Sequential),
            "for" | "parallel_for" | "omp_for" => Ok(StrategyKind::ParallelFor),
            "simd" | "parallel_simd" | "omp_simd" => Ok(StrategyKind::ParallelSimd),
            "tasks" | "parallel_tasks" | "omp_tasks" => Ok(StrategyKind::ParallelTasks),
            other => Err(format!(
                "unknown strategy '{}' (expected seq, for, simd or tasks)",
                other
            )),
        }
    }
}

/// A fully parameterized strategy, selected at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpdateStrategy {
    /// Ordered single-threaded passes.
    Sequential,
    /// Pool-parallel loops honoring the given schedule.
    ParallelFor(Schedule),
    /// Static even partition, lane-form inner loops.
    ParallelSimd,
    /// Guided loops, then one task per grid cell.
    ParallelTasks,
}

impl UpdateStrategy {
    /// Pair a kind with a schedule; the schedule only matters for `ParallelFor`.
    pub fn from_kind(kind: StrategyKind, schedule: Schedule) -> Self {
        match kind {
            StrategyKind::Sequential => UpdateStrategy::Sequential,
            StrategyKind::ParallelFor => UpdateStrategy::ParallelFor(schedule),
            StrategyKind::ParallelSimd => UpdateStrategy::ParallelSimd,
            StrategyKind::ParallelTasks => UpdateStrategy::ParallelTasks,
        }
    }

    /// The kind without parameters.
    pub fn kind(&self) -> StrategyKind {
        match self {
            UpdateStrategy::Sequential => StrategyKind::Sequential,
            UpdateStrategy::ParallelFor(_) => StrategyKind::ParallelFor,
            UpdateStrategy::ParallelSimd => StrategyKind::ParallelSimd,
            UpdateStrategy::ParallelTasks => StrategyKind::ParallelTasks,
        }
    }
}

impl fmt::Display for UpdateStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpdateStrategy::ParallelFor(schedule) => write!(f, "parallel_for({})", schedule),
            other => f.write_str(other.kind().as_str()),
        }
    }
}

/// Number of hardware threads visible to this process.
pub fn hardware_threads() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

pub(crate) fn build_pool(threads: usize) -> Result<ThreadPool, KernelError> {
    let threads = threads.max(1);
    ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|i| format!("bounce-worker-{i}"))
        .build()
        .map_err(KernelError::ThreadPool)
}

/// Create the step kernel for `strategy`.
///
/// Parallel strategies get their own pool of `threads` workers; the
/// sequential one ignores `threads`.
pub fn create_kernel(
    strategy: UpdateStrategy,
    threads: usize,
) -> Result<Box<dyn StepKernel + Send>, KernelError> {
    let kernel: Box<dyn StepKernel + Send> = match strategy {
        UpdateStrategy::Sequential => {
            tracing::debug!("Creating sequential step kernel");
            Box::new(SequentialKernel::new())
        }
        UpdateStrategy::ParallelFor(schedule) => {
            tracing::debug!("Creating parallel-for step kernel: {} threads, schedule {}", threads, schedule);
            Box::new(ParallelForKernel::new(threads, schedule)?)
        }
        UpdateStrategy::ParallelSimd => {
            tracing::debug!("Creating parallel-simd step kernel: {} threads", threads);
            Box::new(ParallelSimdKernel::new(threads)?)
        }
        UpdateStrategy::ParallelTasks => {
            tracing::debug!("Creating parallel-tasks step kernel: {} threads", threads);
            Box::new(ParallelTasksKernel::new(threads)?)
        }
    };
    Ok(kernel)
}
