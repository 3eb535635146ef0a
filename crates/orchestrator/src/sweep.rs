//! Thread and schedule sweep
//!
//! For every particle count, a sequential baseline is measured once and then
//! the swept strategy is run at each thread count. Parallel-for runs once per
//! schedule; the other strategies have a fixed distribution and run once.
//! Every run starts from a freshly seeded state.

use kernel::{
    create_kernel, hardware_threads, KernelError, ParticleState, Schedule, SpatialGrid, StrategyKind,
    UpdateStrategy,
};

use crate::config::resolve_threads;
use crate::harness::{BenchmarkHarness, WARMUP_STEPS};
use crate::render::NullRenderer;
use crate::report::{BenchmarkReport, Comparison};

/// What to sweep over
#[derive(Debug, Clone)]
pub struct SweepPlan {
    /// Strategy measured against the sequential baseline
    pub strategy: StrategyKind,
    /// Particle counts
    pub particle_counts: Vec<usize>,
    /// Requested thread counts; clamped to the hardware when run
    pub thread_counts: Vec<usize>,
    /// Schedules for parallel-for runs
    pub schedules: Vec<Schedule>,
    /// Measured steps per run
    pub steps: usize,
    /// Warm-up steps per run
    pub warmup_steps: usize,
    /// Domain width
    pub width: u32,
    /// Domain height
    pub height: u32,
    /// Seed for every run's initial state
    pub seed: u32,
}

impl Default for SweepPlan {
    fn default() -> Self {
        Self {
            strategy: StrategyKind::ParallelFor,
            particle_counts: vec![1_000, 10_000, 100_000],
            thread_counts: vec![2, 4, 8],
            schedules: vec![Schedule::default()],
            steps: 200,
            warmup_steps: WARMUP_STEPS,
            width: 1280,
            height: 720,
            seed: 42,
        }
    }
}

/// One line of the sweep summary
#[derive(Debug, Clone, PartialEq)]
pub struct SweepRow {
    /// Particle count
    pub n: usize,
    /// Strategy of the compared run, with its schedule for parallel-for
    pub strategy: UpdateStrategy,
    /// Threads the compared run actually used
    pub threads: usize,
    /// Sequential baseline mean (ms)
    pub tb_ms: f64,
    /// Compared mean (ms)
    pub to_ms: f64,
    /// Tb / To
    pub speedup: f64,
    /// Speedup / threads
    pub efficiency: f64,
}

impl SweepRow {
    fn new(n: usize, strategy: UpdateStrategy, threads: usize, tb_ms: f64, to_ms: f64) -> Self {
        let cmp = Comparison::between(tb_ms, to_ms);
        Self {
            n,
            strategy,
            threads,
            tb_ms,
            to_ms,
            speedup: cmp.speedup,
            efficiency: cmp.efficiency(threads),
        }
    }

    /// Text of the summary's Schedule column: the schedule for parallel-for,
    /// the strategy name otherwise.
    pub fn schedule_label(&self) -> String {
        match self.strategy {
            UpdateStrategy::ParallelFor(schedule) => schedule.to_string(),
            other => other.kind().as_str().to_string(),
        }
    }
}

/// Clamp every requested count onto `1..=available`, dropping repeats.
pub fn resolve_thread_counts(requested: &[usize], available: usize) -> Vec<usize> {
    let mut resolved = Vec::with_capacity(requested.len());
    for &t in requested {
        let t = resolve_threads(t as i64, available);
        if !resolved.contains(&t) {
            resolved.push(t);
        }
    }
    resolved
}

impl SweepPlan {
    /// The compared strategies, one per schedule for parallel-for
    pub fn strategies(&self) -> Vec<UpdateStrategy> {
        match self.strategy {
            StrategyKind::ParallelFor => self.schedules.iter().map(|&s| UpdateStrategy::ParallelFor(s)).collect(),
            kind => vec![UpdateStrategy::from_kind(kind, Schedule::default())],
        }
    }

    /// Thread counts after clamping to this machine
    pub fn resolved_thread_counts(&self) -> Vec<usize> {
        resolve_thread_counts(&self.thread_counts, hardware_threads())
    }

    /// Number of rows [`run`](Self::run) produces on this machine
    pub fn row_count(&self) -> usize {
        self.particle_counts.len() * self.strategies().len() * self.resolved_thread_counts().len()
    }

    /// Validate the plan
    pub fn validate(&self) -> Result<(), String> {
        if self.particle_counts.iter().any(|&n| n == 0) {
            return Err("particle counts must be >= 1".to_string());
        }
        if self.thread_counts.iter().any(|&t| t == 0) {
            return Err("thread counts must be >= 1".to_string());
        }
        if self.strategy == StrategyKind::Sequential {
            return Err("cannot sweep the sequential baseline against itself".to_string());
        }
        if self.strategy == StrategyKind::ParallelFor && self.schedules.is_empty() {
            return Err("at least one schedule is required".to_string());
        }
        if self.steps == 0 {
            return Err("steps must be >= 1".to_string());
        }
        if self.width == 0 || self.height == 0 {
            return Err("Domain width and height must be positive".to_string());
        }
        Ok(())
    }

    fn measure(&self, strategy: UpdateStrategy, threads: usize, n: usize) -> Result<BenchmarkReport, KernelError> {
        let mut state = ParticleState::new(n, self.width, self.height, self.seed);
        let mut grid = SpatialGrid::for_state(&state);
        let mut kernel = create_kernel(strategy, threads)?;
        let harness = BenchmarkHarness::new(self.warmup_steps);
        Ok(harness.run(kernel.as_mut(), &mut state, &mut grid, &mut NullRenderer, self.steps))
    }

    /// Run every combination in the plan
    pub fn run(&self) -> Result<Vec<SweepRow>, KernelError> {
        let strategies = self.strategies();
        let thread_counts = self.resolved_thread_counts();
        tracing::info!(
            "Sweep {}: {} particle counts x {} runs x threads {:?}",
            self.strategy,
            self.particle_counts.len(),
            strategies.len(),
            thread_counts
        );
        let mut rows = Vec::with_capacity(self.particle_counts.len() * strategies.len() * thread_counts.len());

        for &n in &self.particle_counts {
            let tb = self.measure(UpdateStrategy::Sequential, 1, n)?.mean_ms();
            for &strategy in &strategies {
                for &threads in &thread_counts {
                    let report = self.measure(strategy, threads, n)?;
                    let row = SweepRow::new(n, strategy, report.threads, tb, report.mean_ms());
                    tracing::info!(
                        "N={} {} threads={}: Tb={:.4}ms To={:.4}ms speedup={:.2} efficiency={:.2}",
                        n,
                        strategy,
                        row.threads,
                        row.tb_ms,
                        row.to_ms,
                        row.speedup,
                        row.efficiency
                    );
                    rows.push(row);
                }
            }
        }

        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel::SchedulePolicy;

    #[test]
    fn test_row_derivation() {
        let row = SweepRow::new(500, UpdateStrategy::ParallelFor(Schedule::default()), 4, 6.0, 2.0);
        assert!((row.speedup - 3.0).abs() < 1e-12);
        assert!((row.efficiency - 0.75).abs() < 1e-12);
        assert_eq!(row.schedule_label(), "static");
    }

    #[test]
    fn test_schedule_label() {
        let dynamic = UpdateStrategy::ParallelFor(Schedule::with_chunk(SchedulePolicy::Dynamic, 8));
        assert_eq!(SweepRow::new(1, dynamic, 1, 1.0, 1.0).schedule_label(), "dynamic,8");
        assert_eq!(SweepRow::new(1, UpdateStrategy::ParallelSimd, 1, 1.0, 1.0).schedule_label(), "parallel_simd");
    }

    #[test]
    fn test_plan_validation() {
        assert!(SweepPlan::default().validate().is_ok());
        let plan = SweepPlan {
            thread_counts: vec![2, 0],
            ..SweepPlan::default()
        };
        assert!(plan.validate().is_err());
        let plan = SweepPlan {
            strategy: StrategyKind::Sequential,
            ..SweepPlan::default()
        };
        assert!(plan.validate().is_err());
    }

    #[test]
    fn test_thread_counts_clamped_and_deduplicated() {
        assert_eq!(resolve_thread_counts(&[2, 4, 8, 16], 4), vec![2, 4]);
        assert_eq!(resolve_thread_counts(&[9, 1], 1), vec![1]);
        assert_eq!(resolve_thread_counts(&[3], 8), vec![3]);
    }

    #[test]
    fn test_oversubscribed_request_runs_on_available_threads() {
        let hw = hardware_threads();
        let plan = SweepPlan {
            particle_counts: vec![300],
            thread_counts: vec![hw + 5],
            steps: 2,
            warmup_steps: 0,
            ..SweepPlan::default()
        };
        let rows = plan.run().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].threads, hw);
        assert!((rows[0].efficiency - rows[0].speedup / hw as f64).abs() < 1e-12);
    }

    #[test]
    fn test_non_parallel_for_strategy_ignores_schedules() {
        let plan = SweepPlan {
            strategy: StrategyKind::ParallelSimd,
            particle_counts: vec![200],
            thread_counts: vec![1],
            schedules: vec![Schedule::default(), Schedule::new(SchedulePolicy::Guided)],
            steps: 2,
            warmup_steps: 0,
            ..SweepPlan::default()
        };
        let rows = plan.run().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].strategy, UpdateStrategy::ParallelSimd);
        assert_eq!(rows[0].schedule_label(), "parallel_simd");
    }

    #[test]
    fn test_small_sweep() {
        let plan = SweepPlan {
            particle_counts: vec![50, 300],
            thread_counts: vec![1],
            schedules: vec![Schedule::default(), Schedule::new(SchedulePolicy::Guided)],
            steps: 3,
            warmup_steps: 1,
            ..SweepPlan::default()
        };
        let rows = plan.run().unwrap();
        assert_eq!(rows.len(), plan.row_count());
        assert_eq!(rows.len(), 4);

        // Ordered by N, then schedule, then threads
        assert_eq!(rows[0].n, 50);
        assert_eq!(rows[0].strategy, UpdateStrategy::ParallelFor(Schedule::default()));
        assert_eq!(rows[1].strategy, UpdateStrategy::ParallelFor(Schedule::new(SchedulePolicy::Guided)));
        assert_eq!(rows[2].n, 300);

        // One baseline per N
        assert_eq!(rows[0].tb_ms, rows[1].tb_ms);
        assert!(rows.iter().all(|r| r.tb_ms >= 0.0 && r.to_ms >= 0.0 && r.threads == 1));
    }
}
