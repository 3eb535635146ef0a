//! Long-running scaling benchmarks.
//!
//! These run the strategies at large particle counts and check how the
//! parallel variants scale against the sequential baseline. They are marked
//! with `#[ignore]` so they only run when explicitly requested via:
//!
//! ```sh
//! cargo test --release -p reference-tests -- --ignored
//! ```

use crate::{EquivalenceCheck, ExpectedResult, PositionBoundsCheck, ReferenceTest};
use kernel::{hardware_threads, Schedule, SchedulePolicy, StrategyKind, UpdateStrategy};
use orchestrator::{BenchConfig, Comparison, SweepPlan};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .try_init();
}

/// One million particles through every strategy, compared bit for bit.
#[test]
#[ignore]
fn benchmark_million_particle_equivalence() {
    init_tracing();

    let test = ReferenceTest {
        name: "Million Particle Equivalence".to_string(),
        config: BenchConfig {
            particles: 1_000_000,
            steps: 100,
            warmup_steps: 10,
            ..BenchConfig::default()
        },
        expected: ExpectedResult {
            position_bounds: Some(PositionBoundsCheck::domain(1280, 720)),
            equivalence: Some(EquivalenceCheck {
                strategies: vec![
                    UpdateStrategy::ParallelFor(Schedule::new(SchedulePolicy::Static)),
                    UpdateStrategy::ParallelSimd,
                    UpdateStrategy::ParallelTasks,
                ],
                threads: hardware_threads(),
            }),
            grid_partition: true,
            sample_count: true,
            ..ExpectedResult::default()
        },
    };

    let result = test.run().expect("Test execution failed");
    result.print_summary();
    assert!(result.passed, "Million particle equivalence failed");
}

/// Static parallel-for must beat sequential at a large particle count.
///
/// Skipped on single-core machines.
#[test]
#[ignore]
fn benchmark_static_speedup() {
    init_tracing();

    let threads = hardware_threads();
    if threads < 2 {
        tracing::warn!("Only one hardware thread, skipping speedup benchmark");
        return;
    }

    let run = |strategy: StrategyKind| {
        let test = ReferenceTest {
            name: format!("Speedup ({})", strategy),
            config: BenchConfig {
                particles: 1_000_000,
                steps: 200,
                strategy,
                threads: threads as i64,
                ..BenchConfig::default()
            },
            expected: ExpectedResult {
                sample_count: true,
                ..ExpectedResult::default()
            },
        };
        let result = test.run().expect("Test execution failed");
        assert!(result.passed);
        result.report
    };

    let base = run(StrategyKind::Sequential);
    let parallel = run(StrategyKind::ParallelFor);
    let cmp = Comparison::of_reports(&base, &parallel);

    println!(
        "Tb={:.4} ms To={:.4} ms speedup={:.2} efficiency={:.2} ({} threads)",
        cmp.base_ms,
        cmp.other_ms,
        cmp.speedup,
        cmp.efficiency(threads),
        threads
    );
    assert!(cmp.speedup > 1.0, "parallel_for(static) no faster than sequential: {:.2}", cmp.speedup);
}

/// Full schedule sweep at the sizes used for reporting.
#[test]
#[ignore]
fn benchmark_schedule_sweep() {
    init_tracing();

    let max_threads = hardware_threads();
    let thread_counts: Vec<usize> = [1, 2, 4, 8, 16]
        .into_iter()
        .filter(|&t| t <= max_threads)
        .collect();

    let plan = SweepPlan {
        particle_counts: vec![10_000, 100_000, 1_000_000],
        thread_counts,
        schedules: vec![
            Schedule::new(SchedulePolicy::Static),
            Schedule::with_chunk(SchedulePolicy::Static, 1024),
            Schedule::with_chunk(SchedulePolicy::Dynamic, 1024),
            Schedule::new(SchedulePolicy::Guided),
        ],
        steps: 100,
        ..SweepPlan::default()
    };

    let rows = plan.run().expect("Sweep failed");
    assert_eq!(rows.len(), plan.row_count());
    for row in &rows {
        println!(
            "N={:>8} {:>14} threads={:>2} speedup={:.2} efficiency={:.2}",
            row.n,
            row.schedule_label(),
            row.threads,
            row.speedup,
            row.efficiency
        );
        assert!(row.tb_ms > 0.0 && row.to_ms > 0.0);
    }
}
