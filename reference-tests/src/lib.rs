//! Reference test framework for the particle step strategies
//!
//! Each reference test runs one benchmark configuration through the harness
//! and validates the final state, the grid and the recorded samples against
//! a set of expected results.

#[cfg(test)]
mod benchmarks;

use kernel::{create_kernel, ParticleState, SpatialGrid, UpdateStrategy};
use orchestrator::export::{read_frames, write_frames};
use orchestrator::{BenchConfig, BenchmarkHarness, BenchmarkReport, NullRenderer};

/// Expected result criteria for a reference test
#[derive(Debug, Clone, Default)]
pub struct ExpectedResult {
    /// Particle position bounds validation
    pub position_bounds: Option<PositionBoundsCheck>,
    /// Bitwise agreement with other strategies
    pub equivalence: Option<EquivalenceCheck>,
    /// Grid chains partition the particles
    pub grid_partition: bool,
    /// One valid sample per measured step
    pub sample_count: bool,
    /// The frame CSV holds every sample
    pub export_format: bool,
}

/// Check that particles remain within specified bounds
#[derive(Debug, Clone)]
pub struct PositionBoundsCheck {
    /// Minimum allowed position [x, y]
    pub min: [f32; 2],
    /// Maximum allowed position [x, y]
    pub max: [f32; 2],
}

impl PositionBoundsCheck {
    /// The closed domain `[0, w] x [0, h]`
    pub fn domain(width: u32, height: u32) -> Self {
        Self {
            min: [0.0, 0.0],
            max: [width as f32, height as f32],
        }
    }
}

/// Check that other strategies reach exactly the same state
#[derive(Debug, Clone)]
pub struct EquivalenceCheck {
    /// Strategies to compare against the one under test
    pub strategies: Vec<UpdateStrategy>,
    /// Worker threads for the compared strategies
    pub threads: usize,
}

/// Result of running a reference test
#[derive(Debug)]
pub struct TestResult {
    /// Test name
    pub name: String,
    /// Whether test passed
    pub passed: bool,
    /// Individual check results
    pub checks: Vec<CheckResult>,
    /// Timings of the measured steps
    pub report: BenchmarkReport,
}

/// Result of an individual validation check
#[derive(Debug)]
pub struct CheckResult {
    /// Check name
    pub name: String,
    /// Whether check passed
    pub passed: bool,
    /// Error message if failed
    pub message: Option<String>,
}

impl CheckResult {
    fn pass(name: &str, message: Option<String>) -> Self {
        Self {
            name: name.to_string(),
            passed: true,
            message,
        }
    }

    fn fail(name: &str, message: String) -> Self {
        Self {
            name: name.to_string(),
            passed: false,
            message: Some(message),
        }
    }
}

/// A reference test case
pub struct ReferenceTest {
    /// Test name
    pub name: String,
    /// Benchmark configuration to run
    pub config: BenchConfig,
    /// Expected results to validate
    pub expected: ExpectedResult,
}

impl ReferenceTest {
    /// Run the reference test and return results
    pub fn run(&self) -> Result<TestResult, String> {
        tracing::info!("Running reference test: {}", self.name);

        let config = &self.config;
        config.validate()?;
        let strategy = config.update_strategy()?;
        let threads = config.resolve_threads();

        let mut state = ParticleState::new(config.particles, config.width, config.height, config.seed);
        let mut grid = SpatialGrid::for_state(&state);
        let mut kernel = create_kernel(strategy, threads).map_err(|e| e.to_string())?;

        tracing::info!(
            "Initialized: {} particles, {} on {} threads",
            state.len(),
            strategy,
            kernel.threads()
        );

        let harness = BenchmarkHarness::new(config.warmup_steps);
        let report = harness.run(kernel.as_mut(), &mut state, &mut grid, &mut NullRenderer, config.steps);

        // Validate results
        let mut checks = Vec::new();

        if let Some(ref bounds) = self.expected.position_bounds {
            checks.push(validate_position_bounds(&state, bounds));
        }

        if let Some(ref equivalence) = self.expected.equivalence {
            let total_steps = config.warmup_steps + config.steps;
            for &other in &equivalence.strategies {
                checks.push(validate_equivalence(config, &state, other, equivalence.threads, total_steps)?);
            }
        }

        if self.expected.grid_partition {
            checks.push(validate_grid_partition(&grid, &state));
        }

        if self.expected.sample_count {
            checks.push(validate_samples(&report, config.steps));
        }

        if self.expected.export_format {
            checks.push(validate_export(&report));
        }

        let passed = checks.iter().all(|c| c.passed);
        Ok(TestResult {
            name: self.name.clone(),
            passed,
            checks,
            report,
        })
    }
}

/// Validate that particles remain within specified bounds
fn validate_position_bounds(state: &ParticleState, bounds: &PositionBoundsCheck) -> CheckResult {
    let view = state.view();
    let mut violations = 0;
    let mut max_violation = 0.0_f32;

    for i in 0..view.len() {
        let pos = [view.x[i], view.y[i]];

        for axis in 0..2 {
            if pos[axis] < bounds.min[axis] {
                violations += 1;
                max_violation = max_violation.max(bounds.min[axis] - pos[axis]);
            }
            if pos[axis] > bounds.max[axis] {
                violations += 1;
                max_violation = max_violation.max(pos[axis] - bounds.max[axis]);
            }
        }
    }

    if violations == 0 {
        CheckResult::pass("Position Bounds", None)
    } else {
        CheckResult::fail(
            "Position Bounds",
            format!("{} coordinates out of bounds (max violation: {:.6})", violations, max_violation),
        )
    }
}

/// Re-run the same scenario with another strategy and compare the bits
fn validate_equivalence(
    config: &BenchConfig,
    reference: &ParticleState,
    strategy: UpdateStrategy,
    threads: usize,
    steps: usize,
) -> Result<CheckResult, String> {
    let name = format!("Equivalence with {}", strategy);
    let mut state = ParticleState::new(config.particles, config.width, config.height, config.seed);
    let mut grid = SpatialGrid::for_state(&state);
    let mut kernel = create_kernel(strategy, threads).map_err(|e| e.to_string())?;
    for _ in 0..steps {
        kernel.step(&mut state, &mut grid);
    }

    let (a, b) = (reference.view(), state.view());
    let differing = (0..a.len())
        .filter(|&i| {
            a.x[i].to_bits() != b.x[i].to_bits()
                || a.y[i].to_bits() != b.y[i].to_bits()
                || a.vx[i].to_bits() != b.vx[i].to_bits()
                || a.vy[i].to_bits() != b.vy[i].to_bits()
        })
        .count();

    Ok(if differing == 0 {
        CheckResult::pass(&name, Some(format!("{} particles identical after {} steps", a.len(), steps)))
    } else {
        CheckResult::fail(&name, format!("{} / {} particles differ", differing, a.len()))
    })
}

/// Validate that every particle sits in exactly one chain, in the right cell
fn validate_grid_partition(grid: &SpatialGrid, state: &ParticleState) -> CheckResult {
    let view = state.view();
    let n = view.len();
    let mut seen = vec![0u32; n];
    let mut misplaced = 0;

    for cell in 0..grid.cell_count() {
        for (walked, i) in grid.members(cell).enumerate() {
            if walked >= n || i >= n {
                return CheckResult::fail("Grid Partition", format!("cell {} chain is corrupt", cell));
            }
            seen[i] += 1;
            if grid.cell_of(view.x[i], view.y[i]) != cell {
                misplaced += 1;
            }
        }
    }

    let missing = seen.iter().filter(|&&c| c == 0).count();
    let duplicated = seen.iter().filter(|&&c| c > 1).count();
    if missing == 0 && duplicated == 0 && misplaced == 0 {
        CheckResult::pass(
            "Grid Partition",
            Some(format!("{} particles over {}x{} cells", n, grid.cols(), grid.rows())),
        )
    } else {
        CheckResult::fail(
            "Grid Partition",
            format!("{} missing, {} duplicated, {} in the wrong cell", missing, duplicated, misplaced),
        )
    }
}

/// Validate one non-negative sample per measured step
fn validate_samples(report: &BenchmarkReport, steps: usize) -> CheckResult {
    if report.len() != steps {
        return CheckResult::fail("Sample Count", format!("expected {} samples, got {}", steps, report.len()));
    }
    let invalid = report.samples_ms.iter().filter(|ms| ms.is_nan() || **ms < 0.0).count();
    if invalid > 0 {
        return CheckResult::fail("Sample Count", format!("{} negative or NaN samples", invalid));
    }
    CheckResult::pass(
        "Sample Count",
        Some(format!("{} samples, mean {:.4} ms", report.len(), report.mean_ms())),
    )
}

/// Validate the frame CSV layout and that it reads back to the samples
fn validate_export(report: &BenchmarkReport) -> CheckResult {
    let mut buf = Vec::new();
    if let Err(e) = write_frames(&mut buf, &report.samples_ms) {
        return CheckResult::fail("Export Format", e.to_string());
    }
    let text = String::from_utf8_lossy(&buf);
    let mut lines = text.lines();
    if lines.next() != Some("frame,ms") {
        return CheckResult::fail("Export Format", "missing frame,ms header".to_string());
    }
    for (i, line) in lines.enumerate() {
        let expected = format!("{},{:.6}", i, report.samples_ms[i]);
        if line != expected {
            return CheckResult::fail("Export Format", format!("row {}: '{}' != '{}'", i, line, expected));
        }
    }

    match read_frames(buf.as_slice()) {
        Ok(read) if read.len() == report.len() => CheckResult::pass("Export Format", None),
        Ok(read) => CheckResult::fail(
            "Export Format",
            format!("read back {} rows, wrote {}", read.len(), report.len()),
        ),
        Err(e) => CheckResult::fail("Export Format", e.to_string()),
    }
}

impl TestResult {
    /// Print a summary of the test result
    pub fn print_summary(&self) {
        println!("\n{}", "=".repeat(80));
        println!("Test: {}", self.name);
        println!("{}", "=".repeat(80));
        println!("Status: {}", if self.passed { "PASSED" } else { "FAILED" });
        println!("Strategy: {} ({} threads)", self.report.strategy, self.report.threads);
        println!("Particles: {}", self.report.particles);
        println!("Measured steps: {}", self.report.len());
        println!("\nTimings:");
        println!("  Mean: {:.4} ms", self.report.mean_ms());
        if let (Some(min), Some(max)) = (self.report.min_ms(), self.report.max_ms()) {
            println!("  Min / Max: {:.4} / {:.4} ms", min, max);
        }
        println!("\nValidation Checks:");
        for check in &self.checks {
            let status = if check.passed { "PASS" } else { "FAIL" };
            print!("  [{}] {}", status, check.name);
            if let Some(ref msg) = check.message {
                print!(" - {}", msg);
            }
            println!();
        }
        println!("{}", "=".repeat(80));
    }
}

/// Standard scenarios shared by the binary and the test suite
pub mod scenarios {
    use super::*;
    use kernel::{Schedule, SchedulePolicy, StrategyKind};

    /// 100 particles, seed 42, 1280x720, 10 measured steps
    pub fn containment_test() -> ReferenceTest {
        ReferenceTest {
            name: "Containment".to_string(),
            config: BenchConfig {
                particles: 100,
                steps: 10,
                seed: 42,
                ..BenchConfig::default()
            },
            expected: ExpectedResult {
                position_bounds: Some(PositionBoundsCheck::domain(1280, 720)),
                sample_count: true,
                ..ExpectedResult::default()
            },
        }
    }

    /// Sequential against every parallel strategy and schedule
    pub fn strategy_equivalence_test() -> ReferenceTest {
        ReferenceTest {
            name: "Strategy Equivalence".to_string(),
            config: BenchConfig {
                particles: 5000,
                steps: 100,
                warmup_steps: 10,
                ..BenchConfig::default()
            },
            expected: ExpectedResult {
                equivalence: Some(EquivalenceCheck {
                    strategies: vec![
                        UpdateStrategy::ParallelFor(Schedule::new(SchedulePolicy::Static)),
                        UpdateStrategy::ParallelFor(Schedule::with_chunk(SchedulePolicy::Dynamic, 64)),
                        UpdateStrategy::ParallelFor(Schedule::new(SchedulePolicy::Guided)),
                        UpdateStrategy::ParallelSimd,
                        UpdateStrategy::ParallelTasks,
                    ],
                    threads: 4,
                }),
                ..ExpectedResult::default()
            },
        }
    }

    /// Grid chains after a run of the task strategy
    pub fn grid_partition_test() -> ReferenceTest {
        ReferenceTest {
            name: "Grid Partition".to_string(),
            config: BenchConfig {
                particles: 20_000,
                steps: 50,
                warmup_steps: 0,
                strategy: StrategyKind::ParallelTasks,
                threads: 4,
                ..BenchConfig::default()
            },
            expected: ExpectedResult {
                position_bounds: Some(PositionBoundsCheck::domain(1280, 720)),
                grid_partition: true,
                ..ExpectedResult::default()
            },
        }
    }

    /// Dynamic schedule run recorded to CSV
    pub fn export_test() -> ReferenceTest {
        ReferenceTest {
            name: "Export Format".to_string(),
            config: BenchConfig {
                particles: 2000,
                steps: 25,
                warmup_steps: 5,
                strategy: StrategyKind::ParallelFor,
                schedule: "dynamic,32".to_string(),
                threads: 2,
                ..BenchConfig::default()
            },
            expected: ExpectedResult {
                sample_count: true,
                export_format: true,
                ..ExpectedResult::default()
            },
        }
    }

    /// Get all reference tests
    pub fn all_tests() -> Vec<ReferenceTest> {
        vec![
            containment_test(),
            strategy_equivalence_test(),
            grid_partition_test(),
            export_test(),
        ]
    }
}
