//! Command-line arguments

use clap::{Args, Parser, Subcommand};
use kernel::{Schedule, StrategyKind};
use orchestrator::{BenchConfig, RendererKind, SweepPlan};
use std::path::PathBuf;

/// Particle step-strategy benchmark
#[derive(Parser, Debug)]
#[command(name = "bounce-bench", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Time one strategy and optionally record per-step timings.
    Run(RunArgs),
    /// Compare two recorded runs.
    Compare(CompareArgs),
    /// Sweep a strategy over schedules and thread counts against a sequential baseline.
    Sweep(SweepArgs),
}

/// Flags for `run`. Each one overrides the config file when given.
#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// JSON config file to start from.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Number of particles [default: 1000]
    #[arg(short, long)]
    pub n: Option<usize>,

    /// Number of measured steps [default: 1000]
    #[arg(short, long)]
    pub steps: Option<usize>,

    /// Worker threads, 0 or less for one per hardware thread [default: 0]
    #[arg(short, long, allow_negative_numbers = true)]
    pub threads: Option<i64>,

    /// Loop schedule as `static|dynamic|guided[,chunk]` [default: static]
    #[arg(long)]
    pub schedule: Option<String>,

    /// seq, for, simd or tasks [default: seq]
    #[arg(long)]
    pub strategy: Option<StrategyKind>,

    /// Write per-step timings to this CSV file.
    #[arg(long)]
    pub record: Option<PathBuf>,

    /// none or log [default: none]
    #[arg(long)]
    pub renderer: Option<RendererKind>,

    /// Unmeasured warm-up steps [default: 50]
    #[arg(long)]
    pub warmup: Option<usize>,

    /// Seed for the initial state [default: 42]
    #[arg(long)]
    pub seed: Option<u32>,
}

impl RunArgs {
    /// Load the config file, if any, and apply the flags on top.
    pub fn into_config(self) -> Result<BenchConfig, String> {
        let mut config = match &self.config {
            Some(path) => {
                let path = path
                    .to_str()
                    .ok_or_else(|| format!("Invalid config path {}", path.display()))?;
                BenchConfig::load(path)?
            }
            None => BenchConfig::default(),
        };

        if let Some(n) = self.n {
            config.particles = n;
        }
        if let Some(steps) = self.steps {
            config.steps = steps;
        }
        if let Some(threads) = self.threads {
            config.threads = threads;
        }
        if let Some(schedule) = self.schedule {
            config.schedule = schedule;
        }
        if let Some(strategy) = self.strategy {
            config.strategy = strategy;
        }
        if let Some(record) = self.record {
            config.record = Some(record);
        }
        if let Some(renderer) = self.renderer {
            config.renderer = renderer;
        }
        if let Some(warmup) = self.warmup {
            config.warmup_steps = warmup;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }

        config.validate()?;
        Ok(config)
    }
}

#[derive(Args, Debug)]
pub struct CompareArgs {
    /// Baseline frame CSV
    pub base: PathBuf,

    /// Frame CSV to compare against the baseline
    pub other: PathBuf,

    /// Threads used by the compared run, for efficiency
    #[arg(short, long)]
    pub threads: Option<usize>,
}

#[derive(Args, Debug)]
pub struct SweepArgs {
    /// Strategy to compare with the baseline: for, simd or tasks
    #[arg(long, default_value_t = StrategyKind::ParallelFor)]
    pub strategy: StrategyKind,

    /// Particle counts, comma separated
    #[arg(short, long, value_delimiter = ',', default_values_t = vec![1000usize, 10_000, 100_000])]
    pub n: Vec<usize>,

    /// Thread counts, comma separated; counts above the hardware are clamped
    #[arg(short, long, value_delimiter = ',', default_values_t = vec![2usize, 4, 8])]
    pub threads: Vec<usize>,

    /// Parallel-for schedule to sweep; repeat for several (e.g. `--schedule static --schedule dynamic,64`)
    #[arg(long = "schedule", default_values_t = vec![Schedule::default()])]
    pub schedules: Vec<Schedule>,

    /// Measured steps per run
    #[arg(short, long, default_value_t = 200)]
    pub steps: usize,

    /// Unmeasured warm-up steps per run
    #[arg(long, default_value_t = orchestrator::WARMUP_STEPS)]
    pub warmup: usize,

    /// Seed for every run
    #[arg(long, default_value_t = 42)]
    pub seed: u32,

    /// Write the summary table to this CSV file
    #[arg(long)]
    pub out: Option<PathBuf>,
}

impl SweepArgs {
    /// Build the sweep plan.
    pub fn plan(&self) -> SweepPlan {
        SweepPlan {
            strategy: self.strategy,
            particle_counts: self.n.clone(),
            thread_counts: self.threads.clone(),
            schedules: self.schedules.clone(),
            steps: self.steps,
            warmup_steps: self.warmup,
            seed: self.seed,
            ..SweepPlan::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel::SchedulePolicy;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("bounce-bench").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_run_defaults() {
        let Command::Run(args) = parse(&["run"]).command else {
            panic!("expected run");
        };
        let config = args.into_config().unwrap();
        assert_eq!(config.particles, 1000);
        assert_eq!(config.steps, 1000);
        assert_eq!(config.threads, 0);
        assert_eq!(config.schedule, "static");
        assert_eq!(config.strategy, StrategyKind::Sequential);
        assert_eq!(config.warmup_steps, 50);
        assert_eq!(config.seed, 42);
    }

    #[test]
    fn test_run_flags() {
        let cli = parse(&[
            "run", "--n", "5000", "--steps", "20", "--threads", "-1", "--schedule", "guided,4",
            "--strategy", "for", "--renderer", "log", "--record", "frames.csv",
        ]);
        let Command::Run(args) = cli.command else {
            panic!("expected run");
        };
        let config = args.into_config().unwrap();
        assert_eq!(config.particles, 5000);
        assert_eq!(config.threads, -1);
        assert_eq!(config.strategy, StrategyKind::ParallelFor);
        assert_eq!(config.renderer, RendererKind::Log);
        assert_eq!(config.record, Some(PathBuf::from("frames.csv")));
        assert_eq!(
            config.parse_schedule().unwrap(),
            Schedule::with_chunk(SchedulePolicy::Guided, 4)
        );
    }

    #[test]
    fn test_run_rejects_zero_particles() {
        let Command::Run(args) = parse(&["run", "--n", "0"]).command else {
            panic!("expected run");
        };
        assert!(args.into_config().is_err());
    }

    #[test]
    fn test_unknown_strategy() {
        let result = Cli::try_parse_from(["bounce-bench", "run", "--strategy", "gpu"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_sweep_lists() {
        let cli = parse(&[
            "sweep", "--n", "100,200", "--threads", "1,2,3", "--schedule", "static",
            "--schedule", "dynamic,64", "--out", "summary.csv",
        ]);
        let Command::Sweep(args) = cli.command else {
            panic!("expected sweep");
        };
        let plan = args.plan();
        assert_eq!(plan.strategy, StrategyKind::ParallelFor);
        assert_eq!(plan.particle_counts, vec![100, 200]);
        assert_eq!(plan.thread_counts, vec![1, 2, 3]);
        assert_eq!(
            plan.schedules,
            vec![Schedule::default(), Schedule::with_chunk(SchedulePolicy::Dynamic, 64)]
        );
        assert!(plan.validate().is_ok());
    }

    #[test]
    fn test_sweep_strategy() {
        let Command::Sweep(args) = parse(&["sweep", "--strategy", "simd", "--threads", "2"]).command else {
            panic!("expected sweep");
        };
        let plan = args.plan();
        assert_eq!(plan.strategy, StrategyKind::ParallelSimd);
        assert_eq!(plan.strategies(), vec![kernel::UpdateStrategy::ParallelSimd]);
    }

    #[test]
    fn test_compare_args() {
        let cli = parse(&["compare", "a.csv", "b.csv", "--threads", "4"]);
        let Command::Compare(args) = cli.command else {
            panic!("expected compare");
        };
        assert_eq!(args.base, PathBuf::from("a.csv"));
        assert_eq!(args.threads, Some(4));
    }
}
