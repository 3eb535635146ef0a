//! Benchmark driver
//!
//! Runs one step strategy over a seeded particle population, compares two
//! recorded runs, or sweeps schedules and thread counts against the
//! sequential baseline.

mod cli;

use clap::Parser;
use orchestrator::export::{read_frames_csv, write_summary_csv};
use orchestrator::{run_benchmark, BenchmarkReport, Comparison, SweepRow};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::{Cli, Command, CompareArgs, RunArgs, SweepArgs};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bounce_bench=info,orchestrator=info,kernel=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Run(args) => run(args),
        Command::Compare(args) => compare(args),
        Command::Sweep(args) => sweep(args),
    }
}

fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = args.into_config()?;
    tracing::info!(
        "Run: strategy={} schedule={} threads={}",
        config.strategy,
        config.schedule,
        config.resolve_threads()
    );

    let report = run_benchmark(&config)?;
    print_report(&report);
    Ok(())
}

fn print_report(report: &BenchmarkReport) {
    println!("strategy   {}", report.strategy);
    println!("particles  {}", report.particles);
    println!("threads    {}", report.threads);
    println!("steps      {}", report.len());
    println!("mean       {:.4} ms", report.mean_ms());
    if let (Some(min), Some(max)) = (report.min_ms(), report.max_ms()) {
        println!("min / max  {:.4} / {:.4} ms", min, max);
    }
    if let (Some(p50), Some(p95)) = (report.percentile_ms(50.0), report.percentile_ms(95.0)) {
        println!("p50 / p95  {:.4} / {:.4} ms", p50, p95);
    }
    println!("total      {:.2} ms", report.total_ms());
}

fn compare(args: CompareArgs) -> Result<(), Box<dyn std::error::Error>> {
    let base = read_frames_csv(&args.base)?;
    let other = read_frames_csv(&args.other)?;
    if base.is_empty() || other.is_empty() {
        return Err("Both runs must contain at least one frame".into());
    }

    let tb = orchestrator::report::mean(&base);
    let to = orchestrator::report::mean(&other);
    let cmp = Comparison::between(tb, to);

    println!("base   {} ({} frames): {:.4} ms/step", args.base.display(), base.len(), tb);
    println!("other  {} ({} frames): {:.4} ms/step", args.other.display(), other.len(), to);
    println!("speedup     {:.3}", cmp.speedup);
    if let Some(threads) = args.threads {
        println!("efficiency  {:.3} ({} threads)", cmp.efficiency(threads), threads);
    }
    Ok(())
}

fn sweep(args: SweepArgs) -> Result<(), Box<dyn std::error::Error>> {
    let plan = args.plan();
    plan.validate()?;

    let rows = plan.run()?;
    print_summary(&rows);

    if let Some(path) = &args.out {
        if let Err(e) = write_summary_csv(path, &rows) {
            tracing::error!("Failed to write {}: {}", path.display(), e);
        }
    }
    Ok(())
}

fn print_summary(rows: &[SweepRow]) {
    println!(
        "{:>10} {:>14} {:>8} {:>12} {:>12} {:>9} {:>11}",
        "N", "Schedule", "Threads", "Tb (ms)", "To (ms)", "Speedup", "Efficiency"
    );
    for row in rows {
        println!(
            "{:>10} {:>14} {:>8} {:>12.4} {:>12.4} {:>9.2} {:>11.2}",
            row.n,
            row.schedule_label(),
            row.threads,
            row.tb_ms,
            row.to_ms,
            row.speedup,
            row.efficiency
        );
    }
}
