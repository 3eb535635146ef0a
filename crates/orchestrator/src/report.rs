//! Benchmark reports and run comparison

use serde::Serialize;

/// Per-step timings of one benchmark run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BenchmarkReport {
    /// Strategy label, e.g. `parallel_for(dynamic,8)`
    pub strategy: String,
    /// Worker threads the kernel used
    pub threads: usize,
    /// Particle count
    pub particles: usize,
    /// Duration of each measured step in milliseconds
    pub samples_ms: Vec<f64>,
}

impl BenchmarkReport {
    /// Create a report from raw samples
    pub fn new(strategy: impl Into<String>, threads: usize, particles: usize, samples_ms: Vec<f64>) -> Self {
        Self {
            strategy: strategy.into(),
            threads,
            particles,
            samples_ms,
        }
    }

    /// Number of measured steps
    pub fn len(&self) -> usize {
        self.samples_ms.len()
    }

    /// True if no step was measured
    pub fn is_empty(&self) -> bool {
        self.samples_ms.is_empty()
    }

    /// `(frame index, ms)` pairs in step order
    pub fn frames(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.samples_ms.iter().copied().enumerate()
    }

    /// Sum of all samples
    pub fn total_ms(&self) -> f64 {
        self.samples_ms.iter().sum()
    }

    /// Mean step time, 0.0 for an empty report
    pub fn mean_ms(&self) -> f64 {
        mean(&self.samples_ms)
    }

    /// Fastest step
    pub fn min_ms(&self) -> Option<f64> {
        self.samples_ms.iter().copied().reduce(f64::min)
    }

    /// Slowest step
    pub fn max_ms(&self) -> Option<f64> {
        self.samples_ms.iter().copied().reduce(f64::max)
    }

    /// Nearest-rank percentile, `p` in `0..=100`
    pub fn percentile_ms(&self, p: f64) -> Option<f64> {
        if self.samples_ms.is_empty() {
            return None;
        }
        let mut sorted = self.samples_ms.clone();
        sorted.sort_by(f64::total_cmp);
        let p = p.clamp(0.0, 100.0);
        let rank = ((p / 100.0) * sorted.len() as f64).ceil() as usize;
        Some(sorted[rank.saturating_sub(1).min(sorted.len() - 1)])
    }
}

/// Arithmetic mean, 0.0 for an empty slice
pub fn mean(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        0.0
    } else {
        samples.iter().sum::<f64>() / samples.len() as f64
    }
}

/// Speedup of one run over a baseline
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Comparison {
    /// Baseline mean step time (Tb)
    pub base_ms: f64,
    /// Compared mean step time (To)
    pub other_ms: f64,
    /// Tb / To
    pub speedup: f64,
}

impl Comparison {
    /// Compare two mean step times
    pub fn between(base_ms: f64, other_ms: f64) -> Self {
        let speedup = if other_ms > 0.0 { base_ms / other_ms } else { 0.0 };
        Self {
            base_ms,
            other_ms,
            speedup,
        }
    }

    /// Compare two reports by their means
    pub fn of_reports(base: &BenchmarkReport, other: &BenchmarkReport) -> Self {
        Self::between(base.mean_ms(), other.mean_ms())
    }

    /// Speedup divided by the thread count
    pub fn efficiency(&self, threads: usize) -> f64 {
        self.speedup / threads.max(1) as f64
    }
}
