//! Configuration parsing and validation for benchmark runs

use kernel::{hardware_threads, Schedule, StrategyKind, UpdateStrategy};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::harness::WARMUP_STEPS;
use crate::render::RendererKind;

/// Main benchmark configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchConfig {
    /// Number of particles
    #[serde(default = "default_particles")]
    pub particles: usize,
    /// Number of measured steps
    #[serde(default = "default_steps")]
    pub steps: usize,
    /// Unmeasured steps run before timing starts
    #[serde(default = "default_warmup")]
    pub warmup_steps: usize,
    /// Domain width
    #[serde(default = "default_width")]
    pub width: u32,
    /// Domain height
    #[serde(default = "default_height")]
    pub height: u32,
    /// Seed for the initial particle attributes
    #[serde(default = "default_seed")]
    pub seed: u32,
    /// Which step strategy to run
    #[serde(default)]
    pub strategy: StrategyKind,
    /// Schedule for the parallel-for strategy, `kind[,chunk]`
    #[serde(default = "default_schedule")]
    pub schedule: String,
    /// Worker threads; zero or negative means one per hardware thread
    #[serde(default)]
    pub threads: i64,
    /// Where to write the per-step CSV, if anywhere
    #[serde(default)]
    pub record: Option<PathBuf>,
    /// Which renderer receives the state after each measured step
    #[serde(default)]
    pub renderer: RendererKind,
}

// Default values
fn default_particles() -> usize {
    1000
}

fn default_steps() -> usize {
    1000
}

fn default_warmup() -> usize {
    WARMUP_STEPS
}

fn default_width() -> u32 {
    1280
}

fn default_height() -> u32 {
    720
}

fn default_seed() -> u32 {
    42
}

fn default_schedule() -> String {
    "static".to_string()
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            particles: default_particles(),
            steps: default_steps(),
            warmup_steps: default_warmup(),
            width: default_width(),
            height: default_height(),
            seed: default_seed(),
            strategy: StrategyKind::default(),
            schedule: default_schedule(),
            threads: 0,
            record: None,
            renderer: RendererKind::default(),
        }
    }
}

impl BenchConfig {
    /// Load configuration from a JSON file
    pub fn load(path: &str) -> Result<Self, String> {
        let contents = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file {}: {}", path, e))?;

        let config: BenchConfig = serde_json::from_str(&contents)
            .map_err(|e| format!("Failed to parse config JSON: {}", e))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    ///
    /// Everything that could stop a run is checked here, before the first step.
    pub fn validate(&self) -> Result<(), String> {
        if self.particles < 1 {
            return Err("N must be >= 1".to_string());
        }
        if self.particles >= u32::MAX as usize {
            return Err(format!("N must be < {}", u32::MAX));
        }
        if self.steps < 1 {
            return Err("steps must be >= 1".to_string());
        }
        if self.width == 0 || self.height == 0 {
            return Err("Domain width and height must be positive".to_string());
        }

        self.parse_schedule()?;

        Ok(())
    }

    /// Parse the schedule string
    pub fn parse_schedule(&self) -> Result<Schedule, String> {
        self.schedule
            .parse::<Schedule>()
            .map_err(|e| format!("Invalid schedule '{}': {}", self.schedule, e))
    }

    /// The strategy with its schedule attached
    pub fn update_strategy(&self) -> Result<UpdateStrategy, String> {
        Ok(UpdateStrategy::from_kind(self.strategy, self.parse_schedule()?))
    }

    /// Resolve the worker count against the hardware
    pub fn resolve_threads(&self) -> usize {
        resolve_threads(self.threads, hardware_threads())
    }
}

/// Map a requested thread count onto `1..=available`.
///
/// Zero or negative selects `available`; anything above it is clamped.
pub fn resolve_threads(requested: i64, available: usize) -> usize {
    let available = available.max(1);
    if requested <= 0 {
        return available;
    }
    let requested = requested as u64;
    if requested > available as u64 {
        tracing::warn!(
            "Requested {} threads but only {} are available, clamping",
            requested,
            available
        );
        return available;
    }
    requested as usize
}
