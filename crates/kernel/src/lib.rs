//! Particle step kernel
//!
//! This crate holds the compute core of the bounce benchmark: a seeded
//! particle population, the bucket grid rebuilt over it every step, and four
//! interchangeable ways of scheduling the per-particle work.
//!
//! # Modules
//! - [`rng`] -- Deterministic xorshift32 generator for initial attributes.
//! - [`particle`] -- Struct-of-arrays `ParticleState` and its mutable slice views.
//! - [`grid`] -- Uniform bucket grid with index-array cell chains.
//! - [`physics`] -- Per-particle integration and wall reflection.
//! - [`schedule`] -- Static / dynamic / guided loop distribution over a rayon pool.
//! - [`strategy`] -- The four step strategies and runtime selection.

#![warn(missing_docs)]

pub mod grid;
pub mod particle;
pub mod physics;
pub mod rng;
pub mod schedule;
pub mod strategy;

use std::fmt;

pub use grid::{SpatialGrid, GRID_CELLS_PER_AXIS};
pub use particle::{ParticleState, ParticleView};
pub use physics::DT;
pub use rng::XorShift32;
pub use schedule::{Schedule, ScheduleParseError, SchedulePolicy};
pub use strategy::{create_kernel, hardware_threads, StrategyKind, UpdateStrategy};

// ---------------------------------------------------------------------------
// StepKernel trait
// ---------------------------------------------------------------------------

/// Trait that all step strategies implement.
///
/// One call advances the state by one fixed [`DT`] step through three
/// phases, each complete before the next starts:
///
/// 1. Integration of every particle
/// 2. Wall reflection of every particle
/// 3. Rebuild of `grid` from the post-bounce positions, with the
///    [`GRID_CELLS_PER_AXIS`] layout over the state's domain whatever layout
///    the grid arrived with
///
/// The caller owns both the state and the grid; nothing else may touch them
/// while a step is in flight.
pub trait StepKernel {
    /// Advance `state` by one step and rebuild `grid` over it.
    fn step(&mut self, state: &mut ParticleState, grid: &mut SpatialGrid);

    /// The strategy this kernel implements.
    fn strategy(&self) -> UpdateStrategy;

    /// Worker threads used by the parallel phases (1 for sequential).
    fn threads(&self) -> usize;
}

/// Errors raised while setting up a step kernel.
#[derive(Debug)]
pub enum KernelError {
    /// The worker pool could not be started.
    ThreadPool(rayon::ThreadPoolBuildError),
}

impl fmt::Display for KernelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KernelError::ThreadPool(e) => write!(f, "Failed to start worker pool: {}", e),
        }
    }
}

impl std::error::Error for KernelError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            KernelError::ThreadPool(e) => Some(e),
        }
    }
}
