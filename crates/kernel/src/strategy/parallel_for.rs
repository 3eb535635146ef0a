use rayon::ThreadPool;

use crate::grid::SpatialGrid;
use crate::particle::ParticleState;
use crate::physics::{self, DT};
use crate::schedule::{self, Schedule};
use crate::strategy::{build_pool, UpdateStrategy, PARALLEL_THRESHOLD};
use crate::{KernelError, StepKernel};

/// Data-parallel integrate and bounce loops under a runtime [`Schedule`].
///
/// Small systems (at most [`PARALLEL_THRESHOLD`] particles) run the loops on
/// the calling thread, where fork/join overhead would dominate.
pub struct ParallelForKernel {
    pool: ThreadPool,
    schedule: Schedule,
}

impl ParallelForKernel {
    /// Create the kernel with its own pool of `threads` workers.
    pub fn new(threads: usize, schedule: Schedule) -> Result<Self, KernelError> {
        Ok(Self {
            pool: build_pool(threads)?,
            schedule,
        })
    }

    /// The schedule the loops are distributed with.
    pub fn schedule(&self) -> Schedule {
        self.schedule
    }
}

impl StepKernel for ParallelForKernel {
    fn step(&mut self, state: &mut ParticleState, grid: &mut SpatialGrid) {
        let (width, height) = state.bounds();

        if state.len() > PARALLEL_THRESHOLD {
            schedule::for_each_particle(&self.pool, self.schedule, state.particles_mut(), |mut p| {
                physics::integrate_particle(&mut p, DT)
            });
            schedule::for_each_particle(&self.pool, self.schedule, state.particles_mut(), |mut p| {
                physics::bounce_particle(&mut p, width, height)
            });
        } else {
            physics::integrate(state.particles_mut(), DT);
            physics::bounce(state.particles_mut(), width, height);
        }

        grid.rebuild(state);
    }

    fn strategy(&self) -> UpdateStrategy {
        UpdateStrategy::ParallelFor(self.schedule())
    }

    fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }
}
