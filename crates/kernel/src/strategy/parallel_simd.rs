use rayon::prelude::*;
use rayon::ThreadPool;

use crate::grid::SpatialGrid;
use crate::particle::{ParticleState, ParticlesMut};
use crate::physics::{self, DT};
use crate::strategy::{build_pool, UpdateStrategy};
use crate::{KernelError, StepKernel};

/// Static even partition with lane-form inner loops.
///
/// Each worker receives one contiguous stripe of `ceil(n / workers)`
/// particles and streams over it axis by axis, which leaves the compiler a
/// plain slice loop to vectorize. The result is bit-identical to the
/// per-particle form.
pub struct ParallelSimdKernel {
    pool: ThreadPool,
}

impl ParallelSimdKernel {
    /// Create the kernel with its own pool of `threads` workers.
    pub fn new(threads: usize) -> Result<Self, KernelError> {
        Ok(Self {
            pool: build_pool(threads)?,
        })
    }

    fn stripes<'a>(&self, particles: ParticlesMut<'a>) -> Vec<ParticlesMut<'a>> {
        let stride = particles.len().div_ceil(self.pool.current_num_threads()).max(1);
        particles.chunks(stride)
    }
}

impl StepKernel for ParallelSimdKernel {
    fn step(&mut self, state: &mut ParticleState, grid: &mut SpatialGrid) {
        let (width, height) = state.bounds();

        let stripes = self.stripes(state.particles_mut());
        self.pool.install(|| {
            stripes.into_par_iter().with_max_len(1).for_each(|s| {
                physics::integrate_lanes(s.x, s.vx, DT);
                physics::integrate_lanes(s.y, s.vy, DT);
            })
        });

        let stripes = self.stripes(state.particles_mut());
        self.pool.install(|| {
            stripes.into_par_iter().with_max_len(1).for_each(|s| {
                physics::reflect_lanes(s.x, s.vx, width);
                physics::reflect_lanes(s.y, s.vy, height);
            })
        });

        grid.rebuild(state);
    }

    fn strategy(&self) -> UpdateStrategy {
        UpdateStrategy::ParallelSimd
    }

    fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }
}
