use crate::grid::SpatialGrid;
use crate::particle::ParticleState;
use crate::physics::{self, DT};
use crate::strategy::UpdateStrategy;
use crate::StepKernel;

/// Reference strategy: ordered single-threaded passes, no pool.
#[derive(Debug, Default)]
pub struct SequentialKernel;

impl SequentialKernel {
    /// Create the sequential kernel.
    pub fn new() -> Self {
        Self
    }
}

impl StepKernel for SequentialKernel {
    fn step(&mut self, state: &mut ParticleState, grid: &mut SpatialGrid) {
        let (width, height) = state.bounds();
        physics::integrate(state.particles_mut(), DT);
        physics::bounce(state.particles_mut(), width, height);
        grid.rebuild(state);
    }

    fn strategy(&self) -> UpdateStrategy {
        UpdateStrategy::Sequential
    }

    fn threads(&self) -> usize {
        1
    }
}
