use rayon::ThreadPool;

use crate::grid::SpatialGrid;
use crate::particle::ParticleState;
use crate::physics::{self, DT};
use crate::schedule::{self, Schedule, SchedulePolicy};
use crate::strategy::{build_pool, UpdateStrategy};
use crate::{KernelError, StepKernel};

const GUIDED: Schedule = Schedule::new(SchedulePolicy::Guided);

/// Guided particle loops followed by one task per grid cell.
///
/// After the grid rebuild a task is spawned for every one of the
/// `cols x rows` cells, occupied or not, so the number of tasks does not
/// depend on where the particles are. All of them are joined before
/// [`StepKernel::step`] returns.
pub struct ParallelTasksKernel {
    pool: ThreadPool,
    cell_tasks: usize,
}

impl ParallelTasksKernel {
    /// Create the kernel with its own pool of `threads` workers.
    pub fn new(threads: usize) -> Result<Self, KernelError> {
        Ok(Self {
            pool: build_pool(threads)?,
            cell_tasks: 0,
        })
    }

    /// Number of cell tasks spawned and joined by the most recent step.
    pub fn cell_tasks_last_step(&self) -> usize {
        self.cell_tasks
    }
}

/// Per-cell collision pass.
///
/// Particle-particle response is not modelled; the task still receives its
/// cell's chain head and shared read access to the grid and state, which is
/// everything a neighbor pass over `grid.members(cell)` would need.
#[inline(never)]
fn resolve_cell(_grid: &SpatialGrid, _state: &ParticleState, _head: Option<usize>) {}

impl StepKernel for ParallelTasksKernel {
    fn step(&mut self, state: &mut ParticleState, grid: &mut SpatialGrid) {
        let (width, height) = state.bounds();

        schedule::for_each_particle(&self.pool, GUIDED, state.particles_mut(), |mut p| {
            physics::integrate_particle(&mut p, DT)
        });
        schedule::for_each_particle(&self.pool, GUIDED, state.particles_mut(), |mut p| {
            physics::bounce_particle(&mut p, width, height)
        });

        grid.rebuild(state);

        let grid: &SpatialGrid = grid;
        let state: &ParticleState = state;
        self.cell_tasks = self.pool.scope(|scope| {
            let mut spawned = 0;
            for cy in 0..grid.rows() {
                for cx in 0..grid.cols() {
                    let head = grid.head(grid.cell_index(cx, cy));
                    scope.spawn(move |_| resolve_cell(grid, state, head));
                    spawned += 1;
                }
            }
            spawned
        });
    }

    fn strategy(&self) -> UpdateStrategy {
        UpdateStrategy::ParallelTasks
    }

    fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }
}
