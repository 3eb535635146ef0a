//! Strategy equivalence: every strategy must leave the same bits behind.
//!
//! Per-particle updates are independent, so how the loop is split across
//! workers must not change any position or velocity.

use kernel::{
    create_kernel, ParticleState, Schedule, SchedulePolicy, SpatialGrid, StepKernel,
    UpdateStrategy,
};

fn run(strategy: UpdateStrategy, threads: usize, n: usize, steps: usize) -> ParticleState {
    let mut state = ParticleState::new(n, 1280, 720, 42);
    let mut grid = SpatialGrid::for_state(&state);
    let mut kernel = create_kernel(strategy, threads).expect("kernel setup");
    for _ in 0..steps {
        kernel.step(&mut state, &mut grid);
    }
    state
}

#[test]
fn static_for_and_simd_match_sequential() {
    // Above the parallel threshold so the pool is actually used
    let n = 5_000;
    let steps = 120;
    let reference = run(UpdateStrategy::Sequential, 1, n, steps);

    let for_static = run(UpdateStrategy::ParallelFor(Schedule::default()), 4, n, steps);
    let simd = run(UpdateStrategy::ParallelSimd, 4, n, steps);

    assert_eq!(reference, for_static, "parallel_for(static) diverged from sequential");
    assert_eq!(reference, simd, "parallel_simd diverged from sequential");
}

#[test]
fn every_schedule_and_tasks_match_sequential() {
    let n = 3_001;
    let steps = 60;
    let reference = run(UpdateStrategy::Sequential, 1, n, steps);

    let strategies = [
        UpdateStrategy::ParallelFor(Schedule::with_chunk(SchedulePolicy::Static, 17)),
        UpdateStrategy::ParallelFor(Schedule::new(SchedulePolicy::Dynamic)),
        UpdateStrategy::ParallelFor(Schedule::with_chunk(SchedulePolicy::Dynamic, 64)),
        UpdateStrategy::ParallelFor(Schedule::new(SchedulePolicy::Guided)),
        UpdateStrategy::ParallelFor(Schedule::with_chunk(SchedulePolicy::Guided, 32)),
        UpdateStrategy::ParallelTasks,
    ];
    for strategy in strategies {
        let result = run(strategy, 3, n, steps);
        assert_eq!(reference, result, "{strategy} diverged from sequential");
    }
}

#[test]
fn below_threshold_parallel_for_still_matches() {
    let reference = run(UpdateStrategy::Sequential, 1, 100, 30);
    let small = run(UpdateStrategy::ParallelFor(Schedule::new(SchedulePolicy::Dynamic)), 4, 100, 30);
    assert_eq!(reference, small);
}

#[test]
fn grids_agree_after_step() {
    let n = 2_000;
    let mut a = ParticleState::new(n, 800, 600, 5);
    let mut b = a.clone();
    let mut grid_a = SpatialGrid::for_state(&a);
    let mut grid_b = SpatialGrid::for_state(&b);

    create_kernel(UpdateStrategy::Sequential, 1).unwrap().step(&mut a, &mut grid_a);
    create_kernel(UpdateStrategy::ParallelTasks, 4).unwrap().step(&mut b, &mut grid_b);

    for cell in 0..grid_a.cell_count() {
        let ma: Vec<usize> = grid_a.members(cell).collect();
        let mb: Vec<usize> = grid_b.members(cell).collect();
        assert_eq!(ma, mb, "cell {cell} chain differs");
    }
}

#[test]
fn every_strategy_replaces_a_grid_sized_for_another_domain() {
    let strategies = [
        UpdateStrategy::Sequential,
        UpdateStrategy::ParallelFor(Schedule::default()),
        UpdateStrategy::ParallelSimd,
        UpdateStrategy::ParallelTasks,
    ];
    for strategy in strategies {
        let mut state = ParticleState::new(500, 1280, 720, 11);
        let mut grid = SpatialGrid::new(100, 100, 8);
        create_kernel(strategy, 2).unwrap().step(&mut state, &mut grid);

        let mut expected = SpatialGrid::for_state(&state);
        expected.build(&state);
        assert!(grid.fits(&state), "{strategy} kept the foreign layout");
        let v = state.view();
        for i in 0..v.len() {
            let cell = expected.cell_of(v.x[i], v.y[i]);
            assert!(grid.members(cell).any(|j| j == i), "{strategy}: particle {i} not in cell {cell}");
        }
    }
}
