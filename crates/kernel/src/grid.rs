//! Uniform bucket grid over the 2D domain.
//!
//! Cell membership is stored as an intrusive singly-linked list encoded in
//! two index arrays (`head` per cell, `next` per particle) instead of per-node
//! allocations, so a rebuild is two fills and one pass over the particles.

use crate::particle::ParticleState;

/// Sentinel marking the end of a cell chain / an empty cell.
pub const EMPTY: u32 = u32::MAX;

/// Cells per axis used by every step strategy.
pub const GRID_CELLS_PER_AXIS: usize = 64;

/// Uniform bucket grid with per-cell particle chains.
///
/// For every particle `i`, walking `head[cell(i)]` through `next` reaches `i`
/// exactly once. The grid is a derived index: it holds no identity across
/// steps and [`SpatialGrid::build`] overwrites all of it.
#[derive(Debug, Clone)]
pub struct SpatialGrid {
    cols: usize,
    rows: usize,
    cell_w: f32,
    cell_h: f32,
    /// Last-inserted particle per cell, or [`EMPTY`].
    head: Vec<u32>,
    /// Previously-inserted particle in the same cell, or [`EMPTY`].
    next: Vec<u32>,
}

impl SpatialGrid {
    /// Create a square `cells_per_axis x cells_per_axis` grid over `width x height`.
    pub fn new(width: u32, height: u32, cells_per_axis: usize) -> Self {
        assert!(cells_per_axis >= 1, "cells_per_axis must be at least 1");
        let cols = cells_per_axis;
        let rows = cells_per_axis;
        Self {
            cols,
            rows,
            cell_w: width as f32 / cols as f32,
            cell_h: height as f32 / rows as f32,
            head: vec![EMPTY; cols * rows],
            next: Vec::new(),
        }
    }

    /// Grid over `state`'s domain with the fixed [`GRID_CELLS_PER_AXIS`] layout.
    pub fn for_state(state: &ParticleState) -> Self {
        Self::new(state.width(), state.height(), GRID_CELLS_PER_AXIS)
    }

    /// Number of columns.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Total number of cells.
    pub fn cell_count(&self) -> usize {
        self.cols * self.rows
    }

    /// Cell width and height.
    pub fn cell_size(&self) -> (f32, f32) {
        (self.cell_w, self.cell_h)
    }

    /// Number of particles indexed by the last build.
    pub fn particle_count(&self) -> usize {
        self.next.len()
    }

    /// Map a position to `(column, row)`, clamped into the grid.
    ///
    /// Positions outside the domain land in the nearest edge cell.
    #[inline]
    pub fn cell_coords(&self, x: f32, y: f32) -> (usize, usize) {
        let cx = (x / self.cell_w)
            .floor()
            .max(0.0)
            .min((self.cols - 1) as f32) as usize;
        let cy = (y / self.cell_h)
            .floor()
            .max(0.0)
            .min((self.rows - 1) as f32) as usize;
        (cx, cy)
    }

    /// Flat row-major cell index from `(column, row)`.
    #[inline]
    pub fn cell_index(&self, cx: usize, cy: usize) -> usize {
        debug_assert!(cx < self.cols && cy < self.rows);
        cy * self.cols + cx
    }

    /// Flat cell index of a position.
    #[inline]
    pub fn cell_of(&self, x: f32, y: f32) -> usize {
        let (cx, cy) = self.cell_coords(x, y);
        self.cell_index(cx, cy)
    }

    /// Rebuild the chains from the current particle positions.
    pub fn build(&mut self, state: &ParticleState) {
        let n = state.len();
        debug_assert!(n < EMPTY as usize, "particle index would collide with EMPTY");

        self.head.clear();
        self.head.resize(self.cols * self.rows, EMPTY);
        self.next.clear();
        self.next.resize(n, EMPTY);

        let view = state.view();
        for i in 0..n {
            let cell = self.cell_of(view.x[i], view.y[i]);
            // Prepend to the cell's chain
            self.next[i] = self.head[cell];
            self.head[cell] = i as u32;
        }
    }

    /// True if this grid has the [`GRID_CELLS_PER_AXIS`] layout over `state`'s domain.
    pub fn fits(&self, state: &ParticleState) -> bool {
        let cells = GRID_CELLS_PER_AXIS;
        self.cols == cells
            && self.rows == cells
            && self.cell_w == state.width() as f32 / cells as f32
            && self.cell_h == state.height() as f32 / cells as f32
    }

    /// Step rebuild: restore the fixed layout over `state`'s domain if this
    /// grid was sized differently, then [`build`](Self::build) the chains.
    pub fn rebuild(&mut self, state: &ParticleState) {
        if !self.fits(state) {
            tracing::debug!(
                "Grid {}x{} ({}x{} cells) does not fit a {}x{} domain, resizing",
                self.cols,
                self.rows,
                self.cell_w,
                self.cell_h,
                state.width(),
                state.height()
            );
            *self = Self::for_state(state);
        }
        self.build(state);
    }

    /// First particle of a cell's chain, if any.
    #[inline]
    pub fn head(&self, cell: usize) -> Option<usize> {
        match self.head[cell] {
            EMPTY => None,
            i => Some(i as usize),
        }
    }

    /// Walk a cell's chain from its head.
    pub fn members(&self, cell: usize) -> CellMembers<'_> {
        CellMembers {
            next: &self.next,
            cursor: self.head[cell],
        }
    }
}

/// Iterator over the particle indices chained in one cell.
#[derive(Debug, Clone)]
pub struct CellMembers<'a> {
    next: &'a [u32],
    cursor: u32,
}

impl Iterator for CellMembers<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.cursor == EMPTY {
            return None;
        }
        let i = self.cursor as usize;
        self.cursor = self.next[i];
        Some(i)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_at(width: u32, height: u32, pts: &[(f32, f32)]) -> ParticleState {
        let x: Vec<f32> = pts.iter().map(|p| p.0).collect();
        let y: Vec<f32> = pts.iter().map(|p| p.1).collect();
        let zeros = vec![0.0; pts.len()];
        ParticleState::from_parts(width, height, &x, &y, &zeros, &zeros)
    }

    #[test]
    fn cell_size_from_domain() {
        let grid = SpatialGrid::new(640, 480, 4);
        assert_eq!(grid.cols(), 4);
        assert_eq!(grid.rows(), 4);
        assert_eq!(grid.cell_size(), (160.0, 120.0));
        assert_eq!(grid.cell_count(), 16);
    }

    #[test]
    fn out_of_domain_position_clamps_to_last_column() {
        let grid = SpatialGrid::new(640, 480, 4);
        assert_eq!(grid.cell_coords(650.0, 10.0), (3, 0));
        assert_eq!(grid.cell_coords(-5.0, 481.0), (0, 3));
    }

    #[test]
    fn empty_cells_have_no_head() {
        let mut grid = SpatialGrid::new(100, 100, 2);
        grid.build(&state_at(100, 100, &[(10.0, 10.0)]));
        assert_eq!(grid.head(0), Some(0));
        assert_eq!(grid.head(1), None);
        assert_eq!(grid.members(3).count(), 0);
    }

    #[test]
    fn chain_is_last_inserted_first() {
        let mut grid = SpatialGrid::new(100, 100, 2);
        let state = state_at(100, 100, &[(10.0, 10.0), (90.0, 90.0), (20.0, 30.0), (5.0, 45.0)]);
        grid.build(&state);
        let cell = grid.cell_of(10.0, 10.0);
        assert_eq!(grid.members(cell).collect::<Vec<_>>(), vec![3, 2, 0]);
        assert_eq!(grid.members(grid.cell_of(90.0, 90.0)).collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn rebuild_on_reused_grid_forgets_old_chains() {
        let mut grid = SpatialGrid::new(100, 100, 2);
        grid.build(&state_at(100, 100, &[(10.0, 10.0), (12.0, 12.0), (14.0, 14.0)]));
        grid.build(&state_at(100, 100, &[(90.0, 10.0)]));
        assert_eq!(grid.particle_count(), 1);
        assert_eq!(grid.head(0), None);
        assert_eq!(grid.members(1).collect::<Vec<_>>(), vec![0]);
    }

    #[test]
    fn domain_edge_lands_in_last_cell() {
        let grid = SpatialGrid::new(1280, 720, 64);
        assert_eq!(grid.cell_coords(1280.0, 720.0), (63, 63));
        assert_eq!(grid.cell_coords(0.0, 0.0), (0, 0));
    }

    #[test]
    fn rebuild_restores_fixed_layout() {
        let state = state_at(1280, 720, &[(650.0, 10.0), (1279.0, 719.0)]);
        let mut grid = SpatialGrid::new(1280, 720, 4);
        assert!(!grid.fits(&state));
        grid.rebuild(&state);
        assert!(grid.fits(&state));
        assert_eq!((grid.cols(), grid.rows()), (64, 64));
        assert_eq!(grid.cell_size(), (20.0, 11.25));
        assert_eq!(grid.members(grid.cell_index(32, 0)).collect::<Vec<_>>(), vec![0]);
    }

    #[test]
    fn rebuild_resizes_grid_from_other_domain() {
        let state = state_at(1280, 720, &[(100.0, 500.0)]);
        let mut grid = SpatialGrid::new(100, 100, GRID_CELLS_PER_AXIS);
        grid.rebuild(&state);
        // 100 / 20 = column 5, 500 / 11.25 = row 44
        assert_eq!(grid.head(44 * 64 + 5), Some(0));
    }

    #[test]
    fn rebuild_keeps_fitting_grid() {
        let state = state_at(640, 480, &[(1.0, 1.0)]);
        let mut grid = SpatialGrid::for_state(&state);
        grid.rebuild(&state);
        assert_eq!(grid.cell_count(), 64 * 64);
        assert_eq!(grid.head(0), Some(0));
    }

    #[test]
    #[should_panic(expected = "cells_per_axis")]
    fn zero_cells_rejected() {
        let _ = SpatialGrid::new(10, 10, 0);
    }
}
