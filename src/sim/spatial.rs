//! Uniform-grid broad phase
//!
//! Buckets body centers into fixed-size cells, then enumerates candidate
//! pairs from each cell together with its four forward neighbors (right,
//! down, down-right, down-left) so every unordered pair is produced at most
//! once across the whole grid. Expected O(n) for uniformly spread bodies.
//!
//! Correctness assumes no body radius exceeds half the cell size; a larger
//! body could overlap a neighbor two cells away and the pair would never be
//! enumerated. The constraint is documented, not enforced.

use glam::Vec2;

use super::body::Body;

/// Forward neighbor offsets: right, down, down-right, down-left.
const FORWARD: [(isize, isize); 4] = [(1, 0), (0, 1), (1, 1), (-1, 1)];

/// One tick's spatial bucketing of the registry. Holds indices into the
/// body slice it was built from, so it must be rebuilt after any removal.
pub struct SpatialGrid {
    cols: usize,
    rows: usize,
    cells: Vec<Vec<usize>>,
}

impl SpatialGrid {
    /// Bucket every body into the cell containing its center. Centers that
    /// sit outside the arena (mid-resize) clamp to the border cells.
    pub fn bucket(bodies: &[Body], arena: Vec2, cell_size: f32) -> Self {
        let cols = (arena.x / cell_size) as usize + 1;
        let rows = (arena.y / cell_size) as usize + 1;
        let mut cells = vec![Vec::new(); cols * rows];

        for (index, body) in bodies.iter().enumerate() {
            let col = ((body.pos.x / cell_size).floor() as isize).clamp(0, cols as isize - 1);
            let row = ((body.pos.y / cell_size).floor() as isize).clamp(0, rows as isize - 1);
            cells[row as usize * cols + col as usize].push(index);
        }

        Self { cols, rows, cells }
    }

    fn neighbor(&self, cell: usize, dc: isize, dr: isize) -> Option<usize> {
        let col = (cell % self.cols) as isize + dc;
        let row = (cell / self.cols) as isize + dr;
        if col < 0 || col >= self.cols as isize || row < 0 || row >= self.rows as isize {
            return None;
        }
        Some(row as usize * self.cols + col as usize)
    }

    /// Lazily enumerate candidate pairs: all pairs within a cell, then each
    /// cell's bodies against the four forward-adjacent cells. Yields every
    /// unordered pair at most once.
    pub fn candidate_pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (0..self.cells.len()).flat_map(move |cell_idx| {
            let cell = &self.cells[cell_idx];
            let within = cell
                .iter()
                .enumerate()
                .flat_map(move |(i, &a)| cell[i + 1..].iter().map(move |&b| (a, b)));
            let across = FORWARD
                .iter()
                .filter_map(move |&(dc, dr)| self.neighbor(cell_idx, dc, dr))
                .flat_map(move |other| {
                    cell.iter()
                        .flat_map(move |&a| self.cells[other].iter().map(move |&b| (a, b)))
                });
            within.chain(across)
        })
    }
}
