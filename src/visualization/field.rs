//! Chladni wave field over a fixed logical grid.

use std::f64::consts::PI;

use super::modal::ModalParams;

/// Logical grid columns.
pub const GRID_COLS: usize = 150;
/// Logical grid rows.
pub const GRID_ROWS: usize = 266;

/// Antisymmetric superposition of two plate eigenmodes:
/// `cos(n*pi*x) * cos(m*pi*y) - cos(m*pi*x) * cos(n*pi*y)`.
///
/// Zero on the nodal lines, bounded by [-2, 2], and negated when `m` and `n`
/// are swapped.
pub fn evaluate(m: u32, n: u32, x: f64, y: f64) -> f64 {
    let (m, n) = (f64::from(m), f64::from(n));
    (n * PI * x).cos() * (m * PI * y).cos() - (m * PI * x).cos() * (n * PI * y).cos()
}

/// Fixed cell layout of the visualization, independent of surface size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grid {
    pub cols: usize,
    pub rows: usize,
}

impl Default for Grid {
    fn default() -> Self {
        Self {
            cols: GRID_COLS,
            rows: GRID_ROWS,
        }
    }
}

/// Pixel size of one grid cell on a particular surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellSize {
    pub width: f64,
    pub height: f64,
}

impl Grid {
    pub fn cell_size(&self, surface_width: f64, surface_height: f64) -> CellSize {
        CellSize {
            width: surface_width / self.cols as f64,
            height: surface_height / self.rows as f64,
        }
    }

    /// Iterates `(column, row)` pairs column by column.
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize)> {
        let rows = self.rows;
        (0..self.cols).flat_map(move |i| (0..rows).map(move |j| (i, j)))
    }
}

/// Field value at grid cell `(i, j)`.
///
/// Both coordinates are normalized by the surface *width*, so on a non-square
/// surface the pattern is stretched along the row axis.
pub fn field_at(i: usize, j: usize, cell: CellSize, width: f64, params: ModalParams) -> f64 {
    let x = (i as f64 * cell.width) / width;
    let y = (j as f64 * cell.height) / width;
    evaluate(params.m, params.n, x, y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::visualization::modal::{MAX_MODE, MIN_MODE};

    fn sample_points() -> Vec<(f64, f64)> {
        let mut points = Vec::new();
        for a in -6..=6 {
            for b in -6..=6 {
                points.push((a as f64 * 0.37, b as f64 * 0.53));
            }
        }
        points.push((1e6, -3.25e5));
        points
    }

    #[test]
    fn test_swapping_modes_negates_field() {
        for m in MIN_MODE..=MAX_MODE {
            for n in MIN_MODE..=MAX_MODE {
                for (x, y) in sample_points() {
                    assert_eq!(evaluate(m, n, x, y), -evaluate(n, m, x, y));
                }
            }
        }
    }

    #[test]
    fn test_field_is_bounded() {
        for m in MIN_MODE..=MAX_MODE {
            for n in MIN_MODE..=MAX_MODE {
                for (x, y) in sample_points() {
                    assert!(evaluate(m, n, x, y).abs() <= 2.0);
                }
            }
        }
    }

    #[test]
    fn test_equal_modes_give_flat_field() {
        for (x, y) in sample_points() {
            assert_eq!(evaluate(2, 2, x, y), 0.0);
        }
    }

    #[test]
    fn test_cell_size_divides_surface() {
        let grid = Grid::default();
        let cell = grid.cell_size(600.0, 1064.0);
        assert_eq!(cell.width, 4.0);
        assert_eq!(cell.height, 4.0);
    }

    #[test]
    fn test_rows_normalized_by_width() {
        let grid = Grid::default();
        let cell = grid.cell_size(300.0, 1064.0);
        let params = ModalParams { m: 3, n: 5 };
        // Row 75 sits at y = 300 px, i.e. one surface width down
        let expected = evaluate(3, 5, 0.0, 1.0);
        assert!((field_at(0, 75, cell, 300.0, params) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_cells_cover_grid() {
        let grid = Grid { cols: 3, rows: 2 };
        let cells: Vec<_> = grid.cells().collect();
        assert_eq!(cells, vec![(0, 0), (0, 1), (1, 0), (1, 1), (2, 0), (2, 1)]);
    }
}
