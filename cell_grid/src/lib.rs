//! # cell_grid
//!
//! A fixed partition of the depth sensor's image plane into `columns × rows`
//! rectangular cells, indexed row-major from the top-left corner:
//!
//! ```text
//!            x →
//!     y   ┌────┬────┬────┬────┬────┐
//!     ↓   │  0 │  1 │  2 │  3 │  4 │
//!         ├────┼────┼────┼────┼────┤
//!         │  5 │  6 │  7 │  8 │  9 │
//!         ├────┼────┼────┼────┼────┤
//!         │ 10 │ 11 │ 12 │ 13 │ 14 │
//!         ├────┼────┼────┼────┼────┤
//!         │ 15 │ 16 │ 17 │ 18 │ 19 │
//!         └────┴────┴────┴────┴────┘
//! ```
//!
//! Point lookup never fails: coordinates outside the plane (centroid jitter,
//! negative values, NaN) resolve to the nearest edge cell.
//!
//! ```rust
//! use cell_grid::GridSpec;
//!
//! let grid = GridSpec::new(5, 4, 640, 480).unwrap();
//! assert_eq!(grid.cell_width(), 128);
//! assert_eq!(grid.cell_index_of(300.0, 250.0), 12);
//! assert_eq!(grid.cell_index_of(-10.0, 9999.0), 15);
//! ```

use thiserror::Error;

// ════════════════════════════════════════════════════════════════════════════
// GridError
// ════════════════════════════════════════════════════════════════════════════

/// Grid configuration errors.  Raised once, at construction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    #[error("grid needs at least one column and one row (got {columns}×{rows})")]
    EmptyGrid { columns: u32, rows: u32 },

    #[error("plane {width}×{height} is too small for a {columns}×{rows} grid")]
    CellTooSmall { width: u32, height: u32, columns: u32, rows: u32 },

    #[error("{columns}×{rows} grid has more cells than can be indexed")]
    TooManyCells { columns: u32, rows: u32 },
}

// ════════════════════════════════════════════════════════════════════════════
// GridSpec
// ════════════════════════════════════════════════════════════════════════════

/// Immutable grid geometry for one session.
///
/// Cell sizes are whole plane units (`plane_width / columns`), matching the
/// integer step the sensor pixels are bucketed by.  Any remainder strip along
/// the right or bottom edge belongs to the last column or row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridSpec {
    columns:      u32,
    rows:         u32,
    plane_width:  u32,
    plane_height: u32,
}

impl GridSpec {
    /// Columns used by the reference controller layout.
    pub const DEFAULT_COLUMNS: u32 = 5;
    /// Rows used by the reference controller layout.
    pub const DEFAULT_ROWS: u32 = 4;

    /// Build a grid, validating that every cell is at least one unit wide
    /// and tall.
    pub fn new(columns: u32, rows: u32, plane_width: u32, plane_height: u32)
        -> Result<Self, GridError>
    {
        if columns == 0 || rows == 0 {
            return Err(GridError::EmptyGrid { columns, rows });
        }
        if plane_width / columns == 0 || plane_height / rows == 0 {
            return Err(GridError::CellTooSmall {
                width: plane_width,
                height: plane_height,
                columns,
                rows,
            });
        }
        if columns.checked_mul(rows).is_none() {
            return Err(GridError::TooManyCells { columns, rows });
        }
        Ok(GridSpec { columns, rows, plane_width, plane_height })
    }

    pub fn columns(&self)      -> u32 { self.columns }
    pub fn rows(&self)         -> u32 { self.rows }
    pub fn plane_width(&self)  -> u32 { self.plane_width }
    pub fn plane_height(&self) -> u32 { self.plane_height }

    /// Width of one cell in plane units.
    pub fn cell_width(&self) -> u32 { self.plane_width / self.columns }

    /// Height of one cell in plane units.
    pub fn cell_height(&self) -> u32 { self.plane_height / self.rows }

    /// Total number of cells (`columns * rows`).
    pub fn cell_count(&self) -> usize { self.columns as usize * self.rows as usize }

    // ── point → cell ──────────────────────────────────────────────────────

    /// Column containing `x`, clamped to `[0, columns)`.
    pub fn column_of(&self, x: f32) -> u32 {
        clamped_step(x, self.cell_width(), self.columns)
    }

    /// Row containing `y`, clamped to `[0, rows)`.
    pub fn row_of(&self, y: f32) -> u32 {
        clamped_step(y, self.cell_height(), self.rows)
    }

    /// Row-major index of the cell containing `(x, y)`.
    ///
    /// Total over all inputs: out-of-plane points land on the nearest edge
    /// cell.
    pub fn cell_index_of(&self, x: f32, y: f32) -> usize {
        self.cell_at(self.column_of(x), self.row_of(y))
    }

    // ── cell ↔ (column, row) ──────────────────────────────────────────────

    /// Index of the cell at `(column, row)`.  Both are clamped into range.
    pub fn cell_at(&self, column: u32, row: u32) -> usize {
        let c = column.min(self.columns - 1);
        let r = row.min(self.rows - 1);
        r as usize * self.columns as usize + c as usize
    }

    pub fn column_of_cell(&self, cell: usize) -> u32 {
        (cell % self.columns as usize) as u32
    }

    pub fn row_of_cell(&self, cell: usize) -> u32 {
        (cell / self.columns as usize) as u32
    }

    /// Centre point of `cell` in plane coordinates.
    pub fn cell_center(&self, cell: usize) -> (f32, f32) {
        let cw = self.cell_width() as f32;
        let ch = self.cell_height() as f32;
        let x  = self.column_of_cell(cell) as f32 * cw + cw / 2.0;
        let y  = self.row_of_cell(cell) as f32 * ch + ch / 2.0;
        (x, y)
    }
}

impl Default for GridSpec {
    /// 5 × 4 cells over a 640 × 480 depth image.
    fn default() -> Self {
        GridSpec {
            columns:      Self::DEFAULT_COLUMNS,
            rows:         Self::DEFAULT_ROWS,
            plane_width:  640,
            plane_height: 480,
        }
    }
}

/// `floor(v / step)` clamped to `[0, count)`.  NaN and negatives map to 0.
fn clamped_step(v: f32, step: u32, count: u32) -> u32 {
    if !(v > 0.0) {
        return 0;
    }
    let i = (v / step as f32).floor();
    if i >= (count - 1) as f32 { count - 1 } else { i as u32 }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
