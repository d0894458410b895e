//! Grid model: the boolean occupancy matrix.
//!
//! The matrix is always derived from the authoritative widget list via
//! [`Occupancy::compute`]. Operations may patch a private copy while they
//! plan a multi-step relocation, but nothing ever stores one across
//! operations.

use std::fmt;

use crate::config::GridConfig;
use crate::widget::Widget;
use crate::{CellPos, CellRect, WidgetId};

/// `rows × columns` occupancy matrix, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occupancy {
    rows: u16,
    columns: u16,
    cells: Vec<bool>,
}

impl Occupancy {
    /// All-free matrix for the configured dimensions.
    #[must_use]
    pub fn empty(config: &GridConfig) -> Self {
        Self {
            rows: config.rows,
            columns: config.columns,
            cells: vec![false; config.cell_count()],
        }
    }

    /// Mark every cell covered by a placed widget, skipping ids in `exclude`.
    ///
    /// Unplaced widgets cover nothing. Cells that fall outside the grid are
    /// ignored here; the invariant report is what flags them.
    #[must_use]
    pub fn compute<P>(widgets: &[Widget<P>], config: &GridConfig, exclude: &[WidgetId]) -> Self {
        let mut grid = Self::empty(config);
        for widget in widgets {
            if exclude.contains(&widget.id) {
                continue;
            }
            if let Some(rect) = widget.rect(config) {
                grid.fill(rect);
            }
        }
        grid
    }

    #[must_use]
    pub const fn rows(&self) -> u16 {
        self.rows
    }

    #[must_use]
    pub const fn columns(&self) -> u16 {
        self.columns
    }

    fn index(&self, pos: CellPos) -> Option<usize> {
        if pos.row < self.rows && pos.col < self.columns {
            Some(pos.row as usize * self.columns as usize + pos.col as usize)
        } else {
            None
        }
    }

    /// Whether a cell is occupied. Out-of-bounds cells count as occupied.
    #[must_use]
    pub fn is_occupied(&self, pos: CellPos) -> bool {
        self.index(pos).is_none_or(|idx| self.cells[idx])
    }

    /// Whether every cell of `rect` is inside the grid and free.
    #[must_use]
    pub fn is_free(&self, rect: CellRect) -> bool {
        CellRect::grid(self.rows, self.columns).contains_rect(&rect)
            && rect.cells().all(|pos| !self.is_occupied(pos))
    }

    /// Mark the in-bounds cells of `rect` as occupied.
    pub fn fill(&mut self, rect: CellRect) {
        self.set(rect, true);
    }

    /// Mark the in-bounds cells of `rect` as free.
    pub fn clear(&mut self, rect: CellRect) {
        self.set(rect, false);
    }

    fn set(&mut self, rect: CellRect, value: bool) {
        for pos in rect.cells() {
            if let Some(idx) = self.index(pos) {
                self.cells[idx] = value;
            }
        }
    }

    /// Number of occupied cells.
    #[must_use]
    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|&&c| c).count()
    }

    /// Free cells in row-major order.
    pub fn free_cells(&self) -> impl Iterator<Item = CellPos> + '_ {
        let columns = self.columns;
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, occupied)| !**occupied)
            .map(move |(idx, _)| {
                CellPos::new(
                    (idx / columns as usize) as u16,
                    (idx % columns as usize) as u16,
                )
            })
    }
}

impl fmt::Display for Occupancy {
    /// One line per row, `#` for occupied and `.` for free.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..self.rows {
            if row > 0 {
                writeln!(f)?;
            }
            for col in 0..self.columns {
                let ch = if self.is_occupied(CellPos::new(row, col)) {
                    '#'
                } else {
                    '.'
                };
                write!(f, "{ch}")?;
            }
        }
        Ok(())
    }
}
