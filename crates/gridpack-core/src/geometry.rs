#![forbid(unsafe_code)]

//! Cell-space geometry for fixed-size widget grids.
//!
//! Coordinates are 0-indexed with the origin at the top-left cell. Rows grow
//! downwards, columns grow to the right.

use serde::{Deserialize, Serialize};

/// Top-left cell of a widget's bounding rectangle.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct CellPos {
    pub row: u16,
    pub col: u16,
}

impl CellPos {
    /// Create a new cell position.
    #[inline]
    pub const fn new(row: u16, col: u16) -> Self {
        Self { row, col }
    }

    /// Grid origin `(0, 0)`.
    pub const ORIGIN: Self = Self::new(0, 0);

    /// Offset of `self` from `origin`, or `None` if `self` lies above or left of it.
    #[inline]
    pub fn offset_from(self, origin: CellPos) -> Option<CellPos> {
        Some(CellPos {
            row: self.row.checked_sub(origin.row)?,
            col: self.col.checked_sub(origin.col)?,
        })
    }

    /// Translate by a non-negative offset.
    #[inline]
    pub fn translate(self, offset: CellPos) -> Option<CellPos> {
        Some(CellPos {
            row: self.row.checked_add(offset.row)?,
            col: self.col.checked_add(offset.col)?,
        })
    }
}

/// Width and height of a widget, in cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Footprint {
    /// Columns spanned.
    pub width: u16,
    /// Rows spanned.
    pub height: u16,
}

impl Footprint {
    /// Create a new footprint.
    #[inline]
    pub const fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }

    /// Area in cells.
    #[inline]
    pub const fn area(&self) -> u32 {
        self.width as u32 * self.height as u32
    }

    /// Check if the footprint covers no cells.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Rectangle covered when the footprint is anchored at `origin`.
    #[inline]
    pub const fn at(self, origin: CellPos) -> CellRect {
        CellRect::new(origin.row, origin.col, self.width, self.height)
    }
}

/// A rectangle of grid cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct CellRect {
    /// Top row (inclusive).
    pub row: u16,
    /// Left column (inclusive).
    pub col: u16,
    /// Columns spanned.
    pub width: u16,
    /// Rows spanned.
    pub height: u16,
}

impl CellRect {
    /// Create a new rectangle.
    #[inline]
    pub const fn new(row: u16, col: u16, width: u16, height: u16) -> Self {
        Self {
            row,
            col,
            width,
            height,
        }
    }

    /// Rectangle covering a whole `rows` × `columns` grid.
    #[inline]
    pub const fn grid(rows: u16, columns: u16) -> Self {
        Self::new(0, 0, columns, rows)
    }

    /// Top-left cell.
    #[inline]
    pub const fn origin(&self) -> CellPos {
        CellPos::new(self.row, self.col)
    }

    /// Footprint of this rectangle.
    #[inline]
    pub const fn footprint(&self) -> Footprint {
        Footprint::new(self.width, self.height)
    }

    /// Bottom edge (exclusive).
    #[inline]
    pub const fn bottom(&self) -> u32 {
        self.row as u32 + self.height as u32
    }

    /// Right edge (exclusive).
    #[inline]
    pub const fn right(&self) -> u32 {
        self.col as u32 + self.width as u32
    }

    /// Area in cells.
    #[inline]
    pub const fn area(&self) -> u32 {
        self.width as u32 * self.height as u32
    }

    /// Check if the rectangle covers no cells.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Check if a cell is inside the rectangle.
    #[inline]
    pub const fn contains(&self, pos: CellPos) -> bool {
        pos.row >= self.row
            && (pos.row as u32) < self.bottom()
            && pos.col >= self.col
            && (pos.col as u32) < self.right()
    }

    /// Check if `other` lies entirely inside `self`.
    #[inline]
    pub const fn contains_rect(&self, other: &CellRect) -> bool {
        other.row >= self.row
            && other.col >= self.col
            && other.bottom() <= self.bottom()
            && other.right() <= self.right()
    }

    /// Check if the two rectangles share at least one cell.
    #[inline]
    pub const fn intersects(&self, other: &CellRect) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && (self.row as u32) < other.bottom()
            && (other.row as u32) < self.bottom()
            && (self.col as u32) < other.right()
            && (other.col as u32) < self.right()
    }

    /// Smallest rectangle containing both.
    pub fn union(&self, other: &CellRect) -> CellRect {
        let row = self.row.min(other.row);
        let col = self.col.min(other.col);
        let bottom = self.bottom().max(other.bottom());
        let right = self.right().max(other.right());
        CellRect {
            row,
            col,
            width: clamp_u16(right - u32::from(col)),
            height: clamp_u16(bottom - u32::from(row)),
        }
    }

    /// Iterate covered cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = CellPos> + '_ {
        let (row, col, width, height) = (self.row, self.col, self.width, self.height);
        (0..height).flat_map(move |dr| {
            (0..width).map(move |dc| CellPos::new(row.saturating_add(dr), col.saturating_add(dc)))
        })
    }
}

#[inline]
fn clamp_u16(value: u32) -> u16 {
    u16::try_from(value).unwrap_or(u16::MAX)
}
