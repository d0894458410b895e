//! Grid configuration: dimensions, size table, score budget.
//!
//! A [`GridConfig`] is injected into every packer operation, so the
//! single-plane and multi-plane dashboards share one engine and differ only
//! in data. Configurations are serde-friendly so hosts can keep them in JSON
//! next to their other settings.
//!
//! ```
//! use gridpack::config::GridConfig;
//!
//! let config: GridConfig = serde_json::from_str(
//!     r#"{
//!         "rows": 4,
//!         "columns": 2,
//!         "scoreBudget": 200,
//!         "sizes": {
//!             "tiny":   { "footprint": { "width": 1, "height": 1 }, "weight": 10 },
//!             "small":  { "footprint": { "width": 1, "height": 2 }, "weight": 20 },
//!             "medium": { "footprint": { "width": 2, "height": 2 }, "weight": 40 },
//!             "large":  { "footprint": { "width": 2, "height": 4 }, "weight": 80 }
//!         }
//!     }"#,
//! )
//! .unwrap();
//! assert!(config.validate().is_ok());
//! assert_eq!(config, GridConfig::single_plane());
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::size::{OriginRule, SizeTable, WidgetSize};
use crate::{CellPos, CellRect};

/// Default cap on subsets expanded by the group matcher.
pub const DEFAULT_GROUP_SEARCH_LIMIT: usize = 4096;

/// Score budget of the single-plane dashboard.
pub const SINGLE_PLANE_SCORE_BUDGET: u32 = 200;

/// Score budget of each dashboard in the multi-plane board.
pub const MULTI_PLANE_SCORE_BUDGET: u32 = 80;

/// Grid configuration shared by all operations on one grid type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridConfig {
    pub rows: u16,
    pub columns: u16,
    pub sizes: SizeTable,
    pub score_budget: u32,
    #[serde(default = "default_group_search_limit")]
    pub group_search_limit: usize,
}

fn default_group_search_limit() -> usize {
    DEFAULT_GROUP_SEARCH_LIMIT
}

impl GridConfig {
    /// 4×2 grid, budget 200, no origin rules.
    #[must_use]
    pub fn single_plane() -> Self {
        Self {
            rows: 4,
            columns: 2,
            sizes: SizeTable::single_plane(),
            score_budget: SINGLE_PLANE_SCORE_BUDGET,
            group_search_limit: DEFAULT_GROUP_SEARCH_LIMIT,
        }
    }

    /// 4×2 grid per dashboard, budget 80, slot rules per size.
    #[must_use]
    pub fn multi_plane() -> Self {
        Self {
            rows: 4,
            columns: 2,
            sizes: SizeTable::multi_plane(),
            score_budget: MULTI_PLANE_SCORE_BUDGET,
            group_search_limit: DEFAULT_GROUP_SEARCH_LIMIT,
        }
    }

    /// Set the grid dimensions.
    #[must_use]
    pub fn with_dims(mut self, rows: u16, columns: u16) -> Self {
        self.rows = rows;
        self.columns = columns;
        self
    }

    /// Set the score budget.
    #[must_use]
    pub fn with_score_budget(mut self, budget: u32) -> Self {
        self.score_budget = budget;
        self
    }

    /// Set the group matcher search cap.
    #[must_use]
    pub fn with_group_search_limit(mut self, limit: usize) -> Self {
        self.group_search_limit = limit;
        self
    }

    /// Rectangle covering the whole grid.
    #[must_use]
    pub const fn bounds(&self) -> CellRect {
        CellRect::grid(self.rows, self.columns)
    }

    /// Number of cells in the grid.
    #[must_use]
    pub const fn cell_count(&self) -> usize {
        self.rows as usize * self.columns as usize
    }

    /// Bounds and origin-rule check for `size` anchored at `origin`.
    pub fn check_origin(&self, size: WidgetSize, origin: CellPos) -> Result<CellRect, OriginError> {
        let spec = self.sizes.spec(size);
        let rect = spec.footprint.at(origin);
        if !self.bounds().contains_rect(&rect) {
            return Err(OriginError::OutOfBounds);
        }
        if !spec.origin.allows(origin) {
            return Err(OriginError::RuleViolated);
        }
        Ok(rect)
    }

    /// Validate dimensions, footprints, and origin rules.
    pub fn validate(&self) -> Result<(), GridConfigError> {
        if self.rows == 0 || self.columns == 0 {
            return Err(GridConfigError::EmptyGrid {
                rows: self.rows,
                columns: self.columns,
            });
        }
        if self.score_budget == 0 {
            return Err(GridConfigError::ZeroBudget);
        }
        if self.group_search_limit == 0 {
            return Err(GridConfigError::ZeroSearchLimit);
        }
        for (size, spec) in self.sizes.iter() {
            if spec.footprint.is_empty() {
                return Err(GridConfigError::EmptyFootprint { size });
            }
            if spec.footprint.width > self.columns || spec.footprint.height > self.rows {
                return Err(GridConfigError::FootprintExceedsGrid {
                    size,
                    width: spec.footprint.width,
                    height: spec.footprint.height,
                });
            }
            match &spec.origin {
                OriginRule::Any => {}
                OriginRule::Stride { rows, cols } => {
                    if *rows == 0 || *cols == 0 {
                        return Err(GridConfigError::ZeroStride { size });
                    }
                }
                OriginRule::Only { origins } => {
                    if origins.is_empty() {
                        return Err(GridConfigError::NoLegalOrigin { size });
                    }
                }
            }
            let reachable = (0..self.rows)
                .flat_map(|row| (0..self.columns).map(move |col| CellPos::new(row, col)))
                .any(|origin| self.check_origin(size, origin).is_ok());
            if !reachable {
                return Err(GridConfigError::NoLegalOrigin { size });
            }
        }
        Ok(())
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        Self::single_plane()
    }
}

/// Why an explicit origin is illegal for a size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OriginError {
    /// Footprint leaves the grid.
    OutOfBounds,
    /// Footprint fits but the size's origin rule forbids the cell.
    RuleViolated,
}

/// Configuration errors; these indicate a caller bug and are reported once
/// at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridConfigError {
    EmptyGrid {
        rows: u16,
        columns: u16,
    },
    ZeroBudget,
    ZeroSearchLimit,
    EmptyFootprint {
        size: WidgetSize,
    },
    FootprintExceedsGrid {
        size: WidgetSize,
        width: u16,
        height: u16,
    },
    ZeroStride {
        size: WidgetSize,
    },
    NoLegalOrigin {
        size: WidgetSize,
    },
}

impl fmt::Display for GridConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyGrid { rows, columns } => {
                write!(f, "grid must have at least one cell (got {rows}x{columns})")
            }
            Self::ZeroBudget => write!(f, "score budget must be positive"),
            Self::ZeroSearchLimit => write!(f, "group search limit must be positive"),
            Self::EmptyFootprint { size } => write!(f, "size {size} has an empty footprint"),
            Self::FootprintExceedsGrid {
                size,
                width,
                height,
            } => write!(
                f,
                "size {size} footprint {width}x{height} does not fit in the grid"
            ),
            Self::ZeroStride { size } => write!(f, "size {size} has a zero origin stride"),
            Self::NoLegalOrigin { size } => {
                write!(f, "size {size} has no legal origin in the grid")
            }
        }
    }
}

impl std::error::Error for GridConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_validate() {
        assert_eq!(GridConfig::single_plane().validate(), Ok(()));
        assert_eq!(GridConfig::multi_plane().validate(), Ok(()));
        assert_eq!(GridConfig::single_plane().score_budget, 200);
        assert_eq!(GridConfig::multi_plane().score_budget, 80);
    }

    #[test]
    fn empty_grid_is_rejected() {
        let config = GridConfig::single_plane().with_dims(0, 2);
        assert_eq!(
            config.validate(),
            Err(GridConfigError::EmptyGrid {
                rows: 0,
                columns: 2
            })
        );
    }

    #[test]
    fn oversized_footprint_is_rejected() {
        let config = GridConfig::single_plane().with_dims(2, 2);
        assert_eq!(
            config.validate(),
            Err(GridConfigError::FootprintExceedsGrid {
                size: WidgetSize::Big,
                width: 2,
                height: 4
            })
        );
    }

    #[test]
    fn unreachable_origin_rule_is_rejected() {
        let mut config = GridConfig::single_plane();
        config.sizes.medium.origin = OriginRule::Only {
            origins: vec![CellPos::new(3, 1)],
        };
        assert_eq!(
            config.validate(),
            Err(GridConfigError::NoLegalOrigin {
                size: WidgetSize::Medium
            })
        );
    }

    #[test]
    fn check_origin_distinguishes_bounds_and_rules() {
        let config = GridConfig::multi_plane();
        assert_eq!(
            config.check_origin(WidgetSize::Medium, CellPos::new(3, 0)),
            Err(OriginError::OutOfBounds)
        );
        assert_eq!(
            config.check_origin(WidgetSize::Medium, CellPos::new(1, 0)),
            Err(OriginError::RuleViolated)
        );
        assert_eq!(
            config.check_origin(WidgetSize::Medium, CellPos::new(2, 0)),
            Ok(CellRect::new(2, 0, 2, 2))
        );
    }

    #[test]
    fn search_limit_defaults_when_missing() {
        let mut value = serde_json::to_value(GridConfig::multi_plane()).unwrap();
        value.as_object_mut().unwrap().remove("groupSearchLimit");
        let config: GridConfig = serde_json::from_value(value).unwrap();
        assert_eq!(config.group_search_limit, DEFAULT_GROUP_SEARCH_LIMIT);
        assert_eq!(config, GridConfig::multi_plane());
    }
}
