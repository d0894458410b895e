//! Placement search: first-fit origin lookup.
//!
//! Candidates are visited in row-major order (top-to-bottom, then
//! left-to-right) and the first legal one wins. The order is part of the
//! contract: identical inputs always yield the identical position.

use std::borrow::Cow;

use crate::config::GridConfig;
use crate::occupancy::Occupancy;
use crate::score;
use crate::size::WidgetSize;
use crate::widget::Widget;
use crate::{CellPos, WidgetId};

/// Inputs shared by one placement search.
///
/// `exclude` lists widgets to treat as absent (for example the widget being
/// repositioned). `occupancy`, when given, replaces the matrix that would
/// otherwise be derived from `widgets`; relocation planners pass their
/// partially-updated matrix here.
#[derive(Debug)]
pub struct SearchScope<'a, P> {
    pub config: &'a GridConfig,
    pub widgets: &'a [Widget<P>],
    pub exclude: &'a [WidgetId],
    pub occupancy: Option<&'a Occupancy>,
}

// Manual impls: a derive would demand `P: Copy`.
impl<P> Clone for SearchScope<'_, P> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<P> Copy for SearchScope<'_, P> {}

impl<'a, P> SearchScope<'a, P> {
    #[must_use]
    pub fn new(config: &'a GridConfig, widgets: &'a [Widget<P>]) -> Self {
        Self {
            config,
            widgets,
            exclude: &[],
            occupancy: None,
        }
    }

    #[must_use]
    pub fn excluding(mut self, exclude: &'a [WidgetId]) -> Self {
        self.exclude = exclude;
        self
    }

    #[must_use]
    pub fn with_occupancy(mut self, occupancy: &'a Occupancy) -> Self {
        self.occupancy = Some(occupancy);
        self
    }

    fn grid(&self) -> Cow<'a, Occupancy> {
        match self.occupancy {
            Some(grid) => Cow::Borrowed(grid),
            None => Cow::Owned(Occupancy::compute(self.widgets, self.config, self.exclude)),
        }
    }
}

/// Origins where `size` fits the grid bounds and its origin rule, row-major.
pub fn candidate_origins(
    config: &GridConfig,
    size: WidgetSize,
) -> impl Iterator<Item = CellPos> + '_ {
    (0..config.rows)
        .flat_map(move |row| (0..config.columns).map(move |col| CellPos::new(row, col)))
        .filter(move |&origin| config.check_origin(size, origin).is_ok())
}

/// Whether `origin` is geometrically legal for `size`: in bounds, allowed by
/// the origin rule, and every covered cell free.
#[must_use]
pub fn is_free_at(
    config: &GridConfig,
    grid: &Occupancy,
    size: WidgetSize,
    origin: CellPos,
) -> bool {
    config
        .check_origin(size, origin)
        .is_ok_and(|rect| grid.is_free(rect))
}

/// First free origin for `size`, ignoring the score budget.
#[must_use]
pub fn find_free_position<P>(scope: SearchScope<'_, P>, size: WidgetSize) -> Option<CellPos> {
    let grid = scope.grid();
    candidate_origins(scope.config, size)
        .find(|&origin| is_free_at(scope.config, &grid, size, origin))
}

/// First legal origin for `size`, including the score budget.
///
/// Returns `None` when no origin is free or when one more widget of `size`
/// would push the non-excluded total over budget.
#[must_use]
pub fn find_position<P>(scope: SearchScope<'_, P>, size: WidgetSize) -> Option<CellPos> {
    if !score::admits(scope.widgets, scope.config, size, scope.exclude) {
        return None;
    }
    find_free_position(scope, size)
}

/// Why [`find_position`] came back empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementFailure {
    /// No free origin exists, regardless of budget.
    NoSpace,
    /// A free origin exists but the budget does not admit the widget.
    OverBudget,
}

/// Run the search and classify a miss.
///
/// Occupancy is checked first: a full grid reports [`PlacementFailure::NoSpace`]
/// even when the budget would also be exceeded.
pub fn locate<P>(scope: SearchScope<'_, P>, size: WidgetSize) -> Result<CellPos, PlacementFailure> {
    let origin = find_free_position(scope, size).ok_or(PlacementFailure::NoSpace)?;
    if !score::admits(scope.widgets, scope.config, size, scope.exclude) {
        return Err(PlacementFailure::OverBudget);
    }
    Ok(origin)
}
