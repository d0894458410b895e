//! Swap / displacement resolver.
//!
//! Moving a widget onto occupied cells is resolved by trying strategies in
//! a fixed order and taking the first one whose plan is fully legal:
//!
//! | situation | strategies, in order |
//! |---|---|
//! | target cells free | relocate |
//! | occupants' area equals the mover's | exact swap, displace |
//! | areas differ | group swap, exact swap, displace |
//!
//! Moves between two grids use [`resolve_transfer`]: free target cells take
//! the mover directly, a single occupant is sent back to the source grid near
//! the mover's old slot, and several occupants are repacked into the source
//! grid (overflowing into the target grid's remaining space).
//!
//! Resolvers only plan. They return the new positions and never touch the
//! widget lists, so a rejected plan cannot leave anything half-applied.

use crate::config::{GridConfig, OriginError};
use crate::group::{GroupMatcher, WidgetGroup, group_of};
use crate::occupancy::Occupancy;
use crate::outcome::{PackRejection, Strategy};
use crate::placement::{self, SearchScope};
use crate::score;
use crate::size::WidgetSize;
use crate::widget::{self, Widget};
use crate::{CellPos, CellRect, Footprint, WidgetId};

/// A same-grid plan: new positions for every widget that moves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub strategy: Strategy,
    pub moves: Vec<(WidgetId, CellPos)>,
}

impl Resolution {
    fn unchanged() -> Self {
        Self {
            strategy: Strategy::Unchanged,
            moves: Vec::new(),
        }
    }

    /// Ids of the widgets that move.
    #[must_use]
    pub fn touched(&self) -> Vec<WidgetId> {
        self.moves.iter().map(|(id, _)| *id).collect()
    }
}

/// Which grid of a cross-grid move a widget ends up in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridSide {
    Source,
    Target,
}

/// One widget's destination in a cross-grid plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferMove {
    pub id: WidgetId,
    pub side: GridSide,
    pub position: CellPos,
}

/// A cross-grid plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transfer {
    pub strategy: Strategy,
    /// Mover first, then displaced widgets.
    pub moves: Vec<TransferMove>,
}

impl Transfer {
    #[must_use]
    pub fn touched(&self) -> Vec<WidgetId> {
        self.moves.iter().map(|m| m.id).collect()
    }
}

/// Bounds and origin-rule check for an explicitly requested position.
pub fn check_target(
    config: &GridConfig,
    size: WidgetSize,
    target: CellPos,
) -> Result<CellRect, PackRejection> {
    config.check_origin(size, target).map_err(|err| match err {
        OriginError::OutOfBounds => PackRejection::OutOfBounds {
            row: target.row,
            col: target.col,
        },
        OriginError::RuleViolated => PackRejection::InvalidPosition {
            row: target.row,
            col: target.col,
        },
    })
}

/// Placed widgets (other than `exclude`) whose rectangles intersect `rect`,
/// ordered by position then id.
fn occupants<'w, P>(
    config: &GridConfig,
    widgets: &'w [Widget<P>],
    rect: CellRect,
    exclude: &[WidgetId],
) -> Vec<&'w Widget<P>> {
    let mut hits: Vec<&Widget<P>> = widgets
        .iter()
        .filter(|w| !exclude.contains(&w.id))
        .filter(|w| w.rect(config).is_some_and(|r| r.intersects(&rect)))
        .collect();
    hits.sort_by_key(|w| (w.position, w.id));
    hits
}

fn ids<P>(widgets: &[&Widget<P>]) -> Vec<WidgetId> {
    widgets.iter().map(|w| w.id).collect()
}

fn shift(pos: CellPos, d_row: i32, d_col: i32) -> Option<CellPos> {
    let row = u16::try_from(i32::from(pos.row) + d_row).ok()?;
    let col = u16::try_from(i32::from(pos.col) + d_col).ok()?;
    Some(CellPos::new(row, col))
}

/// Place `size` at `preferred` if legal in `grid`, else first-fit in `grid`.
fn place_preferring<P>(
    config: &GridConfig,
    widgets: &[Widget<P>],
    grid: &Occupancy,
    size: WidgetSize,
    preferred: impl IntoIterator<Item = CellPos>,
) -> Option<CellPos> {
    preferred
        .into_iter()
        .find(|&pos| placement::is_free_at(config, grid, size, pos))
        .or_else(|| {
            placement::find_free_position(
                SearchScope::new(config, widgets).with_occupancy(grid),
                size,
            )
        })
}

// =========================================================================
// Same-grid moves
// =========================================================================

/// Plan moving widget `id` so its top-left lands on `target`.
pub fn resolve_move<P>(
    config: &GridConfig,
    widgets: &[Widget<P>],
    id: WidgetId,
    target: CellPos,
) -> Result<Resolution, PackRejection> {
    let mover =
        widget::find(widgets, id).ok_or(PackRejection::UnknownWidget { widget: id })?;
    let target_rect = check_target(config, mover.size, target)?;
    if mover.position == Some(target) {
        return Ok(Resolution::unchanged());
    }

    let displaced = occupants(config, widgets, target_rect, &[id]);
    if displaced.is_empty() {
        return Ok(Resolution {
            strategy: Strategy::Relocate,
            moves: vec![(id, target)],
        });
    }
    let Some(from) = mover.position else {
        return Err(PackRejection::NoLegalPosition { widget: Some(id) });
    };

    let mover_area = mover.area(config);
    let displaced_area: u32 = displaced.iter().map(|w| w.area(config)).sum();

    if mover_area == displaced_area {
        if let Some(moves) = exact_swap(config, widgets, mover, from, target, &displaced) {
            return Ok(Resolution {
                strategy: Strategy::ExactSwap,
                moves,
            });
        }
        return displace(config, widgets, mover, target, &displaced)
            .map(|moves| Resolution {
                strategy: Strategy::Displace,
                moves,
            })
            .ok_or(PackRejection::NoLegalPosition { widget: Some(id) });
    }

    let group_miss = match group_swap(config, widgets, mover, &displaced) {
        Ok(moves) => {
            return Ok(Resolution {
                strategy: Strategy::GroupSwap,
                moves,
            });
        }
        Err(miss) => miss,
    };
    // A missed group is always followed by one direct exchange attempt.
    if let Some(moves) = exact_swap(config, widgets, mover, from, target, &displaced) {
        return Ok(Resolution {
            strategy: Strategy::ExactSwap,
            moves,
        });
    }
    if let Some(moves) = displace(config, widgets, mover, target, &displaced) {
        return Ok(Resolution {
            strategy: Strategy::Displace,
            moves,
        });
    }
    Err(match group_miss {
        GroupMiss::NotFound => PackRejection::GroupNotFound {
            widget: id,
            target_area: mover_area.max(displaced_area),
        },
        GroupMiss::Unplaceable => PackRejection::NoLegalPosition { widget: Some(id) },
    })
}

/// Plan exchanging `first` with the widget currently at `second`'s origin.
pub fn resolve_swap<P>(
    config: &GridConfig,
    widgets: &[Widget<P>],
    first: WidgetId,
    second: WidgetId,
) -> Result<Resolution, PackRejection> {
    if first == second {
        return Err(PackRejection::SameWidget { widget: first });
    }
    if widget::find(widgets, first).is_none() {
        return Err(PackRejection::UnknownWidget { widget: first });
    }
    let other =
        widget::find(widgets, second).ok_or(PackRejection::UnknownWidget { widget: second })?;
    let target = other.position.ok_or(PackRejection::NoLegalPosition {
        widget: Some(second),
    })?;
    resolve_move(config, widgets, first, target)
}

/// Mover takes `target`; every occupant shifts by the opposite vector.
fn exact_swap<P>(
    config: &GridConfig,
    widgets: &[Widget<P>],
    mover: &Widget<P>,
    from: CellPos,
    target: CellPos,
    displaced: &[&Widget<P>],
) -> Option<Vec<(WidgetId, CellPos)>> {
    let mut exclude = ids(displaced);
    exclude.push(mover.id);
    let mut grid = Occupancy::compute(widgets, config, &exclude);
    grid.fill(config.sizes.footprint(mover.size).at(target));

    let d_row = i32::from(from.row) - i32::from(target.row);
    let d_col = i32::from(from.col) - i32::from(target.col);
    let mut moves = vec![(mover.id, target)];
    for w in displaced {
        let new = shift(w.position?, d_row, d_col)?;
        let rect = config.check_origin(w.size, new).ok()?;
        if !grid.is_free(rect) {
            return None;
        }
        grid.fill(rect);
        moves.push((w.id, new));
    }
    Some(moves)
}

/// Mover takes `target`; occupants are re-placed first-fit, largest first.
fn displace<P>(
    config: &GridConfig,
    widgets: &[Widget<P>],
    mover: &Widget<P>,
    target: CellPos,
    displaced: &[&Widget<P>],
) -> Option<Vec<(WidgetId, CellPos)>> {
    let mut exclude = ids(displaced);
    exclude.push(mover.id);
    let mut grid = Occupancy::compute(widgets, config, &exclude);
    grid.fill(config.sizes.footprint(mover.size).at(target));

    let mut order: Vec<&&Widget<P>> = displaced.iter().collect();
    order.sort_by_key(|w| (std::cmp::Reverse(w.area(config)), w.position, w.id));

    let mut moves = vec![(mover.id, target)];
    for w in order {
        let pos = placement::find_free_position(
            SearchScope::new(config, widgets).with_occupancy(&grid),
            w.size,
        )?;
        grid.fill(config.sizes.footprint(w.size).at(pos));
        moves.push((w.id, pos));
    }
    Some(moves)
}

enum GroupMiss {
    /// No subset with the right area and shape exists.
    NotFound,
    /// Matching groups exist but none could be re-placed.
    Unplaceable,
}

/// Swap the larger side with an equal-area group grown from the smaller side.
///
/// The larger side is the mover when it outweighs its occupants, otherwise
/// the occupants. The group must contain the whole smaller side, tile its
/// bounding box, and have the larger side's shape. The larger side moves to
/// the group's origin; group members move into the vacated footprint at
/// their relative offsets, falling back to first-fit.
fn group_swap<P>(
    config: &GridConfig,
    widgets: &[Widget<P>],
    mover: &Widget<P>,
    displaced: &[&Widget<P>],
) -> Result<Vec<(WidgetId, CellPos)>, GroupMiss> {
    let mover_area = mover.area(config);
    let displaced_area: u32 = displaced.iter().map(|w| w.area(config)).sum();
    let (small_side, large_side) = if mover_area > displaced_area {
        (ids(displaced), vec![mover.id])
    } else {
        (vec![mover.id], ids(displaced))
    };

    let large = group_of(config, widgets, &large_side).ok_or(GroupMiss::NotFound)?;
    if !large.is_solid() {
        return Err(GroupMiss::NotFound);
    }
    let Some(&seed) = small_side.first() else {
        return Err(GroupMiss::NotFound);
    };

    let mut matcher = GroupMatcher::new(config, widgets, &large_side);
    let mut shape_matched = false;
    let mut planned = None;
    let found = matcher.find_by(seed, large.area, |group| {
        if !group.is_solid()
            || group.bounds.footprint() != large.bounds.footprint()
            || !small_side.iter().all(|id| group.contains(*id))
        {
            return false;
        }
        shape_matched = true;
        planned = exchange_groups(config, widgets, &large, group);
        planned.is_some()
    });

    let stats = matcher.stats();
    tracing::trace!(
        explored = stats.explored,
        truncated = stats.truncated,
        found = found.is_some(),
        "gridpack.group_search"
    );

    match planned {
        Some(moves) if found.is_some() => Ok(moves),
        _ if shape_matched => Err(GroupMiss::Unplaceable),
        _ => Err(GroupMiss::NotFound),
    }
}

/// Exchange two equally-shaped groups, keeping each one's arrangement.
fn exchange_groups<P>(
    config: &GridConfig,
    widgets: &[Widget<P>],
    large: &WidgetGroup,
    small: &WidgetGroup,
) -> Option<Vec<(WidgetId, CellPos)>> {
    let exclude: Vec<WidgetId> = large
        .members
        .iter()
        .chain(small.members.iter())
        .copied()
        .collect();
    let mut grid = Occupancy::compute(widgets, config, &exclude);
    let mut moves = Vec::with_capacity(exclude.len());

    for (id, offset) in &large.relative {
        let w = widget::find(widgets, *id)?;
        let pos = small.bounds.origin().translate(*offset)?;
        let rect = config.check_origin(w.size, pos).ok()?;
        if !grid.is_free(rect) {
            return None;
        }
        grid.fill(rect);
        moves.push((*id, pos));
    }

    for (id, offset) in &small.relative {
        let w = widget::find(widgets, *id)?;
        let preferred = large.bounds.origin().translate(*offset);
        let pos = place_preferring(config, widgets, &grid, w.size, preferred)?;
        grid.fill(config.sizes.footprint(w.size).at(pos));
        moves.push((*id, pos));
    }
    Some(moves)
}

// =========================================================================
// Cross-grid moves
// =========================================================================

/// Candidate origins for a widget of footprint `other` sent to the slot a
/// widget of footprint `mover` vacated at `from`: the slot itself, then the
/// slot aligned to its bottom edge, right edge, and bottom-right corner.
fn near_candidates(from: CellPos, mover: Footprint, other: Footprint) -> Vec<CellPos> {
    let d_row = i32::from(mover.height) - i32::from(other.height);
    let d_col = i32::from(mover.width) - i32::from(other.width);
    let mut out = Vec::with_capacity(4);
    for candidate in [
        Some(from),
        shift(from, d_row, 0),
        shift(from, 0, d_col),
        shift(from, d_row, d_col),
    ]
    .into_iter()
    .flatten()
    {
        if !out.contains(&candidate) {
            out.push(candidate);
        }
    }
    out
}

/// Plan moving `id` from the `source` grid to `target` in the `dest` grid.
///
/// Both grids share `config`. Budgets are checked on both sides once the
/// geometry is settled.
pub fn resolve_transfer<P>(
    config: &GridConfig,
    source: &[Widget<P>],
    dest: &[Widget<P>],
    id: WidgetId,
    target: CellPos,
) -> Result<Transfer, PackRejection> {
    let mover =
        widget::find(source, id).ok_or(PackRejection::UnknownWidget { widget: id })?;
    let target_rect = check_target(config, mover.size, target)?;
    let mover_fp = config.sizes.footprint(mover.size);

    let displaced = occupants(config, dest, target_rect, &[]);
    let displaced_ids = ids(&displaced);

    let mut dest_grid = Occupancy::compute(dest, config, &displaced_ids);
    dest_grid.fill(target_rect);
    let mut source_grid = Occupancy::compute(source, config, &[id]);

    let mut moves = vec![TransferMove {
        id,
        side: GridSide::Target,
        position: target,
    }];

    let strategy = match displaced.as_slice() {
        [] => Strategy::Transfer,
        [occupant] => {
            let other_fp = config.sizes.footprint(occupant.size);
            let preferred = mover
                .position
                .map(|from| near_candidates(from, mover_fp, other_fp))
                .unwrap_or_default();
            let pos = place_preferring(config, source, &source_grid, occupant.size, preferred)
                .ok_or(PackRejection::NoLegalPosition {
                    widget: Some(occupant.id),
                })?;
            moves.push(TransferMove {
                id: occupant.id,
                side: GridSide::Source,
                position: pos,
            });
            Strategy::TransferSwap
        }
        _ => {
            let group = group_of(config, dest, &displaced_ids).ok_or(
                PackRejection::NoLegalPosition {
                    widget: Some(displaced_ids[0]),
                },
            )?;
            let mut order: Vec<&(WidgetId, CellPos)> = group.relative.iter().collect();
            order.sort_by_key(|(member, offset)| {
                let area = widget::find(dest, *member).map_or(0, |w| w.area(config));
                (std::cmp::Reverse(area), *offset, *member)
            });
            for (member, offset) in order {
                let w = widget::find(dest, *member).ok_or(PackRejection::UnknownWidget {
                    widget: *member,
                })?;
                let preferred = mover.position.and_then(|from| from.translate(*offset));
                let fp = config.sizes.footprint(w.size);
                if let Some(pos) = place_preferring(config, source, &source_grid, w.size, preferred)
                {
                    source_grid.fill(fp.at(pos));
                    moves.push(TransferMove {
                        id: w.id,
                        side: GridSide::Source,
                        position: pos,
                    });
                } else if let Some(pos) = placement::find_free_position(
                    SearchScope::new(config, dest).with_occupancy(&dest_grid),
                    w.size,
                ) {
                    dest_grid.fill(fp.at(pos));
                    moves.push(TransferMove {
                        id: w.id,
                        side: GridSide::Target,
                        position: pos,
                    });
                } else {
                    return Err(PackRejection::NoLegalPosition {
                        widget: Some(w.id),
                    });
                }
            }
            Strategy::TransferGroup
        }
    };

    let to_source: u32 = moves
        .iter()
        .filter(|m| m.side == GridSide::Source)
        .filter_map(|m| widget::find(dest, m.id))
        .map(|w| w.weight(config))
        .sum();
    let source_total = score::total_weight(source, config, &[id]) + to_source;
    let dest_total = score::total_weight(dest, config, &[]) - to_source + mover.weight(config);
    for required in [dest_total, source_total] {
        if required > config.score_budget {
            return Err(PackRejection::CapacityExceeded {
                budget: config.score_budget,
                required,
            });
        }
    }

    Ok(Transfer { strategy, moves })
}
