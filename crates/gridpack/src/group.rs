//! Group matcher: find a widget subset whose combined area hits a target.
//!
//! The search starts from a seed widget and grows subsets one widget at a
//! time, always expanding the cheapest (smallest-area) partial subset next.
//! Subsets whose area already exceeds the target are pruned, and every
//! subset is visited at most once via its sorted-id signature. Widgets are
//! never split or resized to force a match.
//!
//! The search is exponential in the worst case. The score budget keeps
//! grids small in practice, and [`GridConfig::group_search_limit`] caps the
//! number of expanded subsets for pathological inputs. A subset already on
//! the frontier is still checked for a match once the cap is hit.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use rustc_hash::FxHashSet;

use crate::config::GridConfig;
use crate::widget::Widget;
use crate::{CellPos, CellRect, WidgetId};

/// A matched subset of widgets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetGroup {
    /// Member ids, ascending.
    pub members: Vec<WidgetId>,
    /// Bounding box of the members' current rectangles.
    pub bounds: CellRect,
    /// Each member's offset from `bounds`' top-left, in `members` order.
    pub relative: Vec<(WidgetId, CellPos)>,
    /// Combined footprint area.
    pub area: u32,
}

impl WidgetGroup {
    /// Whether the members tile their bounding box with no gaps.
    #[must_use]
    pub fn is_solid(&self) -> bool {
        self.bounds.area() == self.area
    }

    #[must_use]
    pub fn contains(&self, id: WidgetId) -> bool {
        self.members.binary_search(&id).is_ok()
    }

    /// Member offset relative to the bounding box.
    #[must_use]
    pub fn offset_of(&self, id: WidgetId) -> Option<CellPos> {
        self.relative
            .iter()
            .find(|(member, _)| *member == id)
            .map(|(_, offset)| *offset)
    }
}

/// Counters from the last search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GroupSearchStats {
    /// Subsets expanded into larger candidates.
    pub explored: usize,
    /// Whether the search stopped at the configured limit.
    pub truncated: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct Frontier {
    area: Reverse<u32>,
    signature: Reverse<Vec<WidgetId>>,
}

/// Subset search over the placed widgets of one grid.
#[derive(Debug)]
pub struct GroupMatcher<'a> {
    config: &'a GridConfig,
    pool: Vec<(WidgetId, CellRect)>,
    stats: GroupSearchStats,
}

impl<'a> GroupMatcher<'a> {
    /// Matcher over all placed widgets except those in `exclude`.
    #[must_use]
    pub fn new<P>(config: &'a GridConfig, widgets: &[Widget<P>], exclude: &[WidgetId]) -> Self {
        let mut pool: Vec<(WidgetId, CellRect)> = widgets
            .iter()
            .filter(|w| !exclude.contains(&w.id))
            .filter_map(|w| w.rect(config).map(|rect| (w.id, rect)))
            .collect();
        pool.sort_by_key(|(id, _)| *id);
        Self {
            config,
            pool,
            stats: GroupSearchStats::default(),
        }
    }

    #[must_use]
    pub const fn stats(&self) -> GroupSearchStats {
        self.stats
    }

    /// First group containing `seed` whose area equals `target_area`.
    pub fn find(&mut self, seed: WidgetId, target_area: u32) -> Option<WidgetGroup> {
        self.find_by(seed, target_area, |_| true)
    }

    /// Like [`find`](Self::find), but keeps searching past matches that
    /// `accept` rejects.
    pub fn find_by(
        &mut self,
        seed: WidgetId,
        target_area: u32,
        mut accept: impl FnMut(&WidgetGroup) -> bool,
    ) -> Option<WidgetGroup> {
        self.stats = GroupSearchStats::default();
        let seed_rect = self.rect_of(seed)?;
        if seed_rect.area() > target_area {
            return None;
        }

        let mut visited: FxHashSet<Vec<WidgetId>> = FxHashSet::default();
        let mut frontier = BinaryHeap::new();
        visited.insert(vec![seed]);
        frontier.push(Frontier {
            area: Reverse(seed_rect.area()),
            signature: Reverse(vec![seed]),
        });

        while let Some(Frontier {
            area: Reverse(area),
            signature: Reverse(members),
        }) = frontier.pop()
        {
            if area == target_area {
                let group = self.build_group(members, area);
                if accept(&group) {
                    return Some(group);
                }
                continue;
            }

            if self.stats.explored >= self.config.group_search_limit {
                self.stats.truncated = true;
                return None;
            }
            self.stats.explored += 1;

            for &(candidate, rect) in &self.pool {
                if members.binary_search(&candidate).is_ok() {
                    continue;
                }
                let grown = area + rect.area();
                if grown > target_area {
                    continue;
                }
                let mut signature = members.clone();
                let at = signature.binary_search(&candidate).unwrap_or_else(|i| i);
                signature.insert(at, candidate);
                if visited.insert(signature.clone()) {
                    frontier.push(Frontier {
                        area: Reverse(grown),
                        signature: Reverse(signature),
                    });
                }
            }
        }
        None
    }

    fn rect_of(&self, id: WidgetId) -> Option<CellRect> {
        self.pool
            .binary_search_by_key(&id, |(member, _)| *member)
            .ok()
            .map(|idx| self.pool[idx].1)
    }

    fn build_group(&self, members: Vec<WidgetId>, area: u32) -> WidgetGroup {
        let rects: Vec<(WidgetId, CellRect)> = members
            .iter()
            .filter_map(|&id| self.rect_of(id).map(|rect| (id, rect)))
            .collect();
        let bounds = rects
            .iter()
            .map(|(_, rect)| *rect)
            .reduce(|acc, rect| acc.union(&rect))
            .unwrap_or_default();
        let relative = rects
            .iter()
            .map(|(id, rect)| {
                let offset = rect.origin().offset_from(bounds.origin()).unwrap_or_default();
                (*id, offset)
            })
            .collect();
        WidgetGroup {
            members,
            bounds,
            relative,
            area,
        }
    }
}

/// Describe an explicit member set as a group.
///
/// Returns `None` if `members` is empty or names a missing or unplaced widget.
#[must_use]
pub fn group_of<P>(
    config: &GridConfig,
    widgets: &[Widget<P>],
    members: &[WidgetId],
) -> Option<WidgetGroup> {
    let matcher = GroupMatcher::new(config, widgets, &[]);
    let mut sorted = members.to_vec();
    sorted.sort_unstable();
    sorted.dedup();
    if sorted.is_empty() {
        return None;
    }
    let mut area = 0u32;
    for &id in &sorted {
        area += matcher.rect_of(id)?.area();
    }
    Some(matcher.build_group(sorted, area))
}

/// One-shot search: group containing `seed` with exactly `target_area` cells.
pub fn find_matching_group<P>(
    config: &GridConfig,
    widgets: &[Widget<P>],
    seed: WidgetId,
    target_area: u32,
    exclude: &[WidgetId],
) -> Option<WidgetGroup> {
    GroupMatcher::new(config, widgets, exclude).find(seed, target_area)
}
