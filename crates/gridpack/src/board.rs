//! Multi-plane board: an ordered list of dashboards sharing one config.
//!
//! Widget ids are allocated by the board and unique across dashboards. A
//! dashboard left empty by a mutation is garbage-collected on commit, and a
//! fresh empty dashboard is synthesized whenever none would remain.

use std::collections::BTreeSet;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::config::{GridConfig, GridConfigError};
use crate::invariant::{LayoutIssueCode, LayoutReport, check_layout};
use crate::outcome::{OperationKind, PackOperationError, PackOutcome, PackRejection, Strategy};
use crate::placement::{self, SearchScope};
use crate::plane::{self, GridRequest, guard_layout, placement_rejection};
use crate::resolve::{self, GridSide, Transfer};
use crate::score;
use crate::size::WidgetSize;
use crate::widget::{self, Widget, layout_hash};
use crate::{CellPos, DashboardId, WidgetId};

/// One grid of the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dashboard<P> {
    pub id: DashboardId,
    pub widgets: Vec<Widget<P>>,
}

impl<P> Dashboard<P> {
    #[must_use]
    pub fn empty(id: DashboardId) -> Self {
        Self {
            id,
            widgets: Vec::new(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.widgets.is_empty()
    }
}

/// A requested mutation of a board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoardRequest<P> {
    /// Place first-fit on the first dashboard with room, else on a new one.
    Add { size: WidgetSize, payload: P },
    /// Place on a specific dashboard, first-fit or at `position`.
    AddTo {
        dashboard: DashboardId,
        size: WidgetSize,
        payload: P,
        position: Option<CellPos>,
    },
    Remove { id: WidgetId },
    /// Move `id` onto `position` of `dashboard`, which may be another grid.
    Move {
        id: WidgetId,
        dashboard: DashboardId,
        position: CellPos,
    },
    /// Move `first` onto the current origin of `second`, on whichever grid
    /// `second` lives.
    Swap { first: WidgetId, second: WidgetId },
    Compact { dashboard: DashboardId },
    AddDashboard,
    /// Drop a dashboard together with its widgets.
    RemoveDashboard { dashboard: DashboardId },
}

impl<P> BoardRequest<P> {
    #[must_use]
    pub const fn kind(&self) -> OperationKind {
        match self {
            Self::Add { .. } | Self::AddTo { position: None, .. } => OperationKind::Add,
            Self::AddTo { .. } => OperationKind::AddAt,
            Self::Remove { .. } => OperationKind::Remove,
            Self::Move { .. } => OperationKind::Move,
            Self::Swap { .. } => OperationKind::Swap,
            Self::Compact { .. } => OperationKind::Compact,
            Self::AddDashboard => OperationKind::AddDashboard,
            Self::RemoveDashboard { .. } => OperationKind::RemoveDashboard,
        }
    }

    #[must_use]
    pub fn referenced_widgets(&self) -> Vec<WidgetId> {
        match self {
            Self::Remove { id } | Self::Move { id, .. } => vec![*id],
            Self::Swap { first, second } => vec![*first, *second],
            Self::Add { .. }
            | Self::AddTo { .. }
            | Self::Compact { .. }
            | Self::AddDashboard
            | Self::RemoveDashboard { .. } => Vec::new(),
        }
    }
}

/// What one board mutation did, before commit.
struct BoardApplied {
    strategy: Strategy,
    touched: Vec<WidgetId>,
    created: Option<WidgetId>,
    /// Dashboards that lost widgets and may need collecting.
    drained: Vec<DashboardId>,
}

impl BoardApplied {
    fn from_plane<P>(applied: &plane::Applied<P>) -> Self {
        Self {
            strategy: applied.strategy,
            touched: applied.touched.clone(),
            created: applied.created,
            drained: Vec::new(),
        }
    }
}

/// Dashboards plus the counters that keep ids unique.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board<P> {
    config: GridConfig,
    dashboards: Vec<Dashboard<P>>,
    next_widget_id: WidgetId,
    next_dashboard_id: DashboardId,
    next_operation_id: u64,
}

impl<P: Clone> Board<P> {
    /// Board with a single empty dashboard.
    pub fn new(config: GridConfig) -> Result<Self, GridConfigError> {
        config.validate()?;
        let first = DashboardId::MIN;
        Ok(Self {
            config,
            dashboards: vec![Dashboard::empty(first)],
            next_widget_id: WidgetId::MIN,
            next_dashboard_id: first.checked_next().unwrap_or(first),
            next_operation_id: 1,
        })
    }

    /// Reassemble a board from persisted parts. Callers validate first.
    pub(crate) fn from_parts(
        config: GridConfig,
        dashboards: Vec<Dashboard<P>>,
        next_widget_id: WidgetId,
        next_dashboard_id: DashboardId,
    ) -> Self {
        Self {
            config,
            dashboards,
            next_widget_id,
            next_dashboard_id,
            next_operation_id: 1,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &GridConfig {
        &self.config
    }

    #[must_use]
    pub fn dashboards(&self) -> &[Dashboard<P>] {
        &self.dashboards
    }

    #[must_use]
    pub fn dashboard(&self, id: DashboardId) -> Option<&Dashboard<P>> {
        self.dashboards.iter().find(|d| d.id == id)
    }

    #[must_use]
    pub const fn next_widget_id(&self) -> WidgetId {
        self.next_widget_id
    }

    #[must_use]
    pub const fn next_dashboard_id(&self) -> DashboardId {
        self.next_dashboard_id
    }

    /// Dashboard holding widget `id`.
    #[must_use]
    pub fn dashboard_of(&self, id: WidgetId) -> Option<DashboardId> {
        self.dashboards
            .iter()
            .find(|d| widget::find(&d.widgets, id).is_some())
            .map(|d| d.id)
    }

    #[must_use]
    pub fn widget(&self, id: WidgetId) -> Option<&Widget<P>> {
        self.dashboards
            .iter()
            .find_map(|d| widget::find(&d.widgets, id))
    }

    #[must_use]
    pub fn widget_count(&self) -> usize {
        self.dashboards.iter().map(|d| d.widgets.len()).sum()
    }

    /// Weight used on one dashboard.
    #[must_use]
    pub fn total_weight(&self, dashboard: DashboardId) -> Option<u32> {
        self.dashboard(dashboard)
            .map(|d| score::total_weight(&d.widgets, &self.config, &[]))
    }

    /// Invariant report per dashboard.
    #[must_use]
    pub fn reports(&self) -> Vec<(DashboardId, LayoutReport)> {
        self.dashboards
            .iter()
            .map(|d| (d.id, check_layout(&d.widgets, &self.config)))
            .collect()
    }

    /// Deterministic hash over dashboard order and every layout.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = rustc_hash::FxHasher::default();
        self.dashboards.len().hash(&mut hasher);
        for dashboard in &self.dashboards {
            dashboard.id.hash(&mut hasher);
            layout_hash(&dashboard.widgets).hash(&mut hasher);
        }
        hasher.finish()
    }

    /// Apply one request. On error the board is unchanged.
    pub fn apply(&mut self, request: BoardRequest<P>) -> Result<PackOutcome, PackOperationError> {
        let operation_id = self.next_operation_id;
        let kind = request.kind();
        let _span = tracing::debug_span!("gridpack.apply", operation_id, kind = kind.as_str())
            .entered();

        let before_hash = self.state_hash();
        let mut touched: BTreeSet<WidgetId> = request.referenced_widgets().into_iter().collect();
        let mut working = self.clone();

        let applied = match working.apply_inner(request) {
            Ok(applied) => applied,
            Err(reason) => {
                tracing::debug!(%reason, "gridpack.reject");
                return Err(PackOperationError {
                    operation_id,
                    kind,
                    touched: touched.into_iter().collect(),
                    state_hash: before_hash,
                    reason,
                });
            }
        };
        touched.extend(applied.touched.iter().copied());
        working.collect_garbage(&applied.drained);

        let after_hash = working.state_hash();
        working.next_operation_id = operation_id.saturating_add(1);
        *self = working;
        tracing::debug!(
            strategy = ?applied.strategy,
            dashboards = self.dashboards.len(),
            before_hash,
            after_hash,
            "gridpack.commit"
        );

        Ok(PackOutcome {
            operation_id,
            kind,
            strategy: applied.strategy,
            touched: touched.into_iter().collect(),
            created: applied.created,
            before_hash,
            after_hash,
        })
    }

    fn apply_inner(&mut self, request: BoardRequest<P>) -> Result<BoardApplied, PackRejection> {
        let applied = match request {
            BoardRequest::Add { size, payload } => self.add_anywhere(size, payload)?,
            BoardRequest::AddTo {
                dashboard,
                size,
                payload,
                position,
            } => {
                let fresh = self.allocate_widget_id()?;
                let request = match position {
                    Some(position) => GridRequest::AddAt {
                        size,
                        payload,
                        position,
                    },
                    None => GridRequest::Add { size, payload },
                };
                self.apply_on(dashboard, fresh, request)?
            }
            BoardRequest::Remove { id } => {
                let dashboard = self
                    .dashboard_of(id)
                    .ok_or(PackRejection::UnknownWidget { widget: id })?;
                let mut applied =
                    self.apply_on(dashboard, self.next_widget_id, GridRequest::Remove { id })?;
                applied.drained.push(dashboard);
                applied
            }
            BoardRequest::Move {
                id,
                dashboard,
                position,
            } => self.move_to(id, dashboard, position)?,
            BoardRequest::Swap { first, second } => {
                if first == second {
                    return Err(PackRejection::SameWidget { widget: first });
                }
                if self.dashboard_of(first).is_none() {
                    return Err(PackRejection::UnknownWidget { widget: first });
                }
                let dashboard = self
                    .dashboard_of(second)
                    .ok_or(PackRejection::UnknownWidget { widget: second })?;
                let position = self
                    .widget(second)
                    .and_then(|w| w.position)
                    .ok_or(PackRejection::NoLegalPosition {
                        widget: Some(second),
                    })?;
                self.move_to(first, dashboard, position)?
            }
            BoardRequest::Compact { dashboard } => {
                self.apply_on(dashboard, self.next_widget_id, GridRequest::Compact)?
            }
            BoardRequest::AddDashboard => {
                let id = self.allocate_dashboard_id()?;
                self.dashboards.push(Dashboard::empty(id));
                BoardApplied {
                    strategy: Strategy::Dashboards,
                    touched: Vec::new(),
                    created: None,
                    drained: Vec::new(),
                }
            }
            BoardRequest::RemoveDashboard { dashboard } => {
                let idx = self.index_of(dashboard)?;
                let removed = self.dashboards.remove(idx);
                if self.dashboards.is_empty() {
                    let id = self.allocate_dashboard_id()?;
                    self.dashboards.push(Dashboard::empty(id));
                }
                BoardApplied {
                    strategy: Strategy::Dashboards,
                    touched: removed.widgets.iter().map(|w| w.id).collect(),
                    created: None,
                    drained: Vec::new(),
                }
            }
        };
        self.guard()?;
        Ok(applied)
    }

    fn index_of(&self, dashboard: DashboardId) -> Result<usize, PackRejection> {
        self.dashboards
            .iter()
            .position(|d| d.id == dashboard)
            .ok_or(PackRejection::UnknownDashboard { dashboard })
    }

    /// Run a single-plane request against one dashboard.
    fn apply_on(
        &mut self,
        dashboard: DashboardId,
        fresh: WidgetId,
        request: GridRequest<P>,
    ) -> Result<BoardApplied, PackRejection> {
        let idx = self.index_of(dashboard)?;
        let target = &mut self.dashboards[idx];
        let applied = plane::apply_request(&self.config, &target.widgets, fresh, request)?;
        let summary = BoardApplied::from_plane(&applied);
        target.widgets = applied.widgets;
        Ok(summary)
    }

    fn add_anywhere(
        &mut self,
        size: WidgetSize,
        payload: P,
    ) -> Result<BoardApplied, PackRejection> {
        let fresh = self.allocate_widget_id()?;
        let config = &self.config;
        let slot = self.dashboards.iter().enumerate().find_map(|(idx, d)| {
            placement::find_position(SearchScope::new(config, &d.widgets), size)
                .map(|position| (idx, position))
        });

        let (idx, position) = match slot {
            Some(slot) => slot,
            None => {
                let empty: Vec<Widget<P>> = Vec::new();
                let position = placement::locate(SearchScope::new(config, &empty), size)
                    .map_err(|failure| placement_rejection(config, &empty, size, failure))?;
                let id = self.allocate_dashboard_id()?;
                self.dashboards.push(Dashboard::empty(id));
                tracing::debug!(dashboard = id.get(), "gridpack.dashboard_appended");
                (self.dashboards.len() - 1, position)
            }
        };
        self.dashboards[idx]
            .widgets
            .push(Widget::new(fresh, size, payload).at(position));
        Ok(BoardApplied {
            strategy: Strategy::FirstFit,
            touched: vec![fresh],
            created: Some(fresh),
            drained: Vec::new(),
        })
    }

    fn move_to(
        &mut self,
        id: WidgetId,
        dashboard: DashboardId,
        position: CellPos,
    ) -> Result<BoardApplied, PackRejection> {
        let source = self
            .dashboard_of(id)
            .ok_or(PackRejection::UnknownWidget { widget: id })?;
        if source == dashboard {
            return self.apply_on(
                dashboard,
                self.next_widget_id,
                GridRequest::Move { id, position },
            );
        }
        let src = self.index_of(source)?;
        let dst = self.index_of(dashboard)?;
        let transfer = resolve::resolve_transfer(
            &self.config,
            &self.dashboards[src].widgets,
            &self.dashboards[dst].widgets,
            id,
            position,
        )?;
        let strategy = transfer.strategy;
        let touched = transfer.touched();
        self.commit_transfer(src, dst, id, transfer)?;
        Ok(BoardApplied {
            strategy,
            touched,
            created: None,
            drained: vec![source],
        })
    }

    fn commit_transfer(
        &mut self,
        src: usize,
        dst: usize,
        mover: WidgetId,
        transfer: Transfer,
    ) -> Result<(), PackRejection> {
        let mut moving = take(&mut self.dashboards[src].widgets, mover)?;
        for step in &transfer.moves {
            match step.side {
                GridSide::Target if step.id == mover => moving.position = Some(step.position),
                GridSide::Target => {
                    let w = widget::find_mut(&mut self.dashboards[dst].widgets, step.id)
                        .ok_or(PackRejection::UnknownWidget { widget: step.id })?;
                    w.position = Some(step.position);
                }
                GridSide::Source => {
                    let mut w = take(&mut self.dashboards[dst].widgets, step.id)?;
                    w.position = Some(step.position);
                    self.dashboards[src].widgets.push(w);
                }
            }
        }
        self.dashboards[dst].widgets.push(moving);
        Ok(())
    }

    /// Every dashboard passes its invariant report and ids are board-unique.
    fn guard(&self) -> Result<(), PackRejection> {
        let mut seen = BTreeSet::new();
        for dashboard in &self.dashboards {
            guard_layout(&self.config, &dashboard.widgets)?;
            for w in &dashboard.widgets {
                if !seen.insert(w.id) {
                    tracing::warn!(widget = w.id.get(), "gridpack.duplicate_widget");
                    return Err(PackRejection::InvariantViolation {
                        code: LayoutIssueCode::DuplicateWidgetId,
                        message: format!("widget {} appears on two dashboards", w.id.get()),
                    });
                }
            }
        }
        Ok(())
    }

    /// Drop drained dashboards that ended up empty; keep at least one.
    fn collect_garbage(&mut self, drained: &[DashboardId]) {
        let before = self.dashboards.len();
        self.dashboards
            .retain(|d| !(d.is_empty() && drained.contains(&d.id)));
        if self.dashboards.len() != before {
            tracing::debug!(
                collected = before - self.dashboards.len(),
                "gridpack.dashboards_collected"
            );
        }
        if self.dashboards.is_empty() {
            let id = self.next_dashboard_id;
            self.next_dashboard_id = id.checked_next().unwrap_or(id);
            self.dashboards.push(Dashboard::empty(id));
        }
    }

    fn allocate_widget_id(&mut self) -> Result<WidgetId, PackRejection> {
        let current = self.next_widget_id;
        self.next_widget_id = self
            .next_widget_id
            .checked_next()
            .map_err(|_| PackRejection::IdOverflow)?;
        Ok(current)
    }

    fn allocate_dashboard_id(&mut self) -> Result<DashboardId, PackRejection> {
        let current = self.next_dashboard_id;
        self.next_dashboard_id = self
            .next_dashboard_id
            .checked_next()
            .map_err(|_| PackRejection::IdOverflow)?;
        Ok(current)
    }

    pub fn add(&mut self, size: WidgetSize, payload: P) -> Result<PackOutcome, PackOperationError> {
        self.apply(BoardRequest::Add { size, payload })
    }

    pub fn remove(&mut self, id: WidgetId) -> Result<PackOutcome, PackOperationError> {
        self.apply(BoardRequest::Remove { id })
    }

    pub fn move_widget(
        &mut self,
        id: WidgetId,
        dashboard: DashboardId,
        position: CellPos,
    ) -> Result<PackOutcome, PackOperationError> {
        self.apply(BoardRequest::Move {
            id,
            dashboard,
            position,
        })
    }

    pub fn swap(
        &mut self,
        first: WidgetId,
        second: WidgetId,
    ) -> Result<PackOutcome, PackOperationError> {
        self.apply(BoardRequest::Swap { first, second })
    }
}

fn take<P>(widgets: &mut Vec<Widget<P>>, id: WidgetId) -> Result<Widget<P>, PackRejection> {
    let idx = widgets
        .iter()
        .position(|w| w.id == id)
        .ok_or(PackRejection::UnknownWidget { widget: id })?;
    Ok(widgets.remove(idx))
}
