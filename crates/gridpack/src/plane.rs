//! Single-plane packer: pure request transitions and a transactional owner.
//!
//! [`apply_request`] is the whole engine for one grid: it takes a widget list
//! and a [`GridRequest`] and returns either the next list or a typed
//! rejection. [`GridPlane`] owns a list, allocates identifiers, runs the
//! invariant report on every planned state, and commits only clean ones.

use std::collections::BTreeSet;

use crate::config::{GridConfig, GridConfigError};
use crate::invariant::{LayoutReport, check_layout};
use crate::occupancy::Occupancy;
use crate::outcome::{OperationKind, PackOperationError, PackOutcome, PackRejection, Strategy};
use crate::placement::{self, PlacementFailure, SearchScope};
use crate::resolve::{self, Resolution};
use crate::score;
use crate::size::WidgetSize;
use crate::widget::{self, Widget, layout_hash};
use crate::{CellPos, WidgetId};

/// A requested mutation of one grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridRequest<P> {
    /// Allocate a widget and place it first-fit.
    Add { size: WidgetSize, payload: P },
    /// Allocate a widget at an explicit origin.
    AddAt {
        size: WidgetSize,
        payload: P,
        position: CellPos,
    },
    Remove { id: WidgetId },
    /// Move `id` so its top-left lands on `position`, resolving collisions.
    Move { id: WidgetId, position: CellPos },
    /// Move `first` onto the current origin of `second`.
    Swap { first: WidgetId, second: WidgetId },
    /// Re-place every widget first-fit in (position, id) order.
    Compact,
}

impl<P> GridRequest<P> {
    #[must_use]
    pub const fn kind(&self) -> OperationKind {
        match self {
            Self::Add { .. } => OperationKind::Add,
            Self::AddAt { .. } => OperationKind::AddAt,
            Self::Remove { .. } => OperationKind::Remove,
            Self::Move { .. } => OperationKind::Move,
            Self::Swap { .. } => OperationKind::Swap,
            Self::Compact => OperationKind::Compact,
        }
    }

    /// Widget ids named by the request.
    #[must_use]
    pub fn referenced_widgets(&self) -> Vec<WidgetId> {
        match self {
            Self::Remove { id } | Self::Move { id, .. } => vec![*id],
            Self::Swap { first, second } => vec![*first, *second],
            Self::Add { .. } | Self::AddAt { .. } | Self::Compact => Vec::new(),
        }
    }

    /// Whether applying the request allocates a widget id.
    #[must_use]
    pub const fn creates_widget(&self) -> bool {
        matches!(self, Self::Add { .. } | Self::AddAt { .. })
    }
}

/// Result of a successful pure transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Applied<P> {
    pub widgets: Vec<Widget<P>>,
    pub strategy: Strategy,
    /// Widgets created, removed, or moved.
    pub touched: Vec<WidgetId>,
    pub created: Option<WidgetId>,
}

/// Apply `request` to `widgets` without touching them.
///
/// `fresh_id` is the identifier a creating request assigns; callers own id
/// allocation. The returned list is not invariant-checked here.
pub fn apply_request<P: Clone>(
    config: &GridConfig,
    widgets: &[Widget<P>],
    fresh_id: WidgetId,
    request: GridRequest<P>,
) -> Result<Applied<P>, PackRejection> {
    match request {
        GridRequest::Add { size, payload } => {
            let position = placement::locate(SearchScope::new(config, widgets), size)
                .map_err(|failure| placement_rejection(config, widgets, size, failure))?;
            let widget = Widget::new(fresh_id, size, payload).at(position);
            Ok(insert(widgets, widget, Strategy::FirstFit))
        }
        GridRequest::AddAt {
            size,
            payload,
            position,
        } => {
            let rect = resolve::check_target(config, size, position)?;
            if !Occupancy::compute(widgets, config, &[]).is_free(rect) {
                return Err(PackRejection::NoLegalPosition { widget: None });
            }
            if !score::admits(widgets, config, size, &[]) {
                return Err(over_budget(config, widgets, size));
            }
            let widget = Widget::new(fresh_id, size, payload).at(position);
            Ok(insert(widgets, widget, Strategy::Explicit))
        }
        GridRequest::Remove { id } => {
            let idx = widgets
                .iter()
                .position(|w| w.id == id)
                .ok_or(PackRejection::UnknownWidget { widget: id })?;
            let mut next = widgets.to_vec();
            next.remove(idx);
            Ok(Applied {
                widgets: next,
                strategy: Strategy::Removed,
                touched: vec![id],
                created: None,
            })
        }
        GridRequest::Move { id, position } => {
            let resolution = resolve::resolve_move(config, widgets, id, position)?;
            Ok(commit_resolution(widgets, resolution))
        }
        GridRequest::Swap { first, second } => {
            let resolution = resolve::resolve_swap(config, widgets, first, second)?;
            Ok(commit_resolution(widgets, resolution))
        }
        GridRequest::Compact => compact(config, widgets),
    }
}

fn insert<P: Clone>(widgets: &[Widget<P>], widget: Widget<P>, strategy: Strategy) -> Applied<P> {
    let id = widget.id;
    let mut next = Vec::with_capacity(widgets.len() + 1);
    next.extend_from_slice(widgets);
    next.push(widget);
    Applied {
        widgets: next,
        strategy,
        touched: vec![id],
        created: Some(id),
    }
}

fn over_budget<P>(config: &GridConfig, widgets: &[Widget<P>], size: WidgetSize) -> PackRejection {
    PackRejection::CapacityExceeded {
        budget: config.score_budget,
        required: score::total_weight(widgets, config, &[])
            .saturating_add(config.sizes.weight(size)),
    }
}

pub(crate) fn placement_rejection<P>(
    config: &GridConfig,
    widgets: &[Widget<P>],
    size: WidgetSize,
    failure: PlacementFailure,
) -> PackRejection {
    match failure {
        PlacementFailure::NoSpace => PackRejection::NoLegalPosition { widget: None },
        PlacementFailure::OverBudget => over_budget(config, widgets, size),
    }
}

fn commit_resolution<P: Clone>(widgets: &[Widget<P>], resolution: Resolution) -> Applied<P> {
    let mut next = widgets.to_vec();
    for (id, position) in &resolution.moves {
        if let Some(w) = widget::find_mut(&mut next, *id) {
            w.position = Some(*position);
        }
    }
    Applied {
        widgets: next,
        strategy: resolution.strategy,
        touched: resolution.touched(),
        created: None,
    }
}

fn compact<P: Clone>(
    config: &GridConfig,
    widgets: &[Widget<P>],
) -> Result<Applied<P>, PackRejection> {
    let mut order: Vec<usize> = (0..widgets.len()).collect();
    order.sort_by_key(|&idx| {
        let w = &widgets[idx];
        (w.position.is_none(), w.position, w.id)
    });

    let mut grid = Occupancy::empty(config);
    let mut next = widgets.to_vec();
    let mut touched = Vec::new();
    for idx in order {
        let size = next[idx].size;
        let position = placement::find_free_position(
            SearchScope::new(config, widgets).with_occupancy(&grid),
            size,
        )
        .ok_or(PackRejection::NoLegalPosition {
            widget: Some(next[idx].id),
        })?;
        grid.fill(config.sizes.footprint(size).at(position));
        if next[idx].position != Some(position) {
            next[idx].position = Some(position);
            touched.push(next[idx].id);
        }
    }
    let strategy = if touched.is_empty() {
        Strategy::Unchanged
    } else {
        Strategy::Compacted
    };
    Ok(Applied {
        widgets: next,
        strategy,
        touched,
        created: None,
    })
}

/// First invariant violation in `widgets`, as a rejection.
pub(crate) fn guard_layout<P>(
    config: &GridConfig,
    widgets: &[Widget<P>],
) -> Result<(), PackRejection> {
    let report = check_layout(widgets, config);
    match report.issues.into_iter().next() {
        None => Ok(()),
        Some(issue) => {
            tracing::warn!(
                code = ?issue.code,
                message = %issue.message,
                "gridpack.invariant_violation"
            );
            Err(PackRejection::InvariantViolation {
                code: issue.code,
                message: issue.message,
            })
        }
    }
}

// =========================================================================
// GridPlane
// =========================================================================

/// One grid with its widgets, applying requests transactionally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridPlane<P> {
    config: GridConfig,
    widgets: Vec<Widget<P>>,
    next_id: WidgetId,
    next_operation_id: u64,
}

impl<P: Clone> GridPlane<P> {
    /// Empty plane.
    pub fn new(config: GridConfig) -> Result<Self, GridConfigError> {
        Self::from_widgets(config, Vec::new())
    }

    /// Adopt an existing widget list.
    ///
    /// The list is not checked; inspect [`report`](Self::report) and issue
    /// [`GridRequest::Compact`] to repair a host-supplied layout. New ids
    /// continue after the largest id present.
    pub fn from_widgets(
        config: GridConfig,
        widgets: Vec<Widget<P>>,
    ) -> Result<Self, GridConfigError> {
        config.validate()?;
        let next_id = widgets
            .iter()
            .map(|w| w.id)
            .max()
            .map_or(WidgetId::MIN, |max| max.checked_next().unwrap_or(max));
        Ok(Self {
            config,
            widgets,
            next_id,
            next_operation_id: 1,
        })
    }

    #[must_use]
    pub const fn config(&self) -> &GridConfig {
        &self.config
    }

    #[must_use]
    pub fn widgets(&self) -> &[Widget<P>] {
        &self.widgets
    }

    #[must_use]
    pub fn widget(&self, id: WidgetId) -> Option<&Widget<P>> {
        widget::find(&self.widgets, id)
    }

    #[must_use]
    pub fn into_widgets(self) -> Vec<Widget<P>> {
        self.widgets
    }

    /// Payload access; positions stay under the packer's control.
    pub fn payload_mut(&mut self, id: WidgetId) -> Option<&mut P> {
        widget::find_mut(&mut self.widgets, id).map(|w| &mut w.payload)
    }

    #[must_use]
    pub fn total_weight(&self) -> u32 {
        score::total_weight(&self.widgets, &self.config, &[])
    }

    #[must_use]
    pub fn remaining_budget(&self) -> u32 {
        score::remaining(&self.widgets, &self.config)
    }

    #[must_use]
    pub fn occupancy(&self) -> Occupancy {
        Occupancy::compute(&self.widgets, &self.config, &[])
    }

    #[must_use]
    pub fn report(&self) -> LayoutReport {
        check_layout(&self.widgets, &self.config)
    }

    #[must_use]
    pub fn state_hash(&self) -> u64 {
        layout_hash(&self.widgets)
    }

    /// Where an add of `size` would land, without adding it.
    pub fn preview(&self, size: WidgetSize) -> Result<CellPos, PackRejection> {
        placement::locate(SearchScope::new(&self.config, &self.widgets), size)
            .map_err(|failure| placement_rejection(&self.config, &self.widgets, size, failure))
    }

    /// Apply one request. On error the plane is unchanged.
    pub fn apply(&mut self, request: GridRequest<P>) -> Result<PackOutcome, PackOperationError> {
        let operation_id = self.next_operation_id;
        let kind = request.kind();
        let _span = tracing::debug_span!("gridpack.apply", operation_id, kind = kind.as_str())
            .entered();

        let before_hash = self.state_hash();
        let mut touched: BTreeSet<WidgetId> = request.referenced_widgets().into_iter().collect();
        let mut working = self.clone();

        let result = working.apply_inner(request);
        let applied = match result {
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
        working.widgets = applied.widgets;

        let after_hash = working.state_hash();
        working.next_operation_id = operation_id.saturating_add(1);
        *self = working;
        tracing::debug!(
            strategy = ?applied.strategy,
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

    fn apply_inner(&mut self, request: GridRequest<P>) -> Result<Applied<P>, PackRejection> {
        let fresh = if request.creates_widget() {
            self.allocate_widget_id()?
        } else {
            self.next_id
        };
        let applied = apply_request(&self.config, &self.widgets, fresh, request)?;
        guard_layout(&self.config, &applied.widgets)?;
        Ok(applied)
    }

    fn allocate_widget_id(&mut self) -> Result<WidgetId, PackRejection> {
        let current = self.next_id;
        self.next_id = self
            .next_id
            .checked_next()
            .map_err(|_| PackRejection::IdOverflow)?;
        Ok(current)
    }

    pub fn add(&mut self, size: WidgetSize, payload: P) -> Result<PackOutcome, PackOperationError> {
        self.apply(GridRequest::Add { size, payload })
    }

    pub fn add_at(
        &mut self,
        size: WidgetSize,
        payload: P,
        position: CellPos,
    ) -> Result<PackOutcome, PackOperationError> {
        self.apply(GridRequest::AddAt {
            size,
            payload,
            position,
        })
    }

    pub fn remove(&mut self, id: WidgetId) -> Result<PackOutcome, PackOperationError> {
        self.apply(GridRequest::Remove { id })
    }

    pub fn move_widget(
        &mut self,
        id: WidgetId,
        position: CellPos,
    ) -> Result<PackOutcome, PackOperationError> {
        self.apply(GridRequest::Move { id, position })
    }

    pub fn swap(
        &mut self,
        first: WidgetId,
        second: WidgetId,
    ) -> Result<PackOutcome, PackOperationError> {
        self.apply(GridRequest::Swap { first, second })
    }

    pub fn compact(&mut self) -> Result<PackOutcome, PackOperationError> {
        self.apply(GridRequest::Compact)
    }
}
