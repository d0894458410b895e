//! Operation outcomes and typed rejections.
//!
//! Every expected failure is a value: callers get a [`PackRejection`]
//! wrapped in a [`PackOperationError`] with enough context to log or show
//! to the user, and the widget list they passed in is left untouched.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::invariant::LayoutIssueCode;
use crate::{DashboardId, WidgetId};

/// Stable operation discriminator used in logs and outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Add,
    AddAt,
    Remove,
    Move,
    Swap,
    Compact,
    AddDashboard,
    RemoveDashboard,
}

impl OperationKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::AddAt => "add_at",
            Self::Remove => "remove",
            Self::Move => "move",
            Self::Swap => "swap",
            Self::Compact => "compact",
            Self::AddDashboard => "add_dashboard",
            Self::RemoveDashboard => "remove_dashboard",
        }
    }
}

/// How a successful operation arrived at its new layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// The request was a no-op (for example, moving onto its own position).
    Unchanged,
    /// First-fit placement of a new widget.
    FirstFit,
    /// Explicit placement of a new widget.
    Explicit,
    /// Widget removed.
    Removed,
    /// Target cells were free.
    Relocate,
    /// Mover and occupants exchanged positions one-for-one.
    ExactSwap,
    /// An equal-area group was found and swapped with the other side.
    GroupSwap,
    /// Occupants were re-placed first-fit around the mover.
    Displace,
    /// Cross-grid move into free cells.
    Transfer,
    /// Cross-grid one-for-one exchange with a single occupant.
    TransferSwap,
    /// Cross-grid move displacing several occupants.
    TransferGroup,
    /// Every widget re-placed first-fit.
    Compacted,
    /// Dashboard list changed.
    Dashboards,
}

/// Structured reasons a request was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackRejection {
    /// The mutation would push a grid's total weight over its budget.
    CapacityExceeded { budget: u32, required: u32 },
    /// No candidate position satisfied every constraint.
    NoLegalPosition { widget: Option<WidgetId> },
    /// No equal-area group existed and no fallback swap validated.
    GroupNotFound { widget: WidgetId, target_area: u32 },
    /// An explicit position does not fit the grid.
    OutOfBounds { row: u16, col: u16 },
    /// An explicit position breaks the size's origin rule.
    InvalidPosition { row: u16, col: u16 },
    UnknownWidget { widget: WidgetId },
    UnknownDashboard { dashboard: DashboardId },
    /// Two distinct widgets were required.
    SameWidget { widget: WidgetId },
    /// Identifier space exhausted.
    IdOverflow,
    /// The planned layout failed the post-operation invariant check.
    InvariantViolation {
        code: LayoutIssueCode,
        message: String,
    },
}

impl fmt::Display for PackRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CapacityExceeded { budget, required } => write!(
                f,
                "capacity exceeded: needs {required} of a {budget} point budget"
            ),
            Self::NoLegalPosition { widget: Some(id) } => {
                write!(f, "no space to place widget {}", id.get())
            }
            Self::NoLegalPosition { widget: None } => write!(f, "no space to place widget"),
            Self::GroupNotFound {
                widget,
                target_area,
            } => write!(
                f,
                "cannot swap widget {}: no group of area {target_area} fits",
                widget.get()
            ),
            Self::OutOfBounds { row, col } => {
                write!(f, "position ({row}, {col}) is outside the grid")
            }
            Self::InvalidPosition { row, col } => {
                write!(f, "position ({row}, {col}) is not allowed for this size")
            }
            Self::UnknownWidget { widget } => write!(f, "widget {} not found", widget.get()),
            Self::UnknownDashboard { dashboard } => {
                write!(f, "dashboard {} not found", dashboard.get())
            }
            Self::SameWidget { widget } => write!(
                f,
                "operation requires distinct widgets, got {} twice",
                widget.get()
            ),
            Self::IdOverflow => write!(f, "identifier space exhausted"),
            Self::InvariantViolation { code, message } => {
                write!(f, "layout invariant violated ({code:?}): {message}")
            }
        }
    }
}

impl std::error::Error for PackRejection {}

/// Successful operation result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackOutcome {
    pub operation_id: u64,
    pub kind: OperationKind,
    pub strategy: Strategy,
    /// Widgets whose position, grid, or existence changed.
    pub touched: Vec<WidgetId>,
    /// Widget created by an add, if any.
    pub created: Option<WidgetId>,
    pub before_hash: u64,
    pub after_hash: u64,
}

/// Failure payload for transactional operation APIs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackOperationError {
    pub operation_id: u64,
    pub kind: OperationKind,
    pub touched: Vec<WidgetId>,
    /// Hash of the untouched state.
    pub state_hash: u64,
    pub reason: PackRejection,
}

impl fmt::Display for PackOperationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "pack op {} ({}) rejected: {} [widgets={:?}, state_hash={:#x}]",
            self.operation_id,
            self.kind.as_str(),
            self.reason,
            self.touched.iter().map(|id| id.get()).collect::<Vec<_>>(),
            self.state_hash
        )
    }
}

impl std::error::Error for PackOperationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.reason)
    }
}
