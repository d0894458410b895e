//! Versioned persistence schema for a [`Board`].
//!
//! The packer never persists anything itself; hosts serialize a
//! [`BoardSnapshot`] with any serde format and restore it through
//! [`Board::from_snapshot`], which validates the whole structure first.
//!
//! Schema history:
//! - v1: one flat widget list, each entry carrying an optional
//!   `dashboardId`.
//! - v2 (current): widgets grouped under their dashboards, with the id
//!   counters persisted alongside.
//!
//! ```
//! use gridpack::board::Board;
//! use gridpack::config::GridConfig;
//! use gridpack::size::WidgetSize;
//!
//! let mut board: Board<String> = Board::new(GridConfig::multi_plane()).unwrap();
//! board.add(WidgetSize::Medium, "revenue".to_owned()).unwrap();
//!
//! let json = serde_json::to_string(&board.snapshot()).unwrap();
//! let snapshot = serde_json::from_str(&json).unwrap();
//! let restored: Board<String> = Board::from_snapshot(snapshot).unwrap();
//! assert_eq!(restored.state_hash(), board.state_hash());
//! ```

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::board::{Board, Dashboard};
use crate::config::{GridConfig, GridConfigError};
use crate::invariant::check_layout;
use crate::widget::Widget;
use crate::{DashboardId, WidgetId};

/// Current board schema version.
pub const BOARD_SCHEMA_VERSION: u16 = 2;

// =========================================================================
// Schema types
// =========================================================================

/// Persisted board state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardSnapshot<P> {
    #[serde(default = "default_board_version")]
    pub schema_version: u16,
    pub config: GridConfig,
    #[serde(default)]
    pub dashboards: Vec<Dashboard<P>>,
    /// v1 flat widget list; empty in current snapshots.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub widgets: Vec<FlatWidget<P>>,
    /// Next widget id to allocate; derived from the widgets when absent.
    #[serde(default)]
    pub next_widget_id: Option<WidgetId>,
    #[serde(default)]
    pub next_dashboard_id: Option<DashboardId>,
}

fn default_board_version() -> u16 {
    BOARD_SCHEMA_VERSION
}

/// v1 widget entry: a widget tagged with its dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlatWidget<P> {
    #[serde(flatten)]
    pub widget: Widget<P>,
    #[serde(default)]
    pub dashboard_id: Option<DashboardId>,
}

impl<P> BoardSnapshot<P> {
    /// Validate version, configuration, and every layout.
    pub fn validate(&self) -> Result<(), SnapshotError> {
        if self.schema_version != BOARD_SCHEMA_VERSION {
            return Err(SnapshotError::UnsupportedVersion {
                found: self.schema_version,
                expected: BOARD_SCHEMA_VERSION,
            });
        }
        self.config.validate()?;
        if !self.widgets.is_empty() {
            return Err(SnapshotError::LegacyWidgets {
                count: self.widgets.len(),
            });
        }
        if self.dashboards.is_empty() {
            return Err(SnapshotError::NoDashboards);
        }

        let mut dashboard_ids = BTreeSet::new();
        let mut widget_ids = BTreeSet::new();
        for dashboard in &self.dashboards {
            if !dashboard_ids.insert(dashboard.id) {
                return Err(SnapshotError::DuplicateDashboard {
                    dashboard: dashboard.id,
                });
            }
            for widget in &dashboard.widgets {
                if !widget_ids.insert(widget.id) {
                    return Err(SnapshotError::DuplicateWidget { widget: widget.id });
                }
            }
            let report = check_layout(&dashboard.widgets, &self.config);
            if report.has_errors() {
                return Err(SnapshotError::LayoutInvalid {
                    dashboard: dashboard.id,
                    issue_count: report.issues.len(),
                    first_issue: report
                        .issues
                        .first()
                        .map(|issue| issue.message.clone())
                        .unwrap_or_default(),
                });
            }
        }

        if let (Some(next), Some(max)) = (self.next_widget_id, widget_ids.last()) {
            if next <= *max {
                return Err(SnapshotError::StaleWidgetCounter {
                    next: next.get(),
                    max_existing: max.get(),
                });
            }
        }
        if let (Some(next), Some(max)) = (self.next_dashboard_id, dashboard_ids.last()) {
            if next <= *max {
                return Err(SnapshotError::StaleDashboardCounter {
                    next: next.get(),
                    max_existing: max.get(),
                });
            }
        }
        Ok(())
    }

    fn max_widget_id(&self) -> Option<WidgetId> {
        self.dashboards
            .iter()
            .flat_map(|d| d.widgets.iter().map(|w| w.id))
            .max()
    }

    fn max_dashboard_id(&self) -> Option<DashboardId> {
        self.dashboards.iter().map(|d| d.id).max()
    }
}

impl<P: Clone> Board<P> {
    /// Capture the current state.
    #[must_use]
    pub fn snapshot(&self) -> BoardSnapshot<P> {
        BoardSnapshot {
            schema_version: BOARD_SCHEMA_VERSION,
            config: self.config().clone(),
            dashboards: self.dashboards().to_vec(),
            widgets: Vec::new(),
            next_widget_id: Some(self.next_widget_id()),
            next_dashboard_id: Some(self.next_dashboard_id()),
        }
    }

    /// Validate and restore a snapshot.
    pub fn from_snapshot(snapshot: BoardSnapshot<P>) -> Result<Self, SnapshotError> {
        snapshot.validate()?;
        let next_widget_id = match snapshot.next_widget_id {
            Some(next) => next,
            None => snapshot
                .max_widget_id()
                .map_or(Ok(WidgetId::MIN), WidgetId::checked_next)
                .map_err(|_| SnapshotError::CounterOverflow)?,
        };
        let next_dashboard_id = match snapshot.next_dashboard_id {
            Some(next) => next,
            None => snapshot
                .max_dashboard_id()
                .map_or(Ok(DashboardId::MIN), DashboardId::checked_next)
                .map_err(|_| SnapshotError::CounterOverflow)?,
        };
        Ok(Self::from_parts(
            snapshot.config,
            snapshot.dashboards,
            next_widget_id,
            next_dashboard_id,
        ))
    }
}

// =========================================================================
// Errors
// =========================================================================

/// Why a snapshot cannot be restored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotError {
    UnsupportedVersion { found: u16, expected: u16 },
    Config(GridConfigError),
    /// The flat v1 list is still populated; run [`migrate_board`] first.
    LegacyWidgets { count: usize },
    NoDashboards,
    DuplicateDashboard { dashboard: DashboardId },
    DuplicateWidget { widget: WidgetId },
    LayoutInvalid {
        dashboard: DashboardId,
        issue_count: usize,
        first_issue: String,
    },
    StaleWidgetCounter { next: u64, max_existing: u64 },
    StaleDashboardCounter { next: u64, max_existing: u64 },
    CounterOverflow,
}

impl fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedVersion { found, expected } => write!(
                f,
                "unsupported board schema version {found} (expected {expected})"
            ),
            Self::Config(err) => write!(f, "invalid grid config: {err}"),
            Self::LegacyWidgets { count } => write!(
                f,
                "snapshot still holds {count} flat widget(s); migrate it first"
            ),
            Self::NoDashboards => write!(f, "board must have at least one dashboard"),
            Self::DuplicateDashboard { dashboard } => {
                write!(f, "dashboard {} appears twice", dashboard.get())
            }
            Self::DuplicateWidget { widget } => {
                write!(f, "widget {} appears twice", widget.get())
            }
            Self::LayoutInvalid {
                dashboard,
                issue_count,
                first_issue,
            } => write!(
                f,
                "dashboard {} has {issue_count} invariant violation(s), first: {first_issue}",
                dashboard.get()
            ),
            Self::StaleWidgetCounter { next, max_existing } => write!(
                f,
                "next widget id {next} must be greater than max existing id {max_existing}"
            ),
            Self::StaleDashboardCounter { next, max_existing } => write!(
                f,
                "next dashboard id {next} must be greater than max existing id {max_existing}"
            ),
            Self::CounterOverflow => write!(f, "identifier counter overflow"),
        }
    }
}

impl std::error::Error for SnapshotError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            _ => None,
        }
    }
}

impl From<GridConfigError> for SnapshotError {
    fn from(err: GridConfigError) -> Self {
        Self::Config(err)
    }
}

// =========================================================================
// Migration
// =========================================================================

/// Result of migrating a snapshot to the current schema.
#[derive(Debug, Clone)]
pub struct MigrationResult<P> {
    pub snapshot: BoardSnapshot<P>,
    pub from_version: u16,
    pub to_version: u16,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotMigrationError {
    /// Newer than this library understands.
    UnsupportedVersion { version: u16 },
    NoMigrationPath { from: u16, to: u16 },
}

impl fmt::Display for SnapshotMigrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedVersion { version } => {
                write!(f, "unsupported schema version {version} for migration")
            }
            Self::NoMigrationPath { from, to } => {
                write!(f, "no migration path from v{from} to v{to}")
            }
        }
    }
}

impl std::error::Error for SnapshotMigrationError {}

/// Bring a snapshot up to [`BOARD_SCHEMA_VERSION`].
pub fn migrate_board<P>(
    snapshot: BoardSnapshot<P>,
) -> Result<MigrationResult<P>, SnapshotMigrationError> {
    match snapshot.schema_version {
        BOARD_SCHEMA_VERSION => Ok(MigrationResult {
            from_version: BOARD_SCHEMA_VERSION,
            to_version: BOARD_SCHEMA_VERSION,
            warnings: Vec::new(),
            snapshot,
        }),
        1 => Ok(migrate_v1(snapshot)),
        v if v > BOARD_SCHEMA_VERSION => {
            Err(SnapshotMigrationError::UnsupportedVersion { version: v })
        }
        v => Err(SnapshotMigrationError::NoMigrationPath {
            from: v,
            to: BOARD_SCHEMA_VERSION,
        }),
    }
}

/// Group the flat v1 list by dashboard, in order of first appearance.
fn migrate_v1<P>(mut snapshot: BoardSnapshot<P>) -> MigrationResult<P> {
    let mut warnings = Vec::new();
    let mut dashboards = std::mem::take(&mut snapshot.dashboards);
    let mut orphans = 0usize;

    for FlatWidget {
        widget,
        dashboard_id,
    } in std::mem::take(&mut snapshot.widgets)
    {
        let id = dashboard_id.unwrap_or_else(|| {
            orphans += 1;
            DashboardId::MIN
        });
        match dashboards.iter_mut().find(|d| d.id == id) {
            Some(dashboard) => dashboard.widgets.push(widget),
            None => dashboards.push(Dashboard {
                id,
                widgets: vec![widget],
            }),
        }
    }
    if orphans > 0 {
        warnings.push(format!(
            "assigned {orphans} widget(s) without a dashboard to {}",
            DashboardId::MIN
        ));
    }
    if dashboards.is_empty() {
        dashboards.push(Dashboard::empty(DashboardId::MIN));
        warnings.push("synthesized an empty dashboard".to_owned());
    }

    snapshot.dashboards = dashboards;
    snapshot.schema_version = BOARD_SCHEMA_VERSION;
    MigrationResult {
        snapshot,
        from_version: 1,
        to_version: BOARD_SCHEMA_VERSION,
        warnings,
    }
}

/// Whether a snapshot must go through [`migrate_board`] before restoring.
#[must_use]
pub fn needs_migration<P>(snapshot: &BoardSnapshot<P>) -> bool {
    snapshot.schema_version != BOARD_SCHEMA_VERSION
}
