#![forbid(unsafe_code)]

//! Widget grid packer for fixed-size dashboards.
//!
//! A dashboard is a `rows × columns` grid of cells. Widgets come in a small
//! set of sizes, each with a rectangular footprint and a weight; a grid holds
//! widgets only while no two overlap, all stay inside the grid on legal
//! origins, and their summed weight stays within the configured budget.
//!
//! # Layers
//! - [`occupancy`], [`placement`], [`score`]: the grid model, first-fit
//!   search, and budget checks.
//! - [`group`], [`resolve`]: equal-area subset search and the move/swap
//!   resolver, within one grid or across two.
//! - [`plane`], [`board`]: transactional owners for one grid or a list of
//!   dashboards. Every request either commits a state that passes
//!   [`invariant::check_layout`] or leaves the owner untouched and returns a
//!   typed [`PackRejection`].
//! - [`snapshot`]: versioned serde schema for persisting a board.
//!
//! ```
//! use gridpack::{CellPos, GridConfig, GridPlane, PackRejection, WidgetSize};
//!
//! let mut plane: GridPlane<&str> = GridPlane::new(GridConfig::single_plane()).unwrap();
//! let big = plane.add(WidgetSize::Big, "map").unwrap();
//! assert_eq!(plane.widget(big.created.unwrap()).unwrap().position, Some(CellPos::ORIGIN));
//!
//! let err = plane.add(WidgetSize::VerySmall, "clock").unwrap_err();
//! assert_eq!(err.reason, PackRejection::NoLegalPosition { widget: None });
//! ```

pub mod board;
pub mod config;
pub mod group;
pub mod invariant;
pub mod occupancy;
pub mod outcome;
pub mod placement;
pub mod plane;
pub mod resolve;
pub mod score;
pub mod size;
pub mod snapshot;
pub mod widget;

pub use gridpack_core::{CellPos, CellRect, DashboardId, Footprint, IdError, WidgetId};

pub use board::{Board, BoardRequest, Dashboard};
pub use config::{GridConfig, GridConfigError};
pub use group::{GroupMatcher, WidgetGroup, find_matching_group};
pub use invariant::{LayoutIssue, LayoutIssueCode, LayoutReport, check_layout};
pub use occupancy::Occupancy;
pub use outcome::{OperationKind, PackOperationError, PackOutcome, PackRejection, Strategy};
pub use plane::{GridPlane, GridRequest, apply_request};
pub use size::{OriginRule, SizeSpec, SizeTable, WidgetSize};
pub use snapshot::{BOARD_SCHEMA_VERSION, BoardSnapshot, SnapshotError};
pub use widget::Widget;
