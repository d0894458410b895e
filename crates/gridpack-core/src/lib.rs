#![forbid(unsafe_code)]

//! Core: cell geometry and identifiers shared by the gridpack crates.
//!
//! # Role in gridpack
//! `gridpack-core` is the vocabulary layer. It owns the cell-space rectangle
//! math and the non-zero identifiers that the packer (`gridpack`) uses to
//! describe widgets and the dashboards that hold them. It has no notion of
//! sizes, budgets, or placement rules.

pub mod geometry;
pub mod id;

pub use geometry::{CellPos, CellRect, Footprint};
pub use id::{DashboardId, IdError, WidgetId};
