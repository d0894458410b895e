//! Widget descriptors exchanged with the host application.

use serde::{Deserialize, Serialize};

use crate::config::GridConfig;
use crate::size::WidgetSize;
use crate::{CellPos, CellRect, WidgetId};

/// One widget on a grid.
///
/// `payload` is owned by the caller and never inspected by the packer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Widget<P> {
    pub id: WidgetId,
    pub size: WidgetSize,
    /// Top-left cell; `None` until placed.
    #[serde(default)]
    pub position: Option<CellPos>,
    pub payload: P,
}

impl<P> Widget<P> {
    /// An unplaced widget.
    #[must_use]
    pub fn new(id: WidgetId, size: WidgetSize, payload: P) -> Self {
        Self {
            id,
            size,
            position: None,
            payload,
        }
    }

    /// Builder-style placement.
    #[must_use]
    pub fn at(mut self, position: CellPos) -> Self {
        self.position = Some(position);
        self
    }

    /// Covered rectangle, if placed.
    #[must_use]
    pub fn rect(&self, config: &GridConfig) -> Option<CellRect> {
        self.position
            .map(|origin| config.sizes.footprint(self.size).at(origin))
    }

    /// Area of the widget's footprint.
    #[must_use]
    pub fn area(&self, config: &GridConfig) -> u32 {
        config.sizes.footprint(self.size).area()
    }

    /// Weight counted against the score budget.
    #[must_use]
    pub fn weight(&self, config: &GridConfig) -> u32 {
        config.sizes.weight(self.size)
    }
}

/// Find a widget by id.
pub(crate) fn find<P>(widgets: &[Widget<P>], id: WidgetId) -> Option<&Widget<P>> {
    widgets.iter().find(|w| w.id == id)
}

pub(crate) fn find_mut<P>(widgets: &mut [Widget<P>], id: WidgetId) -> Option<&mut Widget<P>> {
    widgets.iter_mut().find(|w| w.id == id)
}

/// Deterministic hash of the geometric state (ids, sizes, positions).
///
/// Payloads are excluded, so the hash only changes when the packer changes
/// something.
#[must_use]
pub fn layout_hash<P>(widgets: &[Widget<P>]) -> u64 {
    use std::hash::{Hash, Hasher};

    let mut hasher = rustc_hash::FxHasher::default();
    widgets.len().hash(&mut hasher);
    for widget in widgets {
        widget.id.hash(&mut hasher);
        widget.size.hash(&mut hasher);
        widget.position.hash(&mut hasher);
    }
    hasher.finish()
}
