//! Structural invariants over one grid's widget list.
//!
//! After every committed operation:
//! - every widget is placed,
//! - no two rectangles overlap,
//! - every rectangle lies inside the grid and on a legal origin,
//! - the summed weight stays within the budget,
//! - widget ids are unique.
//!
//! [`check_layout`] reports every violation it finds rather than stopping at
//! the first one, so diagnostics show the whole picture.

use serde::{Deserialize, Serialize};

use crate::config::{GridConfig, OriginError};
use crate::score;
use crate::widget::{Widget, layout_hash};
use crate::{CellRect, WidgetId};

/// Stable code for invariant findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutIssueCode {
    DuplicateWidgetId,
    UnplacedWidget,
    OutOfBounds,
    OriginRuleViolated,
    Overlap,
    BudgetExceeded,
}

/// One actionable invariant finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutIssue {
    pub code: LayoutIssueCode,
    pub widget: Option<WidgetId>,
    pub related_widget: Option<WidgetId>,
    pub message: String,
}

/// Invariant report over a widget list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutReport {
    pub layout_hash: u64,
    pub issues: Vec<LayoutIssue>,
}

impl LayoutReport {
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.issues.is_empty()
    }

    /// First issue code, for compact diagnostics.
    #[must_use]
    pub fn first_code(&self) -> Option<LayoutIssueCode> {
        self.issues.first().map(|issue| issue.code)
    }

    #[must_use]
    pub fn contains(&self, code: LayoutIssueCode) -> bool {
        self.issues.iter().any(|issue| issue.code == code)
    }
}

fn push_issue(
    issues: &mut Vec<LayoutIssue>,
    code: LayoutIssueCode,
    widget: Option<WidgetId>,
    related_widget: Option<WidgetId>,
    message: String,
) {
    issues.push(LayoutIssue {
        code,
        widget,
        related_widget,
        message,
    });
}

/// Check every invariant over `widgets` under `config`.
#[must_use]
pub fn check_layout<P>(widgets: &[Widget<P>], config: &GridConfig) -> LayoutReport {
    let mut issues = Vec::new();

    let mut seen: Vec<WidgetId> = Vec::with_capacity(widgets.len());
    for widget in widgets {
        if seen.contains(&widget.id) {
            push_issue(
                &mut issues,
                LayoutIssueCode::DuplicateWidgetId,
                Some(widget.id),
                None,
                format!("duplicate widget id {}", widget.id.get()),
            );
        } else {
            seen.push(widget.id);
        }
    }

    let mut placed: Vec<(WidgetId, CellRect)> = Vec::with_capacity(widgets.len());
    for widget in widgets {
        let Some(origin) = widget.position else {
            push_issue(
                &mut issues,
                LayoutIssueCode::UnplacedWidget,
                Some(widget.id),
                None,
                format!("widget {} has no position", widget.id.get()),
            );
            continue;
        };
        match config.check_origin(widget.size, origin) {
            Ok(_) => {}
            Err(OriginError::OutOfBounds) => push_issue(
                &mut issues,
                LayoutIssueCode::OutOfBounds,
                Some(widget.id),
                None,
                format!(
                    "widget {} ({}) at ({}, {}) leaves the {}x{} grid",
                    widget.id.get(),
                    widget.size,
                    origin.row,
                    origin.col,
                    config.rows,
                    config.columns
                ),
            ),
            Err(OriginError::RuleViolated) => push_issue(
                &mut issues,
                LayoutIssueCode::OriginRuleViolated,
                Some(widget.id),
                None,
                format!(
                    "widget {} ({}) may not start at ({}, {})",
                    widget.id.get(),
                    widget.size,
                    origin.row,
                    origin.col
                ),
            ),
        }
        let rect = config.sizes.footprint(widget.size).at(origin);
        for (other, other_rect) in &placed {
            if rect.intersects(other_rect) {
                push_issue(
                    &mut issues,
                    LayoutIssueCode::Overlap,
                    Some(widget.id),
                    Some(*other),
                    format!(
                        "widget {} overlaps widget {}",
                        widget.id.get(),
                        other.get()
                    ),
                );
            }
        }
        placed.push((widget.id, rect));
    }

    let total = score::total_weight(widgets, config, &[]);
    if total > config.score_budget {
        push_issue(
            &mut issues,
            LayoutIssueCode::BudgetExceeded,
            None,
            None,
            format!("total weight {total} exceeds budget {}", config.score_budget),
        );
    }

    LayoutReport {
        layout_hash: layout_hash(widgets),
        issues,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CellPos;
    use crate::size::WidgetSize;

    fn widget(raw: u64, size: WidgetSize, row: u16, col: u16) -> Widget<()> {
        Widget::new(WidgetId::new(raw).unwrap(), size, ()).at(CellPos::new(row, col))
    }

    #[test]
    fn clean_layout_has_no_issues() {
        let config = GridConfig::single_plane();
        let widgets = vec![
            widget(1, WidgetSize::Medium, 0, 0),
            widget(2, WidgetSize::Small, 2, 0),
            widget(3, WidgetSize::VerySmall, 3, 1),
        ];
        let report = check_layout(&widgets, &config);
        assert!(!report.has_errors(), "{:?}", report.issues);
    }

    #[test]
    fn overlap_and_bounds_are_reported() {
        let config = GridConfig::single_plane();
        let widgets = vec![
            widget(1, WidgetSize::Medium, 0, 0),
            widget(2, WidgetSize::VerySmall, 1, 1),
            widget(3, WidgetSize::Small, 3, 0),
        ];
        let report = check_layout(&widgets, &config);
        assert!(report.contains(LayoutIssueCode::Overlap));
        assert!(report.contains(LayoutIssueCode::OutOfBounds));
        let overlap = report
            .issues
            .iter()
            .find(|i| i.code == LayoutIssueCode::Overlap)
            .unwrap();
        assert_eq!(overlap.widget, WidgetId::new(2).ok());
        assert_eq!(overlap.related_widget, WidgetId::new(1).ok());
    }

    #[test]
    fn budget_duplicates_and_unplaced() {
        let config = GridConfig::multi_plane();
        let widgets = vec![
            widget(1, WidgetSize::Big, 0, 0),
            Widget::new(WidgetId::new(1).unwrap(), WidgetSize::VerySmall, ()),
        ];
        let report = check_layout(&widgets, &config);
        assert!(report.contains(LayoutIssueCode::DuplicateWidgetId));
        assert!(report.contains(LayoutIssueCode::UnplacedWidget));
        assert!(report.contains(LayoutIssueCode::BudgetExceeded));
    }

    #[test]
    fn origin_rules_are_invariants() {
        let config = GridConfig::multi_plane();
        let widgets = vec![widget(1, WidgetSize::Small, 1, 0)];
        let report = check_layout(&widgets, &config);
        assert_eq!(
            report.first_code(),
            Some(LayoutIssueCode::OriginRuleViolated)
        );
    }
}
