#![no_main]

use arbitrary::Arbitrary;
use gridpack::{Board, BoardRequest, CellPos, DashboardId, GridConfig, WidgetId, WidgetSize};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Clone, Copy, Arbitrary)]
enum Size {
    VerySmall,
    Small,
    Medium,
    Big,
}

impl From<Size> for WidgetSize {
    fn from(size: Size) -> Self {
        match size {
            Size::VerySmall => WidgetSize::VerySmall,
            Size::Small => WidgetSize::Small,
            Size::Medium => WidgetSize::Medium,
            Size::Big => WidgetSize::Big,
        }
    }
}

/// Requests refer to widgets and dashboards by index into the current
/// board, so most of them hit live targets.
#[derive(Debug, Arbitrary)]
enum Op {
    Add(Size),
    AddTo {
        dashboard: u8,
        size: Size,
        at: Option<(u8, u8)>,
    },
    Remove(u8),
    Move {
        widget: u8,
        dashboard: u8,
        row: u8,
        col: u8,
    },
    Swap(u8, u8),
    Compact(u8),
    AddDashboard,
    RemoveDashboard(u8),
}

fn widget_at(board: &Board<u16>, idx: u8) -> WidgetId {
    let ids: Vec<WidgetId> = board
        .dashboards()
        .iter()
        .flat_map(|d| d.widgets.iter().map(|w| w.id))
        .collect();
    ids.get(usize::from(idx) % (ids.len() + 1))
        .copied()
        .unwrap_or_else(|| board.next_widget_id())
}

fn dashboard_at(board: &Board<u16>, idx: u8) -> DashboardId {
    board
        .dashboards()
        .get(usize::from(idx) % (board.dashboards().len() + 1))
        .map_or_else(|| board.next_dashboard_id(), |d| d.id)
}

fn cell(row: u8, col: u8) -> CellPos {
    CellPos::new(u16::from(row % 6), u16::from(col % 4))
}

fuzz_target!(|ops: Vec<Op>| {
    let mut board: Board<u16> = match Board::new(GridConfig::multi_plane()) {
        Ok(board) => board,
        Err(_) => return,
    };

    for (seq, op) in ops.into_iter().take(256).enumerate() {
        let request = match op {
            Op::Add(size) => BoardRequest::Add {
                size: size.into(),
                payload: seq as u16,
            },
            Op::AddTo { dashboard, size, at } => BoardRequest::AddTo {
                dashboard: dashboard_at(&board, dashboard),
                size: size.into(),
                payload: seq as u16,
                position: at.map(|(row, col)| cell(row, col)),
            },
            Op::Remove(widget) => BoardRequest::Remove {
                id: widget_at(&board, widget),
            },
            Op::Move {
                widget,
                dashboard,
                row,
                col,
            } => BoardRequest::Move {
                id: widget_at(&board, widget),
                dashboard: dashboard_at(&board, dashboard),
                position: cell(row, col),
            },
            Op::Swap(first, second) => BoardRequest::Swap {
                first: widget_at(&board, first),
                second: widget_at(&board, second),
            },
            Op::Compact(dashboard) => BoardRequest::Compact {
                dashboard: dashboard_at(&board, dashboard),
            },
            Op::AddDashboard => BoardRequest::AddDashboard,
            Op::RemoveDashboard(dashboard) => BoardRequest::RemoveDashboard {
                dashboard: dashboard_at(&board, dashboard),
            },
        };

        let before = board.state_hash();
        match board.apply(request) {
            Ok(outcome) => assert_eq!(outcome.after_hash, board.state_hash()),
            Err(err) => {
                assert_eq!(err.state_hash, before, "rejection must not mutate");
                assert_eq!(board.state_hash(), before, "rejection must not mutate");
            }
        }

        assert!(!board.dashboards().is_empty(), "board lost every dashboard");
        for (dashboard, report) in board.reports() {
            assert!(
                !report.has_errors(),
                "dashboard {dashboard} invalid: {:?}",
                report.issues
            );
        }
    }
});
