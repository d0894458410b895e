//! End-to-end packing scenarios on the 4×2 dashboard grids.
//!
//! Each test drives the public owners ([`GridPlane`], [`Board`]) the way a
//! host UI would: a stream of add/remove/move/swap requests with typed
//! rejections checked against the untouched state.

use gridpack::{
    Board, CellPos, DashboardId, GridConfig, GridPlane, PackRejection, Strategy, Widget, WidgetId,
    WidgetSize,
};

fn id(raw: u64) -> WidgetId {
    WidgetId::new(raw).expect("test ids are non-zero")
}

fn dash(raw: u64) -> DashboardId {
    DashboardId::new(raw).expect("test ids are non-zero")
}

fn single() -> GridPlane<&'static str> {
    GridPlane::new(GridConfig::single_plane()).expect("preset config is valid")
}

fn position(plane: &GridPlane<&'static str>, widget: WidgetId) -> Option<CellPos> {
    plane.widget(widget).and_then(|w| w.position)
}

#[test]
fn big_widget_lands_at_origin_of_empty_grid() {
    let mut plane = single();
    let outcome = plane.add(WidgetSize::Big, "map").expect("empty grid has room");

    assert_eq!(outcome.strategy, Strategy::FirstFit);
    assert_eq!(outcome.created, Some(id(1)));
    assert_eq!(position(&plane, id(1)), Some(CellPos::ORIGIN));
    assert_eq!(plane.total_weight(), 80);
    assert_eq!(plane.remaining_budget(), 120);
    assert_eq!(plane.occupancy().occupied_count(), 8);
}

#[test]
fn full_grid_rejects_on_occupancy_not_score() {
    let mut plane = single();
    plane.add(WidgetSize::Big, "map").expect("empty grid has room");
    let before = plane.clone();

    let err = plane
        .add(WidgetSize::VerySmall, "clock")
        .expect_err("no free cell remains");

    assert_eq!(err.reason, PackRejection::NoLegalPosition { widget: None });
    assert_eq!(err.state_hash, before.state_hash());
    assert_eq!(plane, before);
    assert!(plane.total_weight() + 10 <= plane.config().score_budget);
}

#[test]
fn medium_swaps_with_four_very_small_widgets() {
    let mut plane = single();
    for label in ["a", "b", "c", "d"] {
        plane.add(WidgetSize::VerySmall, label).expect("room");
    }
    plane.add(WidgetSize::Medium, "chart").expect("room");
    assert_eq!(position(&plane, id(5)), Some(CellPos::new(2, 0)));
    assert_eq!(plane.total_weight(), 80);

    let outcome = plane
        .move_widget(id(5), CellPos::ORIGIN)
        .expect("equal areas swap exactly");

    assert_eq!(outcome.strategy, Strategy::ExactSwap);
    assert_eq!(position(&plane, id(5)), Some(CellPos::ORIGIN));
    assert_eq!(position(&plane, id(1)), Some(CellPos::new(2, 0)));
    assert_eq!(position(&plane, id(2)), Some(CellPos::new(2, 1)));
    assert_eq!(position(&plane, id(3)), Some(CellPos::new(3, 0)));
    assert_eq!(position(&plane, id(4)), Some(CellPos::new(3, 1)));
    assert_eq!(plane.total_weight(), 80);
    assert!(!plane.report().has_errors());
}

#[test]
fn scattered_free_cells_reject_small_as_no_space() {
    let widgets = vec![
        Widget::new(id(1), WidgetSize::Small, "s").at(CellPos::new(0, 0)),
        Widget::new(id(2), WidgetSize::VerySmall, "a").at(CellPos::new(0, 1)),
        Widget::new(id(3), WidgetSize::VerySmall, "b").at(CellPos::new(2, 0)),
        Widget::new(id(4), WidgetSize::VerySmall, "c").at(CellPos::new(2, 1)),
        Widget::new(id(5), WidgetSize::VerySmall, "d").at(CellPos::new(3, 1)),
    ];
    let mut plane =
        GridPlane::from_widgets(GridConfig::single_plane(), widgets).expect("valid config");
    assert!(!plane.report().has_errors());
    assert_eq!(plane.occupancy().free_cells().count(), 2);
    assert_eq!(plane.total_weight(), 60);

    let err = plane
        .add(WidgetSize::Small, "second")
        .expect_err("no vertical pair of free cells");
    assert_eq!(err.reason, PackRejection::NoLegalPosition { widget: None });
    assert_eq!(plane.widgets().len(), 5);

    // A 1×1 still fits the first free cell in row-major order.
    plane.add(WidgetSize::VerySmall, "e").expect("(1, 1) is free");
    assert_eq!(position(&plane, id(6)), Some(CellPos::new(1, 1)));
}

#[test]
fn removing_last_widget_recycles_the_only_dashboard() {
    let mut board: Board<&str> = Board::new(GridConfig::multi_plane()).expect("valid config");
    board.add(WidgetSize::Small, "only").expect("room");
    assert_eq!(board.dashboards().len(), 1);
    assert_eq!(board.dashboards()[0].id, dash(1));

    board.remove(id(1)).expect("widget exists");

    assert_eq!(board.dashboards().len(), 1);
    assert!(board.dashboards()[0].is_empty());
    assert_ne!(board.dashboards()[0].id, dash(1));
    assert_eq!(board.widget_count(), 0);
}

#[test]
fn removing_unknown_widget_is_a_typed_rejection() {
    let mut plane = single();
    plane.add(WidgetSize::Medium, "chart").expect("room");
    let before = plane.state_hash();

    let err = plane.remove(id(42)).expect_err("nothing to remove");
    assert_eq!(err.reason, PackRejection::UnknownWidget { widget: id(42) });
    assert_eq!(plane.state_hash(), before);

    let err = plane.remove(id(42)).expect_err("still nothing to remove");
    assert_eq!(err.reason, PackRejection::UnknownWidget { widget: id(42) });
    assert_eq!(plane.state_hash(), before);
}

#[test]
fn moving_onto_own_position_is_a_round_trip() {
    let mut plane = single();
    plane.add(WidgetSize::Small, "a").expect("room");
    plane.add(WidgetSize::Medium, "b").expect("room");
    let before = plane.widgets().to_vec();

    let at = position(&plane, id(2)).expect("placed");
    let outcome = plane.move_widget(id(2), at).expect("no-op move");

    assert_eq!(outcome.strategy, Strategy::Unchanged);
    assert_eq!(outcome.before_hash, outcome.after_hash);
    assert_eq!(plane.widgets(), before.as_slice());
}

#[test]
fn placement_search_is_deterministic() {
    let mut plane = single();
    plane.add(WidgetSize::VerySmall, "a").expect("room");
    plane.add(WidgetSize::Small, "b").expect("room");

    for size in WidgetSize::ALL {
        assert_eq!(plane.preview(size), plane.preview(size));
    }
    assert_eq!(plane.preview(WidgetSize::VerySmall), Ok(CellPos::new(1, 0)));
    assert_eq!(plane.preview(WidgetSize::Medium), Ok(CellPos::new(2, 0)));

    let mut twin = single();
    twin.add(WidgetSize::VerySmall, "a").expect("room");
    twin.add(WidgetSize::Small, "b").expect("room");
    assert_eq!(twin.state_hash(), plane.state_hash());
}

#[test]
fn budget_caps_a_grid_before_space_runs_out() {
    let config = GridConfig::single_plane().with_score_budget(30);
    let mut plane: GridPlane<&str> = GridPlane::new(config).expect("valid config");
    plane.add(WidgetSize::Small, "a").expect("room");

    let err = plane
        .add(WidgetSize::Small, "b")
        .expect_err("20 + 20 exceeds 30");
    assert_eq!(
        err.reason,
        PackRejection::CapacityExceeded {
            budget: 30,
            required: 40
        }
    );
    plane.add(WidgetSize::VerySmall, "c").expect("20 + 10 fits");
    assert_eq!(plane.remaining_budget(), 0);
}

#[test]
fn multi_plane_origin_rules_shape_placement() {
    let mut board: Board<u8> = Board::new(GridConfig::multi_plane()).expect("valid config");
    board.add(WidgetSize::VerySmall, 1).expect("room");
    // Small must start on an even row, so (0, 1) is the first legal slot.
    board.add(WidgetSize::Small, 2).expect("room");
    assert_eq!(
        board.widget(id(2)).and_then(|w| w.position),
        Some(CellPos::new(0, 1))
    );
    // Medium is limited to column 0 at row 0 or 2.
    board.add(WidgetSize::Medium, 3).expect("room");
    assert_eq!(
        board.widget(id(3)).and_then(|w| w.position),
        Some(CellPos::new(2, 0))
    );
    assert_eq!(board.total_weight(dash(1)), Some(70));

    // Big only fits an empty dashboard's origin.
    board.add(WidgetSize::Big, 4).expect("spills to a new dashboard");
    assert_eq!(board.dashboard_of(id(4)), Some(dash(2)));
    assert!(board.reports().iter().all(|(_, report)| !report.has_errors()));
}
