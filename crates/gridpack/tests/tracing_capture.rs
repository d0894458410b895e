//! Structured log events emitted by the transactional owners.

use std::sync::{Arc, Mutex};

use gridpack::{Board, CellPos, GridConfig, GridPlane, WidgetId, WidgetSize};
use tracing::Subscriber;
use tracing_subscriber::Layer;
use tracing_subscriber::layer::{Context, SubscriberExt};

#[derive(Default)]
struct PackTraceState {
    apply_spans: Vec<String>,
    messages: Vec<String>,
}

struct PackTraceCapture {
    state: Arc<Mutex<PackTraceState>>,
}

impl<S> Layer<S> for PackTraceCapture
where
    S: Subscriber + for<'lookup> tracing_subscriber::registry::LookupSpan<'lookup>,
{
    fn on_new_span(
        &self,
        attrs: &tracing::span::Attributes<'_>,
        _id: &tracing::Id,
        _ctx: Context<'_, S>,
    ) {
        if attrs.metadata().name() != "gridpack.apply" {
            return;
        }
        struct Kind {
            kind: Option<String>,
        }
        impl tracing::field::Visit for Kind {
            fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
                if field.name() == "kind" {
                    self.kind = Some(value.to_string());
                }
            }

            fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
                if field.name() == "kind" {
                    self.kind = Some(format!("{value:?}").trim_matches('"').to_string());
                }
            }
        }
        let mut kind = Kind { kind: None };
        attrs.record(&mut kind);
        if let Some(kind) = kind.kind {
            self.state
                .lock()
                .expect("pack trace lock")
                .apply_spans
                .push(kind);
        }
    }

    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        struct Msg {
            message: Option<String>,
        }
        impl tracing::field::Visit for Msg {
            fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
                if field.name() == "message" {
                    self.message = Some(value.to_string());
                }
            }

            fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
                if field.name() == "message" {
                    self.message = Some(format!("{value:?}").trim_matches('"').to_string());
                }
            }
        }
        let mut msg = Msg { message: None };
        event.record(&mut msg);
        if let Some(message) = msg.message {
            self.state
                .lock()
                .expect("pack trace lock")
                .messages
                .push(message);
        }
    }
}

fn capture() -> (Arc<Mutex<PackTraceState>>, impl Subscriber + Send + Sync) {
    let state = Arc::new(Mutex::new(PackTraceState::default()));
    let subscriber = tracing_subscriber::registry().with(PackTraceCapture {
        state: Arc::clone(&state),
    });
    (state, subscriber)
}

#[test]
fn plane_commit_and_reject_events_are_emitted() {
    let (state, subscriber) = capture();
    tracing::subscriber::with_default(subscriber, || {
        let mut plane: GridPlane<()> =
            GridPlane::new(GridConfig::single_plane()).expect("valid config");
        plane.add(WidgetSize::Big, ()).expect("empty grid has room");
        plane.add(WidgetSize::VerySmall, ()).expect_err("grid is full");
    });

    let snapshot = state.lock().expect("pack trace lock");
    assert_eq!(
        snapshot.apply_spans,
        vec!["add".to_owned(), "add".to_owned()]
    );
    assert_eq!(
        snapshot.messages,
        vec!["gridpack.commit".to_owned(), "gridpack.reject".to_owned()]
    );
}

#[test]
fn group_swap_reports_its_search() {
    let (state, subscriber) = capture();
    tracing::subscriber::with_default(subscriber, || {
        let mut plane: GridPlane<()> =
            GridPlane::new(GridConfig::single_plane()).expect("valid config");
        plane.add(WidgetSize::Medium, ()).expect("room");
        plane.add(WidgetSize::Small, ()).expect("room");
        plane.add(WidgetSize::Small, ()).expect("room");
        // The 1×2 at (2, 0) pulls a 2×2 group from the top half.
        let mover = WidgetId::new(2).expect("non-zero");
        plane
            .move_widget(mover, CellPos::ORIGIN)
            .expect("group swap resolves");
    });

    let snapshot = state.lock().expect("pack trace lock");
    assert_eq!(
        snapshot.apply_spans.last().map(String::as_str),
        Some("move")
    );
    assert!(
        snapshot
            .messages
            .iter()
            .any(|message| message == "gridpack.group_search"),
        "expected a group search event, got {:?}",
        snapshot.messages
    );
}

#[test]
fn board_logs_dashboard_lifecycle() {
    let (state, subscriber) = capture();
    tracing::subscriber::with_default(subscriber, || {
        let mut board: Board<()> = Board::new(GridConfig::multi_plane()).expect("valid config");
        board.add(WidgetSize::Big, ()).expect("room");
        let spilled = board.add(WidgetSize::Big, ()).expect("spills");
        board
            .remove(spilled.created.expect("created id"))
            .expect("widget exists");
    });

    let snapshot = state.lock().expect("pack trace lock");
    let messages: Vec<&str> = snapshot.messages.iter().map(String::as_str).collect();
    assert!(messages.contains(&"gridpack.dashboard_appended"));
    assert!(messages.contains(&"gridpack.dashboards_collected"));
    assert_eq!(
        messages.iter().filter(|m| **m == "gridpack.commit").count(),
        3
    );
}
