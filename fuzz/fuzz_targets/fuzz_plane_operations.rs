#![no_main]

use arbitrary::Unstructured;
use gridpack::{CellPos, GridConfig, GridPlane, GridRequest, WidgetId, WidgetSize};
use libfuzzer_sys::fuzz_target;

const SIZES: [WidgetSize; 4] = [
    WidgetSize::VerySmall,
    WidgetSize::Small,
    WidgetSize::Medium,
    WidgetSize::Big,
];

fn widget(u: &mut Unstructured<'_>, ids: &[WidgetId]) -> arbitrary::Result<WidgetId> {
    if ids.is_empty() || u.ratio(1, 8)? {
        return WidgetId::new(u64::from(u.arbitrary::<u8>()?) + 1)
            .map_err(|_| arbitrary::Error::IncorrectFormat);
    }
    u.choose(ids).copied()
}

fn position(u: &mut Unstructured<'_>, config: &GridConfig) -> arbitrary::Result<CellPos> {
    // One past the edge exercises the bounds rejection.
    Ok(CellPos::new(
        u.int_in_range(0..=config.rows)?,
        u.int_in_range(0..=config.columns)?,
    ))
}

fn request(u: &mut Unstructured<'_>, plane: &GridPlane<u8>) -> arbitrary::Result<GridRequest<u8>> {
    let ids: Vec<WidgetId> = plane.widgets().iter().map(|w| w.id).collect();
    let config = plane.config();

    Ok(match u.int_in_range(0u8..=5)? {
        0 => GridRequest::Add {
            size: *u.choose(&SIZES)?,
            payload: u.arbitrary()?,
        },
        1 => GridRequest::AddAt {
            size: *u.choose(&SIZES)?,
            payload: u.arbitrary()?,
            position: position(u, config)?,
        },
        2 => GridRequest::Remove {
            id: widget(u, &ids)?,
        },
        3 => GridRequest::Move {
            id: widget(u, &ids)?,
            position: position(u, config)?,
        },
        4 => GridRequest::Swap {
            first: widget(u, &ids)?,
            second: widget(u, &ids)?,
        },
        _ => GridRequest::Compact,
    })
}

fuzz_target!(|data: &[u8]| {
    let mut u = Unstructured::new(data);
    let config = match u.arbitrary::<bool>() {
        Ok(true) => GridConfig::multi_plane(),
        _ => GridConfig::single_plane(),
    };
    let Ok(mut plane) = GridPlane::<u8>::new(config) else {
        return;
    };

    while !u.is_empty() {
        let Ok(req) = request(&mut u, &plane) else {
            break;
        };
        let before = plane.clone();
        if plane.apply(req).is_err() {
            assert_eq!(
                plane.widgets(),
                before.widgets(),
                "rejection must not mutate"
            );
        }
        let report = plane.report();
        assert!(!report.has_errors(), "invalid layout: {:?}", report.issues);
        assert!(plane.total_weight() <= plane.config().score_budget);
    }
});
