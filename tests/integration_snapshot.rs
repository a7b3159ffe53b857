mod common;

use std::sync::Arc;

use edge_dock::snapshot::{DockSnapshot, SnapshotSink};
use edge_dock::{Behavior, DockBuilder, DockConfig, Position, Rect, RelativePosition, Side};
use indoc::indoc;

use common::{Panel, QUIET, SCREEN, WAIT, close};

fn from_config(config: &DockConfig) -> DockBuilder<Panel> {
    DockBuilder::from_config(SCREEN, Panel::default(), config)
        .quiet_period(QUIET)
        .initial_show(false)
}

#[test]
fn position_survives_a_restart() {
    let dir = tempfile::tempdir().unwrap();
    let state = dir.path().join("state").join("dock.json");
    let config = DockConfig::from_json(indoc! {r#"
        {
            "name": "tools",
            "position": { "relative": "right-center" },
            "show": { "kind": "instant" },
            "hide": { "kind": "instant" }
        }
    "#})
    .unwrap();

    let sink: SnapshotSink = {
        let state = state.clone();
        Arc::new(move |snapshot: &DockSnapshot| snapshot.save(&state).unwrap())
    };
    let (dock, mut ui) = from_config(&config).snapshot_sink(sink).build().unwrap();
    assert_eq!(dock.stage(), Rect::new(1921.0, 520.0, 200.0, 40.0));

    dock.move_to_side(Side::Bottom, 120.0).unwrap();
    assert!(ui.pump_until(WAIT, |core| core.side() == Side::Bottom));
    close(dock, ui);

    let snapshot = DockSnapshot::load(&state).unwrap();
    assert_eq!(snapshot.name, "tools");
    assert_eq!(
        snapshot.position(),
        Position::Absolute {
            side: Side::Bottom,
            coordinate: 120.0
        }
    );

    let mut restored = DockConfig::default();
    snapshot.apply_to(&mut restored);
    assert_eq!(restored.show, Behavior::Instant);
    let (dock, ui) = from_config(&restored).build().unwrap();
    assert_eq!(dock.name(), "tools");
    assert_eq!(dock.stage(), Rect::new(120.0, 1081.0, 200.0, 40.0));
    close(dock, ui);
}

#[test]
fn relative_placement_is_remembered_per_side() {
    let dir = tempfile::tempdir().unwrap();
    let state = dir.path().join("dock.json");
    let sink: SnapshotSink = {
        let state = state.clone();
        Arc::new(move |snapshot: &DockSnapshot| snapshot.save(&state).unwrap())
    };
    let (dock, mut ui) = from_config(&DockConfig::default())
        .snapshot_sink(sink)
        .show(Behavior::Instant)
        .hide(Behavior::Instant)
        .build()
        .unwrap();

    dock.move_to_relative(RelativePosition::LeftCenter).unwrap();
    assert!(ui.pump_until(WAIT, |core| core.side() == Side::Left));
    assert_eq!(dock.stage(), Rect::new(-201.0, 520.0, 200.0, 40.0));
    close(dock, ui);

    let snapshot = DockSnapshot::load(&state).unwrap();
    assert_eq!(snapshot.position(), Position::Relative(RelativePosition::LeftCenter));
}

#[test]
fn pin_toggle_is_saved() {
    let saved = Arc::new(parking_lot::Mutex::new(None));
    let sink: SnapshotSink = {
        let saved = Arc::clone(&saved);
        Arc::new(move |snapshot: &DockSnapshot| *saved.lock() = Some(snapshot.clone()))
    };
    let (dock, ui) = from_config(&DockConfig::default()).snapshot_sink(sink).build().unwrap();
    dock.set_pinned(true);
    let snapshot = saved.lock().clone().unwrap();
    assert!(snapshot.pinned);
    assert_eq!(snapshot.position(), Position::Relative(RelativePosition::TopCenter));
    close(dock, ui);
}
