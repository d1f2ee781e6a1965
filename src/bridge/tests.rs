//! Tests for the Bridge orchestrator

use super::*;
use crate::discovery::StaticDiscovery;
use crate::state::{ExposureValues, CHANNEL_NAMES};
use crate::testing::{RecordingTransport, TransportLog};
use crate::transport::DeviceCommand;
use std::thread;

fn fast_settings() -> BridgeSettings {
    BridgeSettings {
        discovery_timeout: Duration::from_millis(20),
    }
}

fn cams() -> Vec<Source> {
    vec![
        Source::new("Stage Left", "10.0.0.1"),
        Source::new("Stage Right", "10.0.0.2"),
        Source::new("Broken", "bad-host"),
    ]
}

fn make_bridge() -> (Bridge, StaticDiscovery, TransportLog) {
    let discovery = StaticDiscovery::new(cams());
    let transport = RecordingTransport::new().reject("bad-host");
    let log = transport.log();
    let mut bridge = Bridge::new(
        Box::new(discovery.clone()),
        Box::new(transport),
        fast_settings(),
    );
    bridge.refresh_sources().unwrap();
    (bridge, discovery, log)
}

fn snapshot(selection: &str, target: CameraState) -> ParameterSnapshot {
    ParameterSnapshot::new(SourceSelector::parse(selection), target)
}

#[test]
fn test_starts_idle() {
    let (mut bridge, _discovery, log) = make_bridge();
    assert_eq!(bridge.state(), CycleState::Idle);

    let out = bridge.run_cycle(&snapshot("None", CameraState::default()));
    assert!(matches!(out.selection, Ok(Selection::Unchanged)));
    assert_eq!(out.state, CycleState::Idle);
    assert_eq!(out.channels, [0.0; CHANNEL_COUNT]);
    assert!(log.opened().is_empty());
}

#[test]
fn test_idle_to_bound_on_first_resolvable_selection() {
    let (mut bridge, _discovery, log) = make_bridge();

    let out = bridge.run_cycle(&snapshot("10.0.0.2", CameraState::default()));
    assert!(matches!(out.selection, Ok(Selection::Connected(ref s)) if s.name == "Stage Right"));
    assert_eq!(
        out.state,
        CycleState::Bound {
            source: Source::new("Stage Right", "10.0.0.2")
        }
    );
    assert_eq!(log.opened(), vec!["10.0.0.2"]);
}

#[test]
fn test_same_selection_never_reconnects() {
    let (mut bridge, _discovery, log) = make_bridge();

    bridge.run_cycle(&snapshot("10.0.0.1", CameraState::default()));
    bridge.run_cycle(&snapshot("10.0.0.1", CameraState::default()));
    bridge.run_cycle(&snapshot("10.0.0.1", CameraState::default()));

    assert_eq!(bridge.connect_count(), 1);
    assert_eq!(log.opened().len(), 1);
}

#[test]
fn test_selection_by_index_and_reconnect() {
    let (mut bridge, _discovery, log) = make_bridge();

    bridge.run_cycle(&snapshot("0", CameraState::default()));
    let out = bridge.run_cycle(&snapshot("1", CameraState::default()));

    assert!(matches!(out.selection, Ok(Selection::Connected(_))));
    assert_eq!(log.opened(), vec!["10.0.0.1", "10.0.0.2"]);
    assert_eq!(log.closed(), vec!["10.0.0.1"]);
    assert_eq!(log.open_links(), 1);
}

#[test]
fn test_other_selector_for_bound_source_does_not_reconnect() {
    let (mut bridge, _discovery, log) = make_bridge();

    bridge.run_cycle(&snapshot("10.0.0.1", CameraState::default()));
    let out = bridge.run_cycle(&snapshot("#0", CameraState::default()));

    assert!(matches!(out.selection, Ok(Selection::Unchanged)));
    assert_eq!(log.opened().len(), 1);
}

#[test]
fn test_unknown_selection_keeps_connection() {
    let (mut bridge, _discovery, log) = make_bridge();

    bridge.run_cycle(&snapshot("10.0.0.1", CameraState::default()));
    let out = bridge.run_cycle(&snapshot("10.9.9.9", CameraState::default()));

    assert!(matches!(out.selection, Err(BridgeError::NotFound { .. })));
    assert!(matches!(out.state, CycleState::Bound { ref source } if source.address == "10.0.0.1"));
    assert!(log.closed().is_empty());

    // Out-of-range index is NotFound too
    let out = bridge.run_cycle(&snapshot("7", CameraState::default()));
    assert!(matches!(out.selection, Err(BridgeError::NotFound { .. })));

    // Going back to the bound selector is not a change
    let out = bridge.run_cycle(&snapshot("10.0.0.1", CameraState::default()));
    assert!(matches!(out.selection, Ok(Selection::Unchanged)));
    assert_eq!(bridge.connect_count(), 1);
}

#[test]
fn test_pan_change_then_repeat_sends_once() {
    let (mut bridge, _discovery, log) = make_bridge();
    bridge.run_cycle(&snapshot("10.0.0.1", CameraState::default()));

    let mut target = CameraState::default();
    target.absolute.pan = 0.5;

    let out = bridge.run_cycle(&snapshot("10.0.0.1", target));
    assert_eq!(
        out.dispatch.sent,
        vec![DeviceCommand::PanTilt { pan: 0.5, tilt: 0.0 }]
    );
    assert_eq!(out.channels[0], 0.5);
    assert_eq!(bridge.camera_state().absolute.pan, 0.5);

    let out = bridge.run_cycle(&snapshot("10.0.0.1", target));
    assert!(out.dispatch.is_idle());
    assert_eq!(log.commands().len(), 1);
}

#[test]
fn test_gain_change_sends_exposure_triple() {
    let (mut bridge, _discovery, log) = make_bridge();

    let mut target = CameraState {
        exposure: ExposureValues {
            gain: 0.1,
            iris: 0.2,
            shutter_speed: 0.2,
        },
        ..Default::default()
    };
    bridge.run_cycle(&snapshot("10.0.0.1", target));
    log.clear_commands();

    target.exposure.gain = 0.2;
    let out = bridge.run_cycle(&snapshot("10.0.0.1", target));

    assert_eq!(
        log.commands(),
        vec![DeviceCommand::Exposure {
            iris: 0.2,
            gain: 0.2,
            shutter_speed: 0.2,
        }]
    );
    assert_eq!(out.channels[8..], [0.2, 0.2, 0.2]);
}

#[test]
fn test_discovery_timeout_keeps_list() {
    let (mut bridge, discovery, _log) = make_bridge();
    let before = bridge.sources().to_vec();
    let menu_revision = bridge.menu().revision();

    discovery.replace(Vec::new());
    let err = bridge.refresh_sources().unwrap_err();

    assert!(matches!(err, BridgeError::DiscoveryUnavailable { .. }));
    assert_eq!(bridge.sources(), before.as_slice());
    assert_eq!(bridge.menu().revision(), menu_revision);
    assert_eq!(bridge.menu().entries().len(), before.len());
}

#[test]
fn test_connection_error_then_not_connected() {
    let (mut bridge, _discovery, log) = make_bridge();

    let mut target = CameraState::default();
    target.absolute.pan = 0.5;
    target.absolute.tilt = 0.25;

    let out = bridge.run_cycle(&snapshot("bad-host", target));
    assert!(matches!(out.selection, Err(BridgeError::ConnectionError { .. })));
    assert_eq!(out.state, CycleState::Idle);
    assert!(out.dispatch.sent.is_empty());
    assert!(out.dispatch.only_not_connected());
    assert_eq!(out.channels[0], 0.0);
    assert!(log.commands().is_empty());
}

#[test]
fn test_failed_connect_drops_previous_connection() {
    let (mut bridge, _discovery, log) = make_bridge();

    bridge.run_cycle(&snapshot("10.0.0.1", CameraState::default()));
    let out = bridge.run_cycle(&snapshot("bad-host", CameraState::default()));

    assert!(matches!(out.selection, Err(BridgeError::ConnectionError { .. })));
    assert_eq!(out.state, CycleState::Idle);
    assert_eq!(log.open_links(), 0);
}

#[test]
fn test_resupplied_selection_retries_failed_connect() {
    let (mut bridge, discovery, log) = make_bridge();

    let out = bridge.run_cycle(&snapshot("2", CameraState::default()));
    assert!(matches!(out.selection, Err(BridgeError::ConnectionError { .. })));
    let out = bridge.run_cycle(&snapshot("2", CameraState::default()));
    assert!(matches!(out.selection, Err(BridgeError::ConnectionError { .. })));
    assert_eq!(log.attempts(), vec!["bad-host", "bad-host"]);

    // The same index now advertises a reachable address
    discovery.replace(vec![
        Source::new("Stage Left", "10.0.0.1"),
        Source::new("Stage Right", "10.0.0.2"),
        Source::new("Fixed", "10.0.0.9"),
    ]);
    bridge.refresh_sources().unwrap();

    let out = bridge.run_cycle(&snapshot("2", CameraState::default()));
    assert!(matches!(out.selection, Ok(Selection::Connected(ref s)) if s.address == "10.0.0.9"));

    // Bound now, so the same index stops reconnecting
    bridge.run_cycle(&snapshot("2", CameraState::default()));
    assert_eq!(log.attempts().len(), 3);
}

#[test]
fn test_pending_changes_flush_after_connect() {
    let (mut bridge, _discovery, log) = make_bridge();

    let mut target = CameraState::default();
    target.speed.zoom = 0.5;

    let out = bridge.run_cycle(&snapshot("None", target));
    assert!(out.dispatch.only_not_connected());
    assert_eq!(out.channels[6], 0.0);

    let out = bridge.run_cycle(&snapshot("10.0.0.1", target));
    assert_eq!(out.dispatch.sent, vec![DeviceCommand::ZoomSpeed(0.5)]);
    assert_eq!(out.channels[6], 0.5);
    assert_eq!(log.commands().len(), 1);
}

#[test]
fn test_cycle_counter_and_reset() {
    let (mut bridge, _discovery, _log) = make_bridge();

    for _ in 0..3 {
        bridge.run_cycle(&snapshot("None", CameraState::default()));
    }
    bridge.diagnostics_mut().set_offset(2.5);

    let table = bridge.diagnostics().table();
    assert_eq!(table.cell(0, 1), Some("3"));
    assert_eq!(table.cell(1, 1), Some("2.5"));

    bridge.diagnostics_mut().reset();
    let out = bridge.run_cycle(&snapshot("None", CameraState::default()));
    assert_eq!(out.cycle, 4);
    assert_eq!(bridge.diagnostics().offset(), 0.0);
}

#[test]
fn test_menu_only_changes_on_refresh() {
    let (mut bridge, discovery, _log) = make_bridge();
    assert_eq!(bridge.menu().entries()[0].address, "10.0.0.1");
    assert_eq!(bridge.menu().entries()[0].label, "Stage Left");

    discovery.replace(vec![Source::new("New CAM", "10.0.0.7")]);
    bridge.run_cycle(&snapshot("None", CameraState::default()));
    assert_eq!(bridge.menu().entries().len(), 3);

    bridge.refresh_sources().unwrap();
    assert_eq!(bridge.menu().entries().len(), 1);
    assert_eq!(bridge.menu().entries()[0].label, "New CAM");
}

#[test]
fn test_shutdown_closes_and_clears() {
    let (mut bridge, _discovery, log) = make_bridge();
    bridge.run_cycle(&snapshot("10.0.0.1", CameraState::default()));

    bridge.shutdown();
    assert_eq!(bridge.state(), CycleState::Idle);
    assert!(bridge.sources().is_empty());
    assert_eq!(log.open_links(), 0);

    // Still usable: selections simply fail until the next refresh
    let out = bridge.run_cycle(&snapshot("10.0.0.1", CameraState::default()));
    assert!(matches!(out.selection, Err(BridgeError::NotFound { .. })));
}

#[test]
fn test_independent_instances() {
    let (mut a, _da, log_a) = make_bridge();
    let (mut b, _db, log_b) = make_bridge();

    let mut target = CameraState::default();
    target.absolute.zoom = 0.3;

    a.run_cycle(&snapshot("10.0.0.1", target));
    b.run_cycle(&snapshot("10.0.0.2", CameraState::default()));

    assert_eq!(log_a.commands(), vec![DeviceCommand::Zoom(0.3)]);
    assert!(log_b.commands().is_empty());
    assert_eq!(b.camera_state().absolute.zoom, 0.0);
}

#[test]
fn test_output_channel_names_line_up() {
    let (mut bridge, _discovery, _log) = make_bridge();
    let mut target = CameraState::default();
    target.exposure.shutter_speed = 0.9;

    let out = bridge.run_cycle(&snapshot("10.0.0.1", target));
    let index = CHANNEL_NAMES
        .iter()
        .position(|n| *n == "shutter_speed")
        .unwrap();
    assert_eq!(out.channels[index], 0.9);
}

#[test]
fn test_shared_bridge_across_threads() {
    let (bridge, _discovery, log) = make_bridge();
    let shared = SharedBridge::new(bridge);

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let shared = shared.clone();
            thread::spawn(move || {
                let mut target = CameraState::default();
                target.absolute.pan = i as f64 / 10.0;
                target.absolute.tilt = i as f64 / 10.0;
                shared.run_cycle(&snapshot("10.0.0.1", target));
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    // Every pan/tilt command carries a pair from a single snapshot
    for command in log.commands() {
        if let DeviceCommand::PanTilt { pan, tilt } = command {
            assert_eq!(pan.to_bits(), tilt.to_bits());
        }
    }
    assert_eq!(shared.with(|b| b.diagnostics().execute_count()), 4);
    assert_eq!(shared.with(|b| b.connect_count()), 1);

    shared.shutdown();
    assert_eq!(log.open_links(), 0);
}

#[test]
fn test_index_binding_survives_reordering_refresh() {
    let (mut bridge, discovery, log) = make_bridge();

    bridge.run_cycle(&snapshot("#0", CameraState::default()));
    assert_eq!(bridge.state(), CycleState::Bound { source: cams()[0].clone() });

    let mut reordered = cams();
    reordered.reverse();
    discovery.replace(reordered);
    bridge.refresh_sources().unwrap();
    assert_eq!(bridge.menu().entries()[0].address, "bad-host");

    // Same selector: the connection stays on the device it was made for
    let out = bridge.run_cycle(&snapshot("#0", CameraState::default()));
    assert!(matches!(out.selection, Ok(Selection::Unchanged)));
    assert_eq!(out.state, CycleState::Bound { source: cams()[0].clone() });
    assert_eq!(log.opened(), vec!["10.0.0.1"]);

    // The device's new index resolves to the bound source, no reconnect
    let out = bridge.run_cycle(&snapshot("#2", CameraState::default()));
    assert!(matches!(out.selection, Ok(Selection::Unchanged)));
    assert_eq!(bridge.connect_count(), 1);
}

#[test]
fn test_hostname_source_fails_fast_on_visca() {
    let discovery = StaticDiscovery::new(vec![Source::new("Named", "cam.invalid")]);
    let mut bridge = Bridge::new(
        Box::new(discovery),
        Box::new(crate::transport::ViscaTransport::default()),
        fast_settings(),
    );
    bridge.refresh_sources().unwrap();

    let started = std::time::Instant::now();
    for _ in 0..3 {
        let out = bridge.run_cycle(&snapshot("cam.invalid", CameraState::default()));
        assert!(matches!(out.selection, Err(BridgeError::ConnectionError { .. })));
        assert_eq!(out.state, CycleState::Idle);
    }
    assert!(started.elapsed() < Duration::from_secs(1));
}
