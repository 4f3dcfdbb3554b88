mod common;

use approx::assert_abs_diff_eq;
use bevy::prelude::*;
use serde_json::json;

use common::{Harness, offset, origin};
use geo_ar_engine::engine::calibration::{CalibrationPhase, CalibrationStatusChanged};
use geo_ar_engine::engine::config::ArConfig;
use geo_ar_engine::engine::core::EngineState;
use geo_ar_engine::engine::geo::GeoPoint;
use geo_ar_engine::engine::scene::{ObjectKind, ObjectTable, ResetSession};
use geo_ar_engine::engine::sensors::SensorKind;

fn assert_vec3_near(actual: Vec3, expected: Vec3, epsilon: f32) {
    assert_abs_diff_eq!(actual.x, expected.x, epsilon = epsilon);
    assert_abs_diff_eq!(actual.y, expected.y, epsilon = epsilon);
    assert_abs_diff_eq!(actual.z, expected.z, epsilon = epsilon);
}

#[test]
fn object_fifty_metres_north_lands_ahead_on_negative_z() {
    let mut h = Harness::new();
    h.spawn(1, ObjectKind::place(), offset(0.0, -50.0, 0.0));
    h.calibrate(origin(), 0.0);

    assert_eq!(h.engine_state(), EngineState::Calibrated);
    assert_vec3_near(h.translation(1), Vec3::new(0.0, 0.0, -50.0), 0.05);

    let (transform, visibility) = h.published(1);
    assert_vec3_near(transform.translation, Vec3::new(0.0, 0.0, -50.0), 0.05);
    assert_eq!(visibility, Visibility::Inherited);
}

#[test]
fn objects_wait_hidden_until_both_fixes_arrive() {
    let mut h = Harness::new();
    h.spawn(1, ObjectKind::default(), offset(0.0, -10.0, 0.0));
    h.push_location(origin());
    h.frame();

    assert_eq!(h.engine_state(), EngineState::AwaitingFixes);
    assert!(!h.object(1).unwrap().is_placed());
    assert_eq!(h.published(1).1, Visibility::Hidden);

    h.push_heading(0.0);
    h.frame();
    assert_eq!(h.engine_state(), EngineState::Calibrated);
    assert_eq!(h.published(1).1, Visibility::Inherited);
}

#[test]
fn small_moves_keep_the_reference_and_six_metres_recalibrates() {
    let mut h = Harness::new();
    h.spawn(1, ObjectKind::place(), offset(0.0, -50.0, 0.0));
    h.calibrate(origin(), 0.0);

    for step in [1.0, 3.0, 4.5] {
        h.push_location(offset(0.0, -step, 0.0));
        h.frame();
        assert_eq!(h.controller().phase(), CalibrationPhase::Calibrated);
        assert_vec3_near(h.translation(1), Vec3::new(0.0, 0.0, -50.0), 0.05);
    }

    h.push_location(offset(0.0, -6.0, 0.0));
    h.frame();
    assert_eq!(h.controller().phase(), CalibrationPhase::Calibrated);
    assert_vec3_near(h.translation(1), Vec3::new(0.0, 0.0, -44.0), 0.05);
    assert_vec3_near(h.published(1).0.translation, Vec3::new(0.0, 0.0, -44.0), 0.05);
}

#[test]
fn heading_drift_past_threshold_rotates_the_scene() {
    let mut h = Harness::new();
    h.spawn(1, ObjectKind::place(), offset(0.0, -50.0, 0.0));
    h.calibrate(origin(), 0.0);

    h.push_heading(10.0);
    h.frame();
    assert_vec3_near(h.translation(1), Vec3::new(0.0, 0.0, -50.0), 0.05);

    h.push_heading(20.0);
    h.frame();
    let moved = h.translation(1);
    assert_abs_diff_eq!(moved.length(), 50.0, epsilon = 0.05);
    assert_abs_diff_eq!(moved.x.abs(), 50.0 * 20f32.to_radians().sin(), epsilon = 0.05);
}

#[test]
fn missing_heading_provider_degrades_without_placing() {
    let mut h = Harness::new();
    h.record::<CalibrationStatusChanged>();
    h.spawn(1, ObjectKind::default(), offset(0.0, -10.0, 0.0));

    h.sensors.report_unavailable(SensorKind::Heading);
    h.push_location(origin());
    h.frame();

    assert_eq!(h.engine_state(), EngineState::Degraded);
    assert!(!h.object(1).unwrap().is_placed());
    let reported = h.recorded::<CalibrationStatusChanged>();
    let CalibrationStatusChanged(status) = reported.last().copied().unwrap();
    assert!(!status.heading_available);
    assert!(status.has_location);

    // Heading comes back, e.g. permission granted later
    h.push_heading(0.0);
    h.frame();
    assert_eq!(h.engine_state(), EngineState::Calibrated);
    assert!(h.object(1).unwrap().is_placed());
}

#[test]
fn low_accuracy_fixes_are_skipped_when_configured() {
    let mut h = Harness::new();
    h.calibrate(origin().with_accuracy(120.0), 0.0);
    assert_eq!(h.engine_state(), EngineState::AwaitingFixes);
    assert_eq!(h.controller().flagged_fixes(), 1);

    h.push_location(origin());
    h.frame();
    assert_eq!(h.engine_state(), EngineState::Calibrated);
}

#[test]
fn low_accuracy_fixes_are_used_when_skipping_is_off() {
    let mut h = Harness::with_config(ArConfig {
        skip_low_accuracy: false,
        ..default()
    });
    h.calibrate(origin().with_accuracy(120.0), 0.0);
    assert_eq!(h.engine_state(), EngineState::Calibrated);
    assert_eq!(h.controller().flagged_fixes(), 1);
}

#[test]
fn update_count_policy_recalibrates_after_n_fixes() {
    let mut h = Harness::with_config(ArConfig {
        recalibration_update_count: Some(3),
        ..default()
    });
    h.spawn(1, ObjectKind::place(), offset(0.0, -50.0, 0.0));
    h.calibrate(origin(), 0.0);

    h.push_location(offset(0.0, -1.0, 0.0));
    h.push_location(offset(0.0, -2.0, 0.0));
    h.frame();
    assert_vec3_near(h.translation(1), Vec3::new(0.0, 0.0, -50.0), 0.05);

    h.push_location(offset(0.0, -3.0, 0.0));
    h.frame();
    assert_vec3_near(h.translation(1), Vec3::new(0.0, 0.0, -47.0), 0.05);
}

#[test]
fn reset_session_clears_objects_and_calibration() {
    let mut h = Harness::new();
    h.spawn(1, ObjectKind::default(), offset(0.0, -5.0, 0.0));
    h.spawn(2, ObjectKind::default(), offset(3.0, -5.0, 0.0));
    h.calibrate(origin(), 0.0);
    assert_eq!(h.world().resource::<ObjectTable>().len(), 2);

    h.send(ResetSession);
    h.frame();

    assert!(h.world().resource::<ObjectTable>().is_empty());
    assert!(h.object(1).is_none());
    assert_eq!(h.controller().phase(), CalibrationPhase::Uncalibrated);
    assert_eq!(h.engine_state(), EngineState::AwaitingFixes);
}

#[test]
fn rpc_drives_sensors_objects_and_status() {
    let mut h = Harness::new();
    h.rpc(r#"{"jsonrpc":"2.0","method":"location_update","params":{"latitude":32.782149,"longitude":-96.805218,"accuracy":5.0,"timestamp":10}}"#);
    h.rpc(r#"{"jsonrpc":"2.0","method":"heading_update","params":{"magnetic_heading":0.0,"timestamp":10}}"#);
    h.rpc(r#"{"jsonrpc":"2.0","method":"add_object","params":{"latitude":32.782598,"longitude":-96.805218,"kind":"sphere","name":"ahead"},"id":1}"#);
    h.frame();

    let replies = h.outbox();
    let added = replies.iter().find(|m| m["id"] == json!(1)).unwrap();
    let id = added["result"]["id"].as_u64().unwrap();

    // Fixes queued by RPC are drained at the start of the next frame
    h.frame();
    assert_eq!(h.engine_state(), EngineState::Calibrated);
    assert_abs_diff_eq!(h.translation(id).z, -50.0, epsilon = 0.5);

    let notifications = h.outbox();
    let status = notifications
        .iter()
        .find(|m| m["method"] == "calibration_state")
        .unwrap();
    assert_eq!(status["params"]["phase"], "calibrated");
    assert_eq!(status["params"]["engine_state"], "calibrated");

    h.rpc(r#"{"jsonrpc":"2.0","method":"get_calibration_status","id":2}"#);
    h.rpc(r#"{"jsonrpc":"2.0","method":"remove_object","params":{"id":999},"id":3}"#);
    h.rpc(r#"{"jsonrpc":"2.0","method":"spin","id":4}"#);
    h.frame();

    let replies = h.outbox();
    let by_id = |id: u64| replies.iter().find(|m| m["id"] == json!(id)).unwrap();
    assert_eq!(by_id(2)["result"]["has_heading"], true);
    assert_eq!(by_id(3)["error"]["code"], -32602);
    assert_eq!(by_id(4)["error"]["code"], -32601);
}

#[test]
fn add_object_at_heading_places_in_front_of_the_camera() {
    let mut h = Harness::new();
    h.calibrate(origin(), 90.0);

    h.rpc(r#"{"jsonrpc":"2.0","method":"add_object_at_heading","params":{"kind":"cone","distance_m":5.0},"id":1}"#);
    h.frame();

    let replies = h.outbox();
    let id = replies
        .iter()
        .find(|m| m["id"] == json!(1))
        .and_then(|m| m["result"]["id"].as_u64())
        .unwrap();
    assert_vec3_near(h.translation(id), Vec3::new(0.0, 0.0, -5.0), 0.01);

    // Heading 90° means the camera looks east
    let placed: GeoPoint = h.object(id).unwrap().origin;
    assert!(placed.longitude > origin().longitude);
    assert_abs_diff_eq!(placed.latitude, origin().latitude, epsilon = 1e-6);
}

#[test]
fn add_object_at_heading_before_calibration_is_rejected() {
    let mut h = Harness::new();
    h.rpc(r#"{"jsonrpc":"2.0","method":"add_object_at_heading","id":5}"#);
    h.frame();
    let replies = h.outbox();
    let reply = replies.iter().find(|m| m["id"] == json!(5)).unwrap();
    assert_eq!(reply["error"]["code"], -32602);
}

#[test]
fn same_id_twice_in_one_frame_is_rejected() {
    let mut h = Harness::new();
    h.calibrate(origin(), 0.0);
    h.rpc(r#"{"jsonrpc":"2.0","method":"add_object","params":{"latitude":32.782598,"longitude":-96.805218,"kind":"box","id":7},"id":1}"#);
    h.rpc(r#"{"jsonrpc":"2.0","method":"add_object","params":{"latitude":32.782700,"longitude":-96.805218,"kind":"box","id":7},"id":2}"#);
    h.frame();

    let replies = h.outbox();
    let by_id = |id: u64| replies.iter().find(|m| m["id"] == json!(id)).unwrap();
    assert_eq!(by_id(1)["result"]["success"], true);
    assert_eq!(by_id(2)["error"]["code"], -32602);
    assert_eq!(h.world().resource::<ObjectTable>().len(), 1);
}

#[test]
fn largest_object_id_is_rejected_without_crashing() {
    let mut h = Harness::new();
    h.rpc(r#"{"jsonrpc":"2.0","method":"add_object","params":{"latitude":32.782598,"longitude":-96.805218,"kind":"box","id":18446744073709551615},"id":1}"#);
    h.rpc(r#"{"jsonrpc":"2.0","method":"add_object","params":{"latitude":32.782598,"longitude":-96.805218,"kind":"box"},"id":2}"#);
    h.frame();

    let replies = h.outbox();
    let by_id = |id: u64| replies.iter().find(|m| m["id"] == json!(id)).unwrap();
    assert_eq!(by_id(1)["error"]["code"], -32602);
    assert_eq!(by_id(2)["result"]["id"], 0);
    assert_eq!(h.world().resource::<ObjectTable>().len(), 1);
}
