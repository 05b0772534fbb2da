// SPDX-FileCopyrightText: 2026 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later


use chrono::DateTime;
use common::{location_error::LocationError, position::Position};
use module_core::{
    Event, EventBus, EventKind, LocationErrorPtr, PositionPtr, test_helper::stop_module,
};
use serde_json::json;
use serial_test::serial;
use test_utils::{create_module, wait_for_state};

#[tokio::test]
#[test_log::test]
#[serial]
async fn report_waiting_before_first_delivery() {
    let eb = EventBus::default();
    let mut rest = create_module(eb.context(), 27020).await;

    wait_for_state(27020, &json!({"state": "waiting"})).await;

    stop_module(&eb, &mut rest).await;
}

#[tokio::test]
#[test_log::test]
#[serial]
async fn report_latest_position() {
    let eb = EventBus::default();
    let mut rest = create_module(eb.context(), 27021).await;

    eb.publish(&Event {
        kind: EventKind::PositionEvent(PositionPtr::new(Position::new(
            33.8121,
            -117.919,
            DateTime::from_timestamp_millis(1_000).unwrap(),
        ))),
    });
    wait_for_state(
        27021,
        &json!({
            "state": "located",
            "position": {"latitude": 33.8121, "longitude": -117.919, "timestamp": 1000}
        }),
    )
    .await;

    stop_module(&eb, &mut rest).await;
}

#[tokio::test]
#[test_log::test]
#[serial]
async fn report_error_instead_of_position() {
    let eb = EventBus::default();
    let mut rest = create_module(eb.context(), 27022).await;

    eb.publish(&Event {
        kind: EventKind::LocationErrorEvent(LocationErrorPtr::new(
            LocationError::permission_denied("User denied Geolocation"),
        )),
    });
    eb.publish(&Event {
        kind: EventKind::PositionEvent(PositionPtr::new(Position::new(
            1.0,
            1.0,
            DateTime::from_timestamp_millis(1_000).unwrap(),
        ))),
    });
    wait_for_state(
        27022,
        &json!({
            "state": "failed",
            "error": {"code": 1, "message": "User denied Geolocation"}
        }),
    )
    .await;

    stop_module(&eb, &mut rest).await;
}
