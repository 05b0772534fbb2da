// SPDX-FileCopyrightText: 2025 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

use chrono::Utc;
use common::{location_error::LocationError, position::Position};
use display::{Display, DisplayState, WAITING_TEXT};
use module_core::{
    Event, EventBus, EventKind, LocationErrorPtr, Module, PositionPtr, test_helper::stop_module,
};
use std::{
    io::Write,
    sync::{Arc, Mutex, RwLock},
    time::Duration,
};
use tokio::task::JoinHandle;

#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    fn text(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

fn start_display(eb: &EventBus) -> (JoinHandle<Result<(), ()>>, SharedBuffer, Arc<RwLock<DisplayState>>) {
    let buffer = SharedBuffer::default();
    let mut display = Display::new_with_sink(eb.context(), buffer.clone());
    let state = display.state();
    let handle = tokio::spawn(async move { display.run().await });
    (handle, buffer, state)
}

async fn wait_until(buffer: &SharedBuffer, expected: &str) {
    for _ in 0..20 {
        if buffer.text().contains(expected) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("\"{expected}\" not rendered. Output: {}", buffer.text());
}

#[tokio::test]
#[test_log::test]
async fn render_waiting_then_position() {
    let eb = EventBus::default();
    let (mut handle, buffer, state) = start_display(&eb);
    wait_until(&buffer, WAITING_TEXT).await;

    eb.publish(&Event {
        kind: EventKind::PositionEvent(PositionPtr::new(Position::new(
            33.8121,
            -117.919,
            Utc::now(),
        ))),
    });
    wait_until(&buffer, "Lat: 33.8121\nLon: -117.919").await;
    assert_eq!(
        state.read().unwrap().position().map(|p| p.longitude()),
        Some(-117.919)
    );

    stop_module(&eb, &mut handle).await;
}

#[tokio::test]
#[test_log::test]
async fn render_error() {
    let eb = EventBus::default();
    let (mut handle, buffer, state) = start_display(&eb);
    wait_until(&buffer, WAITING_TEXT).await;

    eb.publish(&Event {
        kind: EventKind::LocationErrorEvent(LocationErrorPtr::new(LocationError::unsupported())),
    });
    wait_until(&buffer, "Error: Geolocation not supported").await;
    assert_eq!(
        *state.read().unwrap(),
        DisplayState::Failed(LocationError::unsupported())
    );

    stop_module(&eb, &mut handle).await;
}

#[tokio::test]
#[test_log::test]
async fn render_only_changes() {
    let eb = EventBus::default();
    let (mut handle, buffer, _) = start_display(&eb);
    wait_until(&buffer, WAITING_TEXT).await;

    let position = PositionPtr::new(Position::new(1.0, 2.0, Utc::now()));
    for _ in 0..3 {
        eb.publish(&Event {
            kind: EventKind::PositionEvent(position.clone()),
        });
    }
    wait_until(&buffer, "Lat: 1\nLon: 2").await;
    stop_module(&eb, &mut handle).await;

    assert_eq!(buffer.text().matches("Lat: 1").count(), 1);
}
