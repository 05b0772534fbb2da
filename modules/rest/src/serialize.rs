// SPDX-FileCopyrightText: 2026 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

use common::{location_error::LocationError, position::Position};
use display::DisplayState;
use serde::Serialize;
use tracing::error;

#[derive(Serialize)]
struct ErrorData<'a> {
    code: u16,
    message: &'a str,
}

impl<'a> From<&'a LocationError> for ErrorData<'a> {
    fn from(error: &'a LocationError) -> Self {
        ErrorData {
            code: error.code(),
            message: error.message(),
        }
    }
}

#[derive(Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
enum StateView<'a> {
    Waiting,
    Located { position: &'a Position },
    Failed { error: ErrorData<'a> },
}

#[derive(Serialize)]
struct LiveEvent<'a, T: Serialize> {
    event: &'a str,
    data: T,
}

fn to_json<T: Serialize>(value: &T, what: &str) -> String {
    match serde_json::to_string(value) {
        Ok(json) => json,
        Err(e) => {
            error!("Failed to serialize {}: {}", what, e);
            "{}".to_string()
        }
    }
}

/// Serializes the display state, e.g. `{"state":"located","position":{..}}`.
pub(crate) fn serialize_state(state: &DisplayState) -> String {
    let view = match state {
        DisplayState::Waiting => StateView::Waiting,
        DisplayState::Located(position) => StateView::Located { position },
        DisplayState::Failed(error) => StateView::Failed {
            error: error.into(),
        },
    };
    to_json(&view, "display state")
}

/// Serializes a `position` event for the live stream.
pub(crate) fn serialize_position_event(position: &Position) -> String {
    let event = LiveEvent {
        event: "position",
        data: position,
    };
    to_json(&event, "position event")
}

/// Serializes an `error` event for the live stream.
pub(crate) fn serialize_error_event(error: &LocationError) -> String {
    let event = LiveEvent {
        event: "error",
        data: ErrorData::from(error),
    };
    to_json(&event, "error event")
}
