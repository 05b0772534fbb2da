// SPDX-FileCopyrightText: 2025 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

use common::{location_error::LocationError, position::Position};
use module_core::EventKind;
use tracing::{debug, warn};

/// Text shown until the platform delivered anything.
pub const WAITING_TEXT: &str = "Waiting for location permission…";

/// What the display currently shows.
///
/// At most one of position and error is shown. The first error wins over
/// every later position or error: later errors are only logged and the
/// message on screen never changes once an error is shown. Consumers that
/// need every error follow the bus instead, like the WebSocket stream of the
/// REST module.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum DisplayState {
    /// Nothing delivered yet, the permission prompt may still be open.
    #[default]
    Waiting,
    /// The most recent position.
    Located(Position),
    /// The first error that was reported.
    Failed(LocationError),
}

impl DisplayState {
    /// Folds `kind` into the state.
    ///
    /// Returns `true` when the state changed.
    pub fn apply(&mut self, kind: &EventKind) -> bool {
        let next = match (&*self, kind) {
            (DisplayState::Failed(shown), EventKind::LocationErrorEvent(error)) => {
                warn!("Ignoring error \"{}\", already showing \"{}\"", error, shown);
                return false;
            }
            (DisplayState::Failed(_), EventKind::PositionEvent(_)) => {
                debug!("Ignoring position, an error is shown");
                return false;
            }
            (_, EventKind::PositionEvent(position)) => DisplayState::Located(**position),
            (_, EventKind::LocationErrorEvent(error)) => DisplayState::Failed((**error).clone()),
            _ => return false,
        };
        if *self == next {
            return false;
        }
        *self = next;
        true
    }

    /// Renders the state the way it is presented to the user.
    pub fn render(&self) -> String {
        match self {
            DisplayState::Waiting => WAITING_TEXT.to_string(),
            DisplayState::Failed(error) => format!("Error: {}", error.message()),
            DisplayState::Located(position) => format!(
                "Lat: {}\nLon: {}",
                position.latitude(),
                position.longitude()
            ),
        }
    }

    pub fn position(&self) -> Option<&Position> {
        match self {
            DisplayState::Located(position) => Some(position),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&LocationError> {
        match self {
            DisplayState::Failed(error) => Some(error),
            _ => None,
        }
    }
}
