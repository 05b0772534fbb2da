// SPDX-FileCopyrightText: 2026 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

use crate::RestCtx;
use crate::serialize::{serialize_error_event, serialize_position_event};
use display::DisplayState;
use module_core::EventKind;
use rand::{Rng, distr::Alphanumeric, rng};
use rocket::futures::{StreamExt, TryStreamExt};
use rocket::{State, get};
use rocket_ws::Message;
use tracing::{error, info};

/// WebSocket handler that streams the live position to clients.
///
/// Route: GET /v1/live_position
/// Sends the currently shown position or error first, afterwards every
/// "position" and "error" delivery as Message::Text. Terminates on QuitEvent,
/// client close or errors.
#[get("/v1/live_position")]
pub(crate) fn ws_live_position_handler(
    ws: rocket_ws::WebSocket,
    ctx: &State<RestCtx>,
) -> rocket_ws::Stream!['static] {
    let mut event_receiver = ctx.sender.subscribe();
    let snapshot = ctx
        .state
        .read()
        .unwrap_or_else(|s| s.into_inner())
        .clone();
    rocket_ws::Stream! { ws =>
        let mut stream_ws = ws.into_stream();
        let connection_id = generate_connection_id();
        info!("WebSocket \"/v1/live_position\" connection {} established", connection_id);

        match snapshot {
            DisplayState::Located(position) => yield Message::Text(serialize_position_event(&position)),
            DisplayState::Failed(error) => yield Message::Text(serialize_error_event(&error)),
            DisplayState::Waiting => (),
        }

        loop {
            let message = tokio::select! {
                event = event_receiver.recv() => {
                    match event {
                        Ok(event) => match event.kind {
                            EventKind::QuitEvent => {
                                info!("Closing WebSocket connection {} due to QuitEvent", connection_id);
                                break;
                            }
                            EventKind::PositionEvent(position) => serialize_position_event(&position),
                            EventKind::LocationErrorEvent(error) => serialize_error_event(&error),
                            _ => continue,
                        },
                        Err(e) => {
                            error!("Error receiving event in WebSocket live position handler: {}", e);
                            break;
                        }
                    }
                }
                Some(msg) = stream_ws.next() => {
                    match msg {
                        Ok(Message::Close(_)) => {
                            info!("WebSocket client {} disconnected", connection_id);
                            break;
                        }
                        Ok(_) => continue,
                        Err(e) => {
                            error!("WebSocket error: {}", e);
                            break;
                        }
                    }
                }
            };
            yield Message::Text(message);
        }
    }
}

/// Generates a random alphanumeric connection ID of length 16.
///
/// Used to tell connections apart in the logs.
pub fn generate_connection_id() -> String {
    rng()
        .sample_iter(&Alphanumeric)
        .take(16)
        .map(char::from)
        .collect()
}
