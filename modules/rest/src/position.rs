// SPDX-FileCopyrightText: 2026 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

use crate::{RestCtx, serialize::serialize_state};
use rocket::{State, get, response::content::RawJson};

/// Returns what the display currently shows.
///
/// Route: GET /v1/position
#[get("/v1/position")]
pub(crate) fn get_position(ctx: &State<RestCtx>) -> RawJson<String> {
    let state = ctx.state.read().unwrap_or_else(|s| s.into_inner());
    RawJson(serialize_state(&state))
}
