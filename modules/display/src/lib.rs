// SPDX-FileCopyrightText: 2025 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

//! Display Modul
//!
//! Shows the most recent position or the first location error.

mod state;

pub use state::{DisplayState, WAITING_TEXT};

use async_trait::async_trait;
use module_core::{EventKind, Module, ModuleCtx};
use std::{
    io::{Stdout, Write},
    sync::{Arc, RwLock},
};
use tracing::{error, info};

/// Renders the live position to a text sink.
///
/// Every change of the [`DisplayState`] is written as a new rendering,
/// followed by an empty line.
///
/// # Type Parameters
/// - `W`: The sink the renderings are written to. Defaults to [`Stdout`].
pub struct Display<W: Write + Send = Stdout> {
    ctx: ModuleCtx,
    state: Arc<RwLock<DisplayState>>,
    out: W,
}

impl Display<Stdout> {
    /// Creates a display that renders to stdout.
    pub fn new(ctx: ModuleCtx) -> Self {
        Display::new_with_sink(ctx, std::io::stdout())
    }
}

impl<W: Write + Send> Display<W> {
    /// Creates a display that renders to `out`.
    pub fn new_with_sink(ctx: ModuleCtx, out: W) -> Self {
        Display {
            ctx,
            state: Arc::new(RwLock::new(DisplayState::default())),
            out,
        }
    }

    /// Shared handle to the state shown by this display.
    pub fn state(&self) -> Arc<RwLock<DisplayState>> {
        self.state.clone()
    }

    fn show(&mut self, rendering: &str) {
        if let Err(e) = writeln!(self.out, "{rendering}\n").and_then(|_| self.out.flush()) {
            error!("Failed to render the live position. Error: {e}");
        }
    }

    fn on_event(&mut self, kind: &EventKind) {
        let rendering = {
            let mut state = self.state.write().unwrap_or_else(|s| s.into_inner());
            if !state.apply(kind) {
                return;
            }
            state.render()
        };
        self.show(&rendering);
    }
}

#[async_trait]
impl<W: Write + Send> Module for Display<W> {
    async fn run(&mut self) -> Result<(), ()> {
        let initial = self
            .state
            .read()
            .unwrap_or_else(|s| s.into_inner())
            .render();
        self.show(&initial);
        info!("Display started");
        loop {
            match self.ctx.receiver.recv().await {
                Ok(event) => match event.kind {
                    EventKind::QuitEvent => break,
                    kind => self.on_event(&kind),
                },
                Err(tokio::sync::broadcast::error::RecvError::Closed) => {
                    error!("Event bus closed");
                    break;
                }
                Err(e) => error!("Failed to receive event in module Display. Error: {e}"),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests;
