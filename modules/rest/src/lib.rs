// SPDX-FileCopyrightText: 2026 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

//! REST Modul
//!
//! Serves the live position over HTTP: the current display state as JSON and
//! a WebSocket that streams every delivery of the platform.

mod live_position;
mod position;
mod serialize;

use async_trait::async_trait;
use display::DisplayState;
use module_core::{Event, EventKind, Module, ModuleCtx};
use rocket::routes;
use std::{
    net::{IpAddr, Ipv4Addr},
    sync::{Arc, RwLock},
    time::Duration,
};
use tokio::sync::broadcast;
use tracing::{error, info};

/// Address the REST server listens on.
#[derive(Clone, Debug, PartialEq)]
pub struct RestConfig {
    pub address: IpAddr,
    pub port: u16,
}

impl Default for RestConfig {
    fn default() -> Self {
        RestConfig {
            address: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 27015,
        }
    }
}

/// State shared with the request handlers.
pub(crate) struct RestCtx {
    /// What the display currently shows.
    pub state: Arc<RwLock<DisplayState>>,
    /// Used to subscribe every WebSocket connection to the bus.
    pub sender: broadcast::Sender<Event>,
}

pub struct Rest {
    ctx: ModuleCtx,
    config: RestConfig,
    state: Arc<RwLock<DisplayState>>,
}

impl Rest {
    pub fn new(ctx: ModuleCtx, config: RestConfig) -> Self {
        Rest {
            ctx,
            config,
            state: Arc::new(RwLock::new(DisplayState::default())),
        }
    }

    fn rocket(&self) -> rocket::Rocket<rocket::Build> {
        let config = rocket::Config {
            address: self.config.address,
            port: self.config.port,
            log_level: rocket::config::LogLevel::Off,
            shutdown: rocket::config::Shutdown {
                ctrlc: false,
                grace: 0,
                mercy: 0,
                ..Default::default()
            },
            ..rocket::Config::default()
        };
        let rest_ctx = RestCtx {
            state: self.state.clone(),
            sender: self.ctx.sender.clone(),
        };
        rocket::custom(config).manage(rest_ctx).mount(
            "/",
            routes![
                position::get_position,
                live_position::ws_live_position_handler
            ],
        )
    }
}

#[async_trait]
impl Module for Rest {
    async fn run(&mut self) -> Result<(), ()> {
        let rocket = self.rocket().ignite().await.map_err(|e| {
            error!("Failed to prepare the REST server. Error: {}", e);
        })?;
        let shutdown = rocket.shutdown();
        let mut server = tokio::spawn(async move { rocket.launch().await });
        info!(
            "REST module listening on {}:{}",
            self.config.address, self.config.port
        );

        loop {
            tokio::select! {
                event = self.ctx.receiver.recv() => {
                    match event {
                        Ok(event) => match event.kind {
                            EventKind::QuitEvent => break,
                            kind => {
                                self.state
                                    .write()
                                    .unwrap_or_else(|s| s.into_inner())
                                    .apply(&kind);
                            }
                        },
                        Err(broadcast::error::RecvError::Closed) => {
                            error!("Event bus closed");
                            break;
                        }
                        Err(e) => error!("Failed to receive event in module Rest. Error: {}", e),
                    }
                }
                result = &mut server => {
                    match result {
                        Ok(Err(e)) => error!("REST server failed. Error: {}", e),
                        Ok(Ok(_)) => error!("REST server stopped unexpectedly"),
                        Err(e) => error!("REST server task failed. Error: {}", e),
                    }
                    return Err(());
                }
            }
        }

        shutdown.notify();
        if tokio::time::timeout(Duration::from_millis(50), &mut server)
            .await
            .is_err()
        {
            server.abort();
        }
        info!("REST module stopped");
        Ok(())
    }
}
