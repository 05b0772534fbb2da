// SPDX-FileCopyrightText: 2025 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

//! Live position Modul
//!
//! Owns the single location watch of the display: asks the platform for the
//! current position once, keeps watching afterwards and releases the watch
//! again when the display is torn down.

use async_trait::async_trait;
use common::{location_error::LocationError, options::PositionOptions, position::Position};
use geolocation::{LocationPlatform, PositionUpdate, WatchId};
use module_core::{Event, EventKind, LocationErrorPtr, Module, ModuleCtx, PositionPtr};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info, warn};

/// What ends a subscription.
#[derive(Debug, PartialEq)]
enum Teardown {
    Quit,
    Resubscribe(PositionOptions),
}

/// A registered platform watch that is released exactly once.
///
/// [`Subscription::release`] consumes the subscription. A subscription that is
/// dropped without release (e.g. the module task got aborted) schedules the
/// release on the running runtime.
struct Subscription {
    platform: Arc<dyn LocationPlatform>,
    id: Option<WatchId>,
}

impl Subscription {
    fn new(platform: Arc<dyn LocationPlatform>, id: WatchId) -> Self {
        Subscription {
            platform,
            id: Some(id),
        }
    }

    async fn release(mut self) {
        if let Some(id) = self.id.take() {
            self.platform.clear_watch(id).await;
            info!("Released location watch {:?}", id);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let Some(id) = self.id.take() else {
            return;
        };
        let platform = self.platform.clone();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move { platform.clear_watch(id).await });
                warn!("Location watch {:?} released on drop", id);
            }
            Err(_) => error!("Location watch {:?} leaked, no runtime to release it", id),
        }
    }
}

/// The `LivePosition` module subscribes to the location platform and
/// publishes every delivery on the event bus.
///
/// Positions are published as [`EventKind::PositionEvent`], failures and a
/// missing platform as [`EventKind::LocationErrorEvent`]. Failures are
/// forwarded verbatim, nothing is retried.
pub struct LivePosition {
    ctx: ModuleCtx,
    platform: Option<Arc<dyn LocationPlatform>>,
    options: PositionOptions,
}

impl LivePosition {
    /// Creates the module.
    ///
    /// `platform` is `None` when the host has no location capability.
    pub fn new(
        ctx: ModuleCtx,
        platform: Option<Arc<dyn LocationPlatform>>,
        options: PositionOptions,
    ) -> Self {
        LivePosition {
            ctx,
            platform,
            options,
        }
    }

    fn publish_position(&self, position: Position) {
        debug!("Publishing position {:?}", position);
        let _ = self
            .ctx
            .publish_event(EventKind::PositionEvent(PositionPtr::new(position)));
    }

    fn publish_error(&self, error: LocationError) {
        warn!("Location error (code {}): {}", error.code(), error);
        let _ = self
            .ctx
            .publish_event(EventKind::LocationErrorEvent(LocationErrorPtr::new(error)));
    }

    /// Runs one subscription until quit or until the options change.
    async fn subscribe(&mut self, platform: &Arc<dyn LocationPlatform>) -> Teardown {
        info!("Requesting current position with {:?}", self.options);
        let current = tokio::select! {
            current = platform.current_position(&self.options) => current,
            teardown = next_teardown(&mut self.ctx.receiver, &self.options) => {
                info!("Current position request abandoned");
                return teardown;
            }
        };
        let position = match current {
            Ok(position) => position,
            Err(error) => {
                self.publish_error(error);
                return next_teardown(&mut self.ctx.receiver, &self.options).await;
            }
        };
        self.publish_position(position);

        let (consumer, mut updates) = mpsc::unbounded_channel::<PositionUpdate>();
        let subscription = match platform.watch_position(&self.options, consumer).await {
            Ok(id) => {
                info!("Watching location with watch {:?}", id);
                Subscription::new(platform.clone(), id)
            }
            Err(error) => {
                self.publish_error(error);
                return next_teardown(&mut self.ctx.receiver, &self.options).await;
            }
        };

        let mut feed_open = true;
        let teardown = loop {
            tokio::select! {
                update = updates.recv(), if feed_open => match update {
                    Some(Ok(position)) => self.publish_position(position),
                    Some(Err(error)) => self.publish_error(error),
                    None => {
                        info!("Location watch feed closed by the platform");
                        feed_open = false;
                    }
                },
                teardown = next_teardown(&mut self.ctx.receiver, &self.options) => break teardown,
            }
        };
        subscription.release().await;
        teardown
    }
}

/// Waits for the next event that ends the current subscription.
///
/// Options equal to `current` don't end it.
async fn next_teardown(
    receiver: &mut broadcast::Receiver<Event>,
    current: &PositionOptions,
) -> Teardown {
    loop {
        match receiver.recv().await {
            Ok(event) => match event.kind {
                EventKind::QuitEvent => return Teardown::Quit,
                EventKind::PositionOptionsEvent(options) if *options != *current => {
                    info!("Position options changed to {:?}", options);
                    return Teardown::Resubscribe((*options).clone());
                }
                _ => (),
            },
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                error!("Live position module lagged behind, {} events skipped", skipped);
            }
            Err(broadcast::error::RecvError::Closed) => {
                error!("Event bus closed");
                return Teardown::Quit;
            }
        }
    }
}

#[async_trait]
impl Module for LivePosition {
    async fn run(&mut self) -> Result<(), ()> {
        let Some(platform) = self.platform.clone() else {
            self.publish_error(LocationError::unsupported());
            loop {
                // No subscription to restart without a platform.
                if next_teardown(&mut self.ctx.receiver, &self.options).await == Teardown::Quit {
                    return Ok(());
                }
            }
        };
        loop {
            match self.subscribe(&platform).await {
                Teardown::Quit => break,
                Teardown::Resubscribe(options) => self.options = options,
            }
        }
        info!("Live position module stopped");
        Ok(())
    }
}
