// SPDX-FileCopyrightText: 2025 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

//! Geolocation Modul for the live position display
//!
//! Provides the interface of the host location API and the sources that
//! implement it on linux based systems.

use async_trait::async_trait;
use common::{location_error::LocationError, options::PositionOptions, position::Position};
use tokio::sync::mpsc::UnboundedSender;

mod feed;

pub mod constant_source;
pub mod gpsd_source;
pub mod test_helper;

/// A single delivery of a watch: either a new position or a failure.
pub type PositionUpdate = Result<Position, LocationError>;

/// Handle of a registered watch, returned by [`LocationPlatform::watch_position`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WatchId(pub u32);

/// Common interface of the host location API.
///
/// A missing location capability is not a platform, it is expressed as the
/// absence of one (`Option<Arc<dyn LocationPlatform>>`).
#[async_trait]
pub trait LocationPlatform: Send + Sync {
    /// Queries the current position once.
    ///
    /// May trigger the permission prompt of the platform.
    async fn current_position(&self, options: &PositionOptions) -> PositionUpdate;

    /// Registers a continuous watch.
    ///
    /// Every delivery of the platform is sent to `consumer` in the order the
    /// platform produces them. The watch stays registered after failures.
    /// A source that stopped for good refuses new watches with its final error.
    async fn watch_position(
        &self,
        options: &PositionOptions,
        consumer: UnboundedSender<PositionUpdate>,
    ) -> Result<WatchId, LocationError>;

    /// Deregisters the watch `id`. Unknown ids are ignored.
    async fn clear_watch(&self, id: WatchId);
}

#[cfg(test)]
mod tests;
