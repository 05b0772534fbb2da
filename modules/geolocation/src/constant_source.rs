// SPDX-FileCopyrightText: 2025 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

use crate::{LocationPlatform, PositionUpdate, WatchId, feed::PositionFeed};
use async_trait::async_trait;
use chrono::Utc;
use common::{location_error::LocationError, options::PositionOptions, position::Coordinate};
use std::{
    io::{Error, ErrorKind},
    sync::Arc,
    time::Duration,
};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info};

/// A location source that replays a fixed list of coordinates in a constant frequency.
///
/// After the last coordinate the replay starts again with the first one.
/// Every delivered position is stamped with the wall clock.
pub struct ConstantSource {
    feed: Arc<PositionFeed>,
    task: tokio::task::JoinHandle<()>,
}

struct ConstantSourceRuntime {
    coordinates: Vec<Coordinate>,
    next_coordinate: usize,
    feed: Arc<PositionFeed>,
}

impl ConstantSourceRuntime {
    fn handle_tick(&mut self) {
        let coordinate = self.coordinates[self.next_coordinate];
        self.next_coordinate = (self.next_coordinate + 1) % self.coordinates.len();
        debug!("Replaying coordinate {:?}", coordinate);
        self.feed.publish(Ok(coordinate.at(Utc::now())));
    }
}

impl ConstantSource {
    /// Creates the source and starts the replay.
    ///
    /// Must be called within a tokio runtime.
    ///
    /// # Returns
    ///
    /// * `Err(io::Error)` - If `coordinates` is empty or `interval` is zero.
    pub fn new(coordinates: &[Coordinate], interval: Duration) -> Result<Self, Error> {
        if coordinates.is_empty() {
            return Err(Error::new(
                ErrorKind::InvalidData,
                "coordinates parameter is empty",
            ));
        }
        if interval.is_zero() {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "replay interval must not be zero",
            ));
        }
        let feed = Arc::new(PositionFeed::new());
        let mut runtime = ConstantSourceRuntime {
            coordinates: coordinates.to_vec(),
            next_coordinate: 0,
            feed: feed.clone(),
        };
        info!(
            "Replaying {} coordinates every {:?}",
            coordinates.len(),
            interval
        );
        let task = tokio::spawn(async move {
            let mut timer = tokio::time::interval(interval);
            loop {
                timer.tick().await;
                runtime.handle_tick();
            }
        });
        Ok(ConstantSource { feed, task })
    }
}

#[async_trait]
impl LocationPlatform for ConstantSource {
    async fn current_position(&self, options: &PositionOptions) -> PositionUpdate {
        self.feed.next_position(options).await
    }

    async fn watch_position(
        &self,
        _options: &PositionOptions,
        consumer: UnboundedSender<PositionUpdate>,
    ) -> Result<WatchId, LocationError> {
        let id = self.feed.watch(consumer)?;
        debug!("Registered watch {:?}", id);
        Ok(id)
    }

    async fn clear_watch(&self, id: WatchId) {
        if self.feed.clear(id) {
            debug!("Cleared watch {:?}", id);
        }
    }
}

impl Drop for ConstantSource {
    fn drop(&mut self) {
        self.task.abort();
    }
}
