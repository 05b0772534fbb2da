// SPDX-FileCopyrightText: 2025 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

use crate::{PositionUpdate, WatchId};
use chrono::Utc;
use common::{location_error::LocationError, options::PositionOptions, position::Position};
use std::{
    collections::HashMap,
    sync::{
        Mutex, MutexGuard,
        atomic::{AtomicU32, Ordering},
    },
};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::debug;

#[derive(Default)]
struct FeedState {
    watches: HashMap<WatchId, UnboundedSender<PositionUpdate>>,
    last_fix: Option<Position>,
    closed: Option<LocationError>,
}

/// Fan out of the deliveries of a source.
///
/// Keeps the registered watches and the last fix for cached answers.
/// One-shot queries register a watch of their own for as long as they wait.
pub(crate) struct PositionFeed {
    state: Mutex<FeedState>,
    next_id: AtomicU32,
}

/// Watch of a pending one-shot query, removed when the query ends or is dropped.
struct QueryWatch<'a> {
    feed: &'a PositionFeed,
    id: WatchId,
    updates: UnboundedReceiver<PositionUpdate>,
}

impl Drop for QueryWatch<'_> {
    fn drop(&mut self) {
        self.feed.clear(self.id);
    }
}

impl PositionFeed {
    pub fn new() -> Self {
        PositionFeed {
            state: Mutex::new(FeedState::default()),
            next_id: AtomicU32::new(1),
        }
    }

    fn lock(&self) -> MutexGuard<'_, FeedState> {
        self.state.lock().unwrap_or_else(|s| s.into_inner())
    }

    /// Delivers `update` to every watch, pending one-shot queries included.
    ///
    /// Watches whose consumer is gone are dropped.
    pub fn publish(&self, update: PositionUpdate) {
        let mut state = self.lock();
        if state.closed.is_some() {
            return;
        }
        if let Ok(position) = &update {
            state.last_fix = Some(*position);
        }
        state.watches.retain(|id, consumer| {
            let delivered = consumer.send(update.clone()).is_ok();
            if !delivered {
                debug!("Dropping watch {:?}, consumer is gone", id);
            }
            delivered
        });
    }

    /// Ends the feed. Every watch receives `error` as last delivery and is removed.
    ///
    /// Later watches are refused with `error`.
    pub fn close(&self, error: LocationError) {
        let mut state = self.lock();
        for (_, consumer) in state.watches.drain() {
            let _ = consumer.send(Err(error.clone()));
        }
        state.closed = Some(error);
    }

    pub fn watch(
        &self,
        consumer: UnboundedSender<PositionUpdate>,
    ) -> Result<WatchId, LocationError> {
        let mut state = self.lock();
        if let Some(error) = &state.closed {
            return Err(error.clone());
        }
        let id = WatchId(self.next_id.fetch_add(1, Ordering::Relaxed));
        state.watches.insert(id, consumer);
        Ok(id)
    }

    /// Removes the watch, returns `false` when `id` isn't registered.
    pub fn clear(&self, id: WatchId) -> bool {
        self.lock().watches.remove(&id).is_some()
    }

    #[cfg(test)]
    pub fn watch_count(&self) -> usize {
        self.lock().watches.len()
    }

    /// Answers a one-shot position query.
    ///
    /// A cached fix younger than `options.maximum_age` answers immediately.
    /// Otherwise waits for the next fix; deliveries without fix are skipped.
    /// Fails with [`LocationError::Timeout`] when `options.timeout` elapses.
    pub async fn next_position(&self, options: &PositionOptions) -> PositionUpdate {
        if let Some(fix) = self.cached_fix(options) {
            return Ok(fix);
        }
        let (consumer, updates) = mpsc::unbounded_channel();
        let mut query = QueryWatch {
            feed: self,
            id: self.watch(consumer)?,
            updates,
        };
        let wait = async {
            loop {
                match query.updates.recv().await {
                    Some(Ok(position)) => return Ok(position),
                    Some(Err(LocationError::PositionUnavailable(msg))) => {
                        debug!("Still waiting for a fix: {}", msg);
                    }
                    Some(Err(error)) => return Err(error),
                    None => {
                        return Err(self.closed().unwrap_or_else(|| {
                            LocationError::position_unavailable("Position source stopped")
                        }));
                    }
                }
            }
        };
        match options.timeout {
            Some(timeout) => tokio::time::timeout(timeout, wait)
                .await
                .unwrap_or_else(|_| Err(LocationError::timeout("Timeout expired"))),
            None => wait.await,
        }
    }

    fn closed(&self) -> Option<LocationError> {
        self.lock().closed.clone()
    }

    fn cached_fix(&self, options: &PositionOptions) -> Option<Position> {
        if options.maximum_age.is_zero() {
            return None;
        }
        let state = self.lock();
        if state.closed.is_some() {
            return None;
        }
        let fix = state.last_fix?;
        let age = (Utc::now() - fix.timestamp()).to_std().unwrap_or_default();
        (age <= options.maximum_age).then_some(fix)
    }
}
