// SPDX-FileCopyrightText: 2025 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

use crate::{LocationPlatform, PositionUpdate, WatchId};
use async_trait::async_trait;
use common::{location_error::LocationError, options::PositionOptions};
use std::{
    collections::{HashMap, VecDeque},
    sync::Mutex,
    time::Duration,
};
use tokio::sync::{mpsc::UnboundedSender, watch};

/// A [`LocationPlatform`] driven entirely by the test.
///
/// One-shot queries are answered from a script, queries without scripted
/// answer never complete. Watch deliveries are injected with
/// [`ScriptedPlatform::deliver`]. Every registration and release is counted.
pub struct ScriptedPlatform {
    answers: Mutex<VecDeque<PositionUpdate>>,
    watch_error: Mutex<Option<LocationError>>,
    watches: Mutex<HashMap<WatchId, UnboundedSender<PositionUpdate>>>,
    requested_options: Mutex<Vec<PositionOptions>>,
    cleared: Mutex<Vec<WatchId>>,
    registrations: watch::Sender<usize>,
    clears: watch::Sender<usize>,
    next_id: Mutex<u32>,
}

impl Default for ScriptedPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedPlatform {
    pub fn new() -> Self {
        ScriptedPlatform {
            answers: Mutex::new(VecDeque::new()),
            watch_error: Mutex::new(None),
            watches: Mutex::new(HashMap::new()),
            requested_options: Mutex::new(Vec::new()),
            cleared: Mutex::new(Vec::new()),
            registrations: watch::channel(0).0,
            clears: watch::channel(0).0,
            next_id: Mutex::new(1),
        }
    }

    /// Queues the answer for the next current position query.
    pub fn answer_current(&self, answer: PositionUpdate) -> &Self {
        self.answers.lock().unwrap().push_back(answer);
        self
    }

    /// Makes every following watch registration fail with `error`.
    pub fn fail_watch(&self, error: LocationError) -> &Self {
        *self.watch_error.lock().unwrap() = Some(error);
        self
    }

    /// Sends `update` to every active watch, returns the number of receivers.
    pub fn deliver(&self, update: PositionUpdate) -> usize {
        self.watches
            .lock()
            .unwrap()
            .values()
            .filter(|consumer| consumer.send(update.clone()).is_ok())
            .count()
    }

    /// Drops the consumers of every active watch without clearing them.
    pub fn close_feeds(&self) {
        for consumer in self.watches.lock().unwrap().values_mut() {
            let (closed, _) = tokio::sync::mpsc::unbounded_channel();
            *consumer = closed;
        }
    }

    pub fn active_watches(&self) -> Vec<WatchId> {
        self.watches.lock().unwrap().keys().copied().collect()
    }

    pub fn registration_count(&self) -> usize {
        *self.registrations.borrow()
    }

    pub fn cleared_watches(&self) -> Vec<WatchId> {
        self.cleared.lock().unwrap().clone()
    }

    /// Options of every current position query and watch registration, in call order.
    pub fn requested_options(&self) -> Vec<PositionOptions> {
        self.requested_options.lock().unwrap().clone()
    }

    /// Waits until at least `count` watches were registered.
    ///
    /// # Panics
    ///
    /// Panics when `timeout` elapses first.
    pub async fn wait_for_registrations(&self, count: usize, timeout: Duration) {
        let mut rx = self.registrations.subscribe();
        tokio::time::timeout(timeout, rx.wait_for(|c| *c >= count))
            .await
            .unwrap_or_else(|_| panic!("Less than {count} watches registered in {timeout:?}"))
            .unwrap();
    }

    /// Waits until at least `count` watches were cleared.
    ///
    /// # Panics
    ///
    /// Panics when `timeout` elapses first.
    pub async fn wait_for_clears(&self, count: usize, timeout: Duration) {
        let mut rx = self.clears.subscribe();
        tokio::time::timeout(timeout, rx.wait_for(|c| *c >= count))
            .await
            .unwrap_or_else(|_| panic!("Less than {count} watches cleared in {timeout:?}"))
            .unwrap();
    }
}

#[async_trait]
impl LocationPlatform for ScriptedPlatform {
    async fn current_position(&self, options: &PositionOptions) -> PositionUpdate {
        self.requested_options.lock().unwrap().push(options.clone());
        let answer = self.answers.lock().unwrap().pop_front();
        match answer {
            Some(answer) => answer,
            None => std::future::pending().await,
        }
    }

    async fn watch_position(
        &self,
        options: &PositionOptions,
        consumer: UnboundedSender<PositionUpdate>,
    ) -> Result<WatchId, LocationError> {
        self.requested_options.lock().unwrap().push(options.clone());
        if let Some(error) = self.watch_error.lock().unwrap().clone() {
            return Err(error);
        }
        let id = {
            let mut next_id = self.next_id.lock().unwrap();
            let id = WatchId(*next_id);
            *next_id += 1;
            id
        };
        self.watches.lock().unwrap().insert(id, consumer);
        self.registrations.send_modify(|c| *c += 1);
        Ok(id)
    }

    async fn clear_watch(&self, id: WatchId) {
        self.watches.lock().unwrap().remove(&id);
        self.cleared.lock().unwrap().push(id);
        self.clears.send_modify(|c| *c += 1);
    }
}
