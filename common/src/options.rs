// SPDX-FileCopyrightText: 2025 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

use crate::serde::duration_ms;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Options passed to the platform with every position request and watch.
///
/// The defaults ask for the most accurate fix the platform can deliver,
/// wait without limit and never accept a cached position.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionOptions {
    pub enable_high_accuracy: bool,
    #[serde(with = "duration_ms::option")]
    pub timeout: Option<Duration>,
    #[serde(with = "duration_ms")]
    pub maximum_age: Duration,
}

impl Default for PositionOptions {
    fn default() -> Self {
        PositionOptions {
            enable_high_accuracy: true,
            timeout: None,
            maximum_age: Duration::ZERO,
        }
    }
}

impl PositionOptions {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_maximum_age(mut self, maximum_age: Duration) -> Self {
        self.maximum_age = maximum_age;
        self
    }

    pub fn with_high_accuracy(mut self, enable: bool) -> Self {
        self.enable_high_accuracy = enable;
        self
    }
}
