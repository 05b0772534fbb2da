// SPDX-FileCopyrightText: 2025 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

use crate::serde::timestamp;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Represents a location fix reported by the host platform.
///
/// The `Position` struct stores a point on Earth in decimal degrees together
/// with the time the platform acquired it. Latitude values range from -90.0
/// to 90.0, and longitude values range from -180.0 to 180.0.
///
/// The timestamp is (de)serialized as milliseconds since the unix epoch.
///
/// # Example
///
/// ```rust
/// use common::position::Position;
///
/// let pos = Position::new(33.8121, -117.9190, chrono::Utc::now());
/// println!("{:?}", pos);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Position {
    latitude: f64,
    longitude: f64,
    #[serde(with = "timestamp")]
    timestamp: DateTime<Utc>,
}

impl Position {
    /// Creates a new [`Position`] with the specified latitude, longitude and timestamp.
    ///
    /// # Arguments
    ///
    /// * `latitude` – Latitude in decimal degrees. Positive for northern hemisphere.
    /// * `longitude` – Longitude in decimal degrees. Positive for eastern hemisphere.
    /// * `timestamp` – Time of the fix in UTC.
    pub fn new(latitude: f64, longitude: f64, timestamp: DateTime<Utc>) -> Position {
        Position {
            latitude,
            longitude,
            timestamp,
        }
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Returns the latitude in decimal degrees.
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Returns the longitude in decimal degrees.
    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Returns the time the platform acquired this position.
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// A plain geographical coordinate in decimal degrees without a fix time.
///
/// Used to describe the points a replaying source walks through.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Coordinate {
            latitude,
            longitude,
        }
    }

    /// Stamps the coordinate with `timestamp` and turns it into a [`Position`].
    pub fn at(&self, timestamp: DateTime<Utc>) -> Position {
        Position::new(self.latitude, self.longitude, timestamp)
    }
}
