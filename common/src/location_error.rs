// SPDX-FileCopyrightText: 2025 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

use serde::{Deserialize, Serialize};
use std::fmt;

/// Message used when the host has no location capability at all.
pub const UNSUPPORTED_MESSAGE: &str = "Geolocation not supported";

/// An error surfaced while acquiring or watching the location.
///
/// Every platform-reported failure carries the message of the platform
/// unchanged. The numeric codes follow the convention of the host location
/// API: 1 permission denied, 2 position unavailable, 3 timeout.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum LocationError {
    /// The host platform does not provide a location API.
    Unsupported,
    /// The user or the platform refused access to the location.
    PermissionDenied(String),
    /// The platform could not determine a position.
    PositionUnavailable(String),
    /// No position was acquired within the requested time.
    Timeout(String),
}

impl LocationError {
    pub const PERMISSION_DENIED: u16 = 1;
    pub const POSITION_UNAVAILABLE: u16 = 2;
    pub const TIMEOUT: u16 = 3;

    pub fn unsupported() -> Self {
        LocationError::Unsupported
    }

    pub fn permission_denied(message: impl Into<String>) -> Self {
        LocationError::PermissionDenied(message.into())
    }

    pub fn position_unavailable(message: impl Into<String>) -> Self {
        LocationError::PositionUnavailable(message.into())
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        LocationError::Timeout(message.into())
    }

    /// Builds an error from a platform error code and message.
    ///
    /// Codes the platform convention doesn't know are reported as
    /// [`LocationError::PositionUnavailable`].
    pub fn from_code(code: u16, message: impl Into<String>) -> Self {
        match code {
            Self::PERMISSION_DENIED => LocationError::PermissionDenied(message.into()),
            Self::TIMEOUT => LocationError::Timeout(message.into()),
            _ => LocationError::PositionUnavailable(message.into()),
        }
    }

    /// Returns the platform error code, `0` for [`LocationError::Unsupported`].
    pub fn code(&self) -> u16 {
        match self {
            LocationError::Unsupported => 0,
            LocationError::PermissionDenied(_) => Self::PERMISSION_DENIED,
            LocationError::PositionUnavailable(_) => Self::POSITION_UNAVAILABLE,
            LocationError::Timeout(_) => Self::TIMEOUT,
        }
    }

    /// Returns the message as reported by the platform.
    pub fn message(&self) -> &str {
        match self {
            LocationError::Unsupported => UNSUPPORTED_MESSAGE,
            LocationError::PermissionDenied(msg)
            | LocationError::PositionUnavailable(msg)
            | LocationError::Timeout(msg) => msg,
        }
    }
}

impl fmt::Display for LocationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

impl std::error::Error for LocationError {}
