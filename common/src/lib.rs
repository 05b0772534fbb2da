// SPDX-FileCopyrightText: 2025 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

//! Common Modul for the live position display
//!
//! Provides the common data types that are used across every modul.

pub mod location_error;
pub mod options;
pub mod position;
pub mod serde;

#[cfg(test)]
mod tests;
