// SPDX-FileCopyrightText: 2025 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

use crate::gpsd_source::NO_FIX_MESSAGE;
use chrono::DateTime;
use common::{location_error::LocationError, position::Position};
use gpsd_proto::Tpv;
use std::str::FromStr;

fn parse(msg: &str) -> Tpv {
    serde_json::from_str::<Tpv>(msg).expect("Invalid TPV message")
}

#[test]
fn convert_fix_to_position() {
    let tpv = parse(
        r#"{"class":"TPV","time":"2005-06-08T10:34:48.283Z","lat":1.5,"lon":-2.5,"mode":3}"#,
    );
    let expected = Position::new(
        1.5,
        -2.5,
        DateTime::<chrono::Utc>::from_str("2005-06-08T10:34:48.283Z").unwrap(),
    );
    assert_eq!(crate::gpsd_source::convert_tpv(&tpv), Some(Ok(expected)));
}

#[test]
fn convert_no_fix_to_unavailable() {
    let tpv = parse(r#"{"class":"TPV","mode":1}"#);
    assert_eq!(
        crate::gpsd_source::convert_tpv(&tpv),
        Some(Err(LocationError::position_unavailable(NO_FIX_MESSAGE)))
    );
}

#[test]
fn ignore_fix_without_coordinates() {
    let tpv = parse(r#"{"class":"TPV","time":"2005-06-08T10:34:48.283Z","mode":2}"#);
    assert_eq!(crate::gpsd_source::convert_tpv(&tpv), None);
}
