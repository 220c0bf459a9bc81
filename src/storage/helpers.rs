// Book Diary - personal reading log
// Copyright (C) 2025 Book Diary contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

//! Encode/decode helpers between record fields and SQLite columns

use crate::error::{DiaryError, Result};
use chrono::NaiveDate;

/// Stored date format (ISO 8601 calendar date)
pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn encode_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Parse a stored date, naming the column in the error
pub fn decode_date(column: &str, text: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(text, DATE_FORMAT).map_err(|e| {
        DiaryError::invalid_data(format!("Column '{}' holds '{}': {}", column, text, e))
    })
}

/// Parse a nullable stored date; SQL NULL and `''` both mean "no date"
pub fn decode_optional_date(column: &str, text: Option<String>) -> Result<Option<NaiveDate>> {
    match text.as_deref() {
        None | Some("") => Ok(None),
        Some(text) => decode_date(column, text).map(Some),
    }
}

pub fn encode_flag(flag: bool) -> i64 {
    if flag {
        1
    } else {
        0
    }
}

/// Only `1` is true; anything else a foreign writer left behind is false
pub fn decode_flag(value: i64) -> bool {
    value == 1
}

/// `LIKE` pattern matching every ISO date in `year`
pub fn year_pattern(year: i32) -> String {
    format!("{:04}-%", year)
}

/// `LIKE` pattern matching every ISO date in `month` of `year`
pub fn month_pattern(year: i32, month: u32) -> String {
    format!("{:04}-{:02}-%", year, month)
}
