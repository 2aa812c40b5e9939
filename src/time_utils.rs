// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for check-in timestamps.

use chrono::{DateTime, SecondsFormat, Utc};

/// Format a UTC timestamp the way check-ins are stored:
/// RFC3339 with milliseconds and a `Z` suffix.
pub fn iso_timestamp(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Validate a client-supplied check-in timestamp, returning it unchanged.
///
/// The stored string must match exactly for later removal, so it is not
/// re-formatted.
pub fn parse_check_in(raw: &str) -> Option<&str> {
    DateTime::parse_from_rfc3339(raw).ok().map(|_| raw)
}

/// Human-readable check-in, e.g. `January 01, 2024 12:00 AM`.
pub fn display_check_in(raw: &str) -> String {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(date) => date
            .with_timezone(&Utc)
            .format("%B %d, %Y %I:%M %p")
            .to_string(),
        Err(_) => {
            tracing::warn!(value = raw, "Invalid check-in date");
            "Invalid date".to_string()
        }
    }
}
