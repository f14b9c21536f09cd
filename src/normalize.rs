//! Shaping of raw backend payloads into the entities the store caches.
//!
//! Dates are turned into `DD.MM.YYYY` display strings here. That conversion is
//! one-way: the form layer re-parses with [`parse_display_date`] explicitly.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use itertools::Itertools;
use tracing::warn;

use crate::error::{ApiError, Result};
use crate::model::{EventCard, EventDetail, LeaderboardEntry, RawEvent};

/// Shown instead of a date when the backend has none.
pub const DATE_PLACEHOLDER: &str = "Date not specified";

/// Shown instead of an empty event description.
pub const DESCRIPTION_PLACEHOLDER: &str = "No description.";

pub(crate) const DISPLAY_DATE_FORMAT: &str = "%d.%m.%Y";
const ISO_DATE_FORMAT: &str = "%Y-%m-%d";

/// Format a backend date (`YYYY-MM-DD` or an ISO datetime) for display.
///
/// Never fails: a missing or unreadable value yields [`DATE_PLACEHOLDER`].
pub fn format_date(raw: Option<&str>) -> String {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return DATE_PLACEHOLDER.to_string();
    };

    match parse_backend_date(raw) {
        Some(date) => date.format(DISPLAY_DATE_FORMAT).to_string(),
        None => {
            warn!(raw, "unreadable event date");
            DATE_PLACEHOLDER.to_string()
        }
    }
}

fn parse_backend_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, ISO_DATE_FORMAT)
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
        .or_else(|| raw.parse::<NaiveDateTime>().ok().map(|dt| dt.date()))
}

/// Parse a `DD.MM.YYYY` display date back into a calendar date.
pub fn parse_display_date(display: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(display.trim(), DISPLAY_DATE_FORMAT).map_err(|source| {
        ApiError::Date {
            input: display.to_string(),
            source,
        }
    })
}

/// Whether `display` is the placeholder rather than a real date.
pub fn is_placeholder_date(display: &str) -> bool {
    display == DATE_PLACEHOLDER
}

pub fn normalize_card(raw: RawEvent) -> EventCard {
    EventCard {
        id: raw.id,
        title: raw.title,
        is_team: raw.is_team,
        date: format_date(raw.date.as_deref()),
        state: raw.state,
        preview_url: raw.preview_url,
        leaderboard: raw.leaderboard.unwrap_or_default(),
    }
}

pub fn normalize_detail(raw: RawEvent) -> EventDetail {
    let description = raw
        .description
        .clone()
        .filter(|d| !d.trim().is_empty())
        .unwrap_or_else(|| DESCRIPTION_PLACEHOLDER.to_string());
    let media = raw
        .media
        .clone()
        .unwrap_or_default()
        .into_iter()
        .sorted_by_key(|m| m.order)
        .collect_vec();
    let activities = raw.activities.clone().unwrap_or_default();
    let (start_time, end_time, max_members, max_teams) =
        (raw.start_time, raw.end_time, raw.max_members, raw.max_teams);

    EventDetail {
        card: normalize_card(raw),
        description,
        media,
        start_time,
        end_time,
        max_members,
        max_teams,
        activities,
    }
}

/// Order a leaderboard by descending score; ties keep backend order.
pub fn rank_leaderboard(entries: Vec<LeaderboardEntry>) -> Vec<LeaderboardEntry> {
    entries
        .into_iter()
        .sorted_by(|a, b| b.score.cmp(&a.score))
        .collect_vec()
}
