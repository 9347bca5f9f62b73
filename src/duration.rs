//! Live-timer computation: elapsed time strings and the urgency colour a
//! waiting lorry implies. Everything here is pure and total: malformed
//! timestamps and clocks that run backwards degrade to a fallback display
//! instead of panicking.

use chrono::DateTime;
use serde::{Deserialize, Serialize};

use crate::model::Collection;
use crate::status::CollectionStatus;

/// Shown when an interval cannot be computed.
pub const FALLBACK_DISPLAY: &str = "--:--:--";

const MS_PER_HOUR: f64 = 3_600_000.0;

/// How long a collection has been sitting, bucketed for the dashboard.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum UrgencyColor {
    #[default]
    Green,
    Yellow,
    Red,
}

impl UrgencyColor {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Green => "green",
            Self::Yellow => "yellow",
            Self::Red => "red",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElapsedDisplay {
    pub time: String,
    pub color: UrgencyColor,
}

impl ElapsedDisplay {
    #[must_use]
    pub fn fallback() -> Self {
        Self {
            time: FALLBACK_DISPLAY.to_string(),
            color: UrgencyColor::Green,
        }
    }
}

/// Epoch milliseconds for an ISO-8601 timestamp, `None` when unparseable.
#[must_use]
pub fn parse_iso_ms(iso: &str) -> Option<i64> {
    DateTime::parse_from_rfc3339(iso)
        .ok()
        .map(|dt| dt.timestamp_millis())
}

/// Zero-padded `HH:MM:SS`; negative inputs clamp to zero.
#[must_use]
pub fn format_hms(elapsed_ms: i64) -> String {
    let total_seconds = elapsed_ms.max(0) / 1000;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

/// Urgency thresholds compare the fractional hour value, so 61 minutes is
/// already past the green boundary.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn classify(elapsed_ms: i64) -> UrgencyColor {
    let hours = elapsed_ms.max(0) as f64 / MS_PER_HOUR;
    if hours <= 1.0 {
        UrgencyColor::Green
    } else if hours < 2.0 {
        UrgencyColor::Yellow
    } else {
        UrgencyColor::Red
    }
}

/// Elapsed wall-clock time since `start_iso` with its urgency colour.
///
/// An unparseable start, or a `now_ms` before the start, yields the clamped
/// fallback with the lowest urgency. Never an error, never a negative
/// duration.
#[must_use]
pub fn elapsed_since(start_iso: &str, now_ms: i64) -> ElapsedDisplay {
    let Some(start_ms) = parse_iso_ms(start_iso) else {
        return ElapsedDisplay::fallback();
    };
    if now_ms < start_ms {
        return ElapsedDisplay::fallback();
    }
    let elapsed = now_ms - start_ms;
    ElapsedDisplay {
        time: format_hms(elapsed),
        color: classify(elapsed),
    }
}

/// Milliseconds spent inside the current checkpoint only (not since
/// check-in). `None` when the collection's timestamps are inconsistent with
/// its status.
#[must_use]
pub fn checkpoint_elapsed_ms(collection: &Collection, now_ms: i64) -> Option<i64> {
    let checked_in = collection.checked_in_at.as_deref().and_then(parse_iso_ms)?;
    let started = collection
        .started_loading_at
        .as_deref()
        .and_then(parse_iso_ms);
    let finished = collection
        .finished_loading_at
        .as_deref()
        .and_then(parse_iso_ms);
    let checked_out = collection.checked_out_at.as_deref().and_then(parse_iso_ms);

    let elapsed = match collection.current_status {
        CollectionStatus::CheckedIn => started.unwrap_or(now_ms) - checked_in,
        CollectionStatus::Loading => finished.unwrap_or(now_ms) - started?,
        CollectionStatus::Loaded => checked_out.unwrap_or(now_ms) - finished?,
        CollectionStatus::CheckedOut => checked_out? - finished?,
    };
    Some(elapsed.max(0))
}

/// `"HH:MM:SS"` spent in the current checkpoint, or `"--:--:--"` when the
/// interval is unknown. Stateless: callers re-evaluate on every tick for a
/// live display.
#[must_use]
pub fn time_spent_in_current_status(collection: &Collection, now_ms: i64) -> String {
    checkpoint_elapsed_ms(collection, now_ms).map_or_else(|| FALLBACK_DISPLAY.to_string(), format_hms)
}

/// The urgency implied by the time spent in the current checkpoint.
#[must_use]
pub fn status_urgency(collection: &Collection, now_ms: i64) -> UrgencyColor {
    checkpoint_elapsed_ms(collection, now_ms).map_or(UrgencyColor::Green, classify)
}
