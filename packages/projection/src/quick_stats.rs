//! Summary figures for the current level.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::error::Result;
use crate::intervals::{IntervalTable, Pace};
use crate::sanitize::add_millis;
use crate::simulator::LevelUpEstimate;
use crate::stats::days_to_millis;
use crate::types::{LevelProjection, SeriesKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DayHours {
    pub days: i64,
    pub hours: i64,
}

impl DayHours {
    pub fn from_duration(duration: Duration) -> Self {
        let duration = if duration < Duration::zero() { -duration } else { duration };
        Self {
            days: duration.num_days(),
            hours: duration.num_hours() % 24,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuickStats {
    pub current_level: u32,
    pub level_started_at: DateTime<Utc>,
    pub time_on_level: DayHours,
    pub likely_level_up_at: Option<DateTime<Utc>>,
    pub fastest_level_up_at: DateTime<Utc>,
}

/// The current level starts when the previous recorded level completed. If
/// that level is missing, the earliest point in the timeline is used. When a
/// level was recorded more than once, the latest record wins.
///
/// `likely_level_up_at` is `None` without rates or when it falls outside the
/// representable time range.
pub fn quick_stats(
    projection: &LevelProjection,
    estimate: &LevelUpEstimate,
    intervals: &IntervalTable,
    now: DateTime<Utc>,
) -> Result<Option<QuickStats>> {
    let current_level = projection.current_level;
    let previous = projection
        .series(SeriesKind::Recorded)
        .filter(|p| p.level == Some(current_level.saturating_sub(1)))
        .last()
        .or_else(|| projection.formatted_data_with_projections.first());
    let Some(previous) = previous else {
        return Ok(None);
    };

    let level_started_at = if previous.is_completed() {
        previous.completed_at
    } else {
        previous.started_at
    };

    let likely_level_up_at = projection.rates.and_then(|rates| {
        let days = match intervals.pace_for(current_level) {
            Pace::Normal => rates.median.normal,
            Pace::Accelerated => rates.median.accelerated,
        };
        add_millis("likely_level_up_at", level_started_at, days_to_millis(days)).ok()
    });

    Ok(Some(QuickStats {
        current_level,
        level_started_at,
        time_on_level: DayHours::from_duration(now - level_started_at),
        likely_level_up_at,
        fastest_level_up_at: estimate.completes_at(now)?,
    }))
}
