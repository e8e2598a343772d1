//! Forward projection of the recorded timeline up to the last level.

use crate::error::Result;
use crate::intervals::{IntervalTable, Pace};
use crate::sanitize::add_millis;
use crate::stats::days_to_millis;
use crate::types::{ChartPoint, LevelPace, ProjectionRates, SeriesKind};

/// Extend `seed` one level at a time through `max_level`. Each level starts
/// when the previous one completes and lasts the pace for that level's
/// classification. The seed itself is not part of the output.
///
/// Fails with [`EngineError::TimeOutOfRange`](crate::error::EngineError::TimeOutOfRange)
/// when a projected completion cannot be represented.
pub fn project_series(
    seed: &ChartPoint,
    seed_level: u32,
    kind: SeriesKind,
    pace: LevelPace,
    intervals: &IntervalTable,
    max_level: u32,
) -> Result<Vec<ChartPoint>> {
    let mut series = Vec::with_capacity(max_level.saturating_sub(seed_level) as usize);
    let mut previous_completed = seed.completed_at;

    for level in (seed_level + 1)..=max_level {
        let days = match intervals.pace_for(level) {
            Pace::Normal => pace.normal,
            Pace::Accelerated => pace.accelerated,
        };
        let completed_at = add_millis("completed_at", previous_completed, days_to_millis(days))?;
        series.push(ChartPoint {
            level: Some(level),
            timestamp: completed_at.timestamp_millis(),
            started_at: previous_completed,
            completed_at,
            kind,
        });
        previous_completed = completed_at;
    }

    Ok(series)
}

/// Recorded points (minus the seed) followed by the average, median and
/// optimal series, each covering seed level + 1 through `max_level`.
/// `observed` must be sorted by level.
pub fn combine_with_projections(
    observed: &[ChartPoint],
    rates: &ProjectionRates,
    intervals: &IntervalTable,
    max_level: u32,
) -> Result<Vec<ChartPoint>> {
    let Some((seed, history)) = observed.split_last() else {
        return Ok(Vec::new());
    };
    let seed_level = seed.level.unwrap_or(1);

    let models = [
        (SeriesKind::Average, rates.average),
        (SeriesKind::Median, rates.median),
        (SeriesKind::Optimal, rates.optimal),
    ];

    let mut combined = history.to_vec();
    for (kind, pace) in models {
        combined.extend(project_series(seed, seed_level, kind, pace, intervals, max_level)?);
    }

    tracing::debug!(
        seed_level,
        recorded = history.len(),
        total = combined.len(),
        "generated level projections"
    );

    Ok(combined)
}
