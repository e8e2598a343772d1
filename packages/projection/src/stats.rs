//! Level-up duration statistics over the recorded timeline.

use crate::config::{PaceAdjustment, ProjectionConfig};
use crate::intervals::{IntervalTable, Pace};
use crate::sanitize::sanitize_days;
use crate::types::{ChartPoint, LevelPace, ProjectionRates, SECONDS_PER_DAY};

/// Mean level-up duration in days.
///
/// Only completed points contribute a duration, but the divisor is the count
/// of every point, in-progress ones included. With unfinished recent levels
/// this pulls the mean toward zero; dashboards have always shown it that way.
pub fn average_level_up_days(points: &[ChartPoint]) -> f64 {
    if points.is_empty() {
        return 0.0;
    }
    let total: f64 = points
        .iter()
        .filter(|p| p.is_completed())
        .map(ChartPoint::duration_days)
        .sum();
    total / points.len() as f64
}

/// Median level-up duration in days over completed points. For an even
/// count this is the mean of the two middle values.
pub fn median_level_up_days(points: &[ChartPoint]) -> Option<f64> {
    let mut durations: Vec<f64> = points
        .iter()
        .filter(|p| p.is_completed())
        .map(ChartPoint::duration_days)
        .collect();
    median(&mut durations)
}

pub fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}

/// Optimal pace in whole days, from the interval table alone.
pub fn optimal_pace(intervals: &IntervalTable, passed_stage: u8) -> LevelPace {
    LevelPace {
        normal: intervals.optimal_level_up_days(Pace::Normal, passed_stage) as f64,
        accelerated: intervals.optimal_level_up_days(Pace::Accelerated, passed_stage) as f64,
    }
}

/// Accelerated levels shrink by the same ratio the optimal duration does.
fn accelerated_ratio(intervals: &IntervalTable, passed_stage: u8) -> f64 {
    let normal = intervals.optimal_level_up_seconds(Pace::Normal, passed_stage);
    if normal <= 0 {
        return 1.0;
    }
    intervals.optimal_level_up_seconds(Pace::Accelerated, passed_stage) as f64 / normal as f64
}

fn historical_pace(days: f64, config: &ProjectionConfig) -> LevelPace {
    let days = sanitize_days(days);
    match config.pace_adjustment {
        PaceAdjustment::OptimalOnly => LevelPace::uniform(days),
        PaceAdjustment::Symmetric => LevelPace {
            normal: days,
            accelerated: days * accelerated_ratio(&config.intervals, config.passed_stage),
        },
    }
}

pub fn projection_rates(points: &[ChartPoint], config: &ProjectionConfig) -> ProjectionRates {
    let average = average_level_up_days(points);
    let median = median_level_up_days(points).unwrap_or(0.0);

    tracing::debug!(
        points = points.len(),
        average_days = average,
        median_days = median,
        "computed level-up statistics"
    );

    ProjectionRates {
        average: historical_pace(average, config),
        median: historical_pace(median, config),
        optimal: optimal_pace(&config.intervals, config.passed_stage),
    }
}

/// Milliseconds in `days`, rounded.
pub fn days_to_millis(days: f64) -> i64 {
    (sanitize_days(days) * SECONDS_PER_DAY as f64 * 1000.0).round() as i64
}
