//! Recorded level timeline.

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::sanitize::parse_optional_timestamp;
use crate::types::{ChartPoint, LevelProgression, SeriesKind};

/// Turn progressions into `recorded` chart points sorted by level, then by
/// start. A level recorded twice keeps its most recent attempt last.
///
/// Missing `started_at`/`passed_at` fall back to `now`, which acts as the
/// shared placeholder for the whole call. A point whose completion is the
/// placeholder gets `timestamp = 0`.
pub fn format_progressions(
    progressions: &[&LevelProgression],
    now: DateTime<Utc>,
) -> Result<Vec<ChartPoint>> {
    let mut points = progressions
        .iter()
        .map(|progression| format_progression(progression, now))
        .collect::<Result<Vec<_>>>()?;

    points.sort_by_key(|p| (p.level, p.started_at));
    Ok(points)
}

fn format_progression(progression: &LevelProgression, placeholder: DateTime<Utc>) -> Result<ChartPoint> {
    let started_at = parse_optional_timestamp("started_at", progression.started_at.as_deref())?
        .unwrap_or(placeholder);
    let completed_at = parse_optional_timestamp("passed_at", progression.passed_at.as_deref())?
        .unwrap_or(placeholder);

    let timestamp = if completed_at != placeholder {
        completed_at.timestamp_millis()
    } else {
        0
    };

    Ok(ChartPoint {
        level: Some(progression.level),
        timestamp,
        started_at,
        completed_at,
        kind: SeriesKind::Recorded,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn progression(level: u32, started_at: Option<&str>, passed_at: Option<&str>) -> LevelProgression {
        LevelProgression {
            level,
            created_at: "2020-01-01T00:00:00Z".to_string(),
            unlocked_at: None,
            started_at: started_at.map(str::to_string),
            passed_at: passed_at.map(str::to_string),
            completed_at: None,
            abandoned_at: None,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 3, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_sorted_by_level() {
        let records = vec![
            progression(3, Some("2020-01-20T00:00:00Z"), None),
            progression(1, Some("2020-01-01T00:00:00Z"), Some("2020-01-10T00:00:00Z")),
            progression(2, Some("2020-01-10T00:00:00Z"), Some("2020-01-20T00:00:00Z")),
        ];
        let refs: Vec<&LevelProgression> = records.iter().collect();
        let points = format_progressions(&refs, now()).unwrap();
        let levels: Vec<Option<u32>> = points.iter().map(|p| p.level).collect();
        assert_eq!(levels, vec![Some(1), Some(2), Some(3)]);
        assert!(points.iter().all(|p| p.kind == SeriesKind::Recorded));
    }

    #[test]
    fn test_repeated_level_orders_attempts_by_start() {
        let records = vec![
            progression(2, Some("2020-02-01T00:00:00Z"), None),
            progression(1, Some("2019-01-01T00:00:00Z"), Some("2019-01-10T00:00:00Z")),
            progression(2, Some("2019-01-10T00:00:00Z"), Some("2019-01-20T00:00:00Z")),
        ];
        let refs: Vec<&LevelProgression> = records.iter().collect();
        let points = format_progressions(&refs, now()).unwrap();
        let newest = Utc.with_ymd_and_hms(2020, 2, 1, 0, 0, 0).unwrap();
        assert_eq!(points.last().map(|p| p.started_at), Some(newest));
        assert_eq!(points[1].level, Some(2));
        assert_ne!(points[1].started_at, newest);
    }

    #[test]
    fn test_completed_level_has_real_timestamp() {
        let record = progression(1, Some("2020-01-01T00:00:00Z"), Some("2020-01-10T00:00:00Z"));
        let points = format_progressions(&[&record], now()).unwrap();
        let expected = Utc.with_ymd_and_hms(2020, 1, 10, 0, 0, 0).unwrap();
        assert_eq!(points[0].timestamp, expected.timestamp_millis());
        assert!((points[0].duration_days() - 9.0).abs() < 1e-9);
    }

    #[test]
    fn test_in_progress_level_uses_shared_placeholder() {
        let records = vec![progression(4, None, None), progression(5, None, None)];
        let refs: Vec<&LevelProgression> = records.iter().collect();
        let points = format_progressions(&refs, now()).unwrap();
        for point in &points {
            assert_eq!(point.timestamp, 0);
            assert_eq!(point.started_at, now());
            assert_eq!(point.completed_at, now());
        }
    }

    #[test]
    fn test_malformed_passed_at_fails() {
        let record = progression(1, Some("2020-01-01T00:00:00Z"), Some("10 Jan"));
        assert!(format_progressions(&[&record], now()).is_err());
    }
}
