//! Entry points used by the dashboard.
//!
//! Each public call takes one reference instant and passes it down, so
//! placeholders and time-until-review math agree within a call.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::clock::Clock;
use crate::config::ProjectionConfig;
use crate::error::Result;
use crate::history::filter_progressions;
use crate::projection::combine_with_projections;
use crate::quick_stats::{quick_stats, QuickStats};
use crate::reset::resolve_latest_reset;
use crate::sanitize::check_level;
use crate::simulator::{fastest_level_up, LevelUpEstimate};
use crate::stats::projection_rates;
use crate::timeline::format_progressions;
use crate::types::{Assignment, LevelProgression, LevelProjection, Reset, Subject};

#[derive(Debug, Clone, Default)]
pub struct ProjectionEngine {
    config: ProjectionConfig,
}

impl ProjectionEngine {
    pub fn new(config: ProjectionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ProjectionConfig {
        &self.config
    }

    /// Recorded timeline plus average, median and optimal projections.
    ///
    /// Returns `None` when no progression survives the reset filter, and
    /// [`LevelProjection::insufficient`] when only one does.
    pub fn project_levels(
        &self,
        progressions: &[LevelProgression],
        resets: &[Reset],
        now: DateTime<Utc>,
    ) -> Result<Option<LevelProjection>> {
        for progression in progressions {
            check_level(progression.level, self.config.max_level)?;
        }

        let reset = resolve_latest_reset(resets)?;
        let kept = filter_progressions(progressions, reset.as_ref())?;

        match kept.len() {
            0 => return Ok(None),
            1 => return Ok(Some(LevelProjection::insufficient())),
            _ => {}
        }

        let observed = format_progressions(&kept, now)?;
        let current_level = observed
            .last()
            .and_then(|p| p.level)
            .unwrap_or(1);
        let rates = projection_rates(&observed, &self.config);
        let data = combine_with_projections(
            &observed,
            &rates,
            &self.config.intervals,
            self.config.max_level,
        )?;

        Ok(Some(LevelProjection {
            current_level,
            formatted_data_with_projections: data,
            rates: Some(rates),
        }))
    }

    pub fn project_levels_with_clock(
        &self,
        progressions: &[LevelProgression],
        resets: &[Reset],
        clock: &impl Clock,
    ) -> Result<Option<LevelProjection>> {
        self.project_levels(progressions, resets, clock.now())
    }

    /// Minimum time until `level` can be passed.
    pub fn fastest_level_up(
        &self,
        subjects: &[Subject],
        assignments: &[Assignment],
        level: u32,
        now: DateTime<Utc>,
    ) -> Result<LevelUpEstimate> {
        check_level(level, self.config.max_level)?;
        fastest_level_up(subjects, assignments, level, &self.config, now)
    }

    pub fn fastest_level_up_with_clock(
        &self,
        subjects: &[Subject],
        assignments: &[Assignment],
        level: u32,
        clock: &impl Clock,
    ) -> Result<LevelUpEstimate> {
        self.fastest_level_up(subjects, assignments, level, clock.now())
    }

    pub fn quick_stats(
        &self,
        projection: &LevelProjection,
        estimate: &LevelUpEstimate,
        now: DateTime<Utc>,
    ) -> Result<Option<QuickStats>> {
        quick_stats(projection, estimate, &self.config.intervals, now)
    }

    /// Projection, estimate and summary for one dashboard refresh, all
    /// computed against a single clock reading. The estimate runs on the
    /// projected current level.
    pub fn dashboard(
        &self,
        progressions: &[LevelProgression],
        resets: &[Reset],
        subjects: &[Subject],
        assignments: &[Assignment],
        clock: &impl Clock,
    ) -> Result<Option<Dashboard>> {
        let now = clock.now();
        let Some(projection) = self.project_levels(progressions, resets, now)? else {
            return Ok(None);
        };
        let estimate = self.fastest_level_up(subjects, assignments, projection.current_level, now)?;
        let summary = self.quick_stats(&projection, &estimate, now)?;

        Ok(Some(Dashboard {
            projection,
            estimate,
            summary,
        }))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub projection: LevelProjection,
    pub estimate: LevelUpEstimate,
    pub summary: Option<QuickStats>,
}
