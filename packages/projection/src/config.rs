use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::intervals::IntervalTable;
use crate::types::{LEVEL_UP_PERCENT, MAX_LEVEL, PASSED_STAGE, STAGE_COUNT};

/// How historical (average/median) paces react to accelerated levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PaceAdjustment {
    /// Scale historical paces on accelerated levels the same way the
    /// optimal pace shrinks.
    #[default]
    Symmetric,
    /// Only the optimal series looks at level classification.
    OptimalOnly,
}

impl PaceAdjustment {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "symmetric" => Some(Self::Symmetric),
            "optimal-only" | "optimal_only" => Some(Self::OptimalOnly),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionConfig {
    pub intervals: IntervalTable,
    pub max_level: u32,
    pub level_up_percent: u32,
    pub passed_stage: u8,
    pub pace_adjustment: PaceAdjustment,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            intervals: IntervalTable::default(),
            max_level: MAX_LEVEL,
            level_up_percent: LEVEL_UP_PERCENT,
            passed_stage: PASSED_STAGE,
            pace_adjustment: PaceAdjustment::default(),
        }
    }
}

impl ProjectionConfig {
    /// Defaults overlaid with `PROJECTION_*` environment variables.
    /// Unparsable numbers fall back to the default.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let max_level = std::env::var("PROJECTION_MAX_LEVEL")
            .ok()
            .and_then(|value| value.parse::<u32>().ok())
            .unwrap_or(defaults.max_level);

        let level_up_percent = std::env::var("PROJECTION_LEVEL_UP_PERCENT")
            .ok()
            .and_then(|value| value.parse::<u32>().ok())
            .unwrap_or(defaults.level_up_percent);

        let pace_adjustment = std::env::var("PROJECTION_PACE_ADJUSTMENT")
            .ok()
            .and_then(|value| PaceAdjustment::parse(&value))
            .unwrap_or(defaults.pace_adjustment);

        let intervals = match std::env::var("PROJECTION_INTERVALS_FILE") {
            Ok(path) => {
                let raw = std::fs::read_to_string(&path).map_err(|err| {
                    EngineError::InvalidConfig(format!("cannot read {path}: {err}"))
                })?;
                IntervalTable::from_json(&raw)?
            }
            Err(_) => defaults.intervals,
        };

        let config = Self {
            intervals,
            max_level,
            level_up_percent,
            passed_stage: defaults.passed_stage,
            pace_adjustment,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_level == 0 {
            return Err(EngineError::InvalidConfig("max_level must be positive".into()));
        }
        if self.level_up_percent == 0 || self.level_up_percent > 100 {
            return Err(EngineError::InvalidConfig(format!(
                "level_up_percent {} outside 1..=100",
                self.level_up_percent
            )));
        }
        if self.passed_stage == 0 || self.passed_stage as usize >= STAGE_COUNT {
            return Err(EngineError::InvalidConfig(format!(
                "passed_stage {} outside 1..{STAGE_COUNT}",
                self.passed_stage
            )));
        }
        self.intervals.validate()
    }

    /// Number of kanji that must be passed on a level with `kanji_count` kanji.
    pub fn level_up_requirement(&self, kanji_count: usize) -> usize {
        let percent = self.level_up_percent as usize;
        (kanji_count * percent).div_ceil(100)
    }
}
