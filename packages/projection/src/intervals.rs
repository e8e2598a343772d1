//! SRS interval table and level pace classification.
//!
//! Levels 1-2 and most of 43-60 run on accelerated intervals. The table is a
//! plain value so tests can swap in synthetic intervals.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::types::{SrsStage, SECONDS_PER_DAY, STAGE_COUNT};

/// Upper bound for a single stage wait, one century.
pub const MAX_INTERVAL_SECONDS: i64 = 100 * 365 * SECONDS_PER_DAY;

const ACCELERATED_LEVELS: [u32; 18] = [
    1, 2, 43, 44, 46, 47, 49, 50, 51, 52, 53, 54, 55, 56, 57, 58, 59, 60,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pace {
    Normal,
    Accelerated,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SrsStageInterval {
    pub stage: u8,
    pub name: String,
    pub interval_seconds: i64,
    pub accelerated_interval_seconds: i64,
}

impl SrsStageInterval {
    fn new(stage: u8, name: &str, interval_seconds: i64, accelerated_interval_seconds: i64) -> Self {
        Self {
            stage,
            name: name.to_string(),
            interval_seconds,
            accelerated_interval_seconds,
        }
    }

    pub fn wait_seconds(&self, pace: Pace) -> i64 {
        match pace {
            Pace::Normal => self.interval_seconds,
            Pace::Accelerated => self.accelerated_interval_seconds,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntervalTable {
    pub stages: Vec<SrsStageInterval>,
    pub accelerated_levels: BTreeSet<u32>,
}

impl Default for IntervalTable {
    fn default() -> Self {
        Self {
            stages: vec![
                SrsStageInterval::new(0, "Initiate", 0, 0),
                SrsStageInterval::new(1, "Apprentice I", 14_400, 7_200),
                SrsStageInterval::new(2, "Apprentice II", 28_800, 14_400),
                SrsStageInterval::new(3, "Apprentice III", 82_800, 28_800),
                SrsStageInterval::new(4, "Apprentice IV", 169_200, 82_800),
                SrsStageInterval::new(5, "Guru I", 601_200, 601_200),
                SrsStageInterval::new(6, "Guru II", 1_206_000, 1_206_000),
                SrsStageInterval::new(7, "Master", 2_588_400, 2_588_400),
                SrsStageInterval::new(8, "Enlightened", 10_364_400, 10_364_400),
                SrsStageInterval::new(9, "Burned", 0, 0),
            ],
            accelerated_levels: ACCELERATED_LEVELS.into_iter().collect(),
        }
    }
}

impl IntervalTable {
    pub fn from_json(json: &str) -> Result<Self> {
        let table: IntervalTable = serde_json::from_str(json)?;
        table.validate()?;
        Ok(table)
    }

    pub fn validate(&self) -> Result<()> {
        if self.stages.len() != STAGE_COUNT {
            return Err(EngineError::InvalidConfig(format!(
                "interval table needs {STAGE_COUNT} stages, got {}",
                self.stages.len()
            )));
        }
        for (idx, stage) in self.stages.iter().enumerate() {
            if stage.stage as usize != idx {
                return Err(EngineError::InvalidConfig(format!(
                    "stage {} listed at position {idx}",
                    stage.stage
                )));
            }
            if stage.interval_seconds < 0 || stage.accelerated_interval_seconds < 0 {
                return Err(EngineError::InvalidConfig(format!(
                    "stage {idx} has a negative interval"
                )));
            }
            if stage.interval_seconds > MAX_INTERVAL_SECONDS
                || stage.accelerated_interval_seconds > MAX_INTERVAL_SECONDS
            {
                return Err(EngineError::InvalidConfig(format!(
                    "stage {idx} waits longer than {MAX_INTERVAL_SECONDS} seconds"
                )));
            }
        }
        let last = STAGE_COUNT - 1;
        for idx in [0, last] {
            let stage = &self.stages[idx];
            if stage.interval_seconds != 0 || stage.accelerated_interval_seconds != 0 {
                return Err(EngineError::InvalidConfig(format!(
                    "stage {idx} must not have a wait"
                )));
            }
        }
        Ok(())
    }

    pub fn is_accelerated(&self, level: u32) -> bool {
        self.accelerated_levels.contains(&level)
    }

    pub fn pace_for(&self, level: u32) -> Pace {
        if self.is_accelerated(level) {
            Pace::Accelerated
        } else {
            Pace::Normal
        }
    }

    pub fn wait_seconds(&self, stage: SrsStage, pace: Pace) -> i64 {
        self.stages
            .get(stage.index())
            .map_or(0, |s| s.wait_seconds(pace))
    }

    /// Seconds for a freshly unlocked item to reach `passed_stage` when
    /// every review is done the moment it becomes available.
    pub fn time_to_pass_seconds(&self, pace: Pace, passed_stage: u8) -> i64 {
        self.stages
            .iter()
            .take(passed_stage as usize)
            .map(|s| s.wait_seconds(pace))
            .fold(0i64, i64::saturating_add)
    }

    /// Fastest possible level: radicals must pass before their kanji unlock,
    /// then the kanji must pass.
    pub fn optimal_level_up_seconds(&self, pace: Pace, passed_stage: u8) -> i64 {
        self.time_to_pass_seconds(pace, passed_stage).saturating_mul(2)
    }

    /// Optimal level-up time in whole days.
    pub fn optimal_level_up_days(&self, pace: Pace, passed_stage: u8) -> i64 {
        self.optimal_level_up_seconds(pace, passed_stage) / SECONDS_PER_DAY
    }
}
