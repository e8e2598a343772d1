//! Common Types and Constants
//!
//! Record shapes handed over by the ingestion layer, plus the chart and
//! estimate types produced by the engine. Timestamps on incoming records stay
//! as the raw ISO-8601 strings the service sends; they are parsed (and
//! rejected when malformed) by [`crate::sanitize`].

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

// ==================== Constants ====================

/// Highest level of the course
pub const MAX_LEVEL: u32 = 60;

/// Number of SRS stages (0 = lesson queue, 9 = burned)
pub const STAGE_COUNT: usize = 10;

/// First stage that counts as "passed" (Guru I)
pub const PASSED_STAGE: u8 = 5;

/// Share of a level's kanji that must be passed to level up, in percent
pub const LEVEL_UP_PERCENT: u32 = 90;

pub const SECONDS_PER_DAY: i64 = 86_400;
pub const MILLIS_PER_DAY: f64 = 86_400_000.0;

// ==================== Service Records ====================

/// One level the user has entered. Resets can leave several records for the
/// same level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelProgression {
    pub level: u32,
    pub created_at: String,
    #[serde(default)]
    pub unlocked_at: Option<String>,
    #[serde(default)]
    pub started_at: Option<String>,
    #[serde(default)]
    pub passed_at: Option<String>,
    #[serde(default)]
    pub completed_at: Option<String>,
    #[serde(default)]
    pub abandoned_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reset {
    pub created_at: String,
    /// Null while the user has not confirmed the reset yet
    #[serde(default)]
    pub confirmed_at: Option<String>,
    pub original_level: u32,
    pub target_level: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectType {
    Radical,
    Kanji,
    Vocabulary,
    KanaVocabulary,
}

impl SubjectType {
    /// Only radicals and kanji take part in level-up gating.
    pub fn gates_level_up(self) -> bool {
        matches!(self, SubjectType::Radical | SubjectType::Kanji)
    }
}

impl fmt::Display for SubjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Radical => write!(f, "radical"),
            Self::Kanji => write!(f, "kanji"),
            Self::Vocabulary => write!(f, "vocabulary"),
            Self::KanaVocabulary => write!(f, "kana_vocabulary"),
        }
    }
}

/// Subject payload as it appears inside a resource envelope. The id and
/// the subject type live on the envelope, see [`crate::ingest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectData {
    pub level: u32,
    #[serde(default)]
    pub component_subject_ids: Vec<u64>,
    #[serde(default)]
    pub amalgamation_subject_ids: Vec<u64>,
}

/// A radical, kanji or vocabulary item. For kanji, `component_subject_ids`
/// lists the radicals it is built from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub id: u64,
    pub level: u32,
    pub subject_type: SubjectType,
    #[serde(default)]
    pub component_subject_ids: Vec<u64>,
}

/// SRS stage, 0 (lesson queue) through 9 (burned).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct SrsStage(u8);

impl SrsStage {
    pub const INITIATE: SrsStage = SrsStage(0);
    pub const BURNED: SrsStage = SrsStage(9);

    pub fn new(stage: u8) -> Result<Self, EngineError> {
        if (stage as usize) < STAGE_COUNT {
            Ok(Self(stage))
        } else {
            Err(EngineError::InvalidSrsStage(stage))
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl TryFrom<u8> for SrsStage {
    type Error = EngineError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SrsStage> for u8 {
    fn from(stage: SrsStage) -> u8 {
        stage.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub subject_id: u64,
    pub subject_type: SubjectType,
    pub srs_stage: SrsStage,
    /// Earliest time the next review can happen. Null while the item sits in
    /// the lesson queue.
    #[serde(default)]
    pub available_at: Option<String>,
    #[serde(default)]
    pub unlocked_at: Option<String>,
    #[serde(default)]
    pub started_at: Option<String>,
    #[serde(default)]
    pub passed_at: Option<String>,
}

// ==================== Chart Types ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeriesKind {
    Recorded,
    Average,
    Median,
    Optimal,
    Userpace,
}

/// Timeline entry for both recorded history and projections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartPoint {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,
    /// Completion time in epoch millis; 0 while the level is not completed
    pub timestamp: i64,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: SeriesKind,
}

impl ChartPoint {
    pub fn is_completed(&self) -> bool {
        self.timestamp != 0
    }

    /// Level-up duration in fractional days.
    pub fn duration_days(&self) -> f64 {
        (self.completed_at - self.started_at).num_milliseconds() as f64 / MILLIS_PER_DAY
    }
}

/// Days per level, for normal and accelerated levels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelPace {
    pub normal: f64,
    pub accelerated: f64,
}

impl LevelPace {
    pub fn uniform(days: f64) -> Self {
        Self {
            normal: days,
            accelerated: days,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionRates {
    pub average: LevelPace,
    pub median: LevelPace,
    pub optimal: LevelPace,
}

/// Recorded history followed by the average, median and optimal series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelProjection {
    pub current_level: u32,
    pub formatted_data_with_projections: Vec<ChartPoint>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub rates: Option<ProjectionRates>,
}

impl LevelProjection {
    /// Result for a history too short to derive a pace from.
    pub fn insufficient() -> Self {
        Self {
            current_level: 1,
            formatted_data_with_projections: Vec::new(),
            rates: None,
        }
    }

    pub fn series(&self, kind: SeriesKind) -> impl Iterator<Item = &ChartPoint> {
        self.formatted_data_with_projections
            .iter()
            .filter(move |p| p.kind == kind)
    }
}
