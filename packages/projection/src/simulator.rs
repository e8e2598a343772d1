//! Fastest-completion estimate for the current level.
//!
//! A level is passed once `level_up_percent` of its kanji reach the passed
//! stage. Unlocked kanji are walked stage by stage, highest pre-passed stage
//! first, until enough of them would pass. When too few kanji are unlocked,
//! the same walk runs over the level's radicals, each radical credited with
//! the locked kanji it is the bottleneck for, and the time a fresh kanji
//! needs to pass is added on top.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::ProjectionConfig;
use crate::error::Result;
use crate::intervals::{IntervalTable, Pace};
use crate::sanitize::{add_seconds, parse_optional_timestamp, seconds_until};
use crate::types::{Assignment, SrsStage, Subject, SubjectType, STAGE_COUNT};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LevelUpPath {
    /// The level has no kanji
    NoRequirement,
    /// Enough kanji are passed already
    AlreadyMet,
    /// Enough kanji are unlocked; only their reviews remain
    KanjiReviews,
    /// Kanji still have to be unlocked through their radicals
    RadicalUnlocks,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelUpEstimate {
    pub level: u32,
    pub requirement: usize,
    pub kanji_passed: usize,
    pub kanji_unlocked: usize,
    pub path: LevelUpPath,
    pub seconds: i64,
    /// Kanji the stage walk could not account for. Nonzero means the
    /// assignments cannot reach the requirement and `seconds` is a lower bound.
    pub shortfall: usize,
}

impl LevelUpEstimate {
    pub fn is_reachable(&self) -> bool {
        self.shortfall == 0
    }

    pub fn completes_at(&self, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
        add_seconds("completes_at", now, self.seconds)
    }
}

/// An item waiting to be promoted, weighted by how much of the outstanding
/// requirement it settles once it passes.
#[derive(Debug, Clone)]
struct Candidate {
    subject_id: u64,
    subject_type: SubjectType,
    stage: SrsStage,
    available_at: Option<DateTime<Utc>>,
    weight: usize,
}

impl Candidate {
    fn from_assignment(assignment: &Assignment, weight: usize) -> Result<Self> {
        Ok(Self {
            subject_id: assignment.subject_id,
            subject_type: assignment.subject_type,
            stage: assignment.srs_stage,
            available_at: parse_optional_timestamp(
                "available_at",
                assignment.available_at.as_deref(),
            )?,
            weight,
        })
    }

    /// Lesson-queue items with no review time are available right away.
    fn ready_at(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self.available_at {
            Some(at) => Some(at),
            None if self.stage == SrsStage::INITIATE => Some(now),
            None => None,
        }
    }
}

/// Ordering rank where a missing time sorts after every real one.
fn availability_rank(at: Option<DateTime<Utc>>) -> (bool, Option<DateTime<Utc>>) {
    (at.is_none(), at)
}

struct StageBuckets {
    buckets: [Vec<Candidate>; STAGE_COUNT],
}

impl StageBuckets {
    fn new() -> Self {
        Self {
            buckets: std::array::from_fn(|_| Vec::new()),
        }
    }

    fn insert(&mut self, candidate: Candidate) {
        self.buckets[candidate.stage.index()].push(candidate);
    }

    /// Soonest review first within each stage.
    fn sort_by_availability(&mut self) {
        for bucket in &mut self.buckets {
            bucket.sort_by_key(|c| availability_rank(c.available_at));
        }
    }

    /// Walk stages below `passed_stage` from the highest down. An empty or
    /// exhausted stage costs its full wait; the candidate that brings the
    /// outstanding count to zero adds its own time until review and ends the
    /// walk.
    fn simulate(
        &self,
        outstanding: usize,
        passed_stage: u8,
        intervals: &IntervalTable,
        pace: Pace,
        now: DateTime<Utc>,
    ) -> Simulation {
        if outstanding == 0 {
            return Simulation { seconds: 0, remaining: 0 };
        }

        let mut remaining = outstanding;
        let mut seconds = 0i64;

        for stage_index in (0..passed_stage as usize).rev() {
            let Some(bucket) = self.buckets.get(stage_index) else {
                continue;
            };

            for candidate in bucket.iter().filter(|c| c.weight > 0) {
                let Some(ready_at) = candidate.ready_at(now) else {
                    tracing::warn!(
                        subject_id = candidate.subject_id,
                        subject_type = %candidate.subject_type,
                        srs_stage = candidate.stage.value(),
                        "assignment has no available_at at a timed stage; skipping"
                    );
                    continue;
                };
                remaining = remaining.saturating_sub(candidate.weight);
                if remaining == 0 {
                    seconds = seconds.saturating_add(seconds_until(ready_at, now));
                    return Simulation { seconds, remaining };
                }
            }

            let stage = SrsStage::new(stage_index as u8).unwrap_or(SrsStage::INITIATE);
            seconds = seconds.saturating_add(intervals.wait_seconds(stage, pace));
        }

        tracing::warn!(
            outstanding,
            remaining,
            "requirement not reachable from current assignments"
        );
        Simulation { seconds, remaining }
    }
}

#[derive(Debug, Clone, Copy)]
struct Simulation {
    seconds: i64,
    remaining: usize,
}

/// Minimum wall-clock seconds until `level` can be passed.
///
/// `subjects` may contain other levels; only radicals and kanji of `level`
/// are considered. `assignments` should cover those subjects.
pub fn fastest_level_up(
    subjects: &[Subject],
    assignments: &[Assignment],
    level: u32,
    config: &ProjectionConfig,
    now: DateTime<Utc>,
) -> Result<LevelUpEstimate> {
    let level_subjects: Vec<&Subject> = subjects
        .iter()
        .filter(|s| s.level == level && s.subject_type.gates_level_up())
        .collect();
    let kanji_subjects: Vec<&Subject> = level_subjects
        .iter()
        .copied()
        .filter(|s| s.subject_type == SubjectType::Kanji)
        .collect();
    let kanji_ids: HashSet<u64> = kanji_subjects.iter().map(|s| s.id).collect();
    let radical_ids: HashSet<u64> = level_subjects
        .iter()
        .filter(|s| s.subject_type == SubjectType::Radical)
        .map(|s| s.id)
        .collect();

    let mut kanji_assignments: HashMap<u64, &Assignment> = HashMap::new();
    let mut radical_assignments: HashMap<u64, &Assignment> = HashMap::new();
    for assignment in assignments {
        if kanji_ids.contains(&assignment.subject_id) {
            kanji_assignments.entry(assignment.subject_id).or_insert(assignment);
        } else if radical_ids.contains(&assignment.subject_id) {
            radical_assignments.entry(assignment.subject_id).or_insert(assignment);
        }
    }

    let requirement = config.level_up_requirement(kanji_ids.len());
    let kanji_passed = kanji_assignments
        .values()
        .filter(|a| a.srs_stage.value() >= config.passed_stage)
        .count();
    let kanji_unlocked = kanji_assignments.len();

    let estimate = |path: LevelUpPath, seconds: i64, shortfall: usize| LevelUpEstimate {
        level,
        requirement,
        kanji_passed,
        kanji_unlocked,
        path,
        seconds: seconds.max(0),
        shortfall,
    };

    if requirement == 0 {
        return Ok(estimate(LevelUpPath::NoRequirement, 0, 0));
    }
    if kanji_passed >= requirement {
        return Ok(estimate(LevelUpPath::AlreadyMet, 0, 0));
    }

    let intervals = &config.intervals;
    let pace = intervals.pace_for(level);

    tracing::debug!(
        level,
        requirement,
        kanji_passed,
        kanji_unlocked,
        radicals = radical_assignments.len(),
        "estimating fastest level up"
    );

    if kanji_unlocked >= requirement {
        let mut buckets = StageBuckets::new();
        for assignment in kanji_assignments.values() {
            if assignment.srs_stage.value() < config.passed_stage {
                buckets.insert(Candidate::from_assignment(assignment, 1)?);
            }
        }
        buckets.sort_by_availability();

        let outstanding = requirement - kanji_passed;
        let simulation = buckets.simulate(outstanding, config.passed_stage, intervals, pace, now);
        return Ok(estimate(
            LevelUpPath::KanjiReviews,
            simulation.seconds,
            simulation.remaining,
        ));
    }

    let unlocks = radical_unlocks(&kanji_subjects, &kanji_assignments, &radical_assignments, config)?;
    let outstanding = (requirement - kanji_unlocked).saturating_sub(unlocks.unlocked_now);
    let simulation = unlocks
        .buckets
        .simulate(outstanding, config.passed_stage, intervals, pace, now);
    let seconds = simulation
        .seconds
        .saturating_add(intervals.time_to_pass_seconds(pace, config.passed_stage));

    Ok(estimate(LevelUpPath::RadicalUnlocks, seconds, simulation.remaining))
}

struct RadicalUnlocks {
    buckets: StageBuckets,
    /// Locked kanji whose in-level radicals have all passed already
    unlocked_now: usize,
}

/// Credit every locked kanji to the in-level radical that will finish last:
/// the one at the lowest stage, and among those the one reviewed latest.
/// A kanji needs all of its radicals, so crediting more than one would count
/// it twice.
fn radical_unlocks(
    kanji_subjects: &[&Subject],
    kanji_assignments: &HashMap<u64, &Assignment>,
    radical_assignments: &HashMap<u64, &Assignment>,
    config: &ProjectionConfig,
) -> Result<RadicalUnlocks> {
    let mut candidates: HashMap<u64, Candidate> = HashMap::with_capacity(radical_assignments.len());
    for (id, assignment) in radical_assignments {
        candidates.insert(*id, Candidate::from_assignment(assignment, 0)?);
    }

    let mut unlocked_now = 0usize;
    let mut credited = 0usize;

    for kanji in kanji_subjects {
        if kanji_assignments.contains_key(&kanji.id) {
            continue;
        }

        let prerequisites: Vec<&Candidate> = kanji
            .component_subject_ids
            .iter()
            .filter_map(|id| candidates.get(id))
            .collect();
        if prerequisites.is_empty() {
            tracing::warn!(
                kanji_id = kanji.id,
                "locked kanji has no in-level radical prerequisite"
            );
            continue;
        }

        let bottleneck = prerequisites
            .iter()
            .filter(|c| c.stage.value() < config.passed_stage)
            .min_by(|a, b| {
                a.stage.cmp(&b.stage).then_with(|| {
                    availability_rank(b.available_at).cmp(&availability_rank(a.available_at))
                })
            })
            .map(|c| c.subject_id);

        match bottleneck {
            Some(radical_id) => {
                if let Some(candidate) = candidates.get_mut(&radical_id) {
                    candidate.weight += 1;
                    credited += 1;
                }
            }
            None => {
                tracing::debug!(kanji_id = kanji.id, "radicals passed, kanji unlocks now");
                unlocked_now += 1;
            }
        }
    }

    if credited == 0 && unlocked_now == 0 {
        tracing::warn!("no in-level radical unlocks a locked kanji");
    }

    let mut buckets = StageBuckets::new();
    for candidate in candidates.into_values() {
        if candidate.stage.value() < config.passed_stage {
            buckets.insert(candidate);
        }
    }
    buckets.sort_by_availability();

    Ok(RadicalUnlocks {
        buckets,
        unlocked_now,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 4, 1, 12, 0, 0).unwrap()
    }

    fn at(hours_from_now: i64) -> Option<String> {
        Some((now() + Duration::hours(hours_from_now)).to_rfc3339())
    }

    fn kanji(id: u64, level: u32, components: &[u64]) -> Subject {
        Subject {
            id,
            level,
            subject_type: SubjectType::Kanji,
            component_subject_ids: components.to_vec(),
        }
    }

    fn radical(id: u64, level: u32) -> Subject {
        Subject {
            id,
            level,
            subject_type: SubjectType::Radical,
            component_subject_ids: Vec::new(),
        }
    }

    fn assignment(subject: &Subject, stage: u8, available_at: Option<String>) -> Assignment {
        Assignment {
            subject_id: subject.id,
            subject_type: subject.subject_type,
            srs_stage: SrsStage::new(stage).unwrap(),
            available_at,
            unlocked_at: None,
            started_at: None,
            passed_at: None,
        }
    }

    const LEVEL: u32 = 5;

    fn run(subjects: &[Subject], assignments: &[Assignment]) -> LevelUpEstimate {
        fastest_level_up(subjects, assignments, LEVEL, &ProjectionConfig::default(), now()).unwrap()
    }

    #[test]
    fn test_level_without_kanji_is_instant() {
        let subjects = vec![radical(1, LEVEL)];
        let estimate = run(&subjects, &[]);
        assert_eq!(estimate.requirement, 0);
        assert_eq!(estimate.path, LevelUpPath::NoRequirement);
        assert_eq!(estimate.seconds, 0);
    }

    #[test]
    fn test_already_passed_level() {
        let subjects: Vec<Subject> = (1..=10).map(|id| kanji(id, LEVEL, &[])).collect();
        let mut assignments: Vec<Assignment> =
            subjects.iter().take(9).map(|s| assignment(s, 5, at(100))).collect();
        assignments.push(assignment(&subjects[9], 4, at(0)));
        let estimate = run(&subjects, &assignments);
        assert_eq!(estimate.requirement, 9);
        assert_eq!(estimate.path, LevelUpPath::AlreadyMet);
        assert_eq!(estimate.seconds, 0);
    }

    #[test]
    fn test_last_kanji_available_now() {
        let subjects: Vec<Subject> = (1..=10).map(|id| kanji(id, LEVEL, &[])).collect();
        let mut assignments: Vec<Assignment> =
            subjects.iter().take(8).map(|s| assignment(s, 6, None)).collect();
        assignments.push(assignment(&subjects[8], 4, at(0)));
        assignments.push(assignment(&subjects[9], 4, at(30)));
        let estimate = run(&subjects, &assignments);
        assert_eq!(estimate.path, LevelUpPath::KanjiReviews);
        assert_eq!(estimate.seconds, 0);
    }

    #[test]
    fn test_kanji_walk_adds_empty_stage_waits() {
        // 10 kanji, 7 passed, 2 at stage 3 and 1 at stage 2: stage 4 is
        // empty, so its full wait is charged before stage 3 settles it.
        let subjects: Vec<Subject> = (1..=10).map(|id| kanji(id, LEVEL, &[])).collect();
        let mut assignments: Vec<Assignment> =
            subjects.iter().take(7).map(|s| assignment(s, 5, None)).collect();
        assignments.push(assignment(&subjects[7], 3, at(5)));
        assignments.push(assignment(&subjects[8], 3, at(2)));
        assignments.push(assignment(&subjects[9], 2, at(1)));
        let estimate = run(&subjects, &assignments);
        assert_eq!(estimate.path, LevelUpPath::KanjiReviews);
        // outstanding 2: both stage 3 items, the later one at +5h
        assert_eq!(estimate.seconds, 169_200 + 5 * 3600);
        assert!(estimate.is_reachable());
    }

    #[test]
    fn test_exhausted_stage_charges_full_wait() {
        let subjects: Vec<Subject> = (1..=4).map(|id| kanji(id, LEVEL, &[])).collect();
        let assignments = vec![
            assignment(&subjects[0], 4, at(1)),
            assignment(&subjects[1], 3, at(3)),
            assignment(&subjects[2], 3, at(2)),
            assignment(&subjects[3], 1, at(1)),
        ];
        let estimate = run(&subjects, &assignments);
        // requirement 4: stage 4 exhausted, stage 3 exhausted, stage 2 empty,
        // stage 1 settles at +1h
        assert_eq!(estimate.requirement, 4);
        assert_eq!(estimate.seconds, 169_200 + 82_800 + 28_800 + 3600);
    }

    #[test]
    fn test_accelerated_level_uses_shorter_waits() {
        let subjects: Vec<Subject> = (1..=2).map(|id| kanji(id, 1, &[])).collect();
        let assignments = vec![
            assignment(&subjects[0], 5, None),
            assignment(&subjects[1], 3, at(1)),
        ];
        let estimate =
            fastest_level_up(&subjects, &assignments, 1, &ProjectionConfig::default(), now()).unwrap();
        assert_eq!(estimate.seconds, 82_800 + 3600);
    }

    #[test]
    fn test_missing_available_at_is_skipped() {
        let subjects: Vec<Subject> = (1..=2).map(|id| kanji(id, LEVEL, &[])).collect();
        let assignments = vec![
            assignment(&subjects[0], 4, None),
            assignment(&subjects[1], 4, at(2)),
        ];
        let estimate = run(&subjects, &assignments);
        // requirement 2 cannot be met from timed items; every wait is charged
        assert_eq!(estimate.seconds, 169_200 + 82_800 + 28_800 + 14_400);
        assert_eq!(estimate.shortfall, 1);
        assert!(!estimate.is_reachable());
    }

    #[test]
    fn test_lesson_queue_counts_as_immediate() {
        let subjects = vec![kanji(1, LEVEL, &[])];
        let assignments = vec![assignment(&subjects[0], 0, None)];
        let estimate = run(&subjects, &assignments);
        assert_eq!(estimate.path, LevelUpPath::KanjiReviews);
        assert_eq!(estimate.seconds, 169_200 + 82_800 + 28_800 + 14_400);
    }

    #[test]
    fn test_no_kanji_assignments_uses_radicals() {
        let radicals: Vec<Subject> = (100..103).map(|id| radical(id, LEVEL)).collect();
        let kanjis = vec![
            kanji(1, LEVEL, &[100]),
            kanji(2, LEVEL, &[101]),
            kanji(3, LEVEL, &[102]),
        ];
        let assignments = vec![
            assignment(&radicals[0], 4, at(1)),
            assignment(&radicals[1], 4, at(2)),
            assignment(&radicals[2], 4, at(3)),
        ];
        let subjects: Vec<Subject> = radicals.into_iter().chain(kanjis).collect();
        let estimate = run(&subjects, &assignments);
        assert_eq!(estimate.path, LevelUpPath::RadicalUnlocks);
        assert_eq!(estimate.requirement, 3);
        assert_eq!(estimate.seconds, 3 * 3600 + 295_200);
    }

    #[test]
    fn test_no_assignments_at_all_never_fails() {
        let subjects = vec![kanji(1, LEVEL, &[100]), radical(100, LEVEL)];
        let estimate = run(&subjects, &[]);
        assert_eq!(estimate.path, LevelUpPath::RadicalUnlocks);
        assert_eq!(estimate.seconds, 295_200 + 295_200);
        assert_eq!(estimate.shortfall, 1);
    }

    #[test]
    fn test_custom_passed_stage_shortens_both_walks() {
        // Passing at stage 3: the walk covers stages 2..0 and a fresh kanji
        // needs only the stage 1 and 2 waits.
        let config = ProjectionConfig {
            passed_stage: 3,
            ..Default::default()
        };
        let subjects = vec![kanji(1, LEVEL, &[100]), radical(100, LEVEL)];
        let estimate = fastest_level_up(&subjects, &[], LEVEL, &config, now()).unwrap();
        assert_eq!(estimate.path, LevelUpPath::RadicalUnlocks);
        assert_eq!(estimate.seconds, 43_200 + 43_200);
    }

    #[test]
    fn test_custom_passed_stage_counts_lower_stages_as_passed() {
        let config = ProjectionConfig {
            passed_stage: 3,
            ..Default::default()
        };
        let subjects: Vec<Subject> = (1..=2).map(|id| kanji(id, LEVEL, &[])).collect();
        let assignments = vec![
            assignment(&subjects[0], 3, at(10)),
            assignment(&subjects[1], 2, at(1)),
        ];
        let estimate = fastest_level_up(&subjects, &assignments, LEVEL, &config, now()).unwrap();
        assert_eq!(estimate.kanji_passed, 1);
        assert_eq!(estimate.seconds, 3600);
    }

    #[test]
    fn test_shared_kanji_credited_to_slowest_radical() {
        // Kanji 1 needs radicals 100 (stage 4) and 101 (stage 2). Only 101
        // is credited, so the walk charges stage 4, stage 3 and settles on
        // 101 at +6h.
        let subjects = vec![
            radical(100, LEVEL),
            radical(101, LEVEL),
            kanji(1, LEVEL, &[100, 101]),
        ];
        let assignments = vec![
            assignment(&subjects[0], 4, at(1)),
            assignment(&subjects[1], 2, at(6)),
        ];
        let estimate = run(&subjects, &assignments);
        assert_eq!(estimate.seconds, 169_200 + 82_800 + 6 * 3600 + 295_200);
    }

    #[test]
    fn test_stage_tie_credits_later_review() {
        let subjects = vec![
            radical(100, LEVEL),
            radical(101, LEVEL),
            kanji(1, LEVEL, &[100, 101]),
        ];
        let assignments = vec![
            assignment(&subjects[0], 4, at(9)),
            assignment(&subjects[1], 4, at(2)),
        ];
        let estimate = run(&subjects, &assignments);
        assert_eq!(estimate.seconds, 9 * 3600 + 295_200);
    }

    #[test]
    fn test_passed_radicals_unlock_immediately() {
        let subjects = vec![radical(100, LEVEL), kanji(1, LEVEL, &[100])];
        let assignments = vec![assignment(&subjects[0], 5, None)];
        let estimate = run(&subjects, &assignments);
        assert_eq!(estimate.path, LevelUpPath::RadicalUnlocks);
        assert_eq!(estimate.seconds, 295_200);
    }

    #[test]
    fn test_vocabulary_and_other_levels_ignored() {
        let subjects = vec![
            kanji(1, LEVEL, &[]),
            kanji(2, LEVEL + 1, &[]),
            Subject {
                id: 3,
                level: LEVEL,
                subject_type: SubjectType::Vocabulary,
                component_subject_ids: vec![1],
            },
        ];
        let assignments = vec![
            assignment(&subjects[0], 4, at(4)),
            assignment(&subjects[1], 1, at(1)),
            assignment(&subjects[2], 1, at(1)),
        ];
        let estimate = run(&subjects, &assignments);
        assert_eq!(estimate.requirement, 1);
        assert_eq!(estimate.seconds, 4 * 3600);
    }

    #[test]
    fn test_malformed_available_at_fails() {
        let subjects = vec![kanji(1, LEVEL, &[])];
        let assignments = vec![assignment(&subjects[0], 3, Some("soon".to_string()))];
        let result = fastest_level_up(&subjects, &assignments, LEVEL, &ProjectionConfig::default(), now());
        assert!(result.is_err());
    }

    #[test]
    fn test_completes_at() {
        let estimate = LevelUpEstimate {
            level: 3,
            requirement: 9,
            kanji_passed: 0,
            kanji_unlocked: 9,
            path: LevelUpPath::KanjiReviews,
            seconds: 3600,
            shortfall: 0,
        };
        assert_eq!(estimate.completes_at(now()).unwrap(), now() + Duration::hours(1));
    }

    #[test]
    fn test_completes_at_past_representable_time_fails() {
        let estimate = LevelUpEstimate {
            level: 3,
            requirement: 9,
            kanji_passed: 0,
            kanji_unlocked: 9,
            path: LevelUpPath::KanjiReviews,
            seconds: i64::MAX,
            shortfall: 0,
        };
        let err = estimate.completes_at(now()).unwrap_err();
        assert!(matches!(err, EngineError::TimeOutOfRange { field: "completes_at" }));
    }

    #[test]
    fn test_huge_waits_saturate_instead_of_overflowing() {
        let mut config = ProjectionConfig::default();
        for stage in &mut config.intervals.stages[1..5] {
            stage.interval_seconds = i64::MAX / 2;
        }
        let subjects = vec![kanji(1, LEVEL, &[100]), radical(100, LEVEL)];
        let estimate = fastest_level_up(&subjects, &[], LEVEL, &config, now()).unwrap();
        assert_eq!(estimate.seconds, i64::MAX);
    }
}
