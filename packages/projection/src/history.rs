//! Drops level progressions invalidated by the latest reset.

use crate::error::Result;
use crate::reset::ResetContext;
use crate::sanitize::parse_timestamp;
use crate::types::LevelProgression;

/// Keep a progression if it was created after the reset, or if it was
/// created before it on a level the reset did not roll back. A partial reset
/// to level 2 keeps an old level 1 record and discards old levels 3 and up.
pub fn filter_progressions<'a>(
    progressions: &'a [LevelProgression],
    reset: Option<&ResetContext>,
) -> Result<Vec<&'a LevelProgression>> {
    let Some(reset) = reset else {
        return Ok(progressions.iter().collect());
    };

    let mut kept = Vec::with_capacity(progressions.len());
    for progression in progressions {
        let created_at = parse_timestamp("created_at", &progression.created_at)?;
        let after_reset = created_at > reset.most_recent_reset_at;
        if after_reset || progression.level <= reset.target_level {
            kept.push(progression);
        }
    }

    tracing::debug!(
        total = progressions.len(),
        kept = kept.len(),
        target_level = reset.target_level,
        "filtered level progressions by reset"
    );

    Ok(kept)
}
