//! Most recent reset lookup.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::Result;
use crate::sanitize::parse_timestamp;
use crate::types::Reset;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetContext {
    pub most_recent_reset_at: DateTime<Utc>,
    pub target_level: u32,
    pub original_level: u32,
}

/// Pick the reset with the latest `confirmed_at`. Unconfirmed resets never
/// took effect and are skipped. When two resets share a confirmation time the
/// one with the higher target level wins, so the result does not depend on
/// input order.
pub fn resolve_latest_reset(resets: &[Reset]) -> Result<Option<ResetContext>> {
    let mut latest: Option<ResetContext> = None;

    for reset in resets {
        let Some(confirmed_at) = reset.confirmed_at.as_deref() else {
            tracing::debug!(target_level = reset.target_level, "ignoring unconfirmed reset");
            continue;
        };
        let candidate = ResetContext {
            most_recent_reset_at: parse_timestamp("confirmed_at", confirmed_at)?,
            target_level: reset.target_level,
            original_level: reset.original_level,
        };

        let replace = match &latest {
            None => true,
            Some(current) => {
                (candidate.most_recent_reset_at, candidate.target_level)
                    > (current.most_recent_reset_at, current.target_level)
            }
        };
        if replace {
            latest = Some(candidate);
        }
    }

    Ok(latest)
}
