//! # wk-projection - level-up projections for an SRS kanji course
//!
//! Pure computations behind the progress dashboard:
//!
//! - **Reset handling** - find the latest confirmed reset and drop the level
//!   progressions it invalidated
//! - **Timeline** - recorded level-ups as chart points
//! - **Statistics** - mean, median and optimal days per level
//! - **Projections** - average, median and optimal series up to level 60
//! - **Fastest level-up** - minimum time to pass the current level, following
//!   radical to kanji unlocks through the SRS stages
//!
//! Nothing here does I/O. Callers fetch and cache records, strip the service
//! envelopes with [`ingest`], and pass a single reference instant into every
//! call.
//!
//! ## Modules
//!
//! - [`engine`] - facade combining the steps below
//! - [`reset`] / [`history`] - reset resolution and progression filtering
//! - [`timeline`] - recorded chart points
//! - [`stats`] - duration statistics and projection rates
//! - [`projection`] - forward series
//! - [`simulator`] - fastest completion of the current level
//! - [`quick_stats`] - current level summary
//! - [`intervals`] / [`config`] - interval table and engine configuration
//! - [`ingest`] - service envelopes
//! - [`sanitize`] - timestamp and level validation
//! - [`clock`] / [`logging`] - reference instant and tracing setup
//!
//! ## Example
//!
//! ```rust
//! use chrono::{TimeZone, Utc};
//! use wk_projection::{LevelProgression, ProjectionEngine};
//!
//! let engine = ProjectionEngine::default();
//! let now = Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap();
//! let record = |level: u32, started: &str, passed: Option<&str>| LevelProgression {
//!     level,
//!     created_at: started.to_string(),
//!     unlocked_at: None,
//!     started_at: Some(started.to_string()),
//!     passed_at: passed.map(str::to_string),
//!     completed_at: None,
//!     abandoned_at: None,
//! };
//! let history = vec![
//!     record(1, "2020-12-01T00:00:00Z", Some("2020-12-08T00:00:00Z")),
//!     record(2, "2020-12-08T00:00:00Z", None),
//! ];
//! let projection = engine.project_levels(&history, &[], now).unwrap().unwrap();
//! assert_eq!(projection.current_level, 2);
//! ```
//!
//! ## Logging
//!
//! The engine only emits `tracing` events. A binary embedding it installs a
//! subscriber once at startup and keeps the returned guard alive:
//!
//! ```no_run
//! use wk_projection::logging::{init_tracing, log_level_from_env};
//! use wk_projection::{ProjectionConfig, ProjectionEngine};
//!
//! let _log_guard = init_tracing(&log_level_from_env());
//! let engine = ProjectionEngine::new(ProjectionConfig::from_env()?)?;
//! tracing::info!(max_level = engine.config().max_level, "projection engine ready");
//! # Ok::<(), wk_projection::EngineError>(())
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod history;
pub mod ingest;
pub mod intervals;
pub mod logging;
pub mod projection;
pub mod quick_stats;
pub mod reset;
pub mod sanitize;
pub mod simulator;
pub mod stats;
pub mod timeline;
pub mod types;

// ============================================================================
// Re-exports
// ============================================================================

pub use types::*;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{PaceAdjustment, ProjectionConfig};
pub use engine::{Dashboard, ProjectionEngine};
pub use error::{EngineError, Result};
pub use intervals::{IntervalTable, Pace, SrsStageInterval};
pub use quick_stats::{DayHours, QuickStats};
pub use reset::ResetContext;
pub use simulator::{LevelUpEstimate, LevelUpPath};
