use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid timestamp in {field}: {value:?}")]
    InvalidTimestamp {
        field: &'static str,
        value: String,
        #[source]
        source: chrono::ParseError,
    },
    #[error("level {level} outside 1..={max}")]
    InvalidLevel { level: u32, max: u32 },
    #[error("srs stage {0} outside 0..=9")]
    InvalidSrsStage(u8),
    #[error("{field} falls outside the representable time range")]
    TimeOutOfRange { field: &'static str },
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("JSON decode failed: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;
