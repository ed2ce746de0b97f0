use thiserror::Error;

pub type Result<T> = std::result::Result<T, StatsError>;

#[derive(Error, Debug)]
pub enum StatsError {
    #[error("Source unavailable: {0}")]
    SourceUnavailable(String),
    #[error("No data available: {0}")]
    NoDataAvailable(String),
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
    #[error("Growth rate undefined for {month}: previous month is zero")]
    DivisionUndefined { month: String },
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StatsError {
    /// Only an unreachable source may be answered with cached data.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, StatsError::SourceUnavailable(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_source_errors_are_recoverable() {
        assert!(StatsError::SourceUnavailable("rate limited".into()).is_recoverable());
        assert!(!StatsError::MalformedResponse("not an array".into()).is_recoverable());
        assert!(!StatsError::NoDataAvailable("cache".into()).is_recoverable());
    }
}
