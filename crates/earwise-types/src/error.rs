use thiserror::Error;

/// Configuration values the engine refuses to run with.
///
/// Out-of-range tunables are clamped instead; only values that have no
/// sensible clamp end up here.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("total_trials must be at least 1")]
    NoTrials,

    #[error("{field} must be a finite number, got {value}")]
    NotFinite { field: &'static str, value: f64 },
}
