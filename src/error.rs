//! Error taxonomy shared by the loader, scale provider and config files.

/// Errors surfaced by trendtrace.
///
/// Out-of-range scrub targets and out-of-domain projected values are not
/// errors: they are clamped silently where they occur.
#[derive(Debug, thiserror::Error)]
pub enum TrendError {
    /// No valid rows remained after loading. Fatal for the session; the
    /// viewer disables its playback controls.
    #[error("dataset contains no valid rows")]
    EmptyDataset,
    /// A domain rule table or story table is malformed or does not cover a
    /// queried date.
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TrendError>;
