use thiserror::Error;

/// Reasons a [`crate::SearchRequest`] is rejected at construction time.
///
/// These are the only synchronous failures of a comparison run; everything
/// that happens after validation is captured in the run report instead.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RequestError {
    #[error("at least one food item is required")]
    EmptyQuery,

    #[error("min_rating must be between 0 and 5, got {0}")]
    InvalidRating(f64),

    #[error("{field} must be a non-negative number, got {value}")]
    InvalidPrice { field: &'static str, value: f64 },

    #[error("price_min ({floor}) must not exceed price_max ({ceiling})")]
    InvertedPriceBounds { floor: f64, ceiling: f64 },

    #[error("max_results_per_provider must be at least 1")]
    ZeroMaxResults,
}

/// Errors raised while loading configuration from the environment or from
/// provider/request files on disk.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for env var {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read {path}: {source}")]
    FileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {reason}")]
    FileParse { path: String, reason: String },

    #[error("validation error: {0}")]
    Validation(String),

    #[error("invalid search request in {path}: {source}")]
    Request {
        path: String,
        #[source]
        source: RequestError,
    },
}
