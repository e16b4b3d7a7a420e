use std::time::Duration;

use foodcmp_core::RequestError;
use thiserror::Error;

/// Failure of a single capability call on a provider.
///
/// Every variant is provider-scoped: the orchestrator records it in that
/// provider's report and carries on.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("provider unavailable: {0}")]
    Unavailable(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("provider rejected the request: {0}")]
    Rejected(String),

    #[error("{operation} timed out after {}ms", .after.as_millis())]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    #[error("{0} cancelled")]
    Cancelled(&'static str),
}

/// Errors that stop a run before any provider is contacted.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("invalid search request: {0}")]
    InvalidRequest(#[from] RequestError),
}
