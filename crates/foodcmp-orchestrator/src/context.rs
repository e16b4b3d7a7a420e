use foodcmp_core::ProviderId;
use tokio_util::sync::CancellationToken;
use tracing::Span;
use uuid::Uuid;

/// Per-run context handed to the orchestrator and to provider adapters.
///
/// Carries the run id, the tracing span every log line of the run is nested
/// under, and the cancellation token that interrupts in-flight remote calls
/// and backoff sleeps. Cloning is cheap and clones share the token.
#[derive(Debug, Clone)]
pub struct RunContext {
    run_id: Uuid,
    span: Span,
    cancel: CancellationToken,
}

impl RunContext {
    #[must_use]
    pub fn new() -> Self {
        Self::with_cancellation(CancellationToken::new())
    }

    /// Creates a context driven by an externally owned token, e.g. one
    /// cancelled from a Ctrl-C handler.
    #[must_use]
    pub fn with_cancellation(cancel: CancellationToken) -> Self {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("run", run_id = %run_id);
        Self {
            run_id,
            span,
            cancel,
        }
    }

    #[must_use]
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    #[must_use]
    pub fn span(&self) -> &Span {
        &self.span
    }

    /// Child span for work scoped to one provider.
    #[must_use]
    pub fn provider_span(&self, provider: &ProviderId) -> Span {
        tracing::info_span!(parent: &self.span, "provider", provider = %provider)
    }

    #[must_use]
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new()
    }
}
