//! Verify-then-commit-or-rollback cart mutation.
//!
//! [`add_consistently`] adds one item to one provider's cart and only reports
//! [`MutationStatus::Committed`] after an independent read confirms it. An add
//! that fails verification is removed again before the next attempt. An add
//! that errored may still have landed; the shared token collapses it with the
//! retry, and a final remove cleans it up if no attempt commits.
//!
//! One attempt walks these states:
//!
//! ```text
//! Start → Adding → Verifying → Committed          verify true
//!         Adding → Verifying → RollingBack → Retrying   verify false or error
//!         Adding → Retrying                       add error
//!         Retrying → Adding                       attempts remain
//!         Retrying → Failed                       attempts exhausted
//! ```
//!
//! Attempts run strictly one after another. All of them reuse the same
//! [`IdempotencyToken`].

use std::future::Future;
use std::time::Duration;

use foodcmp_core::{ItemResult, MutationStatus};
use tracing::Instrument;

use crate::context::RunContext;
use crate::error::ProviderError;
use crate::provider::{IdempotencyToken, Provider};

/// Upper bound for a single backoff sleep.
pub const MAX_BACKOFF: Duration = Duration::from_secs(300);

#[derive(Debug, Clone, PartialEq)]
pub struct MutationPolicy {
    /// Total attempts, including the first. Values below 1 are treated as 1.
    pub max_attempts: u32,
    /// Backoff base in seconds.
    pub backoff_base_secs: f64,
    /// Deadline for each individual add/verify/remove call.
    pub call_timeout: Duration,
}

/// A state of the mutation state machine, tagged with its attempt number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationState {
    Start,
    Adding(u32),
    Verifying(u32),
    RollingBack(u32),
    Retrying(u32),
    Committed,
    Failed,
}

/// What happened while adding one item.
#[derive(Debug, Clone)]
pub struct MutationReport {
    pub outcome: MutationStatus,
    pub token: IdempotencyToken,
    /// Number of add attempts made.
    pub attempts: u32,
    /// Number of compensating removes issued.
    pub rollbacks: u32,
    pub errors: Vec<String>,
    /// Every state visited, in order.
    pub trace: Vec<MutationState>,
}

impl MutationReport {
    #[must_use]
    pub fn is_committed(&self) -> bool {
        self.outcome == MutationStatus::Committed
    }

    fn enter(&mut self, state: MutationState) {
        tracing::debug!(?state, "mutation state");
        self.trace.push(state);
    }
}

/// Wait before the attempt following attempt number `attempt` (1-based):
/// `base^attempt` seconds, capped at [`MAX_BACKOFF`].
#[must_use]
pub fn backoff_delay(backoff_base_secs: f64, attempt: u32) -> Duration {
    let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
    let secs = backoff_base_secs.max(0.0).powi(exponent);
    Duration::try_from_secs_f64(secs)
        .unwrap_or(MAX_BACKOFF)
        .min(MAX_BACKOFF)
}

/// Adds `item` to `provider`'s cart with verification, rollback and bounded
/// retry.
///
/// Never returns an error: exhaustion and cancellation both end in
/// [`MutationStatus::Failed`], which guarantees that every add this call
/// could not verify has been followed by a compensating remove.
pub async fn add_consistently(
    provider: &dyn Provider,
    item: &ItemResult,
    policy: &MutationPolicy,
    ctx: &RunContext,
) -> MutationReport {
    let span = ctx.provider_span(&provider.id());
    run_protocol(provider, item, policy, ctx)
        .instrument(span)
        .await
}

async fn run_protocol(
    provider: &dyn Provider,
    item: &ItemResult,
    policy: &MutationPolicy,
    ctx: &RunContext,
) -> MutationReport {
    let max_attempts = policy.max_attempts.max(1);
    let mut report = MutationReport {
        outcome: MutationStatus::Failed,
        token: IdempotencyToken::new(),
        attempts: 0,
        rollbacks: 0,
        errors: Vec::new(),
        trace: Vec::new(),
    };
    report.enter(MutationState::Start);

    if ctx.is_cancelled() {
        report.errors.push("run cancelled before cart add".to_string());
        report.enter(MutationState::Failed);
        return report;
    }

    // Set when an add errored: the provider may or may not have applied it.
    let mut unconfirmed_add = false;

    for attempt in 1..=max_attempts {
        report.attempts = attempt;
        report.enter(MutationState::Adding(attempt));

        let added = cancellable(
            ctx,
            policy.call_timeout,
            "add_item_to_cart",
            provider.add_item_to_cart(item, &report.token),
        )
        .await;

        match added {
            Ok(()) => {
                report.enter(MutationState::Verifying(attempt));
                let verified = cancellable(
                    ctx,
                    policy.call_timeout,
                    "verify_cart_contains",
                    provider.verify_cart_contains(item),
                )
                .await;

                match verified {
                    Ok(true) => {
                        tracing::info!(
                            attempt,
                            item = %item.item_name,
                            "cart add verified"
                        );
                        report.outcome = MutationStatus::Committed;
                        report.enter(MutationState::Committed);
                        return report;
                    }
                    Ok(false) => {
                        report
                            .errors
                            .push(format!("attempt {attempt}: item missing from cart after add"));
                    }
                    Err(e) => {
                        report
                            .errors
                            .push(format!("attempt {attempt}: verify failed: {e}"));
                    }
                }

                tracing::warn!(attempt, "cart add not verified; rolling back");
                report.enter(MutationState::RollingBack(attempt));
                rollback(provider, item, policy, attempt, &mut report).await;
                unconfirmed_add = false;
            }
            Err(e) => {
                tracing::warn!(attempt, error = %e, "cart add failed");
                report
                    .errors
                    .push(format!("attempt {attempt}: add failed: {e}"));
                unconfirmed_add = true;
            }
        }

        report.enter(MutationState::Retrying(attempt));

        if ctx.is_cancelled() {
            report.errors.push("mutation cancelled".to_string());
            break;
        }

        if attempt < max_attempts {
            let delay = backoff_delay(policy.backoff_base_secs, attempt);
            tracing::warn!(
                attempt,
                max_attempts,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                "retrying cart add after backoff"
            );
            tokio::select! {
                biased;
                () = ctx.cancellation().cancelled() => {
                    report.errors.push("mutation cancelled during backoff".to_string());
                    break;
                }
                () = tokio::time::sleep(delay) => {}
            }
        }
    }

    if unconfirmed_add {
        let attempt = report.attempts;
        report.enter(MutationState::RollingBack(attempt));
        rollback(provider, item, policy, attempt, &mut report).await;
    }

    tracing::warn!(
        attempts = report.attempts,
        rollbacks = report.rollbacks,
        item = %item.item_name,
        "cart add failed; no verified commit"
    );
    report.enter(MutationState::Failed);
    report
}

/// Issues one compensating remove.
///
/// Cleanup ignores run cancellation and is bounded only by the call timeout.
/// A failed remove is recorded and does not stop the protocol.
async fn rollback(
    provider: &dyn Provider,
    item: &ItemResult,
    policy: &MutationPolicy,
    attempt: u32,
    report: &mut MutationReport,
) {
    report.rollbacks += 1;
    let removed = tokio::time::timeout(policy.call_timeout, provider.remove_item_from_cart(item))
        .await
        .unwrap_or(Err(ProviderError::Timeout {
            operation: "remove_item_from_cart",
            after: policy.call_timeout,
        }));
    if let Err(e) = removed {
        tracing::error!(attempt, error = %e, "rollback failed");
        report
            .errors
            .push(format!("attempt {attempt}: rollback failed: {e}"));
    }
}

/// Runs one remote call bounded by `timeout` and the run's cancellation token.
async fn cancellable<T, Fut>(
    ctx: &RunContext,
    timeout: Duration,
    operation: &'static str,
    call: Fut,
) -> Result<T, ProviderError>
where
    Fut: Future<Output = Result<T, ProviderError>>,
{
    tokio::select! {
        biased;
        () = ctx.cancellation().cancelled() => Err(ProviderError::Cancelled(operation)),
        result = tokio::time::timeout(timeout, call) => {
            result.unwrap_or(Err(ProviderError::Timeout { operation, after: timeout }))
        }
    }
}
