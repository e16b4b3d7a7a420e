use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use foodcmp_core::{
    MutationStatus, MutationSummary, ProviderReport, RawSearchRequest, RunReport, SearchRequest,
};
use tracing::Instrument;

use crate::context::RunContext;
use crate::error::OrchestratorError;
use crate::executor::run_searches;
use crate::mutation::{add_consistently, MutationReport};
use crate::policy::RunPolicy;
use crate::provider::Provider;
use crate::selection::select_best_in_reports;

/// Drives one comparison run end to end: search every provider, pick the best
/// deal, and optionally add it to its provider's cart.
pub struct Orchestrator {
    providers: Vec<Arc<dyn Provider>>,
    policy: RunPolicy,
    ctx: RunContext,
}

impl Orchestrator {
    #[must_use]
    pub fn new(providers: Vec<Arc<dyn Provider>>, policy: RunPolicy, ctx: RunContext) -> Self {
        Self {
            providers,
            policy,
            ctx,
        }
    }

    #[must_use]
    pub fn context(&self) -> &RunContext {
        &self.ctx
    }

    #[must_use]
    pub fn policy(&self) -> &RunPolicy {
        &self.policy
    }

    /// Validates `raw` and runs it.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::InvalidRequest`] if the request is
    /// malformed. No provider is contacted in that case.
    pub async fn run_raw(&self, raw: RawSearchRequest) -> Result<RunReport, OrchestratorError> {
        let request = raw.validate()?;
        Ok(self.run(request).await)
    }

    /// Runs an already validated request. Always produces a report; provider
    /// failures are recorded in it.
    pub async fn run(&self, request: SearchRequest) -> RunReport {
        self.run_inner(request)
            .instrument(self.ctx.span().clone())
            .await
    }

    async fn run_inner(&self, request: SearchRequest) -> RunReport {
        let started = Instant::now();
        tracing::info!(
            providers = self.providers.len(),
            items = ?request.food_items(),
            "starting comparison run"
        );

        let outcome = run_searches(
            &self.providers,
            &request,
            self.policy.per_provider_timeout,
            &self.ctx,
        )
        .await;
        let mut reports = outcome.reports;

        let selected =
            select_best_in_reports(&reports, &request).map(|(index, item)| (index, item.clone()));
        match &selected {
            Some((_, best)) => tracing::info!(
                provider = %best.provider,
                restaurant = %best.restaurant_name,
                item = %best.item_name,
                price = best.effective_price(),
                "best deal selected"
            ),
            None => tracing::info!("no item passed the filters"),
        }

        // The report index doubles as the provider index: reports come back
        // in submission order.
        let mutation = match &selected {
            Some((index, best)) if self.policy.mutate => {
                let provider = self.providers[*index].as_ref();
                let result =
                    add_consistently(provider, best, &self.policy.mutation_policy(), &self.ctx)
                        .await;
                record_mutation(&mut reports[*index], &result);
                Some(MutationSummary {
                    provider: best.provider.clone(),
                    restaurant_name: best.restaurant_name.clone(),
                    item_name: best.item_name.clone(),
                    outcome: result.outcome,
                    attempts: result.attempts,
                    rollbacks: result.rollbacks,
                })
            }
            _ => None,
        };
        let best_deal = selected.map(|(_, item)| item);

        let total_options = reports.iter().map(|r| r.items_found).sum();
        let elapsed = started.elapsed().as_secs_f64();
        let execution_time_seconds = (elapsed * 100.0).round() / 100.0;

        tracing::info!(
            total_options,
            available = reports.iter().filter(|r| r.available).count(),
            execution_time_seconds,
            "comparison run complete"
        );

        RunReport {
            run_id: self.ctx.run_id(),
            providers_processed: reports.iter().map(|r| r.provider.clone()).collect(),
            search_request: request,
            total_options,
            best_deal,
            provider_reports: reports,
            mutation,
            execution_time_seconds,
            timestamp: Utc::now(),
        }
    }
}

fn record_mutation(report: &mut ProviderReport, result: &MutationReport) {
    if result.outcome == MutationStatus::Committed {
        report.successful_additions += 1;
    }
    report.errors.extend(result.errors.iter().cloned());
}
