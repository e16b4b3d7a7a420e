//! Fan-out/fan-in search across providers.
//!
//! Every provider runs `initialize` + `search_items` under its own deadline.
//! A provider that times out, is unavailable, or errors contributes a report
//! describing the failure; it never aborts its siblings or the call.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use foodcmp_core::{ItemResult, ProviderId, ProviderReport, SearchRequest};
use futures::future::join_all;
use tracing::Instrument;

use crate::context::RunContext;
use crate::error::ProviderError;
use crate::provider::{Provider, Readiness};

/// Aggregate of one fan-out search.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    /// Accepted items of every provider, concatenated in submission order.
    pub items: Vec<ItemResult>,
    /// One report per provider, in submission order.
    pub reports: Vec<ProviderReport>,
}

enum SearchPhase {
    Unavailable(String),
    SearchFailed(ProviderError),
    Searched(Vec<ItemResult>),
}

/// Searches every provider concurrently and collects their reports.
///
/// Results are returned in the order `providers` were given, regardless of
/// which provider finished first. Only items that pass the request filters
/// are accepted into a report.
pub async fn run_searches(
    providers: &[Arc<dyn Provider>],
    request: &SearchRequest,
    per_provider_timeout: Duration,
    ctx: &RunContext,
) -> SearchOutcome {
    let tasks = providers
        .iter()
        .map(|provider| search_one(provider.as_ref(), request, per_provider_timeout, ctx));
    let reports: Vec<ProviderReport> = join_all(tasks).await;

    let items = reports
        .iter()
        .flat_map(|r| r.results.iter().cloned())
        .collect();

    SearchOutcome { items, reports }
}

async fn search_one(
    provider: &dyn Provider,
    request: &SearchRequest,
    timeout: Duration,
    ctx: &RunContext,
) -> ProviderReport {
    let id = provider.id();
    let span = ctx.provider_span(&id);

    async {
        let started = Instant::now();
        let phase = async {
            if let Readiness::Unavailable(reason) = provider.initialize().await {
                return SearchPhase::Unavailable(reason);
            }
            match provider.search_items(request).await {
                Ok(items) => SearchPhase::Searched(items),
                Err(e) => SearchPhase::SearchFailed(e),
            }
        };

        let outcome = tokio::select! {
            biased;
            () = ctx.cancellation().cancelled() => Err(ProviderError::Cancelled("search")),
            result = tokio::time::timeout(timeout, phase) => {
                result.map_err(|_| ProviderError::Timeout { operation: "search", after: timeout })
            }
        };
        let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        match outcome {
            Err(e) => {
                tracing::warn!(error = %e, "provider dropped from run");
                ProviderReport::unavailable(id, e.to_string())
            }
            Ok(SearchPhase::Unavailable(reason)) => {
                let e = ProviderError::Unavailable(reason);
                tracing::warn!(error = %e, "provider failed to initialize");
                ProviderReport {
                    latency_ms: Some(latency_ms),
                    ..ProviderReport::unavailable(id, e.to_string())
                }
            }
            Ok(SearchPhase::SearchFailed(e)) => {
                tracing::warn!(error = %e, "provider search failed");
                let mut report = ProviderReport::available(id);
                report.errors.push(format!("search failed: {e}"));
                report.latency_ms = Some(latency_ms);
                report
            }
            Ok(SearchPhase::Searched(items)) => {
                let returned = items.len();
                let accepted = accept_items(&id, items, request);
                if accepted.len() < returned {
                    tracing::debug!(
                        returned,
                        accepted = accepted.len(),
                        "dropped items failing filters, duplicates, or over the cap"
                    );
                }
                tracing::info!(count = accepted.len(), latency_ms, "provider search complete");
                let mut report = ProviderReport::available(id);
                report.set_results(accepted);
                report.latency_ms = Some(latency_ms);
                report
            }
        }
    }
    .instrument(span)
    .await
}

/// Admits adapter results into a report.
///
/// Items are stamped with the provider that returned them, normalized,
/// filtered against `request`, de-duplicated, and capped at the per-provider
/// limit, in that order.
pub(crate) fn accept_items(
    provider: &ProviderId,
    items: Vec<ItemResult>,
    request: &SearchRequest,
) -> Vec<ItemResult> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .map(|mut item| {
            if item.provider != *provider {
                tracing::warn!(
                    reported = %item.provider,
                    "adapter labelled item with another provider; relabelling"
                );
                item.provider = provider.clone();
            }
            item
        })
        .filter_map(ItemResult::normalized)
        .filter(|item| item.matches(request))
        .filter(|item| seen.insert(item.dedup_key()))
        .take(request.max_results_per_provider())
        .collect()
}

#[cfg(test)]
mod tests {
    use foodcmp_core::RawSearchRequest;

    use super::*;

    fn request(price_min: Option<f64>, price_max: Option<f64>, cap: u32) -> SearchRequest {
        let mut raw = RawSearchRequest::new(["pizza"]);
        raw.min_rating = 4.0;
        raw.price_min = price_min;
        raw.price_max = price_max;
        raw.max_results_per_provider = cap;
        raw.validate().unwrap()
    }

    fn item(name: &str, price: f64, rating: Option<f64>) -> ItemResult {
        let mut i = ItemResult::new(ProviderId::Swiggy, "Domino's", name, price);
        i.rating = rating;
        i
    }

    #[test]
    fn accept_items_applies_rating_and_price_filters() {
        let req = request(Some(100.0), Some(300.0), 10);
        let accepted = accept_items(
            &ProviderId::Swiggy,
            vec![
                item("ok", 200.0, Some(4.5)),
                item("low rating", 200.0, Some(3.9)),
                item("too cheap", 50.0, Some(4.5)),
                item("too dear", 350.0, Some(4.5)),
                item("unrated", 150.0, None),
            ],
            &req,
        );
        let names: Vec<&str> = accepted.iter().map(|i| i.item_name.as_str()).collect();
        assert_eq!(names, vec!["ok", "unrated"]);
        assert!(accepted.iter().all(|i| i.matches(&req)));
    }

    #[test]
    fn accept_items_caps_after_filtering() {
        let req = request(None, None, 2);
        let accepted = accept_items(
            &ProviderId::Swiggy,
            vec![
                item("a", 100.0, Some(2.0)),
                item("b", 110.0, Some(4.2)),
                item("c", 120.0, Some(4.3)),
                item("d", 130.0, Some(4.4)),
            ],
            &req,
        );
        let names: Vec<&str> = accepted.iter().map(|i| i.item_name.as_str()).collect();
        assert_eq!(names, vec!["b", "c"]);
    }

    #[test]
    fn accept_items_drops_duplicates() {
        let req = request(None, None, 10);
        let accepted = accept_items(
            &ProviderId::Swiggy,
            vec![item("a", 100.0, Some(4.2)), item("a", 100.0, Some(4.2))],
            &req,
        );
        assert_eq!(accepted.len(), 1);
    }

    #[test]
    fn accept_items_relabels_foreign_provider() {
        let req = request(None, None, 10);
        let mut foreign = item("a", 100.0, Some(4.2));
        foreign.provider = ProviderId::Zomato;
        let accepted = accept_items(&ProviderId::Swiggy, vec![foreign], &req);
        assert_eq!(accepted[0].provider, ProviderId::Swiggy);
    }

    #[test]
    fn accept_items_filters_on_discounted_price() {
        let req = request(None, Some(250.0), 10);
        let accepted = accept_items(
            &ProviderId::Swiggy,
            vec![item("discounted", 300.0, Some(4.5)).with_final_price(240.0)],
            &req,
        );
        assert_eq!(accepted.len(), 1);
        assert_eq!(accepted[0].discount_percentage, Some(20.0));
    }
}
