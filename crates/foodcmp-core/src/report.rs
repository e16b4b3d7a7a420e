//! Per-provider and per-run report values.
//!
//! A [`RunReport`] is the only externally observable artifact of a run. Every
//! optional numeric field serializes as `null` when absent rather than being
//! skipped or zeroed, so consumers can tell "not measured" from `0`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::item::{ItemResult, ProviderId};
use crate::request::SearchRequest;

/// Outcome of one provider's search and, if it won, cart phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderReport {
    pub provider: ProviderId,
    pub items_found: usize,
    /// Number of verified cart commits on this provider.
    pub successful_additions: u32,
    pub errors: Vec<String>,
    pub results: Vec<ItemResult>,
    /// `false` if the provider could not be reached or initialized in time.
    pub available: bool,
    pub latency_ms: Option<u64>,
}

impl ProviderReport {
    /// An empty report for a provider that answered.
    #[must_use]
    pub fn available(provider: ProviderId) -> Self {
        Self {
            provider,
            items_found: 0,
            successful_additions: 0,
            errors: Vec::new(),
            results: Vec::new(),
            available: true,
            latency_ms: None,
        }
    }

    /// A report for a provider that could not be used at all.
    #[must_use]
    pub fn unavailable(provider: ProviderId, error: impl Into<String>) -> Self {
        Self {
            available: false,
            errors: vec![error.into()],
            ..Self::available(provider)
        }
    }

    /// Replaces the result list, keeping `items_found` in sync.
    pub fn set_results(&mut self, results: Vec<ItemResult>) {
        self.items_found = results.len();
        self.results = results;
    }
}

/// Whether the consistent cart add ended with a verified commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MutationStatus {
    Committed,
    Failed,
}

impl std::fmt::Display for MutationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MutationStatus::Committed => write!(f, "committed"),
            MutationStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Summary of the cart phase for the best deal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MutationSummary {
    pub provider: ProviderId,
    pub restaurant_name: String,
    pub item_name: String,
    pub outcome: MutationStatus,
    pub attempts: u32,
    pub rollbacks: u32,
}

/// Frozen result of one comparison run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub search_request: SearchRequest,
    pub providers_processed: Vec<ProviderId>,
    pub total_options: usize,
    pub best_deal: Option<ItemResult>,
    pub provider_reports: Vec<ProviderReport>,
    pub mutation: Option<MutationSummary>,
    pub execution_time_seconds: f64,
    pub timestamp: DateTime<Utc>,
}

impl RunReport {
    /// Iterates every accepted item across all providers, in provider order.
    pub fn all_results(&self) -> impl Iterator<Item = &ItemResult> {
        self.provider_reports.iter().flat_map(|r| r.results.iter())
    }

    /// Number of providers that answered.
    #[must_use]
    pub fn available_providers(&self) -> usize {
        self.provider_reports.iter().filter(|r| r.available).count()
    }
}
