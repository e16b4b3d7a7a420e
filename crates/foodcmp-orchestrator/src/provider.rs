//! The capability interface every provider adapter implements.
//!
//! The orchestration layer only ever sees `Arc<dyn Provider>`; how an adapter
//! talks to its storefront is its own business.

use async_trait::async_trait;
use foodcmp_core::{ItemResult, ProviderId, SearchRequest};
use uuid::Uuid;

use crate::error::ProviderError;

/// Result of [`Provider::initialize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Readiness {
    Ready,
    /// The provider cannot be used for this run. Reported, never fatal.
    Unavailable(String),
}

/// Opaque token identifying one logical cart add.
///
/// The same token is reused for every retry of that add so that a provider
/// which already applied an earlier attempt can collapse the repeat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IdempotencyToken(Uuid);

impl IdempotencyToken {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for IdempotencyToken {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for IdempotencyToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.hyphenated().fmt(f)
    }
}

/// Operations the orchestrator needs from a delivery provider.
///
/// Each operation may fail independently. Implementations must uphold:
///
/// - [`search_items`](Provider::search_items) has no effect on the remote cart.
/// - [`add_item_to_cart`](Provider::add_item_to_cart) called twice with the
///   same token leaves at most one cart line.
/// - [`verify_cart_contains`](Provider::verify_cart_contains) re-reads remote
///   state rather than trusting an earlier acknowledgement.
#[async_trait]
pub trait Provider: Send + Sync {
    fn id(&self) -> ProviderId;

    /// Establishes whatever session the provider needs.
    async fn initialize(&self) -> Readiness;

    /// Returns matches for `request`, already filtered and capped at
    /// `request.max_results_per_provider()`.
    async fn search_items(&self, request: &SearchRequest)
        -> Result<Vec<ItemResult>, ProviderError>;

    async fn add_item_to_cart(
        &self,
        item: &ItemResult,
        token: &IdempotencyToken,
    ) -> Result<(), ProviderError>;

    async fn verify_cart_contains(&self, item: &ItemResult) -> Result<bool, ProviderError>;

    /// Best-effort compensating removal.
    async fn remove_item_from_cart(&self, item: &ItemResult) -> Result<(), ProviderError>;
}
