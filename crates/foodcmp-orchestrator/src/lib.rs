//! Provider-agnostic orchestration for foodcmp.
//!
//! Fans a [`SearchRequest`](foodcmp_core::SearchRequest) out to every
//! registered [`Provider`], picks the best deal across their reports, and adds
//! it to the origin provider's cart through a verify-then-rollback protocol.

pub mod context;
pub mod error;
pub mod executor;
pub mod mutation;
pub mod orchestrator;
pub mod policy;
pub mod provider;
pub mod selection;

pub use context::RunContext;
pub use error::{OrchestratorError, ProviderError};
pub use executor::{run_searches, SearchOutcome};
pub use mutation::{
    add_consistently, backoff_delay, MutationPolicy, MutationReport, MutationState,
};
pub use orchestrator::Orchestrator;
pub use policy::RunPolicy;
pub use provider::{IdempotencyToken, Provider, Readiness};
pub use selection::{select_best_deal, select_best_in_reports};
