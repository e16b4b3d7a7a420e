//! HTTP adapter for storefronts exposing the foodcmp JSON API.
//!
//! [`HttpProvider`] implements [`foodcmp_orchestrator::Provider`] over
//! `reqwest`, with retry on transient failures for read-only calls.

pub mod client;
pub mod error;
pub(crate) mod retry;
pub mod types;

pub use client::{HttpProvider, HttpSettings};
pub use error::HttpProviderError;
