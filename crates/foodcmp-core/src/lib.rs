//! Shared data model and configuration for foodcmp.
//!
//! Holds the validated [`SearchRequest`], the [`ItemResult`] captured from a
//! provider, the per-provider and per-run reports, and the env/file
//! configuration loaders used by the CLI.

pub mod app_config;
pub mod config;
pub mod error;
pub mod item;
pub mod providers;
pub mod report;
pub mod request;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use error::{ConfigError, RequestError};
pub use item::{ItemResult, OtherProvider, ProviderId};
pub use providers::{load_providers, ProviderConfig, ProvidersFile};
pub use report::{MutationStatus, MutationSummary, ProviderReport, RunReport};
pub use request::{load_request, RawSearchRequest, SearchRequest};
