use std::time::Duration;

use foodcmp_core::AppConfig;

use crate::mutation::MutationPolicy;

/// Knobs for one orchestrated run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunPolicy {
    /// Deadline for each provider's initialize + search, and for each cart
    /// call while mutating.
    pub per_provider_timeout: Duration,
    pub max_attempts: u32,
    /// Backoff base in seconds; the wait after attempt `n` is `base^n`.
    pub backoff_base_secs: f64,
    /// When `false`, the run stops after selecting the best deal.
    pub mutate: bool,
}

impl Default for RunPolicy {
    fn default() -> Self {
        Self {
            per_provider_timeout: Duration::from_secs(30),
            max_attempts: 3,
            backoff_base_secs: 2.0,
            mutate: true,
        }
    }
}

impl RunPolicy {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            per_provider_timeout: Duration::from_secs(config.provider_timeout_secs),
            max_attempts: config.mutation_max_attempts,
            backoff_base_secs: config.mutation_backoff_base_secs,
            mutate: true,
        }
    }

    #[must_use]
    pub fn mutation_policy(&self) -> MutationPolicy {
        MutationPolicy {
            max_attempts: self.max_attempts,
            backoff_base_secs: self.backoff_base_secs,
            call_timeout: self.per_provider_timeout,
        }
    }
}
