use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    /// Plain-text copy of the log. `None` when `FOODCMP_LOG_FILE` is set empty.
    pub log_file: Option<PathBuf>,
    pub providers_path: PathBuf,
    /// Deadline for one provider's initialize + search, and for each remote
    /// call made while mutating a cart.
    pub provider_timeout_secs: u64,
    pub http_request_timeout_secs: u64,
    pub http_max_retries: u32,
    pub user_agent: String,
    pub mutation_max_attempts: u32,
    /// Base of the exponential backoff between cart attempts: the wait after
    /// attempt `n` is `base^n` seconds.
    pub mutation_backoff_base_secs: f64,
    pub default_min_rating: f64,
    pub default_max_results: u32,
}
