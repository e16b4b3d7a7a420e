use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Every variable has a default; the lookup is injected so tests can drive it
/// from a plain `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_f64 = |var: &str, default: &str| -> Result<f64, ConfigError> {
        let value = or_default(var, default)
            .parse::<f64>()
            .map_err(|e| invalid(var, e.to_string()))?;
        if !value.is_finite() || value < 0.0 {
            return Err(invalid(var, format!("must be a non-negative number, got {value}")));
        }
        Ok(value)
    };

    let env = parse_environment(&or_default("FOODCMP_ENV", "development"))?;
    let log_level = or_default("FOODCMP_LOG_LEVEL", "info");
    let log_file = Some(or_default("FOODCMP_LOG_FILE", "./logs/foodcmp.log"))
        .filter(|p| !p.trim().is_empty())
        .map(PathBuf::from);
    let providers_path = PathBuf::from(or_default(
        "FOODCMP_PROVIDERS_PATH",
        "./config/providers.yaml",
    ));

    let provider_timeout_secs = parse_u64("FOODCMP_PROVIDER_TIMEOUT_SECS", "30")?;
    if provider_timeout_secs == 0 {
        return Err(invalid(
            "FOODCMP_PROVIDER_TIMEOUT_SECS",
            "must be at least 1".to_string(),
        ));
    }
    let http_request_timeout_secs = parse_u64("FOODCMP_HTTP_REQUEST_TIMEOUT_SECS", "15")?;
    let http_max_retries = parse_u32("FOODCMP_HTTP_MAX_RETRIES", "2")?;
    let user_agent = or_default("FOODCMP_USER_AGENT", "foodcmp/0.1 (deal-comparison)");

    let mutation_max_attempts = parse_u32("FOODCMP_MUTATION_MAX_ATTEMPTS", "3")?;
    if mutation_max_attempts == 0 {
        return Err(invalid(
            "FOODCMP_MUTATION_MAX_ATTEMPTS",
            "must be at least 1".to_string(),
        ));
    }
    let mutation_backoff_base_secs = parse_f64("FOODCMP_MUTATION_BACKOFF_BASE_SECS", "2.0")?;

    let default_min_rating = parse_f64("FOODCMP_DEFAULT_MIN_RATING", "3.8")?;
    if default_min_rating > crate::request::MAX_RATING {
        return Err(invalid(
            "FOODCMP_DEFAULT_MIN_RATING",
            format!("must be between 0 and 5, got {default_min_rating}"),
        ));
    }
    let default_max_results = parse_u32("FOODCMP_DEFAULT_MAX_RESULTS", "5")?;

    Ok(AppConfig {
        env,
        log_level,
        log_file,
        providers_path,
        provider_timeout_secs,
        http_request_timeout_secs,
        http_max_retries,
        user_agent,
        mutation_max_attempts,
        mutation_backoff_base_secs,
        default_min_rating,
        default_max_results,
    })
}

/// Parse a string into an `Environment` variant.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidEnvVar`] for anything other than
/// `development`, `test` or `production`.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "FOODCMP_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
