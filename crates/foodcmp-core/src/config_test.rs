use std::collections::HashMap;
use std::env::VarError;

use super::*;

fn lookup_from_map<'a>(
    map: &'a HashMap<&'a str, &'a str>,
) -> impl Fn(&str) -> Result<String, VarError> + 'a {
    move |key| {
        map.get(key)
            .map(|v| (*v).to_string())
            .ok_or(VarError::NotPresent)
    }
}

#[test]
fn parse_environment_known_values() {
    assert_eq!(
        parse_environment("development").unwrap(),
        Environment::Development
    );
    assert_eq!(parse_environment("test").unwrap(), Environment::Test);
    assert_eq!(
        parse_environment("production").unwrap(),
        Environment::Production
    );
}

#[test]
fn parse_environment_unknown_fails() {
    let err = parse_environment("staging").unwrap_err();
    assert!(matches!(err, ConfigError::InvalidEnvVar { ref var, .. } if var == "FOODCMP_ENV"));
}

#[test]
fn build_app_config_uses_defaults_for_empty_env() {
    let map: HashMap<&str, &str> = HashMap::new();
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.env, Environment::Development);
    assert_eq!(cfg.log_level, "info");
    assert_eq!(
        cfg.log_file.as_deref(),
        Some(std::path::Path::new("./logs/foodcmp.log"))
    );
    assert_eq!(
        cfg.providers_path.to_string_lossy(),
        "./config/providers.yaml"
    );
    assert_eq!(cfg.provider_timeout_secs, 30);
    assert_eq!(cfg.http_request_timeout_secs, 15);
    assert_eq!(cfg.http_max_retries, 2);
    assert_eq!(cfg.user_agent, "foodcmp/0.1 (deal-comparison)");
    assert_eq!(cfg.mutation_max_attempts, 3);
    assert!((cfg.mutation_backoff_base_secs - 2.0).abs() < f64::EPSILON);
    assert!((cfg.default_min_rating - 3.8).abs() < f64::EPSILON);
    assert_eq!(cfg.default_max_results, 5);
}

#[test]
fn build_app_config_reads_overrides() {
    let mut map = HashMap::new();
    map.insert("FOODCMP_ENV", "production");
    map.insert("FOODCMP_PROVIDER_TIMEOUT_SECS", "10");
    map.insert("FOODCMP_MUTATION_MAX_ATTEMPTS", "5");
    map.insert("FOODCMP_MUTATION_BACKOFF_BASE_SECS", "1.5");
    map.insert("FOODCMP_USER_AGENT", "custom-agent/2.0");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.env, Environment::Production);
    assert_eq!(cfg.provider_timeout_secs, 10);
    assert_eq!(cfg.mutation_max_attempts, 5);
    assert!((cfg.mutation_backoff_base_secs - 1.5).abs() < f64::EPSILON);
    assert_eq!(cfg.user_agent, "custom-agent/2.0");
}

#[test]
fn build_app_config_empty_log_file_disables_file_logging() {
    let mut map = HashMap::new();
    map.insert("FOODCMP_LOG_FILE", "");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert!(cfg.log_file.is_none());

    map.insert("FOODCMP_LOG_FILE", "/var/log/foodcmp/run.log");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(
        cfg.log_file.as_deref(),
        Some(std::path::Path::new("/var/log/foodcmp/run.log"))
    );
}

#[test]
fn build_app_config_rejects_non_numeric_timeout() {
    let mut map = HashMap::new();
    map.insert("FOODCMP_PROVIDER_TIMEOUT_SECS", "not-a-number");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "FOODCMP_PROVIDER_TIMEOUT_SECS"),
        "expected InvalidEnvVar(FOODCMP_PROVIDER_TIMEOUT_SECS), got: {result:?}"
    );
}

#[test]
fn build_app_config_rejects_zero_timeout() {
    let mut map = HashMap::new();
    map.insert("FOODCMP_PROVIDER_TIMEOUT_SECS", "0");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "FOODCMP_PROVIDER_TIMEOUT_SECS"),
        "expected InvalidEnvVar(FOODCMP_PROVIDER_TIMEOUT_SECS), got: {result:?}"
    );
}

#[test]
fn build_app_config_rejects_zero_max_attempts() {
    let mut map = HashMap::new();
    map.insert("FOODCMP_MUTATION_MAX_ATTEMPTS", "0");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "FOODCMP_MUTATION_MAX_ATTEMPTS"),
        "expected InvalidEnvVar(FOODCMP_MUTATION_MAX_ATTEMPTS), got: {result:?}"
    );
}

#[test]
fn build_app_config_rejects_negative_backoff_base() {
    let mut map = HashMap::new();
    map.insert("FOODCMP_MUTATION_BACKOFF_BASE_SECS", "-2");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "FOODCMP_MUTATION_BACKOFF_BASE_SECS"),
        "expected InvalidEnvVar(FOODCMP_MUTATION_BACKOFF_BASE_SECS), got: {result:?}"
    );
}

#[test]
fn build_app_config_rejects_min_rating_above_five() {
    let mut map = HashMap::new();
    map.insert("FOODCMP_DEFAULT_MIN_RATING", "6");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "FOODCMP_DEFAULT_MIN_RATING"),
        "expected InvalidEnvVar(FOODCMP_DEFAULT_MIN_RATING), got: {result:?}"
    );
}
