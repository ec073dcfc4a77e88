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

/// Returns a map with all required env vars populated with valid defaults.
fn full_env<'a>() -> HashMap<&'a str, &'a str> {
    let mut m = HashMap::new();
    m.insert("DYNAMATE_API_BASE_URL", "http://localhost:3001");
    m
}

#[test]
fn parse_environment_development() {
    assert_eq!(
        parse_environment("development").unwrap(),
        Environment::Development
    );
}

#[test]
fn parse_environment_test() {
    assert_eq!(parse_environment("test").unwrap(), Environment::Test);
}

#[test]
fn parse_environment_production() {
    assert_eq!(
        parse_environment("production").unwrap(),
        Environment::Production
    );
}

#[test]
fn parse_environment_unknown_fails() {
    let err = parse_environment("unknown").unwrap_err();
    assert!(matches!(err, ConfigError::InvalidEnvVar { ref var, .. } if var == "DYNAMATE_ENV"));
}

#[test]
fn build_app_config_fails_without_api_base_url() {
    let map: HashMap<&str, &str> = HashMap::new();
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::MissingEnvVar(ref v)) if v == "DYNAMATE_API_BASE_URL"),
        "expected MissingEnvVar(DYNAMATE_API_BASE_URL), got: {result:?}"
    );
}

#[test]
fn build_app_config_treats_blank_api_base_url_as_missing() {
    let mut map = full_env();
    map.insert("DYNAMATE_API_BASE_URL", "  ");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::MissingEnvVar(ref v)) if v == "DYNAMATE_API_BASE_URL"),
        "expected MissingEnvVar(DYNAMATE_API_BASE_URL), got: {result:?}"
    );
}

#[test]
fn build_app_config_succeeds_with_all_required_vars() {
    let map = full_env();
    let result = build_app_config(lookup_from_map(&map));
    assert!(result.is_ok(), "expected Ok, got: {result:?}");
    let cfg = result.unwrap();
    assert_eq!(cfg.env, Environment::Development);
    assert_eq!(cfg.api_base_url, "http://localhost:3001");
    assert_eq!(cfg.log_level, "info");
    assert_eq!(cfg.request_timeout_secs, 30);
    assert_eq!(cfg.user_agent, "dynamate/0.1 (price-scheduler)");
    assert_eq!(cfg.max_retries, 3);
    assert_eq!(cfg.retry_backoff_base_ms, 500);
}

#[test]
fn api_base_url_trailing_slash_is_stripped() {
    let mut map = full_env();
    map.insert("DYNAMATE_API_BASE_URL", "https://prices.example.com/api/");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.api_base_url, "https://prices.example.com/api");
}

#[test]
fn api_base_url_without_scheme_fails() {
    let mut map = full_env();
    map.insert("DYNAMATE_API_BASE_URL", "localhost:3001");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "DYNAMATE_API_BASE_URL"),
        "expected InvalidEnvVar(DYNAMATE_API_BASE_URL), got: {result:?}"
    );
}

#[test]
fn api_base_url_without_host_fails() {
    let mut map = full_env();
    map.insert("DYNAMATE_API_BASE_URL", "https:///tags");
    let result = build_app_config(lookup_from_map(&map));
    assert!(matches!(result, Err(ConfigError::InvalidEnvVar { .. })));
}

#[test]
fn request_timeout_secs_override() {
    let mut map = full_env();
    map.insert("DYNAMATE_REQUEST_TIMEOUT_SECS", "60");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.request_timeout_secs, 60);
}

#[test]
fn request_timeout_secs_invalid() {
    let mut map = full_env();
    map.insert("DYNAMATE_REQUEST_TIMEOUT_SECS", "not-a-number");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "DYNAMATE_REQUEST_TIMEOUT_SECS"),
        "expected InvalidEnvVar(DYNAMATE_REQUEST_TIMEOUT_SECS), got: {result:?}"
    );
}

#[test]
fn request_timeout_secs_zero_fails() {
    let mut map = full_env();
    map.insert("DYNAMATE_REQUEST_TIMEOUT_SECS", "0");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "DYNAMATE_REQUEST_TIMEOUT_SECS"),
        "expected InvalidEnvVar(DYNAMATE_REQUEST_TIMEOUT_SECS), got: {result:?}"
    );
}

#[test]
fn user_agent_override() {
    let mut map = full_env();
    map.insert("DYNAMATE_USER_AGENT", "custom-agent/2.0");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.user_agent, "custom-agent/2.0");
}

#[test]
fn max_retries_override() {
    let mut map = full_env();
    map.insert("DYNAMATE_MAX_RETRIES", "0");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.max_retries, 0);
}

#[test]
fn max_retries_invalid() {
    let mut map = full_env();
    map.insert("DYNAMATE_MAX_RETRIES", "-1");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "DYNAMATE_MAX_RETRIES"),
        "expected InvalidEnvVar(DYNAMATE_MAX_RETRIES), got: {result:?}"
    );
}

#[test]
fn retry_backoff_base_ms_override() {
    let mut map = full_env();
    map.insert("DYNAMATE_RETRY_BACKOFF_BASE_MS", "1000");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.retry_backoff_base_ms, 1000);
}

#[test]
fn build_app_config_fails_on_invalid_env() {
    let mut map = full_env();
    map.insert("DYNAMATE_ENV", "producton");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "DYNAMATE_ENV"),
        "expected InvalidEnvVar(DYNAMATE_ENV), got: {result:?}"
    );
}

#[test]
fn base_url_override_wins_over_env() {
    let map = full_env();
    let lookup = with_base_url_override(lookup_from_map(&map), Some("https://staging.example.com/"));
    let cfg = build_app_config(lookup).unwrap();
    assert_eq!(cfg.api_base_url, "https://staging.example.com");
}

#[test]
fn base_url_override_satisfies_missing_env() {
    let map: HashMap<&str, &str> = HashMap::new();
    let lookup = with_base_url_override(lookup_from_map(&map), Some("http://localhost:3001"));
    let cfg = build_app_config(lookup).unwrap();
    assert_eq!(cfg.api_base_url, "http://localhost:3001");
    assert_eq!(cfg.max_retries, 3);
}

#[test]
fn base_url_override_is_validated() {
    let map = full_env();
    let lookup = with_base_url_override(lookup_from_map(&map), Some("ftp://nope"));
    let result = build_app_config(lookup);
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "DYNAMATE_API_BASE_URL"),
        "expected InvalidEnvVar(DYNAMATE_API_BASE_URL), got: {result:?}"
    );
}

#[test]
fn no_override_falls_through_to_env() {
    let map = full_env();
    let cfg = build_app_config(with_base_url_override(lookup_from_map(&map), None)).unwrap();
    assert_eq!(cfg.api_base_url, "http://localhost:3001");
}
