use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
/// An explicit `api_base_url` (the CLI's `--api-base-url`) takes precedence
/// over `DYNAMATE_API_BASE_URL`.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_with_base_url(api_base_url: Option<&str>) -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    build_app_config(with_base_url_override(|key| std::env::var(key), api_base_url))
}

/// Wraps `lookup` so `DYNAMATE_API_BASE_URL` resolves to `api_base_url` when
/// one is given.
fn with_base_url_override<'a, F>(
    lookup: F,
    api_base_url: Option<&'a str>,
) -> impl Fn(&str) -> Result<String, std::env::VarError> + 'a
where
    F: Fn(&str) -> Result<String, std::env::VarError> + 'a,
{
    move |key| match api_base_url {
        Some(url) if key == "DYNAMATE_API_BASE_URL" => Ok(url.to_string()),
        _ => lookup(key),
    }
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so tests can drive it from a `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let api_base_url = normalize_base_url(
        "DYNAMATE_API_BASE_URL",
        &require("DYNAMATE_API_BASE_URL")?,
    )?;

    let env = parse_environment(&or_default("DYNAMATE_ENV", "development"))?;
    let log_level = or_default("DYNAMATE_LOG_LEVEL", "info");

    let request_timeout_secs = parse_u64("DYNAMATE_REQUEST_TIMEOUT_SECS", "30")?;
    if request_timeout_secs == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "DYNAMATE_REQUEST_TIMEOUT_SECS".to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }
    let user_agent = or_default("DYNAMATE_USER_AGENT", "dynamate/0.1 (price-scheduler)");
    let max_retries = parse_u32("DYNAMATE_MAX_RETRIES", "3")?;
    let retry_backoff_base_ms = parse_u64("DYNAMATE_RETRY_BACKOFF_BASE_MS", "500")?;

    Ok(AppConfig {
        api_base_url,
        env,
        log_level,
        request_timeout_secs,
        user_agent,
        max_retries,
        retry_backoff_base_ms,
    })
}

/// Checks that `raw` is an absolute http(s) URL with a host and strips
/// trailing slashes so paths can be appended with a single `/`.
fn normalize_base_url(var: &str, raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let invalid = |reason: &str| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason: format!("\"{raw}\" {reason}"),
    };

    let rest = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .ok_or_else(|| invalid("must start with http:// or https://"))?;

    let host = rest.split(['/', '?', '#']).next().unwrap_or_default();
    if host.is_empty() {
        return Err(invalid("has no host"));
    }

    Ok(trimmed.to_string())
}

/// Parse a string into an `Environment` variant.
///
/// Unknown values are rejected so a typo cannot silently select development.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "DYNAMATE_ENV".to_string(),
            reason: format!("unknown environment \"{other}\""),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
