use std::net::SocketAddr;
use std::path::PathBuf;

use crate::app_config::{Acquisition, AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value cannot be parsed.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the
/// process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files — useful for
/// testing or when the caller manages env setup.
///
/// # Errors
///
/// Returns `ConfigError` if a value cannot be parsed.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup
/// function.
///
/// This is the core parsing/validation logic, decoupled from the actual
/// environment so it can be tested with a pure `HashMap` lookup — no
/// `set_var`/`remove_var` needed.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let or_default =
        |var: &str, default: &str| -> String { lookup(var).unwrap_or_else(|_| default.to_string()) };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar {
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

    let env = parse_environment(&or_default("ARGENT_ENV", "development"));
    let bind_addr = parse_addr("ARGENT_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("ARGENT_LOG_LEVEL", "info");
    let state_path = PathBuf::from(or_default("ARGENT_STATE_PATH", "./data/state.yaml"));

    let vendor_api_url = or_default(
        "ARGENT_VENDOR_API_URL",
        "https://api.shirazgoldandsilver.ir/api/v1",
    );
    let vendor_site_url = or_default("ARGENT_VENDOR_SITE_URL", "https://shirazgoldandsilver.ir");

    let request_timeout_secs = parse_u64("ARGENT_REQUEST_TIMEOUT_SECS", "30")?;

    let refresh_interval_secs = parse_u64("ARGENT_REFRESH_INTERVAL_SECS", "900")?;
    if refresh_interval_secs == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "ARGENT_REFRESH_INTERVAL_SECS".to_string(),
            reason: "interval must be at least 1 second".to_string(),
        });
    }

    let acquisition = parse_acquisition(&or_default("ARGENT_ACQUISITION", "api"));
    let webdriver_url = or_default("ARGENT_WEBDRIVER_URL", "http://localhost:4444");
    let user_agent = or_default("ARGENT_USER_AGENT", "Mozilla/5.0");

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        state_path,
        vendor_api_url,
        vendor_site_url,
        request_timeout_secs,
        refresh_interval_secs,
        acquisition,
        webdriver_url,
        user_agent,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}

/// Parse a string into an `Acquisition` variant.
///
/// Unrecognized values default to `Acquisition::Api`.
fn parse_acquisition(s: &str) -> Acquisition {
    match s {
        "browser" => Acquisition::Browser,
        _ => Acquisition::Api,
    }
}
