//! Configuration loading and resolution.

use std::time::Duration;

use timeir_crawler::{SessionConfig, DEFAULT_TARGET_URL};

/// Environment variable overriding the target page.
pub const URL_ENV: &str = "TIMEIR_URL";

/// Resolve the page to crawl: explicit flag, then `TIMEIR_URL`, then the default.
pub fn resolve_target_url(explicit: Option<&str>) -> String {
    if let Some(url) = explicit {
        return url.to_string();
    }

    if let Ok(env_url) = std::env::var(URL_ENV) {
        if !env_url.trim().is_empty() {
            return env_url;
        }
    }

    DEFAULT_TARGET_URL.to_string()
}

/// Build the session settings from resolved CLI values.
pub fn session_config(explicit_url: Option<&str>, wait_timeout_secs: u64) -> SessionConfig {
    SessionConfig {
        target_url: resolve_target_url(explicit_url),
        wait_timeout: Duration::from_secs(wait_timeout_secs.max(1)),
    }
}
