//! Settings from `TEST_*` environment variables (a `.env` file is honoured by
//! the binaries through `dotenv`).

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{HarnessError, Result};
use crate::models::HarnessSettings;
use crate::models::settings::{
    default_max_rounds, default_max_tokens, default_temperature, default_timeout_secs,
};

pub const ENV_ENDPOINT: &str = "TEST_AGENT_ENDPOINT";
pub const ENV_SECRET: &str = "TEST_AGENT_SECRET";
pub const ENV_MODEL: &str = "TEST_AGENT_MODEL";
pub const ENV_MAX_ROUNDS: &str = "TEST_MAX_ROUNDS";
pub const ENV_MAX_TOKENS: &str = "TEST_MAX_TOKENS";
pub const ENV_TEMPERATURE: &str = "TEST_TEMPERATURE";
pub const ENV_TIMEOUT_SECS: &str = "TEST_TIMEOUT_SECS";
pub const ENV_SCENARIOS: &str = "TEST_SCENARIOS";
pub const ENV_QUERY: &str = "TEST_QUERY";

/// Read settings from the process environment.
pub fn load_settings() -> Result<HarnessSettings> {
    from_lookup(|key| env::var(key).ok())
}

/// Build settings from any key lookup. Blank values count as unset.
pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<HarnessSettings> {
    let get = |key: &str| {
        lookup(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let api_key = get(ENV_SECRET)
        .ok_or_else(|| HarnessError::Config(format!("{} not set", ENV_SECRET)))?;

    let mut settings = HarnessSettings {
        api_key,
        max_rounds: parsed(ENV_MAX_ROUNDS, get(ENV_MAX_ROUNDS), default_max_rounds()),
        max_tokens: parsed(ENV_MAX_TOKENS, get(ENV_MAX_TOKENS), default_max_tokens()),
        temperature: parsed(ENV_TEMPERATURE, get(ENV_TEMPERATURE), default_temperature()),
        timeout_secs: parsed(ENV_TIMEOUT_SECS, get(ENV_TIMEOUT_SECS), default_timeout_secs()),
        ..Default::default()
    };
    if let Some(endpoint) = get(ENV_ENDPOINT) {
        settings.endpoint = endpoint;
    }
    if let Some(model) = get(ENV_MODEL) {
        settings.model = model;
    }
    if let Some(path) = get(ENV_SCENARIOS) {
        settings.scenarios_path = PathBuf::from(path);
    }
    if settings.max_rounds == 0 {
        log::warn!("[config] {} must be at least 1, using {}", ENV_MAX_ROUNDS, default_max_rounds());
        settings.max_rounds = default_max_rounds();
    }

    log::debug!("[config] {:?}", settings);
    Ok(settings)
}

fn parsed<T: FromStr + std::fmt::Display>(key: &str, raw: Option<String>, default: T) -> T {
    match raw {
        None => default,
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            log::warn!("[config] Ignoring {}={:?}, using {}", key, raw, default);
            default
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let s = from_lookup(lookup(&[(ENV_SECRET, "key")])).unwrap();
        assert_eq!(s.endpoint, "https://api.z.ai/api/paas/v4");
        assert_eq!(s.model, "glm-4.7-flash");
        assert_eq!(s.max_rounds, 30);
        assert_eq!(s.max_tokens, 4096);
        assert_eq!(s.timeout_secs, 120);
        assert_eq!(s.scenarios_path, PathBuf::from("config/scenarios.ron"));
    }

    #[test]
    fn test_missing_secret() {
        assert!(matches!(
            from_lookup(lookup(&[(ENV_SECRET, "   ")])),
            Err(HarnessError::Config(_))
        ));
    }

    #[test]
    fn test_overrides_and_bad_numbers() {
        let s = from_lookup(lookup(&[
            (ENV_SECRET, "key"),
            (ENV_MODEL, "glm-4.6"),
            (ENV_MAX_ROUNDS, "12"),
            (ENV_MAX_TOKENS, "lots"),
            (ENV_TEMPERATURE, "0.2"),
        ]))
        .unwrap();
        assert_eq!(s.model, "glm-4.6");
        assert_eq!(s.max_rounds, 12);
        assert_eq!(s.max_tokens, 4096);
        assert!((s.temperature - 0.2).abs() < f32::EPSILON);
    }

    #[test]
    fn test_zero_rounds_falls_back() {
        let s = from_lookup(lookup(&[(ENV_SECRET, "key"), (ENV_MAX_ROUNDS, "0")])).unwrap();
        assert_eq!(s.max_rounds, 30);
    }
}
