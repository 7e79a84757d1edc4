//! Environment-driven configuration.
//!
//! Every tunable the service carries — collaborator base URLs, HTTP
//! timeouts, heuristic gates, HITL timers — is overridable via env vars
//! with product-calibrated defaults. Out-of-range values are clamped, not
//! rejected: a misconfigured deployment should degrade, not refuse to
//! boot.

use std::time::Duration;

use profil_core::completeness::CompletenessThresholds;

const RAG_URL_ENV: &str = "PROFIL_RAG_URL";
const PREFS_URL_ENV: &str = "PROFIL_PREFS_URL";
const RAG_TIMEOUT_ENV: &str = "PROFIL_RAG_TIMEOUT_SECS";
const PREFS_TIMEOUT_ENV: &str = "PROFIL_PREFS_TIMEOUT_SECS";
const MIN_PROFILE_LEN_ENV: &str = "PROFIL_MIN_PROFILE_LEN";
const MAX_NOT_SPECIFIED_ENV: &str = "PROFIL_MAX_NOT_SPECIFIED";
const APPROVAL_TIMEOUT_ENV: &str = "PROFIL_APPROVAL_TIMEOUT_SECS";
const RESOLUTION_TTL_ENV: &str = "PROFIL_RESOLUTION_TTL_SECS";
const RAG_API_KEY_ENV: &str = "PROFIL_RAG_API_KEY";
const PREFS_API_KEY_ENV: &str = "PROFIL_PREFS_API_KEY";

const DEFAULT_RAG_URL: &str = "http://localhost:9621";
const DEFAULT_PREFS_URL: &str = "http://localhost:8100";
const DEFAULT_RAG_TIMEOUT_SECS: u64 = 60;
const DEFAULT_PREFS_TIMEOUT_SECS: u64 = 10;
const DEFAULT_APPROVAL_TIMEOUT_SECS: u64 = 300;
const DEFAULT_RESOLUTION_TTL_SECS: u64 = 1800;

#[derive(Debug, Clone)]
pub struct Config {
    /// RAG knowledge service base URL
    pub rag_base_url: String,
    /// Preferences CRUD collaborator base URL
    pub prefs_base_url: String,
    /// Per-request timeout for RAG calls
    pub rag_timeout: Duration,
    /// Per-request timeout for preferences calls
    pub prefs_timeout: Duration,
    /// Completeness heuristic gates
    pub thresholds: CompletenessThresholds,
    /// How long a pending approval waits before auto-rejecting
    pub approval_timeout: Duration,
    /// How long a resolved approval stays readable before purge
    pub resolution_ttl: Duration,
    /// Stored bearer token attached to RAG requests, if the deployment
    /// fronts an authenticated RAG instance
    pub rag_api_key: Option<String>,
    /// Stored bearer token for the preferences collaborator
    pub prefs_api_key: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        let rag_timeout_secs = parse_env_u64_with_bounds(
            std::env::var(RAG_TIMEOUT_ENV).ok(),
            1,
            600,
            DEFAULT_RAG_TIMEOUT_SECS,
        );
        let prefs_timeout_secs = parse_env_u64_with_bounds(
            std::env::var(PREFS_TIMEOUT_ENV).ok(),
            1,
            120,
            DEFAULT_PREFS_TIMEOUT_SECS,
        );
        let approval_timeout_secs = parse_env_u64_with_bounds(
            std::env::var(APPROVAL_TIMEOUT_ENV).ok(),
            1,
            3600,
            DEFAULT_APPROVAL_TIMEOUT_SECS,
        );
        let resolution_ttl_secs = parse_env_u64_with_bounds(
            std::env::var(RESOLUTION_TTL_ENV).ok(),
            1,
            86_400,
            DEFAULT_RESOLUTION_TTL_SECS,
        );

        let defaults = CompletenessThresholds::default();
        let thresholds = CompletenessThresholds {
            min_profile_len: parse_env_u64_with_bounds(
                std::env::var(MIN_PROFILE_LEN_ENV).ok(),
                0,
                100_000,
                defaults.min_profile_len as u64,
            ) as usize,
            max_not_specified: parse_env_u64_with_bounds(
                std::env::var(MAX_NOT_SPECIFIED_ENV).ok(),
                1,
                100,
                defaults.max_not_specified as u64,
            ) as usize,
        };

        Self {
            rag_base_url: env_or(RAG_URL_ENV, DEFAULT_RAG_URL),
            prefs_base_url: env_or(PREFS_URL_ENV, DEFAULT_PREFS_URL),
            rag_timeout: Duration::from_secs(rag_timeout_secs),
            prefs_timeout: Duration::from_secs(prefs_timeout_secs),
            thresholds,
            approval_timeout: Duration::from_secs(approval_timeout_secs),
            resolution_ttl: Duration::from_secs(resolution_ttl_secs),
            rag_api_key: std::env::var(RAG_API_KEY_ENV).ok(),
            prefs_api_key: std::env::var(PREFS_API_KEY_ENV).ok(),
        }
    }
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().trim_end_matches('/').to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn parse_env_u64_with_bounds(raw: Option<String>, min: u64, max: u64, default: u64) -> u64 {
    match raw.and_then(|value| value.parse::<u64>().ok()) {
        Some(parsed) => parsed.clamp(min, max),
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_values_fall_back_to_defaults() {
        assert_eq!(parse_env_u64_with_bounds(None, 1, 600, 60), 60);
        assert_eq!(
            parse_env_u64_with_bounds(Some("junk".into()), 1, 600, 60),
            60
        );
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        assert_eq!(parse_env_u64_with_bounds(Some("0".into()), 1, 600, 60), 1);
        assert_eq!(
            parse_env_u64_with_bounds(Some("9999".into()), 1, 600, 60),
            600
        );
    }
}
