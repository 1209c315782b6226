// Runtime configuration and the fixed dataset identifiers.
//
// Values come from the process environment; `main` loads `.env` first so a
// local file can carry the API key.
use crate::error::{Result, SamarthError};
use std::path::PathBuf;
use std::time::Duration;

/// data.gov.in resource holding district-wise crop production.
pub const AGRICULTURE_RESOURCE_ID: &str = "35be999b-0208-4354-b557-f6ca9a5355de";
/// data.gov.in resource holding sub-division rainfall.
pub const RAINFALL_RESOURCE_ID: &str = "440dbca7-86ce-4bf6-b1af-83af2855757e";

pub const DEFAULT_DB_PATH: &str = "samarth.db";
pub const DEFAULT_BASE_URL: &str = "https://api.data.gov.in/resource/";
pub const DEFAULT_PAGE_LIMIT: usize = 10_000;
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Districts offered when the store cannot list its own.
pub const FALLBACK_DISTRICTS: [&str; 4] = ["ANANTAPUR", "CHITTOOR", "GUNTUR", "EAST GODAVARI"];

/// Keywords selecting the districts shown on the dashboard.
pub const FEATURED_DISTRICT_KEYWORDS: [&str; 6] = [
    "ANANTAPUR",
    "CHITTOOR",
    "GUNTUR",
    "EAST GODAVARI",
    "WEST GODAVARI",
    "KRISHNA",
];

#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: Option<String>,
    pub db_path: PathBuf,
    pub base_url: String,
    pub page_limit: usize,
    pub timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            base_url: DEFAULT_BASE_URL.to_string(),
            page_limit: DEFAULT_PAGE_LIMIT,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl Config {
    /// Build a config from environment variables, falling back to defaults
    /// for anything unset. Malformed numbers are rejected rather than ignored.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Config::from_env`] but with an injectable lookup, so tests
    /// do not have to mutate the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Config::default();
        cfg.api_key = lookup("DGI_API_KEY").filter(|k| !k.trim().is_empty());
        if let Some(path) = lookup("SAMARTH_DB_PATH") {
            cfg.db_path = PathBuf::from(path);
        }
        if let Some(url) = lookup("DGI_BASE_URL") {
            cfg.base_url = url;
        }
        if let Some(raw) = lookup("DGI_PAGE_LIMIT") {
            cfg.page_limit = parse_positive("DGI_PAGE_LIMIT", &raw)? as usize;
        }
        if let Some(raw) = lookup("DGI_TIMEOUT_SECS") {
            cfg.timeout = Duration::from_secs(parse_positive("DGI_TIMEOUT_SECS", &raw)?);
        }
        Ok(cfg)
    }

    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .ok_or_else(|| SamarthError::MissingConfig("DGI_API_KEY".to_string()))
    }
}

fn parse_positive(key: &str, raw: &str) -> Result<u64> {
    match raw.trim().parse::<u64>() {
        Ok(v) if v > 0 => Ok(v),
        _ => Err(SamarthError::InvalidConfig {
            key: key.to_string(),
            value: raw.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_environment_is_empty() {
        let cfg = Config::from_lookup(lookup_from(&[])).unwrap();
        assert!(cfg.api_key.is_none());
        assert_eq!(cfg.db_path, PathBuf::from("samarth.db"));
        assert_eq!(cfg.page_limit, 10_000);
        assert_eq!(cfg.timeout, Duration::from_secs(60));
        assert!(cfg.require_api_key().is_err());
    }

    #[test]
    fn overrides_are_applied() {
        let cfg = Config::from_lookup(lookup_from(&[
            ("DGI_API_KEY", "secret"),
            ("SAMARTH_DB_PATH", "/tmp/x.db"),
            ("DGI_PAGE_LIMIT", "500"),
        ]))
        .unwrap();
        assert_eq!(cfg.require_api_key().unwrap(), "secret");
        assert_eq!(cfg.db_path, PathBuf::from("/tmp/x.db"));
        assert_eq!(cfg.page_limit, 500);
    }

    #[test]
    fn blank_api_key_counts_as_missing() {
        let cfg = Config::from_lookup(lookup_from(&[("DGI_API_KEY", "  ")])).unwrap();
        assert!(cfg.api_key.is_none());
    }

    #[test]
    fn rejects_non_numeric_limit() {
        let err = Config::from_lookup(lookup_from(&[("DGI_PAGE_LIMIT", "lots")])).unwrap_err();
        assert!(matches!(err, SamarthError::InvalidConfig { .. }));
    }
}
