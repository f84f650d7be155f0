use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Duration;

const ACTIVITIES_LIST_URL: &str = "https://api.nike.com/plus/v3/activities/before_id/v3/*?limit=30&types=run%2Cjogging&include_deleted=false";
const ACTIVITIES_LIST_PAGINATION_URL: &str = "https://api.nike.com/plus/v3/activities/before_id/v3/{before_id}?limit=30&types=run%2Cjogging&include_deleted=false";
const ACTIVITY_DETAILS_URL: &str = "https://api.nike.com/sport/v3/me/activity/{activity_id}?metrics=ALL";

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_RETRIES: u32 = 2;

/// Remote endpoint templates. `{before_id}` and `{activity_id}` are
/// substituted per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub activities_list: String,
    pub activities_list_pagination: String,
    pub activity_details: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            activities_list: ACTIVITIES_LIST_URL.to_string(),
            activities_list_pagination: ACTIVITIES_LIST_PAGINATION_URL.to_string(),
            activity_details: ACTIVITY_DETAILS_URL.to_string(),
        }
    }
}

impl Endpoints {
    pub fn page_url(&self, before_id: Option<&str>) -> String {
        match before_id {
            Some(cursor) => self
                .activities_list_pagination
                .replace("{before_id}", &urlencoding::encode(cursor)),
            None => self.activities_list.clone(),
        }
    }

    pub fn activity_url(&self, activity_id: &str) -> String {
        self.activity_details
            .replace("{activity_id}", &urlencoding::encode(activity_id))
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub endpoints: Endpoints,
    /// Raw activity JSON, one `<id>.json` per activity.
    pub raw_dir: PathBuf,
    /// Converted GPX documents, one `<id>.gpx` per activity.
    pub output_dir: PathBuf,
    pub request_timeout: Duration,
    pub max_retries: u32,
}

impl Default for Config {
    fn default() -> Self {
        let activities_dir = PathBuf::from("activities");
        Self {
            endpoints: Endpoints::default(),
            raw_dir: activities_dir.join("json"),
            output_dir: activities_dir.join("gpx"),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(dir) = lookup("NRC_RAW_DIR") {
            config.raw_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup("NRC_OUTPUT_DIR") {
            config.output_dir = PathBuf::from(dir);
        }
        if let Some(secs) = lookup("NRC_REQUEST_TIMEOUT_SECS") {
            let secs: u64 = secs
                .trim()
                .parse()
                .with_context(|| format!("NRC_REQUEST_TIMEOUT_SECS is not a number: {secs}"))?;
            config.request_timeout = Duration::from_secs(secs);
        }
        if let Some(retries) = lookup("NRC_MAX_RETRIES") {
            config.max_retries = retries
                .trim()
                .parse()
                .with_context(|| format!("NRC_MAX_RETRIES is not a number: {retries}"))?;
        }

        Ok(config)
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
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_overrides() {
        let config = Config::from_lookup(|_| None).unwrap();
        assert_eq!(config.raw_dir, PathBuf::from("activities/json"));
        assert_eq!(config.output_dir, PathBuf::from("activities/gpx"));
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.max_retries, 2);
    }

    #[test]
    fn test_env_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("NRC_RAW_DIR", "/tmp/raw"),
            ("NRC_OUTPUT_DIR", "/tmp/out"),
            ("NRC_REQUEST_TIMEOUT_SECS", " 5 "),
            ("NRC_MAX_RETRIES", "0"),
        ]))
        .unwrap();
        assert_eq!(config.raw_dir, PathBuf::from("/tmp/raw"));
        assert_eq!(config.output_dir, PathBuf::from("/tmp/out"));
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.max_retries, 0);
    }

    #[test]
    fn test_invalid_number_is_rejected() {
        let result = Config::from_lookup(lookup_from(&[("NRC_MAX_RETRIES", "many")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_endpoint_substitution() {
        let endpoints = Endpoints::default();
        assert_eq!(endpoints.page_url(None), ACTIVITIES_LIST_URL);
        assert_eq!(
            endpoints.page_url(Some("abc")),
            "https://api.nike.com/plus/v3/activities/before_id/v3/abc?limit=30&types=run%2Cjogging&include_deleted=false"
        );
        assert_eq!(
            endpoints.activity_url("a b"),
            "https://api.nike.com/sport/v3/me/activity/a%20b?metrics=ALL"
        );
    }
}
