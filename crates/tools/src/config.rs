use std::env;
use std::path::PathBuf;
use std::time::Duration;

use enrichment::WikipediaSource;

pub const DEFAULT_CATALOG_PATH: &str = "data/snowy_places.json";
pub const DEFAULT_CACHE_PATH: &str = ".snowmap/cache.json";

/// Settings read from `SNOWMAP_*` environment variables. Command-line flags
/// override individual fields afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub catalog_path: PathBuf,
    pub countries_path: Option<PathBuf>,
    pub cache_path: PathBuf,
    pub summary_url: String,
    pub cache_ttl_hours: u64,
    pub http_timeout_secs: u64,
    pub url_debounce_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            catalog_path: PathBuf::from(DEFAULT_CATALOG_PATH),
            countries_path: None,
            cache_path: PathBuf::from(DEFAULT_CACHE_PATH),
            summary_url: WikipediaSource::DEFAULT_BASE_URL.to_string(),
            cache_ttl_hours: 24,
            http_timeout_secs: 10,
            url_debounce_ms: 300,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            catalog_path: env_var_path(&lookup, "SNOWMAP_CATALOG").unwrap_or(defaults.catalog_path),
            countries_path: env_var_path(&lookup, "SNOWMAP_COUNTRIES"),
            cache_path: env_var_path(&lookup, "SNOWMAP_CACHE_PATH").unwrap_or(defaults.cache_path),
            summary_url: lookup("SNOWMAP_SUMMARY_URL")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.summary_url),
            cache_ttl_hours: env_var_u64(&lookup, "SNOWMAP_CACHE_TTL_HOURS", defaults.cache_ttl_hours),
            http_timeout_secs: env_var_u64(
                &lookup,
                "SNOWMAP_HTTP_TIMEOUT_SECS",
                defaults.http_timeout_secs,
            ),
            url_debounce_ms: env_var_u64(&lookup, "SNOWMAP_URL_DEBOUNCE_MS", defaults.url_debounce_ms),
        }
    }

    pub fn cache_ttl_ms(&self) -> u64 {
        self.cache_ttl_hours.saturating_mul(60 * 60 * 1000)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

fn env_var_u64(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: u64) -> u64 {
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn env_var_path(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<PathBuf> {
    lookup(key)
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::Config;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn from_pairs(pairs: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        assert_eq!(from_pairs(&[]), Config::default());
        assert_eq!(Config::default().cache_ttl_ms(), 86_400_000);
    }

    #[test]
    fn reads_overrides_and_ignores_garbage() {
        let config = from_pairs(&[
            ("SNOWMAP_CATALOG", "/srv/places.json"),
            ("SNOWMAP_COUNTRIES", "/srv/countries.geojson"),
            ("SNOWMAP_CACHE_TTL_HOURS", "2"),
            ("SNOWMAP_HTTP_TIMEOUT_SECS", "soon"),
            ("SNOWMAP_SUMMARY_URL", " "),
        ]);
        assert_eq!(config.catalog_path, PathBuf::from("/srv/places.json"));
        assert_eq!(
            config.countries_path,
            Some(PathBuf::from("/srv/countries.geojson"))
        );
        assert_eq!(config.cache_ttl_ms(), 7_200_000);
        assert_eq!(config.http_timeout_secs, 10);
        assert_eq!(config.summary_url, Config::default().summary_url);
    }
}
