use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory scanned for catalog files at startup
    #[serde(default = "default_catalog_dir")]
    pub catalog_dir: PathBuf,

    /// Substring a `.json` file name must contain to be ingested
    #[serde(default = "default_catalog_file_marker")]
    pub catalog_file_marker: String,

    /// How long a stream probe may take before the source counts as down
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,

    /// Upper bound on in-flight probes for a single stream request
    #[serde(default = "default_max_concurrent_probes")]
    pub max_concurrent_probes: usize,

    /// Addon identifier advertised in the manifest
    #[serde(default = "default_addon_id")]
    pub addon_id: String,

    /// Addon display name, also used as the catalog name
    #[serde(default = "default_addon_name")]
    pub addon_name: String,

    /// Identifier of the single movie catalog this addon serves
    #[serde(default = "default_catalog_id")]
    pub catalog_id: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    7001
}

fn default_catalog_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_catalog_file_marker() -> String {
    "updated_movies".to_string()
}

fn default_probe_timeout_ms() -> u64 {
    3000
}

fn default_max_concurrent_probes() -> usize {
    16
}

fn default_addon_id() -> String {
    "com.yourmoviestreamsaddon".to_string()
}

fn default_addon_name() -> String {
    "Your Movies".to_string()
}

fn default_catalog_id() -> String {
    "yourmoviestreams-movies".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            catalog_dir: default_catalog_dir(),
            catalog_file_marker: default_catalog_file_marker(),
            probe_timeout_ms: default_probe_timeout_ms(),
            max_concurrent_probes: default_max_concurrent_probes(),
            addon_id: default_addon_id(),
            addon_name: default_addon_name(),
            catalog_id: default_catalog_id(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let config = envy::from_env::<Config>()
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.max_concurrent_probes == 0 {
            anyhow::bail!("MAX_CONCURRENT_PROBES must be at least 1");
        }
        if self.probe_timeout_ms == 0 {
            anyhow::bail!("PROBE_TIMEOUT_MS must be greater than zero");
        }
        Ok(())
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_upstream_addon() {
        let config = Config::default();
        assert_eq!(config.port, 7001);
        assert_eq!(config.probe_timeout(), Duration::from_millis(3000));
        assert_eq!(config.catalog_file_marker, "updated_movies");
        assert_eq!(config.bind_addr(), "0.0.0.0:7001");
    }

    #[test]
    fn test_envy_overrides() {
        let vars = vec![
            ("PORT".to_string(), "8080".to_string()),
            ("PROBE_TIMEOUT_MS".to_string(), "500".to_string()),
            ("CATALOG_DIR".to_string(), "/srv/catalog".to_string()),
        ];
        let config: Config = envy::from_iter(vars).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.probe_timeout_ms, 500);
        assert_eq!(config.catalog_dir, PathBuf::from("/srv/catalog"));
        assert_eq!(config.max_concurrent_probes, 16);
    }

    #[test]
    fn test_validate_rejects_zero_concurrency() {
        let config = Config {
            max_concurrent_probes: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }
}
