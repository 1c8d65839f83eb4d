//! Configuration loading and types
//!
//! ```toml
//! [store]
//! endpoint = "http://etcd.lan:2379"
//! prefix = "/hosts/"
//! timeout_secs = 5
//!
//! [output]
//! format = "table"
//!
//! [log]
//! level = "warn"
//! format = "text"
//! ```

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use eyre::{WrapErr, eyre};
use serde::{Deserialize, Serialize};
use url::Url;

/// Environment variable naming a config file
pub const CONFIG_ENV: &str = "HOSTINV_CONFIG";

/// Top-level configuration for hostinv
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Store connection settings
    #[serde(default)]
    pub store: StoreConfig,
    /// Output settings
    #[serde(default)]
    pub output: OutputConfig,
    /// Logging settings
    #[serde(default)]
    pub log: LogConfig,
}

/// Store connection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// etcd gateway URL
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Key prefix holding the hosts
    #[serde(default = "default_prefix")]
    pub prefix: String,
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl StoreConfig {
    /// Per-request timeout
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            prefix: default_prefix(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Output settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Default output format
    #[serde(default = "default_format")]
    pub format: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: default_format(),
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log line format
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

/// Log line format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

fn default_endpoint() -> String {
    "http://localhost:2379".to_string()
}

fn default_prefix() -> String {
    "/hosts/".to_string()
}

fn default_timeout_secs() -> u64 {
    5
}

fn default_format() -> String {
    "table".to_string()
}

fn default_log_level() -> String {
    "warn".to_string()
}

/// Settings given on the command line, applied over the file
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub etcd_host: Option<String>,
    pub etcd_port: Option<u16>,
    pub endpoint: Option<String>,
    pub prefix: Option<String>,
    pub timeout_secs: Option<u64>,
    pub output: Option<String>,
}

impl Config {
    /// Load configuration from file
    ///
    /// # Errors
    /// Returns error if file cannot be read or parsed
    pub fn load(path: &Path) -> eyre::Result<Self> {
        let content = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("failed to read config file {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .wrap_err_with(|| format!("invalid config file {}", path.display()))?;
        Ok(config)
    }

    /// Load the file found by [`locate`], or defaults when there is none
    ///
    /// # Errors
    /// Returns error if a located file cannot be read or parsed
    pub fn load_from(path: Option<&Path>) -> eyre::Result<Self> {
        path.map_or_else(|| Ok(Config::default()), Self::load)
    }

    /// Apply command-line overrides
    ///
    /// `--etcd-host`/`--etcd-port` replace parts of the configured
    /// endpoint; `--endpoint` replaces it whole and wins over both.
    ///
    /// # Errors
    /// Returns error if the endpoint cannot be rebuilt with the given host
    /// or port.
    pub fn apply(&mut self, overrides: &Overrides) -> eyre::Result<()> {
        if overrides.etcd_host.is_some() || overrides.etcd_port.is_some() {
            let mut url = Url::parse(&self.store.endpoint)
                .wrap_err_with(|| format!("invalid store endpoint `{}`", self.store.endpoint))?;
            if let Some(host) = &overrides.etcd_host {
                url.set_host(Some(host))
                    .wrap_err_with(|| format!("invalid etcd host `{host}`"))?;
            }
            if let Some(port) = overrides.etcd_port {
                url.set_port(Some(port))
                    .map_err(|()| eyre!("endpoint `{url}` cannot carry a port"))?;
            }
            self.store.endpoint = url.to_string();
        }
        if let Some(endpoint) = &overrides.endpoint {
            self.store.endpoint.clone_from(endpoint);
        }
        if let Some(prefix) = &overrides.prefix {
            self.store.prefix.clone_from(prefix);
        }
        if let Some(secs) = overrides.timeout_secs {
            self.store.timeout_secs = secs;
        }
        if let Some(format) = &overrides.output {
            self.output.format.clone_from(format);
        }
        Ok(())
    }
}

/// Find the config file to use
///
/// An explicit path wins, then `HOSTINV_CONFIG`, then the first existing
/// file among `./hostinv.toml`, `/etc/hostinv/hostinv.toml` and the user
/// config directory.
#[must_use]
pub fn locate(explicit: Option<&Path>) -> Option<PathBuf> {
    locate_in(explicit, std::env::var_os(CONFIG_ENV), &default_paths())
}

fn default_paths() -> Vec<PathBuf> {
    let mut paths = vec![
        PathBuf::from("hostinv.toml"),
        PathBuf::from("/etc/hostinv/hostinv.toml"),
    ];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("hostinv/hostinv.toml"));
    }
    paths
}

fn locate_in(
    explicit: Option<&Path>,
    env: Option<OsString>,
    candidates: &[PathBuf],
) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    if let Some(path) = env.filter(|p| !p.is_empty()) {
        return Some(PathBuf::from(path));
    }
    candidates.iter().find(|path| path.exists()).cloned()
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.store.endpoint, "http://localhost:2379");
        assert_eq!(config.store.prefix, "/hosts/");
        assert_eq!(config.store.timeout(), Duration::from_secs(5));
        assert_eq!(config.output.format, "table");
        assert_eq!(config.log.level, "warn");
        assert_eq!(config.log.format, LogFormat::Text);
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[store]\nendpoint = \"http://etcd.lan:2379\"\n\n[log]\nformat = \"json\""
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.store.endpoint, "http://etcd.lan:2379");
        assert_eq!(config.store.prefix, "/hosts/");
        assert_eq!(config.output.format, "table");
        assert_eq!(config.log.format, LogFormat::Json);
    }

    #[test]
    fn test_load_rejects_bad_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[store\nendpoint =").unwrap();
        let err = Config::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("invalid config file"));
    }

    #[test]
    fn test_load_from_none_is_default() {
        assert_eq!(Config::load_from(None).unwrap(), Config::default());
    }

    #[test]
    fn test_locate_precedence() {
        let dir = tempfile::tempdir().unwrap();
        let present = dir.path().join("hostinv.toml");
        std::fs::write(&present, "").unwrap();
        let absent = dir.path().join("missing.toml");
        let candidates = vec![absent.clone(), present.clone()];

        let explicit = Path::new("/tmp/explicit.toml");
        assert_eq!(
            locate_in(Some(explicit), Some("/tmp/env.toml".into()), &candidates),
            Some(explicit.to_path_buf())
        );
        assert_eq!(
            locate_in(None, Some("/tmp/env.toml".into()), &candidates),
            Some(PathBuf::from("/tmp/env.toml"))
        );
        assert_eq!(locate_in(None, None, &candidates), Some(present));
        assert_eq!(locate_in(None, None, &[absent]), None);
    }

    #[test]
    fn test_etcd_host_and_port_override() {
        let mut config = Config::default();
        config
            .apply(&Overrides {
                etcd_host: Some("10.0.0.5".to_string()),
                etcd_port: Some(12379),
                ..Overrides::default()
            })
            .unwrap();
        assert_eq!(config.store.endpoint, "http://10.0.0.5:12379/");
    }

    #[test]
    fn test_endpoint_override_wins() {
        let mut config = Config::default();
        config
            .apply(&Overrides {
                etcd_port: Some(1),
                endpoint: Some("http://etcd:2379".to_string()),
                prefix: Some("/lab/".to_string()),
                timeout_secs: Some(1),
                output: Some("json".to_string()),
                ..Overrides::default()
            })
            .unwrap();
        assert_eq!(config.store.endpoint, "http://etcd:2379");
        assert_eq!(config.store.prefix, "/lab/");
        assert_eq!(config.store.timeout_secs, 1);
        assert_eq!(config.output.format, "json");
    }
}
