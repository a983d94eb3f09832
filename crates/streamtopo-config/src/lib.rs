//! Shared configuration for streamtopo tools.
//!
//! TOML profiles merged with `STREAMTOPO_` environment overrides, and
//! translation to `streamtopo_core::ControllerConfig`. The CLI layers its
//! own flag overrides on top.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use streamtopo_core::config::DEFAULT_WS_PATH;
use streamtopo_core::{ControllerConfig, ReconnectConfig, TlsMode};

/// Environment variable that overrides the config file location.
pub const CONFIG_PATH_ENV: &str = "STREAMTOPO_CONFIG";

/// Prefix for environment overrides; nested keys are separated by `__`
/// (e.g. `STREAMTOPO_DEFAULTS__TIMEOUT=10`).
pub const ENV_PREFIX: &str = "STREAMTOPO_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{name}' not found (available: {available})")]
    ProfileNotFound { name: String, available: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when none is named on the command line.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named controller profiles.
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Look up a profile by name.
    pub fn profile(&self, name: &str) -> Result<&Profile, ConfigError> {
        self.profiles
            .get(name)
            .ok_or_else(|| ConfigError::ProfileNotFound {
                name: name.into(),
                available: self.profile_names(),
            })
    }

    /// Comma-separated profile names, or `(none)`.
    pub fn profile_names(&self) -> String {
        if self.profiles.is_empty() {
            "(none)".into()
        } else {
            self.profiles.keys().cloned().collect::<Vec<_>>().join(", ")
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default)]
    pub insecure: bool,

    /// REST request timeout, seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            insecure: false,
            timeout: default_timeout(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_timeout() -> u64 {
    30
}
fn default_ws_path() -> String {
    DEFAULT_WS_PATH.into()
}

/// A named controller profile.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Profile {
    /// Controller base URL (e.g., "http://127.0.0.1:8080").
    pub controller: String,

    /// Notification socket path.
    #[serde(default = "default_ws_path")]
    pub ws_path: String,

    /// Accept self-signed TLS certificates.
    pub insecure: Option<bool>,

    /// Override timeout, seconds.
    pub timeout: Option<u64>,

    /// Query the discovery status before loading the topology.
    pub wait_for_discovery: Option<bool>,

    /// First reconnect delay, milliseconds.
    pub reconnect_initial_ms: Option<u64>,

    /// Reconnect delay ceiling, milliseconds.
    pub reconnect_max_ms: Option<u64>,

    /// Give up after this many consecutive reconnect failures.
    pub max_retries: Option<u32>,
}

impl Profile {
    pub fn new(controller: impl Into<String>) -> Self {
        Self {
            controller: controller.into(),
            ws_path: default_ws_path(),
            insecure: None,
            timeout: None,
            wait_for_discovery: None,
            reconnect_initial_ms: None,
            reconnect_max_ms: None,
            max_retries: None,
        }
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path: `STREAMTOPO_CONFIG`, else the platform
/// config directory.
pub fn config_path() -> PathBuf {
    if let Some(path) = std::env::var_os(CONFIG_PATH_ENV) {
        return PathBuf::from(path);
    }
    ProjectDirs::from("org", "streamtopo", "streamtopo").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("streamtopo");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from `path` + environment. A missing file yields the defaults.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if it cannot be read.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Profile → ControllerConfig ──────────────────────────────────────

/// Build a `ControllerConfig` from a profile and the global defaults.
pub fn profile_to_controller_config(
    profile: &Profile,
    defaults: &Defaults,
) -> Result<ControllerConfig, ConfigError> {
    let mut config =
        ControllerConfig::from_url(&profile.controller).map_err(|e| ConfigError::Validation {
            field: "controller".into(),
            reason: e.to_string(),
        })?;

    if !profile.ws_path.starts_with('/') {
        return Err(ConfigError::Validation {
            field: "ws_path".into(),
            reason: format!("must start with '/', got '{}'", profile.ws_path),
        });
    }
    config.ws_path.clone_from(&profile.ws_path);

    config.tls = if profile.insecure.unwrap_or(defaults.insecure) {
        TlsMode::DangerAcceptInvalid
    } else {
        TlsMode::System
    };
    config.timeout = Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout));

    if let Some(wait) = profile.wait_for_discovery {
        config.wait_for_discovery = wait;
    }

    config.reconnect = reconnect_config(profile)?;
    Ok(config)
}

fn reconnect_config(profile: &Profile) -> Result<ReconnectConfig, ConfigError> {
    let mut reconnect = ReconnectConfig::default();
    if let Some(ms) = profile.reconnect_initial_ms {
        reconnect.initial_delay = Duration::from_millis(ms);
    }
    if let Some(ms) = profile.reconnect_max_ms {
        reconnect.max_delay = Duration::from_millis(ms);
    }
    if reconnect.initial_delay > reconnect.max_delay {
        return Err(ConfigError::Validation {
            field: "reconnect_initial_ms".into(),
            reason: format!(
                "initial delay {:?} exceeds maximum {:?}",
                reconnect.initial_delay, reconnect.max_delay
            ),
        });
    }
    reconnect.max_retries = profile.max_retries;
    Ok(reconnect)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg.default_profile.as_deref(), Some("default"));
        assert_eq!(cfg.defaults.timeout, 30);
        assert!(cfg.profiles.is_empty());
    }

    #[test]
    fn loads_profiles_from_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
default_profile = "lab"

[defaults]
timeout = 12

[profiles.lab]
controller = "http://10.0.0.1:8080"
max_retries = 3
"#,
        )
        .unwrap();

        let cfg = load_config_from(&path).unwrap();
        let lab = cfg.profile("lab").unwrap();
        assert_eq!(lab.controller, "http://10.0.0.1:8080");
        assert_eq!(lab.ws_path, "/topology/ws");
        assert_eq!(lab.max_retries, Some(3));
        assert_eq!(cfg.defaults.timeout, 12);
    }

    #[test]
    fn unknown_profile_lists_available() {
        let mut cfg = Config::default();
        cfg.profiles.insert("b".into(), Profile::new("http://b"));
        cfg.profiles.insert("a".into(), Profile::new("http://a"));
        match cfg.profile("c").unwrap_err() {
            ConfigError::ProfileNotFound { name, available } => {
                assert_eq!(name, "c");
                assert_eq!(available, "a, b");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn save_then_load_preserves_profiles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut cfg = Config::default();
        let mut profile = Profile::new("http://127.0.0.1:8080");
        profile.reconnect_initial_ms = Some(250);
        cfg.profiles.insert("default".into(), profile.clone());

        save_config_to(&cfg, &path).unwrap();
        let loaded = load_config_from(&path).unwrap();
        assert_eq!(loaded.profile("default").unwrap(), &profile);
    }

    #[test]
    fn profile_translates_to_controller_config() {
        let mut profile = Profile::new("https://ctl.example:8443");
        profile.insecure = Some(true);
        profile.wait_for_discovery = Some(false);
        profile.reconnect_initial_ms = Some(100);
        profile.reconnect_max_ms = Some(1000);
        profile.max_retries = Some(5);

        let config = profile_to_controller_config(&profile, &Defaults::default()).unwrap();
        assert_eq!(config.url.as_str(), "https://ctl.example:8443/");
        assert_eq!(config.tls, TlsMode::DangerAcceptInvalid);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(!config.wait_for_discovery);
        assert_eq!(config.reconnect.initial_delay, Duration::from_millis(100));
        assert_eq!(config.reconnect.max_delay, Duration::from_secs(1));
        assert_eq!(config.reconnect.max_retries, Some(5));
    }

    #[test]
    fn profile_validation_errors() {
        let bad_url = Profile::new("ftp://nowhere");
        assert!(matches!(
            profile_to_controller_config(&bad_url, &Defaults::default()),
            Err(ConfigError::Validation { ref field, .. }) if field == "controller"
        ));

        let mut bad_path = Profile::new("http://127.0.0.1");
        bad_path.ws_path = "topology/ws".into();
        assert!(matches!(
            profile_to_controller_config(&bad_path, &Defaults::default()),
            Err(ConfigError::Validation { ref field, .. }) if field == "ws_path"
        ));

        let mut bad_backoff = Profile::new("http://127.0.0.1");
        bad_backoff.reconnect_initial_ms = Some(5000);
        bad_backoff.reconnect_max_ms = Some(10);
        assert!(profile_to_controller_config(&bad_backoff, &Defaults::default()).is_err());
    }
}
