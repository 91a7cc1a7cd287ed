//! Configuration for the meshly CLI.
//!
//! TOML file + `MESHLY_`-prefixed environment overlay, credential
//! resolution (env var, then plaintext), and per-node report overrides
//! with a `net_default` fallback section.

use std::collections::HashMap;
use std::path::PathBuf;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The per-node fallback section name.
pub const NET_DEFAULT: &str = "net_default";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no {surface} credentials configured")]
    NoCredentials { surface: &'static str },

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
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    /// Signed REST API access.
    pub api: Option<ApiProfile>,

    /// Legacy dashboard access.
    pub dashboard: Option<DashboardProfile>,

    /// Storage collaborator parameters (consumed by the report sink).
    pub database: Option<DatabaseSettings>,

    /// Mail collaborator parameters (consumed by the report sink).
    pub email: Option<EmailSettings>,

    /// Per-node report overrides, keyed by node name, with a
    /// `net_default` fallback section.
    #[serde(default)]
    pub nodes: HashMap<String, NodeSettings>,

    #[serde(default)]
    pub defaults: Defaults,
}

/// Signed-API profile.
#[derive(Debug, Deserialize, Serialize)]
pub struct ApiProfile {
    /// API base URL (e.g. "https://api.cloudmesh.example").
    pub url: String,

    /// API key (plaintext -- prefer the env variant).
    pub key: Option<String>,

    /// Environment variable name containing the API key.
    pub key_env: Option<String>,

    /// Shared signing secret (plaintext -- prefer the env variant).
    pub secret: Option<String>,

    /// Environment variable name containing the signing secret.
    pub secret_env: Option<String>,

    /// API version sent with every request.
    #[serde(default = "default_api_version")]
    pub version: String,
}

fn default_api_version() -> String {
    "1".into()
}

/// Legacy dashboard profile.
#[derive(Debug, Deserialize, Serialize)]
pub struct DashboardProfile {
    /// Dashboard base URL.
    pub url: String,

    /// Network name to collect.
    pub network: Option<String>,

    pub username: Option<String>,

    /// Password (plaintext -- prefer MESHLY_DASHBOARD_PASSWORD).
    pub password: Option<String>,

    /// Page path overrides for dashboard skins that move things around.
    pub login_page: Option<String>,
    pub status_page: Option<String>,
    pub users_page: Option<String>,
    pub graph_page: Option<String>,
}

/// Storage collaborator parameters. The core never opens this connection
/// itself; the values pass through to whatever sink is configured.
#[derive(Debug, Deserialize, Serialize)]
pub struct DatabaseSettings {
    pub host: String,
    #[serde(default = "default_db_port")]
    pub port: u16,
    pub name: String,
    pub user: Option<String>,
    pub password: Option<String>,
}

fn default_db_port() -> u16 {
    5432
}

/// Mail collaborator parameters.
#[derive(Debug, Deserialize, Serialize)]
pub struct EmailSettings {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub server: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Per-node report overrides.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct NodeSettings {
    /// Monthly usage quota in MB; exceeding it flags the node in reports.
    pub quota_mb: Option<u64>,
    /// Contact for per-node notices.
    pub email: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Accept self-signed TLS certificates.
    #[serde(default)]
    pub insecure: bool,

    /// History period requested from the API (`day`, `month`, `year`).
    #[serde(default = "default_period")]
    pub period: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            insecure: false,
            period: default_period(),
        }
    }
}

fn default_timeout() -> u64 {
    30
}
fn default_period() -> String {
    "day".into()
}

impl Config {
    /// Per-node settings with the `net_default` fallback: a node without
    /// its own section inherits the network-wide defaults.
    pub fn node_settings(&self, node_name: &str) -> Option<&NodeSettings> {
        self.nodes
            .get(node_name)
            .or_else(|| self.nodes.get(NET_DEFAULT))
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("dev", "meshly", "meshly").map_or_else(
        || {
            let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
            p.push(".config");
            p.push("meshly");
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the config from an explicit path, or the canonical path, plus
/// the environment overlay.
pub fn load_config(path: Option<&PathBuf>) -> Result<Config, ConfigError> {
    let path = path.cloned().unwrap_or_else(config_path);

    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(&path))
        .merge(Env::prefixed("MESHLY_").split("_"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Serialize config to TOML and write it to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    let path = config_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(&path, toml_str)?;
    Ok(())
}

// ── Credential resolution ───────────────────────────────────────────

/// Resolve the signed-API key and secret: named env vars first, then
/// plaintext config values.
pub fn resolve_api_credentials(
    profile: &ApiProfile,
) -> Result<(String, SecretString), ConfigError> {
    let key = lookup(profile.key_env.as_deref(), profile.key.as_deref())
        .ok_or(ConfigError::NoCredentials { surface: "api" })?;
    let secret = lookup(profile.secret_env.as_deref(), profile.secret.as_deref())
        .ok_or(ConfigError::NoCredentials { surface: "api" })?;
    Ok((key, SecretString::from(secret)))
}

/// Resolve dashboard credentials: `MESHLY_DASHBOARD_PASSWORD` wins over
/// the plaintext config value.
pub fn resolve_dashboard_credentials(
    profile: &DashboardProfile,
) -> Result<(String, SecretString), ConfigError> {
    let username = profile
        .username
        .clone()
        .or_else(|| std::env::var("MESHLY_DASHBOARD_USERNAME").ok())
        .ok_or(ConfigError::NoCredentials {
            surface: "dashboard",
        })?;

    let password = std::env::var("MESHLY_DASHBOARD_PASSWORD")
        .ok()
        .or_else(|| profile.password.clone())
        .ok_or(ConfigError::NoCredentials {
            surface: "dashboard",
        })?;

    Ok((username, SecretString::from(password)))
}

fn lookup(env_name: Option<&str>, plaintext: Option<&str>) -> Option<String> {
    if let Some(name) = env_name {
        if let Ok(value) = std::env::var(name) {
            return Some(value);
        }
    }
    plaintext.map(str::to_owned)
}

/// Parse and validate a profile's base URL.
pub fn parse_base_url(raw: &str) -> Result<url::Url, ConfigError> {
    raw.parse().map_err(|_| ConfigError::Validation {
        field: "url".into(),
        reason: format!("invalid URL: {raw}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        [api]
        url = "https://api.cloudmesh.example"
        key = "k1"
        secret = "s1"

        [dashboard]
        url = "https://dash.cloudmesh.example"
        network = "lakeside"
        username = "operator"
        password = "hunter2"

        [nodes.net_default]
        quota_mb = 5000
        email = "ops@example.net"

        [nodes.front-gate]
        quota_mb = 20000
    "#;

    fn sample() -> Config {
        toml::from_str(SAMPLE).expect("parse sample config")
    }

    #[test]
    fn parses_profiles_and_defaults() {
        let cfg = sample();
        let api = cfg.api.as_ref().expect("api profile");
        assert_eq!(api.url, "https://api.cloudmesh.example");
        assert_eq!(api.version, "1");
        assert_eq!(cfg.defaults.timeout, 30);
        assert_eq!(cfg.defaults.period, "day");
    }

    #[test]
    fn node_settings_fall_back_to_net_default() {
        let cfg = sample();

        let own = cfg.node_settings("front-gate").expect("own section");
        assert_eq!(own.quota_mb, Some(20_000));

        let fallback = cfg.node_settings("attic-relay").expect("fallback");
        assert_eq!(fallback.quota_mb, Some(5_000));
        assert_eq!(fallback.email.as_deref(), Some("ops@example.net"));
    }

    #[test]
    fn node_settings_absent_without_net_default() {
        let cfg = Config::default();
        assert!(cfg.node_settings("anything").is_none());
    }

    #[test]
    fn plaintext_credentials_resolve() {
        let cfg = sample();
        let (key, _secret) =
            resolve_api_credentials(cfg.api.as_ref().expect("api")).expect("resolve");
        assert_eq!(key, "k1");
    }

    #[test]
    fn missing_credentials_error() {
        let profile = ApiProfile {
            url: "https://api.example".into(),
            key: None,
            key_env: None,
            secret: None,
            secret_env: None,
            version: "1".into(),
        };
        assert!(matches!(
            resolve_api_credentials(&profile),
            Err(ConfigError::NoCredentials { surface: "api" })
        ));
    }

    #[test]
    fn bad_base_url_is_a_validation_error() {
        assert!(matches!(
            parse_base_url("not a url"),
            Err(ConfigError::Validation { .. })
        ));
    }
}
