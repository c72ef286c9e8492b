//! Configuration for hcsync.
//!
//! One TOML file layered under `HCSYNC_*` environment variables, password
//! resolution (env var, then OS keyring, then plaintext), and translation
//! to `hcsync_core::SyncConfig`. Core never sees these types.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use url::Url;

use hcsync_core::{
    DeviceId, HcConnection, InfluxConnection, StorageConfig, StorageKind, SyncConfig,
    TlsVerification,
};

/// Keyring service name shared by every stored secret.
pub const KEYRING_SERVICE: &str = "hcsync";

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "HCSYNC_CONFIG";

const REDACTED: &str = "********";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no password configured for {target}")]
    NoCredentials { target: SecretTarget },

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Validation {
        field: field.into(),
        reason: reason.into(),
    }
}

// ── TOML config structs ─────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub hc: HcSection,
    #[serde(default)]
    pub influx: InfluxSection,
    #[serde(default)]
    pub storage: StorageSection,
    #[serde(default)]
    pub consumption: ConsumptionSection,
}

/// `[hc]`: the Home Center controller.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct HcSection {
    /// Controller base URL, e.g. `https://192.168.1.10`.
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub username: String,
    /// Plaintext password. Prefer the keyring or `password_env`.
    pub password: Option<String>,
    /// Environment variable holding the password.
    pub password_env: Option<String>,
    #[serde(default)]
    pub verify_ssl: bool,
    pub ca_cert: Option<PathBuf>,
    /// Request timeout in seconds. `0` disables it.
    #[serde(default = "default_hc_timeout")]
    pub timeout: u64,
}

impl Default for HcSection {
    fn default() -> Self {
        Self {
            url: String::new(),
            username: String::new(),
            password: None,
            password_env: None,
            verify_ssl: false,
            ca_cert: None,
            timeout: default_hc_timeout(),
        }
    }
}

fn default_hc_timeout() -> u64 {
    30
}

/// `[influx]`: the InfluxDB 1.x server.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct InfluxSection {
    #[serde(default)]
    pub host: String,
    #[serde(default = "default_influx_port")]
    pub port: u16,
    #[serde(default)]
    pub database: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub password_env: Option<String>,
    /// Use `https`.
    #[serde(default)]
    pub ssl: bool,
    #[serde(default)]
    pub verify_ssl: bool,
    /// Seconds; `0` disables.
    #[serde(default)]
    pub timeout: u64,
    /// Seconds; `0` disables.
    #[serde(default)]
    pub connect_timeout: u64,
}

impl Default for InfluxSection {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: default_influx_port(),
            database: String::new(),
            username: None,
            password: None,
            password_env: None,
            ssl: false,
            verify_ssl: false,
            timeout: 0,
            connect_timeout: 0,
        }
    }
}

fn default_influx_port() -> u16 {
    8086
}

/// `[storage]`: where cursors are kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct StorageSection {
    #[serde(default, rename = "type")]
    pub kind: StorageKind,
    /// Defaults to the platform data directory.
    pub directory: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ConsumptionSection {
    /// Device ids polled when `consumption` gets no `--device`.
    #[serde(default)]
    pub devices: Vec<u64>,
}

impl Config {
    /// Copy with every plaintext password masked, for display.
    pub fn redacted(&self) -> Self {
        let mask = |p: &Option<String>| p.as_ref().map(|_| REDACTED.to_owned());
        let mut copy = self.clone();
        copy.hc.password = mask(&self.hc.password);
        copy.influx.password = mask(&self.influx.password);
        copy
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

// ── Paths ───────────────────────────────────────────────────────────

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("org", "hcsync", "hcsync")
}

/// Resolve the config file: explicit path, then `$HCSYNC_CONFIG`, then the
/// platform config directory.
pub fn config_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    if let Some(path) = std::env::var_os(CONFIG_ENV).filter(|p| !p.is_empty()) {
        return PathBuf::from(path);
    }
    project_dirs().map_or_else(
        || PathBuf::from("hcsync.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// Default cursor directory under the platform data directory.
pub fn default_storage_dir() -> PathBuf {
    project_dirs().map_or_else(
        || PathBuf::from("storage"),
        |dirs| dirs.data_dir().join("storage"),
    )
}

// ── Loading ─────────────────────────────────────────────────────────

/// Load defaults, then the TOML file (if present), then `HCSYNC_*`
/// variables with `__` separating nested keys (`HCSYNC_HC__URL`).
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    debug!(path = %path.display(), "loading config");
    let config = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("HCSYNC_").split("__"))
        .extract()?;
    Ok(config)
}

// ── Credentials ─────────────────────────────────────────────────────

/// Which password a keyring entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretTarget {
    Hc,
    Influx,
}

impl SecretTarget {
    pub fn keyring_user(self) -> &'static str {
        match self {
            Self::Hc => "hc/password",
            Self::Influx => "influx/password",
        }
    }
}

impl std::fmt::Display for SecretTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Hc => "hc",
            Self::Influx => "influx",
        })
    }
}

fn resolve_password(
    target: SecretTarget,
    env_name: Option<&str>,
    plaintext: Option<&str>,
) -> Option<SecretString> {
    // 1. Named environment variable
    if let Some(value) = env_name.and_then(|name| std::env::var(name).ok()) {
        return Some(SecretString::from(value));
    }

    // 2. System keyring
    if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, target.keyring_user()) {
        if let Ok(secret) = entry.get_password() {
            return Some(SecretString::from(secret));
        }
    }

    // 3. Plaintext in config
    plaintext.map(|p| SecretString::from(p.to_owned()))
}

/// Save a password to the OS keyring.
pub fn store_password(target: SecretTarget, password: &str) -> Result<(), ConfigError> {
    keyring::Entry::new(KEYRING_SERVICE, target.keyring_user())?.set_password(password)?;
    Ok(())
}

// ── Translation ─────────────────────────────────────────────────────

/// Command-line settings that take precedence over the file.
#[derive(Debug, Clone, Copy, Default)]
pub struct Overrides {
    /// Skip TLS verification on both connections.
    pub insecure: bool,
    /// Home Center request timeout in seconds.
    pub timeout: Option<u64>,
}

fn seconds(value: u64) -> Option<Duration> {
    (value > 0).then(|| Duration::from_secs(value))
}

fn tls(verify: bool, ca_cert: Option<&Path>, insecure: bool) -> TlsVerification {
    if insecure || !verify {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(path) = ca_cert {
        TlsVerification::CustomCa(path.to_path_buf())
    } else {
        TlsVerification::SystemDefaults
    }
}

fn hc_connection(hc: &HcSection, overrides: Overrides) -> Result<HcConnection, ConfigError> {
    if hc.url.trim().is_empty() {
        return Err(invalid("hc.url", "must be set"));
    }
    let url = Url::parse(hc.url.trim())
        .map_err(|e| invalid("hc.url", format!("invalid URL '{}': {e}", hc.url)))?;
    if hc.username.is_empty() {
        return Err(invalid("hc.username", "must be set"));
    }
    let password = resolve_password(
        SecretTarget::Hc,
        hc.password_env.as_deref(),
        hc.password.as_deref(),
    )
    .ok_or(ConfigError::NoCredentials {
        target: SecretTarget::Hc,
    })?;

    Ok(HcConnection {
        url,
        username: hc.username.clone(),
        password,
        tls: tls(hc.verify_ssl, hc.ca_cert.as_deref(), overrides.insecure),
        timeout: seconds(overrides.timeout.unwrap_or(hc.timeout)),
    })
}

fn influx_connection(
    influx: &InfluxSection,
    overrides: Overrides,
) -> Result<InfluxConnection, ConfigError> {
    if influx.host.trim().is_empty() {
        return Err(invalid("influx.host", "must be set"));
    }
    if influx.database.is_empty() {
        return Err(invalid("influx.database", "must be set"));
    }
    let scheme = if influx.ssl { "https" } else { "http" };
    let raw = format!("{scheme}://{}:{}", influx.host.trim(), influx.port);
    let url = Url::parse(&raw).map_err(|e| invalid("influx.host", format!("'{raw}': {e}")))?;

    let username = influx.username.clone().filter(|u| !u.is_empty());
    let password = resolve_password(
        SecretTarget::Influx,
        influx.password_env.as_deref(),
        influx.password.as_deref().filter(|p| !p.is_empty()),
    );

    Ok(InfluxConnection {
        url,
        database: influx.database.clone(),
        username,
        password,
        tls: tls(influx.verify_ssl, None, overrides.insecure),
        timeout: seconds(influx.timeout),
        connect_timeout: seconds(influx.connect_timeout),
    })
}

/// Validate the file config and build the engine's [`SyncConfig`].
pub fn to_sync_config(config: &Config, overrides: Overrides) -> Result<SyncConfig, ConfigError> {
    Ok(SyncConfig {
        hc: hc_connection(&config.hc, overrides)?,
        influx: influx_connection(&config.influx, overrides)?,
        storage: StorageConfig {
            kind: config.storage.kind,
            directory: config
                .storage
                .directory
                .clone()
                .unwrap_or_else(default_storage_dir),
        },
        consumption_devices: config
            .consumption
            .devices
            .iter()
            .copied()
            .map(DeviceId)
            .collect(),
    })
}
