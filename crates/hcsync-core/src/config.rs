// ── Runtime sync configuration ──
//
// These types describe *where* to read from and write to. They carry
// credentials and connection tuning but never read config files; the
// CLI builds a `SyncConfig` through `hcsync-config` and hands it in.

use std::path::PathBuf;
use std::time::Duration;

use hcsync_api::{HcClient, InfluxClient, TlsMode, TransportConfig};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::cursor::{CursorStore, FileStore, MemoryStore, NullStore};
use crate::error::{CoreError, StoreError};
use crate::model::DeviceId;
use crate::sink::InfluxSink;
use crate::source::HcSource;

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification. Home Center ships a self-signed certificate.
    #[default]
    DangerAcceptInvalid,
}

impl From<&TlsVerification> for TlsMode {
    fn from(tls: &TlsVerification) -> Self {
        match tls {
            TlsVerification::SystemDefaults => Self::System,
            TlsVerification::CustomCa(path) => Self::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => Self::DangerAcceptInvalid,
        }
    }
}

/// Home Center controller endpoint and basic-auth credentials.
#[derive(Debug, Clone)]
pub struct HcConnection {
    pub url: Url,
    pub username: String,
    pub password: SecretString,
    pub tls: TlsVerification,
    /// `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

impl HcConnection {
    pub fn transport(&self) -> TransportConfig {
        TransportConfig {
            tls: (&self.tls).into(),
            timeout: self.timeout,
            connect_timeout: None,
        }
    }

    /// Build the production [`HcSource`].
    pub fn source(&self) -> Result<HcSource, CoreError> {
        let client = HcClient::new(
            self.url.clone(),
            self.username.clone(),
            self.password.clone(),
            &self.transport(),
        )?;
        Ok(HcSource::new(client))
    }
}

/// InfluxDB 1.x endpoint. Credentials are optional.
#[derive(Debug, Clone)]
pub struct InfluxConnection {
    pub url: Url,
    pub database: String,
    pub username: Option<String>,
    pub password: Option<SecretString>,
    pub tls: TlsVerification,
    pub timeout: Option<Duration>,
    pub connect_timeout: Option<Duration>,
}

impl InfluxConnection {
    pub fn transport(&self) -> TransportConfig {
        TransportConfig {
            tls: (&self.tls).into(),
            timeout: self.timeout,
            connect_timeout: self.connect_timeout,
        }
    }

    /// Build the production [`InfluxSink`].
    pub fn sink(&self) -> Result<InfluxSink, CoreError> {
        let client = InfluxClient::new(
            self.url.clone(),
            self.database.clone(),
            self.username.clone(),
            self.password.clone(),
            &self.transport(),
        )?;
        Ok(InfluxSink::new(client))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    #[default]
    File,
    /// Nothing is remembered; every run starts from the initial cursors.
    Null,
    /// Process-local; gone when the run ends.
    Memory,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    pub kind: StorageKind,
    pub directory: PathBuf,
}

impl StorageConfig {
    /// Open the configured cursor store. Only `file` touches disk.
    pub fn open(&self) -> Result<Box<dyn CursorStore>, StoreError> {
        Ok(match self.kind {
            StorageKind::File => Box::new(FileStore::open(self.directory.clone())?),
            StorageKind::Null => Box::new(NullStore),
            StorageKind::Memory => Box::new(MemoryStore::new()),
        })
    }
}

/// Everything a run needs besides its per-command parameters.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub hc: HcConnection,
    pub influx: InfluxConnection,
    pub storage: StorageConfig,
    /// Devices polled by `consumption` when none are given on the command line.
    pub consumption_devices: Vec<DeviceId>,
}
