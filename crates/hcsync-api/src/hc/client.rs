// Home Center HTTP client
//
// Wraps `reqwest::Client` with basic auth, `/api/...` URL construction and
// status/JSON handling. Endpoint groups (reference data, events, energy,
// system) live in sibling files as inherent methods, keeping this module
// focused on transport mechanics.

use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;

/// Raw HTTP client for the Home Center REST API.
///
/// Every request carries HTTP basic auth. Methods return decoded payloads;
/// non-200 responses and undecodable bodies surface as errors.
pub struct HcClient {
    http: reqwest::Client,
    base_url: Url,
    username: String,
    password: SecretString,
}

impl HcClient {
    /// Create a new client from a `TransportConfig`.
    ///
    /// `base_url` is the controller root (e.g. `https://192.168.1.10`);
    /// a trailing slash is optional.
    pub fn new(
        base_url: Url,
        username: String,
        password: SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::with_client(http, base_url, username, password))
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(
        http: reqwest::Client,
        base_url: Url,
        username: String,
        password: SecretString,
    ) -> Self {
        Self {
            http,
            base_url,
            username,
            password,
        }
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build a full URL for `/api/{path}` under the controller root.
    pub(crate) fn api_url(&self, path: &str) -> Result<Url, Error> {
        let root = self.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{root}/api/{path}"))?)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Send an authenticated GET and decode the JSON body.
    pub(crate) async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!("GET {}", url);

        let resp = self
            .http
            .get(url.clone())
            .basic_auth(&self.username, Some(self.password.expose_secret()))
            .send()
            .await
            .map_err(Error::Transport)?;

        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(Error::Authentication {
                message: format!("controller rejected credentials for '{}'", self.username),
            });
        }

        let body = resp.text().await.map_err(Error::Transport)?;

        if status != reqwest::StatusCode::OK {
            return Err(Error::Status {
                status: status.as_u16(),
                url: url.to_string(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body,
        })
    }
}
