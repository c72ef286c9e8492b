// InfluxDB 1.x write client
//
// Batches points into one line-protocol body per call and posts it to
// `/write`. The endpoint is all-or-nothing per request.

use secrecy::{ExposeSecret, SecretString};
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::influx::point::{Point, Precision};
use crate::transport::TransportConfig;

/// HTTP client for a single InfluxDB database.
pub struct InfluxClient {
    http: reqwest::Client,
    base_url: Url,
    database: String,
    username: Option<String>,
    password: Option<SecretString>,
}

impl InfluxClient {
    /// Create a new client from a `TransportConfig`.
    ///
    /// `base_url` is the server root, e.g. `http://localhost:8086`.
    pub fn new(
        base_url: Url,
        database: String,
        username: Option<String>,
        password: Option<SecretString>,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::with_client(http, base_url, database, username, password))
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(
        http: reqwest::Client,
        base_url: Url,
        database: String,
        username: Option<String>,
        password: Option<SecretString>,
    ) -> Self {
        Self {
            http,
            base_url,
            database,
            username,
            password,
        }
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    fn write_url(&self, precision: Precision) -> Result<Url, Error> {
        let root = self.base_url.as_str().trim_end_matches('/');
        let mut url = Url::parse(&format!("{root}/write"))?;
        url.query_pairs_mut()
            .append_pair("db", &self.database)
            .append_pair("precision", precision.as_str());
        Ok(url)
    }

    /// Write a batch of points in one request.
    ///
    /// Points with no encodable field are left out of the body. An empty
    /// batch issues no request.
    pub async fn write_points(&self, points: &[Point], precision: Precision) -> Result<(), Error> {
        let lines: Vec<String> = points.iter().filter_map(Point::to_line).collect();
        if lines.len() < points.len() {
            debug!(
                dropped = points.len() - lines.len(),
                "points without encodable fields left out"
            );
        }
        if lines.is_empty() {
            return Ok(());
        }

        let url = self.write_url(precision)?;
        debug!(points = lines.len(), "POST {}", url);

        let mut request = self.http.post(url.clone()).body(lines.join("\n"));
        if let Some(ref username) = self.username {
            request = request.basic_auth(
                username,
                self.password.as_ref().map(|p| p.expose_secret().to_owned()),
            );
        }

        let resp = request.send().await.map_err(Error::Transport)?;
        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(Error::Authentication {
                message: "InfluxDB rejected credentials".into(),
            });
        }

        let body = resp.text().await.unwrap_or_default();
        Err(Error::Status {
            status: status.as_u16(),
            url: url.to_string(),
            body,
        })
    }
}
