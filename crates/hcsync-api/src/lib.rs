// hcsync-api: Async Rust clients for the Home Center REST API and InfluxDB 1.x

pub mod error;
pub mod hc;
pub mod influx;
pub mod transport;

pub use error::Error;
pub use hc::HcClient;
pub use influx::{InfluxClient, Precision};
pub use transport::{TlsMode, TransportConfig};
