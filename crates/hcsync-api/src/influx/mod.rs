// InfluxDB 1.x client modules
//
// Line-protocol encoding plus the `/write` HTTP client.

pub mod client;
pub mod point;

pub use client::InfluxClient;
pub use point::{FieldValue, Point, Precision};
