// Home Center REST API client modules
//
// Hand-written client for the controller's `/api/` endpoints. All calls are
// read-only GETs with basic auth.

pub mod client;
pub mod energy;
pub mod events;
pub mod models;
pub mod reference;
pub mod system;

pub use client::HcClient;
