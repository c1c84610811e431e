//! Polling and session logic
//!
//! Everything here talks to the device through [`crate::device_client::DeviceClient`]
//! and publishes to the shared [`crate::model::Dashboard`]; nothing renders.

pub mod device_info;
pub mod firmware;
pub mod telemetry;
pub mod wifi;
