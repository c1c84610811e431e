//! Device payloads and session states

mod firmware;
mod telemetry;
mod wifi;

pub use firmware::*;
pub use telemetry::*;
pub use wifi::*;

use thiserror::Error;

/// Reasons a session refuses to start
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("exactly one firmware file must be selected")]
    NoFirmwareSelected,
    #[error("invalid WiFi credentials: {0:?}")]
    InvalidCredentials(Vec<CredentialError>),
    #[error("{0} is already in progress")]
    AlreadyActive(&'static str),
}
