use serde::Deserialize;
use serde_repr::Deserialize_repr;
use std::fmt;
use thiserror::Error;

/// Station connection progress reported by `POST /wifiConnectStatus`
#[derive(Clone, Copy, Debug, Default, Deserialize_repr, PartialEq, Eq)]
#[repr(u8)]
pub enum WifiConnectStatus {
    #[default]
    Unknown = 0,
    Connecting = 1,
    Failed = 2,
    Connected = 3,
}

#[derive(Deserialize)]
pub(crate) struct WifiConnectStatusResponse {
    pub wifi_connect_status: WifiConnectStatus,
}

/// Payload of `GET /apSSID.json`
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct ApSsid {
    pub ssid: String,
}

/// Payload of `GET /wifiConnectInfo.json`
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ConnectionInfo {
    pub ap: String,
    pub ip: String,
    pub netmask: String,
    pub gw: String,
}

#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum CredentialError {
    #[error("SSID must not be empty")]
    EmptySsid,
    #[error("password must not be empty")]
    EmptyPassword,
}

/// Validated station credentials
#[derive(Clone, PartialEq, Eq)]
pub struct WifiCredentials {
    ssid: String,
    password: String,
}

impl fmt::Debug for WifiCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WifiCredentials")
            .field("ssid", &self.ssid)
            .field("password", &"***")
            .finish()
    }
}

impl WifiCredentials {
    /// Validate both fields, reporting every violation at once
    pub fn new(
        ssid: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self, Vec<CredentialError>> {
        let ssid = ssid.into();
        let password = password.into();

        let mut errors = Vec::new();
        if ssid.is_empty() {
            errors.push(CredentialError::EmptySsid);
        }
        if password.is_empty() {
            errors.push(CredentialError::EmptyPassword);
        }

        if errors.is_empty() {
            Ok(Self { ssid, password })
        } else {
            Err(errors)
        }
    }

    pub fn ssid(&self) -> &str {
        &self.ssid
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

/// State of a WiFi connection session
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WifiConnectionState {
    #[default]
    Idle,
    Connecting,
    Connected,
    Failed,
}

impl WifiConnectionState {
    pub fn is_active(self) -> bool {
        self == Self::Connecting
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod credentials {
        use super::*;

        #[test]
        fn accepts_both_fields() {
            let credentials = WifiCredentials::new("home", "secret").unwrap();
            assert_eq!(credentials.ssid(), "home");
            assert_eq!(credentials.password(), "secret");
        }

        #[test]
        fn reports_each_empty_field() {
            assert_eq!(
                WifiCredentials::new("", "secret").unwrap_err(),
                vec![CredentialError::EmptySsid]
            );
            assert_eq!(
                WifiCredentials::new("home", "").unwrap_err(),
                vec![CredentialError::EmptyPassword]
            );
            assert_eq!(
                WifiCredentials::new("", "").unwrap_err(),
                vec![CredentialError::EmptySsid, CredentialError::EmptyPassword]
            );
        }

        #[test]
        fn debug_redacts_password() {
            let credentials = WifiCredentials::new("home", "secret").unwrap();
            let debug = format!("{credentials:?}");
            assert!(debug.contains("home"));
            assert!(!debug.contains("secret"));
        }
    }

    mod status {
        use super::*;

        fn parse(code: u8) -> serde_json::Result<WifiConnectStatus> {
            serde_json::from_str::<WifiConnectStatusResponse>(&format!(
                r#"{{"wifi_connect_status": {code}}}"#
            ))
            .map(|r| r.wifi_connect_status)
        }

        #[test]
        fn parses_known_codes() {
            assert_eq!(parse(0).unwrap(), WifiConnectStatus::Unknown);
            assert_eq!(parse(1).unwrap(), WifiConnectStatus::Connecting);
            assert_eq!(parse(2).unwrap(), WifiConnectStatus::Failed);
            assert_eq!(parse(3).unwrap(), WifiConnectStatus::Connected);
        }

        #[test]
        fn rejects_unknown_code() {
            assert!(parse(9).is_err());
        }
    }

    #[test]
    fn connection_info_tolerates_missing_fields() {
        let info: ConnectionInfo = serde_json::from_str(r#"{"ap": "home", "ip": "10.0.0.5"}"#).unwrap();
        assert_eq!(info.ap, "home");
        assert_eq!(info.ip, "10.0.0.5");
        assert!(info.gw.is_empty());
    }
}
