#![cfg_attr(feature = "mock", allow(dead_code, unused_imports))]

use crate::{
    config::DeviceConfig,
    http_client::{device_http_client, handle_http_response},
    types::{
        ApSsid, ConnectionInfo, FirmwareImage, LocalTime, OtaStatus, SensorReadings,
        UploadProgress, WifiConnectStatus, WifiConnectStatusResponse, WifiCredentials,
    },
};
use anyhow::{Context, Result};
use log::{debug, info};
#[cfg(feature = "mock")]
use mockall::automock;
use reqwest::{
    Body, Client, RequestBuilder,
    multipart::{Form, Part},
};
use serde::de::DeserializeOwned;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::mpsc::UnboundedSender;
use trait_variant::make;

/// Admin API of the sensor station
#[make(Send)]
#[cfg_attr(feature = "mock", automock)]
pub trait DeviceClient {
    async fn sensor_readings(&self) -> Result<SensorReadings>;
    async fn local_time(&self) -> Result<LocalTime>;
    async fn ap_ssid(&self) -> Result<ApSsid>;
    async fn connection_info(&self) -> Result<ConnectionInfo>;
    /// Upload a firmware image, reporting progress while the body streams out
    async fn upload_firmware(
        &self,
        image: FirmwareImage,
        progress: UnboundedSender<UploadProgress>,
    ) -> Result<()>;
    async fn ota_status(&self) -> Result<OtaStatus>;
    async fn wifi_connect(&self, credentials: WifiCredentials) -> Result<()>;
    async fn wifi_connect_status(&self) -> Result<WifiConnectStatus>;
    async fn wifi_disconnect(&self) -> Result<()>;
}

#[derive(Clone)]
pub struct DeviceHttpClient {
    client: Client,
    base_url: String,
    upload_timeout: Duration,
}

impl DeviceHttpClient {
    const SENSOR_ENDPOINT: &str = "/dhtSensor.json";
    const LOCAL_TIME_ENDPOINT: &str = "/localTime.json";
    const AP_SSID_ENDPOINT: &str = "/apSSID.json";
    const CONNECT_INFO_ENDPOINT: &str = "/wifiConnectInfo.json";
    const OTA_UPDATE_ENDPOINT: &str = "/OTAupdate";
    const OTA_STATUS_ENDPOINT: &str = "/OTAstatus";
    const WIFI_CONNECT_ENDPOINT: &str = "/wifiConnect.json";
    const WIFI_CONNECT_STATUS_ENDPOINT: &str = "/wifiConnectStatus";
    const WIFI_DISCONNECT_ENDPOINT: &str = "/wifiDisconnect.json";

    const OTA_STATUS_BODY: &str = "ota_update_status";
    const WIFI_CONNECT_STATUS_BODY: &str = "wifi_connect_status";
    const SSID_HEADER: &str = "my-connect-ssid";
    const PASSWORD_HEADER: &str = "my-connect-pwd";
    const UPLOAD_CHUNK_SIZE: usize = 4096;

    pub fn new(config: &DeviceConfig) -> Result<Self> {
        let client = device_http_client(config.request_timeout)?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            upload_timeout: config.upload_timeout,
        })
    }

    fn build_url(&self, path: &str) -> String {
        // Normalize path to always start with a single "/"
        let normalized_path = path.trim_start_matches('/');
        format!("{}/{normalized_path}", self.base_url)
    }

    // the device firmware ignores the value but the page always sends one
    fn timestamp() -> String {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default()
            .to_string()
    }

    async fn send(&self, request: RequestBuilder, context_msg: String) -> Result<String> {
        let res = request
            .send()
            .await
            .with_context(|| format!("failed to send {context_msg}"))?;

        handle_http_response(res, &context_msg).await
    }

    /// GET request returning a JSON document
    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.build_url(path);
        debug!("GET {url}");

        let body = self
            .send(self.client.get(&url), format!("GET {url}"))
            .await?;
        serde_json::from_str(&body).with_context(|| format!("failed to parse response of {path}"))
    }

    /// POST request with a plain text body returning a JSON document
    async fn post_text_json<T: DeserializeOwned>(&self, path: &str, text: &'static str) -> Result<T> {
        let url = self.build_url(path);
        debug!("POST {url} with body: {text}");

        let body = self
            .send(self.client.post(&url).body(text), format!("POST {url}"))
            .await?;
        serde_json::from_str(&body).with_context(|| format!("failed to parse response of {path}"))
    }

    fn upload_form(image: FirmwareImage, progress: UnboundedSender<UploadProgress>) -> Result<Form> {
        let (name, data) = image.into_parts();
        let total = data.len() as u64;

        let chunks: Vec<Vec<u8>> = data
            .chunks(Self::UPLOAD_CHUNK_SIZE)
            .map(<[u8]>::to_vec)
            .collect();

        let mut sent = 0u64;
        let stream = futures_util::stream::iter(chunks.into_iter().map(move |chunk| {
            sent += chunk.len() as u64;
            // the receiver may be gone once the session moved on
            let _ = progress.send(UploadProgress { sent, total });
            Ok::<_, std::io::Error>(chunk)
        }));

        let part = Part::stream_with_length(Body::wrap_stream(stream), total)
            .file_name(name)
            .mime_str("application/octet-stream")
            .context("failed to build firmware part")?;

        Ok(Form::new().part("file", part))
    }
}

impl DeviceClient for DeviceHttpClient {
    async fn sensor_readings(&self) -> Result<SensorReadings> {
        self.get_json(Self::SENSOR_ENDPOINT).await
    }

    async fn local_time(&self) -> Result<LocalTime> {
        self.get_json(Self::LOCAL_TIME_ENDPOINT).await
    }

    async fn ap_ssid(&self) -> Result<ApSsid> {
        self.get_json(Self::AP_SSID_ENDPOINT).await
    }

    async fn connection_info(&self) -> Result<ConnectionInfo> {
        self.get_json(Self::CONNECT_INFO_ENDPOINT).await
    }

    async fn upload_firmware(
        &self,
        image: FirmwareImage,
        progress: UnboundedSender<UploadProgress>,
    ) -> Result<()> {
        let url = self.build_url(Self::OTA_UPDATE_ENDPOINT);
        info!("POST {url} with file {} ({} bytes)", image.name(), image.len());

        let form = Self::upload_form(image, progress)?;
        let request = self
            .client
            .post(&url)
            .timeout(self.upload_timeout)
            .multipart(form);

        self.send(request, format!("POST {url}")).await?;
        Ok(())
    }

    async fn ota_status(&self) -> Result<OtaStatus> {
        self.post_text_json(Self::OTA_STATUS_ENDPOINT, Self::OTA_STATUS_BODY)
            .await
    }

    async fn wifi_connect(&self, credentials: WifiCredentials) -> Result<()> {
        let url = self.build_url(Self::WIFI_CONNECT_ENDPOINT);
        info!("POST {url} for {credentials:?}");

        let request = self
            .client
            .post(&url)
            .header(Self::SSID_HEADER, credentials.ssid())
            .header(Self::PASSWORD_HEADER, credentials.password())
            .form(&[("timestamp", Self::timestamp())]);

        self.send(request, format!("POST {url}")).await?;
        Ok(())
    }

    async fn wifi_connect_status(&self) -> Result<WifiConnectStatus> {
        let response: WifiConnectStatusResponse = self
            .post_text_json(
                Self::WIFI_CONNECT_STATUS_ENDPOINT,
                Self::WIFI_CONNECT_STATUS_BODY,
            )
            .await?;
        Ok(response.wifi_connect_status)
    }

    async fn wifi_disconnect(&self) -> Result<()> {
        let url = self.build_url(Self::WIFI_DISCONNECT_ENDPOINT);
        info!("DELETE {url}");

        let request = self
            .client
            .delete(&url)
            .form(&[("timestamp", Self::timestamp())]);

        self.send(request, format!("DELETE {url}")).await?;
        Ok(())
    }
}
