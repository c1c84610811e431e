//! One-shot reads of the device's network identity

use crate::{device_client::DeviceClient, model::Dashboard};
use anyhow::{Context, Result};
use log::info;
use std::sync::Arc;

pub struct DeviceInfoClient<C> {
    client: Arc<C>,
    dashboard: Dashboard,
}

impl<C> Clone for DeviceInfoClient<C> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            dashboard: self.dashboard.clone(),
        }
    }
}

impl<C: DeviceClient> DeviceInfoClient<C> {
    pub fn new(client: Arc<C>, dashboard: Dashboard) -> Self {
        Self { client, dashboard }
    }

    /// Read the SSID of the device's own access point
    pub async fn refresh_ap_ssid(&self) -> Result<()> {
        let ap = self
            .client
            .ap_ssid()
            .await
            .context("failed to read access point SSID")?;

        self.dashboard.update(|model| model.ap_ssid = Some(ap.ssid));
        Ok(())
    }

    /// Read the station connection details; a failure keeps the previous ones
    pub async fn refresh_connection_info(&self) -> Result<()> {
        let info = self
            .client
            .connection_info()
            .await
            .context("failed to read connection info")?;
        info!("station connection: ap {} ip {}", info.ap, info.ip);

        self.dashboard
            .update(|model| model.connection_info = Some(info));
        Ok(())
    }
}
