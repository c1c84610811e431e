//! Periodic sensor and clock reads

use crate::{
    config::PollingConfig,
    device_client::DeviceClient,
    model::Dashboard,
    scheduler::{PollHandle, PollingScheduler},
};
use anyhow::{Context, Result};
use log::debug;
use std::sync::Arc;

/// Keeps sensor/actuator readings and the device clock current
///
/// Both schedules live as long as the poller; a failed read is logged and the
/// previous values stay on the page.
pub struct TelemetryPoller {
    sensors: PollHandle,
    clock: PollHandle,
}

impl TelemetryPoller {
    pub fn start<C>(client: Arc<C>, dashboard: Dashboard, polling: &PollingConfig) -> Self
    where
        C: DeviceClient + Send + Sync + 'static,
    {
        let sensors = {
            let (client, dashboard) = (client.clone(), dashboard.clone());
            PollingScheduler::start("sensor poll", polling.sensor_interval, move || {
                let (client, dashboard) = (client.clone(), dashboard.clone());
                async move { refresh_sensors(client.as_ref(), &dashboard).await }
            })
        };

        let clock = PollingScheduler::start("clock poll", polling.clock_interval, move || {
            let (client, dashboard) = (client.clone(), dashboard.clone());
            async move { refresh_clock(client.as_ref(), &dashboard).await }
        });

        Self { sensors, clock }
    }

    pub fn stop(&self) {
        self.sensors.stop();
        self.clock.stop();
    }

    pub fn is_active(&self) -> bool {
        self.sensors.is_active() || self.clock.is_active()
    }
}

pub async fn refresh_sensors<C: DeviceClient>(client: &C, dashboard: &Dashboard) -> Result<()> {
    let readings = client
        .sensor_readings()
        .await
        .context("failed to read sensor data")?;
    debug!("sensor readings: {readings:?}");

    dashboard.update(|model| model.apply_sensor_readings(&readings));
    Ok(())
}

pub async fn refresh_clock<C: DeviceClient>(client: &C, dashboard: &Dashboard) -> Result<()> {
    let local_time = client
        .local_time()
        .await
        .context("failed to read device clock")?;

    dashboard.update(|model| model.local_time = Some(local_time.time));
    Ok(())
}
