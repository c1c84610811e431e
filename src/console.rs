//! Page lifetime: bootstrap, operator actions, rendering and reload
//!
//! One [`Console::run`] is one page load. Every run builds its display state,
//! sessions and pollers from scratch, so a reload is a full reinitialization.

use crate::{
    config::AppConfig,
    device_client::DeviceClient,
    messages::Messages,
    model::Dashboard,
    reload::{ReloadReason, ReloadTrigger},
    render::TerminalRenderer,
    services::{
        device_info::DeviceInfoClient, firmware::FirmwareUpdateSession,
        telemetry::TelemetryPoller, wifi::WifiConnectionSession,
    },
    types::FirmwareImage,
    view,
};
use anyhow::{Context, Result};
use log::{info, warn};
use std::{fmt, io::Write, path::PathBuf, sync::Arc};
use tokio::sync::mpsc;

/// Operator requests, the terminal counterpart of the page's buttons
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    ConnectWifi { ssid: String, password: String },
    DisconnectWifi,
    UpdateFirmware { files: Vec<PathBuf> },
    CheckFirmwareStatus,
    RefreshInfo,
    Quit,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShutdownReason {
    Reload(ReloadReason),
    Shutdown,
}

impl fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShutdownReason::Reload(reason) => write!(f, "reloading ({reason})"),
            ShutdownReason::Shutdown => write!(f, "shutting down"),
        }
    }
}

enum Flow {
    Continue,
    AwaitReload,
    Quit,
}

struct Page<C> {
    dashboard: Dashboard,
    device_info: DeviceInfoClient<C>,
    firmware: Arc<FirmwareUpdateSession<C>>,
    wifi: Arc<WifiConnectionSession<C>>,
    messages: &'static Messages,
    renderer: TerminalRenderer,
}

impl<C> Page<C>
where
    C: DeviceClient + Send + Sync + 'static,
{
    fn draw(&mut self, out: &mut impl Write) -> Result<()> {
        let lines = view::page(
            &self.dashboard.snapshot(),
            &self.firmware.state(),
            self.wifi.state(),
            self.messages,
        );
        self.renderer
            .render(&lines, out)
            .context("failed to render page")?;
        Ok(())
    }

    fn is_busy(&self) -> bool {
        self.firmware.is_active() || self.wifi.is_active()
    }
}

pub struct Console<C> {
    client: Arc<C>,
    config: AppConfig,
    colored: bool,
}

impl<C> Console<C>
where
    C: DeviceClient + Send + Sync + 'static,
{
    pub fn new(client: Arc<C>, config: AppConfig) -> Self {
        Self {
            client,
            config,
            colored: false,
        }
    }

    pub fn with_colors(mut self, colored: bool) -> Self {
        self.colored = colored;
        self
    }

    /// Run one page lifetime
    ///
    /// Returns once a session requests a reload, the operator quits, or the
    /// action source is closed and no session is left running.
    pub async fn run(
        &self,
        actions: &mut mpsc::Receiver<Action>,
        out: &mut impl Write,
    ) -> Result<ShutdownReason> {
        info!("loading page from {}", self.config.device.base_url);
        let polling = &self.config.polling;

        let dashboard = Dashboard::new();
        let (reload, mut reload_rx) = ReloadTrigger::channel();
        let mut page = Page {
            device_info: DeviceInfoClient::new(self.client.clone(), dashboard.clone()),
            firmware: FirmwareUpdateSession::new(
                self.client.clone(),
                dashboard.clone(),
                reload.clone(),
                polling.reboot_countdown_secs,
            ),
            wifi: WifiConnectionSession::new(self.client.clone(), dashboard.clone(), reload, polling),
            dashboard,
            messages: Messages::for_language(self.config.ui.language),
            renderer: TerminalRenderer::new(self.colored),
        };

        log_failure(page.device_info.refresh_ap_ssid().await);
        log_failure(page.firmware.check_status().await);
        let telemetry = TelemetryPoller::start(self.client.clone(), page.dashboard.clone(), polling);
        log_failure(page.device_info.refresh_connection_info().await);

        let mut model_rx = page.dashboard.subscribe();
        let mut firmware_rx = page.firmware.subscribe();
        let mut wifi_rx = page.wifi.subscribe();
        page.draw(out)?;

        let mut input_open = true;
        let mut reload_pending = false;

        let reason = loop {
            if !input_open && !reload_pending && !page.is_busy() {
                break ShutdownReason::Shutdown;
            }

            tokio::select! {
                reason = reload_rx.wait() => break ShutdownReason::Reload(reason),
                _ = tokio::signal::ctrl_c() => {
                    info!("interrupted");
                    break ShutdownReason::Shutdown;
                }
                action = actions.recv(), if input_open => match action {
                    Some(action) => match self.dispatch(action, &page).await {
                        Flow::Continue => {}
                        Flow::AwaitReload => reload_pending = true,
                        Flow::Quit => break ShutdownReason::Shutdown,
                    },
                    None => input_open = false,
                },
                Ok(()) = model_rx.changed() => {}
                Ok(()) = firmware_rx.changed() => {}
                Ok(()) = wifi_rx.changed() => {}
            }

            page.draw(out)?;
        };

        telemetry.stop();
        page.firmware.stop_countdown();
        page.wifi.stop_polling();
        page.draw(out)?;

        info!("{reason}");
        Ok(reason)
    }

    async fn dispatch(&self, action: Action, page: &Page<C>) -> Flow {
        match action {
            Action::ConnectWifi { ssid, password } => {
                if let Err(e) = page.wifi.connect(&ssid, &password) {
                    warn!("wifi connection not started: {e}");
                }
                Flow::Continue
            }
            Action::DisconnectWifi => {
                page.wifi.disconnect();
                Flow::AwaitReload
            }
            Action::UpdateFirmware { files } => {
                let mut selection = Vec::with_capacity(files.len());
                for path in files {
                    match FirmwareImage::load(&path).await {
                        Ok(image) => selection.push(image),
                        Err(e) => warn!("{e:#}"),
                    }
                }

                if let Err(e) = page.firmware.begin_upload(selection) {
                    warn!("firmware update not started: {e}");
                }
                Flow::Continue
            }
            Action::CheckFirmwareStatus => {
                log_failure(page.firmware.check_status().await);
                Flow::Continue
            }
            Action::RefreshInfo => {
                log_failure(page.device_info.refresh_ap_ssid().await);
                log_failure(page.device_info.refresh_connection_info().await);
                Flow::Continue
            }
            Action::Quit => Flow::Quit,
        }
    }
}

fn log_failure(result: Result<()>) {
    if let Err(e) = result {
        warn!("{e:#}");
    }
}
