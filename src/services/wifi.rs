//! WiFi station connection session

use crate::{
    config::PollingConfig,
    device_client::DeviceClient,
    model::Dashboard,
    reload::{ReloadReason, ReloadTrigger},
    scheduler::{PollHandle, PollingScheduler},
    services::device_info::DeviceInfoClient,
    types::{
        CredentialError, SessionError, WifiConnectStatus, WifiConnectionState, WifiCredentials,
    },
};
use anyhow::{Context, Result};
use log::{debug, info, warn};
use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};
use tokio::{sync::watch, time::sleep};

pub struct WifiConnectionSession<C> {
    client: Arc<C>,
    dashboard: Dashboard,
    device_info: DeviceInfoClient<C>,
    reload: ReloadTrigger,
    status_interval: Duration,
    reload_delay: Duration,
    state: watch::Sender<WifiConnectionState>,
    poll: Mutex<Option<PollHandle>>,
}

impl<C> WifiConnectionSession<C>
where
    C: DeviceClient + Send + Sync + 'static,
{
    pub fn new(
        client: Arc<C>,
        dashboard: Dashboard,
        reload: ReloadTrigger,
        polling: &PollingConfig,
    ) -> Arc<Self> {
        Arc::new(Self {
            device_info: DeviceInfoClient::new(client.clone(), dashboard.clone()),
            client,
            dashboard,
            reload,
            status_interval: polling.wifi_status_interval,
            reload_delay: polling.disconnect_reload_delay,
            state: watch::Sender::new(WifiConnectionState::Idle),
            poll: Mutex::new(None),
        })
    }

    pub fn state(&self) -> WifiConnectionState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<WifiConnectionState> {
        self.state.subscribe()
    }

    pub fn is_active(&self) -> bool {
        self.state().is_active()
    }

    /// Check that both SSID and password are present
    pub fn validate(ssid: &str, password: &str) -> Result<WifiCredentials, Vec<CredentialError>> {
        WifiCredentials::new(ssid, password)
    }

    /// Validate the form input and submit it when complete
    ///
    /// Every violation is shown at once and nothing is sent to the device.
    pub fn connect(self: &Arc<Self>, ssid: &str, password: &str) -> Result<(), SessionError> {
        match Self::validate(ssid, password) {
            Ok(credentials) => {
                self.dashboard
                    .update(|model| model.credential_errors.clear());
                self.submit(credentials)
            }
            Err(errors) => {
                warn!("wifi credentials rejected: {errors:?}");
                let shown = errors.clone();
                self.dashboard
                    .update(|model| model.credential_errors = shown);
                Err(SessionError::InvalidCredentials(errors))
            }
        }
    }

    /// Send the credentials and poll until the device reports an outcome
    pub fn submit(self: &Arc<Self>, credentials: WifiCredentials) -> Result<(), SessionError> {
        let started = self.state.send_if_modified(|state| {
            if state.is_active() {
                return false;
            }
            *state = WifiConnectionState::Connecting;
            true
        });

        if !started {
            warn!("wifi connection to {} rejected: already connecting", credentials.ssid());
            return Err(SessionError::AlreadyActive("wifi connection"));
        }

        info!("connecting station to {}", credentials.ssid());
        let client = self.client.clone();
        tokio::spawn(async move {
            if let Err(e) = client
                .wifi_connect(credentials)
                .await
                .context("failed to submit wifi credentials")
            {
                warn!("{e:#}");
            }
        });

        let session = Arc::downgrade(self);
        let handle = PollingScheduler::start("wifi status poll", self.status_interval, move || {
            let session = session.upgrade();
            async move {
                match session {
                    Some(session) => session.poll_status().await,
                    None => Ok(()),
                }
            }
        });
        *self.lock_poll() = Some(handle);

        Ok(())
    }

    async fn poll_status(&self) -> Result<()> {
        let status = self
            .client
            .wifi_connect_status()
            .await
            .context("failed to read wifi connect status")?;
        debug!("wifi connect status: {status:?}");

        match status {
            WifiConnectStatus::Failed => {
                if self.finish(WifiConnectionState::Failed) {
                    warn!("wifi connection failed");
                }
            }
            WifiConnectStatus::Connected => {
                if self.finish(WifiConnectionState::Connected) {
                    info!("wifi connected");
                    self.device_info.refresh_connection_info().await?;
                }
            }
            WifiConnectStatus::Unknown | WifiConnectStatus::Connecting => {}
        }

        Ok(())
    }

    // only the first terminal report wins, overlapping ticks may see it twice
    fn finish(&self, outcome: WifiConnectionState) -> bool {
        let finished = self.state.send_if_modified(|state| {
            if *state != WifiConnectionState::Connecting {
                return false;
            }
            *state = outcome;
            true
        });

        if finished {
            self.stop_polling();
        }
        finished
    }

    /// Drop the station link and reload the client shortly after
    ///
    /// The reload happens whether or not the device acknowledged.
    pub fn disconnect(&self) {
        info!("disconnecting station");

        let client = self.client.clone();
        tokio::spawn(async move {
            if let Err(e) = client
                .wifi_disconnect()
                .await
                .context("failed to disconnect wifi")
            {
                warn!("{e:#}");
            }
        });

        let reload = self.reload.clone();
        let delay = self.reload_delay;
        tokio::spawn(async move {
            sleep(delay).await;
            reload.request(ReloadReason::WifiDisconnected);
        });
    }

    pub fn stop_polling(&self) {
        if let Some(handle) = self.lock_poll().take() {
            handle.stop();
        }
    }

    fn lock_poll(&self) -> MutexGuard<'_, Option<PollHandle>> {
        self.poll.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{reload::ReloadListener, testing::FakeDevice, types::ConnectionInfo};
    use std::sync::atomic::Ordering;

    type Session = Arc<WifiConnectionSession<FakeDevice>>;

    fn session(device: &Arc<FakeDevice>) -> (Session, Dashboard, ReloadListener) {
        let dashboard = Dashboard::new();
        let (reload, listener) = ReloadTrigger::channel();
        let session = WifiConnectionSession::new(
            device.clone(),
            dashboard.clone(),
            reload,
            &PollingConfig::default(),
        );
        (session, dashboard, listener)
    }

    fn connection_info() -> ConnectionInfo {
        ConnectionInfo {
            ap: "home".to_string(),
            ip: "192.168.0.42".to_string(),
            netmask: "255.255.255.0".to_string(),
            gw: "192.168.0.1".to_string(),
        }
    }

    mod validate {
        use super::*;

        #[test]
        fn rejects_empty_ssid() {
            assert_eq!(
                WifiConnectionSession::<FakeDevice>::validate("", "secret").unwrap_err(),
                vec![CredentialError::EmptySsid]
            );
        }

        #[test]
        fn rejects_empty_password() {
            assert_eq!(
                WifiConnectionSession::<FakeDevice>::validate("home", "").unwrap_err(),
                vec![CredentialError::EmptyPassword]
            );
        }

        #[test]
        fn rejects_both_empty() {
            assert_eq!(
                WifiConnectionSession::<FakeDevice>::validate("", "").unwrap_err(),
                vec![CredentialError::EmptySsid, CredentialError::EmptyPassword]
            );
        }

        #[tokio::test(start_paused = true)]
        async fn invalid_input_is_never_submitted() {
            let device = Arc::new(FakeDevice::default());
            let (session, dashboard, _listener) = session(&device);

            assert_eq!(
                session.connect("", ""),
                Err(SessionError::InvalidCredentials(vec![
                    CredentialError::EmptySsid,
                    CredentialError::EmptyPassword
                ]))
            );
            sleep(Duration::from_secs(10)).await;

            assert!(device.connects().is_empty());
            assert_eq!(device.wifi_status.calls(), 0);
            assert_eq!(session.state(), WifiConnectionState::Idle);
            assert_eq!(dashboard.snapshot().credential_errors.len(), 2);
        }

        #[tokio::test(start_paused = true)]
        async fn valid_input_clears_previous_errors() {
            let device = Arc::new(FakeDevice::default());
            device.wifi_status.push_ok(WifiConnectStatus::Connecting);
            let (session, dashboard, _listener) = session(&device);

            let _ = session.connect("home", "");
            session.connect("home", "secret").unwrap();

            assert!(dashboard.snapshot().credential_errors.is_empty());
            session.stop_polling();
        }
    }

    mod connect {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn polls_until_connected_then_refreshes_info_once() {
            let device = Arc::new(FakeDevice::default());
            device
                .wifi_status
                .push_ok(WifiConnectStatus::Unknown)
                .push_ok(WifiConnectStatus::Unknown)
                .push_ok(WifiConnectStatus::Connected);
            device.connection_info.push_ok(connection_info());
            let (session, dashboard, _listener) = session(&device);

            session.connect("home", "secret").unwrap();
            assert_eq!(session.state(), WifiConnectionState::Connecting);

            sleep(Duration::from_millis(8500)).await;

            assert_eq!(session.state(), WifiConnectionState::Connected);
            assert_eq!(device.wifi_status.calls(), 3);
            assert_eq!(device.connection_info.calls(), 1);
            assert_eq!(dashboard.snapshot().connection_info, Some(connection_info()));

            let connects = device.connects();
            assert_eq!(connects.len(), 1);
            assert_eq!(connects[0].ssid(), "home");
            assert_eq!(connects[0].password(), "secret");

            sleep(Duration::from_secs(30)).await;
            assert_eq!(device.wifi_status.calls(), 3);
            assert_eq!(device.connection_info.calls(), 1);
        }

        #[tokio::test(start_paused = true)]
        async fn failure_stops_polling() {
            let device = Arc::new(FakeDevice::default());
            device
                .wifi_status
                .push_ok(WifiConnectStatus::Connecting)
                .push_ok(WifiConnectStatus::Failed);
            let (session, _dashboard, _listener) = session(&device);

            session.connect("home", "wrong").unwrap();
            sleep(Duration::from_millis(5700)).await;

            assert_eq!(session.state(), WifiConnectionState::Failed);
            assert_eq!(device.wifi_status.calls(), 2);

            sleep(Duration::from_secs(30)).await;
            assert_eq!(device.wifi_status.calls(), 2);
            assert_eq!(device.connection_info.calls(), 0);
        }

        #[tokio::test(start_paused = true)]
        async fn poll_errors_keep_polling() {
            let device = Arc::new(FakeDevice::default());
            device
                .wifi_status
                .push_err("timed out")
                .push_ok(WifiConnectStatus::Failed);
            let (session, _dashboard, _listener) = session(&device);

            session.connect("home", "secret").unwrap();
            sleep(Duration::from_millis(5700)).await;

            assert_eq!(session.state(), WifiConnectionState::Failed);
        }

        #[tokio::test(start_paused = true)]
        async fn second_submit_is_rejected_while_connecting() {
            let device = Arc::new(FakeDevice::default());
            device.wifi_status.push_ok(WifiConnectStatus::Connecting);
            let (session, _dashboard, _listener) = session(&device);

            session.connect("home", "secret").unwrap();
            assert_eq!(
                session.connect("other", "secret"),
                Err(SessionError::AlreadyActive("wifi connection"))
            );

            tokio::task::yield_now().await;
            assert_eq!(device.connects().len(), 1);
            session.stop_polling();
        }

        #[tokio::test(start_paused = true)]
        async fn retry_after_failure_starts_new_attempt() {
            let device = Arc::new(FakeDevice::default());
            device
                .wifi_status
                .push_ok(WifiConnectStatus::Failed)
                .push_ok(WifiConnectStatus::Connected);
            device.connection_info.push_ok(connection_info());
            let (session, _dashboard, _listener) = session(&device);

            session.connect("home", "wrong").unwrap();
            sleep(Duration::from_millis(2900)).await;
            assert_eq!(session.state(), WifiConnectionState::Failed);

            session.connect("home", "secret").unwrap();
            sleep(Duration::from_millis(2900)).await;

            assert_eq!(session.state(), WifiConnectionState::Connected);
            assert_eq!(device.connects().len(), 2);
        }
    }

    mod disconnect {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn reloads_after_fixed_delay() {
            let device = Arc::new(FakeDevice::default());
            let (session, _dashboard, mut listener) = session(&device);

            session.disconnect();

            sleep(Duration::from_millis(1999)).await;
            assert_eq!(device.disconnects(), 1);
            assert_eq!(listener.try_recv(), None);

            sleep(Duration::from_millis(2)).await;
            assert_eq!(listener.try_recv(), Some(ReloadReason::WifiDisconnected));
        }

        #[tokio::test(start_paused = true)]
        async fn reloads_even_when_request_fails() {
            let device = Arc::new(FakeDevice::default());
            device.fail_disconnect.store(true, Ordering::SeqCst);
            let (session, _dashboard, mut listener) = session(&device);

            session.disconnect();
            sleep(Duration::from_millis(2001)).await;

            assert_eq!(listener.try_recv(), Some(ReloadReason::WifiDisconnected));
        }
    }
}
