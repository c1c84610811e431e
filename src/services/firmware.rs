//! Firmware update session
//!
//! Uploads one image, follows the device's flash status and counts down to
//! the reboot, after which the whole client is reloaded.

use crate::{
    device_client::DeviceClient,
    model::{Alert, Dashboard},
    reload::{ReloadReason, ReloadTrigger},
    scheduler::{PollHandle, PollingScheduler},
    types::{FirmwareImage, FirmwareUpdateState, OtaUpdateStatus, SessionError},
};
use anyhow::{Context, Result};
use log::{debug, error, info, trace, warn};
use std::{
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};
use tokio::sync::{Mutex as AsyncMutex, mpsc, watch};

const COUNTDOWN_TICK: Duration = Duration::from_secs(1);

pub struct FirmwareUpdateSession<C> {
    client: Arc<C>,
    dashboard: Dashboard,
    reload: ReloadTrigger,
    countdown_seconds: u32,
    state: watch::Sender<FirmwareUpdateState>,
    countdown: Mutex<Option<PollHandle>>,
    // held for the duration of one `/OTAstatus` request
    status_check: Arc<AsyncMutex<()>>,
}

impl<C> FirmwareUpdateSession<C>
where
    C: DeviceClient + Send + Sync + 'static,
{
    pub fn new(
        client: Arc<C>,
        dashboard: Dashboard,
        reload: ReloadTrigger,
        countdown_seconds: u32,
    ) -> Arc<Self> {
        Arc::new(Self {
            client,
            dashboard,
            reload,
            countdown_seconds,
            state: watch::Sender::new(FirmwareUpdateState::Idle),
            countdown: Mutex::new(None),
            status_check: Arc::new(AsyncMutex::new(())),
        })
    }

    pub fn state(&self) -> FirmwareUpdateState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<FirmwareUpdateState> {
        self.state.subscribe()
    }

    pub fn is_active(&self) -> bool {
        self.state.borrow().is_active()
    }

    /// Start uploading the selected image
    ///
    /// Exactly one file must be selected, otherwise the operator is alerted
    /// and nothing is sent.
    pub fn begin_upload(self: &Arc<Self>, selection: Vec<FirmwareImage>) -> Result<(), SessionError> {
        let Ok([image]) = <[FirmwareImage; 1]>::try_from(selection) else {
            warn!("firmware upload requested without exactly one file");
            self.dashboard.alert(Alert::SelectFirmwareFile);
            return Err(SessionError::NoFirmwareSelected);
        };

        let file_name = image.name().to_string();
        let started = self.state.send_if_modified(|state| {
            if state.is_active() {
                return false;
            }
            *state = FirmwareUpdateState::Uploading {
                file_name: file_name.clone(),
            };
            true
        });

        if !started {
            warn!("firmware upload of {file_name} rejected: update already in progress");
            return Err(SessionError::AlreadyActive("firmware update"));
        }

        info!("uploading firmware {file_name} ({} bytes)", image.len());
        let summary = image.summary();
        self.dashboard
            .update(|model| model.selected_file = Some(summary));

        tokio::spawn(self.clone().run_upload(image));
        Ok(())
    }

    async fn run_upload(self: Arc<Self>, image: FirmwareImage) {
        let (progress_tx, mut progress_rx) = mpsc::unbounded_channel();
        let upload = self.client.upload_firmware(image, progress_tx);
        tokio::pin!(upload);

        let result = loop {
            tokio::select! {
                result = &mut upload => break result,
                Some(progress) = progress_rx.recv() => {
                    debug!("upload progress {}/{}", progress.sent, progress.total);
                    self.spawn_status_check();
                }
            }
        };

        while let Ok(progress) = progress_rx.try_recv() {
            debug!("upload progress {}/{}", progress.sent, progress.total);
            self.spawn_status_check();
        }

        // the device may only report the flash result once the body is in
        if let Err(e) = self.check_status().await {
            warn!("firmware status check failed: {e:#}");
        }

        self.finish_upload(result);
    }

    /// Leave `Uploading` once the transfer is over
    ///
    /// A transfer error fails the session. A transfer the device did not
    /// answer with a flash result returns to `Idle` so the upload can be retried.
    fn finish_upload(&self, result: Result<()>) {
        if let Err(e) = &result {
            error!("firmware upload failed: {e:#}");
        }

        let next = if result.is_ok() {
            FirmwareUpdateState::Idle
        } else {
            FirmwareUpdateState::Failed
        };
        let settled = self.state.send_if_modified(|state| {
            if !matches!(state, FirmwareUpdateState::Uploading { .. }) {
                return false;
            }
            *state = next;
            true
        });

        if settled && result.is_ok() {
            info!("firmware upload finished without a flash result from the device");
        }
    }

    // progress events arrive once per chunk; extra events are dropped while a
    // check is still waiting for the device
    fn spawn_status_check(self: &Arc<Self>) {
        let Ok(guard) = self.status_check.clone().try_lock_owned() else {
            trace!("firmware status check already running");
            return;
        };

        let session = self.clone();
        tokio::spawn(async move {
            let _guard = guard;
            if let Err(e) = session.query_status().await {
                warn!("firmware status check failed: {e:#}");
            }
        });
    }

    /// Ask the device for its flash status and act on it
    ///
    /// Waits for a status request already in flight.
    pub async fn check_status(self: &Arc<Self>) -> Result<()> {
        let _guard = self.status_check.lock().await;
        self.query_status().await
    }

    async fn query_status(self: &Arc<Self>) -> Result<()> {
        let status = self
            .client
            .ota_status()
            .await
            .context("failed to read firmware update status")?;

        let build = status.build();
        self.dashboard
            .update(|model| model.firmware_build = Some(build));

        match status.ota_update_status {
            OtaUpdateStatus::InProgress => self.start_countdown(),
            OtaUpdateStatus::Failed => self.fail(),
            OtaUpdateStatus::None => {}
        }

        Ok(())
    }

    fn fail(&self) {
        let failed = self.state.send_if_modified(|state| {
            if !state.accepts_device_status() {
                return false;
            }
            *state = FirmwareUpdateState::Failed;
            true
        });

        if failed {
            warn!("firmware update failed");
        }
    }

    fn start_countdown(self: &Arc<Self>) {
        let seconds = self.countdown_seconds;
        let started = self.state.send_if_modified(|state| {
            if !state.accepts_device_status() {
                return false;
            }
            *state = FirmwareUpdateState::RebootPending {
                seconds_remaining: seconds,
            };
            true
        });

        if !started {
            debug!("reboot countdown already running or session finished");
            return;
        }

        info!("firmware accepted, rebooting in {seconds}s");
        let session = Arc::downgrade(self);
        let handle = PollingScheduler::start("reboot countdown", COUNTDOWN_TICK, move || {
            let session = session.upgrade();
            async move {
                if let Some(session) = session {
                    session.countdown_tick();
                }
                anyhow::Ok(())
            }
        });

        *self.lock_countdown() = Some(handle);
    }

    fn countdown_tick(&self) {
        let mut finished = false;
        self.state.send_if_modified(|state| match state {
            FirmwareUpdateState::RebootPending { seconds_remaining } if *seconds_remaining > 0 => {
                *seconds_remaining -= 1;
                finished = *seconds_remaining == 0;
                true
            }
            _ => false,
        });

        if finished {
            self.stop_countdown();
            self.reload.request(ReloadReason::FirmwareUpdated);
        }
    }

    /// Tear down the countdown timer without reloading
    pub fn stop_countdown(&self) {
        if let Some(handle) = self.lock_countdown().take() {
            handle.stop();
        }
    }

    fn lock_countdown(&self) -> std::sync::MutexGuard<'_, Option<PollHandle>> {
        self.countdown.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
