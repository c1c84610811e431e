//! Scripted in-memory device for session tests

use crate::{
    device_client::DeviceClient,
    types::{
        ApSsid, ConnectionInfo, FirmwareImage, LocalTime, OtaStatus, OtaUpdateStatus,
        SensorReadings, UploadProgress, WifiConnectStatus, WifiCredentials,
    },
};
use anyhow::{Result, anyhow, bail};
use std::{
    collections::VecDeque,
    sync::{
        Mutex,
        atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering},
    },
    time::Duration,
};
use tokio::{sync::mpsc::UnboundedSender, time::sleep};

const UPLOAD_CHUNK_SIZE: usize = 4096;

/// Queue of canned responses; the last one repeats once the queue is drained
pub struct Script<T> {
    state: Mutex<ScriptState<T>>,
    calls: AtomicUsize,
}

struct ScriptState<T> {
    queue: VecDeque<Result<T, String>>,
    last: Option<Result<T, String>>,
}

impl<T: Clone> Default for Script<T> {
    fn default() -> Self {
        Self {
            state: Mutex::new(ScriptState {
                queue: VecDeque::new(),
                last: None,
            }),
            calls: AtomicUsize::new(0),
        }
    }
}

impl<T: Clone> Script<T> {
    pub fn push_ok(&self, value: T) -> &Self {
        self.state.lock().unwrap().queue.push_back(Ok(value));
        self
    }

    pub fn push_err(&self, message: &str) -> &Self {
        self.state
            .lock()
            .unwrap()
            .queue
            .push_back(Err(message.to_string()));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn next(&self) -> Result<T> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock().unwrap();
        if let Some(response) = state.queue.pop_front() {
            state.last = Some(response);
        }
        match &state.last {
            Some(Ok(value)) => Ok(value.clone()),
            Some(Err(message)) => Err(anyhow!("{message}")),
            None => Err(anyhow!("no response scripted")),
        }
    }
}

#[derive(Default)]
pub struct FakeDevice {
    pub sensors: Script<SensorReadings>,
    pub local_time: Script<LocalTime>,
    pub ap_ssid: Script<ApSsid>,
    pub connection_info: Script<ConnectionInfo>,
    pub ota_status: Script<OtaStatus>,
    pub wifi_status: Script<WifiConnectStatus>,
    pub uploads: Mutex<Vec<FirmwareImage>>,
    pub connects: Mutex<Vec<WifiCredentials>>,
    pub disconnects: AtomicUsize,
    pub fail_upload: AtomicBool,
    pub fail_disconnect: AtomicBool,
    status_delay_ms: AtomicU64,
    status_in_flight: AtomicUsize,
    status_peak: AtomicUsize,
}

impl FakeDevice {
    pub fn uploads(&self) -> Vec<FirmwareImage> {
        self.uploads.lock().unwrap().clone()
    }

    pub fn connects(&self) -> Vec<WifiCredentials> {
        self.connects.lock().unwrap().clone()
    }

    pub fn disconnects(&self) -> usize {
        self.disconnects.load(Ordering::SeqCst)
    }

    /// Make every `/OTAstatus` answer take `delay`
    pub fn set_status_delay(&self, delay: Duration) {
        self.status_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    /// Highest number of `/OTAstatus` requests seen at the same time
    pub fn peak_status_requests(&self) -> usize {
        self.status_peak.load(Ordering::SeqCst)
    }
}

pub fn ota_status(status: OtaUpdateStatus) -> OtaStatus {
    OtaStatus {
        compile_date: "Oct 18 2026".to_string(),
        compile_time: "09:30:00".to_string(),
        ota_update_status: status,
    }
}

impl DeviceClient for FakeDevice {
    async fn sensor_readings(&self) -> Result<SensorReadings> {
        self.sensors.next()
    }

    async fn local_time(&self) -> Result<LocalTime> {
        self.local_time.next()
    }

    async fn ap_ssid(&self) -> Result<ApSsid> {
        self.ap_ssid.next()
    }

    async fn connection_info(&self) -> Result<ConnectionInfo> {
        self.connection_info.next()
    }

    async fn upload_firmware(
        &self,
        image: FirmwareImage,
        progress: UnboundedSender<UploadProgress>,
    ) -> Result<()> {
        let total = image.len() as u64;
        self.uploads.lock().unwrap().push(image);

        let mut sent = 0;
        while sent < total {
            sent = (sent + UPLOAD_CHUNK_SIZE as u64).min(total);
            let _ = progress.send(UploadProgress { sent, total });
        }

        if self.fail_upload.load(Ordering::SeqCst) {
            bail!("POST /OTAupdate failed with status 500");
        }
        Ok(())
    }

    async fn ota_status(&self) -> Result<OtaStatus> {
        let running = self.status_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.status_peak.fetch_max(running, Ordering::SeqCst);

        let delay = self.status_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            sleep(Duration::from_millis(delay)).await;
        }

        self.status_in_flight.fetch_sub(1, Ordering::SeqCst);
        self.ota_status.next()
    }

    async fn wifi_connect(&self, credentials: WifiCredentials) -> Result<()> {
        self.connects.lock().unwrap().push(credentials);
        Ok(())
    }

    async fn wifi_connect_status(&self) -> Result<WifiConnectStatus> {
        self.wifi_status.next()
    }

    async fn wifi_disconnect(&self) -> Result<()> {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
        if self.fail_disconnect.load(Ordering::SeqCst) {
            bail!("DELETE /wifiDisconnect.json failed: connection reset");
        }
        Ok(())
    }
}
