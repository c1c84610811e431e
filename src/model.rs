//! Display state shared between pollers, sessions and the renderer

use crate::types::{
    ActuatorState, ConnectionInfo, CredentialError, FileSummary, FirmwareBuild, SensorReadings,
};
use std::sync::Arc;
use tokio::sync::watch;

/// Everything the page shows besides session states
///
/// Each writer owns disjoint fields; the last write wins.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Model {
    pub temperature: Option<String>,
    pub distance: Option<String>,
    pub actuator: Option<ActuatorState>,
    pub local_time: Option<String>,
    pub ap_ssid: Option<String>,
    pub connection_info: Option<ConnectionInfo>,
    pub firmware_build: Option<FirmwareBuild>,
    pub selected_file: Option<FileSummary>,
    pub credential_errors: Vec<CredentialError>,
    pub alert: Option<Alert>,
    pub alerts_raised: u32,
}

/// Blocking user notices
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Alert {
    SelectFirmwareFile,
}

impl Model {
    pub fn apply_sensor_readings(&mut self, readings: &SensorReadings) {
        self.temperature = readings.temp.as_ref().map(ToString::to_string);
        self.distance = readings.distance().map(ToString::to_string);
        self.actuator = Some(readings.actuator);
    }
}

/// Cheap handle to the shared model
#[derive(Clone, Debug)]
pub struct Dashboard {
    tx: Arc<watch::Sender<Model>>,
}

impl Default for Dashboard {
    fn default() -> Self {
        Self::new()
    }
}

impl Dashboard {
    pub fn new() -> Self {
        Self {
            tx: Arc::new(watch::Sender::new(Model::default())),
        }
    }

    /// Apply `f`; subscribers are only notified when the model changed
    pub fn update(&self, f: impl FnOnce(&mut Model)) {
        self.tx.send_if_modified(|model| {
            let before = model.clone();
            f(model);
            *model != before
        });
    }

    pub fn alert(&self, alert: Alert) {
        self.tx.send_modify(|model| {
            model.alert = Some(alert);
            model.alerts_raised += 1;
        });
    }

    pub fn snapshot(&self) -> Model {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Model> {
        self.tx.subscribe()
    }
}
