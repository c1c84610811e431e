//! Projection of client state into page lines

use crate::{
    messages::Messages,
    model::{Alert, Model},
    types::{ActuatorState, CredentialError, FirmwareUpdateState, WifiConnectionState},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tone {
    Neutral,
    Alert,
    Success,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusLine {
    pub text: String,
    pub tone: Tone,
}

impl StatusLine {
    fn new(text: impl Into<String>, tone: Tone) -> Self {
        Self {
            text: text.into(),
            tone,
        }
    }
}

/// Identifies a line so the renderer can tell which ones changed
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LineKey {
    Temperature,
    Distance,
    Actuator,
    LocalTime,
    ApSsid,
    Connection,
    FirmwareBuild,
    SelectedFile,
    FirmwareStatus,
    WifiStatus,
    CredentialErrors,
    Alert,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageLine {
    pub key: LineKey,
    pub label: &'static str,
    pub status: StatusLine,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ActuatorView {
    pub label: &'static str,
    pub class: &'static str,
    pub tone: Tone,
}

pub fn actuator_view(state: ActuatorState, messages: &Messages) -> ActuatorView {
    match state {
        ActuatorState::On => ActuatorView {
            label: messages.actuator_on,
            class: state.class(),
            tone: Tone::Alert,
        },
        ActuatorState::Off => ActuatorView {
            label: messages.actuator_off,
            class: state.class(),
            tone: Tone::Success,
        },
    }
}

pub fn firmware_status_line(state: &FirmwareUpdateState, messages: &Messages) -> Option<StatusLine> {
    match state {
        FirmwareUpdateState::Idle => None,
        FirmwareUpdateState::Uploading { file_name } => {
            Some(StatusLine::new(messages.uploading(file_name), Tone::Neutral))
        }
        FirmwareUpdateState::RebootPending { seconds_remaining } => Some(StatusLine::new(
            messages.rebooting_in(*seconds_remaining),
            Tone::Neutral,
        )),
        FirmwareUpdateState::Failed => Some(StatusLine::new(messages.upload_failed, Tone::Alert)),
    }
}

pub fn wifi_status_line(state: WifiConnectionState, messages: &Messages) -> Option<StatusLine> {
    match state {
        WifiConnectionState::Idle => None,
        WifiConnectionState::Connecting => Some(StatusLine::new(messages.connecting, Tone::Neutral)),
        WifiConnectionState::Connected => Some(StatusLine::new(messages.connected, Tone::Success)),
        WifiConnectionState::Failed => {
            Some(StatusLine::new(messages.connection_failed, Tone::Alert))
        }
    }
}

pub fn credential_error_text(error: CredentialError, messages: &Messages) -> &'static str {
    match error {
        CredentialError::EmptySsid => messages.empty_ssid,
        CredentialError::EmptyPassword => messages.empty_password,
    }
}

fn alert_text(alert: Alert, messages: &Messages) -> &'static str {
    match alert {
        Alert::SelectFirmwareFile => messages.select_firmware_file,
    }
}

/// Build every visible line of the page
pub fn page(
    model: &Model,
    firmware: &FirmwareUpdateState,
    wifi: WifiConnectionState,
    messages: &Messages,
) -> Vec<PageLine> {
    let labels = &messages.labels;
    let missing = || StatusLine::new("--", Tone::Neutral);
    let text = |value: &Option<String>| {
        value
            .as_ref()
            .map(|v| StatusLine::new(v.as_str(), Tone::Neutral))
            .unwrap_or_else(missing)
    };

    let mut lines = vec![
        PageLine {
            key: LineKey::Temperature,
            label: labels.temperature,
            status: text(&model.temperature),
        },
        PageLine {
            key: LineKey::Distance,
            label: labels.distance,
            status: text(&model.distance),
        },
        PageLine {
            key: LineKey::Actuator,
            label: labels.actuator,
            status: model
                .actuator
                .map(|state| {
                    let view = actuator_view(state, messages);
                    StatusLine::new(view.label, view.tone)
                })
                .unwrap_or_else(missing),
        },
        PageLine {
            key: LineKey::LocalTime,
            label: labels.local_time,
            status: model
                .local_time
                .as_ref()
                .map(|time| StatusLine::new(time.as_str(), Tone::Neutral))
                .unwrap_or_else(|| StatusLine::new(messages.waiting_for_sync, Tone::Neutral)),
        },
        PageLine {
            key: LineKey::ApSsid,
            label: labels.ap_ssid,
            status: text(&model.ap_ssid),
        },
        PageLine {
            key: LineKey::Connection,
            label: labels.connection,
            status: model
                .connection_info
                .as_ref()
                .map(|info| {
                    StatusLine::new(
                        format!(
                            "{} ip {} mask {} gw {}",
                            info.ap, info.ip, info.netmask, info.gw
                        ),
                        Tone::Neutral,
                    )
                })
                .unwrap_or_else(missing),
        },
        PageLine {
            key: LineKey::FirmwareBuild,
            label: labels.firmware,
            status: model
                .firmware_build
                .as_ref()
                .map(|build| StatusLine::new(build.to_string(), Tone::Neutral))
                .unwrap_or_else(missing),
        },
    ];

    if let Some(file) = &model.selected_file {
        lines.push(PageLine {
            key: LineKey::SelectedFile,
            label: messages.file_label,
            status: StatusLine::new(
                format!(
                    "{} / {}: {} KB",
                    file.name,
                    messages.size_label,
                    file.size_kb()
                ),
                Tone::Neutral,
            ),
        });
    }

    if let Some(status) = firmware_status_line(firmware, messages) {
        lines.push(PageLine {
            key: LineKey::FirmwareStatus,
            label: labels.update,
            status,
        });
    }

    if let Some(status) = wifi_status_line(wifi, messages) {
        lines.push(PageLine {
            key: LineKey::WifiStatus,
            label: labels.wifi,
            status,
        });
    }

    if !model.credential_errors.is_empty() {
        let text = model
            .credential_errors
            .iter()
            .map(|e| credential_error_text(*e, messages))
            .collect::<Vec<_>>()
            .join(" ");
        lines.push(PageLine {
            key: LineKey::CredentialErrors,
            label: labels.wifi,
            status: StatusLine::new(text, Tone::Alert),
        });
    }

    if let Some(alert) = model.alert {
        lines.push(PageLine {
            key: LineKey::Alert,
            label: "!",
            status: StatusLine::new(alert_text(alert, messages), Tone::Alert),
        });
    }

    lines
}
