use anyhow::{Context, Result};
use serde::Deserialize;
use serde_repr::Deserialize_repr;
use std::{fmt, path::Path};

/// Flash state reported by `POST /OTAstatus`
#[derive(Clone, Copy, Debug, Default, Deserialize_repr, PartialEq, Eq)]
#[repr(i8)]
pub enum OtaUpdateStatus {
    #[default]
    None = 0,
    InProgress = 1,
    Failed = -1,
}

/// Payload of `POST /OTAstatus`
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct OtaStatus {
    pub compile_date: String,
    pub compile_time: String,
    pub ota_update_status: OtaUpdateStatus,
}

impl OtaStatus {
    pub fn build(&self) -> FirmwareBuild {
        FirmwareBuild {
            date: self.compile_date.clone(),
            time: self.compile_time.clone(),
        }
    }
}

/// Build stamp of the running firmware
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FirmwareBuild {
    pub date: String,
    pub time: String,
}

impl fmt::Display for FirmwareBuild {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.date, self.time)
    }
}

/// Firmware file chosen for upload
#[derive(Clone, PartialEq, Eq)]
pub struct FirmwareImage {
    name: String,
    data: Vec<u8>,
}

impl fmt::Debug for FirmwareImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FirmwareImage")
            .field("name", &self.name)
            .field("len", &self.data.len())
            .finish()
    }
}

impl FirmwareImage {
    pub fn new(name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    /// Read an image from disk, naming it after the file
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = tokio::fs::read(path)
            .await
            .with_context(|| format!("failed to read firmware file {}", path.display()))?;
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .with_context(|| format!("failed to get file name of {}", path.display()))?;

        Ok(Self { name, data })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn summary(&self) -> FileSummary {
        FileSummary {
            name: self.name.clone(),
            size_bytes: self.data.len() as u64,
        }
    }

    pub fn into_parts(self) -> (String, Vec<u8>) {
        (self.name, self.data)
    }
}

/// Name and size shown once a file is selected
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileSummary {
    pub name: String,
    pub size_bytes: u64,
}

impl FileSummary {
    pub fn size_kb(&self) -> String {
        format!("{:.2}", self.size_bytes as f64 / 1024.0)
    }
}

/// Bytes of the multipart body handed to the transport so far
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UploadProgress {
    pub sent: u64,
    pub total: u64,
}

/// State of a firmware update session
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum FirmwareUpdateState {
    #[default]
    Idle,
    Uploading {
        file_name: String,
    },
    RebootPending {
        seconds_remaining: u32,
    },
    Failed,
}

impl FirmwareUpdateState {
    /// An upload or reboot countdown is under way
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Uploading { .. } | Self::RebootPending { .. })
    }

    /// Device status reports may still move the session
    pub fn accepts_device_status(&self) -> bool {
        matches!(self, Self::Idle | Self::Uploading { .. })
    }
}
