//! Full client reinitialization requests
//!
//! Sessions that end in a device reboot or a dropped link request a reload;
//! the console then tears the page down and builds it again from scratch.

use log::{info, warn};
use std::fmt;
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReloadReason {
    FirmwareUpdated,
    WifiDisconnected,
}

impl fmt::Display for ReloadReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReloadReason::FirmwareUpdated => write!(f, "firmware updated"),
            ReloadReason::WifiDisconnected => write!(f, "wifi disconnected"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ReloadTrigger {
    tx: broadcast::Sender<ReloadReason>,
}

pub struct ReloadListener {
    rx: broadcast::Receiver<ReloadReason>,
}

impl ReloadTrigger {
    pub fn channel() -> (ReloadTrigger, ReloadListener) {
        let (tx, rx) = broadcast::channel(8);
        (ReloadTrigger { tx }, ReloadListener { rx })
    }

    pub fn request(&self, reason: ReloadReason) {
        info!("reload requested: {reason}");
        if self.tx.send(reason).is_err() {
            warn!("reload requested ({reason}) but nobody is listening");
        }
    }
}

impl ReloadListener {
    /// Wait for the next reload request
    ///
    /// Pends forever once every trigger is gone.
    pub async fn wait(&mut self) -> ReloadReason {
        loop {
            match self.rx.recv().await {
                Ok(reason) => return reason,
                Err(RecvError::Lagged(skipped)) => {
                    warn!("reload listener skipped {skipped} requests");
                }
                Err(RecvError::Closed) => std::future::pending::<()>().await,
            }
        }
    }

    pub fn try_recv(&mut self) -> Option<ReloadReason> {
        loop {
            match self.rx.try_recv() {
                Ok(reason) => return Some(reason),
                Err(TryRecvError::Lagged(_)) => continue,
                Err(TryRecvError::Empty | TryRecvError::Closed) => return None,
            }
        }
    }
}
