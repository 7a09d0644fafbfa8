//! The camera as a stream of decode attempts.

use std::future::Future;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::trace;

use crate::errors::AppError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanEvent {
    /// Text decoded from one camera frame.
    Decoded(String),
    PermissionDenied,
}

pub trait ScanSource {
    /// Next decoded payload. `None` once the camera is closed; an error if the
    /// camera cannot be used.
    fn next_scan(&mut self) -> impl Future<Output = Option<Result<String, AppError>>>;
}

/// Scan source fed by the camera callback through a bounded channel.
#[derive(Debug)]
pub struct ChannelScanSource {
    rx: mpsc::Receiver<ScanEvent>,
}

/// Camera-side handle of a [`ChannelScanSource`].
#[derive(Debug, Clone)]
pub struct ScanFeed {
    tx: mpsc::Sender<ScanEvent>,
}

impl ChannelScanSource {
    pub fn channel(capacity: usize) -> (ScanFeed, ChannelScanSource) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (ScanFeed { tx }, ChannelScanSource { rx })
    }
}

impl ScanSource for ChannelScanSource {
    async fn next_scan(&mut self) -> Option<Result<String, AppError>> {
        match self.rx.recv().await? {
            ScanEvent::Decoded(text) => Some(Ok(text)),
            ScanEvent::PermissionDenied => Some(Err(AppError::CameraPermissionDenied)),
        }
    }
}

impl ScanFeed {
    /// Hand over a decoded frame without waiting. Returns false when the frame
    /// was dropped because the reader is busy or gone.
    pub fn offer(&self, text: impl Into<String>) -> bool {
        match self.tx.try_send(ScanEvent::Decoded(text.into())) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                trace!("scan dropped, reader busy");
                false
            }
            Err(TrySendError::Closed(_)) => false,
        }
    }

    pub async fn send(&self, event: ScanEvent) -> Result<(), AppError> {
        self.tx
            .send(event)
            .await
            .map_err(|_| AppError::Collaborator("scan reader is closed".to_string()))
    }

    pub async fn permission_denied(&self) -> Result<(), AppError> {
        self.send(ScanEvent::PermissionDenied).await
    }
}
