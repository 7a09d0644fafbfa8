//! Rotating frame display.
//!
//! `FrameCycler` is the index arithmetic. `FrameCycler::spawn` drives it from a
//! tokio interval and publishes the current frame on a watch channel; the
//! returned guard aborts the task when dropped.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::debug;

use crate::errors::AppError;
use crate::frames::Frame;

#[derive(Debug, Clone)]
pub struct FrameCycler {
    frames: Vec<Frame>,
    index: usize,
}

impl FrameCycler {
    pub fn new(frames: Vec<Frame>) -> Result<Self, AppError> {
        if frames.is_empty() {
            return Err(AppError::EmptyFrames);
        }
        Ok(Self { frames, index: 0 })
    }

    /// Zero-based index of the frame on display.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Number of frames; never zero.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn current(&self) -> &Frame {
        &self.frames[self.index]
    }

    pub fn tick(&mut self) -> &Frame {
        self.index = (self.index + 1) % self.frames.len();
        self.current()
    }

    pub fn spawn(self, period: Duration) -> Result<CyclerGuard, AppError> {
        if period.is_zero() {
            return Err(AppError::Settings(
                "frame interval must be greater than zero".to_string(),
            ));
        }

        let mut cycler = self;
        let (tx, rx) = watch::channel(cycler.current().clone());
        let handle = tokio::spawn(async move {
            let mut ticker = time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let frame = cycler.tick().clone();
                debug!(
                    frame = frame.sequence_index,
                    total = frame.total_frames,
                    "showing frame"
                );
                if tx.send(frame).is_err() {
                    break;
                }
            }
        });

        Ok(CyclerGuard { handle, current: rx })
    }
}

/// Owns the display task. Dropping it stops the rotation.
#[derive(Debug)]
pub struct CyclerGuard {
    handle: JoinHandle<()>,
    current: watch::Receiver<Frame>,
}

impl CyclerGuard {
    pub fn current(&self) -> Frame {
        self.current.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Frame> {
        self.current.clone()
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for CyclerGuard {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
