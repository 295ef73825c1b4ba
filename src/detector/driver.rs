//! Frame driver: a bounded pool of workspaces that doubles as the admission
//! gate for concurrent frames.
//!
//! Free workspaces sit in a bounded `crossbeam-channel`. Taking one admits a
//! frame, so at most `slots` frames are in flight and no two of them share
//! scratch. Dropping the [`FrameSlot`] sends the workspace back; the channel
//! is FIFO, which makes reuse round-robin.

use super::pipeline::CascadeDetector;
use super::workspace::FrameWorkspace;
use crate::diagnostics::FrameReport;
use crate::error::{ResourceError, Result};
use crate::image::IntegralImages;
use crossbeam_channel::{bounded, Receiver, Sender, TryRecvError};
use log::debug;
use std::sync::Arc;

pub struct FrameDriver {
    detector: Arc<CascadeDetector>,
    free_tx: Sender<FrameWorkspace>,
    free_rx: Receiver<FrameWorkspace>,
    slots: usize,
}

impl FrameDriver {
    /// Allocates `slots` workspaces up front. Fails if any allocation fails.
    pub fn new(detector: Arc<CascadeDetector>, slots: usize) -> Result<Self> {
        let slots = slots.max(1);
        let (free_tx, free_rx) = bounded(slots);
        for _ in 0..slots {
            free_tx
                .send(detector.workspace()?)
                .map_err(|_| ResourceError::FramePoolClosed)?;
        }
        debug!("FrameDriver::new slots={}", slots);
        Ok(Self {
            detector,
            free_tx,
            free_rx,
            slots,
        })
    }

    pub fn detector(&self) -> &Arc<CascadeDetector> {
        &self.detector
    }

    pub fn slots(&self) -> usize {
        self.slots
    }

    /// Workspaces not currently held by a frame.
    pub fn available(&self) -> usize {
        self.free_rx.len()
    }

    /// Blocks until a workspace is free.
    pub fn acquire(&self) -> Result<FrameSlot<'_>> {
        let workspace = self
            .free_rx
            .recv()
            .map_err(|_| ResourceError::FramePoolClosed)?;
        Ok(FrameSlot {
            driver: self,
            workspace: Some(workspace),
        })
    }

    /// Returns `None` when every workspace is in flight.
    pub fn try_acquire(&self) -> Option<FrameSlot<'_>> {
        match self.free_rx.try_recv() {
            Ok(workspace) => Some(FrameSlot {
                driver: self,
                workspace: Some(workspace),
            }),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Admits one frame, runs it and releases the workspace.
    pub fn process(&self, integral: &IntegralImages) -> Result<FrameReport> {
        let mut slot = self.acquire()?;
        Ok(slot.detect(integral))
    }
}

/// An admitted frame holding exclusive use of one workspace.
pub struct FrameSlot<'d> {
    driver: &'d FrameDriver,
    workspace: Option<FrameWorkspace>,
}

impl FrameSlot<'_> {
    pub fn detect(&mut self, integral: &IntegralImages) -> FrameReport {
        match self.workspace.as_mut() {
            Some(workspace) => self.driver.detector.detect(integral, workspace),
            None => FrameReport::empty(self.driver.detector.input_descriptor()),
        }
    }

    pub fn workspace(&self) -> Option<&FrameWorkspace> {
        self.workspace.as_ref()
    }
}

impl Drop for FrameSlot<'_> {
    fn drop(&mut self) {
        if let Some(workspace) = self.workspace.take() {
            // Capacity equals the number of workspaces, so this never blocks.
            let _ = self.driver.free_tx.send(workspace);
        }
    }
}
