//! Per-frame scratch owned by exactly one in-flight frame.
//!
//! A [`FrameWorkspace`] is sized once for a detector's scale plan and reused
//! across frames. The core pipeline only borrows it mutably for the duration
//! of one frame; pooling and admission are the driver's job.

use super::scales::ScaleLevel;
use super::survivors::{AppendBuffer, DetectionWindow, SurvivorBuffers};
use crate::error::{try_alloc, ResourceError};
use crate::grouping::AdjacencyScratch;

pub struct FrameWorkspace {
    pub(crate) scales: Vec<SurvivorBuffers>,
    pub(crate) output: AppendBuffer<DetectionWindow>,
    pub(crate) grouping: AdjacencyScratch,
    pub(crate) windows: Vec<DetectionWindow>,
    /// Number of frames processed with this workspace.
    frames: u64,
}

impl FrameWorkspace {
    pub(crate) fn new(levels: &[ScaleLevel], max_detections: usize) -> Result<Self, ResourceError> {
        let scales = levels
            .iter()
            .map(|level| SurvivorBuffers::new(level.anchor_count()))
            .collect::<Result<Vec<_>, _>>()?;
        let windows = try_alloc(max_detections, "frame survivor snapshot")?;
        Ok(Self {
            scales,
            output: AppendBuffer::with_capacity(max_detections, "frame survivor list")?,
            grouping: AdjacencyScratch::new(max_detections)?,
            windows,
            frames: 0,
        })
    }

    pub fn scale_count(&self) -> usize {
        self.scales.len()
    }

    pub fn output_capacity(&self) -> usize {
        self.output.capacity()
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames
    }

    /// Survivors accepted during the last frame, in append order.
    pub fn last_survivors(&self) -> &[DetectionWindow] {
        &self.windows
    }

    /// Clears every counter so the next frame starts empty.
    pub(crate) fn begin_frame(&mut self) {
        for scale in &mut self.scales {
            scale.reset();
        }
        self.output.clear();
        self.windows.clear();
        self.frames += 1;
    }
}
