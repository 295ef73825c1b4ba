//! Cascade detector running the per-scale three-phase scan and grouping.
//!
//! Typical usage:
//! ```no_run
//! use std::sync::Arc;
//! use cascade_detector::prelude::*;
//!
//! # fn example(tree: serde_json::Value, gray: GrayView) -> cascade_detector::Result<()> {
//! let context = Arc::new(ComputeContext::new(ContextOptions::default())?);
//! let cascade = Arc::new(CompiledCascade::compile(&tree)?);
//! let params = DetectorParams::default();
//! let detector = CascadeDetector::new(context, cascade, params, gray.w * 2, gray.h * 2)?;
//! let mut workspace = detector.workspace()?;
//! let integral = IntegralImages::from_gray(&gray)?;
//! let report = detector.detect(&integral, &mut workspace);
//! println!("detections: {}", report.detections.len());
//! # Ok(())
//! # }
//! ```
//!
//! Phases per scale
//! - Dense: every anchor, stages `[0, split_a)`.
//! - Handoff: the dense survivor count sizes the next launch.
//! - Sparse: every dense survivor, stages `[split_a, split_b)`.
//! - Cascade-parallel: every sparse survivor, stages `[split_b, n)` with a
//!   work-group of `parallel_width` lanes per survivor.
//!
//! Scales of one frame run concurrently, each on its own survivor buffers,
//! and append into one shared output list. Grouping starts after every scale
//! has joined.

mod cascade_parallel;
mod dense;
mod sparse;

use super::evaluate::WindowEvaluator;
use super::params::DetectorParams;
use super::scales::{plan_scales, ScaleLevel};
use super::survivors::{AppendBuffer, DetectionWindow, SurvivorBuffers};
use super::workspace::FrameWorkspace;
use crate::cascade::{CompiledCascade, PackedCascade};
use crate::context::ComputeContext;
use crate::diagnostics::{
    elapsed_ms, FrameReport, FrameTrace, InputDescriptor, ScaleTrace, TimingBreakdown,
};
use crate::error::{DetectorError, Result};
use crate::grouping::group_windows;
use crate::image::IntegralImages;
use log::{debug, info, warn};
use rayon::prelude::*;
use serde::Serialize;
use std::ops::Range;
use std::sync::Arc;
use std::time::Instant;

/// Stage ranges handled by each phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StageSplits {
    pub split_a: usize,
    pub split_b: usize,
    pub stage_count: usize,
}

impl StageSplits {
    /// `split_a` is the first stage holding at least `parallel_width`
    /// classifiers (the stage count when none does); `split_b` is twice that,
    /// clipped to the stage count.
    pub fn for_cascade(cascade: &PackedCascade, parallel_width: usize) -> Self {
        let stage_count = cascade.stage_count();
        let split_a = (0..stage_count)
            .find(|&s| cascade.stage(s).classifier_count as usize >= parallel_width)
            .unwrap_or(stage_count);
        Self {
            split_a,
            split_b: (2 * split_a).min(stage_count),
            stage_count,
        }
    }

    #[inline]
    pub fn dense(&self) -> Range<usize> {
        0..self.split_a
    }

    #[inline]
    pub fn sparse(&self) -> Range<usize> {
        self.split_a..self.split_b
    }

    #[inline]
    pub fn cascade_parallel(&self) -> Range<usize> {
        self.split_b..self.stage_count
    }
}

pub struct CascadeDetector {
    context: Arc<ComputeContext>,
    cascade: Arc<CompiledCascade>,
    params: DetectorParams,
    frame_width: usize,
    frame_height: usize,
    scanned_width: usize,
    scanned_height: usize,
    levels: Vec<ScaleLevel>,
    splits: StageSplits,
}

impl CascadeDetector {
    /// Builds a detector for frames of `frame_width x frame_height`. Frames are
    /// scanned after downsampling by `params.initial_scale`, so the integral
    /// images passed to [`detect`](Self::detect) must have the scanned size.
    pub fn new(
        context: Arc<ComputeContext>,
        cascade: Arc<CompiledCascade>,
        params: DetectorParams,
        frame_width: usize,
        frame_height: usize,
    ) -> Result<Self> {
        params.validate()?;
        let (scanned_width, scanned_height) = params.scanned_dims(frame_width, frame_height);
        let limit = u16::MAX as usize;
        if scanned_width == 0 || scanned_height == 0 || scanned_width > limit || scanned_height > limit {
            return Err(DetectorError::InvalidParams(format!(
                "scanned frame {scanned_width}x{scanned_height} must be non-empty and at most {limit} per side"
            )));
        }

        let levels = plan_scales(
            &params,
            scanned_width,
            scanned_height,
            cascade.window_width(),
            cascade.window_height(),
        );
        if let Some(level) = levels.iter().find(|l| l.anchor_count() > u32::MAX as usize) {
            return Err(DetectorError::InvalidParams(format!(
                "scan grid {}x{} exceeds the anchor index range",
                level.grid_width, level.grid_height
            )));
        }
        if levels.is_empty() {
            warn!(
                "CascadeDetector::new no scale fits a {}x{} scanned frame",
                scanned_width, scanned_height
            );
        }

        let splits = StageSplits::for_cascade(cascade.packed(), context.parallel_width());
        info!(
            "CascadeDetector::new frame={}x{} scanned={}x{} scales={} splits={:?}",
            frame_width, frame_height, scanned_width, scanned_height, levels.len(), splits
        );
        Ok(Self {
            context,
            cascade,
            params,
            frame_width,
            frame_height,
            scanned_width,
            scanned_height,
            levels,
            splits,
        })
    }

    /// Allocates one frame's scratch for this detector's scale plan.
    pub fn workspace(&self) -> Result<FrameWorkspace> {
        Ok(FrameWorkspace::new(&self.levels, self.params.max_detections)?)
    }

    pub fn params(&self) -> &DetectorParams {
        &self.params
    }

    pub fn levels(&self) -> &[ScaleLevel] {
        &self.levels
    }

    pub fn splits(&self) -> StageSplits {
        self.splits
    }

    pub fn cascade(&self) -> &Arc<CompiledCascade> {
        &self.cascade
    }

    pub fn context(&self) -> &Arc<ComputeContext> {
        &self.context
    }

    pub fn frame_dims(&self) -> (usize, usize) {
        (self.frame_width, self.frame_height)
    }

    pub fn scanned_dims(&self) -> (usize, usize) {
        (self.scanned_width, self.scanned_height)
    }

    pub(crate) fn input_descriptor(&self) -> InputDescriptor {
        InputDescriptor {
            width: self.scanned_width,
            height: self.scanned_height,
            scales: self.levels.len(),
            stages: self.splits.stage_count,
            dense_stages: self.splits.dense().len(),
            sparse_stages: self.splits.sparse().len(),
            cascade_parallel_stages: self.splits.cascade_parallel().len(),
        }
    }

    fn fits_workspace(&self, workspace: &FrameWorkspace) -> bool {
        workspace.scales.len() == self.levels.len()
            && workspace
                .scales
                .iter()
                .zip(&self.levels)
                .all(|(buffers, level)| buffers.capacity() == level.anchor_count())
            && workspace.output.capacity() == self.params.max_detections
    }

    /// Runs every scale over one frame's integral images, then groups the
    /// accepted windows.
    pub fn detect(&self, integral: &IntegralImages, workspace: &mut FrameWorkspace) -> FrameReport {
        let total_start = Instant::now();
        debug!(
            "CascadeDetector::detect start w={} h={} scales={}",
            integral.width(),
            integral.height(),
            self.levels.len()
        );
        if (integral.width(), integral.height()) != (self.scanned_width, self.scanned_height) {
            warn!(
                "CascadeDetector::detect integral image {}x{} does not match scanned frame {}x{}",
                integral.width(),
                integral.height(),
                self.scanned_width,
                self.scanned_height
            );
            return FrameReport::empty(self.input_descriptor());
        }
        if !self.fits_workspace(workspace) {
            warn!("CascadeDetector::detect workspace was built for a different detector");
            return FrameReport::empty(self.input_descriptor());
        }

        workspace.begin_frame();
        let mut timings = TimingBreakdown::default();
        let FrameWorkspace {
            scales,
            output,
            grouping,
            windows,
            ..
        } = workspace;

        let scan_start = Instant::now();
        let output = &*output;
        let scale_traces: Vec<ScaleTrace> = self.context.install(|| {
            self.levels
                .par_iter()
                .zip(scales.par_iter_mut())
                .map(|(level, buffers)| self.scan_scale(integral, level, buffers, output))
                .collect()
        });
        timings.push("scan", elapsed_ms(scan_start));

        windows.extend(output.iter());
        let dropped_survivors = output.dropped();
        if dropped_survivors > 0 {
            warn!(
                "CascadeDetector::detect output list full: dropped {} of {} accepted windows",
                dropped_survivors,
                dropped_survivors + windows.len()
            );
        }

        let (detections, grouping_trace) = timings.measure("grouping", || {
            self.context
                .install(|| group_windows(&windows[..], &self.params, grouping))
        });
        timings.total_ms = elapsed_ms(total_start);
        debug!(
            "CascadeDetector::detect done survivors={} detections={} total_ms={:.3}",
            windows.len(),
            detections.len(),
            timings.total_ms
        );

        FrameReport {
            detections,
            trace: FrameTrace {
                input: self.input_descriptor(),
                scales: scale_traces,
                survivors: windows.len(),
                dropped_survivors,
                grouping: grouping_trace,
                timings,
            },
        }
    }

    fn scan_scale(
        &self,
        integral: &IntegralImages,
        level: &ScaleLevel,
        buffers: &mut SurvivorBuffers,
        output: &AppendBuffer<DetectionWindow>,
    ) -> ScaleTrace {
        let start = Instant::now();
        let lanes = self.context.parallel_width();
        let eval = WindowEvaluator::new(self.cascade.packed(), integral, &level.descriptor);

        dense::run(&eval, level, self.splits.dense(), buffers.current(), lanes);
        let dispatch = buffers.handoff();
        let dense_survivors = dispatch.work_items;

        sparse::run(
            &eval,
            level,
            self.splits.sparse(),
            dispatch,
            buffers.previous(),
            buffers.current(),
        );
        let dispatch = buffers.handoff();
        let sparse_survivors = dispatch.work_items;
        debug_assert!(sparse_survivors <= dense_survivors);

        let accepted = cascade_parallel::run(
            &eval,
            level,
            self.splits.cascade_parallel(),
            dispatch,
            buffers.previous(),
            lanes,
            output,
        );
        debug_assert!(accepted <= sparse_survivors);
        buffers.reset();

        let scale_ms = elapsed_ms(start);
        debug!(
            "CascadeDetector::scan_scale scale={:.3} window={}x{} anchors={} dense={} sparse={} accepted={}",
            level.descriptor.scale,
            level.descriptor.scaled_window_width,
            level.descriptor.scaled_window_height,
            level.anchor_count(),
            dense_survivors,
            sparse_survivors,
            accepted
        );
        ScaleTrace {
            descriptor: level.descriptor,
            grid_width: level.grid_width,
            grid_height: level.grid_height,
            anchors: level.anchor_count(),
            dense_survivors,
            sparse_survivors,
            accepted,
            elapsed_ms: scale_ms,
        }
    }
}
