use super::TimingBreakdown;
use crate::detector::ScaleDescriptor;
use crate::grouping::Detection;
use serde::Serialize;

/// Result of one frame: final detections plus the trace that produced them.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameReport {
    pub detections: Vec<Detection>,
    pub trace: FrameTrace,
}

impl FrameReport {
    pub(crate) fn empty(input: InputDescriptor) -> Self {
        Self {
            detections: Vec::new(),
            trace: FrameTrace {
                input,
                scales: Vec::new(),
                survivors: 0,
                dropped_survivors: 0,
                grouping: GroupingTrace::default(),
                timings: TimingBreakdown::default(),
            },
        }
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameTrace {
    pub input: InputDescriptor,
    pub scales: Vec<ScaleTrace>,
    /// Windows in the frame-global output list after every scale finished.
    pub survivors: usize,
    /// Accepted windows lost to the output list's fixed capacity.
    pub dropped_survivors: usize,
    pub grouping: GroupingTrace,
    pub timings: TimingBreakdown,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InputDescriptor {
    pub width: usize,
    pub height: usize,
    pub scales: usize,
    pub stages: usize,
    pub dense_stages: usize,
    pub sparse_stages: usize,
    pub cascade_parallel_stages: usize,
}

/// Survivor counts through the phases of one scale. Each count is bounded
/// by the one before it.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScaleTrace {
    pub descriptor: ScaleDescriptor,
    pub grid_width: u32,
    pub grid_height: u32,
    pub anchors: usize,
    pub dense_survivors: usize,
    pub sparse_survivors: usize,
    pub accepted: usize,
    pub elapsed_ms: f64,
}

#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupingTrace {
    pub candidates: usize,
    /// Undirected overlap edges.
    pub edges: usize,
    pub noise: usize,
    pub clusters: usize,
    pub suppressed: usize,
    pub detections: usize,
    pub elapsed_ms: f64,
}
