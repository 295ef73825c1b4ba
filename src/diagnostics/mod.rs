//! Serializable per-frame diagnostics.
//!
//! [`FrameReport`] is what the detector returns for every frame: the final
//! detections plus a [`FrameTrace`] with per-scale phase counts, grouping
//! statistics and step timings.

mod frame;
mod timing;

pub use frame::{FrameReport, FrameTrace, GroupingTrace, InputDescriptor, ScaleTrace};
pub use timing::{elapsed_ms, StageTiming, TimingBreakdown};
