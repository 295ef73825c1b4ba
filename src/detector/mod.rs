//! Multi-scale cascade detector.
//!
//! Modules
//! - [`params`] – construction-time configuration.
//! - `scales` – the scale planner and per-scale scan grids.
//! - `evaluate` – per-window cascade evaluation shared by every phase.
//! - `survivors` – lock-free append buffers and the phase hand-off.
//! - `workspace` – per-frame scratch reused across frames.
//! - `pipeline` – the [`CascadeDetector`] and its three scan phases.
//! - `driver` – bounded workspace pool and admission gate.

mod driver;
mod evaluate;
pub mod params;
mod pipeline;
mod scales;
mod survivors;
mod workspace;

pub use driver::{FrameDriver, FrameSlot};
pub use params::{ClusterStrategy, DetectorParams};
pub use pipeline::{CascadeDetector, StageSplits};
pub use scales::{plan_scales, ScaleDescriptor, ScaleLevel};
pub use survivors::{AppendBuffer, DetectionWindow, Dispatch, SlotValue, SurvivorBuffers};
pub use workspace::FrameWorkspace;
