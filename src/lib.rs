#![doc = include_str!("../README.md")]

// Public modules
pub mod cascade;
pub mod context;
pub mod detector;
pub mod diagnostics;
pub mod error;
pub mod grouping;
pub mod image;

pub mod config;

// --- High-level re-exports -------------------------------------------------

pub use crate::cascade::{CascadeModel, CompiledCascade};
pub use crate::context::{ComputeContext, ContextOptions};
pub use crate::detector::{CascadeDetector, DetectorParams, FrameDriver, FrameWorkspace};
pub use crate::diagnostics::{FrameReport, FrameTrace};
pub use crate::error::{DetectorError, ParseError, ResourceError, Result};
pub use crate::grouping::Detection;

// --- Prelude ---------------------------------------------------------------

/// Small prelude for quick experiments.
///
/// ```no_run
/// use std::sync::Arc;
/// use cascade_detector::prelude::*;
///
/// # fn main() -> cascade_detector::Result<()> {
/// let tree: serde_json::Value = serde_json::from_str("{}").unwrap_or_default();
/// let cascade = Arc::new(CompiledCascade::compile(&tree)?);
/// let context = Arc::new(ComputeContext::new(ContextOptions::default())?);
///
/// let (w, h) = (720usize, 1280usize);
/// let gray = vec![0u8; w * h];
/// let view = GrayView::new(w, h, &gray).expect("buffer matches dimensions");
/// let integral = IntegralImages::from_gray(&view)?;
///
/// let params = DetectorParams { initial_scale: 1.0, ..Default::default() };
/// let detector = CascadeDetector::new(context, cascade, params, w, h)?;
/// let mut workspace = detector.workspace()?;
/// let report = detector.detect(&integral, &mut workspace);
/// println!("detections={}", report.detections.len());
/// # Ok(())
/// # }
/// ```
pub mod prelude {
    pub use crate::image::{GrayView, IntegralImages};
    pub use crate::{
        CascadeDetector, CompiledCascade, ComputeContext, ContextOptions, Detection,
        DetectorParams, FrameDriver, FrameReport,
    };
}
