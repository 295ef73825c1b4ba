#![allow(dead_code)]

pub mod cascades;
pub mod synthetic_image;

use cascade_detector::{CascadeDetector, CompiledCascade, ComputeContext, ContextOptions, DetectorParams};
use serde_json::Value;
use std::sync::Arc;

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn build_detector(
    tree: &Value,
    params: DetectorParams,
    parallel_width: usize,
    frame_width: usize,
    frame_height: usize,
) -> CascadeDetector {
    let context = ComputeContext::new(ContextOptions {
        parallel_width,
        threads: Some(2),
    })
    .expect("worker pool");
    let cascade = CompiledCascade::compile(tree).expect("cascade compiles");
    CascadeDetector::new(
        Arc::new(context),
        Arc::new(cascade),
        params,
        frame_width,
        frame_height,
    )
    .expect("detector")
}
