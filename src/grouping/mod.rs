//! Grouping engine: reduces a frame's surviving windows to final detections.
//!
//! 1. [`build_adjacency`] connects windows whose corners agree within an
//!    `eps`-relative tolerance.
//! 2. [`flood_fill`] or [`union_find`] partitions the non-noise nodes.
//! 3. [`reduce_clusters`] averages each cluster and maps it to full-image
//!    pixels.
//! 4. [`suppress_nested`] drops weak clusters and nested sub-detections.

mod adjacency;
mod cluster;
mod reduce;

pub use adjacency::{build_adjacency, windows_overlap, Adjacency, AdjacencyScratch};
pub use cluster::{flood_fill, union_find, Clustering};
pub use reduce::{reduce_clusters, suppress_nested, Detection};

use crate::detector::{ClusterStrategy, DetectionWindow, DetectorParams};
use crate::diagnostics::GroupingTrace;
use log::debug;
use std::time::Instant;

/// Runs the full grouping sequence over `windows` using `scratch`.
pub fn group_windows(
    windows: &[DetectionWindow],
    params: &DetectorParams,
    scratch: &mut AdjacencyScratch,
) -> (Vec<Detection>, GroupingTrace) {
    let start = Instant::now();
    let adjacency = build_adjacency(windows, params.eps, scratch);
    let clustering = match params.cluster_strategy {
        ClusterStrategy::FloodFill => flood_fill(&adjacency, params.min_neighbors),
        ClusterStrategy::UnionFind => union_find(&adjacency, params.min_neighbors),
    };
    let nodes = adjacency.len();
    let edges = adjacency.entry_count() / 2;

    let clusters = reduce_clusters(&windows[..nodes], &clustering, params.initial_scale);
    let cluster_count = clusters.len();
    let detections = suppress_nested(clusters, params.min_neighbors, params.eps);

    let trace = GroupingTrace {
        candidates: nodes,
        edges,
        noise: clustering.noise_count(),
        clusters: cluster_count,
        suppressed: cluster_count - detections.len(),
        detections: detections.len(),
        elapsed_ms: start.elapsed().as_secs_f64() * 1000.0,
    };
    debug!(
        "group_windows candidates={} edges={} noise={} clusters={} detections={}",
        trace.candidates, trace.edges, trace.noise, trace.clusters, trace.detections
    );
    (detections, trace)
}
