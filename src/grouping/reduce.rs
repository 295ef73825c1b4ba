//! Cluster reduction and nested-detection suppression.

use super::cluster::Clustering;
use crate::detector::DetectionWindow;
use serde::Serialize;

/// Final detection in full-image pixels.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Detection {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Number of survivor windows merged into this detection.
    pub neighbors: u32,
}

/// Mean rectangle of each cluster, mapped back to full-image coordinates by
/// dividing out `initial_scale`. Returned in label order.
pub fn reduce_clusters(
    windows: &[DetectionWindow],
    clustering: &Clustering,
    initial_scale: f32,
) -> Vec<Detection> {
    let mut sums = vec![[0.0f64; 4]; clustering.cluster_count()];
    let mut counts = vec![0u32; clustering.cluster_count()];
    for (window, label) in windows.iter().zip(clustering.labels()) {
        let Some(label) = label else { continue };
        let acc = &mut sums[*label as usize];
        acc[0] += window.x as f64;
        acc[1] += window.y as f64;
        acc[2] += window.width as f64;
        acc[3] += window.height as f64;
        counts[*label as usize] += 1;
    }

    let inv_scale = 1.0 / initial_scale as f64;
    sums.iter()
        .zip(&counts)
        .filter(|&(_, &n)| n > 0)
        .map(|(acc, &n)| {
            let mean = |v: f64| (v / n as f64 * inv_scale) as f32;
            Detection {
                x: mean(acc[0]),
                y: mean(acc[1]),
                width: mean(acc[2]),
                height: mean(acc[3]),
                neighbors: n,
            }
        })
        .collect()
}

/// Drops clusters with `min_neighbors` members or fewer, then removes any
/// detection nested (within an `eps`-scaled margin) inside a stronger one.
/// The result is ordered by member count, strongest first.
pub fn suppress_nested(mut clusters: Vec<Detection>, min_neighbors: u32, eps: f32) -> Vec<Detection> {
    clusters.retain(|c| c.neighbors > min_neighbors);
    clusters.sort_by(|a, b| b.neighbors.cmp(&a.neighbors));

    let contained = |inner: &Detection, outer: &Detection| {
        let dx = (outer.width * eps).round();
        let dy = (outer.height * eps).round();
        inner.x >= outer.x - dx
            && inner.y >= outer.y - dy
            && inner.x + inner.width <= outer.x + outer.width + dx
            && inner.y + inner.height <= outer.y + outer.height + dy
    };

    clusters
        .iter()
        .enumerate()
        .filter(|&(i, inner)| {
            !clusters.iter().enumerate().any(|(j, outer)| {
                j != i
                    && contained(inner, outer)
                    && (outer.neighbors > inner.neighbors.max(3) || inner.neighbors < 3)
            })
        })
        .map(|(_, c)| *c)
        .collect()
}
