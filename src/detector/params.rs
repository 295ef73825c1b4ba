//! Construction-time parameters for the cascade detector.
//!
//! Sizes (`min_size`, `max_size`) are in original-image pixels. The scan runs
//! on the image downsampled by `initial_scale`, and the planner converts the
//! size bounds into that space. Defaults target face-sized windows on a
//! portrait video frame.

use crate::error::DetectorError;
use serde::{Deserialize, Serialize};

/// Partitioning algorithm used by the grouping engine. Both produce the same
/// equivalence classes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClusterStrategy {
    /// Concurrent mark-and-expand over the adjacency lists.
    #[default]
    FloodFill,
    /// Sequential rank-weighted union-find.
    UnionFind,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorParams {
    /// Geometric step between consecutive detection scales (> 1).
    pub scale_factor: f32,
    /// Clusters with this many members or fewer are discarded.
    pub min_neighbors: u32,
    /// Grouping overlap tolerance, relative to window size.
    pub eps: f32,
    /// Downsample factor applied to the frame before scanning, in `(0, 1]`.
    pub initial_scale: f32,
    /// Anchor stride in scanned-image pixels.
    pub step: u32,
    pub min_size: f32,
    pub max_size: f32,
    /// Capacity of the frame-global survivor list.
    pub max_detections: usize,
    pub cluster_strategy: ClusterStrategy,
}

impl Default for DetectorParams {
    fn default() -> Self {
        Self {
            scale_factor: 1.2,
            min_neighbors: 3,
            eps: 0.4,
            initial_scale: 0.5,
            step: 2,
            min_size: 360.0,
            max_size: 720.0,
            max_detections: 1500,
            cluster_strategy: ClusterStrategy::FloodFill,
        }
    }
}

impl DetectorParams {
    pub fn validate(&self) -> Result<(), DetectorError> {
        let invalid = |msg: String| Err(DetectorError::InvalidParams(msg));
        if !(self.scale_factor > 1.0) || !self.scale_factor.is_finite() {
            return invalid(format!("scale_factor must be > 1, got {}", self.scale_factor));
        }
        if !(self.initial_scale > 0.0 && self.initial_scale <= 1.0) {
            return invalid(format!(
                "initial_scale must be in (0, 1], got {}",
                self.initial_scale
            ));
        }
        if self.step == 0 {
            return invalid("step must be at least 1".into());
        }
        if !(self.min_size > 0.0) || !(self.min_size <= self.max_size) || !self.max_size.is_finite() {
            return invalid(format!(
                "size bounds must satisfy 0 < min_size <= max_size, got {}..{}",
                self.min_size, self.max_size
            ));
        }
        if !(self.eps >= 0.0) || !self.eps.is_finite() {
            return invalid(format!("eps must be a non-negative number, got {}", self.eps));
        }
        if self.max_detections == 0 || self.max_detections > u32::MAX as usize {
            return invalid(format!(
                "max_detections must be in 1..={}, got {}",
                u32::MAX,
                self.max_detections
            ));
        }
        Ok(())
    }

    /// Dimensions of the scanned image for a frame of `width x height`.
    pub fn scanned_dims(&self, width: usize, height: usize) -> (usize, usize) {
        (
            (width as f32 * self.initial_scale) as usize,
            (height as f32 * self.initial_scale) as usize,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(DetectorParams::default().validate().is_ok());
    }

    #[test]
    fn rejects_out_of_range_values() {
        let cases = [
            DetectorParams {
                scale_factor: 1.0,
                ..Default::default()
            },
            DetectorParams {
                initial_scale: 0.0,
                ..Default::default()
            },
            DetectorParams {
                step: 0,
                ..Default::default()
            },
            DetectorParams {
                min_size: 800.0,
                ..Default::default()
            },
            DetectorParams {
                eps: f32::NAN,
                ..Default::default()
            },
            DetectorParams {
                max_detections: 0,
                ..Default::default()
            },
        ];
        for params in cases {
            assert!(
                matches!(params.validate(), Err(DetectorError::InvalidParams(_))),
                "{params:?} should be rejected"
            );
        }
    }

    #[test]
    fn partial_json_fills_defaults() {
        let params: DetectorParams =
            serde_json::from_str(r#"{"min_neighbors": 1, "cluster_strategy": "union_find"}"#)
                .expect("params");
        assert_eq!(params.min_neighbors, 1);
        assert_eq!(params.cluster_strategy, ClusterStrategy::UnionFind);
        assert_eq!(params.step, 2);
    }
}
