//! Strongly-typed cascade model produced by the compiler.

use serde::Serialize;

/// Weighted rectangle in window-relative units.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct FeatureRect {
    pub x: u8,
    pub y: u8,
    pub width: u8,
    pub height: u8,
    pub weight: f32,
}

impl FeatureRect {
    pub fn new(x: u8, y: u8, width: u8, height: u8, weight: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            weight,
        }
    }
}

/// Weak learner: the weighted rectangle sum compared against `threshold`
/// selects `left` (below) or `right` (at or above).
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Classifier {
    /// Two or three rectangles, in source order.
    pub rects: Vec<FeatureRect>,
    pub threshold: f32,
    pub left: f32,
    pub right: f32,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Stage {
    pub classifiers: Vec<Classifier>,
    /// A window is rejected when the summed leaf values fall below this.
    pub threshold: f32,
}

/// Immutable cascade: ordered stages plus the canonical detector footprint.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CascadeModel {
    stages: Vec<Stage>,
    window_width: u32,
    window_height: u32,
}

impl CascadeModel {
    pub(crate) fn new(stages: Vec<Stage>, window_width: u32, window_height: u32) -> Self {
        Self {
            stages,
            window_width,
            window_height,
        }
    }

    #[inline]
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    #[inline]
    pub fn window_width(&self) -> u32 {
        self.window_width
    }

    #[inline]
    pub fn window_height(&self) -> u32 {
        self.window_height
    }

    pub fn classifier_count(&self) -> usize {
        self.stages.iter().map(|s| s.classifiers.len()).sum()
    }

    pub fn rect_count(&self) -> usize {
        self.stages
            .iter()
            .flat_map(|s| s.classifiers.iter())
            .map(|c| c.rects.len())
            .sum()
    }
}
