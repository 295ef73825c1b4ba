//! Per-window cascade evaluation shared by every phase.
//!
//! For a window at `(x, y)` the normalization factor is the standard
//! deviation of the pixels under the window, read from the two integral
//! tables. A classifier's weighted rect sum (weights scaled by the inverse
//! window area) is compared against `threshold * norm` to select its left or
//! right leaf value.

use super::scales::ScaleDescriptor;
use crate::cascade::{PackedCascade, StageRecord};
use crate::image::IntegralImages;
use std::ops::Range;

/// Scale-bound evaluator over one frame's integral images.
pub(crate) struct WindowEvaluator<'a> {
    cascade: &'a PackedCascade,
    integral: &'a IntegralImages,
    scale: f32,
    window_width: usize,
    window_height: usize,
    inv_area: f64,
}

/// A positioned window with its normalization factor.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Window {
    pub x: usize,
    pub y: usize,
    pub norm: f64,
}

impl<'a> WindowEvaluator<'a> {
    pub fn new(
        cascade: &'a PackedCascade,
        integral: &'a IntegralImages,
        descriptor: &ScaleDescriptor,
    ) -> Self {
        Self {
            cascade,
            integral,
            scale: descriptor.scale,
            window_width: descriptor.scaled_window_width as usize,
            window_height: descriptor.scaled_window_height as usize,
            inv_area: 1.0 / descriptor.scaled_area.max(1) as f64,
        }
    }

    #[inline]
    pub fn cascade(&self) -> &'a PackedCascade {
        self.cascade
    }

    /// The anchor grid can overshoot the image edge by one step.
    #[inline]
    pub fn fits(&self, x: usize, y: usize) -> bool {
        x + self.window_width <= self.integral.width()
            && y + self.window_height <= self.integral.height()
    }

    pub fn window(&self, x: usize, y: usize) -> Window {
        let (w, h) = (self.window_width, self.window_height);
        let sum = self.integral.rect_sum(x, y, w, h) as f64;
        let sq_sum = self.integral.rect_sq_sum(x, y, w, h) as f64;
        let mean = sum * self.inv_area;
        let variance = sq_sum * self.inv_area - mean * mean;
        let norm = if variance > 0.0 { variance.sqrt() } else { 1.0 };
        Window { x, y, norm }
    }

    #[inline]
    fn scaled(&self, v: u8) -> usize {
        (v as f32 * self.scale) as usize
    }

    /// Leaf value selected by classifier `idx` for `window`.
    pub fn classifier_value(&self, window: &Window, idx: usize) -> f32 {
        let classifier = self.cascade.classifier(idx);
        let mut value = 0.0f64;
        for r_idx in classifier.rects() {
            let rect = self.cascade.rect(r_idx);
            let (x, y) = (self.scaled(rect.x), self.scaled(rect.y));
            // Truncating offset and size separately must not leave the window.
            let width = self.scaled(rect.width).min(self.window_width.saturating_sub(x));
            let height = self.scaled(rect.height).min(self.window_height.saturating_sub(y));
            let area_sum = self.integral.rect_sum(window.x + x, window.y + y, width, height);
            value += area_sum as f64 * rect.weight as f64 * self.inv_area;
        }
        if value < classifier.threshold as f64 * window.norm {
            classifier.left
        } else {
            classifier.right
        }
    }

    pub fn stage_sum(&self, window: &Window, stage: &StageRecord) -> f32 {
        stage
            .classifiers()
            .map(|idx| self.classifier_value(window, idx))
            .sum()
    }

    /// Evaluates `stages` in order, stopping at the first rejection.
    pub fn passes(&self, window: &Window, mut stages: Range<usize>) -> bool {
        stages.all(|s| {
            let stage = self.cascade.stage(s);
            self.stage_sum(window, &stage) >= stage.threshold
        })
    }

    /// Sum of the leaf values of the classifiers assigned to `lane` when the
    /// stage is strided over `lanes` work-group members.
    pub fn lane_partial(&self, window: &Window, stage: &StageRecord, lane: usize, lanes: usize) -> f32 {
        stage
            .classifiers()
            .skip(lane)
            .step_by(lanes)
            .map(|idx| self.classifier_value(window, idx))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cascade::CompiledCascade;
    use crate::image::GrayView;
    use serde_json::json;

    fn edge_cascade() -> CompiledCascade {
        let tree = json!({"opencv_storage": {"edge": {
            "size": "24 24",
            "stages": {"_": [{
                "stage_threshold": 0.5,
                "trees": {"_": [{"_": {
                    "threshold": 0.0,
                    "left_val": 0.0,
                    "right_val": 1.0,
                    "feature": {"rects": {"_": ["0 0 24 24 -1.", "13 11 11 13 2."]}}
                }}]}
            }]}
        }}});
        CompiledCascade::compile(&tree).expect("edge cascade")
    }

    #[test]
    fn scaled_rects_stay_inside_the_window() {
        let cascade = edge_cascade();
        for step in 0..40 {
            let scale = 1.0 + step as f32 * 0.137;
            let side = (24.0 * scale) as u32;
            let descriptor = ScaleDescriptor {
                scale,
                scaled_window_width: side,
                scaled_window_height: side,
                scaled_area: side * side,
            };
            // integral tables exactly one window large: any overshoot would
            // index past the last row or column
            let data = vec![200u8; (side * side) as usize];
            let view = GrayView::new(side as usize, side as usize, &data).expect("view");
            let integral = IntegralImages::from_gray(&view).expect("integral");
            let eval = WindowEvaluator::new(cascade.packed(), &integral, &descriptor);
            assert!(eval.fits(0, 0));
            let window = eval.window(0, 0);
            let value = eval.classifier_value(&window, 0);
            assert!(value == 0.0 || value == 1.0);
        }
    }
}
