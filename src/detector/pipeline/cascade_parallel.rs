//! Cascade-parallel phase: classifier-level parallelism per survivor.
//!
//! Each survivor gets a work-group of `lanes` members. For every remaining
//! stage, lane `l` sums the leaf values of classifiers `l, l + lanes, ...`;
//! the partials are combined by a pairwise tree reduction before the stage
//! threshold test. Windows that pass every stage go to the frame-global
//! output list.

use super::super::evaluate::WindowEvaluator;
use super::super::scales::ScaleLevel;
use super::super::survivors::{AppendBuffer, DetectionWindow, Dispatch};
use rayon::prelude::*;
use std::ops::Range;

/// Lanes evaluated by one task inside a work-group.
const LANE_GRAIN: usize = 8;

/// Returns the number of windows that passed every stage.
pub(super) fn run(
    eval: &WindowEvaluator<'_>,
    level: &ScaleLevel,
    stages: Range<usize>,
    dispatch: Dispatch,
    input: &AppendBuffer<u32>,
    lanes: usize,
    output: &AppendBuffer<DetectionWindow>,
) -> usize {
    let lanes = lanes.max(1);
    let descriptor = &level.descriptor;
    (0..dispatch.work_items)
        .into_par_iter()
        .map_init(
            || vec![0.0f32; lanes],
            |partials, item| {
                let anchor = input.get(item);
                let (x, y) = level.anchor_origin(anchor as usize);
                let window = eval.window(x, y);
                for s in stages.clone() {
                    let stage = eval.cascade().stage(s);
                    partials
                        .par_iter_mut()
                        .with_min_len(LANE_GRAIN)
                        .enumerate()
                        .for_each(|(lane, partial)| {
                            *partial = eval.lane_partial(&window, &stage, lane, lanes);
                        });
                    if tree_reduce(partials) < stage.threshold {
                        return false;
                    }
                }
                output.push(DetectionWindow {
                    x: x as u32,
                    y: y as u32,
                    width: descriptor.scaled_window_width,
                    height: descriptor.scaled_window_height,
                });
                true
            },
        )
        .filter(|&accepted| accepted)
        .count()
}

/// Pairwise in-place sum; `values` is clobbered.
fn tree_reduce(values: &mut [f32]) -> f32 {
    let mut width = values.len();
    while width > 1 {
        let half = width.div_ceil(2);
        for i in 0..width / 2 {
            values[i] += values[i + half];
        }
        width = half;
    }
    values.first().copied().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::tree_reduce;

    #[test]
    fn tree_reduce_sums_odd_and_even_widths() {
        for n in [1usize, 2, 5, 8, 63, 64] {
            let mut values: Vec<f32> = (1..=n).map(|v| v as f32).collect();
            let expected = (n * (n + 1) / 2) as f32;
            assert_eq!(tree_reduce(&mut values), expected, "width {n}");
        }
        assert_eq!(tree_reduce(&mut []), 0.0);
    }
}
